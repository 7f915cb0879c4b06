//! Lifters from FIL to textual targets.
//!
//! - [`js_lifter::JsLifter`] emits executable JavaScript.
//! - [`fil_dumper::FilDumper`] emits the flat IL dump used for debugging.

pub mod expression;
pub mod fil_dumper;
pub mod inliner;
pub mod js_lifter;
pub mod options;
pub mod scaffolds;
pub mod script_writer;

pub use fil_dumper::FilDumper;
pub use js_lifter::JsLifter;
pub use options::LiftingOptions;
