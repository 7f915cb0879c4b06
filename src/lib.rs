//! fil-lift: lifters from the FIL fuzzing IL to concrete target forms.
//!
//! FIL is a linear, structured, SSA-like intermediate representation over
//! JavaScript and WebAssembly semantics. This crate translates FIL programs
//! into two targets:
//!
//! - Executable JavaScript source text, with embedded WebAssembly modules
//!   compiled to byte arrays (`lifting::JsLifter` + `wasm::WasmLifter`).
//! - A flat human-readable IL dump for debugging (`lifting::FilDumper`).
//!
//! Lifting is a deterministic, single-threaded, straight-line computation:
//! the same program and options always produce byte-identical output.

pub mod errors;
pub mod fil;
pub mod lifting;
pub mod wasm;

mod dev_logging;

pub use errors::{LiftError, LiftErrorKind};
pub use lifting::options::LiftingOptions;
