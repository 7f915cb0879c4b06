//! The WebAssembly binary lifter and its supporting encoders.

pub mod leb;
pub mod lifter;
pub mod module_builder;
pub mod types;
pub mod validator;

pub use lifter::{lift_wasm, WasmLifter, WasmLiftResult};
