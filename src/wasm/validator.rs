//! Wasm module validation using wasmparser.
//!
//! Not part of the lifting hot path: tests and debugging call this to check
//! that emitted modules are well-formed under the proposal set the lifter
//! targets (GC, exception handling, threads, multi-memory, tail calls,
//! SIMD, reference types, bulk memory).

use crate::errors::LiftError;
use wasmparser::{Validator, WasmFeatures};

/// Validates a complete module, with every proposal the lifter can emit
/// enabled.
pub fn validate_module(bytes: &[u8]) -> Result<(), LiftError> {
    let mut validator = Validator::new_with_features(WasmFeatures::all());
    validator
        .validate_all(bytes)
        .map(|_| ())
        .map_err(|error| {
            LiftError::fatal(format!(
                "emitted module failed validation at offset {}: {}",
                error.offset(),
                error.message()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wasm::module_builder::ModuleBuilder;

    #[test]
    fn empty_module_validates() {
        let bytes = ModuleBuilder::new().finish();
        assert!(validate_module(&bytes).is_ok());
    }

    #[test]
    fn garbage_does_not_validate() {
        assert!(validate_module(&[0x00, 0x61, 0x73, 0x6D, 0x02, 0x00, 0x00, 0x00]).is_err());
    }

    #[test]
    fn trivial_function_module_validates() {
        let mut builder = ModuleBuilder::new();
        // () -> () type, one function, body = end.
        builder.add_type_entry(vec![0x60, 0x00, 0x00]);
        builder.add_function(0);
        builder.add_code_entry(vec![0x00, 0x0B]);
        assert!(validate_module(&builder.finish()).is_ok());
    }
}
