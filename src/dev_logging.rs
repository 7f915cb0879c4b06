// LIFTER LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_lifting")]
macro_rules! lift_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_lifting"))]
macro_rules! lift_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// WASM LIFTER LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_wasm_lifting")]
macro_rules! wasm_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_wasm_lifting"))]
macro_rules! wasm_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}
