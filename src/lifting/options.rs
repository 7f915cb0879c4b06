//! Lifting options bitset.

use bitflags::bitflags;

bitflags! {
    /// Flags recognized by the lifters. Unknown bits are ignored when
    /// constructed through [`LiftingOptions::from_bits_truncate`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LiftingOptions: u32 {
        /// Emit per-instruction comments attached by the program generator.
        const INCLUDE_COMMENTS = 1 << 0;
        /// Drop indentation (full minification is a downstream concern).
        const MINIFY = 1 << 1;
        /// Emit inferred static types as comments next to definitions.
        const DUMP_TYPES = 1 << 2;
        /// Append a machine-readable type report to the output.
        const COLLECT_TYPES = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_are_ignored() {
        let options = LiftingOptions::from_bits_truncate(0xFFFF_FFFF);
        assert!(options.contains(LiftingOptions::MINIFY));
        assert_eq!(
            options,
            LiftingOptions::INCLUDE_COMMENTS
                | LiftingOptions::MINIFY
                | LiftingOptions::DUMP_TYPES
                | LiftingOptions::COLLECT_TYPES
        );
    }
}
