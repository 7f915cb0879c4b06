//! Buffered text emitter with indentation tracking.
//!
//! The writer owns its buffer; lifters only append through it, so indent
//! mutations stay paired within each block scope.

/// Configuration for a [`ScriptWriter`].
#[derive(Debug, Clone)]
pub struct ScriptWriterConfig {
    /// Spaces per indentation level.
    pub indent_width: usize,
    /// Prefix every line with its line number.
    pub line_numbers: bool,
    /// Drop indentation entirely. Real minification is a downstream
    /// concern; the writer only stops pretty-printing.
    pub minify: bool,
    /// Drop comment lines, including comment-only lines of emitted blocks.
    pub strip_comments: bool,
}

impl Default for ScriptWriterConfig {
    fn default() -> ScriptWriterConfig {
        ScriptWriterConfig {
            indent_width: 4,
            line_numbers: false,
            minify: false,
            strip_comments: false,
        }
    }
}

#[derive(Debug)]
pub struct ScriptWriter {
    config: ScriptWriterConfig,
    buffer: String,
    indent: usize,
    lines_emitted: usize,
}

impl ScriptWriter {
    pub fn new(config: ScriptWriterConfig) -> ScriptWriter {
        ScriptWriter {
            config,
            buffer: String::new(),
            indent: 0,
            lines_emitted: 0,
        }
    }

    /// Emits a single line at the current indentation. The text must not
    /// contain embedded newlines; use [`ScriptWriter::emit_block`] for
    /// multi-line text.
    pub fn emit_line(&mut self, line: &str) {
        assert!(
            !line.contains('\n'),
            "emit_line received embedded newlines; use emit_block"
        );
        if self.config.line_numbers {
            self.buffer
                .push_str(&format!("{}: ", self.lines_emitted + 1));
        }
        if !self.config.minify && !line.is_empty() {
            for _ in 0..self.indent * self.config.indent_width {
                self.buffer.push(' ');
            }
        }
        self.buffer.push_str(line);
        self.buffer.push('\n');
        self.lines_emitted += 1;
    }

    /// Emits multi-line text, splitting on newlines and indenting every
    /// line. Comment-only lines are dropped when comment stripping is on.
    pub fn emit_block(&mut self, block: &str) {
        for line in block.split('\n') {
            if self.config.strip_comments && is_comment_only(line) {
                continue;
            }
            self.emit_line(line);
        }
    }

    /// Emits a `// `-prefixed comment line, unless comments are stripped.
    pub fn emit_comment(&mut self, comment: &str) {
        if self.config.strip_comments {
            return;
        }
        for line in comment.split('\n') {
            self.emit_line(&format!("// {}", line));
        }
    }

    pub fn increase_indent(&mut self) {
        self.indent += 1;
    }

    pub fn decrease_indent(&mut self) {
        assert!(self.indent > 0, "indentation level dropped below zero");
        self.indent -= 1;
    }

    pub fn current_indent(&self) -> usize {
        self.indent
    }

    /// Number of the next line to be emitted, starting at 1.
    pub fn current_line_number(&self) -> usize {
        self.lines_emitted + 1
    }

    pub fn has_output(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn code(&self) -> &str {
        &self.buffer
    }

    pub fn into_code(self) -> String {
        self.buffer
    }
}

fn is_comment_only(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || (trimmed.starts_with("/*") && trimmed.trim_end().ends_with("*/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_is_applied_per_line() {
        let mut writer = ScriptWriter::new(ScriptWriterConfig::default());
        writer.emit_line("if (x) {");
        writer.increase_indent();
        writer.emit_line("y();");
        writer.decrease_indent();
        writer.emit_line("}");
        assert_eq!(writer.code(), "if (x) {\n    y();\n}\n");
    }

    #[test]
    fn minify_drops_indentation() {
        let mut writer = ScriptWriter::new(ScriptWriterConfig {
            minify: true,
            ..ScriptWriterConfig::default()
        });
        writer.increase_indent();
        writer.emit_line("x();");
        assert_eq!(writer.code(), "x();\n");
    }

    #[test]
    fn comments_can_be_stripped() {
        let mut writer = ScriptWriter::new(ScriptWriterConfig {
            strip_comments: true,
            ..ScriptWriterConfig::default()
        });
        writer.emit_comment("dropped");
        writer.emit_block("a();\n// dropped too\nb();");
        assert_eq!(writer.code(), "a();\nb();\n");
    }

    #[test]
    fn line_numbers_prefix_every_line() {
        let mut writer = ScriptWriter::new(ScriptWriterConfig {
            line_numbers: true,
            ..ScriptWriterConfig::default()
        });
        writer.emit_line("a();");
        writer.emit_line("b();");
        assert_eq!(writer.code(), "1: a();\n2: b();\n");
        assert_eq!(writer.current_line_number(), 3);
    }

    #[test]
    #[should_panic]
    fn unbalanced_dedent_panics() {
        let mut writer = ScriptWriter::new(ScriptWriterConfig::default());
        writer.decrease_indent();
    }
}
