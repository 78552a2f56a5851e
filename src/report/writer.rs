//! Indent-aware line builder for plain-text reports.

pub struct ReportWriter {
    buf: String,
    indent_level: usize,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(512),
            indent_level: 0,
        }
    }

    /// Write a complete line at the current indent.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent_level {
            self.buf.push_str("  ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Heading line followed by an indented body.
    pub fn section(&mut self, title: &str, body: impl FnOnce(&mut Self)) {
        self.line(title);
        self.indent();
        body(self);
        self.dedent();
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}
