//! A small chainable code-emission helper used by every component that
//! produces C source (`w.wrtln(...)?.indent()`, `w.dedent().wrtln("}")?`,
//! etc). Every write returns `&mut Self` wrapped in an `io::Result` so
//! callers can keep `?`-chaining.

use std::io::{self, Write};

pub struct CodeWriter<W: Write> {
    out: W,
    indent: usize,
    spaces_per_indent: usize,
    at_line_start: bool,
}

impl<W: Write> CodeWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, indent: 0, spaces_per_indent: 2, at_line_start: true }
    }

    pub fn indent_spaces(&mut self, n: usize) -> &mut Self {
        self.spaces_per_indent = n;
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    fn write_indent(&mut self) -> io::Result<()> {
        if self.at_line_start {
            write!(self.out, "{}", " ".repeat(self.indent * self.spaces_per_indent))?;
            self.at_line_start = false;
        }
        Ok(())
    }

    /// Writes raw text with no trailing newline, honoring the current
    /// indent only if this is the first write since the last newline.
    pub fn wrt(&mut self, text: &str) -> io::Result<&mut Self> {
        self.write_indent()?;
        write!(self.out, "{text}")?;
        Ok(self)
    }

    /// Writes indented text followed by a newline.
    pub fn wrtln(&mut self, text: &str) -> io::Result<&mut Self> {
        self.write_indent()?;
        writeln!(self.out, "{text}")?;
        self.at_line_start = true;
        Ok(self)
    }

    /// Alias for [`Self::wrtln`] kept for readability at call sites that
    /// read more naturally as "write a line" than "write, with a
    /// newline".
    pub fn write_line(&mut self, text: &str) -> io::Result<&mut Self> {
        self.wrtln(text)
    }

    pub fn newline(&mut self) -> io::Result<&mut Self> {
        writeln!(self.out)?;
        self.at_line_start = true;
        Ok(self)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
