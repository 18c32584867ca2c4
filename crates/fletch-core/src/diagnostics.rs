//! A small diagnostic sink collected during analysis and emission.
//! This crate's diagnostics are all advisory-but-mandatory:
//! they're computed unconditionally during analysis and emission, and
//! never block emission themselves (only a [`crate::error::FletchError`]
//! does that). Callers decide whether `Severity::Error` diagnostics
//! should stop a build.

use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{tag}: {}", self.message)
    }
}

/// Ordered collection of diagnostics recorded during a single
/// compilation. Diagnostics are emitted at the point of detection (7.1
/// propagation policy): nothing here deduplicates or reorders.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        #[cfg(feature = "auto_print_diagnostics")]
        eprintln!("{}", Diagnostic { severity, message: message.clone() });
        self.entries.push(Diagnostic { severity, message });
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Prints every diagnostic to `writer`, one per line, matching the
    /// "human-readable messages; format is not a compatibility surface"
    /// contract from 6.3.
    pub fn dump<W: std::io::Write>(&self, mut writer: W) -> std::io::Result<()> {
        for d in &self.entries {
            writeln!(writer, "{d}")?;
        }
        Ok(())
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}
