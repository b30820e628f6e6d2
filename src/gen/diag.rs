//! Diagnostic sinks
//!
//! The generator reports warnings and errors through a [`Diagnostics`]
//! implementation supplied by its caller. A message is handed over as a
//! sequence of printable parts, which a sink concatenates into one line.

use std::fmt::{Display, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

pub trait Diagnostics {
    fn emit(&mut self, severity: Severity, parts: &[&dyn Display]);
}

/// Concatenates `parts` and terminates the result with a line break
pub fn render(parts: &[&dyn Display]) -> String {
    let mut line = String::new();
    for part in parts {
        // writing into a String cannot fail
        let _ = write!(line, "{part}");
    }
    line.push('\n');
    line
}

/// Forwards diagnostics to the `log` facade, under the target `berium::gen`
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl Diagnostics for LogSink {
    fn emit(&mut self, severity: Severity, parts: &[&dyn Display]) {
        let line = render(parts);
        let line = line.trim_end();
        match severity {
            Severity::Note => log::info!(target: "berium::gen", "{line}"),
            Severity::Warning => log::warn!(target: "berium::gen", "{line}"),
            Severity::Error => log::error!(target: "berium::gen", "{line}"),
        }
    }
}

/// Keeps every diagnostic for later inspection
#[derive(Clone, Debug, Default)]
pub struct CollectSink {
    pub lines: Vec<(Severity, String)>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lines.iter().filter(|(s, _)| *s == severity).count()
    }
}

impl Diagnostics for CollectSink {
    fn emit(&mut self, severity: Severity, parts: &[&dyn Display]) {
        self.lines.push((severity, render(parts)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_concatenate() {
        let mut sink = CollectSink::new();
        sink.emit(Severity::Error, &[&"type ", &"Foo", &": ", &42]);
        sink.emit(Severity::Warning, &[&"unused"]);
        assert_eq!(sink.lines[0], (Severity::Error, "type Foo: 42\n".to_owned()));
        assert_eq!(sink.count(Severity::Error), 1);
        assert_eq!(sink.count(Severity::Note), 0);
    }

    #[test]
    fn log_sink_accepts_everything() {
        let mut sink = LogSink;
        sink.emit(Severity::Note, &[&"generated ", &3, &" types"]);
    }
}
