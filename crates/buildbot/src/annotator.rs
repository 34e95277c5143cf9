//! Build step annotations
//!
//! The CI log parser looks for `@@@BUILD_STEP <name>@@@` to open a step and
//! `@@@STEP_FAILURE@@@` to mark the current one as failed. Everything else
//! the bot prints is plain log text.

use std::io::{self, Write};

/// Writes step markers and log lines to the CI log
pub struct Annotator<W: Write> {
    out: W,
}

impl Annotator<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Annotator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Open a step
    pub fn step(&mut self, name: &str) {
        self.line(&format!("@@@BUILD_STEP {name}@@@"));
    }

    /// Mark the current step as failed
    pub fn failure(&mut self) {
        self.line("@@@STEP_FAILURE@@@");
    }

    /// Plain log line, flushed so it lands before any child output
    pub fn line(&mut self, text: &str) {
        // best effort
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markers() {
        let mut annotator = Annotator::new(Vec::new());
        annotator.step("build sdk");
        annotator.line("running tools/build.py");
        annotator.failure();
        assert_eq!(
            String::from_utf8(annotator.into_inner()).unwrap(),
            "@@@BUILD_STEP build sdk@@@\nrunning tools/build.py\n@@@STEP_FAILURE@@@\n"
        );
    }
}
