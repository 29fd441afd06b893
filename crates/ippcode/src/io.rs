//! Output and input abstraction.
//!
//! The engine never touches process streams directly: `WRITE` output and
//! `DPRINT`/`BREAK` diagnostics go through an [`OutputSink`], and `READ`
//! pulls lines from an [`InputSource`]. The standard implementations wire
//! the real streams; [`CollectSink`] and [`LinesSource`] make runs fully
//! hermetic for tests and embedding.

use std::{
    collections::VecDeque,
    io::{self, BufRead, Write as _},
};

/// Sink for program output and diagnostics.
///
/// `stdout` carries only `WRITE` output; every diagnostic (errors, `DPRINT`,
/// `BREAK`) goes to `stderr`. Write failures are deliberately swallowed:
/// there is no exit code for a broken output pipe.
pub trait OutputSink {
    /// Appends `WRITE` output. No separator or newline is added.
    fn stdout_write(&mut self, output: &str);

    /// Appends one diagnostic chunk to the error stream.
    fn stderr_write(&mut self, output: &str);
}

/// Default sink writing to the process's stdout and stderr.
#[derive(Debug, Default)]
pub struct StdSink;

impl StdSink {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for StdSink {
    fn stdout_write(&mut self, output: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
        let _ = stdout.flush();
    }

    fn stderr_write(&mut self, output: &str) {
        let mut stderr = io::stderr().lock();
        let _ = stderr.write_all(output.as_bytes());
        let _ = stderr.flush();
    }
}

/// Sink collecting both streams into strings.
#[derive(Debug, Default)]
pub struct CollectSink {
    stdout: String,
    stderr: String,
}

impl CollectSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written to stdout so far.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Everything written to stderr so far.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Consumes the sink and returns `(stdout, stderr)`.
    #[must_use]
    pub fn into_output(self) -> (String, String) {
        (self.stdout, self.stderr)
    }
}

impl OutputSink for CollectSink {
    fn stdout_write(&mut self, output: &str) {
        self.stdout.push_str(output);
    }

    fn stderr_write(&mut self, output: &str) {
        self.stderr.push_str(output);
    }
}

/// Source of input lines for `READ`.
pub trait InputSource {
    /// The next input line without its trailing newline, or `None` at
    /// end-of-stream.
    fn read_line(&mut self) -> Option<String>;
}

/// Input source backed by any buffered reader.
#[derive(Debug)]
pub struct ReaderSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> InputSource for ReaderSource<R> {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(line)
            }
        }
    }
}

/// Input source reading from the process's standard input.
#[derive(Debug, Default)]
pub struct StdinSource;

impl StdinSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for StdinSource {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(line)
            }
        }
    }
}

/// Input source over a fixed sequence of lines.
#[derive(Debug, Default)]
pub struct LinesSource {
    lines: VecDeque<String>,
}

impl LinesSource {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl InputSource for LinesSource {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_source_strips_line_endings() {
        let mut source = ReaderSource::new("one\ntwo\r\nthree".as_bytes());
        assert_eq!(source.read_line().as_deref(), Some("one"));
        assert_eq!(source.read_line().as_deref(), Some("two"));
        assert_eq!(source.read_line().as_deref(), Some("three"));
        assert_eq!(source.read_line(), None);
    }

    #[test]
    fn lines_source_drains_in_order() {
        let mut source = LinesSource::new(["a", "b"]);
        assert_eq!(source.read_line().as_deref(), Some("a"));
        assert_eq!(source.read_line().as_deref(), Some("b"));
        assert_eq!(source.read_line(), None);
    }

    #[test]
    fn collect_sink_separates_streams() {
        let mut sink = CollectSink::new();
        sink.stdout_write("out");
        sink.stderr_write("err");
        assert_eq!(sink.stdout(), "out");
        assert_eq!(sink.stderr(), "err");
    }
}
