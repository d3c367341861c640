//! Host I/O seams consulted by the `print`/`input` intrinsics.
//!
//! The core evaluator never touches stdio directly, so a test or an
//! embedding host can swap in a buffer.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

pub trait PrintWriter {
    fn print(&mut self, text: &str);
}

pub trait InputReader {
    /// Reads one line (without its trailing newline), or `None` at EOF.
    fn read_line(&mut self, prompt: Option<&str>) -> Option<String>;
}

/// The default host: writes to real stdout, reads from real stdin.
#[derive(Default)]
pub struct StdIo;

impl PrintWriter for StdIo {
    fn print(&mut self, text: &str) {
        print!("{text}");
        let _ = io::stdout().flush();
    }
}

impl InputReader for StdIo {
    fn read_line(&mut self, prompt: Option<&str>) -> Option<String> {
        if let Some(p) = prompt {
            print!("{p}");
            let _ = io::stdout().flush();
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(line)
            }
            Err(_) => None,
        }
    }
}

/// An in-memory host used by tests and by the scenario suite in
/// `tests/scenarios.rs`: captures every `print` call and replays canned
/// answers for `input`.
#[derive(Default)]
pub struct CollectingIo {
    pub output: RefCell<String>,
    pub scripted_input: RefCell<Vec<String>>,
}

impl CollectingIo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_input(lines: Vec<String>) -> Self {
        Self { output: RefCell::new(String::new()), scripted_input: RefCell::new(lines) }
    }

    #[must_use]
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }
}

impl PrintWriter for CollectingIo {
    fn print(&mut self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }
}

impl InputReader for CollectingIo {
    fn read_line(&mut self, _prompt: Option<&str>) -> Option<String> {
        let mut lines = self.scripted_input.borrow_mut();
        if lines.is_empty() {
            None
        } else {
            Some(lines.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_io_buffers_print_calls() {
        let mut io = CollectingIo::new();
        io.print("hi");
        io.print("\n");
        assert_eq!(io.output(), "hi\n");
    }

    #[test]
    fn collecting_io_replays_scripted_lines() {
        let mut io = CollectingIo::with_input(vec!["Flux".to_string()]);
        assert_eq!(io.read_line(None), Some("Flux".to_string()));
        assert_eq!(io.read_line(None), None);
    }
}
