use rand::Rng;
use std::io::{self, BufRead, Write};

/// Host-side I/O capability backing the memory-mapped window at `0xF0..=0xFB`.
/// Injected into the engine so tests can substitute canned input/output and a
/// seeded generator, and the CLI driver can substitute real stdio.
pub trait HostIo {
    fn read_line(&mut self) -> io::Result<String>;
    fn write_str(&mut self, s: &str);
    fn random_word(&mut self) -> u16;
}

/// Real standard input/output, backed by a thread-local RNG.
pub struct StdIo {
    stdout: io::Stdout,
}

impl StdIo {
    pub fn new() -> StdIo {
        StdIo {
            stdout: io::stdout(),
        }
    }
}

impl Default for StdIo {
    fn default() -> StdIo {
        StdIo::new()
    }
}

impl HostIo for StdIo {
    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }

    fn write_str(&mut self, s: &str) {
        let _ = self.stdout.write_all(s.as_bytes());
        let _ = self.stdout.flush();
    }

    fn random_word(&mut self) -> u16 {
        rand::thread_rng().gen()
    }
}

/// An in-memory [`HostIo`] double: feeds pre-recorded input lines, captures every
/// write, and draws from a deterministic sequence of "random" words.
pub struct RecordedIo {
    input: std::collections::VecDeque<String>,
    pub output: String,
    random_sequence: std::collections::VecDeque<u16>,
}

impl RecordedIo {
    pub fn new<I, R>(input_lines: I, random_sequence: R) -> RecordedIo
    where
        I: IntoIterator<Item = String>,
        R: IntoIterator<Item = u16>,
    {
        RecordedIo {
            input: input_lines.into_iter().collect(),
            output: String::new(),
            random_sequence: random_sequence.into_iter().collect(),
        }
    }
}

impl HostIo for RecordedIo {
    fn read_line(&mut self) -> io::Result<String> {
        self.input
            .pop_front()
            .map(|mut line| {
                line.push('\n');
                line
            })
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more recorded input"))
    }

    fn write_str(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn random_word(&mut self) -> u16 {
        self.random_sequence.pop_front().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_io_replays_input_and_captures_output() {
        let mut io = RecordedIo::new(vec!["5".to_string()], vec![42u16]);

        assert_eq!(io.read_line().unwrap(), "5\n");
        io.write_str("hello");
        assert_eq!(io.output, "hello");
        assert_eq!(io.random_word(), 42);
        assert_eq!(io.random_word(), 0);
    }
}
