//! Line-oriented terminal input.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use anyhow::Result;
use dialoguer::Password;

/// Reads answers line by line from `input` and writes prompts to `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Print `question` and read one trimmed line. `None` means end of input.
    pub fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn say<D: Display>(&mut self, line: D) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }
}

/// Source of the encryption passphrase.
pub trait SecretSource {
    fn passphrase(&mut self) -> Result<String>;
}

/// Asks on the terminal without echoing the input.
pub struct TerminalSecret;

impl SecretSource for TerminalSecret {
    fn passphrase(&mut self) -> Result<String> {
        let passphrase = Password::new()
            .with_prompt("Set encryption password")
            .interact()?;
        Ok(passphrase)
    }
}
