//! Line-oriented terminal access.
//!
//! Everything the console reads or prints goes through [`Terminal`] so the
//! session loop can be driven by a script in tests.

use std::io::{self, BufRead, Write};

/// Line-based input and output.
pub trait Terminal: Send {
    /// Print `prompt` and read one line without its newline.
    /// `Ok(None)` means input is closed.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Like [`Terminal::read_line`] but without echoing the input.
    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Print one line.
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Terminal bound to the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdTerminal;

impl Terminal for StdTerminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match rpassword::prompt_password(prompt) {
            Ok(secret) => Ok(Some(secret)),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")
    }
}
