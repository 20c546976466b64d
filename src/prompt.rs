use std::io::{BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("input was cancelled")]
    Cancelled,
    #[error("Encountered IO error when interacting with the terminal")]
    Io(#[from] std::io::Error),
}

/// The capabilities the interactive flows need from a terminal. Every call
/// blocks until the user answers; end of input is [`PromptError::Cancelled`].
pub trait Prompt {
    /// Present `options` and return the index of the chosen one.
    fn select(&mut self, prompt: &str, options: &[String]) -> Result<usize, PromptError>;

    /// Read a line of text, falling back to `default` on empty input.
    fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError>;

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str) -> Result<bool, PromptError>;
}

pub struct TerminalPrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn read_line(&mut self) -> Result<String, PromptError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(PromptError::Cancelled);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn select(&mut self, prompt: &str, options: &[String]) -> Result<usize, PromptError> {
        writeln!(self.writer, "{prompt}")?;
        for (position, option) in options.iter().enumerate() {
            writeln!(self.writer, "  {}) {option}", position + 1)?;
        }
        loop {
            write!(self.writer, "Choose [1-{}]: ", options.len())?;
            self.writer.flush()?;
            let line = self.read_line()?;
            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=options.len()).contains(&choice) => return Ok(choice - 1),
                _ => writeln!(self.writer, "Not a valid choice.")?,
            }
        }
    }

    fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
        match default {
            Some(default) => write!(self.writer, "{prompt} [{default}]: ")?,
            None => write!(self.writer, "{prompt}: ")?,
        }
        self.writer.flush()?;
        let line = self.read_line()?;
        if line.is_empty() {
            if let Some(default) = default {
                return Ok(default.to_owned());
            }
        }
        Ok(line)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, PromptError> {
        loop {
            write!(self.writer, "{prompt} [y/n]: ")?;
            self.writer.flush()?;
            let line = self.read_line()?;
            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.writer, "Please answer y or n.")?,
            }
        }
    }
}
