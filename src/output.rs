use crate::handle::HandlerResult;
use std::io::Write;

/// Render the final result of a command. `get` prints the bare value and
/// nothing else; the interactive browse loop reports as it goes.
pub fn write_result<W: Write>(
    result: HandlerResult,
    mut output: TerminalOutput<W>,
) -> anyhow::Result<()> {
    match result {
        HandlerResult::Browsed => Ok(()),
        HandlerResult::Created(name) => {
            output.write_line(&format!(r#"Created parameter "{name}"."#))
        }
        HandlerResult::Fetched(value) => output.write_line(value.as_ref()),
        HandlerResult::Deleted(name) => {
            output.write_line(&format!(r#"Deleted parameter "{name}"."#))
        }
    }
}

pub struct TerminalOutput<W> {
    writer: W,
}

impl<W: Write> TerminalOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_line(&mut self, message: &str) -> anyhow::Result<()> {
        self.writer.write_all(message.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(self.writer.flush()?)
    }
}
