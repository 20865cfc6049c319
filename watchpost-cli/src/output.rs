//! Output rendering for the CLI.
//!
//! Every subcommand produces a payload implementing both
//! [`serde::Serialize`] and [`Render`]. The [`OutputWriter`] picks the
//! wire form, so handlers never branch on the output format themselves.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes command payloads to stdout in the selected format.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        self.write_to(payload, &mut stdout.lock())
    }

    /// Render a payload into an arbitrary writer.
    ///
    /// Text goes through [`Render::render_text`]; JSON is pretty-printed
    /// and finished with a newline.
    fn write_to<T, W>(&self, payload: &T, w: &mut W) -> Result<(), CliError>
    where
        T: Render + Serialize,
        W: Write,
    {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable rendering, implemented by every CLI output payload
/// alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}
