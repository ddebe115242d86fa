use anyhow::{Context, Result};
use std::io::Write;
use tracing::{error, warn};

use crate::collector::MetricSample;
use crate::config::OutputFormat;
use crate::error::CollectorError;
use crate::formatter::{JsonFormatter, LineProtocolFormatter};

/// Куда уходят результаты цикла
pub trait MetricSink {
    fn emit(&mut self, sample: &MetricSample) -> Result<()>;

    fn report_error(&mut self, error: &CollectorError);
}

/// Пишет по строке на сэмпл в stdout (или любой другой Write)
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricSink for WriterSink<W> {
    fn emit(&mut self, sample: &MetricSample) -> Result<()> {
        let line = match self.format {
            OutputFormat::Json => JsonFormatter::to_json_compact(sample)?,
            OutputFormat::LineProtocol => match LineProtocolFormatter::format_sample(sample) {
                Some(line) => line,
                None => {
                    warn!("сэмпл {} без полей, пропускаем", sample.name);
                    return Ok(());
                }
            },
        };

        writeln!(self.writer, "{}", line).context("Не удалось записать сэмпл")?;
        self.writer.flush().context("Не удалось записать сэмпл")
    }

    fn report_error(&mut self, err: &CollectorError) {
        error!(kind = err.kind().as_str(), "цикл опроса прерван: {}", err.detailed());
    }
}
