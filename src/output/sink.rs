use super::report::{tint, ProtocolRow, Report, Severity};
use crate::model::{OutputConfig, OutputFormat, ProtocolClass, ProtocolVersion};
use colored::Colorize;
use serde::Serialize;
use std::io::{BufWriter, Write};

pub struct OutputSink<W: Write> {
    cfg: OutputConfig,
    writer: BufWriter<W>,
}

#[derive(Serialize)]
struct JsonlRow<'a> {
    timestamp: &'a str,
    uri: &'a str,
    host: &'a str,
    ip: Option<&'a str>,
    port: u16,
    protocol: ProtocolVersion,
    class: ProtocolClass,
    supported: bool,
    severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    negotiated: Option<ProtocolVersion>,
}

impl OutputSink<std::io::Stdout> {
    pub fn stdout(cfg: OutputConfig) -> Self {
        Self::new(cfg, std::io::stdout())
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(cfg: OutputConfig, writer: W) -> Self {
        Self {
            cfg,
            writer: BufWriter::new(writer),
        }
    }

    pub fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        match self.cfg.format {
            OutputFormat::Jsonl => self.write_jsonl(report)?,
            OutputFormat::Pretty => self.write_pretty(report)?,
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to flush report: {}", err.error()))
    }

    fn write_jsonl(&mut self, report: &Report) -> anyhow::Result<()> {
        for row in &report.rows {
            let line = JsonlRow {
                timestamp: &report.timestamp,
                uri: &report.target.uri,
                host: &report.target.host,
                ip: report.target.addr.as_deref(),
                port: report.target.port,
                protocol: row.protocol,
                class: row.class,
                supported: row.supported,
                severity: row.severity,
                negotiated: row.negotiated,
            };
            writeln!(self.writer, "{}", serde_json::to_string(&line)?)?;
        }
        Ok(())
    }

    fn write_pretty(&mut self, report: &Report) -> anyhow::Result<()> {
        let target = &report.target;
        let ip = target.addr.as_deref().unwrap_or("None");
        match &target.rdns {
            Some(name) => writeln!(
                self.writer,
                "Checking: {} (IP resolved as {ip}, {name})",
                target.uri
            )?,
            None => writeln!(self.writer, "Checking: {} (IP resolved as {ip})", target.uri)?,
        }

        if !report.valid {
            let line = format!(
                "  {}: {} could not be resolved, nothing was probed",
                Severity::Bad.tag(),
                target.host
            );
            self.write_line(line, colored::Color::Red)?;
        }

        writeln!(self.writer, "Preferred:")?;
        for row in report.preferred() {
            self.write_row(row)?;
        }
        writeln!(self.writer)?;

        writeln!(self.writer, "Obsolete:")?;
        for row in report.obsolete() {
            self.write_row(row)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_row(&mut self, row: &ProtocolRow) -> anyhow::Result<()> {
        let verdict = if row.supported {
            "is supported"
        } else {
            "is not supported"
        };
        let mut line = format!("  {}: {} {verdict}", row.severity.tag(), row.protocol);
        if let Some(negotiated) = row.negotiated {
            line.push_str(&format!(" (negotiates {negotiated})"));
        }
        self.write_line(line, tint(row.protocol, row.supported))
    }

    fn write_line(&mut self, line: String, color: colored::Color) -> anyhow::Result<()> {
        if self.cfg.color {
            writeln!(self.writer, "{}", line.as_str().color(color))?;
        } else {
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }
}
