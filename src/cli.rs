use crate::model::{
    Config, OutputConfig, OutputFormat, ProbeSettings, TargetSpec, DEFAULT_PORT,
};
use clap::{ArgAction, Parser, ValueEnum};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reports which SSL/TLS protocol versions a host will negotiate",
    long_about = None
)]
pub struct Cli {
    /// Host to probe
    #[arg(short = 'H', long = "host", value_name = "HOST")]
    pub host: String,

    /// Port to probe
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Scheme used only to display the target URI
    #[arg(long = "scheme", default_value = "http")]
    pub scheme: String,

    /// Handshake timeout per protocol in milliseconds
    #[arg(long = "timeout", default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Connect timeout per protocol in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 1500)]
    pub connect_timeout_ms: u64,

    /// Output format
    #[arg(long = "output", default_value_t = Format::Pretty)]
    pub output: Format,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,

    /// Look up the reverse DNS name of the resolved address
    #[arg(long = "reverse-dns", action = ArgAction::SetTrue)]
    pub reverse_dns: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Pretty,
    Jsonl,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Pretty => write!(f, "pretty"),
            Format::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Config> {
        let host = self.host.trim().to_string();
        if host.is_empty() {
            anyhow::bail!("--host must not be empty");
        }

        if self.port == 0 {
            anyhow::bail!("port must be greater than zero");
        }

        if self.timeout_ms == 0 || self.connect_timeout_ms == 0 {
            anyhow::bail!("timeouts must be greater than zero");
        }

        if self.scheme.is_empty() {
            anyhow::bail!("--scheme must not be empty");
        }

        Ok(Config {
            target: TargetSpec::new(host, self.port),
            scheme: self.scheme,
            probe: ProbeSettings {
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                handshake_timeout: Duration::from_millis(self.timeout_ms),
            },
            reverse_dns: self.reverse_dns,
            output: OutputConfig {
                format: match self.output {
                    Format::Pretty => OutputFormat::Pretty,
                    Format::Jsonl => OutputFormat::Jsonl,
                },
                color: !self.no_color && matches!(self.output, Format::Pretty),
            },
        })
    }
}
