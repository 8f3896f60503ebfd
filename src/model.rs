use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);
pub const DEFAULT_PORT: u16 = 443;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub host: String,
    pub port: u16,
}

impl TargetSpec {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if host.contains(':') {
            write!(f, "[{}]:{}", host, self.port)
        } else {
            write!(f, "{}:{}", host, self.port)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub connect_timeout: Duration,
    pub handshake_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target: TargetSpec,
    pub scheme: String,
    pub probe: ProbeSettings,
    pub reverse_dns: bool,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jsonl,
    Pretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// The fixed universe of transport-security versions under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    NegotiateDefault,
    Ssl2,
    Ssl3,
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 7] = [
        ProtocolVersion::NegotiateDefault,
        ProtocolVersion::Ssl2,
        ProtocolVersion::Ssl3,
        ProtocolVersion::Tls10,
        ProtocolVersion::Tls11,
        ProtocolVersion::Tls12,
        ProtocolVersion::Tls13,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProtocolVersion::NegotiateDefault => "Default",
            ProtocolVersion::Ssl2 => "SSLv2",
            ProtocolVersion::Ssl3 => "SSLv3",
            ProtocolVersion::Tls10 => "TLSv1.0",
            ProtocolVersion::Tls11 => "TLSv1.1",
            ProtocolVersion::Tls12 => "TLSv1.2",
            ProtocolVersion::Tls13 => "TLSv1.3",
        }
    }

    pub fn from_openssl_label(label: &str) -> Option<Self> {
        match label {
            "SSLv2" => Some(ProtocolVersion::Ssl2),
            "SSLv3" => Some(ProtocolVersion::Ssl3),
            "TLSv1" | "TLSv1.0" => Some(ProtocolVersion::Tls10),
            "TLSv1.1" => Some(ProtocolVersion::Tls11),
            "TLSv1.2" => Some(ProtocolVersion::Tls12),
            "TLSv1.3" => Some(ProtocolVersion::Tls13),
            _ => None,
        }
    }

    pub fn class(&self) -> ProtocolClass {
        match self {
            ProtocolVersion::NegotiateDefault => ProtocolClass::Default,
            ProtocolVersion::Ssl2
            | ProtocolVersion::Ssl3
            | ProtocolVersion::Tls10
            | ProtocolVersion::Tls11 => ProtocolClass::Legacy,
            ProtocolVersion::Tls12 | ProtocolVersion::Tls13 => ProtocolClass::Modern,
        }
    }

    pub(crate) fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolClass {
    Default,
    Legacy,
    Modern,
}

impl ProtocolClass {
    pub fn is_preferred(&self) -> bool {
        !matches!(self, ProtocolClass::Legacy)
    }
}

/// Progress of a target's one-shot initialization. Only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InitPhase {
    Uninitialized,
    Resolving,
    ProbingAll,
    Initialized { valid: bool },
}

impl InitPhase {
    pub fn is_initialized(&self) -> bool {
        matches!(self, InitPhase::Initialized { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub protocol: ProtocolVersion,
    pub negotiated: Option<ProtocolVersion>,
}

impl ProbeOutcome {
    pub fn unsupported(protocol: ProtocolVersion) -> Self {
        Self {
            protocol,
            negotiated: None,
        }
    }

    pub fn supported(&self) -> bool {
        self.negotiated.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetView {
    pub uri: String,
    pub host: String,
    pub port: u16,
    pub addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdns: Option<String>,
}
