use crate::engine::ProbeOrchestrator;
use crate::model::{ProtocolClass, ProtocolVersion, TargetView};
use crate::util::now_iso8601;
use colored::Color;
use futures::future::join_all;
use serde::Serialize;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warning,
    Bad,
}

impl Severity {
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Good => "[Good]   ",
            Severity::Warning => "[Warning]",
            Severity::Bad => "[Bad]    ",
        }
    }
}

pub fn severity(protocol: ProtocolVersion, supported: bool) -> Severity {
    match (protocol.class(), supported) {
        (ProtocolClass::Default, true) => Severity::Good,
        (ProtocolClass::Default, false) => Severity::Warning,
        (ProtocolClass::Legacy, true) => Severity::Warning,
        (ProtocolClass::Legacy, false) => Severity::Good,
        (ProtocolClass::Modern, true) => Severity::Good,
        (ProtocolClass::Modern, false) => Severity::Warning,
    }
}

pub fn tint(protocol: ProtocolVersion, supported: bool) -> Color {
    match (protocol.class(), supported) {
        (ProtocolClass::Default, _) => Color::Blue,
        (ProtocolClass::Legacy, true) => Color::Yellow,
        (ProtocolClass::Legacy, false) => Color::Green,
        (ProtocolClass::Modern, true) => Color::Green,
        (ProtocolClass::Modern, false) => Color::Red,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolRow {
    pub protocol: ProtocolVersion,
    pub class: ProtocolClass,
    pub supported: bool,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negotiated: Option<ProtocolVersion>,
}

impl ProtocolRow {
    pub fn new(protocol: ProtocolVersion, supported: bool) -> Self {
        Self {
            protocol,
            class: protocol.class(),
            supported,
            severity: severity(protocol, supported),
            negotiated: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub target: TargetView,
    pub timestamp: String,
    pub valid: bool,
    pub rows: Vec<ProtocolRow>,
}

impl Report {
    pub fn preferred(&self) -> impl Iterator<Item = &ProtocolRow> {
        self.rows.iter().filter(|row| row.class.is_preferred())
    }

    pub fn obsolete(&self) -> impl Iterator<Item = &ProtocolRow> {
        self.rows.iter().filter(|row| !row.class.is_preferred())
    }
}

pub async fn build_report(prober: &ProbeOrchestrator, uri: &Url, reverse_dns: bool) -> Report {
    let addr = prober.address().await;
    let rdns = match addr {
        Some(ip) if reverse_dns => crate::input::reverse_name(ip).await,
        _ => None,
    };

    let mut rows = join_all(ProtocolVersion::ALL.into_iter().map(|protocol| async move {
        ProtocolRow::new(protocol, prober.is_supported(protocol).await)
    }))
    .await;

    if let Some(row) = rows
        .iter_mut()
        .find(|row| row.protocol == ProtocolVersion::NegotiateDefault)
    {
        row.negotiated = prober.negotiated_default().await;
    }

    let target = prober.target();
    Report {
        target: TargetView {
            uri: uri.to_string(),
            host: target.host.clone(),
            port: target.port,
            addr: addr.map(|ip| ip.to_string()),
            rdns,
        },
        timestamp: now_iso8601(),
        valid: prober.is_valid().await,
        rows,
    }
}
