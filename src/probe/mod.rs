mod capability;
mod tls;

pub use capability::CapabilitySet;
pub use tls::TlsProbe;

use crate::error::ProbeError;
use crate::model::{ProbeOutcome, ProbeSettings, ProtocolVersion};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::time::timeout;
use tracing::debug;

/// One connect-and-handshake attempt restricted to a single protocol.
#[async_trait]
pub trait ProtocolProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        endpoint: SocketAddr,
        server_name: &str,
        protocol: ProtocolVersion,
        settings: &ProbeSettings,
    ) -> Result<ProtocolVersion, ProbeError>;
}

pub async fn run(
    probe: &dyn ProtocolProbe,
    endpoint: SocketAddr,
    server_name: &str,
    protocol: ProtocolVersion,
    settings: &ProbeSettings,
    capabilities: &CapabilitySet,
) -> ProbeOutcome {
    match bounded(probe, endpoint, server_name, protocol, settings).await {
        Ok(negotiated) => {
            capabilities.merge(negotiated);
            debug!(
                probe = probe.name(),
                %endpoint,
                %protocol,
                %negotiated,
                "handshake negotiated"
            );
            ProbeOutcome {
                protocol,
                negotiated: Some(negotiated),
            }
        }
        Err(err) => {
            debug!(
                probe = probe.name(),
                %endpoint,
                %protocol,
                stage = err.stage(),
                error = %err,
                "protocol not supported"
            );
            ProbeOutcome::unsupported(protocol)
        }
    }
}

async fn bounded(
    probe: &dyn ProtocolProbe,
    endpoint: SocketAddr,
    server_name: &str,
    protocol: ProtocolVersion,
    settings: &ProbeSettings,
) -> Result<ProtocolVersion, ProbeError> {
    let deadline = settings.connect_timeout + settings.handshake_timeout;
    let attempt = probe.attempt(endpoint, server_name, protocol, settings);
    match timeout(deadline, attempt).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Deadline(deadline)),
    }
}
