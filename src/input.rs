use crate::error::ProbeError;
use crate::model::TargetSpec;
use anyhow::Context;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use tokio::net::lookup_host;
use url::Url;

#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve(&self, target: &TargetSpec) -> Result<SocketAddr, ProbeError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

#[async_trait]
impl TargetResolver for SystemResolver {
    async fn resolve(&self, target: &TargetSpec) -> Result<SocketAddr, ProbeError> {
        let host = target.host.trim_start_matches('[').trim_end_matches(']');
        let mut addrs = lookup_host((host, target.port))
            .await
            .map_err(|source| ProbeError::Resolution {
                host: target.host.clone(),
                source,
            })?;
        let first = addrs.next().ok_or_else(|| ProbeError::NoAddress {
            host: target.host.clone(),
        })?;
        Ok(SocketAddr::new(first.ip(), target.port))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StaticResolver(pub SocketAddr);

#[async_trait]
impl TargetResolver for StaticResolver {
    async fn resolve(&self, _target: &TargetSpec) -> Result<SocketAddr, ProbeError> {
        Ok(self.0)
    }
}

pub fn display_uri(scheme: &str, target: &TargetSpec) -> anyhow::Result<Url> {
    let host = if target.host.contains(':') && !target.host.starts_with('[') {
        format!("[{}]", target.host)
    } else {
        target.host.clone()
    };
    let raw = format!("{scheme}://{host}:{}/", target.port);
    Url::parse(&raw).with_context(|| format!("cannot build a URI from {raw}"))
}

pub async fn reverse_name(addr: IpAddr) -> Option<String> {
    match tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&addr)).await {
        Ok(Ok(name)) if name != addr.to_string() => Some(name),
        Ok(Ok(_)) => None,
        Ok(Err(err)) => {
            tracing::debug!(%addr, error = %err, "reverse lookup failed");
            None
        }
        Err(err) => {
            tracing::warn!(%addr, error = %err, "reverse lookup task failed");
            None
        }
    }
}
