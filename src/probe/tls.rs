use super::ProtocolProbe;
use crate::error::ProbeError;
use crate::model::{ProbeSettings, ProtocolVersion};
use async_trait::async_trait;
use openssl::ssl::{SslConnector, SslMethod, SslOptions, SslVerifyMode, SslVersion};
use std::net::SocketAddr;
use std::pin::Pin;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_openssl::SslStream;

const PERMISSIVE_CIPHERS: &str = "ALL:@SECLEVEL=0";

#[derive(Clone, Copy, Debug, Default)]
pub struct TlsProbe;

#[async_trait]
impl ProtocolProbe for TlsProbe {
    fn name(&self) -> &'static str {
        "tls"
    }

    async fn attempt(
        &self,
        endpoint: SocketAddr,
        server_name: &str,
        protocol: ProtocolVersion,
        settings: &ProbeSettings,
    ) -> Result<ProtocolVersion, ProbeError> {
        // Build the context first so versions we cannot express never touch
        // the network.
        let connector = connector_for(protocol)?;

        let stream = match timeout(settings.connect_timeout, TcpStream::connect(endpoint)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return Err(ProbeError::Connect(err)),
            Err(_) => return Err(ProbeError::ConnectTimeout(settings.connect_timeout)),
        };

        let sni = if server_name.is_empty() {
            endpoint.ip().to_string()
        } else {
            server_name.to_string()
        };
        let ssl = connector
            .configure()?
            .verify_hostname(false)
            .into_ssl(&sni)?;
        let mut tls_stream = SslStream::new(ssl, stream)?;

        // A lost race drops the pending handshake; returning then drops the
        // stream and closes the socket.
        match timeout(settings.handshake_timeout, Pin::new(&mut tls_stream).connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Err(ProbeError::HandshakeTimeout(settings.handshake_timeout)),
        }

        let reported = tls_stream.ssl().version_str();
        Ok(ProtocolVersion::from_openssl_label(reported).unwrap_or(protocol))
    }
}

fn wire_version(protocol: ProtocolVersion) -> Result<Option<SslVersion>, ProbeError> {
    match protocol {
        ProtocolVersion::NegotiateDefault => Ok(None),
        // OpenSSL 1.1 removed SSLv2 entirely.
        ProtocolVersion::Ssl2 => Err(ProbeError::Unavailable(protocol)),
        ProtocolVersion::Ssl3 => Ok(Some(SslVersion::SSL3)),
        ProtocolVersion::Tls10 => Ok(Some(SslVersion::TLS1)),
        ProtocolVersion::Tls11 => Ok(Some(SslVersion::TLS1_1)),
        ProtocolVersion::Tls12 => Ok(Some(SslVersion::TLS1_2)),
        ProtocolVersion::Tls13 => Ok(Some(SslVersion::TLS1_3)),
    }
}

fn connector_for(protocol: ProtocolVersion) -> Result<SslConnector, ProbeError> {
    let version = wire_version(protocol)?;
    let mut builder = SslConnector::builder(SslMethod::tls())?;
    builder.set_verify(SslVerifyMode::NONE);

    if let Some(version) = version {
        builder.set_min_proto_version(Some(version))?;
        builder.set_max_proto_version(Some(version))?;
        if protocol != ProtocolVersion::Tls13 {
            builder.set_cipher_list(PERMISSIVE_CIPHERS)?;
        }
        if protocol == ProtocolVersion::Ssl3 {
            builder.clear_options(SslOptions::NO_SSLV3);
        }
    }

    Ok(builder.build())
}
