use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{Ssl, SslContext, SslMethod, SslOptions, SslVersion};
use openssl::x509::{X509NameBuilder, X509};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio_openssl::SslStream;

/// TLS server on an ephemeral port that only speaks `min..=max`.
pub struct MockTlsServer {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    handshakes: Arc<AtomicUsize>,
}

impl MockTlsServer {
    pub async fn start(min: SslVersion, max: SslVersion) -> Self {
        Self::start_with_delay(min, max, Duration::ZERO).await
    }

    /// Waits `delay` after accepting TCP before answering the ClientHello.
    pub async fn start_with_delay(min: SslVersion, max: SslVersion, delay: Duration) -> Self {
        let context = Arc::new(context(min, max));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let handshakes = Arc::new(AtomicUsize::new(0));

        let conn_counter = connections.clone();
        let hs_counter = handshakes.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                conn_counter.fetch_add(1, Ordering::SeqCst);
                let context = context.clone();
                let hs_counter = hs_counter.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let ssl = Ssl::new(&context).unwrap();
                    let mut stream = SslStream::new(ssl, socket).unwrap();
                    if Pin::new(&mut stream).accept().await.is_ok() {
                        hs_counter.fetch_add(1, Ordering::SeqCst);
                        let mut buf = [0u8; 16];
                        let _ = stream.read(&mut buf).await;
                    }
                });
            }
        });

        Self {
            addr,
            connections,
            handshakes,
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }
}

fn context(min: SslVersion, max: SslVersion) -> SslContext {
    let (cert, key) = self_signed();
    let mut builder = SslContext::builder(SslMethod::tls_server()).unwrap();
    builder.clear_options(SslOptions::NO_TLSV1 | SslOptions::NO_TLSV1_1);
    builder.set_private_key(&key).unwrap();
    builder.set_certificate(&cert).unwrap();
    builder.set_min_proto_version(Some(min)).unwrap();
    builder.set_max_proto_version(Some(max)).unwrap();
    builder.set_cipher_list("ALL:@SECLEVEL=0").unwrap();
    builder.build()
}

fn self_signed() -> (X509, PKey<Private>) {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    (builder.build(), key)
}
