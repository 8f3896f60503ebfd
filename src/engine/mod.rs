use crate::input::{SystemResolver, TargetResolver};
use crate::model::{InitPhase, ProbeSettings, ProtocolVersion, TargetSpec};
use crate::probe::{self, CapabilitySet, ProtocolProbe, TlsProbe};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Answers "which protocol versions does this target negotiate".
pub struct ProbeOrchestrator {
    target: TargetSpec,
    settings: ProbeSettings,
    resolver: Arc<dyn TargetResolver>,
    probe: Arc<dyn ProtocolProbe>,
    phase: Mutex<InitPhase>,
    state: OnceCell<Snapshot>,
}

#[derive(Debug)]
struct Snapshot {
    endpoint: Option<SocketAddr>,
    capabilities: Arc<CapabilitySet>,
    default_negotiated: Option<ProtocolVersion>,
}

impl Snapshot {
    fn invalid() -> Self {
        Self {
            endpoint: None,
            capabilities: Arc::new(CapabilitySet::new()),
            default_negotiated: None,
        }
    }
}

impl ProbeOrchestrator {
    pub fn new(target: TargetSpec, settings: ProbeSettings) -> Self {
        Self {
            target,
            settings,
            resolver: Arc::new(SystemResolver),
            probe: Arc::new(TlsProbe),
            phase: Mutex::new(InitPhase::Uninitialized),
            state: OnceCell::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TargetResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ProtocolProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    pub fn phase(&self) -> InitPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn is_valid(&self) -> bool {
        self.snapshot().await.endpoint.is_some()
    }

    pub async fn is_supported(&self, protocol: ProtocolVersion) -> bool {
        let snapshot = self.snapshot().await;
        match protocol {
            ProtocolVersion::NegotiateDefault => snapshot.default_negotiated.is_some(),
            other => snapshot.capabilities.contains(other),
        }
    }

    pub async fn address(&self) -> Option<IpAddr> {
        self.endpoint().await.map(|endpoint| endpoint.ip())
    }

    pub async fn endpoint(&self) -> Option<SocketAddr> {
        self.snapshot().await.endpoint
    }

    pub async fn capabilities(&self) -> Vec<ProtocolVersion> {
        self.snapshot().await.capabilities.snapshot()
    }

    pub async fn negotiated_default(&self) -> Option<ProtocolVersion> {
        self.snapshot().await.default_negotiated
    }

    async fn snapshot(&self) -> &Snapshot {
        self.state.get_or_init(|| self.initialize()).await
    }

    #[instrument(skip(self), fields(host = %self.target))]
    async fn initialize(&self) -> Snapshot {
        self.advance(InitPhase::Resolving);
        let endpoint = match self.resolver.resolve(&self.target).await {
            Ok(endpoint) => endpoint,
            Err(err) => {
                warn!(error = %err, "target resolution failed; marking invalid");
                self.advance(InitPhase::Initialized { valid: false });
                return Snapshot::invalid();
            }
        };
        debug!(%endpoint, "target resolved");

        self.advance(InitPhase::ProbingAll);
        let capabilities = Arc::new(CapabilitySet::new());
        let server_name = self.server_name();
        let mut tasks = JoinSet::new();
        for protocol in ProtocolVersion::ALL {
            let probe = Arc::clone(&self.probe);
            let capabilities = Arc::clone(&capabilities);
            let server_name = server_name.clone();
            let settings = self.settings;
            tasks.spawn(async move {
                probe::run(
                    probe.as_ref(),
                    endpoint,
                    &server_name,
                    protocol,
                    &settings,
                    &capabilities,
                )
                .await
            });
        }

        let mut default_negotiated = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) if outcome.protocol == ProtocolVersion::NegotiateDefault => {
                    default_negotiated = outcome.negotiated;
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "probe task did not finish"),
            }
        }

        self.advance(InitPhase::Initialized { valid: true });
        info!(
            %endpoint,
            supported = ?capabilities.snapshot(),
            default = ?default_negotiated,
            "probing finished"
        );

        Snapshot {
            endpoint: Some(endpoint),
            capabilities,
            default_negotiated,
        }
    }

    fn server_name(&self) -> String {
        self.target
            .host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string()
    }

    fn advance(&self, next: InitPhase) {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if next > *phase {
            *phase = next;
        }
    }
}
