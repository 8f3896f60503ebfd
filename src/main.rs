use clap::Parser;
use tls_prober::cli::Cli;
use tls_prober::engine::ProbeOrchestrator;
use tls_prober::input::display_uri;
use tls_prober::output::{build_report, OutputSink};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = cli.into_config()?;
    let uri = display_uri(&cfg.scheme, &cfg.target)?;

    let prober = ProbeOrchestrator::new(cfg.target.clone(), cfg.probe);
    let report = build_report(&prober, &uri, cfg.reverse_dns).await;

    let mut sink = OutputSink::stdout(cfg.output.clone());
    sink.write_report(&report)?;

    Ok(())
}
