use anyhow::Context;
use clap::Parser;
use tls_checker::cli::Cli;
use tls_checker::output::OutputSink;
use tls_checker::Prober;
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

    let prober = Prober::from_config(&cfg);
    let report = prober.check().await.context("TLS check failed")?;

    let target = prober.target();
    let mut sink = OutputSink::stdout(cfg.output.clone());
    sink.write_report(target.host.as_deref().unwrap_or_default(), target.port, &report)?;

    Ok(())
}
