use std::sync::Arc;

use clap::Parser;
use prodder::cli::Cli;
use prodder::console::ConsoleReporter;
use prodder::suite::Probe;
use ptransport::ReqwestTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Console output goes to stdout; diagnostics stay on stderr.
    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config();
    config.validate()?;

    let transport = ReqwestTransport::with_timeout(config.timeout)?;
    let outcome = Probe::new(config, Arc::new(transport))
        .with_reporter(Arc::new(ConsoleReporter::new()))
        .run()
        .await?;

    std::process::exit(outcome.report.exit_code());
}
