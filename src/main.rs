use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ethutil::cli::Cli;
use ethutil::commands;

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(&cli);

	commands::run(&cli).await
}

/// Log to stderr so stdout carries only command results.
fn init_tracing(cli: &Cli) {
	let filter = match cli.verbose {
		0 => "warn",
		1 => "warn,ethutil=debug",
		_ => "debug,ethutil=trace",
	};
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	tracing_subscriber::registry()
		.with(fmt::layer().with_writer(std::io::stderr).with_target(false))
		.with(env_filter)
		.init();
}
