//! Main entry point for the relayer service.
//!
//! Loads the configuration, builds the relayer engine and either serves the
//! HTTP API until interrupted or, with `--batch`, drains one file of
//! transactions and exits.

use clap::Parser;
use relayer_config::Config;
use relayer_core::{RelayerBuilder, RelayerEngine, RelayerFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod batch;
mod server;

use relayer_storage::implementations::file::create_storage as create_file_storage;
use relayer_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the relayer service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// JSON file of transactions to submit once, then exit
	#[arg(short, long)]
	batch: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	// Logs go to stderr so batch output stays parseable
	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started relayer");

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.relayer.id);

	let relayer = Arc::new(build_relayer(config.clone())?);

	if let Some(path) = args.batch {
		let intents = batch::load_intents(&path).await?;
		tracing::info!(count = intents.len(), "Running batch");
		let logger = relayer.spawn_event_logger();
		let report = batch::run_batch(&relayer, intents).await?;
		logger.abort();
		println!("{}", serde_json::to_string_pretty(&report)?);
		return Ok(());
	}

	match config.api.filter(|api| api.enabled) {
		Some(api_config) => {
			let api_relayer = Arc::clone(&relayer);
			tokio::select! {
				result = relayer.run() => {
					tracing::info!("Relayer finished");
					result?;
				}
				result = server::start_server(api_config, api_relayer) => {
					tracing::info!("API server finished");
					result?;
				}
			}
		},
		None => {
			tracing::info!("Starting relayer only");
			relayer.run().await?;
		},
	}

	tracing::info!("Stopped relayer");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the relayer engine with the storage backends compiled in.
fn build_relayer(config: Config) -> Result<RelayerEngine, Box<dyn std::error::Error>> {
	let storage_factories = create_factory_map!(
		relayer_storage::StorageInterface,
		relayer_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	Ok(RelayerBuilder::new(config).build(RelayerFactories { storage_factories })?)
}
