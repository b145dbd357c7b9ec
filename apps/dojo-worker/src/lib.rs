pub mod worker;

mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use clap::Parser;

use dojo_service::Providers;
use dojo_storage::db::Db;

use crate::worker::WorkerState;

#[derive(Debug, Parser)]
#[command(
	version = dojo_cli::VERSION,
	rename_all = "kebab",
	styles = dojo_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = dojo_config::load(&args.config)?;

	dojo_cli::init_tracing(&config.service.log_level);

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let providers = Providers::from_config(&config)?;
	let state = WorkerState { db: Arc::new(db), places: providers.places, cfg: config.worker };

	worker::run_worker(state).await
}
