use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = dojo_worker::Args::parse();

	dojo_worker::run(args).await
}
