use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = dojo_api::Args::parse();

	dojo_api::run(args).await
}
