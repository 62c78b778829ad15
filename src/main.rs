use shaperoute::{build_runtime, init_logging, Config, BUILD_DATE, VERSION};
use tokio::io::BufReader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!("Shape Route {} (built {})", VERSION, BUILD_DATE);

    let config = Config::load()?;
    let mut runtime = build_runtime(&config)?;

    shaperoute_ui::console::run(
        &mut runtime,
        &config.route,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    Ok(())
}
