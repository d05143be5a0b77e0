use anyhow::Context;
use wrapped_viz::{ViewerConfig, WrappedApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("wrapped_viz=info"))
        .init();

    let config = ViewerConfig::from_default_sources().context("loading configuration")?;
    log::info!("using API at {}", config.api.base_url);

    WrappedApp::new(config)?.run()?;
    Ok(())
}
