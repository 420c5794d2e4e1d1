use anyhow::Context;
use env_logger::Env;
use icon_studio::{IconStudioApp, StudioConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = StudioConfig::load().context("failed to load settings")?;
    let mut app = IconStudioApp::new(config).context("failed to start Icon Studio")?;

    // Optional model to open on start-up
    if let Some(path) = std::env::args_os().nth(1) {
        app.load_model(path);
    }

    app.run().context("Icon Studio exited with an error")?;
    Ok(())
}
