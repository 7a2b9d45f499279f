use anyhow::Context;
use log::info;

use lifegrid::LifeConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("lifegrid=info"))
        .init();

    let config = LifeConfig::from_env().context("Failed to read LIFEGRID_* settings")?;
    info!(
        "Starting {}x{} grid, pattern '{}', rule {}",
        config.grid_width,
        config.grid_height,
        config.pattern.as_str(),
        config.rule
    );

    lifegrid::run(config)
}
