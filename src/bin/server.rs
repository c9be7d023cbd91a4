#![cfg(not(tarpaulin_include))]

use shoegrid::app;
use shoegrid::config::AppConfig;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = AppConfig::from_env();
    // optional bind address, e.g. `server 0.0.0.0:3000`
    if let Some(bind) = env::args().nth(1) {
        config.bind = bind;
    }

    println!(
        "Starting admin API on {} ({:?} matrix keying)",
        config.bind, config.keying
    );
    app::run(config).await
}
