use std::sync::Arc;

use bvs_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), bvs_core::Error> {
    bvs_core::logging::init("bvs")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(brand = %cfg.brand_name, "starting support relay");

    bvs_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| bvs_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
