use std::sync::Arc;

use tracing::error;

use tilemoji_core::{audit, config::Config};

#[tokio::main]
async fn main() -> Result<(), tilemoji_core::Error> {
    tilemoji_core::logging::init("tilemoji")?;

    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Err(e);
        }
    };

    let audit = audit::from_config(&cfg);

    tilemoji_telegram::router::run_polling(cfg, audit)
        .await
        .map_err(|e| tilemoji_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
