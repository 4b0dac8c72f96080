use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use tilemoji_core::{app::App, audit::AuditSink, config::Config, pipeline::Ports};

use crate::{handlers, TelegramAdapter};

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

/// Wire the adapter into the core and long-poll until Ctrl-C.
pub async fn run_polling(cfg: Arc<Config>, audit: Arc<dyn AuditSink>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(bot = %me.username(), "tilemoji started"),
        Err(e) => warn!(error = %e, "could not fetch bot identity at startup"),
    }
    info!(
        tile_size = cfg.tile_size,
        max_tiles = cfg.max_tiles,
        allowed_users = cfg.telegram_allowed_users.len(),
        temp_dir = %cfg.temp_dir.display(),
        "configuration loaded"
    );

    if let Err(e) = bot.set_my_commands(handlers::commands::bot_commands()).await {
        warn!(error = %e, "failed to register bot commands");
    }

    let adapter = Arc::new(TelegramAdapter::new(bot.clone()));
    let ports = Ports {
        photos: adapter.clone(),
        identity: adapter.clone(),
        stickers: adapter.clone(),
        messenger: adapter,
    };

    let state = Arc::new(AppState {
        app: Arc::new(App::new(cfg, ports, audit)),
    });

    let handler = Update::filter_message().endpoint(handlers::handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("tilemoji stopped");
    Ok(())
}
