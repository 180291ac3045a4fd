//! Startup wiring: store selection, notifier construction, shared state.

use std::sync::Arc;

use tracing::{info, warn};

use couvoir_core::config::{Config, TelegramConfig};
use couvoir_notify::telegram::TelegramNotifier;
use couvoir_notify::{Dispatcher, Notifier};
use couvoir_store::{MemoryTrayStore, PgTrayStore, TrayStore};

use crate::service::TrayService;
use crate::state::AppState;

/// Select the tray store from config. A configured `DATABASE_URL` that
/// fails to connect or migrate aborts startup; an absent one degrades to
/// the in-memory store.
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn TrayStore>> {
    match &config.store.database_url {
        Some(url) => {
            let store = PgTrayStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not configured — using in-memory tray store (records are lost on restart)");
            Ok(Arc::new(MemoryTrayStore::new()))
        }
    }
}

/// Build the notification dispatcher. Missing or invalid Telegram
/// credentials disable notifications; they never fail startup.
fn build_dispatcher(telegram: &TelegramConfig) -> Dispatcher {
    let (Some(bot_token), Some(chat_id)) = (&telegram.bot_token, &telegram.chat_id) else {
        warn!("Telegram credentials not set — notifications disabled");
        return Dispatcher::disabled();
    };

    match TelegramNotifier::from_config(bot_token.clone(), chat_id.clone()) {
        Ok(notifier) => {
            info!("Telegram notifications enabled");
            Dispatcher::with_channels(vec![Box::new(notifier) as Box<dyn Notifier>])
        }
        Err(e) => {
            warn!("Telegram notifier misconfigured: {e} — notifications disabled");
            Dispatcher::disabled()
        }
    }
}

/// Assemble the shared application state.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = build_store(config).await?;
    let dispatcher = Arc::new(build_dispatcher(&config.telegram));
    let service = TrayService::new(store, dispatcher, config.delete_policy);
    Ok(Arc::new(AppState { service }))
}
