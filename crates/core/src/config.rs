use std::env;

use serde::{Deserialize, Serialize};

use crate::status::DeletePolicy;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub telegram: TelegramConfig,
    pub sweep: SweepConfig,
    /// Which trays `DELETE` may prune; see `DeletePolicy`.
    pub delete_policy: DeletePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// PostgreSQL connection string. Empty → in-memory store.
    pub database_url: Option<String>,
}

impl StoreConfig {
    pub fn is_postgres(&self) -> bool {
        self.database_url.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    /// Notifications run only when both credentials are present; anything
    /// less degrades to a disabled dispatcher rather than a startup failure.
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between notification sweeps.
    pub interval_secs: u64,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_u16("SERVER_PORT", 5000),
            },
            store: StoreConfig {
                database_url: env_opt("DATABASE_URL"),
            },
            telegram: TelegramConfig {
                bot_token: env_opt("TELEGRAM_BOT_TOKEN"),
                chat_id: env_opt("TELEGRAM_CHAT_ID"),
            },
            sweep: SweepConfig {
                interval_secs: env_u64("SWEEP_INTERVAL_SECS", 3600),
            },
            delete_policy: DeletePolicy::parse(&env_or("DELETE_POLICY", "removed-only")),
        }
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  server: {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  store: {}",
            if self.store.is_postgres() {
                "postgres"
            } else {
                "in-memory"
            }
        );
        tracing::info!(
            "  telegram: {}",
            if self.telegram.is_configured() {
                "configured"
            } else {
                "not configured — notifications disabled"
            }
        );
        tracing::info!("  sweep interval: {}s", self.sweep.interval_secs);
        tracing::info!("  delete policy: {}", self.delete_policy.as_str());
    }
}
