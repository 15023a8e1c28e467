use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use tracing::warn;

use crate::config::AppConfig;
use crate::db::open_store;
use crate::users::repo::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub cookie_key: Key,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = open_store(&config).await?;

        let cookie_key = match &config.secret_key {
            Some(secret) => Key::derive_from(secret.as_bytes()),
            None => {
                warn!("SECRET_KEY not set; flash cookies will not survive a restart");
                Key::generate()
            }
        };

        Ok(Self::from_parts(store, config, cookie_key))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>, cookie_key: Key) -> Self {
        Self {
            store,
            config,
            cookie_key,
        }
    }

    /// Release the store's connections. Call once, after the server stops.
    pub async fn close(&self) {
        self.store.close().await;
    }

    #[cfg(test)]
    pub fn fake(store: Arc<dyn UserStore>) -> Self {
        use crate::config::{DatabaseTarget, ServerConfig};

        let config = Arc::new(AppConfig {
            database: DatabaseTarget::Sqlite {
                url: "sqlite::memory:".into(),
            },
            max_connections: 1,
            secret_key: None,
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
        });
        Self::from_parts(store, config, Key::generate())
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
