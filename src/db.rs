use std::sync::Arc;

use tracing::info;

use crate::{
    config::{AppConfig, DatabaseTarget},
    users::repo::{PgUserStore, SqliteUserStore, UserStore},
};

/// Connect to the configured backend and bring its schema up to date.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    info!(backend = config.database.backend(), "opening user store");
    let store: Arc<dyn UserStore> = match &config.database {
        DatabaseTarget::Sqlite { url } => {
            Arc::new(SqliteUserStore::connect(url, config.max_connections).await?)
        }
        DatabaseTarget::Postgres { url } => {
            Arc::new(PgUserStore::connect(url, config.max_connections).await?)
        }
    };
    info!(backend = store.backend(), "user store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[tokio::test]
    async fn opens_in_memory_sqlite() {
        let config = AppConfig {
            database: DatabaseTarget::Sqlite {
                url: "sqlite::memory:".into(),
            },
            max_connections: 4,
            secret_key: None,
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
        };
        let store = open_store(&config).await.expect("store opens");
        assert_eq!(store.backend(), "sqlite");
        assert!(store.list_all().await.unwrap().is_empty());
        store.close().await;
    }
}
