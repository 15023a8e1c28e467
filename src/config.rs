use anyhow::{bail, Context};

/// Where user records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// Local file-based store; `url` is a `sqlite:` connection string.
    Sqlite { url: String },
    /// Networked PostgreSQL server.
    Postgres { url: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Without `DATABASE_URL` this is `SQLITE_PATH` (default `app.db`), a
    /// path resolved against the process working directory.
    pub database: DatabaseTarget,
    pub max_connections: u32,
    /// Secret used to sign flash cookies. `None` means a random per-process key.
    pub secret_key: Option<String>,
    pub server: ServerConfig,
}

pub const MIN_SECRET_KEY_LEN: usize = 32;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database = match var("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(url) => DatabaseTarget::from_url(url)?,
            None => {
                let path = var("SQLITE_PATH").unwrap_or_else(|| "app.db".into());
                DatabaseTarget::Sqlite {
                    url: format!("sqlite://{}", path),
                }
            }
        };

        let max_connections = var("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(10);

        let secret_key = var("SECRET_KEY").filter(|v| !v.is_empty());
        if let Some(key) = &secret_key {
            if key.len() < MIN_SECRET_KEY_LEN {
                bail!("SECRET_KEY must be at least {MIN_SECRET_KEY_LEN} bytes");
            }
        }

        let port = match var("APP_PORT") {
            Some(p) => p.parse::<u16>().context("APP_PORT is not a valid port")?,
            None => 8080,
        };
        let server = ServerConfig {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        };

        Ok(Self {
            database,
            max_connections,
            secret_key,
            server,
        })
    }
}

impl DatabaseTarget {
    pub fn from_url(url: String) -> anyhow::Result<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres { url })
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite { url })
        } else {
            bail!("unsupported DATABASE_URL scheme (expected postgres:// or sqlite:)")
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::Postgres { .. } => "postgres",
        }
    }
}
