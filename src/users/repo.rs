use std::{str::FromStr, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    postgres::PgPoolOptions,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    PgPool, SqlitePool,
};
use tracing::debug;

use crate::users::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, birthday, first_name, last_name, email, password, created_at";

/// Persistent table of registered users.
///
/// Implementations must enforce email uniqueness themselves: `insert` fails
/// when the email is already stored, even if a prior `find_by_email` said
/// otherwise.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Insert one user inside a transaction. Nothing is written on error.
    async fn insert(&self, user: &NewUser) -> anyhow::Result<User>;

    /// Every stored user in insertion order.
    async fn list_all(&self) -> anyhow::Result<Vec<User>>;

    async fn close(&self);

    fn backend(&self) -> &'static str;
}

/// True when the error comes from a violated UNIQUE constraint.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .context("parse sqlite url")?
            .create_if_missing(true);

        // Every connection to `:memory:` opens its own empty database.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await
        }
        .context("connect to sqlite")?;

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .context("run sqlite migrations")?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory sqlite")
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn insert(&self, user: &NewUser) -> anyhow::Result<User> {
        let mut tx = self.pool.begin().await.context("begin insert")?;
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (birthday, first_name, last_name, email, password, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.birthday)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await
        .context("insert user")?;
        tx.commit().await.context("commit insert")?;
        debug!(user_id = created.id, "user row inserted");
        Ok(created)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("connect to postgres")?;

        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .context("run postgres migrations")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn insert(&self, user: &NewUser) -> anyhow::Result<User> {
        let mut tx = self.pool.begin().await.context("begin insert")?;
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (birthday, first_name, last_name, email, password, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.birthday)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await
        .context("insert user")?;
        tx.commit().await.context("commit insert")?;
        debug!(user_id = created.id, "user row inserted");
        Ok(created)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
