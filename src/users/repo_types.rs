use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub birthday: Date,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String, // Argon2 PHC string, never plaintext
    pub created_at: OffsetDateTime,
}

/// A user ready to be inserted; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub birthday: Date,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub created_at: OffsetDateTime,
}
