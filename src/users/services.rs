use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::{
    error::RegistrationError,
    users::{
        dto::{Registration, RegistrationForm},
        password::hash_password,
        repo::{is_unique_violation, UserStore},
        repo_types::{NewUser, User},
    },
};

/// Validate a submission and store it as a new user.
///
/// Writes exactly one row on `Ok` and nothing on `Err`.
pub async fn register(
    store: &dyn UserStore,
    form: RegistrationForm,
) -> Result<User, RegistrationError> {
    let registration = Registration::try_from(form).map_err(|e| {
        warn!(reason = e.code(), "registration rejected");
        e
    })?;

    match store.find_by_email(&registration.email).await {
        Ok(Some(existing)) => {
            warn!(user_id = existing.id, "email already registered");
            return Err(RegistrationError::DuplicateEmail);
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %format!("{e:#}"), "email lookup failed");
            return Err(RegistrationError::Persistence(e));
        }
    }

    let password =
        hash_password(&registration.password).map_err(RegistrationError::Persistence)?;
    let new_user = NewUser {
        birthday: registration.birthday,
        first_name: registration.first_name,
        last_name: registration.last_name,
        email: registration.email,
        password,
        created_at: OffsetDateTime::now_utc(),
    };

    match store.insert(&new_user).await {
        Ok(user) => {
            info!(user_id = user.id, "user registered");
            Ok(user)
        }
        Err(e) => {
            if is_unique_violation(&e) {
                warn!("email registered concurrently; insert rolled back");
            } else {
                error!(error = %format!("{e:#}"), "create user failed");
            }
            Err(RegistrationError::Persistence(e))
        }
    }
}

pub async fn list_users(store: &dyn UserStore) -> anyhow::Result<Vec<User>> {
    store.list_all().await
}
