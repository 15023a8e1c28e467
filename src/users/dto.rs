use serde::Deserialize;
use time::{macros::format_description, Date};

use crate::error::RegistrationError;

/// Raw `POST /register` body. Absent fields decode as `None` so that a
/// missing input is reported like an empty one. Holds the plaintext
/// password, so it has no `Debug` impl.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub birthday: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// A submission that passed every presence and format check. Like the
/// form, it carries the plaintext password and has no `Debug` impl.
#[derive(Clone)]
pub struct Registration {
    pub birthday: Date,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

impl TryFrom<RegistrationForm> for Registration {
    type Error = RegistrationError;

    /// Checks run in a fixed order and stop at the first failure:
    /// presence, password confirmation, then birthday format.
    fn try_from(form: RegistrationForm) -> Result<Self, Self::Error> {
        let (
            Some(birthday),
            Some(first_name),
            Some(last_name),
            Some(email),
            Some(password),
            Some(confirm_password),
        ) = (
            required(form.birthday),
            required(form.first_name),
            required(form.last_name),
            required(form.email),
            required(form.password),
            required(form.confirm_password),
        )
        else {
            return Err(RegistrationError::MissingFields);
        };

        if password != confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }

        let birthday = parse_birthday(&birthday)?;

        Ok(Self {
            birthday,
            first_name,
            last_name,
            email,
            password,
        })
    }
}

pub fn parse_birthday(raw: &str) -> Result<Date, RegistrationError> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| RegistrationError::InvalidDateFormat)
}

pub fn format_birthday(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}
