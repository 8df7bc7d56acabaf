use std::{fmt::Display, ops::Deref, str::FromStr};

use phonenumber::{country, PhoneNumber};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A validated phone number. Numbers without a country code are read as Indian.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone {
    inner: PhoneNumber,
}

/// Two numbers are equal when they dial the same line, however they were written.
impl PartialEq for Phone {
    fn eq(&self, other: &Self) -> bool {
        self.code().value() == other.code().value() && self.national() == other.national()
    }
}

impl Eq for Phone {}

#[derive(Debug, Error)]
pub enum PhoneError {
    #[error(transparent)]
    Parse(#[from] phonenumber::ParseError),
    #[error("Not a valid phone number: {0}")]
    Invalid(String),
}

impl Deref for Phone {
    type Target = PhoneNumber;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Display for Phone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = phonenumber::parse(Some(country::Id::IN), s)?;
        if phonenumber::is_valid(&inner) {
            Ok(Self { inner })
        } else {
            Err(PhoneError::Invalid(s.to_string()))
        }
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.to_string()
    }
}
