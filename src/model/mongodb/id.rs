use std::{fmt::Display, ops::Deref, str::FromStr};

use mongodb::bson::{doc, Bson, Document};
use rocket::{
    form::{self, FromFormField, ValueField},
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, Query, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A string identifier, stored in the `id` field of every document.
///
/// New identifiers are random UUIDs, but any non-empty string is accepted when
/// parsing, so that records created by other tools remain addressable.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Generate a fresh random identifier.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// A filter document matching this ID.
    pub fn as_doc(&self) -> Document {
        doc! { "id": &self.0 }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Id {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Error)]
#[error("Empty identifier")]
pub struct EmptyIdError;

impl FromStr for Id {
    type Err = EmptyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err(EmptyIdError)
        } else {
            Ok(Self(s.to_string()))
        }
    }
}

impl From<Id> for Bson {
    fn from(id: Id) -> Self {
        Bson::String(id.0)
    }
}

impl<'a> FromParam<'a> for Id {
    type Error = EmptyIdError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for Id {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field
            .value
            .parse()
            .map_err(|err| form::Error::validation(format!("{err}")).into())
    }
}

impl UriDisplay<Path> for Id {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(&self.0)
    }
}

impl UriDisplay<Query> for Id {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Query>) -> std::fmt::Result {
        formatter.write_value(&self.0)
    }
}

impl_from_uri_param_identity!([Path] Id);
impl_from_uri_param_identity!([Query] Id);
