//! Types shared between the database and API representations.

pub mod location;
pub mod media;
pub mod role;

pub use location::Location;
pub use media::MediaItem;
pub use role::Role;

use mongodb::bson::{to_bson, Bson};
use serde::Serialize;

/// Serialise a plain value (string-labelled enum or record) for use in filters
/// and update documents.
pub(crate) fn as_bson<T: Serialize>(value: &T) -> Bson {
    to_bson(value).expect("Serialisation of plain records is infallible")
}

/// Implement `From<T> for Bson` for string-labelled enums.
macro_rules! bson_enum {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for mongodb::bson::Bson {
                fn from(value: $ty) -> Self {
                    $crate::model::common::as_bson(&value)
                }
            }
        )*
    };
}
pub(crate) use bson_enum;
