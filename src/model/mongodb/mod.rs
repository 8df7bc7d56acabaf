mod collection;
pub mod errors;
mod id;

pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use id::Id;
