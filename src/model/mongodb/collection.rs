use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::{doc, Document},
    error::Error as DbError,
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    announcement::Announcement, attendance::Attendance, conversation::Conversation,
    gate_pass::GatePass, issue::Issue, laundry::LaundryMachine, listing::Listing,
    lost_found::LostFoundItem, mess_menu::MessMenu, notification::Notification, poll::Poll,
    user::User,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

macro_rules! collections {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl MongoCollection for $ty {
                const NAME: &'static str = $name;
            }
        )*
    };
}

collections! {
    User => "users",
    Issue => "issues",
    Announcement => "announcements",
    Notification => "notifications",
    MessMenu => "mess_menu",
    Poll => "polls",
    LaundryMachine => "laundry",
    Listing => "marketplace",
    GatePass => "gate_passes",
    Attendance => "attendance",
    LostFoundItem => "lost_found",
    Conversation => "ai_conversations",
}

async fn create_index<T>(db: &Database, keys: Document, unique: bool) -> Result<(), DbError>
where
    T: MongoCollection,
{
    let options = IndexOptions::builder().unique(unique).build();
    let index = IndexModel::builder().keys(keys).options(options).build();
    Coll::<T>::from_db(db).create_index(index, None).await?;
    Ok(())
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Every record is addressed by its `id`.
    create_index::<User>(db, doc! { "id": 1 }, true).await?;
    create_index::<Issue>(db, doc! { "id": 1 }, true).await?;
    create_index::<Announcement>(db, doc! { "id": 1 }, true).await?;
    create_index::<Notification>(db, doc! { "id": 1 }, true).await?;
    create_index::<MessMenu>(db, doc! { "id": 1 }, true).await?;
    create_index::<Poll>(db, doc! { "id": 1 }, true).await?;
    create_index::<LaundryMachine>(db, doc! { "id": 1 }, true).await?;
    create_index::<Listing>(db, doc! { "id": 1 }, true).await?;
    create_index::<GatePass>(db, doc! { "id": 1 }, true).await?;
    create_index::<Attendance>(db, doc! { "id": 1 }, true).await?;
    create_index::<LostFoundItem>(db, doc! { "id": 1 }, true).await?;
    create_index::<Conversation>(db, doc! { "id": 1 }, true).await?;

    create_index::<User>(db, doc! { "email": 1 }, true).await?;
    create_index::<MessMenu>(db, doc! { "day": 1, "meal_type": 1 }, true).await?;
    create_index::<Attendance>(db, doc! { "student_id": 1, "date": 1 }, true).await?;

    // Listing and ownership lookups.
    create_index::<Issue>(db, doc! { "reporter_id": 1, "created_at": -1 }, false).await?;
    create_index::<Issue>(db, doc! { "location.hostel": 1, "visibility": 1 }, false).await?;
    create_index::<Notification>(db, doc! { "recipient": 1, "created_at": -1 }, false).await?;
    create_index::<GatePass>(db, doc! { "student_id": 1, "status": 1 }, false).await?;
    create_index::<Conversation>(db, doc! { "user_id": 1, "session_id": 1 }, false).await?;

    Ok(())
}
