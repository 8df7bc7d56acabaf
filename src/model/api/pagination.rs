use std::ops::RangeInclusive;

use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const PAGE_SIZE_RANGE: RangeInclusive<u32> = 1..=100;

/// `page` (from 1) and `limit` query parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Option<Self> {
        (page >= 1 && PAGE_SIZE_RANGE.contains(&limit)).then_some(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Pagination {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Ok(page) = req.query_value::<u32>("page").unwrap_or(Ok(1)) else {
            return request::Outcome::Failure((Status::UnprocessableEntity, ()));
        };
        let Ok(limit) = req.query_value::<u32>("limit").unwrap_or(Ok(DEFAULT_PAGE_SIZE)) else {
            return request::Outcome::Failure((Status::UnprocessableEntity, ()));
        };
        match Self::new(page, limit) {
            Some(pagination) => request::Outcome::Success(pagination),
            None => request::Outcome::Failure((Status::UnprocessableEntity, ())),
        }
    }
}
