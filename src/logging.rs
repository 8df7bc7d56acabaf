use std::{
    fmt::{Display, Formatter},
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use log::{info, log, warn, Level};
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Status, StatusClass},
    request::{FromRequest, Outcome},
    Data, Orbit, Request, Response, Rocket,
};

use crate::model::mongodb::Id;

/// Responses slower than this are logged as warnings even when they succeed.
/// Assistant and upload routes wait on third parties and are the usual cause.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// A unique identifier for a particular request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID. Wraps around to zero on overflow.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestId {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(req.local_cache(RequestId::next))
    }
}

/// The user a request was authenticated as, cached by the auth guard.
pub struct Caller(Option<Id>);

impl Caller {
    /// Remember who made this request so the response log can name them.
    pub fn record(req: &Request<'_>, user: &Id) {
        req.local_cache(|| Caller(Some(user.clone())));
    }

    fn of<'r>(req: &'r Request<'_>) -> Option<&'r Id> {
        req.local_cache(|| Caller(None)).0.as_ref()
    }
}

/// When the request arrived.
struct Received(Instant);

/// Log level for a response: by status class, raised to a warning when slow.
pub fn response_level(status: Status, elapsed: Duration) -> Level {
    match status.class() {
        StatusClass::ServerError => Level::Error,
        StatusClass::ClientError => Level::Warn,
        _ if elapsed >= SLOW_RESPONSE => Level::Warn,
        _ => Level::Info,
    }
}

fn route_label(req: &Request<'_>) -> String {
    match req.route() {
        Some(route) => match route.name {
            Some(ref name) => format!("{name} ({})", route.uri),
            None => route.uri.to_string(),
        },
        None => "UNKNOWN ROUTE".to_string(),
    }
}

/// Logs every request and response, tagged with the request ID and caller.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let scheme = if config.tls_enabled() { "https" } else { "http" };
        info!(
            "Hostel backend listening on {scheme}://{}:{}/api",
            config.address,
            config.port
        );
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let id = req.local_cache(RequestId::next);
        req.local_cache(|| Received(Instant::now()));
        info!("->req{id} {} {}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = req.local_cache(RequestId::next);
        let elapsed = req.local_cache(|| Received(Instant::now())).0.elapsed();
        let status = res.status();
        let caller = match Caller::of(req) {
            Some(user) => format!(" by {user}"),
            None => String::new(),
        };
        log!(
            response_level(status, elapsed),
            "<-rsp{id} {status} {}{caller} in {}ms",
            route_label(req),
            elapsed.as_millis()
        );
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, stopping gracefully...");
    }
}
