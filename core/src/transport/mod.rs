//! The transport capability: one HTTP round-trip, blocking or async.
//!
//! Implementations receive a fully prepared request and must return the
//! whole response body, so the pipeline can still report it after the
//! connection is gone. Failures are reported with the crate's `Error`,
//! already normalized into connection, timeout or configuration errors.

mod reqwest_async;
mod reqwest_blocking;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::Error;
use crate::http::{PreparedRequest, RawResponse};
use crate::timeout::TransportTimeout;

pub use reqwest_async::ReqwestAsync;
pub use reqwest_blocking::ReqwestBlocking;

/// Transport that occupies the calling thread for the round-trip.
pub trait BlockingTransport {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse, Error>;
}

/// Transport that suspends only while waiting on network I/O.
pub trait AsyncTransport: Send + Sync {
    fn send(&self, request: &PreparedRequest) -> impl Future<Output = Result<RawResponse, Error>> + Send;
}

/// Connect and read limits a session was built with.
type PhaseLimits = (Option<Duration>, Option<Duration>);

/// Sessions of one transport.
///
/// reqwest only takes connect and read limits at session level, so every
/// distinct pair gets its own session, built on first use and kept for the
/// transport's lifetime. End-to-end deadlines are set per request on the
/// default session.
#[derive(Debug)]
struct Sessions<C> {
    default: C,
    phased: Mutex<HashMap<PhaseLimits, C>>,
}

impl<C: Clone> Sessions<C> {
    fn new(default: C) -> Self {
        Self {
            default,
            phased: Mutex::new(HashMap::new()),
        }
    }

    /// Session for `timeout`, with the deadline to set on the request.
    fn select<F>(&self, timeout: &TransportTimeout, build: F) -> Result<(C, Option<Duration>), Error>
    where
        F: FnOnce(Option<Duration>, Option<Duration>) -> Result<C, Error>,
    {
        let (connect, read) = match *timeout {
            TransportTimeout::Total(deadline) => return Ok((self.default.clone(), deadline)),
            TransportTimeout::Phases { connect, read } => (connect, read),
        };
        let mut phased = self.phased.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = phased.get(&(connect, read)) {
            return Ok((session.clone(), None));
        }
        let session = build(connect, read)?;
        tracing::debug!(?connect, ?read, "Opened HTTP session for phase timeouts");
        phased.insert((connect, read), session.clone());
        Ok((session, None))
    }
}
