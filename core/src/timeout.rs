//! Timeout settings and their resolution into transport parameters.
//!
//! # Design
//! `Timeout` keeps the library default for `total` distinguishable from a
//! value the caller set. The distinction drives [`resolve`]: an explicit
//! `total` always wins, while the default `total` steps aside as soon as
//! the caller sets a `connect` or `read` phase.

use std::time::Duration;

/// Library default for the whole request lifecycle.
pub const DEFAULT_TOTAL: Duration = Duration::from_secs(5 * 60);

/// The `total` part of a [`Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Total {
    /// Not set by the caller; [`DEFAULT_TOTAL`] applies unless a phase is set.
    #[default]
    Default,
    /// Set by the caller.
    Limit(Duration),
    /// Explicitly disabled by the caller.
    Unlimited,
}

/// Timeout settings for a request, a scope or a whole client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timeout {
    pub total: Total,
    pub connect: Option<Duration>,
    pub read: Option<Duration>,
}

impl Timeout {
    /// Deadline covering connection and read.
    pub fn total(limit: Duration) -> Self {
        Self {
            total: Total::Limit(limit),
            ..Self::default()
        }
    }

    /// No deadline at all.
    pub fn unlimited() -> Self {
        Self {
            total: Total::Unlimited,
            ..Self::default()
        }
    }

    pub fn connect(limit: Duration) -> Self {
        Self::default().with_connect(limit)
    }

    pub fn read(limit: Duration) -> Self {
        Self::default().with_read(limit)
    }

    pub fn with_connect(mut self, limit: Duration) -> Self {
        self.connect = Some(limit);
        self
    }

    pub fn with_read(mut self, limit: Duration) -> Self {
        self.read = Some(limit);
        self
    }

    fn has_phases(&self) -> bool {
        self.connect.is_some() || self.read.is_some()
    }
}

/// Timeout parameters handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportTimeout {
    /// One end-to-end deadline, `None` meaning unbounded.
    Total(Option<Duration>),
    /// Separate limits for establishing the connection and for each read,
    /// with no end-to-end deadline.
    Phases {
        connect: Option<Duration>,
        read: Option<Duration>,
    },
}

/// Pick the effective timeout (per-call, then ambient scope, then client
/// default) and translate it into transport parameters.
pub fn resolve(call: Option<Timeout>, ambient: Option<Timeout>, client: Timeout) -> TransportTimeout {
    let timeout = call.or(ambient).unwrap_or(client);
    match timeout.total {
        Total::Limit(limit) => TransportTimeout::Total(Some(limit)),
        Total::Unlimited => TransportTimeout::Total(None),
        Total::Default if timeout.has_phases() => TransportTimeout::Phases {
            connect: timeout.connect,
            read: timeout.read,
        },
        Total::Default => TransportTimeout::Total(Some(DEFAULT_TOTAL)),
    }
}
