//! Shared fixtures: a live mock server and the pet models it serves.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use http_noah::{Endpoint, Model, Timeout};
use serde::{Deserialize, Serialize};

/// Short enough that `/pets/slow` always exceeds it.
pub const SHORT: Duration = Duration::from_millis(100);

/// Long enough that `/pets/slow` always fits.
pub const LONG: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub name: String,
}

impl Pet {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl Model for Pet {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("pet name must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Pets(pub Vec<Pet>);

impl Model for Pets {}

/// Start the mock server on a random port, on its own thread and runtime
/// so blocking and async tests can share it.
pub fn serve() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

pub fn endpoint(addr: SocketAddr) -> Endpoint {
    Endpoint::new(addr.ip().to_string()).port(addr.port())
}

/// An endpoint nothing listens on.
pub fn closed_endpoint() -> Endpoint {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    endpoint(addr)
}

pub fn short() -> Timeout {
    Timeout::total(SHORT)
}

pub fn long() -> Timeout {
    Timeout::total(LONG)
}

/// Write `content` to a fresh `.txt` file inside `dir`.
pub fn text_file(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("photo.txt");
    std::fs::write(&path, content).unwrap();
    path
}

/// Connect limit comfortably above anything the local server needs, paired
/// with a read limit `/pets/slow` always exceeds.
pub fn long_connect_short_read() -> Timeout {
    Timeout::connect(LONG).with_read(SHORT)
}

/// Whether this process still has a descriptor open on `path`.
#[cfg(target_os = "linux")]
pub fn holds_open(path: &Path) -> bool {
    let target = std::fs::canonicalize(path).unwrap();
    std::fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(Result::ok)
        .any(|entry| std::fs::read_link(entry.path()).is_ok_and(|link| link == target))
}
