//! Shared test utilities

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lanwake::{db, DbPool, Transport};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Transport that records every datagram instead of sending it
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn targets(&self) -> Vec<SocketAddr> {
        self.sent.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> std::io::Result<()> {
        self.sent.lock().unwrap().push((payload.to_vec(), target));
        Ok(())
    }
}

/// Transport that rejects every send
pub struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn send_to(&self, _payload: &[u8], _target: SocketAddr) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ))
    }
}
