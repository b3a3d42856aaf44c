//! Scripted in-memory transport for link and device tests
//!
//! Plays the role of bridge firmware: response chunks queued with
//! [`MockTransport::respond`] become readable only once a command has
//! been flushed, one response group per request, so tests exercise the
//! real request/response ordering. Stray bytes pushed with
//! [`MockTransport::push_stray`] are readable immediately, like a boot
//! banner.

use std::collections::VecDeque;

use maybe_async::maybe_async;

use crate::error::{BridgeError, Result};
use crate::transport::Transport;

pub struct MockTransport {
    /// Chunks readable right now
    available: VecDeque<Vec<u8>>,
    /// Response groups, unlocked one per flushed command
    queued: VecDeque<Vec<Vec<u8>>>,
    written: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            available: VecDeque::new(),
            queued: VecDeque::new(),
            written: Vec::new(),
            fail_reads: false,
            fail_writes: false,
        }
    }

    /// Queue the response to the next request, as it will arrive from
    /// the wire (chunk boundaries included)
    pub fn respond(mut self, chunks: &[&[u8]]) -> Self {
        self.queued
            .push_back(chunks.iter().map(|c| c.to_vec()).collect());
        self
    }

    /// Make bytes readable before any request is sent
    pub fn push_stray(&mut self, bytes: &[u8]) {
        self.available.push_back(bytes.to_vec());
    }

    /// Fail every read with a transport error
    pub fn fail_reads(&mut self) {
        self.fail_reads = true;
    }

    /// Fail every write with a transport error
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Every byte written so far, across all requests
    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

#[maybe_async(AFIT)]
impl Transport for MockTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(BridgeError::Transport("mock write failure".into()));
        }
        self.written.extend_from_slice(data);
        Ok(())
    }

    async fn read_nonblock(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize> {
        if self.fail_reads {
            return Err(BridgeError::Transport("mock read failure".into()));
        }
        match self.available.pop_front() {
            Some(chunk) => {
                assert!(chunk.len() <= buf.len(), "mock chunk larger than read buffer");
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            None => Ok(0),
        }
    }

    async fn flush(&mut self) -> Result<()> {
        if let Some(group) = self.queued.pop_front() {
            self.available.extend(group);
        }
        Ok(())
    }
}
