//! Request/response correlation over one transport
//!
//! The [`Link`] is the single owner of the transport's write channel
//! and the frame assembler. It binds exactly one pending request to the
//! next completed frame: `submit` installs the pending state and sends
//! the command, `receive` resolves it with the device's response frame.
//! The pending slot is cleared before `receive` returns, so a caller
//! may immediately issue the next request.
//!
//! There is no cancellation mid-request and no automatic retry. A hung
//! device is bounded only by the configured response timeout; on
//! timeout, transport error or reassembly overflow the link closes and
//! every later `submit` fails fast with [`BridgeError::LinkClosed`].

use maybe_async::maybe_async;
use rbridge_core::frame::{Frame, FrameAssembler, Framing, DEFAULT_FRAME_CAPACITY};

use crate::error::{BridgeError, Result};
use crate::transport::Transport;

/// Default response timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u32 = 1_000;

/// Poll interval for transport reads in milliseconds
const POLL_INTERVAL_MS: u32 = 20;

/// Transport read chunk size
const READ_CHUNK: usize = 64;

/// One-request-at-a-time binding between commands and response frames
pub struct Link<T: Transport> {
    transport: T,
    assembler: FrameAssembler,
    framing: Framing,
    pending: bool,
    closed: bool,
    timeout_ms: u32,
}

impl<T: Transport> Link<T> {
    /// Create a link over `transport` using the given framing mode
    pub fn new(transport: T, framing: Framing) -> Self {
        Self::with_capacity(transport, framing, DEFAULT_FRAME_CAPACITY)
    }

    /// Create a link with an explicit frame reassembly capacity
    pub fn with_capacity(transport: T, framing: Framing, capacity: usize) -> Self {
        Self {
            transport,
            assembler: FrameAssembler::with_capacity(framing, capacity),
            framing,
            pending: false,
            closed: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Framing mode of this link
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Set the response timeout in milliseconds
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    /// Whether a request is currently pending
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Whether the link was closed by a fatal error
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }
}

#[maybe_async]
impl<T: Transport> Link<T> {
    /// Send a command and wait for its response frame
    pub async fn request(&mut self, command: &[u8]) -> Result<Frame> {
        self.submit(command).await?;
        self.receive().await
    }

    /// Send a command, installing it as the pending request
    ///
    /// Fails with [`BridgeError::RequestInFlight`] before any bytes are
    /// written if a request is already pending, and with
    /// [`BridgeError::LinkClosed`] after a fatal error.
    pub async fn submit(&mut self, command: &[u8]) -> Result<()> {
        if self.closed {
            return Err(BridgeError::LinkClosed);
        }
        if self.pending {
            return Err(BridgeError::RequestInFlight);
        }

        if let Err(e) = self.discard_stray().await {
            self.closed = true;
            return Err(e);
        }

        self.pending = true;
        log::trace!("submit: {:?}", String::from_utf8_lossy(command));

        let sent = self.send(command).await;
        if let Err(e) = sent {
            self.pending = false;
            self.closed = true;
            return Err(e);
        }
        Ok(())
    }

    /// Wait for the response frame of the pending request
    ///
    /// The pending slot is cleared before this returns, success or
    /// failure. Transport errors, timeouts and reassembly overflow
    /// close the link.
    pub async fn receive(&mut self) -> Result<Frame> {
        if !self.pending {
            return Err(BridgeError::NoRequestInFlight);
        }

        let outcome = self.read_frame().await;
        self.pending = false;

        match outcome {
            Ok(frame) => {
                log::trace!("frame: {:?}", String::from_utf8_lossy(&frame));
                Ok(frame)
            }
            Err(e) => {
                log::warn!("link closed: {}", e);
                self.closed = true;
                Err(e)
            }
        }
    }

    async fn send(&mut self, command: &[u8]) -> Result<()> {
        self.transport.write(command).await?;
        self.transport.flush().await
    }

    async fn read_frame(&mut self) -> Result<Frame> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut idle_ms = 0u32;

        loop {
            let n = self
                .transport
                .read_nonblock(&mut chunk, POLL_INTERVAL_MS)
                .await?;
            if n == 0 {
                idle_ms += POLL_INTERVAL_MS;
                if idle_ms >= self.timeout_ms {
                    return Err(BridgeError::Timeout);
                }
                continue;
            }
            idle_ms = 0;
            if let Some(frame) = self.assembler.feed(&chunk[..n])? {
                return Ok(frame);
            }
        }
    }

    /// Drop bytes that arrived with no request pending
    ///
    /// Legitimately occurs once at session start when firmware emits a
    /// boot banner; logged and discarded, never fatal on its own.
    async fn discard_stray(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut dropped = 0usize;
        loop {
            let n = self.transport.read_nonblock(&mut chunk, 1).await?;
            if n == 0 {
                break;
            }
            dropped += n;
        }
        dropped += self.assembler.clear();
        if dropped > 0 {
            log::warn!("discarded {} stray bytes with no request pending", dropped);
        }
        Ok(())
    }
}
