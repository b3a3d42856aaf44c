//! Frame reassembly for the response byte stream
//!
//! The device answers every command with exactly one frame, delimited by
//! a terminator byte. Depending on firmware mode that terminator is
//! either NUL or a CR/LF line ending; the mode is fixed per transport
//! instance and never auto-detected.

use crate::error::{CoreError, Result};

/// One complete, terminator-stripped response unit from the device
pub type Frame = Vec<u8>;

/// Default reassembly capacity in bytes
///
/// A configuration constant, not a protocol constant: firmware never
/// sends a frame larger than its serial buffer, which is in the
/// 100-500 byte range across known builds.
pub const DEFAULT_FRAME_CAPACITY: usize = 256;

/// Frame delimiter convention used by the device firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Frames end with a single zero byte
    Nul,
    /// Frames end with `\n`, optionally preceded by `\r`
    CrLf,
}

impl Framing {
    /// Byte that marks the end of an incoming frame
    pub fn terminator(&self) -> u8 {
        match self {
            Framing::Nul => 0x00,
            Framing::CrLf => b'\n',
        }
    }

    /// Terminator appended to outgoing commands
    pub fn line_ending(&self) -> &'static str {
        match self {
            Framing::Nul => "\0",
            Framing::CrLf => "\n",
        }
    }
}

/// Accumulates raw transport bytes and yields complete frames
///
/// Bytes are buffered until the terminator is seen; the yielded frame
/// never contains the terminator. Bytes after a terminator stay
/// buffered, so splitting the input at arbitrary chunk boundaries
/// yields the same frames as feeding it whole.
#[derive(Debug)]
pub struct FrameAssembler {
    framing: Framing,
    capacity: usize,
    buf: Vec<u8>,
}

impl FrameAssembler {
    /// Create an assembler with the default capacity
    pub fn new(framing: Framing) -> Self {
        Self::with_capacity(framing, DEFAULT_FRAME_CAPACITY)
    }

    /// Create an assembler with an explicit capacity bound
    pub fn with_capacity(framing: Framing, capacity: usize) -> Self {
        Self {
            framing,
            capacity,
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append bytes and yield a frame if one completed
    ///
    /// Returns `Ok(None)` while a frame is still incomplete. Fails with
    /// [`CoreError::BufferOverflow`] once the unflushed bytes exceed the
    /// configured capacity without a terminator in sight; the buffer is
    /// cleared since the stream can no longer be trusted.
    ///
    /// A later call (even with an empty slice) yields the next frame if
    /// one is already buffered.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Option<Frame>> {
        self.buf.extend_from_slice(bytes);

        let frame = self.extract();
        if frame.is_none() && self.buf.len() > self.capacity {
            self.buf.clear();
            return Err(CoreError::BufferOverflow(self.capacity));
        }
        Ok(frame)
    }

    fn extract(&mut self) -> Option<Frame> {
        let terminator = self.framing.terminator();
        let pos = self.buf.iter().position(|&b| b == terminator)?;

        let mut frame: Vec<u8> = self.buf.drain(..=pos).collect();
        frame.pop();
        if self.framing == Framing::CrLf && frame.last() == Some(&b'\r') {
            frame.pop();
        }
        Some(frame)
    }

    /// Number of buffered bytes not yet part of a completed frame
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer holds no partial frame
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard any buffered bytes, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let n = self.buf.len();
        self.buf.clear();
        n
    }
}
