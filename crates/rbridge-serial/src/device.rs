//! Bridge device surface
//!
//! [`Bridge`] is what application code talks to: one-shot raw commands,
//! single register accesses, read-modify-write bit helpers and batch
//! execution. All of it funnels through the link's one-in-flight
//! request path; nothing here writes to the transport directly.

use maybe_async::maybe_async;

use rbridge_core::batch::{Batch, BatchResult};
use rbridge_core::codec::{self, Operation, Width};
use rbridge_core::error::CoreError;
use rbridge_core::frame::{Frame, Framing};

use crate::error::{BridgeError, Result};
use crate::link::Link;
use crate::transport::Transport;

/// Connection to register bridge firmware
pub struct Bridge<T: Transport> {
    link: Link<T>,
}

impl<T: Transport> Bridge<T> {
    /// Create a bridge over `transport` using the given framing mode
    pub fn new(transport: T, framing: Framing) -> Self {
        Self {
            link: Link::new(transport, framing),
        }
    }

    /// Set the response timeout in milliseconds
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.link.set_timeout(timeout_ms);
    }

    /// Start an empty batch matching this bridge's framing mode
    pub fn batch(&self) -> Batch {
        Batch::new(self.link.framing())
    }
}

#[maybe_async]
impl<T: Transport> Bridge<T> {
    /// Send a raw command string and return the raw response frame
    ///
    /// The line terminator is appended here; `command` must not carry
    /// one.
    pub async fn execute_raw(&mut self, command: &str) -> Result<Frame> {
        let ending = self.link.framing().line_ending();
        let mut wire = String::with_capacity(command.len() + ending.len());
        wire.push_str(command);
        wire.push_str(ending);
        self.link.request(wire.as_bytes()).await
    }

    /// Execute a single operation and return its response field
    pub async fn execute_operation(&mut self, op: Operation) -> Result<u32> {
        let frame = self.execute_raw(&op.encode()).await?;
        let fields = codec::decode_response(&frame)?;
        if fields.len() != 1 {
            return Err(BridgeError::Protocol(CoreError::FieldCountMismatch {
                expected: 1,
                got: fields.len(),
            }));
        }
        Ok(fields[0])
    }

    /// Read a single register
    pub async fn read_register(&mut self, addr: u32, width: Width) -> Result<u32> {
        self.execute_operation(Operation::Read { addr, width }).await
    }

    /// Write a single register
    pub async fn write_register(&mut self, addr: u32, value: u32, width: Width) -> Result<()> {
        self.execute_operation(Operation::Write { addr, value, width })
            .await
            .map(|_| ())
    }

    /// Set `bits` in the register at `addr` (read, OR, write back)
    ///
    /// Not atomic: the read and the write are two wire transactions,
    /// and a write landing in between - batched or direct - is a lost
    /// update. Inherent to the protocol.
    pub async fn bit_set(&mut self, addr: u32, bits: u32) -> Result<()> {
        let current = self.read_register(addr, Width::Default).await?;
        self.write_register(addr, current | bits, Width::Default)
            .await
    }

    /// Clear `bits` in the register at `addr` (read, AND-NOT, write back)
    ///
    /// Same lost-update hazard as [`bit_set`].
    ///
    /// [`bit_set`]: Bridge::bit_set
    pub async fn bit_clear(&mut self, addr: u32, bits: u32) -> Result<()> {
        let current = self.read_register(addr, Width::Default).await?;
        self.write_register(addr, current & !bits, Width::Default)
            .await
    }

    /// Run a compiled batch and project its marked results
    ///
    /// The batch's serialized command is built on first use and reused
    /// byte-identically on every later run.
    pub async fn run_batch(&mut self, batch: &Batch) -> Result<BatchResult> {
        let wire = batch.serialize()?;
        let frame = self.link.request(wire.as_bytes()).await?;
        let fields = codec::decode_response(&frame)?;
        Ok(batch.project(&fields)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockTransport;

    fn bridge(mock: MockTransport) -> Bridge<MockTransport> {
        Bridge::new(mock, Framing::CrLf)
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_end_to_end_write() {
        let mock = MockTransport::new().respond(&[b"0\r\n"]);
        let mut dev = bridge(mock);

        dev.write_register(0x4000_5400, 0x101, Width::Default)
            .await
            .unwrap();
        assert_eq!(dev.link.transport().written(), b"w 40005400 101\n");
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_end_to_end_nul_framing() {
        let mock = MockTransport::new().respond(&[b"0\x00"]);
        let mut dev = Bridge::new(mock, Framing::Nul);

        let mut batch = dev.batch();
        batch.write(0x4000_5400, 0x101, Width::Default).unwrap();
        let result = dev.run_batch(&batch).await.unwrap();
        assert_eq!(result, BatchResult::Fields(vec![0]));
        assert_eq!(dev.link.transport().written(), b"w 40005400 101\0");
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_read_register() {
        let mock = MockTransport::new().respond(&[b"cafe\r\n"]);
        let mut dev = bridge(mock);

        let value = dev.read_register(0x40, Width::Word).await.unwrap();
        assert_eq!(value, 0xCAFE);
        assert_eq!(dev.link.transport().written(), b"rw 40\n");
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_bit_set_is_read_modify_write() {
        let mock = MockTransport::new()
            .respond(&[b"f0\r\n"]) // current value
            .respond(&[b"0\r\n"]); // write status
        let mut dev = bridge(mock);

        dev.bit_set(0x40, 0x0F).await.unwrap();
        assert_eq!(dev.link.transport().written(), b"r 40\nw 40 ff\n");
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_bit_clear() {
        let mock = MockTransport::new()
            .respond(&[b"ff\r\n"])
            .respond(&[b"0\r\n"]);
        let mut dev = bridge(mock);

        dev.bit_clear(0x40, 0x0F).await.unwrap();
        assert_eq!(dev.link.transport().written(), b"r 40\nw 40 f0\n");
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_execute_raw() {
        let mock = MockTransport::new().respond(&[b"1|2|3\r\n"]);
        let mut dev = bridge(mock);

        let frame = dev.execute_raw("r 10|r 14|r 18").await.unwrap();
        assert_eq!(frame, b"1|2|3");
        assert_eq!(dev.link.transport().written(), b"r 10|r 14|r 18\n");
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_batch_result_projection() {
        let mock = MockTransport::new().respond(&[b"0|1|2|3|4\r\n"]);
        let mut dev = bridge(mock);

        let mut batch = dev.batch();
        for addr in 0..5u32 {
            batch.read(addr * 4, Width::Default).unwrap();
            if addr == 2 || addr == 4 {
                batch.mark_result();
            }
        }
        let result = dev.run_batch(&batch).await.unwrap();
        assert_eq!(result, BatchResult::Fields(vec![2, 4]));
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_batch_single_mark_is_scalar() {
        let mock = MockTransport::new().respond(&[b"0|beef\r\n"]);
        let mut dev = bridge(mock);

        let mut batch = dev.batch();
        batch.write(0x10, 1, Width::Default).unwrap();
        batch.read(0x14, Width::Default).unwrap().mark_result();
        let result = dev.run_batch(&batch).await.unwrap();
        assert_eq!(result, BatchResult::Value(0xBEEF));
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_batch_cache_stable_across_runs() {
        let mock = MockTransport::new()
            .respond(&[b"0|5\r\n"])
            .respond(&[b"0|6\r\n"]);
        let mut dev = bridge(mock);

        let mut batch = dev.batch();
        batch.write(0x10, 0xAB, Width::Byte).unwrap();
        batch.read(0x14, Width::Default).unwrap().mark_result();

        let first = dev.run_batch(&batch).await.unwrap();
        assert_eq!(first, BatchResult::Value(5));
        let second = dev.run_batch(&batch).await.unwrap();
        assert_eq!(second, BatchResult::Value(6));

        // Both runs put byte-identical commands on the wire
        let written = dev.link.transport().written();
        let half = written.len() / 2;
        assert_eq!(&written[..half], &written[half..]);
        assert_eq!(&written[..half], b"wb 10 ab|r 14\n");
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_malformed_response_leaves_link_usable() {
        let mock = MockTransport::new()
            .respond(&[b"not-hex\r\n"])
            .respond(&[b"2a\r\n"]);
        let mut dev = bridge(mock);

        let err = dev.read_register(0x10, Width::Default).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Protocol(CoreError::MalformedResponse(_))
        ));

        // The frame was consumed; the next request proceeds normally
        let value = dev.read_register(0x14, Width::Default).await.unwrap();
        assert_eq!(value, 0x2A);
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_field_count_mismatch() {
        let mock = MockTransport::new().respond(&[b"1|2\r\n"]);
        let mut dev = bridge(mock);

        let err = dev.read_register(0x10, Width::Default).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Protocol(CoreError::FieldCountMismatch {
                expected: 1,
                got: 2
            })
        ));
    }

    #[maybe_async::test(feature = "is_sync", async(not(feature = "is_sync"), tokio::test))]
    async fn test_wait_bit_operation() {
        let mock = MockTransport::new().respond(&[b"20\r\n"]);
        let mut dev = bridge(mock);

        let value = dev
            .execute_operation(Operation::WaitBit {
                addr: 0x4000_5410,
                bit: 5,
                expected: true,
                width: Width::Default,
            })
            .await
            .unwrap();
        assert_eq!(value, 0x20);
        assert_eq!(dev.link.transport().written(), b"u 40005410 25\n");
    }
}
