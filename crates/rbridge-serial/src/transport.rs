//! Transport layer abstraction for bridge communication
//!
//! This module provides a unified interface for serial and TCP
//! transports. Only the link layer writes to a transport; everything
//! above goes through [`crate::link::Link`].

use maybe_async::maybe_async;

use crate::error::{BridgeError, Result};

/// Byte transport to the bridge device (sync or async depending on the
/// `is_sync` feature)
#[maybe_async(AFIT)]
pub trait Transport {
    /// Write bytes to the transport; may be buffered until [`flush`]
    ///
    /// [`flush`]: Transport::flush
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms`
    ///
    /// Returns the number of bytes read, or 0 on timeout.
    async fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize>;

    /// Flush any buffered outgoing data
    async fn flush(&mut self) -> Result<()>;
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};
    use std::time::Duration;

    /// Serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port with the specified baud rate
        ///
        /// `None` uses the common firmware default of 115200.
        pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
            let baud_rate = baud.unwrap_or(115_200);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_secs(5))
                .open()?;

            log::info!("Opened serial port {} at {} baud", device, baud_rate);

            Ok(Self { port })
        }
    }

    #[maybe_async(AFIT)]
    impl Transport for SerialTransport {
        async fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            Ok(())
        }

        async fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
            self.port
                .set_timeout(Duration::from_millis(u64::from(timeout_ms)))?;

            match self.port.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) => Err(BridgeError::from(e)),
            }
        }

        async fn flush(&mut self) -> Result<()> {
            self.port.flush()?;
            Ok(())
        }
    }
}

pub mod tcp {
    //! TCP socket transport implementation
    //!
    //! Covers devices bridged over the network, e.g. through ser2net.

    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;

    /// TCP socket transport
    pub struct TcpTransport {
        stream: TcpStream,
    }

    impl TcpTransport {
        /// Connect to a bridge device at the specified host and port
        pub fn connect(host: &str, port: u16) -> Result<Self> {
            let addr = format!("{}:{}", host, port);
            log::info!("Connecting to bridge at {}", addr);

            let stream = TcpStream::connect(&addr)
                .map_err(|e| BridgeError::ConnectionFailed(e.to_string()))?;

            // Per-command latency dominates this protocol
            stream.set_nodelay(true).map_err(|e| {
                BridgeError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
            })?;

            log::info!("Connected to bridge at {}", addr);

            Ok(Self { stream })
        }
    }

    #[maybe_async(AFIT)]
    impl Transport for TcpTransport {
        async fn write(&mut self, data: &[u8]) -> Result<()> {
            self.stream.write_all(data)?;
            Ok(())
        }

        async fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
            self.stream
                .set_read_timeout(Some(Duration::from_millis(u64::from(timeout_ms).max(1))))?;

            match self.stream.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
                Err(e) => Err(BridgeError::from(e)),
            }
        }

        async fn flush(&mut self) -> Result<()> {
            self.stream.flush()?;
            Ok(())
        }
    }
}
