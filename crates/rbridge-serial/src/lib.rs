//! rbridge-serial - Transport and request correlation for register
//! bridge firmware
//!
//! This crate carries everything between the pure protocol core
//! (`rbridge-core`) and the wire: a [`Transport`] abstraction with
//! serial port and TCP implementations, the one-request-at-a-time
//! [`Link`] correlator, and the [`Bridge`] device surface that
//! applications use.
//!
//! # Supported transports
//!
//! - Serial port: `/dev/ttyUSB0`, `/dev/ttyACM0`, `COM1`, etc.
//! - TCP socket: `host:port` (e.g. a device behind ser2net)
//!
//! # Example
//!
//! ```no_run
//! use rbridge_core::codec::Width;
//! use rbridge_core::frame::Framing;
//! use rbridge_serial::open_serial;
//!
//! # #[maybe_async::maybe_async]
//! # async fn demo() -> rbridge_serial::Result<()> {
//! let mut bridge = open_serial("/dev/ttyACM0", None, Framing::CrLf)?;
//!
//! // Single register access
//! let status = bridge.read_register(0x4000_5410, Width::Default).await?;
//!
//! // Batched I2C start sequence, one wire round trip
//! let mut batch = bridge.batch();
//! batch
//!     .write(0x4000_5400, 0x101, Width::Default)?
//!     .wait(0x4000_5410, 1, true, Width::Default)?
//!     .read(0x4000_5424, Width::Default)?
//!     .mark_result();
//! let received = bridge.run_batch(&batch).await?;
//! # let _ = (status, received);
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod error;
pub mod link;
pub mod transport;

#[cfg(test)]
mod testutil;

// Re-exports
pub use device::Bridge;
pub use error::{BridgeError, Result};
pub use link::{Link, DEFAULT_TIMEOUT_MS};
pub use transport::serial::SerialTransport;
pub use transport::tcp::TcpTransport;
pub use transport::Transport;

use rbridge_core::frame::Framing;

/// Connection options for a bridge device
#[derive(Debug, Clone)]
pub enum BridgeConnection {
    /// Serial port connection
    Serial {
        /// Device path (e.g. "/dev/ttyACM0" or "COM3")
        device: String,
        /// Baud rate (None for the firmware default)
        baud: Option<u32>,
    },
    /// TCP socket connection
    Tcp {
        /// Hostname or IP address
        host: String,
        /// Port number
        port: u16,
    },
}

impl BridgeConnection {
    /// Parse a connection string of the form `scheme=target`
    ///
    /// Accepted schemes:
    /// - `dev=/dev/ttyACM0` or `dev=/dev/ttyACM0:115200` - serial port,
    ///   optionally with a baud rate
    /// - `ip=host:port` - TCP socket
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let (scheme, target) = s
            .split_once('=')
            .ok_or_else(|| format!("bridge port {:?}: expected dev=PATH[:BAUD] or ip=HOST:PORT", s))?;

        match scheme {
            "dev" => {
                // A trailing :NUMBER is a baud rate; everything else is
                // part of the device path
                match target.rsplit_once(':') {
                    Some((device, baud)) => {
                        let baud = baud
                            .parse()
                            .map_err(|_| format!("bridge port {:?}: bad baud rate {:?}", s, baud))?;
                        Ok(BridgeConnection::Serial {
                            device: device.to_string(),
                            baud: Some(baud),
                        })
                    }
                    None => Ok(BridgeConnection::Serial {
                        device: target.to_string(),
                        baud: None,
                    }),
                }
            }
            "ip" => {
                let (host, port) = target
                    .rsplit_once(':')
                    .ok_or_else(|| format!("bridge port {:?}: missing TCP port", s))?;
                let port = port
                    .parse()
                    .map_err(|_| format!("bridge port {:?}: bad TCP port {:?}", s, port))?;
                Ok(BridgeConnection::Tcp {
                    host: host.to_string(),
                    port,
                })
            }
            other => Err(format!("bridge port {:?}: unknown scheme {:?}", s, other)),
        }
    }
}

/// Open a bridge over a serial port
pub fn open_serial(
    device: &str,
    baud: Option<u32>,
    framing: Framing,
) -> Result<Bridge<SerialTransport>> {
    let transport = SerialTransport::open(device, baud)?;
    Ok(Bridge::new(transport, framing))
}

/// Open a bridge over TCP
pub fn open_tcp(host: &str, port: u16, framing: Framing) -> Result<Bridge<TcpTransport>> {
    let transport = TcpTransport::connect(host, port)?;
    Ok(Bridge::new(transport, framing))
}
