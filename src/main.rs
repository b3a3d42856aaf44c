//! rbridge - Register access through microcontroller bridge firmware
//!
//! Talks to a microcontroller that exposes memory-mapped peripheral
//! registers (I2C, SPI, ADC, GPIO, clock control) through a tiny text
//! command language over serial or TCP. Single accesses go out as
//! one-operation commands; latency-sensitive sequences should be
//! batched via the library API.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, FramingArg};
use rbridge_core::codec::{Operation, Width};
use rbridge_core::frame::Framing;
use rbridge_serial::{Bridge, BridgeConnection, SerialTransport, TcpTransport, Transport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let framing = match cli.framing {
        FramingArg::Nul => Framing::Nul,
        FramingArg::Crlf => Framing::CrLf,
    };

    match BridgeConnection::parse(&cli.port)? {
        BridgeConnection::Serial { device, baud } => {
            let transport = SerialTransport::open(&device, baud)?;
            run(Bridge::new(transport, framing), cli)
        }
        BridgeConnection::Tcp { host, port } => {
            let transport = TcpTransport::connect(&host, port)?;
            run(Bridge::new(transport, framing), cli)
        }
    }
}

fn run<T: Transport>(mut bridge: Bridge<T>, cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    bridge.set_timeout(cli.timeout_ms);

    match cli.command {
        Commands::Read { addr, width } => {
            let value = bridge.read_register(addr, parse_width(width)?)?;
            println!("0x{:08x}", value);
        }
        Commands::Write { addr, value, width } => {
            bridge.write_register(addr, value, parse_width(width)?)?;
            log::info!("Wrote 0x{:x} to 0x{:08x}", value, addr);
        }
        Commands::SetBits { addr, bits } => {
            bridge.bit_set(addr, bits)?;
            log::info!("Set bits 0x{:x} at 0x{:08x}", bits, addr);
        }
        Commands::ClearBits { addr, bits } => {
            bridge.bit_clear(addr, bits)?;
            log::info!("Cleared bits 0x{:x} at 0x{:08x}", bits, addr);
        }
        Commands::Wait {
            addr,
            bit,
            level,
            width,
        } => {
            let value = bridge.execute_operation(Operation::WaitBit {
                addr,
                bit,
                expected: level != 0,
                width: parse_width(width)?,
            })?;
            println!("0x{:08x}", value);
        }
        Commands::Raw { command } => {
            let frame = bridge.execute_raw(&command)?;
            println!("{}", String::from_utf8_lossy(&frame));
        }
    }

    Ok(())
}

fn parse_width(bytes: Option<u32>) -> Result<Width, Box<dyn std::error::Error>> {
    match bytes {
        None => Ok(Width::Default),
        Some(n) => Ok(Width::from_bytes(n)?),
    }
}
