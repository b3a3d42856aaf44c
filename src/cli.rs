//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Frame delimiter convention of the connected firmware
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FramingArg {
    /// Responses end with a zero byte
    Nul,
    /// Responses end with CR/LF
    Crlf,
}

#[derive(Parser)]
#[command(name = "rbridge")]
#[command(author, version, about = "Register access over bridge firmware", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bridge connection (dev=/dev/ttyACM0[:BAUD] or ip=host:port)
    #[arg(short, long, global = true, default_value = "dev=/dev/ttyACM0")]
    pub port: String,

    /// Frame delimiter used by the firmware
    #[arg(long, global = true, value_enum, default_value = "crlf")]
    pub framing: FramingArg,

    /// Response timeout in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    pub timeout_ms: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a register
    Read {
        /// Register address (hex with 0x prefix, or decimal)
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Access width in bytes (1, 2 or 4; default: device width)
        #[arg(short, long)]
        width: Option<u32>,
    },

    /// Write a register
    Write {
        /// Register address
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Value to write
        #[arg(value_parser = parse_hex_u32)]
        value: u32,

        /// Access width in bytes (1, 2 or 4; default: device width)
        #[arg(short, long)]
        width: Option<u32>,
    },

    /// Set bits in a register (read-modify-write, not atomic)
    SetBits {
        /// Register address
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Bit mask to OR in
        #[arg(value_parser = parse_hex_u32)]
        bits: u32,
    },

    /// Clear bits in a register (read-modify-write, not atomic)
    ClearBits {
        /// Register address
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Bit mask to clear
        #[arg(value_parser = parse_hex_u32)]
        bits: u32,
    },

    /// Poll a register until a bit reaches the given level
    Wait {
        /// Register address
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Bit index (0-31)
        bit: u8,

        /// Level to wait for (0 or 1)
        #[arg(default_value_t = 1)]
        level: u8,

        /// Access width in bytes (1, 2 or 4; default: device width)
        #[arg(short, long)]
        width: Option<u32>,
    },

    /// Send a raw command string (without terminator) and print the
    /// response fields
    Raw {
        /// Command, e.g. "w 40005400 101|r 40005410"
        command: String,
    },
}
