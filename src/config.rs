use clap::Parser;
use std::path::PathBuf;

use crate::emulator::DEFAULT_CYCLES_PER_FRAME;

/// Run or disassemble a CHIP-8 program
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// ROM image to load at 0x200
    pub rom: PathBuf,

    /// List the ROM instead of running it
    #[arg(short, long, default_value_t = false)]
    pub disassemble: bool,

    /// Address the first ROM byte is labelled with in a listing (hex)
    #[arg(long, value_name = "ADDR", value_parser = parse_address, default_value = "200")]
    pub base: u16,

    /// Instructions executed per 60Hz frame
    #[arg(short, long, default_value_t = DEFAULT_CYCLES_PER_FRAME)]
    pub cycles_per_frame: usize,

    /// Draw frames as plain text instead of the TUI canvas
    #[arg(long, default_value_t = false)]
    pub ascii: bool,

    /// No sound
    #[arg(short, long, default_value_t = false)]
    pub mute: bool,

    /// Keys 0-9 and a-f press the pad key of the same name
    #[arg(long, default_value_t = false)]
    pub literal_keys: bool,

    /// Stop when PC reaches this address (hex; may repeat)
    #[arg(short = 'b', long = "break", value_name = "ADDR", value_parser = parse_address)]
    pub breakpoints: Vec<u16>,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    pub max_frames: Option<u64>,

    /// Seed for RND, for reproducible runs
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

/// a 12-bit address in hex, with or without a leading 0x
pub fn parse_address(raw: &str) -> Result<u16, String> {
    let digits = raw
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    let address =
        u16::from_str_radix(digits, 16).map_err(|e| format!("bad address {:?}: {}", raw, e))?;
    if address > 0xfff {
        return Err(format!("address {:?} is past the end of memory", raw));
    }
    Ok(address)
}
