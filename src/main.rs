use std::error::Error;
use std::fs;
use std::io;

use clap::Parser;
use log::info;

use chip8vm::config::Config;
use chip8vm::disassembler;
use chip8vm::display::{AsciiDisplay, Display, TermDisplay};
use chip8vm::emulator::Emulator;
use chip8vm::input::{Keymap, TermInput};
use chip8vm::machine::{Machine, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chip8vm::sound::{Mute, SimpleBeep, Sound};

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::parse();
    env_logger::init();

    let rom = fs::read(&config.rom)?;
    info!("read {} bytes from {}", rom.len(), config.rom.display());

    if config.disassemble {
        for line in disassembler::disassemble(&rom, config.base as usize) {
            println!("{}", line.trim_end());
        }
        return Ok(());
    }

    // initialise
    let mut display: Box<dyn Display> = if config.ascii {
        Box::new(AsciiDisplay::new(io::stdout(), DISPLAY_WIDTH).raw())
    } else {
        let mut d = TermDisplay::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)?;
        d.fullscreen()?;
        Box::new(d)
    };
    let keymap = if config.literal_keys {
        Keymap::literal()
    } else {
        Keymap::conventional()
    };
    let mut input = TermInput::new(keymap)?;
    let mut sound: Box<dyn Sound> = if config.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let mut machine = Machine::new(DISPLAY_WIDTH, DISPLAY_HEIGHT);
    if let Some(seed) = config.seed {
        machine.seed(seed);
    }

    let halt = {
        let mut emulator = Emulator::new(machine, display.as_mut(), &mut input, sound.as_mut())
            .with_cycles_per_frame(config.cycles_per_frame);
        for &address in &config.breakpoints {
            emulator.add_breakpoint(address);
        }
        emulator.load(&rom)?;
        emulator.run(config.max_frames)?
    };

    // put the terminal back before saying anything
    drop(input);
    drop(display);
    println!("halted: {:?}", halt);
    Ok(())
}
