/// # chip8vm
///
/// A CHIP-8 interpreter and disassembler.
///
/// ## Design
///
/// * the machine is just state plus `step()`; it does no I/O of its own
/// * one instruction per step, a fixed batch of steps per 60Hz frame; so
///   timing is close to the usual interpreters rather than to a COSMAC VIP
/// * abstract display so can plug alternatives; TUI canvas in-console or
///   plain ASCII frames
/// * the disassembler shares the instruction decoder with the machine, so
///   what's listed is what runs
///
/// Model
///
/// Emulator
///  |-- display, input, sound (borrowed trait objects)
///  |-- machine
///  |    |-- memory map (font at 0x000, program at 0x200)
///  |    `-- instruction set
///  `-- main loop, once per frame
///       |-- apply key transitions from input.poll()
///       |-- machine.step() x cycles_per_frame; stop early on a breakpoint
///       |   or while parked on LD Vx, K
///       |-- display.render() if the machine asked for a redraw
///       |-- tone on while ST > 0; tick DT and ST
///       `-- sleep until the next frame is due
pub mod config;
pub mod disassembler;
pub mod display;
pub mod emulator;
pub mod error;
pub mod input;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod sound;

pub use emulator::{Emulator, Halt};
pub use error::{EmulatorError, MachineError, SoundError};
pub use machine::{Machine, Step};
