/// # emulator
///
/// The driver around the machine. Each frame it:
///  1. applies key transitions from the input
///  2. runs a fixed batch of instructions, stopping early on a breakpoint
///  3. hands the bitmap to the display if the machine asked for a redraw
///  4. drives the tone from the sound timer, then counts both timers down
///
/// Frames are paced at 60Hz, which is also the timer rate.
use crate::disassembler;
use crate::display::Display;
use crate::error::EmulatorError;
use crate::input::{Input, KeyEvent};
use crate::machine::{Machine, Step};
use crate::sound::Sound;
use log::{debug, error, info};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

pub const DEFAULT_CYCLES_PER_FRAME: usize = 10;
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// why `run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// the input asked to stop
    Quit,
    /// PC landed on a breakpoint
    Breakpoint(u16),
    /// the frame budget ran out
    FrameLimit,
}

pub struct Emulator<'a> {
    machine: Machine,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    cycles_per_frame: usize,
    frame_duration: Duration,
    breakpoints: BTreeSet<u16>,
}

impl<'a> Emulator<'a> {
    pub fn new(
        machine: Machine,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Self {
        Emulator {
            machine,
            display,
            input,
            sound,
            cycles_per_frame: DEFAULT_CYCLES_PER_FRAME,
            frame_duration: Duration::from_secs(1) / DEFAULT_FRAME_RATE,
            breakpoints: BTreeSet::new(),
        }
    }

    pub fn with_cycles_per_frame(mut self, cycles: usize) -> Self {
        self.cycles_per_frame = cycles;
        self
    }

    /// 0 means don't pace at all
    pub fn with_frame_rate(mut self, hz: u32) -> Self {
        self.frame_duration = match hz {
            0 => Duration::ZERO,
            hz => Duration::from_secs(1) / hz,
        };
        self
    }

    pub fn add_breakpoint(&mut self, address: u16) {
        self.breakpoints.insert(address);
    }

    pub fn remove_breakpoint(&mut self, address: u16) -> bool {
        self.breakpoints.remove(&address)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// wipe the machine and the screen
    pub fn reset(&mut self) -> Result<(), EmulatorError> {
        self.machine.reset();
        self.sound.stop()?;
        self.display.reset()?;
        Ok(())
    }

    /// reset, then load a program at 0x200
    pub fn load(&mut self, rom: &[u8]) -> Result<(), EmulatorError> {
        self.reset()?;
        self.machine.load_rom(rom)?;
        info!("loaded {} byte program", rom.len());
        Ok(())
    }

    /// registers plus a few instructions either side of PC
    pub fn debug_view(&self) -> String {
        let mut out = self.machine.registers().to_string();
        for line in disassembler::listing(self.machine.memory(), self.machine.pc(), 4, 4) {
            out.push('\n');
            out.push_str(line.trim_end());
        }
        out
    }

    /// one frame's worth of work; Some(halt) if the run loop should stop
    pub fn run_frame(&mut self) -> Result<Option<Halt>, EmulatorError> {
        for event in self.input.poll()? {
            match event {
                KeyEvent::Down(key) => self.machine.set_key(key),
                KeyEvent::Up(key) => self.machine.unset_key(key),
                KeyEvent::Quit => return Ok(Some(Halt::Quit)),
            }
        }

        let mut halt = None;
        for _ in 0..self.cycles_per_frame {
            if let Err(e) = self.machine.step() {
                error!("{}\n{}", e, self.debug_view());
                return Err(e.into());
            }
            let pc = self.machine.pc();
            if self.breakpoints.contains(&pc) {
                halt = Some(Halt::Breakpoint(pc));
                break;
            }
            if self.machine.is_awaiting_key() {
                // nothing more can happen until the next poll
                break;
            }
        }

        if self.machine.redraw() {
            self.display.render(self.machine.display())?;
            self.machine.clear_redraw();
        }

        self.sound.set_tone(self.machine.tone_on())?;
        self.machine.tick_timers();

        Ok(halt)
    }

    /// run frames at the configured rate until something halts the loop
    pub fn run(&mut self, max_frames: Option<u64>) -> Result<Halt, EmulatorError> {
        let mut frames = 0u64;
        let mut next_frame = Instant::now() + self.frame_duration;
        let halt = loop {
            if max_frames.map_or(false, |max| frames >= max) {
                break Halt::FrameLimit;
            }
            if let Some(halt) = self.run_frame()? {
                break halt;
            }
            frames += 1;

            let now = Instant::now();
            if next_frame > now {
                spin_sleep::sleep(next_frame - now);
            }
            next_frame += self.frame_duration;
        };
        self.sound.stop()?;
        info!(
            "halted after {} frames: {:?}\n{}",
            frames,
            halt,
            self.debug_view()
        );
        Ok(halt)
    }

    /// single-step for a debugger: one instruction, redraw included
    pub fn step(&mut self) -> Result<Step, EmulatorError> {
        let step = self.machine.step()?;
        debug!("{:?}", step);
        if self.machine.redraw() {
            self.display.render(self.machine.display())?;
            self.machine.clear_redraw();
        }
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::error::MachineError;
    use crate::input::DummyInput;
    use crate::instruction::Instruction;
    use crate::sound::Mute;

    fn rom(words: &[u16]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    #[test]
    fn test_batch_size() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
        // 20 x ADD V0, 1
        e.load(&rom(&[0x7001; 20]))?;
        e.run_frame()?;
        assert_eq!(e.machine().register(0), 10);
        assert_eq!(e.machine().pc(), 0x214);
        Ok(())
    }

    #[test]
    fn test_custom_batch_size() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        let mut e =
            Emulator::new(Machine::default(), &mut d, &mut i, &mut s).with_cycles_per_frame(3);
        e.load(&rom(&[0x7001; 8]))?;
        e.run_frame()?;
        assert_eq!(e.machine().register(0), 3);
        Ok(())
    }

    #[test]
    fn test_redraw_forwarded_once() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        {
            let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
            // draw a glyph then spin
            e.load(&rom(&[0xa000, 0xd005, 0x1204]))?;
            e.run_frame()?;
            assert!(!e.machine().redraw());
            e.run_frame()?;
        }
        assert_eq!(d.frames, 1);
        assert_eq!(d.resets, 1);
        assert_eq!(d.last_frame[0..4], [1, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_timers_and_tone() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        {
            let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
            // ST := 2, DT := 2, then spin
            e.load(&rom(&[0x6002, 0xf018, 0xf015, 0x1206]))?;
            e.run_frame()?;
            assert_eq!(e.machine().sound_timer(), 1);
            assert_eq!(e.machine().delay_timer(), 1);
            e.run_frame()?;
            assert_eq!(e.machine().sound_timer(), 0);
            e.run_frame()?;
        }
        assert!(!s.playing);
        Ok(())
    }

    #[test]
    fn test_tone_on_while_timer_runs() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        {
            let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
            e.load(&rom(&[0x6005, 0xf018, 0x1204]))?;
            e.run_frame()?;
        }
        assert!(s.playing);
        Ok(())
    }

    #[test]
    fn test_key_events_reach_machine() -> Result<(), EmulatorError> {
        let (mut d, mut s) = (DummyDisplay::new(), Mute::new());
        let mut i = DummyInput::new(vec![
            vec![],
            vec![KeyEvent::Down(0xa)],
            vec![KeyEvent::Up(0xa)],
        ]);
        let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
        // LD V3, K then spin
        e.load(&rom(&[0xf30a, 0x1202]))?;
        e.run_frame()?;
        assert!(e.machine().is_awaiting_key());
        e.run_frame()?;
        assert!(!e.machine().is_awaiting_key());
        assert_eq!(e.machine().register(3), 0xa);
        assert!(e.machine().key(0xa));
        e.run_frame()?;
        assert!(!e.machine().key(0xa));
        Ok(())
    }

    #[test]
    fn test_key_set_directly_on_machine() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
        // SKP V0 / JP 0x200 until key 0 goes down, then LD V1, 1 and spin
        e.load(&rom(&[0xe09e, 0x1200, 0x6101, 0x1206]))?;
        e.run_frame()?;
        assert_eq!(e.machine().register(1), 0);
        e.machine_mut().set_key(0);
        e.run_frame()?;
        assert_eq!(e.machine().register(1), 1);
        assert_eq!(e.machine().pc(), 0x206);
        Ok(())
    }

    #[test]
    fn test_quit() -> Result<(), EmulatorError> {
        let (mut d, mut s) = (DummyDisplay::new(), Mute::new());
        let mut i = DummyInput::new(vec![vec![], vec![KeyEvent::Quit]]);
        let mut e =
            Emulator::new(Machine::default(), &mut d, &mut i, &mut s).with_frame_rate(0);
        e.load(&rom(&[0x1200]))?;
        assert_eq!(e.run(None)?, Halt::Quit);
        Ok(())
    }

    #[test]
    fn test_breakpoint_halts_mid_batch() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        let mut e =
            Emulator::new(Machine::default(), &mut d, &mut i, &mut s).with_frame_rate(0);
        e.load(&rom(&[0x7001; 20]))?;
        e.add_breakpoint(0x206);
        assert_eq!(e.run(Some(100))?, Halt::Breakpoint(0x206));
        assert_eq!(e.machine().register(0), 3);
        // resuming moves on past it
        assert!(e.remove_breakpoint(0x206));
        assert_eq!(e.run_frame()?, None);
        assert_eq!(e.machine().register(0), 13);
        Ok(())
    }

    #[test]
    fn test_frame_limit() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        let mut e =
            Emulator::new(Machine::default(), &mut d, &mut i, &mut s).with_frame_rate(0);
        e.load(&rom(&[0x7001, 0x1200]))?;
        assert_eq!(e.run(Some(4))?, Halt::FrameLimit);
        assert_eq!(e.machine().register(0), 20);
        Ok(())
    }

    #[test]
    fn test_stack_fault_stops_run() {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        let mut e =
            Emulator::new(Machine::default(), &mut d, &mut i, &mut s).with_frame_rate(0);
        e.load(&rom(&[0x00ee])).unwrap();
        match e.run(None) {
            Err(EmulatorError::Machine(MachineError::StackUnderflow { address })) => {
                assert_eq!(address, 0x200)
            }
            other => panic!("expected a stack underflow, got {:?}", other),
        }
    }

    #[test]
    fn test_rom_too_large() {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
        assert!(matches!(
            e.load(&[0; 4000]),
            Err(EmulatorError::Machine(MachineError::RomTooLarge { size: 4000, .. }))
        ));
    }

    #[test]
    fn test_single_step() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        {
            let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
            e.load(&rom(&[0x6105, 0x00e0]))?;
            assert_eq!(e.step()?, Step::Executed(Instruction::LdByte(1, 5)));
            assert_eq!(e.step()?, Step::Executed(Instruction::Cls));
        }
        assert_eq!(d.frames, 1);
        Ok(())
    }

    #[test]
    fn test_debug_view() -> Result<(), EmulatorError> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), DummyInput::new(vec![]), Mute::new());
        let mut e = Emulator::new(Machine::default(), &mut d, &mut i, &mut s);
        e.load(&rom(&[0x6105, 0x00e0]))?;
        e.step()?;
        let view = e.debug_view();
        assert!(view.starts_with("I: 0  PC: 202"));
        assert!(view.contains("  0200:  6105  LD V1, 0x5"));
        assert!(view.contains("> 0202:  00E0  CLS"));
        Ok(())
    }
}
