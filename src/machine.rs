/// # machine
///
/// The CHIP-8 state and its fetch/decode/execute cycle:
///  * V0-VF   8-bit general registers; VF doubles as the carry/borrow/collision flag
///  * I       16-bit index register
///  * PC      16-bit program counter                -- 0x200 after reset
///  * stack   16 return addresses and a stack pointer
///  * DT, ST  delay and sound timers, counted down by whoever drives the machine
///  * display one byte (0 or 1) per pixel, row-major
///  * keys    16 flags, set and cleared from outside
///
/// Each `step()` runs one instruction. LD Vx, K doesn't spin: the machine
/// parks itself on the instruction and every step reports that it is still
/// waiting until a key goes down.
use crate::error::MachineError;
use crate::instruction::{Instruction, Opcode};
use crate::memory::{self, Chip8MemoryMap, MemoryMap};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const STACK_DEPTH: usize = 16;
pub const KEY_COUNT: usize = 16;

const FLAG: usize = 0xf;

/// what a single `step()` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed(Instruction),
    /// the word at PC matched nothing executable; PC has moved past it
    Unimplemented(u16),
    /// parked on LD Vx, K with no key yet
    AwaitingKey,
    /// LD Vx, K picked up this key and the machine moved on
    KeyCaptured(u8),
}

pub struct Machine {
    memory: Chip8MemoryMap,
    registers: [u8; 16],
    index: u16,
    program_counter: u16,
    stack: [u16; STACK_DEPTH],
    stack_pointer: usize,
    delay_timer: u8,
    sound_timer: u8,
    display: Vec<u8>,
    width: usize,
    height: usize,
    keys: [bool; KEY_COUNT],
    redraw: bool,
    key_wait: Option<u8>,
    pending_key: Option<u8>,
    rng: StdRng,
}

impl Machine {
    /// a freshly reset machine with a width x height display
    pub fn new(width: usize, height: usize) -> Self {
        let mut m = Machine {
            memory: Chip8MemoryMap::new(),
            registers: [0; 16],
            index: 0,
            program_counter: memory::PROGRAM_ADDR,
            stack: [0; STACK_DEPTH],
            stack_pointer: 0,
            delay_timer: 0,
            sound_timer: 0,
            display: vec![0; width * height],
            width,
            height,
            keys: [false; KEY_COUNT],
            redraw: false,
            key_wait: None,
            pending_key: None,
            rng: StdRng::from_entropy(),
        };
        m.reset();
        m
    }

    /// make RND reproducible
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// back to power-on state: memory zeroed with the font re-seeded,
    /// registers, stack, timers and display cleared, PC at 0x200
    pub fn reset(&mut self) {
        self.memory.reset();
        self.registers = [0; 16];
        self.index = 0;
        self.program_counter = memory::PROGRAM_ADDR;
        self.stack = [0; STACK_DEPTH];
        self.stack_pointer = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.display.fill(0);
        self.redraw = false;
        self.key_wait = None;
        self.pending_key = None;
        debug!("machine reset");
    }

    /// copy a program in at 0x200 without touching anything else; call
    /// `reset` first for a clean start
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), MachineError> {
        self.memory.load_program(rom)
    }

    /// run one instruction
    pub fn step(&mut self) -> Result<Step, MachineError> {
        if let Some(x) = self.key_wait {
            return Ok(match self.pending_key.take() {
                Some(key) => {
                    self.registers[x as usize] = key;
                    self.key_wait = None;
                    self.program_counter = self.program_counter.wrapping_add(2);
                    Step::KeyCaptured(key)
                }
                None => Step::AwaitingKey,
            });
        }

        // fetch
        let address = self.program_counter;
        let opcode = Opcode(self.memory.get_word(address));
        self.program_counter = self.program_counter.wrapping_add(2);

        // decode
        let instr = match Instruction::decode(opcode) {
            Some(instr) => instr,
            None => return Ok(self.unimplemented(address, opcode)),
        };
        trace!("{:04X}: {}", address, instr);

        // execute
        self.execute(address, opcode, instr)
    }

    fn unimplemented(&self, address: u16, opcode: Opcode) -> Step {
        warn!(
            "opcode 0x{:04X} at 0x{:03X} not implemented",
            opcode.0, address
        );
        Step::Unimplemented(opcode.0)
    }

    fn execute(
        &mut self,
        address: u16,
        opcode: Opcode,
        instr: Instruction,
    ) -> Result<Step, MachineError> {
        use Instruction::*;
        match instr {
            // machine-code routines can't run here
            Sys(_) => return Ok(self.unimplemented(address, opcode)),
            Cls => {
                self.display.fill(0);
                self.redraw = true;
            }
            Ret => {
                if self.stack_pointer == 0 {
                    return Err(MachineError::StackUnderflow { address });
                }
                self.stack_pointer -= 1;
                self.program_counter = self.stack[self.stack_pointer];
            }
            Jp(nnn) => self.program_counter = nnn,
            Call(nnn) => {
                if self.stack_pointer == STACK_DEPTH {
                    return Err(MachineError::StackOverflow { address });
                }
                self.stack[self.stack_pointer] = self.program_counter;
                self.stack_pointer += 1;
                self.program_counter = nnn;
            }
            SeByte(x, kk) => self.skip_if(self.v(x) == kk),
            SneByte(x, kk) => self.skip_if(self.v(x) != kk),
            SeReg(x, y) => self.skip_if(self.v(x) == self.v(y)),
            LdByte(x, kk) => self.set_v(x, kk),
            AddByte(x, kk) => self.set_v(x, self.v(x).wrapping_add(kk)),
            LdReg(x, y) => self.set_v(x, self.v(y)),
            Or(x, y) => self.set_v(x, self.v(x) | self.v(y)),
            And(x, y) => self.set_v(x, self.v(x) & self.v(y)),
            Xor(x, y) => self.set_v(x, self.v(x) ^ self.v(y)),
            // the flag goes in first, so with x = F the result wins
            AddReg(x, y) => {
                let (vx, vy) = (self.v(x), self.v(y));
                let (result, carry) = vx.overflowing_add(vy);
                self.set_flag(carry);
                self.set_v(x, result);
            }
            Sub(x, y) => {
                let (vx, vy) = (self.v(x), self.v(y));
                self.set_flag(vx > vy);
                self.set_v(x, vx.wrapping_sub(vy));
            }
            // NB. the flag is taken from Vy while Vx is what gets shifted
            Shr(x, y) => {
                let (vx, vy) = (self.v(x), self.v(y));
                self.set_flag(vy & 1 == 1);
                self.set_v(x, vx >> 1);
            }
            Subn(x, y) => {
                let (vx, vy) = (self.v(x), self.v(y));
                self.set_flag(vy > vx);
                self.set_v(x, vy.wrapping_sub(vx));
            }
            Shl(x, y) => {
                let (vx, vy) = (self.v(x), self.v(y));
                self.set_flag((vy >> 7) & 1 == 1);
                self.set_v(x, vx << 1);
            }
            SneReg(x, y) => self.skip_if(self.v(x) != self.v(y)),
            LdI(nnn) => self.index = nnn,
            JpV(x, nnn) => self.program_counter = nnn + self.v(x) as u16,
            Rnd(x, kk) => {
                let byte: u8 = self.rng.gen();
                self.set_v(x, byte & kk);
            }
            Drw(x, y, n) => self.draw_sprite(self.v(x), self.v(y), n),
            Skp(x) => self.skip_if(self.key(self.v(x))),
            Sknp(x) => self.skip_if(!self.key(self.v(x))),
            LdRegDt(x) => self.set_v(x, self.delay_timer),
            LdKey(x) => {
                // park on this instruction until a key goes down
                self.key_wait = Some(x);
                self.pending_key = None;
                self.program_counter = address;
                return Ok(Step::AwaitingKey);
            }
            LdDtReg(x) => self.delay_timer = self.v(x),
            LdSt(x) => self.sound_timer = self.v(x),
            AddI(x) => self.index = self.index.wrapping_add(self.v(x) as u16),
            LdF(x) => {
                self.index = memory::FONT_ADDR + self.v(x) as u16 * memory::FONT_GLYPH_BYTES
            }
            LdB(x) => {
                let value = self.v(x);
                self.memory.store(self.index, value / 100);
                self.memory.store(self.index.wrapping_add(1), value / 10 % 10);
                self.memory.store(self.index.wrapping_add(2), value % 10);
            }
            LdDerefIReg(x) => {
                for r in 0..=x {
                    self.memory
                        .store(self.index.wrapping_add(r as u16), self.v(r));
                }
            }
            LdRegDerefI(x) => {
                for r in 0..=x {
                    let byte = self.memory.fetch(self.index.wrapping_add(r as u16));
                    self.set_v(r, byte);
                }
            }
        }
        Ok(Step::Executed(instr))
    }

    /// XOR an n-row sprite from memory at I onto the display. Coordinates
    /// wrap around both edges. VF ends up 1 if any lit pixel got switched off.
    fn draw_sprite(&mut self, x: u8, y: u8, rows: u8) {
        self.set_flag(false);
        if self.display.is_empty() {
            return;
        }
        let mut collision = false;
        for y_line in 0..rows as usize {
            let sprite = self.memory.fetch(self.index.wrapping_add(y_line as u16));
            for x_line in 0..8 {
                if sprite & (0x80 >> x_line) == 0 {
                    continue;
                }
                let col = (x as usize + x_line) % self.width;
                let row = (y as usize + y_line) % self.height;
                let cell = &mut self.display[row * self.width + col];
                *cell ^= 1;
                if *cell == 0 {
                    collision = true;
                }
            }
        }
        self.set_flag(collision);
        self.redraw = true;
    }

    fn v(&self, register: u8) -> u8 {
        self.registers[register as usize]
    }

    fn set_v(&mut self, register: u8, value: u8) {
        self.registers[register as usize] = value;
    }

    fn set_flag(&mut self, flag: bool) {
        self.registers[FLAG] = flag as u8;
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    /// key-down; wakes a machine parked on LD Vx, K
    pub fn set_key(&mut self, key: u8) {
        match self.keys.get_mut(key as usize) {
            Some(slot) => *slot = true,
            None => {
                warn!("ignoring key-down for unknown key 0x{:02X}", key);
                return;
            }
        }
        if self.key_wait.is_some() && self.pending_key.is_none() {
            self.pending_key = Some(key);
        }
    }

    pub fn unset_key(&mut self, key: u8) {
        if let Some(slot) = self.keys.get_mut(key as usize) {
            *slot = false;
        }
    }

    /// keys outside 0-F are never down
    pub fn key(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// count both timers down by one, stopping at zero
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn tone_on(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    pub fn is_awaiting_key(&self) -> bool {
        self.key_wait.is_some()
    }

    pub fn redraw(&self) -> bool {
        self.redraw
    }

    pub fn clear_redraw(&mut self) {
        self.redraw = false;
    }

    pub fn display(&self) -> &[u8] {
        &self.display
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.get_ro_slice()
    }

    pub fn pc(&self) -> u16 {
        self.program_counter
    }

    pub fn register(&self, register: u8) -> u8 {
        self.v(register & 0xf)
    }

    pub fn set_register(&mut self, register: u8, value: u8) {
        self.set_v(register & 0xf, value)
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn stack_pointer(&self) -> usize {
        self.stack_pointer
    }

    /// snapshot for debug views
    pub fn registers(&self) -> RegisterDump {
        RegisterDump {
            v: self.registers,
            index: self.index,
            program_counter: self.program_counter,
            stack_pointer: self.stack_pointer as u8,
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDump {
    pub v: [u8; 16],
    pub index: u16,
    pub program_counter: u16,
    pub stack_pointer: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "I: {:X}  PC: {:X}  SP: {:X}  DT: {:X}  ST: {:X}",
            self.index, self.program_counter, self.stack_pointer, self.delay_timer, self.sound_timer
        )?;
        for (i, value) in self.v.iter().enumerate() {
            if i % 8 == 0 {
                writeln!(f)?;
            } else {
                write!(f, "  ")?;
            }
            write!(f, "V{:X}: {:X}", i, value)?;
        }
        Ok(())
    }
}
