use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use log::warn;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// map of characters typed at the keyboard to what the chip8 might expect
/// where '1' => 0x01 and 'a' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using left-hand side of qwerty keyboard, laid out like the
/// COSMAC VIP hex pad:
///   1 2 3 4      1 2 3 C
///   q w e r  =>  4 5 6 D
///   a s d f      7 8 9 E
///   z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// terminals don't report key releases, so a key counts as held for this
/// many frames after its last press (auto-repeat keeps it alive)
const HOLD_FRAMES: u8 = 6;

/// a key transition on the 16-key pad, or a request to stop emulating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(u8),
    Up(u8),
    Quit,
}

/// reads keypresses
pub trait Input {
    /// everything that happened since the last poll; must not block
    fn poll(&mut self) -> Result<Vec<KeyEvent>, io::Error>;
}

/// fixed lookup from a physical key to a pad key
pub struct Keymap(HashMap<char, u8>);

impl Keymap {
    pub fn conventional() -> Self {
        Keymap(HashMap::from(CHIP8_CONVENTIONAL_KEYMAP))
    }

    pub fn literal() -> Self {
        Keymap(HashMap::from(CHIP8_LITERAL_KEYMAP))
    }

    pub fn lookup(&self, key: char) -> Option<u8> {
        self.0.get(&key.to_ascii_lowercase()).copied()
    }
}

/// press/release bookkeeping for inputs that only ever see presses
struct HeldKeys {
    frames_left: [u8; 16],
}

impl HeldKeys {
    fn new() -> Self {
        HeldKeys {
            frames_left: [0; 16],
        }
    }

    /// a press; only reported as a transition if the key wasn't held
    fn press(&mut self, key: u8) -> Option<KeyEvent> {
        let slot = &mut self.frames_left[key as usize & 0xf];
        let was_up = *slot == 0;
        *slot = HOLD_FRAMES;
        if was_up {
            Some(KeyEvent::Down(key))
        } else {
            None
        }
    }

    /// one frame has gone by; release whatever ran out
    fn tick(&mut self) -> Vec<KeyEvent> {
        let mut released = Vec::new();
        for (key, slot) in self.frames_left.iter_mut().enumerate() {
            if *slot > 0 {
                *slot -= 1;
                if *slot == 0 {
                    released.push(KeyEvent::Up(key as u8));
                }
            }
        }
        released
    }
}

/// keyboard input from the terminal, using crossterm in raw mode
pub struct TermInput {
    keymap: Keymap,
    held: HeldKeys,
}

impl TermInput {
    pub fn new(keymap: Keymap) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap,
            held: HeldKeys::new(),
        })
    }

    fn translate(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Option<KeyEvent> {
        match code {
            KeyCode::Esc => Some(KeyEvent::Quit),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(KeyEvent::Quit)
            }
            KeyCode::Char(key) => match self.keymap.lookup(key) {
                Some(mapped_key) => self.held.press(mapped_key),
                None => {
                    warn!("can't map {:?} to a CHIP-8 key", key);
                    None
                }
            },
            _ => None,
        }
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll(&mut self) -> Result<Vec<KeyEvent>, io::Error> {
        let mut events = self.held.tick();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = event::read()? {
                if let Some(e) = self.translate(evt.code, evt.modifiers) {
                    events.push(e);
                }
            }
        }
        Ok(events)
    }
}

/// dummy Input implementation for testing: hands out one scripted batch of
/// events per poll, then nothing
pub struct DummyInput {
    batches: VecDeque<Vec<KeyEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<KeyEvent>>) -> Self {
        DummyInput {
            batches: VecDeque::from(batches),
        }
    }
}

impl Input for DummyInput {
    fn poll(&mut self) -> Result<Vec<KeyEvent>, io::Error> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}
