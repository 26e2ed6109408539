use crate::error::SoundError;
use beep::beep;

/// Makes the one tone the machine knows about. Starting a tone that is
/// already playing, or stopping a silent one, does nothing.
pub trait Sound {
    fn beep(&mut self) -> Result<(), SoundError>;
    fn stop(&mut self) -> Result<(), SoundError>;

    /// follow the sound timer: tone on while it's non-zero
    fn set_tone(&mut self, on: bool) -> Result<(), SoundError> {
        if on {
            self.beep()
        } else {
            self.stop()
        }
    }
}

const SIMPLEBEEP_PITCH: u16 = 1000; // Hz

/// square wave through the PC speaker
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), SoundError> {
        if !self.is_beeping {
            beep(SIMPLEBEEP_PITCH).map_err(|e| SoundError::Device(e.to_string()))?;
            self.is_beeping = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SoundError> {
        if self.is_beeping {
            beep(0).map_err(|e| SoundError::Device(e.to_string()))?;
            self.is_beeping = false;
        }
        Ok(())
    }
}

/// silence; still remembers whether it would be playing
#[derive(Default)]
pub struct Mute {
    pub playing: bool,
}

impl Mute {
    pub fn new() -> Self {
        Mute { playing: false }
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), SoundError> {
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SoundError> {
        self.playing = false;
        Ok(())
    }
}
