use std::collections::VecDeque;

use chip8core::{Key, Keypad};

/// A keypad driven by the host program rather than a keyboard: keys are held
/// and released explicitly, and typed characters are queued up front.
#[derive(Clone, Debug, Default)]
pub struct ScriptedKeypad {
    down: [bool; 16],
    typed: VecDeque<char>,
}

impl ScriptedKeypad {
    pub fn new() -> ScriptedKeypad {
        Default::default()
    }

    pub fn press(&mut self, key: Key) {
        self.down[key as usize] = true;
    }

    pub fn release(&mut self, key: Key) {
        self.down[key as usize] = false;
    }

    /// Queues `text` to be handed out one character per poll.
    pub fn type_str(&mut self, text: &str) {
        self.typed.extend(text.chars());
    }

    pub fn pending(&self) -> usize {
        self.typed.len()
    }
}

impl Keypad for ScriptedKeypad {
    fn is_down(&self, key: Key) -> bool {
        self.down[key as usize]
    }

    fn typed(&mut self) -> Option<char> {
        self.typed.pop_front()
    }
}
