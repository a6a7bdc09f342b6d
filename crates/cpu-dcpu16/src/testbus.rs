//! Flat 64K-word RAM bus shared by the unit tests.

use emu_core::Bus;

pub struct FlatRam {
    words: [u16; 0x1_0000],
}

impl FlatRam {
    pub fn new() -> Self {
        Self {
            words: [0; 0x1_0000],
        }
    }

    /// Load a block of words starting at `addr`.
    pub fn load(&mut self, addr: u16, words: &[u16]) {
        let mut at = addr;
        for &word in words {
            self.words[usize::from(at)] = word;
            at = at.wrapping_add(1);
        }
    }

    /// Side-effect-free read for assertions.
    pub fn peek(&self, addr: u16) -> u16 {
        self.words[usize::from(addr)]
    }
}

impl Bus for FlatRam {
    fn read(&mut self, address: u16) -> u16 {
        self.words[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u16) {
        self.words[usize::from(address)] = value;
    }
}
