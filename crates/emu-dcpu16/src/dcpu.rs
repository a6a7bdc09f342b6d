//! The emulator façade.
//!
//! Owns the CPU and its memory and drives them by cycle, by instruction,
//! or until the program settles into the idiomatic one-instruction halt
//! loop (`SUB PC, 1`). All accessors are read-only and safe to call
//! mid-instruction.

use cpu_dcpu16::{Dcpu16, Reg};
use emu_core::{Observable, Tickable, Ticks, Value};

use crate::memory::Memory;

/// A DCPU-16 machine: CPU plus 65,536 words of RAM.
pub struct Emulator {
    cpu: Dcpu16,
    memory: Memory,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    /// Create a machine in reset state: memory and registers zeroed,
    /// SP at 0xFFFF, nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu: Dcpu16::new(),
            memory: Memory::new(),
        }
    }

    /// Reset the machine. Memory and registers are zeroed, SP returns to
    /// 0xFFFF, and any mid-instruction progress is discarded.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory.clear();
    }

    /// Copy a block of words into memory starting at `addr`, wrapping at
    /// the top of the address space.
    pub fn load(&mut self, addr: u16, block: &[u16]) {
        self.memory.load(addr, block);
    }

    /// Set the program counter, so execution can begin at a nonzero load
    /// address.
    pub const fn set_pc(&mut self, addr: u16) {
        self.cpu.regs.pc = addr;
    }

    /// Run exactly `n` clock cycles. The machine may be left
    /// mid-instruction; that is fine, every accessor still works.
    pub fn step_cycles(&mut self, n: Ticks) {
        self.tick_n(n);
    }

    /// Run until one instruction has fully completed and any skip it
    /// armed has been consumed. Returns the cycles elapsed.
    ///
    /// Called mid-instruction, this finishes the current instruction
    /// only.
    pub fn step_instruction(&mut self) -> Ticks {
        let start = self.cpu.total_cycles();
        let target = self.cpu.instructions_retired() + 1;
        while self.cpu.instructions_retired() < target || self.cpu.skip_pending() {
            self.cpu.tick(&mut self.memory);
        }
        self.cpu.total_cycles() - start
    }

    /// Run whole instructions until one leaves PC exactly where it
    /// started - the one-instruction infinite loop idiom (`SUB PC, 1`).
    /// Longer loops are intentionally not detected, so this may run
    /// forever; callers that need a bound should use `step_cycles`.
    /// Returns the total cycles elapsed.
    pub fn step_until_stuck(&mut self) -> Ticks {
        let start = self.cpu.total_cycles();

        // Get to a clean boundary first so the PC comparison below always
        // spans exactly one whole instruction.
        if !self.cpu.is_instruction_complete() || self.cpu.skip_pending() {
            self.step_instruction();
        }

        loop {
            let before = self.cpu.regs.pc;
            self.step_instruction();
            if self.cpu.regs.pc == before {
                return self.cpu.total_cycles() - start;
            }
        }
    }

    /// Read a general register.
    #[must_use]
    pub const fn register(&self, reg: Reg) -> u16 {
        self.cpu.regs.get(reg)
    }

    /// Read the program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.cpu.regs.pc
    }

    /// Read the stack pointer.
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.cpu.regs.sp
    }

    /// Read the overflow register.
    #[must_use]
    pub const fn o(&self) -> u16 {
        self.cpu.regs.o
    }

    /// Read a memory word without side effects.
    #[must_use]
    pub const fn memory(&self, addr: u16) -> u16 {
        self.memory.peek(addr)
    }

    /// Total cycles elapsed since construction.
    #[must_use]
    pub const fn cycles(&self) -> Ticks {
        self.cpu.total_cycles()
    }

    /// The CPU core, for state queries and register snapshots.
    #[must_use]
    pub const fn cpu(&self) -> &Dcpu16 {
        &self.cpu
    }
}

impl Tickable for Emulator {
    fn tick(&mut self) {
        self.cpu.tick(&mut self.memory);
    }
}

impl Observable for Emulator {
    fn query(&self, path: &str) -> Option<Value> {
        self.cpu.query(path)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        self.cpu.query_paths()
    }
}
