//! Cycle-accurate DCPU-16 emulator.
//!
//! Wires the CPU core to a flat 65,536-word memory and exposes the
//! emulator façade: program loading, cycle- and instruction-level
//! stepping, trivial-infinite-loop detection, and read accessors that are
//! safe at any point, including mid-instruction.

mod dcpu;
mod dump;
mod memory;
mod words;

pub use cpu_dcpu16::{Dcpu16, OpRef, Reg, Registers};
pub use dcpu::Emulator;
pub use dump::{memory_dump, registers_line};
pub use memory::Memory;
pub use words::words_from_bytes;
