//! State pretty-printing and memory dumping.
//!
//! Observation-only helpers layered on the emulator's read accessors, for
//! the driver binary and for eyeballing state in tests.

use std::fmt::Write as _;

use cpu_dcpu16::Reg;

use crate::dcpu::Emulator;

/// One-line register dump:
/// `A=0000 B=0000 ... J=0000 PC=0000 SP=FFFF O=0000  cycles=0`.
#[must_use]
pub fn registers_line(emu: &Emulator) -> String {
    let mut line = String::new();
    for reg in Reg::ALL {
        let _ = write!(line, "{}={:04X} ", reg.name(), emu.register(reg));
    }
    let _ = write!(
        line,
        "PC={:04X} SP={:04X} O={:04X}  cycles={}",
        emu.pc(),
        emu.sp(),
        emu.o(),
        emu.cycles()
    );
    line
}

/// Hex dump of `count` words starting at `start`, eight words per row,
/// wrapping at the top of the address space.
#[must_use]
pub fn memory_dump(emu: &Emulator, start: u16, count: usize) -> String {
    let mut out = String::new();
    let mut addr = start;
    let mut remaining = count;
    while remaining > 0 {
        let _ = write!(out, "{addr:04X}:");
        for _ in 0..remaining.min(8) {
            let _ = write!(out, " {:04X}", emu.memory(addr));
            addr = addr.wrapping_add(1);
        }
        remaining = remaining.saturating_sub(8);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_line_shows_reset_state() {
        let emu = Emulator::new();
        let line = registers_line(&emu);
        assert!(line.starts_with("A=0000 "));
        assert!(line.contains("SP=FFFF"));
        assert!(line.contains("PC=0000"));
        assert!(line.ends_with("cycles=0"));
    }

    #[test]
    fn memory_dump_formats_rows_of_eight() {
        let mut emu = Emulator::new();
        emu.load(0, &[0x7C01, 0x0030]);
        let dump = memory_dump(&emu, 0, 10);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0000: 7C01 0030 0000 0000 0000 0000 0000 0000");
        assert_eq!(lines[1], "0008: 0000 0000");
    }

    #[test]
    fn memory_dump_wraps_at_top_of_memory() {
        let mut emu = Emulator::new();
        emu.load(0xFFFF, &[0x1111, 0x2222]);
        let dump = memory_dump(&emu, 0xFFFF, 2);
        assert_eq!(dump, "FFFF: 1111 2222\n");
    }
}
