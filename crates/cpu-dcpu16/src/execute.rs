//! Per-opcode execute stage.
//!
//! Both operands are read before anything is written, so an instruction
//! whose operands alias the same location still sees consistent values.
//! Arithmetic runs in a widened intermediate wherever the overflow
//! register needs the high half of the result.

use emu_core::Bus;

use crate::cpu::Dcpu16;
use crate::decode::Decoded;

impl Dcpu16 {
    /// True when the opcode charges no cycles beyond fetch and operand
    /// resolution, so its execute step runs inside the preceding cycle.
    pub(crate) fn execute_is_instant(&self) -> bool {
        match Decoded::decode(self.inst) {
            // SET, AND, BOR, XOR
            Decoded::Basic { op, .. } => matches!(op, 0x1 | 0x9 | 0xA | 0xB),
            // JSR
            Decoded::Extended { .. } => false,
        }
    }

    /// Apply the current instruction's effect.
    ///
    /// Returns the extra cycles charged beyond fetch and operand
    /// resolution, including the extra cycle of a failed conditional. For
    /// non-instant opcodes the first of them is the cycle this call runs
    /// in; the scheduler burns the rest.
    pub(crate) fn execute_inst<B: Bus>(&mut self, bus: &mut B) -> u8 {
        match Decoded::decode(self.inst) {
            Decoded::Basic { op, .. } => self.execute_basic(op, bus),
            // Only JSR reaches execute; other extended opcodes complete at
            // the fetch boundary.
            Decoded::Extended { .. } => self.execute_jsr(bus),
        }
    }

    fn execute_basic<B: Bus>(&mut self, op: u8, bus: &mut B) -> u8 {
        let dst = self.a_ref.expect("operand a resolved");
        let src = self.b_ref.expect("operand b resolved");
        let a = dst.read(&self.regs, bus);
        let b = src.read(&self.regs, bus);

        match op {
            // SET
            0x1 => {
                dst.write(&mut self.regs, bus, b);
                0
            }
            // ADD: O is 1 on carry out of bit 15, else 0
            0x2 => {
                let sum = u32::from(a) + u32::from(b);
                dst.write(&mut self.regs, bus, sum as u16);
                self.regs.o = u16::from(sum > 0xFFFF);
                1
            }
            // SUB: O is 0xFFFF on underflow, else 0
            0x3 => {
                dst.write(&mut self.regs, bus, a.wrapping_sub(b));
                self.regs.o = if a < b { 0xFFFF } else { 0 };
                1
            }
            // MUL: O holds the high word of the 32-bit product
            0x4 => {
                let product = u32::from(a) * u32::from(b);
                dst.write(&mut self.regs, bus, product as u16);
                self.regs.o = (product >> 16) as u16;
                1
            }
            // DIV: by zero yields 0 with O cleared; otherwise O holds the
            // fractional bits (a << 16) / b, computed from the dividend as
            // read, before the quotient lands
            0x5 => {
                if b == 0 {
                    dst.write(&mut self.regs, bus, 0);
                    self.regs.o = 0;
                } else {
                    dst.write(&mut self.regs, bus, a / b);
                    self.regs.o = ((u32::from(a) << 16) / u32::from(b)) as u16;
                }
                2
            }
            // MOD: by zero yields 0; O untouched either way
            0x6 => {
                dst.write(&mut self.regs, bus, if b == 0 { 0 } else { a % b });
                2
            }
            // SHL: O holds the bits shifted out the top. Counts of 32 or
            // more push everything past the O window.
            0x7 => {
                let wide = if b < 64 { u64::from(a) << b } else { 0 };
                dst.write(&mut self.regs, bus, wide as u16);
                self.regs.o = (wide >> 16) as u16;
                1
            }
            // SHR: O holds the bits shifted out the bottom
            0x8 => {
                let wide = u32::from(a) << 16;
                self.regs.o = if b < 32 { (wide >> b) as u16 } else { 0 };
                dst.write(&mut self.regs, bus, if b < 16 { a >> b } else { 0 });
                1
            }
            // AND
            0x9 => {
                dst.write(&mut self.regs, bus, a & b);
                0
            }
            // BOR
            0xA => {
                dst.write(&mut self.regs, bus, a | b);
                0
            }
            // XOR
            0xB => {
                dst.write(&mut self.regs, bus, a ^ b);
                0
            }
            // IFE / IFN / IFG / IFB: a failed test skips the next
            // instruction and charges one extra cycle here
            0xC => self.conditional(a == b),
            0xD => self.conditional(a != b),
            0xE => self.conditional(a > b),
            0xF => self.conditional((a & b) != 0),
            _ => unreachable!("basic opcodes are 0x1-0xF"),
        }
    }

    /// Outcome of a conditional test: pass costs one cycle, fail costs two
    /// and arms the skip of the following instruction.
    fn conditional(&mut self, pass: bool) -> u8 {
        if pass {
            1
        } else {
            self.skip = true;
            2
        }
    }

    /// JSR: push the return address (PC already points past the operand's
    /// next word, if any) and jump to the operand value.
    fn execute_jsr<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let target = self.a_ref.expect("operand a resolved").read(&self.regs, bus);
        let frame = self.regs.push();
        bus.write(frame, self.regs.pc);
        self.regs.pc = target;
        1
    }
}
