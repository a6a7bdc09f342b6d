//! DCPU-16 CPU core with per-cycle execution.
//!
//! Each `tick()` advances exactly one clock cycle. An instruction moves
//! through an explicit sequence of stages: fetch, resolve operand a,
//! resolve operand b (basic instructions only), execute, then any idle
//! cycles the opcode still owes. A stage that charges no cycle is
//! *instant*: any operand resolution that consumes no next word, and the
//! execute step of single-cycle opcodes. Instant stages run in the same
//! tick as the cycle-consuming step that preceded them, so the cycle
//! total of every instruction is exactly
//! `1 (fetch) + next words + opcode extra + 1 on a failed conditional`.
//!
//! The fetch step itself is never free: it always consumes its own cycle,
//! and `SET A, 1` really does retire at the end of its fetch tick. When
//! the skip flag is set, the next fetch cycle instead discards one whole
//! instruction: PC advances by its full encoded length and nothing
//! executes.

use emu_core::{Bus, Cpu, Observable, Ticks, Value};

use crate::decode::{self, Decoded};
use crate::operand::OpRef;
use crate::registers::{Reg, Registers};

/// Current stage within an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Stage {
    /// Between instructions; the next cycle fetches (or consumes a skip).
    #[default]
    Fetch,
    /// Resolving operand a.
    ResolveA,
    /// Resolving operand b.
    ResolveB,
    /// Applying the opcode. The write happens on this stage's first cycle.
    Execute,
    /// Idle cycles still owed after the execute write.
    Burn(u8),
}

/// The DCPU-16 CPU.
///
/// Owns the register file and the in-flight instruction state; memory is
/// reached through the bus passed to `tick()`.
#[derive(Debug)]
pub struct Dcpu16 {
    /// CPU registers.
    pub regs: Registers,

    /// Current instruction word (0 = no instruction in flight).
    pub(crate) inst: u16,

    /// Resolved destination operand.
    pub(crate) a_ref: Option<OpRef>,

    /// Resolved source operand.
    pub(crate) b_ref: Option<OpRef>,

    /// Current scheduler stage.
    stage: Stage,

    /// When set, the next fetched instruction is discarded.
    pub(crate) skip: bool,

    /// Completed instructions since reset (skipped words don't count).
    retired: u64,

    /// Total cycles elapsed (diagnostic, not architectural).
    total_cycles: Ticks,
}

impl Default for Dcpu16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Dcpu16 {
    /// Create a new CPU in reset state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            inst: 0,
            a_ref: None,
            b_ref: None,
            stage: Stage::Fetch,
            skip: false,
            retired: 0,
            total_cycles: Ticks::ZERO,
        }
    }

    /// Total cycles elapsed since construction.
    #[must_use]
    pub const fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    /// Number of instructions that have fully completed.
    #[must_use]
    pub const fn instructions_retired(&self) -> u64 {
        self.retired
    }

    /// The instruction word currently in flight, or 0 between instructions.
    #[must_use]
    pub const fn inst(&self) -> u16 {
        self.inst
    }

    /// True when the next fetched instruction will be discarded.
    #[must_use]
    pub const fn skip_pending(&self) -> bool {
        self.skip
    }

    /// Returns true if the previous instruction has completed and the CPU
    /// is ready to fetch the next one (a pending skip may still remain).
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.stage == Stage::Fetch
    }

    /// Advance the CPU by one clock cycle.
    pub fn tick<B: Bus>(&mut self, bus: &mut B) {
        self.total_cycles += Ticks::ONE;

        // Step 1: the single cycle-consuming action for this tick.
        match self.stage {
            Stage::Fetch => {
                if self.skip {
                    self.consume_skip(bus);
                    return;
                }
                self.fetch(bus);
            }
            Stage::ResolveA => {
                let code = self.operand_a();
                self.a_ref = Some(self.resolve(bus, code));
                self.stage = self.after_a();
            }
            Stage::ResolveB => {
                let code = self.operand_b();
                self.b_ref = Some(self.resolve(bus, code));
                self.stage = Stage::Execute;
            }
            Stage::Execute => {
                // First execute cycle: the write happens now; any further
                // charge is burned as idle cycles.
                let extra = self.execute_inst(bus);
                if extra > 1 {
                    self.stage = Stage::Burn(extra - 1);
                } else {
                    self.finish();
                }
                return;
            }
            Stage::Burn(left) => {
                if left > 1 {
                    self.stage = Stage::Burn(left - 1);
                } else {
                    self.finish();
                }
                return;
            }
        }

        // Step 2: fall through any instant stages within the same tick.
        self.drain_instant(bus);
    }

    /// Run stages that consume no cycle of their own until the next
    /// cycle-consuming stage (or the instruction boundary) is reached.
    fn drain_instant<B: Bus>(&mut self, bus: &mut B) {
        loop {
            match self.stage {
                Stage::ResolveA => {
                    let code = self.operand_a();
                    if decode::operand_takes_word(code) {
                        return;
                    }
                    self.a_ref = Some(self.resolve(bus, code));
                    self.stage = self.after_a();
                }
                Stage::ResolveB => {
                    let code = self.operand_b();
                    if decode::operand_takes_word(code) {
                        return;
                    }
                    self.b_ref = Some(self.resolve(bus, code));
                    self.stage = Stage::Execute;
                }
                Stage::Execute => {
                    if !self.execute_is_instant() {
                        return;
                    }
                    let extra = self.execute_inst(bus);
                    debug_assert_eq!(extra, 0, "instant execute must not charge cycles");
                    self.finish();
                }
                Stage::Fetch | Stage::Burn(_) => return,
            }
        }
    }

    /// Fetch cycle: read the word at PC and begin decoding it.
    ///
    /// Malformed instructions (non-basic opcodes other than JSR) complete
    /// right here: one cycle, a diagnostic on the logging channel, and no
    /// state touched beyond the PC advance. Their operands are never
    /// resolved, so they cause no PC/SP side effects.
    fn fetch<B: Bus>(&mut self, bus: &mut B) {
        let at = self.regs.pc;
        let word = bus.read(at);
        self.regs.pc = self.regs.pc.wrapping_add(1);

        if let Decoded::Extended { xop, .. } = Decoded::decode(word)
            && xop != 0x01
        {
            log::warn!(
                "unknown extended opcode {xop:#04X} (word {word:#06X}) at {at:#06X}; \
                 treating as a no-op"
            );
            self.retired += 1;
            return;
        }

        self.inst = word;
        self.stage = Stage::ResolveA;
    }

    /// Skip cycle: discard one whole instruction without executing it.
    ///
    /// PC advances by the instruction's full encoded length, next words
    /// included.
    fn consume_skip<B: Bus>(&mut self, bus: &mut B) {
        let word = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(decode::word_count(word));
        self.skip = false;
    }

    /// Resolve a 6-bit operand code into a reference.
    ///
    /// Resolution side effects happen here, not at execute time: next-word
    /// forms read the word at PC and advance it, PUSH decrements SP before
    /// yielding its cell, POP yields its cell and then increments SP.
    fn resolve<B: Bus>(&mut self, bus: &mut B, code: u8) -> OpRef {
        match code {
            // Register
            0x00..=0x07 => OpRef::Register(Reg::from_index(code)),
            // [register]
            0x08..=0x0F => OpRef::Memory(self.regs.get(Reg::from_index(code))),
            // [next_word + register]
            0x10..=0x17 => {
                let next = self.take_word(bus);
                OpRef::Memory(next.wrapping_add(self.regs.get(Reg::from_index(code))))
            }
            // POP
            0x18 => OpRef::Memory(self.regs.pop()),
            // PEEK
            0x19 => OpRef::Memory(self.regs.sp),
            // PUSH
            0x1A => OpRef::Memory(self.regs.push()),
            // SP / PC / O
            0x1B => OpRef::Sp,
            0x1C => OpRef::Pc,
            0x1D => OpRef::Overflow,
            // [next_word]
            0x1E => {
                let next = self.take_word(bus);
                OpRef::Memory(next)
            }
            // next_word literal
            0x1F => {
                let next = self.take_word(bus);
                OpRef::Immediate(next)
            }
            // Inline literal 0-31
            0x20..=0x3F => OpRef::Immediate(u16::from(code) - 0x20),
            _ => unreachable!("operand codes are six bits"),
        }
    }

    /// Read the word at PC and advance PC.
    fn take_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let word = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        word
    }

    /// Operand field a of the in-flight instruction.
    fn operand_a(&self) -> u8 {
        match Decoded::decode(self.inst) {
            Decoded::Basic { a, .. } | Decoded::Extended { a, .. } => a,
        }
    }

    /// Operand field b of the in-flight instruction.
    fn operand_b(&self) -> u8 {
        match Decoded::decode(self.inst) {
            Decoded::Basic { b, .. } => b,
            Decoded::Extended { .. } => unreachable!("extended instructions have one operand"),
        }
    }

    /// Stage after operand a: basic instructions resolve b next, extended
    /// instructions go straight to execute.
    fn after_a(&self) -> Stage {
        match Decoded::decode(self.inst) {
            Decoded::Basic { .. } => Stage::ResolveB,
            Decoded::Extended { .. } => Stage::Execute,
        }
    }

    /// Mark the current instruction complete and prepare for the next.
    ///
    /// Clears the in-flight state so nothing leaks into the next
    /// instruction, and so observers see a clean boundary.
    fn finish(&mut self) {
        self.inst = 0;
        self.a_ref = None;
        self.b_ref = None;
        self.stage = Stage::Fetch;
        self.retired += 1;
    }

    /// Human-readable name of the current scheduler stage.
    fn stage_name(&self) -> &'static str {
        match self.stage {
            Stage::Fetch => "fetch",
            Stage::ResolveA => "resolve-a",
            Stage::ResolveB => "resolve-b",
            Stage::Execute => "execute",
            Stage::Burn(_) => "burn",
        }
    }

    /// Reset the CPU: registers to their reset values, no instruction in
    /// flight, no pending skip.
    pub fn reset(&mut self) {
        self.regs = Registers::new();
        self.inst = 0;
        self.a_ref = None;
        self.b_ref = None;
        self.stage = Stage::Fetch;
        self.skip = false;
        // Note: total_cycles and retired are not reset - diagnostics, not
        // architectural state.
    }
}

impl Cpu for Dcpu16 {
    type Registers = Registers;

    fn tick<B: Bus>(&mut self, bus: &mut B) {
        Dcpu16::tick(self, bus);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_instruction_complete(&self) -> bool {
        Dcpu16::is_instruction_complete(self)
    }

    fn reset(&mut self) {
        Dcpu16::reset(self);
    }
}

impl Observable for Dcpu16 {
    fn query(&self, path: &str) -> Option<Value> {
        let value = match path {
            "a" => Value::U16(self.regs.gp[0]),
            "b" => Value::U16(self.regs.gp[1]),
            "c" => Value::U16(self.regs.gp[2]),
            "x" => Value::U16(self.regs.gp[3]),
            "y" => Value::U16(self.regs.gp[4]),
            "z" => Value::U16(self.regs.gp[5]),
            "i" => Value::U16(self.regs.gp[6]),
            "j" => Value::U16(self.regs.gp[7]),
            "pc" => Value::U16(self.regs.pc),
            "sp" => Value::U16(self.regs.sp),
            "o" => Value::U16(self.regs.o),
            "inst" => Value::U16(self.inst),
            "stage" => Value::String(self.stage_name().to_string()),
            "skip" => Value::Bool(self.skip),
            "cycles" => Value::U64(self.total_cycles.get()),
            "retired" => Value::U64(self.retired),
            "registers" => Value::Array(self.regs.gp.iter().map(|&w| Value::U16(w)).collect()),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "a",
            "b",
            "c",
            "x",
            "y",
            "z",
            "i",
            "j",
            "pc",
            "sp",
            "o",
            "inst",
            "stage",
            "skip",
            "cycles",
            "retired",
            "registers",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testbus::FlatRam;

    /// SET A, 1 packed entirely into one word: op=1, a=A (0x00), b=literal 1.
    const SET_A_1: u16 = (0x21 << 10) | 0x1;

    #[test]
    fn inline_set_takes_one_cycle() {
        let mut cpu = Dcpu16::new();
        let mut ram = FlatRam::new();
        ram.load(0, &[SET_A_1]);

        cpu.tick(&mut ram);

        assert_eq!(cpu.regs.gp[0], 1);
        assert_eq!(cpu.regs.pc, 1);
        assert!(cpu.is_instruction_complete());
        assert_eq!(cpu.inst(), 0);
        assert_eq!(cpu.instructions_retired(), 1);
        assert_eq!(cpu.total_cycles(), emu_core::Ticks::new(1));
    }

    #[test]
    fn next_word_operand_leaves_cpu_mid_instruction() {
        let mut cpu = Dcpu16::new();
        let mut ram = FlatRam::new();
        // SET A, 0x0030
        ram.load(0, &[0x7C01, 0x0030]);

        cpu.tick(&mut ram);
        assert!(!cpu.is_instruction_complete());
        assert_eq!(cpu.inst(), 0x7C01);
        assert_eq!(cpu.regs.gp[0], 0, "write must not land before execute");

        cpu.tick(&mut ram);
        assert!(cpu.is_instruction_complete());
        assert_eq!(cpu.regs.gp[0], 0x0030);
        assert_eq!(cpu.regs.pc, 2);
    }

    #[test]
    fn unknown_extended_opcode_is_a_one_cycle_no_op() {
        let mut cpu = Dcpu16::new();
        let mut ram = FlatRam::new();
        // op=0, xop=0x02 (undefined), a=PUSH - the operand must NOT be
        // resolved, so SP stays put.
        ram.load(0, &[(0x1A << 10) | (0x02 << 4)]);

        cpu.tick(&mut ram);

        assert!(cpu.is_instruction_complete());
        assert_eq!(cpu.regs.pc, 1);
        assert_eq!(cpu.regs.sp, 0xFFFF);
        assert_eq!(cpu.instructions_retired(), 1);
        assert_eq!(cpu.total_cycles(), emu_core::Ticks::new(1));
    }

    #[test]
    fn reset_discards_mid_instruction_progress() {
        let mut cpu = Dcpu16::new();
        let mut ram = FlatRam::new();
        ram.load(0, &[0x7C01, 0x0030]);

        cpu.tick(&mut ram);
        assert!(!cpu.is_instruction_complete());

        cpu.reset();
        assert!(cpu.is_instruction_complete());
        assert_eq!(cpu.inst(), 0);
        assert_eq!(cpu.regs, Registers::new());
        assert!(!cpu.skip_pending());
    }

    #[test]
    fn observable_paths_all_answer() {
        let cpu = Dcpu16::new();
        for path in cpu.query_paths() {
            assert!(cpu.query(path).is_some(), "no value for {path}");
        }
        assert_eq!(cpu.query("sp"), Some(Value::U16(0xFFFF)));
        assert_eq!(cpu.query("bogus"), None);
    }
}
