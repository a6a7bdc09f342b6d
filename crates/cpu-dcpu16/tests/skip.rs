//! Conditional-skip semantics.
//!
//! A failed IFE/IFN/IFG/IFB arms the skip flag; the next fetch cycle then
//! discards one whole instruction. The discarded instruction never
//! resolves its operands, so none of their side effects occur, and PC
//! advances by its full encoded length whatever that length is.

use cpu_dcpu16::Dcpu16;
use emu_core::Bus;

struct FlatRam {
    words: [u16; 0x1_0000],
}

impl FlatRam {
    fn new(program: &[u16]) -> Self {
        let mut ram = Self {
            words: [0; 0x1_0000],
        };
        ram.words[..program.len()].copy_from_slice(program);
        ram
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

const fn basic(op: u16, a: u16, b: u16) -> u16 {
    (b << 10) | (a << 4) | op
}

const fn lit(n: u16) -> u16 {
    0x20 + n
}

const REG_A: u16 = 0x00;
const REG_B: u16 = 0x01;
const PUSH: u16 = 0x1A;
const NEXT_WORD: u16 = 0x1F;

fn run_one(cpu: &mut Dcpu16, ram: &mut FlatRam) {
    loop {
        cpu.tick(ram);
        if cpu.is_instruction_complete() && !cpu.skip_pending() {
            return;
        }
    }
}

#[test]
fn passed_test_executes_the_next_instruction() {
    // SET A, 1; IFE A, 1; SET B, 2
    let program = [
        basic(0x1, REG_A, lit(1)),
        basic(0xC, REG_A, lit(1)),
        basic(0x1, REG_B, lit(2)),
    ];
    let mut cpu = Dcpu16::new();
    let mut ram = FlatRam::new(&program);

    for _ in 0..3 {
        run_one(&mut cpu, &mut ram);
    }
    assert_eq!(cpu.regs.gp[1], 2);
}

#[test]
fn failed_test_skips_the_next_instruction() {
    // SET A, 1; IFE A, 2; SET A, 99; SET B, 7
    let program = [
        basic(0x1, REG_A, lit(1)),
        basic(0xC, REG_A, lit(2)),
        basic(0x1, REG_A, NEXT_WORD),
        99,
        basic(0x1, REG_B, lit(7)),
    ];
    let mut cpu = Dcpu16::new();
    let mut ram = FlatRam::new(&program);

    for _ in 0..3 {
        run_one(&mut cpu, &mut ram);
    }
    assert_eq!(cpu.regs.gp[0], 1, "skipped SET must not run");
    assert_eq!(cpu.regs.gp[1], 7, "only one instruction is skipped");
    assert_eq!(cpu.regs.pc, 5);
}

#[test]
fn skip_advances_by_full_encoded_length() {
    // The skipped instruction has two next words.
    let program = [
        basic(0xC, REG_A, lit(1)),
        basic(0x1, 0x1E, NEXT_WORD),
        0x1000,
        0xBEEF,
        basic(0x1, REG_B, lit(3)),
    ];
    let mut cpu = Dcpu16::new();
    let mut ram = FlatRam::new(&program);

    run_one(&mut cpu, &mut ram);
    run_one(&mut cpu, &mut ram);
    assert_eq!(cpu.regs.gp[1], 3);
    assert_eq!(ram.read(0x1000), 0, "skipped store must not land");
    assert_eq!(cpu.regs.pc, 5);
}

#[test]
fn skipped_stack_operands_have_no_side_effects() {
    // IFN A, 0 fails out of reset, so SET PUSH, 5 is skipped: SP must not
    // move and nothing is written at the would-be stack cell.
    let program = [
        basic(0xD, REG_A, lit(0)),
        basic(0x1, PUSH, lit(5)),
        basic(0x1, REG_B, lit(1)),
    ];
    let mut cpu = Dcpu16::new();
    let mut ram = FlatRam::new(&program);

    run_one(&mut cpu, &mut ram);
    run_one(&mut cpu, &mut ram);
    assert_eq!(cpu.regs.sp, 0xFFFF);
    assert_eq!(ram.read(0xFFFE), 0);
    assert_eq!(cpu.regs.gp[1], 1);
}

#[test]
fn skipped_conditional_does_not_arm_another_skip() {
    // IFE A, 1 fails; the following IFE A, 2 is discarded without being
    // evaluated, so the SET after it still runs.
    let program = [
        basic(0xC, REG_A, lit(1)),
        basic(0xC, REG_A, lit(2)),
        basic(0x1, REG_B, lit(9)),
    ];
    let mut cpu = Dcpu16::new();
    let mut ram = FlatRam::new(&program);

    run_one(&mut cpu, &mut ram);
    run_one(&mut cpu, &mut ram);
    assert_eq!(cpu.regs.gp[1], 9);
}
