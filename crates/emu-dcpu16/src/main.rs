//! DCPU-16 emulator binary.
//!
//! Headless test-harness driver: loads a program image (16-bit words in
//! host byte order), runs it until it parks in the idiomatic `SUB PC, 1`
//! halt loop (or until a cycle bound), then prints the register state and
//! a memory dump.

use std::path::PathBuf;
use std::process;

use emu_core::{Observable, Ticks};
use emu_dcpu16::{Emulator, memory_dump, registers_line, words_from_bytes};

struct CliArgs {
    image_path: PathBuf,
    origin: u16,
    cycles: Option<u64>,
    dump_start: u16,
    dump_count: usize,
    queries: Vec<String>,
}

fn usage() -> ! {
    eprintln!("Usage: emu-dcpu16 <image> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --origin ADDR    Load and start address in hex (default 0)");
    eprintln!("  --cycles N       Run at most N cycles instead of running until");
    eprintln!("                   the program halts (a program that never reaches");
    eprintln!("                   a one-instruction loop runs forever otherwise)");
    eprintln!("  --dump START N   Dump N words of memory from hex address START");
    eprintln!("                   after the run (default: 16 words from the origin)");
    eprintln!("  --query PATH     Print one state value (e.g. pc, a, cycles);");
    eprintln!("                   may be given more than once");
    process::exit(1);
}

fn parse_hex_word(text: &str) -> Option<u16> {
    let trimmed = text.trim_start_matches("0x");
    u16::from_str_radix(trimmed, 16).ok()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let mut parsed = CliArgs {
        image_path: PathBuf::from(&args[1]),
        origin: 0,
        cycles: None,
        dump_start: 0,
        dump_count: 16,
        queries: Vec::new(),
    };
    let mut explicit_dump = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--origin" => {
                i += 1;
                let Some(addr) = args.get(i).and_then(|a| parse_hex_word(a)) else {
                    usage();
                };
                parsed.origin = addr;
            }
            "--cycles" => {
                i += 1;
                let Some(n) = args.get(i).and_then(|a| a.parse().ok()) else {
                    usage();
                };
                parsed.cycles = Some(n);
            }
            "--dump" => {
                let Some(start) = args.get(i + 1).and_then(|a| parse_hex_word(a)) else {
                    usage();
                };
                let Some(count) = args.get(i + 2).and_then(|a| a.parse().ok()) else {
                    usage();
                };
                parsed.dump_start = start;
                parsed.dump_count = count;
                explicit_dump = true;
                i += 2;
            }
            "--query" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    usage();
                };
                parsed.queries.push(path.clone());
            }
            other => {
                eprintln!("Unknown option: {other}");
                usage();
            }
        }
        i += 1;
    }

    if !explicit_dump {
        parsed.dump_start = parsed.origin;
    }
    parsed
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let bytes = match std::fs::read(&args.image_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", args.image_path.display());
            process::exit(1);
        }
    };
    let program = words_from_bytes(&bytes);
    if program.is_empty() {
        eprintln!("{} is empty", args.image_path.display());
        process::exit(1);
    }

    let mut emulator = Emulator::new();
    emulator.load(args.origin, &program);
    emulator.set_pc(args.origin);

    let cycles = match args.cycles {
        Some(bound) => {
            emulator.step_cycles(Ticks::new(bound));
            emulator.cycles()
        }
        None => emulator.step_until_stuck(),
    };

    println!("{}", registers_line(&emulator));
    println!("ran {cycles} cycles");
    print!("{}", memory_dump(&emulator, args.dump_start, args.dump_count));

    for path in &args.queries {
        match emulator.query(path) {
            Some(value) => println!("{path} = {value}"),
            None => println!("{path} = <unknown path>"),
        }
    }
}
