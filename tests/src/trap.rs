use common::asm::{Flag, Reg};

use crate::support::{load, run};

#[test]
fn getc() {
    let (mut emu, console) = load(&[
        0xf020, // GETC
        0xf025, // HALT
    ]);
    console.push_input(b'A');
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), b'A' as u16);
    // No echo, no flag update.
    assert_eq!(console.output_string(), "");
    assert_eq!(emu.get_state().cond(), Flag::Zero);
}

#[test]
fn getc_preserves_flags() {
    let (mut emu, console) = load(&[
        0x1021, // ADD R0, R0, #1
        0xf020, // GETC
        0xf025, // HALT
    ]);
    console.push_input(b'A');
    emu.run().unwrap();
    assert_eq!(emu.get_state().cond(), Flag::Positive);
}

#[test]
fn out_emits_low_byte() {
    let (mut emu, console) = load(&[
        0xf021, // OUT
        0xf025, // HALT
    ]);
    emu.reg_write(Reg::R0, 0xab48); // high bits must be ignored
    emu.run().unwrap();
    assert_eq!(console.output_string(), "H");
}

#[test]
fn puts() {
    let (mut emu, console) = load(&[
        0xe002, // LEA R0, +2
        0xf022, // PUTS
        0xf025, // HALT
        0x0148, // 'H' with a stray high bit
        0x0069, // 'i'
        0x0000,
    ]);
    emu.run().unwrap();
    assert_eq!(console.output_string(), "Hi");
}

#[test]
fn puts_empty_string() {
    let (mut emu, console) = load(&[
        0xe002, // LEA R0, +2 (the zero word)
        0xf022, // PUTS
        0xf025, // HALT
        0x0000,
    ]);
    emu.run().unwrap();
    assert_eq!(console.output_string(), "");
}

#[test]
fn trap_in_prompts_and_echoes() {
    let (mut emu, console) = load(&[
        0xf023, // IN
        0xf025, // HALT
    ]);
    console.push_input(b'Z');
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), b'Z' as u16);
    assert_eq!(console.output_string(), "Enter a character: Z");
}

#[test]
fn putsp_packed_pairs() {
    let (mut emu, console) = load(&[
        0xe002, // LEA R0, +2
        0xf024, // PUTSP
        0xf025, // HALT
        0x6548, // "He" (low byte first)
        0x6c6c, // "ll"
        0x006f, // "o" (zero high byte)
        0x0000,
    ]);
    emu.run().unwrap();
    assert_eq!(console.output_string(), "Hello");
}

#[test]
fn putsp_zero_high_byte_does_not_terminate() {
    let (mut emu, console) = load(&[
        0xe002, // LEA R0, +2
        0xf024, // PUTSP
        0xf025, // HALT
        0x0061, // "a" alone
        0x6362, // "bc"
        0x0000,
    ]);
    emu.run().unwrap();
    assert_eq!(console.output_string(), "abc");
}

#[test]
fn halt_stops_the_machine() {
    let emu = run(&[
        0xf025, // HALT
        0x1021, // ADD R0, R0, #1 (never runs)
    ]);
    assert!(emu.is_halted());
    assert_eq!(emu.reg_read(Reg::R0), 0);
}

#[test]
fn unknown_vector_is_noop() {
    let (mut emu, console) = load(&[
        0xf0a0, // TRAP xA0 (unknown)
        0x1021, // ADD R0, R0, #1
        0xf025, // HALT
    ]);
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), 1);
    assert_eq!(console.output_string(), "");
}
