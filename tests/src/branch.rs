use common::asm::Reg;
use common::constants::PC_START;

use crate::support::{load, run};

#[test]
fn brnzp_always_taken() {
    let emu = run(&[
        0x0e01, // BRnzp +1
        0x1021, // ADD R0, R0, #1 (skipped)
        0xf025, // HALT
    ]);
    assert_eq!(emu.reg_read(Reg::R0), 0);
    assert_eq!(emu.reg_read(Reg::PC), PC_START + 3);
}

#[test]
fn mask_zero_never_taken() {
    let emu = run(&[
        0x0001, // BR(never) +1
        0x1021, // ADD R0, R0, #1
        0xf025, // HALT
    ]);
    assert_eq!(emu.reg_read(Reg::R0), 1);
}

#[test]
fn brz_taken_on_fresh_state() {
    // COND starts at Z.
    let emu = run(&[
        0x0401, // BRz +1
        0x1021, // ADD R0, R0, #1 (skipped)
        0xf025, // HALT
    ]);
    assert_eq!(emu.reg_read(Reg::R0), 0);
}

#[test]
fn brz_not_taken_after_positive() {
    let emu = run(&[
        0x1021, // ADD R0, R0, #1
        0x0401, // BRz +1
        0x1023, // ADD R0, R0, #3
        0xf025, // HALT
    ]);
    assert_eq!(emu.reg_read(Reg::R0), 4);
}

#[test]
fn brn_taken_after_negative() {
    let emu = run(&[
        0x103f, // ADD R0, R0, #-1
        0x0801, // BRn +1
        0x1021, // ADD R0, R0, #1 (skipped)
        0xf025, // HALT
    ]);
    assert_eq!(emu.reg_read(Reg::R0), 0xffff);
}

#[test]
fn brp_not_taken_after_negative() {
    let emu = run(&[
        0x103f, // ADD R0, R0, #-1
        0x0201, // BRp +1
        0x1021, // ADD R0, R0, #1
        0xf025, // HALT
    ]);
    assert_eq!(emu.reg_read(Reg::R0), 0);
}

#[test]
fn backward_branch() {
    let (mut emu, _) = load(&[
        0x0ffe, // BRnzp -2
    ]);
    emu.load_words(0x2fff, &[0xf025]); // HALT
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::PC), PC_START);
}
