use common::asm::{Flag, Reg};
use common::constants::KBDR;

use crate::support::load;

#[test]
fn poll_loop_reads_key() {
    let (mut emu, console) = load(&[
        0xa004, // LDI R0, +4 (KBSR)
        0x07fe, // BRzp -2 (spin until a key is ready)
        0xa003, // LDI R0, +3 (KBDR)
        0xf025, // HALT
        0x0000,
        0xfe00, // KBSR
        0xfe02, // KBDR
    ]);
    console.push_input(b'A');
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), b'A' as u16);
    assert_eq!(emu.get_state().cond(), Flag::Positive);
}

#[test]
fn kbsr_reads_zero_without_key() {
    let (mut emu, _console) = load(&[
        0xa002, // LDI R0, +2 (KBSR)
        0xf025, // HALT
        0x0000,
        0xfe00, // KBSR
    ]);
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), 0);
    assert_eq!(emu.get_state().cond(), Flag::Zero);
    assert_eq!(emu.mem_read(KBDR), 0);
}

#[test]
fn kbsr_read_is_negative_when_ready() {
    // Bit 15 of the status word drives the N flag, which is what real
    // poll loops branch on.
    let (mut emu, console) = load(&[
        0xa002, // LDI R0, +2 (KBSR)
        0xf025, // HALT
        0x0000,
        0xfe00, // KBSR
    ]);
    console.push_input(b'x');
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), 0x8000);
    assert_eq!(emu.get_state().cond(), Flag::Negative);
    assert_eq!(emu.mem_read(KBDR), b'x' as u16);
}
