use common::asm::{Flag, Reg, NUM_REGS};
use common::constants::{MEM_WORDS, PC_START};
use common::misc::bit;

use log::trace;
use num_traits::FromPrimitive;

/// Architectural state: word-addressable memory and the register file.
/// MMIO routing lives in `Emulator`; accesses here are plain.
pub struct EmulatorState {
    mem: Vec<u16>,
    regs: [u16; NUM_REGS],
}

impl EmulatorState {
    pub fn new() -> Self {
        let mut state = EmulatorState {
            mem: vec![0; MEM_WORDS],
            regs: [0; NUM_REGS],
        };
        state.reset();
        state
    }

    /// Architectural reset: PC at the user-program base, COND = Z.
    /// Memory is left alone.
    pub fn reset(&mut self) {
        self.reg_write(Reg::PC, PC_START);
        self.set_flag(Flag::Zero);
    }

    pub fn mem_read(&self, addr: u16) -> u16 {
        self.mem[addr as usize]
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        trace!("mem: writing {val:#06x} to {addr:#06x}");
        self.mem[addr as usize] = val;
    }

    pub fn reg_read(&self, reg: Reg) -> u16 {
        self.regs[reg as usize]
    }

    pub fn reg_write(&mut self, reg: Reg, val: u16) {
        trace!("reg: writing {val:#06x} to {reg}");
        self.regs[reg as usize] = val;
    }

    pub fn pc(&self) -> u16 {
        self.reg_read(Reg::PC)
    }

    /// The current condition code. COND is one-hot by construction; only
    /// direct writes through `reg_write` can break that.
    pub fn cond(&self) -> Flag {
        Flag::from_u16(self.reg_read(Reg::Cond)).expect("COND holds a one-hot flag")
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.reg_write(Reg::Cond, flag as u16);
    }

    /// Set COND from a freshly written register: zero, negative (bit 15),
    /// or positive.
    pub fn update_flags(&mut self, reg: Reg) {
        let val = self.reg_read(reg);
        let flag = if val == 0 {
            Flag::Zero
        } else if bit(val, 15) == 1 {
            Flag::Negative
        } else {
            Flag::Positive
        };
        self.set_flag(flag);
    }
}

impl Default for EmulatorState {
    fn default() -> Self {
        Self::new()
    }
}
