use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};

use common::asm::*;
use common::constants::MMIO_START;
use common::decoder::decode;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};
use num_traits::FromPrimitive;
use thiserror::Error;

use crate::io::console::{Console, StdConsole};
use crate::io::keyboard::Keyboard;
use crate::io::MmioHandler;
use crate::EmulatorState;

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("reserved opcode {opcode:#06x} at {pc:#06x}")]
    ReservedOpcode { opcode: u16, pc: u16 },

    #[error("console i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image has no origin word")]
    Empty,

    #[error("image ends mid-word")]
    Truncated,

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do with the unused RTI/RES encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReservedPolicy {
    /// Skip the word, like the reference interpreter.
    #[default]
    Permissive,
    /// Fail the run.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecRet {
    Ok,
    Halt,
}

pub struct Emulator {
    state: EmulatorState,
    mmio_handlers: HashMap<u16, Arc<Mutex<dyn MmioHandler>>>,
    console: Arc<dyn Console>,
    reserved_policy: ReservedPolicy,
    halted: bool,
}

impl Emulator {
    pub fn new() -> Emulator {
        Self::with_console(Arc::new(StdConsole::new()))
    }

    /// The console backs both the trap routines and the keyboard device
    /// registered at KBSR/KBDR.
    pub fn with_console(console: Arc<dyn Console>) -> Emulator {
        let mut emu = Emulator {
            state: EmulatorState::new(),
            mmio_handlers: HashMap::new(),
            console: console.clone(),
            reserved_policy: ReservedPolicy::default(),
            halted: false,
        };
        emu.set_mmio_handler(Keyboard::new(console));
        emu
    }

    pub fn set_reserved_policy(&mut self, policy: ReservedPolicy) {
        self.reserved_policy = policy;
    }

    pub fn set_mmio_handler(&mut self, handler: impl MmioHandler + 'static) {
        let addrs = handler.default_addrs().to_vec();
        let handler = Arc::new(Mutex::new(handler));
        for addr in addrs {
            self.register_handler(handler.clone(), addr);
        }
    }

    fn register_handler(&mut self, handler: Arc<Mutex<dyn MmioHandler>>, addr: u16) {
        assert!(addr >= MMIO_START);
        let prev = self.mmio_handlers.insert(addr, handler);
        assert!(prev.is_none(), "duplicate MMIO handler for {addr:#06x}");
    }

    /// Run until TRAP HALT.
    pub fn run(&mut self) -> Result<(), EmulatorError> {
        while self.run_ins()? != ExecRet::Halt {}
        Ok(())
    }

    pub fn run_at(&mut self, pc: u16) -> Result<(), EmulatorError> {
        self.state.reg_write(Reg::PC, pc);
        self.run()
    }

    /// One fetch-decode-execute step. PC is advanced before the handler
    /// runs; handlers that change PC overwrite the advanced value.
    pub fn run_ins(&mut self) -> Result<ExecRet, EmulatorError> {
        if self.halted {
            return Ok(ExecRet::Halt);
        }

        let pc = self.state.pc();
        let word = self.mem_read(pc);
        let ins = decode(word);
        debug!("PC {pc:#06x}: {}", ins.display_with_pc(pc));
        self.state.reg_write(Reg::PC, pc.wrapping_add(1));

        self.exec(word, &ins)
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Load a program image: a big-endian origin word followed by the
    /// words to store from the origin upward, wrapping at the top of
    /// memory. Returns the origin.
    pub fn load_image<R: Read>(&mut self, mut image: R) -> Result<u16, ImageError> {
        let mut bytes = Vec::new();
        image.read_to_end(&mut bytes)?;
        if bytes.len() < 2 {
            return Err(ImageError::Empty);
        }
        if bytes.len() % 2 != 0 {
            return Err(ImageError::Truncated);
        }

        let origin = BigEndian::read_u16(&bytes);
        let words: Vec<u16> = bytes[2..].chunks_exact(2).map(BigEndian::read_u16).collect();
        self.load_words(origin, &words);
        Ok(origin)
    }

    /// In-memory equivalent of `load_image`.
    pub fn load_words(&mut self, origin: u16, words: &[u16]) {
        let mut addr = origin;
        for &word in words {
            self.state.mem_write(addr, word);
            addr = addr.wrapping_add(1);
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    /// MMIO-routed read; a read of KBSR polls the keyboard. Addresses in
    /// the device range without a handler fall through to plain memory.
    pub fn mem_read(&mut self, addr: u16) -> u16 {
        if addr >= MMIO_START {
            if let Some(handler) = self.mmio_handlers.get_mut(&addr) {
                return handler.lock().unwrap().read_word(addr);
            }
        }
        self.state.mem_read(addr)
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        if addr >= MMIO_START {
            if let Some(handler) = self.mmio_handlers.get_mut(&addr) {
                handler.lock().unwrap().write_word(addr, val);
                return;
            }
        }
        self.state.mem_write(addr, val)
    }

    pub fn reg_read(&self, reg: Reg) -> u16 {
        self.state.reg_read(reg)
    }

    pub fn reg_write(&mut self, reg: Reg, val: u16) {
        self.state.reg_write(reg, val)
    }

    pub fn get_state(&self) -> &EmulatorState {
        &self.state
    }

    pub fn get_state_mut(&mut self) -> &mut EmulatorState {
        &mut self.state
    }

    ///////////////////////////////////////////////////////////////////////////
    // Execute
    ///////////////////////////////////////////////////////////////////////////

    fn exec(&mut self, word: u16, ins: &Ins) -> Result<ExecRet, EmulatorError> {
        match ins {
            Ins::Br(ins) => self.exec_br(ins),
            Ins::Add(ins) => self.exec_operate(ins, u16::wrapping_add),
            Ins::And(ins) => self.exec_operate(ins, |lhs, rhs| lhs & rhs),
            Ins::Not(ins) => self.exec_not(ins),
            Ins::Ld(ins) => self.exec_ld(ins),
            Ins::Ldi(ins) => self.exec_ldi(ins),
            Ins::Ldr(ins) => self.exec_ldr(ins),
            Ins::Lea(ins) => self.exec_lea(ins),
            Ins::St(ins) => self.exec_st(ins),
            Ins::Sti(ins) => self.exec_sti(ins),
            Ins::Str(ins) => self.exec_str(ins),
            Ins::Jmp(ins) => self.exec_jmp(ins),
            Ins::Jsr(ins) => self.exec_jsr(ins),
            Ins::Trap(ins) => return self.exec_trap(ins),
            Ins::Rti | Ins::Res => return self.exec_reserved(word),
        }

        Ok(ExecRet::Ok)
    }

    fn exec_br(&mut self, ins: &BranchIns) {
        if ins.cond & self.state.reg_read(Reg::Cond) != 0 {
            let pc = self.state.pc().wrapping_add(ins.offset);
            self.state.reg_write(Reg::PC, pc);
        }
    }

    fn exec_operate(&mut self, ins: &OperateIns, op: fn(u16, u16) -> u16) {
        let lhs = self.state.reg_read(ins.sr1);
        let rhs = match ins.src2 {
            Src2::Reg(sr2) => self.state.reg_read(sr2),
            Src2::Imm(imm) => imm,
        };
        self.state.reg_write(ins.dr, op(lhs, rhs));
        self.state.update_flags(ins.dr);
    }

    fn exec_not(&mut self, ins: &NotIns) {
        self.state.reg_write(ins.dr, !self.state.reg_read(ins.sr));
        self.state.update_flags(ins.dr);
    }

    fn exec_ld(&mut self, ins: &PcRelIns) {
        let addr = self.state.pc().wrapping_add(ins.offset);
        let val = self.mem_read(addr);
        self.state.reg_write(ins.reg, val);
        self.state.update_flags(ins.reg);
    }

    fn exec_ldi(&mut self, ins: &PcRelIns) {
        let indirect = self.state.pc().wrapping_add(ins.offset);
        let addr = self.mem_read(indirect);
        let val = self.mem_read(addr);
        self.state.reg_write(ins.reg, val);
        self.state.update_flags(ins.reg);
    }

    fn exec_ldr(&mut self, ins: &BaseOffsetIns) {
        let addr = self.state.reg_read(ins.base).wrapping_add(ins.offset);
        let val = self.mem_read(addr);
        self.state.reg_write(ins.reg, val);
        self.state.update_flags(ins.reg);
    }

    fn exec_lea(&mut self, ins: &PcRelIns) {
        // Address formation only; LEA never touches memory.
        let addr = self.state.pc().wrapping_add(ins.offset);
        self.state.reg_write(ins.reg, addr);
        self.state.update_flags(ins.reg);
    }

    fn exec_st(&mut self, ins: &PcRelIns) {
        let addr = self.state.pc().wrapping_add(ins.offset);
        self.mem_write(addr, self.state.reg_read(ins.reg));
    }

    fn exec_sti(&mut self, ins: &PcRelIns) {
        let indirect = self.state.pc().wrapping_add(ins.offset);
        let addr = self.mem_read(indirect);
        self.mem_write(addr, self.state.reg_read(ins.reg));
    }

    fn exec_str(&mut self, ins: &BaseOffsetIns) {
        let addr = self.state.reg_read(ins.base).wrapping_add(ins.offset);
        self.mem_write(addr, self.state.reg_read(ins.reg));
    }

    fn exec_jmp(&mut self, ins: &JmpIns) {
        // JMP R7 is the conventional RET.
        let target = self.state.reg_read(ins.base);
        self.state.reg_write(Reg::PC, target);
    }

    fn exec_jsr(&mut self, ins: &JsrIns) {
        let pc = self.state.pc();
        self.state.reg_write(Reg::R7, pc);
        let target = match ins.target {
            JsrTarget::Offset(offset) => pc.wrapping_add(offset),
            JsrTarget::Reg(base) => self.state.reg_read(base),
        };
        self.state.reg_write(Reg::PC, target);
    }

    fn exec_reserved(&mut self, word: u16) -> Result<ExecRet, EmulatorError> {
        match self.reserved_policy {
            ReservedPolicy::Permissive => {
                warn!("ignoring reserved opcode {word:#06x}");
                Ok(ExecRet::Ok)
            }
            ReservedPolicy::Strict => Err(EmulatorError::ReservedOpcode {
                opcode: word,
                pc: self.state.pc().wrapping_sub(1),
            }),
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    // Traps
    ///////////////////////////////////////////////////////////////////////////

    fn exec_trap(&mut self, ins: &TrapIns) -> Result<ExecRet, EmulatorError> {
        self.state.reg_write(Reg::R7, self.state.pc());

        let Some(vector) = TrapVector::from_u8(ins.vector) else {
            warn!("ignoring unknown trap vector {:#04x}", ins.vector);
            return Ok(ExecRet::Ok);
        };

        match vector {
            TrapVector::Getc => self.trap_getc()?,
            TrapVector::Out => self.trap_out()?,
            TrapVector::Puts => self.trap_puts()?,
            TrapVector::In => self.trap_in()?,
            TrapVector::Putsp => self.trap_putsp()?,
            TrapVector::Halt => {
                self.halted = true;
                return Ok(ExecRet::Halt);
            }
        }

        Ok(ExecRet::Ok)
    }

    fn trap_getc(&mut self) -> Result<(), EmulatorError> {
        // No echo, no flag update.
        let ch = self.console.read_byte()?;
        self.state.reg_write(Reg::R0, ch as u16);
        Ok(())
    }

    fn trap_out(&mut self) -> Result<(), EmulatorError> {
        let ch = self.state.reg_read(Reg::R0) as u8;
        self.console.write_byte(ch)?;
        Ok(())
    }

    fn trap_puts(&mut self) -> Result<(), EmulatorError> {
        let mut addr = self.state.reg_read(Reg::R0);
        loop {
            let word = self.mem_read(addr);
            if word == 0 {
                break;
            }
            self.console.write_byte(word as u8)?;
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }

    fn trap_in(&mut self) -> Result<(), EmulatorError> {
        for ch in b"Enter a character: " {
            self.console.write_byte(*ch)?;
        }
        let ch = self.console.read_byte()?;
        self.console.write_byte(ch)?;
        self.state.reg_write(Reg::R0, ch as u16);
        Ok(())
    }

    fn trap_putsp(&mut self) -> Result<(), EmulatorError> {
        // Two packed characters per word, low byte first. A zero high
        // byte ends the word's output but only a zero word ends the
        // string.
        let mut addr = self.state.reg_read(Reg::R0);
        loop {
            let word = self.mem_read(addr);
            if word == 0 {
                break;
            }
            self.console.write_byte(word as u8)?;
            let high = (word >> 8) as u8;
            if high != 0 {
                self.console.write_byte(high)?;
            }
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
