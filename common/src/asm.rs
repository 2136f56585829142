use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum Reg {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    PC,
    Cond,
}

pub const NUM_REGS: usize = 10;

impl Reg {
    pub const NUM_BITS: usize = 3;
    pub const MASK: u16 = (1u16 << Self::NUM_BITS) - 1;

    /// Decode a 3-bit register field. Fields only ever name R0..R7, so
    /// this is total.
    pub fn from_field(field: u16) -> Reg {
        Reg::from_u16(field & Self::MASK).unwrap()
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::PC => write!(f, "PC"),
            Reg::Cond => write!(f, "COND"),
            reg => write!(f, "R{}", *reg as u16),
        }
    }
}

/// Condition codes. The COND register holds exactly one of these at all
/// times.
#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
pub enum Flag {
    Positive = 1 << 0,
    Zero = 1 << 1,
    Negative = 1 << 2,
}

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum Opcode {
    Br = 0, // 0000
    Add,    // 0001
    Ld,     // 0010
    St,     // 0011
    Jsr,    // 0100
    And,    // 0101
    Ldr,    // 0110
    Str,    // 0111
    Rti,    // 1000 reserved
    Not,    // 1001
    Ldi,    // 1010
    Sti,    // 1011
    Jmp,    // 1100, JMP R7 == RET
    Res,    // 1101 reserved
    Lea,    // 1110
    Trap,   // 1111
}

impl Opcode {
    pub const NUM_BITS: usize = 4;

    /// Bits 15..12 of an instruction word. Always names an opcode.
    pub fn from_word(word: u16) -> Opcode {
        Opcode::from_u16(word >> (u16::BITS as usize - Self::NUM_BITS)).unwrap()
    }
}

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum TrapVector {
    Getc = 0x20,
    Out,
    Puts,
    In,
    Putsp,
    Halt,
}

////////////////////////////////////////////////////////////////////////////////

/// Second operand of ADD/AND: a register, or an already-sign-extended
/// five-bit immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Src2 {
    Reg(Reg),
    Imm(u16),
}

impl fmt::Display for Src2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Src2::Reg(reg) => write!(f, "{reg}"),
            Src2::Imm(imm) => write!(f, "#{}", *imm as i16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperateIns {
    pub dr: Reg,
    pub sr1: Reg,
    pub src2: Src2,
}

/// Branch: `cond` is the nzp mask from bits 11:9, laid out to match
/// `Flag`, so `cond & COND != 0` decides the branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchIns {
    pub cond: u16,
    pub offset: u16,
}

/// PC-relative access: `reg` is the destination for loads and LEA, the
/// source for stores. `offset` is the sign-extended nine-bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcRelIns {
    pub reg: Reg,
    pub offset: u16,
}

/// Base+offset access (LDR/STR), six-bit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseOffsetIns {
    pub reg: Reg,
    pub base: Reg,
    pub offset: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotIns {
    pub dr: Reg,
    pub sr: Reg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JmpIns {
    pub base: Reg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsrTarget {
    Offset(u16),
    Reg(Reg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsrIns {
    pub target: JsrTarget,
}

/// The vector is kept raw: vectors outside `TrapVector` are a no-op at
/// execution time, not a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapIns {
    pub vector: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ins {
    Br(BranchIns),
    Add(OperateIns),
    Ld(PcRelIns),
    St(PcRelIns),
    Jsr(JsrIns),
    And(OperateIns),
    Ldr(BaseOffsetIns),
    Str(BaseOffsetIns),
    Rti,
    Not(NotIns),
    Ldi(PcRelIns),
    Sti(PcRelIns),
    Jmp(JmpIns),
    Res,
    Lea(PcRelIns),
    Trap(TrapIns),
}

impl Ins {
    /// Display with PC-relative operands resolved against the address the
    /// instruction was fetched from.
    pub fn display_with_pc(&self, pc: u16) -> DisplayWithPc<'_> {
        DisplayWithPc { ins: self, pc }
    }
}

pub struct DisplayWithPc<'a> {
    ins: &'a Ins,
    pc: u16,
}

impl fmt::Display for DisplayWithPc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Operands are relative to the incremented PC.
        let next = self.pc.wrapping_add(1);
        match self.ins {
            Ins::Br(ins) => {
                write!(f, "BR")?;
                if ins.cond & Flag::Negative as u16 != 0 {
                    write!(f, "n")?;
                }
                if ins.cond & Flag::Zero as u16 != 0 {
                    write!(f, "z")?;
                }
                if ins.cond & Flag::Positive as u16 != 0 {
                    write!(f, "p")?;
                }
                write!(f, " x{:04X}", next.wrapping_add(ins.offset))
            }
            Ins::Add(ins) => write!(f, "ADD {}, {}, {}", ins.dr, ins.sr1, ins.src2),
            Ins::And(ins) => write!(f, "AND {}, {}, {}", ins.dr, ins.sr1, ins.src2),
            Ins::Not(ins) => write!(f, "NOT {}, {}", ins.dr, ins.sr),
            Ins::Ld(ins) => write!(f, "LD {}, x{:04X}", ins.reg, next.wrapping_add(ins.offset)),
            Ins::Ldi(ins) => write!(f, "LDI {}, x{:04X}", ins.reg, next.wrapping_add(ins.offset)),
            Ins::Lea(ins) => write!(f, "LEA {}, x{:04X}", ins.reg, next.wrapping_add(ins.offset)),
            Ins::St(ins) => write!(f, "ST {}, x{:04X}", ins.reg, next.wrapping_add(ins.offset)),
            Ins::Sti(ins) => write!(f, "STI {}, x{:04X}", ins.reg, next.wrapping_add(ins.offset)),
            Ins::Ldr(ins) => {
                write!(f, "LDR {}, {}, #{}", ins.reg, ins.base, ins.offset as i16)
            }
            Ins::Str(ins) => {
                write!(f, "STR {}, {}, #{}", ins.reg, ins.base, ins.offset as i16)
            }
            Ins::Jmp(ins) if ins.base == Reg::R7 => write!(f, "RET"),
            Ins::Jmp(ins) => write!(f, "JMP {}", ins.base),
            Ins::Jsr(ins) => match ins.target {
                JsrTarget::Offset(offset) => {
                    write!(f, "JSR x{:04X}", next.wrapping_add(offset))
                }
                JsrTarget::Reg(base) => write!(f, "JSRR {base}"),
            },
            Ins::Rti => write!(f, "RTI"),
            Ins::Res => write!(f, "RES"),
            Ins::Trap(ins) => write!(f, "TRAP x{:02X}", ins.vector),
        }
    }
}
