use crate::asm::*;
use crate::misc::{bit, sign_extend};

fn decode_operate(word: u16) -> OperateIns {
    let dr = Reg::from_field(word >> 9);
    let sr1 = Reg::from_field(word >> 6);
    let src2 = if bit(word, 5) == 1 {
        Src2::Imm(sign_extend(word, 5))
    } else {
        Src2::Reg(Reg::from_field(word))
    };
    OperateIns { dr, sr1, src2 }
}

fn decode_pc_rel(word: u16) -> PcRelIns {
    PcRelIns {
        reg: Reg::from_field(word >> 9),
        offset: sign_extend(word, 9),
    }
}

fn decode_base_offset(word: u16) -> BaseOffsetIns {
    BaseOffsetIns {
        reg: Reg::from_field(word >> 9),
        base: Reg::from_field(word >> 6),
        offset: sign_extend(word, 6),
    }
}

fn decode_jsr(word: u16) -> JsrIns {
    let target = if bit(word, 11) == 1 {
        JsrTarget::Offset(sign_extend(word, 11))
    } else {
        JsrTarget::Reg(Reg::from_field(word >> 6))
    };
    JsrIns { target }
}

/// Decode one instruction word. Total: every 16-bit word names a handler,
/// including the reserved RTI/RES encodings.
pub fn decode(word: u16) -> Ins {
    match Opcode::from_word(word) {
        Opcode::Br => Ins::Br(BranchIns {
            cond: (word >> 9) & 0x7,
            offset: sign_extend(word, 9),
        }),
        Opcode::Add => Ins::Add(decode_operate(word)),
        Opcode::Ld => Ins::Ld(decode_pc_rel(word)),
        Opcode::St => Ins::St(decode_pc_rel(word)),
        Opcode::Jsr => Ins::Jsr(decode_jsr(word)),
        Opcode::And => Ins::And(decode_operate(word)),
        Opcode::Ldr => Ins::Ldr(decode_base_offset(word)),
        Opcode::Str => Ins::Str(decode_base_offset(word)),
        Opcode::Rti => Ins::Rti,
        Opcode::Not => Ins::Not(NotIns {
            dr: Reg::from_field(word >> 9),
            sr: Reg::from_field(word >> 6),
        }),
        Opcode::Ldi => Ins::Ldi(decode_pc_rel(word)),
        Opcode::Sti => Ins::Sti(decode_pc_rel(word)),
        Opcode::Jmp => Ins::Jmp(JmpIns {
            base: Reg::from_field(word >> 6),
        }),
        Opcode::Res => Ins::Res,
        Opcode::Lea => Ins::Lea(decode_pc_rel(word)),
        Opcode::Trap => Ins::Trap(TrapIns {
            vector: (word & 0xff) as u8,
        }),
    }
}
