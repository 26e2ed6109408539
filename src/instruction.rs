/// # instruction
///
/// The one decode table shared by the machine and the disassembler. Every
/// instruction is a big-endian 16-bit word; the nibbles are read as
///
///   F X Y N      family, register x, register y, 4-bit count
///     K K        8-bit immediate (low byte)
///   N N N        12-bit address (low three nibbles)
use std::fmt;

/// a raw instruction word, with accessors for the operand fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    pub fn family(&self) -> u8 {
        (self.0 >> 12) as u8
    }
    pub fn x(&self) -> u8 {
        ((self.0 >> 8) & 0xf) as u8
    }
    pub fn y(&self) -> u8 {
        ((self.0 >> 4) & 0xf) as u8
    }
    pub fn n(&self) -> u8 {
        (self.0 & 0xf) as u8
    }
    pub fn kk(&self) -> u8 {
        (self.0 & 0xff) as u8
    }
    pub fn nnn(&self) -> u16 {
        self.0 & 0x0fff
    }
}

/// A decoded instruction. Register operands are indices 0x0-0xF, addresses
/// are 12-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Cls,
    Ret,
    /// machine-code call on the original hardware; decoded so it can be
    /// listed, but never executed
    Sys(u16),
    Jp(u16),
    Call(u16),
    SeByte(u8, u8),
    SneByte(u8, u8),
    SeReg(u8, u8),
    LdByte(u8, u8),
    AddByte(u8, u8),
    LdReg(u8, u8),
    Or(u8, u8),
    And(u8, u8),
    Xor(u8, u8),
    AddReg(u8, u8),
    Sub(u8, u8),
    Shr(u8, u8),
    Subn(u8, u8),
    Shl(u8, u8),
    SneReg(u8, u8),
    LdI(u16),
    /// jump to nnn + Vx; the register comes from the second nibble
    JpV(u8, u16),
    Rnd(u8, u8),
    Drw(u8, u8, u8),
    Skp(u8),
    Sknp(u8),
    LdRegDt(u8),
    LdKey(u8),
    LdDtReg(u8),
    LdSt(u8),
    AddI(u8),
    LdF(u8),
    LdB(u8),
    LdDerefIReg(u8),
    LdRegDerefI(u8),
}

impl Instruction {
    /// map an instruction word onto the instruction set; None for words
    /// that match nothing
    pub fn decode(op: Opcode) -> Option<Instruction> {
        use Instruction::*;
        let (x, y, n, kk, nnn) = (op.x(), op.y(), op.n(), op.kk(), op.nnn());
        let instr = match op.family() {
            0x0 => match op.0 {
                0x00e0 => Cls,
                0x00ee => Ret,
                _ => Sys(nnn),
            },
            0x1 => Jp(nnn),
            0x2 => Call(nnn),
            0x3 => SeByte(x, kk),
            0x4 => SneByte(x, kk),
            0x5 => SeReg(x, y),
            0x6 => LdByte(x, kk),
            0x7 => AddByte(x, kk),
            0x8 => match n {
                0x0 => LdReg(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => Sub(x, y),
                0x6 => Shr(x, y),
                0x7 => Subn(x, y),
                0xe => Shl(x, y),
                _ => return None,
            },
            0x9 => SneReg(x, y),
            0xa => LdI(nnn),
            0xb => JpV(x, nnn),
            0xc => Rnd(x, kk),
            0xd => Drw(x, y, n),
            0xe => match kk {
                0x9e => Skp(x),
                0xa1 => Sknp(x),
                _ => return None,
            },
            0xf => match kk {
                0x07 => LdRegDt(x),
                0x0a => LdKey(x),
                0x15 => LdDtReg(x),
                0x18 => LdSt(x),
                0x1e => AddI(x),
                0x29 => LdF(x),
                0x33 => LdB(x),
                0x55 => LdDerefIReg(x),
                0x65 => LdRegDerefI(x),
                _ => return None,
            },
            _ => return None,
        };
        Some(instr)
    }
}

impl fmt::Display for Instruction {
    /// assembly-style mnemonic; registers as `V` + hex nibble, immediates
    /// and addresses as unpadded `0x` hex
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Sys(nnn) => write!(f, "SYS 0x{:X}", nnn),
            Jp(nnn) => write!(f, "JP 0x{:X}", nnn),
            Call(nnn) => write!(f, "CALL 0x{:X}", nnn),
            SeByte(x, kk) => write!(f, "SE V{:X}, 0x{:X}", x, kk),
            SneByte(x, kk) => write!(f, "SNE V{:X}, 0x{:X}", x, kk),
            SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte(x, kk) => write!(f, "LD V{:X}, 0x{:X}", x, kk),
            AddByte(x, kk) => write!(f, "ADD V{:X}, 0x{:X}", x, kk),
            LdReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI(nnn) => write!(f, "LD I, 0x{:X}", nnn),
            JpV(x, nnn) => write!(f, "JP V{:X}, 0x{:X}", x, nnn),
            Rnd(x, kk) => write!(f, "RND V{:X}, 0x{:X}", x, kk),
            Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, 0x{:X}", x, y, n),
            Skp(x) => write!(f, "SKP V{:X}", x),
            Sknp(x) => write!(f, "SKNP V{:X}", x),
            LdRegDt(x) => write!(f, "LD V{:X}, DT", x),
            LdKey(x) => write!(f, "LD V{:X}, K", x),
            LdDtReg(x) => write!(f, "LD DT, V{:X}", x),
            LdSt(x) => write!(f, "LD ST, V{:X}", x),
            AddI(x) => write!(f, "ADD I, V{:X}", x),
            LdF(x) => write!(f, "LD F, V{:X}", x),
            LdB(x) => write!(f, "LD B, V{:X}", x),
            LdDerefIReg(x) => write!(f, "LD [I], V{:X}", x),
            LdRegDerefI(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Instruction::*;
    use super::*;

    #[test]
    fn test_operand_fields() {
        let op = Opcode(0xd7b3);
        assert_eq!(op.family(), 0xd);
        assert_eq!(op.x(), 0x7);
        assert_eq!(op.y(), 0xb);
        assert_eq!(op.n(), 0x3);
        assert_eq!(op.kk(), 0xb3);
        assert_eq!(op.nnn(), 0x7b3);
    }

    #[test]
    fn test_opcode_translation() {
        let cases = [
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x0123, Sys(0x123)),
            (0x1234, Jp(0x234)),
            (0x2456, Call(0x456)),
            (0x342A, SeByte(0x4, 0x2A)),
            (0x4A75, SneByte(0xA, 0x75)),
            (0x5AE0, SeReg(0xA, 0xE)),
            (0x63F5, LdByte(0x3, 0xF5)),
            (0x7B12, AddByte(0xB, 0x12)),
            (0x8590, LdReg(0x5, 0x9)),
            (0x8101, Or(0x1, 0x0)),
            (0x8642, And(0x6, 0x4)),
            (0x87F3, Xor(0x7, 0xF)),
            (0x8264, AddReg(0x2, 0x6)),
            (0x8C45, Sub(0xC, 0x4)),
            (0x8126, Shr(0x1, 0x2)),
            (0x86D7, Subn(0x6, 0xD)),
            (0x8E3E, Shl(0xE, 0x3)),
            (0x9990, SneReg(0x9, 0x9)),
            (0xA568, LdI(0x568)),
            (0xB2BC, JpV(0x2, 0x2BC)),
            (0xC5AF, Rnd(0x5, 0xAF)),
            (0xD7B0, Drw(0x7, 0xB, 0x0)),
            (0xE49E, Skp(0x4)),
            (0xECA1, Sknp(0xC)),
            (0xF907, LdRegDt(0x9)),
            (0xFD0A, LdKey(0xD)),
            (0xF315, LdDtReg(0x3)),
            (0xF718, LdSt(0x7)),
            (0xF91E, AddI(0x9)),
            (0xFF29, LdF(0xF)),
            (0xF533, LdB(0x5)),
            (0xF655, LdDerefIReg(0x6)),
            (0xF865, LdRegDerefI(0x8)),
        ];
        for (word, instr) in cases {
            assert_eq!(Instruction::decode(Opcode(word)), Some(instr), "{:04X}", word);
        }
    }

    #[test]
    fn test_register_compares_ignore_low_nibble() {
        assert_eq!(Instruction::decode(Opcode(0x5121)), Some(SeReg(0x1, 0x2)));
        assert_eq!(Instruction::decode(Opcode(0x9abf)), Some(SneReg(0xa, 0xb)));
    }

    #[test]
    fn test_unmatched_words() {
        for word in [0x8008, 0x800f, 0xe19f, 0xf0ff, 0xf030] {
            assert_eq!(Instruction::decode(Opcode(word)), None, "{:04X}", word);
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(LdByte(0x0, 0x05).to_string(), "LD V0, 0x5");
        assert_eq!(Drw(0xa, 0xb, 0xf).to_string(), "DRW VA, VB, 0xF");
        assert_eq!(JpV(0x3, 0x2a0).to_string(), "JP V3, 0x2A0");
        assert_eq!(LdDerefIReg(0xe).to_string(), "LD [I], VE");
        assert_eq!(LdRegDerefI(0x1).to_string(), "LD V1, [I]");
        assert_eq!(SeReg(0x1, 0x2).to_string(), "SE V1, V2");
    }
}
