//! IJVM instruction table and disassembler.

use crate::cpu::memory::Memory;
use std::fmt;

/// Opcode prefix that widens the next local variable index to 16 bits.
pub const WIDE: u8 = 0xC4;

/// Operand kinds following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Signed byte constant.
    Byte,
    /// Local variable index: one byte, two after WIDE.
    Var,
    /// Signed byte increment (IINC).
    Inc,
    /// 16-bit constant pool index.
    Constant,
    /// 16-bit method index (constant pool).
    Method,
    /// Signed 16-bit branch offset from the opcode address.
    Offset,
}

impl Operand {
    fn width(self, wide: bool) -> usize {
        match self {
            Operand::Byte | Operand::Inc => 1,
            Operand::Var if wide => 2,
            Operand::Var => 1,
            Operand::Constant | Operand::Method | Operand::Offset => 2,
        }
    }
}

/// One entry of the instruction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub code: u8,
    pub mnemonic: &'static str,
    pub operands: &'static [Operand],
}

/// The IJVM instruction set.
pub const OPCODES: &[Opcode] = &[
    Opcode { code: 0x10, mnemonic: "BIPUSH", operands: &[Operand::Byte] },
    Opcode { code: 0x59, mnemonic: "DUP", operands: &[] },
    Opcode { code: 0xFE, mnemonic: "ERR", operands: &[] },
    Opcode { code: 0xA7, mnemonic: "GOTO", operands: &[Operand::Offset] },
    Opcode { code: 0xFF, mnemonic: "HALT", operands: &[] },
    Opcode { code: 0x60, mnemonic: "IADD", operands: &[] },
    Opcode { code: 0x7E, mnemonic: "IAND", operands: &[] },
    Opcode { code: 0x99, mnemonic: "IFEQ", operands: &[Operand::Offset] },
    Opcode { code: 0x9B, mnemonic: "IFLT", operands: &[Operand::Offset] },
    Opcode { code: 0x9F, mnemonic: "IF_ICMPEQ", operands: &[Operand::Offset] },
    Opcode { code: 0x84, mnemonic: "IINC", operands: &[Operand::Var, Operand::Inc] },
    Opcode { code: 0x15, mnemonic: "ILOAD", operands: &[Operand::Var] },
    Opcode { code: 0xFC, mnemonic: "IN", operands: &[] },
    Opcode { code: 0xB6, mnemonic: "INVOKEVIRTUAL", operands: &[Operand::Method] },
    Opcode { code: 0xB0, mnemonic: "IOR", operands: &[] },
    Opcode { code: 0xAC, mnemonic: "IRETURN", operands: &[] },
    Opcode { code: 0x36, mnemonic: "ISTORE", operands: &[Operand::Var] },
    Opcode { code: 0x64, mnemonic: "ISUB", operands: &[] },
    Opcode { code: 0x13, mnemonic: "LDC_W", operands: &[Operand::Constant] },
    Opcode { code: 0x00, mnemonic: "NOP", operands: &[] },
    Opcode { code: 0xFD, mnemonic: "OUT", operands: &[] },
    Opcode { code: 0x57, mnemonic: "POP", operands: &[] },
    Opcode { code: 0x5F, mnemonic: "SWAP", operands: &[] },
    Opcode { code: WIDE, mnemonic: "WIDE", operands: &[] },
];

/// Look up an opcode byte.
pub fn opcode(code: u8) -> Option<&'static Opcode> {
    OPCODES.iter().find(|op| op.code == code)
}

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IjvmLine {
    /// Byte address of the first byte (the WIDE prefix, if any).
    pub address: u32,
    pub bytes: Vec<u8>,
    pub text: String,
}

impl fmt::Display for IjvmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("{b:02X}")).collect();
        write!(f, "{:#06X}: {:<15} {}", self.address, hex.join(" "), self.text)
    }
}

/// Disassemble a byte slice that starts at byte address `base`.
pub fn disassemble_bytes(bytes: &[u8], base: u32) -> Vec<IjvmLine> {
    let mut lines = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let wide = bytes[pos] == WIDE && bytes.get(pos + 1).and_then(|&b| opcode(b)).is_some_and(widens);
        if wide {
            pos += 1;
        }

        let code = bytes[pos];
        let Some(op) = opcode(code) else {
            lines.push(IjvmLine {
                address: base + start as u32,
                bytes: vec![code],
                text: format!(".byte {code:#04X}"),
            });
            pos += 1;
            continue;
        };

        let width: usize = op.operands.iter().map(|o| o.width(wide)).sum();
        let Some(operand_bytes) = bytes.get(pos + 1..pos + 1 + width) else {
            // Operands run past the end of the block
            for (i, &b) in bytes[start..].iter().enumerate() {
                lines.push(IjvmLine {
                    address: base + (start + i) as u32,
                    bytes: vec![b],
                    text: format!(".byte {b:#04X}"),
                });
            }
            break;
        };

        let opcode_addr = base + pos as u32;
        let text = format_instruction(op, operand_bytes, wide, opcode_addr);
        pos += 1 + width;
        lines.push(IjvmLine {
            address: base + start as u32,
            bytes: bytes[start..pos].to_vec(),
            text,
        });
    }
    lines
}

/// Disassemble the method area (the first loaded segment).
pub fn disassemble_memory(mem: &Memory) -> Vec<IjvmLine> {
    let Some(segment) = mem.segments().first() else {
        return Vec::new();
    };
    let bytes: Vec<u8> = (segment.start..segment.end())
        .map_while(|addr| mem.read_byte(addr).ok())
        .collect();
    disassemble_bytes(&bytes, segment.start)
}

fn widens(op: &Opcode) -> bool {
    op.operands.contains(&Operand::Var)
}

fn format_instruction(op: &Opcode, mut operands: &[u8], wide: bool, opcode_addr: u32) -> String {
    let mut text = String::new();
    if wide {
        text.push_str("WIDE ");
    }
    text.push_str(op.mnemonic);

    for kind in op.operands {
        let (field, rest) = operands.split_at(kind.width(wide));
        operands = rest;
        let unsigned = field.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);

        let rendered = match kind {
            Operand::Byte | Operand::Inc => (field[0] as i8).to_string(),
            Operand::Var => unsigned.to_string(),
            Operand::Constant | Operand::Method => format!("{unsigned:#06X}"),
            Operand::Offset => {
                let offset = unsigned as u16 as i16;
                let target = opcode_addr.wrapping_add_signed(offset as i32);
                format!("{offset} ; -> {target:#06X}")
            }
        };
        text.push(' ');
        text.push_str(&rendered);
    }
    text
}
