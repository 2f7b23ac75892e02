//! Microinstruction decoder for the MIC-1 control store.
//!
//! A control word is 36 bits wide. From the most significant bit down:
//! - Bits 35-27: NEXT_ADDRESS
//! - Bits 26-24: JMPC, JMPN, JMPZ
//! - Bits 23-16: SLL8, SRA1, F0, F1, ENA, ENB, INVA, INC
//! - Bits 15-7:  C bus (H, OPC, TOS, CPP, LV, SP, PC, MDR, MAR)
//! - Bits 6-4:   WRITE, READ, FETCH
//! - Bits 3-0:   B bus selector

use crate::cpu::registers::{Register, Registers};
use crate::datapath::{AluSignals, JumpSignals, ShiftSignals, SignalError, MPC_MASK};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a control word in bits.
pub const CONTROL_WORD_BITS: u32 = 36;

/// Mask covering one control word.
pub const CONTROL_WORD_MASK: u64 = (1 << CONTROL_WORD_BITS) - 1;

const ADDR_SHIFT: u32 = 27;
const JMPC_BIT: u32 = 26;
const JMPN_BIT: u32 = 25;
const JMPZ_BIT: u32 = 24;
const SLL8_BIT: u32 = 23;
const SRA1_BIT: u32 = 22;
const F0_BIT: u32 = 21;
const F1_BIT: u32 = 20;
const ENA_BIT: u32 = 19;
const ENB_BIT: u32 = 18;
const INVA_BIT: u32 = 17;
const INC_BIT: u32 = 16;
const C_BUS_SHIFT: u32 = 7;
const WRITE_BIT: u32 = 6;
const READ_BIT: u32 = 5;
const FETCH_BIT: u32 = 4;

/// Register driving the B bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BusSource {
    Mdr,
    Pc,
    Mbr,
    Mbru,
    Sp,
    Lv,
    Cpp,
    Tos,
    Opc,
    /// Selector codes 9-15: nothing drives the bus, which reads as zero.
    #[default]
    None,
}

impl BusSource {
    pub fn from_code(code: u8) -> Self {
        match code & 0xF {
            0 => BusSource::Mdr,
            1 => BusSource::Pc,
            2 => BusSource::Mbr,
            3 => BusSource::Mbru,
            4 => BusSource::Sp,
            5 => BusSource::Lv,
            6 => BusSource::Cpp,
            7 => BusSource::Tos,
            8 => BusSource::Opc,
            _ => BusSource::None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            BusSource::Mdr => 0,
            BusSource::Pc => 1,
            BusSource::Mbr => 2,
            BusSource::Mbru => 3,
            BusSource::Sp => 4,
            BusSource::Lv => 5,
            BusSource::Cpp => 6,
            BusSource::Tos => 7,
            BusSource::Opc => 8,
            BusSource::None => 15,
        }
    }

    pub fn register(self) -> Option<Register> {
        match self {
            BusSource::Mdr => Some(Register::Mdr),
            BusSource::Pc => Some(Register::Pc),
            BusSource::Mbr => Some(Register::Mbr),
            BusSource::Mbru => Some(Register::Mbru),
            BusSource::Sp => Some(Register::Sp),
            BusSource::Lv => Some(Register::Lv),
            BusSource::Cpp => Some(Register::Cpp),
            BusSource::Tos => Some(Register::Tos),
            BusSource::Opc => Some(Register::Opc),
            BusSource::None => None,
        }
    }

    /// The value this source puts on the bus.
    pub fn read(self, regs: &Registers) -> i32 {
        self.register().map_or(0, |reg| regs.get(reg))
    }
}

/// Set of C-bus destinations, one bit per writable register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CBus(u16);

impl CBus {
    /// Build from the 9-bit field of a control word (bit 8 = H ... bit 0 = MAR).
    pub fn from_bits(bits: u16) -> Self {
        CBus(bits & 0x1FF)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn of(registers: &[Register]) -> Self {
        registers.iter().fold(CBus::default(), |bus, &reg| bus.with(reg))
    }

    /// Add a register. Registers not on the C bus are ignored.
    pub fn with(self, reg: Register) -> Self {
        match Self::bit_for(reg) {
            Some(bit) => CBus(self.0 | bit),
            None => self,
        }
    }

    pub fn contains(self, reg: Register) -> bool {
        Self::bit_for(reg).is_some_and(|bit| self.0 & bit != 0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Destinations in control-word order (H first, MAR last).
    pub fn iter(self) -> impl DoubleEndedIterator<Item = Register> {
        Register::C_BUS.into_iter().filter(move |&reg| self.contains(reg))
    }

    fn bit_for(reg: Register) -> Option<u16> {
        Register::C_BUS
            .iter()
            .position(|&r| r == reg)
            .map(|pos| 1 << (8 - pos))
    }
}

/// Memory control lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemorySignals {
    pub write: bool,
    pub read: bool,
    pub fetch: bool,
}

impl MemorySignals {
    pub fn any(&self) -> bool {
        self.write || self.read || self.fetch
    }
}

/// One decoded control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MicroInstruction {
    /// 9-bit NEXT_ADDRESS field.
    pub next_address: u16,
    pub jump: JumpSignals,
    pub shift: ShiftSignals,
    pub alu: AluSignals,
    pub c_bus: CBus,
    pub memory: MemorySignals,
    pub b_bus: BusSource,
}

impl MicroInstruction {
    /// Decode a 36-bit control word. Bits above bit 35 are ignored.
    pub fn decode(word: u64) -> Result<Self, SignalError> {
        let bit = |n: u32| (word >> n) & 1 == 1;

        let shift = ShiftSignals { sll8: bit(SLL8_BIT), sra1: bit(SRA1_BIT) };
        shift.validate()?;

        Ok(Self {
            next_address: ((word >> ADDR_SHIFT) as u16) & MPC_MASK,
            jump: JumpSignals { jmpc: bit(JMPC_BIT), jmpn: bit(JMPN_BIT), jmpz: bit(JMPZ_BIT) },
            shift,
            alu: AluSignals {
                f0: bit(F0_BIT),
                f1: bit(F1_BIT),
                ena: bit(ENA_BIT),
                enb: bit(ENB_BIT),
                inva: bit(INVA_BIT),
                inc: bit(INC_BIT),
            },
            c_bus: CBus::from_bits((word >> C_BUS_SHIFT) as u16),
            memory: MemorySignals { write: bit(WRITE_BIT), read: bit(READ_BIT), fetch: bit(FETCH_BIT) },
            b_bus: BusSource::from_code(word as u8),
        })
    }

    /// Encode back into a 36-bit control word.
    pub fn encode(&self) -> u64 {
        let flag = |set: bool, n: u32| (set as u64) << n;

        ((self.next_address & MPC_MASK) as u64) << ADDR_SHIFT
            | flag(self.jump.jmpc, JMPC_BIT)
            | flag(self.jump.jmpn, JMPN_BIT)
            | flag(self.jump.jmpz, JMPZ_BIT)
            | flag(self.shift.sll8, SLL8_BIT)
            | flag(self.shift.sra1, SRA1_BIT)
            | flag(self.alu.f0, F0_BIT)
            | flag(self.alu.f1, F1_BIT)
            | flag(self.alu.ena, ENA_BIT)
            | flag(self.alu.enb, ENB_BIT)
            | flag(self.alu.inva, INVA_BIT)
            | flag(self.alu.inc, INC_BIT)
            | (self.c_bus.bits() as u64) << C_BUS_SHIFT
            | flag(self.memory.write, WRITE_BIT)
            | flag(self.memory.read, READ_BIT)
            | flag(self.memory.fetch, FETCH_BIT)
            | self.b_bus.code() as u64
    }

    /// No register write and no memory traffic.
    pub fn is_nop(&self) -> bool {
        self.c_bus.is_empty() && !self.memory.any()
    }

    /// The instruction that dispatches on a fetched opcode (`goto (MBR)`).
    ///
    /// A multiway branch into the upper half of the store, like the
    /// `goto (MBR OR 0x100)` after a WIDE prefix, continues the current
    /// IJVM instruction and does not count.
    pub fn is_dispatch(&self) -> bool {
        self.jump.jmpc && self.next_address & 0x100 == 0
    }

    /// A no-op that can only ever branch back to `address`.
    pub fn is_halt_at(&self, address: u16) -> bool {
        self.is_nop() && !self.jump.any() && self.next_address == (address & MPC_MASK)
    }
}

impl fmt::Display for MicroInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::disasm::micro::format_micro(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_main1() {
        // PC = PC + 1; fetch; goto (MBR)
        let word: u64 = (1 << JMPC_BIT)
            | (1 << F0_BIT)
            | (1 << F1_BIT)
            | (1 << ENB_BIT)
            | (1 << INC_BIT)
            | (1 << (C_BUS_SHIFT + 2))
            | (1 << FETCH_BIT)
            | 1;
        let instr = MicroInstruction::decode(word).unwrap();

        assert_eq!(instr.next_address, 0);
        assert!(instr.jump.jmpc);
        assert!(instr.alu.f0 && instr.alu.f1 && instr.alu.enb && instr.alu.inc);
        assert!(!instr.alu.ena);
        assert_eq!(instr.c_bus.iter().collect::<Vec<_>>(), vec![Register::Pc]);
        assert!(instr.memory.fetch);
        assert_eq!(instr.b_bus, BusSource::Pc);
        assert!(instr.is_dispatch());
        assert_eq!(instr.encode(), word);
    }

    #[test]
    fn test_decode_next_address_and_c_bus() {
        let word: u64 = (0x1A5 << ADDR_SHIFT) | (0x1FF << C_BUS_SHIFT) | 0x9;
        let instr = MicroInstruction::decode(word).unwrap();
        assert_eq!(instr.next_address, 0x1A5);
        assert_eq!(instr.c_bus.iter().count(), 9);
        assert_eq!(instr.b_bus, BusSource::None);
        assert_eq!(instr.b_bus.register(), None);
    }

    #[test]
    fn test_conflicting_shift_rejected() {
        let word: u64 = (1 << SLL8_BIT) | (1 << SRA1_BIT);
        assert_eq!(MicroInstruction::decode(word), Err(SignalError::ConflictingShift));
    }

    #[test]
    fn test_c_bus_bit_order() {
        let bus = CBus::of(&[Register::H, Register::Mar]);
        assert_eq!(bus.bits(), 0b1_0000_0001);
        assert!(bus.contains(Register::H));
        assert!(!bus.contains(Register::Mbr));
        // MBR is not a C-bus destination
        assert_eq!(bus.with(Register::Mbr), bus);
    }

    #[test]
    fn test_c_bus_iterates_both_ways() {
        let bus = CBus::of(&[Register::Mar, Register::Sp, Register::H]);
        assert_eq!(bus.iter().collect::<Vec<_>>(), vec![Register::H, Register::Sp, Register::Mar]);
        assert_eq!(bus.iter().rev().collect::<Vec<_>>(), vec![Register::Mar, Register::Sp, Register::H]);
    }

    #[test]
    fn test_wide_branch_is_not_a_dispatch() {
        let main1 = MicroInstruction {
            jump: JumpSignals { jmpc: true, ..Default::default() },
            ..Default::default()
        };
        assert!(main1.is_dispatch());
        assert!(!MicroInstruction { next_address: 0x100, ..main1 }.is_dispatch());
        assert!(!MicroInstruction { jump: JumpSignals::default(), ..main1 }.is_dispatch());
    }

    #[test]
    fn test_halt_detection() {
        let halt = MicroInstruction { next_address: 0x0FF, ..Default::default() };
        assert!(halt.is_halt_at(0x0FF));
        assert!(!halt.is_halt_at(0x0FE));

        let busy = MicroInstruction { c_bus: CBus::of(&[Register::H]), ..halt };
        assert!(!busy.is_halt_at(0x0FF));

        let branching = MicroInstruction {
            jump: JumpSignals { jmpz: true, ..Default::default() },
            ..halt
        };
        assert!(!branching.is_halt_at(0x0FF));
    }

    #[test]
    fn test_bus_source_codes() {
        for code in 0..9u8 {
            assert_eq!(BusSource::from_code(code).code(), code);
        }
        let mut regs = Registers::new();
        regs.set(Register::Mbr, 0xF0);
        assert_eq!(BusSource::Mbr.read(&regs), -16);
        assert_eq!(BusSource::Mbru.read(&regs), 0xF0);
        assert_eq!(BusSource::None.read(&regs), 0);
    }
}
