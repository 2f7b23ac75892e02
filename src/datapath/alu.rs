//! Bit-sliced arithmetic/logic unit.
//!
//! The MIC-1 ALU is 32 identical one-bit slices chained through their
//! carry lines. Each slice sees one bit of the A operand (always H) and one
//! bit of the B operand (whatever the B bus drives), plus six control lines
//! taken straight from the microinstruction.

use serde::{Deserialize, Serialize};

/// Width of the datapath in bits.
pub const WORD_BITS: usize = 32;

/// The six ALU control lines of a microinstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AluSignals {
    pub f0: bool,
    pub f1: bool,
    /// Enable the A input.
    pub ena: bool,
    /// Enable the B input.
    pub enb: bool,
    /// Invert the (enabled) A input.
    pub inva: bool,
    /// Carry into bit 0.
    pub inc: bool,
}

/// The four functions selected by F0/F1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluFunction {
    And,
    Or,
    NotB,
    Sum,
}

impl AluSignals {
    /// Decode F0/F1 into the selected function.
    pub fn function(&self) -> AluFunction {
        match (self.f0, self.f1) {
            (false, false) => AluFunction::And,
            (false, true) => AluFunction::Or,
            (true, false) => AluFunction::NotB,
            (true, true) => AluFunction::Sum,
        }
    }
}

/// One slice of the ALU.
///
/// Returns `(result, carry_out)`. Only the adder produces a carry; the
/// logical functions always report `false`.
#[inline]
pub fn bit_alu(a: bool, b: bool, signals: &AluSignals, carry_in: bool) -> (bool, bool) {
    let a = (a && signals.ena) ^ signals.inva;
    let b = b && signals.enb;

    match signals.function() {
        AluFunction::And => (a && b, false),
        AluFunction::Or => (a || b, false),
        AluFunction::NotB => (!b, false),
        AluFunction::Sum => {
            let sum = a ^ b ^ carry_in;
            let carry = (a && b) || (carry_in && (a ^ b));
            (sum, carry)
        }
    }
}

/// Result of one pass through the word ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AluOutput {
    pub value: i32,
    /// N flag: the result is negative.
    pub negative: bool,
    /// Z flag: the result is zero.
    pub zero: bool,
}

/// 32-bit ALU built from [`bit_alu`] slices.
///
/// Keeps the last output so the engine (and a debugger view) can read the
/// flags after the fact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alu {
    last: AluOutput,
}

impl Alu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run both operands through the 32 slices, bit 0 first.
    pub fn compute(&mut self, a: i32, b: i32, signals: &AluSignals) -> AluOutput {
        let (a, b) = (a as u32, b as u32);
        let mut carry = signals.inc;
        let mut value = 0u32;

        for i in 0..WORD_BITS {
            let (bit, carry_out) = bit_alu((a >> i) & 1 == 1, (b >> i) & 1 == 1, signals, carry);
            if bit {
                value |= 1 << i;
            }
            carry = carry_out;
        }

        let value = value as i32;
        self.last = AluOutput {
            value,
            negative: value < 0,
            zero: value == 0,
        };
        self.last
    }

    /// The most recent output.
    pub fn output(&self) -> AluOutput {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = AluOutput::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sum() -> AluSignals {
        AluSignals { f0: true, f1: true, ena: true, enb: true, ..Default::default() }
    }

    #[test]
    fn test_bit_alu_full_adder() {
        let s = AluSignals { f0: true, f1: true, ena: true, enb: true, ..Default::default() };
        assert_eq!(bit_alu(false, false, &s, false), (false, false));
        assert_eq!(bit_alu(true, false, &s, false), (true, false));
        assert_eq!(bit_alu(true, true, &s, false), (false, true));
        assert_eq!(bit_alu(true, true, &s, true), (true, true));
        assert_eq!(bit_alu(false, true, &s, true), (false, true));
    }

    #[test]
    fn test_bit_alu_disabled_inputs() {
        let s = AluSignals { f1: true, ..Default::default() };
        // OR with both inputs disabled is always zero
        assert_eq!(bit_alu(true, true, &s, true), (false, false));

        let s = AluSignals { f1: true, inva: true, ..Default::default() };
        // INVA on a disabled A forces a one
        assert_eq!(bit_alu(false, false, &s, false), (true, false));
    }

    #[test]
    fn test_not_b() {
        let mut alu = Alu::new();
        let s = AluSignals { f0: true, enb: true, ..Default::default() };
        assert_eq!(alu.compute(0, 0x0F0F_0F0F, &s).value, 0xF0F0_F0F0u32 as i32);

        // NOT of a disabled B gives all ones
        let s = AluSignals { f0: true, ..Default::default() };
        assert_eq!(alu.compute(123, 456, &s).value, -1);
    }

    #[test]
    fn test_constants() {
        let mut alu = Alu::new();

        // 0 + 0 + 1
        let one = AluSignals { f0: true, f1: true, inc: true, ..Default::default() };
        assert_eq!(alu.compute(77, 99, &one).value, 1);

        // -1 via inverted, disabled A
        let minus_one = AluSignals { f0: true, f1: true, inva: true, ..Default::default() };
        let out = alu.compute(77, 99, &minus_one);
        assert_eq!(out.value, -1);
        assert!(out.negative);
        assert!(!out.zero);
    }

    #[test]
    fn test_subtraction() {
        let mut alu = Alu::new();
        // B - A = B + NOT A + 1
        let s = AluSignals { f0: true, f1: true, ena: true, enb: true, inva: true, inc: true, ..Default::default() };
        assert_eq!(alu.compute(7, 10, &s).value, 3);
        assert_eq!(alu.compute(10, 7, &s).value, -3);

        let out = alu.compute(42, 42, &s);
        assert!(out.zero);
        assert_eq!(alu.output(), out);
    }

    #[test]
    fn test_overflow_wraps() {
        let mut alu = Alu::new();
        let out = alu.compute(i32::MAX, 1, &sum());
        assert_eq!(out.value, i32::MIN);
        assert!(out.negative);
    }

    proptest! {
        #[test]
        fn prop_sum_matches_wrapping_add(a: i32, b: i32) {
            let mut alu = Alu::new();
            let out = alu.compute(a, b, &sum());
            let expected = a.wrapping_add(b);
            prop_assert_eq!(out.value, expected);
            prop_assert_eq!(out.negative, expected < 0);
            prop_assert_eq!(out.zero, expected == 0);
        }

        #[test]
        fn prop_logic_ignores_carry(a: i32, b: i32, inc: bool) {
            let mut alu = Alu::new();
            let and = AluSignals { ena: true, enb: true, inc, ..Default::default() };
            let or = AluSignals { f1: true, ena: true, enb: true, inc, ..Default::default() };
            prop_assert_eq!(alu.compute(a, b, &and).value, a & b);
            prop_assert_eq!(alu.compute(a, b, &or).value, a | b);
        }

        #[test]
        fn prop_increment(b: i32) {
            let mut alu = Alu::new();
            let s = AluSignals { f0: true, f1: true, enb: true, inc: true, ..Default::default() };
            prop_assert_eq!(alu.compute(0, b, &s).value, b.wrapping_add(1));
        }
    }
}
