//! The MIC-1 control store: 512 slots of decoded microinstructions.

use crate::cpu::decode::MicroInstruction;
use crate::cpu::format::{self, FormatError, MICROCODE_MAGIC};
use crate::datapath::{MPC_MASK, MPC_SLOTS};
use std::io::Read;

/// Read-only table of microinstructions indexed by MPC.
///
/// Slots past the end of the loaded image stay empty; reaching one halts
/// the machine.
#[derive(Clone)]
pub struct ControlStore {
    slots: Vec<Option<MicroInstruction>>,
    len: usize,
}

impl ControlStore {
    /// Decode a complete microcode image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let body = format::strip_magic(bytes, MICROCODE_MAGIC)?;
        let words = format::unpack_control_words(body)?;

        if words.len() > MPC_SLOTS {
            return Err(FormatError::TooManyInstructions { count: words.len(), max: MPC_SLOTS });
        }

        let mut slots = vec![None; MPC_SLOTS];
        for (address, &word) in words.iter().enumerate() {
            let instr = MicroInstruction::decode(word).map_err(|source| FormatError::IllegalInstruction {
                address: address as u16,
                source,
            })?;
            slots[address] = Some(instr);
        }

        tracing::debug!(instructions = words.len(), "control store loaded");
        Ok(Self { slots, len: words.len() })
    }

    /// Decode an image from a reader.
    pub fn load<R: Read>(reader: R) -> Result<Self, FormatError> {
        Self::from_bytes(&format::read_all(reader)?)
    }

    /// Build directly from decoded instructions, starting at address 0.
    pub fn from_instructions(instructions: &[MicroInstruction]) -> Result<Self, FormatError> {
        Self::from_bytes(&encode_microcode(instructions))
    }

    /// The instruction at `address`, if that slot is defined.
    #[inline]
    pub fn get(&self, address: u16) -> Option<&MicroInstruction> {
        self.slots.get((address & MPC_MASK) as usize)?.as_ref()
    }

    pub fn contains(&self, address: u16) -> bool {
        self.get(address).is_some()
    }

    /// Number of instructions loaded from the image.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Defined slots with their addresses.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &MicroInstruction)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(addr, slot)| slot.as_ref().map(|instr| (addr as u16, instr)))
    }
}

impl std::fmt::Debug for ControlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlStore")
            .field("instructions", &self.len)
            .field("slots", &MPC_SLOTS)
            .finish()
    }
}

/// Serialize instructions into a microcode image.
pub fn encode_microcode(instructions: &[MicroInstruction]) -> Vec<u8> {
    let words: Vec<u64> = instructions.iter().map(MicroInstruction::encode).collect();
    let mut image = MICROCODE_MAGIC.to_be_bytes().to_vec();
    image.extend(format::pack_control_words(&words));
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{BusSource, CBus};
    use crate::cpu::registers::Register;
    use crate::datapath::{AluSignals, SignalError};

    fn sample() -> Vec<MicroInstruction> {
        vec![
            MicroInstruction {
                next_address: 1,
                alu: AluSignals { f0: true, f1: true, enb: true, inc: true, ..Default::default() },
                c_bus: CBus::of(&[Register::Sp, Register::Mar]),
                b_bus: BusSource::Sp,
                ..Default::default()
            },
            MicroInstruction { next_address: 1, ..Default::default() },
        ]
    }

    #[test]
    fn test_load_sequential_slots() {
        let store = ControlStore::from_instructions(&sample()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0), Some(&sample()[0]));
        assert_eq!(store.get(1), Some(&sample()[1]));
        assert!(store.get(2).is_none());
        assert!(!store.contains(0x1FF));
        assert_eq!(store.iter().count(), 2);
    }

    #[test]
    fn test_load_from_reader() {
        let image = encode_microcode(&sample());
        let store = ControlStore::load(std::io::Cursor::new(image)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_full_store() {
        let program = vec![MicroInstruction::default(); MPC_SLOTS];
        let store = ControlStore::from_instructions(&program).unwrap();
        assert_eq!(store.len(), MPC_SLOTS);
        assert!(store.contains(0x1FF));
    }

    #[test]
    fn test_too_many_instructions() {
        let program = vec![MicroInstruction::default(); MPC_SLOTS + 1];
        assert_eq!(
            ControlStore::from_instructions(&program).unwrap_err(),
            FormatError::TooManyInstructions { count: MPC_SLOTS + 1, max: MPC_SLOTS }
        );
    }

    #[test]
    fn test_bad_magic() {
        let mut image = encode_microcode(&sample());
        image[0] ^= 0xFF;
        assert!(matches!(ControlStore::from_bytes(&image), Err(FormatError::BadMagic { .. })));
    }

    #[test]
    fn test_truncated_image() {
        let mut image = encode_microcode(&sample());
        image.truncate(image.len() - 3);
        assert!(matches!(
            ControlStore::from_bytes(&image),
            Err(FormatError::TruncatedRecord { .. })
        ));
    }

    #[test]
    fn test_illegal_shift_aborts_load() {
        let mut words = vec![0u64; 3];
        words[2] = (1 << 23) | (1 << 22);
        let mut image = MICROCODE_MAGIC.to_be_bytes().to_vec();
        image.extend(format::pack_control_words(&words));

        assert_eq!(
            ControlStore::from_bytes(&image).unwrap_err(),
            FormatError::IllegalInstruction { address: 2, source: SignalError::ConflictingShift }
        );
    }
}
