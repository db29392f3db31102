//! # Infrared Primitives
//!
//! Bit-packed encodings for infrared codes and the actions that fire them.
//!
//! An [`IrCode`] is one transmittable code word. On the wire it is a packed
//! 32-bit little-endian word — a 4-bit encoding tag, a 5-bit bit count and a
//! 23-bit code value — followed by a 32-bit toggle mask for protocols (RC6)
//! that flip a bit between repeated presses. Values wider than their field
//! are truncated by masking, exactly as a fixed-width packed struct would
//! truncate them; nothing is rejected at this layer.
//!
//! An [`IrAction`] is an ordered burst of codes sent together. A NOP code's
//! value field doubles as an inter-code delay in milliseconds, which is how
//! multi-protocol power macros pause between transmissions.

use crate::pack::{EntityId, Packable};

/// IR carrier encoding for one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IrEncoding {
    /// No transmission; the code value is an inter-code delay.
    #[default]
    Nop = 0,
    /// Philips RC6.
    Rc6 = 1,
    /// Sony SIRC.
    Sirc = 2,
}

/// A single IR code a remote can send.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrCode {
    pub encoding: IrEncoding,
    pub bits: u8,
    pub code: u32,
    pub toggle_mask: u32,
}

impl IrCode {
    pub fn new(encoding: IrEncoding, bits: u8, code: u32) -> Self {
        IrCode {
            encoding,
            bits,
            code,
            toggle_mask: 0,
        }
    }

    pub fn with_toggle(mut self, toggle_mask: u32) -> Self {
        self.toggle_mask = toggle_mask;
        self
    }

    /// The packed word: encoding in bits 0..4, bit count in bits 4..9,
    /// code value in bits 9..32. Oversized values are masked, not rejected.
    fn packed_word(&self) -> u32 {
        (self.encoding as u32 & 0xF)
            | ((self.bits as u32 & 0x1F) << 4)
            | ((self.code & 0x7F_FFFF) << 9)
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.packed_word().to_le_bytes());
        out.extend_from_slice(&self.toggle_mask.to_le_bytes());
    }
}

/// An IR action: one or more codes transmitted in order.
///
/// Wire layout is a code count followed by the codes inline, so the whole
/// action is a single fixed-size record once constructed. An action built
/// from no codes degrades to a single NOP code.
pub struct IrAction {
    id: EntityId,
    name: String,
    codes: Vec<IrCode>,
}

impl IrAction {
    pub fn new(name: &str, codes: Vec<IrCode>) -> Self {
        let codes = if codes.is_empty() {
            vec![IrCode::default()]
        } else {
            codes
        };
        IrAction {
            id: EntityId::fresh(),
            name: name.to_string(),
            codes,
        }
    }
}

impl Packable for IrAction {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("IrAction '{}'", self.name)
    }

    fn size(&self) -> u32 {
        4 + 8 * self.codes.len() as u32
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.codes.len() as i32).to_le_bytes());
        for code in &self.codes {
            code.encode(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_word_bit_positions() {
        let code = IrCode::new(IrEncoding::Sirc, 12, 0x0A90);
        // 2 | 12 << 4 | 0xA90 << 9
        assert_eq!(code.packed_word(), 0x0015_20C2);
    }

    #[test]
    fn test_oversized_fields_truncate_silently() {
        let code = IrCode::new(IrEncoding::Rc6, 40, 0x00FF_FFFF);
        let word = code.packed_word();
        assert_eq!(word & 0xF, 1);
        assert_eq!((word >> 4) & 0x1F, 40 & 0x1F);
        assert_eq!(word >> 9, 0x007F_FFFF);
    }

    #[test]
    fn test_toggle_mask_follows_packed_word() {
        let code = IrCode::new(IrEncoding::Rc6, 21, 0xFFB38).with_toggle(0x10000);
        let mut out = Vec::new();
        code.encode(&mut out);
        assert_eq!(out.len(), 8);
        assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 0x10000);
    }

    #[test]
    fn test_action_size_counts_inline_codes() {
        let action = IrAction::new(
            "power",
            vec![
                IrCode::new(IrEncoding::Rc6, 21, 0xFFB38),
                IrCode::new(IrEncoding::Sirc, 12, 0x0A90),
            ],
        );
        assert_eq!(action.size(), 4 + 16);
    }

    #[test]
    fn test_empty_action_degrades_to_single_nop() {
        let action = IrAction::new("noop", Vec::new());
        assert_eq!(action.size(), 12);
        let mut out = Vec::new();
        action.encode(&mut out);
        assert_eq!(&out[0..4], &1i32.to_le_bytes());
        assert_eq!(&out[4..12], &[0u8; 8]);
    }
}
