//! Packed node labels field.
//!
//! A node record carries its labels in a single 40-bit field. Small label sets
//! are packed inline; anything that does not fit is stored in a dynamic record
//! chain and the field holds a pointer to it.
//!
//! ```text
//!  39        38..35      34..0
//! [dynamic] [count]     [payload]
//! ```
//!
//! Inline payloads hold `count` labels at `35 / count` bits each, lowest slot
//! first, in ascending label order.

use crate::types::{DynRecId, LabelId, Result, SombraError};

const FIELD_BITS: u32 = 40;
const DYNAMIC_FLAG: u64 = 1 << 39;
const COUNT_SHIFT: u32 = 35;
const COUNT_MASK: u64 = 0xF;
const PAYLOAD_BITS: u32 = 35;
const PAYLOAD_MASK: u64 = (1 << PAYLOAD_BITS) - 1;

/// Largest label count the inline encoding can address.
pub const MAX_INLINE_LABELS: usize = 15;

/// Raw labels field as stored on a node record.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct LabelField(u64);

/// Decoded shape of a [`LabelField`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LabelFieldKind {
    /// Labels are packed in the field itself.
    Inline {
        /// Number of packed labels.
        count: usize,
    },
    /// Labels live in a dynamic array owned by the store.
    Dynamic(DynRecId),
}

impl LabelField {
    /// Field of a node without labels.
    pub const EMPTY: LabelField = LabelField(0);

    /// Packs `labels` inline. Labels must be strictly ascending and narrow
    /// enough for the slot width implied by their count.
    pub fn inline(labels: &[LabelId]) -> Result<Self> {
        if labels.is_empty() {
            return Ok(Self::EMPTY);
        }
        if labels.len() > MAX_INLINE_LABELS {
            return Err(SombraError::Invalid("too many labels for inline label field"));
        }
        let bits = slot_bits(labels.len());
        let mut payload = 0u64;
        for (slot, label) in labels.iter().enumerate() {
            if slot > 0 && labels[slot - 1] >= *label {
                return Err(SombraError::Invalid(
                    "inline labels must be strictly ascending",
                ));
            }
            let value = u64::from(label.0);
            if value >> bits != 0 {
                return Err(SombraError::Invalid("label id too wide for inline label field"));
            }
            payload |= value << (slot as u32 * bits);
        }
        Ok(Self(((labels.len() as u64) << COUNT_SHIFT) | payload))
    }

    /// Returns true when `labels` can be packed with [`LabelField::inline`].
    pub fn fits_inline(labels: &[LabelId]) -> bool {
        Self::inline(labels).is_ok()
    }

    /// Points the field at a dynamic label array.
    pub fn dynamic(ptr: DynRecId) -> Result<Self> {
        if ptr.0 > PAYLOAD_MASK {
            return Err(SombraError::Invalid("dynamic label pointer exceeds 35 bits"));
        }
        Ok(Self(DYNAMIC_FLAG | ptr.0))
    }

    /// Validates a raw field read from a record.
    pub fn from_raw(raw: u64) -> Result<Self> {
        if raw >> FIELD_BITS != 0 {
            return Err(SombraError::Corruption("labels field uses reserved bits"));
        }
        let field = Self(raw);
        if let LabelFieldKind::Inline { count } = field.kind() {
            if count == 0 && raw & PAYLOAD_MASK != 0 {
                return Err(SombraError::Corruption("empty labels field carries payload"));
            }
        }
        Ok(field)
    }

    /// Raw 40-bit representation.
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Decodes the field header.
    pub fn kind(self) -> LabelFieldKind {
        if self.0 & DYNAMIC_FLAG != 0 {
            LabelFieldKind::Dynamic(DynRecId(self.0 & PAYLOAD_MASK))
        } else {
            LabelFieldKind::Inline {
                count: ((self.0 >> COUNT_SHIFT) & COUNT_MASK) as usize,
            }
        }
    }

    /// Appends the inline labels to `out`. Dynamic fields append nothing and
    /// must be resolved through the store instead.
    pub(crate) fn decode_inline_into(self, out: &mut Vec<LabelId>) -> Result<()> {
        let count = match self.kind() {
            LabelFieldKind::Inline { count } => count,
            LabelFieldKind::Dynamic(_) => return Ok(()),
        };
        if count == 0 {
            return Ok(());
        }
        let bits = slot_bits(count);
        let mask = (1u64 << bits) - 1;
        let payload = self.0 & PAYLOAD_MASK;
        for slot in 0..count {
            let value = (payload >> (slot as u32 * bits)) & mask;
            let label = u32::try_from(value)
                .map_err(|_| SombraError::Corruption("inline label exceeds u32"))?;
            out.push(LabelId(label));
        }
        Ok(())
    }
}

fn slot_bits(count: usize) -> u32 {
    PAYLOAD_BITS / count as u32
}
