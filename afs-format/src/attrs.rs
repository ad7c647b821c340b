//! Locating the optional attribute block.
//!
//! Producers put the `(offset, size)` descriptor either right after the entry
//! table or in the last eight bytes before the first data block. Neither
//! position is flagged in the header, so both candidates are read and the
//! first one that is structurally plausible wins.

use crate::layout::ATTRIBUTE_ELEMENT_SIZE;

/// Where the attribute descriptor lives, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeMode {
    None,
    AtStart,
    AtEnd,
}

impl AttributeMode {
    pub fn has_attributes(self) -> bool {
        self != AttributeMode::None
    }
}

impl Default for AttributeMode {
    fn default() -> Self {
        AttributeMode::AtStart
    }
}

/// The `(offset, size)` pair pointing at the attribute block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct AttributeInfo {
    pub(crate) offset: u32,
    pub(crate) size: u32,
}

/// What the entry table says about the file, needed to judge a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DataBounds {
    pub(crate) file_size: u64,
    pub(crate) entry_total: u32,
    /// End of the furthest non-null data block.
    pub(crate) data_end: u64,
}

impl AttributeInfo {
    /// Whether this descriptor could describe a real attribute block: non-empty,
    /// large enough for one record per entry, and lying wholly between the end
    /// of the data and the end of the file.
    pub(crate) fn is_valid(&self, bounds: &DataBounds) -> bool {
        let offset = u64::from(self.offset);
        let size = u64::from(self.size);

        if offset == 0 || size == 0 {
            return false;
        }

        let tail = match bounds.file_size.checked_sub(bounds.data_end) {
            Some(tail) => tail,
            None => return false,
        };

        size <= tail
            && size >= u64::from(bounds.entry_total) * ATTRIBUTE_ELEMENT_SIZE
            && offset >= bounds.data_end
            && offset <= bounds.file_size - size
    }
}

/// Picks the attribute mode from the two candidate descriptors.
///
/// A candidate is `None` when it could not be read at all.
pub(crate) fn locate(
    at_start: Option<AttributeInfo>,
    at_end: Option<AttributeInfo>,
    bounds: &DataBounds,
) -> (AttributeMode, Option<AttributeInfo>) {
    let valid = |candidate: Option<AttributeInfo>| candidate.filter(|x| x.is_valid(bounds));

    if let Some(info) = valid(at_start) {
        (AttributeMode::AtStart, Some(info))
    } else if let Some(info) = valid(at_end) {
        (AttributeMode::AtEnd, Some(info))
    } else {
        (AttributeMode::None, None)
    }
}
