//! Alignment arithmetic and the fixed sizes of the AFS layout.

/// Size of the signature word plus the entry count.
pub const HEADER_SIZE: u64 = 0x8;

/// Size of one `(offset, size)` record in the entry table.
pub const ENTRY_INFO_SIZE: u64 = 0x8;

/// Size of the `(offset, size)` descriptor pointing at the attribute block.
pub const ATTRIBUTE_INFO_SIZE: u64 = 0x8;

/// Size of one attribute record, null entries included.
pub const ATTRIBUTE_ELEMENT_SIZE: u64 = 0x30;

/// Length of the name field inside an attribute record.
pub const MAX_ENTRY_NAME_LENGTH: usize = 0x20;

/// Every data block, and the end of the file, lands on this boundary.
pub const ALIGNMENT_SIZE: u64 = 0x800;

/// Smallest accepted entry block alignment.
pub const MIN_ENTRY_BLOCK_ALIGNMENT: u32 = 0x800;

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be non-zero. Values already on a boundary are returned unchanged.
#[inline]
pub const fn pad(value: u64, alignment: u64) -> u64 {
    let diff = value % alignment;
    if diff == 0 {
        value
    } else {
        value + (alignment - diff)
    }
}

/// Offset of the first byte after the entry table for `entry_total` entries.
#[inline]
pub(crate) const fn table_end(entry_total: u32) -> u64 {
    HEADER_SIZE + ENTRY_INFO_SIZE * entry_total as u64
}

/// Whether `alignment` can be used as an entry block alignment.
#[inline]
pub(crate) const fn is_valid_entry_block_alignment(alignment: u32) -> bool {
    alignment >= MIN_ENTRY_BLOCK_ALIGNMENT && alignment.is_power_of_two()
}

/// Recovers the entry block alignment a producer used, from where the table
/// ends and where the first data block starts.
///
/// Starts at [`MIN_ENTRY_BLOCK_ALIGNMENT`] and doubles while the block would
/// still fit before `data_start`.
pub(crate) fn infer_entry_block_alignment(table_end: u64, data_start: u64) -> u32 {
    let info_end = table_end + ATTRIBUTE_INFO_SIZE;
    let mut alignment = MIN_ENTRY_BLOCK_ALIGNMENT;
    while info_end + u64::from(alignment) < data_start && alignment < (1 << 31) {
        alignment <<= 1;
    }
    alignment
}
