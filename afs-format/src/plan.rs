//! Output layout of a new archive, computed before any byte is written.
//!
//! The entry table and the attribute descriptor both sit in front of the data
//! but depend on every entry's size, so the whole file is planned in a single
//! forward pass and the packer then only follows the plan.

use crate::attrs::{AttributeInfo, AttributeMode};
use crate::layout::{
    pad, table_end, ALIGNMENT_SIZE, ATTRIBUTE_ELEMENT_SIZE, ATTRIBUTE_INFO_SIZE,
};
use crate::record::{Entry, EntryRecord};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub(crate) first_entry_offset: u32,
    pub(crate) records: Vec<EntryRecord>,
    pub(crate) attributes: AttributeInfo,
    /// End of the last byte written before trailing padding.
    pub(crate) content_end: u64,
    pub(crate) file_size: u64,
}

#[inline]
fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::TooLarge)
}

impl Layout {
    pub(crate) fn plan(
        entries: &[Entry],
        entry_block_alignment: u32,
        mode: AttributeMode,
    ) -> Result<Layout> {
        let entry_total = to_u32(entries.len() as u64)?;

        let first_entry_offset = pad(
            table_end(entry_total) + ATTRIBUTE_INFO_SIZE,
            u64::from(entry_block_alignment),
        );

        let mut cursor = first_entry_offset;
        let mut data_end = first_entry_offset;
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.is_null {
                records.push(EntryRecord::NULL);
                continue;
            }

            let record = EntryRecord {
                offset: to_u32(cursor)?,
                size: entry.size,
            };
            data_end = record.end();
            cursor = pad(data_end, ALIGNMENT_SIZE);
            records.push(record);
        }

        let attributes = AttributeInfo {
            offset: to_u32(cursor)?,
            size: to_u32(u64::from(entry_total) * ATTRIBUTE_ELEMENT_SIZE)?,
        };

        let end = if mode.has_attributes() {
            let end = cursor + u64::from(attributes.size);
            to_u32(end)?;
            end
        } else {
            data_end
        };

        let layout = Layout {
            first_entry_offset: to_u32(first_entry_offset)?,
            records,
            attributes,
            content_end: end,
            file_size: pad(end, ALIGNMENT_SIZE),
        };

        tracing::debug!(
            first_entry_offset = format_args!("{:#x}", layout.first_entry_offset),
            attributes_offset = format_args!("{:#x}", layout.attributes.offset),
            file_size = format_args!("{:#x}", layout.file_size),
            entry_total,
            "planned layout"
        );

        Ok(layout)
    }

    /// Where the first data block starts.
    pub fn first_entry_offset(&self) -> u32 {
        self.first_entry_offset
    }

    /// Planned data offset of every entry, in order. Null entries get zero.
    pub fn offsets(&self) -> impl Iterator<Item = u32> + '_ {
        self.records.iter().map(|r| r.offset)
    }

    /// Where the attribute block starts, right after the last data block.
    pub fn attributes_offset(&self) -> u32 {
        self.attributes.offset
    }

    /// Final length of the packed file, including trailing padding.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Where the attribute descriptor is written for `mode`.
    pub(crate) fn descriptor_position(&self, mode: AttributeMode) -> Option<u64> {
        match mode {
            AttributeMode::None => None,
            AttributeMode::AtStart => Some(table_end(self.records.len() as u32)),
            AttributeMode::AtEnd => {
                Some(u64::from(self.first_entry_offset) - ATTRIBUTE_INFO_SIZE)
            }
        }
    }
}
