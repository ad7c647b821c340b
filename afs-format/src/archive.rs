use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::attrs::{locate, AttributeInfo, AttributeMode, DataBounds};
use crate::de::DeserializeOwned;
use crate::header::{AfsHeader, Version};
use crate::layout::{
    infer_entry_block_alignment, is_valid_entry_block_alignment, table_end,
    ATTRIBUTE_ELEMENT_SIZE, ATTRIBUTE_INFO_SIZE, MIN_ENTRY_BLOCK_ALIGNMENT,
};
use crate::plan::Layout;
use crate::record::{AttributeRecord, Entry, EntryRecord, EntrySpec, Timestamp};
use crate::{Error, Result};

/// In-memory structure of one AFS container.
///
/// Built either empty, with entries appended for packing, or by parsing an
/// existing file for unpacking. The archive owns its entries; entries only
/// point at the files their bytes live in.
#[derive(Debug, Clone)]
pub struct Archive {
    pub(crate) version: Version,
    pub(crate) attribute_mode: AttributeMode,
    pub(crate) entry_block_alignment: u32,
    pub(crate) entries: Vec<Entry>,
    pub(crate) path: Option<PathBuf>,
}

impl Default for Archive {
    fn default() -> Self {
        Archive {
            version: Version::V0,
            attribute_mode: AttributeMode::AtStart,
            entry_block_alignment: MIN_ENTRY_BLOCK_ALIGNMENT,
            entries: vec![],
            path: None,
        }
    }
}

impl Archive {
    /// An empty archive: version 0, attributes described right after the
    /// entry table, entry block alignment 0x800.
    pub fn new() -> Archive {
        Archive::default()
    }

    /// Opens and parses an `.afs` file. Every entry keeps `path` as its source.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Archive> {
        let path = path.as_ref();
        let path =
            std::fs::canonicalize(path).map_err(|e| Error::OpenFailed(e, path.to_path_buf()))?;
        let file = File::open(&path).map_err(|e| Error::OpenFailed(e, path.clone()))?;

        let mut archive = Archive::read_inner(&mut BufReader::new(file), Some(&path))?;
        archive.path = Some(path);
        Ok(archive)
    }

    /// Parses an archive from any seekable reader. Entries have no source, so
    /// the result can be inspected but not unpacked.
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Archive> {
        Archive::read_inner(reader, None)
    }

    fn read_inner<R: Read + Seek>(reader: &mut R, source: Option<&Path>) -> Result<Archive> {
        let file_size = reader
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::ReadFailed(e, "file size"))?;
        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::ReadFailed(e, "header"))?;

        let header = AfsHeader::deserialize_owned(reader)?;
        let entry_total = header.entry_total;

        let capacity = u64::from(entry_total).min(file_size / 8) as usize;
        let mut records = Vec::with_capacity(capacity);
        let mut data_start: Option<u64> = None;
        let mut data_end = 0u64;

        for _ in 0..entry_total {
            let record = EntryRecord::deserialize_owned(reader)?;
            if !record.is_null() {
                let offset = u64::from(record.offset);
                data_start = Some(data_start.map_or(offset, |x| x.min(offset)));
                data_end = data_end.max(record.end());
            }
            records.push(record);
        }

        let table_end = table_end(entry_total);
        let data_start = data_start.unwrap_or(0);
        let entry_block_alignment = infer_entry_block_alignment(table_end, data_start);

        let bounds = DataBounds {
            file_size,
            entry_total,
            data_end,
        };

        let at_start = <Option<AttributeInfo>>::deserialize_owned(reader)?;
        let at_end = if data_start >= table_end + ATTRIBUTE_INFO_SIZE {
            reader
                .seek(SeekFrom::Start(data_start - ATTRIBUTE_INFO_SIZE))
                .map_err(|e| Error::ReadFailed(e, "attribute descriptor"))?;
            <Option<AttributeInfo>>::deserialize_owned(reader)?
        } else {
            None
        };

        let (attribute_mode, info) = locate(at_start, at_end, &bounds);

        tracing::debug!(
            version = %header.version,
            entry_total,
            data_start = format_args!("{:#x}", data_start),
            data_end = format_args!("{:#x}", data_end),
            entry_block_alignment = format_args!("{:#x}", entry_block_alignment),
            ?attribute_mode,
            "deserialized entry table"
        );

        let source = source.map(Path::to_path_buf);
        let mut entries = records
            .into_iter()
            .map(|record| Entry {
                source: source.clone(),
                offset: record.offset,
                size: if record.is_null() { 0 } else { record.size },
                name: String::new(),
                last_write_time: Timestamp::default(),
                custom_data: 0,
                is_null: record.is_null(),
            })
            .collect::<Vec<_>>();

        match info {
            Some(info) => {
                reader
                    .seek(SeekFrom::Start(u64::from(info.offset)))
                    .map_err(|e| Error::ReadFailed(e, "attribute block"))?;

                for entry in entries.iter_mut() {
                    if entry.is_null {
                        reader
                            .seek(SeekFrom::Current(ATTRIBUTE_ELEMENT_SIZE as i64))
                            .map_err(|e| Error::ReadFailed(e, "attribute block"))?;
                        entry.last_write_time = Timestamp::NULL_ENTRY;
                        continue;
                    }

                    let record = AttributeRecord::deserialize_owned(reader)?;
                    entry.name = record.name();
                    entry.last_write_time = record.last_write_time;
                    entry.custom_data = record.custom_data;
                }
            }
            None => {
                tracing::warn!("no attribute block found, naming entries by index");
                for (i, entry) in entries.iter_mut().enumerate() {
                    entry.name = format!("{:08}", i);
                }
            }
        }

        Ok(Archive {
            version: header.version,
            attribute_mode,
            entry_block_alignment,
            entries,
            path: None,
        })
    }

    /// The file this archive was opened from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn attribute_mode(&self) -> AttributeMode {
        self.attribute_mode
    }

    pub fn set_attribute_mode(&mut self, mode: AttributeMode) {
        self.attribute_mode = mode;
    }

    pub fn entry_block_alignment(&self) -> u32 {
        self.entry_block_alignment
    }

    pub fn set_entry_block_alignment(&mut self, alignment: u32) -> Result<()> {
        if !is_valid_entry_block_alignment(alignment) {
            return Err(Error::InvalidAlignment(alignment));
        }
        self.entry_block_alignment = alignment;
        Ok(())
    }

    /// Number of entry slots, null entries included.
    pub fn entry_total(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entries can be edited in place, but not added or removed this way.
    pub fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    /// Appends one entry described by the caller.
    pub fn push(&mut self, spec: EntrySpec) -> Result<()> {
        if self.entries.len() >= u32::MAX as usize {
            return Err(Error::TooLarge);
        }
        self.entries.push(Entry::from_spec(spec));
        Ok(())
    }

    pub fn add_null_entry<S: Into<String>>(&mut self, name: S) -> Result<()> {
        self.push(EntrySpec::null(name))
    }

    /// Appends the file at `source`, sized from the file itself.
    ///
    /// `name` defaults to the file name and `last_write_time` to now. The
    /// custom data field is set to the file size, and an empty file becomes a
    /// null entry.
    pub fn add_entry_from_path<P: AsRef<Path>>(
        &mut self,
        source: P,
        name: Option<String>,
        last_write_time: Option<Timestamp>,
    ) -> Result<()> {
        let source = source.as_ref();
        let metadata =
            std::fs::metadata(source).map_err(|e| Error::OpenFailed(e, source.to_path_buf()))?;
        let size = u32::try_from(metadata.len()).map_err(|_| Error::TooLarge)?;

        let name = name.unwrap_or_else(|| {
            source
                .file_name()
                .map(|x| x.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        self.push(EntrySpec {
            name,
            source: Some(source.to_path_buf()),
            size,
            last_write_time: last_write_time.unwrap_or_else(Timestamp::now),
            custom_data: size,
            is_null: size == 0,
        })
    }

    /// Computes where everything will go if this archive is packed now.
    pub fn plan(&self) -> Result<Layout> {
        Layout::plan(
            &self.entries,
            self.entry_block_alignment,
            self.attribute_mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scenario_bytes(file_size: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; file_size];
        bytes[..8].copy_from_slice(&[0x41, 0x46, 0x53, 0x00, 0x02, 0x00, 0x00, 0x00]);
        bytes[0x10..0x14].copy_from_slice(&0x800u32.to_le_bytes());
        bytes[0x14..0x18].copy_from_slice(&10u32.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_header_with_null_entry() {
        let archive = Archive::read_from(&mut Cursor::new(scenario_bytes(0x1000))).unwrap();
        assert_eq!(archive.version(), Version::V0);
        assert_eq!(archive.entry_total(), 2);

        let entries = archive.entries();
        assert!(entries[0].is_null());
        assert_eq!(entries[0].offset(), 0);
        assert!(!entries[1].is_null());
        assert_eq!(entries[1].offset(), 0x800);
        assert_eq!(entries[1].size(), 10);

        assert_eq!(archive.attribute_mode(), AttributeMode::None);
        assert_eq!(archive.entry_block_alignment(), 0x800);
        assert_eq!(entries[0].name(), "00000000");
        assert_eq!(entries[1].name(), "00000001");
    }

    #[test]
    fn parses_table_without_trailing_data() {
        let archive = Archive::read_from(&mut Cursor::new(scenario_bytes(0x18))).unwrap();
        assert_eq!(archive.entry_total(), 2);
        assert_eq!(archive.attribute_mode(), AttributeMode::None);
    }

    #[test]
    fn finds_descriptor_before_first_block() {
        let mut bytes = scenario_bytes(0x1000);
        // (attrOffset, attrSize) at dataStart - 8, pointing past the data.
        bytes[0x7f8..0x7fc].copy_from_slice(&0x80au32.to_le_bytes());
        bytes[0x7fc..0x800].copy_from_slice(&0x60u32.to_le_bytes());
        bytes[0x83a..0x83e].copy_from_slice(b"BODY");
        bytes[0x85a..0x85c].copy_from_slice(&2001u16.to_le_bytes());
        bytes[0x866..0x86a].copy_from_slice(&7u32.to_le_bytes());

        let archive = Archive::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(archive.attribute_mode(), AttributeMode::AtEnd);

        let entry = &archive.entries()[1];
        assert_eq!(entry.name(), "BODY");
        assert_eq!(entry.last_write_time().year, 2001);
        assert_eq!(entry.custom_data(), 7);
        assert_eq!(archive.entries()[0].name(), "");
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = scenario_bytes(0x1000);
        bytes[0] = b'Z';
        match Archive::read_from(&mut Cursor::new(bytes)) {
            Err(Error::InvalidSignature(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_version() {
        let mut bytes = scenario_bytes(0x1000);
        bytes[3] = 0x30;
        match Archive::read_from(&mut Cursor::new(bytes)) {
            Err(Error::InvalidVersion(0x30)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncated_table_is_an_io_error() {
        let bytes = scenario_bytes(0x12);
        let err = Archive::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_io(), "{:?}", err);
    }

    #[test]
    fn alignment_setter_validates() {
        let mut archive = Archive::new();
        assert!(archive.set_entry_block_alignment(0x2000).is_ok());
        assert_eq!(archive.entry_block_alignment(), 0x2000);
        match archive.set_entry_block_alignment(0x900) {
            Err(Error::InvalidAlignment(0x900)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn add_entry_from_path_sizes_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full.bin");
        let empty = dir.path().join("empty.bin");
        std::fs::write(&full, b"0123456789").unwrap();
        std::fs::write(&empty, b"").unwrap();

        let mut archive = Archive::new();
        archive.add_entry_from_path(&full, None, None).unwrap();
        archive
            .add_entry_from_path(&empty, Some("EMPTY".into()), None)
            .unwrap();
        archive.add_null_entry("GAP").unwrap();

        let entries = archive.entries();
        assert_eq!(archive.entry_total(), 3);
        assert_eq!(entries[0].name(), "full.bin");
        assert_eq!(entries[0].size(), 10);
        assert_eq!(entries[0].custom_data(), 10);
        assert!(!entries[0].is_null());
        assert!(entries[1].is_null());
        assert_eq!(entries[1].name(), "EMPTY");
        assert_eq!(entries[2].last_write_time(), Timestamp::NULL_ENTRY);
    }
}
