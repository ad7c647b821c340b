//! The `METADATA.json` sidecar written next to unpacked files, describing
//! everything needed to pack them back into an identical archive.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use afs_format::{Archive, AttributeMode, EntrySpec, Error as FormatError, Timestamp, Version};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const METADATA_FILE: &str = "METADATA.json";
pub const FILES_DIR: &str = "FILES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    V0,
    V20,
}

impl From<Version> for FormatVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::V0 => FormatVersion::V0,
            Version::V20 => FormatVersion::V20,
        }
    }
}

impl From<FormatVersion> for Version {
    fn from(version: FormatVersion) -> Self {
        match version {
            FormatVersion::V0 => Version::V0,
            FormatVersion::V20 => Version::V20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributesInfo {
    None,
    AtStart,
    AtEnd,
}

impl From<AttributeMode> for AttributesInfo {
    fn from(mode: AttributeMode) -> Self {
        match mode {
            AttributeMode::None => AttributesInfo::None,
            AttributeMode::AtStart => AttributesInfo::AtStart,
            AttributeMode::AtEnd => AttributesInfo::AtEnd,
        }
    }
}

impl From<AttributesInfo> for AttributeMode {
    fn from(info: AttributesInfo) -> Self {
        match info {
            AttributesInfo::None => AttributeMode::None,
            AttributesInfo::AtStart => AttributeMode::AtStart,
            AttributesInfo::AtEnd => AttributeMode::AtEnd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorEntry {
    pub is_null: bool,
    /// Relative to the descriptor's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub name: String,
    pub last_write_time: String,
    /// Defaults to the source file's size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub version: FormatVersion,
    pub attributes_info: AttributesInfo,
    pub entry_block_alignment: u32,
    pub entry_total: u32,
    pub entries: Vec<DescriptorEntry>,
}

impl Descriptor {
    /// Describes `archive` as unpacked into `FILES/`. `names` holds the name
    /// to record for each entry, which may differ from the extracted file
    /// name when duplicates were renamed.
    pub fn from_archive(archive: &Archive, names: &[String]) -> Descriptor {
        let entries = archive
            .entries()
            .iter()
            .zip(names)
            .map(|(entry, name)| DescriptorEntry {
                is_null: entry.is_null(),
                source: if entry.is_null() {
                    None
                } else {
                    Some(format!("{}/{}", FILES_DIR, entry.name()))
                },
                name: name.clone(),
                last_write_time: entry.last_write_time().to_string(),
                custom_data: Some(entry.custom_data()),
            })
            .collect();

        Descriptor {
            version: archive.version().into(),
            attributes_info: archive.attribute_mode().into(),
            entry_block_alignment: archive.entry_block_alignment(),
            entry_total: archive.entry_total(),
            entries,
        }
    }

    pub fn load(path: &Path) -> Result<Descriptor> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadDescriptor {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::ParseDescriptor {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::CreateFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|source| {
            Error::WriteDescriptor {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Builds the archive to pack. `path` is where this descriptor was read
    /// from; entry sources are resolved against its directory.
    pub fn into_archive(self, path: &Path) -> Result<Archive> {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let invalid = |source| Error::InvalidDescriptor {
            path: path.to_path_buf(),
            source,
        };

        let mut archive = Archive::new();
        archive.set_version(self.version.into());
        archive.set_attribute_mode(self.attributes_info.into());
        archive
            .set_entry_block_alignment(self.entry_block_alignment)
            .map_err(invalid)?;

        if self.entry_total as usize != self.entries.len() {
            tracing::warn!(
                entry_total = self.entry_total,
                entries = self.entries.len(),
                "descriptor entry count mismatch, using the listed entries"
            );
        }

        let has_attributes = self.attributes_info != AttributesInfo::None;
        for (index, entry) in self.entries.into_iter().enumerate() {
            let spec = entry_spec(entry, index, base, has_attributes).map_err(|e| match e {
                SpecError::Format(source) => Error::InvalidEntry {
                    path: path.to_path_buf(),
                    index,
                    source,
                },
                SpecError::Source(path, source) => Error::SourceFile { path, source },
            })?;
            archive.push(spec).map_err(invalid)?;
        }

        Ok(archive)
    }
}

enum SpecError {
    Format(FormatError),
    Source(PathBuf, std::io::Error),
}

fn entry_spec(
    entry: DescriptorEntry,
    index: usize,
    base: &Path,
    has_attributes: bool,
) -> std::result::Result<EntrySpec, SpecError> {
    if entry.is_null {
        return Ok(EntrySpec::null(entry.name));
    }

    // Times are only stored alongside attributes.
    let last_write_time = if has_attributes {
        Timestamp::parse_raw(&entry.last_write_time).map_err(SpecError::Format)?
    } else {
        Timestamp::default()
    };
    let source = match entry.source {
        Some(source) => base.join(source),
        None => {
            return Err(SpecError::Format(FormatError::MissingSource {
                index: index as u32 + 1,
                name: entry.name,
            }))
        }
    };

    let len = std::fs::metadata(&source)
        .map_err(|e| SpecError::Source(source.clone(), e))?
        .len();
    let size = u32::try_from(len).map_err(|_| SpecError::Format(FormatError::TooLarge))?;

    Ok(EntrySpec {
        name: entry.name,
        source: Some(source),
        size,
        last_write_time,
        custom_data: entry.custom_data.unwrap_or(size),
        is_null: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "version": "v20",
        "attributes_info": "at_end",
        "entry_block_alignment": 4096,
        "entry_total": 2,
        "entries": [
            {
                "is_null": false,
                "source": "FILES/LEVEL1.BIN",
                "name": "LEVEL1.BIN",
                "last_write_time": "2001-02-03 04:05:06"
            },
            {
                "is_null": true,
                "name": "",
                "last_write_time": "2000-01-01 00:00:00",
                "custom_data": 0
            }
        ]
    }"#;

    #[test]
    fn parses_and_builds_archive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(FILES_DIR)).unwrap();
        std::fs::write(dir.path().join("FILES/LEVEL1.BIN"), b"0123456789").unwrap();
        let path = dir.path().join(METADATA_FILE);
        std::fs::write(&path, JSON).unwrap();

        let descriptor = Descriptor::load(&path).unwrap();
        assert_eq!(descriptor.version, FormatVersion::V20);
        assert_eq!(descriptor.attributes_info, AttributesInfo::AtEnd);
        assert_eq!(descriptor.entries[0].custom_data, None);

        let archive = descriptor.into_archive(&path).unwrap();
        assert_eq!(archive.version(), Version::V20);
        assert_eq!(archive.attribute_mode(), AttributeMode::AtEnd);
        assert_eq!(archive.entry_block_alignment(), 0x1000);

        let entries = archive.entries();
        assert_eq!(entries[0].size(), 10);
        assert_eq!(entries[0].custom_data(), 10);
        assert_eq!(entries[0].last_write_time().to_string(), "2001-02-03 04:05:06");
        assert!(entries[1].is_null());
    }

    #[test]
    fn bad_timestamp_names_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE);
        std::fs::write(&path, JSON.replace("2001-02-03 04:05:06", "yesterday")).unwrap();

        match Descriptor::load(&path).unwrap().into_archive(&path) {
            Err(Error::InvalidEntry {
                index: 0,
                source: FormatError::TimestampParse { .. },
                ..
            }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn keeps_impossible_dates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(FILES_DIR)).unwrap();
        std::fs::write(dir.path().join("FILES/LEVEL1.BIN"), b"0123456789").unwrap();
        let path = dir.path().join(METADATA_FILE);
        let json = JSON.replace("2001-02-03 04:05:06", "2001-13-00 24:00:00");
        std::fs::write(&path, json).unwrap();

        let archive = Descriptor::load(&path).unwrap().into_archive(&path).unwrap();
        assert_eq!(
            archive.entries()[0].last_write_time().to_string(),
            "2001-13-00 24:00:00"
        );
    }

    #[test]
    fn times_are_ignored_without_attributes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(FILES_DIR)).unwrap();
        std::fs::write(dir.path().join("FILES/LEVEL1.BIN"), b"0123456789").unwrap();
        let path = dir.path().join(METADATA_FILE);
        let json = JSON
            .replace("\"at_end\"", "\"none\"")
            .replace("2001-02-03 04:05:06", "not a time");
        std::fs::write(&path, json).unwrap();

        let archive = Descriptor::load(&path).unwrap().into_archive(&path).unwrap();
        assert_eq!(archive.attribute_mode(), AttributeMode::None);
        assert_eq!(archive.entries()[0].last_write_time(), Timestamp::default());
    }

    #[test]
    fn serializes_snake_case_fields() {
        let descriptor = Descriptor {
            version: FormatVersion::V0,
            attributes_info: AttributesInfo::AtStart,
            entry_block_alignment: 0x800,
            entry_total: 1,
            entries: vec![DescriptorEntry {
                is_null: true,
                source: None,
                name: "GAP".into(),
                last_write_time: "2000-01-01 00:00:00".into(),
                custom_data: None,
            }],
        };

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["version"], "v0");
        assert_eq!(value["attributes_info"], "at_start");
        assert_eq!(value["entries"][0]["name"], "GAP");
        assert!(value["entries"][0].get("source").is_none());
    }
}
