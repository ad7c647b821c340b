use std::path::{Path, PathBuf};

use afs_format::CancelToken;

use crate::commands::log_progress;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};

const OUTPUT_FILE: &str = "OUTPUT.AFS";

pub fn run(descriptor: PathBuf, output: Option<PathBuf>, cancel: &CancelToken) -> Result<()> {
    let archive = Descriptor::load(&descriptor)?.into_archive(&descriptor)?;

    let output = output.unwrap_or_else(|| {
        descriptor
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(OUTPUT_FILE)
    });

    let stats = archive
        .pack(&output, log_progress, cancel)
        .map_err(|source| Error::Pack {
            path: output.clone(),
            source,
        })?;

    tracing::info!(
        entries = stats.entries_written,
        bytes = stats.bytes_written,
        file_size = stats.file_size,
        "packed {}",
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::unpack;
    use crate::descriptor::METADATA_FILE;
    use afs_format::{Archive, AttributeMode, EntrySpec, Timestamp, Version};

    fn source_archive(dir: &Path, mode: AttributeMode) -> PathBuf {
        let mut archive = Archive::new();
        archive.set_version(Version::V20);
        archive.set_attribute_mode(mode);

        for (i, name) in ["DUP.BIN", "OTHER.BIN", "DUP.BIN"].iter().enumerate() {
            let source = dir.join(format!("src{}", i));
            std::fs::write(&source, vec![i as u8 + 1; 0x300 * (i + 1)]).unwrap();
            archive
                .push(EntrySpec {
                    name: name.to_string(),
                    source: Some(source),
                    size: 0x300 * (i as u32 + 1),
                    last_write_time: "2005-06-07 08:09:10".parse::<Timestamp>().unwrap(),
                    custom_data: 0xdead + i as u32,
                    is_null: false,
                })
                .unwrap();
            if i == 0 {
                archive.add_null_entry("").unwrap();
            }
        }

        let path = dir.join("DATA.AFS");
        archive.pack(&path, |_| {}, &CancelToken::new()).unwrap();
        path
    }

    fn round_trip(mode: AttributeMode) {
        let dir = tempfile::tempdir().unwrap();
        let original = source_archive(dir.path(), mode);

        unpack::run(original.clone(), None, &CancelToken::new()).unwrap();
        let unpacked = dir.path().join("UNPACK_DATA.AFS");
        let last = if mode.has_attributes() {
            "FILES/DUP_1.BIN"
        } else {
            "FILES/00000003"
        };
        assert_eq!(std::fs::read(unpacked.join(last)).unwrap(), vec![3u8; 0x900]);

        let descriptor = unpacked.join(METADATA_FILE);
        run(descriptor, None, &CancelToken::new()).unwrap();

        assert_eq!(
            std::fs::read(&original).unwrap(),
            std::fs::read(unpacked.join(OUTPUT_FILE)).unwrap()
        );
    }

    #[test]
    fn unpack_then_pack_reproduces_archive() {
        round_trip(AttributeMode::AtStart);
        round_trip(AttributeMode::AtEnd);
    }

    #[test]
    fn unpack_then_pack_without_attributes() {
        round_trip(AttributeMode::None);
    }

    #[test]
    fn descriptor_keeps_original_names() {
        let dir = tempfile::tempdir().unwrap();
        let original = source_archive(dir.path(), AttributeMode::AtStart);
        let output = dir.path().join("out");
        unpack::run(original, Some(output.clone()), &CancelToken::new()).unwrap();

        let descriptor = Descriptor::load(&output.join(METADATA_FILE)).unwrap();
        let names = descriptor
            .entries
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>();
        let sources = descriptor
            .entries
            .iter()
            .map(|e| e.source.as_deref())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["DUP.BIN", "", "OTHER.BIN", "DUP.BIN"]);
        assert_eq!(
            sources,
            vec![
                Some("FILES/DUP.BIN"),
                None,
                Some("FILES/OTHER.BIN"),
                Some("FILES/DUP_1.BIN")
            ]
        );
        assert_eq!(descriptor.entry_total, 4);
    }
}
