use std::collections::HashSet;
use std::path::{Path, PathBuf};

use afs_format::{Archive, CancelToken};

use crate::commands::log_progress;
use crate::descriptor::{Descriptor, FILES_DIR, METADATA_FILE};
use crate::error::{Error, Result};

pub fn run(path: PathBuf, output: Option<PathBuf>, cancel: &CancelToken) -> Result<()> {
    let mut archive = Archive::open(&path).map_err(|source| Error::OpenArchive {
        path: path.clone(),
        source,
    })?;

    let output = output.unwrap_or_else(|| default_output(&path));
    let files = output.join(FILES_DIR);
    std::fs::create_dir_all(&files).map_err(|source| Error::CreateDirectory {
        path: files.clone(),
        source,
    })?;

    let names = archive
        .entries()
        .iter()
        .map(|e| e.name().to_string())
        .collect::<Vec<_>>();

    let unique = disambiguate(
        archive
            .entries()
            .iter()
            .filter(|e| !e.is_null())
            .map(|e| e.name()),
    );
    for (entry, name) in archive
        .entries_mut()
        .iter_mut()
        .filter(|e| !e.is_null())
        .zip(unique)
    {
        if entry.name() != name {
            tracing::warn!(name = entry.name(), renamed = %name, "duplicate entry name");
            entry.set_name(name);
        }
    }

    let stats = archive
        .unpack(&files, log_progress, cancel)
        .map_err(|source| Error::Unpack {
            path: files.clone(),
            source,
        })?;

    Descriptor::from_archive(&archive, &names).save(&output.join(METADATA_FILE))?;

    tracing::info!(
        files = stats.files_extracted,
        null_entries = stats.null_entries,
        bytes = stats.bytes_written,
        "unpacked {}",
        output.display()
    );
    Ok(())
}

/// `UNPACK_<archive file name>` next to the archive.
fn default_output(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("UNPACK_{}", file_name))
}

/// Renames repeated names to `<stem>_<n><ext>`, counting from 1 for the
/// second occurrence and skipping any candidate already taken.
fn disambiguate<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if taken.insert(name.to_string()) {
                return name.to_string();
            }

            let (stem, ext) = match name.rfind('.') {
                Some(i) if i > 0 => name.split_at(i),
                _ => (name, ""),
            };

            let mut n = 1;
            loop {
                let candidate = format!("{}_{}{}", stem, n, ext);
                if taken.insert(candidate.clone()) {
                    break candidate;
                }
                n += 1;
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_duplicates() {
        let names = disambiguate(vec![
            "A.BIN", "A.BIN", "B", "A.BIN", "B", "A_1.BIN", ".hidden", ".hidden",
        ]);
        assert_eq!(
            names,
            vec!["A.BIN", "A_1.BIN", "B", "A_2.BIN", "B_1", "A_1_1.BIN", ".hidden", ".hidden_1"]
        );
    }

    #[test]
    fn default_output_sits_next_to_archive() {
        assert_eq!(
            default_output(Path::new("/games/DATA.AFS")),
            PathBuf::from("/games/UNPACK_DATA.AFS")
        );
        assert_eq!(
            default_output(Path::new("DATA.AFS")),
            PathBuf::from("UNPACK_DATA.AFS")
        );
    }
}
