use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use crate::progress::{CancelToken, EntryProgress, UnpackStats};
use crate::record::Entry;
use crate::{Archive, Error, Result};

impl Archive {
    /// Extracts every non-null entry to `<destination>/<name>`.
    ///
    /// `destination` must already exist. `progress` receives a `Started` and a
    /// `Done` event for every entry slot, null entries included, which are not
    /// written. `cancel` is checked after each entry; files extracted before
    /// cancellation are left in place.
    pub fn unpack<P, F>(
        &self,
        destination: P,
        mut progress: F,
        cancel: &CancelToken,
    ) -> Result<UnpackStats>
    where
        P: AsRef<Path>,
        F: FnMut(EntryProgress<'_>),
    {
        let destination = destination.as_ref();
        let total = self.entry_total();
        let mut stats = UnpackStats::default();

        tracing::info!(
            destination = %destination.display(),
            entry_total = total,
            "unpacking archive"
        );

        for (i, entry) in self.entries.iter().enumerate() {
            let index = i as u32 + 1;
            progress(EntryProgress::Started {
                total,
                index,
                name: &entry.name,
            });

            if entry.is_null {
                stats.null_entries += 1;
            } else {
                stats.bytes_written += extract_entry(entry, index, destination)?;
                stats.files_extracted += 1;
            }

            progress(EntryProgress::Done {
                total,
                index,
                name: &entry.name,
            });

            if cancel.is_cancelled() {
                tracing::debug!(index, total, "unpacking cancelled");
                return Err(Error::Cancelled);
            }
        }

        tracing::info!(
            destination = %destination.display(),
            files = stats.files_extracted,
            bytes = stats.bytes_written,
            "unpacked archive"
        );
        Ok(stats)
    }
}

/// Resolves where an entry is written, refusing names that would leave the
/// destination directory.
fn output_path(destination: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(file_name)), None) => Ok(destination.join(file_name)),
        _ => Err(Error::InvalidName(name.to_string())),
    }
}

fn extract_entry(entry: &Entry, index: u32, destination: &Path) -> Result<u64> {
    let path = output_path(destination, &entry.name)?;
    let source = entry.source.as_ref().ok_or_else(|| Error::MissingSource {
        index,
        name: entry.name.clone(),
    })?;

    let mut reader =
        BufReader::new(File::open(source).map_err(|e| Error::OpenFailed(e, source.clone()))?);
    reader
        .seek(SeekFrom::Start(u64::from(entry.offset)))
        .map_err(|e| Error::ReadFailed(e, "entry data"))?;

    let out = File::create(&path).map_err(|e| Error::CreateFailed(e, path.clone()))?;
    let mut writer = BufWriter::new(out);

    let size = u64::from(entry.size);
    let copied = std::io::copy(&mut reader.take(size), &mut writer)
        .and_then(|copied| writer.flush().map(|_| copied))
        .map_err(|e| Error::CopyFailed(e, entry.name.clone()))?;
    if copied != size {
        return Err(Error::CopyFailed(
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("archive ended after {} of {} bytes", copied, size),
            ),
            entry.name.clone(),
        ));
    }

    tracing::debug!(
        index,
        name = %entry.name,
        offset = format_args!("{:#x}", entry.offset),
        bytes = size,
        "extracted entry"
    );
    Ok(size)
}
