use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::header::AfsHeader;
use crate::layout::{table_end, ATTRIBUTE_ELEMENT_SIZE};
use crate::plan::Layout;
use crate::progress::{CancelToken, EntryProgress, PackStats};
use crate::record::{AttributeRecord, Entry, EntryRecord};
use crate::ser::{write_zeros, Serialize};
use crate::{Archive, Error, Result};

impl Archive {
    /// Writes this archive to `destination`, replacing any existing file.
    ///
    /// `progress` receives a `Started` and a `Done` event for every entry
    /// slot. `cancel` is checked after each entry; on cancellation the file is
    /// left partially written and [`Error::Cancelled`] is returned.
    pub fn pack<P, F>(&self, destination: P, progress: F, cancel: &CancelToken) -> Result<PackStats>
    where
        P: AsRef<Path>,
        F: FnMut(EntryProgress<'_>),
    {
        let destination = destination.as_ref();
        let layout = self.plan()?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(destination)
            .map_err(|e| Error::CreateFailed(e, destination.to_path_buf()))?;

        tracing::info!(
            destination = %destination.display(),
            entry_total = self.entry_total(),
            "packing archive"
        );

        let mut writer = BufWriter::new(file);
        let stats = self.pack_with_layout(&mut writer, &layout, progress, cancel)?;
        writer
            .flush()
            .map_err(|e| Error::WriteFailed(e, "archive"))?;

        tracing::info!(
            destination = %destination.display(),
            bytes = stats.bytes_written,
            file_size = format_args!("{:#x}", stats.file_size),
            "packed archive"
        );
        Ok(stats)
    }

    /// Like [`Archive::pack`], but into any seekable writer.
    pub fn pack_to<W, F>(&self, writer: &mut W, progress: F, cancel: &CancelToken) -> Result<PackStats>
    where
        W: Write + Seek,
        F: FnMut(EntryProgress<'_>),
    {
        let layout = self.plan()?;
        self.pack_with_layout(writer, &layout, progress, cancel)
    }

    fn pack_with_layout<W, F>(
        &self,
        writer: &mut W,
        layout: &Layout,
        mut progress: F,
        cancel: &CancelToken,
    ) -> Result<PackStats>
    where
        W: Write + Seek,
        F: FnMut(EntryProgress<'_>),
    {
        let total = self.entry_total();
        let mut stats = PackStats::default();

        writer
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::WriteFailed(e, "header"))?;
        AfsHeader::new(self.version, total).write(writer)?;
        for record in layout.records.iter() {
            record.write(writer)?;
        }
        write_zeros(
            writer,
            u64::from(layout.first_entry_offset) - table_end(total),
            "header padding",
        )?;

        if let Some(position) = layout.descriptor_position(self.attribute_mode) {
            writer
                .seek(SeekFrom::Start(position))
                .map_err(|e| Error::WriteFailed(e, "attribute descriptor"))?;
            layout.attributes.write(writer)?;
        }

        for (i, (entry, record)) in self.entries.iter().zip(layout.records.iter()).enumerate() {
            let index = i as u32 + 1;
            progress(EntryProgress::Started {
                total,
                index,
                name: &entry.name,
            });

            if !entry.is_null {
                stats.bytes_written += copy_entry(writer, entry, record, index)?;
            }
            stats.entries_written += 1;

            progress(EntryProgress::Done {
                total,
                index,
                name: &entry.name,
            });

            if cancel.is_cancelled() {
                tracing::debug!(index, total, "packing cancelled");
                return Err(Error::Cancelled);
            }
        }

        if self.attribute_mode.has_attributes() {
            writer
                .seek(SeekFrom::Start(u64::from(layout.attributes.offset)))
                .map_err(|e| Error::WriteFailed(e, "attribute block"))?;
            for entry in self.entries.iter() {
                if entry.is_null {
                    write_zeros(writer, ATTRIBUTE_ELEMENT_SIZE, "attribute block")?;
                } else {
                    AttributeRecord::from_entry(entry).write(writer)?;
                }
            }
        }

        writer
            .seek(SeekFrom::Start(layout.content_end))
            .map_err(|e| Error::WriteFailed(e, "trailing padding"))?;
        write_zeros(
            writer,
            layout.file_size - layout.content_end,
            "trailing padding",
        )?;

        stats.file_size = layout.file_size;
        Ok(stats)
    }
}

/// Copies exactly `record.size` bytes from the entry's source to its planned
/// offset. The source is opened and closed within this call.
fn copy_entry<W: Write + Seek>(
    writer: &mut W,
    entry: &Entry,
    record: &EntryRecord,
    index: u32,
) -> Result<u64> {
    let source = entry.source.as_ref().ok_or_else(|| Error::MissingSource {
        index,
        name: entry.name.clone(),
    })?;
    let file = File::open(source).map_err(|e| Error::OpenFailed(e, source.clone()))?;

    writer
        .seek(SeekFrom::Start(u64::from(record.offset)))
        .map_err(|e| Error::WriteFailed(e, "entry data"))?;

    let size = u64::from(record.size);
    let copied = std::io::copy(&mut BufReader::new(file).take(size), writer)
        .map_err(|e| Error::CopyFailed(e, entry.name.clone()))?;
    if copied != size {
        return Err(Error::CopyFailed(
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("source ended after {} of {} bytes", copied, size),
            ),
            entry.name.clone(),
        ));
    }

    tracing::debug!(
        index,
        name = %entry.name,
        offset = format_args!("{:#x}", record.offset),
        bytes = size,
        "packed entry"
    );
    Ok(size)
}
