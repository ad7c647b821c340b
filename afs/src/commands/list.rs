use std::path::PathBuf;

use afs_format::Archive;
use humansize::{file_size_opts as options, FileSize};

use crate::error::{Error, Result};

pub fn run(path: PathBuf) -> Result<()> {
    let archive = Archive::open(&path).map_err(|source| Error::OpenArchive {
        path: path.clone(),
        source,
    })?;

    println!(
        "AFS {}, {} entries, attributes {:?}, entry block alignment {:#x}",
        archive.version(),
        archive.entry_total(),
        archive.attribute_mode(),
        archive.entry_block_alignment()
    );
    println!();
    println!("   Index  Offset      Length         Last write           Custom      Name");
    println!(
        "--------  ----------  -------------  -------------------  ----------  --------"
    );

    for (i, entry) in archive.entries().iter().enumerate() {
        if entry.is_null() {
            println!(
                "{:>8}  {:>10}  {:>13}  {:<19}  {:>10}  {}",
                i, "-", "<null>", entry.last_write_time(), "-", entry.name()
            );
            continue;
        }

        let length = entry
            .size()
            .file_size(options::BINARY)
            .unwrap_or_else(|_| entry.size().to_string());
        println!(
            "{:>8}  {:#010x}  {:>13}  {:<19}  {:>10}  {}",
            i,
            entry.offset(),
            length,
            entry.last_write_time(),
            entry.custom_data(),
            entry.name()
        );
    }

    Ok(())
}
