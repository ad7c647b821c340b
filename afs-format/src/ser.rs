use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::attrs::AttributeInfo;
use crate::header::AfsHeader;
use crate::record::{AttributeRecord, EntryRecord, Timestamp};
use crate::{Error, Result};

pub(crate) trait Serialize {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()>;
}

impl Serialize for AfsHeader {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        writer
            .write_u32::<LittleEndian>(self.signature())
            .and_then(|_| writer.write_u32::<LittleEndian>(self.entry_total))
            .map_err(|e| Error::WriteFailed(e, "header"))
    }
}

impl Serialize for EntryRecord {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        writer
            .write_u32::<LittleEndian>(self.offset)
            .and_then(|_| writer.write_u32::<LittleEndian>(self.size))
            .map_err(|e| Error::WriteFailed(e, "entry table"))
    }
}

impl Serialize for AttributeInfo {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        writer
            .write_u32::<LittleEndian>(self.offset)
            .and_then(|_| writer.write_u32::<LittleEndian>(self.size))
            .map_err(|e| Error::WriteFailed(e, "attribute descriptor"))
    }
}

impl Serialize for Timestamp {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ]
        .iter()
        .try_for_each(|field| writer.write_u16::<LittleEndian>(*field))
        .map_err(|e| Error::WriteFailed(e, "last write time"))
    }
}

impl Serialize for AttributeRecord {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        writer
            .write_all(&self.name)
            .map_err(|e| Error::WriteFailed(e, "entry name"))?;
        self.last_write_time.write(writer)?;
        writer
            .write_u32::<LittleEndian>(self.custom_data)
            .map_err(|e| Error::WriteFailed(e, "custom data"))
    }
}

/// Writes `len` zero bytes at the current position.
pub(crate) fn write_zeros<W: Write>(writer: &mut W, len: u64, what: &'static str) -> Result<()> {
    std::io::copy(&mut std::io::repeat(0).take(len), writer)
        .map(|_| ())
        .map_err(|e| Error::WriteFailed(e, what))
}
