use std::io::{Read, Seek};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::attrs::AttributeInfo;
use crate::header::AfsHeader;
use crate::layout::MAX_ENTRY_NAME_LENGTH;
use crate::record::{AttributeRecord, EntryRecord, Timestamp};
use crate::{Error, Result};

pub(crate) trait DeserializeOwned {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> Result<Self>
    where
        Self: Sized;
}

impl DeserializeOwned for AfsHeader {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let signature = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| Error::ReadFailed(e, "signature"))?;
        let version = AfsHeader::parse_signature(signature)?;
        let entry_total = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| Error::ReadFailed(e, "entry count"))?;

        tracing::debug!(%version, entry_total, "deserialized AfsHeader");

        Ok(AfsHeader {
            version,
            entry_total,
        })
    }
}

impl DeserializeOwned for EntryRecord {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut read = || {
            reader
                .read_u32::<LittleEndian>()
                .map_err(|e| Error::ReadFailed(e, "entry table"))
        };
        let offset = read()?;
        let size = read()?;
        Ok(EntryRecord { offset, size })
    }
}

impl DeserializeOwned for AttributeInfo {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut read = || {
            reader
                .read_u32::<LittleEndian>()
                .map_err(|e| Error::ReadFailed(e, "attribute descriptor"))
        };
        let offset = read()?;
        let size = read()?;
        Ok(AttributeInfo { offset, size })
    }
}

impl DeserializeOwned for Timestamp {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut fields = [0u16; 6];
        reader
            .read_u16_into::<LittleEndian>(&mut fields)
            .map_err(|e| Error::ReadFailed(e, "last write time"))?;
        let [year, month, day, hour, minute, second] = fields;
        Ok(Timestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }
}

impl DeserializeOwned for AttributeRecord {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position().unwrap_or_default();

        let mut name = [0u8; MAX_ENTRY_NAME_LENGTH];
        reader
            .read_exact(&mut name)
            .map_err(|e| Error::ReadFailed(e, "entry name"))?;
        let last_write_time = Timestamp::deserialize_owned(reader)?;
        let custom_data = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| Error::ReadFailed(e, "custom data"))?;

        let record = AttributeRecord {
            name,
            last_write_time,
            custom_data,
        };
        tracing::debug!(
            start = format_args!("{:#x}", start),
            name = %record.name(),
            %last_write_time,
            custom_data,
            "deserialized AttributeRecord"
        );
        Ok(record)
    }
}

impl<T: DeserializeOwned> DeserializeOwned for Option<T> {
    /// Reads a value, mapping a premature end of input to `None`.
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        match T::deserialize_owned(reader) {
            Ok(value) => Ok(Some(value)),
            Err(Error::ReadFailed(e, _)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_and_table() {
        let bytes = [
            0x41, 0x46, 0x53, 0x20, 0x02, 0x00, 0x00, 0x00, // header
            0x00, 0x08, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00, // (0x800, 10)
        ];
        let mut cursor = Cursor::new(&bytes[..]);
        let header = AfsHeader::deserialize_owned(&mut cursor).unwrap();
        assert_eq!(header.version, crate::Version::V20);
        assert_eq!(header.entry_total, 2);

        let record = EntryRecord::deserialize_owned(&mut cursor).unwrap();
        assert_eq!(record, EntryRecord { offset: 0x800, size: 10 });
    }

    #[test]
    fn truncated_descriptor_reads_as_none() {
        let mut cursor = Cursor::new(&[0x10, 0x00, 0x00][..]);
        let info = <Option<AttributeInfo>>::deserialize_owned(&mut cursor).unwrap();
        assert_eq!(info, None);
    }

    #[test]
    fn attribute_record_layout() {
        let mut bytes = vec![0u8; 0x30];
        bytes[..4].copy_from_slice(b"A.BN");
        let fields: [u16; 6] = [1999, 12, 31, 23, 59, 58];
        for (i, field) in fields.iter().enumerate() {
            bytes[0x20 + i * 2..0x22 + i * 2].copy_from_slice(&field.to_le_bytes());
        }
        bytes[0x2c..].copy_from_slice(&0xdead_beefu32.to_le_bytes());

        let record = AttributeRecord::deserialize_owned(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(record.name(), "A.BN");
        assert_eq!(record.last_write_time.to_string(), "1999-12-31 23:59:58");
        assert_eq!(record.custom_data, 0xdead_beef);
    }
}
