use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::layout::MAX_ENTRY_NAME_LENGTH;
use crate::Error;

/// Last write time as stored in an attribute record.
///
/// The six fields are kept exactly as a producer wrote them, so values that
/// are not a real calendar date still survive a decode/encode cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl Timestamp {
    /// Text layout accepted by [`FromStr`] and produced by [`fmt::Display`].
    pub const FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Placeholder time given to null entries.
    pub const NULL_ENTRY: Timestamp = Timestamp {
        year: 2000,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    pub fn now() -> Timestamp {
        chrono::Local::now().naive_local().into()
    }

    /// Parses like [`FromStr`], but also accepts six numbers in the same
    /// layout that do not form a calendar date, such as the zeroed or
    /// out-of-range fields some producers store.
    pub fn parse_raw(s: &str) -> Result<Timestamp, Error> {
        s.parse()
            .or_else(|err| Timestamp::split_fields(s.trim()).ok_or(err))
    }

    fn split_fields(s: &str) -> Option<Timestamp> {
        let (date, time) = s.split_once(' ')?;
        let mut date = date.splitn(3, '-').map(str::parse::<u16>);
        let mut time = time.splitn(3, ':').map(str::parse::<u16>);

        Some(Timestamp {
            year: date.next()?.ok()?,
            month: date.next()?.ok()?,
            day: date.next()?.ok()?,
            hour: time.next()?.ok()?,
            minute: time.next()?.ok()?,
            second: time.next()?.ok()?,
        })
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Timestamp {
            year: value.year().clamp(0, i32::from(u16::MAX)) as u16,
            month: value.month() as u16,
            day: value.day() as u16,
            hour: value.hour() as u16,
            minute: value.minute() as u16,
            second: value.second() as u16,
        }
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), Self::FORMAT)
            .map(Timestamp::from)
            .map_err(|source| Error::TimestampParse {
                value: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Caller-supplied description of one entry to append before packing.
#[derive(Debug, Clone, Default)]
pub struct EntrySpec {
    pub name: String,
    /// Where the entry's bytes are read from when packing. Ignored for null entries.
    pub source: Option<PathBuf>,
    pub size: u32,
    pub last_write_time: Timestamp,
    pub custom_data: u32,
    pub is_null: bool,
}

impl EntrySpec {
    pub fn null<S: Into<String>>(name: S) -> EntrySpec {
        EntrySpec {
            name: name.into(),
            last_write_time: Timestamp::NULL_ENTRY,
            is_null: true,
            ..Default::default()
        }
    }
}

/// One slot of an archive, either real data or a null placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub(crate) source: Option<PathBuf>,
    pub(crate) offset: u32,
    pub(crate) size: u32,
    pub(crate) name: String,
    pub(crate) last_write_time: Timestamp,
    pub(crate) custom_data: u32,
    pub(crate) is_null: bool,
}

impl Entry {
    pub(crate) fn from_spec(spec: EntrySpec) -> Entry {
        if spec.is_null {
            return Entry {
                source: None,
                offset: 0,
                size: 0,
                name: spec.name,
                last_write_time: spec.last_write_time,
                custom_data: spec.custom_data,
                is_null: true,
            };
        }

        Entry {
            source: spec.source,
            offset: 0,
            size: spec.size,
            name: spec.name,
            last_write_time: spec.last_write_time,
            custom_data: spec.custom_data,
            is_null: false,
        }
    }

    /// The file this entry's bytes come from: a pack source, or the archive it was read from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Offset of the data block. Zero for null entries and for entries not yet packed.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn last_write_time(&self) -> Timestamp {
        self.last_write_time
    }

    pub fn custom_data(&self) -> u32 {
        self.custom_data
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }
}

/// One `(offset, size)` pair of the entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct EntryRecord {
    pub(crate) offset: u32,
    pub(crate) size: u32,
}

impl EntryRecord {
    pub(crate) const NULL: EntryRecord = EntryRecord { offset: 0, size: 0 };

    #[inline]
    pub(crate) fn is_null(&self) -> bool {
        self.offset == 0
    }

    #[inline]
    pub(crate) fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }
}

/// One fixed-size record of the attribute block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributeRecord {
    pub(crate) name: [u8; MAX_ENTRY_NAME_LENGTH],
    pub(crate) last_write_time: Timestamp,
    pub(crate) custom_data: u32,
}

impl AttributeRecord {
    pub(crate) fn from_entry(entry: &Entry) -> AttributeRecord {
        let mut name = [0u8; MAX_ENTRY_NAME_LENGTH];
        let mut len = entry.name.len().min(MAX_ENTRY_NAME_LENGTH);
        while !entry.name.is_char_boundary(len) {
            len -= 1;
        }
        name[..len].copy_from_slice(&entry.name.as_bytes()[..len]);

        AttributeRecord {
            name,
            last_write_time: entry.last_write_time,
            custom_data: entry.custom_data,
        }
    }

    /// Decoded name with NUL padding and any other unprintable bytes dropped.
    /// The only whitespace kept is the ASCII space.
    pub(crate) fn name(&self) -> String {
        String::from_utf8_lossy(&self.name)
            .chars()
            .filter(|c| {
                !c.is_control()
                    && *c != char::REPLACEMENT_CHARACTER
                    && (*c == ' ' || !c.is_whitespace())
            })
            .collect()
    }
}
