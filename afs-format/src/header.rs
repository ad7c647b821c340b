use std::fmt;

use crate::Error;

/// Low three bytes of the signature word, `"AFS"` read little-endian.
pub(crate) const MAGIC: u32 = 0x0053_4641;

const MAGIC_MASK: u32 = 0x00FF_FFFF;

/// Format revision, stored in the high byte of the signature word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    V0,
    V20,
}

impl Version {
    pub fn tag(self) -> u8 {
        match self {
            Version::V0 => 0x00,
            Version::V20 => 0x20,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V0
    }
}

impl TryFrom<u8> for Version {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x00 => Ok(Version::V0),
            0x20 => Ok(Version::V20),
            other => Err(Error::InvalidVersion(other)),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AfsHeader {
    pub(crate) version: Version,
    pub(crate) entry_total: u32,
}

impl AfsHeader {
    pub(crate) fn new(version: Version, entry_total: u32) -> AfsHeader {
        AfsHeader {
            version,
            entry_total,
        }
    }

    /// The signature word as it is stored on disk.
    pub(crate) fn signature(&self) -> u32 {
        MAGIC | (u32::from(self.version.tag()) << 24)
    }

    /// Splits a signature word into its version, rejecting foreign magic.
    pub(crate) fn parse_signature(signature: u32) -> crate::Result<Version> {
        if signature & MAGIC_MASK != MAGIC {
            return Err(Error::InvalidSignature(signature));
        }
        Version::try_from((signature >> 24) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_words() {
        assert_eq!(AfsHeader::new(Version::V0, 0).signature(), 0x0053_4641);
        assert_eq!(AfsHeader::new(Version::V20, 0).signature(), 0x2053_4641);
        assert_eq!(
            AfsHeader::parse_signature(0x2053_4641).unwrap(),
            Version::V20
        );
    }

    #[test]
    fn rejects_foreign_magic() {
        match AfsHeader::parse_signature(0x0053_4642) {
            Err(Error::InvalidSignature(0x0053_4642)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_version() {
        match AfsHeader::parse_signature(0x1053_4641) {
            Err(Error::InvalidVersion(0x10)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
