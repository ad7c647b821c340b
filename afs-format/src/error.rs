use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid signature {0:#010x}. Is this a valid AFS archive?")]
    InvalidSignature(u32),

    #[error("Unsupported AFS version tag {0:#04x}.")]
    InvalidVersion(u8),

    #[error("Opening file failed. Path: '{}'", .1.display())]
    OpenFailed(#[source] std::io::Error, PathBuf),

    #[error("Creating file failed. Path: '{}'", .1.display())]
    CreateFailed(#[source] std::io::Error, PathBuf),

    #[error("Reading {1} failed.")]
    ReadFailed(#[source] std::io::Error, &'static str),

    #[error("Writing {1} failed.")]
    WriteFailed(#[source] std::io::Error, &'static str),

    #[error("Copying entry data failed. Entry: '{1}'")]
    CopyFailed(#[source] std::io::Error, String),

    #[error("Invalid last write time '{value}', expected YYYY-MM-DD HH:MM:SS.")]
    TimestampParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Operation cancelled.")]
    Cancelled,

    #[error("Entry block alignment {0:#x} must be a power of two of at least 0x800.")]
    InvalidAlignment(u32),

    #[error("Archive layout does not fit in 32-bit offsets.")]
    TooLarge,

    #[error("Entry {index} ('{name}') has no source to read data from.")]
    MissingSource { index: u32, name: String },

    #[error("Entry name '{0}' cannot be used as a file name.")]
    InvalidName(String),
}

impl Error {
    /// Whether this error came from the underlying reader, writer or filesystem.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Error::OpenFailed(..)
                | Error::CreateFailed(..)
                | Error::ReadFailed(..)
                | Error::WriteFailed(..)
                | Error::CopyFailed(..)
        )
    }
}
