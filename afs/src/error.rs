use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open archive `{}`", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: afs_format::Error,
    },

    #[error("Cannot read descriptor `{}`", .path.display())]
    ReadDescriptor {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse descriptor `{}`", .path.display())]
    ParseDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write descriptor `{}`", .path.display())]
    WriteDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Descriptor `{}` is not usable", .path.display())]
    InvalidDescriptor {
        path: PathBuf,
        #[source]
        source: afs_format::Error,
    },

    #[error("Entry {index} of descriptor `{}` is not usable", .path.display())]
    InvalidEntry {
        path: PathBuf,
        index: usize,
        #[source]
        source: afs_format::Error,
    },

    #[error("Cannot read source file `{}`", .path.display())]
    SourceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create file `{}`", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create directory `{}`", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot pack archive `{}`", .path.display())]
    Pack {
        path: PathBuf,
        #[source]
        source: afs_format::Error,
    },

    #[error("Cannot unpack archive into `{}`", .path.display())]
    Unpack {
        path: PathBuf,
        #[source]
        source: afs_format::Error,
    },
}
