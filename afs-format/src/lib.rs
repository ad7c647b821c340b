//! Reading and writing of AFS archive containers.
//!
//! An AFS file is a header, a table of `(offset, size)` pairs, the entry data
//! blocks on 0x800-byte boundaries, and optionally an attribute block holding
//! a name, last write time and custom value for every entry.
//!
//! Use [`Archive::open`] and [`Archive::unpack`] to extract files, and
//! [`Archive::new`], [`Archive::push`] and [`Archive::pack`] to build them.

mod archive;
mod attrs;
mod de;
mod error;
mod header;
pub mod layout;
mod pack;
mod plan;
mod progress;
mod record;
mod ser;
mod unpack;

pub use archive::Archive;
pub use attrs::AttributeMode;
pub use error::{Error, Result};
pub use header::Version;
pub use plan::Layout;
pub use progress::{CancelToken, EntryProgress, PackStats, UnpackStats};
pub use record::{Entry, EntrySpec, Timestamp};
