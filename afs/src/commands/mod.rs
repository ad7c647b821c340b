pub mod list;
pub mod pack;
pub mod unpack;

pub use list::run as list;
pub use pack::run as pack;
pub use unpack::run as unpack;

use afs_format::EntryProgress;

pub(crate) fn log_progress(event: EntryProgress<'_>) {
    match event {
        EntryProgress::Started { total, index, name } => {
            tracing::info!("{:>8}/{}({}): start", index, total, name)
        }
        EntryProgress::Done { total, index, name } => {
            tracing::info!("{:>8}/{}({}): done", index, total, name)
        }
    }
}
