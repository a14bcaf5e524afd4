pub mod change;
pub mod item;
pub mod snapshot;

pub use change::{ChangeRecord, ChangeType, ClearEncoding, ContentPatch, LogEntry, Patch, Tombstone};
pub use item::{Author, Comment, Content, Item, Milestone, Sprint};
pub use snapshot::{SNAPSHOT_FORMAT, Snapshot};
