/// Process-wide raw dataset cache.
pub mod cache;
pub mod loader;
/// Raw record types and timestamp parsing.
pub mod record;

pub use cache::LoadCache;
pub use loader::{DataSource, load, load_path, load_reader};
pub use record::{RawDataset, RawRecord, TimestampPolicy};
