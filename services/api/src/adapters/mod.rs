pub mod clock;
pub mod kv;
pub mod local_store;

pub use clock::{FixedClock, SystemClock};
pub use kv::{BlobStore, MemoryBlobStore, PgBlobStore};
pub use local_store::LocalStoreAdapter;
