//! castex-file - Filesystem-backed object store.

mod store;

pub use store::FileStore;
