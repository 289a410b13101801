//! authfetch-file - Filesystem-backed credential slot storage.

mod store;

pub use store::FileSlotStorage;
