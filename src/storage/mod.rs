pub mod text_store;

pub use text_store::{FsTextStore, MemoryTextStore, TextStore};
