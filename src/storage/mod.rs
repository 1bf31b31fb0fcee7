//! Storage Module
//!
//! Binary embedding format, random-access store and sequential readers.

mod format;
mod reader;
mod store;
mod text;

pub use format::{
    decode_vector, dict_path, read_dictionary, validate_layout, vectors_path, BinaryWriter,
    DictEntry, Layout, DICT_FILE_NAME, VECTORS_FILE_NAME,
};
pub use reader::RecordStream;
pub use store::{EmbeddingStore, StoreConfig};
pub use text::TextRecords;
