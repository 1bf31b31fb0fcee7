//! Streaming Reader
//!
//! Sequential pass over every record of a binary embedding source.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::format::{self, DictEntry, Layout};
use crate::error::LoadError;
use crate::vector::VectorRecord;

/// Iterator over the records of a binary embedding source, in file order
///
/// Duplicate words are yielded as many times as they occur.
pub struct RecordStream {
    entries: std::vec::IntoIter<DictEntry>,
    vectors: BufReader<File>,
    layout: Layout,
    path: PathBuf,
    buf: Vec<u8>,
    failed: bool,
}

impl RecordStream {
    /// Open the source directory and validate its layout
    pub fn open(dir: &Path) -> Result<Self, LoadError> {
        let entries = format::read_dictionary(&format::dict_path(dir))?;

        let path = format::vectors_path(dir);
        let file = File::open(&path).map_err(|e| LoadError::io(&path, e))?;
        let vectors_len = file.metadata().map_err(|e| LoadError::io(&path, e))?.len();
        let layout = format::validate_layout(&entries, vectors_len, &path)?;

        Ok(Self {
            entries: entries.into_iter(),
            vectors: BufReader::new(file),
            buf: vec![0u8; layout.record_bytes() as usize],
            layout,
            path,
            failed: false,
        })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }
}

impl Iterator for RecordStream {
    type Item = Result<VectorRecord, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let entry = self.entries.next()?;

        if let Err(e) = self.vectors.read_exact(&mut self.buf) {
            self.failed = true;
            let err = if e.kind() == io::ErrorKind::UnexpectedEof {
                LoadError::truncated(&self.path, format!("vector for {:?} cut short", entry.word))
            } else {
                LoadError::io(&self.path, e)
            };
            return Some(Err(err));
        }

        let vector = format::decode_vector(&self.buf, self.layout.dimension);
        Some(Ok(VectorRecord::new(entry.word, vector)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            self.entries.size_hint()
        }
    }
}
