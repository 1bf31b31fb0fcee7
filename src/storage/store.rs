//! Embedding Store
//!
//! Random-access word → vector table over a binary embedding source.

use bytes::Bytes;
use hashbrown::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::format::{self, Layout};
use crate::error::LoadError;
use crate::vector::{Vector, VectorRecord};

/// Store configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreConfig {
    /// Read the whole vector table into memory at open time
    pub preload: bool,
}

impl StoreConfig {
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }
}

/// Where vector bytes are read from
///
/// File reads are positioned, so concurrent lookups share the handle without
/// locking.
enum VectorSource {
    File(File),
    Memory(Bytes),
}

/// Read-only word → vector table
///
/// Only the dictionary is held in memory unless the store was opened with
/// `preload`. A word that appears more than once in the dictionary resolves
/// to its last occurrence.
pub struct EmbeddingStore {
    /// Word -> byte offset into the vector table
    offsets: HashMap<String, u64>,
    layout: Layout,
    source: VectorSource,
    path: PathBuf,
}

impl EmbeddingStore {
    /// Open a store over the source directory, reading vectors on demand
    pub fn open(dir: &Path) -> Result<Self, LoadError> {
        Self::open_with_config(dir, StoreConfig::default())
    }

    pub fn open_with_config(dir: &Path, config: StoreConfig) -> Result<Self, LoadError> {
        let entries = format::read_dictionary(&format::dict_path(dir))?;

        let vectors_path = format::vectors_path(dir);
        let mut file = File::open(&vectors_path).map_err(|e| LoadError::io(&vectors_path, e))?;
        let vectors_len = file
            .metadata()
            .map_err(|e| LoadError::io(&vectors_path, e))?
            .len();
        let layout = format::validate_layout(&entries, vectors_len, &vectors_path)?;

        let mut offsets = HashMap::with_capacity(entries.len());
        for entry in entries {
            offsets.insert(entry.word, entry.offset);
        }

        let source = if config.preload {
            let mut data = Vec::with_capacity(vectors_len as usize);
            file.read_to_end(&mut data)
                .map_err(|e| LoadError::io(&vectors_path, e))?;
            if data.len() as u64 != vectors_len {
                return Err(LoadError::truncated(
                    &vectors_path,
                    format!("expected {} bytes, read {}", vectors_len, data.len()),
                ));
            }
            VectorSource::Memory(Bytes::from(data))
        } else {
            VectorSource::File(file)
        };

        info!(
            path = %dir.display(),
            records = layout.count,
            words = offsets.len(),
            dimension = layout.dimension,
            preload = config.preload,
            "Opened embedding store"
        );

        Ok(Self {
            offsets,
            layout,
            source,
            path: dir.to_path_buf(),
        })
    }

    /// Get the vector for a word
    ///
    /// Returns `None` for out-of-vocabulary words. A read failure is logged
    /// and also reported as `None`.
    pub fn lookup(&self, word: &str) -> Option<Vector> {
        let offset = *self.offsets.get(word)?;
        match self.read_vector(offset) {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(word, path = %self.path.display(), error = %e, "Vector read failed, treating word as missing");
                None
            }
        }
    }

    /// Get the word together with its vector
    pub fn record(&self, word: &str) -> Option<VectorRecord> {
        self.lookup(word).map(|vector| VectorRecord::new(word, vector))
    }

    /// Check if word is in the vocabulary
    pub fn contains(&self, word: &str) -> bool {
        self.offsets.contains_key(word)
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Vector dimensionality (0 for an empty source)
    pub fn dimension(&self) -> usize {
        self.layout.dimension
    }

    /// Vocabulary in no particular order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.offsets.keys().map(String::as_str)
    }

    /// Source directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the vector table is memory-resident
    pub fn is_preloaded(&self) -> bool {
        matches!(self.source, VectorSource::Memory(_))
    }

    fn read_vector(&self, offset: u64) -> io::Result<Vector> {
        let len = self.layout.record_bytes() as usize;

        match &self.source {
            VectorSource::Memory(data) => {
                let start = offset as usize;
                let bytes = data.get(start..start + len).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::UnexpectedEof, "offset past vector table")
                })?;
                Ok(format::decode_vector(bytes, self.layout.dimension))
            }
            VectorSource::File(file) => {
                let mut buf = vec![0u8; len];
                read_exact_at(file, &mut buf, offset)?;
                Ok(format::decode_vector(&buf, self.layout.dimension))
            }
        }
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "offset past vector table",
                ))
            }
            Ok(n) => {
                let rest = buf;
                buf = &mut rest[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
