//! GloVe Binary Format
//!
//! An embedding source is a directory holding two files written with Java
//! `DataOutputStream` conventions (big-endian):
//!
//! ```text
//! dict.bin     ┌──────────────┬──────────────────┬──────────────────┐
//!   (repeated) │ Len (u16 BE) │ Word (Len bytes) │ Offset (i64 BE)  │
//!              └──────────────┴──────────────────┴──────────────────┘
//! vectors.bin  ┌──────────────────────────────────────────────────────┐
//!              │ D × f32 BE per record, record i at dict offset i      │
//!              └──────────────────────────────────────────────────────┘
//! ```
//!
//! The dictionary doubles as the header: its entry count is the vocabulary
//! size and the offset stride divided by 4 is the dimensionality. Words use
//! Java's modified UTF-8 (`writeUTF`): NUL is `C0 80` and characters outside
//! the BMP are two 3-byte surrogates.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::LoadError;
use crate::vector::{Vector, VectorRecord};

/// Dictionary file name inside an embedding source directory
pub const DICT_FILE_NAME: &str = "dict.bin";

/// Vector table file name inside an embedding source directory
pub const VECTORS_FILE_NAME: &str = "vectors.bin";

/// Bytes per stored vector component
pub const FLOAT_BYTES: u64 = 4;

/// Word length prefix size
const LEN_PREFIX: usize = 2;

/// Offset field size
const OFFSET_BYTES: usize = 8;

pub fn dict_path(dir: &Path) -> PathBuf {
    dir.join(DICT_FILE_NAME)
}

pub fn vectors_path(dir: &Path) -> PathBuf {
    dir.join(VECTORS_FILE_NAME)
}

/// One dictionary entry: a word and the byte offset of its vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub word: String,
    pub offset: u64,
}

/// Shape of a validated embedding source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Number of dictionary entries, duplicates included
    pub count: usize,
    /// Vector dimensionality
    pub dimension: usize,
}

impl Layout {
    /// Size of one stored vector in bytes
    pub fn record_bytes(&self) -> u64 {
        self.dimension as u64 * FLOAT_BYTES
    }
}

/// Read and decode a dictionary file
pub fn read_dictionary(path: &Path) -> Result<Vec<DictEntry>, LoadError> {
    let raw = fs::read(path).map_err(|e| LoadError::io(path, e))?;
    decode_dictionary(Bytes::from(raw), path)
}

fn decode_dictionary(mut buf: Bytes, path: &Path) -> Result<Vec<DictEntry>, LoadError> {
    let mut entries = Vec::new();

    while buf.has_remaining() {
        if buf.remaining() < LEN_PREFIX {
            return Err(LoadError::truncated(
                path,
                format!("incomplete length prefix after {} entries", entries.len()),
            ));
        }
        let len = buf.get_u16() as usize;

        if buf.remaining() < len + OFFSET_BYTES {
            return Err(LoadError::truncated(
                path,
                format!("incomplete entry {}", entries.len()),
            ));
        }
        let word_bytes = buf.split_to(len);
        let word = cesu8::from_java_cesu8(&word_bytes)
            .map_err(|_| {
                LoadError::malformed(
                    path,
                    format!("entry {} is not modified UTF-8", entries.len()),
                )
            })?
            .into_owned();

        let offset = buf.get_i64();
        if offset < 0 {
            return Err(LoadError::malformed(
                path,
                format!("negative offset {} for {:?}", offset, word),
            ));
        }

        entries.push(DictEntry {
            word,
            offset: offset as u64,
        });
    }

    Ok(entries)
}

/// Check the dictionary offsets against the vector table length
///
/// Every record must span exactly `4 * D` bytes, laid out back to back from
/// offset 0, and the table must end right after the last record.
pub fn validate_layout(
    entries: &[DictEntry],
    vectors_len: u64,
    path: &Path,
) -> Result<Layout, LoadError> {
    let Some(first) = entries.first() else {
        if vectors_len != 0 {
            return Err(LoadError::malformed(
                path,
                format!("{} bytes of vector data but an empty dictionary", vectors_len),
            ));
        }
        return Ok(Layout {
            count: 0,
            dimension: 0,
        });
    };

    if first.offset != 0 {
        return Err(LoadError::malformed(
            path,
            format!("first record starts at offset {}", first.offset),
        ));
    }

    let stride = match entries.get(1) {
        Some(second) => second.offset,
        None => vectors_len,
    };
    if stride == 0 {
        return Err(LoadError::EmptyVector {
            index: 0,
            word: first.word.clone(),
        });
    }
    if stride % FLOAT_BYTES != 0 {
        return Err(LoadError::malformed(
            path,
            format!("record length {} is not a multiple of {}", stride, FLOAT_BYTES),
        ));
    }
    let dimension = (stride / FLOAT_BYTES) as usize;

    for (index, pair) in entries.windows(2).enumerate() {
        let len = pair[1].offset.checked_sub(pair[0].offset).ok_or_else(|| {
            LoadError::malformed(
                path,
                format!("offsets decrease at record {} ({:?})", index + 1, pair[1].word),
            )
        })?;
        if len != stride {
            return Err(LoadError::DimensionMismatch {
                index,
                word: pair[0].word.clone(),
                expected: dimension,
                actual: (len / FLOAT_BYTES) as usize,
            });
        }
    }

    let last_index = entries.len() - 1;
    let last = &entries[last_index];
    let tail = vectors_len.saturating_sub(last.offset);
    if tail < stride {
        return Err(LoadError::truncated(
            path,
            format!(
                "record {} ({:?}) needs {} bytes, {} available",
                last_index, last.word, stride, tail
            ),
        ));
    }
    if tail > stride {
        return Err(LoadError::DimensionMismatch {
            index: last_index,
            word: last.word.clone(),
            expected: dimension,
            actual: (tail / FLOAT_BYTES) as usize,
        });
    }

    Ok(Layout {
        count: entries.len(),
        dimension,
    })
}

/// Decode `dimension` big-endian f32 values, widening to f64
pub fn decode_vector(mut buf: &[u8], dimension: usize) -> Vector {
    debug_assert!(buf.len() >= dimension * FLOAT_BYTES as usize);
    (0..dimension).map(|_| buf.get_f32() as f64).collect()
}

/// Writer for the binary embedding layout
pub struct BinaryWriter;

impl BinaryWriter {
    /// Write records into `dir`, creating it if needed
    pub fn write_records<I>(dir: &Path, records: I) -> Result<usize, LoadError>
    where
        I: IntoIterator<Item = VectorRecord>,
    {
        Self::write_stream(dir, records.into_iter().map(Ok))
    }

    /// Write a fallible record stream into `dir`, stopping at the first error
    ///
    /// Both files are staged under temporary names in `dir` and only renamed
    /// into place once every record was written. On error nothing is renamed
    /// and the staged files are removed.
    pub fn write_stream<I>(dir: &Path, records: I) -> Result<usize, LoadError>
    where
        I: IntoIterator<Item = Result<VectorRecord, LoadError>>,
    {
        fs::create_dir_all(dir).map_err(|e| LoadError::io(dir, e))?;

        let dict_path = dict_path(dir);
        let vectors_path = vectors_path(dir);
        let mut dict =
            BufWriter::new(NamedTempFile::new_in(dir).map_err(|e| LoadError::io(dir, e))?);
        let mut vectors =
            BufWriter::new(NamedTempFile::new_in(dir).map_err(|e| LoadError::io(dir, e))?);

        let mut buf = BytesMut::new();
        let mut dimension = 0usize;
        let mut offset = 0u64;
        let mut count = 0usize;

        for record in records {
            let record = record?;

            if record.dim() == 0 {
                return Err(LoadError::EmptyVector {
                    index: count,
                    word: record.word,
                });
            }
            if count == 0 {
                dimension = record.dim();
            } else if record.dim() != dimension {
                let actual = record.dim();
                return Err(LoadError::DimensionMismatch {
                    index: count,
                    word: record.word,
                    expected: dimension,
                    actual,
                });
            }

            let word = cesu8::to_java_cesu8(&record.word);
            if word.len() > u16::MAX as usize {
                return Err(LoadError::WordTooLong { len: word.len() });
            }

            buf.clear();
            buf.put_u16(word.len() as u16);
            buf.put_slice(&word);
            buf.put_i64(offset as i64);
            dict.write_all(&buf).map_err(|e| LoadError::io(&dict_path, e))?;

            buf.clear();
            for &x in &record.vector {
                buf.put_f32(x as f32);
            }
            vectors
                .write_all(&buf)
                .map_err(|e| LoadError::io(&vectors_path, e))?;

            offset += dimension as u64 * FLOAT_BYTES;
            count += 1;
        }

        let dict = dict
            .into_inner()
            .map_err(|e| LoadError::io(&dict_path, e.into_error()))?;
        let vectors = vectors
            .into_inner()
            .map_err(|e| LoadError::io(&vectors_path, e.into_error()))?;

        vectors
            .persist(&vectors_path)
            .map_err(|e| LoadError::io(&vectors_path, e.error))?;
        dict.persist(&dict_path)
            .map_err(|e| LoadError::io(&dict_path, e.error))?;

        info!(path = %dir.display(), words = count, dimension, "Wrote binary embeddings");
        Ok(count)
    }
}
