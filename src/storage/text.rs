//! GloVe Text Format
//!
//! Reader for the whitespace-separated `word v1 v2 ... vD` format that GloVe
//! training emits, used to produce the binary layout.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::vector::VectorRecord;

/// Iterator over the records of a text embedding file
pub struct TextRecords<R> {
    lines: Lines<R>,
    line_no: usize,
    path: PathBuf,
}

impl TextRecords<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> TextRecords<R> {
    /// Wrap a reader; `path` is only used in error messages
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            path: path.into(),
        }
    }

    fn parse_line(&self, line: &str) -> Result<VectorRecord, LoadError> {
        let mut parts = line.split_whitespace();
        // callers skip blank lines
        let word = parts.next().unwrap_or_default();

        let vector = parts
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    LoadError::malformed(
                        &self.path,
                        format!("line {}: invalid component {:?}", self.line_no, token),
                    )
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if vector.is_empty() {
            return Err(LoadError::malformed(
                &self.path,
                format!("line {}: {:?} has no vector", self.line_no, word),
            ));
        }

        Ok(VectorRecord::new(word, vector))
    }
}

impl<R: BufRead> Iterator for TextRecords<R> {
    type Item = Result<VectorRecord, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(LoadError::io(&self.path, e))),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(self.parse_line(&line));
        }
    }
}
