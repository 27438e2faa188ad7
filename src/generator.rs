//! Fixture generator: a directory full of small files with random letters.
//!
//! With a short body length many files collide, which makes the output a
//! convenient input for the scanner. Randomness comes from the BLAKE3
//! extendable output of a 64-bit seed, so a given seed always produces the
//! same tree.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const LETTERS: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest byte value that maps onto `LETTERS` without bias.
const ACCEPT_BELOW: u8 = 208;

/// Body length used when none is given.
pub const DEFAULT_LENGTH: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum GeneratorError {
    #[error("could not create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write to file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Infinite stream of ASCII letters derived from a seed.
pub struct LetterStream {
    reader: blake3::OutputReader,
    block: [u8; 64],
    pos: usize,
}

impl LetterStream {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&seed.to_le_bytes());
        Self {
            reader: hasher.finalize_xof(),
            block: [0; 64],
            pos: 64,
        }
    }

    /// Seed from the wall clock.
    #[must_use]
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        Self::new(nanos as u64)
    }

    fn next_byte(&mut self) -> u8 {
        if self.pos == self.block.len() {
            self.reader.fill(&mut self.block);
            self.pos = 0;
        }
        let b = self.block[self.pos];
        self.pos += 1;
        b
    }

    /// Next `len` letters.
    pub fn letters(&mut self, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            let b = self.next_byte();
            if b < ACCEPT_BELOW {
                out.push(LETTERS[usize::from(b) % LETTERS.len()]);
            }
        }
        out
    }
}

/// What a generation run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub created: usize,
    /// Files that could not be created
    pub skipped: usize,
}

/// Create `count` files named `file_0 ..` in `dir`, each with `length`
/// random letters.
///
/// `dir` is created if missing. A file that cannot be created is logged and
/// skipped.
///
/// # Errors
///
/// Fails if `dir` cannot be created or a created file cannot be written.
pub fn generate(
    dir: &Path,
    count: usize,
    length: usize,
    letters: &mut LetterStream,
) -> Result<GenerateReport, GeneratorError> {
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(|source| GeneratorError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let mut report = GenerateReport::default();
    for i in 0..count {
        let path = dir.join(format!("file_{i}"));
        let mut file = match File::create(&path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("could not create file {}: {e}", path.display());
                report.skipped += 1;
                continue;
            }
        };
        file.write_all(&letters.letters(length))
            .map_err(|source| GeneratorError::Write { path, source })?;
        report.created += 1;
    }

    log::info!("Generated {} file(s) in {}", report.created, dir.display());
    Ok(report)
}
