//! Program memory and the hex program loader.
//!
//! Program memory holds up to [`PROGRAM_WORDS`] 128-bit instruction words.
//! It is populated once before execution and never written by the core.
//! Addresses beyond the loaded program read as the zero word, which the
//! control unit treats as halt.
//!
//! # Hex format
//!
//! One instruction per line as exactly 32 hex digits (either case).
//! Surrounding whitespace is trimmed and blank lines are skipped.
//!
//! ```text
//! 02000000200000100000000000000000
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Capacity of program memory in words.
pub const PROGRAM_WORDS: usize = 256;

/// Hex digits per instruction word.
const HEX_DIGITS: usize = 32;

/// Errors raised while loading a program.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// More words than program memory holds.
    #[error("program has {words} words, program memory holds {max}")]
    TooLarge {
        /// Words in the rejected program.
        words: usize,
        /// Capacity of program memory.
        max: usize,
    },

    /// A line that is not a 32-digit hex word.
    #[error("line {line}: expected 32 hex digits, found {content:?}")]
    InvalidLine {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        content: String,
    },

    /// The program file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Read-only instruction memory.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProgramMemory {
    words: Vec<u128>,
}

impl ProgramMemory {
    /// Create an empty program (every address halts).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw words.
    pub fn from_words(words: &[u128]) -> Result<Self, ProgramError> {
        if words.len() > PROGRAM_WORDS {
            return Err(ProgramError::TooLarge {
                words: words.len(),
                max: PROGRAM_WORDS,
            });
        }
        Ok(Self {
            words: words.to_vec(),
        })
    }

    /// Parse the hex text format.
    pub fn parse_hex(text: &str) -> Result<Self, ProgramError> {
        let mut words = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line.len() != HEX_DIGITS || !line.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ProgramError::InvalidLine {
                    line: index + 1,
                    content: line.to_string(),
                });
            }
            let word = u128::from_str_radix(line, 16).map_err(|_| ProgramError::InvalidLine {
                line: index + 1,
                content: line.to_string(),
            })?;
            words.push(word);
        }

        log::debug!("parsed {} program words", words.len());
        Self::from_words(&words)
    }

    /// Load a hex program file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProgramError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ProgramError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let program = Self::parse_hex(&text)?;
        log::info!("Loaded {} words from {}", program.len(), path.display());
        Ok(program)
    }

    /// Word at `addr`; zero past the end of the program.
    #[inline]
    pub fn fetch(&self, addr: u32) -> u128 {
        self.words.get(addr as usize).copied().unwrap_or(0)
    }

    /// Number of loaded words.
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when no words are loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Loaded words.
    pub fn words(&self) -> &[u128] {
        &self.words
    }

    /// Render in the hex text format.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.words.len() * (HEX_DIGITS + 1));
        for word in &self.words {
            let _ = writeln!(out, "{:032X}", word);
        }
        out
    }
}

impl std::fmt::Debug for ProgramMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProgramMemory {{ {} words }}", self.words.len())
    }
}
