//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed column/row coordinates.
//! Column labels use bijective base-26 numbering: `A` is 1, `Z` is 26 and
//! `AA` is 27. No letter stands for zero.
//!
//! # Examples
//!
//! ```
//! use tabula_engine::engine::CellRef;
//!
//! let cell: CellRef = "B3".parse().unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Reasons an address or column label could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("address '{0}' has no column letters")]
    MissingColumn(String),

    #[error("address '{0}' has no row number")]
    MissingRow(String),

    #[error("address '{0}' has row 0; rows start at 1")]
    ZeroRow(String),

    #[error("address '{0}' is out of range")]
    Overflow(String),

    #[error("malformed address '{0}'")]
    Malformed(String),
}

/// A reference to a cell by column and row indices (0-indexed).
///
/// Ordering is column-major (column first, then row), which is the order
/// ranges are enumerated in.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "$B$2", "aa10").
    pub fn parse(name: &str) -> Result<CellRef, AddressError> {
        let (label, row) = split_address(name)?;
        let col = column_index(&label)? - 1;
        Ok(CellRef::new(col, row - 1))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Column label of this reference (e.g. "AA").
    pub fn column_label(&self) -> String {
        Self::col_to_letters(self.col)
    }
}

impl Ord for CellRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.col.cmp(&other.col).then(self.row.cmp(&other.row))
    }
}

impl PartialOrd for CellRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::str::FromStr for CellRef {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// 1-based bijective base-26 value of a column label (`A` -> 1, `AA` -> 27).
pub fn column_index(label: &str) -> Result<usize, AddressError> {
    if label.is_empty() {
        return Err(AddressError::MissingColumn(label.to_string()));
    }
    let mut acc = 0usize;
    for c in label.bytes() {
        if !c.is_ascii_alphabetic() {
            return Err(AddressError::Malformed(label.to_string()));
        }
        let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| AddressError::Overflow(label.to_string()))?;
    }
    Ok(acc)
}

/// Column label for a 1-based index (`1` -> "A", `27` -> "AA").
/// Index 0 has no label and yields an empty string.
pub fn column_label(index: usize) -> String {
    match index {
        0 => String::new(),
        n => CellRef::col_to_letters(n - 1),
    }
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$?(?<letters>[A-Za-z]*)\$?(?<numbers>[0-9]*)$")
            .expect("address regex must compile")
    })
}

/// Split an address into its upper-cased column label and 1-based row.
pub fn split_address(address: &str) -> Result<(String, usize), AddressError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }
    let caps = address_re()
        .captures(trimmed)
        .ok_or_else(|| AddressError::Malformed(address.to_string()))?;
    let letters = &caps["letters"];
    let numbers = &caps["numbers"];
    if letters.is_empty() {
        return Err(AddressError::MissingColumn(address.to_string()));
    }
    if numbers.is_empty() {
        return Err(AddressError::MissingRow(address.to_string()));
    }
    let row = numbers
        .parse::<usize>()
        .map_err(|_| AddressError::Overflow(address.to_string()))?;
    if row == 0 {
        return Err(AddressError::ZeroRow(address.to_string()));
    }
    Ok((letters.to_ascii_uppercase(), row))
}
