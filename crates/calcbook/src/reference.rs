//! Textual cell reference parsing.
//!
//! Pure and stateless; the resolver enforces the address grammar only.
//! Bounds (maximum rows/columns, sheet existence) are the engine's concern.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CalcError, Result};

/// A parsed `[Sheet!]A1`-style reference. `row` and `column` are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedReference {
    pub sheet_name: Option<String>,
    pub row: u32,
    pub column: u32,
}

fn cell_reference_regex() -> &'static Regex {
    static CELL_REFERENCE_RE: OnceLock<Regex> = OnceLock::new();
    CELL_REFERENCE_RE.get_or_init(|| {
        Regex::new(r"^(?:(?P<sheet>[^!]+)!)?(?P<column>[A-Za-z]+)(?P<row>[0-9]+)$")
            .expect("valid regex")
    })
}

/// Parse a cell reference like `A1`, `az100` or `Sheet1!B2`.
///
/// Column letters are case-insensitive and map base-26 (`A`=1, `Z`=26,
/// `AA`=27, ...). The resolver puts no upper bound on rows or columns
/// beyond `u32` range.
pub fn parse_cell_reference(reference: &str) -> Result<ParsedReference> {
    let malformed = || CalcError::MalformedReference(reference.to_string());

    let captures = cell_reference_regex()
        .captures(reference)
        .ok_or_else(malformed)?;

    let sheet_name = captures.name("sheet").map(|m| m.as_str().to_string());
    let column = letters_to_column(&captures["column"]).ok_or_else(malformed)?;
    let row: u32 = captures["row"].parse().map_err(|_| malformed())?;
    if row == 0 {
        return Err(malformed());
    }

    Ok(ParsedReference {
        sheet_name,
        row,
        column,
    })
}

/// Map column letters to their 1-based number; `None` on overflow.
pub fn letters_to_column(letters: &str) -> Option<u32> {
    let mut column: u32 = 0;
    for b in letters.bytes() {
        let v = (b.to_ascii_uppercase().checked_sub(b'A')?) as u32 + 1;
        if v > 26 {
            return None;
        }
        column = column.checked_mul(26)?.checked_add(v)?;
    }
    if column == 0 {
        None
    } else {
        Some(column)
    }
}

/// Map a 1-based column number to its letters (`1` -> `A`, `27` -> `AA`).
pub fn column_to_letters(column: u32) -> String {
    let mut n = column;
    let mut out = Vec::<u8>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).expect("column letters are always valid UTF-8")
}
