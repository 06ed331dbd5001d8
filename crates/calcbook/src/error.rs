use calcbook_engine::{EngineError, SheetId};
use thiserror::Error;

/// Convenience alias used across the SDK surface.
pub type Result<T> = std::result::Result<T, CalcError>;

/// Broad classification of a [`CalcError`], stable across message changes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or disallowed address text.
    Reference,
    /// Operation targeted a sheet that no longer exists.
    NotFound,
    /// Typed value getter invoked against a value of a different type.
    TypeMismatch,
    /// Malformed hex color literal.
    InvalidColor,
    /// Date outside the representable serial range.
    DateRange,
    /// Any other failure surfaced by the engine, message preserved verbatim.
    Engine,
}

/// Typed error taxonomy of the SDK.
///
/// Messages are deterministic and safe to assert on in tests; they are part
/// of the contract.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CalcError {
    #[error("Cell reference error. \"{0}\" is not valid reference.")]
    MalformedReference(String),

    #[error("Cell reference error. Sheet name cannot be specified in sheet cell getter.")]
    UnexpectedSheetName,

    #[error("Cell reference error. Sheet name is required in workbook cell getter.")]
    MissingSheetName,

    #[error("Could not find sheet with sheetId={0}")]
    SheetNotFound(SheetId),

    #[error("Could not find sheet with name=\"{0}\"")]
    SheetNameNotFound(String),

    #[error("Could not find sheet at index={0}")]
    SheetIndexOutOfBounds(u32),

    #[error("Type of cell's value is not {expected}, cell value: {value}")]
    TypeMismatch {
        /// Expected runtime type (`number`, `string`, `boolean`).
        expected: &'static str,
        /// Literal rendering of the stored value (strings quoted).
        value: String,
    },

    #[error("Color \"{0}\" is not valid 3-channel hex color.")]
    InvalidColor(String),

    #[error("Date \"{0}\" is not representable in workbook.")]
    DateNotRepresentable(String),

    #[error("Number \"{0}\" cannot be converted to date.")]
    InvalidDateSerial(f64),

    #[error("{0}")]
    Engine(String),
}

impl CalcError {
    /// Classify the error into its broad kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::MalformedReference(_)
            | CalcError::UnexpectedSheetName
            | CalcError::MissingSheetName => ErrorKind::Reference,
            CalcError::SheetNotFound(_)
            | CalcError::SheetNameNotFound(_)
            | CalcError::SheetIndexOutOfBounds(_) => ErrorKind::NotFound,
            CalcError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CalcError::InvalidColor(_) => ErrorKind::InvalidColor,
            CalcError::DateNotRepresentable(_) | CalcError::InvalidDateSerial(_) => {
                ErrorKind::DateRange
            }
            CalcError::Engine(_) => ErrorKind::Engine,
        }
    }
}

impl From<EngineError> for CalcError {
    fn from(error: EngineError) -> Self {
        CalcError::Engine(error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages_are_stable() {
        assert_eq!(
            CalcError::MalformedReference("A1!".to_string()).to_string(),
            "Cell reference error. \"A1!\" is not valid reference."
        );
        assert_eq!(
            CalcError::SheetNotFound(2).to_string(),
            "Could not find sheet with sheetId=2"
        );
        assert_eq!(
            CalcError::TypeMismatch {
                expected: "number",
                value: "\"3\"".to_string(),
            }
            .to_string(),
            "Type of cell's value is not number, cell value: \"3\""
        );
        assert_eq!(
            CalcError::InvalidColor("#fff".to_string()).to_string(),
            "Color \"#fff\" is not valid 3-channel hex color."
        );
        assert_eq!(
            CalcError::InvalidDateSerial(-1.0).to_string(),
            "Number \"-1\" cannot be converted to date."
        );
    }

    #[test]
    fn engine_messages_are_preserved_verbatim() {
        let err: CalcError = EngineError::new("Invalid row: 0").into();
        assert_eq!(err.to_string(), "Invalid row: 0");
        assert_eq!(err.kind(), ErrorKind::Engine);
    }
}
