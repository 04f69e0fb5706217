//! Error types surfaced by the high-level [`parse`](crate::dispatch::parse) entry points.
//!
//! The low-level pipeline never allocates or returns a `Result`; it reports everything through
//! [`ReturnCode`](crate::return_code::ReturnCode). This module exists for hosts that want an
//! idiomatic `std::error::Error` at the boundary instead of inspecting bit flags themselves.

use core::fmt;
use std::io;

use crate::return_code::ReturnCode;

/// The reason a field failed to parse, with the offending [`ReturnCode`] preserved for callers
/// that want the full bit-level detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldParseErrorKind {
    /// The type parser could not make sense of the field's bytes.
    InvalidValue,
    /// The type parser's value did not fit the target type.
    Overflow,
    /// A quoted field had a dangling escape or was missing its close quote.
    UnterminatedQuote,
    /// Bytes were found between the value and its delimiter that did not belong to either.
    TrailingGarbage,
    /// The source ended before a value could be completed.
    UnexpectedEof,
    /// The field matched a sentinel (or was empty with empty-as-missing enabled) and callers
    /// asked for a non-optional value.
    Missing,
}

impl fmt::Display for FieldParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FieldParseErrorKind::InvalidValue => "field value could not be parsed",
            FieldParseErrorKind::Overflow => "field value overflowed its target type",
            FieldParseErrorKind::UnterminatedQuote => "quoted field was never closed",
            FieldParseErrorKind::TrailingGarbage => "unexpected bytes before the delimiter",
            FieldParseErrorKind::UnexpectedEof => "input ended before the field was complete",
            FieldParseErrorKind::Missing => "field was missing (sentinel or empty)",
        };
        f.write_str(msg)
    }
}

/// An error produced by a high-level field parse.
///
/// Opaque by design, mirroring the rest of the crate's "codes, not exceptions" philosophy: the
/// underlying [`ReturnCode`] is always available via [`code`](Self::code) for callers that want
/// more than the coarse [`kind`](Self::kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldParseError {
    kind: FieldParseErrorKind,
    code: ReturnCode,
}

impl FieldParseError {
    pub(crate) fn from_code(code: ReturnCode) -> Self {
        let kind = if code.is_sentinel() {
            FieldParseErrorKind::Missing
        } else if code.is_invalid_quoted_field() {
            FieldParseErrorKind::UnterminatedQuote
        } else if code.is_overflow() {
            FieldParseErrorKind::Overflow
        } else if code.is_invalid_delimiter() {
            FieldParseErrorKind::TrailingGarbage
        } else if code.is_eof() {
            FieldParseErrorKind::UnexpectedEof
        } else {
            FieldParseErrorKind::InvalidValue
        };
        Self { kind, code }
    }

    /// The coarse-grained reason this field failed to parse.
    #[inline]
    pub fn kind(&self) -> FieldParseErrorKind {
        self.kind
    }

    /// The full [`ReturnCode`] the pipeline produced.
    #[inline]
    pub fn code(&self) -> ReturnCode {
        self.code
    }
}

impl fmt::Display for FieldParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code = {:#06x})", self.kind, self.code.bits())
    }
}

impl std::error::Error for FieldParseError {}

/// A top-level error from a [`Source`](crate::source::Source)-driven parse, wrapping either a
/// [`FieldParseError`] or the I/O error that produced it.
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// The field itself did not parse; see [`FieldParseError`] for detail.
    Field(FieldParseError),
    /// Reading from the underlying stream failed.
    Io(io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Field(e) => fmt::Display::fmt(e, f),
            ParseError::Io(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Field(e) => Some(e),
            ParseError::Io(e) => Some(e),
        }
    }
}

impl From<FieldParseError> for ParseError {
    fn from(e: FieldParseError) -> Self {
        ParseError::Field(e)
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unterminated_quote_takes_priority_in_kind_classification() {
        let code = ReturnCode::INVALID_QUOTED_FIELD | ReturnCode::EOF;
        let err = FieldParseError::from_code(code);
        assert_eq!(err.kind(), FieldParseErrorKind::UnterminatedQuote);
    }

    #[test]
    fn overflow_is_classified_as_overflow_not_invalid_value() {
        let code = ReturnCode::OVERFLOW;
        let err = FieldParseError::from_code(code);
        assert_eq!(err.kind(), FieldParseErrorKind::Overflow);
    }

    #[test]
    fn display_includes_the_return_code_bits() {
        let err = FieldParseError::from_code(ReturnCode::OVERFLOW);
        let rendered = err.to_string();
        assert!(rendered.contains("overflowed"));
    }
}
