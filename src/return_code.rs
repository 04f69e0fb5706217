//! The layered return-code bitmask that every parsing layer reads and writes.

use bitflags::bitflags;

bitflags! {
    /// Bit-flags describing the outcome of a single field parse.
    ///
    /// The bit positions are load-bearing: bit 15 is the sign bit of the codes's `i16`
    /// representation and is set by every `INVALID_*` composite, so a single
    /// [`ReturnCode::is_invalid`] check (equivalently `as_i16() < 0`) detects any error a layer
    /// may have raised, no matter which layer raised it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReturnCode: u16 {
        /// The type parser produced a value.
        const OK = 1 << 0;
        /// The field matched a configured sentinel; the value is "missing".
        const SENTINEL = 1 << 1;
        /// The field began with the open-quote byte.
        const QUOTED = 1 << 2;
        /// The field ended at a delimiter match.
        const DELIMITED = 1 << 3;
        /// The field ended at a newline.
        const NEWLINE = 1 << 4;
        /// Parsing reached the end of input.
        const EOF = 1 << 5;
        /// Reason bit: a quoted field had a dangling escape or no close quote.
        const INVALID_QUOTED_FIELD_REASON = 1 << 6;
        /// Reason bit: extra bytes were found between the value and its delimiter.
        const INVALID_DELIMITER_REASON = 1 << 7;
        /// Reason bit: the type parser hit numeric overflow.
        const OVERFLOW_REASON = 1 << 8;
        /// A quoted field contained at least one escape sequence.
        const ESCAPED_STRING = 1 << 9;
        /// Sign bit. Set by any `INVALID_*` composite; tested by [`ReturnCode::is_invalid`].
        const INVALID = 1 << 15;

        /// Dangling escape or missing close quote.
        const INVALID_QUOTED_FIELD = Self::INVALID_QUOTED_FIELD_REASON.bits() | Self::INVALID.bits();
        /// Extra bytes found between the value and its delimiter.
        const INVALID_DELIMITER = Self::INVALID_DELIMITER_REASON.bits() | Self::INVALID.bits();
        /// Type parser numeric overflow.
        const OVERFLOW = Self::OVERFLOW_REASON.bits() | Self::INVALID.bits();
    }
}

impl ReturnCode {
    /// The initial, all-zero code that a layer chain starts from.
    #[inline]
    pub const fn new() -> Self {
        Self::empty()
    }

    /// The code reinterpreted as a signed 16-bit integer.
    ///
    /// `as_i16() < 0` is equivalent to [`is_invalid`](Self::is_invalid); it exists for parity
    /// with hosts that want to test the sign bit directly.
    #[inline]
    pub const fn as_i16(self) -> i16 {
        self.bits() as i16
    }

    /// Whether any condition was raised at all (the code is not the zero/initial state).
    #[inline]
    pub const fn succeeded(self) -> bool {
        self.as_i16() > 0
    }

    /// Whether the type parser produced a value and no invalid condition was raised.
    #[inline]
    pub const fn is_ok(self) -> bool {
        self.contains(Self::OK) && !self.contains(Self::INVALID)
    }

    /// Whether the sign bit is set, i.e. some layer raised an invalid condition.
    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.as_i16() < 0
    }

    /// Whether the field matched a configured sentinel.
    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.contains(Self::SENTINEL)
    }

    /// Whether the field began with the open-quote byte.
    #[inline]
    pub const fn is_quoted(self) -> bool {
        self.contains(Self::QUOTED)
    }

    /// Whether the field ended at a delimiter match.
    #[inline]
    pub const fn is_delimited(self) -> bool {
        self.contains(Self::DELIMITED)
    }

    /// Whether the field ended at a newline.
    #[inline]
    pub const fn is_newline(self) -> bool {
        self.contains(Self::NEWLINE)
    }

    /// Whether parsing reached the end of input.
    #[inline]
    pub const fn is_eof(self) -> bool {
        self.contains(Self::EOF)
    }

    /// Whether a quoted field contained at least one escape sequence.
    #[inline]
    pub const fn is_escaped_string(self) -> bool {
        self.contains(Self::ESCAPED_STRING)
    }

    /// Whether the field was an unterminated or otherwise malformed quoted field.
    #[inline]
    pub const fn is_invalid_quoted_field(self) -> bool {
        self.contains(Self::INVALID_QUOTED_FIELD_REASON)
    }

    /// Whether extra bytes were found between the value and its delimiter.
    #[inline]
    pub const fn is_invalid_delimiter(self) -> bool {
        self.contains(Self::INVALID_DELIMITER_REASON)
    }

    /// Whether the type parser hit numeric overflow.
    #[inline]
    pub const fn is_overflow(self) -> bool {
        self.contains(Self::OVERFLOW_REASON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_code_is_initial_state() {
        let code = ReturnCode::new();
        assert!(!code.succeeded());
        assert!(!code.is_ok());
        assert!(!code.is_invalid());
    }

    #[test]
    fn invalid_composites_set_sign_bit() {
        for code in [
            ReturnCode::INVALID_QUOTED_FIELD,
            ReturnCode::INVALID_DELIMITER,
            ReturnCode::OVERFLOW,
        ] {
            assert!(code.is_invalid());
            assert!(code.as_i16() < 0);
        }
    }

    #[test]
    fn ok_and_sentinel_are_mutually_exclusive_in_practice_but_not_by_construction() {
        let ok = ReturnCode::OK | ReturnCode::DELIMITED;
        assert!(ok.is_ok());
        assert!(!ok.is_invalid());

        let sentinel = ReturnCode::SENTINEL | ReturnCode::DELIMITED;
        assert!(!sentinel.is_ok());
        assert!(sentinel.is_sentinel());
    }

    #[test]
    fn overflow_implies_invalid_and_not_ok() {
        let code = ReturnCode::OVERFLOW | ReturnCode::DELIMITED;
        assert!(code.is_overflow());
        assert!(code.is_invalid());
        assert!(!code.is_ok());
    }
}
