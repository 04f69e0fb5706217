//! The immutable [`Options`] snapshot shared by every layer of a parse.

use core::fmt;

/// The configured delimiter between fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delimiter {
    /// No delimiter is configured; fields run until EOF or a newline.
    None,
    /// A single-byte delimiter.
    Byte(u8),
    /// A multi-byte delimiter string.
    Bytes(Box<[u8]>),
}

impl Delimiter {
    /// The delimiter's first byte, if any.
    #[inline]
    fn first_byte(&self) -> Option<u8> {
        match self {
            Delimiter::None => None,
            Delimiter::Byte(b) => Some(*b),
            Delimiter::Bytes(bytes) => bytes.first().copied(),
        }
    }

    /// The delimiter's byte representation, if any.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Delimiter::None => None,
            Delimiter::Byte(b) => Some(core::slice::from_ref(b)),
            Delimiter::Bytes(bytes) => Some(bytes),
        }
    }
}

/// The configured sentinel set, recognized as a "missing value" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentinel {
    /// No sentinel is checked for.
    None,
    /// An empty field is treated as missing.
    Empty,
    /// A non-empty set of byte strings, sorted longest-first (ties broken by insertion order).
    Values(Box<[Box<[u8]>]>),
}

impl Sentinel {
    /// The configured sentinel values in match order, or an empty slice if none/empty-only.
    #[inline]
    pub fn values(&self) -> &[Box<[u8]>] {
        match self {
            Sentinel::Values(values) => values,
            Sentinel::None | Sentinel::Empty => &[],
        }
    }

    /// Whether an empty field should be treated as missing.
    #[inline]
    pub fn treats_empty_as_missing(&self) -> bool {
        matches!(self, Sentinel::Empty)
    }

    /// Whether any sentinel check applies at all.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Sentinel::None)
    }
}

/// An error produced when an [`OptionsBuilder`] is given an inconsistent configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OptionsError {
    /// `oq`, `cq`, or `e` was not an ASCII byte while quoting was enabled.
    NonAsciiQuoteByte,
    /// The delimiter collided with one of `oq`, `cq`, `e`, `wh1`, or `wh2` while quoting was
    /// enabled.
    DelimiterCollidesWithQuoting,
    /// A sentinel began with `wh1`, `wh2`, `oq`, `cq`, `e`, or the delimiter's leading byte(s).
    SentinelCollidesWithFraming {
        /// The offending sentinel's index in the order it was added.
        index: usize,
    },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::NonAsciiQuoteByte => {
                write!(f, "open-quote, close-quote and escape bytes must be ASCII")
            }
            OptionsError::DelimiterCollidesWithQuoting => write!(
                f,
                "delimiter must differ from the quote/escape/whitespace bytes"
            ),
            OptionsError::SentinelCollidesWithFraming { index } => write!(
                f,
                "sentinel #{index} begins with a whitespace, quote, escape or delimiter byte"
            ),
        }
    }
}

impl std::error::Error for OptionsError {}

/// Immutable configuration shared by every layer of a single parse.
///
/// Built once via [`OptionsBuilder`] and cheaply [`Clone`]able across worker threads, each of
/// which owns its own [`Source`](crate::source::Source).
#[derive(Debug, Clone)]
pub struct Options {
    pub(crate) sentinel: Sentinel,
    pub(crate) wh1: u8,
    pub(crate) wh2: u8,
    pub(crate) quoted: bool,
    pub(crate) oq: u8,
    pub(crate) cq: u8,
    pub(crate) e: u8,
    pub(crate) delim: Delimiter,
    pub(crate) decimal: u8,
    pub(crate) trues: Option<Box<[Box<[u8]>]>>,
    pub(crate) falses: Option<Box<[Box<[u8]>]>>,
    pub(crate) dateformat: Option<Box<str>>,
    pub(crate) ignore_repeated: bool,
    pub(crate) ignore_empty_lines: bool,
    pub(crate) comment: Option<Box<[u8]>>,
    pub(crate) strip_whitespace: bool,
    pub(crate) strip_quoted: bool,
}

impl Options {
    /// Starts building a new options snapshot with the given delimiter and otherwise default
    /// values (double-quote for `oq`/`cq`/`e`, space/tab for `wh1`/`wh2`, no sentinel).
    #[inline]
    pub fn builder(delim: Delimiter) -> OptionsBuilder {
        OptionsBuilder::new(delim)
    }

    #[inline]
    pub(crate) fn sentinel(&self) -> &Sentinel {
        &self.sentinel
    }

    #[inline]
    pub(crate) fn delim(&self) -> &Delimiter {
        &self.delim
    }

    /// The escape byte consulted by the quoted-field scanner and by [`crate::get_string`].
    #[inline]
    pub fn escape_byte(&self) -> u8 {
        self.e
    }
}

/// Builder for [`Options`], mirroring the chained-setter style of configuration builders
/// elsewhere in the crate.
#[derive(Debug, Clone)]
pub struct OptionsBuilder {
    sentinel_values: Vec<Box<[u8]>>,
    empty_as_missing: bool,
    wh1: u8,
    wh2: u8,
    quoted: bool,
    oq: u8,
    cq: u8,
    e: u8,
    delim: Delimiter,
    decimal: u8,
    trues: Option<Vec<Box<[u8]>>>,
    falses: Option<Vec<Box<[u8]>>>,
    dateformat: Option<Box<str>>,
    ignore_repeated: bool,
    ignore_empty_lines: bool,
    comment: Option<Box<[u8]>>,
    strip_whitespace: bool,
    strip_quoted: bool,
}

impl OptionsBuilder {
    /// Creates a new builder for the given delimiter with otherwise-default settings.
    pub fn new(delim: Delimiter) -> Self {
        Self {
            sentinel_values: Vec::new(),
            empty_as_missing: false,
            wh1: b' ',
            wh2: b'\t',
            quoted: true,
            oq: b'"',
            cq: b'"',
            e: b'"',
            delim,
            decimal: b'.',
            trues: None,
            falses: None,
            dateformat: None,
            ignore_repeated: false,
            ignore_empty_lines: false,
            comment: None,
            strip_whitespace: false,
            strip_quoted: false,
        }
    }

    /// Adds a sentinel value, in longest-first match priority among equal-priority ties broken
    /// by insertion order (the final sort is applied in [`build`](Self::build)).
    pub fn sentinel(&mut self, value: impl Into<Box<[u8]>>) -> &mut Self {
        self.sentinel_values.push(value.into());
        self
    }

    /// Treats an empty field as missing. Mutually exclusive with explicit sentinel values at the
    /// data-model level, but harmless to combine: an empty field is always the shortest possible
    /// match, so explicit non-empty sentinels still take priority by length.
    pub fn empty_as_missing(&mut self, value: bool) -> &mut Self {
        self.empty_as_missing = value;
        self
    }

    /// Sets the two whitespace bytes recognized for stripping (typically space and tab).
    pub fn whitespace(&mut self, wh1: u8, wh2: u8) -> &mut Self {
        self.wh1 = wh1;
        self.wh2 = wh2;
        self
    }

    /// Enables or disables quoted-field recognition and sets the open-quote, close-quote and
    /// escape bytes consulted when it is enabled.
    pub fn quoted(&mut self, enabled: bool, oq: u8, cq: u8, e: u8) -> &mut Self {
        self.quoted = enabled;
        self.oq = oq;
        self.cq = cq;
        self.e = e;
        self
    }

    /// Sets the decimal-point byte consumed by float type parsers.
    pub fn decimal(&mut self, decimal: u8) -> &mut Self {
        self.decimal = decimal;
        self
    }

    /// Sets the token sets recognized as boolean `true`/`false` by bool type parsers.
    pub fn bools(
        &mut self,
        trues: Option<Vec<Box<[u8]>>>,
        falses: Option<Vec<Box<[u8]>>>,
    ) -> &mut Self {
        self.trues = trues;
        self.falses = falses;
        self
    }

    /// Sets the date/time pattern consumed by date type parsers.
    pub fn dateformat(&mut self, pattern: impl Into<Box<str>>) -> &mut Self {
        self.dateformat = Some(pattern.into());
        self
    }

    /// Collapses consecutive delimiters/newlines into a single separator.
    pub fn ignore_repeated(&mut self, value: bool) -> &mut Self {
        self.ignore_repeated = value;
        self
    }

    /// After a newline, consumes further empty lines.
    pub fn ignore_empty_lines(&mut self, value: bool) -> &mut Self {
        self.ignore_empty_lines = value;
        self
    }

    /// Sets the comment marker; when matched at line start, the rest of the line is consumed.
    pub fn comment(&mut self, marker: impl Into<Box<[u8]>>) -> &mut Self {
        self.comment = Some(marker.into());
        self
    }

    /// Strips whitespace outside quotes (and always around quotes for quoted/string types).
    pub fn strip_whitespace(&mut self, value: bool) -> &mut Self {
        self.strip_whitespace = value;
        self
    }

    /// Strips whitespace inside quotes as well; implies [`strip_whitespace`](Self::strip_whitespace).
    pub fn strip_quoted(&mut self, value: bool) -> &mut Self {
        self.strip_quoted = value;
        if value {
            self.strip_whitespace = true;
        }
        self
    }

    /// Validates the accumulated configuration and produces an immutable [`Options`] snapshot.
    pub fn build(&self) -> Result<Options, OptionsError> {
        if self.quoted && (self.oq >= 0x80 || self.cq >= 0x80 || self.e >= 0x80) {
            return Err(OptionsError::NonAsciiQuoteByte);
        }

        if self.quoted {
            if let Some(delim_first) = self.delim.first_byte() {
                if delim_first == self.oq
                    || delim_first == self.cq
                    || delim_first == self.e
                    || delim_first == self.wh1
                    || delim_first == self.wh2
                {
                    return Err(OptionsError::DelimiterCollidesWithQuoting);
                }
            }
        }

        let mut sentinel_values = self.sentinel_values.clone();
        for (index, value) in sentinel_values.iter().enumerate() {
            if let Some(&first) = value.first() {
                let collides = first == self.wh1
                    || first == self.wh2
                    || (self.quoted && (first == self.oq || first == self.cq || first == self.e))
                    || self.delim.first_byte() == Some(first);
                if collides {
                    return Err(OptionsError::SentinelCollidesWithFraming { index });
                }
            }
        }

        // Stable sort, longest-first; ties keep insertion order because the sort is stable.
        sentinel_values.sort_by(|a, b| b.len().cmp(&a.len()));

        let sentinel = if !sentinel_values.is_empty() {
            Sentinel::Values(sentinel_values.into_boxed_slice())
        } else if self.empty_as_missing {
            Sentinel::Empty
        } else {
            Sentinel::None
        };

        #[cfg(feature = "logging")]
        log::debug!(
            "field parser options: delim={:?} quoted={} sentinel_count={}",
            self.delim,
            self.quoted,
            sentinel.values().len(),
        );

        Ok(Options {
            sentinel,
            wh1: self.wh1,
            wh2: self.wh2,
            quoted: self.quoted,
            oq: self.oq,
            cq: self.cq,
            e: self.e,
            delim: self.delim.clone(),
            decimal: self.decimal,
            trues: self.trues.clone().map(Vec::into_boxed_slice),
            falses: self.falses.clone().map(Vec::into_boxed_slice),
            dateformat: self.dateformat.clone(),
            ignore_repeated: self.ignore_repeated,
            ignore_empty_lines: self.ignore_empty_lines,
            comment: self.comment.clone(),
            strip_whitespace: self.strip_whitespace,
            strip_quoted: self.strip_quoted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_comma_options_build() {
        let opts = OptionsBuilder::new(Delimiter::Byte(b','))
            .build()
            .expect("valid options");
        assert!(opts.quoted);
        assert_eq!(opts.oq, b'"');
    }

    #[test]
    fn sentinels_are_sorted_longest_first_stable() {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b','));
        builder.sentinel(*b"NA");
        builder.sentinel(*b"N/A");
        builder.sentinel(*b"NULL");
        builder.sentinel(*b"na");
        let opts = builder.build().expect("valid options");
        let lens: Vec<usize> = opts.sentinel().values().iter().map(|v| v.len()).collect();
        assert_eq!(lens, vec![4, 3, 2, 2]);
        assert_eq!(&*opts.sentinel().values()[2], b"NA");
        assert_eq!(&*opts.sentinel().values()[3], b"na");
    }

    #[test]
    fn non_ascii_quote_byte_rejected() {
        let err = OptionsBuilder::new(Delimiter::Byte(b','))
            .quoted(true, 0x80, b'"', b'"')
            .build()
            .unwrap_err();
        assert_eq!(err, OptionsError::NonAsciiQuoteByte);
    }

    #[test]
    fn delimiter_colliding_with_quote_rejected() {
        let err = OptionsBuilder::new(Delimiter::Byte(b'"'))
            .build()
            .unwrap_err();
        assert_eq!(err, OptionsError::DelimiterCollidesWithQuoting);
    }

    #[test]
    fn sentinel_colliding_with_whitespace_rejected() {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b','));
        builder.sentinel(*b" NA");
        let err = builder.build().unwrap_err();
        assert_eq!(err, OptionsError::SentinelCollidesWithFraming { index: 0 });
    }

    #[test]
    fn strip_quoted_implies_strip_whitespace() {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b','));
        builder.strip_quoted(true);
        let opts = builder.build().expect("valid options");
        assert!(opts.strip_quoted);
        assert!(opts.strip_whitespace);
    }
}
