//! The public entry points: full and condensed pipeline composition, plus the high-level
//! `Result`-returning wrappers built on top of them.

use crate::error::FieldParseError;
use crate::layers::{
    delimiter_layer, empty_sentinel_layer, quoted_layer, sentinel_layer, whitespace_layer,
    LayerOutcome,
};
use crate::options::Options;
use crate::poslen::PosLen;
use crate::return_code::ReturnCode;
use crate::source::{Source, Window};
use crate::type_parser::TypeParser;

pub use crate::layers::{check_delim, get_string};

/// The outcome of a single [`xparse`]/[`xparse2`] call.
#[derive(Debug, Clone, Copy)]
pub struct ParseResult<T> {
    /// The full return code accumulated across every layer.
    pub code: ReturnCode,
    /// The total number of bytes consumed from the window, including any trailing delimiter or
    /// newline.
    pub tlen: u64,
    /// The parsed value, or `None` if the field was missing, invalid, or truncated at EOF.
    pub val: Option<T>,
}

fn invoke_type_parser<S: Source, P: TypeParser>(
    win: &mut Window<'_, S>,
    opts: &Options,
    code: ReturnCode,
    pl: PosLen,
) -> LayerOutcome<P::Value> {
    if win.eof() {
        return LayerOutcome {
            code: code | ReturnCode::INVALID | ReturnCode::EOF,
            pl,
            val: None,
        };
    }
    let first_byte = win.peek();
    let (code, pl, val) = P::parse(win, opts, first_byte, code, pl);
    LayerOutcome { code, pl, val }
}

/// Runs the full layer pipeline over `source[pos, pos + len)`:
/// `Delimiter ← EmptySentinel ← Whitespace ← Quoted ← Whitespace ← Sentinel ← TypeParser`.
///
/// This is the entry point a host parsing a full delimited record uses for each field: it
/// recognizes quoting, sentinels, surrounding whitespace and the trailing delimiter/newline in a
/// single pass.
pub fn xparse<S: Source, P: TypeParser>(
    source: &mut S,
    pos: u64,
    len: u64,
    opts: &Options,
) -> ParseResult<P::Value> {
    let mut win = Window::new(source, pos, len);
    let pl0 = PosLen::new(pos);

    let outcome = delimiter_layer::<S, P>(&mut win, opts, ReturnCode::new(), pl0, |win, opts, code, pl| {
        empty_sentinel_layer::<S, P>(win, opts, code, pl, |win, opts, code, pl| {
            whitespace_layer::<S, P>(win, opts, code, pl, |win, opts, code, pl| {
                quoted_layer::<S, P>(win, opts, code, pl, |win, opts, code, pl| {
                    whitespace_layer::<S, P>(win, opts, code, pl, |win, opts, code, pl| {
                        sentinel_layer::<S, P>(win, opts, code, pl, |win, opts, code, pl| {
                            invoke_type_parser::<S, P>(win, opts, code, pl)
                        })
                    })
                })
            })
        })
    });

    ParseResult {
        code: outcome.code,
        tlen: win.position() - pos,
        val: outcome.val,
    }
}

/// Runs the condensed pipeline: `Sentinel ← TypeParser`.
///
/// For hosts that have already located a field's exact `[pos, len)` bounds themselves (for
/// example, from a prior full-record scan) and only need sentinel recognition plus value
/// conversion, without quoting, whitespace stripping, or delimiter discovery.
pub fn xparse2<S: Source, P: TypeParser>(
    source: &mut S,
    pos: u64,
    len: u64,
    opts: &Options,
) -> ParseResult<P::Value> {
    let mut win = Window::new(source, pos, len);
    let pl0 = PosLen::new(pos);

    let outcome = sentinel_layer::<S, P>(&mut win, opts, ReturnCode::new(), pl0, |win, opts, code, pl| {
        invoke_type_parser::<S, P>(win, opts, code, pl)
    });

    ParseResult {
        code: outcome.code,
        tlen: win.position() - pos,
        val: outcome.val,
    }
}

/// Runs [`xparse`] and translates its [`ReturnCode`] into a `Result`: `Ok(None)` when the field
/// matched a sentinel (or was empty with empty-as-missing enabled), `Ok(Some(value))` on success,
/// `Err` for anything else (invalid value, overflow, unterminated quote, trailing garbage, or an
/// unexpected EOF).
pub fn try_parse<S: Source, P: TypeParser>(
    source: &mut S,
    pos: u64,
    len: u64,
    opts: &Options,
) -> Result<Option<P::Value>, FieldParseError> {
    let result = xparse::<S, P>(source, pos, len, opts);
    if result.code.is_sentinel() {
        return Ok(None);
    }
    if !result.code.is_ok() {
        return Err(FieldParseError::from_code(result.code));
    }
    Ok(result.val)
}

/// Like [`try_parse`], but a missing field is itself reported as an error
/// ([`FieldParseErrorKind::Missing`](crate::error::FieldParseErrorKind::Missing)) rather than
/// `Ok(None)`, for callers parsing a required field.
pub fn parse<S: Source, P: TypeParser>(
    source: &mut S,
    pos: u64,
    len: u64,
    opts: &Options,
) -> Result<P::Value, FieldParseError> {
    let result = xparse::<S, P>(source, pos, len, opts);
    if !result.code.is_ok() {
        return Err(FieldParseError::from_code(result.code));
    }
    Ok(result.val.expect("is_ok() implies a value was produced"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Delimiter, OptionsBuilder};
    use crate::source::SliceSource;
    use crate::types::{Bool, Float, Integer, StringField};

    fn opts(build: impl FnOnce(&mut OptionsBuilder)) -> Options {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b','));
        build(&mut builder);
        builder.build().expect("valid options")
    }

    #[test]
    fn xparse_parses_unquoted_integer_field() {
        let o = opts(|_| {});
        let mut source = SliceSource::new(b"42,rest");
        let result = xparse::<_, Integer>(&mut source, 0, 7, &o);
        assert!(result.code.is_ok());
        assert_eq!(result.val, Some(42));
        assert!(result.code.is_delimited());
    }

    #[test]
    fn xparse_strips_surrounding_whitespace_when_enabled() {
        let o = opts(|b| {
            b.strip_whitespace(true);
        });
        let mut source = SliceSource::new(b"  42  ,rest");
        let result = xparse::<_, Integer>(&mut source, 0, 11, &o);
        assert!(result.code.is_ok());
        assert_eq!(result.val, Some(42));
    }

    #[test]
    fn xparse_recognizes_quoted_strings_with_escape() {
        let o = opts(|_| {});
        let mut source = SliceSource::new(br#""hel""lo",rest"#);
        let result = xparse::<_, StringField>(&mut source, 0, 15, &o);
        assert!(result.code.is_ok());
        assert!(result.code.is_escaped_string());
        let pl = result.val.unwrap();
        let decoded = get_string(&source, pl, o.escape_byte());
        assert_eq!(decoded, b"hel\"lo");
    }

    #[test]
    fn xparse_reports_sentinel_as_missing() {
        let o = opts(|b| {
            b.sentinel(*b"NA");
        });
        let mut source = SliceSource::new(b"NA,rest");
        let result = try_parse::<_, Integer>(&mut source, 0, 7, &o).expect("not an error");
        assert_eq!(result, None);
    }

    #[test]
    fn parse_reports_missing_as_error() {
        let o = opts(|b| {
            b.sentinel(*b"NA");
        });
        let mut source = SliceSource::new(b"NA,rest");
        let err = parse::<_, Integer>(&mut source, 0, 7, &o).unwrap_err();
        assert_eq!(
            err.kind(),
            crate::error::FieldParseErrorKind::Missing
        );
    }

    #[test]
    fn xparse_reports_overflow_for_integer() {
        let o = opts(|_| {});
        let mut source = SliceSource::new(b"99999999999999999999,rest");
        let result = xparse::<_, Integer>(&mut source, 0, 26, &o);
        assert!(result.code.is_overflow());
        assert!(!result.code.is_ok());
    }

    #[test]
    fn xparse_parses_bool_and_float_fields() {
        let o = opts(|_| {});

        let mut source = SliceSource::new(b"true,1.5");
        let r1 = xparse::<_, Bool>(&mut source, 0, 4, &o);
        assert_eq!(r1.val, Some(true));

        let mut source2 = SliceSource::new(b"1.5");
        let r2 = xparse::<_, Float>(&mut source2, 0, 3, &o);
        assert_eq!(r2.val, Some(1.5));
    }

    #[test]
    fn xparse2_skips_quoting_and_delimiter_discovery() {
        let o = opts(|b| {
            b.sentinel(*b"NULL");
        });
        let mut source = SliceSource::new(b"123");
        let result = xparse2::<_, Integer>(&mut source, 0, 3, &o);
        assert!(result.code.is_ok());
        assert_eq!(result.val, Some(123));
    }
}
