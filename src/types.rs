//! Reference [`TypeParser`] plug-ins.
//!
//! These are intentionally simple: a digit loop with checked arithmetic, a small on-stack
//! grammar scan handed to [`f64::from_str`]/[`str::parse`], and literal token matching for
//! booleans. High-performance digit loops, Ryu-quality float formatting and date-pattern
//! interpretation are explicitly out of scope for this crate (see `SPEC_FULL.md`) — a host that
//! needs those implements [`TypeParser`] itself and plugs it into the same pipeline.

use core::str::FromStr;

use crate::layers::scan_close_quote;
use crate::options::{Delimiter, Options};
use crate::poslen::PosLen;
use crate::return_code::ReturnCode;
use crate::source::{Source, Window};
use crate::type_parser::TypeParser;

/// Peeks whether the delimiter or a newline starts at the current position, restoring the
/// cursor afterward either way. Used by greedy type parsers to find their own field boundary
/// without consuming the terminator (that remains the [`Delimiter`](crate::layers::delimiter_layer)
/// layer's job).
fn peeks_boundary<S: Source>(win: &mut Window<'_, S>, opts: &Options) -> bool {
    if win.eof() {
        return true;
    }
    let start = win.position();
    let matched = match opts.delim() {
        Delimiter::None => false,
        Delimiter::Byte(d) => win.peek() == *d,
        Delimiter::Bytes(bytes) => win.probe_matches(bytes),
    };
    win.seek(start);
    if matched {
        return true;
    }
    matches!(win.peek(), b'\n' | b'\r')
}

/// The greedy, string-like type: its value *is* the field's [`PosLen`].
///
/// A sentinel-like type in the sense of the data model's `Result<T>`: when `T` is `StringField`,
/// `val` is exactly the accumulated `pl`.
pub struct StringField;

impl TypeParser for StringField {
    type Value = PosLen;
    const GREEDY: bool = true;

    fn parse<S: Source>(
        win: &mut Window<'_, S>,
        opts: &Options,
        _first_byte: u8,
        mut code: ReturnCode,
        mut pl: PosLen,
    ) -> (ReturnCode, PosLen, Option<Self::Value>) {
        if code.is_quoted() {
            let (scan_code, scanned) = scan_close_quote(win, opts, pl, true);
            code |= scan_code;
            pl = scanned;
        } else {
            loop {
                if peeks_boundary(win, opts) {
                    if win.eof() {
                        code |= ReturnCode::EOF;
                    }
                    break;
                }
                win.advance();
                pl = pl.extend_by_one();
            }
        }

        code |= ReturnCode::OK;
        (code, pl, Some(pl))
    }
}

/// An unbounded decimal integer, modeled on [`i64`].
pub struct Integer;

impl TypeParser for Integer {
    type Value = i64;
    const GREEDY: bool = false;

    fn parse<S: Source>(
        win: &mut Window<'_, S>,
        _opts: &Options,
        first_byte: u8,
        mut code: ReturnCode,
        pl: PosLen,
    ) -> (ReturnCode, PosLen, Option<Self::Value>) {
        let negative = match first_byte {
            b'-' => {
                win.advance();
                true
            }
            b'+' => {
                win.advance();
                false
            }
            _ => false,
        };

        let mut digits = 0u32;
        let mut magnitude: i64 = 0;
        let mut overflowed = false;

        while !win.eof() {
            let b = win.peek();
            if !b.is_ascii_digit() {
                break;
            }
            win.advance();
            digits += 1;
            let digit = i64::from(b - b'0');
            match magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit))
            {
                Some(next) => magnitude = next,
                None => overflowed = true,
            }
        }

        if digits == 0 {
            code |= ReturnCode::INVALID;
            return (code, pl, None);
        }

        if overflowed {
            code |= ReturnCode::OVERFLOW;
            return (code, pl, None);
        }

        let value = if negative { -magnitude } else { magnitude };

        code |= ReturnCode::OK;
        (code, pl, Some(value))
    }
}

/// A floating-point value, modeled on [`f64`].
///
/// Scans a float-shaped run of bytes (optional sign, digits, an optional `decimal`-byte
/// fraction, an optional exponent) into a small stack buffer, substitutes `decimal` for `.` if
/// needed, and hands the buffer to [`f64::from_str`].
pub struct Float;

impl TypeParser for Float {
    type Value = f64;
    const GREEDY: bool = false;

    fn parse<S: Source>(
        win: &mut Window<'_, S>,
        opts: &Options,
        first_byte: u8,
        mut code: ReturnCode,
        pl: PosLen,
    ) -> (ReturnCode, PosLen, Option<Self::Value>) {
        let mut buf = [0u8; 64];
        let mut n = 0;
        let mut push = |byte: u8, buf: &mut [u8; 64], n: &mut usize| -> bool {
            if *n >= buf.len() {
                return false;
            }
            buf[*n] = byte;
            *n += 1;
            true
        };

        let mut b = first_byte;
        if b == b'+' || b == b'-' {
            if !push(b, &mut buf, &mut n) {
                code |= ReturnCode::INVALID;
                return (code, pl, None);
            }
            win.advance();
            if win.eof() {
                code |= ReturnCode::INVALID | ReturnCode::EOF;
                return (code, pl, None);
            }
            b = win.peek();
        }

        let mut saw_digit = false;
        while !win.eof() && win.peek().is_ascii_digit() {
            b = win.peek();
            saw_digit = true;
            if !push(b, &mut buf, &mut n) {
                break;
            }
            win.advance();
        }

        if !win.eof() && win.peek() == opts.decimal {
            win.advance();
            if !push(b'.', &mut buf, &mut n) {
                code |= ReturnCode::INVALID;
                return (code, pl, None);
            }
            while !win.eof() && win.peek().is_ascii_digit() {
                saw_digit = true;
                let d = win.peek();
                if !push(d, &mut buf, &mut n) {
                    break;
                }
                win.advance();
            }
        }

        if !saw_digit {
            code |= ReturnCode::INVALID;
            return (code, pl, None);
        }

        if !win.eof() && matches!(win.peek(), b'e' | b'E') {
            let mark_n = n;
            let mark_pos = win.position();
            let exp_byte = win.peek();
            win.advance();
            let mut ok_exponent = push(exp_byte, &mut buf, &mut n);

            if ok_exponent {
                if !win.eof() && matches!(win.peek(), b'+' | b'-') {
                    let sign = win.peek();
                    win.advance();
                    ok_exponent = push(sign, &mut buf, &mut n);
                }
            }

            let mut saw_exp_digit = false;
            if ok_exponent {
                while !win.eof() && win.peek().is_ascii_digit() {
                    saw_exp_digit = true;
                    let d = win.peek();
                    if !push(d, &mut buf, &mut n) {
                        break;
                    }
                    win.advance();
                }
            }

            if !ok_exponent || !saw_exp_digit {
                // Not a well-formed exponent (e.g. "3e" or "3efoo"); leave the 'e' and whatever
                // followed it unconsumed so the delimiter layer flags it as trailing garbage.
                win.seek(mark_pos);
                n = mark_n;
            }
        }

        match core::str::from_utf8(&buf[..n]).ok().and_then(|s| f64::from_str(s).ok()) {
            Some(value) => {
                code |= ReturnCode::OK;
                (code, pl, Some(value))
            }
            None => {
                code |= ReturnCode::INVALID;
                (code, pl, None)
            }
        }
    }
}

/// A boolean value, matched against the configured `trues`/`falses` token sets (default
/// `"true"`/`"false"`, case-sensitive).
pub struct Bool;

const DEFAULT_TRUE: &[u8] = b"true";
const DEFAULT_FALSE: &[u8] = b"false";

impl TypeParser for Bool {
    type Value = bool;
    const GREEDY: bool = false;

    fn parse<S: Source>(
        win: &mut Window<'_, S>,
        opts: &Options,
        _first_byte: u8,
        mut code: ReturnCode,
        pl: PosLen,
    ) -> (ReturnCode, PosLen, Option<Self::Value>) {
        let trues = opts.trues.as_deref();
        let falses = opts.falses.as_deref();

        let matches_any = |win: &mut Window<'_, S>, tokens: &[Box<[u8]>]| -> bool {
            for token in tokens {
                if win.probe_matches(token) {
                    return true;
                }
            }
            false
        };

        let matched = match (trues, falses) {
            (Some(trues), Some(falses)) => {
                if matches_any(win, trues) {
                    Some(true)
                } else if matches_any(win, falses) {
                    Some(false)
                } else {
                    None
                }
            }
            _ => {
                if win.probe_matches(DEFAULT_TRUE) {
                    Some(true)
                } else if win.probe_matches(DEFAULT_FALSE) {
                    Some(false)
                } else {
                    None
                }
            }
        };

        match matched {
            Some(value) => {
                code |= ReturnCode::OK;
                (code, pl, Some(value))
            }
            None => {
                code |= ReturnCode::INVALID;
                (code, pl, None)
            }
        }
    }
}

/// Generic fallback [`TypeParser`]: a string-like type that decodes its own bytes (honoring
/// quoting/escaping) into a local buffer and hands the result to a host-supplied
/// [`FromStr`] converter, so any type the host already has a `FromStr` impl for plugs into the
/// pipeline without a dedicated [`TypeParser`].
///
/// Unlike [`StringField`], this type owns its buffer directly rather than leaving the bytes in
/// the source, since it must decode escapes before [`FromStr::from_str`] ever sees them.
pub struct FromStrField<T>(core::marker::PhantomData<T>);

impl<T> TypeParser for FromStrField<T>
where
    T: FromStr,
{
    type Value = T;
    const GREEDY: bool = true;

    fn parse<S: Source>(
        win: &mut Window<'_, S>,
        opts: &Options,
        _first_byte: u8,
        mut code: ReturnCode,
        mut pl: PosLen,
    ) -> (ReturnCode, PosLen, Option<Self::Value>) {
        let mut buf = Vec::new();

        if code.is_quoted() {
            let same = opts.cq == opts.e;
            loop {
                if win.eof() {
                    code |= ReturnCode::INVALID_QUOTED_FIELD | ReturnCode::EOF;
                    return (code, pl, None);
                }
                let b = win.peek();
                win.advance();
                pl = pl.extend_by_one();

                if same && b == opts.e {
                    if win.eof() {
                        // `b` was the terminating quote, not the start of a doubled-quote escape.
                        pl = pl.with_len(pl.len() - 1);
                        code |= ReturnCode::EOF;
                        break;
                    }
                    if win.peek() != opts.cq {
                        // Same: `b` closed the field rather than opening an escape.
                        pl = pl.with_len(pl.len() - 1);
                        break;
                    }
                    code |= ReturnCode::ESCAPED_STRING;
                    buf.push(opts.cq);
                    win.advance();
                    pl = pl.extend_by_one();
                } else if b == opts.e {
                    code |= ReturnCode::ESCAPED_STRING;
                    if win.eof() {
                        code |= ReturnCode::INVALID_QUOTED_FIELD | ReturnCode::EOF;
                        return (code, pl, None);
                    }
                    let escaped = win.peek();
                    win.advance();
                    pl = pl.extend_by_one();
                    buf.push(escaped);
                } else if b == opts.cq {
                    pl = pl.with_len(pl.len() - 1);
                    break;
                } else {
                    buf.push(b);
                }
            }
        } else {
            loop {
                if peeks_boundary(win, opts) {
                    if win.eof() {
                        code |= ReturnCode::EOF;
                    }
                    break;
                }
                let b = win.peek();
                win.advance();
                pl = pl.extend_by_one();
                buf.push(b);
            }
        }

        match core::str::from_utf8(&buf).ok().and_then(|s| T::from_str(s).ok()) {
            Some(value) => {
                code |= ReturnCode::OK;
                (code, pl, Some(value))
            }
            None => {
                code |= ReturnCode::INVALID;
                (code, pl, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionsBuilder;
    use crate::source::SliceSource;

    fn default_opts() -> Options {
        OptionsBuilder::new(Delimiter::Byte(b','))
            .build()
            .expect("valid options")
    }

    #[test]
    fn integer_parses_simple_value() {
        let opts = default_opts();
        let mut source = SliceSource::new(b"1234,");
        let mut win = Window::new(&mut source, 0, 5);
        let first = win.peek();
        let (code, _pl, val) = Integer::parse(&mut win, &opts, first, ReturnCode::new(), PosLen::new(0));
        assert!(code.is_ok());
        assert_eq!(val, Some(1234));
        assert_eq!(win.position(), 4);
    }

    #[test]
    fn integer_parses_negative_value() {
        let opts = default_opts();
        let mut source = SliceSource::new(b"-42,");
        let mut win = Window::new(&mut source, 0, 4);
        let first = win.peek();
        let (code, _pl, val) = Integer::parse(&mut win, &opts, first, ReturnCode::new(), PosLen::new(0));
        assert!(code.is_ok());
        assert_eq!(val, Some(-42));
    }

    #[test]
    fn integer_reports_invalid_with_no_digits() {
        let opts = default_opts();
        let mut source = SliceSource::new(b"abc,");
        let mut win = Window::new(&mut source, 0, 4);
        let first = win.peek();
        let (code, _pl, val) = Integer::parse(&mut win, &opts, first, ReturnCode::new(), PosLen::new(0));
        assert!(code.is_invalid());
        assert_eq!(val, None);
    }

    #[test]
    fn integer_reports_overflow() {
        let opts = default_opts();
        let mut source = SliceSource::new(b"99999999999999999999,");
        let mut win = Window::new(&mut source, 0, 22);
        let first = win.peek();
        let (code, _pl, val) = Integer::parse(&mut win, &opts, first, ReturnCode::new(), PosLen::new(0));
        assert!(code.is_overflow());
        assert!(code.is_invalid());
        assert_eq!(val, None);
    }

    #[test]
    fn float_parses_decimal_and_exponent() {
        let opts = default_opts();
        let mut source = SliceSource::new(b"3.14e2,");
        let mut win = Window::new(&mut source, 0, 7);
        let first = win.peek();
        let (code, _pl, val) = Float::parse(&mut win, &opts, first, ReturnCode::new(), PosLen::new(0));
        assert!(code.is_ok());
        assert_eq!(val, Some(314.0));
    }

    #[test]
    fn float_respects_custom_decimal_byte() {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b';'));
        builder.decimal(b',');
        let opts = builder.build().expect("valid options");
        let mut source = SliceSource::new(b"3,14;");
        let mut win = Window::new(&mut source, 0, 5);
        let first = win.peek();
        let (code, _pl, val) = Float::parse(&mut win, &opts, first, ReturnCode::new(), PosLen::new(0));
        assert!(code.is_ok());
        assert_eq!(val, Some(3.14));
    }

    #[test]
    fn bool_matches_default_tokens() {
        let opts = default_opts();
        let mut source = SliceSource::new(b"true,");
        let mut win = Window::new(&mut source, 0, 5);
        let first = win.peek();
        let (code, _pl, val) = Bool::parse(&mut win, &opts, first, ReturnCode::new(), PosLen::new(0));
        assert!(code.is_ok());
        assert_eq!(val, Some(true));
    }

    #[test]
    fn bool_matches_custom_tokens() {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b','));
        builder.bools(
            Some(vec![(*b"Y").into()]),
            Some(vec![(*b"N").into()]),
        );
        let opts = builder.build().expect("valid options");
        let mut source = SliceSource::new(b"N,");
        let mut win = Window::new(&mut source, 0, 2);
        let first = win.peek();
        let (code, _pl, val) = Bool::parse(&mut win, &opts, first, ReturnCode::new(), PosLen::new(0));
        assert!(code.is_ok());
        assert_eq!(val, Some(false));
    }

    #[test]
    fn string_field_quoted_with_escape() {
        let opts = default_opts();
        let mut source = SliceSource::new(br#""hel""lo","#);
        let mut win = Window::new(&mut source, 0, 10);
        assert_eq!(win.peek(), b'"');
        win.advance();
        let pl = PosLen::new(win.position());
        let first = win.peek();
        let (code, pl, val) = StringField::parse(
            &mut win,
            &opts,
            first,
            ReturnCode::new() | ReturnCode::QUOTED,
            pl,
        );
        assert!(code.is_ok());
        assert!(code.is_escaped_string());
        let pl = val.unwrap();
        assert_eq!(pl.len(), 7);
    }
}
