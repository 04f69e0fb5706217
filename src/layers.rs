//! The stackable parsing layers described in the data model, plus the standalone
//! delimiter/string utilities built from the same primitives.
//!
//! Every layer shares the same shape: it receives the current [`ReturnCode`]/[`PosLen`] state,
//! does its own pre-processing, calls into its inner layer, then does its own post-processing.
//! Layers are generic over the [`TypeParser`] `P` so they can consult `P::GREEDY` without any
//! dynamic dispatch — the whole stack for a given `{type, options shape}` monomorphizes into one
//! inlined function, per the no-virtual-dispatch guidance this crate follows.

use std::borrow::Cow;

use crate::options::{Delimiter, Options};
use crate::poslen::PosLen;
use crate::return_code::ReturnCode;
use crate::source::{ReaderSource, SliceSource, Source, Window};
use crate::type_parser::TypeParser;

/// The `(code, pl, val)` state threaded between layers.
pub(crate) struct LayerOutcome<T> {
    pub code: ReturnCode,
    pub pl: PosLen,
    pub val: Option<T>,
}

fn consume_newline<S: Source>(win: &mut Window<'_, S>) -> bool {
    if win.eof() {
        return false;
    }
    match win.peek() {
        b'\n' => {
            win.advance();
            true
        }
        b'\r' => {
            win.advance();
            if !win.eof() && win.peek() == b'\n' {
                win.advance();
            }
            true
        }
        _ => false,
    }
}

/// After a newline, consumes comment lines and blank lines per `opts`.
fn skip_comment_and_empty_lines<S: Source>(win: &mut Window<'_, S>, opts: &Options) {
    loop {
        let mut applied = false;

        if opts.ignore_empty_lines && !win.eof() && consume_newline(win) {
            applied = true;
        }

        if let Some(marker) = &opts.comment {
            if !win.eof() && win.probe_matches(marker) {
                while !win.eof() && !consume_newline(win) {
                    win.advance();
                }
                applied = true;
            }
        }

        if !applied {
            break;
        }
    }
}

/// The close-quote scanner (data model §4.4).
///
/// Shared by the [`quoted_layer`] (for non-greedy types, `capture = false`: flags only, no
/// `PosLen` growth since the inner type parser already produced its value) and by greedy
/// [`TypeParser`] implementations like [`StringField`](crate::types::StringField) (`capture =
/// true`: the scanned bytes *are* the value).
pub(crate) fn scan_close_quote<S: Source>(
    win: &mut Window<'_, S>,
    opts: &Options,
    mut pl: PosLen,
    capture: bool,
) -> (ReturnCode, PosLen) {
    let same = opts.cq == opts.e;
    let mut code = ReturnCode::new();
    let mut index: usize = 0;

    loop {
        if win.eof() {
            code |= ReturnCode::INVALID_QUOTED_FIELD | ReturnCode::EOF;
            return (code, pl);
        }

        let b = win.peek();
        let is_ws = b == opts.wh1 || b == opts.wh2;
        let will_extend = capture && !(opts.strip_quoted && is_ws);
        win.advance();
        if will_extend {
            pl = pl.extend_by_one();
        }

        if same && b == opts.e {
            if win.eof() {
                // `b` was the terminating quote, not the start of a doubled-quote escape.
                if will_extend {
                    pl = pl.with_len(pl.len() - 1);
                }
                code |= ReturnCode::EOF;
                if index > 0 && !capture {
                    code |= ReturnCode::INVALID;
                }
                return (code, pl);
            }
            if win.peek() != opts.cq {
                // Same: `b` closed the field rather than opening an escape.
                if will_extend {
                    pl = pl.with_len(pl.len() - 1);
                }
                if index > 0 && !capture {
                    code |= ReturnCode::INVALID;
                }
                return (code, pl);
            }
            code |= ReturnCode::ESCAPED_STRING;
            pl = pl.with_escaped(true);
            win.advance();
            if capture {
                pl = pl.extend_by_one();
            }
        } else if b == opts.e {
            code |= ReturnCode::ESCAPED_STRING;
            pl = pl.with_escaped(true);
            if win.eof() {
                code |= ReturnCode::INVALID_QUOTED_FIELD | ReturnCode::EOF;
                return (code, pl);
            }
            win.advance();
            if capture {
                pl = pl.extend_by_one();
            }
        } else if b == opts.cq {
            if will_extend {
                pl = pl.with_len(pl.len() - 1);
            }
            if index > 0 && !capture {
                code |= ReturnCode::INVALID;
            }
            return (code, pl);
        }

        index += 1;
    }
}

/// Layer: Quoted (data model §4.4).
pub(crate) fn quoted_layer<S: Source, P: TypeParser>(
    win: &mut Window<'_, S>,
    opts: &Options,
    mut code: ReturnCode,
    mut pl: PosLen,
    mut inner: impl FnMut(&mut Window<'_, S>, &Options, ReturnCode, PosLen) -> LayerOutcome<P::Value>,
) -> LayerOutcome<P::Value> {
    if opts.quoted && !win.eof() && win.peek() == opts.oq {
        win.advance();
        code |= ReturnCode::QUOTED;
        pl = pl.with_pos(win.position());
        if win.eof() {
            code |= ReturnCode::INVALID_QUOTED_FIELD | ReturnCode::EOF;
            return LayerOutcome { code, pl, val: None };
        }
    }

    let outcome = inner(win, opts, code, pl);
    let mut code = outcome.code;
    let pl = outcome.pl;

    if !code.is_quoted() {
        return LayerOutcome {
            code,
            pl,
            val: outcome.val,
        };
    }

    if P::GREEDY {
        // The type parser already walked through (and consumed) the close quote itself.
        return LayerOutcome {
            code,
            pl,
            val: outcome.val,
        };
    }

    if code.is_eof() {
        code |= ReturnCode::INVALID_QUOTED_FIELD;
        return LayerOutcome {
            code,
            pl,
            val: outcome.val,
        };
    }

    let (scan_code, pl) = scan_close_quote(win, opts, pl, false);
    LayerOutcome {
        code: code | scan_code,
        pl,
        val: outcome.val,
    }
}

/// Layer: Whitespace, used both outside (wrapping [`quoted_layer`]) and inside (wrapping the
/// sentinel layer) the quoted context (data model §4.3). Which context applies is read off
/// `code.is_quoted()` at entry, so the same function serves both positions in the pipeline.
pub(crate) fn whitespace_layer<S: Source, P: TypeParser>(
    win: &mut Window<'_, S>,
    opts: &Options,
    mut code: ReturnCode,
    mut pl: PosLen,
    mut inner: impl FnMut(&mut Window<'_, S>, &Options, ReturnCode, PosLen) -> LayerOutcome<P::Value>,
) -> LayerOutcome<P::Value> {
    let in_quotes = code.is_quoted();
    let strip_here = if in_quotes {
        opts.strip_quoted
    } else {
        opts.strip_whitespace
    };

    while !win.eof() {
        let b = win.peek();
        if b != opts.wh1 && b != opts.wh2 {
            break;
        }
        win.advance();
        if strip_here {
            pl = pl.with_pos(win.position());
        }
    }

    if win.eof() {
        code |= ReturnCode::INVALID | ReturnCode::EOF;
        return LayerOutcome { code, pl, val: None };
    }

    let outcome = inner(win, opts, code, pl);
    let mut code = outcome.code;
    let mut pl = outcome.pl;
    let val = outcome.val;

    if code.is_eof() {
        return LayerOutcome { code, pl, val };
    }

    let strip_trailing = !P::GREEDY || (code.is_quoted() && code.is_escaped_string());
    if strip_trailing {
        while !win.eof() {
            let b = win.peek();
            if b != opts.wh1 && b != opts.wh2 {
                break;
            }
            win.advance();
            if strip_here && P::GREEDY && pl.len() > 0 {
                pl = pl.with_len(pl.len() - 1);
            }
        }
    }

    LayerOutcome { code, pl, val }
}

/// Layer: Sentinel (data model §4.5).
pub(crate) fn sentinel_layer<S: Source, P: TypeParser>(
    win: &mut Window<'_, S>,
    opts: &Options,
    code: ReturnCode,
    pl: PosLen,
    mut inner: impl FnMut(&mut Window<'_, S>, &Options, ReturnCode, PosLen) -> LayerOutcome<P::Value>,
) -> LayerOutcome<P::Value> {
    let entry_pos = win.position();
    let mut sentinel_end = None;
    for value in opts.sentinel().values() {
        if win.probe_matches(value) {
            sentinel_end = Some(win.position());
            win.seek(entry_pos);
            break;
        }
    }

    let outcome = inner(win, opts, code, pl);

    if let Some(send) = sentinel_end {
        if send >= win.position() {
            let code = (outcome.code
                & !(ReturnCode::OK | ReturnCode::INVALID | ReturnCode::OVERFLOW))
                | ReturnCode::SENTINEL;
            win.seek(send);
            let code = if win.eof() { code | ReturnCode::EOF } else { code };
            return LayerOutcome {
                code,
                pl: outcome.pl.with_missing(true),
                val: None,
            };
        }
    }

    outcome
}

/// Layer: EmptySentinel (data model §4.6).
pub(crate) fn empty_sentinel_layer<S: Source, P: TypeParser>(
    win: &mut Window<'_, S>,
    opts: &Options,
    code: ReturnCode,
    pl: PosLen,
    mut inner: impl FnMut(&mut Window<'_, S>, &Options, ReturnCode, PosLen) -> LayerOutcome<P::Value>,
) -> LayerOutcome<P::Value> {
    if win.eof() {
        return if opts.sentinel().treats_empty_as_missing() {
            LayerOutcome {
                code: code | ReturnCode::SENTINEL | ReturnCode::EOF,
                pl: pl.with_missing(true),
                val: None,
            }
        } else {
            LayerOutcome {
                code: code | ReturnCode::INVALID | ReturnCode::EOF,
                pl,
                val: None,
            }
        };
    }

    let entry_pos = win.position();
    let outcome = inner(win, opts, code, pl);

    if win.position() == entry_pos {
        return LayerOutcome {
            code: (outcome.code & !(ReturnCode::OK | ReturnCode::INVALID)) | ReturnCode::SENTINEL,
            pl: outcome.pl.with_missing(true),
            val: None,
        };
    }

    outcome
}

/// Layer: Delimiter (data model §4.7), the most intricate loop in the core.
pub(crate) fn delimiter_layer<S: Source, P: TypeParser>(
    win: &mut Window<'_, S>,
    opts: &Options,
    code: ReturnCode,
    pl: PosLen,
    mut inner: impl FnMut(&mut Window<'_, S>, &Options, ReturnCode, PosLen) -> LayerOutcome<P::Value>,
) -> LayerOutcome<P::Value> {
    let outcome = inner(win, opts, code, pl);
    let mut code = outcome.code;
    let mut pl = outcome.pl;
    let val = outcome.val;

    if code.is_delimited() || code.is_eof() {
        return LayerOutcome { code, pl, val };
    }

    loop {
        if win.eof() {
            code |= ReturnCode::EOF;
            break;
        }

        if try_consume_delimiter_run(win, opts, &mut code) {
            break;
        }

        if !win.eof() {
            let b = win.peek();
            if b == b'\n' || b == b'\r' {
                consume_newline(win);
                skip_comment_and_empty_lines(win, opts);
                code |= ReturnCode::NEWLINE;
                if win.eof() {
                    code |= ReturnCode::EOF;
                }
                break;
            }
        }

        if win.eof() {
            code |= ReturnCode::EOF;
            break;
        }

        if !P::GREEDY || code.is_quoted() {
            code |= ReturnCode::INVALID_DELIMITER;
        }
        let b = win.peek();
        let is_ws = b == opts.wh1 || b == opts.wh2;
        let will_extend = P::GREEDY && !(opts.strip_whitespace && is_ws);
        win.advance();
        if will_extend {
            pl = pl.extend_by_one();
        }
    }

    LayerOutcome { code, pl, val }
}

/// Attempts one iteration of delimiter/newline matching (data model §4.7 steps 1-4). Returns
/// `true` if the scan is done (a delimiter or newline run was found and the code updated).
fn try_consume_delimiter_run<S: Source>(
    win: &mut Window<'_, S>,
    opts: &Options,
    code: &mut ReturnCode,
) -> bool {
    match opts.delim() {
        Delimiter::None => false,
        Delimiter::Byte(d) => {
            if !opts.ignore_repeated {
                if !win.eof() && win.peek() == *d {
                    win.advance();
                    *code |= ReturnCode::DELIMITED;
                    return true;
                }
                return false;
            }
            consume_repeated(win, opts, code, |win| {
                if !win.eof() && win.peek() == *d {
                    win.advance();
                    true
                } else {
                    false
                }
            })
        }
        Delimiter::Bytes(bytes) => {
            if !opts.ignore_repeated {
                if win.probe_matches(bytes) {
                    *code |= ReturnCode::DELIMITED;
                    return true;
                }
                return false;
            }
            consume_repeated(win, opts, code, |win| win.probe_matches(bytes))
        }
    }
}

/// Data model §4.7 steps 3-4: loop consuming any mix of the delimiter and newlines, coalescing
/// CRLF, invoking comment/empty-line skipping on the first newline seen.
fn consume_repeated<S: Source>(
    win: &mut Window<'_, S>,
    opts: &Options,
    code: &mut ReturnCode,
    mut match_delim: impl FnMut(&mut Window<'_, S>) -> bool,
) -> bool {
    let mut consumed_any = false;
    let mut saw_newline = false;

    loop {
        if win.eof() {
            break;
        }
        if match_delim(win) {
            consumed_any = true;
            continue;
        }
        if !saw_newline {
            let b = win.peek();
            if b == b'\n' || b == b'\r' {
                consume_newline(win);
                skip_comment_and_empty_lines(win, opts);
                saw_newline = true;
                consumed_any = true;
                continue;
            }
        }
        break;
    }

    if consumed_any {
        *code |= ReturnCode::DELIMITED;
        if saw_newline {
            *code |= ReturnCode::NEWLINE;
        }
    }
    consumed_any
}

/// Standalone utility: advances past a delimiter (or a run of them, when `ignorerepeated`)
/// without parsing a value.
pub fn check_delim<S: Source>(source: &mut S, pos: u64, len: u64, opts: &Options) -> ReturnCode {
    let mut win = Window::new(source, pos, len);
    let mut code = ReturnCode::new();

    if try_consume_delimiter_run(&mut win, opts, &mut code) {
        if win.eof() {
            code |= ReturnCode::EOF;
        }
        return code;
    }

    if !win.eof() {
        let b = win.peek();
        if b == b'\n' || b == b'\r' {
            consume_newline(&mut win);
            skip_comment_and_empty_lines(&mut win, opts);
            code |= ReturnCode::NEWLINE | ReturnCode::DELIMITED;
        }
    }

    if win.eof() {
        code |= ReturnCode::EOF;
    }
    code
}

/// Capability to fetch the raw bytes underlying a [`PosLen`], needed to reify it into an owned
/// string via [`get_string`].
pub trait RawBytes {
    /// Returns the raw bytes in `[pos, pos + len)`.
    fn raw_bytes(&self, pos: u64, len: u64) -> Cow<'_, [u8]>;
}

impl<'a> RawBytes for SliceSource<'a> {
    fn raw_bytes(&self, pos: u64, len: u64) -> Cow<'_, [u8]> {
        let start = pos as usize;
        let end = start + len as usize;
        Cow::Borrowed(&self.bytes()[start..end])
    }
}

impl<R> RawBytes for ReaderSource<R> {
    fn raw_bytes(&self, pos: u64, len: u64) -> Cow<'_, [u8]> {
        let start = pos as usize;
        let end = start + len as usize;
        Cow::Borrowed(&self.history()[start..end])
    }
}

/// Reifies a [`PosLen`] into owned bytes, unescaping doubled `e` bytes (`e == cq` case) or
/// dropping a lone `e` and keeping the following byte literally (`e != cq` case) — both reduce to
/// the same rule: on seeing `e`, drop it and emit the next byte verbatim.
pub fn get_string<S: RawBytes>(source: &S, pl: PosLen, e: u8) -> Vec<u8> {
    let raw = source.raw_bytes(pl.pos(), pl.len());
    if !pl.is_escaped() {
        return raw.into_owned();
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b == e && i + 1 < raw.len() {
            out.push(raw[i + 1]);
            i += 2;
        } else {
            out.push(b);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionsBuilder;
    use crate::types::StringField;

    fn comma_quoted_opts() -> Options {
        OptionsBuilder::new(Delimiter::Byte(b','))
            .build()
            .expect("valid options")
    }

    #[test]
    fn scan_close_quote_decodes_doubled_quote() {
        let opts = comma_quoted_opts();
        let mut source = SliceSource::new(br#"hel""lo",x"#);
        let mut win = Window::new(&mut source, 0, 10);
        let pl = PosLen::new(0);
        let (code, pl) = scan_close_quote(&mut win, &opts, pl, true);
        assert!(code.is_escaped_string());
        assert!(!code.is_invalid());
        assert_eq!(pl.len(), 7);
    }

    #[test]
    fn scan_close_quote_reports_invalid_quoted_field_on_eof() {
        let opts = comma_quoted_opts();
        let mut source = SliceSource::new(b"unterminated");
        let mut win = Window::new(&mut source, 0, 12);
        let pl = PosLen::new(0);
        let (code, _pl) = scan_close_quote(&mut win, &opts, pl, true);
        assert!(code.is_invalid());
        assert!(code.is_invalid_quoted_field());
        assert!(code.is_eof());
    }

    #[test]
    fn check_delim_advances_past_single_delimiter() {
        let opts = comma_quoted_opts();
        let mut source = SliceSource::new(b",rest");
        let code = check_delim(&mut source, 0, 5, &opts);
        assert!(code.is_delimited());
        assert_eq!(source.position(), 1);
    }

    #[test]
    fn check_delim_collapses_repeated_delimiters() {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b','));
        builder.ignore_repeated(true);
        let opts = builder.build().expect("valid options");
        let mut source = SliceSource::new(b",,,rest");
        let code = check_delim(&mut source, 0, 7, &opts);
        assert!(code.is_delimited());
        assert_eq!(source.position(), 3);
    }

    #[test]
    fn get_string_decodes_escaped_backslash_style() {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b','));
        builder.quoted(true, b'"', b'"', b'\\');
        let opts = builder.build().expect("valid options");
        let mut source = SliceSource::new(br#"a\"b"#);
        let pl = PosLen::new(0).with_len(4).with_escaped(true);
        let decoded = get_string(&source, pl, opts.e);
        assert_eq!(decoded, b"a\"b");
    }
}
