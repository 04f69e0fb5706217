//! The [`TypeParser`] plug-in contract: the seam between the framing layers and per-type scalar
//! parsing.
//!
//! This crate does not implement "real" digit loops, Ryu-quality float formatting, or date
//! pattern interpretation — those are explicitly out of scope (see `SPEC_FULL.md`). The
//! [`types`](crate::types) module ships reference plug-ins built on [`core::str::FromStr`] so the
//! pipeline is usable out of the box; a host that needs faster or more exotic per-type parsing
//! implements this trait directly.

use crate::options::Options;
use crate::poslen::PosLen;
use crate::return_code::ReturnCode;
use crate::source::{Source, Window};

/// A plug-in that consumes the bytes of a single value, given the pipeline's framing has already
/// positioned the cursor at its first byte.
///
/// # Contract
/// - Receives the already-peeked first byte (`first_byte`); the caller guarantees the source is
///   not at EOF.
/// - Consumes the value's bytes, advancing the source in lockstep with any position it reports.
/// - Sets [`ReturnCode::OK`] on success, [`ReturnCode::OVERFLOW`] on numeric overflow, or
///   [`ReturnCode::INVALID`] alone on unparseable input.
/// - Non-greedy (non-string) implementations must not consume a trailing delimiter, quote, or
///   whitespace; those belong to the wrapping layers.
/// - Greedy implementations ([`GREEDY`](Self::GREEDY) `== true`) own their own field boundary:
///   when `code` already carries [`ReturnCode::QUOTED`], they must consume through (and
///   including) the matching close quote themselves, growing `pl` as they go; otherwise they
///   consume up to (but not including) the next delimiter/newline/EOF.
pub trait TypeParser: Sized {
    /// The value this parser produces.
    type Value;

    /// Whether this type is "greedy": its field boundary is determined by the value itself
    /// (scanning for a close quote or delimiter) rather than being handed a pre-bounded slice.
    const GREEDY: bool;

    /// Parses one value.
    ///
    /// `code` carries whatever flags the outer layers have already set (at minimum, whether the
    /// field is [`ReturnCode::QUOTED`]); implementations OR additional flags into it rather than
    /// replacing it outright. `pl` is the candidate substring descriptor accumulated so far.
    fn parse<S: Source>(
        win: &mut Window<'_, S>,
        opts: &Options,
        first_byte: u8,
        code: ReturnCode,
        pl: PosLen,
    ) -> (ReturnCode, PosLen, Option<Self::Value>);
}
