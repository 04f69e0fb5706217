//! A composable, byte-oriented field parsing pipeline for delimited text.
//!
//! The pipeline is built from small, independently testable layers — quoting, whitespace
//! stripping, sentinel recognition, delimiter/newline discovery — each generic over a
//! [`TypeParser`] plug-in rather than built around any one value type. [`xparse`] runs the full
//! stack over a `source[pos, pos + len)` window; [`xparse2`] runs a condensed
//! sentinel-then-type-parser pipeline for hosts that have already located a field's exact bounds.
//!
//! ```
//! use fieldparse_core::{Delimiter, OptionsBuilder, SliceSource, types::Integer, xparse};
//!
//! let opts = OptionsBuilder::new(Delimiter::Byte(b','))
//!     .build()
//!     .unwrap();
//! let mut source = SliceSource::new(b"42,rest");
//! let result = xparse::<_, Integer>(&mut source, 0, 7, &opts);
//! assert_eq!(result.val, Some(42));
//! ```

#![warn(missing_docs)]

mod dispatch;
mod error;
mod layers;
mod options;
mod poslen;
mod return_code;
mod source;
mod type_parser;
pub mod types;

pub use dispatch::{check_delim, get_string, parse, try_parse, xparse, xparse2, ParseResult};
pub use error::{FieldParseError, FieldParseErrorKind, ParseError};
pub use options::{Delimiter, Options, OptionsBuilder, OptionsError, Sentinel};
pub use poslen::{PosLen, MAX_LEN};
pub use return_code::ReturnCode;
pub use source::{ReaderSource, SliceSource, Source, Window};
pub use type_parser::TypeParser;
