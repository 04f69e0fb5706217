//! Property-based checks over small input alphabets: these are probabilistic sweeps, not
//! exhaustive round-trip grids.

use proptest::prelude::*;

use fieldparse_core::types::Integer;
use fieldparse_core::{get_string, xparse, Delimiter, OptionsBuilder, SliceSource};

fn default_opts() -> fieldparse_core::Options {
    OptionsBuilder::new(Delimiter::Byte(b','))
        .build()
        .expect("valid options")
}

proptest! {
    /// Any in-range `i64` formatted with `to_string` and followed by a delimiter parses back to
    /// the same value.
    #[test]
    fn integer_round_trips_through_decimal_formatting(n in any::<i64>()) {
        let opts = default_opts();
        let mut text = n.to_string().into_bytes();
        text.push(b',');
        let len = text.len() as u64;
        let mut source = SliceSource::new(&text);
        let result = xparse::<_, Integer>(&mut source, 0, len, &opts);
        prop_assert!(result.code.is_ok());
        prop_assert_eq!(result.val, Some(n));
    }

    /// A quoted string built from an arbitrary alphabet, with every close-quote byte doubled to
    /// escape it, decodes back to the original bytes via `get_string`.
    #[test]
    fn doubled_quote_escaping_round_trips(bytes in prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'"', b' ']), 0..12)) {
        let opts = default_opts();
        let mut encoded = vec![b'"'];
        for &b in &bytes {
            if b == b'"' {
                encoded.push(b'"');
            }
            encoded.push(b);
        }
        encoded.push(b'"');
        encoded.push(b',');

        let len = encoded.len() as u64;
        let mut source = SliceSource::new(&encoded);
        let result = xparse::<_, fieldparse_core::types::StringField>(&mut source, 0, len, &opts);
        prop_assert!(result.code.is_ok());
        let decoded = get_string(&source, result.val.unwrap(), opts.escape_byte());
        prop_assert_eq!(decoded, bytes);
    }

    /// Runs of the configured delimiter collapse to a single separator when `ignore_repeated` is
    /// set, regardless of how many repeats appear.
    #[test]
    fn repeated_delimiters_always_collapse_to_one_separator(repeats in 1usize..8) {
        let mut builder = OptionsBuilder::new(Delimiter::Byte(b','));
        builder.ignore_repeated(true);
        let opts = builder.build().expect("valid options");

        let mut text = b"7".to_vec();
        text.extend(std::iter::repeat(b',').take(repeats));
        text.push(b'9');
        let len = text.len() as u64;
        let mut source = SliceSource::new(&text);

        let first = xparse::<_, Integer>(&mut source, 0, len, &opts);
        prop_assert_eq!(first.val, Some(7));
        prop_assert!(first.code.is_delimited());

        let second = xparse::<_, Integer>(&mut source, first.tlen, len - first.tlen, &opts);
        prop_assert_eq!(second.val, Some(9));
    }
}
