//! Property tests: the hand-written smart-code validator accepts exactly the
//! language of the reference regular expression.

use hera_core::smart_code::{is_valid_smart_code, SmartCode};
use proptest::prelude::*;
use regex::Regex;

const PATTERN: &str = r"^HERA\.[A-Z0-9]+(\.[A-Z0-9_]+){3,8}\.v[0-9]+$";

fn oracle() -> Regex {
    Regex::new(PATTERN).unwrap()
}

/// Strings that are close to valid: right alphabet, varying segment counts,
/// occasional lowercase/underscore/empty segments.
fn near_miss() -> impl Strategy<Value = String> {
    "(HERA|HERa|HER)(\\.[A-Z0-9_a-z]{0,4}){1,11}\\.(v|V)?[0-9]{0,3}"
}

proptest! {
    #[test]
    fn matches_regex_on_arbitrary_strings(s in ".*") {
        prop_assert_eq!(is_valid_smart_code(&s), oracle().is_match(&s));
    }

    #[test]
    fn matches_regex_on_near_misses(s in near_miss()) {
        prop_assert_eq!(is_valid_smart_code(&s), oracle().is_match(&s), "input: {:?}", s);
    }

    #[test]
    fn generated_valid_codes_are_accepted(
        s in "HERA\\.[A-Z0-9]{1,6}(\\.[A-Z0-9_]{1,6}){3,8}\\.v[0-9]{1,4}"
    ) {
        prop_assert!(is_valid_smart_code(&s));
        let code = SmartCode::parse(s.clone()).unwrap();
        prop_assert_eq!(code.as_str(), s.as_str());
        prop_assert!((3..=8).contains(&code.segments().len()));
    }
}
