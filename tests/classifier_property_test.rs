use forms_support::classify::{
    DOMAIN_SUFFIXES, is_domain_name_valid, is_email_address_valid, is_ip_component_list_valid,
    is_website_address_valid, parse_bounded_integer, parse_phone_number, parse_postal_code,
};
use forms_support::{IntegerBounds, Rejection};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::FileFailurePersistence;

const CLASSIFIER_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/classifier_property_test.txt";
const DEFAULT_CLASSIFIER_PROPTEST_CASES: u32 = 256;

fn classifier_proptest_cases() -> u32 {
    std::env::var("FORMS_SUPPORT_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_CLASSIFIER_PROPTEST_CASES)
}

fn bounds_strategy() -> BoxedStrategy<IntegerBounds> {
    (
        proptest::option::of(-1_000i64..1_000),
        proptest::option::of(-1_000i64..1_000),
    )
        .prop_map(|(lower, upper)| match (lower, upper) {
            (Some(lower), Some(upper)) if lower > upper => IntegerBounds::between(upper, lower),
            (lower, upper) => IntegerBounds { lower, upper },
        })
        .boxed()
}

fn domain_strategy() -> BoxedStrategy<String> {
    (
        vec("[a-z0-9][a-z0-9_-]{0,8}", 1..=3),
        proptest::sample::select(DOMAIN_SUFFIXES),
    )
        .prop_map(|(labels, suffix)| format!("{}.{suffix}", labels.join(".")))
        .boxed()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: classifier_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(CLASSIFIER_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn integers_are_accepted_exactly_inside_their_bounds(
        number in -2_000i64..2_000,
        bounds in bounds_strategy(),
    ) {
        let inside = bounds.lower.is_none_or(|lower| number >= lower)
            && bounds.upper.is_none_or(|upper| number <= upper);
        let outcome = parse_bounded_integer(&number.to_string(), bounds);
        if inside {
            prop_assert_eq!(outcome, Ok(number));
        } else {
            prop_assert_eq!(
                outcome,
                Err(Rejection::IntegerOutOfRange { lower: bounds.lower, upper: bounds.upper })
            );
        }
    }

    #[test]
    fn postal_codes_normalize_any_case_and_spacing(
        forward in "[A-Za-z][0-9][A-Za-z]",
        gap in " {0,3}",
        local in "[0-9][A-Za-z][0-9]",
    ) {
        let normalized = parse_postal_code(&format!("{forward}{gap}{local}"));
        prop_assert_eq!(
            normalized,
            Ok(format!("{} {}", forward.to_ascii_uppercase(), local.to_ascii_uppercase()))
        );
    }

    #[test]
    fn phone_numbers_keep_only_their_ten_digits(
        digits in "[0-9]{10}",
        separators in vec("[^0-9]{0,3}", 4),
    ) {
        let text = format!(
            "{}{}{}{}{}{}{}",
            separators[0],
            &digits[0..3],
            separators[1],
            &digits[3..6],
            separators[2],
            &digits[6..10],
            separators[3],
        );
        let expected = format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10]);
        prop_assert_eq!(parse_phone_number(&text), Ok(expected));
    }

    #[test]
    fn ip_component_lists_ignore_their_first_slot(
        first in ".*",
        octets in vec(0u32..=255, 0..6),
        bad in 256u32..100_000,
        bad_at in 0usize..6,
    ) {
        let mut components = vec![first];
        components.extend(octets.iter().map(u32::to_string));
        prop_assert!(is_ip_component_list_valid(&components));

        let slot = 1 + bad_at % components.len();
        if slot < components.len() {
            components[slot] = bad.to_string();
            prop_assert!(!is_ip_component_list_valid(&components));
        }
    }

    #[test]
    fn generated_domains_validate_and_broken_dots_do_not(domain in domain_strategy()) {
        let leading_dot = format!(".{domain}");
        let trailing_dot = format!("{domain}.");
        let email = format!("someone@{domain}");
        let website = format!("{domain}/index.html#top");
        prop_assert!(is_domain_name_valid(&domain));
        prop_assert!(is_domain_name_valid(&domain.to_ascii_uppercase()));
        prop_assert!(!is_domain_name_valid(&leading_dot));
        prop_assert!(!is_domain_name_valid(&trailing_dot));
        prop_assert!(!is_domain_name_valid(&domain.replacen('.', "..", 1)));
        prop_assert!(is_email_address_valid(&email));
        prop_assert!(is_website_address_valid(&website));
    }

    #[test]
    fn classifiers_never_panic_on_arbitrary_text(text in ".{0,40}") {
        let _ = parse_bounded_integer(&text, IntegerBounds::between(-5, 5));
        let _ = parse_postal_code(&text);
        let _ = parse_phone_number(&text);
        let _ = is_domain_name_valid(&text);
        let _ = is_email_address_valid(&text);
        let _ = is_website_address_valid(&text);
    }
}
