//! Property tests for the key sanitizer
//!
//! Each property runs against arbitrary Unicode input and against a
//! dot-heavy alphabet that exercises the traversal pass.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bucketgate_keys::{ObjectKey, SanitizePolicy, sanitize};
use proptest::prelude::*;

fn policies() -> impl Strategy<Value = SanitizePolicy> {
    (any::<bool>(), any::<bool>(), 1usize..=300).prop_map(|(sep, brackets, max)| {
        SanitizePolicy::new(sep, max).with_brackets(brackets)
    })
}

fn candidates() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "[./a-z ()\\[\\]%\\\\]{0,300}",
        "(\\.{1,5}/?){0,60}",
    ]
}

proptest! {
    #[test]
    fn output_stays_within_allow_list(candidate in candidates(), policy in policies()) {
        if let Ok(key) = sanitize(&candidate, &policy) {
            prop_assert!(key.as_str().chars().all(|c| policy.allows(c)), "{key:?}");
        }
    }

    #[test]
    fn output_never_contains_traversal(candidate in candidates(), policy in policies()) {
        if let Ok(key) = sanitize(&candidate, &policy) {
            prop_assert!(!key.as_str().contains(".."), "{key:?}");
        }
    }

    #[test]
    fn output_respects_max_length(candidate in candidates(), policy in policies()) {
        if let Ok(key) = sanitize(&candidate, &policy) {
            prop_assert!(key.as_str().chars().count() <= policy.max_length);
        }
    }

    #[test]
    fn sanitizing_twice_is_a_no_op(candidate in candidates(), policy in policies()) {
        if let Ok(once) = sanitize(&candidate, &policy) {
            let twice = sanitize(once.as_str(), &policy).unwrap();
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn sanitizing_is_deterministic(candidate in candidates(), policy in policies()) {
        prop_assert_eq!(sanitize(&candidate, &policy), sanitize(&candidate, &policy));
    }

    #[test]
    fn only_empty_input_fails(candidate in candidates(), policy in policies()) {
        prop_assert_eq!(sanitize(&candidate, &policy).is_err(), candidate.is_empty());
    }

    #[test]
    fn composed_keys_keep_invariants(folder in candidates(), name in candidates()) {
        let folder = sanitize(&folder, &SanitizePolicy::folder()).ok();
        if let Ok(name) = sanitize(&name, &SanitizePolicy::file_name()) {
            let key = ObjectKey::compose(folder.as_ref(), &name);
            prop_assert!(!key.as_str().contains(".."));
            prop_assert!(!key.as_str().starts_with('/'));
            prop_assert!(!key.as_str().contains("//"));
            prop_assert!(key.as_str().ends_with(name.as_str()));
        }
    }
}
