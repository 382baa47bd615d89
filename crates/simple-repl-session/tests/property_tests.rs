//! Property-based tests for dispatch normalization and the HUD rule.

use proptest::prelude::*;

use simple_repl_core::ShowPolicy;
use simple_repl_session::{decide, normalize, HudDecision};

/// Lines without the separator inside them.
fn lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9 ()+]{0,12}", 0..6)
}

fn separator() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("\n".to_string()),
        Just("\r\n".to_string()),
        Just(";\n".to_string()),
    ]
}

fn show_policy() -> impl Strategy<Value = ShowPolicy> {
    prop_oneof![
        Just(ShowPolicy::Always),
        Just(ShowPolicy::Never),
        Just(ShowPolicy::IfNotVisible),
    ]
}

proptest! {
    /// A non-empty payload always ends with exactly the separator it was
    /// joined with.
    #[test]
    fn normalized_payload_is_terminated(lines in lines(), sep in separator()) {
        let payload = normalize(&lines, &sep);
        if !payload.is_empty() {
            prop_assert!(payload.ends_with(&sep));
        }
    }

    /// Normalizing never drops text.
    #[test]
    fn normalized_payload_keeps_every_line(lines in lines(), sep in separator()) {
        let payload = normalize(&lines, &sep);
        let joined = lines.join(&sep);
        prop_assert!(payload.starts_with(&joined));
        prop_assert!(payload.len() - joined.len() <= sep.len());
    }

    /// Normalizing an already terminated payload changes nothing.
    #[test]
    fn normalize_is_idempotent(lines in lines(), sep in separator()) {
        let once = normalize(&lines, &sep);
        let twice = normalize(&[once.as_str()], &sep);
        prop_assert_eq!(once, twice);
    }

    /// An existing overlay is never joined by a second one.
    #[test]
    fn overlay_never_stacks(show in show_policy(), regular in 0usize..4, overlay in 1usize..3) {
        prop_assert_ne!(decide(show, regular, overlay), HudDecision::Open);
    }

    /// `never` never opens anything.
    #[test]
    fn never_never_opens(regular in 0usize..4, overlay in 0usize..3) {
        prop_assert_ne!(decide(ShowPolicy::Never, regular, overlay), HudDecision::Open);
    }

    /// Without an overlay there is nothing to close or keep.
    #[test]
    fn no_overlay_means_open_or_skip(show in show_policy(), regular in 0usize..4) {
        let decision = decide(show, regular, 0);
        prop_assert!(matches!(decision, HudDecision::Open | HudDecision::Skip));
    }
}
