use proptest::prelude::*;
use servercom_core::{DataClass, MAX_TEXT_LEN, Payload};

fn any_payload() -> impl Strategy<Value = Payload> {
    prop_oneof![
        (-459.67f64..1.0e6).prop_map(|v| Payload::temperature(v).unwrap()),
        (0.0f64..=100.0).prop_map(|v| Payload::humidity(v).unwrap()),
        (0.0f64..1.0e4).prop_map(|v| Payload::pressure(v).unwrap()),
        (0.0f64..1.0e9).prop_map(|v| Payload::intensity(v).unwrap()),
        ".{0,200}".prop_map(|s| Payload::text(s).unwrap()),
        (0u8..=100).prop_map(|v| Payload::battery_level(v).unwrap()),
        ".{1,200}".prop_map(|s| Payload::beacon_challenge(s).unwrap()),
    ]
}

proptest! {
    #[test]
    fn reencoding_is_idempotent(p in any_payload()) {
        let wire = p.serialize();
        let decoded = Payload::from_wire(&wire).unwrap();
        prop_assert_eq!(decoded.serialize(), wire);
    }

    #[test]
    fn decoding_preserves_value(p in any_payload()) {
        let decoded = Payload::from_wire(&p.serialize()).unwrap();
        prop_assert_eq!(decoded, p);
    }

    #[test]
    fn wire_tag_matches_class(p in any_payload()) {
        let body: serde_json::Value = serde_json::from_slice(&p.serialize()).unwrap();
        prop_assert_eq!(body["type"].as_str(), Some(p.data_class().as_str()));
    }

    #[test]
    fn oversized_text_never_constructs(extra in 1usize..64) {
        let text = "a".repeat(MAX_TEXT_LEN + extra);
        prop_assert!(Payload::text(text).is_err());
    }

    #[test]
    fn humidity_outside_percent_rejected(v in prop_oneof![-1.0e6f64..-0.001, 100.001f64..1.0e6]) {
        prop_assert!(Payload::humidity(v).is_err());
    }
}

#[test]
fn comment_tag_is_stable() {
    let p = Payload::text("x").unwrap();
    assert_eq!(p.data_class(), DataClass::Comment);
}
