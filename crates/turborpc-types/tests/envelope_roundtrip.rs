use proptest::prelude::*;
use serde_json::Value;
use turborpc_types::{Envelope, Headers};

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON has no NaN or infinity", |x| x.is_finite())
            .prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::hash_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn arb_headers() -> impl Strategy<Value = Option<Headers>> {
    prop::option::of(prop::collection::hash_map("[a-z-]{1,10}", arb_value(), 0..4))
}

prop_compose! {
    fn arb_envelope()(
        route in "[a-zA-Z.]{1,16}",
        uuid in "[a-f0-9-]{1,36}",
        payload in arb_value(),
        headers in arb_headers(),
        status in any::<i32>(),
    ) -> Envelope {
        let envelope = Envelope::new(route, payload)
            .with_correlation_id(uuid)
            .with_status(status);
        match headers {
            Some(headers) => envelope.with_headers(headers),
            None => envelope,
        }
    }
}

proptest! {
    #[test]
    fn json_round_trip_is_lossless(envelope in arb_envelope()) {
        let wire = envelope.to_json().unwrap();
        prop_assert_eq!(Envelope::from_json(&wire).unwrap(), envelope);
    }

    #[test]
    fn byte_round_trip_is_lossless(envelope in arb_envelope()) {
        let wire = envelope.to_bytes().unwrap();
        prop_assert_eq!(Envelope::from_slice(&wire).unwrap(), envelope);
    }

    #[test]
    fn envelope_headers_win_on_merge(
        global in prop::collection::hash_map("[a-z]{1,4}", arb_value(), 0..6),
        own in prop::collection::hash_map("[a-z]{1,4}", arb_value(), 0..6),
    ) {
        let merged = Envelope::new("r", Value::Null)
            .with_headers(own.clone())
            .merged_with(&global);
        let headers = merged.headers.unwrap();

        for (key, value) in &own {
            prop_assert_eq!(headers.get(key), Some(value));
        }
        for (key, value) in &global {
            if !own.contains_key(key) {
                prop_assert_eq!(headers.get(key), Some(value));
            }
        }
        prop_assert!(headers.keys().all(|k| own.contains_key(k) || global.contains_key(k)));
    }
}

#[test]
fn tiny_floats_survive_round_trip() {
    for x in [-9.202_734_782_783_707e-225, f64::MIN_POSITIVE, 5e-324, f64::MAX] {
        let envelope = Envelope::new("r", x);
        let wire = envelope.to_json().unwrap();
        assert_eq!(Envelope::from_json(&wire).unwrap(), envelope, "{x:e}");
    }
}
