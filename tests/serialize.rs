#![cfg(feature = "serde")]

use orthant::prelude::{AxisBox, Boundary, BoxedPayload, Capacity, Corner};

#[test]
fn test_serialization() {
    let boundary = Boundary::try_new(
        Capacity::from_bounds(&[(-8., 8.), (-8., 8.)]),
        AxisBox::try_new(
            Corner::new(vec![Some(-8.), None]),
            Corner::new(vec![Some(8.), Some(8.)]),
        )
        .unwrap(),
    )
    .unwrap();
    let json = serde_json::to_string_pretty(&boundary).unwrap();
    let back: Boundary<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, boundary);
}

#[test]
fn payload_round_trip() {
    let item = BoxedPayload::new(
        AxisBox::from_intervals(&[(Some(0.), Some(4.))]),
        "payload".to_string(),
    );
    let json = serde_json::to_string(&item).unwrap();
    let back: BoxedPayload<f64, String> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, item);
}
