//! Decoded register values fed back into the encoder produce the same
//! register contents.

use winext_codec::registry::addresses;
use winext_codec::{decode, encode, AttributeValue, ControlRequest, FrameKind};

#[test]
fn test_device_status_roundtrip() {
    let uplink = [
        0x00, 0x95, 0x0E, // register block, 14 bytes
        0x00, 0x00, // header
        0x01, 0x04, // 0 version
        0x00, 0x00, // 1
        0x08, 0x34, // 2 current 21.00
        0x00, 0x00, // 3
        0x09, 0x2E, // 4 set 23.50
        0x00, 0x03, // 5 mode 3
    ];
    let decoded = decode(&uplink);
    assert!(decoded.is_ok(), "{:?}", decoded.warnings);

    let request: ControlRequest = ["setTemperature", "workMode"]
        .iter()
        .map(|name| (name.to_string(), decoded.attributes[*name].clone()))
        .collect();
    let outcome = encode(&request);
    assert!(outcome.is_ok());

    let frame = outcome.frame.expect("frame");
    assert_eq!(frame.kind, FrameKind::MultiWrite);
    // Values carry the same register contents as the uplink cells 4 and 5.
    assert_eq!(&frame.bytes[8..12], &uplink[13..17]);
}

#[test]
fn test_control_status_roundtrip() {
    let uplink = [0x00, 0x95, 0x06, 0x10, 0x00, 0x00, 0x01, 0x00, 0x00];
    let decoded = decode(&uplink);
    assert_eq!(decoded.attributes["power"], AttributeValue::Boolean(true));
    assert_eq!(decoded.attributes["lock"], AttributeValue::Boolean(false));

    let outcome = encode(&decoded.attributes);
    assert!(outcome.is_ok());
    let bytes = outcome.frame.expect("frame").bytes;
    assert_eq!(&bytes[3..5], &[0x10, 0x00]);
    assert_eq!(&bytes[8..12], &[0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn test_scaling_roundtrip() {
    let rule = addresses::lookup("setTemperature").unwrap();
    for tenths in -200..=500 {
        let value = tenths as f64 / 10.0;
        let register = rule.scale(value).register;
        assert!((rule.unscale(register) - value).abs() < 0.005, "{}", value);
    }
}

#[test]
fn test_decoded_attributes_with_unwritable_names() {
    // Telemetry attributes mixed in with writable ones are reported but
    // do not block the write.
    let decoded = decode(&[0x00, 0x10, 0x09, 0xC4, 0x95, 0x04, 0x10, 0x00, 0x00, 0x01]);
    let outcome = encode(&decoded.attributes);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("temperature"));
    assert_eq!(
        outcome.frame.expect("frame").bytes,
        vec![0x06, 0x06, 0x10, 0x00, 0x00, 0x01]
    );
}
