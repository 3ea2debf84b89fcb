use std::fs;

use jsonlayout::{Error, ExceptionSet, JsonModel, LeafValue, ModelConfig};
use proptest::prelude::*;
use serde_json::json;

const DEVICE_VALUES: &str = r#"{
    "serial": "SN42",
    "port": 8080,
    "counters": [257, 3],
    "calibration": {"offset": -2, "made": "2021-03-04"},
    "internalNotes": {"who": "x"}
}"#;

const DEVICE_DESCRIPTION: &str = r#"{
    "serial": {"type": "string", "addr": "0x10", "size": 6, "mode2": "r", "desc": "Serial number"},
    "port": {"type": "uint16", "addr": "0", "size": 2, "mode2": "rw"},
    "counters": [
        {"type": "uint8", "addr": "2", "size": 1, "mode2": "rw"},
        {"type": "uint8", "addr": "3", "size": 1, "mode2": "w"}
    ],
    "calibration": {
        "offset": {"type": "int16", "addr": "4", "size": 2, "mode2": "rw"},
        "made": {"type": "date", "addr": "8", "size": 4, "mode2": "rw"}
    }
}"#;

fn device_model() -> JsonModel {
    let config = ModelConfig::default().with_exceptions(ExceptionSet::new(["internal"]));
    let mut model = JsonModel::with_config(config);
    model
        .load_json_with_description(DEVICE_VALUES.as_bytes(), DEVICE_DESCRIPTION.as_bytes())
        .unwrap();
    model
}

/// Leaves land at their addresses regardless of document order, with
/// uncovered bytes left zero.
#[test]
fn test_serialize_follows_addresses() {
    let bytes = device_model().serialize().unwrap();
    let expected: Vec<u8> = vec![
        0x1f, 0x90, // port
        0x01, // counters/0: 257 truncated to one byte
        0x03, // counters/1
        0xff, 0xfe, // calibration/offset
        0x00, 0x00, // gap
        0x00, 0x3d, 0x86, 0x15, // calibration/made: 4_032_021
        0x00, 0x00, 0x00, 0x00, // gap
        b'S', b'N', b'4', b'2', 0x00, 0x00, // serial, NUL padded
    ];
    assert_eq!(bytes.to_vec(), expected);
}

/// Excluded keys never reach the tree, so they need no description.
#[test]
fn test_exceptions_skip_undescribed_subtrees() {
    let model = device_model();
    assert!(model.tree().find("internalNotes").is_none());

    // Without the exception the same documents no longer line up
    let mut strict = JsonModel::new();
    let err = strict
        .load_json_with_description(DEVICE_VALUES.as_bytes(), DEVICE_DESCRIPTION.as_bytes())
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { ref path, .. } if path == "internalNotes"));
}

/// rw_only leaves read-only leaves out of both the map and the buffer.
#[test]
fn test_rw_only_serialization() {
    let model = device_model();
    let map = model.serialize_to_map(true).unwrap();
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![0, 2, 3, 4, 8]);
    assert_eq!(model.serialize_with(true).unwrap().len(), 12);
}

/// A description alone synthesizes zero defaults that serialize to zeros.
#[test]
fn test_description_defaults() {
    let mut model = JsonModel::new();
    model.load_json_by_description(DEVICE_DESCRIPTION.as_bytes()).unwrap();
    let bytes = model.serialize().unwrap();
    assert_eq!(bytes.len(), 0x16);
    assert!(bytes.iter().all(|b| *b == 0));

    let json = model.to_json();
    assert_eq!(json["port"], "0");
    assert_eq!(json["counters"], json!(["0", "0"]));
    assert_eq!(json["calibration"]["made"], "");
}

/// Bytes read back through a description reproduce the packed values.
#[test]
fn test_unpack_through_description() {
    let bytes = device_model().serialize().unwrap();

    let mut model = JsonModel::new();
    model.load_json_by_description(DEVICE_DESCRIPTION.as_bytes()).unwrap();
    model.deserialize(&bytes).unwrap();

    assert_eq!(
        model.to_json(),
        json!({
            "serial": "SN42",
            "port": "8080",
            "counters": ["1", "3"],
            "calibration": {"offset": "-2", "made": "2021-03-04"}
        })
    );
    let text = model.json_text(false).unwrap();
    assert!(text.contains(r#""made":"04.03.2021""#));
    assert_eq!(model.serialize().unwrap(), bytes);
}

/// Leaves hold their field type's representation from load on, so a
/// serialize/deserialize cycle reproduces the tree exactly.
#[test]
fn test_round_trip_preserves_tree() {
    let values = r#"{"n": 5, "d": "2021-03-04", "f": 2, "g": 0.1, "s": "ok", "u": [7, 65535]}"#;
    let description = r#"{
        "n": {"type": "int16", "addr": "0", "size": 2, "mode2": "rw"},
        "d": {"type": "date", "addr": "2", "size": 4, "mode2": "rw"},
        "f": {"type": "double", "addr": "6", "size": 8, "mode2": "rw"},
        "g": {"type": "float", "addr": "e", "size": 4, "mode2": "rw"},
        "s": {"type": "string", "addr": "12", "size": 4, "mode2": "rw"},
        "u": [
            {"type": "uint8", "addr": "16", "size": 1, "mode2": "r"},
            {"type": "uint16", "addr": "17", "size": 2, "mode2": "r"}
        ]
    }"#;
    let mut model = JsonModel::new();
    model
        .load_json_with_description(values.as_bytes(), description.as_bytes())
        .unwrap();
    let before = model.tree().clone();

    let bytes = model.serialize().unwrap();
    model.deserialize(&bytes).unwrap();
    assert_eq!(model.tree(), &before);

    let n = model.tree().find("n").unwrap();
    assert_eq!(model.value(n), Some(&LeafValue::Int(5)));
}

/// NUL padding is not string content: a synthesized string default reads
/// back as the empty string.
#[test]
fn test_string_padding_is_not_content() {
    let mut model = JsonModel::new();
    model
        .load_json_by_description(br#"{"s": {"type": "string", "addr": "0", "size": 3}}"#)
        .unwrap();
    let s = model.tree().find("s").unwrap();
    assert_eq!(model.value(s), Some(&LeafValue::from("\0\0\0")));

    let bytes = model.serialize().unwrap();
    assert_eq!(bytes.to_vec(), vec![0, 0, 0]);
    model.deserialize(&bytes).unwrap();
    assert_eq!(model.value(s), Some(&LeafValue::from("")));
    assert_eq!(model.serialize().unwrap(), bytes);
}

/// Buffers shorter than the layout are rejected and change nothing.
#[test]
fn test_short_buffer_is_rejected() {
    let mut model = device_model();
    let before = model.tree().clone();
    let err = model.deserialize(&[0u8; 8]).unwrap_err();
    assert!(matches!(err, Error::BufferTooShort { len: 8, .. }));
    assert_eq!(model.tree(), &before);
}

/// Edits respect the leaf's mode and range.
#[test]
fn test_edit_modes() {
    let mut model = device_model();
    assert_eq!(
        model.set_value_at("serial", "SN43").unwrap_err(),
        Error::ReadOnly("serial".to_string())
    );
    assert!(model.set_value_at("counters/1", 200u64).is_ok());
    assert!(matches!(
        model.set_value_at("port", 70000u64),
        Err(Error::RangeViolation(_))
    ));
    model.set_value_at("calibration/offset", -300i64).unwrap();

    let bytes = model.serialize().unwrap();
    assert_eq!(bytes[3], 200);
    assert_eq!(&bytes[4..6], &[0xfe, 0xd4]);
}

/// Malformed text leaves the previously loaded tree in place.
#[test]
fn test_malformed_document_keeps_tree() {
    let mut model = device_model();
    let before = model.tree().clone();
    assert!(matches!(
        model.load_json(b"[1, 2"),
        Err(Error::MalformedDocument(_))
    ));
    assert!(matches!(model.load_json(b"42"), Err(Error::MalformedDocument(_))));
    assert_eq!(model.tree(), &before);
}

/// Values and descriptions load from disk, and JSON text saves back.
#[test]
fn test_file_loading() {
    let dir = tempfile::tempdir().unwrap();
    let values = dir.path().join("values.json");
    let description = dir.path().join("description.json");
    fs::write(&values, DEVICE_VALUES).unwrap();
    fs::write(&description, DEVICE_DESCRIPTION).unwrap();

    let mut model = JsonModel::with_config(ModelConfig::default().with_exceptions(ExceptionSet::new(["internal"])));
    model.load_files(&values, &description).unwrap();
    assert_eq!(model.serialize().unwrap(), device_model().serialize().unwrap());

    let saved = dir.path().join("saved.json");
    model.save_json(&saved).unwrap();
    let text = fs::read_to_string(&saved).unwrap();
    assert!(text.starts_with("{\n    \"serial\": \"SN42\","));

    let mut reloaded = JsonModel::new();
    reloaded.load_file(&saved).unwrap();
    let port = reloaded.tree().find("port").unwrap();
    assert_eq!(
        reloaded.tree().node(port).unwrap().value(),
        Some(&LeafValue::String("8080".to_string()))
    );

    let missing = dir.path().join("missing.json");
    assert!(matches!(model.load_file(&missing), Err(Error::Io(_))));
}

proptest! {
    #[test]
    fn prop_pack_unpack_round_trip(port in any::<u16>(), offset in any::<i32>(), name in "[a-zA-Z0-9]{0,8}") {
        let description = json!({
            "name": {"type": "string", "addr": "6", "size": 8, "mode2": "rw"},
            "port": {"type": "uint16", "addr": "0", "size": 2, "mode2": "rw"},
            "offset": {"type": "int32", "addr": "2", "size": 4, "mode2": "rw"}
        })
        .to_string();
        let values = json!({"name": name, "port": port, "offset": offset}).to_string();

        let mut packed = JsonModel::new();
        packed.load_json_with_description(values.as_bytes(), description.as_bytes()).unwrap();
        let bytes = packed.serialize().unwrap();
        prop_assert_eq!(bytes.len(), 14);

        let mut unpacked = JsonModel::new();
        unpacked.load_json_by_description(description.as_bytes()).unwrap();
        unpacked.deserialize(&bytes).unwrap();
        prop_assert_eq!(unpacked.to_json(), json!({
            "name": name,
            "port": port.to_string(),
            "offset": offset.to_string()
        }));
    }
}
