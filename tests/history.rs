mod common;

use serde_json::json;

use common::{CannedServer, read_fixture, success};
use lesion_terminal::backend::BackendError;
use lesion_terminal::history::{
    parse_history_images, parse_history_json, parse_stored_prediction, repair_prediction_literal,
};
use lesion_terminal::prediction::label_with_biggest_value;
use lesion_terminal::session::Credentials;

#[test]
fn repairs_single_quoted_literal() {
    let raw = "{'binary': [0.2, 0.8], 'multiclass': []}";
    assert_eq!(
        repair_prediction_literal(raw),
        r#"{"binary": [0.2, 0.8], "multiclass": []}"#
    );
    let (binary, multiclass) = parse_stored_prediction(raw).expect("repaired literal parses");
    assert_eq!(binary.get("Malignant"), Some(0.8));
    assert!(multiclass.is_empty());
}

#[test]
fn parses_history_fixture_sorted_and_skips_broken_entries() {
    let raw = read_fixture("history.json");
    let entries = parse_history_json(&raw).expect("fixture should parse");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "user_3_image_0.jpg");
    assert_eq!(entries[1].name, "user_3_image_1.jpg");
    assert_eq!(
        entries[0].url,
        "https://bucket.s3.amazonaws.com/user_3_image_0.jpg"
    );
    assert_eq!(label_with_biggest_value(&entries[0].binary), Some("Malignant"));
    assert_eq!(label_with_biggest_value(&entries[0].multiclass), Some("Melanoma"));
    assert_eq!(label_with_biggest_value(&entries[1].binary), Some("Benign"));
    assert_eq!(
        label_with_biggest_value(&entries[1].multiclass),
        Some("Melanocytic Nevus")
    );
}

#[test]
fn empty_and_null_history_is_empty() {
    assert!(parse_history_json("null").expect("null parses").is_empty());
    assert!(parse_history_json("").expect("empty parses").is_empty());
    assert!(
        parse_history_json(r#"{"result": "success", "images": {}}"#)
            .expect("empty images parse")
            .is_empty()
    );
}

#[test]
fn wrong_shape_is_an_error() {
    assert!(parse_history_images(&json!(["not", "a", "map"])).is_err());
}

#[test]
fn history_endpoint_round_trip() {
    let images = json!({
        "user_1_image_0.jpg": {
            "url": "https://example.com/user_1_image_0.jpg",
            "prediction": "{'binary': [0.6, 0.4], 'multiclass': [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.3]}"
        }
    });
    let server = CannedServer::start(vec![success(&format!(r#""images": {images}"#))]);
    let api = server.api();
    let creds = Credentials::new("ada@example.com", "secret").expect("valid");

    let entries = api.history(&creds).expect("history");
    assert_eq!(entries.len(), 1);
    assert_eq!(
        label_with_biggest_value(&entries[0].multiclass),
        Some("Vascular Lesions")
    );

    let requests = server.requests();
    assert!(requests[0].starts_with("POST /api/history "));
}

#[test]
fn malformed_images_from_endpoint_is_unexpected() {
    let server = CannedServer::start(vec![success(r#""images": [1, 2, 3]"#)]);
    let api = server.api();
    let creds = Credentials::new("ada@example.com", "secret").expect("valid");

    assert_eq!(api.history(&creds).unwrap_err(), BackendError::Unexpected);
    server.requests();
}
