use harvester_core::{ExtractedContent, SubmissionPayload};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn payload_serializes_to_the_wire_shape() {
    let content = ExtractedContent {
        source_url: "https://a.example".into(),
        title: "A".into(),
        body_text: "hello".into(),
    };
    let value = serde_json::to_value(SubmissionPayload::from(&content)).unwrap();
    assert_eq!(
        value,
        json!({"url": "https://a.example", "title": "A", "content": "hello"})
    );
}

#[test]
fn legacy_field_names_are_accepted() {
    let payload: SubmissionPayload =
        serde_json::from_value(json!({"tabId": 12, "bodyText": "text", "title": "T"})).unwrap();
    assert_eq!(payload.content, "text");
    assert_eq!(payload.tab_id, Some(12));
    assert_eq!(payload.url, "");
}

#[test]
fn content_is_required() {
    let result = serde_json::from_value::<SubmissionPayload>(json!({"url": "u", "title": "t"}));
    assert!(result.is_err());
}
