use demo_service::{DEMO_PROTO, PROTO_DIR};
use prost::Message;
use protoshell_core::dynamic::{DynamicPayload, PayloadError, TypeRef};
use protoshell_core::index::SchemaIndex;

fn hello_request() -> TypeRef {
    SchemaIndex::from_proto_files(&[DEMO_PROTO], &[PROTO_DIR])
        .expect("Failed to index demo protos")
        .method("demo", "Greeter", "SayHello")
        .expect("Method not found")
        .request
}

#[test]
fn test_new_instances_are_independent() {
    let type_ref = hello_request();

    let mut first = type_ref.new_instance();
    first.decode_from(r#"{"name": "Ann"}"#).unwrap();
    let second = type_ref.new_instance();

    assert_eq!(first.to_json().unwrap()["name"], "Ann");
    assert_eq!(second.to_json().unwrap(), serde_json::json!({}));
}

#[test]
fn test_decoded_values_survive_encoding() {
    let mut payload = hello_request().new_instance();
    payload
        .decode_from(r#"{"name": "Ann", "times": 3, "tags": ["a", "b"]}"#)
        .unwrap();

    let rendered: serde_json::Value = serde_json::from_str(&payload.encode_to().unwrap()).unwrap();
    assert_eq!(
        rendered,
        serde_json::json!({ "name": "Ann", "times": 3, "tags": ["a", "b"] })
    );

    // The wire form decodes back into the same message.
    let bytes = payload.as_message().encode_to_vec();
    let mut decoded = DynamicPayload::new(payload.descriptor()).into_message();
    decoded.merge(bytes.as_slice()).unwrap();
    assert_eq!(
        DynamicPayload::from(decoded).to_json().unwrap(),
        payload.to_json().unwrap()
    );
}

#[test]
fn test_decode_replaces_previous_content() {
    let mut payload = hello_request().new_instance();
    payload.decode_from(r#"{"name": "Ann", "times": 2}"#).unwrap();
    payload.decode_from(r#"{"name": "Bob"}"#).unwrap();

    assert_eq!(payload.to_json().unwrap(), serde_json::json!({ "name": "Bob" }));
}

#[test]
fn test_non_conforming_input_is_rejected() {
    let type_ref = hello_request();

    for data in [
        r#"{"nickname": "Ann"}"#,
        r#"{"times": "many"}"#,
        r#"{"name": "Ann"} trailing"#,
        "not json",
    ] {
        let mut payload = type_ref.new_instance();
        assert!(
            matches!(
                payload.decode_from(data),
                Err(PayloadError::Decode { ref message, .. }) if message == "demo.HelloRequest"
            ),
            "{data} should not decode"
        );
    }
}

#[test]
fn test_encode_is_indented() {
    let mut payload = hello_request().new_instance();
    payload.decode_from(r#"{"name": "Ann"}"#).unwrap();

    assert_eq!(payload.encode_to().unwrap(), "{\n  \"name\": \"Ann\"\n}");
}
