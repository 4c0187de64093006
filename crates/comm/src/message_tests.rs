// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

#[test]
fn input_message_json_shape() {
    let message = Message::Input {
        job_id: JobId::new("j1"),
        io_data_root: PathBuf::from("/data/sheep_a"),
    };
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["message_type"], "InputMessage");
    assert_eq!(value["job_id"], "j1");
    assert_eq!(value["io_data_root"], "/data/sheep_a");
}

#[test]
fn error_message_json_shape() {
    let message = Message::Error {
        job_id: JobId::new("j2"),
        short_error: "boom".into(),
        long_error: "trace".into(),
    };
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["message_type"], "ErrorMessage");
    assert_eq!(value["short_error"], "boom");
    assert_eq!(value["long_error"], "trace");
}

#[test]
fn every_variant_round_trips() {
    let messages = [
        Message::Input { job_id: JobId::new("a"), io_data_root: PathBuf::from("/tmp/x") },
        Message::Done { job_id: JobId::new("b") },
        Message::Error {
            job_id: JobId::new("c"),
            short_error: "s".into(),
            long_error: "l".into(),
        },
    ];
    for message in messages {
        let json = serde_json::to_string(&message).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }
}

#[test]
fn unknown_tag_fails_to_decode() {
    let raw = r#"{"message_type":"PingMessage","job_id":"x"}"#;
    assert!(serde_json::from_str::<Message>(raw).is_err());
}

#[test]
fn identity_is_not_part_of_the_payload() {
    let message = Message::Done { job_id: JobId::new("d") };
    let json = serde_json::to_string(&message).unwrap();
    assert!(!json.contains("identity"));
}

#[test]
fn kind_and_job_id_accessors() {
    let message = Message::Done { job_id: JobId::new("j9") };
    assert_eq!(message.kind(), MessageKind::Done);
    assert_eq!(message.job_id().as_str(), "j9");
    assert_eq!(MessageKind::Input.to_string(), "InputMessage");
}
