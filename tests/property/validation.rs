// Property tests unwrap freely on inputs the strategies guarantee valid.
#![allow(clippy::unwrap_used)]

//! Property-based tests for request validation.
//!
//! Uses proptest to verify:
//! 1. Arbitrary bytes never cause a panic in the body decoders.
//! 2. Titles are accepted exactly when they have at least three characters.
//! 3. Id parsing accepts every positive integer and nothing else.
//! 4. Any valid create request survives JSON encode → decode.

use proptest::prelude::*;
use taskdeck_proto::api::{
    CreateTaskRequest, ValidationError, decode_create, decode_update_status, parse_due_date,
    parse_task_id, validate_title,
};
use taskdeck_proto::task::{MIN_TITLE_LENGTH, Priority, TaskId, TodoStatus};

fn arb_priority() -> impl Strategy<Value = Option<Priority>> {
    prop_oneof![
        Just(None),
        Just(Some(Priority::Low)),
        Just(Some(Priority::Medium)),
        Just(Some(Priority::High)),
    ]
}

fn arb_status() -> impl Strategy<Value = TodoStatus> {
    prop_oneof![Just(TodoStatus::Pending), Just(TodoStatus::Completed)]
}

fn arb_valid_request() -> impl Strategy<Value = CreateTaskRequest> {
    (
        "[^\x00]{3,64}",
        prop::option::of("[^\x00]{0,64}"),
        prop::option::of((2000i32..2100, 1u32..=12, 1u32..=28)),
        arb_priority(),
        arb_status(),
        prop::option::of(prop::collection::vec("[a-z]{1,8}", 0..4)),
    )
        .prop_map(|(title, description, due, priority, todo_status, tags)| {
            CreateTaskRequest {
                title,
                description,
                due_date: due.map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}")),
                priority,
                todo_status,
                tags,
            }
        })
}

proptest! {
    #[test]
    fn decode_create_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_create(&bytes);
    }

    #[test]
    fn decode_update_status_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_update_status(&bytes);
    }

    #[test]
    fn parse_due_date_never_panics(raw in any::<String>()) {
        let _ = parse_due_date(&raw);
    }

    #[test]
    fn title_length_decides_validity(title in any::<String>()) {
        let result = validate_title(&title);
        if title.chars().count() >= MIN_TITLE_LENGTH {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result, Err(ValidationError::TitleTooShort { min: MIN_TITLE_LENGTH }));
        }
    }

    #[test]
    fn positive_ids_parse(n in 1i64..=i64::MAX) {
        prop_assert_eq!(parse_task_id(&n.to_string()).unwrap(), TaskId::new(n));
    }

    #[test]
    fn non_positive_ids_are_rejected(n in i64::MIN..=0) {
        prop_assert!(parse_task_id(&n.to_string()).is_err());
    }

    #[test]
    fn arbitrary_id_strings_never_panic(raw in any::<String>()) {
        let _ = parse_task_id(&raw);
    }

    #[test]
    fn valid_requests_decode_to_the_same_task(request in arb_valid_request()) {
        let bytes = serde_json::to_vec(&request).unwrap();
        let decoded = decode_create(&bytes).unwrap();
        let expected = request.validate().unwrap();
        prop_assert_eq!(decoded, expected);
    }
}
