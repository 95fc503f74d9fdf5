//! Transfer Handle Tests
//!
//! Covers:
//! - Option validation (reserved, callback and class checks)
//! - Info access before and after completion
//! - Reset for reuse

mod common;

use common::ScriptedEngine;
use multinet::base::NetError;
use multinet::multi::Coordinator;
use multinet::reactor::ManualReactor;
use multinet::transfer::{InfoCode, InfoValue, OptionCode, OptionValue, TransferHandle};
use multinet::{Error, ErrorKind};

// === Options ===

#[test]
fn test_reserved_options_are_rejected() {
    let mut handle = TransferHandle::new();
    for code in [
        OptionCode::WRITEDATA,
        OptionCode::READDATA,
        OptionCode::HEADERDATA,
        OptionCode::PROGRESSDATA,
        OptionCode::PRIVATE,
        OptionCode::ERRORBUFFER,
    ] {
        let err = handle.set_option(code, OptionValue::Str(String::new())).unwrap_err();
        assert!(matches!(err, Error::ReservedOption(c) if c == code), "{code}");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
    assert_eq!(handle.options().count(), 0);
}

#[test]
fn test_callback_slots_are_rejected() {
    let mut handle = TransferHandle::new();
    let err = handle.set_option(OptionCode::WRITEFUNCTION, 0i64).unwrap_err();
    assert!(matches!(err, Error::CallbackOption(OptionCode::WRITEFUNCTION)));
}

#[test]
fn test_value_class_is_checked() {
    let mut handle = TransferHandle::new();

    assert!(matches!(
        handle.set_option(OptionCode::URL, 5i64),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        handle.set_option(OptionCode::VERBOSE, "yes"),
        Err(Error::InvalidArgument(_))
    ));
    assert!(handle.set_option(OptionCode::VERBOSE, true).is_ok());
    assert!(handle
        .set_option(OptionCode::INFILESIZE_LARGE, OptionValue::OffT(1 << 33))
        .is_ok());
}

#[test]
fn test_setting_twice_replaces_in_place() {
    let mut handle = TransferHandle::new();
    handle.set_option(OptionCode::URL, "http://a.example/").unwrap();
    handle.set_option(OptionCode::TIMEOUT_MS, 100i64).unwrap();
    handle.set_option(OptionCode::URL, "http://b.example/").unwrap();

    let codes: Vec<_> = handle.options().map(|(code, _)| code).collect();
    assert_eq!(codes, vec![OptionCode::URL, OptionCode::TIMEOUT_MS]);
    assert_eq!(
        handle.option(OptionCode::URL).and_then(|v| v.as_str()),
        Some("http://b.example/")
    );
}

#[test]
fn test_option_code_display() {
    assert_eq!(OptionCode::URL.to_string(), "URL");
    assert_eq!(OptionCode::URL.as_u32(), 10002);
    assert_eq!(OptionCode::from_raw(10002), OptionCode::URL);
}

// === Info ===

#[test]
fn test_info_before_start_fails() {
    let handle = TransferHandle::new();
    assert!(matches!(handle.info(), Err(Error::NotStarted)));
    assert!(matches!(handle.double_info(InfoCode::TOTAL_TIME), Err(Error::NotStarted)));
    assert!(!handle.is_completed());
}

#[test]
fn test_info_after_completion() {
    let engine = ScriptedEngine::new();
    let coordinator = Coordinator::new(engine.clone(), ManualReactor::new()).unwrap();
    engine.on_step(|script, _, _| {
        for id in script.running() {
            script.set_info(id, InfoCode::RESPONSE_CODE, InfoValue::Long(301));
            script.set_info(id, InfoCode::TOTAL_TIME, InfoValue::Double(0.5));
            script.set_info(
                id,
                InfoCode::EFFECTIVE_URL,
                InfoValue::Str(Some("http://example.com/moved".into())),
            );
            script.set_info(
                id,
                InfoCode::COOKIELIST,
                InfoValue::List(vec!["example.com\tFALSE\t/\tFALSE\t0\tk\tv".into()]),
            );
            script.complete(id, Ok(()));
        }
    });

    let mut handle = TransferHandle::new();
    handle.set_option(OptionCode::URL, "http://example.com/").unwrap();
    let mut future = coordinator.add(handle).unwrap();
    coordinator.reactor().fire_timers();
    let response = future.try_take().unwrap().unwrap();
    let handle = response.handle();

    assert!(handle.is_completed());
    assert_eq!(handle.response_code().unwrap(), Some(301));
    assert_eq!(handle.double_info(InfoCode::TOTAL_TIME).unwrap(), Some(0.5));
    assert_eq!(handle.effective_url().unwrap(), Some("http://example.com/moved"));
    assert_eq!(handle.list_info(InfoCode::COOKIELIST).unwrap().map(|l| l.len()), Some(1));
    assert_eq!(handle.int_info(InfoCode::NUM_CONNECTS).unwrap(), None);
    assert!(matches!(
        handle.string_info(InfoCode::RESPONSE_CODE),
        Err(Error::InfoType { actual: "long", .. })
    ));
    assert_eq!(response.status(), Some(http::StatusCode::MOVED_PERMANENTLY));
}

#[test]
fn test_error_description_after_failure() {
    let engine = ScriptedEngine::new();
    let coordinator = Coordinator::new(engine.clone(), ManualReactor::new()).unwrap();
    engine.on_step(|script, _, _| {
        for id in script.running() {
            script.describe(id, "Connection timed out after 1000 milliseconds");
            script.complete(id, Err(NetError::OperationTimedout));
        }
    });

    let handle = TransferHandle::new();
    let id = handle.id();
    let done = std::rc::Rc::new(std::cell::RefCell::new(None));
    let slot = done.clone();
    coordinator
        .add_with_callback(handle, move |outcome| *slot.borrow_mut() = Some(outcome))
        .unwrap();
    coordinator.reactor().fire_timers();

    let err = done.borrow_mut().take().unwrap().unwrap_err();
    assert_eq!(err.code(), Some(NetError::OperationTimedout));
    assert_eq!(
        err.to_string(),
        "transfer failed: Timeout was reached (Connection timed out after 1000 milliseconds)"
    );
    assert!(!coordinator.is_registered(id).unwrap());
}

// === Reset ===

#[test]
fn test_reset_clears_everything_but_identity() {
    let mut handle = TransferHandle::new();
    let id = handle.id();
    handle.set_option(OptionCode::URL, "http://example.com/").unwrap();
    handle.set_read_function(|_| 0);
    handle.set_header_function(|_| true);
    handle.set_progress_function(|_| true);

    handle.reset();

    assert_eq!(handle.id(), id);
    assert_eq!(handle.options().count(), 0);
    assert!(!handle.has_read_function());
    assert!(handle.side_table().is_empty());
    assert!(matches!(handle.info(), Err(Error::NotStarted)));
}

#[test]
fn test_clear_callbacks_keeps_options() {
    let mut handle = TransferHandle::new();
    handle.set_option(OptionCode::URL, "http://example.com/").unwrap();
    handle.set_write_function(|data| data.len());
    handle.set_read_function(|_| 0);

    handle.clear_callbacks();

    assert!(!handle.has_write_function());
    assert!(!handle.has_read_function());
    assert_eq!(handle.options().count(), 1);
}
