//! Request Builder and Client Tests
//!
//! Covers:
//! - Method dispatch into handle options
//! - Upload streaming through the read callback
//! - Body, header and progress sinks
//! - Proxy, TLS and auth settings
//! - `HttpClient` end to end over the scripted engine

mod common;

use bytes::Bytes;
use common::ScriptedEngine;
use multinet::http::{
    AuthMode, HttpClient, HttpRequestBuilder, ProxySettings, Request, RequestBody,
};
use multinet::multi::Coordinator;
use multinet::reactor::ManualReactor;
use multinet::transfer::{OptionCode, OptionValue, Progress, TransferHandle};
use multinet::{Error, ErrorKind};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;

fn configure(request: &Request) -> Result<TransferHandle, Error> {
    let mut handle = TransferHandle::new();
    HttpRequestBuilder::configure(&mut handle, request)?;
    Ok(handle)
}

fn long(handle: &TransferHandle, code: OptionCode) -> Option<i64> {
    handle.option(code).and_then(|v| v.as_long())
}

fn string(handle: &TransferHandle, code: OptionCode) -> Option<&str> {
    handle.option(code).and_then(|v| v.as_str())
}

// === Method dispatch ===

#[test]
fn test_get_is_default() {
    let handle = configure(&Request::new("", "http://example.com/")).unwrap();

    assert_eq!(string(&handle, OptionCode::URL), Some("http://example.com/"));
    assert_eq!(long(&handle, OptionCode::HTTPGET), Some(1));
    assert!(handle.option(OptionCode::CUSTOMREQUEST).is_none());
    assert!(!handle.has_read_function());
}

#[test]
fn test_method_is_case_insensitive() {
    let handle = configure(&Request::new("head", "http://example.com/")).unwrap();

    assert_eq!(long(&handle, OptionCode::HTTPGET), Some(1));
    assert_eq!(long(&handle, OptionCode::NOBODY), Some(1));
}

#[test]
fn test_post_copies_whole_body() {
    let mut request = Request::new("POST", "http://example.com/form");
    request.body = RequestBody::from("a=1&b=2");
    let handle = configure(&request).unwrap();

    assert_eq!(long(&handle, OptionCode::POST), Some(1));
    assert_eq!(handle.option(OptionCode::POSTFIELDSIZE_LARGE), Some(&OptionValue::OffT(7)));
    assert_eq!(
        handle
            .option(OptionCode::COPYPOSTFIELDS)
            .and_then(|v| v.as_bytes())
            .map(|b| &b[..]),
        Some(&b"a=1&b=2"[..])
    );
    assert!(!handle.has_read_function());
}

#[test]
fn test_put_streams_body() {
    let mut request = Request::new("PUT", "http://example.com/upload");
    request.body = RequestBody::from(vec![7u8; 10]);
    let handle = configure(&request).unwrap();

    assert_eq!(long(&handle, OptionCode::UPLOAD), Some(1));
    assert_eq!(handle.option(OptionCode::INFILESIZE_LARGE), Some(&OptionValue::OffT(10)));
    assert!(handle.has_read_function());
    assert!(handle.option(OptionCode::COPYPOSTFIELDS).is_none());
}

#[test]
fn test_reconfigure_drops_previous_callbacks() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut streamed = Request::new("PUT", "http://example.com/upload");
    streamed.body = RequestBody::from(vec![1u8; 4]);
    streamed.body_sink = Some(tx);

    let mut handle = TransferHandle::new();
    HttpRequestBuilder::configure(&mut handle, &streamed).unwrap();
    assert!(handle.has_write_function());
    assert!(handle.has_read_function());

    HttpRequestBuilder::configure(&mut handle, &Request::get("http://example.com/")).unwrap();
    assert!(!handle.has_write_function());
    assert!(!handle.has_read_function());
    assert_eq!(string(&handle, OptionCode::URL), Some("http://example.com/"));
}

#[test]
fn test_delete_sets_custom_verb() {
    let handle = configure(&Request::new("DELETE", "http://example.com/item/1")).unwrap();

    assert_eq!(string(&handle, OptionCode::CUSTOMREQUEST), Some("DELETE"));
    assert!(handle.option(OptionCode::HTTPGET).is_none());
}

#[test]
fn test_unsupported_method_is_rejected() {
    let err = configure(&Request::new("PATCH", "http://example.com/")).unwrap_err();

    assert!(matches!(err, Error::UnsupportedMethod(ref m) if m == "PATCH"));
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn test_invalid_method_token_is_rejected_even_when_allowed() {
    let mut request = Request::new("NOT A METHOD", "http://example.com/");
    request.allow_nonstandard_methods = true;

    assert!(matches!(configure(&request), Err(Error::UnsupportedMethod(_))));
}

#[test]
fn test_empty_url_is_rejected() {
    assert!(matches!(configure(&Request::get("")), Err(Error::EmptyUrl)));
}

// === Settings ===

#[test]
fn test_headers_become_engine_lines() {
    let mut request = Request::get("http://example.com/");
    request.headers.insert("Accept", "application/json").unwrap();
    request.headers.insert("X-Empty", "").unwrap();
    let handle = configure(&request).unwrap();

    assert_eq!(
        handle.option(OptionCode::HTTPHEADER).and_then(|v| v.as_list()),
        Some(&["Accept: application/json".to_string(), "X-Empty;".to_string()][..])
    );
}

#[test]
fn test_redirect_policy() {
    let mut request = Request::get("http://example.com/");
    let handle = configure(&request).unwrap();
    assert_eq!(long(&handle, OptionCode::FOLLOWLOCATION), Some(1));
    assert_eq!(long(&handle, OptionCode::MAXREDIRS), Some(20));

    request.follow_redirects = false;
    request.max_redirects = None;
    let handle = configure(&request).unwrap();
    assert_eq!(long(&handle, OptionCode::FOLLOWLOCATION), Some(0));
    assert!(handle.option(OptionCode::MAXREDIRS).is_none());
}

#[test]
fn test_auth_and_timeouts() {
    let mut request = Request::get("http://example.com/");
    request.username = Some("alice".into());
    request.password = Some(zeroize::Zeroizing::new("secret".into()));
    request.auth_mode = Some(AuthMode::Digest);
    request.request_timeout = Some(Duration::from_millis(1500));
    let handle = configure(&request).unwrap();

    assert_eq!(string(&handle, OptionCode::USERNAME), Some("alice"));
    assert_eq!(string(&handle, OptionCode::PASSWORD), Some("secret"));
    assert_eq!(long(&handle, OptionCode::HTTPAUTH), Some(2));
    assert_eq!(long(&handle, OptionCode::TIMEOUT_MS), Some(1500));
}

#[test]
fn test_proxy_settings() {
    let mut request = Request::get("http://example.com/");
    request.proxy = Some(
        ProxySettings::new("socks5://proxy.local:9050")
            .unwrap()
            .with_auth("user", "pass")
            .with_bypass("localhost,.internal"),
    );
    let handle = configure(&request).unwrap();

    assert_eq!(string(&handle, OptionCode::PROXY), Some("socks5://proxy.local"));
    assert_eq!(long(&handle, OptionCode::PROXYPORT), Some(9050));
    assert_eq!(string(&handle, OptionCode::PROXYUSERNAME), Some("user"));
    assert_eq!(string(&handle, OptionCode::PROXYPASSWORD), Some("pass"));
    assert_eq!(string(&handle, OptionCode::NOPROXY), Some("localhost,.internal"));
}

#[test]
fn test_tls_paths_and_ip_family() {
    let mut request = Request::get("https://example.com/");
    request.ca_certs = Some(PathBuf::from("/etc/ssl/bundle.pem"));
    request.client_cert = Some(PathBuf::from("client.pem"));
    request.client_key = Some(PathBuf::from("client.key"));
    request.allow_ipv6 = false;
    let handle = configure(&request).unwrap();

    assert_eq!(string(&handle, OptionCode::CAINFO), Some("/etc/ssl/bundle.pem"));
    assert_eq!(string(&handle, OptionCode::SSLCERT), Some("client.pem"));
    assert_eq!(string(&handle, OptionCode::SSLKEY), Some("client.key"));
    assert_eq!(long(&handle, OptionCode::SSL_VERIFYPEER), Some(1));
    assert_eq!(long(&handle, OptionCode::SSL_VERIFYHOST), Some(2));
    assert_eq!(long(&handle, OptionCode::IPRESOLVE), Some(1));
}

#[test]
fn test_progress_sink_enables_progress() {
    let (tx, _rx) = mpsc::unbounded_channel::<Progress>();
    let mut request = Request::get("http://example.com/");
    assert!(configure(&request).unwrap().option(OptionCode::NOPROGRESS).is_none());

    request.progress_sink = Some(tx);
    assert_eq!(long(&configure(&request).unwrap(), OptionCode::NOPROGRESS), Some(0));
}

// === Through the coordinator ===

type TestClient = HttpClient<ScriptedEngine, ManualReactor>;

fn client() -> (TestClient, ScriptedEngine) {
    let engine = ScriptedEngine::new();
    let coordinator = Coordinator::new(engine.clone(), ManualReactor::new()).unwrap();
    (HttpClient::new(coordinator), engine)
}

#[test]
fn test_put_upload_is_read_in_chunks() {
    let (client, engine) = client();
    let uploaded = Rc::new(RefCell::new(Vec::new()));
    let sink = uploaded.clone();
    engine.on_step(move |script, _, _| {
        for id in script.running() {
            let mut buf = [0u8; 4];
            loop {
                let n = script.read(id, &mut buf);
                if n == 0 {
                    break;
                }
                sink.borrow_mut().extend_from_slice(&buf[..n]);
            }
            script.complete(id, Ok(()));
        }
    });

    let mut future = client
        .put("http://example.com/upload")
        .body("0123456789")
        .send()
        .unwrap();
    client.coordinator().reactor().fire_timers();

    assert!(future.try_take().unwrap().is_ok());
    assert_eq!(uploaded.borrow().as_slice(), b"0123456789");
}

#[test]
fn test_streaming_sinks_receive_data() {
    let (client, engine) = client();
    engine.on_step(|script, _, _| {
        for id in script.running() {
            script.header(id, "HTTP/1.1 200 OK\r\n");
            script.write(id, b"chunk-1 ");
            script.write(id, b"chunk-2");
            script.complete(id, Ok(()));
        }
    });
    let (body_tx, mut body_rx) = mpsc::unbounded_channel();
    let (header_tx, mut header_rx) = mpsc::unbounded_channel();

    let mut future = client
        .get("http://example.com/stream")
        .stream_body(body_tx)
        .stream_headers(header_tx)
        .send()
        .unwrap();
    client.coordinator().reactor().fire_timers();

    let response = future.try_take().unwrap().unwrap();
    assert!(response.body().is_empty());
    assert_eq!(response.status(), Some(http::StatusCode::OK));
    assert_eq!(body_rx.try_recv().unwrap(), Bytes::from_static(b"chunk-1 "));
    assert_eq!(body_rx.try_recv().unwrap(), Bytes::from_static(b"chunk-2"));
    assert_eq!(header_rx.try_recv().unwrap(), Bytes::from_static(b"HTTP/1.1 200 OK\r\n"));
}

#[test]
fn test_closed_body_sink_short_writes() {
    let (client, engine) = client();
    let written = Rc::new(RefCell::new(None));
    let seen = written.clone();
    engine.on_step(move |script, _, _| {
        for id in script.running() {
            *seen.borrow_mut() = Some(script.write(id, b"data"));
            script.complete(id, Err(multinet::base::NetError::WriteError));
        }
    });
    let (body_tx, body_rx) = mpsc::unbounded_channel();
    drop(body_rx);

    let mut future = client
        .get("http://example.com/")
        .stream_body(body_tx)
        .send()
        .unwrap();
    client.coordinator().reactor().fire_timers();

    assert_eq!(*written.borrow(), Some(0));
    let err = future.try_take().unwrap().unwrap_err();
    assert_eq!(err.code(), Some(multinet::base::NetError::WriteError));
}

#[test]
fn test_invalid_header_fails_at_send() {
    let (client, engine) = client();

    let result = client
        .get("http://example.com/")
        .header("Bad Header", "x")
        .send();

    assert!(result.is_err());
    assert!(engine.added().is_empty());
}

#[test]
fn test_client_defaults_apply() {
    let engine = ScriptedEngine::new();
    let coordinator = Coordinator::new(engine.clone(), ManualReactor::new()).unwrap();
    let client = TestClient::builder()
        .user_agent("multinet-test/1.0")
        .timeout(Duration::from_secs(5))
        .gzip(true)
        .build(coordinator);

    let future = client.get("http://example.com/").send().unwrap();

    let options = engine.options_for(future.id());
    assert!(options.contains(&(OptionCode::USERAGENT, OptionValue::Str("multinet-test/1.0".into()))));
    assert!(options.contains(&(OptionCode::TIMEOUT_MS, OptionValue::Long(5000))));
    assert!(options.contains(&(OptionCode::ACCEPT_ENCODING, OptionValue::Str("gzip".into()))));
}

#[test]
fn test_fetch_with_reuses_handle() {
    let (client, engine) = client();
    engine.on_step(|script, _, _| {
        for id in script.running() {
            script.complete(id, Ok(()));
        }
    });

    let mut first = client.get("http://example.com/one").send().unwrap();
    client.coordinator().reactor().fire_timers();
    let handle = first.try_take().unwrap().unwrap().into_handle();
    let id = handle.id();

    let second = client
        .fetch_with(handle, &Request::new("DELETE", "http://example.com/two"))
        .unwrap();

    assert_eq!(second.id(), id);
    let options = engine.options_for(id);
    assert!(options.contains(&(OptionCode::URL, OptionValue::Str("http://example.com/two".into()))));
    assert!(!options.iter().any(|(code, _)| *code == OptionCode::HTTPGET));
}

#[cfg(feature = "json")]
#[test]
fn test_json_body_and_response() {
    let (client, engine) = client();
    engine.on_step(|script, _, _| {
        for id in script.running() {
            script.write(id, br#"{"ok":true}"#);
            script.complete(id, Ok(()));
        }
    });

    let mut future = client
        .post("http://example.com/api")
        .json(&serde_json::json!({ "name": "multinet" }))
        .send()
        .unwrap();
    client.coordinator().reactor().fire_timers();

    let options = engine.options_for(future.id());
    assert!(options.contains(&(
        OptionCode::COPYPOSTFIELDS,
        OptionValue::Bytes(Bytes::from_static(br#"{"name":"multinet"}"#))
    )));
    assert!(options.contains(&(
        OptionCode::HTTPHEADER,
        OptionValue::List(vec!["Content-Type: application/json".into()])
    )));

    let value: serde_json::Value = future.try_take().unwrap().unwrap().json().unwrap();
    assert_eq!(value["ok"], serde_json::Value::Bool(true));
}
