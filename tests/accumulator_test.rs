//! Response Accumulator Tests
//!
//! Covers:
//! - Body assembly across many writes
//! - Header line splitting
//! - Status line tracking

use multinet::http::{split_header_line, ResponseAccumulator};

#[test]
fn test_pieces_concatenate_like_one_write() {
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

    let mut whole = ResponseAccumulator::new();
    whole.append_body(&payload);
    let expected = whole.finish().body;
    assert_eq!(expected.as_ref(), payload.as_slice());

    for piece_len in [1, 7, 512, 4096] {
        let mut pieces = ResponseAccumulator::new();
        for chunk in payload.chunks(piece_len) {
            pieces.append_body(chunk);
        }
        assert_eq!(pieces.body_len(), payload.len());
        assert_eq!(pieces.finish().body, expected, "piece length {piece_len}");
    }
}

#[test]
fn test_empty_writes_are_harmless() {
    let mut acc = ResponseAccumulator::new();
    acc.append_body(b"");
    acc.append_body(b"abc");
    acc.append_body(b"");
    assert_eq!(acc.finish().body.as_ref(), b"abc");
}

#[test]
fn test_split_on_first_colon_without_trimming() {
    assert_eq!(
        split_header_line("Content-Type: text/plain"),
        ("Content-Type".to_string(), " text/plain".to_string())
    );
    assert_eq!(
        split_header_line("HTTP/1.1 200 OK"),
        ("HTTP/1.1 200 OK".to_string(), String::new())
    );
    assert_eq!(
        split_header_line("Location: http://example.com:8080/x"),
        ("Location".to_string(), " http://example.com:8080/x".to_string())
    );
    assert_eq!(
        split_header_line("X-Spaces:  padded  "),
        ("X-Spaces".to_string(), "  padded  ".to_string())
    );
    assert_eq!(split_header_line("Empty:"), ("Empty".to_string(), String::new()));
}

#[test]
fn test_header_lines_in_order() {
    let mut acc = ResponseAccumulator::new();
    for line in [
        "HTTP/1.1 301 Moved Permanently\r\n",
        "Location: /next\r\n",
        "\r\n",
        "HTTP/1.1 200 OK\r\n",
        "Set-Cookie: a=1\r\n",
        "Set-Cookie: b=2\r\n",
        "\r\n",
    ] {
        acc.append_header_line(line.as_bytes());
    }

    assert_eq!(acc.status(), Some(http::StatusCode::OK));
    let parts = acc.finish();
    let names: Vec<_> = parts.headers.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "HTTP/1.1 301 Moved Permanently",
            "Location",
            "HTTP/1.1 200 OK",
            "Set-Cookie",
            "Set-Cookie",
        ]
    );
    assert_eq!(parts.headers[4].1, " b=2");
}

#[test]
fn test_no_status_line() {
    let mut acc = ResponseAccumulator::new();
    acc.append_header_line(b"X-Only: header\n");
    assert_eq!(acc.status(), None);
    assert_eq!(acc.headers(), &[("X-Only".to_string(), " header".to_string())]);
}
