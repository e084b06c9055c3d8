// File: request_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use super::*;
use pretty_assertions::assert_eq;
use rstest::*;

const RAW_REDEEM: &str = "POST /api/redeem?src=web HTTP/1.1\r\n\
Host: shop.example.com\r\n\
Content-Type: application/json\r\n\
Content-Length: 999\r\n\
Cookie: session=abc\r\n\
\r\n\
{\"code\":\"WELCOME10\"}";

#[test]
fn test_parse_raw_request() {
    let request = TargetRequest::parse_raw(RAW_REDEEM.as_bytes()).unwrap();

    assert_eq!(request.method(), "POST");
    assert_eq!(request.path(), "/api/redeem?src=web");
    assert_eq!(request.header("host"), Some("shop.example.com"));
    assert_eq!(request.header("COOKIE"), Some("session=abc"));
    assert_eq!(request.body(), b"{\"code\":\"WELCOME10\"}");
    assert!(!request.has_destination());
}

#[test]
fn test_parse_raw_request_with_bare_newlines() {
    let raw = "GET /cart HTTP/1.1\nHost: localhost:8080\n\n";
    let request = TargetRequest::parse_raw(raw.as_bytes()).unwrap();
    assert_eq!(request.path(), "/cart");
    assert_eq!(request.header("Host"), Some("localhost:8080"));
    assert!(request.body().is_empty());
}

#[test]
fn test_parse_raw_absolute_form() {
    let raw = "GET http://127.0.0.1:9000/orders HTTP/1.1\r\nHost: 127.0.0.1:9000\r\n\r\n";
    let request = TargetRequest::parse_raw(raw.as_bytes()).unwrap();
    let service = request.service().unwrap();
    assert_eq!(service.host(), "127.0.0.1");
    assert_eq!(service.port(), 9000);
    assert!(!service.secure());
    assert_eq!(request.path(), "/orders");
    assert_eq!(request.headers().len(), 1);
}

#[rstest]
#[case("")]
#[case("\r\n\r\n")]
#[case("GET\r\n\r\n")]
fn test_parse_raw_rejects_malformed(#[case] raw: &str) {
    assert!(TargetRequest::parse_raw(raw.as_bytes()).is_err());
}

#[test]
fn test_fixed_content_length() {
    let request = TargetRequest::parse_raw(RAW_REDEEM.as_bytes())
        .unwrap()
        .with_fixed_content_length();
    assert_eq!(request.header("Content-Length"), Some("20"));
    assert_eq!(
        request
            .headers()
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("content-length"))
            .count(),
        1
    );
}

#[test]
fn test_fixed_content_length_leaves_bodyless_get_alone() {
    let request = TargetRequest::new("get", "/").with_fixed_content_length();
    assert_eq!(request.method(), "GET");
    assert_eq!(request.header("Content-Length"), None);
}

#[rstest]
#[case("shop.example.com", "shop.example.com", 443, true)]
#[case("shop.example.com:8443", "shop.example.com", 8443, true)]
#[case("localhost:80", "localhost", 80, false)]
#[case("localhost:abc", "localhost", 443, true)]
#[case("[::1]:8080", "[::1]", 8080, true)]
fn test_service_from_host_header(
    #[case] header: &str,
    #[case] host: &str,
    #[case] port: u16,
    #[case] secure: bool,
) {
    let service = HttpService::from_host_header(header).unwrap();
    assert_eq!(service.host(), host);
    assert_eq!(service.port(), port);
    assert_eq!(service.secure(), secure);
}

#[test]
fn test_service_from_empty_host_header() {
    assert!(HttpService::from_host_header("  ").is_none());
    assert!(HttpService::from_host_header(":443").is_none());
}

#[test]
fn test_recovered_service_prefers_fallback() {
    let fallback = HttpService::new("imported.example.com", 8443, true);
    let request = TargetRequest::parse_raw(RAW_REDEEM.as_bytes())
        .unwrap()
        .with_recovered_service(Some(&fallback));
    assert_eq!(request.service(), Some(&fallback));
}

#[test]
fn test_recovered_service_from_host_header() {
    let request = TargetRequest::parse_raw(RAW_REDEEM.as_bytes())
        .unwrap()
        .with_recovered_service(None);
    assert_eq!(
        request.url().unwrap().as_str(),
        "https://shop.example.com/api/redeem?src=web"
    );
}

#[test]
fn test_url_without_service_is_configuration_error() {
    let request = TargetRequest::new("GET", "/");
    assert!(matches!(request.url(), Err(RaceError::Configuration(_))));
}

#[test]
fn test_from_url() {
    let request =
        TargetRequest::from_url("post", "http://127.0.0.1:3000/api/transfer?x=1").unwrap();
    assert_eq!(request.method(), "POST");
    assert_eq!(request.path(), "/api/transfer?x=1");
    assert_eq!(request.header("Host"), Some("127.0.0.1:3000"));
    assert_eq!(
        request.url().unwrap().as_str(),
        "http://127.0.0.1:3000/api/transfer?x=1"
    );
    assert_eq!(request.to_string(), "POST http://127.0.0.1:3000/api/transfer?x=1");
}

#[test]
fn test_from_url_rejects_other_schemes() {
    assert!(TargetRequest::from_url("GET", "ftp://example.com/").is_err());
    assert!(TargetRequest::from_url("GET", "not a url").is_err());
}
