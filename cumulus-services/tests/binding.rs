//! 派生绑定的行为测试：字段标注 → 请求面 / 响应面

use std::collections::HashMap;

use cumulus_common::bind::{ApiInput, ApiOutput, RequestBinder, ResponseView};
use cumulus_common::chrono::{DateTime, TimeZone, Utc};
use cumulus_common::request::HttpRequest;
use cumulus_common::Method;
use cumulus_macro::{ApiInput, ApiOutput};
use serde::Deserialize;

fn http(path: &str) -> HttpRequest {
    let mut h = HttpRequest::new(Method::GET, "https://h".to_string());
    h.path = path.to_string();
    h
}

#[derive(Debug, Default, ApiInput)]
struct KitchenSinkInput {
    #[api(uri = "id")]
    id: String,
    #[api(query = "flag")]
    flag: bool,
    #[api(query = "count")]
    count: Option<i32>,
    #[api(query = "tags")]
    tags: Vec<String>,
    #[api(query = "states")]
    states: Vec<Option<String>>,
    #[api(query = "filters")]
    filters: HashMap<String, String>,
    #[api(query = "since", ts = "iso8601")]
    since: Option<DateTime<Utc>>,
    #[api(header = "X-Token")]
    token: String,
    #[api(headers = "X-Meta-")]
    meta: HashMap<String, String>,
    #[api(body, name = "displayName")]
    display_name: String,
    #[api(skip)]
    #[allow(dead_code)]
    internal: String,
}

#[test]
fn test_write_request_covers_all_shapes() {
    let mut input = KitchenSinkInput {
        id: "a b/c".into(),
        flag: true,
        count: Some(7),
        tags: vec!["x".into(), "y".into()],
        states: vec![Some("ok".into()), None, Some("bad".into())],
        since: Some(Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()),
        token: "  t0ken  ".into(),
        display_name: "Dev".into(),
        internal: "hidden".into(),
        ..Default::default()
    };
    input.filters.insert("region".into(), "eu10".into());
    input.meta.insert("owner".into(), "alice".into());

    let mut h = http("/things/{id}");
    let mut b = RequestBinder::new(&mut h);
    input.write_request(&mut b).unwrap();

    assert_eq!(h.path, "/things/a%20b%2Fc");
    assert!(h.query.contains(&("flag".to_string(), "true".to_string())));
    assert!(h.query.contains(&("count".to_string(), "7".to_string())));
    assert!(h.query.contains(&("tags".to_string(), "x,y".to_string())));
    let states: Vec<_> = h.query.iter().filter(|(k, _)| k == "states").collect();
    assert_eq!(states.len(), 2);
    assert!(h.query.contains(&("region".to_string(), "eu10".to_string())));
    assert!(
        h.query
            .contains(&("since".to_string(), "2026-08-01T12:00:00Z".to_string()))
    );
    assert_eq!(h.headers.get("X-Token").unwrap(), "t0ken");
    assert_eq!(h.headers.get("X-Meta-owner").unwrap(), "alice");

    let body = input.body_json().unwrap().unwrap();
    assert_eq!(body["displayName"], "Dev");
}

#[test]
fn test_empty_values_are_omitted() {
    let input = KitchenSinkInput::default();
    let mut h = http("/things/{id}");
    let mut b = RequestBinder::new(&mut h);
    input.write_request(&mut b).unwrap();

    // 路径占位符保留（值未设置），空查询参数都被省略
    assert_eq!(h.path, "/things/{id}");
    let keys: Vec<_> = h.query.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["flag"]); // bool 总有值
    assert!(h.headers.get("X-Token").is_none());
}

#[test]
fn test_body_json_empty_when_nothing_set() {
    #[derive(Debug, Default, ApiInput)]
    struct NoBody {
        #[api(query = "q")]
        q: String,
    }
    assert!(NoBody::default().body_json().unwrap().is_none());
}

#[derive(Debug, Default, Deserialize, ApiOutput)]
#[serde(default)]
struct ProbeOutput {
    name: String,
    #[serde(skip)]
    #[api(header = "Location")]
    location: Option<String>,
    #[serde(skip)]
    #[api(status)]
    status_line: String,
    #[serde(skip)]
    #[api(body)]
    raw: Vec<u8>,
}

#[test]
fn test_read_response_bindings() {
    let mut map = cumulus_common::HeaderMap::new();
    map.insert("Location", "/jobs/42".parse().unwrap());
    let body = br#"{"name":"report-1"}"#;
    let view = ResponseView::new(404, &map, body);

    let mut out = ProbeOutput::default();
    out.unmarshal_json(body).unwrap();
    out.read_response(&view).unwrap();

    assert_eq!(out.name, "report-1");
    assert_eq!(out.location.as_deref(), Some("/jobs/42"));
    assert_eq!(out.status_line, "404 Not Found");
    assert_eq!(out.raw, body);
}

#[test]
fn test_unmarshal_skips_empty_body() {
    let mut out = ProbeOutput {
        name: "keep".into(),
        ..Default::default()
    };
    out.unmarshal_json(b"").unwrap();
    assert_eq!(out.name, "keep");
}
