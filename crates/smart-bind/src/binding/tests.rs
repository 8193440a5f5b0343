use std::io;

use assert_matches::assert_matches;
use http::{Method, Request, header};
use test_casing::test_casing;

use super::*;
use crate::{
    ErrorKind,
    testonly::{Headers, Upload, User},
};

const URLENCODED: &str = "application/x-www-form-urlencoded";
const BOUNDARY: &str = "X-BOUNDARY";

fn multipart_body() -> String {
    [
        "--X-BOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
        "quarterly report\r\n",
        "--X-BOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"file\"; filename=\"report.txt\"\r\n",
        "Content-Type: text/plain\r\n\r\n",
        "line 1\r\nline 2\r\n",
        "--X-BOUNDARY\r\n",
        "Content-Disposition: form-data\r\n\r\n",
        "unnamed\r\n",
        "--X-BOUNDARY--\r\n",
    ]
    .concat()
}

fn multipart_request(body: String) -> Request<String> {
    Request::post("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .unwrap()
}

struct FailingReader;

impl io::Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("connection reset"))
    }
}

const DISPATCH_CASES: [(Method, Option<&str>, Binding); 6] = [
    (Method::GET, Some("application/json"), Binding::Form),
    (Method::POST, Some("application/json"), Binding::Json),
    (Method::PUT, Some("Application/JSON; charset=utf-8"), Binding::Json),
    (Method::POST, Some("multipart/form-data; boundary=xyz"), Binding::FormMultipart),
    (Method::POST, Some(URLENCODED), Binding::Form),
    (Method::DELETE, None, Binding::Form),
];

#[test_casing(6, DISPATCH_CASES)]
#[test]
fn selecting_binding_for_request(method: Method, content_type: Option<&str>, expected: Binding) {
    assert_eq!(Binding::for_request(&method, content_type), expected);
}

#[test]
fn binding_names_and_namespaces() {
    assert_eq!(Binding::Json.name(), "json");
    assert_eq!(Binding::FormMultipart.name(), "form");
    assert_eq!(Binding::Query.name(), "query");
    assert_eq!(Binding::Query.namespace(), Namespace::Form);
    assert_eq!(Binding::Header.namespace(), Namespace::Header);
}

#[test]
fn binding_json_body() {
    let request = Request::post("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(r#"{ "name": "alice", "tags": ["admin"] }"#)
        .unwrap();
    let mut user = User::default();
    Binding::Json.bind(&request, &mut user).unwrap();
    assert_eq!(user.name, "alice");
    assert_eq!(user.age, 18);
    assert_eq!(user.tags, ["admin"]);
}

#[test]
fn empty_json_body_fails_required_fields_only() {
    let request = Request::post("/users").body("").unwrap();
    let err = Binding::Json
        .bind(&request, &mut User::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.kind(), ErrorKind::Field);
    assert_eq!(err.rule_name(), "required");
    assert_eq!(err.param(), "name");
}

#[test]
fn invalid_json_body() {
    let request = Request::post("/users").body("{ \"name\": ").unwrap();
    let err = Binding::Json
        .bind(&request, &mut User::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.kind(), ErrorKind::Global);
    assert_eq!(err.to_string(), "request data is not valid json");
    assert!(err.cause().is_some());
    assert!(format!("{err:#}").starts_with("request data is not valid json\n"));
}

#[test]
fn missing_json_body() {
    let request = Request::post("/users").body(()).unwrap();
    let err = Binding::Json
        .bind(&request, &mut User::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.kind(), ErrorKind::Global);
    assert_eq!(err.message(), "invalid request");

    let request = Request::post("/users").body(None::<String>).unwrap();
    let err = Binding::Json.bind(&request, &mut User::default()).unwrap_err();
    assert_eq!(err.as_validation().unwrap().message(), "invalid request");
}

#[test]
fn form_merges_body_and_query() {
    let request = Request::post("/users?tags=query")
        .header(header::CONTENT_TYPE, URLENCODED)
        .body("name=alice&tags=body")
        .unwrap();
    let mut user = User::default();
    Binding::Form.bind(&request, &mut user).unwrap();
    assert_eq!(user.name, "alice");
    assert_eq!(user.tags, ["body", "query"]);
}

#[test]
fn form_body_is_ignored_for_get_requests() {
    let request = Request::get("/users?name=alice")
        .header(header::CONTENT_TYPE, URLENCODED)
        .body("name=bob&age=200")
        .unwrap();
    let mut user = User::default();
    Binding::Form.bind(&request, &mut user).unwrap();
    assert_eq!(user.name, "alice");
    assert_eq!(user.age, 18);
}

#[test]
fn binding_query() {
    let request = Request::post("/users?name=alice&age=30")
        .header(header::CONTENT_TYPE, URLENCODED)
        .body("name=bob")
        .unwrap();
    let mut user = User::default();
    Binding::Query.bind(&request, &mut user).unwrap();
    assert_eq!(user.name, "alice");
    assert_eq!(user.age, 30);

    let request = Request::get("/users").body(()).unwrap();
    let err = Binding::Query
        .bind(&request, &mut User::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.param(), "name");
}

#[test]
fn binding_headers() {
    let request = Request::get("/")
        .header("x-request-id", "0123456789")
        .body(())
        .unwrap();
    let mut headers = Headers::default();
    Binding::Header.bind(&request, &mut headers).unwrap();
    assert_eq!(headers.request_id, "0123456789");

    let request = Request::get("/").header("X-REQUEST-ID", "short").body(()).unwrap();
    let err = Binding::Header
        .bind(&request, &mut Headers::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.param(), "X-Request-Id");
    assert_eq!(err.rule_name(), "min");
}

#[test]
fn binding_multipart_body() {
    let request = multipart_request(multipart_body());
    let mut upload = Upload::default();
    Binding::FormMultipart.bind(&request, &mut upload).unwrap();
    assert_eq!(upload.title, "quarterly report");
    assert_eq!(upload.file.filename.as_deref(), Some("report.txt"));
    assert_eq!(upload.file.content_type.as_deref(), Some("text/plain"));
    assert_eq!(upload.file.data, b"line 1\r\nline 2");
    assert!(upload.attachments.is_empty());

    // The form binding reads multipart bodies as well
    let mut upload = Upload::default();
    Binding::Form.bind(&request, &mut upload).unwrap();
    assert_eq!(upload.title, "quarterly report");
}

#[test]
fn multipart_without_boundary() {
    let request = Request::post("/upload")
        .header(header::CONTENT_TYPE, "multipart/form-data")
        .body(multipart_body())
        .unwrap();
    let err = Binding::FormMultipart
        .bind(&request, &mut Upload::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.kind(), ErrorKind::Global);
    assert_eq!(err.message(), "request data not valid");
    assert_eq!(
        err.cause().unwrap().to_string(),
        "no multipart boundary param in Content-Type"
    );
}

#[test]
fn malformed_multipart_body() {
    let request = multipart_request("--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"title\"".to_owned());
    let err = Binding::FormMultipart
        .bind(&request, &mut Upload::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.message(), "request data not valid");
    assert_eq!(
        err.cause().unwrap().to_string(),
        "malformed multipart body: unterminated part headers"
    );
}

#[test]
fn multipart_body_exceeding_limit() {
    let binder = Binder::new(BindOptions::default().with_max_memory(64));
    let request = multipart_request(multipart_body());
    let err = binder
        .bind(Binding::FormMultipart, &request, &mut Upload::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.message(), "request data not valid");
    assert_eq!(
        err.cause().unwrap().to_string(),
        "multipart body exceeds the limit of 64 bytes"
    );
}

#[test]
fn parsing_multipart_with_quoted_boundary() {
    let content_type = "multipart/form-data; charset=utf-8; boundary=\"X-BOUNDARY\"";
    assert_eq!(multipart::boundary(content_type).unwrap(), BOUNDARY);
    assert_matches!(
        multipart::boundary("text/plain; boundary=xyz"),
        Err(multipart::MultipartError::MissingBoundary)
    );

    let form = multipart::parse(multipart_body().as_bytes(), BOUNDARY, 1 << 10).unwrap();
    assert_eq!(form.values("title").unwrap(), ["quarterly report"]);
    assert_eq!(form.files("file").unwrap().len(), 1);
    assert_eq!(form.keys().collect::<Vec<_>>(), ["title"]);
}

#[test]
fn deserializing_options() {
    let options: BindOptions = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(options.max_memory, 32 << 20);
    let options: BindOptions = serde_json::from_value(serde_json::json!({ "max_memory": 1024 })).unwrap();
    assert_eq!(options.max_memory, 1_024);
}

#[test]
fn binding_pre_read_bodies() {
    let mut user = User::default();
    BodyBinding::Form
        .bind_body(b"name=alice&tags=admin&tags=ops", &mut user)
        .unwrap();
    assert_eq!(user.tags, ["admin", "ops"]);

    let mut user = User::default();
    BodyBinding::Json
        .bind_reader(&br#"{ "name": "alice", "age": 40 }"#[..], &mut user)
        .unwrap();
    assert_eq!(user.age, 40);
}

#[test]
fn read_errors_are_global() {
    let err = BodyBinding::Json
        .bind_reader(FailingReader, &mut User::default())
        .unwrap_err()
        .into_validation();
    assert_eq!(err.kind(), ErrorKind::Global);
    assert_eq!(err.message(), "read request data failed");
    assert_eq!(err.cause().unwrap().to_string(), "connection reset");
}

#[test]
fn request_ext_selects_binding() {
    let request = Request::get("/users?name=alice").body(()).unwrap();
    let mut user = User::default();
    request.valid(&mut user).unwrap();
    assert_eq!(user.name, "alice");

    let request = Request::post("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(r#"{ "name": "al" }"#)
        .unwrap();
    let err = request.valid(&mut User::default()).unwrap_err();
    assert_eq!(err.rule_name(), "min");
    assert_eq!(err.to_string(), "the param name is not valid");
    let err = request.valid_json(&mut User::default()).unwrap_err();
    assert_eq!(err.rule_name(), "min");

    let err = request.valid_query(&mut User::default()).unwrap_err();
    assert_eq!(err.rule_name(), "required");
    let err = request.valid_header(&mut Headers::default()).unwrap_err();
    assert_eq!(err.param(), "X-Request-Id");
}

#[test]
#[should_panic(expected = "invalid binding schema")]
fn request_ext_panics_on_schema_errors() {
    #[derive(Debug, Default, Bind)]
    #[bind(crate = crate)]
    struct Invalid {
        #[bind(form = "name", binding = "dive")]
        name: String,
    }

    let request = Request::get("/?name=test").body(()).unwrap();
    request.valid(&mut Invalid::default()).ok();
}

#[test]
fn body_cache_reads_once() {
    let cache = BodyCache::new(&br#"{ "name": "alice", "x-request-id": "0123456789" }"#[..]);
    let first = cache.bytes().unwrap();
    let second = cache.bytes().unwrap();
    assert!(std::ptr::eq(first, second));

    let mut user = User::default();
    cache.bind_body_with(BodyBinding::Json, &mut user).unwrap();
    assert_eq!(user.name, "alice");
    // The cached body can be bound again
    let mut user = User::default();
    cache.bind_body_with(BodyBinding::Json, &mut user).unwrap();
    assert_eq!(user.name, "alice");
}

#[test]
fn body_cache_as_request_body() {
    let request = Request::post("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(BodyCache::new(&br#"{ "name": "alice" }"#[..]))
        .unwrap();
    let mut user = User::default();
    request.valid(&mut user).unwrap();
    assert_eq!(user.name, "alice");
    let mut user = User::default();
    request.valid_json(&mut user).unwrap();
    assert_eq!(user.name, "alice");
}

#[test]
fn body_cache_errors_are_sticky() {
    let cache = BodyCache::new(FailingReader);
    let err = cache.bytes().unwrap_err();
    assert_eq!(err.to_string(), "connection reset");
    let err = cache.bytes().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

    let err = cache
        .bind_body_with(BodyBinding::Form, &mut User::default())
        .unwrap_err();
    assert_eq!(err.message(), "read request data failed");
}
