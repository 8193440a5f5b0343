//! Integration tests for `smart-bind`.

use std::collections::HashMap;

use http::{Request, header};
use proptest::prelude::*;
use serde_json::json;
use smart_bind::{Bind, Binding, ErrorKind, RequestExt, ValidationError, form, testing};

#[derive(Debug, Default, PartialEq, Bind)]
struct Profile {
    #[bind(form = "name", json = "name", binding = "required,alpha,min=3,max=16")]
    name: String,
    #[bind(form = "age,default=18", json = "age,default=18", binding = "gte=0,lte=150")]
    age: u32,
    #[bind(form = "email", json = "email", binding = "omitempty,email")]
    email: String,
    #[bind(form = "tags", json = "tags", binding = "dive,required,min=2")]
    tags: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Window {
    #[bind(json = "start")]
    start: i64,
    #[bind(json = "end", binding = "gtfield=start")]
    end: i64,
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Quotas {
    #[bind(json = "quotas", binding = "dive,keys,alpha,endkeys,gt=0")]
    quotas: HashMap<String, u64>,
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Signup {
    #[bind(
        json = "login",
        binding = "required,alphanum,min=4",
        msg = "required='login is required' min='login is too short'"
    )]
    login: String,
    #[bind(json = "invite", binding = "omitempty,len=8", msg = "invalid invite code")]
    invite: String,
}

fn summary(err: &ValidationError) -> (String, String, String) {
    (err.path().to_owned(), err.rule_name().to_owned(), err.message().to_owned())
}

#[test]
fn ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/pass/*.rs");
}

#[test]
fn readme_is_in_sync() {
    version_sync::assert_markdown_deps_updated!("README.md");
}

#[test]
fn html_root_url_is_in_sync() {
    version_sync::assert_html_root_url_updated!("src/lib.rs");
}

#[test]
fn missing_required_field() {
    let err = testing::bind_json::<Profile>(json!({ "age": 30 })).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Field);
    assert_eq!(err.param(), "name");
    assert_eq!(err.rule_name(), "required");
    assert_eq!(err.to_string(), "the param name is not valid");

    let err = testing::bind_form::<Profile>(form!("age": "30")).unwrap_err();
    assert_eq!(err.rule_name(), "required");
    // Empty values are present
    let err = testing::bind_form::<Profile>(form!("name": "")).unwrap_err();
    assert_eq!(err.rule_name(), "alpha");
}

#[test]
fn omitempty_field() {
    let profile: Profile = testing::bind_json(json!({ "name": "alice" })).unwrap();
    assert_eq!(profile.email, "");
    let profile: Profile = testing::bind_form(form!("name": "alice", "email": "")).unwrap();
    assert_eq!(profile.email, "");

    let err = testing::bind_json::<Profile>(json!({ "name": "alice", "email": "alice@" })).unwrap_err();
    assert_eq!(err.param(), "email");
    assert_eq!(err.rule_name(), "email");
}

#[test]
fn dive_stops_on_first_failing_element() {
    let doc = json!({ "name": "alice", "tags": ["", "x", "ok"] });
    let err = testing::bind_json::<Profile>(doc).unwrap_err();
    assert_eq!(err.path(), "tags[0]");
    assert_eq!(err.rule_name(), "min");
    assert_eq!(err.key(), "tags");
}

#[test]
fn cross_field_rule() {
    let window: Window = testing::bind_json(json!({ "start": 10, "end": 20 })).unwrap();
    assert_eq!(window, Window { start: 10, end: 20 });

    let err = testing::bind_json::<Window>(json!({ "start": 10, "end": 10 })).unwrap_err();
    assert_eq!(err.param(), "end");
    assert_eq!(err.rule_name(), "gtfield");
}

#[test]
fn keys_block() {
    let quotas: Quotas = testing::bind_json(json!({ "quotas": { "cpu": 4, "disk": 100 } })).unwrap();
    assert_eq!(quotas.quotas["disk"], 100);

    let err = testing::bind_json::<Quotas>(json!({ "quotas": { "gpu0": 1 } })).unwrap_err();
    assert_eq!(err.rule_name(), "alpha");
    assert_eq!(err.path(), "quotas.gpu0");
    let err = testing::bind_json::<Quotas>(json!({ "quotas": { "gpu": 0 } })).unwrap_err();
    assert_eq!(err.rule_name(), "gt");
    assert_eq!(err.path(), "quotas.gpu");
}

#[test]
fn default_value() {
    let profile: Profile = testing::bind_json(json!({ "name": "alice" })).unwrap();
    assert_eq!(profile.age, 18);
    let profile: Profile = testing::bind_form(form!("name": "alice", "age": "42")).unwrap();
    assert_eq!(profile.age, 42);
}

#[test]
fn custom_messages() {
    let err = testing::bind_json::<Signup>(json!({})).unwrap_err();
    assert_eq!(err.to_string(), "login is required");
    let err = testing::bind_json::<Signup>(json!({ "login": "bob" })).unwrap_err();
    assert_eq!(err.to_string(), "login is too short");
    let err = testing::bind_json::<Signup>(json!({ "login": "b.o.b." })).unwrap_err();
    assert_eq!(err.rule_name(), "alphanum");
    assert_eq!(err.to_string(), "the param login is not valid");
    let err = testing::bind_json::<Signup>(json!({ "login": "bobby", "invite": "123" })).unwrap_err();
    assert_eq!(err.to_string(), "invalid invite code");
}

#[test]
fn serializing_errors() {
    let err = testing::bind_json::<Profile>(json!({})).unwrap_err();
    let serialized = serde_json::to_string(&err).unwrap();
    insta::assert_snapshot!(
        serialized,
        @r#"{"code":1,"type":2,"param":"name","rule":"required","key":"name","msg":"the param name is not valid"}"#
    );

    let request = Request::post("/profiles")
        .header(header::CONTENT_TYPE, "application/json")
        .body("[1, 2")
        .unwrap();
    let err = request.valid(&mut Profile::default()).unwrap_err();
    let serialized = serde_json::to_string(&err).unwrap();
    insta::assert_snapshot!(
        serialized,
        @r#"{"code":1,"type":1,"param":"","rule":"","key":"","msg":"request data is not valid json"}"#
    );
}

#[test]
fn binding_http_requests() {
    let request = Request::get("/profiles?name=alice&tags=rust&tags=go").body(()).unwrap();
    let mut profile = Profile::default();
    request.valid(&mut profile).unwrap();
    assert_eq!(profile.tags, ["rust", "go"]);
    assert_eq!(profile.age, 18);

    let request = Request::put("/profiles/1?age=20")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("name=alice")
        .unwrap();
    let mut profile = Profile::default();
    Binding::Form.bind(&request, &mut profile).unwrap();
    assert_eq!((profile.name.as_str(), profile.age), ("alice", 20));
}

fn profile_strategy() -> impl Strategy<Value = (String, Option<u32>, Vec<String>)> {
    (
        "[a-zA-Z]{3,16}",
        proptest::option::of(0_u32..=150),
        proptest::collection::vec("[a-z0-9]{2,8}", 0..4),
    )
}

proptest! {
    #[test]
    fn valid_documents_are_bound_as_is((name, age, tags) in profile_strategy()) {
        let mut doc = json!({ "name": &name, "tags": &tags });
        if let Some(age) = age {
            doc["age"] = age.into();
        }
        let profile: Profile = testing::bind_json(doc).unwrap();
        prop_assert_eq!(&profile.name, &name);
        prop_assert_eq!(profile.age, age.unwrap_or(18));
        prop_assert_eq!(&profile.tags, &tags);

        let age = age.unwrap_or(18).to_string();
        let form = form!("name": name.clone(), "age": age, "tags": tags.clone());
        let from_form: Profile = testing::bind_form(form).unwrap();
        prop_assert_eq!(from_form, profile);
    }

    #[test]
    fn binding_is_idempotent(name in "\\PC{0,20}", age in any::<i64>(), tags in proptest::collection::vec("\\PC{0,4}", 0..4)) {
        let doc = json!({ "name": name, "age": age, "tags": tags });
        let first = testing::bind_json::<Profile>(doc.clone()).map_err(|err| summary(&err));
        let second = testing::bind_json::<Profile>(doc).map_err(|err| summary(&err));
        prop_assert_eq!(first, second);
    }
}
