use std::collections::{BTreeMap, HashMap};

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::json;
use test_casing::test_casing;

use super::*;
use crate::{
    error::ErrorKind,
    form,
    source::FormData,
    testing,
    testonly::{ALL_NAMESPACES, Item, Messages, Order, Page, Primitives, Range, Scores, Upload, User},
};

#[test]
fn binding_primitives_from_json() {
    let doc = json!({
        "flag": true,
        "small": -8,
        "int": 1_000_000_000_000_i64,
        "uint": 7,
        "float": 2.5,
        "name": "test",
        "maybe": 3,
    });
    let params: Primitives = testing::bind_json(doc).unwrap();
    assert_eq!(
        params,
        Primitives {
            flag: true,
            small: -8,
            int: 1_000_000_000_000,
            uint: 7,
            float: 2.5,
            name: "test".to_owned(),
            maybe: Some(3),
        }
    );
}

#[test]
fn binding_primitives_from_form() {
    let form = form!(
        "flag": "1",
        "small": "-8",
        "int": "42",
        "uint": "7",
        "float": "0.25",
        "name": "test",
    );
    let params: Primitives = testing::bind_form(form).unwrap();
    assert!(params.flag);
    assert_eq!(params.small, -8);
    assert_eq!(params.int, 42);
    assert_eq!(params.uint, 7);
    assert_eq!(params.float, 0.25);
    assert_eq!(params.name, "test");
    assert_eq!(params.maybe, None);
}

#[test]
fn absent_params_leave_defaults_intact() {
    let params: Primitives = testing::bind_json(json!({})).unwrap();
    assert_eq!(params, Primitives::default());
    let params: Primitives = testing::bind_json(json!(null)).unwrap();
    assert_eq!(params, Primitives::default());
    let params: Primitives = testing::bind_json(json!({ "maybe": null })).unwrap();
    assert_eq!(params.maybe, None);
}

const COERCION_CASES: [(&str, &str); 7] = [
    ("flag", "bool"),
    ("small", "int"),
    ("int", "int"),
    ("uint", "uint"),
    ("float", "float"),
    ("name", "string"),
    ("maybe", "int"),
];

fn invalid_value(param: &str) -> serde_json::Value {
    match param {
        "flag" => json!("yes"),
        "small" => json!(300),
        "int" => json!(1.5),
        "uint" => json!(-1),
        "float" => json!("1.5"),
        "name" => json!(42),
        "maybe" => json!(i64::MAX),
        _ => unreachable!("unknown param: {param}"),
    }
}

#[test_casing(7, COERCION_CASES)]
#[test]
fn coercion_errors(param: &str, type_name: &str) {
    let mut doc = serde_json::Map::new();
    doc.insert(param.to_owned(), invalid_value(param));
    let err = testing::bind_json::<Primitives>(doc.into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Field);
    assert_eq!(err.param(), param);
    assert_eq!(err.rule_name(), type_name);
    let expected_cause = format!("the param {param} data type is not {type_name}");
    assert_eq!(err.cause().unwrap().to_string(), expected_cause);
}

#[test]
fn required_field() {
    let err = testing::bind_json::<User>(json!({ "tags": [] })).unwrap_err();
    assert_eq!(err.param(), "name");
    assert_eq!(err.rule_name(), "required");
    assert_eq!(err.key(), "name");
    assert_eq!(err.message(), "the param name is not valid");

    // Empty strings are present
    let err = testing::bind_json::<User>(json!({ "name": "" })).unwrap_err();
    assert_eq!(err.rule_name(), "min");
}

#[test]
fn omitempty_skips_absent_and_empty_values() {
    let user: User = testing::bind_json(json!({ "name": "alice" })).unwrap();
    assert_eq!(user.email, "");
    let user: User = testing::bind_form(form!("name": "alice", "email": "")).unwrap();
    assert_eq!(user.email, "");

    let err = testing::bind_json::<User>(json!({ "name": "alice", "email": "nope" })).unwrap_err();
    assert_eq!(err.param(), "email");
    assert_eq!(err.rule_name(), "email");
}

#[test]
fn default_value_is_bound_and_validated() {
    let user: User = testing::bind_json(json!({ "name": "alice" })).unwrap();
    assert_eq!(user.age, 18);
    let user: User = testing::bind_form(form!("name": "alice")).unwrap();
    assert_eq!(user.age, 18);
    let user: User = testing::bind_json(json!({ "name": "alice", "age": 30 })).unwrap();
    assert_eq!(user.age, 30);

    let err = testing::bind_json::<User>(json!({ "name": "alice", "age": 200 })).unwrap_err();
    assert_eq!(err.rule_name(), "lte");
}

#[test]
fn dive_reports_first_failing_element() {
    let doc = json!({ "name": "alice", "tags": ["ab", "abc", "x"] });
    let err = testing::bind_json::<User>(doc).unwrap_err();
    assert_eq!(err.param(), "tags");
    assert_eq!(err.rule_name(), "min");
    assert_eq!(err.key(), "tags");
    assert_eq!(err.path(), "tags[0]");

    let doc = json!({ "name": "alice", "tags": ["abc", "abcd"] });
    let user: User = testing::bind_json(doc).unwrap();
    assert_eq!(user.tags, ["abc", "abcd"]);
}

#[test]
fn dive_over_form_values() {
    let form = form!("name": "alice", "tags": ["abc", "de"]);
    let err = testing::bind_form::<User>(form).unwrap_err();
    assert_eq!(err.path(), "tags[1]");

    let form = form!("name": "alice", "tags": "abc");
    let user: User = testing::bind_form(form).unwrap();
    assert_eq!(user.tags, ["abc"]);
}

#[test]
fn sequences_are_replaced_wholesale() {
    let mut user = User {
        tags: vec!["old".to_owned(), "older".to_owned()],
        ..User::default()
    };
    let doc = json!({ "name": "alice", "tags": ["new"] });
    bind_source(&doc, Namespace::Json, &mut user).unwrap();
    assert_eq!(user.tags, ["new"]);
}

#[test]
fn non_array_for_sequence() {
    let doc = json!({ "name": "alice", "tags": "abc" });
    let err = testing::bind_json::<User>(doc).unwrap_err();
    assert_eq!(err.rule_name(), "array");
    assert_eq!(err.param(), "tags");
}

#[test]
fn cross_field_comparison() {
    let range: Range = testing::bind_json(json!({ "a": 1, "b": 2 })).unwrap();
    assert_eq!((range.a, range.b), (1, 2));

    for b in [0, 1] {
        let err = testing::bind_json::<Range>(json!({ "a": 1, "b": b })).unwrap_err();
        assert_eq!(err.param(), "b");
        assert_eq!(err.rule_name(), "gtfield");
    }

    let range: Range = testing::bind_form(form!("a": "1", "b": "5")).unwrap();
    assert_eq!(range.b, 5);
}

#[test]
fn keys_block_validates_map_keys() {
    let scores: Scores = testing::bind_json(json!({ "scores": { "alice": 1, "bob": 0 } })).unwrap();
    let expected = HashMap::from([("alice".to_owned(), 1), ("bob".to_owned(), 0)]);
    assert_eq!(scores.scores, expected);

    let err = testing::bind_json::<Scores>(json!({ "scores": { "a1": 5 } })).unwrap_err();
    assert_eq!(err.rule_name(), "alpha");
    assert_eq!(err.param(), "scores");
    assert_eq!(err.key(), "scores");
    assert_eq!(err.path(), "scores.a1");

    let err = testing::bind_json::<Scores>(json!({ "scores": { "alice": null } })).unwrap_err();
    assert_eq!(err.rule_name(), "required");
    assert_eq!(err.path(), "scores.alice");
}

#[test]
fn maps_from_forms_are_absent() {
    let scores: Scores = testing::bind_form(form!("scores": "1")).unwrap();
    assert!(scores.scores.is_empty());
}

#[test]
fn non_object_for_map() {
    let err = testing::bind_json::<Scores>(json!({ "scores": [1, 2] })).unwrap_err();
    assert_eq!(err.rule_name(), "object");
    assert_eq!(
        err.cause().unwrap().to_string(),
        "the param scores data type is not object"
    );
}

#[test]
fn nested_structs_and_flattening() {
    let doc = json!({
        "items": [{ "id": 1, "label": "first" }, { "id": 2 }],
        "limit": 50,
        "meta": { "source": "web" },
        "note": { "text": "leave at the door" },
        "created_at": "2024-05-01T10:00:00+02:00",
        "extra": { "any": ["thing", 1] },
    });
    let order: Order = testing::bind_json(doc).unwrap();

    assert_eq!(
        order.items,
        [
            Item { id: 1, label: "first".to_owned() },
            Item { id: 2, label: String::new() },
        ]
    );
    assert_eq!(order.page, Page { limit: 50, offset: 0 });
    assert_eq!(order.meta, BTreeMap::from([("source".to_owned(), "web".to_owned())]));
    assert_eq!(order.note.unwrap().text, "leave at the door");
    let expected_time = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    assert_eq!(order.created_at, Some(expected_time));
    assert_eq!(order.extra, json!({ "any": ["thing", 1] }));
}

#[test]
fn absent_optional_struct_is_validated() {
    let err = testing::bind_json::<Order>(json!({ "items": [{ "id": 1 }] })).unwrap_err();
    assert_eq!(err.path(), "note.text");
    assert_eq!(err.rule_name(), "required");
    let doc = json!({ "items": [{ "id": 1 }], "note": {} });
    let err = testing::bind_json::<Order>(doc).unwrap_err();
    assert_eq!(err.path(), "note.text");

    let doc = json!({ "items": [{ "id": 1 }], "note": { "text": "ring twice" } });
    let order: Order = testing::bind_json(doc).unwrap();
    assert_eq!(order.note.unwrap().text, "ring twice");
    assert_eq!(order.page.limit, 20);
    assert!(order.created_at.is_none());
    assert_eq!(order.extra, serde_json::Value::Null);
}

#[test]
fn absent_optional_struct_is_not_attached() {
    #[derive(Debug, Default, PartialEq, Bind)]
    #[bind(crate = crate)]
    struct Settings {
        #[bind(json = "theme", binding = "omitempty,oneof=dark light")]
        theme: String,
        #[bind(json = "nested")]
        nested: Option<Box<Settings>>,
    }

    #[derive(Debug, Default, PartialEq, Bind)]
    #[bind(crate = crate)]
    struct Account {
        #[bind(json = "settings")]
        settings: Option<Settings>,
    }

    let account: Account = testing::bind_json(json!({})).unwrap();
    assert_eq!(account.settings, None);

    let account: Account = testing::bind_json(json!({ "settings": {} })).unwrap();
    assert_eq!(account.settings, Some(Settings::default()));

    let doc = json!({ "settings": { "nested": { "theme": "dark" } } });
    let account: Account = testing::bind_json(doc).unwrap();
    let nested = account.settings.unwrap().nested.unwrap();
    assert_eq!(nested.theme, "dark");
    assert!(nested.nested.is_none());
}

#[test]
fn errors_in_nested_elements() {
    let doc = json!({ "items": [{ "id": 1 }, { "id": 0 }] });
    let err = testing::bind_json::<Order>(doc).unwrap_err();
    assert_eq!(err.path(), "items[1].id");
    assert_eq!(err.param(), "id");
    assert_eq!(err.rule_name(), "gt");

    let doc = json!({ "items": [{ "id": 1, "label": "too long label" }] });
    let err = testing::bind_json::<Order>(doc).unwrap_err();
    assert_eq!(err.message(), "label is too long");

    let err = testing::bind_json::<Order>(json!({ "items": [] , "limit": 0 })).unwrap_err();
    assert_eq!(err.path(), "limit");
    assert_eq!(err.rule_name(), "min");

    let doc = json!({ "items": [{ "id": 1 }], "meta": { "Source": "web" } });
    let err = testing::bind_json::<Order>(doc).unwrap_err();
    assert_eq!(err.rule_name(), "lowercase");
}

#[test]
fn time_coercion_error() {
    let doc = json!({ "items": [{ "id": 1 }], "note": { "text": "-" }, "created_at": "yesterday" });
    let err = testing::bind_json::<Order>(doc).unwrap_err();
    assert_eq!(err.rule_name(), "time");
    assert_eq!(err.param(), "created_at");
    let cause = err.cause().unwrap();
    assert_eq!(cause.to_string(), "the params created_at data can not covert to time");
}

#[test]
fn binding_time_with_named_zone() {
    #[derive(Debug, Default, Bind)]
    #[bind(crate = crate)]
    struct Meeting {
        #[bind(json = "at", time_format = "%Y-%m-%d %H:%M", time_location = "Asia/Shanghai")]
        at: Option<DateTime<FixedOffset>>,
    }

    let meeting: Meeting = testing::bind_json(json!({ "at": "2024-05-01 10:00" })).unwrap();
    let at = meeting.at.unwrap();
    assert_eq!(at.offset().local_minus_utc(), 8 * 3_600);
    assert_eq!(at.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap());
}

#[test]
fn unknown_time_location_is_schema_error() {
    #[derive(Debug, Default, Bind)]
    #[bind(crate = crate)]
    struct Meeting {
        #[bind(json = "at", time_format = "%Y-%m-%d", time_location = "Mars/Olympus")]
        at: Option<DateTime<FixedOffset>>,
    }

    let mut params = Meeting::default();
    let err = bind_source(&json!({ "at": "2024-05-01" }), Namespace::Json, &mut params).unwrap_err();
    let err = err.as_schema().unwrap();
    assert_matches!(err.kind(), SchemaErrorKind::InvalidLocation { location: "Mars/Olympus" });
    assert!(err.to_string().contains("Mars/Olympus"), "{err}");
}

#[test]
fn custom_messages_for_inherited_rules() {
    let doc = json!({ "name": "alice", "code": "1234", "tags": ["ok", "x"] });
    let err = testing::bind_json::<Messages>(doc).unwrap_err();
    assert_eq!(err.path(), "tags[1]");
    assert_eq!(err.message(), "each tag must have at least 2 chars");

    let err = testing::bind_json::<Messages>(json!({ "code": "1234" })).unwrap_err();
    assert_eq!(err.message(), "name is required");
    let err = testing::bind_form::<Messages>(form!("name": "alice", "code": "12")).unwrap_err();
    assert_eq!(err.message(), "invalid code");
}

#[test]
fn untyped_values_from_forms() {
    #[derive(Debug, Default, Bind)]
    #[bind(crate = crate)]
    struct Untyped {
        #[bind(form = "single")]
        single: serde_json::Value,
        #[bind(form = "multi")]
        multi: serde_json::Value,
    }

    let params: Untyped = testing::bind_form(form!("single": "a", "multi": ["b", "c"])).unwrap();
    assert_eq!(params.single, json!("a"));
    assert_eq!(params.multi, json!(["b", "c"]));
}

#[test]
fn binding_files() {
    let mut form = form!("title": "report");
    for name in ["a.txt", "b.txt"] {
        form.append_file(FilePart {
            field_name: "attachments".to_owned(),
            filename: Some(name.to_owned()),
            content_type: None,
            data: name.as_bytes().to_vec(),
        });
    }
    let err = testing::bind_form::<Upload>(form.clone()).unwrap_err();
    assert_eq!(err.param(), "file");
    assert_eq!(err.rule_name(), "required");

    form.append_file(FilePart {
        field_name: "file".to_owned(),
        filename: Some("main.pdf".to_owned()),
        content_type: Some("application/pdf".to_owned()),
        data: b"%PDF".to_vec(),
    });
    let upload: Upload = testing::bind_form(form).unwrap();
    assert_eq!(upload.title, "report");
    assert_eq!(upload.file.filename.as_deref(), Some("main.pdf"));
    let names: Vec<_> = upload
        .attachments
        .iter()
        .map(|file| file.filename.as_deref().unwrap())
        .collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
}

#[test]
fn file_from_plain_value_is_coercion_error() {
    let form = form!("title": "report", "file": "not a file");
    let err = testing::bind_form::<Upload>(form).unwrap_err();
    assert_eq!(err.rule_name(), "file");
}

#[test]
fn dash_name_skips_own_rules() {
    #[derive(Debug, Default, Bind)]
    #[bind(crate = crate)]
    struct Skipping {
        #[bind(json = "-", binding = "required")]
        id: u64,
    }

    let params: Skipping = testing::bind_json(json!({ "id": 5 })).unwrap();
    assert_eq!(params.id, 5);
    let params: Skipping = testing::bind_json(json!({})).unwrap();
    assert_eq!(params.id, 0);
}

#[test]
fn schema_errors_are_reported() {
    #[derive(Debug, Default, Bind)]
    #[bind(crate = crate)]
    struct Invalid {
        #[bind(json = "name", binding = "dive")]
        name: String,
    }

    let mut params = Invalid::default();
    let err = bind_source(&json!({ "name": "x" }), Namespace::Json, &mut params).unwrap_err();
    let err = err.as_schema().unwrap();
    assert_matches!(err.kind(), SchemaErrorKind::DiveOnNonCollection { kind: Kind::String });
    assert_eq!(err.field(), Some("name"));
}

#[test]
#[should_panic(expected = "invalid binding schema")]
fn testing_helpers_panic_on_schema_errors() {
    #[derive(Debug, Default, Bind)]
    #[bind(crate = crate)]
    struct Invalid {
        #[bind(json = "count", binding = "min=few")]
        count: u32,
    }

    testing::bind_json::<Invalid>(json!({ "count": 1 })).ok();
}

#[test]
fn binding_is_idempotent() {
    let doc = json!({ "name": "alice", "tags": ["abc", "x"] });
    let first = testing::bind_json::<User>(doc.clone()).unwrap_err();
    let second = testing::bind_json::<User>(doc).unwrap_err();
    assert_eq!(first.path(), second.path());
    assert_eq!(first.message(), second.message());

    for namespace in ALL_NAMESPACES {
        let form = form!("name": "alice", "Name": "alice");
        let mut first = User::default();
        let mut second = User::default();
        bind_source(&form, namespace, &mut first).unwrap();
        bind_source(&form, namespace, &mut second).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn outcome_merging() {
    let mut outcome = Outcome::Absent;
    outcome |= Outcome::Absent;
    assert_eq!(outcome, Outcome::Absent);
    outcome |= Outcome::Bound;
    outcome |= Outcome::Absent;
    assert_eq!(outcome, Outcome::Bound);
}

#[test]
fn headers_are_bound_by_canonical_names() {
    let mut headers = http::HeaderMap::new();
    headers.insert("x-request-id", http::HeaderValue::from_static("0123456789"));
    let params: crate::testonly::Headers = testing::bind_header(&headers).unwrap();
    assert_eq!(params.request_id, "0123456789");

    let form = FormData::default();
    let mut params = crate::testonly::Headers::default();
    let err = bind_source(&form, Namespace::Header, &mut params).unwrap_err();
    assert_eq!(err.as_validation().unwrap().param(), "X-Request-Id");
}
