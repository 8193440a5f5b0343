//! Test-only functionality shared among multiple test modules.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::{
    Bind, DescribeParams,
    error::SchemaErrorKind,
    field::Field,
    metadata::{FieldTags, Namespace, Shape},
    rules::{self, Rule},
    source::{FilePart, Path, Source},
    walk::{Inheritance, Step, Walker},
};

pub(crate) const ALL_NAMESPACES: [Namespace; 3] = [Namespace::Form, Namespace::Json, Namespace::Header];

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Primitives {
    #[bind(form = "flag", json = "flag")]
    pub flag: bool,
    #[bind(form = "small", json = "small")]
    pub small: i8,
    #[bind(form = "int", json = "int")]
    pub int: i64,
    #[bind(form = "uint", json = "uint")]
    pub uint: u32,
    #[bind(form = "float", json = "float")]
    pub float: f64,
    #[bind(form = "name", json = "name")]
    pub name: String,
    #[bind(form = "maybe", json = "maybe")]
    pub maybe: Option<i32>,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct User {
    #[bind(form = "name", json = "name", binding = "required,min=3,max=16")]
    pub name: String,
    #[bind(form = "age,default=18", json = "age,default=18", binding = "gte=0,lte=150")]
    pub age: u32,
    #[bind(form = "email", json = "email", binding = "omitempty,email")]
    pub email: String,
    #[bind(form = "tags", json = "tags", binding = "dive,required,min=3")]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Range {
    #[bind(form = "a", json = "a")]
    pub a: i64,
    #[bind(form = "b", json = "b", binding = "gtfield=a")]
    pub b: i64,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Scores {
    #[bind(json = "scores", binding = "dive,keys,alpha,endkeys,required")]
    pub scores: HashMap<String, i64>,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Item {
    #[bind(json = "id", binding = "required,gt=0")]
    pub id: u64,
    #[bind(json = "label", binding = "omitempty,max=8", msg = "max='label is too long'")]
    pub label: String,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Page {
    #[bind(json = "limit,default=20", binding = "min=1,max=100")]
    pub limit: u32,
    #[bind(json = "offset")]
    pub offset: u64,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Order {
    #[bind(json = "items", binding = "required,dive")]
    pub items: Vec<Item>,
    #[bind(flatten)]
    pub page: Page,
    #[bind(json = "meta", binding = "omitempty,dive,keys,lowercase,endkeys,max=16")]
    pub meta: BTreeMap<String, String>,
    #[bind(json = "note")]
    pub note: Option<Box<Note>>,
    #[bind(json = "created_at", time_utc)]
    pub created_at: Option<DateTime<Utc>>,
    #[bind(json = "extra")]
    pub extra: serde_json::Value,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Note {
    #[bind(json = "text", binding = "required,max=32")]
    pub text: String,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Messages {
    #[bind(form = "name", json = "name", binding = "required,alpha", msg = "required='name is required' alpha='name must be alphabetic'")]
    pub name: String,
    #[bind(form = "code", json = "code", binding = "required,len=4", msg = "invalid code")]
    pub code: String,
    #[bind(json = "tags", binding = "dive,min=2", msg = ">min='each tag must have at least 2 chars' default='bad tags'")]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Headers {
    #[bind(header = "x-request-id", binding = "required,min=8")]
    pub request_id: String,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[bind(crate = crate)]
pub(crate) struct Upload {
    #[bind(form = "title", binding = "required")]
    pub title: String,
    #[bind(form = "file", binding = "required")]
    pub file: FilePart,
    #[bind(form = "attachments")]
    pub attachments: Vec<FilePart>,
}

/// Evaluates a single predicate against the `value` entry of the source.
pub(crate) fn check_rule(
    source: &dyn Source,
    namespace: Namespace,
    shape: Shape,
    rule: Rule,
    tags: &'static FieldTags,
) -> Result<bool, SchemaErrorKind> {
    let root = Primitives::metadata();
    let walker = Walker::new(source, namespace, root);
    let step = Step {
        path: Path::root().join("value"),
        param: "value".into(),
        key: "value",
        tags,
        parent: None,
        shape,
        default: None,
        skip_own_rules: false,
        inheritance: Inheritance::none(),
    };
    let field = Field::new(&walker, &step, rule);
    let predicate = rules::lookup(rule.name()).expect("rule is not registered");
    predicate(&field)
}
