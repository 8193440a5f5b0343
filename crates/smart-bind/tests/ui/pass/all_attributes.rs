use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use smart_bind::{Bind, DescribeParams};

#[derive(Debug, Default, Bind)]
struct Pagination {
    #[bind(form = "limit,default=20", json = "limit,default=20", binding = "min=1,max=100")]
    limit: u32,
    #[bind(form = "offset", json = "offset")]
    offset: u64,
}

#[derive(Debug, Default, Bind)]
struct Search {
    #[bind(form = "q", json = "query", binding = "required,min=2", msg = "required='query is required'")]
    query: String,
    #[bind(form = "code", binding = "omitempty,regex", pattern = r"^[A-Z]{3}$")]
    code: String,
    #[bind(json = "labels", binding = "omitempty,dive,keys,alphanum,endkeys,required")]
    labels: HashMap<String, String>,
    #[bind(json = "since", time_format = "%Y-%m-%d %H:%M:%S", time_location = "+03:00")]
    since: Option<DateTime<FixedOffset>>,
    #[bind(header = "x-trace-id", binding = "omitempty,alphanum,len=32")]
    trace_id: String,
    #[bind(json = "-", form = "debug")]
    debug: bool,
    #[bind(flatten)]
    pagination: Pagination,
}

fn main() {
    Search::metadata().check_rules().unwrap();
    assert_eq!(Search::DESCRIPTION.fields.len(), 7);
}
