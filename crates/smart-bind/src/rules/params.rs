//! Splitting of space-separated rule values.

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

static SPLIT_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'[^']*'|\S+").expect("params regex should be valid"));

static CACHE: Lazy<RwLock<HashMap<&'static str, Arc<[String]>>>> = Lazy::new(RwLock::default);

/// Splits a rule value like `red 'light blue' green` into params. Single quotes group
/// params containing spaces and are stripped from the output. Results are cached per value.
pub(crate) fn split_params(value: &'static str) -> Arc<[String]> {
    if let Some(params) = CACHE.read().get(value) {
        return params.clone();
    }

    let params: Arc<[String]> = SPLIT_PARAMS
        .find_iter(value)
        .map(|param| param.as_str().replace('\'', ""))
        .collect();
    CACHE.write().entry(value).or_insert(params).clone()
}
