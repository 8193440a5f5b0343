//! Custom error messages.
//!
//! The `msg` attribute either contains a single message used for all rules of the field, or a list of per-rule
//! messages like `required='name is required' >min='each tag is too short' default='bad name'`. In the latter case,
//! keys are rule names prefixed with a `>` per `dive` the rule is inherited through, and `default` is the fallback.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rules::{self, Rule};

static MESSAGE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?U)([\w_.\->]+)='(.*)'").expect("message entry regex should be valid")
});

fn is_structured(msg: &str) -> bool {
    msg.contains("default=")
        || rules::RULE_NAMES
            .iter()
            .any(|name| msg.contains(&format!("{name}=")))
}

/// Resolves a custom message for the rule. Returns `None` if the message doesn't cover the rule.
pub(crate) fn resolve_message(msg: &str, rule: Rule) -> Option<String> {
    if msg.is_empty() {
        return None;
    }
    if !is_structured(msg) {
        return Some(msg.to_owned());
    }

    // Later entries override earlier ones
    let entries: HashMap<_, _> = MESSAGE_ENTRY
        .captures_iter(msg)
        .filter_map(|captures| {
            let key = captures.get(1)?.as_str();
            let message = captures.get(2)?.as_str();
            Some((key, message))
        })
        .collect();
    entries
        .get(rule.message_key().as_str())
        .or_else(|| entries.get("default"))
        .map(|&message| message.to_owned())
}
