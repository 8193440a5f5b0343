//! Metadata validations performed in compile time.

use compile_fmt::{CompileArgs, clip, compile_args, compile_panic};

use crate::{rules, utils::const_eq};

type ErrorArgs = CompileArgs<96>;

const fn is_known_rule(name: &str) -> bool {
    let mut i = 0;
    while i < rules::CONTROL_RULES.len() {
        if const_eq(rules::CONTROL_RULES[i].as_bytes(), name.as_bytes()) {
            return true;
        }
        i += 1;
    }

    let mut i = 0;
    while i < rules::RULE_NAMES.len() {
        if const_eq(rules::RULE_NAMES[i].as_bytes(), name.as_bytes()) {
            return true;
        }
        i += 1;
    }
    false
}

const fn closest_hint(name: &str) -> ErrorArgs {
    if name.is_empty() {
        compile_args!(capacity: ErrorArgs::CAPACITY, "rule names cannot be empty")
    } else if name.as_bytes()[0] == b' ' || name.as_bytes()[name.len() - 1] == b' ' {
        compile_args!(
            capacity: ErrorArgs::CAPACITY,
            "rule names cannot have leading or trailing spaces"
        )
    } else {
        compile_args!(
            capacity: ErrorArgs::CAPACITY,
            "check the `binding` attribute for typos"
        )
    }
}

/// Checks that a rule used in a `binding` attribute is registered.
#[track_caller]
pub const fn assert_rule_name(name: &str) {
    if !is_known_rule(name) {
        compile_panic!(
            "Rule `", name => clip(32, "…"), "` is not registered; ",
            &closest_hint(name) => compile_fmt::fmt::<&ErrorArgs>()
        );
    }
}

/// Values accepted by the [`form!`](crate::form!) macro.
pub trait IntoFormValues {
    /// Converts this into a list of values.
    fn into_form_values(self) -> Vec<String>;
}

impl IntoFormValues for &str {
    fn into_form_values(self) -> Vec<String> {
        vec![self.to_owned()]
    }
}

impl IntoFormValues for String {
    fn into_form_values(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: Into<String>, const N: usize> IntoFormValues for [S; N] {
    fn into_form_values(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String>> IntoFormValues for Vec<S> {
    fn into_form_values(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}
