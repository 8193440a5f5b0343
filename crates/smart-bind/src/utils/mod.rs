//! Miscellaneous utils.

/// Const-compatible array / string comparison.
pub(crate) const fn const_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }

    let mut i = 0;
    while i < lhs.len() {
        if lhs[i] != rhs[i] {
            return false;
        }
        i += 1;
    }
    true
}

fn is_token_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&ch)
}

/// Converts a header name to its canonical MIME form, e.g. `x-request-id` -> `X-Request-Id`.
/// Names with chars outside the HTTP token set are returned as is.
pub(crate) fn canonical_header_key(name: &str) -> String {
    if !name.bytes().all(is_token_char) {
        return name.to_owned();
    }

    let mut upper = true;
    name.chars()
        .map(|ch| {
            let mapped = if upper {
                ch.to_ascii_uppercase()
            } else {
                ch.to_ascii_lowercase()
            };
            upper = ch == '-';
            mapped
        })
        .collect()
}

/// Parses a boolean flag in one of the forms commonly produced by HTTP clients (`1`, `t`, `TRUE`, `false` etc.).
pub(crate) fn parse_bool_flag(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
