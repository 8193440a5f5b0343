//! Rule registry and predicates.
//!
//! Rules are declared in the `binding` attribute of a field as a comma-separated chain, e.g.
//! `binding = "required,min=3,max=16"`. Each token is either a control rule (`omitempty`, `dive`, `keys`, `endkeys`)
//! interpreted by the walker, or a registered predicate checking the current field. Predicates receive a [`Field`]
//! and return whether the field passes.
//!
//! # Supported rules
//!
//! | Group | Rules |
//! |:------|:------|
//! | Presence | `required`, `required_if` |
//! | Comparison | `len`, `min`, `max`, `eq`, `ne`, `gt`, `gte`, `lt`, `lte` |
//! | Cross-field | `eqfield`, `nefield`, `gtfield`, `gtefield`, `ltfield`, `ltefield`, `fieldcontains`, `fieldexcludes` |
//! | Cross-struct | `eqcsfield`, `necsfield`, `gtcsfield`, `gtecsfield`, `ltcsfield`, `ltecsfield` |
//! | Format | `alpha`, `alphanum`, `alphaunicode`, `alphanumunicode`, `numeric`, `number`, `boolean`, `email`, `base64`, `base64url`, `md5`, `sha256`, `hostname`, `hostname_rfc1123`, `url_encoded`, `html`, `html_encoded`, `json`, `jwt`, `lowercase`, `uppercase`, `datetime`, `timezone` |
//! | Network | `url`, `uri`, `urn_rfc2141`, `file`, `ip`, `ipv4`, `ipv6`, `ip_addr`, `ip4_addr`, `ip6_addr`, `tcp_addr`, `tcp4_addr`, `tcp6_addr`, `udp_addr`, `udp4_addr`, `udp6_addr`, `unix_addr`, `mac`, `hostname_port` |
//! | Strings | `contains`, `containsany`, `containsrune`, `excludes`, `excludesall`, `excludesrune`, `startswith`, `endswith`, `startsnotwith`, `endsnotwith` |
//! | Collections | `oneof`, `unique` |
//! | Extensions | `mobile`, `idcard`, `regex` |

use std::fmt;

use crate::{
    error::SchemaErrorKind,
    field::Field,
    metadata::{FieldTags, Kind, Shape},
};

pub(crate) use self::format::is_numeric_str;

mod collection;
mod compare;
mod cross_field;
mod custom;
mod format;
mod network;
mod params;
mod presence;
mod strings;

/// Predicate implementing a registered rule.
///
/// # Errors
///
/// Returns an error if the rule cannot be evaluated because of a misconfigured schema (e.g., an unparsable rule value).
pub type Predicate = fn(&Field<'_>) -> Result<bool, SchemaErrorKind>;

/// Skips the remaining rules if the value is absent or empty.
pub const OMITEMPTY: &str = "omitempty";
/// Applies the remaining rules to every element of a sequence or every value of a map.
pub const DIVE: &str = "dive";
/// Opens a block of rules applied to map keys. Must directly follow `dive`.
pub const KEYS: &str = "keys";
/// Closes a block opened by [`KEYS`].
pub const ENDKEYS: &str = "endkeys";

/// Rules interpreted by the walker rather than implemented as predicates.
pub const CONTROL_RULES: &[&str] = &[OMITEMPTY, DIVE, KEYS, ENDKEYS];

macro_rules! rule_registry {
    ($($name:literal => $pred:path,)+) => {
        /// Names of all registered predicate rules.
        pub const RULE_NAMES: &[&str] = &[$($name,)+];

        /// Looks up a predicate by the rule name.
        pub fn lookup(name: &str) -> Option<Predicate> {
            Some(match name {
                $($name => $pred as Predicate,)+
                _ => return None,
            })
        }
    };
}

rule_registry! {
    "required" => presence::required,
    "required_if" => presence::required_if,
    "len" => compare::len,
    "min" => compare::gte,
    "max" => compare::lte,
    "eq" => compare::eq,
    "ne" => compare::ne,
    "lt" => compare::lt,
    "lte" => compare::lte,
    "gt" => compare::gt,
    "gte" => compare::gte,
    "eqfield" => cross_field::eq_field,
    "nefield" => cross_field::ne_field,
    "gtfield" => cross_field::gt_field,
    "gtefield" => cross_field::gte_field,
    "ltfield" => cross_field::lt_field,
    "ltefield" => cross_field::lte_field,
    "eqcsfield" => cross_field::eq_cs_field,
    "necsfield" => cross_field::ne_cs_field,
    "gtcsfield" => cross_field::gt_cs_field,
    "gtecsfield" => cross_field::gte_cs_field,
    "ltcsfield" => cross_field::lt_cs_field,
    "ltecsfield" => cross_field::lte_cs_field,
    "fieldcontains" => cross_field::field_contains,
    "fieldexcludes" => cross_field::field_excludes,
    "alpha" => format::alpha,
    "alphanum" => format::alphanum,
    "alphaunicode" => format::alpha_unicode,
    "alphanumunicode" => format::alphanum_unicode,
    "boolean" => format::boolean,
    "numeric" => format::numeric,
    "number" => format::number,
    "email" => format::email,
    "base64" => format::base64,
    "base64url" => format::base64_url,
    "md5" => format::md5,
    "sha256" => format::sha256,
    "hostname" => format::hostname_rfc952,
    "hostname_rfc1123" => format::hostname_rfc1123,
    "url_encoded" => format::url_encoded,
    "html" => format::html,
    "html_encoded" => format::html_encoded,
    "json" => format::json,
    "jwt" => format::jwt,
    "lowercase" => format::lowercase,
    "uppercase" => format::uppercase,
    "datetime" => format::datetime,
    "timezone" => format::timezone,
    "url" => network::url,
    "uri" => network::uri,
    "urn_rfc2141" => network::urn_rfc2141,
    "file" => network::file,
    "ip" => network::ip,
    "ipv4" => network::ipv4,
    "ipv6" => network::ipv6,
    "ip_addr" => network::ip_addr,
    "ip4_addr" => network::ip4_addr,
    "ip6_addr" => network::ip6_addr,
    "tcp_addr" => network::tcp_addr,
    "tcp4_addr" => network::tcp4_addr,
    "tcp6_addr" => network::tcp6_addr,
    "udp_addr" => network::udp_addr,
    "udp4_addr" => network::udp4_addr,
    "udp6_addr" => network::udp6_addr,
    "unix_addr" => network::unix_addr,
    "mac" => network::mac,
    "hostname_port" => network::hostname_port,
    "contains" => strings::contains,
    "containsany" => strings::contains_any,
    "containsrune" => strings::contains_rune,
    "excludes" => strings::excludes,
    "excludesall" => strings::excludes_all,
    "excludesrune" => strings::excludes_rune,
    "startswith" => strings::starts_with,
    "endswith" => strings::ends_with,
    "startsnotwith" => strings::starts_not_with,
    "endsnotwith" => strings::ends_not_with,
    "oneof" => collection::one_of,
    "unique" => collection::unique,
    "mobile" => custom::mobile,
    "idcard" => custom::id_card,
    "regex" => custom::regex,
}

/// Checks whether a predicate with the specified name is registered.
pub fn is_registered(name: &str) -> bool {
    RULE_NAMES.contains(&name)
}

/// Single rule in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rule {
    name: &'static str,
    value: &'static str,
    depth: u8,
}

impl fmt::Display for Rule {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            formatter.write_str(self.name)
        } else {
            write!(formatter, "{}={}", self.name, self.value)
        }
    }
}

impl Rule {
    /// Creates a rule. An empty `value` means that the rule has no value.
    pub const fn new(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            value,
            depth: 0,
        }
    }

    /// Pseudo-rule reported when a value cannot be coerced to the destination type, e.g. `int` or `array`.
    pub(crate) const fn coercion(type_name: &'static str) -> Self {
        Self::new(type_name, "")
    }

    /// Returns the rule name.
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Returns the rule value, or an empty string if the rule has no value.
    pub const fn value(self) -> &'static str {
        self.value
    }

    /// Returns the number of `dive`s this rule was inherited through.
    pub const fn depth(self) -> u8 {
        self.depth
    }

    /// Returns this rule as inherited through one more `dive`. Control rules are not affected.
    #[must_use]
    pub(crate) fn descend(self) -> Self {
        if is_registered(self.name) {
            Self {
                depth: self.depth.saturating_add(1),
                ..self
            }
        } else {
            self
        }
    }

    /// Returns the key under which a custom message for this rule is looked up, e.g. `>min` for a `min` rule
    /// inherited through a single `dive`.
    pub fn message_key(self) -> String {
        let mut key = ">".repeat(self.depth.into());
        key.push_str(self.name);
        key
    }

    pub(crate) fn int_param(self) -> Result<i64, SchemaErrorKind> {
        self.value.parse().map_err(|_| self.invalid_param("integer"))
    }

    pub(crate) fn invalid_param(self, expected: &'static str) -> SchemaErrorKind {
        SchemaErrorKind::InvalidParam {
            rule: self.name,
            value: self.value,
            expected,
        }
    }

    fn unsupported(self, kind: Kind) -> SchemaErrorKind {
        SchemaErrorKind::UnsupportedKind {
            rule: self.name,
            kind,
        }
    }
}

/// Splits a `keys ... endkeys` block off the start of the rules following a map `dive`.
/// Returns `(key_rules, value_rules)`; `key_rules` are empty if there is no block.
pub(crate) fn split_keys_block(rules: &[Rule]) -> Result<(&[Rule], &[Rule]), SchemaErrorKind> {
    let Some((first, rest)) = rules.split_first() else {
        return Ok((&[], rules));
    };
    if first.name != KEYS {
        return if rules.iter().any(|rule| rule.name == KEYS || rule.name == ENDKEYS) {
            Err(SchemaErrorKind::UnpairedKeys)
        } else {
            Ok((&[], rules))
        };
    }

    let end = rest
        .iter()
        .position(|rule| rule.name == ENDKEYS)
        .ok_or(SchemaErrorKind::UnpairedKeys)?;
    let (key_rules, value_rules) = (&rest[..end], &rest[end + 1..]);
    if key_rules.is_empty() {
        return Err(SchemaErrorKind::EmptyKeys);
    }
    if key_rules.iter().any(|rule| rule.name == DIVE) {
        return Err(SchemaErrorKind::DiveInsideKeys);
    }
    if key_rules.iter().any(|rule| rule.name == KEYS) {
        return Err(SchemaErrorKind::UnpairedKeys);
    }
    Ok((key_rules, value_rules))
}

fn check_string(rule: Rule, kind: Kind) -> Result<(), SchemaErrorKind> {
    if kind == Kind::String {
        Ok(())
    } else {
        Err(rule.unsupported(kind))
    }
}

/// Checks a predicate rule against the shape of the field it is applied to. Errors caught here
/// would otherwise surface only when handling a request.
pub(crate) fn check_static(
    rule: Rule,
    tags: &FieldTags,
    shape: Shape,
) -> Result<(), SchemaErrorKind> {
    if !is_registered(rule.name) {
        return Err(SchemaErrorKind::UnknownRule { name: rule.name });
    }

    let kind = shape.kind();
    match rule.name {
        "len" | "min" | "max" | "gt" | "gte" | "lt" | "lte" => match kind {
            Kind::Time if rule.name != "len" => Ok(()),
            Kind::String | Kind::Slice | Kind::Map | Kind::Int | Kind::Uint | Kind::Float => {
                rule.int_param().map(drop)
            }
            _ => Err(rule.unsupported(kind)),
        },
        "eq" | "ne" => compare::parse_eq_param(rule, kind).map(drop),
        "regex" => custom::compiled_pattern(tags.pattern).map(drop),
        "unique" => collection::check_unique(rule, shape),
        "oneof" => match kind {
            Kind::String | Kind::Int | Kind::Uint => Ok(()),
            _ => Err(rule.unsupported(kind)),
        },
        "required_if" => {
            let params = params::split_params(rule.value);
            if params.is_empty() || params.len() % 3 != 0 {
                Err(rule.invalid_param("triples of `field op value`"))
            } else {
                Ok(())
            }
        }
        "lowercase" | "uppercase" | "json" | "datetime" | "timezone" | "url" | "uri"
        | "urn_rfc2141" | "file" => check_string(rule, kind),
        _ => Ok(()),
    }
}
