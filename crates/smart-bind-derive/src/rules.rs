//! Compile-time parsing of rule chains.

use syn::LitStr;

/// Rule token from a `binding` attribute.
pub(crate) struct ParsedRule {
    pub(crate) name: String,
    pub(crate) value: String,
}

impl ParsedRule {
    /// Parses a comma-separated chain and checks its structure. Rule names are checked separately
    /// via const evaluation in the main crate.
    pub(crate) fn parse_chain(binding: &LitStr, has_pattern: bool) -> syn::Result<Vec<Self>> {
        let raw = binding.value();
        let mut rules = vec![];
        for token in raw.split(',') {
            let (name, value) = token.split_once('=').unwrap_or((token, ""));
            if name.is_empty() {
                let message = format!("empty rule in `{raw}`");
                return Err(syn::Error::new(binding.span(), message));
            }
            rules.push(Self {
                name: name.to_owned(),
                value: value.to_owned(),
            });
        }

        Self::check_keys(&rules).map_err(|message| syn::Error::new(binding.span(), message))?;
        if !has_pattern && rules.iter().any(|rule| rule.name == "regex") {
            let message = "`regex` rule requires a `pattern` attribute";
            return Err(syn::Error::new(binding.span(), message));
        }
        Ok(rules)
    }

    fn check_keys(rules: &[Self]) -> Result<(), &'static str> {
        let mut keys_start = None;
        for (i, rule) in rules.iter().enumerate() {
            match rule.name.as_str() {
                "keys" => {
                    if keys_start.is_some() {
                        return Err("`keys` blocks cannot be nested");
                    }
                    if i == 0 || rules[i - 1].name != "dive" {
                        return Err("`keys` must directly follow `dive`");
                    }
                    keys_start = Some(i);
                }
                "endkeys" => {
                    let Some(start) = keys_start.take() else {
                        return Err("`endkeys` without a matching `keys`");
                    };
                    if start + 1 == i {
                        return Err("`keys` block is empty");
                    }
                }
                "dive" if keys_start.is_some() => {
                    return Err("`dive` is not allowed inside a `keys` block");
                }
                _ => { /* checked in const evaluation */ }
            }
        }

        if keys_start.is_some() {
            return Err("`keys` without a matching `endkeys`");
        }
        Ok(())
    }
}
