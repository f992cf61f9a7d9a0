//! Embedded script payload check
//!
//! Tracking pages publish a JSON object from an inline script, e.g.
//! `var ScriptData = {"SiteURL": "...", ...};`. This check finds that
//! assignment, parses the object and requires a set of keys to be present
//! with non-empty values.

use crate::checks::{Check, CheckResult, CheckStatus, DetailRows, PayloadField};
use crate::config::PayloadConfig;
use crate::page::PageHandle;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub struct PayloadPresenceCheck {
    config: PayloadConfig,
}

impl PayloadPresenceCheck {
    pub fn new(config: PayloadConfig) -> Self {
        Self { config }
    }

    /// Every required key marked missing
    fn all_missing(&self) -> DetailRows {
        DetailRows::Payload(
            self.config
                .required_keys
                .iter()
                .map(|key| PayloadField {
                    key: key.clone(),
                    value: None,
                    status: CheckStatus::Fail,
                })
                .collect(),
        )
    }
}

#[async_trait]
impl Check for PayloadPresenceCheck {
    fn name(&self) -> &str {
        "Script Data"
    }

    async fn run(&self, page: &dyn PageHandle) -> crate::Result<CheckResult> {
        let variable = &self.config.variable;

        let mut literal = None;
        for script in page.find_all("script").await? {
            let Some(source) = script.attribute("innerHTML").await? else {
                continue;
            };
            if let Some(found) = find_assigned_object(&source, variable) {
                literal = Some(found.to_string());
                break;
            }
        }

        let Some(literal) = literal else {
            return Ok(CheckResult::fail(
                self.name(),
                format!("No script assigns an object to {}", variable),
                self.all_missing(),
            ));
        };

        let payload = match serde_json::from_str::<Value>(&literal) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Ok(CheckResult::fail(
                    self.name(),
                    format!("{} is not a JSON object", variable),
                    self.all_missing(),
                ))
            }
            Err(e) => {
                return Ok(CheckResult::fail(
                    self.name(),
                    format!("{} could not be parsed: {}", variable, e),
                    self.all_missing(),
                ))
            }
        };

        let fields = required_fields(&payload, &self.config.required_keys);
        let missing: Vec<&str> = fields
            .iter()
            .filter(|f| !f.status.is_pass())
            .map(|f| f.key.as_str())
            .collect();

        let result = if missing.is_empty() {
            CheckResult::pass(
                self.name(),
                "All script data extracted successfully",
                DetailRows::Payload(fields),
            )
        } else {
            let comment = format!("Missing script data keys: {}", missing.join(", "));
            CheckResult::fail(self.name(), comment, DetailRows::Payload(fields))
        };

        Ok(result)
    }
}

/// One row per required key; empty strings and nulls count as missing
fn required_fields(payload: &Map<String, Value>, keys: &[String]) -> Vec<PayloadField> {
    keys.iter()
        .map(|key| {
            let value = match payload.get(key) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if s.trim().is_empty() => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            };
            PayloadField {
                key: key.clone(),
                status: CheckStatus::from_bool(value.is_some()),
                value,
            }
        })
        .collect()
}

/// Finds `variable = { ... }` in script source and returns the object text
///
/// Matches the name on identifier boundaries, so `window.ScriptData = {}`
/// matches and `MyScriptData = {}` does not. Braces inside string literals
/// are skipped.
fn find_assigned_object<'a>(source: &'a str, variable: &str) -> Option<&'a str> {
    if variable.is_empty() {
        return None;
    }
    let mut search_from = 0;

    while let Some(offset) = source[search_from..].find(variable) {
        let start = search_from + offset;
        let end = start + variable.len();
        search_from = end;

        let preceded_by_ident = source[..start].chars().next_back().is_some_and(is_ident_char);
        if preceded_by_ident {
            continue;
        }

        let rest = source[end..].trim_start();
        let Some(after_eq) = rest.strip_prefix('=') else {
            continue;
        };
        if after_eq.starts_with('=') {
            continue;
        }

        let value = after_eq.trim_start();
        if !value.starts_with('{') {
            continue;
        }
        let value_start = source.len() - value.len();
        if let Some(len) = balanced_object_len(value) {
            return Some(&source[value_start..value_start + len]);
        }
    }

    None
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Byte length of the `{...}` object at the start of `text`
fn balanced_object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
