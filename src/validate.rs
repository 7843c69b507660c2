//! Closed-schema validation of table configurations
//!
//! Every violated rule is reported, each with the JSON-pointer path of the
//! offending value, so a user can fix a configuration in one pass.

use std::fmt;

use itertools::Itertools;
use serde_json::Value;

use crate::config::ColumnType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} {}", self.path, self.message)
        }
    }
}

/// Every issue of one configuration, displayed joined by ` // `.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.iter().format(" // "))]
pub struct ValidationErrors(pub Vec<ValidationIssue>);

#[derive(Clone, Copy)]
enum Rule {
    String,
    Boolean,
    Integer,
    IntegerList,
    StringMap,
    ColumnType,
    Pagination,
    Columns,
}

const ROOT: &[(&str, Rule)] = &[
    ("columns", Rule::Columns),
    ("editable", Rule::Boolean),
    ("date-format", Rule::String),
    ("datetime-format", Rule::String),
    ("yes-format", Rule::String),
    ("no-format", Rule::String),
    ("filter", Rule::String),
    ("filters", Rule::StringMap),
    ("sort", Rule::String),
    ("pagination", Rule::Pagination),
    ("hide-controls", Rule::Boolean),
    ("hide-configuration", Rule::Boolean),
    ("style", Rule::String),
    ("fix-header", Rule::Boolean),
];

const COLUMN: &[(&str, Rule)] = &[
    ("alias", Rule::String),
    ("type", Rule::ColumnType),
    ("editable", Rule::Boolean),
    ("date-format", Rule::String),
    ("number-format", Rule::String),
    ("formatter", Rule::String),
    ("enum", Rule::StringMap),
    ("yes-format", Rule::String),
    ("no-format", Rule::String),
    ("hidden", Rule::Boolean),
    ("nowrap", Rule::Boolean),
];

const PAGINATION: &[(&str, Rule)] = &[
    ("page-size", Rule::Integer),
    ("page-sizes", Rule::IntegerList),
];

/// Check a configuration against the closed schema.
pub fn validate(value: &Value) -> Result<(), ValidationErrors> {
    let mut issues = Vec::new();
    check_object("", value, ROOT, &mut issues);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(issues))
    }
}

fn pointer(parent: &str, key: &str) -> String {
    format!("{parent}/{}", key.replace('~', "~0").replace('/', "~1"))
}

fn issue(issues: &mut Vec<ValidationIssue>, path: &str, message: impl Into<String>) {
    issues.push(ValidationIssue {
        path: path.to_owned(),
        message: message.into(),
    });
}

fn check_object(
    path: &str,
    value: &Value,
    rules: &[(&str, Rule)],
    issues: &mut Vec<ValidationIssue>,
) {
    let Value::Object(map) = value else {
        issue(issues, path, "must be object");
        return;
    };
    for (key, value) in map {
        match rules.iter().find(|(name, _)| *name == key.as_str()) {
            Some((_, rule)) => check(&pointer(path, key), *rule, value, issues),
            None => issue(
                issues,
                path,
                format!("must NOT have additional property '{key}'"),
            ),
        }
    }
}

fn check(path: &str, rule: Rule, value: &Value, issues: &mut Vec<ValidationIssue>) {
    match rule {
        Rule::String => {
            if !value.is_string() {
                issue(issues, path, "must be string");
            }
        }
        Rule::Boolean => {
            if !value.is_boolean() {
                issue(issues, path, "must be boolean");
            }
        }
        Rule::Integer => {
            if !value.is_u64() {
                issue(issues, path, "must be a non-negative integer");
            }
        }
        Rule::IntegerList => match value {
            Value::Array(items) => items.iter().enumerate().for_each(|(i, item)| {
                check(&pointer(path, &i.to_string()), Rule::Integer, item, issues)
            }),
            _ => issue(issues, path, "must be array"),
        },
        Rule::StringMap => match value {
            Value::Object(map) => map.iter().for_each(|(key, item)| {
                check(&pointer(path, key), Rule::String, item, issues)
            }),
            _ => issue(issues, path, "must be object"),
        },
        Rule::ColumnType => {
            let known = value
                .as_str()
                .is_some_and(|name| ColumnType::ALL.iter().any(|t| t.as_str() == name));
            if !known {
                issue(issues, path, "must be equal to one of the allowed values");
            }
        }
        Rule::Pagination => check_object(path, value, PAGINATION, issues),
        Rule::Columns => match value {
            Value::Object(map) => map.iter().for_each(|(name, column)| {
                check_object(&pointer(path, name), column, COLUMN, issues)
            }),
            _ => issue(issues, path, "must be object"),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_valid_configuration() {
        let value = json!({
            "columns": {
                "a": { "type": "number", "alias": "x", "hidden": true },
                "b": { "type": "enum", "enum": { "k": "v" } }
            },
            "pagination": { "page-size": 10, "page-sizes": [10, 20] },
            "filters": { "f": "$row.x > 1" },
            "fix-header": false
        });
        assert_eq!(validate(&value), Ok(()));
    }

    #[test]
    fn test_all_issues_are_collected() {
        let value = json!({
            "editable": "yes",
            "unknown": 1,
            "columns": {
                "a/b": { "type": "money", "colour": "red" },
                "c": { "enum": { "k": 1 } }
            },
            "pagination": { "page-size": 2.5, "page-sizes": "many" }
        });
        let errors = validate(&value).unwrap_err();
        let messages = errors.0.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                "/editable must be boolean",
                "must NOT have additional property 'unknown'",
                "/columns/a~1b/type must be equal to one of the allowed values",
                "/columns/a~1b must NOT have additional property 'colour'",
                "/columns/c/enum/k must be string",
                "/pagination/page-size must be a non-negative integer",
                "/pagination/page-sizes must be array",
            ]
        );
        assert_eq!(errors.to_string(), messages.join(" // "));
        let error: &dyn std::error::Error = &errors;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_root_must_be_object() {
        let errors = validate(&json!([1, 2])).unwrap_err();
        assert_eq!(errors.to_string(), "must be object");
    }
}
