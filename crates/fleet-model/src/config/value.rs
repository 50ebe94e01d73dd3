use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

/// A single run-config value: a primitive or a list of primitives.
///
/// Serialized untagged so a [`crate::RunConfig`] is a plain key/value document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(untagged)]
pub enum CfgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<CfgValue>),
}

impl CfgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CfgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CfgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CfgValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CfgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CfgValue]> {
        match self {
            CfgValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Name of the runtime type, used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            CfgValue::Bool(_) => "bool".into(),
            CfgValue::Int(_) => "int".into(),
            CfgValue::Float(_) => "float".into(),
            CfgValue::Str(_) => "str".into(),
            CfgValue::List(items) => match items.first() {
                Some(first) => format!("list<{}>", first.type_name()),
                None => "list".into(),
            },
        }
    }
}

impl fmt::Display for CfgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgValue::Bool(b) => write!(f, "{b}"),
            CfgValue::Int(i) => write!(f, "{i}"),
            CfgValue::Float(x) => write!(f, "{x}"),
            CfgValue::Str(s) => f.write_str(s),
            CfgValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(";"))
            }
        }
    }
}

impl From<bool> for CfgValue {
    fn from(b: bool) -> Self {
        CfgValue::Bool(b)
    }
}

impl From<i64> for CfgValue {
    fn from(i: i64) -> Self {
        CfgValue::Int(i)
    }
}

impl From<i32> for CfgValue {
    fn from(i: i32) -> Self {
        CfgValue::Int(i64::from(i))
    }
}

impl From<f64> for CfgValue {
    fn from(x: f64) -> Self {
        CfgValue::Float(x)
    }
}

impl From<&str> for CfgValue {
    fn from(s: &str) -> Self {
        CfgValue::Str(s.to_string())
    }
}

impl From<String> for CfgValue {
    fn from(s: String) -> Self {
        CfgValue::Str(s)
    }
}

impl<T: Into<CfgValue>> From<Vec<T>> for CfgValue {
    fn from(items: Vec<T>) -> Self {
        CfgValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Declared type of a run option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum OptType {
    Str,
    Int,
    Float,
    Bool,
    List(Box<OptType>),
}

impl OptType {
    /// Shorthand for `list<inner>`.
    pub fn list_of(inner: OptType) -> Self {
        OptType::List(Box::new(inner))
    }

    /// Returns `true` if `value` is an instance of this type.
    ///
    /// Scalars match by variant; `list<T>` matches only lists whose every element is `T`
    /// (an empty list matches any `list<T>`).
    pub fn matches(&self, value: &CfgValue) -> bool {
        match (self, value) {
            (OptType::Str, CfgValue::Str(_))
            | (OptType::Int, CfgValue::Int(_))
            | (OptType::Float, CfgValue::Float(_))
            | (OptType::Bool, CfgValue::Bool(_)) => true,
            (OptType::List(inner), CfgValue::List(items)) => {
                items.iter().all(|item| inner.matches(item))
            }
            _ => false,
        }
    }

    /// Convert a raw command-line string into a value of this type.
    ///
    /// Lists are `;`-separated.
    pub fn parse_value(&self, raw: &str) -> Result<CfgValue, String> {
        let raw = raw.trim();
        match self {
            OptType::Str => Ok(CfgValue::Str(raw.to_string())),
            OptType::Int => raw
                .parse::<i64>()
                .map(CfgValue::Int)
                .map_err(|e| format!("'{raw}' is not an int: {e}")),
            OptType::Float => raw
                .parse::<f64>()
                .map(CfgValue::Float)
                .map_err(|e| format!("'{raw}' is not a float: {e}")),
            OptType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(CfgValue::Bool(true)),
                "false" | "0" | "no" => Ok(CfgValue::Bool(false)),
                _ => Err(format!("'{raw}' is not a bool")),
            },
            OptType::List(inner) => raw
                .split(';')
                .filter(|s| !s.is_empty())
                .map(|s| inner.parse_value(s))
                .collect::<Result<Vec<_>, _>>()
                .map(CfgValue::List),
        }
    }
}

impl fmt::Display for OptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptType::Str => f.write_str("str"),
            OptType::Int => f.write_str("int"),
            OptType::Float => f.write_str("float"),
            OptType::Bool => f.write_str("bool"),
            OptType::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}
