//! Shared metadata model for lineparser programs.
//!
//! A [`Metadata`] value describes everything the parser needs to know about a
//! program: its subcommands, the flags and parameters it accepts, and the
//! usage patterns that map an argument vector onto a handler.
//!
//! The types here are plain records. They deserialize from JSON so the same
//! description can be kept in a file (see [`Metadata::from_file`]) or built in
//! code with the small constructors on each type.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors raised while loading metadata from JSON.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metadata JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Treat an explicit `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A JSON scalar: the shape of parameter values and declared defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Which side of the option table an entry lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Flag,
    Parameter,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("flag"),
            Self::Parameter => f.write_str("parameter"),
        }
    }
}

/// A boolean option (`-h`, `--help`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FlagSpec {
    pub fn new(short_name: Option<&str>, name: Option<&str>) -> Self {
        Self {
            short_name: short_name.map(str::to_string),
            name: name.map(str::to_string),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An option that consumes the next token as its value (`--port 5037`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Scalar>,
}

impl ParamSpec {
    pub fn new(short_name: Option<&str>, name: Option<&str>) -> Self {
        Self {
            short_name: short_name.map(str::to_string),
            name: name.map(str::to_string),
            description: None,
            default: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<Scalar>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Declared flags and parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionSet {
    #[serde(default, deserialize_with = "nullable")]
    pub flags: Vec<FlagSpec>,
    #[serde(default, deserialize_with = "nullable")]
    pub parameters: Vec<ParamSpec>,
}

/// Strip the `[...]` optional marker, if the whole string is wrapped in it.
fn unwrap_optional(raw: &str) -> (&str, bool) {
    match raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => (inner, true),
        None => (raw, false),
    }
}

/// A reference from a usage to a declared option.
///
/// Written as `"name"` (required) or `"[name]"` (optional). A leading `--` or
/// `-` on the name is accepted and dropped, so `"--host"` and `"host"` are the
/// same reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct OptionRef {
    pub name: String,
    pub optional: bool,
}

impl OptionRef {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let (inner, optional) = unwrap_optional(raw);
        let name = if optional {
            inner
        } else if inner.len() > 2 && inner.starts_with("--") {
            &inner[2..]
        } else if inner.len() > 1 && inner.starts_with('-') {
            &inner[1..]
        } else {
            inner
        };
        Self {
            name: name.to_string(),
            optional,
        }
    }
}

impl From<&str> for OptionRef {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for OptionRef {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<OptionRef> for String {
    fn from(r: OptionRef) -> Self {
        r.to_string()
    }
}

impl fmt::Display for OptionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "[{}]", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// A positional argument label (`"src"`, `"[cmd]"`).
///
/// The optional marker only affects help output; matching never checks how
/// many positionals were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ArgLabel {
    pub label: String,
    pub optional: bool,
}

impl ArgLabel {
    pub fn parse(raw: &str) -> Self {
        let (label, optional) = unwrap_optional(raw);
        Self {
            label: label.to_string(),
            optional,
        }
    }
}

impl From<&str> for ArgLabel {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for ArgLabel {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ArgLabel> for String {
    fn from(a: ArgLabel) -> Self {
        a.to_string()
    }
}

impl fmt::Display for ArgLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "[{}]", self.label)
        } else {
            f.write_str(&self.label)
        }
    }
}

/// One accepted shape of the command line, paired with a handler name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommand: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionRef>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

impl UsageSpec {
    pub fn new(subcommand: Option<&str>) -> Self {
        Self {
            subcommand: subcommand.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn options<I, T>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OptionRef>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ArgLabel>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }
}

/// Root of a program description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Program name shown in usage lines. Defaults to the invocation name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Display name shown in the help header. Defaults to `program`.
    #[serde(
        default,
        rename = "name",
        alias = "display_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub subcommands: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub options: OptionSet,
    #[serde(default, deserialize_with = "nullable")]
    pub usages: Vec<UsageSpec>,
}

impl Metadata {
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_ref_parses_optional_marker() {
        assert_eq!(OptionRef::parse("[port]"), OptionRef::optional("port"));
        assert_eq!(OptionRef::parse("host"), OptionRef::required("host"));
        assert_eq!(OptionRef::parse("--host"), OptionRef::required("host"));
        assert_eq!(OptionRef::parse("-l"), OptionRef::required("l"));
        assert_eq!(OptionRef::parse("-"), OptionRef::required("-"));
        assert_eq!(OptionRef::optional("port").to_string(), "[port]");
    }

    #[test]
    fn arg_label_marks_optional() {
        let a = ArgLabel::parse("[cmd]");
        assert_eq!(a.label, "cmd");
        assert!(a.optional);
        assert!(!ArgLabel::parse("src").optional);
    }

    #[test]
    fn missing_and_null_sections_default_to_empty() {
        let meta = Metadata::from_json_str(
            r#"{ "program": "adb", "subcommands": null, "options": { "flags": null }, "usages": null }"#,
        )
        .unwrap();
        assert_eq!(meta.program.as_deref(), Some("adb"));
        assert!(meta.display_name.is_none());
        assert!(meta.subcommands.is_empty());
        assert!(meta.options.flags.is_empty());
        assert!(meta.options.parameters.is_empty());
        assert!(meta.usages.is_empty());
    }

    #[test]
    fn usage_fields_deserialize_from_strings() {
        let meta = Metadata::from_json_str(
            r#"{
                "name": "Android Debug Bridge",
                "options": { "parameters": [ { "short_name": "p", "name": "port", "default": 5037 } ] },
                "usages": [ { "subcommand": "connect", "options": ["host", "[port]"], "args": ["[cmd]"], "handler": "connect" } ]
            }"#,
        )
        .unwrap();
        assert_eq!(meta.display_name.as_deref(), Some("Android Debug Bridge"));
        assert_eq!(meta.options.parameters[0].default, Some(Scalar::Int(5037)));
        let usage = &meta.usages[0];
        assert_eq!(
            usage.options,
            vec![OptionRef::required("host"), OptionRef::optional("port")]
        );
        assert!(usage.args[0].optional);
        assert_eq!(usage.handler.as_deref(), Some("connect"));
    }

    #[test]
    fn serializes_option_refs_back_to_strings() {
        let usage = UsageSpec::new(Some("connect")).options(["host", "[port]"]);
        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["options"], serde_json::json!(["host", "[port]"]));
    }
}
