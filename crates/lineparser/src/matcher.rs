//! Matching an argument vector against a single usage pattern.
//!
//! Matching runs in two passes. The tokenization pass walks `argv` once and
//! sorts tokens into flags, parameters and positionals. The verification pass
//! then checks the usage's declared options against what was found, filling in
//! declared defaults for optional parameters.
//!
//! Options must precede positionals: the first token that does not look like
//! an option ends option parsing, and every later token is positional even if
//! it starts with `-`.

use indexmap::IndexMap;
use lineparser_metadata::{Scalar, UsageSpec};
use serde::Serialize;

use crate::accessor::Accessor;

/// Value collected for a parameter.
///
/// The first occurrence stores a single value; repeating the parameter turns
/// it into a list in command-line order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(Scalar),
    Multiple(Vec<Scalar>),
}

impl ParamValue {
    pub fn values(&self) -> &[Scalar] {
        match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::Multiple(vs) => vs.as_slice(),
        }
    }

    /// The last value given (the one that wins for single-valued use).
    pub fn last(&self) -> Option<&Scalar> {
        self.values().last()
    }

    /// The value as a string, if it is a single string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(v) => v.as_str(),
            Self::Multiple(_) => None,
        }
    }

    fn push(&mut self, value: Scalar) {
        match self {
            Self::Multiple(values) => values.push(value),
            Self::Single(first) => {
                let first = first.clone();
                *self = Self::Multiple(vec![first, value]);
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Single(Scalar::from(s))
    }
}

impl From<Scalar> for ParamValue {
    fn from(v: Scalar) -> Self {
        Self::Single(v)
    }
}

/// Outcome of matching one usage.
///
/// Options are keyed by every name they were seen under: an option given as
/// `-p` is also recorded under `port`, and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    pub subcommand: Option<String>,
    pub flags: IndexMap<String, bool>,
    pub parameters: IndexMap<String, ParamValue>,
    pub args: Vec<String>,
    /// Option-shaped tokens that were dropped: unknown names, or a parameter
    /// with no following value.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<String>,
}

impl MatchResult {
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(ParamValue::as_str)
    }

    fn push_flag(&mut self, name: &str, alias: Option<&str>) {
        self.flags.insert(name.to_string(), true);
        if let Some(alias) = alias {
            self.flags.insert(alias.to_string(), true);
        }
    }

    fn push_param(&mut self, name: &str, value: &str) {
        match self.parameters.get_mut(name) {
            Some(existing) => existing.push(Scalar::from(value)),
            None => {
                self.parameters
                    .insert(name.to_string(), ParamValue::from(value));
            }
        }
    }

    fn set_default(&mut self, name: &str, alias: Option<&str>, value: &Scalar) {
        self.parameters
            .insert(name.to_string(), ParamValue::Single(value.clone()));
        if let Some(alias) = alias {
            self.parameters
                .insert(alias.to_string(), ParamValue::Single(value.clone()));
        }
    }
}

/// Opt-in strictness. The default keeps the permissive behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchConfig {
    /// Fail the match when any option-shaped token was dropped.
    pub reject_unrecognized: bool,
}

/// Option name carried by `token`, if it is option-shaped.
///
/// `--name` wins over `-name`; a bare `-` or `--` is not option-shaped under
/// the long rule, and `--` falls through to the short rule as `-`.
pub fn option_name(token: &str) -> Option<&str> {
    if token.len() > 2 && token.starts_with("--") {
        Some(&token[2..])
    } else if token.len() > 1 && token.starts_with('-') {
        Some(&token[1..])
    } else {
        None
    }
}

/// Match `argv` against `usage`.
///
/// A result with `matched == false` may still carry what tokenization found;
/// callers dispatch only on matched results.
pub fn match_usage<S: AsRef<str>>(
    accessor: &Accessor,
    usage: &UsageSpec,
    argv: &[S],
    config: &MatchConfig,
) -> MatchResult {
    let mut r = MatchResult::default();

    let mut rest = argv;
    if let Some(subcommand) = usage.subcommand.as_deref() {
        match argv.first() {
            Some(first) if first.as_ref() == subcommand => {
                r.subcommand = Some(subcommand.to_string());
                rest = &argv[1..];
            }
            _ => return r,
        }
    }

    tokenize(accessor, rest, &mut r);

    for opt in &usage.options {
        let name = opt.name.as_str();
        let is_param = accessor.is_param(name);

        if !opt.optional {
            let present = if is_param {
                r.parameters.contains_key(name)
            } else {
                r.flags.contains_key(name)
            };
            if !present {
                tracing::trace!(option = name, "required option missing");
                return r;
            }
        } else if is_param && !r.parameters.contains_key(name) {
            if let Some(default) = accessor.default_value(name) {
                r.set_default(name, accessor.alias(name), default);
            }
        }
    }

    if config.reject_unrecognized && !r.unrecognized.is_empty() {
        tracing::trace!(tokens = ?r.unrecognized, "unrecognized options rejected");
        return r;
    }

    r.matched = true;
    r
}

fn tokenize<S: AsRef<str>>(accessor: &Accessor, argv: &[S], r: &mut MatchResult) {
    let mut i = 0usize;
    while i < argv.len() {
        let token = argv[i].as_ref();

        let Some(name) = option_name(token) else {
            // Positional fence: everything from here on is an argument.
            r.args
                .extend(argv[i..].iter().map(|s| s.as_ref().to_string()));
            break;
        };

        let alias = accessor.alias(name);
        if accessor.is_param(name) {
            if let Some(value) = argv.get(i + 1) {
                let value = value.as_ref();
                r.push_param(name, value);
                if let Some(alias) = alias {
                    r.push_param(alias, value);
                }
                i += 2;
                continue;
            }
            tracing::trace!(token, "parameter without value dropped");
            r.unrecognized.push(token.to_string());
        } else if accessor.is_flag(name) {
            r.push_flag(name, alias);
        } else {
            tracing::trace!(token, "unknown option dropped");
            r.unrecognized.push(token.to_string());
        }
        i += 1;
    }
}
