//! Help text rendering.
//!
//! Help is a pure function of the metadata: a header, one numbered block per
//! usage in declaration order, then a table of every declared option.

use std::fmt::Write as _;

use lineparser_metadata::{OptionRef, UsageSpec};

use crate::accessor::{Accessor, OptionEntry};
use crate::error::{Error, Result};

/// Names shown in the help header and usage lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub program: String,
    pub display_name: String,
    pub version: Option<String>,
}

/// `"<name> <version>\n"`, or just the name when no version is declared.
pub fn version(info: &ProgramInfo) -> String {
    match info.version.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => format!("{} {}\n", info.display_name, v),
        _ => format!("{}\n", info.display_name),
    }
}

fn dashes(name: &str) -> &'static str {
    if name.chars().count() > 1 { "--" } else { "-" }
}

fn format_usage_option(accessor: &Accessor, usage: usize, opt: &OptionRef) -> Result<String> {
    let name = opt.name.as_str();
    let rendered = match accessor.get_option(name) {
        Some(OptionEntry::Flag(_)) => format!("{}{}", dashes(name), name),
        Some(OptionEntry::Parameter(_)) => {
            let label = if name.chars().count() == 1 {
                accessor.full_name(name).unwrap_or(name)
            } else {
                name
            };
            format!("{}{} <{}>", dashes(name), name, label)
        }
        None => {
            return Err(Error::UndefinedOption {
                usage,
                option: name.to_string(),
            });
        }
    };
    if opt.optional {
        Ok(format!("[{rendered}]"))
    } else {
        Ok(rendered)
    }
}

fn format_entry_left(entry: &OptionEntry<'_>) -> String {
    let mut names: Vec<String> = Vec::new();
    if let Some(s) = entry.short_name() {
        names.push(format!("-{s}"));
    }
    if let Some(l) = entry.name() {
        names.push(format!("--{l}"));
    }
    let mut out = names.join(", ");
    if let OptionEntry::Parameter(_) = entry {
        let label = entry.name().or(entry.short_name()).unwrap_or_default();
        let _ = write!(out, " <{label}>");
    }
    out
}

fn format_entry_help(entry: &OptionEntry<'_>) -> String {
    let mut out = entry.description().unwrap_or_default().trim().to_string();
    if let Some(default) = entry.default_value() {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "[default: {default}]");
    }
    out
}

/// Render the full help text.
///
/// Fails if a usage references an option that is not declared.
pub fn render(info: &ProgramInfo, usages: &[UsageSpec], accessor: &Accessor) -> Result<String> {
    let mut out = String::new();
    let _ = write!(out, "{}", info.display_name);
    if let Some(v) = info.version.as_deref().filter(|v| !v.is_empty()) {
        let _ = write!(out, " {v}");
    }
    out.push_str("\n\n");
    let _ = write!(
        out,
        "Usage: {} [<subcommand>] [options...] [args...]\n\n",
        info.program
    );

    for (i, usage) in usages.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {}",
            i + 1,
            usage.description.as_deref().unwrap_or_default()
        );
        let _ = write!(out, "{}", info.program);
        if let Some(subcommand) = usage.subcommand.as_deref() {
            let _ = write!(out, " {subcommand}");
        }
        for opt in &usage.options {
            let _ = write!(out, " {}", format_usage_option(accessor, i, opt)?);
        }
        for arg in &usage.args {
            if arg.optional {
                let _ = write!(out, " <[{}]>", arg.label);
            } else {
                let _ = write!(out, " <{}>", arg.label);
            }
        }
        out.push_str("\n\n");
    }

    let rows: Vec<(String, String)> = accessor
        .entries()
        .map(|e| (format_entry_left(&e), format_entry_help(&e)))
        .collect();
    if !rows.is_empty() {
        out.push_str("Options:\n");
        let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        for (left, help) in rows {
            if help.is_empty() {
                let _ = writeln!(out, "  {left}");
            } else {
                let _ = writeln!(out, "  {left:width$}  {help}");
            }
        }
    }

    Ok(out)
}
