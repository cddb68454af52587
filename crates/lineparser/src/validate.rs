//! Structural checks run once, before a parser is built.

use lineparser_metadata::{Metadata, OptionKind};

use crate::error::MetadataError;

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c == ' ')
}

fn check_subcommands(meta: &Metadata) -> Result<(), MetadataError> {
    for subcommand in &meta.subcommands {
        if is_blank(subcommand) {
            return Err(MetadataError::BlankSubcommand(subcommand.clone()));
        }
    }
    Ok(())
}

fn check_names(
    kind: OptionKind,
    index: usize,
    short_name: Option<&str>,
    name: Option<&str>,
) -> Result<(), MetadataError> {
    let missing = |n: Option<&str>| n.is_none_or(is_blank);
    if missing(short_name) && missing(name) {
        return Err(MetadataError::MissingOptionName { kind, index });
    }
    if let Some(short_name) = short_name {
        if short_name.chars().count() != 1 {
            return Err(MetadataError::InvalidShortName {
                kind,
                short_name: short_name.to_string(),
            });
        }
    }
    if let Some(name) = name {
        if name.chars().count() <= 1 {
            return Err(MetadataError::InvalidName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn check_options(meta: &Metadata) -> Result<(), MetadataError> {
    for (index, flag) in meta.options.flags.iter().enumerate() {
        check_names(
            OptionKind::Flag,
            index,
            flag.short_name.as_deref(),
            flag.name.as_deref(),
        )?;
    }
    for (index, param) in meta.options.parameters.iter().enumerate() {
        check_names(
            OptionKind::Parameter,
            index,
            param.short_name.as_deref(),
            param.name.as_deref(),
        )?;
    }
    Ok(())
}

fn check_usages(meta: &Metadata) -> Result<(), MetadataError> {
    if meta.usages.is_empty() {
        return Err(MetadataError::NoUsages);
    }
    for (usage, spec) in meta.usages.iter().enumerate() {
        if let Some(subcommand) = spec.subcommand.as_deref() {
            if !meta.subcommands.iter().any(|s| s == subcommand) {
                return Err(MetadataError::UndefinedSubcommand {
                    usage,
                    subcommand: subcommand.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Validate metadata structure, stopping at the first problem.
///
/// Handler bindings are checked separately by the parser builder.
pub fn validate(meta: &Metadata) -> Result<(), MetadataError> {
    check_subcommands(meta)?;
    check_options(meta)?;
    check_usages(meta)
}
