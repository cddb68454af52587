//! Read-only queries over the declared flags and parameters.
//!
//! Lookups resolve a token either by short name (one character) or by full
//! name (anything longer). Flags are searched before parameters and the first
//! declaration wins, so the name indices are filled with `or_insert`.

use std::collections::HashMap;

use lineparser_metadata::{FlagSpec, OptionKind, OptionSet, ParamSpec, Scalar};

/// Named attributes an option can be looked up by or read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    ShortName,
    Name,
    Description,
    Default,
}

/// Value of an [`Attribute`] read off an option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue<'a> {
    Text(&'a str),
    Scalar(&'a Scalar),
}

impl<'a> AttributeValue<'a> {
    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            Self::Text(s) => Some(s),
            Self::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&'a Scalar> {
        match *self {
            Self::Scalar(v) => Some(v),
            Self::Text(_) => None,
        }
    }
}

/// A resolved option together with its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionEntry<'a> {
    Flag(&'a FlagSpec),
    Parameter(&'a ParamSpec),
}

impl<'a> OptionEntry<'a> {
    pub fn kind(&self) -> OptionKind {
        match *self {
            Self::Flag(_) => OptionKind::Flag,
            Self::Parameter(_) => OptionKind::Parameter,
        }
    }

    pub fn short_name(&self) -> Option<&'a str> {
        match *self {
            Self::Flag(f) => f.short_name.as_deref(),
            Self::Parameter(p) => p.short_name.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match *self {
            Self::Flag(f) => f.name.as_deref(),
            Self::Parameter(p) => p.name.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&'a str> {
        match *self {
            Self::Flag(f) => f.description.as_deref(),
            Self::Parameter(p) => p.description.as_deref(),
        }
    }

    /// Declared default. Flags have none.
    pub fn default_value(&self) -> Option<&'a Scalar> {
        match *self {
            Self::Flag(_) => None,
            Self::Parameter(p) => p.default.as_ref(),
        }
    }

    pub fn attribute(&self, attr: Attribute) -> Option<AttributeValue<'a>> {
        match attr {
            Attribute::ShortName => self.short_name().map(AttributeValue::Text),
            Attribute::Name => self.name().map(AttributeValue::Text),
            Attribute::Description => self.description().map(AttributeValue::Text),
            Attribute::Default => self.default_value().map(AttributeValue::Scalar),
        }
    }

    fn attribute_matches(&self, attr: Attribute, value: &str) -> bool {
        match self.attribute(attr) {
            Some(AttributeValue::Text(s)) => s == value,
            Some(AttributeValue::Scalar(v)) => v.to_string() == value,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Flag(usize),
    Parameter(usize),
}

/// Query layer over an [`OptionSet`].
///
/// Owns the option set plus the short/long name indices, built once in
/// [`Accessor::new`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Accessor {
    options: OptionSet,
    by_short: HashMap<String, Slot>,
    by_name: HashMap<String, Slot>,
}

impl Accessor {
    pub fn new(options: OptionSet) -> Self {
        let mut by_short = HashMap::new();
        let mut by_name = HashMap::new();

        let flags = options.flags.iter().enumerate().map(|(i, f)| {
            (Slot::Flag(i), f.short_name.as_deref(), f.name.as_deref())
        });
        let params = options.parameters.iter().enumerate().map(|(i, p)| {
            (Slot::Parameter(i), p.short_name.as_deref(), p.name.as_deref())
        });

        for (slot, short, name) in flags.chain(params) {
            if let Some(short) = short {
                by_short.entry(short.to_string()).or_insert(slot);
            }
            if let Some(name) = name {
                by_name.entry(name.to_string()).or_insert(slot);
            }
        }

        Self {
            options,
            by_short,
            by_name,
        }
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    fn entry(&self, slot: Slot) -> OptionEntry<'_> {
        match slot {
            Slot::Flag(i) => OptionEntry::Flag(&self.options.flags[i]),
            Slot::Parameter(i) => OptionEntry::Parameter(&self.options.parameters[i]),
        }
    }

    /// Every declared option, flags first, in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = OptionEntry<'_>> {
        self.options
            .flags
            .iter()
            .map(OptionEntry::Flag)
            .chain(self.options.parameters.iter().map(OptionEntry::Parameter))
    }

    /// Resolve a bare option name (no dashes).
    pub fn get_option(&self, name: &str) -> Option<OptionEntry<'_>> {
        let index = if name.chars().count() == 1 {
            &self.by_short
        } else {
            &self.by_name
        };
        index.get(name).map(|slot| self.entry(*slot))
    }

    /// First option whose attribute `by` equals `value`.
    pub fn find_by(&self, by: Attribute, value: &str) -> Option<OptionEntry<'_>> {
        match by {
            Attribute::ShortName => self.by_short.get(value).map(|slot| self.entry(*slot)),
            Attribute::Name => self.by_name.get(value).map(|slot| self.entry(*slot)),
            Attribute::Description | Attribute::Default => {
                self.entries().find(|e| e.attribute_matches(by, value))
            }
        }
    }

    pub fn is_flag(&self, name: &str) -> bool {
        matches!(self.get_option(name), Some(OptionEntry::Flag(_)))
    }

    pub fn is_param(&self, name: &str) -> bool {
        matches!(self.get_option(name), Some(OptionEntry::Parameter(_)))
    }

    pub fn full_name(&self, name: &str) -> Option<&str> {
        self.get_option(name).and_then(|e| e.name())
    }

    pub fn short_name(&self, name: &str) -> Option<&str> {
        self.get_option(name).and_then(|e| e.short_name())
    }

    /// The other form of the same option: full name for a short name, short
    /// name for a full name.
    pub fn alias(&self, name: &str) -> Option<&str> {
        if name.chars().count() == 1 {
            self.full_name(name)
        } else {
            self.short_name(name)
        }
    }

    /// Read `select` off the option whose `by` attribute equals `value`.
    pub fn attribute(
        &self,
        select: Attribute,
        by: Attribute,
        value: &str,
    ) -> Option<AttributeValue<'_>> {
        self.find_by(by, value).and_then(|e| e.attribute(select))
    }

    /// Declared default for an option, keyed by short or full name.
    pub fn default_value(&self, name: &str) -> Option<&Scalar> {
        let by = if name.chars().count() == 1 {
            Attribute::ShortName
        } else {
            Attribute::Name
        };
        self.attribute(Attribute::Default, by, name)
            .and_then(|v| v.as_scalar())
    }
}
