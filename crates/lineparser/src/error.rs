use lineparser_metadata::OptionKind;
use thiserror::Error;

/// Error type handlers return; anything boxable works.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structural problems found while validating metadata.
///
/// Construction stops at the first problem, so at most one is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("invalid subcommand \"{0}\"")]
    BlankSubcommand(String),

    #[error("{kind} #{index} must define a short name or a name")]
    MissingOptionName { kind: OptionKind, index: usize },

    #[error("invalid {kind} short name: {short_name}")]
    InvalidShortName { kind: OptionKind, short_name: String },

    #[error("invalid {kind} name: {name}")]
    InvalidName { kind: OptionKind, name: String },

    #[error("usages can't be empty")]
    NoUsages,

    #[error("usage #{usage} references undefined subcommand \"{subcommand}\"")]
    UndefinedSubcommand { usage: usize, subcommand: String },

    #[error("usage #{usage} has no handler")]
    MissingHandler { usage: usize },

    #[error("usage #{usage} names handler \"{handler}\" but none was bound")]
    UnboundHandler { usage: usize, handler: String },
}

/// Runtime failures from `help` and `parse`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("usage #{usage} references undefined option \"{option}\"")]
    UndefinedOption { usage: usize, option: String },

    #[error("handler for usage #{usage} failed: {source}")]
    Handler {
        usage: usize,
        #[source]
        source: HandlerError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
