//! Declarative command-line parsing against usage patterns.
//!
//! A program is described once as [`Metadata`]: its subcommands, flags,
//! parameters and a list of usage patterns, each naming a handler. The
//! [`LineParser`] validates that description, renders help from it, and
//! dispatches an argument vector to the handler of the first usage it
//! matches.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use lineparser::{LineParser, Metadata, ParamSpec, UsageSpec};
//!
//! let mut meta = Metadata::default();
//! meta.program = Some("adb".to_string());
//! meta.subcommands = vec!["connect".to_string()];
//! meta.options.parameters = vec![
//!     ParamSpec::new(None, Some("host")),
//!     ParamSpec::new(Some("p"), Some("port")).default_value(5037),
//! ];
//! meta.usages = vec![
//!     UsageSpec::new(Some("connect"))
//!         .options(["host", "[port]"])
//!         .handler("connect"),
//! ];
//!
//! let port = Rc::new(Cell::new(0));
//! let seen = port.clone();
//! let parser = LineParser::<()>::builder(meta)
//!     .handler("connect", move |inv| {
//!         let value = inv.result.param("port").and_then(|v| v.last()).cloned();
//!         if let Some(lineparser::Scalar::Int(n)) = value {
//!             seen.set(n);
//!         }
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let ran = parser.parse(&["connect", "--host", "10.0.0.1"], None).unwrap();
//! assert_eq!(ran, Some(0));
//! assert_eq!(port.get(), 5037);
//! ```

pub mod accessor;
pub mod error;
pub mod help;
pub mod matcher;
mod parser;
pub mod validate;

pub use accessor::{Accessor, Attribute, AttributeValue, OptionEntry};
pub use error::{Error, HandlerError, MetadataError, Result};
pub use help::ProgramInfo;
pub use lineparser_metadata::{
    ArgLabel, FlagSpec, LoadError, Metadata, OptionKind, OptionRef, OptionSet, ParamSpec, Scalar,
    UsageSpec,
};
pub use matcher::{MatchConfig, MatchResult, ParamValue, match_usage};
pub use parser::{Handler, Invocation, LineParser, LineParserBuilder};
