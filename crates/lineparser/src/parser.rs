use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

use lineparser_metadata::{Metadata, UsageSpec};

use crate::accessor::Accessor;
use crate::error::{Error, HandlerError, MetadataError, Result};
use crate::help::{self, ProgramInfo};
use crate::matcher::{MatchConfig, MatchResult, match_usage};
use crate::validate::validate;

/// Callback bound to one or more usages by handler name.
pub type Handler<C> = Box<dyn Fn(&Invocation<'_, C>) -> std::result::Result<(), HandlerError>>;

/// Everything a handler gets when its usage matched.
pub struct Invocation<'a, C> {
    pub result: &'a MatchResult,
    /// Index of the matched usage in declaration order.
    pub usage: usize,
    /// Handler name the usage declared.
    pub handler: &'a str,
    context: Option<&'a C>,
    parser: &'a LineParser<C>,
}

impl<'a, C> Invocation<'a, C> {
    /// Caller-supplied context passed to [`LineParser::parse`].
    pub fn context(&self) -> Option<&'a C> {
        self.context
    }

    /// Help text of the parser that dispatched this invocation.
    pub fn help(&self) -> Result<String> {
        self.parser.help()
    }

    pub fn version(&self) -> String {
        self.parser.version_text()
    }
}

/// Name the process was invoked as, used when metadata declares no program.
fn invocation_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "program".to_string())
}

/// Process arguments as strings; non-UTF-8 bytes become U+FFFD.
fn lossy_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<String> {
    args.into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

/// Builds a [`LineParser`] from metadata plus handler bindings.
pub struct LineParserBuilder<C> {
    meta: Metadata,
    handlers: HashMap<String, Handler<C>>,
    config: MatchConfig,
}

impl<C> LineParserBuilder<C> {
    /// Bind `f` to every usage whose `handler` is `name`.
    pub fn handler<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Invocation<'_, C>) -> std::result::Result<(), HandlerError> + 'static,
    {
        self.handlers.insert(name.into(), Box::new(f));
        self
    }

    pub fn config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the metadata and handler bindings.
    pub fn build(self) -> std::result::Result<LineParser<C>, MetadataError> {
        validate(&self.meta)?;

        let Metadata {
            program,
            display_name,
            version,
            subcommands,
            options,
            usages,
        } = self.meta;

        let mut handlers = self.handlers;
        let mut bound: Vec<String> = Vec::with_capacity(usages.len());
        for (usage, spec) in usages.iter().enumerate() {
            let Some(name) = spec.handler.as_deref() else {
                return Err(MetadataError::MissingHandler { usage });
            };
            if !handlers.contains_key(name) {
                return Err(MetadataError::UnboundHandler {
                    usage,
                    handler: name.to_string(),
                });
            }
            bound.push(name.to_string());
        }
        handlers.retain(|name, _| bound.iter().any(|b| b == name));

        let program = program.unwrap_or_else(invocation_name);
        let display_name = display_name.unwrap_or_else(|| program.clone());
        tracing::debug!(
            program = %program,
            usages = usages.len(),
            handlers = handlers.len(),
            "line parser ready"
        );

        Ok(LineParser {
            info: ProgramInfo {
                program,
                display_name,
                version,
            },
            subcommands,
            accessor: Accessor::new(options),
            usages,
            handlers,
            config: self.config,
        })
    }
}

/// A validated parser: metadata, option indices and bound handlers.
///
/// Immutable after construction; `parse` calls are independent of each other.
pub struct LineParser<C = ()> {
    info: ProgramInfo,
    subcommands: Vec<String>,
    accessor: Accessor,
    usages: Vec<UsageSpec>,
    handlers: HashMap<String, Handler<C>>,
    config: MatchConfig,
}

impl<C> LineParser<C> {
    pub fn builder(meta: Metadata) -> LineParserBuilder<C> {
        LineParserBuilder {
            meta,
            handlers: HashMap::new(),
            config: MatchConfig::default(),
        }
    }

    /// Structural metadata checks only, without handler bindings.
    pub fn validate(meta: &Metadata) -> std::result::Result<(), MetadataError> {
        validate(meta)
    }

    pub fn info(&self) -> &ProgramInfo {
        &self.info
    }

    pub fn subcommands(&self) -> &[String] {
        &self.subcommands
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    pub fn usages(&self) -> &[UsageSpec] {
        &self.usages
    }

    pub fn help(&self) -> Result<String> {
        help::render(&self.info, &self.usages, &self.accessor)
    }

    pub fn version_text(&self) -> String {
        help::version(&self.info)
    }

    /// First usage matching `argv`, without dispatching.
    pub fn match_argv<S: AsRef<str>>(&self, argv: &[S]) -> Option<(usize, MatchResult)> {
        self.usages.iter().enumerate().find_map(|(i, usage)| {
            let r = match_usage(&self.accessor, usage, argv, &self.config);
            tracing::debug!(usage = i, matched = r.matched, "usage tried");
            r.matched.then_some((i, r))
        })
    }

    /// Every usage's match attempt, in declaration order.
    pub fn explain<S: AsRef<str>>(&self, argv: &[S]) -> Vec<MatchResult> {
        self.usages
            .iter()
            .map(|usage| match_usage(&self.accessor, usage, argv, &self.config))
            .collect()
    }

    /// Dispatch `argv` to the first matching usage's handler.
    ///
    /// Returns the index of the usage that ran, or `None` when nothing matched.
    /// No match is not an error.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S], context: Option<&C>) -> Result<Option<usize>> {
        let Some((usage, result)) = self.match_argv(argv) else {
            tracing::debug!("no usage matched");
            return Ok(None);
        };

        // Bindings were checked in `build`.
        let Some(name) = self.usages[usage].handler.as_deref() else {
            return Ok(None);
        };
        let Some(handler) = self.handlers.get(name) else {
            return Ok(None);
        };

        tracing::debug!(usage, handler = name, "dispatching");
        let invocation = Invocation {
            result: &result,
            usage,
            handler: name,
            context,
            parser: self,
        };
        handler(&invocation).map_err(|source| Error::Handler { usage, source })?;
        Ok(Some(usage))
    }

    /// [`parse`](Self::parse) over the process arguments, minus the program.
    pub fn parse_env(&self, context: Option<&C>) -> Result<Option<usize>> {
        let argv = lossy_args(std::env::args_os().skip(1));
        self.parse(&argv, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn lossy_args_keeps_utf8_untouched() {
        let argv = lossy_args(["connect", "--host", "10.0.0.1"].map(OsString::from));
        assert_eq!(argv, vec!["connect", "--host", "10.0.0.1"]);
    }

    #[cfg(unix)]
    #[test]
    fn lossy_args_replaces_invalid_utf8() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![b'a', 0xFF]);
        let argv = lossy_args([OsString::from("ok"), raw]);
        assert_eq!(argv, vec!["ok".to_string(), "a\u{FFFD}".to_string()]);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let meta = Metadata {
            usages: vec![UsageSpec::new(None).args(["[rest]"]).handler("run")],
            ..Default::default()
        };
        let parser = LineParser::<()>::builder(meta)
            .handler("run", move |inv| {
                sink.borrow_mut().extend(inv.result.args.iter().cloned());
                Ok(())
            })
            .build()
            .unwrap();
        assert_eq!(parser.parse(&argv, None).unwrap(), Some(0));
        assert_eq!(*seen.borrow(), argv);
    }

    #[test]
    fn parse_env_reads_process_arguments() {
        let meta = Metadata {
            usages: vec![UsageSpec::new(None).handler("any")],
            ..Default::default()
        };
        let parser = LineParser::<()>::builder(meta)
            .handler("any", |_| Ok(()))
            .build()
            .unwrap();
        // Whatever the test harness was started with, the catch-all matches.
        assert_eq!(parser.parse_env(None).unwrap(), Some(0));
    }
}
