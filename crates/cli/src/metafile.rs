use anyhow::{Context, Result, bail};
use indexmap::IndexSet;
use lineparser::{FlagSpec, Metadata, ParamSpec, UsageSpec};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_META_NAME: &str = "lineparser.json";

#[derive(Debug, Clone)]
pub struct LoadedMetadata {
    pub path: PathBuf,
    pub meta: Metadata,
}

fn resolve_against(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Load the metadata file named on the command line, or `lineparser.json` in
/// the current directory.
pub fn load_metadata(meta_path: Option<&Path>) -> Result<LoadedMetadata> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let path = match meta_path {
        Some(p) => resolve_against(&cwd, p),
        None => cwd.join(DEFAULT_META_NAME),
    };

    if !path.exists() {
        bail!("metadata file not found: {}", path.display());
    }

    tracing::debug!(path = %path.display(), "loading metadata");
    let meta = Metadata::from_file(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    Ok(LoadedMetadata { path, meta })
}

/// Give every usage a handler name so the whole file can be bound.
///
/// Usages that declare none get `usage-<n>`.
pub fn name_handlers(meta: &mut Metadata) {
    for (i, usage) in meta.usages.iter_mut().enumerate() {
        usage
            .handler
            .get_or_insert_with(|| format!("usage-{i}"));
    }
}

/// Distinct handler names in first-use order.
pub fn handler_names(meta: &Metadata) -> IndexSet<String> {
    meta.usages
        .iter()
        .filter_map(|u| u.handler.clone())
        .collect()
}

/// Starter metadata written by `lineparse init`.
pub fn starter(program: &str) -> Metadata {
    let mut meta = Metadata {
        program: Some(program.to_string()),
        version: Some("0.1.0".to_string()),
        subcommands: vec!["run".to_string()],
        ..Default::default()
    };
    meta.options.flags = vec![
        FlagSpec::new(Some("h"), Some("help")).description("print program usage"),
        FlagSpec::new(Some("v"), Some("verbose")).description("verbose output"),
    ];
    meta.options.parameters = vec![
        ParamSpec::new(Some("o"), Some("output"))
            .description("output file")
            .default_value("out.txt"),
    ];
    meta.usages = vec![
        UsageSpec::new(Some("run"))
            .options(["[v]", "[output]"])
            .args(["input"])
            .description("run on an input file")
            .handler("run"),
        UsageSpec::new(None)
            .options(["h"])
            .description("print help")
            .handler("help"),
        UsageSpec::new(None)
            .description("print help")
            .handler("help"),
    ];
    meta
}

pub fn write_starter(dir: &Path, program: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let path = dir.join(DEFAULT_META_NAME);
    if path.exists() {
        bail!("{DEFAULT_META_NAME} already exists in {}", dir.display());
    }

    let json = starter(program)
        .to_json_pretty()
        .context("failed to encode starter metadata")?;
    fs::write(&path, json + "\n")
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
