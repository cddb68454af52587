use lineparser::{LineParser, Metadata};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub source: String,
    pub program: Option<String>,
    pub subcommands: Vec<String>,
    pub flags: usize,
    pub parameters: usize,
    pub usages: usize,
    pub handlers: Vec<String>,
    pub unnamed_usages: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

pub fn check_metadata(source: &Path, meta: &Metadata) -> CheckReport {
    let mut handlers: Vec<String> = Vec::new();
    let mut unnamed_usages = Vec::new();
    for (i, usage) in meta.usages.iter().enumerate() {
        match usage.handler.as_deref() {
            Some(h) if !handlers.iter().any(|x| x == h) => handlers.push(h.to_string()),
            Some(_) => {}
            None => unnamed_usages.push(i),
        }
    }

    let error = LineParser::<()>::validate(meta).err().map(|e| e.to_string());

    CheckReport {
        source: source.display().to_string(),
        program: meta.program.clone(),
        subcommands: meta.subcommands.clone(),
        flags: meta.options.flags.len(),
        parameters: meta.options.parameters.len(),
        usages: meta.usages.len(),
        handlers,
        unnamed_usages,
        error,
    }
}
