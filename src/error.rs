use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovdiffError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("XML nesting deeper than {limit} elements at position {position}")]
    XmlDepth { limit: usize, position: usize },

    #[error("Coverage schema error: {0}")]
    Schema(serde_json::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Unknown coverage format")]
    UnknownFormat,

    #[error("Unable to access template {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CovdiffError>;
