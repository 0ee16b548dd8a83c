//! Project manifest (`pyproject.toml`-style) autofill.
//!
//! Only a fixed set of keys is read, from `[tool.poetry]` or, failing that,
//! `[project]`. Anything else in the document is ignored.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Manifest has no [tool.poetry] or [project] table")]
    MissingProjectTable,
}

/// Values lifted from a manifest. `None` means the key was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub authors: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Document {
    tool: Option<Tool>,
    project: Option<ProjectTable>,
}

#[derive(Debug, Deserialize)]
struct Tool {
    poetry: Option<ProjectTable>,
}

#[derive(Debug, Deserialize)]
struct ProjectTable {
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
    license: Option<License>,
    authors: Option<Vec<Author>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum License {
    Name(String),
    Table { text: Option<String>, file: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Author {
    Plain(String),
    Table { name: Option<String>, email: Option<String> },
}

impl License {
    fn into_name(self) -> Option<String> {
        match self {
            License::Name(name) => Some(name),
            License::Table { text, file } => text.or(file),
        }
    }
}

impl Author {
    fn into_display(self) -> Option<String> {
        match self {
            Author::Plain(s) => Some(s),
            Author::Table {
                name: Some(name),
                email: Some(email),
            } => Some(format!("{name} <{email}>")),
            Author::Table { name, email } => name.or(email),
        }
    }
}

pub fn parse_manifest(content: &str) -> Result<ManifestFields, ManifestError> {
    let doc: Document = toml::from_str(content)?;
    let table = doc
        .tool
        .and_then(|t| t.poetry)
        .or(doc.project)
        .ok_or(ManifestError::MissingProjectTable)?;

    Ok(ManifestFields {
        title: table.name,
        description: table.description,
        version: table.version,
        license: table.license.and_then(License::into_name),
        authors: table
            .authors
            .map(|list| list.into_iter().filter_map(Author::into_display).collect()),
    })
}
