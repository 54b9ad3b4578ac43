//! Manifest files: ordered, typed sections of source files and deployment
//! instructions.
//!
//! ```text
//! sourcetype:js
//! js/a.js            # trailing comments are stripped
//! sourcetype:css
//! css/site.css
//! sourcetype:subtree
//! img/icons
//! sourcetype:copy
//! fonts/logo.woff    fonts
//! ```
//!
//! [`parse_str`] implements the grammar alone. [`Manifest::load`] adds the
//! eager filesystem checks for `js`/`css` entries, so a bad reference aborts
//! the manifest before any build step runs. `subtree`/`copy` sources are
//! only checked at deployment time, where a missing one is a warning.
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::ManifestError;

/// Section type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// JavaScript sources, concatenated and compressed.
    Js,
    /// Stylesheets, concatenated and compressed.
    Css,
    /// Directories copied recursively into dist.
    Subtree,
    /// Single files copied into a dist directory.
    Copy,
}

impl SourceType {
    /// Parse a `sourcetype:` name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "js" => Some(Self::Js),
            "css" => Some(Self::Css),
            "subtree" => Some(Self::Subtree),
            "copy" => Some(Self::Copy),
            _ => None,
        }
    }

    /// The name used in manifests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Css => "css",
            Self::Subtree => "subtree",
            Self::Copy => "copy",
        }
    }

    /// The asset kind built from this section, for `js` and `css`.
    #[must_use]
    pub const fn asset(self) -> Option<AssetKind> {
        match self {
            Self::Js => Some(AssetKind::Js),
            Self::Css => Some(AssetKind::Css),
            Self::Subtree | Self::Copy => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source types that go through concatenation and compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// JavaScript.
    Js,
    /// CSS.
    Css,
}

impl AssetKind {
    /// Build order within a manifest.
    pub const ALL: [Self; 2] = [Self::Js, Self::Css];

    /// File extension, which is also the required source extension and the
    /// dist subdirectory name.
    #[must_use]
    pub const fn ext(self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Css => "css",
        }
    }

    /// The section type that lists sources of this kind.
    #[must_use]
    pub const fn source_type(self) -> SourceType {
        match self {
            Self::Js => SourceType::Js,
            Self::Css => SourceType::Css,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

/// One data row of a section. Paths are relative to the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A `js` or `css` source file.
    Source {
        /// Source file.
        path: PathBuf,
        /// 1-based manifest line.
        line: usize,
    },
    /// A directory deployed to the same relative path under dist.
    Subtree {
        /// Source directory.
        dir: PathBuf,
        /// 1-based manifest line.
        line: usize,
    },
    /// A file deployed into a directory under dist.
    Copy {
        /// Source file.
        source: PathBuf,
        /// Target directory relative to dist.
        target: PathBuf,
        /// 1-based manifest line.
        line: usize,
    },
}

impl Entry {
    /// Manifest line the entry came from.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Source { line, .. } | Self::Subtree { line, .. } | Self::Copy { line, .. } => {
                *line
            }
        }
    }
}

/// A `sourcetype:` header and the rows that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section type.
    pub kind: SourceType,
    /// Rows in manifest order.
    pub entries: Vec<Entry>,
}

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Path the manifest was read from.
    pub path: PathBuf,
    /// Short name used as the artifact prefix.
    pub name: String,
    /// Sections in manifest order.
    pub sections: Vec<Section>,
}

impl Manifest {
    /// Read, parse, and validate the manifest at `path` against `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read, is malformed, or a
    /// `js`/`css` entry is not a readable file under `root`.
    pub fn load(path: &Path, root: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::parse(path, &content)?;
        manifest.validate(root)?;
        Ok(manifest)
    }

    /// Parse manifest `content` without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown section types, extension mismatches and
    /// malformed `copy` rows.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ManifestError> {
        Ok(Self {
            path: path.to_path_buf(),
            name: short_name(path),
            sections: parse_str(content, path)?,
        })
    }

    /// Check that every `js`/`css` source is a readable file under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingSource`] for the first unreadable entry.
    pub fn validate(&self, root: &Path) -> Result<(), ManifestError> {
        for section in &self.sections {
            for entry in &section.entries {
                if let Entry::Source { path, line } = entry
                    && !is_readable_file(&root.join(path))
                {
                    return Err(ManifestError::MissingSource {
                        file: self.path.clone(),
                        line: *line,
                        path: path.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Source files of `kind`, across all its sections, in manifest order.
    #[must_use]
    pub fn sources(&self, kind: AssetKind) -> Vec<&Path> {
        self.entries_of(kind.source_type())
            .filter_map(|entry| match entry {
                Entry::Source { path, .. } => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    /// Directories listed in `subtree` sections.
    pub fn subtrees(&self) -> impl Iterator<Item = &Path> {
        self.entries_of(SourceType::Subtree)
            .filter_map(|entry| match entry {
                Entry::Subtree { dir, .. } => Some(dir.as_path()),
                _ => None,
            })
    }

    /// `(source, target)` pairs listed in `copy` sections.
    pub fn copies(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries_of(SourceType::Copy)
            .filter_map(|entry| match entry {
                Entry::Copy { source, target, .. } => Some((source.as_path(), target.as_path())),
                _ => None,
            })
    }

    fn entries_of(&self, kind: SourceType) -> impl Iterator<Item = &Entry> {
        self.sections
            .iter()
            .filter(move |s| s.kind == kind)
            .flat_map(|s| s.entries.iter())
    }
}

/// Derive the artifact prefix from a manifest path (basename without its
/// extension).
#[must_use]
pub fn short_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "manifest".to_string(), |s| s.to_string_lossy().into_owned())
}

fn is_readable_file(path: &Path) -> bool {
    File::open(path)
        .and_then(|f| f.metadata())
        .is_ok_and(|m| m.is_file())
}

/// Parse manifest text into sections.
///
/// `file` is only used for error messages.
///
/// # Errors
///
/// Returns an error for unknown section types, extension mismatches and
/// malformed `copy` rows.
pub fn parse_str(content: &str, file: &Path) -> Result<Vec<Section>, ManifestError> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let data = strip_comment(trimmed);
        if data.is_empty() {
            continue;
        }

        if let Some(name) = parse_header(data) {
            let kind =
                SourceType::from_name(name).ok_or_else(|| ManifestError::UnknownSourceType {
                    file: file.to_path_buf(),
                    line,
                    name: name.to_string(),
                })?;
            if let Some(section) = current.replace(Section {
                kind,
                entries: Vec::new(),
            }) {
                sections.push(section);
            }
            continue;
        }

        // Rows before the first header belong to no section.
        let Some(section) = current.as_mut() else {
            continue;
        };
        section.entries.push(parse_entry(section.kind, data, file, line)?);
    }

    if let Some(section) = current {
        sections.push(section);
    }

    Ok(sections)
}

/// Drop a trailing `#...` comment and surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before).trim()
}

/// Return the type name if `line` is a `sourcetype:<name>` header.
fn parse_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("sourcetype")?;
    let name = rest.trim_start().strip_prefix(':')?;
    Some(name.trim())
}

fn parse_entry(
    kind: SourceType,
    data: &str,
    file: &Path,
    line: usize,
) -> Result<Entry, ManifestError> {
    match kind {
        SourceType::Js | SourceType::Css => {
            let path = data.split_whitespace().next().unwrap_or(data);
            let ext = path.rsplit_once('.').map(|(_, ext)| ext);
            if ext != Some(kind.as_str()) {
                return Err(ManifestError::ExtensionMismatch {
                    file: file.to_path_buf(),
                    line,
                    path: path.to_string(),
                    expected: kind.as_str(),
                });
            }
            Ok(Entry::Source {
                path: PathBuf::from(path),
                line,
            })
        }
        SourceType::Subtree => Ok(Entry::Subtree {
            dir: PathBuf::from(data),
            line,
        }),
        SourceType::Copy => {
            let fields: Vec<&str> = data.split_whitespace().collect();
            match fields.as_slice() {
                [source, target] => Ok(Entry::Copy {
                    source: PathBuf::from(source),
                    target: PathBuf::from(target),
                    line,
                }),
                _ => Err(ManifestError::MalformedCopy {
                    file: file.to_path_buf(),
                    line,
                    content: data.to_string(),
                }),
            }
        }
    }
}
