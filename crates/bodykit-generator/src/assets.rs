//! Asset resolution and copy-through.
//!
//! Stylesheets, scripts and fonts come from an external compiler and are
//! looked up in an [`ArtifactIndex`] frozen at the start of a build pass.
//! Images resolve against the asset entries of the [`Collection`].

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use bodykit_core::{Collection, Config, content::modified_millis, format::to_base36};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::collector::relative_path;

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk failure while scanning artifacts.
    #[error("failed to scan artifacts: {0}")]
    Walk(#[from] walkdir::Error),

    /// Copying one asset failed.
    #[error("failed to copy {src} to {dest}: {source}")]
    Copy {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Kind of a referenced asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Compiled stylesheet.
    Css,
    /// Compiled script.
    Js,
    /// Web font.
    Font,
    /// Image from the source tree.
    Image,
}

impl AssetKind {
    /// Name used in tag attributes and artifact records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Font => "font",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "css" => Ok(Self::Css),
            "js" => Ok(Self::Js),
            "font" => Ok(Self::Font),
            "image" | "img" => Ok(Self::Image),
            other => Err(format!("unsupported asset type `{other}`")),
        }
    }
}

/// One file produced by an external asset compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifactRecord {
    /// Name templates refer to (`main` for `css/main.min.css`).
    pub logical_name: String,

    /// Artifact kind.
    pub kind: AssetKind,

    /// Slash-separated path relative to the output root.
    pub relative_path: String,

    /// Artifact file on disk.
    pub dest_path: PathBuf,

    /// Modification time in epoch milliseconds.
    pub modified: i64,
}

/// Enumerates compiled artifacts.
pub trait ArtifactSource: Send + Sync {
    /// All artifacts currently available.
    fn artifacts(&self) -> Result<Vec<CompiledArtifactRecord>>;
}

impl ArtifactSource for Vec<CompiledArtifactRecord> {
    fn artifacts(&self) -> Result<Vec<CompiledArtifactRecord>> {
        Ok(self.clone())
    }
}

/// Scans a directory for minified stylesheets, scripts and fonts.
#[derive(Debug, Clone)]
pub struct DirectoryArtifactSource {
    root: PathBuf,
}

/// Font extensions picked up by [`DirectoryArtifactSource`].
pub const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf"];

impl DirectoryArtifactSource {
    /// Scan `root` (usually the output directory).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn classify(name: &str) -> Option<(AssetKind, String)> {
        if let Some(stem) = name.strip_suffix(".min.css") {
            return Some((AssetKind::Css, stem.to_string()));
        }
        if let Some(stem) = name.strip_suffix(".min.js") {
            return Some((AssetKind::Js, stem.to_string()));
        }
        let (stem, ext) = name.rsplit_once('.')?;
        FONT_EXTENSIONS
            .contains(&ext.to_ascii_lowercase().as_str())
            .then(|| (AssetKind::Font, stem.to_string()))
    }
}

impl ArtifactSource for DirectoryArtifactSource {
    fn artifacts(&self) -> Result<Vec<CompiledArtifactRecord>> {
        if !self.root.is_dir() {
            debug!(dir = %self.root.display(), "artifact directory does not exist");
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let Some((kind, logical_name)) = Self::classify(&name) else {
                continue;
            };
            records.push(CompiledArtifactRecord {
                logical_name,
                kind,
                relative_path: relative_path(&self.root, entry.path()),
                dest_path: entry.path().to_path_buf(),
                modified: modified_millis(entry.path())?,
            });
        }

        debug!(count = records.len(), "scanned compiled artifacts");
        Ok(records)
    }
}

/// An artifact with its cache-busting version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedArtifact {
    /// The artifact record.
    pub record: CompiledArtifactRecord,
    /// Base-36 modification time.
    pub version: String,
}

/// Artifacts keyed by kind and logical name, frozen for one build pass.
#[derive(Debug, Clone, Default)]
pub struct ArtifactIndex {
    by_name: HashMap<(AssetKind, String), IndexedArtifact>,
}

impl ArtifactIndex {
    /// Build the index, computing every version once.
    pub fn from_records(records: Vec<CompiledArtifactRecord>) -> Self {
        let mut by_name: HashMap<(AssetKind, String), IndexedArtifact> =
            HashMap::with_capacity(records.len());
        for record in records {
            let key = (record.kind, record.logical_name.clone());
            if let Some(existing) = by_name.get(&key) {
                warn!(
                    name = %record.logical_name,
                    kept = %existing.record.relative_path,
                    ignored = %record.relative_path,
                    "duplicate artifact name"
                );
                continue;
            }
            let version = to_base36(record.modified.max(0) as u64);
            by_name.insert(key, IndexedArtifact { record, version });
        }
        Self { by_name }
    }

    /// Build the index from a source.
    pub fn load(source: &dyn ArtifactSource) -> Result<Self> {
        Ok(Self::from_records(source.artifacts()?))
    }

    /// Look up an artifact by kind and logical name.
    pub fn get(&self, kind: AssetKind, name: &str) -> Option<&IndexedArtifact> {
        self.by_name.get(&(kind, name.to_string()))
    }

    /// Number of indexed artifacts.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// A resolved asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// URL without the version parameter.
    pub href: String,
    /// Cache-busting version.
    pub version: String,
    /// Path the reference was resolved to, used for element ids.
    pub path: String,
}

impl ResolvedAsset {
    /// URL with the `v` cache-busting parameter.
    pub fn url(&self) -> String {
        let separator = if self.href.contains('?') { '&' } else { '?' };
        format!("{}{separator}v={}", self.href, self.version)
    }
}

/// Resolves logical asset names to versioned URLs.
#[derive(Debug, Clone, Copy)]
pub struct AssetResolver<'a> {
    config: &'a Config,
    index: &'a ArtifactIndex,
    collection: &'a Collection,
    build_version: &'a str,
}

impl<'a> AssetResolver<'a> {
    /// Create a resolver over one pass's frozen state.
    pub fn new(
        config: &'a Config,
        index: &'a ArtifactIndex,
        collection: &'a Collection,
        build_version: &'a str,
    ) -> Self {
        Self {
            config,
            index,
            collection,
            build_version,
        }
    }

    /// Resolve `name` of `kind`; `None` when nothing matches.
    pub fn resolve(&self, kind: AssetKind, name: &str) -> Option<ResolvedAsset> {
        if kind == AssetKind::Image {
            return self.collection.find_asset(name).map(|asset| ResolvedAsset {
                href: asset.url.clone(),
                version: asset.version.clone(),
                path: asset.path.clone(),
            });
        }

        let artifact = self
            .index
            .get(kind, name)
            .or_else(|| self.index.get(kind, &logical_name(kind, name)))?;
        Some(ResolvedAsset {
            href: self.config.url_for(&artifact.record.relative_path),
            version: artifact.version.clone(),
            path: artifact.record.relative_path.clone(),
        })
    }

    /// Reference a path directly, versioned with the build pass.
    pub fn direct(&self, path: &str) -> ResolvedAsset {
        ResolvedAsset {
            href: self.config.url_for(path),
            version: self.build_version.to_string(),
            path: path.trim_start_matches('/').to_string(),
        }
    }
}

/// Reduce a requested name to an artifact's logical name: the last path
/// segment without `.min.<ext>` or `.<ext>`.
fn logical_name(kind: AssetKind, name: &str) -> String {
    let file = name.rsplit('/').next().unwrap_or(name);
    let ext = match kind {
        AssetKind::Css => "css",
        AssetKind::Js => "js",
        AssetKind::Font | AssetKind::Image => {
            return file.rsplit_once('.').map_or(file, |(stem, _)| stem).to_string();
        }
    };
    file.strip_suffix(&format!(".min.{ext}"))
        .or_else(|| file.strip_suffix(&format!(".{ext}")))
        .unwrap_or(file)
        .to_string()
}

/// Outcome of copying the eligible assets of a collection.
#[derive(Debug, Default)]
pub struct AssetCopyReport {
    /// Number of assets copied.
    pub copied: usize,
    /// Failed copies with the asset's source-relative path.
    pub failures: Vec<(String, AssetError)>,
}

/// Copy every copy-eligible asset to its destination.
///
/// A failed copy is logged and recorded; the remaining assets are still copied.
pub fn copy_assets(collection: &Collection) -> AssetCopyReport {
    let mut report = AssetCopyReport::default();
    for asset in collection.assets().filter(|a| a.copy_eligible) {
        match copy_file(&asset.source_path, &asset.dest_path) {
            Ok(()) => report.copied += 1,
            Err(err) => {
                warn!(path = %asset.path, error = %err, "asset copy failed");
                report.failures.push((asset.path.clone(), err));
            }
        }
    }
    info!(
        count = report.copied,
        failed = report.failures.len(),
        "assets copied"
    );
    report
}

fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    let copy = || -> std::io::Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
        Ok(())
    };
    copy().map_err(|source| AssetError::Copy {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source,
    })?;

    debug!(src = %src.display(), dest = %dest.display(), "copied asset");
    Ok(())
}
