//! Content collection.
//!
//! Walks the source directory in sorted order and builds the [`Collection`]
//! for one build pass. Documents are parsed in parallel; traversal order is
//! kept in the result.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use bodykit_core::{
    AssetNode, Collection, Config, ContentNode, CoreError, Entry, MarkdownRenderer, NodeLocation,
    content::modified_millis,
};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    ignore::{IgnoreRules, is_minified_name},
    output::{OutputPattern, url_for_output},
};

/// Content collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source directory is missing.
    #[error("source directory not found: {0}")]
    MissingSource(PathBuf),

    /// Directory walk failure.
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// A document could not be read.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A configured ignore pattern is not a valid glob.
    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Could not stat a source file.
    #[error("failed to read metadata of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// A file found during the walk, before parsing.
#[derive(Debug, Clone)]
struct Candidate {
    source_path: PathBuf,
    rel_path: String,
    is_content: bool,
}

/// Content collector that walks the source tree and parses documents.
pub struct ContentCollector {
    config: Config,
    renderer: Arc<dyn MarkdownRenderer>,
    rules: IgnoreRules,
}

impl std::fmt::Debug for ContentCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCollector")
            .field("source_dir", &self.config.build.source_dir)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl ContentCollector {
    /// Create a collector for the configured source directory.
    pub fn new(config: Config, renderer: Arc<dyn MarkdownRenderer>) -> Result<Self> {
        let rules = IgnoreRules::from_config(&config)?;
        Ok(Self {
            config,
            renderer,
            rules,
        })
    }

    /// Ignore rules used by this collector.
    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Collect every document and asset under the source directory.
    pub fn collect(&self) -> Result<Collection> {
        let root = &self.config.build.source_dir;
        if !root.is_dir() {
            return Err(CollectorError::MissingSource(root.clone()));
        }
        info!(dir = %root.display(), "collecting content");

        let candidates = self.find_candidates(root)?;
        debug!(count = candidates.len(), "found source files");

        let renderer = self.renderer.as_ref();
        let entries = candidates
            .par_iter()
            .map(|candidate| self.load(candidate, renderer))
            .collect::<Result<Vec<_>>>()?;

        let collection = Collection::new(entries);
        info!(
            documents = collection.contents().count(),
            assets = collection.assets().count(),
            "content collection complete"
        );
        Ok(collection)
    }

    /// Walk the tree in file-name order, pruning ignored entries.
    fn find_candidates(&self, root: &Path) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !self.rules.is_ignored(&relative_path(root, entry.path()))
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if is_minified_name(&name) {
                debug!(path = %entry.path().display(), "skipping compiler output");
                continue;
            }

            let is_content = entry
                .path()
                .extension()
                .is_some_and(|ext| self.config.is_content_extension(&ext.to_string_lossy()));

            candidates.push(Candidate {
                source_path: entry.path().to_path_buf(),
                rel_path: relative_path(root, entry.path()),
                is_content,
            });
        }

        Ok(candidates)
    }

    fn load(&self, candidate: &Candidate, renderer: &dyn MarkdownRenderer) -> Result<Entry> {
        let location = self.location(candidate)?;
        if candidate.is_content {
            let node = ContentNode::read(location, renderer)?;
            debug!(path = %node.path, url = %node.url, "parsed document");
            Ok(Entry::Content(node))
        } else {
            let copy_eligible = Path::new(&candidate.rel_path)
                .extension()
                .is_some_and(|ext| self.config.is_copy_extension(&ext.to_string_lossy()));
            Ok(Entry::Asset(AssetNode::new(location, copy_eligible)))
        }
    }

    fn location(&self, candidate: &Candidate) -> Result<NodeLocation> {
        let modified =
            modified_millis(&candidate.source_path).map_err(|source| CollectorError::Metadata {
                path: candidate.source_path.clone(),
                source,
            })?;

        let (dir, file) = candidate
            .rel_path
            .rsplit_once('/')
            .unwrap_or(("", candidate.rel_path.as_str()));
        let (name, ext) = file.rsplit_once('.').unwrap_or((file, ""));

        let pattern = if candidate.is_content {
            OutputPattern::for_content(&self.config, name)
        } else {
            OutputPattern::for_asset(&self.config)
        };
        let rel_output = pattern.apply(dir, name, ext);

        Ok(NodeLocation {
            path: candidate.rel_path.clone(),
            source_path: candidate.source_path.clone(),
            dest_path: self.config.build.output_dir.join(&rel_output),
            url: url_for_output(&self.config, &rel_output),
            modified,
        })
    }
}

/// Slash-separated path of `path` relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
