//! Build orchestration.
//!
//! One pass collects the source tree, loads templates and the artifact index
//! into a fresh [`BuildContext`], renders every document in parallel and
//! writes the results. A render failure is isolated to its document: it is
//! reported, nothing is written for it and earlier output stays in place.

use std::{
    fs, io,
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

use bodykit_core::{Config, ContentNode, MarkdownRenderer};
use bodykit_parser::PulldownRenderer;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    assets::{ArtifactIndex, ArtifactSource, AssetError, DirectoryArtifactSource, copy_assets},
    collector::{CollectorError, ContentCollector},
    context::BuildContext,
    template::{RenderError, TemplateStore},
};

/// Build errors that abort a whole pass.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collector error.
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// Template loading error.
    #[error("template error: {0}")]
    Templates(#[from] RenderError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Why one document or asset produced no output.
#[derive(Debug, Error)]
pub enum PageError {
    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Writing the rendered output failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying a static asset failed.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Result of rendering one document.
#[derive(Debug)]
pub struct RenderOutcome<'a> {
    /// The rendered document. Its output is attached on success.
    pub node: &'a ContentNode,
    /// Render result.
    pub result: std::result::Result<(), RenderError>,
}

impl RenderOutcome<'_> {
    /// Rendered HTML, if the render succeeded.
    pub fn html(&self) -> Option<&str> {
        self.result.as_ref().ok().and_then(|()| self.node.rendered())
    }
}

/// A document or asset that produced no output.
#[derive(Debug)]
pub struct NodeFailure {
    /// Source path relative to the source root.
    pub path: String,
    /// What went wrong.
    pub error: PageError,
}

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of pages rendered (and written, for a build).
    pub pages: usize,

    /// Number of documents and assets that failed.
    pub failed: usize,

    /// Number of assets copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of a pass.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Counters.
    pub stats: BuildStats,
    /// Documents that failed in collection order, then failed asset copies.
    pub failures: Vec<NodeFailure>,
}

impl BuildReport {
    /// Whether every document rendered and every asset was copied.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Site builder that orchestrates build passes.
pub struct Builder {
    config: Config,
    markdown: Arc<dyn MarkdownRenderer>,
    artifacts: Arc<dyn ArtifactSource>,
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("source_dir", &self.config.build.source_dir)
            .field("output_dir", &self.config.build.output_dir)
            .finish_non_exhaustive()
    }
}

impl Builder {
    /// Create a builder using pulldown-cmark and artifacts found in the output directory.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let artifacts = Arc::new(DirectoryArtifactSource::new(&config.build.output_dir));
        Self {
            config,
            markdown: Arc::new(PulldownRenderer::new()),
            artifacts,
        }
    }

    /// Use a different markdown renderer.
    #[must_use]
    pub fn with_markdown(mut self, markdown: Arc<dyn MarkdownRenderer>) -> Self {
        self.markdown = markdown;
        self
    }

    /// Use a different artifact source.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactSource>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// The configuration this builder renders with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Collect the tree and freeze templates and artifacts into a new context.
    pub fn prepare(&self) -> Result<BuildContext> {
        let collector = ContentCollector::new(self.config.clone(), Arc::clone(&self.markdown))?;
        let collection = collector.collect()?;

        let templates = TemplateStore::load(&self.config.templates_path())?;
        debug!(count = templates.len(), "templates loaded");

        let artifacts = ArtifactIndex::load(self.artifacts.as_ref())?;
        debug!(count = artifacts.len(), "artifact index built");

        Ok(BuildContext::new(
            self.config.clone(),
            collection,
            templates,
            artifacts,
            Arc::clone(&self.markdown),
        ))
    }

    /// Render every document of `ctx` in parallel, attaching output to each node.
    pub fn render_all<'c>(&self, ctx: &'c BuildContext) -> Vec<RenderOutcome<'c>> {
        let engine = ctx.engine();
        let nodes: Vec<&ContentNode> = ctx.collection.contents().collect();
        info!(count = nodes.len(), "rendering documents");

        nodes
            .par_iter()
            .map(|&node| {
                let result = engine.render_page(node).map(|html| {
                    if !node.attach_rendered(html) {
                        debug!(path = %node.path, "output already attached");
                    }
                });
                RenderOutcome { node, result }
            })
            .collect()
    }

    /// Run a full build pass: render, write and copy assets.
    pub fn build(&self) -> Result<BuildReport> {
        let start = Instant::now();
        info!(
            source = %self.config.build.source_dir.display(),
            output = %self.config.build.output_dir.display(),
            "starting build"
        );

        let ctx = self.prepare()?;
        fs::create_dir_all(&self.config.build.output_dir)?;

        let outcomes = self.render_all(&ctx);
        let written: Vec<std::result::Result<(), NodeFailure>> = outcomes
            .into_par_iter()
            .map(|outcome| write_outcome(&outcome))
            .collect();

        let mut report = BuildReport::default();
        for result in written {
            match result {
                Ok(()) => report.stats.pages += 1,
                Err(failure) => report.failures.push(failure),
            }
        }
        let copied = copy_assets(&ctx.collection);
        report.stats.assets = copied.copied;
        report
            .failures
            .extend(copied.failures.into_iter().map(|(path, err)| NodeFailure {
                path,
                error: PageError::Asset(err),
            }));
        report.stats.failed = report.failures.len();
        report.stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = report.stats.pages,
            failed = report.stats.failed,
            assets = report.stats.assets,
            duration_ms = report.stats.duration_ms,
            "build complete"
        );
        Ok(report)
    }

    /// Render every document without writing anything.
    pub fn check(&self) -> Result<BuildReport> {
        let start = Instant::now();
        let ctx = self.prepare()?;

        let mut report = BuildReport::default();
        for outcome in self.render_all(&ctx) {
            match outcome.result {
                Ok(()) => report.stats.pages += 1,
                Err(err) => {
                    log_failure(&outcome.node.path, &err);
                    report.failures.push(NodeFailure {
                        path: outcome.node.path.clone(),
                        error: PageError::Render(err),
                    });
                }
            }
        }
        report.stats.failed = report.failures.len();
        report.stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = report.stats.pages,
            failed = report.stats.failed,
            "check complete"
        );
        Ok(report)
    }
}

fn write_outcome(outcome: &RenderOutcome<'_>) -> std::result::Result<(), NodeFailure> {
    let node = outcome.node;
    if let Err(err) = &outcome.result {
        log_failure(&node.path, err);
        return Err(NodeFailure {
            path: node.path.clone(),
            error: PageError::Render(err.clone()),
        });
    }

    let html = outcome.html().unwrap_or_default();
    let write = || -> io::Result<()> {
        if let Some(parent) = node.dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&node.dest_path, html)
    };

    match write() {
        Ok(()) => {
            debug!(path = %node.dest_path.display(), "wrote page");
            Ok(())
        }
        Err(source) => {
            error!(path = %node.path, dest = %node.dest_path.display(), error = %source, "failed to write page");
            Err(NodeFailure {
                path: node.path.clone(),
                error: PageError::Write {
                    path: node.dest_path.clone(),
                    source,
                },
            })
        }
    }
}

fn log_failure(path: &str, err: &RenderError) {
    match err.pos() {
        Some(pos) => error!(
            path,
            file = %err.file(),
            line = pos.line,
            column = pos.column,
            error = %err,
            "render failed"
        ),
        None => error!(path, file = %err.file(), error = %err, "render failed"),
    }
}
