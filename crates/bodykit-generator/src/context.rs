//! Per-pass build context.
//!
//! Built fresh for every build pass and read-only while rendering, so any
//! number of nodes can render against it in parallel.

use std::sync::Arc;

use bodykit_core::{Collection, Config, MarkdownRenderer, format::to_base36};
use chrono::Utc;

use crate::{
    assets::{ArtifactIndex, AssetResolver},
    tags::TagRegistry,
    template::{Engine, TemplateStore},
};

/// Frozen state shared by every render in one pass.
pub struct BuildContext {
    /// Site configuration.
    pub config: Config,
    /// Every entry found in the source tree.
    pub collection: Arc<Collection>,
    /// Named templates.
    pub templates: TemplateStore,
    /// Compiled artifacts with precomputed versions.
    pub artifacts: ArtifactIndex,
    /// Tag name to processor mapping.
    pub registry: TagRegistry,
    /// Markdown collaborator.
    pub markdown: Arc<dyn MarkdownRenderer>,
    /// Pass start time in epoch milliseconds.
    pub started: i64,
    /// Base-36 pass version, used for directly referenced assets.
    pub version: String,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("entries", &self.collection.len())
            .field("templates", &self.templates.len())
            .field("artifacts", &self.artifacts.len())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    /// Assemble a context, stamping it with the current time.
    pub fn new(
        config: Config,
        collection: Collection,
        templates: TemplateStore,
        artifacts: ArtifactIndex,
        markdown: Arc<dyn MarkdownRenderer>,
    ) -> Self {
        Self {
            config,
            collection: Arc::new(collection),
            templates,
            artifacts,
            registry: TagRegistry::new(),
            markdown,
            started: 0,
            version: String::new(),
        }
        .with_started(Utc::now().timestamp_millis())
    }

    /// Override the pass start time.
    #[must_use]
    pub fn with_started(mut self, millis: i64) -> Self {
        self.started = millis;
        self.version = to_base36(millis.max(0) as u64);
        self
    }

    /// Engine rendering against this context.
    pub fn engine(&self) -> Engine<'_> {
        Engine::new(self)
    }

    /// Asset resolver over this context.
    pub fn resolver(&self) -> AssetResolver<'_> {
        AssetResolver::new(&self.config, &self.artifacts, &self.collection, &self.version)
    }
}
