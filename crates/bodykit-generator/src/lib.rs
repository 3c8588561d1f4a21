//! Bodykit Generator Library
//!
//! Content pipeline and template rendering engine for Bodykit.
//!
//! # Modules
//!
//! - [`collector`] - Source tree walk producing the per-pass [`Collection`](bodykit_core::Collection)
//! - [`query`] - Filter, sort and paginate over a collection
//! - [`assets`] - Compiled artifact index, asset resolution and copy-through
//! - [`template`] - Tag lexer, tree parser, variables and the render engine
//! - [`tags`] - Built-in tag processors
//! - [`context`] - Frozen per-pass build context
//! - [`build`] - Build pass orchestration
//! - [`watch`] - Scope-serialized rebuild queue for watch mode

pub mod assets;
pub mod build;
pub mod collector;
pub mod context;
pub mod ignore;
pub mod output;
pub mod query;
pub mod tags;
pub mod template;
pub mod watch;

pub use assets::{
    ArtifactIndex, ArtifactSource, AssetKind, AssetResolver, CompiledArtifactRecord,
    DirectoryArtifactSource,
};
pub use build::{
    BuildError, BuildReport, BuildStats, Builder, NodeFailure, PageError, RenderOutcome,
};
pub use collector::ContentCollector;
pub use context::BuildContext;
pub use query::{Order, Query, search};
pub use tags::{TagKind, TagRegistry};
pub use template::{Engine, RenderError, TemplateStore};
pub use watch::{
    ChangeEvent, ChangeKind, Rebuild, RebuildEvent, RebuildQueue, RebuildScope, TriggerOutcome,
    classify,
};
