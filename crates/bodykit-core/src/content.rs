//! Content model: documents, assets and the per-build collection.

use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::UNIX_EPOCH,
};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::{
    error::{CoreError, Result},
    format::{make_excerpt, make_slug, title_from_slug, to_base36},
    frontmatter::{Metadata, parse_front_matter},
    markdown::MarkdownRenderer,
};

/// Type assigned to documents without an explicit `type`.
pub const DEFAULT_TYPE: &str = "page";

/// Type reported by asset entries.
pub const ASSET_TYPE: &str = "asset";

/// Where a source file lives and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    /// Slash-separated path relative to the source root.
    pub path: String,

    /// Path of the source file on disk.
    pub source_path: PathBuf,

    /// Output file path.
    pub dest_path: PathBuf,

    /// Public URL of the output.
    pub url: String,

    /// Source modification time in epoch milliseconds.
    pub modified: i64,
}

/// One parsed source document.
#[derive(Debug, Clone)]
pub struct ContentNode {
    /// Slash-separated path relative to the source root.
    pub path: String,

    /// Path of the source file on disk.
    pub source_path: PathBuf,

    /// Output file path.
    pub dest_path: PathBuf,

    /// Public URL.
    pub url: String,

    /// Content type (`page` unless the metadata says otherwise).
    pub node_type: String,

    /// Front matter metadata.
    pub metadata: Metadata,

    /// Raw body after the front matter.
    pub body: String,

    /// Slug derived from the file stem.
    pub slug: String,

    /// Explicit or slug-derived title.
    pub title: String,

    /// Tags from the `tags` metadata key.
    pub tags: Vec<String>,

    /// Explicit or auto-derived excerpt.
    pub excerpt: String,

    /// Explicit date or modification time, epoch milliseconds.
    pub timestamp: i64,

    rendered: OnceLock<String>,
}

impl ContentNode {
    /// Build a node from document text.
    pub fn from_source(
        source: &str,
        location: NodeLocation,
        renderer: &dyn MarkdownRenderer,
    ) -> Self {
        let front = parse_front_matter(source);
        let metadata = front.metadata;

        let stem = Path::new(&location.path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let slug = make_slug(&stem);

        let title = metadata
            .get("title")
            .map(str::to_string)
            .unwrap_or_else(|| title_from_slug(&slug));

        let tags = metadata.get("tags").map(split_tags).unwrap_or_default();

        let node_type = metadata.get("type").unwrap_or(DEFAULT_TYPE).to_string();

        let timestamp = match metadata.get("datetime").or_else(|| metadata.get("date")) {
            Some(value) => parse_timestamp(value).unwrap_or_else(|| {
                warn!(path = %location.path, value, "unparsable date, using modification time");
                location.modified
            }),
            None => location.modified,
        };

        let excerpt = match metadata.get("excerpt") {
            Some(excerpt) => excerpt.to_string(),
            None => make_excerpt(&renderer.plain_text(&front.body)),
        };

        Self {
            path: location.path,
            source_path: location.source_path,
            dest_path: location.dest_path,
            url: location.url,
            node_type,
            metadata,
            body: front.body,
            slug,
            title,
            tags,
            excerpt,
            timestamp,
            rendered: OnceLock::new(),
        }
    }

    /// Read and parse the document at `location.source_path`.
    pub fn read(location: NodeLocation, renderer: &dyn MarkdownRenderer) -> Result<Self> {
        let source = fs::read_to_string(&location.source_path)
            .map_err(|e| CoreError::file_read(&location.source_path, e))?;
        Ok(Self::from_source(&source, location, renderer))
    }

    /// View an asset as a node so templates can list it.
    pub fn from_asset(asset: &AssetNode) -> Self {
        let stem = Path::new(&asset.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let slug = make_slug(&stem);
        let mut metadata = Metadata::new();
        metadata.insert("filename", asset.filename.clone());
        metadata.insert("version", asset.version.clone());

        Self {
            path: asset.path.clone(),
            source_path: asset.source_path.clone(),
            dest_path: asset.dest_path.clone(),
            url: asset.url.clone(),
            node_type: ASSET_TYPE.to_string(),
            metadata,
            body: String::new(),
            title: title_from_slug(&slug),
            slug,
            tags: Vec::new(),
            excerpt: String::new(),
            timestamp: asset.timestamp,
            rendered: OnceLock::new(),
        }
    }

    /// Look up a named field, falling back to metadata.
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            "path" => Cow::Borrowed(self.path.as_str()),
            "source_path" => self.source_path.to_string_lossy(),
            "dest_path" => self.dest_path.to_string_lossy(),
            "url" => Cow::Borrowed(self.url.as_str()),
            "type" => Cow::Borrowed(self.node_type.as_str()),
            "body" => Cow::Borrowed(self.body.as_str()),
            "slug" => Cow::Borrowed(self.slug.as_str()),
            "title" => Cow::Borrowed(self.title.as_str()),
            "tags" => Cow::Owned(self.tags.join(", ")),
            "excerpt" => Cow::Borrowed(self.excerpt.as_str()),
            "timestamp" => Cow::Owned(self.timestamp.to_string()),
            _ => return self.metadata.get(name).map(Cow::Borrowed),
        };
        Some(value)
    }

    /// Rendered output, once attached.
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.get().map(String::as_str)
    }

    /// Attach rendered output. Returns `false` if output was already attached.
    pub fn attach_rendered(&self, html: String) -> bool {
        self.rendered.set(html).is_ok()
    }
}

/// A non-markup file from the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNode {
    /// Slash-separated path relative to the source root.
    pub path: String,

    /// Path of the source file on disk.
    pub source_path: PathBuf,

    /// File name with extension.
    pub filename: String,

    /// Output file path.
    pub dest_path: PathBuf,

    /// Public URL.
    pub url: String,

    /// Cache-busting version from the modification time.
    pub version: String,

    /// Modification time in epoch milliseconds.
    pub timestamp: i64,

    /// Whether the file is copied to the output.
    pub copy_eligible: bool,
}

impl AssetNode {
    /// Create an asset node from its location.
    pub fn new(location: NodeLocation, copy_eligible: bool) -> Self {
        let filename = location
            .path
            .rsplit('/')
            .next()
            .unwrap_or(&location.path)
            .to_string();

        Self {
            version: to_base36(location.modified.max(0) as u64),
            path: location.path,
            source_path: location.source_path,
            filename,
            dest_path: location.dest_path,
            url: location.url,
            timestamp: location.modified,
            copy_eligible,
        }
    }
}

/// One collection entry.
#[derive(Debug, Clone)]
pub enum Entry {
    /// A parsed document.
    Content(ContentNode),
    /// A non-markup file.
    Asset(AssetNode),
}

impl Entry {
    /// The entry's type: the node type for content, `asset` for assets.
    pub fn kind(&self) -> &str {
        match self {
            Self::Content(node) => &node.node_type,
            Self::Asset(_) => ASSET_TYPE,
        }
    }

    /// Relative source path.
    pub fn path(&self) -> &str {
        match self {
            Self::Content(node) => &node.path,
            Self::Asset(asset) => &asset.path,
        }
    }

    /// Whether this is an asset entry.
    pub fn is_asset(&self) -> bool {
        matches!(self, Self::Asset(_))
    }

    /// Look up a named field.
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match self {
            Self::Content(node) => node.field(name),
            Self::Asset(asset) => match name {
                "path" => Some(Cow::Borrowed(asset.path.as_str())),
                "filename" | "title" => Some(Cow::Borrowed(asset.filename.as_str())),
                "url" => Some(Cow::Borrowed(asset.url.as_str())),
                "version" => Some(Cow::Borrowed(asset.version.as_str())),
                "timestamp" => Some(Cow::Owned(asset.timestamp.to_string())),
                "type" => Some(Cow::Borrowed(ASSET_TYPE)),
                _ => None,
            },
        }
    }

    /// Content node, if this is a document.
    pub fn as_content(&self) -> Option<&ContentNode> {
        match self {
            Self::Content(node) => Some(node),
            Self::Asset(_) => None,
        }
    }

    /// Asset node, if this is an asset.
    pub fn as_asset(&self) -> Option<&AssetNode> {
        match self {
            Self::Asset(asset) => Some(asset),
            Self::Content(_) => None,
        }
    }
}

/// Ordered, read-only set of entries for one build pass.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: Vec<Entry>,
}

impl Collection {
    /// Create a collection from entries in traversal order.
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// All entries in order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Iterate all entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Iterate content nodes.
    pub fn contents(&self) -> impl Iterator<Item = &ContentNode> {
        self.entries.iter().filter_map(Entry::as_content)
    }

    /// Iterate asset nodes.
    pub fn assets(&self) -> impl Iterator<Item = &AssetNode> {
        self.entries.iter().filter_map(Entry::as_asset)
    }

    /// Find a content node by relative path.
    pub fn content(&self, path: &str) -> Option<&ContentNode> {
        self.contents().find(|node| node.path == path)
    }

    /// Find an asset by relative path, falling back to file name.
    pub fn find_asset(&self, name: &str) -> Option<&AssetNode> {
        let name = name.trim_start_matches('/');
        self.assets()
            .find(|asset| asset.path == name)
            .or_else(|| self.assets().find(|asset| asset.filename == name))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Split a comma-separated tag list, dropping empty and repeated tags.
pub fn split_tags(value: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in value.split(',').map(str::trim) {
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Parse an explicit date into epoch milliseconds (UTC).
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Modification time of a file in epoch milliseconds.
pub fn modified_millis(path: &Path) -> std::io::Result<i64> {
    let modified = fs::metadata(path)?.modified()?;
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    Ok(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::PassthroughRenderer;

    fn location(path: &str) -> NodeLocation {
        NodeLocation {
            path: path.to_string(),
            source_path: PathBuf::from("/site/source").join(path),
            dest_path: PathBuf::from("/site/public/out.html"),
            url: "/out/".to_string(),
            modified: 42,
        }
    }

    #[test]
    fn test_node_from_simple_document() {
        let node = ContentNode::from_source(
            "title: Hello\n----\nBody **text**",
            location("posts/my-post.md"),
            &PassthroughRenderer,
        );

        assert_eq!(node.metadata.get("title"), Some("Hello"));
        assert_eq!(node.metadata.len(), 1);
        assert_eq!(node.body, "Body **text**");
        assert_eq!(node.slug, "my-post");
        assert_eq!(node.title, "Hello");
        assert_eq!(node.node_type, "page");
        assert_eq!(node.timestamp, 42);
        assert_eq!(node.excerpt, "Body **text**");
    }

    #[test]
    fn test_node_derivations() {
        let source = "type: post\ntags: rust, , web,rust\ndate: 2024-01-14\nexcerpt: Short\n----\nBody";
        let node =
            ContentNode::from_source(source, location("the_art-of.war.md"), &PassthroughRenderer);

        assert_eq!(node.slug, "the-art-of-war");
        assert_eq!(node.title, "The Art of War");
        assert_eq!(node.node_type, "post");
        assert_eq!(node.tags, vec!["rust", "web"]);
        assert_eq!(node.timestamp, 1_705_190_400_000);
        assert_eq!(node.excerpt, "Short");
    }

    #[test]
    fn test_unparsable_date_falls_back_to_mtime() {
        let node = ContentNode::from_source(
            "date: someday\n----\nx",
            location("a.md"),
            &PassthroughRenderer,
        );
        assert_eq!(node.timestamp, 42);
    }

    #[test]
    fn test_field_lookup() {
        let node = ContentNode::from_source(
            "author: Ada\ntags: a, b\n----\nx",
            location("a.md"),
            &PassthroughRenderer,
        );
        assert_eq!(node.field("title").as_deref(), Some("A"));
        assert_eq!(node.field("tags").as_deref(), Some("a, b"));
        assert_eq!(node.field("timestamp").as_deref(), Some("42"));
        assert_eq!(node.field("author").as_deref(), Some("Ada"));
        assert!(node.field("missing").is_none());
    }

    #[test]
    fn test_rendered_output_attaches_once() {
        let node = ContentNode::from_source("x", location("a.md"), &PassthroughRenderer);
        assert!(node.rendered().is_none());
        assert!(node.attach_rendered("<p>x</p>".to_string()));
        assert!(!node.attach_rendered("again".to_string()));
        assert_eq!(node.rendered(), Some("<p>x</p>"));
    }

    #[test]
    fn test_read_missing_file() {
        let result = ContentNode::read(location("nope.md"), &PassthroughRenderer);
        assert!(matches!(result, Err(CoreError::FileRead { .. })));
    }

    #[test]
    fn test_asset_node_version() {
        let mut loc = location("img/logo.png");
        loc.modified = 36;
        let asset = AssetNode::new(loc, true);
        assert_eq!(asset.filename, "logo.png");
        assert_eq!(asset.version, "10");
        assert!(asset.copy_eligible);
    }

    #[test]
    fn test_collection_lookup() {
        let node = ContentNode::from_source("x", location("a.md"), &PassthroughRenderer);
        let asset = AssetNode::new(location("img/logo.png"), true);
        let collection = Collection::new(vec![Entry::Content(node), Entry::Asset(asset)]);

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.contents().count(), 1);
        assert!(collection.content("a.md").is_some());
        assert!(collection.find_asset("/img/logo.png").is_some());
        assert!(collection.find_asset("logo.png").is_some());
        assert!(collection.find_asset("other.png").is_none());
        assert_eq!(collection.entries()[1].kind(), ASSET_TYPE);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1970-01-01"), Some(0));
        assert_eq!(parse_timestamp("1970-01-01 00:00:01"), Some(1000));
        assert_eq!(parse_timestamp("1970-01-01T00:01:00Z"), Some(60_000));
        assert_eq!(parse_timestamp("1970-01-01 00:02"), Some(120_000));
        assert_eq!(parse_timestamp("never"), None);
    }
}
