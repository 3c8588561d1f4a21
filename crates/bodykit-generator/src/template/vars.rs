//! Short variable tokens: `$scope:name(:modifier)*`.
//!
//! Scopes are `node` (node fields, then metadata), `meta` (metadata only) and
//! `global` (configured globals, then site settings). Unresolved tokens render
//! as the empty string unless a `default(...)` modifier supplies a value.

use std::{borrow::Cow, str::FromStr, sync::LazyLock};

use bodykit_core::{
    Config, ContentNode,
    content::parse_timestamp,
    format::{escape_html, make_slug, to_title_case},
};
use chrono::{DateTime, Locale, SecondsFormat, Utc};
use regex::{Captures, Regex};

const MODIFIER: &str =
    r"(?:(?:upper|lower|slug|title|escape|year|longdate|date|iso)\b|default\([^)]*\))";

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"\$(node|meta|global):([A-Za-z0-9_]+(?:-[A-Za-z0-9_]+)*)((?::{MODIFIER})*)"
    );
    Regex::new(&pattern).expect("valid variable token regex")
});

static MODIFIER_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([a-z]+)(?:\(([^)]*)\))?").expect("valid modifier regex")
});

/// Where a variable is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarScope {
    /// Node fields, falling back to metadata.
    Node,
    /// Front matter metadata only.
    Meta,
    /// Configured globals and site settings.
    Global,
}

impl FromStr for VarScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "meta" => Ok(Self::Meta),
            "global" => Ok(Self::Global),
            other => Err(format!("unknown variable scope `{other}`")),
        }
    }
}

/// A value transformation applied after lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Upper,
    Lower,
    Slug,
    Title,
    Escape,
    Year,
    Date,
    LongDate,
    Iso,
    /// Fallback for a missing or empty value.
    Default(String),
}

impl Modifier {
    /// Parse a modifier name with its optional argument.
    pub fn parse(name: &str, arg: Option<&str>) -> Option<Self> {
        let modifier = match name {
            "upper" => Self::Upper,
            "lower" => Self::Lower,
            "slug" => Self::Slug,
            "title" => Self::Title,
            "escape" => Self::Escape,
            "year" => Self::Year,
            "date" => Self::Date,
            "longdate" => Self::LongDate,
            "iso" => Self::Iso,
            "default" => Self::Default(arg.unwrap_or_default().to_string()),
            _ => return None,
        };
        Some(modifier)
    }

    fn apply(&self, value: Option<String>, locale: &str) -> Option<String> {
        if let Self::Default(fallback) = self {
            return match value {
                Some(v) if !v.is_empty() => Some(v),
                _ => Some(fallback.clone()),
            };
        }

        let value = value?;
        let out = match self {
            Self::Upper => value.to_uppercase(),
            Self::Lower => value.to_lowercase(),
            Self::Slug => make_slug(&value),
            Self::Title => to_title_case(&value),
            Self::Escape => escape_html(&value),
            Self::Year => format_date(&value, DateStyle::Year, locale),
            Self::Date => format_date(&value, DateStyle::Date, locale),
            Self::LongDate => format_date(&value, DateStyle::Long, locale),
            Self::Iso => format_date(&value, DateStyle::Iso, locale),
            Self::Default(_) => value,
        };
        Some(out)
    }
}

#[derive(Debug, Clone, Copy)]
enum DateStyle {
    Year,
    Date,
    Long,
    Iso,
}

/// Format an epoch-millisecond or date string. Unparsable values pass through.
fn format_date(value: &str, style: DateStyle, locale: &str) -> String {
    let millis = value
        .trim()
        .parse::<i64>()
        .ok()
        .or_else(|| parse_timestamp(value));
    let Some(dt) = millis.and_then(DateTime::<Utc>::from_timestamp_millis) else {
        return value.to_string();
    };
    match style {
        DateStyle::Year => dt.format("%Y").to_string(),
        DateStyle::Date => dt.format("%Y-%m-%d").to_string(),
        DateStyle::Long => long_date(dt, locale),
        DateStyle::Iso => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Long date with month names from `locale` ("de-DE" or "de_DE").
///
/// US English puts the month first; other locales put the day first.
/// Unknown locales fall back to en-US.
fn long_date(dt: DateTime<Utc>, locale: &str) -> String {
    let tag = locale.trim().replace('-', "_");
    let locale = Locale::try_from(tag.as_str()).unwrap_or(Locale::en_US);
    let pattern = if matches!(locale, Locale::en_US) {
        "%B %-d, %Y"
    } else {
        "%-d %B %Y"
    };
    dt.format_localized(pattern, locale).to_string()
}

/// Values visible to variable lookups.
#[derive(Debug, Clone, Copy)]
pub struct VarContext<'a> {
    /// Node being rendered.
    pub node: &'a ContentNode,
    /// Site configuration.
    pub config: &'a Config,
    /// Build start time in epoch milliseconds, exposed as `$global:now`.
    pub now: i64,
}

impl<'a> VarContext<'a> {
    /// Raw value of a variable.
    pub fn lookup(&self, scope: VarScope, name: &str) -> Option<Cow<'a, str>> {
        match scope {
            VarScope::Node => self.node.field(name),
            VarScope::Meta => self.node.metadata.get(name).map(Cow::Borrowed),
            VarScope::Global => {
                if let Some(value) = self.config.globals.get(name) {
                    return Some(Cow::Borrowed(value.as_str()));
                }
                let site = &self.config.site;
                match name {
                    "title" | "site_title" => Some(Cow::Borrowed(site.title.as_str())),
                    "root_url" => Some(Cow::Borrowed(site.root_url.as_str())),
                    "locale" => Some(Cow::Borrowed(site.locale.as_str())),
                    "now" => Some(Cow::Owned(self.now.to_string())),
                    _ => None,
                }
            }
        }
    }

    /// Look up a variable and apply modifiers in order.
    pub fn resolve(&self, scope: VarScope, name: &str, modifiers: &[Modifier]) -> String {
        let value = self.lookup(scope, name).map(Cow::into_owned);
        modifiers
            .iter()
            .fold(value, |value, modifier| {
                modifier.apply(value, &self.config.site.locale)
            })
            .unwrap_or_default()
    }

    /// Replace every variable token in `text`.
    pub fn interpolate<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !text.contains('$') {
            return Cow::Borrowed(text);
        }
        TOKEN.replace_all(text, |caps: &Captures<'_>| {
            let scope = match &caps[1] {
                "node" => VarScope::Node,
                "meta" => VarScope::Meta,
                _ => VarScope::Global,
            };
            let modifiers = parse_modifiers(&caps[3]);
            self.resolve(scope, &caps[2], &modifiers)
        })
    }
}

/// Parse a `:a:b(x)` modifier chain, skipping unknown names.
pub fn parse_modifiers(chain: &str) -> Vec<Modifier> {
    MODIFIER_ITEM
        .captures_iter(chain)
        .filter_map(|caps| {
            Modifier::parse(
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map(|m| m.as_str()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use bodykit_core::{NodeLocation, markdown::PassthroughRenderer};

    use super::*;

    fn node(source: &str) -> ContentNode {
        let location = NodeLocation {
            path: "posts/my-post.md".to_string(),
            source_path: PathBuf::from("source/posts/my-post.md"),
            dest_path: PathBuf::from("public/posts/my-post/index.html"),
            url: "/posts/my-post/".to_string(),
            modified: 0,
        };
        ContentNode::from_source(source, location, &PassthroughRenderer)
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.site.title = "My Site".to_string();
        config
            .globals
            .insert("company".to_string(), "ACME & Co".to_string());
        config
    }

    #[test]
    fn test_interpolate_scopes() {
        let node = node("title: Hello World\nauthor: ada\n----\nbody");
        let config = config();
        let ctx = VarContext {
            node: &node,
            config: &config,
            now: 0,
        };

        assert_eq!(
            ctx.interpolate("<h1>$node:title</h1> by $meta:author:title"),
            "<h1>Hello World</h1> by Ada"
        );
        assert_eq!(ctx.interpolate("$global:company:escape"), "ACME &amp; Co");
        assert_eq!(ctx.interpolate("$global:title"), "My Site");
        assert_eq!(ctx.interpolate("$node:slug:upper"), "MY-POST");
    }

    #[test]
    fn test_unresolved_and_default() {
        let node = node("title: T\n----\nbody");
        let config = config();
        let ctx = VarContext {
            node: &node,
            config: &config,
            now: 0,
        };

        assert_eq!(ctx.interpolate("[$meta:missing]"), "[]");
        assert_eq!(ctx.interpolate("[$meta:title]"), "[T]");
        assert_eq!(
            ctx.interpolate("$meta:subtitle:default(No subtitle):upper"),
            "NO SUBTITLE"
        );
        // `meta` never reads computed fields
        assert_eq!(ctx.interpolate("[$meta:slug]"), "[]");
    }

    #[test]
    fn test_date_modifiers() {
        let node = node("date: 2024-01-14\n----\nbody");
        let config = config();
        let ctx = VarContext {
            node: &node,
            config: &config,
            now: 1_700_000_000_000,
        };

        assert_eq!(ctx.interpolate("$node:timestamp:year"), "2024");
        assert_eq!(ctx.interpolate("$node:timestamp:date"), "2024-01-14");
        assert_eq!(ctx.interpolate("$node:timestamp:longdate"), "January 14, 2024");
        assert_eq!(ctx.interpolate("$meta:date:iso"), "2024-01-14T00:00:00Z");
        assert_eq!(ctx.interpolate("$global:now:year"), "2023");
    }

    #[test]
    fn test_longdate_follows_site_locale() {
        let node = node("date: 2024-01-14\n----\nbody");
        let mut config = config();
        let render = |config: &Config| {
            VarContext {
                node: &node,
                config,
                now: 0,
            }
            .interpolate("$node:timestamp:longdate")
            .into_owned()
        };

        config.site.locale = "de-DE".to_string();
        assert_eq!(render(&config), "14 Januar 2024");
        config.site.locale = "fr_FR".to_string();
        assert_eq!(render(&config), "14 janvier 2024");
        config.site.locale = "xx-YY".to_string();
        assert_eq!(render(&config), "January 14, 2024");
    }

    #[test]
    fn test_text_that_is_not_a_token() {
        let node = node("----\nbody");
        let config = config();
        let ctx = VarContext {
            node: &node,
            config: &config,
            now: 0,
        };

        assert_eq!(ctx.interpolate("costs $5 or $user:name"), "costs $5 or $user:name");
        assert_eq!(ctx.interpolate("$node:slug:dates"), "my-post:dates");
        assert!(matches!(ctx.interpolate("no tokens"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_parse_modifiers() {
        assert_eq!(
            parse_modifiers(":lower:default(x y):bogus"),
            vec![Modifier::Lower, Modifier::Default("x y".to_string())]
        );
    }
}
