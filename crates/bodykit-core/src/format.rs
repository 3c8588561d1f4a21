//! Text normalization helpers shared by the content model and templates.

/// Maximum number of characters in an auto-derived excerpt.
pub const EXCERPT_LENGTH: usize = 200;

/// Marker appended to a truncated excerpt.
pub const ELLIPSIS: &str = "&hellip;";

/// Words kept lowercase by [`to_title_case`] unless they start the title.
pub const TITLE_STOPWORDS: &[&str] = &["of", "the", "and"];

/// Normalize a string into a URL-safe slug.
///
/// Lowercases, maps whitespace, `_`, `.` and `/` to `-`, drops anything outside
/// `[a-z0-9-]` and collapses runs of `-`.
pub fn make_slug(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars().flat_map(char::to_lowercase) {
        let c = if c.is_whitespace() || matches!(c, '_' | '.' | '/') {
            '-'
        } else {
            c
        };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}

/// Derive a display title from a slug.
pub fn title_from_slug(slug: &str) -> String {
    to_title_case(&slug.replace('-', " "))
}

/// Title-case words, keeping [`TITLE_STOPWORDS`] lowercase after the first word.
pub fn to_title_case(input: &str) -> String {
    input
        .to_lowercase()
        .split(' ')
        .enumerate()
        .map(|(i, word)| {
            if i != 0 && TITLE_STOPWORDS.contains(&word) {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an excerpt from plain text: its first non-empty line, truncated.
pub fn make_excerpt(plain_text: &str) -> String {
    let first_line = plain_text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= EXCERPT_LENGTH {
        return first_line.to_string();
    }

    let truncated: String = first_line.chars().take(EXCERPT_LENGTH).collect();
    format!("{truncated}{ELLIPSIS}")
}

/// Encode a number in lowercase base 36.
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Escape text for use in HTML content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strip HTML tags from content.
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_slug() {
        assert_eq!(make_slug("my-post"), "my-post");
        assert_eq!(make_slug("My Post_Title.v2"), "my-post-title-v2");
        assert_eq!(make_slug("partials/card"), "partials-card");
        assert_eq!(make_slug("Crème brûlée!"), "crme-brle");
        assert_eq!(make_slug("a -- b__c"), "a-b-c");
        assert_eq!(make_slug(""), "");
    }

    #[test]
    fn test_make_slug_is_idempotent_and_safe() {
        let inputs = [
            "Hello World",
            "--leading and trailing--",
            "UPPER_case.with/slashes",
            "tabs\tand\nnewlines",
            "ümlaut & symbols #1",
            "a.-_/b",
        ];
        for input in inputs {
            let once = make_slug(input);
            assert_eq!(make_slug(&once), once, "not idempotent for {input:?}");
            assert!(
                once.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "unsafe char in {once:?}"
            );
            assert!(!once.contains("--"), "separator run in {once:?}");
        }
    }

    #[test]
    fn test_title_from_slug() {
        assert_eq!(title_from_slug("my-post"), "My Post");
        assert_eq!(
            title_from_slug("the-lord-of-the-rings-and-more"),
            "The Lord of the Rings and More"
        );
    }

    #[test]
    fn test_to_title_case_handles_empty_words() {
        assert_eq!(to_title_case("double  space"), "Double  Space");
        assert_eq!(to_title_case(""), "");
    }

    #[test]
    fn test_make_excerpt_short() {
        assert_eq!(make_excerpt("\n  First line \nSecond"), "First line");
    }

    #[test]
    fn test_make_excerpt_truncates() {
        let long = "x".repeat(250);
        let excerpt = make_excerpt(&long);
        assert!(excerpt.ends_with(ELLIPSIS));
        assert_eq!(excerpt.chars().count(), EXCERPT_LENGTH + ELLIPSIS.len());

        let exact = "y".repeat(EXCERPT_LENGTH);
        assert_eq!(make_excerpt(&exact), exact);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Hello <strong>World</strong></p>"),
            "Hello World"
        );
        assert_eq!(strip_html("No tags here"), "No tags here");
    }
}
