//! Tag attribute parsing.
//!
//! `key="value"`, `key='value'` and `key=bare` are named attributes. Any other
//! token, bare or quoted, is positional. A bare positional word doubles as a
//! presence flag.

/// Parsed tag attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    named: Vec<(String, String)>,
    positional: Vec<String>,
    flags: Vec<String>,
}

impl Attributes {
    /// Parse the attribute text of a tag.
    pub fn parse(src: &str) -> Result<Self, String> {
        let mut attrs = Self::default();
        let mut chars = src.char_indices().peekable();

        while let Some(&(start, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }

            if c == '"' || c == '\'' {
                chars.next();
                let value = read_quoted(&mut chars, c)?;
                attrs.positional.push(value);
                continue;
            }

            let mut end = src.len();
            while let Some(&(i, ch)) = chars.peek() {
                if ch.is_whitespace() || ch == '=' {
                    end = i;
                    break;
                }
                chars.next();
            }
            let word = &src[start..end];

            if chars.peek().is_some_and(|&(_, ch)| ch == '=') {
                chars.next();
                if word.is_empty() {
                    return Err("attribute value without a name".to_string());
                }
                let value = match chars.peek() {
                    Some(&(_, q)) if q == '"' || q == '\'' => {
                        chars.next();
                        read_quoted(&mut chars, q)?
                    }
                    _ => {
                        let mut value = String::new();
                        while let Some(&(_, ch)) = chars.peek() {
                            if ch.is_whitespace() {
                                break;
                            }
                            value.push(ch);
                            chars.next();
                        }
                        value
                    }
                };
                attrs.insert(word, value);
            } else {
                attrs.positional.push(word.to_string());
                attrs.flags.push(word.to_string());
            }
        }

        Ok(attrs)
    }

    /// Set a named attribute, replacing an earlier value in place.
    pub fn insert(&mut self, key: &str, value: String) {
        match self.named.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.named.push((key.to_string(), value)),
        }
    }

    /// Value of a named attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Named attributes in source order.
    pub fn named(&self) -> impl Iterator<Item = (&str, &str)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Unnamed tokens in source order.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// First positional token that is not one of `skip`.
    pub fn first_positional(&self, skip: &[&str]) -> Option<&str> {
        self.positional
            .iter()
            .map(String::as_str)
            .find(|p| !skip.contains(p))
    }

    /// Whether a bare word `flag` was given, or `flag=true`.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag) || self.get(flag) == Some("true")
    }
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
) -> Result<String, String> {
    let mut value = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c if c == quote => return Ok(value),
            c => value.push(c),
        }
    }
    Err("unterminated quoted value".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_forms() {
        let attrs = Attributes::parse(r#"a="one two" b='three' c=four d="#).expect("parse");
        assert_eq!(attrs.get("a"), Some("one two"));
        assert_eq!(attrs.get("b"), Some("three"));
        assert_eq!(attrs.get("c"), Some("four"));
        assert_eq!(attrs.get("d"), Some(""));
        assert!(attrs.positional().is_empty());
    }

    #[test]
    fn test_positional_and_flags() {
        let attrs = Attributes::parse(r#"div "quoted word" optional class=x"#).expect("parse");
        assert_eq!(attrs.positional(), ["div", "quoted word", "optional"]);
        assert!(attrs.has_flag("optional"));
        assert!(attrs.has_flag("div"));
        assert!(!attrs.has_flag("quoted word"));
        assert_eq!(attrs.first_positional(&["div"]), Some("quoted word"));
    }

    #[test]
    fn test_flag_as_named_true() {
        let attrs = Attributes::parse("raw=true").expect("parse");
        assert!(attrs.has_flag("raw"));
        let attrs = Attributes::parse("raw=false").expect("parse");
        assert!(!attrs.has_flag("raw"));
    }

    #[test]
    fn test_escapes_and_repeats() {
        let attrs = Attributes::parse(r#"text="say \"hi\"" text=again"#).expect("parse");
        assert_eq!(attrs.get("text"), Some("again"));
        assert_eq!(attrs.named().count(), 1);

        let attrs = Attributes::parse(r#"text="say \"hi\"""#).expect("parse");
        assert_eq!(attrs.get("text"), Some(r#"say "hi""#));
    }

    #[test]
    fn test_errors() {
        assert!(Attributes::parse(r#"a="open"#).is_err());
        assert!(Attributes::parse("=value").is_err());
    }

    #[test]
    fn test_empty() {
        let attrs = Attributes::parse("   ").expect("parse");
        assert_eq!(attrs, Attributes::default());
    }
}
