//! Single-pass tokenizer for tag templates.
//!
//! Recognizes `{@name attrs}`, `{@name attrs /}` and `{/name}`. A brace that
//! does not start one of these forms is ordinary text.

use super::error::SourcePos;

/// One lexical token with byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'s> {
    /// Literal text.
    Text { text: &'s str, offset: usize },

    /// `{@name attrs}` or `{@name attrs /}`.
    Open {
        name: &'s str,
        attrs: &'s str,
        self_closing: bool,
        start: usize,
        end: usize,
    },

    /// `{/name}`.
    Close {
        name: &'s str,
        start: usize,
        end: usize,
    },
}

/// Tokenizer failure at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Offset of the offending tag.
    pub offset: usize,
    /// What went wrong.
    pub message: String,
}

/// Maps byte offsets to line and column.
#[derive(Debug, Clone)]
pub struct LineIndex<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    /// Index the line starts of `source`.
    pub fn new(source: &'s str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Position of a byte offset.
    pub fn pos(&self, offset: usize) -> SourcePos {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count())
            + 1;
        SourcePos {
            offset,
            line,
            column,
        }
    }
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        let token = match bytes.get(i + 1) {
            Some(b'@') => lex_open(source, i)?,
            Some(b'/') => lex_close(source, i),
            _ => None,
        };

        let Some(token) = token else {
            i += 1;
            continue;
        };

        if text_start < i {
            tokens.push(Token::Text {
                text: &source[text_start..i],
                offset: text_start,
            });
        }
        i = match &token {
            Token::Open { end, .. } | Token::Close { end, .. } => *end,
            Token::Text { .. } => i + 1,
        };
        text_start = i;
        tokens.push(token);
    }

    if text_start < bytes.len() {
        tokens.push(Token::Text {
            text: &source[text_start..],
            offset: text_start,
        });
    }

    Ok(tokens)
}

fn scan_name(bytes: &[u8], from: usize) -> Option<usize> {
    if !bytes.get(from).copied().is_some_and(is_name_start) {
        return None;
    }
    let mut end = from + 1;
    while bytes.get(end).copied().is_some_and(is_name_char) {
        end += 1;
    }
    Some(end)
}

fn lex_open(source: &str, start: usize) -> Result<Option<Token<'_>>, LexError> {
    let bytes = source.as_bytes();
    let name_start = start + 2;
    let Some(name_end) = scan_name(bytes, name_start) else {
        return Ok(None);
    };
    let name = &source[name_start..name_end];

    match bytes.get(name_end) {
        Some(b'}' | b'/') => {}
        Some(b) if b.is_ascii_whitespace() => {}
        Some(_) => {
            return Err(LexError {
                offset: start,
                message: format!("invalid character after tag name `{name}`"),
            });
        }
        None => {
            return Err(LexError {
                offset: start,
                message: format!("unterminated tag `{{@{name}`"),
            });
        }
    }

    let mut quote: Option<u8> = None;
    let mut j = name_end;
    while j < bytes.len() {
        let b = bytes[j];
        match quote {
            Some(_) if b == b'\\' => j += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'}' => {
                let (attrs, self_closing) = split_self_closing(source[name_end..j].trim());
                return Ok(Some(Token::Open {
                    name,
                    attrs,
                    self_closing,
                    start,
                    end: j + 1,
                }));
            }
            None => {}
        }
        j += 1;
    }

    let message = if quote.is_some() {
        format!("unterminated quoted value in tag `{{@{name}`")
    } else {
        format!("unterminated tag `{{@{name}`")
    };
    Err(LexError {
        offset: start,
        message,
    })
}

/// A trailing `/` marks a self-closing tag only when it stands on its own:
/// alone, after whitespace, or right after a quoted value. `url=/about/` keeps
/// its slash.
fn split_self_closing(inner: &str) -> (&str, bool) {
    match inner.strip_suffix('/') {
        Some("") => ("", true),
        Some(rest)
            if rest.ends_with(|c: char| c.is_ascii_whitespace() || c == '"' || c == '\'') =>
        {
            (rest.trim_end(), true)
        }
        _ => (inner, false),
    }
}

fn lex_close(source: &str, start: usize) -> Option<Token<'_>> {
    let bytes = source.as_bytes();
    let name_start = start + 2;
    let name_end = scan_name(bytes, name_start)?;

    let mut j = name_end;
    while bytes.get(j).is_some_and(|b| b.is_ascii_whitespace()) {
        j += 1;
    }
    (bytes.get(j) == Some(&b'}')).then(|| Token::Close {
        name: &source[name_start..name_end],
        start,
        end: j + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize("<p>{@echo node=title /}</p>{@loop type=post}x{/loop}").expect("lex");
        assert_eq!(
            tokens,
            vec![
                Token::Text {
                    text: "<p>",
                    offset: 0
                },
                Token::Open {
                    name: "echo",
                    attrs: "node=title",
                    self_closing: true,
                    start: 3,
                    end: 23
                },
                Token::Text {
                    text: "</p>",
                    offset: 23
                },
                Token::Open {
                    name: "loop",
                    attrs: "type=post",
                    self_closing: false,
                    start: 27,
                    end: 44
                },
                Token::Text {
                    text: "x",
                    offset: 44
                },
                Token::Close {
                    name: "loop",
                    start: 45,
                    end: 52
                },
            ]
        );
    }

    #[test]
    fn test_plain_braces_are_text() {
        let source = "a { color: red } {@} {/ x} {/} @media {";
        let tokens = tokenize(source).expect("lex");
        assert_eq!(
            tokens,
            vec![Token::Text {
                text: source,
                offset: 0
            }]
        );
    }

    #[test]
    fn test_brace_inside_quotes() {
        let tokens = tokenize(r#"{@tag div text="a } b" /}"#).expect("lex");
        assert!(matches!(
            tokens.as_slice(),
            [Token::Open { attrs: r#"div text="a } b""#, self_closing: true, .. }]
        ));
    }

    #[test]
    fn test_slash_inside_unquoted_value() {
        let tokens = tokenize("{@link url=/about/}x{/link}").expect("lex");
        assert_eq!(
            tokens,
            vec![
                Token::Open {
                    name: "link",
                    attrs: "url=/about/",
                    self_closing: false,
                    start: 0,
                    end: 19
                },
                Token::Text {
                    text: "x",
                    offset: 19
                },
                Token::Close {
                    name: "link",
                    start: 20,
                    end: 27
                },
            ]
        );
    }

    #[test]
    fn test_self_closing_forms() {
        for (source, attrs) in [
            ("{@br/}", ""),
            ("{@br /}", ""),
            ("{@link url=/about/ /}", "url=/about/"),
            (r#"{@link url="/about/"/}"#, r#"url="/about/""#),
        ] {
            let tokens = tokenize(source).expect("lex");
            assert!(
                matches!(
                    tokens.as_slice(),
                    [Token::Open { attrs: a, self_closing: true, .. }] if *a == attrs
                ),
                "{source}: {tokens:?}"
            );
        }
    }

    #[test]
    fn test_unterminated_tag() {
        let err = tokenize("text {@content").expect_err("must fail");
        assert_eq!(err.offset, 5);

        let err = tokenize(r#"{@tag a="open}"#).expect_err("must fail");
        assert!(err.message.contains("quoted"));
    }

    #[test]
    fn test_invalid_character_after_name() {
        let err = tokenize("{@echo.x}").expect_err("must fail");
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_line_index() {
        let source = "ab\ncdé\nf";
        let index = LineIndex::new(source);
        assert_eq!(index.pos(0).line, 1);
        assert_eq!(index.pos(3).line, 2);
        assert_eq!(index.pos(3).column, 1);
        let pos = index.pos(source.len() - 1);
        assert_eq!((pos.line, pos.column), (3, 1));
        let after_accent = index.pos(7);
        assert_eq!((after_accent.line, after_accent.column), (2, 4));
    }
}
