//! Quote- and comment-aware SQL tokenizer.
//!
//! Produces a flat token stream with just enough lexical structure to
//! classify a statement: keywords, identifiers, string literals, comments,
//! numbers, and punctuation. Separators inside string literals or comments
//! must never be mistaken for statement boundaries, which is why this is a
//! small hand-written lexer rather than substring search.

/// The lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare word matching a known SQL keyword (case-insensitive).
    Keyword,
    /// A bare word or quoted name that is not a known keyword.
    Identifier,
    /// A single-quoted string literal, including the quotes.
    StringLiteral,
    /// A `--` line comment or `/* */` block comment.
    Comment,
    /// A numeric literal.
    Number,
    /// Any other single character (`;`, `(`, `,`, operators, ...).
    Punctuation,
}

/// One token sliced out of the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The token text, borrowed from the input.
    pub text: &'a str,
    /// Byte offset of the token start within the input.
    pub offset: usize,
}

impl Token<'_> {
    /// Returns true for a bare word token equal to `keyword`
    /// (case-insensitive). `keyword` must be uppercase.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Returns true for a punctuation token equal to `ch`.
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punctuation && self.text.len() == ch.len_utf8() && {
            let mut buf = [0u8; 4];
            self.text == ch.encode_utf8(&mut buf)
        }
    }
}

/// SQL words the tokenizer classifies as keywords.
///
/// This is not the full reserved-word list of any dialect; it only needs to
/// cover the words the classification rules look at, plus common query
/// vocabulary so that keyword tokens read sensibly in logs.
const KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "VALUES", "FROM", "WHERE", "GROUP", "ORDER", "BY", "HAVING", "LIMIT",
    "OFFSET", "UNION", "INTERSECT", "EXCEPT", "ALL", "DISTINCT", "AS", "JOIN", "INNER", "LEFT",
    "RIGHT", "FULL", "OUTER", "CROSS", "ON", "USING", "AND", "OR", "NOT", "IN", "EXISTS",
    "BETWEEN", "LIKE", "IS", "NULL", "CASE", "WHEN", "THEN", "ELSE", "END", "CAST", "ASC",
    "DESC", "RECURSIVE", "INSERT", "UPDATE", "DELETE", "MERGE", "CREATE", "DROP", "ALTER",
    "TRUNCATE", "GRANT", "REVOKE", "UNLOAD", "MSCK", "CALL", "VACUUM", "SET", "USE", "SHOW",
    "DESCRIBE", "EXPLAIN", "PREPARE", "EXECUTE", "TABLE", "INTO",
];

fn is_known_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|kw| word.eq_ignore_ascii_case(kw))
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Tokenizes `input` into a flat token stream.
///
/// Whitespace is skipped; everything else, comments included, is returned as
/// a token. Unterminated strings and block comments extend to the end of the
/// input rather than failing: the tokenizer classifies, it does not validate
/// syntax.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let c = rest.chars().next().unwrap_or('\0');

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        let start = pos;

        // Line comment: -- to end of line
        if rest.starts_with("--") {
            let len = rest.find('\n').unwrap_or(rest.len());
            pos += len;
            tokens.push(Token {
                kind: TokenKind::Comment,
                text: &input[start..pos],
                offset: start,
            });
            continue;
        }

        // Block comment: /* ... */, nesting allowed
        if rest.starts_with("/*") {
            let mut depth = 1usize;
            let mut i = 2;
            while i < rest.len() && depth > 0 {
                if rest[i..].starts_with("/*") {
                    depth += 1;
                    i += 2;
                } else if rest[i..].starts_with("*/") {
                    depth -= 1;
                    i += 2;
                } else {
                    i += rest[i..].chars().next().map_or(1, char::len_utf8);
                }
            }
            pos += i;
            tokens.push(Token {
                kind: TokenKind::Comment,
                text: &input[start..pos],
                offset: start,
            });
            continue;
        }

        // Single-quoted string literal with '' escape
        if c == '\'' {
            pos += scan_quoted(rest, '\'');
            tokens.push(Token {
                kind: TokenKind::StringLiteral,
                text: &input[start..pos],
                offset: start,
            });
            continue;
        }

        // Double-quoted or backquoted identifier
        if c == '"' || c == '`' {
            pos += scan_quoted(rest, c);
            tokens.push(Token {
                kind: TokenKind::Identifier,
                text: &input[start..pos],
                offset: start,
            });
            continue;
        }

        // Bare word: keyword or identifier
        if is_word_start(c) {
            let mut end = pos;
            while end < input.len() {
                let ch = input[end..].chars().next().unwrap_or('\0');
                if !is_word_continue(ch) {
                    break;
                }
                end += ch.len_utf8();
            }
            let text = &input[pos..end];
            let kind = if is_known_keyword(text) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token {
                kind,
                text,
                offset: start,
            });
            pos = end;
            continue;
        }

        // Numeric literal (digits, optional fraction/exponent punctuation is
        // left to the punctuation path; good enough for classification)
        if c.is_ascii_digit() {
            let mut end = pos;
            while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
                end += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text: &input[pos..end],
                offset: start,
            });
            pos = end;
            continue;
        }

        // Everything else: one punctuation character
        pos += c.len_utf8();
        tokens.push(Token {
            kind: TokenKind::Punctuation,
            text: &input[start..pos],
            offset: start,
        });
    }

    tokens
}

/// Scans a quoted region starting at `rest[0] == quote`, honoring the
/// doubled-quote escape. Returns the byte length consumed, including both
/// quotes. An unterminated region consumes the remainder of the input.
fn scan_quoted(rest: &str, quote: char) -> usize {
    let qlen = quote.len_utf8();
    let mut i = qlen;
    while i < rest.len() {
        let c = rest[i..].chars().next().unwrap_or('\0');
        if c == quote {
            // Doubled quote is an escaped quote, not a terminator
            if rest[i + qlen..].starts_with(quote) {
                i += qlen * 2;
                continue;
            }
            return i + qlen;
        }
        i += c.len_utf8();
    }
    rest.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql).iter().map(|t| t.kind).collect()
    }

    fn texts(sql: &str) -> Vec<String> {
        tokenize(sql).iter().map(|t| t.text.to_string()).collect()
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            kinds("SELECT 1"),
            vec![TokenKind::Keyword, TokenKind::Number]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = tokenize("select * from Listings");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert!(tokens[0].is_keyword("SELECT"));
        assert_eq!(tokens[2].kind, TokenKind::Keyword);
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_identifier_resembling_keyword_is_not_keyword() {
        let tokens = tokenize("SELECT selected_table FROM deleted_rows");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].text, "selected_table");
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].text, "deleted_rows");
    }

    #[test]
    fn test_string_literal_hides_separator() {
        let tokens = tokenize("SELECT 'a;b' AS v");
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[1].text, "'a;b'");
        assert!(tokens.iter().all(|t| !t.is_punct(';')));
    }

    #[test]
    fn test_string_literal_escaped_quote() {
        let tokens = tokenize("SELECT 'it''s'");
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[1].text, "'it''s'");
    }

    #[test]
    fn test_line_comment() {
        let tokens = tokenize("SELECT 1 -- trailing; note\n");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].kind, TokenKind::Comment);
        assert!(tokens.iter().all(|t| !t.is_punct(';')));
    }

    #[test]
    fn test_block_comment() {
        let tokens = tokenize("/* head */ SELECT /* drop table */ 1");
        assert_eq!(
            kinds("/* head */ SELECT /* drop table */ 1"),
            vec![
                TokenKind::Comment,
                TokenKind::Keyword,
                TokenKind::Comment,
                TokenKind::Number
            ]
        );
        assert_eq!(tokens[2].text, "/* drop table */");
    }

    #[test]
    fn test_nested_block_comment() {
        let tokens = tokenize("/* a /* b */ c */ SELECT 1");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text, "/* a /* b */ c */");
        assert!(tokens[1].is_keyword("SELECT"));
    }

    #[test]
    fn test_quoted_identifier() {
        let tokens = tokenize(r#"SELECT "weird;name" FROM t"#);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].text, r#""weird;name""#);
    }

    #[test]
    fn test_backquoted_identifier() {
        let tokens = tokenize("SELECT `col` FROM `tab`");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].text, "`col`");
    }

    #[test]
    fn test_punctuation_and_offsets() {
        let tokens = tokenize("SELECT a, b;");
        let semi = tokens.last().unwrap();
        assert!(semi.is_punct(';'));
        assert_eq!(semi.offset, 11);
    }

    #[test]
    fn test_unterminated_string_consumes_rest() {
        let tokens = tokenize("SELECT 'open");
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[1].text, "'open");
    }

    #[test]
    fn test_unterminated_block_comment_consumes_rest() {
        let tokens = tokenize("SELECT 1 /* open");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Comment);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t  ").is_empty());
    }

    #[test]
    fn test_texts_roundtrip_order() {
        assert_eq!(
            texts("SELECT x FROM t WHERE x > 10"),
            vec!["SELECT", "x", "FROM", "t", "WHERE", "x", ">", "10"]
        );
    }
}
