//! Statement validation module.
//!
//! Classifies raw query text as an acceptable single read-only selection or
//! a rejection with a reason code. Pure functions over a token stream; no
//! I/O, no side effects, and the accepted statement text is never rewritten
//! beyond trimming and dropping at most one trailing terminator.

mod tokenizer;

pub use tokenizer::{tokenize, Token, TokenKind};

use std::fmt;

/// Default maximum statement length in bytes.
pub const DEFAULT_MAX_STATEMENT_BYTES: usize = 64 * 1024;

/// Leading keywords accepted as read-only selections.
const ALLOWED_LEADING: &[&str] = &["SELECT", "WITH", "VALUES"];

/// Keywords that indicate state mutation anywhere in the token stream.
///
/// These cannot legitimately appear as bare words inside a read-only
/// selection (identifiers that merely resemble them tokenize as
/// identifiers), so any match rejects the statement.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "MERGE", "CREATE", "DROP", "ALTER", "TRUNCATE", "GRANT",
    "REVOKE", "UNLOAD", "MSCK", "CALL", "VACUUM",
];

/// Reason codes for rejected statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Input is empty, whitespace, or comments only.
    EmptyStatement,
    /// More than one top-level statement separator.
    MultiStatementNotAllowed,
    /// Leading keyword is not a read-only selection.
    ForbiddenStatementType,
    /// A mutating keyword appears inside the statement.
    ForbiddenEmbeddedOperation,
    /// Statement exceeds the configured maximum length.
    StatementTooLarge,
}

impl RejectReason {
    /// Returns the stable reason code string used in error messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyStatement => "EmptyStatement",
            Self::MultiStatementNotAllowed => "MultiStatementNotAllowed",
            Self::ForbiddenStatementType => "ForbiddenStatementType",
            Self::ForbiddenEmbeddedOperation => "ForbiddenEmbeddedOperation",
            Self::StatementTooLarge => "StatementTooLarge",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Normalized leading-keyword tag of an accepted statement, used for
/// logging and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    With,
    Values,
}

impl StatementKind {
    fn from_leading(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("SELECT") {
            Some(Self::Select)
        } else if word.eq_ignore_ascii_case("WITH") {
            Some(Self::With)
        } else if word.eq_ignore_ascii_case("VALUES") {
            Some(Self::Values)
        } else {
            None
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::With => write!(f, "WITH"),
            Self::Values => write!(f, "VALUES"),
        }
    }
}

/// Result of validating one statement. Produced once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Statement is a single read-only selection. `statement` is the input
    /// minus surrounding whitespace and at most one trailing `;`.
    Accepted {
        statement: String,
        kind: StatementKind,
    },
    /// Statement was rejected and must not reach the engine.
    Rejected {
        reason: RejectReason,
        message: String,
    },
}

impl Validation {
    fn rejected(reason: RejectReason, message: impl Into<String>) -> Self {
        Self::Rejected {
            reason,
            message: message.into(),
        }
    }

    /// Returns true if the statement was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Statement validator with a configurable length limit.
#[derive(Debug, Clone, Copy)]
pub struct StatementValidator {
    max_statement_bytes: usize,
}

impl Default for StatementValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STATEMENT_BYTES)
    }
}

impl StatementValidator {
    /// Creates a validator with the given maximum statement length.
    pub fn new(max_statement_bytes: usize) -> Self {
        Self {
            max_statement_bytes,
        }
    }

    /// Classifies `raw` as accepted or rejected.
    pub fn validate(&self, raw: &str) -> Validation {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Validation::rejected(RejectReason::EmptyStatement, "statement is empty");
        }

        if trimmed.len() > self.max_statement_bytes {
            return Validation::rejected(
                RejectReason::StatementTooLarge,
                format!(
                    "statement is {} bytes, maximum is {}",
                    trimmed.len(),
                    self.max_statement_bytes
                ),
            );
        }

        let tokens = tokenize(trimmed);
        let significant: Vec<&Token<'_>> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();

        if significant.is_empty() {
            return Validation::rejected(
                RejectReason::EmptyStatement,
                "statement contains only comments",
            );
        }

        // At most one trailing terminator is allowed; drop it from both the
        // token view and the accepted text.
        let (significant, statement_end) = match significant.split_last() {
            Some((last, head)) if last.is_punct(';') => (head, last.offset),
            _ => (&significant[..], trimmed.len()),
        };

        if significant.is_empty() {
            return Validation::rejected(RejectReason::EmptyStatement, "statement is empty");
        }

        if significant.iter().any(|t| t.is_punct(';')) {
            return Validation::rejected(
                RejectReason::MultiStatementNotAllowed,
                "only a single statement is allowed per request",
            );
        }

        // Leading keyword, skipping parentheses so that set operations over
        // parenthesized selections classify correctly.
        let leading = significant.iter().find(|t| !t.is_punct('('));
        let kind = match leading {
            Some(token) if token.kind == TokenKind::Keyword => {
                match StatementKind::from_leading(token.text) {
                    Some(kind) => kind,
                    None => {
                        return Validation::rejected(
                            RejectReason::ForbiddenStatementType,
                            format!(
                                "leading keyword {} is not a read-only selection",
                                token.text.to_ascii_uppercase()
                            ),
                        )
                    }
                }
            }
            Some(token) => {
                return Validation::rejected(
                    RejectReason::ForbiddenStatementType,
                    format!("statement does not start with a known keyword: {}", token.text),
                )
            }
            None => {
                return Validation::rejected(
                    RejectReason::ForbiddenStatementType,
                    "statement has no leading keyword",
                )
            }
        };

        // Embedded mutating keywords reject even a nominally read-only
        // statement (e.g. a CTE wrapping a DELETE).
        for token in significant {
            if token.kind != TokenKind::Keyword {
                continue;
            }
            if let Some(forbidden) = FORBIDDEN_KEYWORDS
                .iter()
                .find(|kw| token.text.eq_ignore_ascii_case(kw))
            {
                return Validation::rejected(
                    RejectReason::ForbiddenEmbeddedOperation,
                    format!("statement contains forbidden keyword {forbidden}"),
                );
            }
        }

        Validation::Accepted {
            statement: trimmed[..statement_end].trim_end().to_string(),
            kind,
        }
    }
}

/// Convenience function to validate with the default length limit.
pub fn validate_sql(sql: &str) -> Validation {
    StatementValidator::default().validate(sql)
}
