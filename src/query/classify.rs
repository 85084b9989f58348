//! Distinguishes SQL from natural-language questions.
//!
//! Only the leading keyword is inspected, using the sqlparser tokenizer so
//! comments and opening parentheses are skipped. The statement itself is
//! never parsed; Athena is the judge of SQL validity.

use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::fmt;

/// How a `run_query` input should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Starts with a read statement keyword; sent to the service.
    Sql(LeadingKeyword),
    /// Anything else; answered with schema guidance instead.
    NaturalLanguage,
}

/// Statement keywords accepted as the start of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadingKeyword {
    Select,
    With,
    Show,
    Describe,
    Explain,
    Values,
}

impl LeadingKeyword {
    fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::SELECT => Some(Self::Select),
            Keyword::WITH => Some(Self::With),
            Keyword::SHOW => Some(Self::Show),
            Keyword::DESCRIBE => Some(Self::Describe),
            Keyword::EXPLAIN => Some(Self::Explain),
            Keyword::VALUES => Some(Self::Values),
            _ => None,
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::Select),
            "WITH" => Some(Self::With),
            "SHOW" => Some(Self::Show),
            "DESCRIBE" => Some(Self::Describe),
            "EXPLAIN" => Some(Self::Explain),
            "VALUES" => Some(Self::Values),
            _ => None,
        }
    }
}

impl fmt::Display for LeadingKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Select => "SELECT",
            Self::With => "WITH",
            Self::Show => "SHOW",
            Self::Describe => "DESCRIBE",
            Self::Explain => "EXPLAIN",
            Self::Values => "VALUES",
        };
        f.write_str(s)
    }
}

/// Classifies a `run_query` input by its first meaningful token.
pub fn classify_input(input: &str) -> InputKind {
    let dialect = GenericDialect {};
    let leading = match Tokenizer::new(&dialect, input).tokenize() {
        Ok(tokens) => tokens
            .into_iter()
            .find(|t| !matches!(t, Token::Whitespace(_) | Token::LParen))
            .and_then(|t| match t {
                Token::Word(word) => LeadingKeyword::from_keyword(word.keyword),
                _ => None,
            }),
        // Questions such as "what's the busiest zone?" do not tokenize;
        // fall back to the first bare word.
        Err(_) => input
            .split_whitespace()
            .next()
            .map(|w| w.trim_start_matches('('))
            .and_then(LeadingKeyword::from_word),
    };

    match leading {
        Some(keyword) => InputKind::Sql(keyword),
        None => InputKind::NaturalLanguage,
    }
}

/// Convenience predicate over [`classify_input`].
pub fn looks_like_sql(input: &str) -> bool {
    matches!(classify_input(input), InputKind::Sql(_))
}
