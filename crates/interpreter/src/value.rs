use std::fmt;

use indexmap::IndexMap;

use crate::token::Token;

/// A folded argument value.
///
/// Lists and maps hold scalars only; the grammar never nests them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
    Map(IndexMap<String, String>),
}

impl Value {
    pub fn scalar(text: impl Into<String>) -> Self {
        Self::Scalar(text.into())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// The scalar itself, or every list item in order. Maps yield nothing.
    pub fn scalars(&self) -> Vec<&str> {
        match self {
            Self::Scalar(text) => vec![text.as_str()],
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Map(_) => Vec::new(),
        }
    }
}

impl From<Token> for Value {
    /// Words and phrases become scalars; a marker becomes its literal text.
    fn from(token: Token) -> Self {
        match token {
            Token::Word(text) | Token::Phrase(text) => Self::Scalar(text),
            Token::Equals => Self::scalar("="),
            Token::Plus => Self::scalar("+"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(text) => f.write_str(text),
            Self::List(items) => f.write_str(&items.join(" + ")),
            Self::Map(map) => {
                let pairs = map
                    .iter()
                    .map(|(key, value)| format!("{key} = {value}"))
                    .collect::<Vec<_>>();
                f.write_str(&pairs.join(" "))
            }
        }
    }
}
