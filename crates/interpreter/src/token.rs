//! Command tokenizer.

use std::fmt;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A whitespace-delimited run of plain text.
    Word(String),
    /// The verbatim contents of a quoted section, quotes stripped.
    Phrase(String),
    Equals,
    Plus,
}

/// Renders the token back into source form. Phrases are wrapped in `"`, or in
/// `'` when they contain a double quote.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(text) => f.write_str(text),
            Self::Phrase(text) if text.contains('"') => write!(f, "'{text}'"),
            Self::Phrase(text) => write!(f, "\"{text}\""),
            Self::Equals => f.write_str("="),
            Self::Plus => f.write_str("+"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Splits command text into words, quoted phrases and the `=` / `+` markers.
///
/// Plain text is only split on whitespace when a quote or marker is reached,
/// or at the end of input. A quote without its closing partner degrades to
/// plain text: everything from the opening quote on is whitespace-split.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut segment_start = 0usize;
    let mut open_quote: Option<(char, usize)> = None;

    for (cursor, ch) in text.char_indices() {
        match open_quote {
            None => match ch {
                '\'' | '"' => {
                    flush_words(&mut tokens, &text[segment_start..cursor]);
                    open_quote = Some((ch, cursor));
                    segment_start = cursor + ch.len_utf8();
                }
                '=' | '+' => {
                    flush_words(&mut tokens, &text[segment_start..cursor]);
                    tokens.push(if ch == '=' { Token::Equals } else { Token::Plus });
                    segment_start = cursor + ch.len_utf8();
                }
                _ => {}
            },
            Some((quote, _)) if ch == quote => {
                tokens.push(Token::Phrase(text[segment_start..cursor].to_string()));
                open_quote = None;
                segment_start = cursor + ch.len_utf8();
            }
            Some(_) => {}
        }
    }

    match open_quote {
        Some((_, opened_at)) => flush_words(&mut tokens, &text[opened_at..]),
        None => flush_words(&mut tokens, &text[segment_start..]),
    }

    tokens
}

fn flush_words(tokens: &mut Vec<Token>, plain: &str) {
    tokens.extend(
        plain
            .split_whitespace()
            .map(|word| Token::Word(word.to_string())),
    );
}
