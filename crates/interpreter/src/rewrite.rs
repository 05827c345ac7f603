//! Token-stream rewriting.
//!
//! Two left-to-right passes over the token list. The first folds `a + b + c`
//! into one list value, the second folds `key = value` runs into maps, merging
//! a pair into the map directly before its key. Each pass builds a new
//! sequence, so folding never shifts indices under a live cursor.

use indexmap::IndexMap;

use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Equals,
    Plus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Value(Value),
    Marker(Marker),
}

impl Item {
    fn is_scalar(&self) -> bool {
        matches!(self, Self::Value(Value::Scalar(_)))
    }

    fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Marker(Marker::Equals) => Value::from(Token::Equals),
            Self::Marker(Marker::Plus) => Value::from(Token::Plus),
        }
    }
}

impl From<Token> for Item {
    fn from(token: Token) -> Self {
        match token {
            Token::Equals => Self::Marker(Marker::Equals),
            Token::Plus => Self::Marker(Marker::Plus),
            other => Self::Value(Value::from(other)),
        }
    }
}

/// Folds lists, then maps. Markers that could not be folded are kept as the
/// scalars `"+"` and `"="`.
pub fn rewrite(tokens: Vec<Token>) -> Vec<Value> {
    let items = tokens.into_iter().map(Item::from).collect();
    let items = fold_maps(fold_lists(items));
    items.into_iter().map(Item::into_value).collect()
}

fn fold_lists(items: Vec<Item>) -> Vec<Item> {
    let mut folded: Vec<Item> = Vec::with_capacity(items.len());
    let mut items = items.into_iter().peekable();

    while let Some(item) = items.next() {
        if item != Item::Marker(Marker::Plus) {
            folded.push(item);
            continue;
        }

        match (folded.pop(), items.next_if(Item::is_scalar)) {
            (Some(Item::Value(Value::List(mut list))), Some(Item::Value(Value::Scalar(next)))) => {
                list.push(next);
                folded.push(Item::Value(Value::List(list)));
            }
            (Some(Item::Value(Value::Scalar(previous))), Some(Item::Value(Value::Scalar(next)))) => {
                folded.push(Item::Value(Value::List(vec![previous, next])));
            }
            (previous, next) => {
                log::trace!("leaving `+` unfolded");
                folded.extend(previous);
                folded.push(item);
                folded.extend(next);
            }
        }
    }

    folded
}

fn fold_maps(items: Vec<Item>) -> Vec<Item> {
    let mut folded: Vec<Item> = Vec::with_capacity(items.len());
    let mut items = items.into_iter().peekable();

    while let Some(item) = items.next() {
        if item != Item::Marker(Marker::Equals) {
            folded.push(item);
            continue;
        }

        match (folded.pop(), items.next_if(Item::is_scalar)) {
            (Some(Item::Value(Value::Scalar(key))), Some(Item::Value(Value::Scalar(value)))) => {
                match folded.last_mut() {
                    Some(Item::Value(Value::Map(map))) => {
                        map.insert(key, value);
                    }
                    _ => {
                        let mut map = IndexMap::new();
                        map.insert(key, value);
                        folded.push(Item::Value(Value::Map(map)));
                    }
                }
            }
            (previous, next) => {
                log::trace!("leaving `=` unfolded");
                folded.extend(previous);
                folded.push(item);
                folded.extend(next);
            }
        }
    }

    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn scalar(text: &str) -> Value {
        Value::scalar(text)
    }

    fn list(items: &[&str]) -> Value {
        Value::List(items.iter().map(|item| item.to_string()).collect())
    }

    fn map(pairs: &[(&str, &str)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    fn words(items: &[&str]) -> Vec<Token> {
        items
            .iter()
            .map(|item| match *item {
                "=" => Token::Equals,
                "+" => Token::Plus,
                other => Token::Word(other.to_string()),
            })
            .collect()
    }

    #[test]
    fn folds_plus_chain_into_one_list() {
        assert_eq!(rewrite(words(&["a", "+", "b", "+", "c"])), vec![list(&["a", "b", "c"])]);
    }

    #[test]
    fn folds_repeated_keys_into_one_map() {
        assert_eq!(
            rewrite(words(&["x", "=", "1", "y", "=", "2"])),
            vec![map(&[("x", "1"), ("y", "2")])]
        );
    }

    #[test]
    fn later_key_overwrites() {
        assert_eq!(
            rewrite(words(&["x", "=", "1", "x", "=", "2"])),
            vec![map(&[("x", "2")])]
        );
    }

    #[test]
    fn positional_between_pairs_starts_a_new_map() {
        assert_eq!(
            rewrite(words(&["x", "=", "1", "p", "y", "=", "2"])),
            vec![map(&[("x", "1")]), scalar("p"), map(&[("y", "2")])]
        );
    }

    #[test]
    fn lists_and_scalars_mix() {
        assert_eq!(
            rewrite(words(&["add", "a", "+", "b", "c"])),
            vec![scalar("add"), list(&["a", "b"]), scalar("c")]
        );
    }

    #[test]
    fn degenerate_markers_stay_unfolded() {
        assert_eq!(rewrite(words(&["+", "a"])), vec![scalar("+"), scalar("a")]);
        assert_eq!(rewrite(words(&["a", "+"])), vec![scalar("a"), scalar("+")]);
        assert_eq!(rewrite(words(&["=", "a"])), vec![scalar("="), scalar("a")]);
        assert_eq!(rewrite(words(&["a", "="])), vec![scalar("a"), scalar("=")]);
        assert_eq!(
            rewrite(words(&["a", "+", "+", "b"])),
            vec![scalar("a"), scalar("+"), scalar("+"), scalar("b")]
        );
    }

    #[test]
    fn list_is_not_a_map_value() {
        assert_eq!(
            rewrite(words(&["k", "=", "a", "+", "b"])),
            vec![scalar("k"), scalar("="), list(&["a", "b"])]
        );
    }

    #[test]
    fn quoted_markers_are_plain_values() {
        assert_eq!(
            rewrite(tokenize(r#"a "+" b k = "=""#)),
            vec![scalar("a"), scalar("+"), scalar("b"), map(&[("k", "=")])]
        );
    }

    #[test]
    fn empty_stream() {
        assert!(rewrite(Vec::new()).is_empty());
    }
}
