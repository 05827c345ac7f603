//! Mention resolution.
//!
//! The platform attaches already-resolved user and role objects to a message,
//! in the order their mentions appear. This module finds the textual mention
//! forms in the raw content and pairs each one with the matching object.

use indexmap::IndexMap;

const USER_NICKNAME_PREFIX: &str = "<@!";
const USER_PREFIX: &str = "<@";
const ROLE_PREFIX: &str = "<@&";
const MENTION_CLOSE: char = '>';

// ---------------------------------------------------------------------------
// Mention kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MentionKind {
    User,
    Role,
}

impl MentionKind {
    /// Classifies a complete mention surface form such as `<@!42>` or `<@&7>`.
    ///
    /// Returns `None` for anything that is not exactly one well-formed mention.
    pub fn of(text: &str) -> Option<Self> {
        let whole = |candidate: &str| candidate.len() == text.len();
        if match_mention(text, 0, ROLE_PREFIX).is_some_and(whole) {
            Some(Self::Role)
        } else if match_user_mention(text, 0).is_some_and(whole) {
            Some(Self::User)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference<U, R> {
    User(U),
    Role(R),
}

// ---------------------------------------------------------------------------
// Mention map
// ---------------------------------------------------------------------------

/// Surface text of each mention found in a message, paired with what it refers to.
///
/// A mention present in the text but absent from the map was not resolved;
/// consumers must treat that as "mentioned but unknown".
#[derive(Debug, Clone, PartialEq)]
pub struct MentionMap<U, R> {
    entries: IndexMap<String, Reference<U, R>>,
}

impl<U, R> Default for MentionMap<U, R> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<U, R> MentionMap<U, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mention: &str) -> Option<&Reference<U, R>> {
        self.entries.get(mention)
    }

    pub fn user(&self, mention: &str) -> Option<&U> {
        match self.entries.get(mention) {
            Some(Reference::User(user)) => Some(user),
            _ => None,
        }
    }

    pub fn role(&self, mention: &str) -> Option<&R> {
        match self.entries.get(mention) {
            Some(Reference::Role(role)) => Some(role),
            _ => None,
        }
    }

    /// Records a pairing, replacing any earlier one for the same text.
    pub fn insert(&mut self, mention: impl Into<String>, reference: Reference<U, R>) {
        self.entries.insert(mention.into(), reference);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Scans `text` left to right and pairs the Nth user mention with `users[N]`
/// and the Nth role mention with `roles[N]`.
///
/// Mentions beyond the end of the platform lists stay unresolved. A surface
/// text seen twice still consumes a reference, but keeps its first pairing.
pub fn resolve_mentions<U: Clone, R: Clone>(
    text: &str,
    users: &[U],
    roles: &[R],
) -> MentionMap<U, R> {
    let mut mentions = MentionMap::new();
    let mut next_user = 0usize;
    let mut next_role = 0usize;

    for (cursor, _) in text.char_indices() {
        if let Some(mention) = match_user_mention(text, cursor) {
            match users.get(next_user) {
                Some(user) => {
                    record(&mut mentions, mention, Reference::User(user.clone()));
                    next_user += 1;
                }
                None => log::trace!("unresolved user mention {mention} at byte {cursor}"),
            }
        }
        if let Some(mention) = match_mention(text, cursor, ROLE_PREFIX) {
            match roles.get(next_role) {
                Some(role) => {
                    record(&mut mentions, mention, Reference::Role(role.clone()));
                    next_role += 1;
                }
                None => log::trace!("unresolved role mention {mention} at byte {cursor}"),
            }
        }
    }

    mentions
}

fn record<U, R>(mentions: &mut MentionMap<U, R>, mention: &str, reference: Reference<U, R>) {
    mentions
        .entries
        .entry(mention.to_string())
        .or_insert(reference);
}

/// `<@!digits>`, or `<@digits>` when that is not really a role mention.
fn match_user_mention(text: &str, start: usize) -> Option<&str> {
    match_mention(text, start, USER_NICKNAME_PREFIX).or_else(|| {
        match_mention(text, start, USER_PREFIX).filter(|mention| !mention.starts_with(ROLE_PREFIX))
    })
}

/// Matches `prefix`, then one or more ASCII digits up to the first `>` after it.
fn match_mention<'a>(text: &'a str, start: usize, prefix: &str) -> Option<&'a str> {
    let rest = text.get(start..)?;
    let inner = rest.strip_prefix(prefix)?;
    let close = inner.find(MENTION_CLOSE)?;
    let digits = &inner[..close];
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(&rest[..prefix.len() + close + MENTION_CLOSE.len_utf8()])
}
