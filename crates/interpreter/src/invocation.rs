use crate::binder::{bind, Defaults, SlotSet};
use crate::mention::{resolve_mentions, MentionMap};
use crate::rewrite::rewrite;
use crate::token::tokenize;
use crate::value::Value;

/// One parsed command message: its resolved mentions and folded values, with
/// a cursor over the verbs consumed so far.
#[derive(Debug, Clone)]
pub struct Invocation<U, R> {
    mentions: MentionMap<U, R>,
    values: Vec<Value>,
    position: usize,
}

impl<U: Clone, R: Clone> Invocation<U, R> {
    /// Parses `content` when it starts with `prefix`.
    ///
    /// Mentions are resolved over the whole content, so the counters line up
    /// with the platform lists even if the prefix itself contains a mention.
    pub fn parse(content: &str, prefix: &str, users: &[U], roles: &[R]) -> Option<Self> {
        let body = content.strip_prefix(prefix)?;
        let mentions = resolve_mentions(content, users, roles);
        let values = rewrite(tokenize(body));
        log::debug!(
            "parsed command: {} values, {} mentions",
            values.len(),
            mentions.len()
        );
        Some(Self {
            mentions,
            values,
            position: 0,
        })
    }
}

impl<U, R> Invocation<U, R> {
    pub fn mentions(&self) -> &MentionMap<U, R> {
        &self.mentions
    }

    pub fn mentions_mut(&mut self) -> &mut MentionMap<U, R> {
        &mut self.mentions
    }

    /// The next unconsumed value, when it is a plain scalar.
    pub fn peek_verb(&self) -> Option<&str> {
        self.values.get(self.position).and_then(Value::as_scalar)
    }

    /// Consumes the next value if it is the scalar `verb`.
    pub fn check(&mut self, verb: &str) -> bool {
        if self.peek_verb() == Some(verb) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Values after the consumed verbs.
    pub fn rest(&self) -> &[Value] {
        &self.values[self.position..]
    }

    pub fn bind<S: AsRef<str>>(&self, params: &[S], defaults: &Defaults) -> SlotSet {
        bind(self.rest(), params, defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct User(u64);

    #[derive(Debug, Clone, PartialEq)]
    struct Role(u64);

    #[test]
    fn end_to_end_xp_add() {
        let mut invocation: Invocation<User, Role> =
            Invocation::parse("!xp add <@!42> 10", "!", &[User(42)], &[]).expect("prefixed");
        assert_eq!(
            invocation.rest(),
            &[
                Value::scalar("xp"),
                Value::scalar("add"),
                Value::scalar("<@!42>"),
                Value::scalar("10"),
            ]
        );

        assert!(invocation.check("xp"));
        assert!(!invocation.check("set"));
        assert!(invocation.check("add"));

        let arguments = invocation
            .bind(&["member", "amount"], &Defaults::new())
            .into_arguments()
            .expect("bound");
        assert_eq!(arguments.scalar("member"), Ok("<@!42>"));
        assert_eq!(arguments.scalar("amount"), Ok("10"));
        assert_eq!(invocation.mentions().user("<@!42>"), Some(&User(42)));
    }

    #[test]
    fn missing_prefix_is_not_a_command() {
        let invocation: Option<Invocation<User, Role>> =
            Invocation::parse("xp add", "!", &[], &[]);
        assert!(invocation.is_none());
    }

    #[test]
    fn multi_character_prefix() {
        let mut invocation: Invocation<User, Role> =
            Invocation::parse("bot> stats", "bot>", &[], &[]).expect("prefixed");
        assert!(invocation.check("stats"));
        assert!(invocation.rest().is_empty());
    }

    #[test]
    fn keyword_arguments_through_the_pipeline() {
        let mut invocation: Invocation<User, Role> = Invocation::parse(
            "!xp set amount = 3 member = <@7>",
            "!",
            &[User(7)],
            &[],
        )
        .expect("prefixed");
        assert!(invocation.check("xp") && invocation.check("set"));
        let arguments = invocation
            .bind(&["member", "amount"], &Defaults::new())
            .into_arguments()
            .expect("bound");
        assert_eq!(arguments.scalar("member"), Ok("<@7>"));
        assert_eq!(arguments.scalar("amount"), Ok("3"));
    }

    #[test]
    fn list_value_is_not_a_verb() {
        let mut invocation: Invocation<User, Role> =
            Invocation::parse("!a + b", "!", &[], &[]).expect("prefixed");
        assert_eq!(invocation.peek_verb(), None);
        assert!(!invocation.check("a"));
    }
}
