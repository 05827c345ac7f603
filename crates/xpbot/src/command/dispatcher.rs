use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use interpreter::{Arguments, Defaults, Invocation, Reference, Value};

use super::menu::{self, CommandId, CommandSpec, Failure, MenuNode};
use crate::database::Database;
use crate::embed::{Embed, Replies};
use crate::error::{BotError, BotResult};
use crate::platform::{Member, Message, Role, RoleId, SharedPlatform};
use crate::xp::{display_xp, XpManager};

type BotInvocation = Invocation<Member, Role>;

/// Largest amount `xp add` and `xp set` accept.
const MAX_XP_AMOUNT: u64 = 1_000_000_000_000;

struct Context<'a> {
    message: &'a Message,
    prefix: String,
    replies: Replies,
}

#[derive(Debug, Clone, Copy)]
enum TargetUpdate {
    Add,
    Remove,
}

pub struct Commands {
    platform: SharedPlatform,
    database: Arc<Database>,
    xp: Arc<XpManager>,
    embed_color: u32,
}

impl Commands {
    pub fn new(
        platform: SharedPlatform,
        database: Arc<Database>,
        xp: Arc<XpManager>,
        embed_color: u32,
    ) -> Self {
        Self {
            platform,
            database,
            xp,
            embed_color,
        }
    }

    /// Runs the command in `message` if it starts with the guild prefix, then
    /// deletes the message.
    pub async fn run(&self, message: &Message) -> BotResult<()> {
        let prefix = self.database.guild(message.guild_id).await?.prefix;
        let Some(mut invocation) = Invocation::parse(
            &message.content,
            &prefix,
            &message.mentions,
            &message.role_mentions,
        ) else {
            return Ok(());
        };
        // Lets the author default bind like any other member mention.
        invocation.mentions_mut().insert(
            message.author.mention(),
            Reference::User(message.author.clone()),
        );

        let guild_icon = self
            .platform
            .guild_icon_url(message.guild_id)
            .await
            .unwrap_or_else(|error| {
                tracing::warn!("no icon for guild {}: {error}", message.guild_id);
                None
            });
        let context = Context {
            message,
            replies: Replies::new(
                self.embed_color,
                prefix.clone(),
                message.author.clone(),
                guild_icon,
            ),
            prefix,
        };
        let result = self.dispatch(&context, &mut invocation).await;
        let deleted = self
            .platform
            .delete_message(message.channel_id, message.id)
            .await;
        result?;
        deleted
    }

    async fn dispatch(&self, context: &Context<'_>, invocation: &mut BotInvocation) -> BotResult<()> {
        if invocation.check("help") {
            return self.help(context, invocation).await;
        }

        let mut entries = menu::ROOT;
        loop {
            let Some(entry) = invocation
                .peek_verb()
                .and_then(|verb| menu::find(entries, verb))
            else {
                tracing::debug!("no command matches {:?}", context.message.content);
                return Ok(());
            };
            invocation.check(entry.name);
            if entry.admin && !context.message.author.administrator {
                return self.send(context, context.replies.permission_denied()).await;
            }
            match &entry.node {
                MenuNode::Branch(children) => entries = *children,
                MenuNode::Leaf(spec) => return self.execute(context, invocation, spec).await,
            }
        }
    }

    async fn execute(
        &self,
        context: &Context<'_>,
        invocation: &BotInvocation,
        spec: &CommandSpec,
    ) -> BotResult<()> {
        let mut defaults = Defaults::new();
        if let Some(param) = spec.author_default {
            defaults.insert(
                param.to_string(),
                Value::scalar(context.message.author.mention()),
            );
        }

        let outcome = match invocation
            .bind(&spec.param_names(), &defaults)
            .into_arguments()
        {
            Ok(arguments) => {
                self.handle(context, invocation, spec.command, &arguments)
                    .await
            }
            Err(error) => Err(error.into()),
        };

        match outcome {
            Err(BotError::InvalidInput(reason)) => {
                tracing::debug!("{:?} rejected: {reason}", spec.command);
                match spec.failure {
                    Failure::Silent => Ok(()),
                    Failure::SyntaxError => {
                        self.send(context, context.replies.syntax_error()).await
                    }
                }
            }
            other => other,
        }
    }

    async fn handle(
        &self,
        context: &Context<'_>,
        invocation: &BotInvocation,
        command: CommandId,
        arguments: &Arguments,
    ) -> BotResult<()> {
        match command {
            CommandId::Stats => self.stats(context, invocation, arguments).await,
            CommandId::Ranklist => self.ranklist(context).await,
            CommandId::AutorolesSet => self.autoroles_set(context, arguments).await,
            CommandId::AutorolesGet => self.autoroles_get(context).await,
            CommandId::XpAdd => self.xp_add(context, invocation, arguments).await,
            CommandId::XpSet => self.xp_set(context, invocation, arguments).await,
            CommandId::Prefix => self.prefix(context, arguments).await,
            CommandId::RickrollGet => self.rickroll_get(context).await,
            CommandId::RickrollAdd => {
                self.update_rickroll_targets(context, invocation, arguments, TargetUpdate::Add)
                    .await
            }
            CommandId::RickrollRemove => {
                self.update_rickroll_targets(context, invocation, arguments, TargetUpdate::Remove)
                    .await
            }
        }
    }

    async fn send(&self, context: &Context<'_>, embed: Embed) -> BotResult<()> {
        self.platform
            .send_embed(context.message.channel_id, embed)
            .await
    }

    async fn help(&self, context: &Context<'_>, invocation: &mut BotInvocation) -> BotResult<()> {
        let administrator = context.message.author.administrator;
        let mut entries = menu::ROOT;
        let mut path = Vec::new();
        let mut command = None;
        while let Some(entry) = invocation
            .peek_verb()
            .and_then(|verb| menu::find(entries, verb))
        {
            if entry.admin && !administrator {
                break;
            }
            invocation.check(entry.name);
            path.push(entry.name);
            match &entry.node {
                MenuNode::Branch(children) => entries = *children,
                MenuNode::Leaf(spec) => {
                    command = Some(spec);
                    break;
                }
            }
        }

        let path = path.join(" ");
        let reply = match command {
            Some(spec) => context
                .replies
                .command_help(&path, spec.description, spec.params),
            None => {
                let menus: Vec<_> = entries
                    .iter()
                    .filter(|entry| !entry.admin)
                    .map(|entry| entry.name)
                    .collect();
                let admin_menus: Vec<_> = entries
                    .iter()
                    .filter(|entry| entry.admin)
                    .map(|entry| entry.name)
                    .collect();
                context.replies.menu_help(&path, &menus, &admin_menus)
            }
        };
        self.send(context, reply).await
    }

    async fn stats(
        &self,
        context: &Context<'_>,
        invocation: &BotInvocation,
        arguments: &Arguments,
    ) -> BotResult<()> {
        let member = mentioned_member(invocation, arguments, "member")?;
        let xp = self.xp.calculate_xp(&member).await?;
        let reply = context
            .replies
            .member(&member, "Stats", &format!("for {}", member.name))
            .with_field("XP", xp.to_string());
        self.send(context, reply).await
    }

    async fn ranklist(&self, context: &Context<'_>) -> BotResult<()> {
        let guild = context.message.guild_id;
        let document = self.database.guild(guild).await?;

        let mut by_xp: BTreeMap<i64, Vec<Member>> = BTreeMap::new();
        for (user, record) in &document.members {
            let xp = display_xp(record.xp);
            if xp == 0 {
                continue;
            }
            if let Some(member) = self.platform.member(guild, *user).await? {
                by_xp.entry(xp).or_default().push(member);
            }
        }

        let total = by_xp.iter().fold(0i64, |total, (xp, members)| {
            let count = i64::try_from(members.len()).unwrap_or(i64::MAX);
            total.saturating_add(xp.saturating_mul(count))
        });
        let mut reply = context
            .replies
            .guild("Ranklist", "Here is the server-wide ranklist:");
        reply.add_field("Σ", total.to_string(), false);
        let mut rank = 1;
        for (xp, members) in by_xp.iter().rev() {
            for member in members {
                reply.add_field(format!("{rank} - {}", member.name), xp.to_string(), false);
            }
            rank += members.len();
        }
        self.send(context, reply).await
    }

    async fn autoroles_set(&self, context: &Context<'_>, arguments: &Arguments) -> BotResult<()> {
        let guild = context.message.guild_id;
        let data = arguments.scalar("data")?;
        let words: Vec<&str> = data.split_whitespace().collect();

        let mut min_xp_by_mention: HashMap<&str, u64> = HashMap::new();
        if words.len() > 1 {
            for pair in words.chunks(2) {
                let &[min_xp, mention] = pair else {
                    return Err(BotError::InvalidInput(
                        "xp values and roles must come in pairs".to_string(),
                    ));
                };
                if is_whole_number(min_xp) {
                    let min_xp = min_xp.parse().map_err(|error| {
                        BotError::InvalidInput(format!("invalid xp value {min_xp}: {error}"))
                    })?;
                    min_xp_by_mention.insert(mention, min_xp);
                }
            }
        }

        let thresholds: BTreeMap<u64, RoleId> = self
            .platform
            .fetch_roles(guild)
            .await?
            .iter()
            .filter_map(|role| {
                min_xp_by_mention
                    .get(role.mention().as_str())
                    .map(|min_xp| (*min_xp, role.id))
            })
            .collect();
        tracing::info!("guild {guild} now has {} automatic roles", thresholds.len());
        self.database
            .update_guild(guild, |document| document.roles = thresholds)
            .await?;

        let reply = context
            .replies
            .guild("Autoroles set.", "The autoroles have been set successfully.");
        self.send(context, reply).await
    }

    async fn autoroles_get(&self, context: &Context<'_>) -> BotResult<()> {
        let guild = context.message.guild_id;
        let document = self.database.guild(guild).await?;
        let mut reply = context
            .replies
            .guild("Autoroles", "The automatic roles for this server.");
        for (min_xp, role_id) in document.roles.iter().rev() {
            match self.platform.role(guild, *role_id).await? {
                Some(role) => reply.add_field(min_xp.to_string(), role.name, false),
                None => tracing::debug!("automatic role {role_id} is gone"),
            }
        }
        self.send(context, reply).await
    }

    async fn xp_add(
        &self,
        context: &Context<'_>,
        invocation: &BotInvocation,
        arguments: &Arguments,
    ) -> BotResult<()> {
        let member = mentioned_member(invocation, arguments, "member")?;
        let amount = parse_whole_number(arguments.scalar("amount")?, true)?;
        let Some((previous, updated)) = self.xp.adjust_xp(&member, amount).await? else {
            return Err(BotError::InvalidInput(format!(
                "xp of {} cannot drop below zero",
                member.name
            )));
        };
        self.send_xp_changed(context, &member, previous, updated)
            .await
    }

    async fn xp_set(
        &self,
        context: &Context<'_>,
        invocation: &BotInvocation,
        arguments: &Arguments,
    ) -> BotResult<()> {
        let member = mentioned_member(invocation, arguments, "member")?;
        let xp = parse_whole_number(arguments.scalar("amount")?, false)?;
        let previous = self.xp.set_xp(&member, xp).await?;
        self.send_xp_changed(context, &member, previous, xp).await
    }

    async fn send_xp_changed(
        &self,
        context: &Context<'_>,
        member: &Member,
        previous: f64,
        updated: f64,
    ) -> BotResult<()> {
        let reply = context.replies.member(
            member,
            "XP changed.",
            &format!(
                "Changed xp of {} from {} to {}.",
                member.mention(),
                display_xp(previous),
                display_xp(updated)
            ),
        );
        self.send(context, reply).await
    }

    async fn prefix(&self, context: &Context<'_>, arguments: &Arguments) -> BotResult<()> {
        let new = arguments.scalar("new")?;
        if new.is_empty() {
            return Err(BotError::InvalidInput("prefix cannot be empty".to_string()));
        }
        let prefix = new.to_string();
        self.database
            .update_guild(context.message.guild_id, |document| document.prefix = prefix)
            .await?;
        let reply = context
            .replies
            .guild("Prefix changed.", &format!("{} --> {new}", context.prefix));
        self.send(context, reply).await
    }

    async fn rickroll_get(&self, context: &Context<'_>) -> BotResult<()> {
        let guild = context.message.guild_id;
        let document = self.database.guild(guild).await?;

        let mut roles = String::new();
        for role_id in &document.rickroll_roles {
            if let Some(role) = self.platform.role(guild, *role_id).await? {
                roles.push_str(&role.name);
                roles.push('\n');
            }
        }
        let mut members = String::new();
        for user in &document.rickroll_members {
            if let Some(member) = self.platform.member(guild, *user).await? {
                members.push_str(&member.name);
                members.push('\n');
            }
        }

        let reply = context
            .replies
            .guild("Targets", "Here are the rickroll targets:")
            .with_field("Roles", or_dash(roles))
            .with_field("Members", or_dash(members));
        self.send(context, reply).await
    }

    async fn update_rickroll_targets(
        &self,
        context: &Context<'_>,
        invocation: &BotInvocation,
        arguments: &Arguments,
        update: TargetUpdate,
    ) -> BotResult<()> {
        let mut users = Vec::new();
        let mut roles = Vec::new();
        for target in arguments.scalars("targets")? {
            match invocation.mentions().get(target) {
                Some(Reference::User(member)) => users.push(member.id),
                Some(Reference::Role(role)) => roles.push(role.id),
                None => tracing::debug!("skipping unresolved rickroll target {target}"),
            }
        }

        self.database
            .update_guild(context.message.guild_id, |document| match update {
                TargetUpdate::Add => {
                    for user in users {
                        if !document.rickroll_members.contains(&user) {
                            document.rickroll_members.push(user);
                        }
                    }
                    for role in roles {
                        if !document.rickroll_roles.contains(&role) {
                            document.rickroll_roles.push(role);
                        }
                    }
                }
                TargetUpdate::Remove => {
                    document.rickroll_members.retain(|user| !users.contains(user));
                    document.rickroll_roles.retain(|role| !roles.contains(role));
                }
            })
            .await?;

        self.send(context, context.replies.guild("Targets updated.", ""))
            .await
    }
}

fn mentioned_member(
    invocation: &BotInvocation,
    arguments: &Arguments,
    param: &str,
) -> BotResult<Member> {
    let mention = arguments.scalar(param)?;
    invocation
        .mentions()
        .user(mention)
        .cloned()
        .ok_or_else(|| BotError::InvalidInput(format!("{mention} is not a known member")))
}

fn is_whole_number(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Digits, optionally with a leading `-` when `signed`, at most
/// [`MAX_XP_AMOUNT`] in magnitude.
fn parse_whole_number(text: &str, signed: bool) -> BotResult<f64> {
    let digits = match text.strip_prefix('-') {
        Some(rest) if signed => rest,
        _ => text,
    };
    if !is_whole_number(digits) {
        return Err(BotError::InvalidInput(format!("{text} is not a whole number")));
    }
    let number: i64 = text
        .parse()
        .map_err(|error| BotError::InvalidInput(format!("{text} is not a number: {error}")))?;
    if number.unsigned_abs() > MAX_XP_AMOUNT {
        return Err(BotError::InvalidInput(format!(
            "{text} is larger than {MAX_XP_AMOUNT}"
        )));
    }
    Ok(number as f64)
}

fn or_dash(names: String) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names
    }
}
