//! Reply embeds.

use std::fmt;

use crate::platform::Member;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer: Option<EmbedFooter>,
    pub thumbnail: Option<String>,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            footer: None,
            thumbnail: None,
            fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_field(name, value, true);
        self
    }

    pub fn with_thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail = url;
        self
    }

    pub fn with_footer(mut self, text: impl Into<String>, icon_url: Option<String>) -> Self {
        self.footer = Some(EmbedFooter {
            text: text.into(),
            icon_url,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&EmbedField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl fmt::Display for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌ {}", self.title)?;
        if !self.description.is_empty() {
            writeln!(f, "│ {}", self.description)?;
        }
        for field in &self.fields {
            writeln!(f, "│ [{}]", field.name)?;
            for line in field.value.lines() {
                writeln!(f, "│   {line}")?;
            }
        }
        match &self.footer {
            Some(footer) => write!(f, "└ {}", footer.text),
            None => write!(f, "└"),
        }
    }
}

/// Builds the bot's replies to one message.
#[derive(Debug, Clone)]
pub struct Replies {
    color: u32,
    prefix: String,
    author: Member,
    guild_icon: Option<String>,
}

impl Replies {
    pub fn new(color: u32, prefix: String, author: Member, guild_icon: Option<String>) -> Self {
        Self {
            color,
            prefix,
            author,
            guild_icon,
        }
    }

    pub fn standard(&self, title: &str, description: &str) -> Embed {
        Embed::new(title, description, self.color).with_footer(
            format!("Requested by {}", self.author.name),
            self.author.avatar_url.clone(),
        )
    }

    pub fn syntax_error(&self) -> Embed {
        self.standard("Error", "Syntax error")
    }

    pub fn guild(&self, title: &str, description: &str) -> Embed {
        self.standard(title, description)
            .with_thumbnail(self.guild_icon.clone())
    }

    pub fn member(&self, member: &Member, title: &str, description: &str) -> Embed {
        self.standard(title, description)
            .with_thumbnail(member.avatar_url.clone())
    }

    pub fn permission_denied(&self) -> Embed {
        self.member(
            &self.author,
            "Missing Permissions",
            "You don't have the permission to use this.",
        )
    }

    /// Lists the sub-commands under `path`; admin menus only for administrators.
    pub fn menu_help(&self, path: &str, menus: &[&str], admin_menus: &[&str]) -> Embed {
        let mut listing = String::new();
        let visible_admin: &[&str] = if self.author.administrator {
            admin_menus
        } else {
            &[]
        };
        for menu in menus.iter().chain(visible_admin) {
            listing.push_str(&format!("- {menu}\n"));
        }
        self.help_header(path).with_field("Menus", listing)
    }

    pub fn command_help(&self, path: &str, description: &str, params: &[(&str, &str)]) -> Embed {
        let mut embed = self.help_header(path).with_field("Description", description);
        for (name, help) in params {
            embed.add_field(*name, *help, true);
        }
        embed
    }

    fn help_header(&self, path: &str) -> Embed {
        self.standard("Help", &format!("for command `{}{}`", self.prefix, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{GuildId, UserId};

    fn author(administrator: bool) -> Member {
        Member {
            id: UserId(1),
            guild_id: GuildId(10),
            name: "alice".to_string(),
            bot: false,
            administrator,
            roles: Vec::new(),
            avatar_url: Some("https://cdn/alice.png".to_string()),
        }
    }

    fn replies(administrator: bool) -> Replies {
        Replies::new(
            0x0FFFFF,
            "!".to_string(),
            author(administrator),
            Some("https://cdn/guild.png".to_string()),
        )
    }

    #[test]
    fn standard_has_requester_footer() {
        let embed = replies(false).standard("Title", "Body");
        let footer = embed.footer.expect("footer");
        assert_eq!(footer.text, "Requested by alice");
        assert_eq!(footer.icon_url.as_deref(), Some("https://cdn/alice.png"));
        assert_eq!(embed.color, 0x0FFFFF);
    }

    #[test]
    fn guild_and_member_thumbnails() {
        let replies = replies(false);
        assert_eq!(
            replies.guild("t", "d").thumbnail.as_deref(),
            Some("https://cdn/guild.png")
        );
        assert_eq!(
            replies.member(&author(false), "t", "d").thumbnail.as_deref(),
            Some("https://cdn/alice.png")
        );
    }

    #[test]
    fn menu_help_hides_admin_menus() {
        let embed = replies(false).menu_help("xp", &["get"], &["set"]);
        assert_eq!(embed.description, "for command `!xp`");
        assert_eq!(embed.field("Menus").expect("menus").value, "- get\n");

        let embed = replies(true).menu_help("xp", &["get"], &["set"]);
        assert_eq!(embed.field("Menus").expect("menus").value, "- get\n- set\n");
    }

    #[test]
    fn command_help_lists_params() {
        let embed = replies(true).command_help("prefix", "Changes the prefix.", &[("new", "The new prefix.")]);
        assert_eq!(embed.field("Description").expect("description").value, "Changes the prefix.");
        assert_eq!(embed.field("new").expect("param").value, "The new prefix.");
    }

    #[test]
    fn renders_as_text() {
        let embed = Embed::new("Stats", "for alice", 0).with_field("XP", "12");
        assert_eq!(embed.to_string(), "┌ Stats\n│ for alice\n│ [XP]\n│   12\n└");
    }
}
