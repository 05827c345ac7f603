//! The command tree.
//!
//! Each level is matched against one verb. Entries marked `admin` are only
//! entered by members with the administrator permission.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    XpAdd,
    XpSet,
    Prefix,
    RickrollAdd,
    RickrollRemove,
    RickrollGet,
    AutorolesSet,
    AutorolesGet,
    Stats,
    Ranklist,
}

/// What the user sees when a command cannot be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Silent,
    SyntaxError,
}

#[derive(Debug)]
pub struct CommandSpec {
    pub command: CommandId,
    pub description: &'static str,
    /// Parameter names with their help text, in positional order.
    pub params: &'static [(&'static str, &'static str)],
    /// Parameter that falls back to the message author.
    pub author_default: Option<&'static str>,
    pub failure: Failure,
}

impl CommandSpec {
    pub fn param_names(&self) -> Vec<&'static str> {
        self.params.iter().map(|(name, _)| *name).collect()
    }
}

#[derive(Debug)]
pub enum MenuNode {
    Branch(&'static [MenuEntry]),
    Leaf(CommandSpec),
}

#[derive(Debug)]
pub struct MenuEntry {
    pub name: &'static str,
    pub admin: bool,
    pub node: MenuNode,
}

pub fn find(entries: &'static [MenuEntry], verb: &str) -> Option<&'static MenuEntry> {
    entries.iter().find(|entry| entry.name == verb)
}

pub static ROOT: &[MenuEntry] = &[
    MenuEntry {
        name: "xp",
        admin: true,
        node: MenuNode::Branch(&[
            MenuEntry {
                name: "add",
                admin: false,
                node: MenuNode::Leaf(CommandSpec {
                    command: CommandId::XpAdd,
                    description: "Adds xp to a given member.",
                    params: &[
                        ("member", "The mention of the member you want to add xp to."),
                        ("amount", "The amount of xp you want to add."),
                    ],
                    author_default: None,
                    failure: Failure::Silent,
                }),
            },
            MenuEntry {
                name: "set",
                admin: false,
                node: MenuNode::Leaf(CommandSpec {
                    command: CommandId::XpSet,
                    description: "Sets xp of a given member.",
                    params: &[
                        ("member", "The mention of the member you want to set the xp to."),
                        ("amount", "The new xp value."),
                    ],
                    author_default: None,
                    failure: Failure::Silent,
                }),
            },
        ]),
    },
    MenuEntry {
        name: "prefix",
        admin: true,
        node: MenuNode::Leaf(CommandSpec {
            command: CommandId::Prefix,
            description: "Changes the prefix.",
            params: &[("new", "The new prefix.")],
            author_default: None,
            failure: Failure::Silent,
        }),
    },
    MenuEntry {
        name: "rickroll",
        admin: false,
        node: MenuNode::Branch(&[
            MenuEntry {
                name: "add",
                admin: true,
                node: MenuNode::Leaf(CommandSpec {
                    command: CommandId::RickrollAdd,
                    description:
                        "Adds a member/role that will be rickrolled in the future, if it joins a call.",
                    params: &[(
                        "targets",
                        "The mentions of the members/roles you want to rickroll, joined with +.",
                    )],
                    author_default: None,
                    failure: Failure::Silent,
                }),
            },
            MenuEntry {
                name: "remove",
                admin: true,
                node: MenuNode::Leaf(CommandSpec {
                    command: CommandId::RickrollRemove,
                    description: "Removes a member/role, so won't be rickrolled anymore.",
                    params: &[(
                        "targets",
                        "The mentions of the members/roles you want to remove, joined with +.",
                    )],
                    author_default: None,
                    failure: Failure::Silent,
                }),
            },
            MenuEntry {
                name: "get",
                admin: false,
                node: MenuNode::Leaf(CommandSpec {
                    command: CommandId::RickrollGet,
                    description: "Returns the rickroll targets.",
                    params: &[],
                    author_default: None,
                    failure: Failure::Silent,
                }),
            },
        ]),
    },
    MenuEntry {
        name: "autoroles",
        admin: false,
        node: MenuNode::Branch(&[
            MenuEntry {
                name: "set",
                admin: true,
                node: MenuNode::Leaf(CommandSpec {
                    command: CommandId::AutorolesSet,
                    description: "Sets the automatic roles.",
                    params: &[(
                        "data",
                        "String with minimal xp and role mention in pairs: 'xp1 @Role xp2 @Role ...'.",
                    )],
                    author_default: None,
                    failure: Failure::SyntaxError,
                }),
            },
            MenuEntry {
                name: "get",
                admin: false,
                node: MenuNode::Leaf(CommandSpec {
                    command: CommandId::AutorolesGet,
                    description: "Returns the automatic roles.",
                    params: &[],
                    author_default: None,
                    failure: Failure::SyntaxError,
                }),
            },
        ]),
    },
    MenuEntry {
        name: "stats",
        admin: false,
        node: MenuNode::Leaf(CommandSpec {
            command: CommandId::Stats,
            description: "Returns the stats of a given member.",
            params: &[("member", "The mention of the member (you by default).")],
            author_default: Some("member"),
            failure: Failure::Silent,
        }),
    },
    MenuEntry {
        name: "ranklist",
        admin: false,
        node: MenuNode::Leaf(CommandSpec {
            command: CommandId::Ranklist,
            description: "Returns a ranklist with all xp of this guild's members.",
            params: &[],
            author_default: None,
            failure: Failure::Silent,
        }),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(path: &[&str]) -> &'static CommandSpec {
        let mut entries = ROOT;
        for (depth, verb) in path.iter().enumerate() {
            let entry = find(entries, verb).expect("known verb");
            match &entry.node {
                MenuNode::Branch(children) => entries = *children,
                MenuNode::Leaf(spec) => {
                    assert_eq!(depth, path.len() - 1, "leaf reached early");
                    return spec;
                }
            }
        }
        panic!("path {path:?} ends on a branch");
    }

    #[test]
    fn every_command_is_reachable() {
        let commands = [
            (vec!["xp", "add"], CommandId::XpAdd),
            (vec!["xp", "set"], CommandId::XpSet),
            (vec!["prefix"], CommandId::Prefix),
            (vec!["rickroll", "add"], CommandId::RickrollAdd),
            (vec!["rickroll", "remove"], CommandId::RickrollRemove),
            (vec!["rickroll", "get"], CommandId::RickrollGet),
            (vec!["autoroles", "set"], CommandId::AutorolesSet),
            (vec!["autoroles", "get"], CommandId::AutorolesGet),
            (vec!["stats"], CommandId::Stats),
            (vec!["ranklist"], CommandId::Ranklist),
        ];
        for (path, command) in commands {
            assert_eq!(leaf(&path).command, command);
        }
    }

    #[test]
    fn admin_gates() {
        assert!(find(ROOT, "xp").expect("xp").admin);
        assert!(find(ROOT, "prefix").expect("prefix").admin);
        assert!(!find(ROOT, "rickroll").expect("rickroll").admin);
        assert!(find(ROOT, "help").is_none());
    }

    #[test]
    fn author_default_names_a_parameter() {
        let stats = leaf(&["stats"]);
        assert_eq!(stats.param_names(), vec!["member"]);
        assert_eq!(stats.author_default, Some("member"));
    }
}
