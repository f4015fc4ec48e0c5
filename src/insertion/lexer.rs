//! Lightweight lexical safety tracking.
//!
//! This is not a LaTeX parser. The lexer is fed the document one character at
//! a time and answers a single question: may an index marker be placed at the
//! current position? A position is unsafe when it is
//! - after an unescaped `%` on the same line,
//! - inside a command name,
//! - inside an argument group of an unsafe command (or nested in one),
//! - inside an environment that is not explicitly allowed.

use std::collections::HashSet;

/// Commands whose arguments never receive index markers.
pub const DEFAULT_UNSAFE_COMMANDS: &[&str] = &[
    "index",
    "glossary",
    "label",
    "ref",
    "pageref",
    "eqref",
    "autoref",
    "nameref",
    "cref",
    "Cref",
    "cite",
    "citep",
    "citet",
    "citealp",
    "citeauthor",
    "citeyear",
    "nocite",
    "url",
    "href",
    "hyperref",
    "includegraphics",
    "input",
    "include",
    "includeonly",
    "usepackage",
    "documentclass",
    "bibliography",
    "bibliographystyle",
    "begin",
    "end",
    "newcommand",
    "renewcommand",
    "providecommand",
    "newenvironment",
    "renewenvironment",
    "def",
    "hypersetup",
    "part",
    "chapter",
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
    "caption",
];

/// Environments whose bodies may receive index markers.
pub const DEFAULT_ALLOWED_ENVIRONMENTS: &[&str] = &[
    "document",
    "sloppypar",
    "abstract",
    "itemize",
    "enumerate",
    "description",
    "quote",
    "quotation",
];

/// Command and environment lists driving the safety checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalRules {
    /// Commands whose brace and bracket arguments are unsafe.
    pub unsafe_commands: HashSet<String>,
    /// Environments whose bodies are safe; every other environment is skipped.
    pub allowed_environments: HashSet<String>,
}

impl Default for LexicalRules {
    fn default() -> Self {
        Self {
            unsafe_commands: DEFAULT_UNSAFE_COMMANDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            allowed_environments: DEFAULT_ALLOWED_ENVIRONMENTS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl LexicalRules {
    /// Adds commands to the unsafe list.
    #[must_use]
    pub fn with_unsafe_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsafe_commands
            .extend(commands.into_iter().map(Into::into));
        self
    }

    /// Adds environments to the allowed list.
    #[must_use]
    pub fn with_allowed_environments<I, S>(mut self, environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_environments
            .extend(environments.into_iter().map(Into::into));
        self
    }

    fn is_unsafe_command(&self, name: &str) -> bool {
        self.unsafe_commands.contains(name)
    }

    fn is_allowed_environment(&self, name: &str) -> bool {
        self.allowed_environments.contains(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvironmentEdge {
    Begin,
    End,
}

#[derive(Debug)]
struct Group {
    close: char,
    unsafe_region: bool,
    owner: Option<String>,
    environment: Option<(EnvironmentEdge, String)>,
}

/// Character-fed scanner state.
#[derive(Debug)]
pub(crate) struct Lexer<'r> {
    rules: &'r LexicalRules,
    in_comment: bool,
    escape_pending: bool,
    command: Option<String>,
    pending_owner: Option<String>,
    after_group: bool,
    groups: Vec<Group>,
    blocked_environments: usize,
}

impl<'r> Lexer<'r> {
    pub(crate) fn new(rules: &'r LexicalRules) -> Self {
        Self {
            rules,
            in_comment: false,
            escape_pending: false,
            command: None,
            pending_owner: None,
            after_group: false,
            groups: Vec::new(),
            blocked_environments: 0,
        }
    }

    /// Whether the next character may start an indexed occurrence.
    pub(crate) fn is_safe(&self) -> bool {
        !self.in_comment
            && !self.escape_pending
            && self.command.is_none()
            && self.blocked_environments == 0
            && !self.groups.last().is_some_and(|group| group.unsafe_region)
    }

    pub(crate) fn feed(&mut self, ch: char) {
        if self.in_comment {
            if ch == '\n' {
                self.in_comment = false;
            }
            return;
        }

        if let Some(name) = self.command.as_mut() {
            if ch.is_ascii_alphabetic() {
                name.push(ch);
                return;
            }
            self.pending_owner = self.command.take();
            self.after_group = false;
            if ch == '*' {
                // starred variant keeps the unstarred command's rules
                return;
            }
        }

        if self.escape_pending {
            self.escape_pending = false;
            if ch.is_ascii_alphabetic() {
                self.command = Some(ch.to_string());
            } else {
                // control symbol: \\, \%, \{, \, ...
                self.pending_owner = None;
            }
            return;
        }

        match ch {
            '\\' => self.escape_pending = true,
            '%' => self.in_comment = true,
            '{' => self.open_group('}'),
            '[' if self.pending_owner.is_some() => self.open_group(']'),
            '}' => self.close_brace(),
            ']' if self.groups.last().is_some_and(|group| group.close == ']') => {
                if let Some(group) = self.groups.pop() {
                    self.finish_group(group);
                }
            }
            c if c.is_whitespace() => {
                if self.after_group {
                    self.pending_owner = None;
                }
            }
            c => {
                self.pending_owner = None;
                if let Some(group) = self.groups.last_mut() {
                    if let Some((_, name)) = group.environment.as_mut() {
                        name.push(c);
                    }
                }
            }
        }
    }

    fn open_group(&mut self, close: char) {
        let owner = self.pending_owner.take();
        let parent_unsafe = self.groups.last().is_some_and(|group| group.unsafe_region);
        let owner_unsafe = owner
            .as_deref()
            .is_some_and(|name| self.rules.is_unsafe_command(name));
        let environment = match (owner.as_deref(), close) {
            (Some("begin"), '}') => Some((EnvironmentEdge::Begin, String::new())),
            (Some("end"), '}') => Some((EnvironmentEdge::End, String::new())),
            _ => None,
        };
        self.groups.push(Group {
            close,
            unsafe_region: parent_unsafe || owner_unsafe,
            owner,
            environment,
        });
        self.after_group = false;
    }

    fn close_brace(&mut self) {
        // unterminated optional groups are dropped on the way to the brace
        while let Some(group) = self.groups.pop() {
            if group.close == '}' {
                self.finish_group(group);
                return;
            }
        }
    }

    fn finish_group(&mut self, group: Group) {
        if let Some((edge, name)) = group.environment {
            self.environment_edge(edge, &name);
        }
        self.pending_owner = group.owner;
        self.after_group = true;
    }

    fn environment_edge(&mut self, edge: EnvironmentEdge, name: &str) {
        if self.rules.is_allowed_environment(name) {
            return;
        }
        match edge {
            EnvironmentEdge::Begin => self.blocked_environments += 1,
            EnvironmentEdge::End => {
                self.blocked_environments = self.blocked_environments.saturating_sub(1);
            }
        }
    }
}
