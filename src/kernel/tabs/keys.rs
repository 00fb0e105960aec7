//! Tab keyboard shortcuts: chord → [`TabCommand`].

use std::fmt;

use rustc_hash::FxHashMap;

use crate::core::event::{Key, KeyCode};
use crate::kernel::services::ports::KeybindingRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabCommand {
    New,
    Close,
    Next,
    Previous,
    First,
    Last,
    /// Zero-based position.
    Select(usize),
    Duplicate,
    MoveLeft,
    MoveRight,
}

impl TabCommand {
    pub fn name(&self) -> String {
        match self {
            TabCommand::New => "tab.new".to_string(),
            TabCommand::Close => "tab.close".to_string(),
            TabCommand::Next => "tab.next".to_string(),
            TabCommand::Previous => "tab.previous".to_string(),
            TabCommand::First => "tab.first".to_string(),
            TabCommand::Last => "tab.last".to_string(),
            TabCommand::Select(index) => format!("tab.select.{}", index + 1),
            TabCommand::Duplicate => "tab.duplicate".to_string(),
            TabCommand::MoveLeft => "tab.moveLeft".to_string(),
            TabCommand::MoveRight => "tab.moveRight".to_string(),
        }
    }

    /// Inverse of [`Self::name`]; `tab.select.N` is one-based.
    pub fn from_name(value: &str) -> Option<Self> {
        let v = value.trim();
        let command = match v {
            "tab.new" => TabCommand::New,
            "tab.close" => TabCommand::Close,
            "tab.next" => TabCommand::Next,
            "tab.previous" | "tab.prev" => TabCommand::Previous,
            "tab.first" => TabCommand::First,
            "tab.last" => TabCommand::Last,
            "tab.duplicate" => TabCommand::Duplicate,
            "tab.moveLeft" => TabCommand::MoveLeft,
            "tab.moveRight" => TabCommand::MoveRight,
            _ => {
                let n = v.strip_prefix("tab.select.")?.parse::<usize>().ok()?;
                TabCommand::Select(n.checked_sub(1)?)
            }
        };
        Some(command)
    }
}

impl fmt::Display for TabCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

pub struct TabKeymap {
    bindings: FxHashMap<Key, TabCommand>,
}

impl TabKeymap {
    pub fn new() -> Self {
        Self::with_defaults()
    }

    pub fn with_defaults() -> Self {
        Self {
            bindings: default_tab_keybindings(),
        }
    }

    /// Defaults overridden by the settings rules.
    pub fn from_rules(rules: &[KeybindingRule]) -> Self {
        let mut keymap = Self::with_defaults();
        keymap.apply_rules(rules);
        keymap
    }

    pub fn resolve(&self, key: &Key) -> Option<TabCommand> {
        self.bindings.get(key).copied()
    }

    pub fn bindings(&self) -> &FxHashMap<Key, TabCommand> {
        &self.bindings
    }

    pub fn bind(&mut self, key: Key, command: TabCommand) {
        self.bindings.insert(key, command);
    }

    pub fn unbind(&mut self, key: &Key) -> Option<TabCommand> {
        self.bindings.remove(key)
    }

    /// Applies `{key, command}` rules in order. An empty command or `none`
    /// unbinds the chord. Rules for unknown commands are skipped. Returns how
    /// many rules took effect.
    pub fn apply_rules(&mut self, rules: &[KeybindingRule]) -> usize {
        let mut applied = 0;
        for rule in rules {
            let Some(key) = Key::parse(&rule.key) else {
                tracing::warn!(key = %rule.key, "invalid keybinding chord, skipping");
                continue;
            };
            let command = rule.command.trim();
            if command.is_empty() || command.eq_ignore_ascii_case("none") {
                self.unbind(&key);
                applied += 1;
                continue;
            }
            match TabCommand::from_name(command) {
                Some(command) => {
                    self.bind(key, command);
                    applied += 1;
                }
                None => {
                    tracing::debug!(key = %rule.key, command, "not a tab command, skipping");
                }
            }
        }
        applied
    }
}

impl Default for TabKeymap {
    fn default() -> Self {
        Self::new()
    }
}

fn default_tab_keybindings() -> FxHashMap<Key, TabCommand> {
    let mut bindings = FxHashMap::default();
    bindings.reserve(20);

    bindings.insert(Key::ctrl(KeyCode::Char('t')), TabCommand::New);
    bindings.insert(Key::ctrl(KeyCode::Char('w')), TabCommand::Close);
    bindings.insert(Key::ctrl(KeyCode::Tab), TabCommand::Next);
    bindings.insert(Key::ctrl_shift(KeyCode::Tab), TabCommand::Previous);
    bindings.insert(Key::ctrl(KeyCode::PageDown), TabCommand::Next);
    bindings.insert(Key::ctrl(KeyCode::PageUp), TabCommand::Previous);
    bindings.insert(Key::ctrl_shift(KeyCode::PageUp), TabCommand::MoveLeft);
    bindings.insert(Key::ctrl_shift(KeyCode::PageDown), TabCommand::MoveRight);
    bindings.insert(Key::ctrl_shift(KeyCode::Char('d')), TabCommand::Duplicate);

    for (index, digit) in ('1'..='8').enumerate() {
        bindings.insert(Key::alt(KeyCode::Char(digit)), TabCommand::Select(index));
    }
    bindings.insert(Key::alt(KeyCode::Char('9')), TabCommand::Last);

    bindings
}
