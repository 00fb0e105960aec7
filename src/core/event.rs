//! Key chords delivered by the host page.
//!
//! The host translates its keyboard events into [`Key`]; keybinding rules
//! from the settings file are parsed with [`Key::parse`].

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Esc,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CONTROL: Modifiers = Modifiers(1);
    pub const SHIFT: Modifiers = Modifiers(1 << 1);
    pub const ALT: Modifiers = Modifiers(1 << 2);
    pub const SUPER: Modifiers = Modifiers(1 << 3);

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl Key {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        // Uppercase letters are normalized to lowercase + shift so that
        // "ctrl+T" and "ctrl+shift+t" compare equal.
        if let KeyCode::Char(ch) = code {
            if ch.is_ascii_uppercase() {
                return Self {
                    code: KeyCode::Char(ch.to_ascii_lowercase()),
                    modifiers: modifiers | Modifiers::SHIFT,
                };
            }
        }
        Self { code, modifiers }
    }

    pub fn simple(code: KeyCode) -> Self {
        Self::new(code, Modifiers::NONE)
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, Modifiers::CONTROL)
    }

    pub fn alt(code: KeyCode) -> Self {
        Self::new(code, Modifiers::ALT)
    }

    pub fn ctrl_shift(code: KeyCode) -> Self {
        Self::new(code, Modifiers::CONTROL | Modifiers::SHIFT)
    }

    /// Parses chords such as `ctrl+shift+tab`, `alt+3` or `F2`.
    pub fn parse(value: &str) -> Option<Key> {
        let mut modifiers = Modifiers::NONE;
        let mut key_part: Option<&str> = None;
        for part in value.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
                "shift" => modifiers |= Modifiers::SHIFT,
                "alt" | "option" => modifiers |= Modifiers::ALT,
                "super" | "meta" | "cmd" | "command" => modifiers |= Modifiers::SUPER,
                _ => key_part = Some(part),
            }
        }
        let code = parse_key_code(key_part?)?;
        Some(Key::new(code, modifiers))
    }
}

fn parse_key_code(value: &str) -> Option<KeyCode> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }

    let v_lc = v.to_ascii_lowercase();
    let code = match v_lc.as_str() {
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "esc" | "escape" => KeyCode::Esc,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "up" | "arrowup" => KeyCode::Up,
        "down" | "arrowdown" => KeyCode::Down,
        "left" | "arrowleft" => KeyCode::Left,
        "right" | "arrowright" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "space" => KeyCode::Char(' '),
        _ if v_lc.len() > 1 && v_lc.starts_with('f') => {
            let n = v_lc.strip_prefix('f')?.parse::<u8>().ok()?;
            KeyCode::F(n)
        }
        _ => {
            let mut chars = v.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            KeyCode::Char(ch)
        }
    };

    Some(code)
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(Modifiers::CONTROL) {
            f.write_str("ctrl+")?;
        }
        if self.modifiers.contains(Modifiers::ALT) {
            f.write_str("alt+")?;
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            f.write_str("shift+")?;
        }
        if self.modifiers.contains(Modifiers::SUPER) {
            f.write_str("super+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char(ch) => write!(f, "{}", ch),
            KeyCode::Enter => f.write_str("enter"),
            KeyCode::Tab => f.write_str("tab"),
            KeyCode::Esc => f.write_str("esc"),
            KeyCode::Backspace => f.write_str("backspace"),
            KeyCode::Delete => f.write_str("delete"),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::Home => f.write_str("home"),
            KeyCode::End => f.write_str("end"),
            KeyCode::PageUp => f.write_str("pageup"),
            KeyCode::PageDown => f.write_str("pagedown"),
            KeyCode::F(n) => write!(f, "f{}", n),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/event.rs"]
mod tests;
