//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub home: HomeShortcuts,
    pub book: BookShortcuts,
    pub bookings: BookingsShortcuts,
    pub alert: AlertShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// トップ画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeShortcuts {
    pub quit: Vec<String>,
    pub book: Vec<String>,
    pub my_bookings: Vec<String>,
    pub down: Vec<String>,
    pub up: Vec<String>,
}

/// 予約フォームのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookShortcuts {
    pub back: Vec<String>,
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    pub edit_field: Vec<String>,
    pub next_service: Vec<String>,
    pub prev_service: Vec<String>,
    pub search: Vec<String>,
    pub detect_location: Vec<String>,
    pub submit: Vec<String>,
}

/// 予約一覧画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingsShortcuts {
    pub back: Vec<String>,
    pub refresh: Vec<String>,
    pub down: Vec<String>,
    pub up: Vec<String>,
}

/// 通知ポップアップのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertShortcuts {
    pub dismiss: Vec<String>,
}

/// InputBoxのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            home: HomeShortcuts {
                quit: keys(&["q"]),
                book: keys(&["Enter", "b"]),
                my_bookings: keys(&["m"]),
                down: keys(&["Down", "j"]),
                up: keys(&["Up", "k"]),
            },
            book: BookShortcuts {
                back: keys(&["Esc"]),
                next_field: keys(&["Tab", "Down"]),
                prev_field: keys(&["BackTab", "Up"]),
                edit_field: keys(&["e"]),
                next_service: keys(&["Right"]),
                prev_service: keys(&["Left"]),
                search: keys(&["/"]),
                detect_location: keys(&["d"]),
                submit: keys(&["Enter"]),
            },
            bookings: BookingsShortcuts {
                back: keys(&["Esc", "q"]),
                refresh: keys(&["r"]),
                down: keys(&["Down", "j"]),
                up: keys(&["Up", "k"]),
            },
            alert: AlertShortcuts {
                dismiss: keys(&["Enter", "Esc"]),
            },
            // 住所などに h/l を入力できるよう、矢印キーのみ割り当てる。
            input_box: InputBoxShortcuts {
                confirm: keys(&["Enter"]),
                cancel: keys(&["Esc"]),
                backspace: keys(&["Backspace"]),
                delete: keys(&["Delete"]),
                left: keys(&["Left"]),
                right: keys(&["Right"]),
                home: keys(&["Home"]),
                end: keys(&["End"]),
                clear_line: keys(&["Ctrl+u"]),
            },
        }
    }
}

/// KeyEventがいずれかのショートカット文字列と一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

/// KeyEventが単一のショートカット文字列と一致するか判定する。
fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    // "Ctrl+u" は修飾キー付き、"a" や "Enter" は修飾キーなし。
    let (modifiers_str, key_str) = match shortcut.rsplit_once('+') {
        Some((mods, k)) if !k.is_empty() => (mods.split('+').collect::<Vec<_>>(), k),
        _ => (vec![], shortcut),
    };

    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match modifier {
            "Ctrl" | "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "Alt" | "alt" => expected_modifiers |= KeyModifiers::ALT,
            "Shift" | "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    // BackTab は端末によってSHIFT付きで届くため、SHIFTを無視する。
    let actual_modifiers = if key.code == KeyCode::BackTab {
        key.modifiers - KeyModifiers::SHIFT
    } else {
        key.modifiers
    };
    if actual_modifiers != expected_modifiers {
        return false;
    }

    match key_str {
        "Enter" | "enter" => key.code == KeyCode::Enter,
        "Esc" | "esc" => key.code == KeyCode::Esc,
        "Tab" | "tab" => key.code == KeyCode::Tab,
        "BackTab" | "backtab" => key.code == KeyCode::BackTab,
        "Backspace" | "backspace" => key.code == KeyCode::Backspace,
        "Delete" | "delete" => key.code == KeyCode::Delete,
        "Up" | "up" => key.code == KeyCode::Up,
        "Down" | "down" => key.code == KeyCode::Down,
        "Left" | "left" => key.code == KeyCode::Left,
        "Right" | "right" => key.code == KeyCode::Right,
        "Home" | "home" => key.code == KeyCode::Home,
        "End" | "end" => key.code == KeyCode::End,
        // 単一文字は Char として比較する。
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => key.code == KeyCode::Char(c),
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_shortcut_simple_char() {
        let key = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("d")]));
        assert!(!matches_shortcut(&key, &[String::from("e")]));
    }

    #[test]
    fn test_matches_shortcut_with_modifier() {
        let key = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&key, &[String::from("Ctrl+u")]));
        assert!(!matches_shortcut(&key, &[String::from("u")]));
    }

    #[test]
    fn test_plus_key_is_a_char() {
        // "+" 単体は修飾キー区切りではなく文字として扱う。
        let key = KeyEvent::new(KeyCode::Char('+'), KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("+")]));
    }

    #[test]
    fn test_backtab_ignores_shift() {
        let shifted = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        let plain = KeyEvent::new(KeyCode::BackTab, KeyModifiers::empty());
        let sc = vec![String::from("BackTab")];
        assert!(matches_shortcut(&shifted, &sc));
        assert!(matches_shortcut(&plain, &sc));
    }

    #[test]
    fn test_defaults_leave_letters_typeable() {
        // 入力ボックスで英字がショートカットに奪われないことを検証する。
        let sc = Shortcuts::default().input_box;
        for c in ['h', 'l', 'j', 'k', 'q'] {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty());
            for list in [&sc.confirm, &sc.cancel, &sc.left, &sc.right, &sc.home, &sc.end] {
                assert!(!matches_shortcut(&key, list), "{c}");
            }
        }
    }
}
