//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub main: MainShortcuts,
    pub report: ReportShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// メイン画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainShortcuts {
    pub quit: Vec<String>,
    pub pick_file: Vec<String>,
    pub dismiss: Vec<String>,
}

/// 結果オーバーレイのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportShortcuts {
    pub close: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub page_up: Vec<String>,
    pub page_down: Vec<String>,
    pub top: Vec<String>,
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
            // 既存ファイルを読み込んでパースする。
            let content = std::fs::read_to_string(path)?;
            let shortcuts: Shortcuts = toml::from_str(&content)?;
            Ok(shortcuts)
        } else {
            // 未作成の場合は既定値を利用する。
            Ok(Self::default())
        }
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            main: MainShortcuts {
                quit: vec!["q".into()],
                pick_file: vec!["o".into(), "Enter".into()],
                dismiss: vec!["Esc".into()],
            },
            report: ReportShortcuts {
                close: vec!["Esc".into(), "q".into(), "Enter".into()],
                up: vec!["Up".into(), "k".into()],
                down: vec!["Down".into(), "j".into()],
                page_up: vec!["PageUp".into()],
                page_down: vec!["PageDown".into(), "Space".into()],
                top: vec!["Home".into(), "g".into()],
            },
            input_box: InputBoxShortcuts {
                confirm: vec!["Enter".into()],
                cancel: vec!["Esc".into()],
                backspace: vec!["Backspace".into()],
                delete: vec!["Delete".into()],
                left: vec!["Left".into()],
                right: vec!["Right".into()],
                home: vec!["Home".into()],
                end: vec!["End".into()],
                clear_line: vec!["Ctrl+u".into()],
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
    // ショートカット文字列を分解する（例: "Ctrl+u", "a", "Enter"）。
    let parts: Vec<&str> = shortcut.split('+').collect();

    let (modifiers_str, key_str) = if parts.len() > 1 {
        // 修飾キー付きの形式（例: "Ctrl+u"）。
        (&parts[0..parts.len() - 1], parts[parts.len() - 1])
    } else {
        // 修飾キーなしの形式（例: "a", "Enter"）。
        (&[][..], parts[0])
    };

    // 修飾キーを解析して期待値を作る。
    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match *modifier {
            "Ctrl" | "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "Alt" | "alt" => expected_modifiers |= KeyModifiers::ALT,
            "Shift" | "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    // 修飾キーが一致しなければ即座に不一致とする。
    if key.modifiers != expected_modifiers {
        return false;
    }

    // キーコードの種別ごとに一致判定を行う。
    match key_str {
        "Enter" | "enter" => key.code == KeyCode::Enter,
        "Esc" | "esc" => key.code == KeyCode::Esc,
        "Tab" | "tab" => key.code == KeyCode::Tab,
        "Space" | "space" => key.code == KeyCode::Char(' '),
        "Backspace" | "backspace" => key.code == KeyCode::Backspace,
        "Delete" | "delete" => key.code == KeyCode::Delete,
        "Up" | "up" => key.code == KeyCode::Up,
        "Down" | "down" => key.code == KeyCode::Down,
        "Left" | "left" => key.code == KeyCode::Left,
        "Right" | "right" => key.code == KeyCode::Right,
        "Home" | "home" => key.code == KeyCode::Home,
        "End" | "end" => key.code == KeyCode::End,
        "PageUp" | "pageup" => key.code == KeyCode::PageUp,
        "PageDown" | "pagedown" => key.code == KeyCode::PageDown,
        // 単一文字は Char として比較する。
        s if s.chars().count() == 1 => s
            .chars()
            .next()
            .is_some_and(|c| key.code == KeyCode::Char(c)),
        _ => false,
    }
}

/// ショートカットキーの配列を表示用文字列に変換する。
pub fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_shortcut_simple_char() {
        // 単一文字の一致判定を検証する。
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("q")]));
        assert!(!matches_shortcut(&key, &[String::from("w")]));
    }

    #[test]
    fn test_matches_shortcut_with_modifier() {
        // 修飾キー付きの一致判定を検証する。
        let key = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&key, &[String::from("Ctrl+u")]));
        assert!(!matches_shortcut(&key, &[String::from("u")]));
    }

    #[test]
    fn test_matches_shortcut_paging_keys() {
        // ページ送りとスペースの一致判定を検証する。
        let pd = KeyEvent::new(KeyCode::PageDown, KeyModifiers::empty());
        let sp = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::empty());
        let keys = vec![String::from("PageDown"), String::from("Space")];
        assert!(matches_shortcut(&pd, &keys));
        assert!(matches_shortcut(&sp, &keys));
        let pu = KeyEvent::new(KeyCode::PageUp, KeyModifiers::empty());
        assert!(!matches_shortcut(&pu, &keys));
    }

    #[test]
    fn test_default_pick_file_bindings() {
        // ファイル選択は o と Enter の両方で開ける。
        let sc = Shortcuts::default();
        let o = KeyEvent::new(KeyCode::Char('o'), KeyModifiers::empty());
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::empty());
        assert!(matches_shortcut(&o, &sc.main.pick_file));
        assert!(matches_shortcut(&enter, &sc.main.pick_file));
        assert_eq!(format_keys(&sc.main.pick_file), "o/Enter");
    }

    #[test]
    fn test_shortcuts_toml_override() {
        // 一部キーを差し替えたTOMLを読み込めることを確認する。
        let mut sc = Shortcuts::default();
        sc.main.quit = vec!["Ctrl+q".into()];
        let text = toml::to_string_pretty(&sc).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcut.toml");
        std::fs::write(&path, text).unwrap();

        let loaded = Shortcuts::load_or_default(&path).unwrap();
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&key, &loaded.main.quit));
    }
}
