//! キー入力ハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::Path;

use crate::{drop_surface, input::InputBoxState, pending::PendingFile, shortcuts};

use super::{App, submit_file};

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが開いていれば最優先で処理する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }
    // 結果オーバーレイは入力ボックスの次に優先する。
    if app.workflow.report().is_some() {
        handle_report_key(app, k);
        return Ok(false);
    }
    handle_main_key(app, k)
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// メイン画面のキー処理。
fn handle_main_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.main;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.pick_file) {
        // 送信中はピッカーを開かない。
        if app.workflow.picker_enabled() {
            app.input_box = Some(InputBoxState::new("File path:", initial_dir()));
        } else {
            app.ui.status = "Upload in progress".into();
        }
    } else if shortcuts::matches_shortcut(&k, &sc.dismiss) {
        // エラー表示とドラッグ表示を片付ける。
        app.drop_surface.drag_leave();
        app.workflow.dismiss();
        app.ui.notice = None;
        app.ui.status = "Ready".into();
    }

    Ok(false)
}

/// 結果オーバーレイのキー処理。閉じたらワークフローを初期状態へ戻す。
fn handle_report_key(app: &mut App, k: KeyEvent) {
    let Some(doc) = app.workflow.report() else {
        return;
    };
    let mut closed = false;
    app.report_view
        .handle_key(&k, &app.shortcuts.report, doc, || closed = true);

    if closed {
        app.workflow.dismiss();
        app.current_name = None;
        app.ui.status = "Ready".into();
    }
}

/// 入力ボックスのキー処理。
async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    let sc = &app.shortcuts.input_box;

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // 入力ボックスを閉じてから値を適用する。
        let value = input_state.value.clone();
        app.input_box = None;
        pick_path(app, &value).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        // コントロールキーでない場合のみ挿入する。
        input_state.insert_char(c);
    }

    Ok(false)
}

/// ピッカーで確定したパスをファイルとして転送する。
async fn pick_path(app: &mut App, value: &str) -> Result<()> {
    match resolve_picked(value) {
        Ok(file) => submit_file(app, file).await?,
        Err(e) => {
            tracing::warn!("picker: {e}");
            app.ui.notice = Some(e.to_string());
        }
    }
    Ok(())
}

/// 入力値をそのままパスとして読み、駄目なら引用符付きやfile:// 形式として解釈し直す。
fn resolve_picked(value: &str) -> Result<PendingFile> {
    let literal = PendingFile::from_path(Path::new(value.trim()));
    if literal.is_ok() {
        return literal;
    }
    match drop_surface::parse_dropped_paths(value).first() {
        Some(path) if path.as_path() != Path::new(value.trim()) => PendingFile::from_path(path),
        _ => literal,
    }
}

/// ピッカーの初期値（カレントディレクトリ）。
fn initial_dir() -> String {
    std::env::current_dir()
        .map(|d| format!("{}{}", d.display(), std::path::MAIN_SEPARATOR))
        .unwrap_or_default()
}
