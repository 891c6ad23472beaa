//! TUI描画関連の関数。

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::{
    input, layout, report,
    shortcuts::{Shortcuts, format_keys},
    workflow::WorkflowState,
};

use super::App;

/// カードの背景色。
const CARD_BG: Color = Color::Rgb(195, 166, 123);

/// 画面全体のレイアウトを描画する。
pub fn draw(f: &mut Frame, app: &App) {
    // メインレイアウト（Body + HELP + STATUS）を作る。
    let main_layout = layout::create_main_layout(f.area());
    let body_layout = layout::create_body_layout(main_layout.body);

    f.render_widget(build_card(app), body_layout.card);

    // INFOパネル：設定と最近のログ。
    let info_panel = Paragraph::new(build_info_text(app))
        .block(Block::default().borders(Borders::ALL).title("INFO"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_panel, body_layout.info_panel);

    let help_bar = Paragraph::new(get_help_text(app))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);

    // ドラッグ中はINFOパネル側に案内を出す（カードの進捗・エラー表示は隠さない）。
    if app.drop_surface.is_active() {
        draw_drop_overlay(f, body_layout.info_panel);
    }

    if let Some(input_state) = &app.input_box {
        let help = format!(
            "{}: open | {}: cancel | {}: clear",
            format_keys(&app.shortcuts.input_box.confirm),
            format_keys(&app.shortcuts.input_box.cancel),
            format_keys(&app.shortcuts.input_box.clear_line)
        );
        input::render_input_box(f, input_state, &help);
    }

    // 結果ダイアログは最前面。
    if let Some(doc) = app.workflow.report() {
        let help = format!(
            "{}: close | {}/{}: scroll",
            format_keys(&app.shortcuts.report.close),
            format_keys(&app.shortcuts.report.up),
            format_keys(&app.shortcuts.report.down)
        );
        report::render_report_overlay(f, doc, &app.report_view, &help);
    }
}

/// アップロードカード（見出し・ボタン・進捗またはエラー・上限表示）。
fn build_card(app: &App) -> Paragraph<'static> {
    let state = app.workflow.state();

    let mut lines = vec![
        Line::from(""),
        Line::from("Upload the file that you wish to see details of").bold(),
        Line::from(""),
    ];

    // ピッカーの有効/無効をボタンの見た目で示す。
    let button = format!("[ Upload Audio ({}) ]", format_keys(&app.shortcuts.main.pick_file));
    lines.push(if app.workflow.picker_enabled() {
        Line::from(button).style(Style::default().fg(Color::White).bg(Color::Blue))
    } else {
        Line::from(button).style(Style::default().fg(Color::DarkGray))
    });
    lines.push(Line::from(""));

    // 失敗後は状態にファイルが残らないので、選択時の表示名で補う。
    let name = app
        .workflow
        .pending_file()
        .map(|f| f.name.clone())
        .or_else(|| app.current_name.clone());
    if *state != WorkflowState::Idle
        && let Some(name) = name
    {
        lines.push(Line::from(name));
        lines.push(Line::from(""));
        match app.workflow.error_message() {
            Some(msg) => lines.push(
                Line::from(msg.to_string())
                    .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            ),
            None if matches!(state, WorkflowState::Transmitting(_)) => {
                lines.push(Line::from(format!("{} Inspecting...", app.ui.spinner())))
            }
            None => {}
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from(format!(
        "Max File Size: {}",
        format_size(app.cfg.limits.max_file_size)
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("UPLOAD"))
        .style(Style::default().fg(Color::Black).bg(CARD_BG))
        .wrap(Wrap { trim: true })
}

/// INFOパネル用のテキストを構築する。
fn build_info_text(app: &App) -> String {
    format!(
        "Endpoint: {}\nField: {}\nTimeout: {}s\n\nLog:\n{}",
        app.cfg.upload_url(),
        app.cfg.server.field_name,
        app.cfg.server.timeout_secs,
        app.ui
            .log
            .iter()
            .rev()
            .take(12)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// ステータスバーを構築する。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let phase = state_label(app.workflow.state());
    let status_text = match &app.ui.notice {
        Some(err) => format!("[{phase}] ERROR: {err}"),
        None => format!("[{phase}] {}", app.ui.status),
    };

    let mut status_bar = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });

    // エラー時は赤色で強調表示する。
    if app.ui.notice.is_some() {
        status_bar = status_bar.style(Style::default().fg(Color::Red));
    }
    status_bar
}

/// ドロップ待ちのオーバーレイを描画する。
fn draw_drop_overlay(f: &mut Frame, area: Rect) {
    f.render_widget(Clear, area);
    let lines = vec![
        Line::from(""),
        Line::from("Drop the file to inspect it").bold(),
    ];
    let overlay = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("DROP"))
        .style(Style::default().fg(Color::Gray).bg(Color::Black));
    f.render_widget(overlay, area);
}

/// 現在の状況に応じたヘルプ文字列を返す。
fn get_help_text(app: &App) -> String {
    let sc: &Shortcuts = &app.shortcuts;
    format!(
        "{}: pick file | drag a file onto the window | {}: dismiss | {}: quit",
        format_keys(&sc.main.pick_file),
        format_keys(&sc.main.dismiss),
        format_keys(&sc.main.quit)
    )
}

/// 状態を短いラベルへ変換する。
fn state_label(s: &WorkflowState) -> &'static str {
    match s {
        WorkflowState::Idle => "Idle",
        WorkflowState::FileSelected(_) => "Selected",
        WorkflowState::Rejected(..) => "Rejected",
        WorkflowState::Transmitting(_) => "Uploading",
        WorkflowState::ReportReady(_) => "Report",
        WorkflowState::TransmissionFailed(_) => "Failed",
    }
}

/// バイト数をMB表記へ変換する。
fn format_size(bytes: u64) -> String {
    if bytes % 1_000_000 == 0 {
        format!("{} MB", bytes / 1_000_000)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    }
}
