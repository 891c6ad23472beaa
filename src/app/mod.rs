//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc;

use crate::{
    config::Config,
    drop_surface::{self, DropSurface},
    events::UiState,
    input::InputBoxState,
    pending::PendingFile,
    report::ReportView,
    shortcuts::Shortcuts,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
    workflow::{WorkflowController, WorkflowState},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// メモリ上の現在設定。
    pub cfg: Config,
    /// ステータスやログなどUI固有の状態。
    pub ui: UiState,
    /// アップロードの状態機械（唯一の状態の持ち主）。
    pub workflow: WorkflowController,
    /// ドラッグ中表示のフラグを持つドロップ面。
    pub drop_surface: DropSurface,
    /// ファイルピッカーの入力ボックス（開いている間はSome）。
    pub input_box: Option<InputBoxState>,
    /// 結果オーバーレイのスクロール位置。
    pub report_view: ReportView,
    /// 現在のサイクルで選ばれたファイルの表示名。
    pub current_name: Option<String>,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

impl App {
    /// 設定とチャネルからアプリ状態を組み立てる。
    pub fn new(
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        let ceiling = cfg.limits.max_file_size;
        Self {
            cfg,
            ui: UiState::new(),
            workflow: WorkflowController::new(ceiling),
            drop_surface: DropSurface::new(ceiling),
            input_box: None,
            report_view: ReportView::default(),
            current_name: None,
            worker_tx,
            worker_rx,
            shortcuts,
        }
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込む（初回はデフォルトを生成）。
    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?;

    // ショートカット設定を読み込む（無ければデフォルト）。
    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;

    // Worker通信用のコマンド/イベントチャネルを作る。
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(16);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(64);

    // 設定スナップショットでWorkerを起動する。
    tokio::spawn(worker::run(rx_cmd, tx_ev, cfg.clone()));

    let mut app = App::new(cfg, shortcuts, tx_cmd, rx_ev);
    app.ui.push_log(format!("endpoint: {}", app.cfg.upload_url()));

    loop {
        // 現在の状態を描画する。
        terminal.draw(|f| draw(f, &app))?;
        app.ui.tick = app.ui.tick.wrapping_add(1);

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(k) => {
                    // どの状態でもCtrl+Cで終了できるようにする。
                    if is_ctrl_c(&k) {
                        break;
                    }
                    if handle_key(&mut app, k).await? {
                        break;
                    }
                }
                Event::Paste(text) => handle_paste(&mut app, &text).await?,
                Event::FocusLost => app.drop_surface.drag_leave(),
                _ => {}
            }
        }
    }
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    match ev {
        WorkerEvent::Resolved { file_id, result } => {
            // 現在のファイル宛てでなければ捨てる。
            if !app.workflow.resolve(file_id, result) {
                app.ui.push_log("stale result ignored");
                return;
            }
            match app.workflow.state() {
                WorkflowState::ReportReady(_) => {
                    app.report_view = ReportView::default();
                    app.ui.status = "Report ready".into();
                    app.ui.push_log("report received");
                }
                _ => {
                    let msg = app.workflow.error_message().unwrap_or_default().to_string();
                    app.ui.status = "Upload failed".into();
                    app.ui.push_log(format!("failed: {msg}"));
                }
            }
        }
        WorkerEvent::Log(s) => app.ui.push_log(s),
        WorkerEvent::Error(s) => {
            tracing::error!("worker error: {s}");
            app.ui.notice = Some(s);
        }
    }
}

/// 選ばれたファイルをコントローラへ渡し、受理されればWorkerへ送る。
pub async fn submit_file(app: &mut App, file: PendingFile) -> Result<()> {
    app.ui.notice = None;
    app.current_name = Some(file.name.clone());
    app.ui.push_log(format!("selected {} ({} bytes)", file.name, file.size));

    match app.workflow.select_file(file) {
        Some(accepted) => {
            app.ui.status = format!("Uploading {}...", accepted.name);
            app.worker_tx.send(WorkerCmd::Transmit(accepted)).await?;
        }
        None => {
            app.ui.status = "File rejected".into();
            if let Some(msg) = app.workflow.error_message() {
                app.ui.push_log(format!("rejected: {msg}"));
            }
        }
    }
    Ok(())
}

/// ブラケットペーストを処理する（ファイルのドロップ、または入力欄への貼り付け）。
pub async fn handle_paste(app: &mut App, text: &str) -> Result<()> {
    // ピッカーが開いていれば通常の貼り付けとして扱う。
    if let Some(input_state) = app.input_box.as_mut() {
        input_state.insert_str(text);
        return Ok(());
    }
    // 結果表示中のドロップも新しい選択として扱い、結果を置き換える。
    app.drop_surface.drag_enter();
    app.drop_surface.drag_over();

    // 通常ファイルとして読めるパスだけを集める。
    let files: Vec<PendingFile> = drop_surface::parse_dropped_paths(text)
        .iter()
        .filter_map(|p| match PendingFile::from_path(p) {
            Ok(f) => Some(f),
            Err(e) => {
                tracing::warn!("dropped path skipped: {e}");
                None
            }
        })
        .collect();

    let dropped = app.drop_surface.drop(files);
    // 端末では貼り付け1回がドラッグ操作の全体なので、ここで必ず解除する。
    app.drop_surface.drag_leave();
    match dropped {
        Some(file) => submit_file(app, file).await?,
        None => app.ui.notice = Some("Dropped text is not a readable file".into()),
    }
    Ok(())
}
