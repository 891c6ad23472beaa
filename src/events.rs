//! 描画側と共有するUI固有の状態。

/// ログの保持上限。
const LOG_CAPACITY: usize = 200;

/// スピナーのフレーム。
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// 描画側と共有するUI状態（ワークフロー状態は含まない）。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 画面下部のステータス文言。
    pub status: String,
    /// 右側パネルに表示するログ。
    pub log: Vec<String>,
    /// ワークフロー外のエラー（パスが読めない等）。
    pub notice: Option<String>,
    /// スピナー用の描画カウンタ。
    pub tick: usize,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            status: "Ready".into(),
            log: vec![],
            notice: None,
            tick: 0,
        }
    }

    /// 時刻付きでログを追加し、古いものから捨てる。
    pub fn push_log(&mut self, msg: impl AsRef<str>) {
        let ts = chrono::Local::now().format("%H:%M:%S");
        self.log.push(format!("{ts} {}", msg.as_ref()));
        if self.log.len() > LOG_CAPACITY {
            let excess = self.log.len() - LOG_CAPACITY;
            self.log.drain(..excess);
        }
    }

    /// 現在のスピナー文字。
    pub fn spinner(&self) -> char {
        SPINNER[self.tick % SPINNER.len()]
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
