//! 画面遷移用のUI状態と画面種別。

use crate::booking::Field;

/// TUIで現在表示中の画面。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// トップ画面（サービス一覧とメニュー）。
    Home,
    /// 予約フォーム画面。
    Book,
    /// 予約一覧画面。
    MyBookings,
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 現在の画面。
    pub screen: Screen,
    /// トップ画面で選択中のサービス行。
    pub home_selected: usize,
    /// 予約一覧の選択行。
    pub bookings_selected: usize,
    /// 予約フォームでフォーカス中のフィールド。
    pub focus: Field,
    /// 画面下部のステータス文言。
    pub status: String,
    /// エラーメッセージ（強調表示用）。
    pub error: Option<String>,
}

impl UiState {
    /// トップ画面から始まる初期状態。
    pub fn new() -> Self {
        Self {
            screen: Screen::Home,
            home_selected: 0,
            bookings_selected: 0,
            focus: Field::Name,
            status: "Ready".into(),
            error: None,
        }
    }

    /// 画面を切り替え、前画面のエラー表示を消す。
    pub fn go(&mut self, screen: Screen) {
        self.screen = screen;
        self.error = None;
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
