//! レイアウト計算のヘルパー関数

use ratatui::prelude::*;

/// 全画面共通の3領域
pub struct MainLayout {
    /// 画面本体
    pub body: Rect,
    /// HELPバーの領域
    pub help_bar: Rect,
    /// STATUSバーの領域
    pub status_bar: Rect,
}

/// 予約フォーム画面の3カラム
pub struct BookLayout {
    /// サービス選択パネル
    pub services: Rect,
    /// 入力フォーム
    pub form: Rect,
    /// 予約サマリー
    pub summary: Rect,
}

/// 画面を Body + HELP + STATUS に分割
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

/// Body領域をサービス 25% / フォーム 50% / サマリー 25% に分割
pub fn create_book_layout(area: Rect) -> BookLayout {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(area);

    BookLayout {
        services: chunks[0],
        form: chunks[1],
        summary: chunks[2],
    }
}

/// トップ画面をタイトル / サービス一覧 / 連絡先 に分割
pub fn create_home_layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(4),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}
