//! キー入力ハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    booking::Field,
    events::Screen,
    input::{InputBoxState, InputCallbackId},
    shortcuts::matches_shortcut,
    worker::WorkerCmd,
};

use super::{App, leave_booking_form, open_booking_form, request_bookings};

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが開いていれば最優先で処理する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k);
    }

    // 通知ポップアップは確認されるまで他の操作を受け付けない。
    if let Some(form) = app.form.as_mut()
        && form.notice().is_some()
    {
        if matches_shortcut(&k, &app.shortcuts.alert.dismiss) {
            form.acknowledge();
        }
        return Ok(false);
    }

    match app.ui.screen {
        Screen::Home => handle_home_key(app, k).await,
        Screen::Book => handle_book_key(app, k).await,
        Screen::MyBookings => handle_bookings_key(app, k).await,
    }
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// トップ画面のキー処理。
async fn handle_home_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.home;

    if matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if matches_shortcut(&k, &sc.book) {
        // 選択中のサービスを初期値にしてフォームを開く。
        let service = app
            .catalog
            .items()
            .get(app.ui.home_selected)
            .map(|s| s.name.clone());
        open_booking_form(app, service);
    } else if matches_shortcut(&k, &sc.my_bookings) {
        app.ui.go(Screen::MyBookings);
        request_bookings(app).await?;
    } else if matches_shortcut(&k, &sc.down) {
        if app.ui.home_selected + 1 < app.catalog.items().len() {
            app.ui.home_selected += 1;
        }
    } else if matches_shortcut(&k, &sc.up) {
        app.ui.home_selected = app.ui.home_selected.saturating_sub(1);
    }

    Ok(false)
}

/// 予約フォームのキー処理。
async fn handle_book_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.book;
    let Some(form) = app.form.as_mut() else {
        app.ui.go(Screen::Home);
        return Ok(false);
    };
    let focus = app.ui.focus;

    if matches_shortcut(&k, &sc.back) {
        leave_booking_form(app, Screen::Home);
    } else if matches_shortcut(&k, &sc.next_field) {
        // フォーカスが外れたフィールドだけを検証する。
        form.blur(focus);
        app.ui.focus = focus.next();
    } else if matches_shortcut(&k, &sc.prev_field) {
        form.blur(focus);
        app.ui.focus = focus.prev();
    } else if matches_shortcut(&k, &sc.search) {
        app.input_box = Some(InputBoxState::open(
            Field::Service.prompt(),
            app.service_search.clone(),
            InputCallbackId::ServiceSearch,
        ));
    } else if matches_shortcut(&k, &sc.next_service) || matches_shortcut(&k, &sc.prev_service) {
        // 検索語で絞り込んだ一覧の中で選択を移動する。
        let current = form.draft().service.clone();
        let picked = if matches_shortcut(&k, &sc.next_service) {
            app.catalog.next_after(&current, &app.service_search)
        } else {
            app.catalog.prev_before(&current, &app.service_search)
        };
        if let Some(name) = picked {
            let _ = form.set_field(Field::Service, &name);
        }
    } else if matches_shortcut(&k, &sc.edit_field) {
        if focus == Field::Service {
            // サービスは一覧から選ぶため検索ボックスを開く。
            app.input_box = Some(InputBoxState::open(
                Field::Service.prompt(),
                app.service_search.clone(),
                InputCallbackId::ServiceSearch,
            ));
        } else {
            app.input_box = Some(InputBoxState::open(
                focus.prompt(),
                form.draft().display(focus),
                InputCallbackId::BookField(focus),
            ));
        }
    } else if matches_shortcut(&k, &sc.detect_location) {
        match form.begin_detect() {
            Ok(true) => {
                let session = form.session();
                app.ui.status = "Detecting...".into();
                app.worker_tx
                    .send(WorkerCmd::DetectAddress { session })
                    .await?;
            }
            Ok(false) => {}
            Err(e) => tracing::info!("detection unavailable: {e}"),
        }
    } else if matches_shortcut(&k, &sc.submit) {
        match form.begin_submit() {
            Ok(Some(request)) => {
                let session = form.session();
                app.ui.status = "Booking...".into();
                app.worker_tx
                    .send(WorkerCmd::SubmitBooking { session, request })
                    .await?;
            }
            Ok(None) => {}
            Err(e) => {
                app.ui.status = e.to_string();
            }
        }
    }

    Ok(false)
}

/// 予約一覧画面のキー処理。
async fn handle_bookings_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.bookings;

    if matches_shortcut(&k, &sc.back) {
        app.ui.go(Screen::Home);
    } else if matches_shortcut(&k, &sc.refresh) {
        request_bookings(app).await?;
    } else if matches_shortcut(&k, &sc.down) {
        if app.ui.bookings_selected + 1 < app.bookings.len() {
            app.ui.bookings_selected += 1;
        }
    } else if matches_shortcut(&k, &sc.up) {
        app.ui.bookings_selected = app.ui.bookings_selected.saturating_sub(1);
    }

    Ok(false)
}

/// 入力ボックスのキー処理。
fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    let sc = &app.shortcuts.input_box;

    if is_ctrl_c(&k) {
        return Ok(true);
    }

    if matches_shortcut(&k, &sc.confirm) {
        // 閉じる前に値とコールバック種別を取り出す。
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;
        apply_input_callback(app, callback_id, value);
    } else if matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }

    Ok(false)
}

/// 入力ボックスのコールバックを適用する。
fn apply_input_callback(app: &mut App, callback_id: InputCallbackId, value: String) {
    match callback_id {
        InputCallbackId::ServiceSearch => {
            app.service_search = value.trim().to_string();
            // 選択中のサービスが絞り込みで隠れたら先頭の候補へ移す。
            if let Some(form) = app.form.as_mut() {
                let visible = app.catalog.filter(&app.service_search);
                let current = form.draft().service.clone();
                if !visible.iter().any(|s| s.name == current)
                    && let Some(first) = visible.first()
                {
                    let _ = form.set_field(Field::Service, &first.name);
                }
            }
        }
        InputCallbackId::BookField(field) => {
            let Some(form) = app.form.as_mut() else {
                return;
            };
            match form.set_field(field, &value) {
                Ok(()) => app.ui.error = None,
                Err(hint) => app.ui.error = Some(hint),
            }
            // 入力確定はフォーカスアウトとして扱う。
            form.blur(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, shortcuts::Shortcuts};
    use tokio::sync::mpsc;

    fn app() -> App {
        let (tx_cmd, _rx_cmd) = mpsc::channel(8);
        let (_tx_ev, rx_ev) = mpsc::channel(8);
        let mut app = App::new(Config::default(), Shortcuts::default(), tx_cmd, rx_ev, false);
        open_booking_form(&mut app, None);
        app
    }

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty())
    }

    #[test]
    fn test_phone_entry_validates_on_confirm() {
        // 入力確定時にそのフィールドだけ検証されることを確認する。
        let mut app = app();
        app.ui.focus = Field::Phone;
        app.input_box = Some(InputBoxState::open(
            Field::Phone.prompt(),
            String::new(),
            InputCallbackId::BookField(Field::Phone),
        ));
        for c in "12345".chars() {
            handle_input_box_key(&mut app, press(c)).expect("key");
        }
        handle_input_box_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::empty()))
            .expect("key");

        let form = app.form.as_ref().expect("form open");
        assert_eq!(form.draft().phone, "12345");
        assert_eq!(
            form.error(Field::Phone),
            Some("Enter a valid 10-digit phone number")
        );
        assert_eq!(form.error(Field::Name), None);
    }

    #[test]
    fn test_bad_date_keeps_previous_value() {
        let mut app = app();
        let before = app.form.as_ref().expect("form open").draft().date;
        apply_input_callback(&mut app, InputCallbackId::BookField(Field::Date), "tomorrow".into());
        assert_eq!(app.form.as_ref().expect("form open").draft().date, before);
        assert!(app.ui.error.is_some());
    }

    #[test]
    fn test_search_moves_hidden_selection() {
        // 絞り込みで隠れたサービスは先頭候補へ置き換わる。
        let mut app = app();
        apply_input_callback(&mut app, InputCallbackId::ServiceSearch, "light".into());
        assert_eq!(
            app.form.as_ref().expect("form open").draft().service,
            "Light Installation"
        );
    }

    #[tokio::test]
    async fn test_unsupported_location_shows_notice_until_dismissed() {
        let mut app = app();
        handle_key(&mut app, press('d')).await.expect("key");
        let notice = app
            .form
            .as_ref()
            .and_then(|f| f.notice())
            .map(|n| n.message.clone());
        assert_eq!(notice.as_deref(), Some("Location not supported on this device."));

        // 通知表示中のキーは確認以外無視される。
        handle_key(&mut app, press('e')).await.expect("key");
        assert!(app.input_box.is_none());
        handle_key(&mut app, KeyEvent::new(KeyCode::Esc, KeyModifiers::empty()))
            .await
            .expect("key");
        assert!(app.form.as_ref().expect("form open").notice().is_none());
        assert_eq!(app.ui.screen, Screen::Book);
    }
}
