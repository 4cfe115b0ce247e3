//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use crate::{
    api::Capabilities,
    booking::{
        BookingDraft, BookingRecord, Field, catalog::ServiceCatalog, controller::BookingController,
    },
    config::Config,
    events::{Screen, UiState},
    input::InputBoxState,
    shortcuts::Shortcuts,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// メモリ上の現在設定。
    pub cfg: Config,
    /// 選択位置やステータスなどUI固有の状態。
    pub ui: UiState,
    /// 予約可能なサービス一覧。
    pub catalog: ServiceCatalog,
    /// 予約フォームのセッション（フォーム表示中のみSome）。
    pub form: Option<BookingController>,
    /// サービス検索語。
    pub service_search: String,
    /// 予約一覧画面の内容。
    pub bookings: Vec<BookingRecord>,
    /// 予約一覧の取得中フラグ。
    pub bookings_loading: bool,
    /// 端末に位置情報の取得手段があるか。
    pub geolocation_supported: bool,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

impl App {
    /// 設定とWorkerチャネルからアプリ状態を組み立てる。
    pub fn new(
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
        geolocation_supported: bool,
    ) -> Self {
        let catalog = ServiceCatalog::from_config(&cfg.services);
        Self {
            cfg,
            ui: UiState::new(),
            catalog,
            form: None,
            service_search: String::new(),
            bookings: vec![],
            bookings_loading: false,
            geolocation_supported,
            worker_tx,
            worker_rx,
            input_box: None,
            shortcuts,
        }
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込む（初回はデフォルトを生成）。
    let cfg = Config::load_or_default(&PathBuf::from("config.toml"))?;
    let shortcuts = Shortcuts::load_or_default(PathBuf::from("shortcut.toml"))?;

    // 外部サービスへの接続手段を設定から組み立てる。
    let caps = Capabilities::from_config(&cfg)?;
    let geolocation_supported = caps.geolocator.is_some();
    tracing::info!(
        backend = %cfg.backend.base_url,
        geolocation = ?cfg.geolocation.source,
        "capabilities ready"
    );

    // Worker通信用のコマンド/イベントチャネルを作る。
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);
    tokio::spawn(worker::run(rx_cmd, tx_ev, caps));

    let mut app = App::new(cfg, shortcuts, tx_cmd, rx_ev, geolocation_supported);

    loop {
        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }

        // 予約完了後のリダイレクト期限を確認する。
        if app
            .form
            .as_mut()
            .is_some_and(|form| form.poll_redirect(Instant::now()))
        {
            tracing::info!("redirecting home after booking");
            leave_booking_form(&mut app, Screen::Home);
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(k) = event::read()?
        {
            // どの画面でもCtrl+Cで終了できるようにする。
            if is_ctrl_c(&k) {
                break;
            }
            if handle_key(&mut app, k).await? {
                break;
            }
        }
    }

    // 終了時もフォームを破棄してタイマーを止める。
    if let Some(form) = app.form.as_mut() {
        form.dispose();
    }
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    match ev {
        WorkerEvent::SubmitFinished { session, result } => {
            // 現在のセッション宛て以外は破棄する。
            let Some(form) = app.form.as_mut().filter(|f| f.session() == session) else {
                tracing::debug!("stale submit result dropped: {session}");
                return;
            };
            let ok = result.is_ok();
            form.finish_submit(result, Instant::now());
            app.ui.status = if ok {
                "Booking Successful! Redirecting to home...".into()
            } else {
                "Booking failed".into()
            };
        }
        WorkerEvent::AddressDetected { session, result } => {
            let Some(form) = app.form.as_mut().filter(|f| f.session() == session) else {
                tracing::debug!("stale detection result dropped: {session}");
                return;
            };
            let ok = result.is_ok();
            form.finish_detect(result);
            if ok {
                app.ui.status = "Address detected".into();
            }
        }
        WorkerEvent::BookingsLoaded(list) => {
            app.bookings_loading = false;
            app.bookings = list;
            app.ui.bookings_selected = 0;
            app.ui.status = format!("Loaded {} bookings", app.bookings.len());
        }
        WorkerEvent::Error(s) => {
            app.bookings_loading = false;
            app.ui.error = Some(s);
        }
    }
}

/// 新しいフォームセッションを開始して予約画面へ移る。
pub fn open_booking_form(app: &mut App, service: Option<String>) {
    // 前のセッションが残っていれば破棄する。
    if let Some(old) = app.form.as_mut() {
        old.dispose();
    }
    let service = service.unwrap_or_else(|| app.catalog.first().to_string());
    let form = BookingController::new(
        BookingDraft::starting_now(service),
        app.geolocation_supported,
        app.cfg.redirect_delay(),
    );
    tracing::info!("booking form opened: {}", form.session());
    app.form = Some(form);
    app.service_search.clear();
    app.ui.focus = Field::Name;
    app.ui.status = "Book a Professional".into();
    app.ui.go(Screen::Book);
}

/// フォームセッションを破棄して別画面へ移る。
pub fn leave_booking_form(app: &mut App, to: Screen) {
    if let Some(mut form) = app.form.take() {
        form.dispose();
        tracing::info!("booking form closed: {}", form.session());
    }
    app.input_box = None;
    app.ui.go(to);
}

/// 予約一覧の再取得をWorkerへ依頼する。
pub async fn request_bookings(app: &mut App) -> Result<()> {
    if app.bookings_loading {
        return Ok(());
    }
    app.bookings_loading = true;
    app.ui.status = "Loading bookings...".into();
    app.worker_tx.send(WorkerCmd::LoadBookings).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{booking::controller::SubmissionState, error::SubmitError};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    struct Harness {
        app: App,
        cmd_rx: mpsc::Receiver<WorkerCmd>,
        _ev_tx: mpsc::Sender<WorkerEvent>,
    }

    fn harness() -> Harness {
        let (tx_cmd, cmd_rx) = mpsc::channel(8);
        let (ev_tx, rx_ev) = mpsc::channel(8);
        let app = App::new(Config::default(), Shortcuts::default(), tx_cmd, rx_ev, true);
        Harness {
            app,
            cmd_rx,
            _ev_tx: ev_tx,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn fill(app: &mut App) {
        let form = app.form.as_mut().expect("form open");
        form.set_field(Field::Name, "Asha").expect("text");
        form.set_field(Field::Phone, "9876543210").expect("text");
        form.set_field(Field::Address, "12 Lane").expect("text");
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let mut h = harness();
        open_booking_form(&mut h.app, None);
        handle_key(&mut h.app, key(KeyCode::Enter)).await.expect("key");

        assert!(h.cmd_rx.try_recv().is_err());
        let form = h.app.form.as_ref().expect("form open");
        assert_eq!(form.state(), SubmissionState::Idle);
        assert_eq!(form.error(Field::Name), Some("Name is required"));
        assert_eq!(form.error(Field::Phone), Some("Phone number is required"));
    }

    #[tokio::test]
    async fn test_valid_form_sends_one_request_for_two_presses() {
        let mut h = harness();
        open_booking_form(&mut h.app, Some("AC Repair".into()));
        fill(&mut h.app);
        handle_key(&mut h.app, key(KeyCode::Enter)).await.expect("key");
        handle_key(&mut h.app, key(KeyCode::Enter)).await.expect("key");

        match h.cmd_rx.try_recv() {
            Ok(WorkerCmd::SubmitBooking { request, .. }) => {
                assert_eq!(request.service, "AC Repair");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(h.cmd_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_session_results_are_dropped() {
        let mut h = harness();
        open_booking_form(&mut h.app, None);
        fill(&mut h.app);
        handle_key(&mut h.app, key(KeyCode::Enter)).await.expect("key");
        let Ok(WorkerCmd::SubmitBooking { session: old, .. }) = h.cmd_rx.try_recv() else {
            panic!("expected submission");
        };

        // Leave and reopen: a new session replaces the old one.
        leave_booking_form(&mut h.app, Screen::Home);
        open_booking_form(&mut h.app, None);
        handle_worker_event(
            &mut h.app,
            WorkerEvent::SubmitFinished {
                session: old,
                result: Err(SubmitError::Rejected("late".into())),
            },
        );
        let form = h.app.form.as_ref().expect("form open");
        assert!(form.notice().is_none());
        assert_eq!(form.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_success_then_redirect_home() {
        let mut h = harness();
        open_booking_form(&mut h.app, None);
        fill(&mut h.app);
        handle_key(&mut h.app, key(KeyCode::Enter)).await.expect("key");
        let session = h.app.form.as_ref().expect("form open").session();

        handle_worker_event(
            &mut h.app,
            WorkerEvent::SubmitFinished {
                session,
                result: Ok(()),
            },
        );
        let form = h.app.form.as_mut().expect("form open");
        assert_eq!(form.state(), SubmissionState::Succeeded);
        assert!(form.poll_redirect(Instant::now() + Duration::from_secs(5)));

        leave_booking_form(&mut h.app, Screen::Home);
        assert_eq!(h.app.ui.screen, Screen::Home);
        assert!(h.app.form.is_none());
    }

    #[tokio::test]
    async fn test_detect_key_starts_one_detection() {
        let mut h = harness();
        open_booking_form(&mut h.app, None);
        handle_key(&mut h.app, key(KeyCode::Char('d'))).await.expect("key");
        handle_key(&mut h.app, key(KeyCode::Char('d'))).await.expect("key");

        assert!(matches!(
            h.cmd_rx.try_recv(),
            Ok(WorkerCmd::DetectAddress { .. })
        ));
        assert!(h.cmd_rx.try_recv().is_err());
        assert!(h.app.form.as_ref().expect("form open").is_detecting());
    }

    #[tokio::test]
    async fn test_tab_blurs_the_field_being_left() {
        let mut h = harness();
        open_booking_form(&mut h.app, None);
        handle_key(&mut h.app, key(KeyCode::Tab)).await.expect("key");

        assert_eq!(h.app.ui.focus, Field::Phone);
        let form = h.app.form.as_ref().expect("form open");
        assert_eq!(form.error(Field::Name), Some("Name is required"));
        // Not visited yet.
        assert_eq!(form.error(Field::Phone), None);
    }
}
