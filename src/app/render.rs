//! TUI描画関連の関数。

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::{
    booking::{
        Field,
        controller::{BookingController, SubmissionState},
    },
    events::Screen,
    input::{self, centered_popup},
    layout,
    shortcuts::Shortcuts,
};

use super::App;

/// 画面全体のレイアウトを描画する。
pub fn draw(f: &mut Frame, app: &App) {
    let main_layout = layout::create_main_layout(f.area());

    match app.ui.screen {
        Screen::Home => draw_home(f, app, main_layout.body),
        Screen::Book => draw_book(f, app, main_layout.body),
        Screen::MyBookings => draw_bookings(f, app, main_layout.body),
    }

    // HELPバー（画面ごとのショートカット）を描画する。
    let help_bar = Paragraph::new(get_help_text(&app.ui.screen, &app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);

    // ポップアップは最後に重ねる。
    if let Some(form) = &app.form
        && app.ui.screen == Screen::Book
    {
        if form.state() == SubmissionState::Succeeded {
            draw_success_popup(f, form);
        }
        if let Some(notice) = form.notice() {
            draw_alert(f, notice.title, &notice.message);
        }
    }
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
}

/// トップ画面を描画する。
fn draw_home(f: &mut Frame, app: &App, area: Rect) {
    let [hero, services, contact] = layout::create_home_layout(area);

    let title = Paragraph::new(vec![
        Line::from("WIRE-UP").bold().fg(Color::Blue),
        Line::from("Trusted electricians at your doorstep."),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, hero);

    // サービス一覧（選択行から予約できる）。
    let items: Vec<ListItem> = app
        .catalog
        .items()
        .iter()
        .map(|s| ListItem::new(format!("{:<24} ₹{}", s.name, s.price)))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Services We Offer"),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(255, 140, 0))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");
    let mut state = ListState::default();
    state.select(Some(app.ui.home_selected));
    f.render_stateful_widget(list, services, &mut state);

    let footer = Paragraph::new("Need Help?  +91 98765 43210  |  support@wireup.com")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Contact"));
    f.render_widget(footer, contact);
}

/// 予約フォーム画面を描画する。
fn draw_book(f: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };
    let book_layout = layout::create_book_layout(area);
    let draft = form.draft();

    // 左：絞り込み済みのサービス一覧。
    let visible = app.catalog.filter(&app.service_search);
    let service_lines: Vec<Line> = if visible.is_empty() {
        vec![Line::from("No services found").fg(Color::Gray)]
    } else {
        visible
            .iter()
            .map(|s| {
                if s.name == draft.service {
                    Line::from(format!("● {}", s.name)).fg(Color::Blue).bold()
                } else {
                    Line::from(format!("  {}", s.name))
                }
            })
            .collect()
    };
    let title = if app.service_search.is_empty() {
        "Select a service".to_string()
    } else {
        format!("Select a service [/{}]", app.service_search)
    };
    let services = Paragraph::new(service_lines)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(services, book_layout.services);

    // 中央：フォーム本体。
    f.render_widget(build_form(app, form), book_layout.form);

    // 右：サマリー。
    let price = app.catalog.price_of(&draft.service);
    let summary = Paragraph::new(vec![
        Line::from(format!("Name: {}", draft.name)),
        Line::from(format!("Service: {}", draft.service)),
        Line::from(format!("Date: {}", draft.display(Field::Date))),
        Line::from(format!("Time: {}", draft.display(Field::Time))),
        Line::from(format!("Price: ₹{price}")),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Your booking summary"),
    )
    .wrap(Wrap { trim: true });
    f.render_widget(summary, book_layout.summary);
}

/// フォームの各行（ラベル・値・エラー）を組み立てる。
fn build_form<'a>(app: &App, form: &'a BookingController) -> Paragraph<'a> {
    let draft = form.draft();
    let mut lines: Vec<Line> = vec![];

    for field in Field::ALL {
        let focused = field == app.ui.focus;
        let marker = if focused { "→" } else { " " };
        let required = if field == Field::Service { "" } else { " *" };
        let label = format!("{} {}{}: ", marker, field.label(), required);
        let value = draft.display(field);

        let mut line = Line::from(vec![
            Span::raw(label),
            Span::styled(value, Style::default().fg(Color::White)),
        ]);
        if form.error(field).is_some() {
            line = line.fg(Color::Red);
        }
        if focused {
            line = line.bold();
        }
        lines.push(line);

        if let Some(err) = form.error(field) {
            lines.push(Line::from(format!("    {err}")).fg(Color::Red));
        }
    }

    lines.push(Line::from(""));
    let detect = if form.is_detecting() {
        "Detecting..."
    } else {
        "Detect My Location"
    };
    lines.push(Line::from(format!("[d] {detect}")).fg(Color::Blue));

    let price = app.catalog.price_of(&draft.service);
    let submit = if form.is_submitting() {
        "Booking..."
    } else {
        "Book Now"
    };
    lines.push(Line::from(format!("Estimated price: ₹{price}    [Enter] {submit}")).bold());

    let title = match form.errors().len() {
        0 => "Book a Professional".to_string(),
        n => format!("Book a Professional ({n} to fix)"),
    };
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
}

/// 予約一覧画面を描画する。
fn draw_bookings(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("My Bookings");

    if app.bookings.is_empty() {
        let text = if app.bookings_loading {
            "Loading..."
        } else {
            "No bookings found."
        };
        f.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let rows = app.bookings.iter().enumerate().map(|(i, b)| {
        // 状態ごとに色分けする。
        let color = match b.status.as_str() {
            "Upcoming" => Color::Blue,
            "Completed" => Color::Green,
            _ => Color::Red,
        };
        Row::new(vec![
            format!("{}", i + 1),
            b.service.clone(),
            b.date.clone(),
            b.time.clone(),
            b.status.clone(),
        ])
        .style(Style::default().fg(color))
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(12),
        ],
    )
    .block(block)
    .header(Row::new(vec!["#", "service", "date", "time", "status"]).bold())
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(255, 140, 0))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );

    let mut table_state = ratatui::widgets::TableState::default();
    table_state.select(Some(app.ui.bookings_selected));
    f.render_stateful_widget(table, area, &mut table_state);
}

/// 予約完了ポップアップを描画する。
fn draw_success_popup(f: &mut Frame, form: &BookingController) {
    let area = centered_popup(f.area(), 50, 8);
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from("✔ Booking Successful!").fg(Color::Green).bold(),
    ];
    if form.redirect_pending() {
        lines.push(Line::from("Redirecting to home..."));
    }
    if let Some(b) = form.last_booking() {
        lines.push(Line::from(""));
        lines.push(Line::from(format!("{} on {} at {}", b.service, b.date, b.time)));
    }
    let popup = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(popup, area);
}

/// 通知ポップアップ（確認待ち）を描画する。
fn draw_alert(f: &mut Frame, title: &str, message: &str) {
    let area = centered_popup(f.area(), 60, 7);
    f.render_widget(Clear, area);

    let popup = Paragraph::new(vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from("Enter/Esc: OK").fg(Color::Gray),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .style(Style::default().fg(Color::Red)),
    );
    f.render_widget(popup, area);
}

/// ステータスバーを構築する。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let screen_name = match app.ui.screen {
        Screen::Home => "Home",
        Screen::Book => "Book",
        Screen::MyBookings => "MyBookings",
    };

    let status_text = match &app.ui.error {
        Some(err) => format!("[{screen_name}] ERROR: {err}"),
        None => format!("[{screen_name}] {}", app.ui.status),
    };

    let mut status_bar = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });

    // エラー時は赤色で強調表示する。
    if app.ui.error.is_some() {
        status_bar = status_bar.style(Style::default().fg(Color::Red));
    }

    status_bar
}

/// 現在画面に応じたヘルプ文字列を返す。
fn get_help_text(screen: &Screen, shortcuts: &Shortcuts) -> String {
    match screen {
        Screen::Home => format!(
            "{}: book | {}: my bookings | {}/{}: navigate | {}: quit",
            format_keys(&shortcuts.home.book),
            format_keys(&shortcuts.home.my_bookings),
            format_keys(&shortcuts.home.up),
            format_keys(&shortcuts.home.down),
            format_keys(&shortcuts.home.quit),
        ),
        Screen::Book => format!(
            "{}: edit | {}/{}: field | {}/{}: service | {}: search | {}: locate | {}: book | {}: back",
            format_keys(&shortcuts.book.edit_field),
            format_keys(&shortcuts.book.next_field),
            format_keys(&shortcuts.book.prev_field),
            format_keys(&shortcuts.book.prev_service),
            format_keys(&shortcuts.book.next_service),
            format_keys(&shortcuts.book.search),
            format_keys(&shortcuts.book.detect_location),
            format_keys(&shortcuts.book.submit),
            format_keys(&shortcuts.book.back),
        ),
        Screen::MyBookings => format!(
            "{}: refresh | {}/{}: navigate | {}: back",
            format_keys(&shortcuts.bookings.refresh),
            format_keys(&shortcuts.bookings.up),
            format_keys(&shortcuts.bookings.down),
            format_keys(&shortcuts.bookings.back),
        ),
    }
}

/// ショートカットキーの配列を表示用文字列に変換する。
fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}
