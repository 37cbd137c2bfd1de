use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use sieve_core::{Transport, Warning};

use crate::app::{App, Phase};
use crate::theme::Theme;
use crate::view::{spinner_char, truncate};

/// Render the main screen.
pub fn render<T: Transport>(f: &mut Frame, app: &App<T>) {
    let area = f.area();

    let banner_count = app.warnings.len() as u16;
    let show_panel = app.phase == Phase::Ready
        && (app.pane.focused.is_some() || app.controller.at_end());

    let mut constraints = vec![Constraint::Length(1)];
    if banner_count > 0 {
        constraints.push(Constraint::Length(banner_count));
    }
    constraints.push(Constraint::Min(5));
    if show_panel {
        constraints.push(Constraint::Length(7));
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::vertical(constraints).split(area);
    let mut slot = 0;

    render_header(f, chunks[slot], app);
    slot += 1;
    if banner_count > 0 {
        render_banners(f, chunks[slot], app);
        slot += 1;
    }
    render_main(f, chunks[slot], app);
    slot += 1;
    if show_panel {
        if app.pane.focused.is_some() {
            render_detail(f, chunks[slot], app);
        } else {
            render_end_prompt(f, chunks[slot], &app.theme);
        }
        slot += 1;
    }
    render_footer(f, chunks[slot], app);
}

fn render_header<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    let theme = &app.theme;
    let phase_label = match &app.phase {
        Phase::Loading => format!("{} loading", spinner_char(app.tick)),
        Phase::Reloading => format!("{} syncing", spinner_char(app.tick)),
        Phase::LoadFailed(_) => "load failed".to_string(),
        Phase::Ready => format!("{} unread on server", app.num_unread),
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" SIEVE ", theme.header_style()),
        Span::styled(
            " Unread references",
            Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {phase_label}"), Style::default().fg(theme.dim)),
    ]));
    f.render_widget(header, area);
}

fn render_banners<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    // stable banner order regardless of arrival
    let lines: Vec<Line> = [Warning::SyncFailed, Warning::SaveFailed]
        .into_iter()
        .filter(|warning| app.warnings.contains(warning))
        .map(|warning| {
            Line::from(Span::styled(
                format!(" ⚠ {}", warning.message()),
                app.theme.warning_style(),
            ))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn render_main<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    match &app.phase {
        Phase::Loading | Phase::Reloading => render_wait(f, area, app),
        Phase::LoadFailed(error) => render_load_failure(f, area, app, error),
        Phase::Ready => render_items(f, area, app),
    }
}

fn render_wait<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    let theme = &app.theme;
    let message = match app.phase {
        Phase::Reloading => "syncing read items with the server…",
        _ => "fetching the sieve…",
    };
    let text = Line::from(vec![
        Span::styled(
            format!(" {} ", spinner_char(app.tick)),
            Style::default().fg(theme.spinner),
        ),
        Span::styled(message, Style::default().fg(theme.text)),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style());
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_load_failure<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>, error: &str) {
    let theme = &app.theme;
    let lines = vec![
        Line::from(Span::styled(
            format!(" fetching the sieve failed: {error}"),
            theme.warning_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " press r to retry",
            Style::default().fg(theme.dim),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_items<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    let theme = &app.theme;
    let sieve = app.controller.sieve();

    if sieve.is_empty() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style());
        let text = Line::from(Span::styled(
            " nothing to read — press r to check again",
            Style::default().fg(theme.dim),
        ));
        f.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let title_width = (area.width as usize).saturating_sub(30);
    let rows: Vec<Row> = sieve
        .items()
        .iter()
        .map(|item| {
            let marker = if item.is_read() { "✓" } else { "●" };
            let saved = if item.is_saved() { "★" } else { " " };
            let title = if item.title().is_empty() {
                item.url()
            } else {
                item.title()
            };
            Row::new(vec![
                Cell::from(marker).style(theme.item_style(item.is_read())),
                Cell::from(saved).style(Style::default().fg(theme.saved)),
                Cell::from(truncate(title, title_width))
                    .style(theme.item_style(item.is_read())),
                Cell::from(truncate(item.source_title(), 20))
                    .style(Style::default().fg(theme.dim)),
            ])
        })
        .collect();

    let widths = vec![
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(20),
        Constraint::Length(20),
    ];
    let table = Table::new(rows, &widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(format!(
                    " {} items — {} read, {} saved ",
                    sieve.len(),
                    sieve.read_count(),
                    sieve.saved_count()
                )),
        )
        .row_highlight_style(theme.highlight_style());

    let mut state = TableState::default();
    state.select(app.pane.focused);
    f.render_stateful_widget(table, area, &mut state);
}

fn render_detail<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    let theme = &app.theme;
    let Some(item) = app.controller.focused() else {
        return;
    };

    let mut flags = Vec::new();
    if item.is_read() {
        flags.push("read");
    }
    if item.is_saved() {
        flags.push("saved");
    }
    let lines = vec![
        Line::from(Span::styled(
            item.title().to_string(),
            Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            item.url().to_string(),
            Style::default().fg(theme.active),
        )),
        Line::from(Span::styled(
            format!("from {} ({})", item.source_title(), item.source_url()),
            Style::default().fg(theme.dim),
        )),
        Line::from(""),
        Line::from(Span::styled(
            if flags.is_empty() {
                "unread".to_string()
            } else {
                flags.join(", ")
            },
            Style::default().fg(theme.dim),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" Reference {} ", item.index()));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_end_prompt(f: &mut Frame, area: Rect, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(
            "End of the sieve.",
            Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "r — sync read items and reload    q — quit",
            Style::default().fg(theme.dim),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.active))
        .title(" Done ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_footer<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    let theme = &app.theme;
    let sieve = app.controller.sieve();
    let footer = Line::from(vec![
        Span::styled(
            format!(" {}/{} read  {} saved ", sieve.read_count(), sieve.len(), sieve.saved_count()),
            Style::default().fg(theme.text),
        ),
        Span::styled(
            " | n:next  p:prev  v:open  b:save  r:reload  ?:help  q:quit",
            theme.footer_style(),
        ),
    ]);
    f.render_widget(Paragraph::new(footer), area);
}
