use deskline_domain::{MediaKind, NoticeLevel, TicketStatus};
use deskline_live::ChannelState;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    BarChart, Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap,
};
use ratatui::Frame;

use crate::app::{App, LoginFocus, MainTab, Screen, TicketDetail};

/// Draws the full frame. Every tick redraws from scratch; state lives in
/// [`App`], never in the widgets.
pub(crate) fn draw(frame: &mut Frame, app: &App) {
    let full = frame.area();
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(3),
    ])
    .areas(full);

    draw_header(frame, app, header);
    match app.screen {
        Screen::Login => draw_login(frame, app, body),
        Screen::Main => match &app.detail {
            Some(detail) => draw_detail(frame, app, detail, body),
            None => match app.tab {
                MainTab::Dashboard => draw_dashboard(frame, app, body),
                MainTab::Tickets => draw_tickets(frame, app, body),
            },
        },
    }
    draw_footer(frame, app, footer);

    if let Some(prompt) = app
        .detail
        .as_ref()
        .and_then(|detail| detail.attach_prompt.as_ref())
    {
        let area = centered_rect(60, 3, full);
        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightBlue))
            .title("attach file path (Enter send, Esc cancel)");
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(prompt.value()).block(block), area);
        frame.set_cursor_position((inner.x + prompt.cursor() as u16, inner.y));
    }

    draw_notices(frame, app, full);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let user = app
        .session
        .as_ref()
        .map(|session| session.name.as_str())
        .unwrap_or("not signed in");
    let state = app.channel_state();
    let state_style = match state {
        ChannelState::Open => Style::default().fg(Color::Green),
        ChannelState::Connecting => Style::default().fg(Color::Yellow),
        ChannelState::Closed => Style::default().fg(Color::Red),
    };
    let line = Line::from(vec![
        Span::styled("deskline", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::raw(user),
        Span::raw("  "),
        Span::styled(state.label(), state_style),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help = match app.screen {
        Screen::Login => "Tab switch field | Enter sign in | Esc quit",
        Screen::Main => match &app.detail {
            Some(detail) if detail.attach_prompt.is_some() => "Enter attach | Esc cancel",
            Some(_) => {
                "Enter send | Ctrl+A attach | Ctrl+S status | Ctrl+D description | Up/Down scroll | End follow | Esc back"
            }
            None => {
                "Tab view | Left/Right status | Up/Down select | Enter open | r refresh | Ctrl+L logout | q quit"
            }
        },
    };
    frame.render_widget(
        Paragraph::new(help).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_login(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect(46, 9, area);
    let [email_area, password_area, hint_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(area);

    let focused = Style::default().fg(Color::LightBlue);
    let email_block = Block::default().borders(Borders::ALL).title("email");
    let email_block = if app.login.focus == LoginFocus::Email {
        email_block.border_style(focused)
    } else {
        email_block
    };
    let email_inner = email_block.inner(email_area);
    frame.render_widget(
        Paragraph::new(app.login.email.value()).block(email_block),
        email_area,
    );

    let masked: String = "*".repeat(app.login.password.value().chars().count());
    let password_block = Block::default().borders(Borders::ALL).title("password");
    let password_block = if app.login.focus == LoginFocus::Password {
        password_block.border_style(focused)
    } else {
        password_block
    };
    let password_inner = password_block.inner(password_area);
    frame.render_widget(Paragraph::new(masked).block(password_block), password_area);

    let hint = if app.login.submitting {
        "signing in..."
    } else {
        "Enter to sign in"
    };
    frame.render_widget(
        Paragraph::new(hint).alignment(Alignment::Center),
        hint_area,
    );

    match app.login.focus {
        LoginFocus::Email => frame.set_cursor_position((
            email_inner.x + app.login.email.cursor() as u16,
            email_inner.y,
        )),
        LoginFocus::Password => frame.set_cursor_position((
            password_inner.x + app.login.password.cursor() as u16,
            password_inner.y,
        )),
    }
}

fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let [gauges_area, chart_area] =
        Layout::vertical([Constraint::Length(9), Constraint::Min(1)]).areas(area);
    let [todo_area, in_progress_area, done_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(gauges_area);

    let counts = app.status_counts();
    let total: usize = counts.iter().map(|(_, count)| count).sum();
    let areas = [todo_area, in_progress_area, done_area];
    for (index, ((status, count), slot)) in counts.into_iter().zip(areas).enumerate() {
        let ratio = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        };
        let mut title = status.label().to_owned();
        if index == 0 && app.tickets_loading {
            title.push_str(" (loading)");
        }
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .gauge_style(status_color(status))
            .ratio(ratio)
            .label(format!("{count} of {total}"));
        frame.render_widget(gauge, slot);
    }

    let breakdown = app.notification_breakdown();
    let data: Vec<(&str, u64)> = breakdown
        .iter()
        .map(|(name, count)| (name.as_str(), *count))
        .collect();
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("notification types"),
        )
        .data(&data)
        .bar_width(12)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::LightBlue))
        .value_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(chart, chart_area);
}

fn draw_tickets(frame: &mut Frame, app: &App, area: Rect) {
    let [tabs_area, list_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(1)]).areas(area);

    let counts = app.status_counts();
    let titles: Vec<Line> = counts
        .iter()
        .map(|(status, count)| Line::from(format!("{} ({count})", status.label())))
        .collect();
    let selected_tab = TicketStatus::ALL
        .iter()
        .position(|status| *status == app.status_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("tickets"))
        .select(selected_tab)
        .highlight_style(
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, tabs_area);

    let visible = app.visible_tickets();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|ticket| ListItem::new(format!("{}  {}", ticket.ticket_id, ticket.title)))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_symbol("> ")
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(if visible.is_empty() {
        None
    } else {
        Some(app.selected)
    });
    frame.render_stateful_widget(list, list_area, &mut state);
}

fn draw_detail(frame: &mut Frame, app: &App, detail: &TicketDetail, area: Rect) {
    let ticket = app
        .tickets
        .iter()
        .find(|ticket| ticket.id == detail.record_id);

    let description = ticket.map(|ticket| ticket.description.as_str()).unwrap_or("");
    let description_lines = description.lines().count().max(1) as u16;
    let preview_lines = app.view.description_preview_lines;
    let description_height = if detail.description_expanded {
        description_lines + 2
    } else {
        description_lines.min(preview_lines) + 2
    };

    let [meta_area, description_area, files_area, messages_area, draft_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(description_height),
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(3),
    ])
    .areas(area);

    let meta = match ticket {
        Some(ticket) => vec![
            Line::from(vec![
                Span::styled(
                    format!("{}  {}", ticket.ticket_id, ticket.title),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", ticket.status.label()),
                    status_color(ticket.status),
                ),
            ]),
            Line::from(format!(
                "{} | {} | {}",
                ticket.customer, ticket.building, ticket.date
            )),
        ],
        None => vec![Line::from(detail.ticket_id.as_str())],
    };
    frame.render_widget(
        Paragraph::new(meta).block(Block::default().borders(Borders::ALL)),
        meta_area,
    );

    let mut description_title = "description".to_owned();
    if !detail.description_expanded && description_lines > preview_lines {
        description_title.push_str(" (+ more, Ctrl+D)");
    }
    frame.render_widget(
        Paragraph::new(description)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(description_title),
            ),
        description_area,
    );

    let files = if detail.files_loading {
        "loading files...".to_owned()
    } else if detail.files.is_empty() {
        "no files".to_owned()
    } else {
        detail
            .files
            .iter()
            .map(|file| match file.media_kind {
                MediaKind::Image => format!("[img] {}", file.name),
                MediaKind::Other => file.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    };
    frame.render_widget(
        Paragraph::new(files).block(Block::default().borders(Borders::ALL).title("files")),
        files_area,
    );

    let lines = message_lines(app, detail);
    let viewport = messages_area.height.saturating_sub(2);
    let content = lines.len() as u16;
    let max_scroll = content.saturating_sub(viewport);
    let scroll_y = if detail.pinned {
        max_scroll
    } else {
        detail.scroll.min(max_scroll)
    };
    let mut messages_title = "messages".to_owned();
    if detail.history_loading {
        messages_title.push_str(" (loading)");
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll_y, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(messages_title),
            ),
        messages_area,
    );

    let draft_block = Block::default()
        .borders(Borders::ALL)
        .title("draft (Enter send, Ctrl+A attach)");
    let draft_inner = draft_block.inner(draft_area);
    frame.render_widget(
        Paragraph::new(detail.draft.value()).block(draft_block),
        draft_area,
    );
    if detail.attach_prompt.is_none() {
        frame.set_cursor_position((
            draft_inner.x + detail.draft.cursor() as u16,
            draft_inner.y,
        ));
    }
}

fn message_lines<'a>(app: &'a App, detail: &TicketDetail) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for message in app.feed.messages(&detail.ticket_id) {
        let local = message.is_local();
        let alignment = if local {
            Alignment::Right
        } else {
            Alignment::Left
        };
        let mut base = if local {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        if !message.delivered {
            base = base.add_modifier(Modifier::DIM);
        }

        let mut header = format!("{} [{}]", message.sender, message.time);
        if !message.delivered {
            header.push_str(" (sending)");
        }
        lines.push(
            Line::from(Span::styled(header, base.add_modifier(Modifier::BOLD)))
                .alignment(alignment),
        );
        if let Some(file) = &message.file {
            lines.push(
                Line::from(Span::styled(format!("[file] {}", file.name), base))
                    .alignment(alignment),
            );
        }
        lines.push(Line::from(Span::styled(message.text.as_str(), base)).alignment(alignment));
        lines.push(Line::default());
    }
    lines
}

fn draw_notices(frame: &mut Frame, app: &App, area: Rect) {
    let width = 36.min(area.width);
    let mut y = area.y;
    for notice in app.notices.visible() {
        if y + 3 > area.y + area.height {
            break;
        }
        let slot = Rect {
            x: area.x + area.width.saturating_sub(width),
            y,
            width,
            height: 3,
        };
        let border = match notice.level {
            NoticeLevel::Info => Color::LightBlue,
            NoticeLevel::Warn => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        frame.render_widget(Clear, slot);
        frame.render_widget(
            Paragraph::new(notice.text.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            ),
            slot,
        );
        y += 3;
    }
}

fn status_color(status: TicketStatus) -> Style {
    let color = match status {
        TicketStatus::Todo => Color::Yellow,
        TicketStatus::InProgress => Color::LightBlue,
        TicketStatus::Done => Color::Green,
    };
    Style::default().fg(color)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
