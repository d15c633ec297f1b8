pub mod screen;
pub mod summary;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Widget, Wrap},
};

use pileup::audio::{Clock, Sender};
use pileup::session::LoggedContact;

use crate::{App, Field};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const HELP: &str = "F1 CQ  F2 mode  F3 summary  F4 stop  F5 reset  Tab field  Esc quit";

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(area);

        header(self).render(chunks[0], buf);
        render_receive(self, chunks[1], buf);
        input(self).render(chunks[2], buf);
        log_table(self.session.log(), self.session.mode().ui(), true).render(chunks[3], buf);
        footer(self).render(chunks[4], buf);
    }
}

fn header<C: Clock>(app: &App<C>) -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let session = &app.session;
    let key = if session.is_locked() {
        Span::styled(" KEY ", Style::default().fg(Color::Black).bg(Color::Red))
    } else {
        Span::styled(" --- ", Style::default().add_modifier(Modifier::DIM))
    };

    Paragraph::new(Line::from(vec![
        Span::styled(format!("{} ", session.mode().config().name), bold.fg(Color::Cyan)),
        Span::styled(format!("{}  ", session.you().callsign), bold),
        Span::raw(format!(
            "calling {}  contacts {}  attempts {}  ",
            session.pool().len(),
            session.total_contacts(),
            session.attempts()
        )),
        key,
    ]))
}

/// Everything keyed so far, newest at the bottom.
fn render_receive<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("Receive");
    let visible = block.inner(area).height as usize;
    let scheduler = app.session.scheduler();
    let now = scheduler.now();

    let heard: Vec<Line> = scheduler
        .audio()
        .started()
        .map(|t| {
            let (tag, style) = match t.sender {
                Sender::You => ("TX ", Style::default().fg(Color::Yellow)),
                Sender::Station(_) => ("RX ", Style::default().fg(Color::Green)),
            };
            Line::from(vec![
                Span::styled(tag, style.add_modifier(Modifier::DIM)),
                Span::styled(t.heard_at(now), style),
            ])
        })
        .collect();
    let skip = heard.len().saturating_sub(visible);

    Paragraph::new(heard.into_iter().skip(skip).collect::<Vec<_>>())
        .block(block)
        .render(area, buf);
}

fn input<C: Clock>(app: &App<C>) -> Paragraph<'static> {
    let mode_ui = app.session.mode().ui();
    let mut spans = Vec::new();

    for field in app.fields() {
        let (label, value) = match field {
            Field::Response => ("Call", &app.response),
            Field::Info => (mode_ui.info_placeholder.unwrap_or("Info"), &app.info),
            Field::Info2 => (mode_ui.info2_placeholder.unwrap_or("Info"), &app.info2),
        };
        let focused = field == app.focus;
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("{label}: "), style.add_modifier(Modifier::DIM)));
        spans.push(Span::styled(value.clone(), style));
        if focused {
            spans.push(Span::styled("_", style.add_modifier(Modifier::SLOW_BLINK)));
        }
        spans.push(Span::raw("   "));
    }

    let title = if app.session.ready_for_exchange_confirmation() {
        "Send (Enter sends TU)"
    } else {
        "Send"
    };
    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(title))
}

/// Logged contacts, newest first.
pub(crate) fn log_table(
    log: &[LoggedContact],
    mode_ui: &pileup::mode::ModeUi,
    with_extra: bool,
) -> Table<'static> {
    let extra = mode_ui.extra_column_header.filter(|_| with_extra);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut headers = vec!["#", "Callsign", "WPM", "Attempts", "Time"];
    let mut widths = vec![
        Constraint::Length(4),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(8),
    ];
    if let Some(extra) = extra {
        headers.push(extra);
        widths.push(Constraint::Min(10));
    }

    let rows = log.iter().rev().map(|contact| {
        let mut cells = vec![
            contact.number.to_string(),
            contact.callsign.clone(),
            contact.speed.clone(),
            contact.attempts.to_string(),
            format!("{:.1}s", contact.elapsed),
        ];
        let mut style = Style::default();
        if extra.is_some() {
            cells.push(contact.annotation.clone());
            if contact.checks.iter().any(|c| !c.is_correct()) {
                style = style.fg(Color::Red);
            }
        }
        Row::new(cells).style(style)
    });

    Table::new(rows, widths)
        .header(Row::new(headers).style(bold))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(mode_ui.results_header),
        )
}

fn footer<C: Clock>(app: &App<C>) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(Span::styled(
            app.status.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        Line::from(Span::styled(HELP, Style::default().add_modifier(Modifier::DIM))),
    ])
    .wrap(Wrap { trim: true })
}
