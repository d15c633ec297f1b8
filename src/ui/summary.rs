use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use pileup::audio::Clock;
use pileup::session::SessionSummary;

use crate::{ui::log_table, App};

/// Lines of the headline numbers for a session.
pub fn summary_lines(summary: &SessionSummary) -> Vec<Line<'static>> {
    let fmt = |value: Option<f64>, unit: &str| match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => "-".to_string(),
    };
    vec![
        Line::from(format!("Contacts: {}", summary.contacts)),
        Line::from(format!(
            "Mean attempts: {}",
            fmt(summary.mean_attempts, "")
        )),
        Line::from(format!(
            "Mean time: {} (± {})",
            fmt(summary.mean_elapsed, " s"),
            fmt(summary.elapsed_std_dev, " s")
        )),
    ]
}

/// One row per character that has been miscopied, worst first.
pub fn present_mistake_row(character: char, count: u32) -> Row<'static> {
    let color = match count {
        0 => Color::Green,
        1..=2 => Color::Yellow,
        _ => Color::Red,
    };
    Row::new(vec![character.to_string(), count.to_string()]).style(Style::default().fg(color))
}

pub fn render_summary<C: Clock>(app: &App<C>, f: &mut Frame) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[1]);

    let session = &app.session;
    let headline = Paragraph::new(summary_lines(&session.summary()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} Session Summary", session.mode().config().name)),
        )
        .style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(headline, chunks[0]);

    f.render_widget(
        log_table(session.log(), session.mode().ui(), false),
        body[0],
    );

    let troubled = session.tracker().troubled_characters();
    let mistakes = Table::new(
        troubled.iter().map(|&(c, n)| present_mistake_row(c, n)),
        [Constraint::Length(5), Constraint::Length(8)],
    )
    .header(Row::new(vec!["Char", "Misses"]).style(Style::default().add_modifier(Modifier::BOLD)))
    .block(Block::default().borders(Borders::ALL).title("Troubled Characters"));
    f.render_widget(mistakes, body[1]);

    f.render_widget(
        Paragraph::new("F3 back  Esc quit")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM)),
        chunks[2],
    );
}
