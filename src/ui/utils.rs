use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use crate::app::{Phase, StatusMessage};

pub fn status_editing_span() -> Span<'static> { Span::styled("•", Style::default().fg(Color::Yellow)) }
pub fn status_saving_span() -> Span<'static> { Span::styled("…", Style::default().fg(Color::Cyan)) }
pub fn status_registered_span() -> Span<'static> { Span::styled("✔︎", Style::default().fg(Color::Green)) }
pub fn status_failed_span() -> Span<'static> { Span::styled("✖︎", Style::default().fg(Color::Red)) }

pub(crate) fn phase_span(phase: &Phase) -> Span<'static> {
    match phase {
        Phase::Editing => status_editing_span(),
        Phase::Saving => status_saving_span(),
        Phase::Registered(_) => status_registered_span(),
    }
}

pub(crate) fn status_line<'a>(phase: &Phase, status: Option<&'a StatusMessage>) -> Line<'a> {
    let mut spans = vec![phase_span(phase), Span::raw(" ")];
    match status {
        Some(StatusMessage { text, is_error: true }) => {
            spans[0] = status_failed_span();
            spans.push(Span::styled(text.as_str(), Style::default().fg(Color::Red)));
        }
        Some(StatusMessage { text, is_error: false }) => spans.push(Span::raw(text.as_str())),
        None => spans.push(Span::styled("Fill in the form and press Enter", Style::default().fg(Color::DarkGray))),
    }
    Line::from(spans)
}

pub fn hint_line() -> Line<'static> {
    let key_style = Style::default().fg(Color::Yellow);
    Line::from(vec![
        Span::styled("F1", key_style), Span::raw(" keys  "),
        Span::styled("Enter", key_style), Span::raw(" submit  "),
        Span::styled("Ctrl-Q", key_style), Span::raw(" exit"),
    ])
}
