use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style, Stylize as _},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    app::{App, Phase},
    form::Field,
    receipt::render_receipt,
    ui::{popup::KeysPopup, utils},
};

const LABEL_WIDTH: u16 = 26;

pub(crate) fn render(f: &mut Frame, app: &App, keys: &KeysPopup) {
    let [title_area, main_area, status_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(f.area());

    f.render_widget(
        Paragraph::new(Line::from(Span::styled("Market stall registration", Style::default().fg(Color::Cyan)))),
        title_area,
    );

    let [form_area, side_area] = Layout::horizontal([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .areas(main_area);

    let editing = matches!(app.phase, Phase::Editing);
    let lines: Vec<Line> = Field::ALL.iter().map(|&field| {
        let label_style = if field == app.focus && editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let mut spans = vec![
            Span::styled(format!("{:<width$}", field.label(), width = LABEL_WIDTH as usize), label_style),
            Span::raw(app.input(field).value()),
        ];
        if let Some(message) = app.errors.as_ref().and_then(|e| e.for_field(field)) {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(message, Style::default().fg(Color::Red)));
        }
        Line::from(spans)
    }).collect();
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title("Vendor")),
        form_area,
    );

    if editing {
        f.set_cursor_position((
            form_area.x + 1 + LABEL_WIDTH + app.input(app.focus).visual_cursor() as u16,
            form_area.y + 1 + app.focus.index() as u16,
        ));
    }

    let side = match &app.phase {
        Phase::Registered(record) => Paragraph::new(render_receipt(record))
            .block(Block::default().borders(Borders::ALL).title("Receipt")),
        Phase::Editing | Phase::Saving => {
            let next = app.suggestion();
            Paragraph::new(Text::from(vec![
                Line::from(vec![Span::raw("Stall id   "), Span::raw(next.stall_id()).bold()]),
                Line::from(vec![Span::raw("Stall name "), Span::raw(next.stall_name()).bold()]),
                Line::from(""),
                Line::from(Span::styled(
                    "Final numbers are assigned when saved.",
                    Style::default().fg(Color::DarkGray),
                )),
            ]))
            .block(Block::default().borders(Borders::ALL).title("Next stall"))
        }
    };
    f.render_widget(side, side_area);

    f.render_widget(Paragraph::new(utils::status_line(&app.phase, app.status.as_ref())), status_area);
    f.render_widget(Paragraph::new(utils::hint_line()), hint_area);

    if app.show_help {
        keys.render(f, f.area());
    }
}
