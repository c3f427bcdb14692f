use crossterm::event::{Event, KeyCode, KeyModifiers};
use itertools::Itertools as _;
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect}, style::{Color, Style, Stylize as _}, text::{Line, Span, Text}, widgets::{Block, Clear}, Frame
};

use crate::ui::action::Action;

/// Key bindings of the form, also rendered as the help popup.
pub(crate) struct KeysPopup {
    keys: Vec<(KeyModifiers, KeyCode, &'static str, Action)>,
}

impl KeysPopup {
    pub(crate) fn new(keys: Vec<(KeyModifiers, KeyCode, &'static str, Action)>) -> Self {
        Self { keys }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let key_style = Style::default().bold().black();

        // Adjacent bindings with the same description share a line.
        let mut keys_text = Vec::new();
        let mut descriptions_text = Vec::new();
        for (description, bindings) in &self.keys.iter().chunk_by(|(_, _, description, _)| *description) {
            let keys = bindings.map(|(mods, code, _, _)| format_key_event(*mods, code)).join("/");
            keys_text.push(Line::from(Span::styled(keys, key_style)));
            descriptions_text.push(Line::from(Span::raw(description)));
        }

        let keys_text = Text::from(keys_text);
        let descriptions_text = Text::from(descriptions_text);

        let [popup_area] = Layout::vertical([
                Constraint::Length(keys_text.height() as u16),
            ])
            .flex(Flex::Center)
            .areas(area);

        let [keys_area, descriptions_area] = Layout::horizontal([
                Constraint::Length(keys_text.width() as u16),
                Constraint::Length(descriptions_text.width() as u16),
            ])
            .spacing(2)
            .flex(Flex::Center)
            .areas(popup_area);

        let mut whole = keys_area.union(descriptions_area);
        whole.x = whole.x.saturating_sub(1);
        whole.y = whole.y.saturating_sub(1);
        whole.width += 2;
        whole.height += 2;

        f.render_widget(Clear, whole);
        f.render_widget(
            Block::new().title(" Keys ").style(Style::new().bg(Color::LightCyan)),
            whole,
        );
        f.render_widget(keys_text.alignment(Alignment::Right), keys_area);
        f.render_widget(descriptions_text, descriptions_area);
    }

    pub fn get_action(&self, event: &Event) -> Option<Action> {
        if let Event::Key(key) = event
            && key.is_press()
            && let Some((_, _, _, action)) = self.keys.iter().find(|(m, k, _, _)| *m == key.modifiers && *k == key.code)
        {
            return Some(action.clone());
        }
        None
    }
}

pub(crate) fn format_key_event(mods: KeyModifiers, code: &KeyCode) -> String {
    let mut result = String::new();

    if mods.contains(KeyModifiers::CONTROL) {
        result.push_str("Ctrl-");
    }
    if mods.contains(KeyModifiers::ALT) {
        result.push_str("Alt-");
    }

    match code {
        KeyCode::Char(c) => result.push(c.to_ascii_uppercase()),
        KeyCode::Enter => result.push_str("Enter"),
        KeyCode::Tab => result.push_str("Tab"),
        KeyCode::BackTab => result.push_str("Shift-Tab"),
        KeyCode::Up => result.push('↑'),
        KeyCode::Down => result.push('↓'),
        KeyCode::F(n) => result.push_str(&format!("F{n}")),
        _ => result.push_str(&format!("{code:?}")),
    }

    result
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEvent, KeyEventKind};

    use super::*;
    use crate::{app::key_bindings, ui::action::QuitAction};

    #[test]
    fn test_format_key_event() {
        assert_eq!(format_key_event(KeyModifiers::CONTROL, &KeyCode::Char('q')), "Ctrl-Q");
        assert_eq!(format_key_event(KeyModifiers::SHIFT, &KeyCode::BackTab), "Shift-Tab");
        assert_eq!(format_key_event(KeyModifiers::NONE, &KeyCode::F(1)), "F1");
    }

    #[test]
    fn test_get_action() {
        let popup = KeysPopup::new(key_bindings());
        let ctrl_q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert_eq!(popup.get_action(&ctrl_q), Some(Action::Quit(QuitAction::Finish)));

        let plain_q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        assert_eq!(popup.get_action(&plain_q), None);

        let mut release = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(popup.get_action(&Event::Key(release)), None);
    }
}
