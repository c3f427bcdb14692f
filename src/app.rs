use crossterm::event::{Event, KeyCode, KeyModifiers};
use tui_input::{Input, backend::crossterm::EventHandler as _};

use crate::{
    allocator::{NextNumbers, next_stall_numbers},
    form::{Field, Registration, RegistrationForm, ValidationErrors},
    receipt::{render_receipt, scan_code},
    stall::StallRecord,
    ui::action::{Action, CopySource, QuitAction},
};

pub(crate) fn key_bindings() -> Vec<(KeyModifiers, KeyCode, &'static str, Action)> {
    vec![
        (KeyModifiers::NONE, KeyCode::Enter, "Submit registration", Action::Submit),
        (KeyModifiers::NONE, KeyCode::Down, "Next field", Action::FocusNextField),
        (KeyModifiers::NONE, KeyCode::Tab, "Next field", Action::FocusNextField),
        (KeyModifiers::NONE, KeyCode::Up, "Previous field", Action::FocusPreviousField),
        (KeyModifiers::SHIFT, KeyCode::BackTab, "Previous field", Action::FocusPreviousField),
        (KeyModifiers::CONTROL, KeyCode::Char('n'), "New registration", Action::NewRegistration),
        (KeyModifiers::CONTROL, KeyCode::Char('y'), "Copy scan code", Action::CopyToClipboard(CopySource::ScanCode)),
        (KeyModifiers::CONTROL, KeyCode::Char('r'), "Copy receipt", Action::CopyToClipboard(CopySource::Receipt)),
        (KeyModifiers::CONTROL, KeyCode::Char('l'), "View receipt in pager", Action::LaunchPager),
        (KeyModifiers::NONE, KeyCode::F(1), "Show/hide keys", Action::ToggleHelp),
        (KeyModifiers::CONTROL, KeyCode::Char('q'), "Exit", Action::Quit(QuitAction::Finish)),
        (KeyModifiers::CONTROL, KeyCode::Char('c'), "Exit without printing", Action::Quit(QuitAction::Cancel)),
    ]
}

pub(crate) enum Phase {
    Editing,
    Saving,
    Registered(StallRecord),
}

/// Work the event loop has to do on behalf of the form.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Effect {
    Persist(Registration),
    Copy(String),
    Page(String),
}

pub(crate) struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub(crate) struct App {
    pub inputs: Vec<Input>,
    pub focus: Field,
    pub errors: Option<ValidationErrors>,
    pub status: Option<StatusMessage>,
    pub phase: Phase,
    pub show_help: bool,
    pub quit: Option<QuitAction>,

    /// Records known at startup plus everything registered since.
    /// Only used for the advisory id/name preview, the store allocates
    /// the numbers actually saved.
    pub known_stalls: Vec<StallRecord>,

    /// Stalls registered in this session, oldest first.
    pub registered: Vec<StallRecord>,
}

impl App {
    pub fn new(known_stalls: Vec<StallRecord>, stall_type: Option<String>) -> Self {
        let mut inputs: Vec<Input> = Field::ALL.iter().map(|_| Input::default()).collect();
        if let Some(stall_type) = stall_type {
            inputs[Field::StallType.index()] = Input::new(stall_type);
        }
        Self {
            inputs,
            focus: Field::VendorName,
            errors: None,
            status: None,
            phase: Phase::Editing,
            show_help: false,
            quit: None,
            known_stalls,
            registered: Vec::new(),
        }
    }

    pub fn input(&self, field: Field) -> &Input {
        &self.inputs[field.index()]
    }

    pub fn form(&self) -> RegistrationForm {
        let mut form = RegistrationForm::new();
        for field in Field::ALL {
            form.set(field, self.input(field).value());
        }
        form
    }

    /// Numbers the next registration would most likely get.
    pub fn suggestion(&self) -> NextNumbers {
        let stall_type = self.input(Field::StallType).value().trim();
        let filter = (!stall_type.is_empty()).then_some(stall_type);
        next_stall_numbers(&self.known_stalls, filter)
    }

    pub fn last_registered(&self) -> Option<&StallRecord> {
        self.registered.last()
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage { text: text.into(), is_error });
    }

    pub fn apply(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::Quit(quit) => self.quit = Some(quit),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::FocusNextField => self.focus = self.focus.next(),
            Action::FocusPreviousField => self.focus = self.focus.previous(),
            Action::Input(key) => {
                if matches!(self.phase, Phase::Editing) {
                    self.inputs[self.focus.index()].handle_event(&Event::Key(key));
                }
            }
            Action::Submit => return self.submit(),
            Action::NewRegistration => self.new_registration(),
            Action::CopyToClipboard(source) => {
                let Some(record) = self.last_registered() else {
                    self.set_status("Nothing registered yet", true);
                    return None;
                };
                let text = match source {
                    CopySource::ScanCode => scan_code(record),
                    CopySource::Receipt => render_receipt(record),
                };
                return Some(Effect::Copy(text));
            }
            Action::LaunchPager => {
                let Some(record) = self.last_registered() else {
                    self.set_status("Nothing registered yet", true);
                    return None;
                };
                return Some(Effect::Page(render_receipt(record)));
            }
        }
        None
    }

    fn submit(&mut self) -> Option<Effect> {
        if !matches!(self.phase, Phase::Editing) {
            return None;
        }
        match self.form().validate() {
            Ok(registration) => {
                self.errors = None;
                self.phase = Phase::Saving;
                self.set_status("Saving...", false);
                Some(Effect::Persist(registration))
            }
            Err(errors) => {
                if let Some(first) = errors.0.first() {
                    self.focus = first.field;
                }
                self.set_status(format!("Please fix {} field(s)", errors.0.len()), true);
                self.errors = Some(errors);
                None
            }
        }
    }

    fn new_registration(&mut self) {
        if !matches!(self.phase, Phase::Registered(_)) {
            return;
        }
        for field in Field::ALL {
            if field != Field::StallType {
                self.inputs[field.index()].reset();
            }
        }
        self.focus = Field::VendorName;
        self.errors = None;
        self.status = None;
        self.phase = Phase::Editing;
    }

    pub fn stored(&mut self, record: StallRecord) {
        self.set_status(format!("Registered {} as {}", record.id, record.name), false);
        self.known_stalls.push(record.clone());
        self.registered.push(record.clone());
        self.phase = Phase::Registered(record);
    }

    pub fn store_failed(&mut self, error: String) {
        self.set_status(format!("Could not save registration: {error}"), true);
        self.phase = Phase::Editing;
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEvent;

    use super::*;

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.apply(Action::Input(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
    }

    fn fill(app: &mut App) {
        let values = [
            (Field::VendorName, "Ada"),
            (Field::BusinessName, "Ada's Fish"),
            (Field::Phone, "5551234567"),
            (Field::Email, ""),
            (Field::StallType, "Fish"),
            (Field::Rent, "100"),
            (Field::StartDate, "2024-01-01"),
            (Field::EndDate, "2024-06-30"),
        ];
        for (field, value) in values {
            app.inputs[field.index()] = Input::new(value.to_string());
        }
    }

    fn known() -> Vec<StallRecord> {
        vec![
            StallRecord { id: "stall-2".into(), name: "Stall 3".into(), stall_type: "Fish".into(), ..Default::default() },
            StallRecord { id: "stall-7".into(), name: "Stall 1".into(), stall_type: "Meat".into(), ..Default::default() },
        ]
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut app = App::new(Vec::new(), None);
        type_text(&mut app, "Ada");
        app.apply(Action::FocusNextField);
        type_text(&mut app, "Shop");
        assert_eq!(app.input(Field::VendorName).value(), "Ada");
        assert_eq!(app.input(Field::BusinessName).value(), "Shop");
    }

    #[test]
    fn test_suggestion_follows_stall_type() {
        let mut app = App::new(known(), Some("meat".to_string()));
        assert_eq!(app.suggestion(), NextNumbers { id: 8, name: 2 });

        app.inputs[Field::StallType.index()] = Input::new(" FISH ".to_string());
        assert_eq!(app.suggestion(), NextNumbers { id: 8, name: 4 });

        app.inputs[Field::StallType.index()] = Input::default();
        assert_eq!(app.suggestion(), NextNumbers { id: 8, name: 4 });
    }

    #[test]
    fn test_invalid_submit_focuses_first_error() {
        let mut app = App::new(Vec::new(), None);
        fill(&mut app);
        app.inputs[Field::Phone.index()] = Input::new("12".to_string());
        app.focus = Field::EndDate;

        assert_eq!(app.apply(Action::Submit), None);
        assert_eq!(app.focus, Field::Phone);
        assert!(app.errors.as_ref().unwrap().for_field(Field::Phone).is_some());
        assert!(matches!(app.phase, Phase::Editing));
    }

    #[test]
    fn test_submit_flow() {
        let mut app = App::new(known(), None);
        fill(&mut app);

        let Some(Effect::Persist(registration)) = app.apply(Action::Submit) else {
            panic!("expected persist effect");
        };
        assert!(matches!(app.phase, Phase::Saving));
        assert_eq!(app.apply(Action::Submit), None);

        let mut record = registration.into_record(app.suggestion());
        record.key = Some(1);
        app.stored(record);
        assert_eq!(app.last_registered().unwrap().id, "stall-8");
        assert_eq!(app.suggestion(), NextNumbers { id: 9, name: 5 });

        assert!(matches!(app.apply(Action::CopyToClipboard(CopySource::ScanCode)), Some(Effect::Copy(code)) if code.starts_with("STALLREG1:")));

        app.apply(Action::NewRegistration);
        assert!(matches!(app.phase, Phase::Editing));
        assert_eq!(app.input(Field::VendorName).value(), "");
        assert_eq!(app.input(Field::StallType).value(), "Fish");
    }

    #[test]
    fn test_store_failure_returns_to_editing() {
        let mut app = App::new(Vec::new(), None);
        fill(&mut app);
        app.apply(Action::Submit);
        app.store_failed("disk full".to_string());

        assert!(matches!(app.phase, Phase::Editing));
        assert!(app.registered.is_empty());
        let status = app.status.as_ref().unwrap();
        assert!(status.is_error && status.text.contains("disk full"));
    }

    #[test]
    fn test_receipt_actions_need_registration() {
        let mut app = App::new(Vec::new(), None);
        assert_eq!(app.apply(Action::LaunchPager), None);
        assert_eq!(app.apply(Action::CopyToClipboard(CopySource::Receipt)), None);
        assert!(app.status.as_ref().unwrap().is_error);
    }
}
