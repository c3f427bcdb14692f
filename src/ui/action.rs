use crossterm::event::KeyEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum QuitAction {
    Finish,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CopySource {
    ScanCode,
    Receipt,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit(QuitAction),
    CopyToClipboard(CopySource),
    Submit,
    FocusPreviousField,
    FocusNextField,
    NewRegistration,
    ToggleHelp,
    LaunchPager,
    Input(KeyEvent),
}
