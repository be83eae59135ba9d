use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use zonar_core::CaptureEvent;

use crate::app::{App, Focus, METHODS, Screen};

#[derive(Debug, Clone)]
pub(crate) enum Action {
    None,
    Quit,
    /// Feed an event into the capture machine and run its effects.
    Capture(CaptureEvent),
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Delete, Down, Enter, Esc, F, Left, PageDown, PageUp, Right, Tab, Up};

    // Global quit shortcut; plain 'q' only outside the text-entry screen.
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q')
        && key.modifiers.is_empty()
        && !matches!(app.screen, Screen::AddressEntry)
    {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::MethodSelect => match key.code {
            Up | Char('k') => {
                if app.method_index > 0 {
                    app.method_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.method_index + 1 < METHODS.len() {
                    app.method_index += 1;
                }
            }
            Enter | Char(' ') => {
                app.screen = Screen::AddressEntry;
                action = Action::Capture(CaptureEvent::MethodChanged(app.current_method()));
            }
            _ => {}
        },

        Screen::AddressEntry => match key.code {
            Up => {
                if app.suggestion_index > 0 {
                    app.suggestion_index -= 1;
                }
            }
            Down => {
                if app.suggestion_index + 1 < app.machine.suggestions().len() {
                    app.suggestion_index += 1;
                }
            }
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.focused_field().push(character);
                    if app.focus == Focus::Address {
                        action = Action::Capture(CaptureEvent::TextChanged(
                            app.address_input.clone(),
                        ));
                    } else {
                        app.revalidate();
                    }
                }
            }
            Backspace => {
                app.focused_field().pop();
                if app.focus == Focus::Address {
                    action =
                        Action::Capture(CaptureEvent::TextChanged(app.address_input.clone()));
                } else {
                    app.revalidate();
                }
            }
            Enter => {
                if app.focus == Focus::Address {
                    if let Some(candidate) =
                        app.machine.suggestions().get(app.suggestion_index).cloned()
                    {
                        action = Action::Capture(CaptureEvent::SuggestionChosen(candidate));
                    }
                } else {
                    app.focus = app.focus.next();
                }
            }
            Tab => {
                app.focus = app.focus.next();
            }
            Delete => {
                action = Action::Capture(CaptureEvent::Clear);
            }
            PageUp => {
                app.map.zoom_in();
            }
            PageDown => {
                app.map.zoom_out();
            }
            // Drop a pin at the current map center, like clicking the map.
            F(3) => {
                action = Action::Capture(app.map.click(app.map.center()));
            }
            F(2) => {
                app.cycle_provider();
            }
            Right => {
                app.screen = Screen::Summary;
            }
            Esc | Left => {
                app.screen = Screen::MethodSelect;
            }
            _ => {}
        },

        Screen::Summary => match key.code {
            Left | Esc | Char('b') => {
                app.screen = Screen::AddressEntry;
            }
            Char('m') => {
                app.screen = Screen::MethodSelect;
            }
            _ => {}
        },
    }
    action
}
