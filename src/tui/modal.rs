// Modal overlays - highest layer of the input dispatch
//
// While a modal is open it captures all key input; nothing reaches the
// global or view layers until it closes.

use super::form::{FormAction, TicketForm};
use crossterm::event::KeyCode;

/// What the app should do after a modal consumed a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    /// Input consumed, modal stays open
    None,
    /// Close the modal
    Close,
    /// Run the ticket submission (form validated and is now Submitting)
    SubmitTicket,
}

pub enum Modal {
    CreateTicket(TicketForm),
    Help,
}

impl Modal {
    pub fn create_ticket() -> Self {
        Modal::CreateTicket(TicketForm::new())
    }

    pub fn help() -> Self {
        Modal::Help
    }

    pub fn handle_input(&mut self, key: KeyCode) -> ModalAction {
        match self {
            Modal::CreateTicket(form) => match form.handle_key(key) {
                FormAction::None => ModalAction::None,
                FormAction::Cancel => ModalAction::Close,
                FormAction::Submit => ModalAction::SubmitTicket,
            },
            Modal::Help => match key {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => ModalAction::Close,
                _ => ModalAction::None,
            },
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut TicketForm> {
        match self {
            Modal::CreateTicket(form) => Some(form),
            Modal::Help => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_closes_on_esc_and_toggle_key() {
        let mut modal = Modal::help();
        assert_eq!(modal.handle_input(KeyCode::Char('x')), ModalAction::None);
        assert_eq!(modal.handle_input(KeyCode::Esc), ModalAction::Close);
        let mut modal = Modal::help();
        assert_eq!(modal.handle_input(KeyCode::Char('?')), ModalAction::Close);
    }

    #[test]
    fn create_ticket_cancel_maps_to_close() {
        let mut modal = Modal::create_ticket();
        assert_eq!(modal.handle_input(KeyCode::Esc), ModalAction::Close);
    }
}
