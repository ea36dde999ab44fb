// Ticket creation form - state machine and input handling
//
// Two states: Editing and Submitting. Validation runs at submit time;
// failures show inline under the offending field and the gateway is
// never called. The enforced-required set is title, description and
// contact email - the selects always hold a value. While Submitting the
// submit control is non-interactive and shows a busy label; a failed
// submission returns to Editing with every buffer intact.

use crate::ticket::{Category, Priority, TicketDraft, ValidationErrors};
use crossterm::event::KeyCode;

/// The form's lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Editing,
    Submitting,
}

/// Focusable controls, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Title,
    Description,
    Priority,
    Category,
    ContactEmail,
    ContactPhone,
    AttachmentPath,
    Submit,
}

impl Field {
    pub const ORDER: [Field; 8] = [
        Field::Title,
        Field::Description,
        Field::Priority,
        Field::Category,
        Field::ContactEmail,
        Field::ContactPhone,
        Field::AttachmentPath,
        Field::Submit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Priority => "Priority",
            Field::Category => "Category",
            Field::ContactEmail => "Contact Email",
            Field::ContactPhone => "Contact Phone",
            Field::AttachmentPath => "Attachment (file path)",
            Field::Submit => "Submit Ticket",
        }
    }

    /// Key into ValidationErrors for inline display
    pub fn error_key(&self) -> Option<&'static str> {
        match self {
            Field::Title => Some("title"),
            Field::Description => Some("description"),
            Field::ContactEmail => Some("contact_email"),
            _ => None,
        }
    }

    fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// What the owner (dashboard) should do with a handled key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    /// Input consumed, nothing for the owner to do
    None,
    /// User cancelled; close the modal, nothing persisted
    Cancel,
    /// Validation passed; the owner should run the submission
    Submit,
}

#[derive(Debug, Default)]
pub struct TicketForm {
    pub state: FormState,
    pub focus: Field,
    pub errors: ValidationErrors,

    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub contact_email: String,
    pub contact_phone: String,
    pub attachment_path: String,
}

impl TicketForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    /// Build the persistence payload from the current buffers
    pub fn draft(&self) -> TicketDraft {
        let phone = self.contact_phone.trim();
        TicketDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            priority: self.priority,
            category: self.category,
            contact_email: self.contact_email.trim().to_string(),
            contact_phone: (!phone.is_empty()).then(|| phone.to_string()),
        }
    }

    /// Attachment path if one was entered
    pub fn attachment_path(&self) -> Option<&str> {
        let path = self.attachment_path.trim();
        (!path.is_empty()).then_some(path)
    }

    /// Handle a key while the form modal is open
    pub fn handle_key(&mut self, key: KeyCode) -> FormAction {
        // Submitting: the whole form is non-interactive until the result
        // lands (the submission may still complete and close the modal)
        if self.is_submitting() {
            return FormAction::None;
        }

        match key {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Enter => {
                if self.focus == Field::Submit {
                    return self.try_submit();
                }
                self.focus = self.focus.next();
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if matches!(self.focus, Field::Priority | Field::Category) =>
            {
                self.cycle_select();
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.focused_buffer() {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.focused_buffer() {
                    buffer.push(c);
                }
            }
            _ => {}
        }
        FormAction::None
    }

    /// Validate and, on success, transition to Submitting
    fn try_submit(&mut self) -> FormAction {
        match self.draft().validate() {
            Ok(()) => {
                self.errors = ValidationErrors::default();
                self.state = FormState::Submitting;
                FormAction::Submit
            }
            Err(errors) => {
                self.errors = errors;
                FormAction::None
            }
        }
    }

    /// The submission failed; back to Editing with buffers untouched
    pub fn submit_failed(&mut self) {
        self.state = FormState::Editing;
    }

    fn cycle_select(&mut self) {
        match self.focus {
            Field::Priority => self.priority = self.priority.next(),
            Field::Category => self.category = self.category.next(),
            _ => {}
        }
    }

    fn focused_buffer(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::ContactEmail => Some(&mut self.contact_email),
            Field::ContactPhone => Some(&mut self.contact_phone),
            Field::AttachmentPath => Some(&mut self.attachment_path),
            Field::Priority | Field::Category | Field::Submit => None,
        }
    }

    /// Current text of the focused control, for rendering the cursor
    pub fn buffer_of(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::ContactEmail => &self.contact_email,
            Field::ContactPhone => &self.contact_phone,
            Field::AttachmentPath => &self.attachment_path,
            Field::Priority | Field::Category | Field::Submit => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(form: &mut TicketForm, text: &str) {
        for c in text.chars() {
            form.handle_key(KeyCode::Char(c));
        }
    }

    fn fill_valid(form: &mut TicketForm) {
        form.title = "Printer broken".to_string();
        form.description = "Won't turn on".to_string();
        form.contact_email = "a@b.com".to_string();
    }

    fn focus_submit(form: &mut TicketForm) {
        while form.focus != Field::Submit {
            form.handle_key(KeyCode::Tab);
        }
    }

    #[test]
    fn typing_edits_the_focused_buffer() {
        let mut form = TicketForm::new();
        type_str(&mut form, "Help");
        assert_eq!(form.title, "Help");

        form.handle_key(KeyCode::Tab);
        type_str(&mut form, "It broke");
        assert_eq!(form.description, "It broke");

        form.handle_key(KeyCode::Backspace);
        assert_eq!(form.description, "It brok");
    }

    #[test]
    fn selects_cycle_and_never_go_empty() {
        let mut form = TicketForm::new();
        form.focus = Field::Priority;
        assert_eq!(form.priority, Priority::Medium);
        form.handle_key(KeyCode::Char(' '));
        assert_eq!(form.priority, Priority::High);

        form.focus = Field::Category;
        form.handle_key(KeyCode::Right);
        assert_eq!(form.category, Category::Technical);
    }

    #[test]
    fn invalid_submit_stays_editing_with_inline_errors() {
        let mut form = TicketForm::new();
        focus_submit(&mut form);
        let action = form.handle_key(KeyCode::Enter);
        assert_eq!(action, FormAction::None);
        assert_eq!(form.state, FormState::Editing);
        assert!(form.errors.get("title").is_some());
        assert!(form.errors.get("description").is_some());
        assert!(form.errors.get("contact_email").is_some());
    }

    #[test]
    fn valid_submit_transitions_to_submitting() {
        let mut form = TicketForm::new();
        fill_valid(&mut form);
        focus_submit(&mut form);
        let action = form.handle_key(KeyCode::Enter);
        assert_eq!(action, FormAction::Submit);
        assert!(form.is_submitting());
        assert!(form.errors.is_empty());
    }

    #[test]
    fn priority_and_category_are_not_blocking() {
        // The selects always hold a value; only the text fields gate submit
        let mut form = TicketForm::new();
        fill_valid(&mut form);
        focus_submit(&mut form);
        assert_eq!(form.handle_key(KeyCode::Enter), FormAction::Submit);
        let draft = form.draft();
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.category, Category::General);
    }

    #[test]
    fn input_is_swallowed_while_submitting() {
        let mut form = TicketForm::new();
        fill_valid(&mut form);
        focus_submit(&mut form);
        form.handle_key(KeyCode::Enter);
        assert!(form.is_submitting());

        assert_eq!(form.handle_key(KeyCode::Esc), FormAction::None);
        assert_eq!(form.handle_key(KeyCode::Char('x')), FormAction::None);
        assert_eq!(form.title, "Printer broken");
    }

    #[test]
    fn failed_submit_returns_to_editing_with_buffers_intact() {
        let mut form = TicketForm::new();
        fill_valid(&mut form);
        form.attachment_path = "/tmp/shot.png".to_string();
        focus_submit(&mut form);
        form.handle_key(KeyCode::Enter);

        form.submit_failed();
        assert_eq!(form.state, FormState::Editing);
        assert_eq!(form.title, "Printer broken");
        assert_eq!(form.attachment_path(), Some("/tmp/shot.png"));
    }

    #[test]
    fn esc_cancels_while_editing() {
        let mut form = TicketForm::new();
        assert_eq!(form.handle_key(KeyCode::Esc), FormAction::Cancel);
    }

    #[test]
    fn empty_optional_fields_become_none() {
        let mut form = TicketForm::new();
        fill_valid(&mut form);
        form.contact_phone = "  ".to_string();
        let draft = form.draft();
        assert_eq!(draft.contact_phone, None);
        assert_eq!(form.attachment_path(), None);
    }
}
