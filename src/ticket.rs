// Ticket domain model and form-side validation
//
// A ticket is created exclusively through the creation form and is
// insert-only from this client: no mutation or deletion after the write.
// Required-field enforcement happens here, at submit time - the backend
// stores whatever it is handed.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Ticket priority as offered by the form's select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Next value in the select's cycle order
    pub fn next(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket category as offered by the form's select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technical,
    Billing,
    #[default]
    General,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Technical, Category::Billing, Category::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Billing => "billing",
            Category::General => "general",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Category::Technical => Category::Billing,
            Category::Billing => Category::General,
            Category::General => Category::Technical,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status a freshly created ticket carries. No transition logic in scope.
pub const STATUS_OPEN: &str = "Open";

/// A support ticket as stored in the backend's "tickets" collection.
/// Field names on the wire are camelCase, matching the stored documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Opaque identifier assigned by the store on creation
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    /// Resolved URL of the uploaded attachment, if any.
    /// Never dangling: written only after the upload succeeded.
    pub attachment: Option<String>,
    pub status: String,
    pub created_by: String,
    /// Client clock at submission time
    pub created_at: DateTime<Utc>,
    /// Never populated by in-scope logic
    pub assigned_to: Option<String>,
}

/// The form's payload before persistence: everything the user typed,
/// minus what the store fills in (id, status, created_by, created_at).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

/// Per-field validation failures, keyed by field name for inline display.
/// BTreeMap keeps the display order stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }
}

fn email_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Shape check only, not RFC 5322: something@something.something
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

impl TicketDraft {
    /// Validate the enforced-required set: title, description, contact email.
    /// Priority and category always hold a value in the select widgets, so
    /// they cannot fail here.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.title.trim().is_empty() {
            errors.insert("title", "Title is required");
        }
        if self.description.trim().is_empty() {
            errors.insert("description", "Description is required");
        }
        if self.contact_email.trim().is_empty() {
            errors.insert("contact_email", "Contact email is required");
        } else if !email_shape().is_match(self.contact_email.trim()) {
            errors.insert("contact_email", "Contact email doesn't look like an email");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> TicketDraft {
        TicketDraft {
            title: "Printer broken".to_string(),
            description: "Won't turn on".to_string(),
            priority: Priority::Medium,
            category: Category::General,
            contact_email: "a@b.com".to_string(),
            contact_phone: None,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(valid_draft().validate().is_ok());
    }

    #[test]
    fn missing_title_is_rejected() {
        let mut draft = valid_draft();
        draft.title = "   ".to_string();
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert!(errors.get("description").is_none());
    }

    #[test]
    fn missing_description_is_rejected() {
        let mut draft = valid_draft();
        draft.description = String::new();
        let errors = draft.validate().unwrap_err();
        assert!(errors.get("description").is_some());
    }

    #[test]
    fn missing_email_is_rejected() {
        let mut draft = valid_draft();
        draft.contact_email = String::new();
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.get("contact_email"), Some("Contact email is required"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["plainword", "a@b", "a b@c.com", "@c.com"] {
            let mut draft = valid_draft();
            draft.contact_email = bad.to_string();
            assert!(draft.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn phone_is_optional() {
        let mut draft = valid_draft();
        draft.contact_phone = None;
        assert!(draft.validate().is_ok());
        draft.contact_phone = Some("555-0100".to_string());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn multiple_failures_collect_per_field() {
        let draft = TicketDraft::default();
        let errors = draft.validate().unwrap_err();
        assert!(errors.get("title").is_some());
        assert!(errors.get("description").is_some());
        assert!(errors.get("contact_email").is_some());
    }

    #[test]
    fn select_cycles_cover_all_values() {
        let mut p = Priority::Low;
        let mut seen = vec![p];
        for _ in 0..2 {
            p = p.next();
            seen.push(p);
        }
        assert_eq!(seen, Priority::ALL.to_vec());
        assert_eq!(p.next(), Priority::Low);

        let mut c = Category::Technical;
        let mut seen = vec![c];
        for _ in 0..2 {
            c = c.next();
            seen.push(c);
        }
        assert_eq!(seen, Category::ALL.to_vec());
    }
}
