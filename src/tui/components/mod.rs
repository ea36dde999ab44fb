// Reusable UI components shared across views

pub mod sidebar;
pub mod status_bar;
pub mod toast;
