// Demo mode: drive the dashboard against the in-memory backend
//
// Signs in a demo user after a short delay, seeds a few existing
// tickets, then trickles in new ones so the live query has something
// to deliver. No network, no credentials.
//
// Run with: TICKWATCH_DEMO=1 cargo run --release

use crate::gateway::memory::MemoryBackend;
use crate::gateway::{Session, TicketStore};
use crate::ticket::{Category, Priority, TicketDraft};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;

const DEMO_UID: &str = "demo-user";
const DEMO_EMAIL: &str = "demo@example.com";

/// Seed a session and a stream of tickets into the in-memory backend
pub async fn run_demo(backend: Arc<MemoryBackend>, mut shutdown_rx: oneshot::Receiver<()>) {
    // Initial delay to let the TUI render the loading state
    sleep(Duration::from_millis(1200)).await;

    backend.sign_in(Session {
        uid: DEMO_UID.to_string(),
        email: Some(DEMO_EMAIL.to_string()),
    });
    tracing::info!("Demo session established");

    for (draft, delay_ms) in demo_sequence() {
        if shutdown_rx.try_recv().is_ok() {
            return;
        }
        sleep(Duration::from_millis(delay_ms)).await;
        if let Err(e) = backend.create_ticket(draft, None, DEMO_UID).await {
            tracing::warn!("Demo ticket rejected: {}", e);
        }
    }

    // Keep running so the TUI stays active, but listen for shutdown
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                tracing::info!("Demo received shutdown signal");
                return;
            }
            _ = sleep(Duration::from_secs(60)) => {}
        }
    }
}

fn demo_sequence() -> Vec<(TicketDraft, u64)> {
    let draft = |title: &str, description: &str, priority, category| TicketDraft {
        title: title.to_string(),
        description: description.to_string(),
        priority,
        category,
        contact_email: DEMO_EMAIL.to_string(),
        contact_phone: None,
    };

    vec![
        (
            draft(
                "Cannot reset password",
                "The reset link in the email returns a 404.",
                Priority::High,
                Category::Technical,
            ),
            200,
        ),
        (
            draft(
                "Invoice shows wrong amount",
                "March invoice charged the old plan price.",
                Priority::Medium,
                Category::Billing,
            ),
            400,
        ),
        (
            draft(
                "Feature request: dark mode",
                "The settings page is very bright at night.",
                Priority::Low,
                Category::General,
            ),
            2500,
        ),
        (
            draft(
                "Export hangs on large projects",
                "CSV export spins forever past ~10k rows.",
                Priority::High,
                Category::Technical,
            ),
            4000,
        ),
        (
            draft(
                "Question about seat licensing",
                "Do read-only viewers count against the seat limit?",
                Priority::Low,
                Category::Billing,
            ),
            6000,
        ),
    ]
}
