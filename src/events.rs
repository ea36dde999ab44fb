// Events that flow from gateway callbacks and background tasks into the
// TUI event loop
//
// Subscriptions deliver through closures that forward into one mpsc
// channel; the loop applies them to app state single-threaded, so all
// apparent concurrency is interleaved deliveries on one loop.

use crate::gateway::{GatewayError, Session, SnapshotResult};
use crate::ticket::Ticket;

#[derive(Debug)]
pub enum AppEvent {
    /// Session stream delivery: current state, then every change
    SessionChanged(Option<Session>),

    /// Live-query delivery: the complete current set, or a stream error
    TicketSnapshot(SnapshotResult),

    /// A create_ticket call finished
    SubmitFinished(Result<Ticket, GatewayError>),

    /// A sign_out call finished. Success needs no handling here - the
    /// session stream emits "no user" - but failures are surfaced.
    SignOutFinished(Result<(), GatewayError>),
}
