/// Trading ledger, user profiles, and time-bucketed statistics
pub mod ledger;

/// Marketplace listing wizard and published listing board
pub mod listings;

/// Amount parsing and price calculation
pub mod pricing;

/// Ticket registry and lifecycle state machine
pub mod tickets;

/// Transcript rendering for closed tickets
pub mod transcript;
