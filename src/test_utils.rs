//! Shared test utilities for `DavidsCoins`.
//!
//! This module provides common helper functions for building ledgers,
//! trades, and tracked messages with sensible defaults.

use crate::core::ledger::{Ledger, NewTrade, TradeKind};
use crate::core::tickets::TrackedMessage;
use chrono::Utc;

/// Creates a buy trade between two users with sensible defaults.
///
/// # Defaults
/// * `kind`: [`TradeKind::Buy`]
/// * `amount`: 1B coins
/// * `payment_method`: `"PayPal"`
/// * display names: the user ids themselves
#[must_use]
pub fn new_trade(buyer_id: &str, seller_id: &str, price_usd: f64) -> NewTrade {
    NewTrade {
        kind: TradeKind::Buy,
        buyer_id: buyer_id.to_string(),
        buyer_name: buyer_id.to_string(),
        seller_id: seller_id.to_string(),
        seller_name: seller_id.to_string(),
        amount: 1_000_000_000.0,
        price_usd,
        payment_method: "PayPal".to_string(),
        channel_id: None,
        notes: String::new(),
    }
}

/// Builds a ledger with a handful of trades across three users, so
/// leaderboard and history tests have something to rank.
#[must_use]
pub fn seeded_ledger() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.add_trade(new_trade("alice", "shop", 52.5));
    ledger.add_trade(new_trade("bob", "shop", 120.0));
    ledger.add_trade(new_trade("alice", "bob", 10.0));
    ledger.add_rating("alice", 5.0);
    ledger.add_rating("bob", 3.0);
    ledger
}

/// Creates a human-authored tracked message stamped "now" with no embeds.
#[must_use]
pub fn tracked(author: &str, content: &str) -> TrackedMessage {
    TrackedMessage {
        author: author.to_string(),
        content: content.to_string(),
        timestamp: Utc::now(),
        is_bot: false,
        embeds: Vec::new(),
    }
}
