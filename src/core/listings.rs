//! Marketplace listing wizard and published listing board.
//!
//! Creating a listing is a linear four-step flow per user: pick a type,
//! fill in details, pick payment methods, published. Each submission is only
//! accepted when the in-memory session exists and sits in the expected step;
//! anything else fails with [`Error::SessionExpired`] and the bot answers
//! with a "session expired, restart" message instead of crashing. Sessions
//! are deleted on publish or cancel and otherwise simply linger - there is
//! no TTL, a deliberate simplicity choice for a low-volume community.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::errors::{Error, Result};

/// Where in the wizard a session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStep {
    /// Waiting for the user to pick account vs profile.
    TypeSelection,
    /// Waiting for the details modal.
    DetailsInput,
    /// Waiting for payment method buttons.
    PaymentSelection,
    /// Terminal step; the session is removed once reached.
    Published,
}

/// What is being sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// A full game account.
    Account,
    /// A single profile on an account.
    Profile,
}

impl ListingKind {
    /// Label used in embeds.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Profile => "Profile",
        }
    }
}

/// In-flight wizard state for one user.
#[derive(Debug, Clone)]
pub struct ListingSession {
    /// Current step.
    pub step: ListingStep,
    /// Chosen listing kind, set by the first step.
    pub kind: Option<ListingKind>,
    /// Listing title, set by the details step.
    pub title: Option<String>,
    /// Listing description, set by the details step.
    pub description: Option<String>,
    /// Asking price in USD, set by the details step.
    pub price: Option<f64>,
    /// The user building the listing.
    pub owner_id: String,
}

/// A published marketplace listing.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Board-unique listing id.
    pub id: u64,
    /// Account or profile.
    pub kind: ListingKind,
    /// Title shown in the marketplace embed.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Asking price in USD.
    pub price: f64,
    /// Accepted payment methods.
    pub payment_methods: Vec<String>,
    /// Seller's user id.
    pub owner_id: String,
    /// When the listing went live.
    pub created_at: DateTime<Utc>,
}

/// Wizard sessions plus the published listings they produce.
#[derive(Debug, Default)]
pub struct ListingBoard {
    sessions: HashMap<String, ListingSession>,
    listings: HashMap<u64, Listing>,
    next_id: u64,
}

impl ListingBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the wizard for a user.
    ///
    /// A fresh start replaces any abandoned session, which is also the only
    /// way a stale session ever goes away.
    pub fn start_session(&mut self, user_id: &str) {
        self.sessions.insert(
            user_id.to_string(),
            ListingSession {
                step: ListingStep::TypeSelection,
                kind: None,
                title: None,
                description: None,
                price: None,
                owner_id: user_id.to_string(),
            },
        );
    }

    /// Current session for a user, if one exists.
    #[must_use]
    pub fn session(&self, user_id: &str) -> Option<&ListingSession> {
        self.sessions.get(user_id)
    }

    fn session_at_step(&mut self, user_id: &str, step: ListingStep) -> Result<&mut ListingSession> {
        match self.sessions.get_mut(user_id) {
            Some(session) if session.step == step => Ok(session),
            _ => Err(Error::SessionExpired),
        }
    }

    /// Step 1: records the listing kind and advances to details input.
    pub fn choose_kind(&mut self, user_id: &str, kind: ListingKind) -> Result<()> {
        let session = self.session_at_step(user_id, ListingStep::TypeSelection)?;
        session.kind = Some(kind);
        session.step = ListingStep::DetailsInput;
        Ok(())
    }

    /// Step 2: records title/description/price and advances to payment
    /// selection. Price must already be validated by the boundary.
    pub fn set_details(
        &mut self,
        user_id: &str,
        title: &str,
        description: &str,
        price: f64,
    ) -> Result<()> {
        let session = self.session_at_step(user_id, ListingStep::DetailsInput)?;
        session.title = Some(title.to_string());
        session.description = Some(description.to_string());
        session.price = Some(price);
        session.step = ListingStep::PaymentSelection;
        Ok(())
    }

    /// Step 3: records payment methods, publishes the listing, and deletes
    /// the session.
    pub fn publish(&mut self, user_id: &str, payment_methods: Vec<String>) -> Result<Listing> {
        {
            let session = self.session_at_step(user_id, ListingStep::PaymentSelection)?;
            session.step = ListingStep::Published;
        }
        // The session passed every step gate, so all fields are populated.
        let session = self.sessions.remove(user_id).ok_or(Error::SessionExpired)?;
        let (Some(kind), Some(title), Some(description), Some(price)) =
            (session.kind, session.title, session.description, session.price)
        else {
            return Err(Error::SessionExpired);
        };

        self.next_id += 1;
        let listing = Listing {
            id: self.next_id,
            kind,
            title,
            description,
            price,
            payment_methods,
            owner_id: session.owner_id,
            created_at: Utc::now(),
        };
        self.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    /// Drops a session without publishing.
    pub fn cancel_session(&mut self, user_id: &str) {
        self.sessions.remove(user_id);
    }

    /// A published listing by id.
    #[must_use]
    pub fn listing(&self, id: u64) -> Option<&Listing> {
        self.listings.get(&id)
    }

    /// All published listings, newest id first.
    #[must_use]
    pub fn listings(&self) -> Vec<&Listing> {
        let mut all: Vec<&Listing> = self.listings.values().collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        all
    }

    /// Removes a listing, but only for its owner. Returns the removed
    /// listing, or `None` when it does not exist or belongs to someone else.
    pub fn unlist(&mut self, id: u64, requester: &str) -> Option<Listing> {
        if self.listings.get(&id)?.owner_id != requester {
            return None;
        }
        self.listings.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    fn published_board() -> (ListingBoard, Listing) {
        let mut board = ListingBoard::new();
        board.start_session("u1");
        board.choose_kind("u1", ListingKind::Account).unwrap();
        board
            .set_details("u1", "Maxed account", "end-game, full gear", 150.0)
            .unwrap();
        let listing = board
            .publish("u1", vec!["PayPal".to_string(), "BTC".to_string()])
            .unwrap();
        (board, listing)
    }

    #[test]
    fn test_full_wizard_walkthrough() {
        let (board, listing) = published_board();
        assert_eq!(listing.kind, ListingKind::Account);
        assert_eq!(listing.title, "Maxed account");
        assert_eq!(listing.price, 150.0);
        assert_eq!(listing.owner_id, "u1");
        // The session is gone once published.
        assert!(board.session("u1").is_none());
        assert_eq!(board.listing(listing.id).unwrap().title, "Maxed account");
    }

    #[test]
    fn test_steps_enforced_in_order() {
        let mut board = ListingBoard::new();
        board.start_session("u1");
        // Details before choosing a type is an expired-session error.
        assert!(matches!(
            board.set_details("u1", "t", "d", 1.0),
            Err(Error::SessionExpired)
        ));
        // So is publishing straight away.
        assert!(board.publish("u1", vec![]).is_err());
        // The session itself survives a rejected submission.
        assert_eq!(board.session("u1").unwrap().step, ListingStep::TypeSelection);
    }

    #[test]
    fn test_missing_session_is_expired() {
        let mut board = ListingBoard::new();
        assert!(matches!(
            board.choose_kind("ghost", ListingKind::Profile),
            Err(Error::SessionExpired)
        ));
    }

    #[test]
    fn test_restart_replaces_abandoned_session() {
        let mut board = ListingBoard::new();
        board.start_session("u1");
        board.choose_kind("u1", ListingKind::Profile).unwrap();
        // Abandon mid-flow, then start over.
        board.start_session("u1");
        let session = board.session("u1").unwrap();
        assert_eq!(session.step, ListingStep::TypeSelection);
        assert!(session.kind.is_none());
    }

    #[test]
    fn test_cancel_drops_session() {
        let mut board = ListingBoard::new();
        board.start_session("u1");
        board.cancel_session("u1");
        assert!(board.session("u1").is_none());
    }

    #[test]
    fn test_unlist_owner_only() {
        let (mut board, listing) = published_board();
        assert!(board.unlist(listing.id, "intruder").is_none());
        assert!(board.listing(listing.id).is_some());
        let removed = board.unlist(listing.id, "u1").unwrap();
        assert_eq!(removed.id, listing.id);
        assert!(board.listing(listing.id).is_none());
    }

    #[test]
    fn test_listings_newest_first() {
        let mut board = ListingBoard::new();
        for (user, title) in [("u1", "first"), ("u2", "second")] {
            board.start_session(user);
            board.choose_kind(user, ListingKind::Profile).unwrap();
            board.set_details(user, title, "desc", 10.0).unwrap();
            board.publish(user, vec!["PayPal".to_string()]).unwrap();
        }
        let all = board.listings();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "second");
    }
}
