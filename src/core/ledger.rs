//! Trading ledger and statistics engine.
//!
//! This module owns the append-only trade log, the lazily-created per-user
//! profiles, and the server-wide counters with day/week/month buckets. All
//! aggregates are maintained incrementally at write time, never recomputed
//! from the log, so they stay consistent with the trade sequence by
//! construction. The ledger trusts its callers: validation happens at the
//! Discord boundary, and a partial update is never rolled back (failures in
//! here can only be programming errors, not I/O).
//!
//! One deliberate quirk is preserved from the original product: **both**
//! buyer and seller are credited the full USD price as "volume". The
//! leaderboard ranks activity, not net flow, so the double counting is
//! intentional and load-bearing.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};

/// Opaque Discord user identifier, stored as given by the boundary.
pub type UserId = String;

/// What kind of transaction a trade records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    /// Customer bought coins from the shop.
    Buy,
    /// Customer sold coins to the shop.
    Sell,
    /// Customer bought a listed account/profile.
    AccountPurchase,
}

impl TradeKind {
    /// Short label used in embeds and transcripts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::AccountPurchase => "account_purchase",
        }
    }
}

/// Monotonically non-decreasing per-user trade counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeCounters {
    /// Total trades this user participated in.
    pub total: u64,
    /// Trades where this user was the buyer.
    pub buys: u64,
    /// Trades where this user was the seller.
    pub sells: u64,
    /// Sum of USD prices credited to this user (double-counted across
    /// buyer/seller, see module docs).
    pub total_volume_usd: f64,
}

/// Running-mean reputation for a user.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reputation {
    /// Number of ratings received.
    pub total_ratings: u32,
    /// Sum of all rating values.
    pub rating_sum: f64,
}

impl Reputation {
    /// Current rating in `[0, 5]`; defaults to 5.0 until the first rating.
    #[must_use]
    pub fn rating(&self) -> f64 {
        if self.total_ratings > 0 {
            self.rating_sum / f64::from(self.total_ratings)
        } else {
            5.0
        }
    }
}

/// Per-user profile, created lazily on first trade and never deleted.
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// Discord user id.
    pub user_id: UserId,
    /// Last-seen display name, overwritten on each trade.
    pub username: String,
    /// When the profile was first created.
    pub join_date: DateTime<Utc>,
    /// Last time this user traded or was refreshed.
    pub last_active: DateTime<Utc>,
    /// Trade counters.
    pub trades: TradeCounters,
    /// Reputation state.
    pub reputation: Reputation,
    /// Trade ids involving this user, in chronological (append) order.
    pub history: Vec<String>,
}

/// One immutable entry in the global trade log.
#[derive(Debug, Clone)]
pub struct Trade {
    /// Globally unique id, `"T{unix_millis}-{seq}"`.
    pub trade_id: String,
    /// What kind of transaction this was.
    pub kind: TradeKind,
    /// Buyer's user id.
    pub buyer_id: UserId,
    /// Seller's user id.
    pub seller_id: UserId,
    /// Coin amount (or 0 for account purchases priced directly in USD).
    pub amount: f64,
    /// Agreed USD price.
    pub price_usd: f64,
    /// How the trade was paid (e.g. "PayPal", "BTC").
    pub payment_method: String,
    /// When the trade was recorded.
    pub timestamp: DateTime<Utc>,
    /// Ticket channel the trade was settled in, when there was one.
    pub channel_id: Option<u64>,
    /// Free-text staff notes.
    pub notes: String,
}

/// Input for [`Ledger::add_trade`]. The boundary has already validated it.
#[derive(Debug, Clone)]
pub struct NewTrade {
    /// What kind of transaction this is.
    pub kind: TradeKind,
    /// Buyer's user id.
    pub buyer_id: UserId,
    /// Buyer's current display name.
    pub buyer_name: String,
    /// Seller's user id.
    pub seller_id: UserId,
    /// Seller's current display name.
    pub seller_name: String,
    /// Coin amount.
    pub amount: f64,
    /// Agreed USD price.
    pub price_usd: f64,
    /// Payment method label.
    pub payment_method: String,
    /// Originating ticket channel, if any.
    pub channel_id: Option<u64>,
    /// Free-text staff notes.
    pub notes: String,
}

/// Per-bucket aggregate, also returned for "current period" queries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodStats {
    /// Trades recorded in the bucket.
    pub trades: u64,
    /// USD revenue recorded in the bucket.
    pub revenue: f64,
}

/// Time window for [`Ledger::stats_for_period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Current calendar day.
    Daily,
    /// Current ISO week.
    Weekly,
    /// Current calendar month.
    Monthly,
}

/// Metric used to rank the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardMetric {
    /// Total USD volume credited.
    Volume,
    /// Total trade count.
    Trades,
    /// Buy count.
    Buys,
    /// Sell count.
    Sells,
    /// Reputation rating (users with zero ratings are excluded).
    Reputation,
}

impl LeaderboardMetric {
    /// Parses a user-supplied metric name; `None` for anything unknown.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_lowercase().as_str() {
            "volume" => Some(Self::Volume),
            "trades" => Some(Self::Trades),
            "buys" => Some(Self::Buys),
            "sells" => Some(Self::Sells),
            "reputation" | "rep" => Some(Self::Reputation),
            _ => None,
        }
    }
}

/// Server-wide counters plus time-bucketed revenue.
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Total trades ever recorded.
    pub total_trades: u64,
    /// Total USD revenue ever recorded.
    pub total_revenue: f64,
    /// Number of distinct user profiles.
    pub total_users: u64,
    /// Calendar-day buckets, keyed `YYYY-MM-DD`.
    pub daily: HashMap<String, PeriodStats>,
    /// ISO-week buckets, keyed `YYYY-Wnn`.
    pub weekly: HashMap<String, PeriodStats>,
    /// Calendar-month buckets, keyed `YYYY-MM`.
    pub monthly: HashMap<String, PeriodStats>,
}

/// The in-memory trading ledger.
///
/// Constructed once at process start and shared behind a lock in the bot
/// context; single-writer semantics are preserved by taking the write guard
/// for the whole of each mutating call.
#[derive(Debug, Default)]
pub struct Ledger {
    users: HashMap<UserId, UserProfile>,
    // Profile insertion order; used so leaderboard ties resolve the same way
    // across queries within a process lifetime.
    user_order: Vec<UserId>,
    trades: Vec<Trade>,
    trade_seq: u64,
    stats: ServerStats,
}

/// Bucket keys for a timestamp: (day, ISO week, month).
fn bucket_keys(at: DateTime<Utc>) -> (String, String, String) {
    let iso = at.iso_week();
    (
        at.format("%Y-%m-%d").to_string(),
        format!("{}-W{:02}", iso.year(), iso.week()),
        at.format("%Y-%m").to_string(),
    )
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the profile for `user_id`, creating it with defaults on first
    /// sight. Existing profiles get their `username` and `last_active`
    /// refreshed. Never fails.
    pub fn get_or_create_user(&mut self, user_id: &str, username: &str) -> &mut UserProfile {
        let user_order = &mut self.user_order;
        let stats = &mut self.stats;
        let profile = self.users.entry(user_id.to_string()).or_insert_with(|| {
            user_order.push(user_id.to_string());
            stats.total_users += 1;
            let now = Utc::now();
            UserProfile {
                user_id: user_id.to_string(),
                username: username.to_string(),
                join_date: now,
                last_active: now,
                trades: TradeCounters::default(),
                reputation: Reputation::default(),
                history: Vec::new(),
            }
        });
        profile.username = username.to_string();
        profile.last_active = Utc::now();
        profile
    }

    /// Looks up a profile without creating it.
    #[must_use]
    pub fn get_user(&self, user_id: &str) -> Option<&UserProfile> {
        self.users.get(user_id)
    }

    /// Finds a profile by id or (case-insensitive) last-seen username.
    #[must_use]
    pub fn find_user(&self, query: &str) -> Option<&UserProfile> {
        self.users.get(query).or_else(|| {
            self.users
                .values()
                .find(|p| p.username.eq_ignore_ascii_case(query))
        })
    }

    /// Records a trade and updates every derived aggregate.
    ///
    /// Generates a unique id (a per-ledger sequence number keeps ids distinct
    /// even for two trades in the same millisecond), appends to the global
    /// log, credits **both** participants with the full `price_usd` as
    /// volume, bumps the matching buy/sell counters, appends the id to both
    /// histories, and feeds the server totals and the current day/week/month
    /// buckets. Side effects only; nothing is rolled back.
    pub fn add_trade(&mut self, new: NewTrade) -> Trade {
        let timestamp = Utc::now();
        let trade_id = format!("T{}-{}", timestamp.timestamp_millis(), self.trade_seq);
        self.trade_seq += 1;

        let trade = Trade {
            trade_id: trade_id.clone(),
            kind: new.kind,
            buyer_id: new.buyer_id.clone(),
            seller_id: new.seller_id.clone(),
            amount: new.amount,
            price_usd: new.price_usd,
            payment_method: new.payment_method,
            timestamp,
            channel_id: new.channel_id,
            notes: new.notes,
        };

        {
            let buyer = self.get_or_create_user(&new.buyer_id, &new.buyer_name);
            buyer.trades.total += 1;
            buyer.trades.buys += 1;
            buyer.trades.total_volume_usd += trade.price_usd;
            buyer.history.push(trade_id.clone());
        }
        {
            let seller = self.get_or_create_user(&new.seller_id, &new.seller_name);
            seller.trades.total += 1;
            seller.trades.sells += 1;
            seller.trades.total_volume_usd += trade.price_usd;
            seller.history.push(trade_id.clone());
        }

        self.stats.total_trades += 1;
        self.stats.total_revenue += trade.price_usd;
        let (day, week, month) = bucket_keys(timestamp);
        for (map, key) in [
            (&mut self.stats.daily, day),
            (&mut self.stats.weekly, week),
            (&mut self.stats.monthly, month),
        ] {
            let bucket = map.entry(key).or_default();
            bucket.trades += 1;
            bucket.revenue += trade.price_usd;
        }

        self.trades.push(trade.clone());
        trade
    }

    /// Applies a rating in `[0, 5]` to a user's running mean.
    ///
    /// Returns `false` if the user has no profile yet; ratings never create
    /// profiles implicitly.
    pub fn add_rating(&mut self, user_id: &str, rating: f64) -> bool {
        match self.users.get_mut(user_id) {
            Some(profile) => {
                profile.reputation.total_ratings += 1;
                profile.reputation.rating_sum += rating;
                true
            }
            None => false,
        }
    }

    /// Ranks users descending by `metric`, truncated to `limit`.
    ///
    /// The sort is stable over profile insertion order, so ties keep the
    /// order users first appeared. The reputation ranking excludes users who
    /// have never been rated (their default 5.0 would otherwise flood it).
    #[must_use]
    pub fn top_traders(&self, metric: LeaderboardMetric, limit: usize) -> Vec<&UserProfile> {
        let mut ranked: Vec<&UserProfile> = self
            .user_order
            .iter()
            .filter_map(|id| self.users.get(id))
            .filter(|p| metric != LeaderboardMetric::Reputation || p.reputation.total_ratings > 0)
            .collect();

        let key = |p: &UserProfile| -> f64 {
            match metric {
                LeaderboardMetric::Volume => p.trades.total_volume_usd,
                #[allow(clippy::cast_precision_loss)]
                LeaderboardMetric::Trades => p.trades.total as f64,
                #[allow(clippy::cast_precision_loss)]
                LeaderboardMetric::Buys => p.trades.buys as f64,
                #[allow(clippy::cast_precision_loss)]
                LeaderboardMetric::Sells => p.trades.sells as f64,
                LeaderboardMetric::Reputation => p.reputation.rating(),
            }
        };
        ranked.sort_by(|a, b| {
            key(b)
                .partial_cmp(&key(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(limit);
        ranked
    }

    /// All trades involving `user_id`, newest first, truncated to `limit`.
    #[must_use]
    pub fn user_history(&self, user_id: &str, limit: usize) -> Vec<&Trade> {
        self.trades
            .iter()
            .rev()
            .filter(|t| t.buyer_id == user_id || t.seller_id == user_id)
            .take(limit)
            .collect()
    }

    /// The global trade log, newest first, truncated to `limit`.
    #[must_use]
    pub fn recent_trades(&self, limit: usize) -> Vec<&Trade> {
        self.trades.iter().rev().take(limit).collect()
    }

    /// Aggregate for the bucket "now" falls into; zero record if absent.
    #[must_use]
    pub fn stats_for_period(&self, period: Period) -> PeriodStats {
        let (day, week, month) = bucket_keys(Utc::now());
        let (map, key) = match period {
            Period::Daily => (&self.stats.daily, day),
            Period::Weekly => (&self.stats.weekly, week),
            Period::Monthly => (&self.stats.monthly, month),
        };
        map.get(&key).copied().unwrap_or_default()
    }

    /// Server-wide counters.
    #[must_use]
    pub const fn server_stats(&self) -> &ServerStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{new_trade, seeded_ledger};

    #[test]
    fn test_get_or_create_user_refreshes_name() {
        let mut ledger = Ledger::new();
        ledger.get_or_create_user("u1", "Alice");
        let profile = ledger.get_or_create_user("u1", "AliceRenamed");
        assert_eq!(profile.username, "AliceRenamed");
        assert_eq!(ledger.server_stats().total_users, 1);
    }

    #[test]
    fn test_add_trade_updates_totals_and_both_volumes() {
        let mut ledger = Ledger::new();
        let before = ledger.server_stats().total_trades;
        ledger.add_trade(new_trade("buyer", "seller", 52.5));

        assert_eq!(ledger.server_stats().total_trades, before + 1);
        assert_eq!(ledger.server_stats().total_revenue, 52.5);
        // Both sides are credited the full price: intentional double count.
        assert_eq!(
            ledger.get_user("buyer").unwrap().trades.total_volume_usd,
            52.5
        );
        assert_eq!(
            ledger.get_user("seller").unwrap().trades.total_volume_usd,
            52.5
        );
        assert_eq!(ledger.get_user("buyer").unwrap().trades.buys, 1);
        assert_eq!(ledger.get_user("seller").unwrap().trades.sells, 1);
    }

    #[test]
    fn test_add_trade_feeds_current_buckets() {
        let mut ledger = Ledger::new();
        ledger.add_trade(new_trade("buyer", "seller", 10.0));
        ledger.add_trade(new_trade("buyer", "seller", 15.0));

        for period in [Period::Daily, Period::Weekly, Period::Monthly] {
            let stats = ledger.stats_for_period(period);
            assert_eq!(stats.trades, 2);
            assert_eq!(stats.revenue, 25.0);
        }
    }

    #[test]
    fn test_stats_for_period_zero_when_empty() {
        let ledger = Ledger::new();
        assert_eq!(ledger.stats_for_period(Period::Daily), PeriodStats::default());
    }

    #[test]
    fn test_sequential_trades_have_distinct_ids_and_ordered_history() {
        let mut ledger = Ledger::new();
        let first = ledger.add_trade(new_trade("buyer", "seller", 5.0));
        let second = ledger.add_trade(new_trade("buyer", "seller", 6.0));
        assert_ne!(first.trade_id, second.trade_id);

        let buyer = ledger.get_user("buyer").unwrap();
        assert_eq!(buyer.history.len(), 2);
        // Newest trade is last in history but first in the query output.
        assert_eq!(buyer.history[1], second.trade_id);
        let history = ledger.user_history("buyer", 10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].trade_id, second.trade_id);

        let seller = ledger.get_user("seller").unwrap();
        assert_eq!(seller.history.len(), 2);
    }

    #[test]
    fn test_reputation_running_mean() {
        let mut ledger = Ledger::new();
        ledger.get_or_create_user("u1", "Alice");
        for rating in [5.0, 5.0, 5.0, 1.0] {
            assert!(ledger.add_rating("u1", rating));
        }
        assert_eq!(ledger.get_user("u1").unwrap().reputation.rating(), 4.0);
    }

    #[test]
    fn test_rating_unknown_user_is_rejected() {
        let mut ledger = Ledger::new();
        assert!(!ledger.add_rating("ghost", 5.0));
        assert!(ledger.get_user("ghost").is_none());
    }

    #[test]
    fn test_default_rating_is_five() {
        let mut ledger = Ledger::new();
        ledger.get_or_create_user("u1", "Alice");
        assert_eq!(ledger.get_user("u1").unwrap().reputation.rating(), 5.0);
    }

    #[test]
    fn test_top_traders_volume_ordering() {
        let ledger = seeded_ledger();
        let top = ledger.top_traders(LeaderboardMetric::Volume, 3);
        assert!(top.len() <= 3);
        for pair in top.windows(2) {
            assert!(pair[0].trades.total_volume_usd >= pair[1].trades.total_volume_usd);
        }
    }

    #[test]
    fn test_top_traders_reputation_excludes_unrated() {
        let mut ledger = Ledger::new();
        ledger.add_trade(new_trade("rated", "unrated", 10.0));
        ledger.add_rating("rated", 4.0);
        let top = ledger.top_traders(LeaderboardMetric::Reputation, 10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].user_id, "rated");
    }

    #[test]
    fn test_recent_trades_newest_first() {
        let mut ledger = Ledger::new();
        let first = ledger.add_trade(new_trade("a", "b", 1.0));
        let second = ledger.add_trade(new_trade("c", "d", 2.0));
        let recent = ledger.recent_trades(5);
        assert_eq!(recent[0].trade_id, second.trade_id);
        assert_eq!(recent[1].trade_id, first.trade_id);
        assert_eq!(ledger.recent_trades(1).len(), 1);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!(
            LeaderboardMetric::parse("Volume"),
            Some(LeaderboardMetric::Volume)
        );
        assert_eq!(
            LeaderboardMetric::parse("rep"),
            Some(LeaderboardMetric::Reputation)
        );
        assert_eq!(LeaderboardMetric::parse("bogus"), None);
    }
}
