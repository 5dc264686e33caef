/// General commands - shop panel, crypto wallets, price list
pub mod general;
/// DM-only owner commands - server list, price updates
pub mod owner;
/// Ticket closure command
pub mod ticket;
/// Trading statistics commands - stats, leaderboard, profile, history
pub mod trading;

pub use general::*;
pub use owner::*;
pub use ticket::*;
pub use trading::*;
