//! Read-side projections: the admin dashboard and monthly leaderboards.

pub mod dashboard;
pub mod leaderboard;

pub use dashboard::{Dashboard, DashboardProjector, DashboardRules};
pub use leaderboard::{rank, Board, Leaderboard, Leaderboards, Standing};
