//! Monthly leaderboards: top traders (by monthly spend) and top earners
//! (by monthly ad earnings).
//!
//! Counters carry the month they belong to; users whose counters are from
//! an earlier month are left off the board.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::interfaces::{DocumentStore, Query, Result};
use crate::models::{paths, User};
use crate::utils::time::{month_key, Clock};

/// Users fetched per board.
pub const BOARD_SIZE: usize = 100;
/// Places shown on the podium.
pub const PODIUM_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    /// Ranked by `monthlySpent`.
    Traders,
    /// Ranked by `monthlyEarned`.
    Earners,
}

impl Board {
    pub fn field(&self) -> &'static str {
        match self {
            Board::Traders => "monthlySpent",
            Board::Earners => "monthlyEarned",
        }
    }

    fn score(&self, user: &User, month: &str) -> Decimal {
        match self {
            Board::Traders => user.monthly_spent_in(month),
            Board::Earners => user.monthly_earned_in(month),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// 1-based.
    pub rank: usize,
    pub uid: String,
    pub name: String,
    pub score: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    pub podium: Vec<Standing>,
    pub rest: Vec<Standing>,
    /// The viewer's own place, if they made the board.
    pub me: Option<Standing>,
}

/// Rank `users` for `month`, highest score first. Ties keep input order.
pub fn rank(users: &[User], board: Board, month: &str, viewer: Option<&str>) -> Leaderboard {
    let mut eligible: Vec<&User> = users
        .iter()
        .filter(|u| u.last_month_update.as_deref() == Some(month))
        .collect();
    eligible.sort_by(|a, b| board.score(b, month).cmp(&board.score(a, month)));

    let mut standings: Vec<Standing> = eligible
        .into_iter()
        .enumerate()
        .map(|(i, user)| Standing {
            rank: i + 1,
            uid: user.uid.clone(),
            name: user.name.clone(),
            score: board.score(user, month),
        })
        .collect();

    let me = viewer.and_then(|uid| standings.iter().find(|s| s.uid == uid).cloned());
    let rest = standings.split_off(standings.len().min(PODIUM_SIZE));
    Leaderboard {
        podium: standings,
        rest,
        me,
    }
}

/// Reads leaderboards from the store.
#[derive(Clone)]
pub struct Leaderboards {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl Leaderboards {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn fetch(&self, board: Board, viewer: Option<&str>) -> Result<Leaderboard> {
        let query = Query::children()
            .order_by_child(board.field())
            .limit_to_last(BOARD_SIZE);
        let records = self.store.query(paths::USERS, &query).await?;
        let users: Vec<User> = records.iter().filter_map(User::from_record).collect();
        Ok(rank(&users, board, &month_key(self.clock.now()), viewer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::utils::time::ManualClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn user(uid: &str, spent: i64, earned: i64, month: &str) -> User {
        User {
            uid: uid.to_string(),
            name: uid.to_uppercase(),
            monthly_spent: Decimal::from(spent),
            monthly_earned: Decimal::from(earned),
            last_month_update: Some(month.to_string()),
            ..User::default()
        }
    }

    #[test]
    fn test_rank_filters_stale_months_and_splits_podium() {
        let users = vec![
            user("a", 100, 1, "2024-05"),
            user("b", 900, 5, "2024-04"),
            user("c", 300, 9, "2024-05"),
            user("d", 200, 3, "2024-05"),
            user("e", 50, 7, "2024-05"),
        ];

        let board = rank(&users, Board::Traders, "2024-05", Some("e"));
        let podium: Vec<&str> = board.podium.iter().map(|s| s.uid.as_str()).collect();
        assert_eq!(podium, vec!["c", "d", "a"]);
        assert_eq!(board.rest.len(), 1);
        assert_eq!(board.rest[0].rank, 4);
        assert_eq!(board.me.as_ref().map(|s| s.rank), Some(4));
        assert_eq!(board.me.map(|s| s.score), Some(Decimal::from(50)));

        let earners = rank(&users, Board::Earners, "2024-05", Some("b"));
        assert_eq!(earners.podium[0].uid, "c");
        assert!(earners.me.is_none());
    }

    #[test]
    fn test_small_board_has_no_rest() {
        let board = rank(&[user("a", 1, 1, "2024-05")], Board::Traders, "2024-05", None);
        assert_eq!(board.podium.len(), 1);
        assert!(board.rest.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_uses_current_month() {
        let store = MemoryStore::new();
        store
            .set(
                paths::USERS,
                json!({
                    "u1": {"name": "Rafi", "monthlySpent": 500, "lastMonthUpdate": "2024-05"},
                    "u2": {"name": "Mim", "monthlySpent": 700, "lastMonthUpdate": "2024-04"},
                }),
            )
            .await
            .unwrap();
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()));
        let boards = Leaderboards::new(Arc::new(store), clock);

        let board = boards.fetch(Board::Traders, Some("u1")).await.unwrap();
        assert_eq!(board.podium.len(), 1);
        assert_eq!(board.podium[0].name, "Rafi");
        assert_eq!(board.me.unwrap().rank, 1);
    }
}
