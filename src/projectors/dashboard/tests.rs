use super::*;
use crate::storage::MemoryStore;
use crate::utils::time::ManualClock;
use chrono::TimeZone;
use serde_json::json;
use std::time::Duration;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

async fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .set(
            paths::USERS,
            json!({
                "u1": {
                    "balance": 100, "totalEarned": 12.5, "aiRequestCount": 4,
                    "lastAiInteraction": "2024-05-15T08:00:00.000Z",
                    "gamerLevels": {"unlocked": 12},
                },
                "u2": {
                    "balance": "50", "totalEarned": 2.5, "aiRequestCount": 1,
                    "lastAiInteraction": "2024-05-14T08:00:00.000Z",
                    "gamerLevels": {"unlocked": 10},
                },
                "u3": {"balance": -5, "gamerLevels": {"unlocked": 3}},
            }),
        )
        .await
        .unwrap();
    store
        .set(
            paths::ORDERS,
            json!({
                "u1": {
                    "o1": {"status": "Pending", "price": 80, "date": "2024-05-15T09:00:00.000Z"},
                    "o2": {"status": "Completed", "offer": {"price": 160}, "date": "2024-05-15T10:00:00.000Z"},
                    "o3": {"status": "Completed", "price": 999, "date": "2024-05-14T10:00:00.000Z"},
                },
                "u2": {
                    "o4": {"status": "Pending", "price": 50, "date": "2024-05-10T09:00:00.000Z"},
                    "o5": {"status": "Completed", "price": 40, "date": "2024-05-15T11:00:00.000Z"},
                    "o6": {"status": "Failed", "price": 70, "date": "2024-05-15T11:00:00.000Z"},
                },
            }),
        )
        .await
        .unwrap();
    store
        .set(
            paths::TRANSACTIONS,
            json!({
                "u1": {
                    "t1": {"status": "Pending", "amount": 200, "method": "bKash", "type": "deposit", "date": "2024-05-15T09:00:00.000Z"},
                    "t2": {"status": "Completed", "amount": 300, "method": "Nagad", "date": "2024-05-15T09:30:00.000Z"},
                    "t3": {"status": "Completed", "amount": 2, "type": "ad_reward", "date": "2024-05-15T09:45:00.000Z"},
                },
                "u2": {
                    "t4": {"status": "Completed", "amount": 500, "method": "bKash", "date": "2024-05-01T09:00:00.000Z"},
                    "t5": {"status": "Completed", "amount": 1.5, "method": "Ad Watch", "date": "2024-05-15T10:00:00.000Z"},
                    "t6": {"status": "Failed", "amount": 900, "method": "bKash", "date": "2024-05-15T10:00:00.000Z"},
                },
            }),
        )
        .await
        .unwrap();
    store
}

fn projector(store: &MemoryStore, clock: Arc<ManualClock>) -> DashboardProjector {
    DashboardProjector::new(Arc::new(store.clone()), clock, DashboardConfig::default())
}

#[tokio::test]
async fn test_snapshot_figures() {
    let store = seeded().await;
    let dashboard = projector(&store, Arc::new(ManualClock::new(now())))
        .snapshot()
        .await
        .unwrap();

    let users = &dashboard.users;
    assert_eq!(users.total_users, 3);
    assert_eq!(users.total_ad_revenue, Decimal::from(15));
    assert_eq!(users.active_gamers, 2);
    assert_eq!(users.users_total_balance, Decimal::from(145));
    assert_eq!(users.ai_interactions, 5);
    assert_eq!(users.active_ai_users, 1);

    assert_eq!(dashboard.orders.pending_orders, 2);
    assert_eq!(dashboard.orders.today_purchase, Decimal::from(200));

    let deposits = &dashboard.deposits;
    assert_eq!(deposits.pending_deposits, 1);
    assert_eq!(deposits.today_deposit, Decimal::from(300));
    assert_eq!(deposits.total_deposit, Decimal::from(800));
    assert_eq!(deposits.today_ad_revenue, Decimal::new(35, 1));
}

#[test]
fn test_day_boundary_shifts_today() {
    let rules = DashboardRules {
        gamer_level_threshold: 10,
        day: DayBoundary::new(6 * 60),
    };
    // 20:00 UTC on the 14th is already the 15th at UTC+6.
    let order = Order {
        status: RequestStatus::Completed,
        price: Decimal::from(10),
        date: Some(Utc.with_ymd_and_hms(2024, 5, 14, 20, 0, 0).unwrap()),
        ..Order::default()
    };
    let figures = rules.order_figures(&[order.clone()], now());
    assert_eq!(figures.today_purchase, Decimal::from(10));

    let figures = DashboardRules::default().order_figures(&[order], now());
    assert_eq!(figures.today_purchase, Decimal::ZERO);
}

#[tokio::test]
async fn test_pending_count_tracks_all_users() {
    let store = seeded().await;
    let (mut dashboard, handle) = projector(&store, Arc::new(ManualClock::new(now())))
        .start()
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(1), async {
        while dashboard.borrow_and_update().orders.pending_orders != 2 {
            dashboard.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    store
        .set(
            "orders/u3/o7",
            json!({"status": "Pending", "price": 10, "date": "2024-05-15T11:30:00.000Z"}),
        )
        .await
        .unwrap();
    store
        .update("orders/u1/o1", json!({"status": "Completed"}))
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let orders = dashboard.borrow_and_update().orders.clone();
            if orders.today_purchase == Decimal::from(280) {
                assert_eq!(orders.pending_orders, 2);
                break;
            }
            dashboard.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    handle.stop().await;
}
