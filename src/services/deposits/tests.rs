use super::*;
use crate::services::fixtures::Harness;
use serde_json::json;

#[tokio::test]
async fn test_approve_credits_balance_and_total_deposit() {
    let h = Harness::new();
    h.seed_user("u1", 50).await;
    let txn = h.seed_deposit("u1", "t1", 200).await;

    let resolution = h.deposits().approve(&txn).await.unwrap();

    assert_eq!(resolution.credited, Decimal::from(200));
    assert_eq!(
        h.deposit("u1", "t1").await.unwrap().status,
        RequestStatus::Completed
    );
    assert_eq!(h.balance("u1").await, Decimal::from(250));
    assert_eq!(h.field("u1", "totalDeposit").await, Decimal::from(200));

    let sent = h.notifications().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Funds Added!");
}

#[tokio::test]
async fn test_reject_leaves_balance_unchanged() {
    let h = Harness::new();
    h.seed_user("u1", 50).await;
    let txn = h.seed_deposit("u1", "t1", 200).await;

    let resolution = h.deposits().reject(&txn).await.unwrap();

    assert_eq!(resolution.credited, Decimal::ZERO);
    assert_eq!(h.deposit("u1", "t1").await.unwrap().status, RequestStatus::Failed);
    assert_eq!(h.balance("u1").await, Decimal::from(50));
    assert_eq!(h.notifications().await[0].title, "Deposit Rejected");
}

#[tokio::test]
async fn test_second_approval_is_refused() {
    let h = Harness::new();
    h.seed_user("u1", 0).await;
    let txn = h.seed_deposit("u1", "t1", 200).await;
    let deposits = h.deposits();

    deposits.approve(&txn).await.unwrap();
    let again = deposits.approve(&txn).await;

    assert!(matches!(again, Err(ServiceError::NotPending { .. })));
    assert_eq!(h.balance("u1").await, Decimal::from(200));
}

#[tokio::test]
async fn test_ad_rewards_are_not_deposits() {
    let h = Harness::new();
    h.seed_user("u1", 0).await;
    h.store
        .set(
            "transactions/u1/ad1",
            json!({"amount": 2, "method": "Ad Watch", "status": "Pending"}),
        )
        .await
        .unwrap();
    let mut txn = h.deposit("u1", "ad1").await.unwrap();

    let result = h.deposits().approve(&txn).await;
    assert!(matches!(result, Err(ServiceError::NotADeposit(_))));

    // A caller copy that lost its method still hits the stored record check.
    txn.method = "bKash".to_string();
    let result = h.deposits().approve(&txn).await;
    assert!(matches!(result, Err(ServiceError::NotADeposit(_))));
    assert_eq!(h.balance("u1").await, Decimal::ZERO);
}

#[tokio::test]
async fn test_delete_removes_record() {
    let h = Harness::new();
    h.seed_user("u1", 0).await;
    let txn = h.seed_deposit("u1", "t1", 200).await;

    h.deposits().delete(&txn).await.unwrap();

    assert!(h.deposit("u1", "t1").await.is_none());
    assert_eq!(h.balance("u1").await, Decimal::ZERO);
}
