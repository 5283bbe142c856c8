use std::collections::HashMap;

use bbm_engine::loyalty::calculate_reward;
use bbm_engine::{DbService, ErrorCode, LoyaltyLedger};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::util::{DAY_MILLIS, now_millis};

async fn memory_ledger() -> LoyaltyLedger {
    let db = DbService::in_memory().await.expect("Failed to open in-memory db");
    LoyaltyLedger::new(db.pool)
}

#[tokio::test]
async fn test_random_award_redeem_sequence_keeps_invariant() {
    let ledger = memory_ledger().await;
    let mut rng = StdRng::seed_from_u64(0xBB_B0C5);
    let users = ["u1", "u2", "u3"];
    let mut expected: HashMap<&str, i64> = HashMap::new();

    for step in 0..200 {
        let user = users[rng.gen_range(0..users.len())];
        let order_id = format!("ORD-{step}");
        let current = *expected.get(user).unwrap_or(&0);

        if rng.gen_bool(0.5) {
            let amount = rng.gen_range(0..6_000_000) as f64 / 100.0;
            let reward = ledger
                .award(user, &order_id, amount, &["TOOLS"])
                .await
                .expect("award failed");
            assert_eq!(reward.points, calculate_reward(amount, &["TOOLS"]).points);
            expected.insert(user, current + reward.points);
        } else {
            let points = rng.gen_range(0..current + 200);
            let result = ledger.redeem(user, points, &order_id).await;
            if points >= 50 && points <= current {
                let discount = result.expect("redeem should succeed");
                assert_eq!(discount, points as f64 / 100.0);
                expected.insert(user, current - points);
            } else {
                let code = result.expect_err("redeem should fail").code();
                assert!(
                    code == ErrorCode::MinimumRedemption || code == ErrorCode::InsufficientBalance,
                    "unexpected {code:?}"
                );
            }
        }

        let balance = ledger.get_user_balance(user).await.expect("balance read failed");
        assert!(balance.is_consistent(), "step {step}: {balance:?}");
        assert_eq!(balance.current_balance, *expected.get(user).unwrap_or(&0));
    }
}

#[tokio::test]
async fn test_failed_redemption_changes_nothing() {
    let ledger = memory_ledger().await;
    ledger.award("u1", "ORD-1", 1_000.0, &["TOOLS"]).await.unwrap();

    let before = ledger.get_user_balance("u1").await.unwrap();
    let history_before = ledger.history("u1", 50).await.unwrap();

    // 1. Below minimum
    assert_eq!(
        ledger.redeem("u1", 10, "ORD-2").await.unwrap_err().code(),
        ErrorCode::MinimumRedemption
    );
    // 2. More than the balance
    assert_eq!(
        ledger.redeem("u1", 5_000, "ORD-2").await.unwrap_err().code(),
        ErrorCode::InsufficientBalance
    );
    // 3. No balance at all
    assert_eq!(
        ledger.redeem("nobody", 100, "ORD-3").await.unwrap_err().code(),
        ErrorCode::InsufficientBalance
    );

    assert_eq!(ledger.get_user_balance("u1").await.unwrap(), before);
    assert_eq!(ledger.history("u1", 50).await.unwrap(), history_before);
    assert!(ledger.history("nobody", 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_thirty_thousand_tools_order() {
    let ledger = memory_ledger().await;

    let reward = ledger.award("u1", "ORD-1", 30_000.0, &["TOOLS"]).await.unwrap();
    assert_eq!(reward.points, 45_000);

    let discount = ledger.redeem("u1", 45_000, "ORD-2").await.unwrap();
    assert_eq!(discount, 450.0);

    let balance = ledger.get_user_balance("u1").await.unwrap();
    assert_eq!(balance.current_balance, 0);
    assert_eq!(balance.total_earned, 45_000);
    assert_eq!(balance.total_redeemed, 45_000);
    assert!(balance.is_consistent());
}

#[tokio::test]
async fn test_concurrent_redemptions_cannot_overdraw() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let db = DbService::new(path.to_str().unwrap()).await.unwrap();
    let ledger = LoyaltyLedger::new(db.pool.clone());
    ledger.award("u1", "ORD-0", 100.0, &["TOOLS"]).await.unwrap();

    // Both pass the balance pre-check; only one may commit
    let (a, b) = tokio::join!(
        ledger.redeem("u1", 100, "ORD-A"),
        ledger.redeem("u1", 100, "ORD-B"),
    );
    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);

    let balance = ledger.get_user_balance("u1").await.unwrap();
    assert_eq!(balance.current_balance, 0);
    assert_eq!(balance.total_redeemed, 100);
    assert!(balance.is_consistent());

    db.pool.close().await;
}

#[tokio::test]
async fn test_expiry_sweep_keeps_invariant() {
    let ledger = memory_ledger().await;
    ledger.award("u1", "ORD-1", 5_000.0, &["TOOLS"]).await.unwrap();
    ledger.award("u2", "ORD-2", 2_000.0, &["PAINTS"]).await.unwrap();
    ledger.redeem("u1", 1_000, "ORD-3").await.unwrap();

    // Not due yet
    let summary = ledger.expire_old(now_millis()).await.unwrap();
    assert_eq!(summary.scanned, 0);

    let summary = ledger
        .expire_old(now_millis() + 361 * DAY_MILLIS)
        .await
        .unwrap();
    assert_eq!(summary.expired, 2);
    assert_eq!(summary.points_expired, 4_000 + 2_000);
    assert_eq!(summary.failed, 0);

    for user in ["u1", "u2"] {
        let balance = ledger.get_user_balance(user).await.unwrap();
        assert_eq!(balance.current_balance, 0);
        assert!(balance.is_consistent(), "{balance:?}");
    }
}
