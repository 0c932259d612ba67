use choreboard::core::db::initialize_board_db;
use choreboard::core::error::ChoreboardError;
use choreboard::core::store::Store;
use choreboard::domain::ledger;
use choreboard::domain::redemptions::{self, RedemptionStatus};
use choreboard::domain::rewards;
use choreboard::domain::users::{self, Actor, Role};
use tempfile::tempdir;

fn setup() -> (tempfile::TempDir, Store, Actor) {
    let tmp = tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    initialize_board_db(&root).unwrap();
    let store = Store::new(root);
    let admin = users::seed_admin_if_empty(&store).unwrap().unwrap();
    let admin = Actor {
        id: admin.id,
        role: Role::Admin,
    };
    (tmp, store, admin)
}

fn add_user(store: &Store, admin: &Actor, username: &str, role: Role) -> Actor {
    let user = users::create_user(store, admin, username, username, role, "opaque-hash").unwrap();
    Actor {
        id: user.id,
        role,
    }
}

fn grant(store: &Store, admin: &Actor, user: &Actor, points: i64) {
    ledger::adjust_points(store, admin, &user.id, points, "starting balance").unwrap();
}

fn balance(store: &Store, admin: &Actor, user_id: &str) -> i64 {
    ledger::get_ledger(store, admin, Some(user_id)).unwrap().total
}

#[test]
fn test_insufficient_balance_at_request_creates_no_row() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 20);
    let reward = rewards::create_reward(&store, &parent, "Movie night", 25, true, None).unwrap();

    let err = redemptions::request_redemption(&store, &child, &reward.id).unwrap_err();
    assert!(matches!(err, ChoreboardError::InsufficientBalance(_)));

    assert!(redemptions::list_redemptions(&store, &admin)
        .unwrap()
        .is_empty());
    assert_eq!(balance(&store, &admin, &child.id), 20);
}

#[test]
fn test_request_then_approve_debits_exactly_once() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 30);
    let reward = rewards::create_reward(&store, &parent, "Movie night", 25, true, None).unwrap();

    let redemption = redemptions::request_redemption(&store, &child, &reward.id).unwrap();
    assert_eq!(redemption.status, RedemptionStatus::Requested);
    // Requesting reserves nothing.
    assert_eq!(balance(&store, &admin, &child.id), 30);

    let redemption =
        redemptions::approve_redemption(&store, &parent, &redemption.id, None).unwrap();
    assert_eq!(redemption.status, RedemptionStatus::Approved);
    assert_eq!(redemption.decided_by, Some(parent.id.clone()));
    assert_eq!(balance(&store, &admin, &child.id), 5);

    let view = ledger::get_ledger(&store, &admin, Some(&child.id)).unwrap();
    let debits: Vec<_> = view.entries.iter().filter(|e| e.delta < 0).collect();
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0].delta, -25);
}

#[test]
fn test_deny_has_no_ledger_effect() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 30);
    let reward = rewards::create_reward(&store, &parent, "Ice cream", 10, true, None).unwrap();

    let redemption = redemptions::request_redemption(&store, &child, &reward.id).unwrap();
    let redemption =
        redemptions::deny_redemption(&store, &parent, &redemption.id, Some("not this week"))
            .unwrap();
    assert_eq!(redemption.status, RedemptionStatus::Denied);
    assert_eq!(redemption.note, "not this week");
    assert_eq!(balance(&store, &admin, &child.id), 30);
}

#[test]
fn test_decisions_are_terminal() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 50);
    let reward = rewards::create_reward(&store, &parent, "Ice cream", 10, true, None).unwrap();

    let approved = redemptions::request_redemption(&store, &child, &reward.id).unwrap();
    redemptions::approve_redemption(&store, &parent, &approved.id, None).unwrap();
    let err = redemptions::approve_redemption(&store, &parent, &approved.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::InvalidTransition(_)));
    let err = redemptions::deny_redemption(&store, &parent, &approved.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::InvalidTransition(_)));

    let denied = redemptions::request_redemption(&store, &child, &reward.id).unwrap();
    redemptions::deny_redemption(&store, &parent, &denied.id, None).unwrap();
    let err = redemptions::approve_redemption(&store, &parent, &denied.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::InvalidTransition(_)));

    // Only the one approval moved points.
    assert_eq!(balance(&store, &admin, &child.id), 40);
}

#[test]
fn test_approval_revalidates_balance() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 30);
    let reward = rewards::create_reward(&store, &parent, "Movie night", 25, true, None).unwrap();

    // No escrow: with 30 points the child can request twice.
    let first = redemptions::request_redemption(&store, &child, &reward.id).unwrap();
    let second = redemptions::request_redemption(&store, &child, &reward.id).unwrap();

    redemptions::approve_redemption(&store, &parent, &first.id, None).unwrap();
    assert_eq!(balance(&store, &admin, &child.id), 5);

    // The second approval re-checks the balance and leaves the request open.
    let err = redemptions::approve_redemption(&store, &parent, &second.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::InsufficientBalance(_)));
    let listed = redemptions::list_redemptions(&store, &admin).unwrap();
    let second_row = listed.iter().find(|r| r.id == second.id).unwrap();
    assert_eq!(second_row.status, RedemptionStatus::Requested);

    // The caller can still deny it.
    redemptions::deny_redemption(&store, &parent, &second.id, None).unwrap();
    assert_eq!(balance(&store, &admin, &child.id), 5);
}

#[test]
fn test_weekly_limit() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 100);
    let reward =
        rewards::create_reward(&store, &parent, "Screen time", 10, true, Some(1)).unwrap();

    let first = redemptions::request_redemption(&store, &child, &reward.id).unwrap();
    redemptions::approve_redemption(&store, &parent, &first.id, None).unwrap();

    // One APPROVED redemption this ISO week exhausts the limit.
    let err = redemptions::request_redemption(&store, &child, &reward.id).unwrap_err();
    assert!(matches!(err, ChoreboardError::LimitExceeded(_)));

    // Pending requests do not count against the limit.
    let other =
        rewards::create_reward(&store, &parent, "Stay up late", 10, true, Some(1)).unwrap();
    redemptions::request_redemption(&store, &child, &other.id).unwrap();
    redemptions::request_redemption(&store, &child, &other.id).unwrap();
}

#[test]
fn test_inactive_reward_cannot_be_requested() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 100);
    let reward = rewards::create_reward(&store, &parent, "Retired", 10, false, None).unwrap();

    let err = redemptions::request_redemption(&store, &child, &reward.id).unwrap_err();
    assert!(matches!(err, ChoreboardError::ValidationError(_)));

    let revived = rewards::set_reward_active(&store, &parent, &reward.id, true).unwrap();
    assert!(revived.is_active);
    redemptions::request_redemption(&store, &child, &reward.id).unwrap();
}

#[test]
fn test_redemption_role_gates() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 100);
    let reward = rewards::create_reward(&store, &parent, "Ice cream", 10, true, None).unwrap();

    let err = redemptions::request_redemption(&store, &parent, &reward.id).unwrap_err();
    assert!(matches!(err, ChoreboardError::Forbidden(_)));

    let redemption = redemptions::request_redemption(&store, &child, &reward.id).unwrap();
    let err = redemptions::approve_redemption(&store, &child, &redemption.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::Forbidden(_)));
    let err = redemptions::deny_redemption(&store, &child, &redemption.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::Forbidden(_)));
}

#[test]
fn test_child_sees_only_own_redemptions() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let a = add_user(&store, &admin, "maya", Role::Child);
    let b = add_user(&store, &admin, "theo", Role::Child);
    grant(&store, &admin, &a, 50);
    grant(&store, &admin, &b, 50);
    let reward = rewards::create_reward(&store, &parent, "Ice cream", 10, true, None).unwrap();

    redemptions::request_redemption(&store, &a, &reward.id).unwrap();
    redemptions::request_redemption(&store, &b, &reward.id).unwrap();

    let mine = redemptions::list_redemptions(&store, &a).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].user_id, a.id);

    let everything = redemptions::list_redemptions(&store, &parent).unwrap();
    assert_eq!(everything.len(), 2);
}

#[test]
fn test_concurrent_approvals_debit_exactly_once() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);
    grant(&store, &admin, &child, 100);
    let reward = rewards::create_reward(&store, &parent, "Movie night", 25, true, None).unwrap();
    let redemption = redemptions::request_redemption(&store, &child, &reward.id).unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = store.clone();
            let parent = parent.clone();
            let id = redemption.id.clone();
            std::thread::spawn(move || redemptions::approve_redemption(&store, &parent, &id, None))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1);
    let loser = results.into_iter().find(|r| r.is_err()).unwrap().unwrap_err();
    assert!(matches!(loser, ChoreboardError::InvalidTransition(_)));

    // Exactly one debit, no double-spend.
    assert_eq!(balance(&store, &admin, &child.id), 75);
    let view = ledger::get_ledger(&store, &admin, Some(&child.id)).unwrap();
    assert_eq!(view.entries.iter().filter(|e| e.delta < 0).count(), 1);
}
