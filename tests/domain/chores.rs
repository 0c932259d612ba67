use choreboard::core::db::initialize_board_db;
use choreboard::core::error::ChoreboardError;
use choreboard::core::store::Store;
use choreboard::core::time;
use choreboard::domain::chores::{
    self, ChoreStatus, Recurrence,
};
use choreboard::domain::ledger;
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

fn balance(store: &Store, admin: &Actor, user_id: &str) -> i64 {
    ledger::get_ledger(store, admin, Some(user_id)).unwrap().total
}

#[test]
fn test_chore_lifecycle() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "Dishes",
        "After dinner",
        10,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap();
    assert_eq!(chore.status, ChoreStatus::Assigned);
    assert_eq!(chore.points, 10);
    assert_eq!(chore.assignees, vec![child.id.clone()]);

    let chore = chores::mark_done(&store, &child, &chore.id).unwrap();
    assert_eq!(chore.status, ChoreStatus::DonePending);

    let chore = chores::approve_chore(&store, &parent, &chore.id, Some("nice work")).unwrap();
    assert_eq!(chore.status, ChoreStatus::Approved);
    assert_eq!(balance(&store, &admin, &child.id), 10);

    let events = chores::chore_events(&store, &chore.id).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].from_status, None);
    assert_eq!(events[2].to_status, ChoreStatus::Approved);
    assert_eq!(events[2].note, "nice work");
}

#[test]
fn test_approve_credits_each_assignee_full_value() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let a = add_user(&store, &admin, "maya", Role::Child);
    let b = add_user(&store, &admin, "theo", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "Rake leaves",
        "",
        10,
        Recurrence::None,
        None,
        &[a.id.clone(), b.id.clone()],
    )
    .unwrap();
    chores::mark_done(&store, &a, &chore.id).unwrap();
    chores::approve_chore(&store, &parent, &chore.id, None).unwrap();

    // Full value each, never a single +20 or a split.
    assert_eq!(balance(&store, &admin, &a.id), 10);
    assert_eq!(balance(&store, &admin, &b.id), 10);
    let view_a = ledger::get_ledger(&store, &admin, Some(&a.id)).unwrap();
    assert_eq!(view_a.entries.len(), 1);
    assert_eq!(view_a.entries[0].delta, 10);
}

#[test]
fn test_approved_only_reachable_via_done_pending() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "Vacuum",
        "",
        5,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap();

    // ASSIGNED cannot be approved or rejected, by anyone.
    let err = chores::approve_chore(&store, &parent, &chore.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::InvalidTransition(_)));
    let err = chores::reject_chore(&store, &admin, &chore.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::InvalidTransition(_)));

    chores::mark_done(&store, &child, &chore.id).unwrap();
    chores::approve_chore(&store, &parent, &chore.id, None).unwrap();

    // APPROVED is terminal.
    let err = chores::approve_chore(&store, &parent, &chore.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::InvalidTransition(_)));
    let err = chores::reject_chore(&store, &parent, &chore.id, None).unwrap_err();
    assert!(matches!(err, ChoreboardError::InvalidTransition(_)));

    // The double-approve must not have double-credited.
    assert_eq!(balance(&store, &admin, &child.id), 5);
}

#[test]
fn test_reject_allows_reattempt_without_ledger_effect() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "Clean room",
        "",
        8,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap();
    chores::mark_done(&store, &child, &chore.id).unwrap();
    let chore = chores::reject_chore(&store, &parent, &chore.id, Some("under the bed too")).unwrap();
    assert_eq!(chore.status, ChoreStatus::Rejected);
    assert_eq!(balance(&store, &admin, &child.id), 0);

    let chore = chores::mark_done(&store, &child, &chore.id).unwrap();
    assert_eq!(chore.status, ChoreStatus::DonePending);
    chores::approve_chore(&store, &parent, &chore.id, None).unwrap();
    assert_eq!(balance(&store, &admin, &child.id), 8);
}

#[test]
fn test_mark_done_permissions() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let assigned = add_user(&store, &admin, "maya", Role::Child);
    let other = add_user(&store, &admin, "theo", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "Feed the cat",
        "",
        3,
        Recurrence::None,
        None,
        &[assigned.id.clone()],
    )
    .unwrap();

    let err = chores::mark_done(&store, &other, &chore.id).unwrap_err();
    assert!(matches!(err, ChoreboardError::NotAssignee(_)));

    let err = chores::mark_done(&store, &parent, &chore.id).unwrap_err();
    assert!(matches!(err, ChoreboardError::Forbidden(_)));

    let err = chores::mark_done(&store, &assigned, "chore_missing").unwrap_err();
    assert!(matches!(err, ChoreboardError::NotFound(_)));
}

#[test]
fn test_create_chore_validation() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let err = chores::create_chore(
        &store,
        &parent,
        "  ",
        "",
        5,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap_err();
    assert!(matches!(err, ChoreboardError::ValidationError(_)));

    let err = chores::create_chore(
        &store,
        &parent,
        "Dishes",
        "",
        0,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap_err();
    assert!(matches!(err, ChoreboardError::ValidationError(_)));

    let err = chores::create_chore(
        &store,
        &parent,
        "Dishes",
        "",
        5,
        Recurrence::None,
        None,
        &["user_unknown".to_string()],
    )
    .unwrap_err();
    assert!(matches!(err, ChoreboardError::ValidationError(_)));

    // A parent cannot be assigned chores.
    let err = chores::create_chore(
        &store,
        &parent,
        "Dishes",
        "",
        5,
        Recurrence::None,
        None,
        &[parent.id.clone()],
    )
    .unwrap_err();
    assert!(matches!(err, ChoreboardError::ValidationError(_)));

    let err = chores::create_chore(
        &store,
        &child,
        "Dishes",
        "",
        5,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap_err();
    assert!(matches!(err, ChoreboardError::Forbidden(_)));
}

#[test]
fn test_inert_chore_without_assignees() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "Unassigned",
        "",
        5,
        Recurrence::None,
        None,
        &[],
    )
    .unwrap();
    assert!(chore.assignees.is_empty());

    // No child can act on it.
    let err = chores::mark_done(&store, &child, &chore.id).unwrap_err();
    assert!(matches!(err, ChoreboardError::NotAssignee(_)));
}

#[test]
fn test_weekly_successor_steps_from_due_date() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let due = time::parse_date("2024-01-01").unwrap();
    let chore = chores::create_chore(
        &store,
        &parent,
        "Laundry",
        "",
        10,
        Recurrence::Weekly,
        Some(due),
        &[child.id.clone()],
    )
    .unwrap();
    chores::mark_done(&store, &child, &chore.id).unwrap();
    chores::approve_chore(&store, &parent, &chore.id, None).unwrap();

    let all = chores::list_chores(&store, &admin, None, true).unwrap();
    assert_eq!(all.len(), 2);
    let successor = all.iter().find(|c| c.id != chore.id).unwrap();
    assert_eq!(successor.status, ChoreStatus::Assigned);
    assert_eq!(
        successor.due_date,
        Some(time::parse_date("2024-01-08").unwrap())
    );
    assert_eq!(successor.recurrence, Recurrence::Weekly);
    assert_eq!(successor.title, "Laundry");
    assert_eq!(successor.points, 10);
    assert_eq!(successor.assignees, vec![child.id.clone()]);
}

#[test]
fn test_successor_hidden_from_default_listing_until_due() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "Water plants",
        "",
        4,
        Recurrence::Daily,
        Some(time::today()),
        &[child.id.clone()],
    )
    .unwrap();
    chores::mark_done(&store, &child, &chore.id).unwrap();
    chores::approve_chore(&store, &parent, &chore.id, None).unwrap();

    // Successor is due tomorrow: invisible by default, present in the
    // explicit all-chores view.
    let visible = chores::list_chores(&store, &admin, None, false).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, chore.id);

    let all = chores::list_chores(&store, &admin, None, true).unwrap();
    assert_eq!(all.len(), 2);

    // The child's own default view hides it too.
    let child_visible = chores::list_chores(&store, &child, None, false).unwrap();
    assert_eq!(child_visible.len(), 1);
}

#[test]
fn test_no_successor_for_non_recurring_chore() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "One-off",
        "",
        5,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap();
    chores::mark_done(&store, &child, &chore.id).unwrap();
    chores::approve_chore(&store, &parent, &chore.id, None).unwrap();

    let all = chores::list_chores(&store, &admin, None, true).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_child_listing_is_scoped_to_own_assignments() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let a = add_user(&store, &admin, "maya", Role::Child);
    let b = add_user(&store, &admin, "theo", Role::Child);

    chores::create_chore(&store, &parent, "For A", "", 5, Recurrence::None, None, &[a.id.clone()])
        .unwrap();
    chores::create_chore(&store, &parent, "For B", "", 5, Recurrence::None, None, &[b.id.clone()])
        .unwrap();

    let mine = chores::list_chores(&store, &a, None, false).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].title, "For A");

    let everything = chores::list_chores(&store, &parent, None, false).unwrap();
    assert_eq!(everything.len(), 2);
}

#[test]
fn test_approvals_queue() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let first = chores::create_chore(
        &store,
        &parent,
        "First",
        "",
        5,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap();
    let second = chores::create_chore(
        &store,
        &parent,
        "Second",
        "",
        5,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap();
    chores::mark_done(&store, &child, &first.id).unwrap();
    chores::mark_done(&store, &child, &second.id).unwrap();

    let queue = chores::approvals_queue(&store, &parent).unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].id, first.id);

    let err = chores::approvals_queue(&store, &child).unwrap_err();
    assert!(matches!(err, ChoreboardError::Forbidden(_)));
}

#[test]
fn test_concurrent_approve_and_reject_single_winner() {
    let (_tmp, store, admin) = setup();
    let parent = add_user(&store, &admin, "dad", Role::Parent);
    let child = add_user(&store, &admin, "maya", Role::Child);

    let chore = chores::create_chore(
        &store,
        &parent,
        "Contested",
        "",
        10,
        Recurrence::None,
        None,
        &[child.id.clone()],
    )
    .unwrap();
    chores::mark_done(&store, &child, &chore.id).unwrap();

    let approve = {
        let store = store.clone();
        let parent = parent.clone();
        let id = chore.id.clone();
        std::thread::spawn(move || chores::approve_chore(&store, &parent, &id, None))
    };
    let reject = {
        let store = store.clone();
        let parent = parent.clone();
        let id = chore.id.clone();
        std::thread::spawn(move || chores::reject_chore(&store, &parent, &id, None))
    };
    let approve_result = approve.join().unwrap();
    let reject_result = reject.join().unwrap();

    // Exactly one transition commits; the loser observes InvalidTransition.
    assert!(approve_result.is_ok() != reject_result.is_ok());
    let reject_is_err = reject_result.is_err();
    let loser = if approve_result.is_ok() {
        reject_result.unwrap_err()
    } else {
        approve_result.unwrap_err()
    };
    assert!(matches!(loser, ChoreboardError::InvalidTransition(_)));

    // The ledger reflects the winner only.
    let expected = if reject_is_err { 10 } else { 0 };
    assert_eq!(balance(&store, &admin, &child.id), expected);
}
