//! Chore lifecycle state machine.
//!
//! Statuses form a closed set with one transition table: ASSIGNED →
//! DONE_PENDING → {APPROVED, REJECTED}, REJECTED → DONE_PENDING for a
//! re-attempt, APPROVED terminal. Every status change re-validates the
//! transition against the row inside the broker transaction, so concurrent
//! deciders cannot both win.

use crate::core::broker::DbBroker;
use crate::core::db::{self, board_db_path};
use crate::core::error;
use crate::core::store::Store;
use crate::core::time;
use crate::domain::ledger::{self, RefType};
use crate::domain::policy::{self, Operation, PolicyContext};
use crate::domain::recurrence;
use crate::domain::users::{self, Actor, Role};
use crate::domain::OutputFormat;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChoreStatus {
    Assigned,
    DonePending,
    Approved,
    Rejected,
}

impl ChoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoreStatus::Assigned => "ASSIGNED",
            ChoreStatus::DonePending => "DONE_PENDING",
            ChoreStatus::Approved => "APPROVED",
            ChoreStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<ChoreStatus> {
        match s {
            "ASSIGNED" => Some(ChoreStatus::Assigned),
            "DONE_PENDING" => Some(ChoreStatus::DonePending),
            "APPROVED" => Some(ChoreStatus::Approved),
            "REJECTED" => Some(ChoreStatus::Rejected),
            _ => None,
        }
    }

    /// The full transition table. Anything not listed here is rejected
    /// uniformly; there is no force path.
    pub fn can_transition(self, to: ChoreStatus) -> bool {
        matches!(
            (self, to),
            (ChoreStatus::Assigned, ChoreStatus::DonePending)
                | (ChoreStatus::Rejected, ChoreStatus::DonePending)
                | (ChoreStatus::DonePending, ChoreStatus::Approved)
                | (ChoreStatus::DonePending, ChoreStatus::Rejected)
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "NONE",
            Recurrence::Daily => "DAILY",
            Recurrence::Weekly => "WEEKLY",
        }
    }

    pub fn parse(s: &str) -> Option<Recurrence> {
        match s {
            "NONE" => Some(Recurrence::None),
            "DAILY" => Some(Recurrence::Daily),
            "WEEKLY" => Some(Recurrence::Weekly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chore {
    pub id: String,
    pub title: String,
    pub description: String,
    pub points: i64,
    pub recurrence: Recurrence,
    pub due_date: Option<NaiveDate>,
    pub status: ChoreStatus,
    pub created_by: String,
    pub created_at: String,
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreEvent {
    pub id: String,
    pub chore_id: String,
    pub from_status: Option<ChoreStatus>,
    pub to_status: ChoreStatus,
    pub actor_id: String,
    pub note: String,
    pub created_at: String,
}

const CHORE_COLUMNS: &str =
    "id, title, description, points, recurrence, due_date, status, created_by, created_at";

fn status_from_store(s: &str) -> Result<ChoreStatus, error::ChoreboardError> {
    ChoreStatus::parse(s).ok_or_else(|| {
        error::ChoreboardError::ValidationError(format!("unknown chore status '{}' in store", s))
    })
}

fn chore_from_row(
    conn: &Connection,
    row: &rusqlite::Row,
) -> Result<Chore, error::ChoreboardError> {
    let id: String = row.get(0)?;
    let recurrence: String = row.get(4)?;
    let due_date: Option<String> = row.get(5)?;
    let status: String = row.get(6)?;
    let assignees = assignee_ids_conn(conn, &id)?;
    Ok(Chore {
        id,
        title: row.get(1)?,
        description: row.get(2)?,
        points: row.get(3)?,
        recurrence: Recurrence::parse(&recurrence).ok_or_else(|| {
            error::ChoreboardError::ValidationError(format!(
                "unknown recurrence '{}' in store",
                recurrence
            ))
        })?,
        due_date: match due_date {
            Some(d) => Some(time::parse_date(&d).ok_or_else(|| {
                error::ChoreboardError::ValidationError(format!(
                    "unparseable due date '{}' in store",
                    d
                ))
            })?),
            None => None,
        },
        status: status_from_store(&status)?,
        created_by: row.get(7)?,
        created_at: row.get(8)?,
        assignees,
    })
}

fn assignee_ids_conn(
    conn: &Connection,
    chore_id: &str,
) -> Result<Vec<String>, error::ChoreboardError> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM chore_assignments WHERE chore_id = ?1 ORDER BY user_id",
    )?;
    let mut rows = stmt.query(params![chore_id])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get(0)?);
    }
    Ok(out)
}

pub fn get_chore_conn(
    conn: &Connection,
    chore_id: &str,
) -> Result<Option<Chore>, error::ChoreboardError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM chores WHERE id = ?1",
        CHORE_COLUMNS
    ))?;
    let mut rows = stmt.query(params![chore_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(chore_from_row(conn, row)?)),
        None => Ok(None),
    }
}

fn record_event_conn(
    conn: &Connection,
    chore_id: &str,
    from_status: Option<ChoreStatus>,
    to_status: ChoreStatus,
    actor_id: &str,
    note: &str,
) -> Result<(), error::ChoreboardError> {
    conn.execute(
        "INSERT INTO chore_events(id, chore_id, from_status, to_status, actor_id, note, created_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            Ulid::new().to_string(),
            chore_id,
            from_status.map(|s| s.as_str()),
            to_status.as_str(),
            actor_id,
            note,
            time::now_iso()
        ],
    )?;
    Ok(())
}

struct ChoreInsert<'a> {
    title: &'a str,
    description: &'a str,
    points: i64,
    recurrence: Recurrence,
    due_date: Option<NaiveDate>,
    assignee_ids: &'a [String],
    created_by: &'a str,
    event_actor: &'a str,
    event_note: &'a str,
}

fn insert_chore_conn(
    conn: &Connection,
    ins: &ChoreInsert,
) -> Result<String, error::ChoreboardError> {
    let chore_id = Ulid::new().to_string();
    conn.execute(
        "INSERT INTO chores(id, title, description, points, recurrence, due_date, status, created_by, created_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, 'ASSIGNED', ?7, ?8)",
        params![
            chore_id,
            ins.title,
            ins.description,
            ins.points,
            ins.recurrence.as_str(),
            ins.due_date.map(|d| d.to_string()),
            ins.created_by,
            time::now_iso()
        ],
    )?;
    for user_id in ins.assignee_ids {
        conn.execute(
            "INSERT INTO chore_assignments(chore_id, user_id) VALUES(?1, ?2)",
            params![chore_id, user_id],
        )?;
    }
    record_event_conn(
        conn,
        &chore_id,
        None,
        ChoreStatus::Assigned,
        ins.event_actor,
        ins.event_note,
    )?;
    Ok(chore_id)
}

pub fn create_chore(
    store: &Store,
    actor: &Actor,
    title: &str,
    description: &str,
    points: i64,
    recurrence: Recurrence,
    due_date: Option<NaiveDate>,
    assignee_ids: &[String],
) -> Result<Chore, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::CreateChore, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "creating chores requires PARENT or ADMIN".into(),
        ));
    }
    let title = title.trim();
    if title.is_empty() {
        return Err(error::ChoreboardError::ValidationError(
            "title is required".into(),
        ));
    }
    if points <= 0 {
        return Err(error::ChoreboardError::ValidationError(
            "points must be positive".into(),
        ));
    }

    let mut assignees: Vec<String> = assignee_ids.to_vec();
    assignees.sort();
    assignees.dedup();

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "chore.create", |conn| {
        db::ensure_schema(conn)?;
        for user_id in &assignees {
            match users::get_user_conn(conn, user_id)? {
                Some(u) if u.role == Role::Child && u.is_active => {}
                Some(_) => {
                    return Err(error::ChoreboardError::ValidationError(format!(
                        "assignee {} must be an active CHILD",
                        user_id
                    )));
                }
                None => {
                    return Err(error::ChoreboardError::ValidationError(format!(
                        "unknown assignee {}",
                        user_id
                    )));
                }
            }
        }
        let chore_id = insert_chore_conn(
            conn,
            &ChoreInsert {
                title,
                description: description.trim(),
                points,
                recurrence,
                due_date,
                assignee_ids: &assignees,
                created_by: &actor.id,
                event_actor: &actor.id,
                event_note: "Chore created",
            },
        )?;
        get_chore_conn(conn, &chore_id)?.ok_or_else(|| {
            error::ChoreboardError::NotFound(format!("chore {} after insert", chore_id))
        })
    })
}

/// A child marks their assigned chore as finished, queuing it for review.
pub fn mark_done(
    store: &Store,
    actor: &Actor,
    chore_id: &str,
) -> Result<Chore, error::ChoreboardError> {
    // Role gate first: a parent or admin is Forbidden outright, before any
    // lookup. The assignee check needs the row and comes second.
    if !policy::is_allowed(actor.role, Operation::MarkDone, &PolicyContext::assignee()) {
        return Err(error::ChoreboardError::Forbidden(
            "only an assigned CHILD may mark a chore done".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "chore.done", |conn| {
        db::ensure_schema(conn)?;
        let chore = get_chore_conn(conn, chore_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("chore {}", chore_id)))?;

        let ctx = PolicyContext {
            is_assignee: chore.assignees.iter().any(|a| a == &actor.id),
            ..PolicyContext::none()
        };
        if !policy::is_allowed(actor.role, Operation::MarkDone, &ctx) {
            return Err(error::ChoreboardError::NotAssignee(format!(
                "user {} is not assigned to chore {}",
                actor.id, chore_id
            )));
        }
        if !chore.status.can_transition(ChoreStatus::DonePending) {
            return Err(error::ChoreboardError::InvalidTransition(format!(
                "chore {} is {}, cannot be marked done",
                chore_id,
                chore.status.as_str()
            )));
        }

        conn.execute(
            "UPDATE chores SET status = 'DONE_PENDING' WHERE id = ?1",
            params![chore_id],
        )?;
        record_event_conn(
            conn,
            chore_id,
            Some(chore.status),
            ChoreStatus::DonePending,
            &actor.id,
            "Marked done",
        )?;
        get_chore_conn(conn, chore_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("chore {}", chore_id)))
    })
}

/// Approve a pending chore: one atomic unit covering the status change, one
/// ledger credit of the chore's full point value per assignee, and the
/// recurrence successor when one is due.
pub fn approve_chore(
    store: &Store,
    actor: &Actor,
    chore_id: &str,
    note: Option<&str>,
) -> Result<Chore, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::ApproveChore, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "approving chores requires PARENT or ADMIN".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "chore.approve", |conn| {
        db::ensure_schema(conn)?;
        let chore = get_chore_conn(conn, chore_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("chore {}", chore_id)))?;
        if !chore.status.can_transition(ChoreStatus::Approved) {
            return Err(error::ChoreboardError::InvalidTransition(format!(
                "chore {} is {}, expected DONE_PENDING",
                chore_id,
                chore.status.as_str()
            )));
        }

        conn.execute(
            "UPDATE chores SET status = 'APPROVED' WHERE id = ?1",
            params![chore_id],
        )?;
        record_event_conn(
            conn,
            chore_id,
            Some(chore.status),
            ChoreStatus::Approved,
            &actor.id,
            note.unwrap_or("Approved"),
        )?;

        // Every assignee earns the chore's full point value; points are
        // never split across the set.
        for user_id in &chore.assignees {
            ledger::append_entry_conn(
                conn,
                user_id,
                chore.points,
                &format!("chore approved: {}", chore.title),
                RefType::Chore,
                Some(chore_id),
            )?;
        }

        if let Some(draft) = recurrence::successor(&chore, time::today()) {
            insert_chore_conn(
                conn,
                &ChoreInsert {
                    title: &draft.title,
                    description: &draft.description,
                    points: draft.points,
                    recurrence: draft.recurrence,
                    due_date: Some(draft.due_date),
                    assignee_ids: &draft.assignee_ids,
                    created_by: &chore.created_by,
                    event_actor: &actor.id,
                    event_note: "Spawned by recurrence",
                },
            )?;
        }

        get_chore_conn(conn, chore_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("chore {}", chore_id)))
    })
}

pub fn reject_chore(
    store: &Store,
    actor: &Actor,
    chore_id: &str,
    note: Option<&str>,
) -> Result<Chore, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::RejectChore, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "rejecting chores requires PARENT or ADMIN".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "chore.reject", |conn| {
        db::ensure_schema(conn)?;
        let chore = get_chore_conn(conn, chore_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("chore {}", chore_id)))?;
        if !chore.status.can_transition(ChoreStatus::Rejected) {
            return Err(error::ChoreboardError::InvalidTransition(format!(
                "chore {} is {}, expected DONE_PENDING",
                chore_id,
                chore.status.as_str()
            )));
        }

        conn.execute(
            "UPDATE chores SET status = 'REJECTED' WHERE id = ?1",
            params![chore_id],
        )?;
        record_event_conn(
            conn,
            chore_id,
            Some(chore.status),
            ChoreStatus::Rejected,
            &actor.id,
            note.unwrap_or("Rejected"),
        )?;
        get_chore_conn(conn, chore_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("chore {}", chore_id)))
    })
}

pub fn get_chore(store: &Store, chore_id: &str) -> Result<Chore, error::ChoreboardError> {
    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_conn(&db_path, "choreboard", "chore.get", |conn| {
        db::ensure_schema(conn)?;
        get_chore_conn(conn, chore_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("chore {}", chore_id)))
    })
}

pub fn chore_events(
    store: &Store,
    chore_id: &str,
) -> Result<Vec<ChoreEvent>, error::ChoreboardError> {
    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_conn(&db_path, "choreboard", "chore.events", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, chore_id, from_status, to_status, actor_id, note, created_at
             FROM chore_events WHERE chore_id = ?1 ORDER BY created_at, id",
        )?;
        let mut rows = stmt.query(params![chore_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let from_status: Option<String> = row.get(2)?;
            let to_status: String = row.get(3)?;
            out.push(ChoreEvent {
                id: row.get(0)?,
                chore_id: row.get(1)?,
                from_status: match from_status {
                    Some(s) => Some(status_from_store(&s)?),
                    None => None,
                },
                to_status: status_from_store(&to_status)?,
                actor_id: row.get(4)?,
                note: row.get(5)?,
                created_at: row.get(6)?,
            });
        }
        Ok(out)
    })
}

/// List chores visible to the actor.
///
/// CHILD callers see only chores assigned to them. By default chores whose
/// due date is strictly in the future are hidden, which keeps a freshly
/// spawned recurrence instance off the board until its day arrives;
/// `include_future` (the admin "all chores" view) returns everything.
pub fn list_chores(
    store: &Store,
    actor: &Actor,
    status: Option<ChoreStatus>,
    include_future: bool,
) -> Result<Vec<Chore>, error::ChoreboardError> {
    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);
    let today = time::today().to_string();

    broker.with_conn(&db_path, &actor.id, "chore.list", |conn| {
        db::ensure_schema(conn)?;

        let mut query = format!("SELECT {} FROM chores WHERE 1=1", CHORE_COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if actor.role == Role::Child {
            query.push_str(
                " AND id IN (SELECT chore_id FROM chore_assignments WHERE user_id = ?)",
            );
            params_vec.push(Box::new(actor.id.clone()));
        }
        if let Some(s) = status {
            query.push_str(" AND status = ?");
            params_vec.push(Box::new(s.as_str().to_string()));
        }
        if !include_future {
            query.push_str(" AND (due_date IS NULL OR due_date <= ?)");
            params_vec.push(Box::new(today.clone()));
        }
        query.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = conn.prepare(&query)?;
        let params_as_dyn: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let mut rows = stmt.query(rusqlite::params_from_iter(params_as_dyn.iter().copied()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(chore_from_row(conn, row)?);
        }
        Ok(out)
    })
}

/// Chores awaiting a decision, oldest first.
pub fn approvals_queue(
    store: &Store,
    actor: &Actor,
) -> Result<Vec<Chore>, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::ApprovalsQueue, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "the approvals queue requires PARENT or ADMIN".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_conn(&db_path, &actor.id, "chore.queue", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM chores WHERE status = 'DONE_PENDING' ORDER BY created_at, id",
            CHORE_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(chore_from_row(conn, row)?);
        }
        Ok(out)
    })
}

// ===== CLI =====

fn parse_due_arg(s: &str) -> Result<NaiveDate, String> {
    time::parse_date(s).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

fn parse_status_arg(s: &str) -> Result<ChoreStatus, String> {
    ChoreStatus::parse(&s.to_uppercase()).ok_or_else(|| format!("unknown status '{}'", s))
}

#[derive(Parser, Debug)]
#[clap(name = "chore", about = "Manage chores through their lifecycle.")]
pub struct ChoreCli {
    #[clap(subcommand)]
    command: ChoreCommand,
}

#[derive(Subcommand, Debug)]
pub enum ChoreCommand {
    /// Create a chore (PARENT/ADMIN).
    Add {
        #[clap(value_name = "TITLE")]
        title: String,
        #[clap(long, default_value = "")]
        description: String,
        #[clap(long)]
        points: i64,
        #[clap(long, value_enum, default_value = "none")]
        recurrence: Recurrence,
        #[clap(long, value_parser = parse_due_arg)]
        due: Option<NaiveDate>,
        /// Assignee user id; repeat for multiple children.
        #[clap(long = "assignee")]
        assignees: Vec<String>,
    },
    /// List chores visible to the actor.
    List {
        #[clap(long, value_parser = parse_status_arg)]
        status: Option<ChoreStatus>,
        /// Include chores whose due date has not arrived yet.
        #[clap(long)]
        all: bool,
    },
    /// Show one chore with its event history.
    Get {
        #[clap(long)]
        id: String,
    },
    /// Mark an assigned chore done (CHILD).
    Done {
        #[clap(long)]
        id: String,
    },
    /// Approve a pending chore and credit its assignees (PARENT/ADMIN).
    Approve {
        #[clap(long)]
        id: String,
        #[clap(long)]
        note: Option<String>,
    },
    /// Reject a pending chore for a re-attempt (PARENT/ADMIN).
    Reject {
        #[clap(long)]
        id: String,
        #[clap(long)]
        note: Option<String>,
    },
    /// Show the approval queue (PARENT/ADMIN).
    Queue,
}

pub fn run_chore_cli(
    store: &Store,
    actor: &Actor,
    cli: ChoreCli,
    format: OutputFormat,
) -> Result<(), error::ChoreboardError> {
    match cli.command {
        ChoreCommand::Add {
            title,
            description,
            points,
            recurrence,
            due,
            assignees,
        } => {
            let chore = create_chore(
                store,
                actor,
                &title,
                &description,
                points,
                recurrence,
                due,
                &assignees,
            )?;
            print_chore(&chore, format);
        }
        ChoreCommand::List { status, all } => {
            let chores = list_chores(store, actor, status, all)?;
            print_chores(&chores, format);
        }
        ChoreCommand::Get { id } => {
            let chore = get_chore(store, &id)?;
            let events = chore_events(store, &id)?;
            match format {
                OutputFormat::Json => {
                    let payload = serde_json::json!({ "chore": chore, "events": events });
                    println!("{}", serde_json::to_string_pretty(&payload).unwrap());
                }
                OutputFormat::Text => {
                    print_chore(&chore, OutputFormat::Text);
                    for ev in events {
                        let from = ev
                            .from_status
                            .map(|s| s.as_str().to_string())
                            .unwrap_or_else(|| "-".to_string());
                        println!(
                            "  {} {} -> {} by {} ({})",
                            ev.created_at,
                            from,
                            ev.to_status.as_str(),
                            ev.actor_id,
                            ev.note
                        );
                    }
                }
            }
        }
        ChoreCommand::Done { id } => {
            let chore = mark_done(store, actor, &id)?;
            print_chore(&chore, format);
        }
        ChoreCommand::Approve { id, note } => {
            let chore = approve_chore(store, actor, &id, note.as_deref())?;
            print_chore(&chore, format);
        }
        ChoreCommand::Reject { id, note } => {
            let chore = reject_chore(store, actor, &id, note.as_deref())?;
            print_chore(&chore, format);
        }
        ChoreCommand::Queue => {
            let chores = approvals_queue(store, actor)?;
            print_chores(&chores, format);
        }
    }
    Ok(())
}

fn print_chores(chores: &[Chore], format: OutputFormat) {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&chores).unwrap());
    } else {
        for chore in chores {
            print_chore(chore, OutputFormat::Text);
        }
    }
}

fn print_chore(chore: &Chore, format: OutputFormat) {
    use colored::Colorize;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(chore).unwrap()),
        OutputFormat::Text => {
            let status = match chore.status {
                ChoreStatus::Assigned => chore.status.as_str().cyan(),
                ChoreStatus::DonePending => chore.status.as_str().yellow(),
                ChoreStatus::Approved => chore.status.as_str().green(),
                ChoreStatus::Rejected => chore.status.as_str().red(),
            };
            let due = chore
                .due_date
                .map(|d| format!(" due {}", d))
                .unwrap_or_default();
            println!(
                "{} {} [{}] {}pt{} assignees={}",
                chore.id.bright_black(),
                chore.title.bright_white().bold(),
                status,
                chore.points,
                due,
                chore.assignees.join(",")
            );
        }
    }
}
