//! Append-only points ledger.
//!
//! Ledger rows are facts: inserted once, never updated or deleted. A user's
//! balance is always recomputed as `SUM(delta)` over their rows. There is no
//! cached balance anywhere, so the ledger cannot drift from the truth.

use crate::core::broker::DbBroker;
use crate::core::db::{self, board_db_path};
use crate::core::error;
use crate::core::store::Store;
use crate::core::time;
use crate::domain::policy::{self, Operation, PolicyContext};
use crate::domain::users::{self, Actor, Role};
use crate::domain::OutputFormat;
use clap::{Parser, Subcommand};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefType {
    Chore,
    Reward,
    Adjust,
}

impl RefType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefType::Chore => "CHORE",
            RefType::Reward => "REWARD",
            RefType::Adjust => "ADJUST",
        }
    }

    pub fn parse(s: &str) -> Option<RefType> {
        match s {
            "CHORE" => Some(RefType::Chore),
            "REWARD" => Some(RefType::Reward),
            "ADJUST" => Some(RefType::Adjust),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub user_id: String,
    pub delta: i64,
    pub reason: String,
    pub ref_type: RefType,
    pub ref_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerView {
    pub user_id: String,
    pub entries: Vec<LedgerEntry>,
    pub total: i64,
}

/// Current balance for a user, recomputed from the ledger rows.
pub fn balance_conn(conn: &Connection, user_id: &str) -> Result<i64, error::ChoreboardError> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(delta), 0) FROM ledger WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(total)
}

/// Append one ledger entry. Insert-only; callers run inside a broker
/// transaction so the entry commits together with the status change that
/// caused it.
pub fn append_entry_conn(
    conn: &Connection,
    user_id: &str,
    delta: i64,
    reason: &str,
    ref_type: RefType,
    ref_id: Option<&str>,
) -> Result<String, error::ChoreboardError> {
    let entry_id = Ulid::new().to_string();
    conn.execute(
        "INSERT INTO ledger(id, user_id, delta, reason, ref_type, ref_id, created_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry_id,
            user_id,
            delta,
            reason,
            ref_type.as_str(),
            ref_id,
            time::now_iso()
        ],
    )?;
    Ok(entry_id)
}

fn entry_from_row(row: &rusqlite::Row) -> Result<LedgerEntry, error::ChoreboardError> {
    let ref_type: String = row.get(4)?;
    Ok(LedgerEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        delta: row.get(2)?,
        reason: row.get(3)?,
        ref_type: RefType::parse(&ref_type).ok_or_else(|| {
            error::ChoreboardError::ValidationError(format!(
                "unknown ledger ref_type '{}' in store",
                ref_type
            ))
        })?,
        ref_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Ledger entries (newest first) plus the recomputed total.
///
/// CHILD callers default to their own ledger and may not read anyone
/// else's; PARENT/ADMIN must name the user explicitly.
pub fn get_ledger(
    store: &Store,
    actor: &Actor,
    user_id: Option<&str>,
) -> Result<LedgerView, error::ChoreboardError> {
    let target = match (actor.role, user_id) {
        (Role::Child, None) => actor.id.clone(),
        (Role::Child, Some(id)) if id == actor.id => actor.id.clone(),
        (Role::Child, Some(_)) => {
            return Err(error::ChoreboardError::Forbidden(
                "a child may only view their own ledger".into(),
            ));
        }
        (_, Some(id)) => id.to_string(),
        (_, None) => {
            return Err(error::ChoreboardError::ValidationError(
                "user id is required for parent/admin ledger queries".into(),
            ));
        }
    };
    let ctx = PolicyContext {
        is_self: target == actor.id,
        ..PolicyContext::none()
    };
    if !policy::is_allowed(actor.role, Operation::ViewLedger, &ctx) {
        return Err(error::ChoreboardError::Forbidden(
            "ledger access denied".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_conn(&db_path, &actor.id, "ledger.show", |conn| {
        db::ensure_schema(conn)?;
        if users::get_user_conn(conn, &target)?.is_none() {
            return Err(error::ChoreboardError::NotFound(format!("user {}", target)));
        }
        let mut stmt = conn.prepare(
            "SELECT id, user_id, delta, reason, ref_type, ref_id, created_at
             FROM ledger WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let mut rows = stmt.query(params![target])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(entry_from_row(row)?);
        }
        let total = balance_conn(conn, &target)?;
        Ok(LedgerView {
            user_id: target.clone(),
            entries,
            total,
        })
    })
}

/// Manual point adjustment outside the chore/redemption flows.
pub fn adjust_points(
    store: &Store,
    actor: &Actor,
    user_id: &str,
    delta: i64,
    reason: &str,
) -> Result<LedgerEntry, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::AdjustPoints, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "adjusting points requires PARENT or ADMIN".into(),
        ));
    }
    if delta == 0 {
        return Err(error::ChoreboardError::ValidationError(
            "delta must be nonzero".into(),
        ));
    }
    if reason.trim().is_empty() {
        return Err(error::ChoreboardError::ValidationError(
            "reason is required".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "ledger.adjust", |conn| {
        db::ensure_schema(conn)?;
        if users::get_user_conn(conn, user_id)?.is_none() {
            return Err(error::ChoreboardError::NotFound(format!(
                "user {}",
                user_id
            )));
        }
        let entry_id =
            append_entry_conn(conn, user_id, delta, reason.trim(), RefType::Adjust, None)?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, delta, reason, ref_type, ref_id, created_at
             FROM ledger WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![entry_id])?;
        match rows.next()? {
            Some(row) => entry_from_row(row),
            None => Err(error::ChoreboardError::NotFound(format!(
                "ledger entry {} after insert",
                entry_id
            ))),
        }
    })
}

// ===== CLI =====

#[derive(Parser, Debug)]
#[clap(name = "ledger", about = "Inspect and adjust point balances.")]
pub struct LedgerCli {
    #[clap(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// Show a user's ledger and balance.
    Show {
        /// Target user id; defaults to the acting child's own ledger.
        #[clap(long)]
        user: Option<String>,
    },
    /// Append a manual adjustment entry (PARENT/ADMIN).
    Adjust {
        #[clap(long)]
        user: String,
        #[clap(long, allow_hyphen_values = true)]
        delta: i64,
        #[clap(long)]
        reason: String,
    },
}

pub fn run_ledger_cli(
    store: &Store,
    actor: &Actor,
    cli: LedgerCli,
    format: OutputFormat,
) -> Result<(), error::ChoreboardError> {
    use colored::Colorize;
    match cli.command {
        LedgerCommand::Show { user } => {
            let view = get_ledger(store, actor, user.as_deref())?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&view).unwrap())
                }
                OutputFormat::Text => {
                    for entry in &view.entries {
                        let delta = if entry.delta >= 0 {
                            format!("+{}", entry.delta).green()
                        } else {
                            entry.delta.to_string().red()
                        };
                        println!(
                            "{} {:>6} {} ({})",
                            entry.created_at.bright_black(),
                            delta,
                            entry.reason,
                            entry.ref_type.as_str()
                        );
                    }
                    println!("total: {}", view.total.to_string().bold());
                }
            }
        }
        LedgerCommand::Adjust {
            user,
            delta,
            reason,
        } => {
            let entry = adjust_points(store, actor, &user, delta, &reason)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&entry).unwrap())
                }
                OutputFormat::Text => {
                    println!("adjusted {} by {} ({})", entry.user_id, entry.delta, entry.id)
                }
            }
        }
    }
    Ok(())
}
