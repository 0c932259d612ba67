//! Reward redemption state machine.
//!
//! REQUESTED → {APPROVED, DENIED}, both terminal. A request checks the
//! balance but deducts nothing; there is no reservation or escrow. The only
//! point where points move is approval, which re-validates the balance inside
//! its transaction. Racing requests can over-ask, but the ledger can never
//! go below what the child actually has.

use crate::core::broker::DbBroker;
use crate::core::db::{self, board_db_path};
use crate::core::error;
use crate::core::store::Store;
use crate::core::time;
use crate::domain::ledger::{self, RefType};
use crate::domain::policy::{self, Operation, PolicyContext};
use crate::domain::rewards;
use crate::domain::users::{Actor, Role};
use crate::domain::OutputFormat;
use clap::{Parser, Subcommand};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionStatus {
    Requested,
    Approved,
    Denied,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Requested => "REQUESTED",
            RedemptionStatus::Approved => "APPROVED",
            RedemptionStatus::Denied => "DENIED",
        }
    }

    pub fn parse(s: &str) -> Option<RedemptionStatus> {
        match s {
            "REQUESTED" => Some(RedemptionStatus::Requested),
            "APPROVED" => Some(RedemptionStatus::Approved),
            "DENIED" => Some(RedemptionStatus::Denied),
            _ => None,
        }
    }

    pub fn can_transition(self, to: RedemptionStatus) -> bool {
        matches!(
            (self, to),
            (RedemptionStatus::Requested, RedemptionStatus::Approved)
                | (RedemptionStatus::Requested, RedemptionStatus::Denied)
        )
    }
}

/// A redemption row joined with its reward's name and cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub id: String,
    pub reward_id: String,
    pub reward_name: String,
    pub reward_cost: i64,
    pub user_id: String,
    pub status: RedemptionStatus,
    pub note: String,
    pub created_at: String,
    pub decided_at: Option<String>,
    pub decided_by: Option<String>,
}

const REDEMPTION_SELECT: &str = "
    SELECT r.id, r.reward_id, rw.name, rw.cost, r.user_id, r.status, r.note,
           r.created_at, r.decided_at, r.decided_by
    FROM redemptions r
    JOIN rewards rw ON rw.id = r.reward_id
";

fn redemption_from_row(row: &rusqlite::Row) -> Result<Redemption, error::ChoreboardError> {
    let status: String = row.get(5)?;
    Ok(Redemption {
        id: row.get(0)?,
        reward_id: row.get(1)?,
        reward_name: row.get(2)?,
        reward_cost: row.get(3)?,
        user_id: row.get(4)?,
        status: RedemptionStatus::parse(&status).ok_or_else(|| {
            error::ChoreboardError::ValidationError(format!(
                "unknown redemption status '{}' in store",
                status
            ))
        })?,
        note: row.get(6)?,
        created_at: row.get(7)?,
        decided_at: row.get(8)?,
        decided_by: row.get(9)?,
    })
}

pub fn get_redemption_conn(
    conn: &Connection,
    redemption_id: &str,
) -> Result<Option<Redemption>, error::ChoreboardError> {
    let mut stmt = conn.prepare(&format!("{} WHERE r.id = ?1", REDEMPTION_SELECT))?;
    let mut rows = stmt.query(params![redemption_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(redemption_from_row(row)?)),
        None => Ok(None),
    }
}

/// Approved redemptions of one reward by one user since the current ISO
/// week began.
fn approved_this_week_conn(
    conn: &Connection,
    user_id: &str,
    reward_id: &str,
) -> Result<i64, error::ChoreboardError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM redemptions
         WHERE user_id = ?1 AND reward_id = ?2 AND status = 'APPROVED' AND created_at >= ?3",
        params![user_id, reward_id, time::current_week_start_iso()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// A child asks to spend points on a reward.
///
/// The balance must cover the cost at request time or no row is created at
/// all; nothing is deducted until a parent approves.
pub fn request_redemption(
    store: &Store,
    actor: &Actor,
    reward_id: &str,
) -> Result<Redemption, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::RequestRedemption, &PolicyContext::own()) {
        return Err(error::ChoreboardError::Forbidden(
            "only a CHILD may request a redemption".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);
    let redemption_id = Ulid::new().to_string();

    broker.with_txn(&db_path, &actor.id, "redemption.request", |conn| {
        db::ensure_schema(conn)?;
        let reward = rewards::get_reward_conn(conn, reward_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("reward {}", reward_id)))?;
        if !reward.is_active {
            return Err(error::ChoreboardError::ValidationError(format!(
                "reward '{}' is inactive",
                reward.name
            )));
        }

        let balance = ledger::balance_conn(conn, &actor.id)?;
        if balance < reward.cost {
            return Err(error::ChoreboardError::InsufficientBalance(format!(
                "balance {} is below cost {}",
                balance, reward.cost
            )));
        }

        if let Some(limit) = reward.limit_per_week {
            let used = approved_this_week_conn(conn, &actor.id, reward_id)?;
            if used >= limit {
                return Err(error::ChoreboardError::LimitExceeded(format!(
                    "reward '{}' already redeemed {} of {} times this week",
                    reward.name, used, limit
                )));
            }
        }

        conn.execute(
            "INSERT INTO redemptions(id, reward_id, user_id, status, note, created_at)
             VALUES(?1, ?2, ?3, 'REQUESTED', 'Requested', ?4)",
            params![redemption_id, reward_id, actor.id, time::now_iso()],
        )?;
        get_redemption_conn(conn, &redemption_id)?.ok_or_else(|| {
            error::ChoreboardError::NotFound(format!("redemption {} after insert", redemption_id))
        })
    })
}

/// Approve a requested redemption and debit the ledger.
///
/// The balance is re-validated here because requests reserve nothing: other
/// approvals may have drained the balance since the child asked. On
/// `InsufficientBalance` the row stays REQUESTED so the caller can retry
/// later or deny it.
pub fn approve_redemption(
    store: &Store,
    actor: &Actor,
    redemption_id: &str,
    note: Option<&str>,
) -> Result<Redemption, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::DecideRedemption, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "deciding redemptions requires PARENT or ADMIN".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "redemption.approve", |conn| {
        db::ensure_schema(conn)?;
        let redemption = get_redemption_conn(conn, redemption_id)?.ok_or_else(|| {
            error::ChoreboardError::NotFound(format!("redemption {}", redemption_id))
        })?;
        if !redemption.status.can_transition(RedemptionStatus::Approved) {
            return Err(error::ChoreboardError::InvalidTransition(format!(
                "redemption {} is {}, expected REQUESTED",
                redemption_id,
                redemption.status.as_str()
            )));
        }

        let balance = ledger::balance_conn(conn, &redemption.user_id)?;
        if balance < redemption.reward_cost {
            return Err(error::ChoreboardError::InsufficientBalance(format!(
                "balance {} no longer covers cost {}",
                balance, redemption.reward_cost
            )));
        }

        conn.execute(
            "UPDATE redemptions SET status = 'APPROVED', note = ?1, decided_at = ?2, decided_by = ?3
             WHERE id = ?4",
            params![
                note.unwrap_or("Approved"),
                time::now_iso(),
                actor.id,
                redemption_id
            ],
        )?;
        ledger::append_entry_conn(
            conn,
            &redemption.user_id,
            -redemption.reward_cost,
            &format!("reward redeemed: {}", redemption.reward_name),
            RefType::Reward,
            Some(redemption_id),
        )?;
        get_redemption_conn(conn, redemption_id)?.ok_or_else(|| {
            error::ChoreboardError::NotFound(format!("redemption {}", redemption_id))
        })
    })
}

pub fn deny_redemption(
    store: &Store,
    actor: &Actor,
    redemption_id: &str,
    note: Option<&str>,
) -> Result<Redemption, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::DecideRedemption, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "deciding redemptions requires PARENT or ADMIN".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "redemption.deny", |conn| {
        db::ensure_schema(conn)?;
        let redemption = get_redemption_conn(conn, redemption_id)?.ok_or_else(|| {
            error::ChoreboardError::NotFound(format!("redemption {}", redemption_id))
        })?;
        if !redemption.status.can_transition(RedemptionStatus::Denied) {
            return Err(error::ChoreboardError::InvalidTransition(format!(
                "redemption {} is {}, expected REQUESTED",
                redemption_id,
                redemption.status.as_str()
            )));
        }

        conn.execute(
            "UPDATE redemptions SET status = 'DENIED', note = ?1, decided_at = ?2, decided_by = ?3
             WHERE id = ?4",
            params![
                note.unwrap_or("Denied"),
                time::now_iso(),
                actor.id,
                redemption_id
            ],
        )?;
        get_redemption_conn(conn, redemption_id)?.ok_or_else(|| {
            error::ChoreboardError::NotFound(format!("redemption {}", redemption_id))
        })
    })
}

pub fn list_redemptions(
    store: &Store,
    actor: &Actor,
) -> Result<Vec<Redemption>, error::ChoreboardError> {
    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_conn(&db_path, &actor.id, "redemption.list", |conn| {
        db::ensure_schema(conn)?;
        let mut query = REDEMPTION_SELECT.to_string();
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if actor.role == Role::Child {
            query.push_str(" WHERE r.user_id = ?");
            params_vec.push(Box::new(actor.id.clone()));
        }
        query.push_str(" ORDER BY r.created_at DESC, r.id DESC");

        let mut stmt = conn.prepare(&query)?;
        let params_as_dyn: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let mut rows = stmt.query(rusqlite::params_from_iter(params_as_dyn.iter().copied()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(redemption_from_row(row)?);
        }
        Ok(out)
    })
}

// ===== CLI =====

#[derive(Parser, Debug)]
#[clap(name = "redeem", about = "Request and decide reward redemptions.")]
pub struct RedeemCli {
    #[clap(subcommand)]
    command: RedeemCommand,
}

#[derive(Subcommand, Debug)]
pub enum RedeemCommand {
    /// Request a reward (CHILD).
    Request {
        #[clap(long)]
        reward: String,
    },
    /// Approve a requested redemption and debit points (PARENT/ADMIN).
    Approve {
        #[clap(long)]
        id: String,
        #[clap(long)]
        note: Option<String>,
    },
    /// Deny a requested redemption (PARENT/ADMIN).
    Deny {
        #[clap(long)]
        id: String,
        #[clap(long)]
        note: Option<String>,
    },
    /// List redemptions visible to the actor.
    List,
}

pub fn run_redeem_cli(
    store: &Store,
    actor: &Actor,
    cli: RedeemCli,
    format: OutputFormat,
) -> Result<(), error::ChoreboardError> {
    match cli.command {
        RedeemCommand::Request { reward } => {
            let redemption = request_redemption(store, actor, &reward)?;
            print_redemption(&redemption, format);
        }
        RedeemCommand::Approve { id, note } => {
            let redemption = approve_redemption(store, actor, &id, note.as_deref())?;
            print_redemption(&redemption, format);
        }
        RedeemCommand::Deny { id, note } => {
            let redemption = deny_redemption(store, actor, &id, note.as_deref())?;
            print_redemption(&redemption, format);
        }
        RedeemCommand::List => {
            let redemptions = list_redemptions(store, actor)?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&redemptions).unwrap());
            } else {
                for redemption in redemptions {
                    print_redemption(&redemption, OutputFormat::Text);
                }
            }
        }
    }
    Ok(())
}

fn print_redemption(redemption: &Redemption, format: OutputFormat) {
    use colored::Colorize;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(redemption).unwrap())
        }
        OutputFormat::Text => {
            let status = match redemption.status {
                RedemptionStatus::Requested => redemption.status.as_str().yellow(),
                RedemptionStatus::Approved => redemption.status.as_str().green(),
                RedemptionStatus::Denied => redemption.status.as_str().red(),
            };
            println!(
                "{} {} {}pt [{}] by {} ({})",
                redemption.id.bright_black(),
                redemption.reward_name.bright_white().bold(),
                redemption.reward_cost,
                status,
                redemption.user_id,
                redemption.note
            );
        }
    }
}
