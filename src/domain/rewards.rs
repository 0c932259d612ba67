//! Reward catalog.
//!
//! Cost is fixed at creation; pending redemptions can never be repriced
//! underneath a child. The active flag is the only mutable field.

use crate::core::broker::DbBroker;
use crate::core::db::{self, board_db_path};
use crate::core::error;
use crate::core::store::Store;
use crate::core::time;
use crate::domain::policy::{self, Operation, PolicyContext};
use crate::domain::users::Actor;
use crate::domain::OutputFormat;
use clap::{Parser, Subcommand};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub cost: i64,
    pub is_active: bool,
    pub limit_per_week: Option<i64>,
    pub created_by: String,
    pub created_at: String,
}

const REWARD_COLUMNS: &str = "id, name, cost, is_active, limit_per_week, created_by, created_at";

fn reward_from_row(row: &rusqlite::Row) -> Result<Reward, error::ChoreboardError> {
    Ok(Reward {
        id: row.get(0)?,
        name: row.get(1)?,
        cost: row.get(2)?,
        is_active: row.get(3)?,
        limit_per_week: row.get(4)?,
        created_by: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn get_reward_conn(
    conn: &Connection,
    reward_id: &str,
) -> Result<Option<Reward>, error::ChoreboardError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM rewards WHERE id = ?1",
        REWARD_COLUMNS
    ))?;
    let mut rows = stmt.query(params![reward_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(reward_from_row(row)?)),
        None => Ok(None),
    }
}

pub fn create_reward(
    store: &Store,
    actor: &Actor,
    name: &str,
    cost: i64,
    is_active: bool,
    limit_per_week: Option<i64>,
) -> Result<Reward, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::CreateReward, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "creating rewards requires PARENT or ADMIN".into(),
        ));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(error::ChoreboardError::ValidationError(
            "name is required".into(),
        ));
    }
    if cost <= 0 {
        return Err(error::ChoreboardError::ValidationError(
            "cost must be positive".into(),
        ));
    }
    if let Some(limit) = limit_per_week {
        if limit <= 0 {
            return Err(error::ChoreboardError::ValidationError(
                "limit_per_week must be positive when set".into(),
            ));
        }
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);
    let reward_id = Ulid::new().to_string();

    broker.with_txn(&db_path, &actor.id, "reward.create", |conn| {
        db::ensure_schema(conn)?;
        conn.execute(
            "INSERT INTO rewards(id, name, cost, is_active, limit_per_week, created_by, created_at)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                reward_id,
                name,
                cost,
                is_active,
                limit_per_week,
                actor.id,
                time::now_iso()
            ],
        )?;
        get_reward_conn(conn, &reward_id)?.ok_or_else(|| {
            error::ChoreboardError::NotFound(format!("reward {} after insert", reward_id))
        })
    })
}

/// Flip a reward's active flag. Cost stays immutable for the row's lifetime.
pub fn set_reward_active(
    store: &Store,
    actor: &Actor,
    reward_id: &str,
    is_active: bool,
) -> Result<Reward, error::ChoreboardError> {
    if !policy::is_allowed(actor.role, Operation::UpdateReward, &PolicyContext::none()) {
        return Err(error::ChoreboardError::Forbidden(
            "updating rewards requires PARENT or ADMIN".into(),
        ));
    }

    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_txn(&db_path, &actor.id, "reward.set_active", |conn| {
        db::ensure_schema(conn)?;
        if get_reward_conn(conn, reward_id)?.is_none() {
            return Err(error::ChoreboardError::NotFound(format!(
                "reward {}",
                reward_id
            )));
        }
        conn.execute(
            "UPDATE rewards SET is_active = ?1 WHERE id = ?2",
            params![is_active, reward_id],
        )?;
        get_reward_conn(conn, reward_id)?
            .ok_or_else(|| error::ChoreboardError::NotFound(format!("reward {}", reward_id)))
    })
}

pub fn list_rewards(store: &Store, actor: &Actor) -> Result<Vec<Reward>, error::ChoreboardError> {
    let broker = DbBroker::new(&store.root);
    let db_path = board_db_path(&store.root);

    broker.with_conn(&db_path, &actor.id, "reward.list", |conn| {
        db::ensure_schema(conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM rewards ORDER BY created_at DESC, id DESC",
            REWARD_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(reward_from_row(row)?);
        }
        Ok(out)
    })
}

// ===== CLI =====

#[derive(Parser, Debug)]
#[clap(name = "reward", about = "Manage the reward catalog.")]
pub struct RewardCli {
    #[clap(subcommand)]
    command: RewardCommand,
}

#[derive(Subcommand, Debug)]
pub enum RewardCommand {
    /// Create a reward (PARENT/ADMIN).
    Add {
        #[clap(value_name = "NAME")]
        name: String,
        #[clap(long)]
        cost: i64,
        /// Maximum approved redemptions per child per ISO week.
        #[clap(long)]
        limit_per_week: Option<i64>,
        /// Create in the inactive state.
        #[clap(long)]
        inactive: bool,
    },
    /// List rewards.
    List,
    /// Activate or retire a reward (PARENT/ADMIN).
    SetActive {
        #[clap(long)]
        id: String,
        #[clap(long)]
        active: bool,
    },
}

pub fn run_reward_cli(
    store: &Store,
    actor: &Actor,
    cli: RewardCli,
    format: OutputFormat,
) -> Result<(), error::ChoreboardError> {
    match cli.command {
        RewardCommand::Add {
            name,
            cost,
            limit_per_week,
            inactive,
        } => {
            let reward = create_reward(store, actor, &name, cost, !inactive, limit_per_week)?;
            print_reward(&reward, format);
        }
        RewardCommand::List => {
            let rewards = list_rewards(store, actor)?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&rewards).unwrap());
            } else {
                for reward in rewards {
                    print_reward(&reward, OutputFormat::Text);
                }
            }
        }
        RewardCommand::SetActive { id, active } => {
            let reward = set_reward_active(store, actor, &id, active)?;
            print_reward(&reward, format);
        }
    }
    Ok(())
}

fn print_reward(reward: &Reward, format: OutputFormat) {
    use colored::Colorize;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reward).unwrap()),
        OutputFormat::Text => {
            let state = if reward.is_active {
                "active".green()
            } else {
                "inactive".red()
            };
            let limit = reward
                .limit_per_week
                .map(|l| format!(" limit {}/week", l))
                .unwrap_or_default();
            println!(
                "{} {} {}pt [{}]{}",
                reward.id.bright_black(),
                reward.name.bright_white().bold(),
                reward.cost,
                state,
                limit
            );
        }
    }
}
