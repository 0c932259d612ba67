use crate::core::db;
use crate::core::error;
use crate::core::time;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ulid::Ulid;

/// The DB Broker is the single gate for state access.
///
/// Mutating operations run through [`DbBroker::with_txn`]: an in-process
/// serialized request layer plus one SQLite transaction per operation, so a
/// whole operation (status change, ledger entries, recurrence insert) commits
/// or rolls back as a unit. Every access is appended to the audit log.
pub struct DbBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: root.join("broker.events.jsonl"),
        }
    }

    /// Execute a closure inside a serialized `BEGIN IMMEDIATE` transaction.
    ///
    /// Commits on `Ok`, rolls back on `Err`. Entity state must be re-read and
    /// validated inside the closure: of two racing deciders the first commit
    /// wins and the loser surfaces `InvalidTransition` from its own check.
    pub fn with_txn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::ChoreboardError>
    where
        F: FnOnce(&Connection) -> Result<R, error::ChoreboardError>,
    {
        let _lock = db_lock().lock().unwrap();

        let db_id = db_id_of(db_path);
        let mut conn = db::db_connect(&db_path.to_string_lossy())?;
        let txn = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = match f(&txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                let _ = txn.rollback();
                Err(e)
            }
        };

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(actor, op_name, &db_id, status)?;

        result
    }

    /// Execute a read-only closure with a serialized connection.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::ChoreboardError>
    where
        F: FnOnce(&Connection) -> Result<R, error::ChoreboardError>,
    {
        let _lock = db_lock().lock().unwrap();

        let db_id = db_id_of(db_path);
        let conn = db::db_connect(&db_path.to_string_lossy())?;

        let result = f(&conn);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(actor, op_name, &db_id, status)?;

        result
    }

    fn log_event(
        &self,
        actor: &str,
        op: &str,
        db_id: &str,
        status: &str,
    ) -> Result<(), error::ChoreboardError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let ev = BrokerEvent {
            ts: time::now_iso(),
            event_id: Ulid::new().to_string(),
            actor: actor.to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::ChoreboardError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev).unwrap())
            .map_err(error::ChoreboardError::IoError)?;
        Ok(())
    }
}

fn db_lock() -> &'static Mutex<()> {
    static DB_LOCK: Mutex<()> = Mutex::new(());
    &DB_LOCK
}

fn db_id_of(db_path: &Path) -> String {
    db_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
