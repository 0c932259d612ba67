//! Store handle for a Choreboard workspace.
//!
//! A Store is the logical container for one family board: the SQLite
//! database and the broker audit log, scoped to `<project>/.choreboard/data/`.

use std::path::PathBuf;

/// Store handle representing one board's state directory.
///
/// All subsystem state (users, chores, rewards, redemptions, ledger) lives in
/// a single database under this root, so cross-entity operations commit in
/// one transaction.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the store root directory.
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}
