//! Domain subsystems: users, access policy, chores, rewards, redemptions,
//! the points ledger, and recurrence.
//!
//! Every mutating operation takes an explicit [`users::Actor`], consults
//! [`policy`] before touching state, and runs inside one broker transaction.

use clap::ValueEnum;

pub mod chores;
pub mod ledger;
pub mod policy;
pub mod recurrence;
pub mod redemptions;
pub mod rewards;
pub mod users;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
