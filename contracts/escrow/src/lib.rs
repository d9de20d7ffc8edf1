pub mod execute;
pub mod state;

pub mod application;
pub mod error;
pub mod ica;
pub mod instantiate;
pub mod ledger;
pub mod migration;
pub mod observer;
pub mod proposal;
pub mod query;
pub mod settlement;
pub mod sudo;
pub mod utils;
pub mod withdraw;
