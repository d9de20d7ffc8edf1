use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Order, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

use crossfund::types::{
    AcknowledgementResult, Application, Config, FundingEntry, InterchainAccount, Proposal,
};

/// Balance of an owner in a single proposal, denom and origin.
#[cw_serde]
#[derive(Default)]
pub struct CustodyBalance {
    pub denom: String,
    /// Funds free to be approved or withdrawn
    pub available: Uint128,
    /// Funds committed to applications
    pub locked: Uint128,
    /// Interchain account holding the funds if they were deposited on a remote chain
    pub remote: Option<String>,
}

impl CustodyBalance {
    pub fn is_empty(&self) -> bool {
        self.available.is_zero() && self.locked.is_zero()
    }
}

/// Everything needed to roll back a withdrawal sent through an interchain account.
#[cw_serde]
pub struct WithdrawPayload {
    pub owner: Addr,
    pub proposal_id: u64,
    pub connection_id: String,
    /// Interchain account sending the funds
    pub remote: String,
    pub recipient: String,
    pub coins: Vec<Coin>,
    /// Funding entries zeroed by the withdrawal with their previous amounts
    pub funding: Vec<(u64, Uint128)>,
}

/// Stores config at the given key.
pub const CONFIG: Item<Config> = Item::new("config");
/// Id assigned to the next proposal
pub const PROPOSAL_INDEX: Item<u64> = Item::new("proposal_index");
pub const PROPOSALS: Map<u64, Proposal> = Map::new("proposals");
/// Append-only funding list. Key (proposal_id, entry index)
pub const FUNDING: Map<(u64, u64), FundingEntry> = Map::new("funding");
/// Key (proposal_id, applicant)
pub const APPLICATIONS: Map<(u64, &Addr), Application> = Map::new("applications");
/// Custody ledger. Key (owner, proposal_id, slot) where the slot is the denom for local funds
/// and `{denom}@{interchain account}` for funds held on a remote chain
pub const CUSTODY: Map<(&str, u64, &str), CustodyBalance> = Map::new("custody");
/// Key (proposal_id, connection_id)
pub const INTERCHAIN_ACCOUNTS: Map<(u64, &str), InterchainAccount> =
    Map::new("interchain_accounts");
/// Interchain transfers query id -> (proposal_id, connection_id) of the watched account
pub const TRANSFERS_QUERIES: Map<u64, (u64, String)> = Map::new("transfers_queries");
/// Remote transactions already folded into the ledger.
/// Key (proposal_id, connection_id, tx hash) -> local height of reconciliation
pub const PROCESSED_TXS: Map<(u64, &str, &[u8]), u64> = Map::new("processed_txs");
/// Registration waiting for its transfers query id in reply
pub const PENDING_QUERY: Item<(u64, String)> = Item::new("pending_query");
/// Withdrawals waiting for their packet sequences. Replies arrive in submission order
pub const PENDING_WITHDRAWALS: Item<Vec<WithdrawPayload>> = Item::new("pending_withdrawals");
/// In-flight withdrawals. Key (source channel, sequence)
pub const WITHDRAWALS: Map<(&str, u64), WithdrawPayload> = Map::new("withdrawals");
/// Interchain transaction outcomes. Key (proposal_id, source channel, sequence)
pub const ACKNOWLEDGEMENT_RESULTS: Map<(u64, &str, u64), AcknowledgementResult> =
    Map::new("acknowledgement_results");
/// Failed asynchronous callbacks kept for inspection
pub const ERRORS_QUEUE: Map<u32, String> = Map::new("errors_queue");

/// Append an error to the errors queue and return its index.
pub fn add_error_to_queue(storage: &mut dyn Storage, error: impl Into<String>) -> StdResult<u32> {
    let index = ERRORS_QUEUE
        .keys(storage, None, None, Order::Descending)
        .next()
        .transpose()?
        .map_or(0, |last| last + 1);
    ERRORS_QUEUE.save(storage, index, &error.into())?;

    Ok(index)
}
