use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Uint128};
use cw_utils::Expiration;

/// General contract configuration
#[cw_serde]
pub struct Config {
    /// Address that's allowed to change contract parameters
    pub owner: Addr,
    /// Number of blocks between two runs of an interchain transfers query
    pub update_period: u64,
    /// Whether funders may unlock their funds from an application that expired before acceptance
    pub unlock_on_expiry: bool,
}

#[cw_serde]
pub struct Proposal {
    pub title: String,
    pub description: String,
    /// Address that submitted the proposal
    pub proposer: Addr,
}

/// Recipient of a percentage of the settled funds.
#[cw_serde]
pub struct ShareHolder {
    pub recipient: Addr,
    pub percent_share: u8,
}

/// A single deposit into a proposal. Funding entries are append-only.
#[cw_serde]
pub struct FundingEntry {
    pub denom: String,
    pub amount: Uint128,
    /// Local or remote chain address that sent the funds
    pub sender: String,
    /// Funds follow the majority of approving funders
    pub auto_agree: bool,
    /// False for deposits observed on a remote chain
    pub native: bool,
    /// Committed to an application
    pub locked: bool,
    /// Interchain account holding the funds for remote deposits
    pub remote: Option<String>,
}

/// A row of the custody ledger as returned by the `address_funds` query.
#[cw_serde]
pub struct CustodyEntry {
    pub amount: Uint128,
    pub proposal_id: u64,
    pub locked: bool,
    pub remote: Option<String>,
}

#[cw_serde]
#[derive(Copy, Eq)]
pub enum ApplicationStatus {
    Submitted,
    Approved,
    Accepted,
    Verifying,
    Settled,
    Expired,
}

impl ApplicationStatus {
    /// Settled and expired applications are terminal
    pub fn is_live(&self) -> bool {
        !matches!(self, ApplicationStatus::Settled | ApplicationStatus::Expired)
    }

    /// Only applications not yet accepted can expire
    pub fn can_expire(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Submitted | ApplicationStatus::Approved
        )
    }
}

#[cw_serde]
pub struct Application {
    pub applicants: Vec<ShareHolder>,
    pub auditors: Vec<ShareHolder>,
    pub deliver_by: Expiration,
    pub accepted: bool,
    pub verifications: Vec<Addr>,
    pub status: ApplicationStatus,
    /// Funders whose funds were committed through an approval
    pub approved_by: Vec<Addr>,
    /// Indices of the proposal funding entries committed to this application
    pub locked_funding: Vec<u64>,
}

impl Application {
    /// Applicants first, auditors second.
    pub fn shareholders(&self) -> impl Iterator<Item = &ShareHolder> {
        self.applicants.iter().chain(self.auditors.iter())
    }

    pub fn is_auditor(&self, addr: &Addr) -> bool {
        self.auditors.iter().any(|auditor| auditor.recipient == *addr)
    }

    pub fn is_verified_by_all(&self) -> bool {
        self.auditors
            .iter()
            .all(|auditor| self.verifications.contains(&auditor.recipient))
    }
}

/// Interchain account registered for a proposal on a given connection.
#[cw_serde]
pub struct InterchainAccount {
    pub port_id: String,
    pub connection_id: String,
    pub channel_id: Option<String>,
    pub counterparty_channel_id: Option<String>,
    pub host_connection_id: Option<String>,
    /// Remote chain address. Absent until the channel handshake is acknowledged
    pub address: Option<String>,
    /// Interchain transfers query watching the account
    pub transfers_query_id: Option<u64>,
}

/// Outcome of an interchain account transaction
#[cw_serde]
pub enum AcknowledgementResult {
    /// Success - got success acknowledgement with the message type urls sent
    Success(Vec<String>),
    /// Error - got error acknowledgement with payload description and error details
    Error((String, String)),
    /// Timeout - packet timed out, contains payload description
    Timeout(String),
}
