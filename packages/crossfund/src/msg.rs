use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Addr;
use cw_utils::Expiration;

use crate::types::{
    AcknowledgementResult, Application, Config, CustodyEntry, FundingEntry, ShareHolder,
};

/// This structure describes the basic settings for creating a contract.
#[cw_serde]
pub struct InstantiateMsg {
    /// Contract owner. Defaults to the instantiator
    pub owner: Option<String>,
    /// Number of blocks between two runs of an interchain transfers query
    pub update_period: Option<u64>,
    /// Whether funders may unlock funds committed to an expired application. Enabled by default
    pub unlock_on_expiry: Option<bool>,
}

#[cw_serde]
pub struct ApplicationSubmission {
    pub applicants: Vec<ShareHolder>,
    pub auditors: Vec<ShareHolder>,
    pub deliver_by: Expiration,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Create a new bounty proposal
    SubmitProposal { title: String, description: String },
    /// Deposit the attached funds into a proposal
    FundProposal {
        proposal_id: u64,
        auto_agree: Option<bool>,
    },
    /// Apply to fulfil a proposal. The sender becomes the application key
    SubmitApplication {
        proposal_id: u64,
        application: ApplicationSubmission,
    },
    /// A funder commits their unlocked funds to an application
    ApproveApplication {
        proposal_id: u64,
        application_sender: String,
    },
    /// The applicant takes on the approved work
    AcceptApplication {
        proposal_id: u64,
        application_sender: String,
    },
    /// An auditor confirms delivery. The last verification settles the application
    VerifyApplication {
        proposal_id: u64,
        application_sender: String,
        /// Refuse the verification if it lands after this block height
        stop_at: Option<u64>,
    },
    /// A funder unlocks funds committed to an application that expired before acceptance
    ReleaseExpiredApplication {
        proposal_id: u64,
        application_sender: String,
    },
    /// Open an interchain account for a proposal on a remote chain.
    /// Attached funds are used as the registration fee
    #[serde(rename = "register_i_c_a")]
    RegisterIca {
        proposal_id: u64,
        connection_id: String,
    },
    /// Start watching the interchain account for incoming transfers
    RegisterTransfersQuery {
        proposal_id: u64,
        connection_id: String,
        min_height: Option<u64>,
    },
    /// Withdraw the sender's unlocked funds from a proposal
    WithdrawFunds {
        proposal_id: u64,
        /// Remote chain address receiving funds held by the proposal interchain account
        remote_recipient: Option<String>,
    },
    /// Update the contract configuration
    UpdateConfig {
        update_period: Option<u64>,
        unlock_on_expiry: Option<bool>,
    },
}

/// This structure describes the query messages available in the contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Returns proposals in ascending id order
    #[returns(AllProposalsResponse)]
    AllProposals {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(ProposalResponse)]
    Proposal { proposal_id: u64 },
    /// Custody ledger rows of an address as (denom, entry) pairs
    #[returns(Vec<(String, CustodyEntry)>)]
    AddressFunds {
        address: String,
        skip_locked: Option<bool>,
    },
    #[returns(InterchainAccountAddressResponse)]
    InterchainAccountAddress {
        proposal_id: u64,
        connection_id: String,
    },
    /// Outcome of a withdrawal packet. Sequences are numbered per channel; without a channel
    /// the first channel of the proposal holding this sequence is used
    #[returns(Option<AcknowledgementResult>)]
    AcknowledgementResult {
        proposal_id: u64,
        sequence_id: u64,
        channel_id: Option<String>,
    },
    /// Failed asynchronous callbacks
    #[returns(Vec<(u32, String)>)]
    ErrorsQueue {},
    #[returns(Config)]
    Config {},
}

#[cw_serde]
pub struct ProposalResponse {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub proposer: Addr,
    pub funding: Vec<FundingEntry>,
    pub applications: Vec<(Addr, Application)>,
}

#[cw_serde]
pub struct AllProposalsResponse {
    pub proposals: Vec<ProposalResponse>,
}

#[cw_serde]
pub struct InterchainAccountAddressResponse {
    /// Remote chain address, absent until the channel handshake is acknowledged
    pub interchain_account_address: Option<String>,
    pub port_id: String,
    pub connection_id: String,
}
