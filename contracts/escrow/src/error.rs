use cosmwasm_std::{CheckedFromRatioError, OverflowError, StdError};
use cw_utils::PaymentError;
use neutron_sdk::NeutronError;
use thiserror::Error;

use crossfund::types::ApplicationStatus;

/// This enum describes contract errors
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    PaymentError(#[from] PaymentError),

    #[error("{0}")]
    NeutronError(#[from] NeutronError),

    #[error("{0}")]
    OverflowError(#[from] OverflowError),

    #[error("{0}")]
    CheckedFromRatioError(#[from] CheckedFromRatioError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Sender is not allowed to perform this action on the application")]
    NotAuthorized {},

    #[error("Proposal {0} not found")]
    ProposalNotFound(u64),

    #[error("Application of {applicant} to proposal {proposal_id} not found")]
    ApplicationNotFound { proposal_id: u64, applicant: String },

    #[error("Interchain account for proposal {proposal_id} on {connection_id} is not registered")]
    RegistrationNotFound {
        proposal_id: u64,
        connection_id: String,
    },

    #[error("Interchain account for proposal {proposal_id} on {connection_id} is already registered")]
    AlreadyRegistered {
        proposal_id: u64,
        connection_id: String,
    },

    #[error("Interchain account for proposal {proposal_id} on {connection_id} is not created yet")]
    IcaNotResolved {
        proposal_id: u64,
        connection_id: String,
    },

    #[error("Transfers query {0} is already watching this interchain account")]
    TransfersQueryExists(u64),

    #[error("Invalid shares sum {0}. Must be 100")]
    InvalidShareSum(u32),

    #[error("Invalid number of shareholders. Must be at most {0}")]
    TooManyShareholders(usize),

    #[error("Application must have at least one auditor")]
    NoAuditors {},

    #[error("Sender already has a live application for this proposal")]
    DuplicateApplication {},

    #[error("Application can't be processed in {0:?} state")]
    WrongState(ApplicationStatus),

    #[error("Sender already approved this application")]
    AlreadyApproved {},

    #[error("Application is already settled")]
    AlreadySettled {},

    #[error("Application deadline has passed")]
    Expired {},

    #[error("Application deadline has not passed yet")]
    NotExpired {},

    #[error("Verification window closed at height {0}")]
    VerificationWindowClosed(u64),

    #[error("Unlocking funds of expired applications is disabled")]
    UnlockOnExpiryDisabled {},

    #[error("Nothing to withdraw")]
    NothingToWithdraw {},

    #[error("Remote recipient is required to withdraw funds held on a remote chain")]
    RemoteRecipientRequired {},

    #[error("Insufficient IBC fee. Expected {0}")]
    InsufficientIbcFee(String),

    #[error("Failed to parse reply")]
    FailedToParseReply {},

    #[error("Contract can't be migrated!")]
    MigrationError {},
}
