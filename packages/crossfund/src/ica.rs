use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, StdResult};

use crate::consts::ICA_CONTROLLER_PORT_PREFIX;

/// ICS-27 version metadata sent by the host chain in the channel open acknowledgement.
#[cw_serde]
pub struct OpenAckVersion {
    pub version: String,
    pub controller_connection_id: String,
    pub host_connection_id: String,
    pub address: String,
    pub encoding: String,
    pub tx_type: String,
}

/// Every proposal owns one interchain account id per connection, equal to the proposal id.
pub fn proposal_ica_id(proposal_id: u64) -> String {
    proposal_id.to_string()
}

/// Controller port of an interchain account owned by `owner`.
pub fn get_port_id(owner: &str, interchain_account_id: &str) -> String {
    format!("{ICA_CONTROLLER_PORT_PREFIX}{owner}.{interchain_account_id}")
}

/// Recover the proposal id from a controller port owned by `owner`.
pub fn proposal_id_from_port(owner: &str, port_id: &str) -> StdResult<u64> {
    port_id
        .strip_prefix(ICA_CONTROLLER_PORT_PREFIX)
        .and_then(|rest| rest.strip_prefix(owner))
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(|| StdError::generic_err(format!("Unknown controller port {port_id}")))
        .and_then(|ica_id| {
            ica_id.parse::<u64>().map_err(|_| {
                StdError::generic_err(format!("Invalid interchain account id in port {port_id}"))
            })
        })
}
