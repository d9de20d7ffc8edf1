#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{attr, ensure, DepsMut, Env, MessageInfo, Response, StdError};
use cw_utils::nonpayable;
use neutron_sdk::bindings::msg::NeutronMsg;
use neutron_sdk::bindings::query::NeutronQuery;

use crossfund::msg::ExecuteMsg;

use crate::application::{
    accept_application, approve_application, release_expired_application, submit_application,
    verify_application,
};
use crate::error::ContractError;
use crate::ica::register_ica;
use crate::observer::register_transfers_query;
use crate::proposal::{fund_proposal, submit_proposal};
use crate::state::CONFIG;
use crate::withdraw::withdraw_funds;

/// Exposes all the execute functions available in the contract.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut<NeutronQuery>,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response<NeutronMsg>, ContractError> {
    match msg {
        ExecuteMsg::SubmitProposal { title, description } => {
            nonpayable(&info)?;
            submit_proposal(deps.into_empty(), info, title, description)
        }
        ExecuteMsg::FundProposal {
            proposal_id,
            auto_agree,
        } => fund_proposal(
            deps.into_empty(),
            info,
            proposal_id,
            auto_agree.unwrap_or_default(),
        ),
        ExecuteMsg::SubmitApplication {
            proposal_id,
            application,
        } => {
            nonpayable(&info)?;
            submit_application(deps.into_empty(), env, info, proposal_id, application)
        }
        ExecuteMsg::ApproveApplication {
            proposal_id,
            application_sender,
        } => {
            nonpayable(&info)?;
            let applicant = deps.api.addr_validate(&application_sender)?;
            approve_application(deps.into_empty(), env, info, proposal_id, applicant)
        }
        ExecuteMsg::AcceptApplication {
            proposal_id,
            application_sender,
        } => {
            nonpayable(&info)?;
            let applicant = deps.api.addr_validate(&application_sender)?;
            accept_application(deps.into_empty(), env, info, proposal_id, applicant)
        }
        ExecuteMsg::VerifyApplication {
            proposal_id,
            application_sender,
            stop_at,
        } => {
            nonpayable(&info)?;
            let applicant = deps.api.addr_validate(&application_sender)?;
            verify_application(deps.into_empty(), env, info, proposal_id, applicant, stop_at)
        }
        ExecuteMsg::ReleaseExpiredApplication {
            proposal_id,
            application_sender,
        } => {
            nonpayable(&info)?;
            let applicant = deps.api.addr_validate(&application_sender)?;
            release_expired_application(deps.into_empty(), env, info, proposal_id, applicant)
        }
        ExecuteMsg::RegisterIca {
            proposal_id,
            connection_id,
        } => register_ica(deps, env, info, proposal_id, connection_id),
        ExecuteMsg::RegisterTransfersQuery {
            proposal_id,
            connection_id,
            min_height,
        } => register_transfers_query(deps, proposal_id, connection_id, min_height),
        ExecuteMsg::WithdrawFunds {
            proposal_id,
            remote_recipient,
        } => withdraw_funds(deps, info, proposal_id, remote_recipient),
        ExecuteMsg::UpdateConfig {
            update_period,
            unlock_on_expiry,
        } => {
            nonpayable(&info)?;
            update_config(deps, info, update_period, unlock_on_expiry)
        }
    }
}

/// Update contract configuration. Only the owner can call this.
pub fn update_config(
    deps: DepsMut<NeutronQuery>,
    info: MessageInfo,
    update_period: Option<u64>,
    unlock_on_expiry: Option<bool>,
) -> Result<Response<NeutronMsg>, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure!(info.sender == config.owner, ContractError::Unauthorized {});

    let mut attrs = vec![attr("action", "update_config")];

    if let Some(update_period) = update_period {
        ensure!(
            update_period > 0,
            StdError::generic_err("Update period must be positive")
        );
        config.update_period = update_period;
        attrs.push(attr("new_update_period", update_period.to_string()));
    }

    if let Some(unlock_on_expiry) = unlock_on_expiry {
        config.unlock_on_expiry = unlock_on_expiry;
        attrs.push(attr("new_unlock_on_expiry", unlock_on_expiry.to_string()));
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(attrs))
}
