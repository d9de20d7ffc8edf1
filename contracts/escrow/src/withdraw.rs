use std::collections::BTreeMap;

use cosmos_sdk_proto::cosmos::bank::v1beta1::MsgSend;
use cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxMsgData;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin as ProtoCoin;
use cosmwasm_std::{
    attr, coin, ensure, BankMsg, Binary, Coin, DepsMut, MessageInfo, Response, StdError, Storage,
    SubMsg, Uint128,
};
use cw_utils::{must_pay, nonpayable};
use itertools::Itertools;
use neutron_sdk::bindings::msg::NeutronMsg;
use neutron_sdk::bindings::query::NeutronQuery;
use neutron_sdk::bindings::types::ProtobufAny;
use neutron_sdk::sudo::msg::RequestPacket;
use prost::Message;

use crossfund::consts::{BANK_SEND_TYPE_URL, FEE_DENOM, ICA_TX_TIMEOUT};
use crossfund::ica::proposal_ica_id;
use crossfund::types::AcknowledgementResult;

use crate::error::ContractError;
use crate::ica::{queue_failure, registration_by_address};
use crate::instantiate::SUBMIT_TX_REPLY_ID;
use crate::ledger;
use crate::proposal::{ensure_proposal_exists, proposal_funding};
use crate::state::{
    WithdrawPayload, ACKNOWLEDGEMENT_RESULTS, FUNDING, PENDING_WITHDRAWALS, WITHDRAWALS,
};
use crate::utils::{min_ntrn_ibc_fee, total_fee_amount};

/// Send all available funds of the sender in a proposal back out of the escrow.
/// Funds deposited on a remote chain leave through the proposal interchain account.
pub fn withdraw_funds(
    deps: DepsMut<NeutronQuery>,
    info: MessageInfo,
    proposal_id: u64,
    remote_recipient: Option<String>,
) -> Result<Response<NeutronMsg>, ContractError> {
    ensure_proposal_exists(deps.storage, proposal_id)?;

    let owner = info.sender.to_string();
    let drained = ledger::drain_available(deps.storage, &owner, proposal_id)?;
    ensure!(!drained.is_empty(), ContractError::NothingToWithdraw {});

    let mut native = vec![];
    let mut remote: BTreeMap<String, Vec<Coin>> = BTreeMap::new();
    for (denom, amount, tag) in drained {
        match tag {
            None => native.push(coin(amount.u128(), denom)),
            Some(ica) => remote.entry(ica).or_default().push(coin(amount.u128(), denom)),
        }
    }

    // Unlocked funding of the sender is given back together with the custody balance
    let withdrawn = native
        .iter()
        .map(|coin| (coin.denom.as_str(), None))
        .chain(remote.iter().flat_map(|(ica, coins)| {
            coins
                .iter()
                .map(move |coin| (coin.denom.as_str(), Some(ica.as_str())))
        }))
        .collect::<Vec<_>>();
    let mut restorations: BTreeMap<String, Vec<(u64, Uint128)>> = BTreeMap::new();
    for (index, mut entry) in proposal_funding(deps.storage, proposal_id)? {
        if entry.sender != owner
            || entry.locked
            || entry.amount.is_zero()
            || !withdrawn.contains(&(entry.denom.as_str(), entry.remote.as_deref()))
        {
            continue;
        }
        if let Some(ica) = &entry.remote {
            restorations
                .entry(ica.clone())
                .or_default()
                .push((index, entry.amount));
        }
        entry.amount = Uint128::zero();
        FUNDING.save(deps.storage, (proposal_id, index), &entry)?;
    }

    let mut response = Response::new().add_attributes([
        attr("action", "withdraw_funds"),
        attr("proposal_id", proposal_id.to_string()),
        attr("owner", &owner),
    ]);

    if remote.is_empty() {
        nonpayable(&info)?;
    } else {
        let recipient = remote_recipient.ok_or(ContractError::RemoteRecipientRequired {})?;

        let fee = min_ntrn_ibc_fee(deps.as_ref())?;
        let required = total_fee_amount(&fee)?.checked_mul(Uint128::from(remote.len() as u128))?;
        let paid = must_pay(&info, FEE_DENOM)?;
        ensure!(
            paid >= required,
            ContractError::InsufficientIbcFee(format!("{required}{FEE_DENOM}"))
        );

        let mut pending = PENDING_WITHDRAWALS
            .may_load(deps.storage)?
            .unwrap_or_default();
        for (ica, coins) in remote {
            let registration = registration_by_address(deps.storage, proposal_id, &ica)?
                .ok_or_else(|| {
                    StdError::generic_err(format!(
                        "Interchain account {ica} doesn't belong to proposal {proposal_id}"
                    ))
                })?;

            let send = MsgSend {
                from_address: ica.clone(),
                to_address: recipient.clone(),
                amount: coins
                    .iter()
                    .map(|coin| ProtoCoin {
                        denom: coin.denom.clone(),
                        amount: coin.amount.to_string(),
                    })
                    .collect(),
            };
            let submit_msg = NeutronMsg::submit_tx(
                registration.connection_id.clone(),
                proposal_ica_id(proposal_id),
                vec![ProtobufAny {
                    type_url: BANK_SEND_TYPE_URL.to_string(),
                    value: Binary::from(send.encode_to_vec()),
                }],
                String::new(),
                ICA_TX_TIMEOUT,
                fee.clone(),
            );

            response = response
                .add_submessage(SubMsg::reply_on_success(submit_msg, SUBMIT_TX_REPLY_ID))
                .add_attribute("remote_withdrawal", format!("{}@{ica}", coins.iter().join(",")));
            pending.push(WithdrawPayload {
                owner: info.sender.clone(),
                proposal_id,
                connection_id: registration.connection_id,
                funding: restorations.remove(&ica).unwrap_or_default(),
                remote: ica,
                recipient: recipient.clone(),
                coins,
            });
        }
        PENDING_WITHDRAWALS.save(deps.storage, &pending)?;
    }

    if !native.is_empty() {
        response = response
            .add_attribute("withdrawn", native.iter().join(","))
            .add_message(BankMsg::Send {
                to_address: owner,
                amount: native,
            });
    }

    Ok(response)
}

/// Remember the packet of a submitted withdrawal so its acknowledgement can be matched.
pub fn track_withdrawal(
    storage: &mut dyn Storage,
    channel: String,
    sequence: u64,
) -> Result<Response<NeutronMsg>, ContractError> {
    let mut pending = PENDING_WITHDRAWALS.may_load(storage)?.unwrap_or_default();
    ensure!(!pending.is_empty(), ContractError::FailedToParseReply {});

    let payload = pending.remove(0);
    if pending.is_empty() {
        PENDING_WITHDRAWALS.remove(storage);
    } else {
        PENDING_WITHDRAWALS.save(storage, &pending)?;
    }
    WITHDRAWALS.save(storage, (&channel, sequence), &payload)?;

    Ok(Response::new().add_attributes([
        attr("action", "track_withdrawal"),
        attr("proposal_id", payload.proposal_id.to_string()),
        attr("channel", channel),
        attr("sequence", sequence.to_string()),
    ]))
}

/// Outcome of an interchain account transaction reported by the relayer.
pub enum AckOutcome {
    Response(Binary),
    Error(String),
    Timeout,
}

impl AckOutcome {
    fn action(&self) -> &'static str {
        match self {
            AckOutcome::Response(_) => "ica_response",
            AckOutcome::Error(_) => "ica_error",
            AckOutcome::Timeout => "ica_timeout",
        }
    }
}

/// Message types acknowledged by the host chain.
fn acknowledged_types(data: &Binary) -> Vec<String> {
    TxMsgData::decode(data.as_slice())
        .map(|msg_data| {
            msg_data
                .msg_responses
                .into_iter()
                .map(|response| response.type_url)
                .collect()
        })
        .unwrap_or_default()
}

fn restore(storage: &mut dyn Storage, payload: &WithdrawPayload) -> Result<(), ContractError> {
    for coin in &payload.coins {
        ledger::credit(
            storage,
            payload.owner.as_str(),
            payload.proposal_id,
            &coin.denom,
            coin.amount,
            Some(payload.remote.as_str()),
        )?;
    }
    for (index, amount) in &payload.funding {
        FUNDING.update(storage, (payload.proposal_id, *index), |entry| {
            let mut entry = entry.ok_or_else(|| {
                StdError::generic_err(format!("Funding entry {index} not found"))
            })?;
            entry.amount = entry.amount.checked_add(*amount)?;
            Ok::<_, StdError>(entry)
        })?;
    }

    Ok(())
}

/// Settle a withdrawal with the packet outcome. Every packet is accounted for at most once.
/// Failed and timed out withdrawals give the funds back to the owner.
pub fn process_ica_ack(
    storage: &mut dyn Storage,
    request: RequestPacket,
    outcome: AckOutcome,
) -> Result<Response<NeutronMsg>, ContractError> {
    let action = outcome.action();

    let (Some(channel), Some(sequence)) = (request.source_channel, request.sequence) else {
        return queue_failure(storage, action, "Missing source channel or sequence in packet");
    };
    let Some(payload) = WITHDRAWALS.may_load(storage, (&channel, sequence))? else {
        return queue_failure(
            storage,
            action,
            format!("Unknown interchain transaction {channel}/{sequence}"),
        );
    };

    // Tracked packets are dropped once settled so a repeated outcome lands in the queue above
    WITHDRAWALS.remove(storage, (&channel, sequence));

    let description = format!(
        "withdraw {} from {} to {}",
        payload.coins.iter().join(","),
        payload.remote,
        payload.recipient
    );
    let result = match outcome {
        AckOutcome::Response(data) => AcknowledgementResult::Success(acknowledged_types(&data)),
        AckOutcome::Error(details) => {
            restore(storage, &payload)?;
            AcknowledgementResult::Error((description, details))
        }
        AckOutcome::Timeout => {
            restore(storage, &payload)?;
            AcknowledgementResult::Timeout(description)
        }
    };
    ACKNOWLEDGEMENT_RESULTS.save(
        storage,
        (payload.proposal_id, &channel, sequence),
        &result,
    )?;

    Ok(Response::new().add_attributes([
        attr("action", action),
        attr("proposal_id", payload.proposal_id.to_string()),
        attr("owner", payload.owner),
        attr("channel", channel),
        attr("sequence", sequence.to_string()),
        attr("restored", (!matches!(result, AcknowledgementResult::Success(_))).to_string()),
    ]))
}
