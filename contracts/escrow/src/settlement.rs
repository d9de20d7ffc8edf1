use std::collections::BTreeMap;

use cosmwasm_std::{attr, Attribute, StdResult, Storage, Uint128};

use crossfund::consts::TOTAL_SHARE;
use crossfund::types::{Application, FundingEntry};

use crate::ledger;
use crate::state::FUNDING;

/// Split `amount` by percentage shares rounding each payout down.
/// Returns the payouts in share order and the undistributed remainder.
pub fn split_by_shares(amount: Uint128, shares: &[u8]) -> StdResult<(Vec<Uint128>, Uint128)> {
    let payouts = shares
        .iter()
        .map(|share| amount.multiply_ratio(*share as u128, TOTAL_SHARE as u128))
        .collect::<Vec<_>>();
    let paid = payouts
        .iter()
        .try_fold(Uint128::zero(), |acc, payout| acc.checked_add(*payout))?;

    Ok((payouts, amount.checked_sub(paid)?))
}

#[derive(Default)]
struct FunderGroup {
    total: Uint128,
    entries: Vec<(u64, FundingEntry)>,
}

/// Pay out every funding entry committed to the application.
/// Funds are grouped by (funder, denom, origin), split among applicants and auditors and the
/// rounding remainder goes back to the funder as available funds.
pub fn settle(
    storage: &mut dyn Storage,
    proposal_id: u64,
    application: &Application,
) -> StdResult<Vec<Attribute>> {
    let mut groups: BTreeMap<(String, String, Option<String>), FunderGroup> = BTreeMap::new();
    for index in &application.locked_funding {
        let entry = FUNDING.load(storage, (proposal_id, *index))?;
        if !entry.locked {
            continue;
        }
        let group = groups
            .entry((
                entry.sender.clone(),
                entry.denom.clone(),
                entry.remote.clone(),
            ))
            .or_default();
        group.total = group.total.checked_add(entry.amount)?;
        group.entries.push((*index, entry));
    }

    let shareholders = application.shareholders().collect::<Vec<_>>();
    let shares = shareholders
        .iter()
        .map(|holder| holder.percent_share)
        .collect::<Vec<_>>();

    let mut attrs = vec![];
    for ((funder, denom, remote), mut group) in groups {
        let (payouts, remainder) = split_by_shares(group.total, &shares)?;

        for (holder, payout) in shareholders.iter().zip(payouts) {
            if payout.is_zero() {
                continue;
            }
            ledger::credit(
                storage,
                holder.recipient.as_str(),
                proposal_id,
                &denom,
                payout,
                remote.as_deref(),
            )?;
            attrs.push(attr(
                "payout",
                format!("{}:{payout}{denom}", holder.recipient),
            ));
        }

        ledger::release_locked(
            storage,
            &funder,
            proposal_id,
            &denom,
            remote.as_deref(),
            group.total,
            remainder,
        )?;

        // Entries keep the remainder in deposit order
        let mut paid = group.total.checked_sub(remainder)?;
        group.entries.sort_by_key(|(index, _)| *index);
        for (index, mut entry) in group.entries {
            let deducted = paid.min(entry.amount);
            entry.amount -= deducted;
            paid -= deducted;
            entry.locked = false;
            FUNDING.save(storage, (proposal_id, index), &entry)?;
        }

        if !remainder.is_zero() {
            attrs.push(attr("remainder", format!("{funder}:{remainder}{denom}")));
        }
    }

    Ok(attrs)
}
