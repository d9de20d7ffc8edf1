use cosmwasm_std::{Order, StdResult, Storage, Uint128};

use crossfund::types::CustodyEntry;

use crate::state::{CustodyBalance, CUSTODY};

/// Ledger slot of a denom. Funds held by different interchain accounts never share a slot,
/// neither with each other nor with local funds of the same denom.
fn slot(denom: &str, remote: Option<&str>) -> String {
    match remote {
        Some(account) => format!("{denom}@{account}"),
        None => denom.to_string(),
    }
}

/// Add freshly deposited or paid out funds to the available side of a balance.
pub fn credit(
    storage: &mut dyn Storage,
    owner: &str,
    proposal_id: u64,
    denom: &str,
    amount: Uint128,
    remote: Option<&str>,
) -> StdResult<()> {
    if amount.is_zero() {
        return Ok(());
    }

    update(storage, owner, proposal_id, denom, remote, |balance| {
        balance.available = balance.available.checked_add(amount)?;
        Ok(())
    })
}

/// Move funds from the available to the locked side.
pub fn lock(
    storage: &mut dyn Storage,
    owner: &str,
    proposal_id: u64,
    denom: &str,
    remote: Option<&str>,
    amount: Uint128,
) -> StdResult<()> {
    update(storage, owner, proposal_id, denom, remote, |balance| {
        balance.available = balance.available.checked_sub(amount)?;
        balance.locked = balance.locked.checked_add(amount)?;
        Ok(())
    })
}

/// Move funds from the locked back to the available side.
pub fn unlock(
    storage: &mut dyn Storage,
    owner: &str,
    proposal_id: u64,
    denom: &str,
    remote: Option<&str>,
    amount: Uint128,
) -> StdResult<()> {
    update(storage, owner, proposal_id, denom, remote, |balance| {
        balance.locked = balance.locked.checked_sub(amount)?;
        balance.available = balance.available.checked_add(amount)?;
        Ok(())
    })
}

/// Remove `total` from the locked side of a settled funder and give back `remainder`
/// as available funds.
pub fn release_locked(
    storage: &mut dyn Storage,
    owner: &str,
    proposal_id: u64,
    denom: &str,
    remote: Option<&str>,
    total: Uint128,
    remainder: Uint128,
) -> StdResult<()> {
    update(storage, owner, proposal_id, denom, remote, |balance| {
        balance.locked = balance.locked.checked_sub(total)?;
        balance.available = balance.available.checked_add(remainder)?;
        Ok(())
    })
}

/// Take the whole available side of every balance an owner holds in a proposal.
/// Returns (denom, amount, remote) for each non-empty balance.
pub fn drain_available(
    storage: &mut dyn Storage,
    owner: &str,
    proposal_id: u64,
) -> StdResult<Vec<(String, Uint128, Option<String>)>> {
    let balances = CUSTODY
        .prefix((owner, proposal_id))
        .range(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;

    let mut drained = vec![];
    for (slot, mut balance) in balances {
        if balance.available.is_zero() {
            continue;
        }
        drained.push((
            balance.denom.clone(),
            balance.available,
            balance.remote.clone(),
        ));
        balance.available = Uint128::zero();
        save_or_remove(storage, (owner, proposal_id, &slot), balance)?;
    }

    Ok(drained)
}

fn update<F>(
    storage: &mut dyn Storage,
    owner: &str,
    proposal_id: u64,
    denom: &str,
    remote: Option<&str>,
    action: F,
) -> StdResult<()>
where
    F: FnOnce(&mut CustodyBalance) -> StdResult<()>,
{
    let slot = slot(denom, remote);
    let key = (owner, proposal_id, slot.as_str());
    let mut balance = CUSTODY
        .may_load(storage, key)?
        .unwrap_or_else(|| CustodyBalance {
            denom: denom.to_string(),
            remote: remote.map(ToString::to_string),
            ..CustodyBalance::default()
        });
    action(&mut balance)?;
    save_or_remove(storage, key, balance)
}

fn save_or_remove(
    storage: &mut dyn Storage,
    key: (&str, u64, &str),
    balance: CustodyBalance,
) -> StdResult<()> {
    if balance.is_empty() {
        CUSTODY.remove(storage, key);
        Ok(())
    } else {
        CUSTODY.save(storage, key, &balance)
    }
}

/// Custody rows of an owner across all proposals.
/// Every balance yields an unlocked row and a locked row when the corresponding side is non-zero.
pub fn address_funds(
    storage: &dyn Storage,
    owner: &str,
    skip_locked: bool,
) -> StdResult<Vec<(String, CustodyEntry)>> {
    CUSTODY
        .sub_prefix(owner)
        .range(storage, None, None, Order::Ascending)
        .try_fold(vec![], |mut rows, item| {
            let ((proposal_id, _), balance) = item?;
            let sides = [(balance.available, false), (balance.locked, true)];
            for (amount, locked) in sides {
                if amount.is_zero() || (locked && skip_locked) {
                    continue;
                }
                rows.push((
                    balance.denom.clone(),
                    CustodyEntry {
                        amount,
                        proposal_id,
                        locked,
                        remote: balance.remote.clone(),
                    },
                ));
            }
            Ok(rows)
        })
}
