use std::collections::BTreeMap;

use cosmwasm_std::{
    attr, ensure, Addr, Attribute, BlockInfo, Decimal, DepsMut, Env, MessageInfo, Response,
    StdResult, Storage, Uint128,
};
use neutron_sdk::bindings::msg::NeutronMsg;

use crossfund::consts::{AUTO_AGREE_MAJORITY_PERCENT, MAX_SHAREHOLDERS, TOTAL_SHARE};
use crossfund::msg::ApplicationSubmission;
use crossfund::types::{Application, ApplicationStatus, ShareHolder};

use crate::error::ContractError;
use crate::ledger;
use crate::proposal::{ensure_proposal_exists, proposal_funding};
use crate::settlement::settle;
use crate::state::{APPLICATIONS, CONFIG, FUNDING};

/// Checks that an application has at least one auditor, a bounded number of
/// shareholders and shares summing up to exactly 100.
pub fn validate_shares(
    applicants: &[ShareHolder],
    auditors: &[ShareHolder],
) -> Result<(), ContractError> {
    ensure!(!auditors.is_empty(), ContractError::NoAuditors {});

    let count = applicants.len() + auditors.len();
    ensure!(
        count <= MAX_SHAREHOLDERS,
        ContractError::TooManyShareholders(MAX_SHAREHOLDERS)
    );

    let mut sum = 0u32;
    for holder in applicants.iter().chain(auditors) {
        ensure!(
            (holder.percent_share as u32) <= TOTAL_SHARE,
            ContractError::InvalidShareSum(holder.percent_share as u32)
        );
        sum += holder.percent_share as u32;
    }
    ensure!(sum == TOTAL_SHARE, ContractError::InvalidShareSum(sum));

    Ok(())
}

pub fn load_application(
    storage: &dyn Storage,
    proposal_id: u64,
    applicant: &Addr,
) -> Result<Application, ContractError> {
    APPLICATIONS
        .may_load(storage, (proposal_id, applicant))?
        .ok_or_else(|| ContractError::ApplicationNotFound {
            proposal_id,
            applicant: applicant.to_string(),
        })
}

/// Applications that expired before being accepted can't move forward.
fn check_deadline(application: &Application, block: &BlockInfo) -> Result<(), ContractError> {
    let expired = application.status == ApplicationStatus::Expired
        || (application.status.can_expire() && application.deliver_by.is_expired(block));
    ensure!(!expired, ContractError::Expired {});

    Ok(())
}

pub fn submit_application(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    proposal_id: u64,
    submission: ApplicationSubmission,
) -> Result<Response<NeutronMsg>, ContractError> {
    ensure_proposal_exists(deps.storage, proposal_id)?;

    let validate = |holders: Vec<ShareHolder>| -> StdResult<Vec<ShareHolder>> {
        holders
            .into_iter()
            .map(|holder| {
                Ok(ShareHolder {
                    recipient: deps.api.addr_validate(holder.recipient.as_str())?,
                    percent_share: holder.percent_share,
                })
            })
            .collect()
    };
    let applicants = validate(submission.applicants)?;
    let auditors = validate(submission.auditors)?;
    validate_shares(&applicants, &auditors)?;

    ensure!(
        !submission.deliver_by.is_expired(&env.block),
        ContractError::Expired {}
    );

    if let Some(existing) = APPLICATIONS.may_load(deps.storage, (proposal_id, &info.sender))? {
        // Nothing is locked behind a submitted application so a stale one can be replaced
        let replaceable = !existing.status.is_live()
            || (existing.status == ApplicationStatus::Submitted
                && existing.deliver_by.is_expired(&env.block));
        ensure!(replaceable, ContractError::DuplicateApplication {});
    }

    APPLICATIONS.save(
        deps.storage,
        (proposal_id, &info.sender),
        &Application {
            applicants,
            auditors,
            deliver_by: submission.deliver_by,
            accepted: false,
            verifications: vec![],
            status: ApplicationStatus::Submitted,
            approved_by: vec![],
            locked_funding: vec![],
        },
    )?;

    Ok(Response::new().add_attributes([
        attr("action", "submit_application"),
        attr("proposal_id", proposal_id.to_string()),
        attr("applicant", info.sender),
    ]))
}

/// Lock all of the caller's unlocked funding and commit it to the application.
pub fn approve_application(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    proposal_id: u64,
    applicant: Addr,
) -> Result<Response<NeutronMsg>, ContractError> {
    let mut application = load_application(deps.storage, proposal_id, &applicant)?;

    check_deadline(&application, &env.block)?;
    ensure!(
        application.status.can_expire(),
        ContractError::WrongState(application.status)
    );
    ensure!(
        !application.approved_by.contains(&info.sender),
        ContractError::AlreadyApproved {}
    );

    let funder = info.sender.as_str();
    let own_funding = proposal_funding(deps.storage, proposal_id)?
        .into_iter()
        .filter(|(_, entry)| entry.sender == funder && !entry.locked && !entry.amount.is_zero())
        .collect::<Vec<_>>();
    ensure!(!own_funding.is_empty(), ContractError::NotAuthorized {});

    let mut attrs = vec![
        attr("action", "approve_application"),
        attr("proposal_id", proposal_id.to_string()),
        attr("applicant", &applicant),
        attr("funder", funder),
    ];
    for (index, mut entry) in own_funding {
        entry.locked = true;
        FUNDING.save(deps.storage, (proposal_id, index), &entry)?;
        ledger::lock(
            deps.storage,
            funder,
            proposal_id,
            &entry.denom,
            entry.remote.as_deref(),
            entry.amount,
        )?;
        application.locked_funding.push(index);
        attrs.push(attr("locked", format!("{}{}", entry.amount, entry.denom)));
    }

    application.approved_by.push(info.sender.clone());
    application.status = ApplicationStatus::Approved;
    APPLICATIONS.save(deps.storage, (proposal_id, &applicant), &application)?;

    Ok(Response::new().add_attributes(attrs))
}

/// Lock all auto-agree funding of the proposal once the funds committed to the application
/// make up the majority of the proposal funding in any denom.
fn lock_auto_agree(
    storage: &mut dyn Storage,
    proposal_id: u64,
    application: &mut Application,
) -> Result<Vec<Attribute>, ContractError> {
    let funding = proposal_funding(storage, proposal_id)?;

    let mut totals: BTreeMap<&str, (Uint128, Uint128)> = BTreeMap::new();
    for (index, entry) in &funding {
        let (total, attributed) = totals.entry(entry.denom.as_str()).or_default();
        *total = total.checked_add(entry.amount)?;
        if application.locked_funding.contains(index) {
            *attributed = attributed.checked_add(entry.amount)?;
        }
    }

    let majority = Decimal::percent(AUTO_AGREE_MAJORITY_PERCENT);
    let mut has_majority = false;
    for (total, attributed) in totals.into_values() {
        if !total.is_zero() && Decimal::checked_from_ratio(attributed, total)? > majority {
            has_majority = true;
        }
    }
    if !has_majority {
        return Ok(vec![]);
    }

    let mut attrs = vec![];
    for (index, mut entry) in funding {
        if !entry.auto_agree || entry.locked || entry.amount.is_zero() {
            continue;
        }
        entry.locked = true;
        FUNDING.save(storage, (proposal_id, index), &entry)?;
        ledger::lock(
            storage,
            &entry.sender,
            proposal_id,
            &entry.denom,
            entry.remote.as_deref(),
            entry.amount,
        )?;
        application.locked_funding.push(index);
        attrs.push(attr(
            "auto_agree",
            format!("{}:{}{}", entry.sender, entry.amount, entry.denom),
        ));
    }

    Ok(attrs)
}

pub fn accept_application(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    proposal_id: u64,
    applicant: Addr,
) -> Result<Response<NeutronMsg>, ContractError> {
    let mut application = load_application(deps.storage, proposal_id, &applicant)?;

    check_deadline(&application, &env.block)?;
    ensure!(info.sender == applicant, ContractError::NotAuthorized {});
    ensure!(
        application.status == ApplicationStatus::Approved,
        ContractError::WrongState(application.status)
    );

    let auto_agree_attrs = lock_auto_agree(deps.storage, proposal_id, &mut application)?;

    application.accepted = true;
    application.status = ApplicationStatus::Accepted;
    APPLICATIONS.save(deps.storage, (proposal_id, &applicant), &application)?;

    Ok(Response::new()
        .add_attributes([
            attr("action", "accept_application"),
            attr("proposal_id", proposal_id.to_string()),
            attr("applicant", applicant),
        ])
        .add_attributes(auto_agree_attrs))
}

/// Record an auditor verification. The last missing verification settles the application.
pub fn verify_application(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    proposal_id: u64,
    applicant: Addr,
    stop_at: Option<u64>,
) -> Result<Response<NeutronMsg>, ContractError> {
    let mut application = load_application(deps.storage, proposal_id, &applicant)?;

    ensure!(
        application.is_auditor(&info.sender),
        ContractError::NotAuthorized {}
    );
    ensure!(
        application.status != ApplicationStatus::Settled,
        ContractError::AlreadySettled {}
    );
    ensure!(
        matches!(
            application.status,
            ApplicationStatus::Accepted | ApplicationStatus::Verifying
        ),
        ContractError::WrongState(application.status)
    );
    if let Some(stop_at) = stop_at {
        ensure!(
            env.block.height <= stop_at,
            ContractError::VerificationWindowClosed(stop_at)
        );
    }

    let mut response = Response::new().add_attributes([
        attr("action", "verify_application"),
        attr("proposal_id", proposal_id.to_string()),
        attr("applicant", &applicant),
        attr("auditor", &info.sender),
    ]);

    if application.verifications.contains(&info.sender) {
        return Ok(response.add_attribute("already_verified", "true"));
    }

    application.verifications.push(info.sender);
    application.status = ApplicationStatus::Verifying;

    if application.is_verified_by_all() {
        application.status = ApplicationStatus::Settled;
        let payouts = settle(deps.storage, proposal_id, &application)?;
        response = response
            .add_attribute("settled", "true")
            .add_attributes(payouts);
    }

    APPLICATIONS.save(deps.storage, (proposal_id, &applicant), &application)?;

    Ok(response)
}

/// Give back every fund committed to an application that expired before acceptance.
pub fn release_expired_application(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    proposal_id: u64,
    applicant: Addr,
) -> Result<Response<NeutronMsg>, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure!(
        config.unlock_on_expiry,
        ContractError::UnlockOnExpiryDisabled {}
    );

    let mut application = load_application(deps.storage, proposal_id, &applicant)?;
    ensure!(
        application.status.can_expire(),
        ContractError::WrongState(application.status)
    );
    ensure!(
        application.deliver_by.is_expired(&env.block),
        ContractError::NotExpired {}
    );
    ensure!(
        application.approved_by.contains(&info.sender),
        ContractError::NotAuthorized {}
    );

    let mut attrs = vec![
        attr("action", "release_expired_application"),
        attr("proposal_id", proposal_id.to_string()),
        attr("applicant", &applicant),
    ];
    for index in application.locked_funding.drain(..) {
        let mut entry = FUNDING.load(deps.storage, (proposal_id, index))?;
        if !entry.locked {
            continue;
        }
        entry.locked = false;
        FUNDING.save(deps.storage, (proposal_id, index), &entry)?;
        ledger::unlock(
            deps.storage,
            &entry.sender,
            proposal_id,
            &entry.denom,
            entry.remote.as_deref(),
            entry.amount,
        )?;
        attrs.push(attr(
            "unlocked",
            format!("{}:{}{}", entry.sender, entry.amount, entry.denom),
        ));
    }

    application.status = ApplicationStatus::Expired;
    APPLICATIONS.save(deps.storage, (proposal_id, &applicant), &application)?;

    Ok(Response::new().add_attributes(attrs))
}
