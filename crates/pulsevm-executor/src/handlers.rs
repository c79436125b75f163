use std::collections::HashMap;

use once_cell::sync::Lazy;

use pulsevm_codec::Unmarshal;
use pulsevm_state::{Chain, CodeEntry};
use pulsevm_types::{Account, Code, Name, Permission};

use crate::actions::{NewAccountData, SetAbiData, SetCodeData};
use crate::error::ExecutorError;
use crate::inputs::{Input, TxInputs};
use crate::resources::ResourceTracker;

/// Serialized size of an [`Account`] with an empty ABI; every native handler
/// that bills RAM for a new account record uses this constant rather than
/// re-marshaling to measure it, matching the spec's own `BillableSize`.
pub const ACCOUNT_BILLABLE_SIZE: i64 = 61;

/// Name of the privileged system account every native handler runs under.
pub fn pulse_account() -> Name {
    Name::from_str_lossy("pulse")
}

fn owner_permission_name() -> Name {
    Name::from_str_lossy("owner")
}

fn active_permission_name() -> Name {
    Name::from_str_lossy("active")
}

/// Account names matching this prefix are reserved for the system account
/// and can only be created by a privileged creator.
const RESERVED_PREFIX: &str = "pulse.";

fn require_authority(authorized: &[pulsevm_types::PermissionLevel], actor: Name) -> Result<(), ExecutorError> {
    if authorized.iter().any(|level| level.actor == actor) {
        Ok(())
    } else {
        Err(ExecutorError::MissingAuthority { actor: actor.to_string() })
    }
}

fn permission_size(permission: &Permission) -> Result<i64, ExecutorError> {
    use pulsevm_codec::Marshal;
    Ok(permission.marshal_to_vec()?.len() as i64)
}

fn newaccount(
    chain: &dyn Chain,
    authorized: &[pulsevm_types::PermissionLevel],
    data: &[u8],
    tracker: &ResourceTracker,
    now: u32,
) -> Result<TxInputs, ExecutorError> {
    let parsed = NewAccountData::unmarshal_exact(data)
        .map_err(|e| ExecutorError::MalformedActionData { action: "newaccount".into(), reason: e.to_string() })?;

    require_authority(authorized, parsed.creator)?;
    parsed.owner.validate().map_err(|e| ExecutorError::MalformedActionData {
        action: "newaccount".into(),
        reason: e.to_string(),
    })?;
    parsed.active.validate().map_err(|e| ExecutorError::MalformedActionData {
        action: "newaccount".into(),
        reason: e.to_string(),
    })?;

    let display = parsed.name.to_string();
    if display.is_empty() {
        return Err(ExecutorError::EmptyAccountName);
    }
    if display.len() > 12 {
        return Err(ExecutorError::AccountNameTooLong);
    }

    let creator_account = chain
        .get_account(parsed.creator)?
        .ok_or_else(|| ExecutorError::CreatorNotFound(parsed.creator.to_string()))?;

    if display.starts_with(RESERVED_PREFIX) && !creator_account.privileged {
        return Err(ExecutorError::ReservedPrefixWithoutPrivilege {
            name: display,
            creator: parsed.creator.to_string(),
        });
    }

    if chain.get_account(parsed.name)?.is_some() {
        return Err(ExecutorError::AccountAlreadyExists(display));
    }

    let account = Account::new(parsed.name, now as u64);
    chain.modify_account(account)?;

    let owner_perm = Permission::new(
        parsed.name,
        owner_permission_name(),
        pulsevm_types::EMPTY_DIGEST,
        parsed.owner,
        now,
    );
    let owner_id = Permission::id(parsed.name, owner_permission_name());
    let active_perm = Permission::new(parsed.name, active_permission_name(), owner_id, parsed.active, now);

    let billed = ACCOUNT_BILLABLE_SIZE + permission_size(&owner_perm)? + permission_size(&active_perm)?;

    chain.add_permission(owner_perm)?;
    chain.add_permission(active_perm)?;
    tracker.add_ram(parsed.creator, billed);

    let mut inputs = TxInputs::new();
    inputs.insert(Input::Account(parsed.creator));
    inputs.insert(Input::Account(parsed.name));
    Ok(inputs)
}

fn setcode(
    chain: &dyn Chain,
    authorized: &[pulsevm_types::PermissionLevel],
    data: &[u8],
    tracker: &ResourceTracker,
    _now: u32,
) -> Result<TxInputs, ExecutorError> {
    let parsed = SetCodeData::unmarshal_exact(data)
        .map_err(|e| ExecutorError::MalformedActionData { action: "setcode".into(), reason: e.to_string() })?;

    require_authority(authorized, parsed.account)?;

    let mut account = chain
        .get_account(parsed.account)?
        .ok_or_else(|| ExecutorError::AccountNotFound(parsed.account.to_string()))?;

    let old_hash = account.code_hash;
    let old_entry = if account.has_code() { chain.get_code(&old_hash)? } else { None };
    let old_size = old_entry.as_ref().map(|e| e.code.bytes.len()).unwrap_or(0) as i64;

    if parsed.code.is_empty() {
        account.code_hash = pulsevm_types::EMPTY_DIGEST;
        account.code_sequence = account.code_sequence.wrapping_add(1);
        chain.modify_account(account)?;

        if let Some(mut entry) = old_entry {
            entry.ref_count = entry.ref_count.saturating_sub(1);
            if entry.ref_count == 0 {
                chain.remove_code(&old_hash)?;
            } else {
                chain.modify_code(old_hash, entry)?;
            }
        }
        tracker.add_ram(parsed.account, -old_size);
        return Ok([Input::Account(parsed.account)].into_iter().collect());
    }

    let new_code = Code::new(parsed.code);
    let new_hash = new_code.hash();
    if new_hash == old_hash {
        return Err(ExecutorError::AlreadyRunningThisVersion);
    }

    account.code_hash = new_hash;
    account.code_sequence = account.code_sequence.wrapping_add(1);
    chain.modify_account(account)?;

    let new_size = new_code.bytes.len() as i64;
    let new_entry = match chain.get_code(&new_hash)? {
        Some(mut e) => {
            e.ref_count += 1;
            e
        }
        None => CodeEntry { code: new_code, ref_count: 1 },
    };
    chain.modify_code(new_hash, new_entry)?;

    if let Some(mut entry) = old_entry {
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count == 0 {
            chain.remove_code(&old_hash)?;
        } else {
            chain.modify_code(old_hash, entry)?;
        }
    }

    tracker.add_ram(parsed.account, new_size - old_size);
    Ok([Input::Account(parsed.account)].into_iter().collect())
}

fn setabi(
    chain: &dyn Chain,
    authorized: &[pulsevm_types::PermissionLevel],
    data: &[u8],
    tracker: &ResourceTracker,
    _now: u32,
) -> Result<TxInputs, ExecutorError> {
    let parsed = SetAbiData::unmarshal_exact(data)
        .map_err(|e| ExecutorError::MalformedActionData { action: "setabi".into(), reason: e.to_string() })?;

    require_authority(authorized, parsed.account)?;

    let mut account = chain
        .get_account(parsed.account)?
        .ok_or_else(|| ExecutorError::AccountNotFound(parsed.account.to_string()))?;

    let old_len = account.abi.len() as i64;
    let new_len = parsed.abi.len() as i64;

    account.abi = parsed.abi;
    account.abi_sequence = account.abi_sequence.wrapping_add(1);
    chain.modify_account(account)?;

    tracker.add_ram(parsed.account, new_len - old_len);
    Ok([Input::Account(parsed.account)].into_iter().collect())
}

type NativeHandler = fn(&dyn Chain, &[pulsevm_types::PermissionLevel], &[u8], &ResourceTracker, u32) -> Result<TxInputs, ExecutorError>;

/// The registry of native system-contract action handlers, built once and
/// treated as immutable thereafter: the only process-wide state this crate
/// carries (per the spec's "Global state" design note).
static NATIVE_HANDLERS: Lazy<HashMap<Name, NativeHandler>> = Lazy::new(|| {
    let mut m: HashMap<Name, NativeHandler> = HashMap::new();
    m.insert(Name::from_str_lossy("newaccount"), newaccount as NativeHandler);
    m.insert(Name::from_str_lossy("setcode"), setcode as NativeHandler);
    m.insert(Name::from_str_lossy("setabi"), setabi as NativeHandler);
    m
});

pub fn native_handler(action_name: Name) -> Option<NativeHandler> {
    NATIVE_HANDLERS.get(&action_name).copied()
}
