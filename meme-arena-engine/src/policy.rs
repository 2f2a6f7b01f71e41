//! Authorization policies for deleting memes and for maintenance operations.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use meme_arena_shared::types::{Meme, UserId};

use crate::{ArenaError, Caller};

/// Decides whether a caller may delete a meme.
pub trait DeletePolicy: Send + Sync {
    fn authorize(&self, caller: &Caller, meme: &Meme) -> Result<(), ArenaError>;
}

/// Any identified caller may delete any meme.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenDeletePolicy;

impl DeletePolicy for OpenDeletePolicy {
    fn authorize(&self, _caller: &Caller, _meme: &Meme) -> Result<(), ArenaError> {
        Ok(())
    }
}

/// Only the meme's owner may delete it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnlyDeletePolicy;

impl DeletePolicy for OwnerOnlyDeletePolicy {
    fn authorize(&self, caller: &Caller, meme: &Meme) -> Result<(), ArenaError> {
        if caller.user_id == meme.owner_id {
            Ok(())
        } else {
            Err(ArenaError::forbidden("only the owner can delete this meme"))
        }
    }
}

/// Configurable choice of delete policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicyKind {
    #[default]
    Open,
    OwnerOnly,
}

impl DeletePolicyKind {
    pub fn build(self) -> Arc<dyn DeletePolicy> {
        match self {
            DeletePolicyKind::Open => Arc::new(OpenDeletePolicy),
            DeletePolicyKind::OwnerOnly => Arc::new(OwnerOnlyDeletePolicy),
        }
    }
}

impl FromStr for DeletePolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(DeletePolicyKind::Open),
            "owner" | "owner-only" => Ok(DeletePolicyKind::OwnerOnly),
            other => Err(format!("unknown delete policy '{other}', expected 'open' or 'owner'")),
        }
    }
}

impl fmt::Display for DeletePolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicyKind::Open => f.write_str("open"),
            DeletePolicyKind::OwnerOnly => f.write_str("owner"),
        }
    }
}

/// Decides whether a caller may run maintenance operations such as
/// recomputing the item of the day or reconciling counters.
pub trait AdminPolicy: Send + Sync {
    fn authorize(&self, caller: &Caller) -> Result<(), ArenaError>;
}

/// Any identified caller is an administrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifiedAdminPolicy;

impl AdminPolicy for IdentifiedAdminPolicy {
    fn authorize(&self, _caller: &Caller) -> Result<(), ArenaError> {
        Ok(())
    }
}

/// Only the listed user ids are administrators.
#[derive(Debug, Clone, Default)]
pub struct AllowListAdminPolicy {
    admins: HashSet<UserId>,
}

impl AllowListAdminPolicy {
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

impl AdminPolicy for AllowListAdminPolicy {
    fn authorize(&self, caller: &Caller) -> Result<(), ArenaError> {
        if self.admins.contains(&caller.user_id) {
            Ok(())
        } else {
            Err(ArenaError::forbidden("maintenance is restricted to administrators"))
        }
    }
}

/// An allow-list policy for a non-empty list, otherwise any identified caller.
pub fn admin_policy_for(admins: &[UserId]) -> Arc<dyn AdminPolicy> {
    if admins.is_empty() {
        Arc::new(IdentifiedAdminPolicy)
    } else {
        Arc::new(AllowListAdminPolicy::new(admins.iter().cloned()))
    }
}
