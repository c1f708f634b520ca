use std::collections::HashMap;

use super::engine::{grand_total, project_account};
use super::types::{AccountId, AccountSnapshot, BookProjection};
use crate::error::InputError;

/// Ordered collection of accounts keyed by stable ids.
///
/// Ids come from a counter that only moves forward, so removing an account
/// never changes the id of any other one.
#[derive(Debug, Clone)]
pub struct AccountBook {
    next_id: u64,
    order: Vec<AccountId>,
    accounts: HashMap<AccountId, AccountSnapshot>,
}

impl Default for AccountBook {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountBook {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            order: Vec::new(),
            accounts: HashMap::new(),
        }
    }

    pub fn insert(&mut self, snapshot: AccountSnapshot) -> AccountId {
        let mut candidate = self.next_id;
        while self.accounts.contains_key(&AccountId(candidate)) {
            candidate = candidate.wrapping_add(1);
        }
        let id = AccountId(candidate);
        self.next_id = candidate.wrapping_add(1);
        self.order.push(id);
        self.accounts.insert(id, snapshot);
        id
    }

    /// Adds an account under an id chosen elsewhere (the browser keeps its own
    /// counter).
    pub fn insert_with_id(
        &mut self,
        id: AccountId,
        snapshot: AccountSnapshot,
    ) -> Result<(), InputError> {
        if self.accounts.contains_key(&id) {
            return Err(InputError::DuplicateAccount(id));
        }
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.order.push(id);
        self.accounts.insert(id, snapshot);
        Ok(())
    }

    pub fn remove(&mut self, id: AccountId) -> Option<AccountSnapshot> {
        let removed = self.accounts.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(removed)
    }

    pub fn update(&mut self, id: AccountId, snapshot: AccountSnapshot) -> bool {
        match self.accounts.get_mut(&id) {
            Some(existing) => {
                *existing = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: AccountId) -> Option<&AccountSnapshot> {
        self.accounts.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AccountId, &AccountSnapshot)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.accounts.get(id).map(|snapshot| (*id, snapshot)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn project(&self, goal_limit: Option<u32>) -> BookProjection {
        BookProjection {
            accounts: self
                .iter()
                .map(|(id, snapshot)| (id, project_account(snapshot, goal_limit)))
                .collect(),
            total: grand_total(self.iter().map(|(_, snapshot)| snapshot)),
        }
    }
}
