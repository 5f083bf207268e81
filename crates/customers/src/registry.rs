//! Customer records and the caller-keyed registry.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use bodega_core::{CallerId, ExternalId, LedgerError, LedgerResult};

/// A customer record.
///
/// `Default` is the zero-valued record (external id 0, empty strings, no
/// spend, no debt); registry reads fall back to it for unknown callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub external_id: ExternalId,
    pub name: String,
    pub country: String,
    /// Lifetime spend in whole units, settled credit included.
    pub total_spent: u64,
    /// Outstanding credit in whole units.
    pub debt: u64,
}

/// Outcome of a registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Registration {
    Created,
    /// The caller already had a record; their history starts over.
    Replaced,
}

/// The customer registry.
///
/// Records are keyed by caller identity; duplicate checks are keyed by the
/// customer-chosen external id. Claimed external ids are never released, not
/// even when the caller that claimed one re-registers under a fresh id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistry {
    customers: HashMap<CallerId, Customer>,
    claimed_ids: HashSet<ExternalId>,
}

impl CustomerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, caller: CallerId) -> Option<&Customer> {
        self.customers.get(&caller)
    }

    /// Whether the caller has a record of their own.
    pub fn is_known(&self, caller: CallerId) -> bool {
        self.customers.contains_key(&caller)
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CallerId, &Customer)> {
        self.customers.iter()
    }

    /// The caller's stored external id; unknown callers resolve to id 0.
    pub fn external_id_of(&self, caller: CallerId) -> ExternalId {
        self.customers
            .get(&caller)
            .map(|c| c.external_id)
            .unwrap_or_default()
    }

    /// Whether `caller` passes the registered-customer gate.
    ///
    /// The gate resolves the caller's stored external id and tests whether
    /// that id has ever been claimed. Unknown callers resolve to id 0, so
    /// once some registration claims id 0 every unknown caller passes the
    /// gate too. Callers relying on stricter identity must avoid id 0.
    pub fn is_registered(&self, caller: CallerId) -> bool {
        self.claimed_ids.contains(&self.external_id_of(caller))
    }

    pub fn ensure_registered(&self, caller: CallerId) -> LedgerResult<()> {
        if self.is_registered(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotRegistered)
        }
    }

    pub fn ensure_id_free(&self, external_id: ExternalId) -> LedgerResult<()> {
        if self.claimed_ids.contains(&external_id) {
            Err(LedgerError::DuplicateId(external_id))
        } else {
            Ok(())
        }
    }

    pub fn debt_of(&self, caller: CallerId) -> u64 {
        self.customers.get(&caller).map(|c| c.debt).unwrap_or(0)
    }

    pub fn total_spent_of(&self, caller: CallerId) -> u64 {
        self.customers
            .get(&caller)
            .map(|c| c.total_spent)
            .unwrap_or(0)
    }

    pub fn country_of(&self, caller: CallerId) -> &str {
        self.customers
            .get(&caller)
            .map(|c| c.country.as_str())
            .unwrap_or("")
    }

    pub fn ensure_clear_of_debt(&self, caller: CallerId) -> LedgerResult<()> {
        if self.debt_of(caller) > 0 {
            Err(LedgerError::OutstandingDebt)
        } else {
            Ok(())
        }
    }

    /// Write the caller's record and claim its external id.
    ///
    /// An existing record is replaced wholesale: spend and debt start over.
    /// Callers run [`ensure_id_free`](Self::ensure_id_free) first; this write
    /// itself is unconditional.
    pub fn insert(&mut self, caller: CallerId, customer: Customer) -> Registration {
        self.claimed_ids.insert(customer.external_id);
        match self.customers.insert(caller, customer) {
            Some(_) => Registration::Replaced,
            None => Registration::Created,
        }
    }

    /// Add settled spend to the caller's record, creating it if absent.
    pub fn add_spend(&mut self, caller: CallerId, amount: u64) {
        let customer = self.customers.entry(caller).or_default();
        customer.total_spent = customer.total_spent.saturating_add(amount);
    }

    /// Add outstanding credit to the caller's record, creating it if absent.
    pub fn add_debt(&mut self, caller: CallerId, amount: u64) {
        let customer = self.customers.entry(caller).or_default();
        customer.debt = customer.debt.saturating_add(amount);
    }

    /// Move `amount` of settled credit out of debt and into lifetime spend.
    pub fn settle_debt(&mut self, caller: CallerId, amount: u64) {
        let customer = self.customers.entry(caller).or_default();
        customer.debt = customer.debt.saturating_sub(amount);
        customer.total_spent = customer.total_spent.saturating_add(amount);
    }
}
