//! Single-writer runtime around the shop aggregate.
//!
//! Every mutating call runs the same pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. Acquire the global write lock (one writer at a time)
//!   ↓
//! 2. handle(): validation only, no mutation
//!   ↓
//! 3. Clear the money with the environment (tender / residual sweep)
//!   ↓
//! 4. apply() each event
//!   ↓
//! 5. Append published events to the notification log
//! ```
//!
//! Steps 1-3 touch no shop state and steps 4-5 cannot fail domain-wise, so a
//! failure anywhere aborts the whole operation and observers never see a
//! half-applied one. The money always moves before the books do.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use chrono::Utc;

use bodega_catalog::{CatalogWrite, Product};
use bodega_core::{Aggregate, AggregateRoot, CallerId, ExternalId, LedgerError, ShopId, UnitScale};
use bodega_customers::Registration;
use bodega_events::{NotificationLog, Subscription};
use bodega_ledger::{
    AddProduct, AttemptDestroy, PayCredit, PurchaseOnCredit, PurchaseProduct, RegisterCustomer,
    Shop, ShopCommand, ShopEvent,
};

use crate::error::{StoreError, StoreResult};
use crate::transfer::{RecordingTransfer, ValueTransfer};

/// Outcome of a destroy attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The attempt was counted; the shop stays up.
    Deferred { attempt: u32 },
    /// The shop is gone for good.
    Destroyed,
}

/// The shop runtime: one aggregate behind one write lock.
///
/// `ShopStore` owns the global write lock the ledger requires, forwards money
/// to the owner through the injected [`ValueTransfer`], and keeps the public
/// notification history. Queries take the read side of the lock and enforce
/// the caller gates.
#[derive(Debug)]
pub struct ShopStore<T> {
    shop: RwLock<Shop>,
    notifications: NotificationLog<ShopEvent>,
    transfer: T,
}

impl ShopStore<RecordingTransfer> {
    /// Open a shop wired to an in-memory transfer ledger.
    pub fn in_memory(owner: CallerId, unit_scale: UnitScale) -> Self {
        Self::open(owner, unit_scale, RecordingTransfer::new())
    }
}

impl<T: ValueTransfer> ShopStore<T> {
    /// Open a shop owned by `owner` and wire it to the environment.
    pub fn open(owner: CallerId, unit_scale: UnitScale, transfer: T) -> Self {
        let shop = Shop::open(ShopId::new(), owner, unit_scale);
        tracing::info!(shop_id = %shop.id(), owner = %owner, "shop opened");

        Self {
            shop: RwLock::new(shop),
            notifications: NotificationLog::new(),
            transfer,
        }
    }

    /// The transfer collaborator, mostly for inspection in tests and tools.
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// List or relist a product. Owner only; a relist clobbers the old entry.
    pub fn add_product(
        &self,
        caller: CallerId,
        name: &str,
        description: &str,
        price: u64,
        stock: u64,
    ) -> StoreResult<CatalogWrite> {
        let events = self.submit(ShopCommand::AddProduct(AddProduct {
            caller,
            name: name.to_string(),
            description: description.to_string(),
            price,
            stock,
            occurred_at: Utc::now(),
        }))?;

        Ok(events
            .iter()
            .find_map(|e| match e {
                ShopEvent::ProductWritten(w) if w.replaced => Some(CatalogWrite::Replaced),
                ShopEvent::ProductWritten(_) => Some(CatalogWrite::Created),
                _ => None,
            })
            .unwrap_or(CatalogWrite::Created))
    }

    /// Register the caller under `external_id`. A caller registering again
    /// with a fresh id starts their history over.
    pub fn register_customer(
        &self,
        caller: CallerId,
        external_id: ExternalId,
        name: &str,
        country: &str,
    ) -> StoreResult<Registration> {
        let events = self.submit(ShopCommand::RegisterCustomer(RegisterCustomer {
            caller,
            external_id,
            name: name.to_string(),
            country: country.to_string(),
            occurred_at: Utc::now(),
        }))?;

        Ok(events
            .iter()
            .find_map(|e| match e {
                ShopEvent::CustomerRegistered(r) if r.replaced => Some(Registration::Replaced),
                ShopEvent::CustomerRegistered(_) => Some(Registration::Created),
                _ => None,
            })
            .unwrap_or(Registration::Created))
    }

    /// Buy one unit for cash, tendering the exact effective price in minor
    /// units. Returns the whole-unit price charged.
    pub fn purchase(&self, caller: CallerId, product: &str, tendered: u128) -> StoreResult<u64> {
        let events = self.submit(ShopCommand::Purchase(PurchaseProduct {
            caller,
            product: product.to_string(),
            tendered,
            occurred_at: Utc::now(),
        }))?;

        Ok(events
            .iter()
            .find_map(|e| match e {
                ShopEvent::Purchase(p) => Some(p.price),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Buy one unit on credit. Returns the whole-unit price booked as debt.
    pub fn purchase_on_credit(&self, caller: CallerId, product: &str) -> StoreResult<u64> {
        let events = self.submit(ShopCommand::PurchaseOnCredit(PurchaseOnCredit {
            caller,
            product: product.to_string(),
            occurred_at: Utc::now(),
        }))?;

        Ok(events
            .iter()
            .find_map(|e| match e {
                ShopEvent::Purchase(p) => Some(p.price),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Settle the caller's debt in full, tendering its exact minor-unit
    /// value. Returns the whole-unit amount settled.
    pub fn pay_credit(&self, caller: CallerId, tendered: u128) -> StoreResult<u64> {
        let events = self.submit(ShopCommand::PayCredit(PayCredit {
            caller,
            tendered,
            occurred_at: Utc::now(),
        }))?;

        Ok(events
            .iter()
            .find_map(|e| match e {
                ShopEvent::CreditPayment(p) => Some(p.amount),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Ask for the shop to be torn down. Owner only. The first two attempts
    /// are counted and nothing more; the third releases residual funds to the
    /// owner and retires the shop for good.
    pub fn attempt_destroy(&self, caller: CallerId) -> StoreResult<DestroyOutcome> {
        let events = self.submit(ShopCommand::AttemptDestroy(AttemptDestroy {
            caller,
            occurred_at: Utc::now(),
        }))?;

        Ok(events
            .iter()
            .find_map(|e| match e {
                ShopEvent::Destroyed(_) => Some(DestroyOutcome::Destroyed),
                ShopEvent::DestroyAttempted(a) => {
                    Some(DestroyOutcome::Deferred { attempt: a.attempt })
                }
                _ => None,
            })
            .unwrap_or(DestroyOutcome::Deferred { attempt: 0 }))
    }

    fn submit(&self, command: ShopCommand) -> StoreResult<Vec<ShopEvent>> {
        // 1) Serialize writers behind the global lock.
        let mut shop = self.shop.write().map_err(|_| StoreError::Poisoned)?;

        // 2) Decide. Validation only; shop state is untouched on failure.
        let events = shop.handle(&command)?;

        // 3) Money first: the tendered value forwards to the owner, and the
        //    destroying attempt sweeps residual funds. A rejection aborts
        //    with nothing applied.
        if let Some(tendered) = command.tendered() {
            self.transfer.transfer_to(shop.owner(), tendered)?;
        }
        if events.iter().any(|e| matches!(e, ShopEvent::Destroyed(_))) {
            self.transfer.release_residual(shop.owner())?;
        }

        // 4) Commit.
        for event in &events {
            shop.apply(event);
        }

        // 5) Publish while still holding the lock, so notification order
        //    matches commit order.
        for event in events.iter().filter(|e| e.is_published()) {
            if let ShopEvent::Purchase(p) = event {
                tracing::info!(
                    buyer = %p.buyer,
                    method = %p.method,
                    product = %p.product,
                    price = p.price,
                    "sale settled"
                );
            }
            self.notifications
                .append(event.clone())
                .map_err(|_| StoreError::Poisoned)?;
        }

        if shop.is_destroyed() {
            tracing::warn!(shop_id = %shop.id(), "shop torn down, residual funds released");
        }
        tracing::debug!(caller = %command.caller(), events = events.len(), "command committed");

        Ok(events)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Shop>> {
        self.shop.read().map_err(|_| StoreError::Poisoned)
    }

    /// Total settled sales in whole units. Owner only.
    pub fn total_purchases(&self, caller: CallerId) -> StoreResult<u64> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        shop.ensure_owner(caller)?;
        Ok(shop.totals().total_purchases())
    }

    /// Total outstanding credit in whole units. Owner only.
    pub fn total_debts(&self, caller: CallerId) -> StoreResult<u64> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        shop.ensure_owner(caller)?;
        Ok(shop.totals().total_debts())
    }

    /// Settled sales per country. Owner only.
    pub fn purchases_by_country(&self, caller: CallerId) -> StoreResult<HashMap<String, u64>> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        shop.ensure_owner(caller)?;
        Ok(shop.totals().by_country().clone())
    }

    /// Settled sales for one country (zero if none). Owner only.
    pub fn purchases_for_country(&self, caller: CallerId, country: &str) -> StoreResult<u64> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        shop.ensure_owner(caller)?;
        Ok(shop.totals().for_country(country))
    }

    /// The caller's own outstanding debt.
    pub fn my_debt(&self, caller: CallerId) -> StoreResult<u64> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        shop.ensure_registered(caller)?;
        Ok(shop.customers().debt_of(caller))
    }

    /// The caller's own lifetime spend.
    pub fn my_total_spent(&self, caller: CallerId) -> StoreResult<u64> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        shop.ensure_registered(caller)?;
        Ok(shop.customers().total_spent_of(caller))
    }

    /// Catalog entry by name. Registered customers only.
    pub fn product(&self, caller: CallerId, name: &str) -> StoreResult<Product> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        shop.ensure_registered(caller)?;
        let product = shop
            .catalog()
            .get(name)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(name))?;
        Ok(product)
    }

    /// Effective price of `name` for the caller. Registered customers only.
    pub fn effective_price(&self, caller: CallerId, name: &str) -> StoreResult<u64> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        shop.ensure_registered(caller)?;
        Ok(shop.effective_price_for(caller, name)?)
    }

    /// The shop owner's identity.
    pub fn owner(&self) -> StoreResult<CallerId> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        Ok(shop.owner())
    }

    /// Minor units per whole unit, as configured at open.
    pub fn unit_scale(&self) -> StoreResult<UnitScale> {
        Ok(self.read()?.unit_scale())
    }

    /// Destroy attempts recorded so far. Readable while the shop is up.
    pub fn destroy_attempts(&self) -> StoreResult<u32> {
        let shop = self.read()?;
        shop.ensure_alive()?;
        Ok(shop.destroy_attempts())
    }

    /// Whether the shop has been torn down. Readable at any time.
    pub fn is_destroyed(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_destroyed())
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// The published notification history, oldest first.
    pub fn notifications(&self) -> Vec<ShopEvent> {
        self.notifications.all()
    }

    /// Subscribe to notifications appended from now on.
    pub fn subscribe(&self) -> Subscription<ShopEvent> {
        self.notifications.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{Payment, TransferError};

    /// Environment that refuses every transfer.
    struct RejectingTransfer;

    impl ValueTransfer for RejectingTransfer {
        fn transfer_to(&self, _recipient: CallerId, _amount: u128) -> Result<(), TransferError> {
            Err(TransferError::Rejected("no funds accepted".to_string()))
        }

        fn release_residual(&self, _recipient: CallerId) -> Result<(), TransferError> {
            Err(TransferError::Rejected("no funds accepted".to_string()))
        }
    }

    /// Environment that clears payments but refuses the teardown sweep.
    struct NoSweep;

    impl ValueTransfer for NoSweep {
        fn transfer_to(&self, _recipient: CallerId, _amount: u128) -> Result<(), TransferError> {
            Ok(())
        }

        fn release_residual(&self, _recipient: CallerId) -> Result<(), TransferError> {
            Err(TransferError::Rejected("sweep refused".to_string()))
        }
    }

    fn stocked_store() -> (ShopStore<RecordingTransfer>, CallerId, CallerId) {
        let owner = CallerId::new();
        let ana = CallerId::new();
        let store = ShopStore::in_memory(owner, UnitScale::WHOLE);
        store.add_product(owner, "Widget", "A widget", 10, 5).unwrap();
        store
            .register_customer(ana, ExternalId::new(1), "Ana", "CO")
            .unwrap();
        (store, owner, ana)
    }

    #[test]
    fn purchase_forwards_the_tender_to_the_owner() {
        let (store, owner, ana) = stocked_store();

        let price = store.purchase(ana, "Widget", 10).unwrap();

        assert_eq!(price, 10);
        assert_eq!(
            store.transfer().payments(),
            vec![Payment {
                recipient: owner,
                amount: 10,
            }]
        );
        assert_eq!(store.total_purchases(owner).unwrap(), 10);
    }

    #[test]
    fn a_rejected_transfer_commits_nothing() {
        let owner = CallerId::new();
        let ana = CallerId::new();
        let store = ShopStore::open(owner, UnitScale::WHOLE, RejectingTransfer);
        store.add_product(owner, "Widget", "A widget", 10, 5).unwrap();
        store
            .register_customer(ana, ExternalId::new(1), "Ana", "CO")
            .unwrap();

        let err = store.purchase(ana, "Widget", 10).unwrap_err();

        assert!(matches!(err, StoreError::Transfer(_)));
        assert_eq!(store.product(ana, "Widget").unwrap().stock, 5);
        assert_eq!(store.my_total_spent(ana).unwrap(), 0);
        assert_eq!(store.total_purchases(owner).unwrap(), 0);
        assert!(store.notifications().is_empty());
    }

    #[test]
    fn pay_credit_forwards_the_exact_debt_value() {
        let (store, owner, ana) = stocked_store();

        store.purchase_on_credit(ana, "Widget").unwrap();
        assert_eq!(store.my_debt(ana).unwrap(), 10);
        // The credit purchase itself moved no money.
        assert!(store.transfer().payments().is_empty());

        let settled = store.pay_credit(ana, 10).unwrap();
        assert_eq!(settled, 10);
        assert_eq!(store.transfer().total_to(owner), 10);
        assert_eq!(store.my_debt(ana).unwrap(), 0);
        assert_eq!(store.my_total_spent(ana).unwrap(), 10);
    }

    #[test]
    fn a_zero_debt_settlement_still_clears_a_zero_payment() {
        let (store, owner, ana) = stocked_store();

        let settled = store.pay_credit(ana, 0).unwrap();

        assert_eq!(settled, 0);
        assert_eq!(
            store.transfer().payments(),
            vec![Payment {
                recipient: owner,
                amount: 0,
            }]
        );
    }

    #[test]
    fn the_third_destroy_attempt_sweeps_residual_funds() {
        let (store, owner, _ana) = stocked_store();

        assert_eq!(
            store.attempt_destroy(owner).unwrap(),
            DestroyOutcome::Deferred { attempt: 1 }
        );
        assert_eq!(
            store.attempt_destroy(owner).unwrap(),
            DestroyOutcome::Deferred { attempt: 2 }
        );
        assert!(store.transfer().sweeps().is_empty());
        assert_eq!(store.destroy_attempts().unwrap(), 2);

        assert_eq!(
            store.attempt_destroy(owner).unwrap(),
            DestroyOutcome::Destroyed
        );
        assert_eq!(store.transfer().sweeps(), vec![owner]);
        assert!(store.is_destroyed().unwrap());
    }

    #[test]
    fn a_rejected_sweep_keeps_the_shop_alive() {
        let owner = CallerId::new();
        let store = ShopStore::open(owner, UnitScale::WHOLE, NoSweep);

        store.attempt_destroy(owner).unwrap();
        store.attempt_destroy(owner).unwrap();

        let err = store.attempt_destroy(owner).unwrap_err();
        assert!(matches!(err, StoreError::Transfer(_)));

        // The failed final attempt leaves no trace, not even on the counter.
        assert!(!store.is_destroyed().unwrap());
        assert_eq!(store.destroy_attempts().unwrap(), 2);
        assert!(store.add_product(owner, "Widget", "Still open", 1, 1).is_ok());
    }

    #[test]
    fn owner_queries_reject_everyone_else() {
        let (store, _owner, ana) = stocked_store();

        let unauthorized = StoreError::Ledger(LedgerError::Unauthorized);
        assert_eq!(store.total_purchases(ana).unwrap_err(), unauthorized);
        assert_eq!(store.total_debts(ana).unwrap_err(), unauthorized);
        assert_eq!(store.purchases_by_country(ana).unwrap_err(), unauthorized);
        assert_eq!(
            store.purchases_for_country(ana, "CO").unwrap_err(),
            unauthorized
        );
    }

    #[test]
    fn customer_queries_require_registration() {
        let (store, _owner, _ana) = stocked_store();
        let stranger = CallerId::new();

        let not_registered = StoreError::Ledger(LedgerError::NotRegistered);
        assert_eq!(store.my_debt(stranger).unwrap_err(), not_registered);
        assert_eq!(store.my_total_spent(stranger).unwrap_err(), not_registered);
        assert_eq!(
            store.product(stranger, "Widget").unwrap_err(),
            not_registered
        );
        assert_eq!(
            store.effective_price(stranger, "Widget").unwrap_err(),
            not_registered
        );
    }

    #[test]
    fn notifications_keep_commit_order_and_skip_internal_events() {
        let (store, _owner, ana) = stocked_store();

        store.purchase(ana, "Widget", 10).unwrap();
        store.purchase_on_credit(ana, "Widget").unwrap();
        store.pay_credit(ana, 10).unwrap();

        let history = store.notifications();
        assert_eq!(history.len(), 3);
        assert!(matches!(&history[0], ShopEvent::Purchase(p) if p.price == 10));
        assert!(matches!(&history[1], ShopEvent::Purchase(p) if p.price == 10));
        assert!(matches!(&history[2], ShopEvent::CreditPayment(p) if p.amount == 10));
    }

    #[test]
    fn subscribers_see_only_published_events() {
        let (store, owner, ana) = stocked_store();
        let sub = store.subscribe();

        // Internal-only operations must not reach subscribers.
        store.add_product(owner, "Gadget", "A gadget", 4, 2).unwrap();
        assert!(sub.try_recv().is_err());

        store.purchase(ana, "Widget", 10).unwrap();
        assert!(matches!(sub.try_recv().unwrap(), ShopEvent::Purchase(_)));
    }

    #[test]
    fn a_destroyed_store_rejects_operations_and_queries() {
        let (store, owner, ana) = stocked_store();
        for _ in 0..3 {
            store.attempt_destroy(owner).unwrap();
        }

        let destroyed = StoreError::Ledger(LedgerError::SystemDestroyed);
        assert_eq!(store.purchase(ana, "Widget", 10).unwrap_err(), destroyed);
        assert_eq!(store.total_purchases(owner).unwrap_err(), destroyed);
        assert_eq!(store.my_debt(ana).unwrap_err(), destroyed);
        assert_eq!(store.owner().unwrap_err(), destroyed);
        assert_eq!(store.destroy_attempts().unwrap_err(), destroyed);

        // The terminal flag itself stays readable.
        assert!(store.is_destroyed().unwrap());
        // So does the notification history.
        assert_eq!(store.notifications().len(), 1);
    }
}
