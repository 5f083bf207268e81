//! The shop aggregate: one owner, a catalog, a customer ledger.
//!
//! All business decisions happen in [`Shop::handle`], which is pure and
//! returns events; all arithmetic happens in [`Shop::apply`]. The runtime
//! applies events only after the payment step has gone through, so an
//! operation either commits in full or leaves no trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bodega_access::{OwnerGate, TeardownGuard};
use bodega_catalog::{Catalog, Product, effective_price};
use bodega_core::{
    Aggregate, AggregateRoot, CallerId, ExternalId, LedgerError, LedgerResult, ShopId, UnitScale,
};
use bodega_customers::{Customer, CustomerRegistry};
use bodega_events::Event;

use crate::totals::ShopTotals;

/// How a purchase was settled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Credit => "CREDIT",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root: a single-owner retail shop.
#[derive(Debug, Clone)]
pub struct Shop {
    id: ShopId,
    access: OwnerGate,
    lifecycle: TeardownGuard,
    unit_scale: UnitScale,
    catalog: Catalog,
    customers: CustomerRegistry,
    totals: ShopTotals,
    version: u64,
}

impl Shop {
    /// Open a shop owned by `owner`. Ownership never moves afterwards.
    pub fn open(id: ShopId, owner: CallerId, unit_scale: UnitScale) -> Self {
        Self {
            id,
            access: OwnerGate::new(owner),
            lifecycle: TeardownGuard::new(),
            unit_scale,
            catalog: Catalog::new(),
            customers: CustomerRegistry::new(),
            totals: ShopTotals::new(),
            version: 0,
        }
    }

    pub fn owner(&self) -> CallerId {
        self.access.owner()
    }

    pub fn unit_scale(&self) -> UnitScale {
        self.unit_scale
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn customers(&self) -> &CustomerRegistry {
        &self.customers
    }

    pub fn totals(&self) -> &ShopTotals {
        &self.totals
    }

    pub fn destroy_attempts(&self) -> u32 {
        self.lifecycle.attempts()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.is_destroyed()
    }

    pub fn ensure_alive(&self) -> LedgerResult<()> {
        self.lifecycle.ensure_alive()
    }

    pub fn ensure_owner(&self, caller: CallerId) -> LedgerResult<()> {
        self.access.ensure(caller)
    }

    pub fn ensure_registered(&self, caller: CallerId) -> LedgerResult<()> {
        self.customers.ensure_registered(caller)
    }

    /// Effective price of `name` for `caller`, before any availability check.
    pub fn effective_price_for(&self, caller: CallerId, name: &str) -> LedgerResult<u64> {
        self.catalog
            .price_for(name, self.customers.total_spent_of(caller))
            .ok_or_else(|| LedgerError::not_found(name))
    }
}

impl AggregateRoot for Shop {
    type Id = ShopId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ── Commands ────────────────────────────────────────────────────────────

/// Command: list or relist a product. Owner only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddProduct {
    pub caller: CallerId,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub stock: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: register the caller as a customer under an external id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCustomer {
    pub caller: CallerId,
    pub external_id: ExternalId,
    pub name: String,
    pub country: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: buy one unit, paying the exact effective price up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseProduct {
    pub caller: CallerId,
    pub product: String,
    /// Minor units tendered with the call.
    pub tendered: u128,
    pub occurred_at: DateTime<Utc>,
}

/// Command: buy one unit on credit. No payment changes hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOnCredit {
    pub caller: CallerId,
    pub product: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: settle the caller's debt in full, to the minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayCredit {
    pub caller: CallerId,
    /// Minor units tendered with the call.
    pub tendered: u128,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ask for the shop to be torn down. Owner only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptDestroy {
    pub caller: CallerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopCommand {
    AddProduct(AddProduct),
    RegisterCustomer(RegisterCustomer),
    Purchase(PurchaseProduct),
    PurchaseOnCredit(PurchaseOnCredit),
    PayCredit(PayCredit),
    AttemptDestroy(AttemptDestroy),
}

impl ShopCommand {
    /// Caller identity attached to the command.
    pub fn caller(&self) -> CallerId {
        match self {
            ShopCommand::AddProduct(c) => c.caller,
            ShopCommand::RegisterCustomer(c) => c.caller,
            ShopCommand::Purchase(c) => c.caller,
            ShopCommand::PurchaseOnCredit(c) => c.caller,
            ShopCommand::PayCredit(c) => c.caller,
            ShopCommand::AttemptDestroy(c) => c.caller,
        }
    }

    /// Minor units the caller tenders with this command, if any.
    pub fn tendered(&self) -> Option<u128> {
        match self {
            ShopCommand::Purchase(c) => Some(c.tendered),
            ShopCommand::PayCredit(c) => Some(c.tendered),
            _ => None,
        }
    }
}

// ── Events ──────────────────────────────────────────────────────────────

/// Event: the catalog entry at `name` was written. Internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductWritten {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub stock: u64,
    pub replaced: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a customer record was written for `caller`. Internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistered {
    pub caller: CallerId,
    pub external_id: ExternalId,
    pub name: String,
    pub country: String,
    pub replaced: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: one unit was sold, cash or credit. Published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCompleted {
    pub buyer: CallerId,
    pub method: PaymentMethod,
    pub product: String,
    /// Effective price actually charged, in whole units.
    pub price: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the buyer's outstanding credit was settled in full. Published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPaymentReceived {
    pub buyer: CallerId,
    /// Debt settled, in whole units.
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a destroy attempt short of the threshold. Internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyAttempted {
    pub caller: CallerId,
    pub attempt: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the shop was torn down for good. Published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopDestroyed {
    pub owner: CallerId,
    pub attempts: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopEvent {
    ProductWritten(ProductWritten),
    CustomerRegistered(CustomerRegistered),
    Purchase(PurchaseCompleted),
    CreditPayment(CreditPaymentReceived),
    DestroyAttempted(DestroyAttempted),
    Destroyed(ShopDestroyed),
}

impl ShopEvent {
    /// Whether this event belongs to the shop's public notification stream.
    ///
    /// Catalog writes, registrations and destroy warnings stay internal.
    pub fn is_published(&self) -> bool {
        matches!(
            self,
            ShopEvent::Purchase(_) | ShopEvent::CreditPayment(_) | ShopEvent::Destroyed(_)
        )
    }
}

impl Event for ShopEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShopEvent::ProductWritten(_) => "shop.product.written",
            ShopEvent::CustomerRegistered(_) => "shop.customer.registered",
            ShopEvent::Purchase(_) => "shop.purchase.completed",
            ShopEvent::CreditPayment(_) => "shop.credit.paid",
            ShopEvent::DestroyAttempted(_) => "shop.destroy.attempted",
            ShopEvent::Destroyed(_) => "shop.destroyed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ShopEvent::ProductWritten(e) => e.occurred_at,
            ShopEvent::CustomerRegistered(e) => e.occurred_at,
            ShopEvent::Purchase(e) => e.occurred_at,
            ShopEvent::CreditPayment(e) => e.occurred_at,
            ShopEvent::DestroyAttempted(e) => e.occurred_at,
            ShopEvent::Destroyed(e) => e.occurred_at,
        }
    }
}

// ── Execution ───────────────────────────────────────────────────────────

impl Aggregate for Shop {
    type Command = ShopCommand;
    type Event = ShopEvent;
    type Error = LedgerError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ShopEvent::ProductWritten(e) => {
                self.catalog.upsert(Product {
                    name: e.name.clone(),
                    description: e.description.clone(),
                    price: e.price,
                    stock: e.stock,
                });
            }
            ShopEvent::CustomerRegistered(e) => {
                self.customers.insert(
                    e.caller,
                    Customer {
                        external_id: e.external_id,
                        name: e.name.clone(),
                        country: e.country.clone(),
                        ..Customer::default()
                    },
                );
            }
            ShopEvent::Purchase(e) => {
                match e.method {
                    PaymentMethod::Cash => {
                        let country = self.customers.country_of(e.buyer).to_string();
                        self.customers.add_spend(e.buyer, e.price);
                        self.totals.record_sale(e.price, &country);
                    }
                    PaymentMethod::Credit => {
                        self.customers.add_debt(e.buyer, e.price);
                        self.totals.record_credit(e.price);
                    }
                }
                self.catalog.take_one(&e.product);
            }
            ShopEvent::CreditPayment(e) => {
                let country = self.customers.country_of(e.buyer).to_string();
                self.customers.settle_debt(e.buyer, e.amount);
                self.totals.settle_credit(e.amount, &country);
            }
            ShopEvent::DestroyAttempted(_) => {
                self.lifecycle.record_attempt();
            }
            ShopEvent::Destroyed(_) => {
                self.lifecycle.record_destroyed();
            }
        }
        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.lifecycle.ensure_alive()?;

        match command {
            ShopCommand::AddProduct(cmd) => self.handle_add_product(cmd),
            ShopCommand::RegisterCustomer(cmd) => self.handle_register(cmd),
            ShopCommand::Purchase(cmd) => self.handle_purchase(cmd),
            ShopCommand::PurchaseOnCredit(cmd) => self.handle_credit_purchase(cmd),
            ShopCommand::PayCredit(cmd) => self.handle_pay_credit(cmd),
            ShopCommand::AttemptDestroy(cmd) => self.handle_attempt_destroy(cmd),
        }
    }
}

impl Shop {
    fn handle_add_product(&self, cmd: &AddProduct) -> LedgerResult<Vec<ShopEvent>> {
        self.access.ensure(cmd.caller)?;

        Ok(vec![ShopEvent::ProductWritten(ProductWritten {
            name: cmd.name.clone(),
            description: cmd.description.clone(),
            price: cmd.price,
            stock: cmd.stock,
            replaced: self.catalog.contains(&cmd.name),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_register(&self, cmd: &RegisterCustomer) -> LedgerResult<Vec<ShopEvent>> {
        self.customers.ensure_id_free(cmd.external_id)?;

        Ok(vec![ShopEvent::CustomerRegistered(CustomerRegistered {
            caller: cmd.caller,
            external_id: cmd.external_id,
            name: cmd.name.clone(),
            country: cmd.country.clone(),
            replaced: self.customers.is_known(cmd.caller),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_purchase(&self, cmd: &PurchaseProduct) -> LedgerResult<Vec<ShopEvent>> {
        self.customers.ensure_registered(cmd.caller)?;
        self.customers.ensure_clear_of_debt(cmd.caller)?;
        let product = self.catalog.ensure_available(&cmd.product)?;

        let price = effective_price(product.price, self.customers.total_spent_of(cmd.caller));
        let expected = self.unit_scale.minor_value(price);
        if cmd.tendered != expected {
            return Err(LedgerError::wrong_payment(expected, cmd.tendered));
        }

        Ok(vec![ShopEvent::Purchase(PurchaseCompleted {
            buyer: cmd.caller,
            method: PaymentMethod::Cash,
            product: cmd.product.clone(),
            price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_credit_purchase(&self, cmd: &PurchaseOnCredit) -> LedgerResult<Vec<ShopEvent>> {
        self.customers.ensure_registered(cmd.caller)?;
        self.customers.ensure_clear_of_debt(cmd.caller)?;
        let product = self.catalog.ensure_available(&cmd.product)?;

        let price = effective_price(product.price, self.customers.total_spent_of(cmd.caller));

        Ok(vec![ShopEvent::Purchase(PurchaseCompleted {
            buyer: cmd.caller,
            method: PaymentMethod::Credit,
            product: cmd.product.clone(),
            price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_pay_credit(&self, cmd: &PayCredit) -> LedgerResult<Vec<ShopEvent>> {
        self.customers.ensure_registered(cmd.caller)?;

        // A zero debt is settled by an exact-zero tender, nothing else.
        let debt = self.customers.debt_of(cmd.caller);
        let expected = self.unit_scale.minor_value(debt);
        if cmd.tendered != expected {
            return Err(LedgerError::wrong_payment(expected, cmd.tendered));
        }

        Ok(vec![ShopEvent::CreditPayment(CreditPaymentReceived {
            buyer: cmd.caller,
            amount: debt,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_attempt_destroy(&self, cmd: &AttemptDestroy) -> LedgerResult<Vec<ShopEvent>> {
        self.access.ensure(cmd.caller)?;

        if self.lifecycle.next_attempt_destroys() {
            Ok(vec![ShopEvent::Destroyed(ShopDestroyed {
                owner: self.access.owner(),
                attempts: self.lifecycle.next_attempt(),
                occurred_at: cmd.occurred_at,
            })])
        } else {
            Ok(vec![ShopEvent::DestroyAttempted(DestroyAttempted {
                caller: cmd.caller,
                attempt: self.lifecycle.next_attempt(),
                occurred_at: cmd.occurred_at,
            })])
        }
    }
}
