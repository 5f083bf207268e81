//! `bodega-ledger` — the shop aggregate and its command/event model.

pub mod shop;
pub mod totals;

pub use shop::{
    AddProduct, AttemptDestroy, CreditPaymentReceived, CustomerRegistered, DestroyAttempted,
    PayCredit, PaymentMethod, ProductWritten, PurchaseCompleted, PurchaseOnCredit, PurchaseProduct,
    RegisterCustomer, Shop, ShopCommand, ShopDestroyed, ShopEvent,
};
pub use totals::ShopTotals;
