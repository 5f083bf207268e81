use bodega_core::{CallerId, ExternalId, LedgerError, UnitScale};
use bodega_ledger::ShopEvent;
use bodega_store::{DestroyOutcome, RecordingTransfer, ShopStore, StoreError};

fn open_shop(scale: UnitScale) -> (ShopStore<RecordingTransfer>, CallerId) {
    bodega_observability::init_with_default("warn");
    let owner = CallerId::new();
    (ShopStore::in_memory(owner, scale), owner)
}

#[test]
fn full_retail_day_against_one_shop() {
    let (store, owner) = open_shop(UnitScale::WHOLE);
    let ana = CallerId::new();
    let bea = CallerId::new();

    // Stock the shelves
    store
        .add_product(owner, "Widget", "Sturdy widget", 10, 5)
        .unwrap();
    store
        .add_product(owner, "Candy", "Penny candy", 2, 30)
        .unwrap();

    // Walk-in customers
    store
        .register_customer(ana, ExternalId::new(7), "Ana", "CO")
        .unwrap();
    store
        .register_customer(bea, ExternalId::new(8), "Bea", "MX")
        .unwrap();
    let err = store
        .register_customer(CallerId::new(), ExternalId::new(7), "Cai", "AR")
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Ledger(LedgerError::DuplicateId(ExternalId::new(7)))
    );

    // Ana pays cash, Bea takes credit
    assert_eq!(store.purchase(ana, "Widget", 10).unwrap(), 10);
    assert_eq!(store.purchase_on_credit(bea, "Widget").unwrap(), 10);

    assert_eq!(store.product(ana, "Widget").unwrap().stock, 3);
    assert_eq!(store.my_total_spent(ana).unwrap(), 10);
    assert_eq!(store.my_debt(ana).unwrap(), 0);
    assert_eq!(store.my_debt(bea).unwrap(), 10);
    assert_eq!(store.total_purchases(owner).unwrap(), 10);
    assert_eq!(store.total_debts(owner).unwrap(), 10);
    assert_eq!(store.purchases_for_country(owner, "CO").unwrap(), 10);
    assert_eq!(store.purchases_for_country(owner, "MX").unwrap(), 0);

    // Bea settles up
    assert_eq!(store.pay_credit(bea, 10).unwrap(), 10);
    assert_eq!(store.my_debt(bea).unwrap(), 0);
    assert_eq!(store.my_total_spent(bea).unwrap(), 10);
    assert_eq!(store.total_purchases(owner).unwrap(), 20);
    assert_eq!(store.total_debts(owner).unwrap(), 0);
    assert_eq!(store.purchases_for_country(owner, "MX").unwrap(), 10);

    // Every unit of value ended up with the owner
    assert_eq!(store.transfer().total_to(owner), 20);
    let by_country = store.purchases_by_country(owner).unwrap();
    assert_eq!(by_country.get("CO"), Some(&10));
    assert_eq!(by_country.get("MX"), Some(&10));
}

#[test]
fn a_loyal_customer_gets_cheap_items_free() {
    let (store, owner) = open_shop(UnitScale::WHOLE);
    let ana = CallerId::new();

    // One widget more than the loyalty loop consumes, so the shelf
    // still holds stock when the discount assertions run.
    store
        .add_product(owner, "Widget", "Sturdy widget", 10, 7)
        .unwrap();
    store
        .add_product(owner, "Candy", "Penny candy", 2, 30)
        .unwrap();
    store
        .register_customer(ana, ExternalId::new(7), "Ana", "CO")
        .unwrap();

    // Spend past the loyalty threshold
    for _ in 0..6 {
        store.purchase(ana, "Widget", 10).unwrap();
    }
    assert_eq!(store.my_total_spent(ana).unwrap(), 60);
    assert_eq!(store.product(ana, "Widget").unwrap().stock, 1);

    // Candy's list price sits under the discount, so it clamps to free
    assert_eq!(store.effective_price(ana, "Candy").unwrap(), 0);
    assert_eq!(store.purchase(ana, "Candy", 0).unwrap(), 0);
    assert_eq!(store.my_total_spent(ana).unwrap(), 60);

    // The widget itself never discounts
    assert_eq!(store.effective_price(ana, "Widget").unwrap(), 10);
    let err = store.purchase(ana, "Widget", 0).unwrap_err();
    assert_eq!(
        err,
        StoreError::Ledger(LedgerError::WrongPaymentAmount {
            expected: 10,
            tendered: 0,
        })
    );
    assert_eq!(store.product(ana, "Widget").unwrap().stock, 1);
}

#[test]
fn cents_scale_multiplies_every_tender() {
    let (store, owner) = open_shop(UnitScale::CENTS);
    let ana = CallerId::new();

    store
        .add_product(owner, "Widget", "Sturdy widget", 10, 5)
        .unwrap();
    store
        .register_customer(ana, ExternalId::new(7), "Ana", "CO")
        .unwrap();

    let err = store.purchase(ana, "Widget", 10).unwrap_err();
    assert_eq!(
        err,
        StoreError::Ledger(LedgerError::WrongPaymentAmount {
            expected: 1_000,
            tendered: 10,
        })
    );
    assert_eq!(store.purchase(ana, "Widget", 1_000).unwrap(), 10);

    store.purchase_on_credit(ana, "Widget").unwrap();
    assert_eq!(store.pay_credit(ana, 1_000).unwrap(), 10);
    assert_eq!(store.transfer().total_to(owner), 2_000);
}

#[test]
fn published_notifications_serialize_with_stable_payloads() {
    let (store, owner) = open_shop(UnitScale::WHOLE);
    let ana = CallerId::new();

    store
        .add_product(owner, "Widget", "Sturdy widget", 10, 5)
        .unwrap();
    store
        .register_customer(ana, ExternalId::new(7), "Ana", "CO")
        .unwrap();

    store.purchase(ana, "Widget", 10).unwrap();
    store.purchase_on_credit(ana, "Widget").unwrap();
    store.pay_credit(ana, 10).unwrap();
    for _ in 0..3 {
        store.attempt_destroy(owner).unwrap();
    }

    let payloads: Vec<serde_json::Value> = store
        .notifications()
        .iter()
        .map(|e| serde_json::to_value(e).unwrap())
        .collect();
    assert_eq!(payloads.len(), 4);

    assert_eq!(payloads[0]["Purchase"]["buyer"], ana.to_string());
    assert_eq!(payloads[0]["Purchase"]["method"], "CASH");
    assert_eq!(payloads[0]["Purchase"]["product"], "Widget");
    assert_eq!(payloads[0]["Purchase"]["price"], 10);

    assert_eq!(payloads[1]["Purchase"]["method"], "CREDIT");
    assert_eq!(payloads[1]["Purchase"]["price"], 10);

    assert_eq!(payloads[2]["CreditPayment"]["buyer"], ana.to_string());
    assert_eq!(payloads[2]["CreditPayment"]["amount"], 10);

    assert_eq!(payloads[3]["Destroyed"]["owner"], owner.to_string());
    assert_eq!(payloads[3]["Destroyed"]["attempts"], 3);
}

#[test]
fn subscribers_follow_commerce_in_real_time() {
    let (store, owner) = open_shop(UnitScale::WHOLE);
    let ana = CallerId::new();

    store
        .add_product(owner, "Widget", "Sturdy widget", 10, 5)
        .unwrap();
    store
        .register_customer(ana, ExternalId::new(7), "Ana", "CO")
        .unwrap();

    let sub = store.subscribe();

    store.purchase(ana, "Widget", 10).unwrap();
    store.purchase_on_credit(ana, "Widget").unwrap();
    store.pay_credit(ana, 10).unwrap();

    assert!(matches!(sub.try_recv().unwrap(), ShopEvent::Purchase(_)));
    assert!(matches!(sub.try_recv().unwrap(), ShopEvent::Purchase(_)));
    assert!(matches!(
        sub.try_recv().unwrap(),
        ShopEvent::CreditPayment(_)
    ));
    assert!(sub.try_recv().is_err());
}

#[test]
fn teardown_seals_the_store_for_good() {
    let (store, owner) = open_shop(UnitScale::WHOLE);
    let ana = CallerId::new();

    store
        .add_product(owner, "Widget", "Sturdy widget", 10, 5)
        .unwrap();
    store
        .register_customer(ana, ExternalId::new(7), "Ana", "CO")
        .unwrap();
    store.purchase(ana, "Widget", 10).unwrap();

    // Only the owner may even try
    let err = store.attempt_destroy(ana).unwrap_err();
    assert_eq!(err, StoreError::Ledger(LedgerError::Unauthorized));
    assert_eq!(store.destroy_attempts().unwrap(), 0);

    assert_eq!(
        store.attempt_destroy(owner).unwrap(),
        DestroyOutcome::Deferred { attempt: 1 }
    );
    assert_eq!(
        store.attempt_destroy(owner).unwrap(),
        DestroyOutcome::Deferred { attempt: 2 }
    );
    assert!(!store.is_destroyed().unwrap());

    assert_eq!(
        store.attempt_destroy(owner).unwrap(),
        DestroyOutcome::Destroyed
    );
    assert!(store.is_destroyed().unwrap());
    assert_eq!(store.transfer().sweeps(), vec![owner]);

    // Everything is refused from here on
    let destroyed = StoreError::Ledger(LedgerError::SystemDestroyed);
    assert_eq!(
        store.add_product(owner, "Widget", "Too late", 1, 1).unwrap_err(),
        destroyed
    );
    assert_eq!(store.purchase(ana, "Widget", 10).unwrap_err(), destroyed);
    assert_eq!(store.pay_credit(ana, 0).unwrap_err(), destroyed);
    assert_eq!(store.attempt_destroy(owner).unwrap_err(), destroyed);
    assert_eq!(store.total_purchases(owner).unwrap_err(), destroyed);
    assert_eq!(store.my_total_spent(ana).unwrap_err(), destroyed);

    // The record of the teardown itself survives
    let last = store.notifications().pop().unwrap();
    match last {
        ShopEvent::Destroyed(d) => {
            assert_eq!(d.owner, owner);
            assert_eq!(d.attempts, 3);
        }
        other => panic!("expected a teardown notification, got {other:?}"),
    }
}
