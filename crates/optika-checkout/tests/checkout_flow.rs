//! End-to-end checkout tests against an in-memory database.
//!
//! These drive the whole stack: session mutations, split classification,
//! the checkout transaction, and the rows it leaves behind.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use optika_checkout::{
    checkout::checkout, AutoConfirm, AutoDecline, CheckoutError, NewItem, SessionState,
    TenderEntry,
};
use optika_core::{
    CardType, CoreError, ItemKind, LoyaltySettings, Money, PaymentMethod, Product, Terminal,
    WorkOrderStatus, DEFAULT_BRANCH_ID,
};
use optika_db::{Database, DbConfig};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_product(db: &Database, kind: ItemKind, name: &str, stock: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        branch_id: DEFAULT_BRANCH_ID.to_string(),
        sku: format!("SKU-{}", Uuid::new_v4()),
        name: name.to_string(),
        description: None,
        kind,
        price_cents: 100_000,
        cost_cents: Some(40_000),
        current_stock: stock,
        is_on_demand: false,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}

async fn seed_terminal(db: &Database) -> Terminal {
    let terminal = Terminal {
        id: "term-1".to_string(),
        name: "BBVA".to_string(),
        fee_bps: 350,
        installment_rates: BTreeMap::from([(6, 450)]),
    };
    db.settings().upsert_terminal(&terminal).await.unwrap();
    terminal
}

fn lab_item(description: &str, price_cents: i64) -> NewItem {
    NewItem {
        kind: ItemKind::Lenses,
        description: description.to_string(),
        quantity: 1,
        unit_price_cents: price_cents,
        cost_cents: Some(30_000),
        product_id: None,
        requires_lab: true,
        lab_name: Some("Essilor".to_string()),
        rx_notes: Some("OD -1.25".to_string()),
        due_date: None,
    }
}

#[tokio::test]
async fn split_ticket_prorates_discount_and_pays_counter_first() {
    let db = test_db().await;
    let state = SessionState::new();

    // counter $200 + lab $800, 10% off the whole, $150 tendered
    state
        .with_session_mut(|s| {
            s.add_item(NewItem::simple(
                ItemKind::Accessory,
                "Premium case + solutions",
                1,
                Money::from_cents(20_000),
            ))
            .unwrap();
            s.add_item(lab_item("Progressive lenses", 80_000)).unwrap();
            s.set_discount(optika_core::pricing::DiscountKind::Percent, "10");
            s.set_tenders(vec![TenderEntry::simple(
                PaymentMethod::Cash,
                Money::from_cents(15_000),
            )]);
        })
        .await;

    let outcome = checkout(&state, &db, &AutoConfirm).await.unwrap();

    assert_eq!(outcome.sales.len(), 2);
    let counter = &outcome.sales[0];
    let lab = &outcome.sales[1];

    // $100 discount prorated: $20 to the counter fifth, $80 to the lab
    assert_eq!(counter.total_cents, 18_000);
    assert_eq!(lab.total_cents, 72_000);

    // counter ticket absorbs the payment first
    assert_eq!(counter.paid_cents, 15_000);
    assert_eq!(lab.paid_cents, 0);
    assert!(!counter.is_lab);
    assert!(lab.is_lab);

    // folios are distinct and both sales are queryable
    assert_ne!(counter.folio, lab.folio);
    let stored_lab = db.sales().get_by_id(&lab.sale_id).await.unwrap();
    assert_eq!(stored_lab.discount_cents, 8_000);

    // the unpaid lab job is held until half the sale is covered
    assert_eq!(outcome.work_orders_created, 1);
    let orders = db.work_orders().list_for_sale(&lab.sale_id).await.unwrap();
    assert_eq!(orders[0].status, WorkOrderStatus::OnHold);
    assert_eq!(orders[0].lab_name.as_deref(), Some("Essilor"));
}

#[tokio::test]
async fn half_paid_lab_job_is_released() {
    let db = test_db().await;
    let state = SessionState::new();

    state
        .with_session_mut(|s| {
            s.add_item(lab_item("Progressive lenses", 80_000)).unwrap();
            s.set_tenders(vec![TenderEntry::simple(
                PaymentMethod::Cash,
                Money::from_cents(40_000),
            )]);
        })
        .await;

    let outcome = checkout(&state, &db, &AutoConfirm).await.unwrap();
    assert_eq!(outcome.sales.len(), 1);

    let orders = db
        .work_orders()
        .list_for_sale(&outcome.sales[0].sale_id)
        .await
        .unwrap();
    assert_eq!(orders[0].status, WorkOrderStatus::ToPrepare);
}

#[tokio::test]
async fn stock_is_deducted_and_logged() {
    let db = test_db().await;
    let state = SessionState::new();

    let frame = seed_product(&db, ItemKind::Frames, "Ray-Ban RX5154", 5).await;

    state
        .with_session_mut(|s| {
            let mut item = NewItem::simple(
                ItemKind::Frames,
                "Ray-Ban RX5154",
                2,
                Money::from_cents(100_000),
            );
            item.product_id = Some(frame.id.clone());
            s.add_item(item).unwrap();
            s.set_tenders(vec![TenderEntry::simple(
                PaymentMethod::Cash,
                Money::from_cents(200_000),
            )]);
        })
        .await;

    checkout(&state, &db, &AutoConfirm).await.unwrap();

    let stored = db.products().get_by_id(&frame.id).await.unwrap();
    assert_eq!(stored.current_stock, 3);
}

#[tokio::test]
async fn insufficient_stock_aborts_with_no_writes() {
    let db = test_db().await;
    let state = SessionState::new();

    let frame = seed_product(&db, ItemKind::Frames, "Ray-Ban RX5154", 1).await;

    state
        .with_session_mut(|s| {
            let mut item = NewItem::simple(
                ItemKind::Frames,
                "Ray-Ban RX5154",
                2,
                Money::from_cents(100_000),
            );
            item.product_id = Some(frame.id.clone());
            s.add_item(item).unwrap();
            s.set_tenders(vec![TenderEntry::simple(
                PaymentMethod::Cash,
                Money::from_cents(200_000),
            )]);
        })
        .await;

    let err = checkout(&state, &db, &AutoConfirm).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Core(CoreError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        })
    ));

    // nothing was written and the cart survives for correction
    assert_eq!(db.products().get_by_id(&frame.id).await.unwrap().current_stock, 1);
    assert_eq!(db.sales().list_for_branch(DEFAULT_BRANCH_ID, 10).await.unwrap().len(), 0);
    let items = state.with_session(|s| s.items.len()).await;
    assert_eq!(items, 1);
}

#[tokio::test]
async fn card_payment_records_commission_expense() {
    let db = test_db().await;
    let state = SessionState::new();
    seed_terminal(&db).await;

    state
        .with_session_mut(|s| {
            s.add_item(NewItem::simple(
                ItemKind::Consultation,
                "Eye exam",
                1,
                Money::from_cents(100_000),
            ))
            .unwrap();
            s.set_tenders(vec![TenderEntry::card(
                Money::from_cents(100_000),
                "term-1",
                CardType::Credit,
                6,
            )]);
        })
        .await;

    let outcome = checkout(&state, &db, &AutoConfirm).await.unwrap();
    assert_eq!(outcome.expenses_recorded, 1);

    let expenses = db
        .expenses()
        .list_for_sale(&outcome.sales[0].sale_id)
        .await
        .unwrap();
    assert_eq!(expenses.len(), 1);
    // bank side stacks base + bucket: 3.5% + 4.5% = 8% of $1000
    assert_eq!(expenses[0].amount_cents, 8_000);
    assert!(expenses[0].description.contains("BBVA"));

    // while the customer-side fee stored on the payment is the bucket only
    let payments = db
        .sales()
        .get_payments(&outcome.sales[0].sale_id)
        .await
        .unwrap();
    assert_eq!(payments[0].fee_cents, 4_500);
    assert_eq!(payments[0].installments, 6);
}

#[tokio::test]
async fn loyalty_points_accrue_but_not_on_point_redemptions() {
    let db = test_db().await;
    let state = SessionState::new();

    db.settings()
        .update_loyalty_settings(&LoyaltySettings {
            enabled: true,
            global_bps: 100,
            cash_bps: None,
            card_bps: None,
            transfer_bps: None,
            referral_bps: 50,
        })
        .await
        .unwrap();

    state
        .with_session_mut(|s| {
            s.patient_id = Some("patient-1".to_string());
            s.referrer_id = Some("patient-2".to_string());
            s.add_item(NewItem::simple(
                ItemKind::Consultation,
                "Eye exam",
                1,
                Money::from_cents(400_000),
            ))
            .unwrap();
            s.set_tenders(vec![
                TenderEntry::simple(PaymentMethod::Cash, Money::from_cents(200_000)),
                TenderEntry::simple(PaymentMethod::Points, Money::from_cents(200_000)),
            ]);
        })
        .await;

    let outcome = checkout(&state, &db, &AutoConfirm).await.unwrap();

    // only the $2000 cash slice earns: 1% = 20 points; referral 0.5% = 10
    assert_eq!(outcome.points_awarded, 20);
    assert_eq!(outcome.referrer_points, 10);

    let sale = db.sales().get_by_id(&outcome.sales[0].sale_id).await.unwrap();
    assert_eq!(sale.points_awarded, 20);
    assert_eq!(sale.referrer_points, 10);
    assert_eq!(sale.referrer_id.as_deref(), Some("patient-2"));
}

#[tokio::test]
async fn declined_split_prompt_keeps_the_cart() {
    let db = test_db().await;
    let state = SessionState::new();

    state
        .with_session_mut(|s| {
            s.add_item(NewItem::simple(
                ItemKind::Accessory,
                "Lens cleaner",
                1,
                Money::from_cents(8_900),
            ))
            .unwrap();
            s.add_item(lab_item("Single vision lenses", 89_900)).unwrap();
        })
        .await;

    let err = checkout(&state, &db, &AutoDecline).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Cancelled));

    let items = state.with_session(|s| s.items.len()).await;
    assert_eq!(items, 2);
    assert_eq!(db.sales().list_for_branch(DEFAULT_BRANCH_ID, 10).await.unwrap().len(), 0);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let db = test_db().await;
    let state = SessionState::new();

    let err = checkout(&state, &db, &AutoConfirm).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}

#[tokio::test]
async fn homogeneous_lab_cart_needs_no_prompt() {
    let db = test_db().await;
    let state = SessionState::new();

    state
        .with_session_mut(|s| {
            s.add_item(lab_item("Single vision lenses", 89_900)).unwrap();
        })
        .await;

    // AutoDecline would cancel if the prompt fired; an all-lab cart must not
    let outcome = checkout(&state, &db, &AutoDecline).await.unwrap();
    assert_eq!(outcome.sales.len(), 1);
    assert!(outcome.sales[0].is_lab);
}
