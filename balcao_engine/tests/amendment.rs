//! End-to-end tests for mid-flight item additions: permissions, totals, and instant-payment
//! code invalidation.

mod common;

use balcao_common::Money;
use balcao_engine::{
    db_types::{MenuItem, NewOrder, NewOrderItem, Order, OrderId, OrderStatusType, PixArtifact},
    order_objects::ItemSelection,
    test_utils::{new_test_db, seed_menu},
    OrderAmendmentApi,
    PaymentPipelineDatabase,
    PaymentPipelineError,
    SqliteDatabase,
};
use chrono::{Duration, Utc};
use common::init_logging;

const WAITER: &str = "w-1";

async fn setup() -> (SqliteDatabase, Vec<MenuItem>, OrderAmendmentApi<SqliteDatabase>) {
    init_logging();
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let api = OrderAmendmentApi::new(db.clone());
    (db, menu, api)
}

/// A staff-assisted order with two burgers (R$25.50), already in preparation.
async fn place_staff_order(db: &SqliteDatabase, menu: &[MenuItem]) -> Order {
    let order = NewOrder::new(OrderId("ord-1".to_string()), "Carla".to_string())
        .with_phone("+5511988887777".to_string())
        .with_waiter(WAITER.to_string());
    let items = [NewOrderItem {
        menu_item_id: menu[0].id,
        name: menu[0].name.clone(),
        unit_price: menu[0].price,
        quantity: 2,
        notes: None,
    }];
    let order = db.insert_order(order, &items).await.expect("Error placing order");
    assert_eq!(order.status, OrderStatusType::InPreparation);
    order
}

fn one_juice(menu: &[MenuItem]) -> Vec<ItemSelection> {
    vec![ItemSelection { menu_item_id: menu[1].id, quantity: 1, notes: None }]
}

fn valid_artifact() -> PixArtifact {
    PixArtifact {
        code: "00020126QRDATA".to_string(),
        generated_at: Utc::now(),
        expires_at: Utc::now() + Duration::minutes(15),
        gateway_payment_id: "mp-55".to_string(),
    }
}

#[tokio::test]
async fn adding_items_recomputes_total_and_commission() {
    let (db, menu, api) = setup().await;
    let order = place_staff_order(&db, &menu).await;
    assert_eq!(order.total_amount, Money::from_cents(2550));

    let result = api.add_items(&order.order_id, &one_juice(&menu), WAITER).await.expect("Error amending order");
    assert_eq!(result.added_amount, Money::from_cents(1000));
    assert_eq!(result.added_items.len(), 1);
    assert_eq!(result.order.total_amount, Money::from_cents(3550));
    assert_eq!(result.order.commission_amount, Money::from_cents(355));
    assert!(!result.pix_invalidated);

    let items = db.fetch_order_items(&order.order_id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].name, "Suco de Laranja");
    assert_eq!(items[1].unit_price, Money::from_cents(1000));
}

#[tokio::test]
async fn amending_invalidates_a_valid_pix_code() {
    let (db, menu, api) = setup().await;
    let order = place_staff_order(&db, &menu).await;
    let order = db.attach_pix_artifact(&order.order_id, &valid_artifact()).await.unwrap();
    assert!(order.has_valid_pix_code(Utc::now()));

    let result = api.add_items(&order.order_id, &one_juice(&menu), WAITER).await.unwrap();
    assert!(result.pix_invalidated);
    assert!(result.order.pix_code.is_none());
    assert!(result.order.pix_generated_at.is_none());
    assert!(result.order.pix_expires_at.is_none());
}

#[tokio::test]
async fn an_expired_pix_code_is_cleared_but_not_reported_as_invalidated() {
    let (db, menu, api) = setup().await;
    let order = place_staff_order(&db, &menu).await;
    let artifact = PixArtifact {
        expires_at: Utc::now() - Duration::minutes(1),
        ..valid_artifact()
    };
    let order = db.attach_pix_artifact(&order.order_id, &artifact).await.unwrap();
    assert!(!order.has_valid_pix_code(Utc::now()));

    let result = api.add_items(&order.order_id, &one_juice(&menu), WAITER).await.unwrap();
    assert!(!result.pix_invalidated);
    assert!(result.order.pix_code.is_none());
}

#[tokio::test]
async fn only_the_assigned_waiter_may_amend() {
    let (db, menu, api) = setup().await;
    let order = place_staff_order(&db, &menu).await;

    let err = api.add_items(&order.order_id, &one_juice(&menu), "w-2").await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::PermissionDenied(_)), "unexpected error: {err}");

    // A customer-placed order has no waiter attribution at all.
    let customer = NewOrder::new(OrderId("ord-2".to_string()), "Davi".to_string());
    let items = [NewOrderItem {
        menu_item_id: menu[0].id,
        name: menu[0].name.clone(),
        unit_price: menu[0].price,
        quantity: 1,
        notes: None,
    }];
    let customer = db.insert_order(customer, &items).await.unwrap();
    let err = api.add_items(&customer.order_id, &one_juice(&menu), WAITER).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::PermissionDenied(_)));
}

#[tokio::test]
async fn amendments_are_rejected_once_the_order_leaves_preparation() {
    let (db, menu, api) = setup().await;
    let order = place_staff_order(&db, &menu).await;

    db.update_order_status(&order.order_id, OrderStatusType::Ready).await.unwrap();
    let err = api.add_items(&order.order_id, &one_juice(&menu), WAITER).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::AmendmentNotAllowed { status: OrderStatusType::Ready, .. }));

    db.update_order_status(&order.order_id, OrderStatusType::Completed).await.unwrap();
    let err = api.add_items(&order.order_id, &one_juice(&menu), WAITER).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::AmendmentNotAllowed { status: OrderStatusType::Completed, .. }));
}

#[tokio::test]
async fn unavailable_items_are_rejected_by_name_and_nothing_is_written() {
    let (db, menu, api) = setup().await;
    let order = place_staff_order(&db, &menu).await;

    let selection = vec![ItemSelection { menu_item_id: menu[2].id, quantity: 1, notes: None }];
    let err = api.add_items(&order.order_id, &selection, WAITER).await.unwrap_err();
    match err {
        PaymentPipelineError::MenuItemUnavailable(name) => assert_eq!(name, "Feijoada do Dia"),
        other => panic!("unexpected error: {other}"),
    }
    let items = db.fetch_order_items(&order.order_id).await.unwrap();
    assert_eq!(items.len(), 1);
    let order = db.fetch_order_by_order_id(&order.order_id).await.unwrap().unwrap();
    assert_eq!(order.total_amount, Money::from_cents(2550));
}

#[tokio::test]
async fn unknown_menu_items_are_rejected() {
    let (db, menu, api) = setup().await;
    let order = place_staff_order(&db, &menu).await;

    let selection = vec![ItemSelection { menu_item_id: 9999, quantity: 1, notes: None }];
    let err = api.add_items(&order.order_id, &selection, WAITER).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::MenuItemNotFound(9999)));
}

#[tokio::test]
async fn degenerate_inputs_are_rejected() {
    let (db, menu, api) = setup().await;
    let order = place_staff_order(&db, &menu).await;

    let err = api.add_items(&order.order_id, &[], WAITER).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::InvalidInput(_)));

    let err = api.add_items(&order.order_id, &one_juice(&menu), " ").await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::InvalidInput(_)));

    let zero = vec![ItemSelection { menu_item_id: menu[1].id, quantity: 0, notes: None }];
    let err = api.add_items(&order.order_id, &zero, WAITER).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::InvalidInput(_)));

    let err = api.add_items(&OrderId("ord-missing".to_string()), &one_juice(&menu), WAITER).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::OrderNotFound(_)));
}
