//! End-to-end tests for order intake, kitchen-side status changes and payment-artifact
//! bookkeeping.

mod common;

use balcao_common::Money;
use balcao_engine::{
    db_types::{NewOrder, NotificationType, OrderId, OrderStatusType, PaymentStatusType, PixArtifact},
    order_objects::ItemSelection,
    test_utils::{new_test_db, seed_menu},
    OrderFlowApi,
    PaymentPipelineDatabase,
    PaymentPipelineError,
    SqliteDatabase,
};
use chrono::{Duration, Utc};
use common::{init_logging, RecordingDispatcher};

async fn setup() -> (SqliteDatabase, RecordingDispatcher, OrderFlowApi<SqliteDatabase, RecordingDispatcher>) {
    init_logging();
    let db = new_test_db().await;
    seed_menu(&db).await;
    let dispatcher = RecordingDispatcher::new();
    let api = OrderFlowApi::new(db.clone(), dispatcher.clone());
    (db, dispatcher, api)
}

fn burger_and_juice() -> Vec<ItemSelection> {
    vec![
        ItemSelection { menu_item_id: 1, quantity: 2, notes: Some("sem cebola".to_string()) },
        ItemSelection { menu_item_id: 2, quantity: 1, notes: None },
    ]
}

#[tokio::test]
async fn customer_orders_await_payment_with_snapshotted_prices() {
    let (db, dispatcher, api) = setup().await;
    let new_order =
        NewOrder::new(OrderId("ord-1".to_string()), "Ana".to_string()).with_phone("+5511999990000".to_string());
    let order = api.process_new_order(new_order, &burger_and_juice()).await.expect("Error creating order");

    assert_eq!(order.status, OrderStatusType::PendingPayment);
    assert_eq!(order.payment_status, PaymentStatusType::Pending);
    assert!(!order.staff_assisted);
    assert_eq!(order.total_amount, Money::from_cents(3550));
    assert_eq!(order.commission_amount, Money::from_cents(355));

    let items = db.fetch_order_items(&order.order_id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "X-Burger");
    assert_eq!(items[0].unit_price, Money::from_cents(1275));
    assert_eq!(items[0].notes.as_deref(), Some("sem cebola"));

    assert_eq!(dispatcher.delivered(), vec![(NotificationType::OrderCreated, order.order_id.clone())]);
}

#[tokio::test]
async fn staff_orders_enter_preparation_immediately() {
    let (_db, _dispatcher, api) = setup().await;
    let new_order = NewOrder::new(OrderId("ord-2".to_string()), "Bruno".to_string()).with_waiter("w-1".to_string());
    let order = api.process_new_order(new_order, &burger_and_juice()).await.unwrap();

    assert_eq!(order.status, OrderStatusType::InPreparation);
    assert_eq!(order.payment_status, PaymentStatusType::Pending);
    assert!(order.staff_assisted);
    assert_eq!(order.waiter_id.as_deref(), Some("w-1"));
}

#[tokio::test]
async fn order_numbers_are_sequential() {
    let (_db, _dispatcher, api) = setup().await;
    let first = api
        .process_new_order(NewOrder::new(OrderId("ord-3".to_string()), "Ana".to_string()), &burger_and_juice())
        .await
        .unwrap();
    let second = api
        .process_new_order(NewOrder::new(OrderId("ord-4".to_string()), "Bia".to_string()), &burger_and_juice())
        .await
        .unwrap();
    assert_eq!(second.order_number, first.order_number + 1);
}

#[tokio::test]
async fn duplicate_order_ids_are_rejected() {
    let (_db, _dispatcher, api) = setup().await;
    let order = NewOrder::new(OrderId("ord-5".to_string()), "Ana".to_string());
    api.process_new_order(order.clone(), &burger_and_juice()).await.unwrap();
    let err = api.process_new_order(order, &burger_and_juice()).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::OrderAlreadyExists(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn an_order_without_items_is_rejected() {
    let (_db, _dispatcher, api) = setup().await;
    let order = NewOrder::new(OrderId("ord-6".to_string()), "Ana".to_string());
    let err = api.process_new_order(order, &[]).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::InvalidInput(_)));
}

#[tokio::test]
async fn ready_and_completed_are_stamped_and_announced() {
    let (_db, dispatcher, api) = setup().await;
    let new_order = NewOrder::new(OrderId("ord-7".to_string()), "Carla".to_string())
        .with_phone("+5511988887777".to_string())
        .with_waiter("w-1".to_string());
    let order = api.process_new_order(new_order, &burger_and_juice()).await.unwrap();

    let order = api.modify_status_for_order(&order.order_id, OrderStatusType::Ready).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Ready);
    assert!(order.ready_at.is_some());
    assert!(dispatcher.delivered().contains(&(NotificationType::OrderReady, order.order_id.clone())));

    let order = api.modify_status_for_order(&order.order_id, OrderStatusType::Completed).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
    assert!(order.completed_at.is_some());

    // Terminal means terminal.
    let err = api.modify_status_for_order(&order.order_id, OrderStatusType::Cancelled).await.unwrap_err();
    assert!(matches!(
        err,
        PaymentPipelineError::InvalidStatusChange { from: OrderStatusType::Completed, to: OrderStatusType::Cancelled }
    ));
}

#[tokio::test]
async fn cancelling_stamps_the_cancellation_time() {
    let (_db, _dispatcher, api) = setup().await;
    let order = api
        .process_new_order(NewOrder::new(OrderId("ord-8".to_string()), "Davi".to_string()), &burger_and_juice())
        .await
        .unwrap();
    let order = api.modify_status_for_order(&order.order_id, OrderStatusType::Cancelled).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);
    assert!(order.cancelled_at.is_some());
}

#[tokio::test]
async fn payment_gate_statuses_cannot_be_set_directly() {
    let (_db, _dispatcher, api) = setup().await;
    let order = api
        .process_new_order(NewOrder::new(OrderId("ord-9".to_string()), "Ana".to_string()), &burger_and_juice())
        .await
        .unwrap();
    for status in [OrderStatusType::Paid, OrderStatusType::InPreparation, OrderStatusType::PendingPayment] {
        let err = api.modify_status_for_order(&order.order_id, status).await.unwrap_err();
        assert!(matches!(err, PaymentPipelineError::InvalidInput(_)), "{status} must not be settable directly");
    }
}

#[tokio::test]
async fn pix_artifact_lifecycle() {
    let (db, _dispatcher, api) = setup().await;
    let order = api
        .process_new_order(NewOrder::new(OrderId("ord-10".to_string()), "Elisa".to_string()), &burger_and_juice())
        .await
        .unwrap();
    let artifact = PixArtifact {
        code: "00020126QRDATA".to_string(),
        generated_at: Utc::now(),
        expires_at: Utc::now() + Duration::minutes(15),
        gateway_payment_id: "mp-10".to_string(),
    };
    let order = api.attach_pix_artifact(&order.order_id, artifact.clone()).await.unwrap();
    assert_eq!(order.pix_code.as_deref(), Some("00020126QRDATA"));
    assert_eq!(order.gateway_payment_id.as_deref(), Some("mp-10"));
    assert!(order.has_valid_pix_code(Utc::now()));

    // A second code may not be issued while the first is still valid.
    let err = api.attach_pix_artifact(&order.order_id, artifact.clone()).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::PaymentArtifactOutstanding(_)));

    // Once the payment is confirmed there is nothing left to pay for.
    db.confirm_order_payment(&order.order_id, None, Some("mp-10")).await.unwrap();
    let err = api.attach_pix_artifact(&order.order_id, artifact).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::PaymentNotPending(_)));
}

#[tokio::test]
async fn attaching_a_code_to_a_missing_order_fails() {
    let (_db, _dispatcher, api) = setup().await;
    let artifact = PixArtifact {
        code: "00020126QRDATA".to_string(),
        generated_at: Utc::now(),
        expires_at: Utc::now() + Duration::minutes(15),
        gateway_payment_id: "mp-11".to_string(),
    };
    let err = api.attach_pix_artifact(&OrderId("ord-missing".to_string()), artifact).await.unwrap_err();
    assert!(matches!(err, PaymentPipelineError::OrderNotFound(_)));
}
