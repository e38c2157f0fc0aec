//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module
//! neat and tidy 🙏

use actix_web::{get, post, web, HttpResponse, Responder};
use balcao_engine::{
    db_types::{ConfirmationSource, NewOrder, OrderId, PaymentMethod, PixArtifact},
    OrderAmendmentApi,
    OrderFlowApi,
    PaymentConfirmationApi,
    PaymentPipelineDatabase,
    PaymentPipelineError,
    SqliteDatabase,
};
use chrono::Utc;
use log::*;
use mpago_tools::{MpagoApi, Payer, PaymentState};

use crate::{
    data_objects::{
        AddItemsRequest,
        AddItemsResponse,
        CreatePaymentRequest,
        CreatePaymentResponse,
        JsonResponse,
        ManualConfirmRequest,
        NewOrderRequest,
        PaymentWebhookPayload,
        StatusChangeRequest,
    },
    errors::ServerError,
    messenger::Messenger,
    poller::PollerRegistry,
};

type FlowApi = OrderFlowApi<SqliteDatabase, Messenger>;
type ConfirmApi = PaymentConfirmationApi<SqliteDatabase, Messenger>;
type AmendApi = OrderAmendmentApi<SqliteDatabase>;

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("🏥️ Health check");
    HttpResponse::Ok().body("👍️\n")
}

/// Order intake, customer or staff-assisted. `201` with the stored order.
#[post("/orders")]
pub async fn new_order(body: web::Json<NewOrderRequest>, api: web::Data<FlowApi>) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.customer_name.trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("customer_name is required".to_string()));
    }
    let order_id = req.order_id.map(OrderId::from).unwrap_or_else(OrderId::random);
    let mut order = NewOrder::new(order_id, req.customer_name);
    if let Some(phone) = req.customer_phone {
        order = order.with_phone(phone);
    }
    if let Some(waiter) = req.waiter_id {
        order = order.with_waiter(waiter);
    }
    let order = api.process_new_order(order, &req.items).await?;
    Ok(HttpResponse::Created().json(order))
}

/// Mid-flight item addition by the assigned waiter. `201` with the amended order and the new
/// totals; flags whether an outstanding PIX code was invalidated.
#[post("/orders/{order_id}/items")]
pub async fn add_items(
    path: web::Path<String>,
    body: web::Json<AddItemsRequest>,
    api: web::Data<AmendApi>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let req = body.into_inner();
    let amended = api.add_items(&order_id, &req.items, &req.waiter_id).await?;
    Ok(HttpResponse::Created().json(AddItemsResponse::from(amended)))
}

/// Creates a PIX payment at the gateway for the order's current total, stores the artifact and
/// registers a poll loop.
#[post("/orders/{order_id}/payment")]
pub async fn create_payment(
    path: web::Path<String>,
    body: web::Json<CreatePaymentRequest>,
    api: web::Data<FlowApi>,
    mpago: web::Data<MpagoApi>,
    registry: web::Data<PollerRegistry>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let order = api
        .db()
        .fetch_order_by_order_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    // Refuse before going to the gateway; an unexpired code must be invalidated first.
    if order.has_valid_pix_code(Utc::now()) {
        return Err(PaymentPipelineError::PaymentArtifactOutstanding(order_id).into());
    }
    let payer = Payer::new(body.into_inner().payer_email);
    let payment = mpago.create_pix_payment(order_id.as_str(), order.total_amount, &payer).await?;
    let artifact = PixArtifact {
        code: payment.pix_code.clone(),
        generated_at: Utc::now(),
        expires_at: payment.expires_at,
        gateway_payment_id: payment.id.clone(),
    };
    let order = api.attach_pix_artifact(&order_id, artifact).await?;
    registry.start_polling(order_id, payment.id, payment.expires_at).await;
    Ok(HttpResponse::Ok().json(CreatePaymentResponse { order, pix_code: payment.pix_code, expires_at: payment.expires_at }))
}

/// Manual staff confirmation.
#[post("/orders/{order_id}/confirm")]
pub async fn confirm_payment(
    path: web::Path<String>,
    body: Option<web::Json<ManualConfirmRequest>>,
    api: web::Data<ConfirmApi>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let method = body.map(|b| b.into_inner()).unwrap_or_default().payment_method;
    let result = api.confirm_payment(&order_id, ConfirmationSource::Manual, method, None).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Kitchen-side status changes (ready / completed / cancelled).
#[post("/orders/{order_id}/status")]
pub async fn update_status(
    path: web::Path<String>,
    body: web::Json<StatusChangeRequest>,
    api: web::Data<FlowApi>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let order = api.modify_status_for_order(&order_id, body.status).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// The gateway webhook. The payload only tells us which payment to look at; the status is
/// always re-queried from the gateway. The response is always 200, otherwise the gateway
/// retries forever.
#[post("/webhook/payment")]
pub async fn payment_webhook(
    body: web::Json<PaymentWebhookPayload>,
    api: web::Data<ConfirmApi>,
    mpago: web::Data<MpagoApi>,
) -> HttpResponse {
    let payload = body.into_inner();
    trace!("🔔️ Payment webhook for payment {} (order {})", payload.data.id, payload.external_reference);
    let response = match handle_payment_webhook(payload, &api, &mpago).await {
        Ok(msg) => {
            info!("🔔️ {msg}");
            JsonResponse::success(msg)
        },
        Err(msg) => {
            warn!("🔔️ Webhook not processed: {msg}");
            JsonResponse::failure(msg)
        },
    };
    HttpResponse::Ok().json(response)
}

async fn handle_payment_webhook(
    payload: PaymentWebhookPayload,
    api: &ConfirmApi,
    mpago: &MpagoApi,
) -> Result<String, String> {
    let order_id = OrderId(payload.external_reference);
    let payment_id = payload.data.id;
    let order = api
        .db()
        .fetch_order_by_order_id(&order_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Order {order_id} does not exist"))?;
    if order.gateway_payment_id.as_deref() != Some(payment_id.as_str()) {
        return Err(format!("Payment {payment_id} does not belong to order {order_id}"));
    }
    let status = mpago.payment_status(&payment_id).await.map_err(|e| e.to_string())?;
    match status {
        PaymentState::Approved => {
            let result = api
                .confirm_payment(&order_id, ConfirmationSource::Webhook, Some(PaymentMethod::Pix), Some(payment_id))
                .await
                .map_err(|e| e.to_string())?;
            Ok(format!(
                "Payment for order {order_id} confirmed (notification sent: {})",
                result.notification_sent
            ))
        },
        s => Ok(format!("Payment {payment_id} is {s}; nothing to do")),
    }
}
