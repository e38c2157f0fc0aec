use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use balcao_engine::{OrderAmendmentApi, OrderFlowApi, PaymentConfirmationApi, SqliteDatabase};
use mpago_tools::MpagoApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    messenger::Messenger,
    poller::{PollerConfig, PollerRegistry},
    routes::{add_items, confirm_payment, create_payment, health, new_order, payment_webhook, update_status},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let messenger =
        Messenger::new(config.messenger.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mpago = MpagoApi::new(config.mpago.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let registry = PollerRegistry::new(
        db.clone(),
        messenger.clone(),
        Arc::new(mpago.clone()),
        PollerConfig { interval: config.poll_interval },
    );
    let srv = HttpServer::new(move || {
        let flow_api = OrderFlowApi::new(db.clone(), messenger.clone());
        let amendment_api = OrderAmendmentApi::new(db.clone());
        let confirmation_api = PaymentConfirmationApi::new(db.clone(), messenger.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bpp::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(amendment_api))
            .app_data(web::Data::new(confirmation_api))
            .app_data(web::Data::new(mpago.clone()))
            .app_data(web::Data::new(registry.clone()))
            .service(health)
            .service(new_order)
            .service(add_items)
            .service(create_payment)
            .service(confirm_payment)
            .service(update_status)
            .service(payment_webhook)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
