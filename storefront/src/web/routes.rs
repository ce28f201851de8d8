// ufo_storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{order_handlers, payment_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{order_number}", web::get().to(order_handlers::order_status_handler)),
      )
      .service(
        web::scope("/payments")
          .route("", web::post().to(payment_handlers::initiate_payment_handler))
          // The gateway calls back with GET; POST is accepted as well.
          .route("/notify", web::get().to(payment_handlers::payment_notification_handler))
          .route("/notify", web::post().to(payment_handlers::payment_notification_handler)),
      ),
  );
}
