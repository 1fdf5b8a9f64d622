use actix_web::{web, HttpResponse};

use crate::error::AppError;

pub mod auth;
pub mod forward;
pub mod health;
pub mod table;

pub use table::{RouteEntry, ROUTES};

/// Register every route in the table.
pub fn configure(cfg: &mut web::ServiceConfig) {
    for entry in ROUTES {
        cfg.service(table::resource(entry));
    }
}

/// Fallback for anything the table does not match.
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::RouteNotFound)
}
