pub mod auth_handlers;
pub mod health_handlers;
pub mod model_handlers;
pub mod upload_handlers;
