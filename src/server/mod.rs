//! axum front-end: the reply page, the JSON API and status endpoints.

pub mod handlers;
pub mod page;
pub mod router;
