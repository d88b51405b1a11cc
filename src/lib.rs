pub mod analysis;
pub mod api;
pub mod database_sqlx;
pub mod models;
pub mod pipeline;
