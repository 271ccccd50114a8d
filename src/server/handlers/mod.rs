pub mod health;
pub mod reply;
