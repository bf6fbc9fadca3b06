//! Route handlers.

pub mod drugs;
pub mod health;
pub mod recommend;
