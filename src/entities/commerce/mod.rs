pub mod cart;
pub mod coupon;
pub mod library;
pub mod order;
pub mod plan;
pub mod premium;
pub mod transaction;
