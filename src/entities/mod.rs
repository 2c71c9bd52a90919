//! Database entities, one module per table.

pub mod admin;
pub mod banner;
pub mod catalog;
pub mod commerce;
pub mod faq;
pub mod sub_admin;
pub mod user;

pub use catalog::{author, book, favorite, notification, rating};
pub use commerce::{cart, coupon, library, order, plan, premium, transaction};
