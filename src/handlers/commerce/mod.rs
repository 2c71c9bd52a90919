/// Commerce API handlers module
pub mod carts;
pub mod checkout;
pub mod coupons;
pub mod library;
pub mod plans;
pub mod premium;

// Re-export route builders
pub use carts::carts_routes;
pub use checkout::checkout_routes;
pub use coupons::coupons_routes;
pub use library::library_routes;
pub use plans::plans_routes;
pub use premium::premium_routes;
