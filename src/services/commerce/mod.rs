pub mod cart_service;
pub mod checkout_service;
pub mod coupon_service;
pub mod library_service;
pub mod order_service;
pub mod plan_service;
pub mod pricing;
pub mod subscription_service;

pub use cart_service::CartService;
pub use checkout_service::CheckoutService;
pub use coupon_service::CouponService;
pub use library_service::LibraryService;
pub use order_service::OrderService;
pub use plan_service::PlanService;
pub use subscription_service::SubscriptionService;
