use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore API",
        version = "0.1.0",
        description = r#"
# Bookstore API

Catalog, cart and checkout, subscription plans and reader libraries.

## Authentication

Every request carries the client key in the `verifyme` header. Reader and
staff routes also need a token:

```
Authorization: A-Verify <jwt>
```

## Errors

Failures use one envelope:

```json
{
  "status": false,
  "message": "Error",
  "errors": [{ "field": "rate", "message": "Rate must be between 1 and 5" }]
}
```
        "#
    ),
    tags(
        (name = "Cart", description = "Cart endpoints"),
        (name = "Checkout", description = "Book purchase"),
        (name = "Coupons", description = "Coupon lookups"),
        (name = "Subscriptions", description = "Plan purchase")
    ),
    paths(
        crate::handlers::commerce::carts::add_to_cart,
        crate::handlers::commerce::carts::get_cart,
        crate::handlers::commerce::checkout::checkout,
        crate::handlers::commerce::coupons::check_coupon,
        crate::handlers::commerce::premium::purchase_premium,
    ),
    components(
        schemas(
            crate::services::commerce::cart_service::AddToCartInput,
            crate::services::commerce::checkout_service::CheckoutInput,
            crate::services::commerce::checkout_service::RoyaltyAccrual,
            crate::services::commerce::subscription_service::PurchasePlanInput,
            crate::services::commerce::coupon_service::CouponInput,
            crate::entities::coupon::CouponKind,
            crate::errors::ErrorResponse,
            crate::errors::FieldError
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "A-Verify",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
            components.add_security_scheme(
                "VerifyKey",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("verifyme"))),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
