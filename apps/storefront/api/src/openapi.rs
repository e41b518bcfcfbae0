//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Storefront API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "Product catalog and shopping carts with stock reservation",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/products", api = domain_products::ApiDoc),
        (path = "/api/cart", api = domain_cart::ApiDoc)
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Cart", description = "Shopping cart and stock reservation endpoints")
    )
)]
pub struct ApiDoc;
