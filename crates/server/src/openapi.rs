use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LineItemDoc { pub id: u64, pub title: String, pub price: f64, pub image: String, pub amount: u32 }

#[derive(ToSchema)]
pub struct CartViewDoc { pub items: Vec<LineItemDoc>, pub total_units: u64, pub subtotal: f64 }

#[derive(ToSchema)]
pub struct AmountInputDoc { pub amount: i64 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::cart::get_cart,
        crate::routes::cart::add_product,
        crate::routes::cart::remove_product,
        crate::routes::cart::update_product_amount,
    ),
    components(
        schemas(
            HealthResponse,
            LineItemDoc,
            CartViewDoc,
            AmountInputDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "cart")
    )
)]
pub struct ApiDoc;
