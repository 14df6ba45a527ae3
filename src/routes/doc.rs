use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    assistant::{AssistantAction, ChatReply, ChatRole, ChatTurn},
    dto::{
        addresses::{AddressList, CreateAddressRequest},
        assistant::ChatRequest,
        cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems},
        payments::{VerifyPaymentRequest, VerifyPaymentResponse},
        products,
    },
    models::{
        Address, CartItem, DeliveryAddress, Order, OrderItem, OrderStatus, Payment, PaymentStatus,
        Product,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, assistant, cart, health, orders, params, payments,
        products as product_routes,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        product_routes::list_products,
        product_routes::get_product,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        addresses::list_addresses,
        addresses::add_address,
        addresses::remove_address,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        payments::verify_payment,
        assistant::chat,
        admin::list_all_products,
        admin::create_product,
        admin::update_product,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status
    ),
    components(
        schemas(
            Product,
            CartItem,
            Address,
            DeliveryAddress,
            Order,
            OrderItem,
            Payment,
            OrderStatus,
            PaymentStatus,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartList,
            CartItemDto,
            CreateAddressRequest,
            AddressList,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            VerifyPaymentRequest,
            VerifyPaymentResponse,
            ChatRequest,
            ChatReply,
            ChatRole,
            ChatTurn,
            AssistantAction,
            admin::ProductList,
            admin::UpdateOrderStatusRequest,
            admin::InventoryAdjustRequest,
            admin::LowStockQuery,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            products::ProductList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<CartList>,
            ApiResponse<AddressList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<VerifyPaymentResponse>,
            ApiResponse<ChatReply>,
            ApiResponse<admin::ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Addresses", description = "Saved delivery addresses"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Payments", description = "Gateway verification"),
        (name = "Assistant", description = "Shopping assistant"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
