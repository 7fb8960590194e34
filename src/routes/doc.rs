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
    dto::{
        cart::{AddToCartRequest, CartLine, CartList},
        custom_orders::{
            CreateCustomOrderRequest, CustomOrderList, CustomOrderPayment, QuoteCustomOrderRequest,
            UpdateCustomOrderStatusRequest,
        },
        orders::{
            CheckoutResponse, CreateOrderRequest, LineItemRequest, OrderList, OrderWithItems,
            PaymentIntent, QuoteRequest, QuoteResponse, SweepReport, UpdateOrderStatusRequest,
        },
        payments::{PaymentTarget, PaymentVerification, VerifyPaymentRequest},
        products::{CreateProductRequest, InventoryAdjustRequest, ProductList},
        settings::UpdateSettingsRequest,
        workshops::{
            BookSessionRequest, BookingResponse, CreateSessionRequest, CreateWorkshopRequest,
            RegistrationList, RescheduleRequest, RescheduleResponse, WorkshopDetail, WorkshopList,
        },
    },
    models::{
        CartItem, CustomOrder, CustomOrderStatus, Order, OrderItem, OrderStatus, PaymentStatus, Product,
        ShippingAddress, StoreSettings, Workshop, WorkshopRegistration, WorkshopSession,
    },
    response::{ApiResponse, Meta},
    routes::{admin, cart, custom_orders, health, orders, params, payments, products, settings, workshops},
    services::pricing::Quote,
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
        products::list_products,
        products::get_product,
        settings::get_settings,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::create_order,
        orders::quote,
        orders::list_orders,
        orders::get_order,
        payments::verify_payment,
        workshops::list_workshops,
        workshops::get_workshop,
        workshops::book_session,
        workshops::reschedule,
        workshops::my_registrations,
        custom_orders::create_custom_order,
        custom_orders::list_my_custom_orders,
        custom_orders::approve_quote,
        custom_orders::create_payment,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::delete_order,
        admin::sweep_pending_orders,
        admin::create_product,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::update_settings,
        admin::create_workshop,
        admin::create_session,
        admin::list_session_registrations,
        admin::list_custom_orders,
        admin::quote_custom_order,
        admin::update_custom_order_status
    ),
    components(
        schemas(
            Product,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            PaymentStatus,
            ShippingAddress,
            StoreSettings,
            Workshop,
            WorkshopSession,
            WorkshopRegistration,
            CustomOrder,
            CustomOrderStatus,
            Quote,
            AddToCartRequest,
            CartLine,
            CartList,
            LineItemRequest,
            QuoteRequest,
            QuoteResponse,
            CreateOrderRequest,
            CheckoutResponse,
            PaymentIntent,
            OrderList,
            OrderWithItems,
            UpdateOrderStatusRequest,
            SweepReport,
            VerifyPaymentRequest,
            PaymentVerification,
            PaymentTarget,
            CreateProductRequest,
            InventoryAdjustRequest,
            ProductList,
            UpdateSettingsRequest,
            BookSessionRequest,
            BookingResponse,
            RescheduleRequest,
            RescheduleResponse,
            WorkshopDetail,
            WorkshopList,
            RegistrationList,
            CreateWorkshopRequest,
            CreateSessionRequest,
            CreateCustomOrderRequest,
            QuoteCustomOrderRequest,
            UpdateCustomOrderStatusRequest,
            CustomOrderList,
            CustomOrderPayment,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<OrderWithItems>,
            ApiResponse<CheckoutResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Settings", description = "Shipping and tax settings"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Payments", description = "Gateway payment verification"),
        (name = "Workshops", description = "Workshop sessions and bookings"),
        (name = "Custom Orders", description = "Commissioned pieces"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
