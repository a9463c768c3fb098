// EV dealership backend: catalogue, dealer inventory, test-drive
// appointments, orders and VNPay payments over a PostgreSQL store

pub mod appointments;
pub mod auth;
pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod pagination;
pub mod payments;
pub mod query;
pub mod response;
pub mod users;
pub mod validation;
pub mod vehicles;

use axum::{
    extract::FromRef,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::appointments::{AppointmentRepository, AppointmentService};
use crate::auth::{AuthService, TokenRepository, TokenService, UserRepository};
use crate::categories::{CategoryRepository, CategoryService};
use crate::config::{AppConfig, RateLimitConfig};
use crate::inventory::{InventoryRepository, InventoryService};
use crate::notifications::Notifier;
use crate::orders::{OrderService, OrdersRepository};
use crate::payments::{PaymentRepository, PaymentService, VnPayClient};
use crate::users::UserService;
use crate::vehicles::{VehicleRepository, VehicleService};

/// OpenAPI documentation for the public catalogue
#[derive(OpenApi)]
#[openapi(
    paths(
        categories::list_categories_handler,
        categories::get_category_handler,
        categories::create_category_handler,
        categories::update_category_handler,
        categories::delete_category_handler,
        vehicles::list_vehicles_handler,
        vehicles::get_vehicle_handler,
        vehicles::list_category_vehicles_handler,
        vehicles::create_vehicle_handler,
        vehicles::update_vehicle_handler,
        vehicles::delete_vehicle_handler,
        vehicles::restore_vehicle_handler,
    ),
    components(schemas(
        categories::Category,
        categories::CategoryRequest,
        vehicles::Vehicle,
        vehicles::VehicleRequest,
        pagination::VehiclePage,
        response::CategoryEnvelope,
        response::CategoryListEnvelope,
        response::VehicleEnvelope,
        response::VehicleListEnvelope,
        response::VehiclePageEnvelope,
        error::ErrorResponse,
        orders::OrderStatus,
        orders::OrderResponse,
        orders::OrderCustomer,
        orders::OrderDealer,
        orders::OrderVehicleResponse,
        orders::CreateOrderRequest,
        orders::OrderItemRequest,
        payments::PaymentUrlResponse,
        payments::PaymentResult,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "categories", description = "Vehicle category management"),
        (name = "vehicles", description = "Vehicle catalogue browsing and management")
    ),
    info(
        title = "EV Dealer API",
        version = "1.0.0",
        description = "RESTful API for an electric-vehicle dealership"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}

/// Application state shared across handlers.
/// Each handler extracts only the service it needs through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub notifier: Notifier,
    pub auth: AuthService,
    pub users: UserService,
    pub categories: CategoryService,
    pub vehicles: VehicleService,
    pub inventory: InventoryService,
    pub appointments: AppointmentService,
    pub orders: OrderService,
    pub payments: PaymentService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        let tokens = Arc::new(TokenService::with_durations(
            config.jwt_secret.clone(),
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        ));
        let notifier = Notifier::new();

        let user_repo = UserRepository::new(pool.clone());
        let token_repo = TokenRepository::new(pool.clone());
        let inventory_repo = InventoryRepository::new(pool.clone());

        let auth = AuthService::new(user_repo.clone(), token_repo.clone(), tokens.clone());
        let users = UserService::new(user_repo, token_repo, auth.clone());
        let orders = OrderService::new(
            OrdersRepository::new(pool.clone()),
            inventory_repo.clone(),
            notifier.clone(),
        );
        let payments = PaymentService::new(
            PaymentRepository::new(pool.clone()),
            orders.clone(),
            VnPayClient::new(config.vnpay.clone()),
            notifier.clone(),
        );

        Self {
            categories: CategoryService::new(CategoryRepository::new(pool.clone()), notifier.clone()),
            vehicles: VehicleService::new(VehicleRepository::new(pool.clone()), notifier.clone()),
            inventory: InventoryService::new(inventory_repo, notifier.clone()),
            appointments: AppointmentService::new(AppointmentRepository::new(pool), notifier.clone()),
            tokens,
            notifier,
            auth,
            users,
            orders,
            payments,
        }
    }
}

macro_rules! state_part {
    ($field:ident: $ty:ty) => {
        impl FromRef<AppState> for $ty {
            fn from_ref(state: &AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}

state_part!(tokens: Arc<TokenService>);
state_part!(notifier: Notifier);
state_part!(auth: AuthService);
state_part!(users: UserService);
state_part!(categories: CategoryService);
state_part!(vehicles: VehicleService);
state_part!(inventory: InventoryService);
state_part!(appointments: AppointmentService);
state_part!(orders: OrderService);
state_part!(payments: PaymentService);

/// Creates and configures the application router.
///
/// With a rate limit configured, the auth routes are keyed by peer address,
/// so the server must be run with `into_make_service_with_connect_info`.
pub fn create_router(state: AppState, login_rate_limit: Option<RateLimitConfig>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut auth_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/refresh", post(auth::refresh_handler))
        .route("/logout", post(auth::logout_handler));

    if let Some(limit) = login_rate_limit {
        match GovernorConfigBuilder::default()
            .per_second(limit.per_second)
            .burst_size(limit.burst_size)
            .finish()
        {
            Some(governor) => {
                tracing::info!(
                    "Auth rate limit: {} per second, burst {}",
                    limit.per_second,
                    limit.burst_size
                );
                auth_routes = auth_routes.layer(GovernorLayer {
                    config: Box::leak(Box::new(governor)),
                });
            }
            None => tracing::warn!("Ignoring invalid auth rate limit settings"),
        }
    }

    let auth_routes = auth_routes.route("/me", get(auth::me_handler));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/auth", auth_routes)
        .route("/api/users", get(users::list_users_handler))
        .route(
            "/api/users/:id",
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(
            "/api/categories",
            get(categories::list_categories_handler).post(categories::create_category_handler),
        )
        .route(
            "/api/categories/:id",
            get(categories::get_category_handler)
                .put(categories::update_category_handler)
                .delete(categories::delete_category_handler),
        )
        .route(
            "/api/categories/:id/vehicles",
            get(vehicles::list_category_vehicles_handler),
        )
        .route(
            "/api/vehicles",
            get(vehicles::list_vehicles_handler).post(vehicles::create_vehicle_handler),
        )
        .route(
            "/api/vehicles/:id",
            get(vehicles::get_vehicle_handler)
                .put(vehicles::update_vehicle_handler)
                .delete(vehicles::delete_vehicle_handler),
        )
        .route("/api/vehicles/:id/restore", post(vehicles::restore_vehicle_handler))
        .route(
            "/api/inventory",
            get(inventory::list_inventory_handler).post(inventory::add_inventory_handler),
        )
        .route(
            "/api/inventory/:vehicle_id",
            get(inventory::get_inventory_item_handler)
                .put(inventory::update_inventory_handler)
                .delete(inventory::remove_inventory_handler),
        )
        .route("/api/appointments/slots", get(appointments::available_slots_handler))
        .route(
            "/api/appointments",
            get(appointments::list_appointments_handler).post(appointments::create_appointment_handler),
        )
        .route(
            "/api/appointments/:id",
            get(appointments::get_appointment_handler).put(appointments::reschedule_appointment_handler),
        )
        .route("/api/appointments/:id/cancel", post(appointments::cancel_appointment_handler))
        .route("/api/appointments/:id/approve", post(appointments::approve_appointment_handler))
        .route("/api/appointments/:id/start", post(appointments::start_appointment_handler))
        .route("/api/appointments/:id/complete", post(appointments::complete_appointment_handler))
        .route(
            "/api/orders",
            get(orders::list_orders_handler).post(orders::create_order_handler),
        )
        .route("/api/orders/:id", get(orders::get_order_handler))
        .route("/api/orders/:id/status", patch(orders::update_order_status_handler))
        .route("/api/payments/vnpay/return", get(payments::payment_return_handler))
        .route("/api/payments/vnpay/:order_id", post(payments::create_payment_handler))
        .route("/api/live", get(notifications::live_events_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
