//! Order route handlers.
//!
//! Visibility and status changes are decided per order from the caller's
//! relation to it: admin, owning supplier, owning buyer or none. Callers with
//! no relation get 404 so order IDs do not leak.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use medsupply_core::{OrderId, OrderStatus, PaymentStatus, ProfileId, Role, SupplierId};

use crate::db::{OrderRepository, SupplierRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path};
use crate::middleware::RequireProfile;
use crate::models::{CreateOrderRequest, Order, OrderScope, OrderView, Profile, StatusUpdateRequest};
use crate::services::place_orders;
use crate::state::AppState;

/// A list of orders.
#[derive(Debug, Serialize)]
pub struct OrdersResponse<T> {
    pub orders: Vec<T>,
}

/// How the caller relates to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActor {
    Admin,
    OwnerSupplier,
    OwnerBuyer,
}

/// The caller as seen by the order endpoints.
#[derive(Debug, Clone, Copy)]
pub struct OrderViewer {
    pub profile_id: ProfileId,
    pub role: Role,
    pub supplier_id: Option<SupplierId>,
}

impl OrderViewer {
    pub(crate) async fn resolve(state: &AppState, profile: &Profile) -> Result<Self> {
        let supplier_id = if profile.role == Role::Supplier {
            SupplierRepository::new(state.pool())
                .get_by_profile(profile.id)
                .await?
                .map(|s| s.id)
        } else {
            None
        };
        Ok(Self {
            profile_id: profile.id,
            role: profile.role,
            supplier_id,
        })
    }

    /// Orders listed for this caller.
    #[must_use]
    pub fn scope(&self) -> OrderScope {
        match (self.role, self.supplier_id) {
            (Role::Admin, _) => OrderScope::All,
            (Role::Supplier, Some(id)) => OrderScope::Supplier(id),
            _ => OrderScope::Buyer(self.profile_id),
        }
    }

    /// The caller's relation to `order`, strongest first.
    #[must_use]
    pub fn actor_for(&self, order: &Order) -> Option<OrderActor> {
        if self.role == Role::Admin {
            Some(OrderActor::Admin)
        } else if self.supplier_id == Some(order.supplier_id) {
            Some(OrderActor::OwnerSupplier)
        } else if self.profile_id == order.buyer_id {
            Some(OrderActor::OwnerBuyer)
        } else {
            None
        }
    }
}

/// Check a status and/or payment change against the caller's relation.
///
/// Admins and the owning supplier may make any valid transition and set the
/// payment status. The owning buyer may only cancel a pending order.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when nothing is requested,
/// `AppError::Unauthorized` when a buyer asks for more than a cancel and
/// `AppError::Conflict` for a transition the lifecycle does not allow.
pub fn authorize_status_change(
    actor: OrderActor,
    current: OrderStatus,
    status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
) -> Result<()> {
    if status.is_none() && payment_status.is_none() {
        return Err(AppError::BadRequest("No fields to update".to_owned()));
    }

    if actor == OrderActor::OwnerBuyer {
        if payment_status.is_some() || status != Some(OrderStatus::Cancelled) {
            return Err(AppError::Unauthorized(
                "Buyers may only cancel their orders".to_owned(),
            ));
        }
        if current != OrderStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Only pending orders can be cancelled (order is {current})"
            )));
        }
        return Ok(());
    }

    match status {
        Some(next) if !current.can_transition_to(next) => Err(AppError::Conflict(format!(
            "Cannot change order status from {current} to {next}"
        ))),
        _ => Ok(()),
    }
}

fn parse_field<T: std::str::FromStr>(value: Option<&str>, field: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| AppError::BadRequest(format!("Invalid {field}: {v}")))
        })
        .transpose()
}

/// Place orders from explicit lines or from the caller's cart.
///
/// POST /api/orders
#[instrument(skip(state, profile, request), fields(user_id = %profile.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrdersResponse<Order>>)> {
    let orders = place_orders(state.pool(), profile.id, request).await?;

    let count = orders.len().to_string();
    add_breadcrumb("orders", "Orders placed", Some(&[("count", count.as_str())]));

    Ok((StatusCode::CREATED, Json(OrdersResponse { orders })))
}

/// Orders visible to the caller, newest first.
///
/// GET /api/orders
#[instrument(skip(state, profile), fields(user_id = %profile.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
) -> Result<Json<OrdersResponse<OrderView>>> {
    let viewer = OrderViewer::resolve(&state, &profile).await?;
    let orders = OrderRepository::new(state.pool())
        .list(viewer.scope())
        .await?;
    Ok(Json(OrdersResponse { orders }))
}

/// One order with its lines.
///
/// GET /api/orders/{id}
#[instrument(skip(state, profile), fields(user_id = %profile.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let viewer = OrderViewer::resolve(&state, &profile).await?;
    let view = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|view| viewer.actor_for(&view.order).is_some())
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;
    Ok(Json(view))
}

/// Change an order's status and/or payment status.
///
/// PATCH /api/orders/{id}/status
#[instrument(skip(state, profile, request), fields(user_id = %profile.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireProfile(profile): RequireProfile,
    Path(id): Path<OrderId>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Order>> {
    let status: Option<OrderStatus> = parse_field(request.status.as_deref(), "status")?;
    let payment_status: Option<PaymentStatus> =
        parse_field(request.payment_status.as_deref(), "payment status")?;

    let viewer = OrderViewer::resolve(&state, &profile).await?;
    let orders = OrderRepository::new(state.pool());
    let view = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;
    let actor = viewer
        .actor_for(&view.order)
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    let current = view.order.status;
    authorize_status_change(actor, current, status, payment_status)?;

    let order = orders
        .update_status(id, current, status, payment_status)
        .await?;
    tracing::info!(
        order_id = %id,
        ?actor,
        from = %current,
        to = %order.status,
        payment_status = %order.payment_status,
        "Order updated"
    );
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order(buyer_id: ProfileId, supplier_id: SupplierId) -> Order {
        Order {
            id: OrderId::generate(),
            order_number: "ORD-1-ABCDEF".to_string(),
            buyer_id,
            supplier_id,
            total_amount: Decimal::new(250, 0),
            shipping_address: "Kenyatta Ave, Nairobi".to_string(),
            payment_method: None,
            notes: None,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn viewer(role: Role, supplier_id: Option<SupplierId>) -> OrderViewer {
        OrderViewer {
            profile_id: ProfileId::generate(),
            role,
            supplier_id,
        }
    }

    #[test]
    fn test_actor_resolution() {
        let supplier = SupplierId::generate();
        let buyer = viewer(Role::Buyer, None);
        let o = order(buyer.profile_id, supplier);

        assert_eq!(buyer.actor_for(&o), Some(OrderActor::OwnerBuyer));
        assert_eq!(
            viewer(Role::Supplier, Some(supplier)).actor_for(&o),
            Some(OrderActor::OwnerSupplier)
        );
        assert_eq!(viewer(Role::Admin, None).actor_for(&o), Some(OrderActor::Admin));
        assert_eq!(viewer(Role::Buyer, None).actor_for(&o), None);
        assert_eq!(
            viewer(Role::Supplier, Some(SupplierId::generate())).actor_for(&o),
            None
        );
    }

    #[test]
    fn test_scope_per_role() {
        let supplier = SupplierId::generate();
        assert_eq!(viewer(Role::Admin, None).scope(), OrderScope::All);
        assert_eq!(
            viewer(Role::Supplier, Some(supplier)).scope(),
            OrderScope::Supplier(supplier)
        );
        let buyer = viewer(Role::Buyer, None);
        assert_eq!(buyer.scope(), OrderScope::Buyer(buyer.profile_id));
    }

    #[test]
    fn test_supplier_moves_forward_only() {
        let ok = authorize_status_change(
            OrderActor::OwnerSupplier,
            OrderStatus::Pending,
            Some(OrderStatus::Confirmed),
            None,
        );
        assert!(ok.is_ok());

        let err = authorize_status_change(
            OrderActor::OwnerSupplier,
            OrderStatus::Pending,
            Some(OrderStatus::Shipped),
            None,
        );
        assert!(matches!(err, Err(AppError::Conflict(_))));

        let err = authorize_status_change(
            OrderActor::Admin,
            OrderStatus::Delivered,
            Some(OrderStatus::Cancelled),
            None,
        );
        assert!(matches!(err, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_same_status_and_payment_only_are_allowed() {
        assert!(
            authorize_status_change(
                OrderActor::Admin,
                OrderStatus::Shipped,
                Some(OrderStatus::Shipped),
                None
            )
            .is_ok()
        );
        assert!(
            authorize_status_change(
                OrderActor::OwnerSupplier,
                OrderStatus::Delivered,
                None,
                Some(PaymentStatus::Paid)
            )
            .is_ok()
        );
    }

    #[test]
    fn test_buyer_may_only_cancel_pending() {
        assert!(
            authorize_status_change(
                OrderActor::OwnerBuyer,
                OrderStatus::Pending,
                Some(OrderStatus::Cancelled),
                None
            )
            .is_ok()
        );
        assert!(matches!(
            authorize_status_change(
                OrderActor::OwnerBuyer,
                OrderStatus::Confirmed,
                Some(OrderStatus::Cancelled),
                None
            ),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            authorize_status_change(
                OrderActor::OwnerBuyer,
                OrderStatus::Pending,
                Some(OrderStatus::Confirmed),
                None
            ),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize_status_change(
                OrderActor::OwnerBuyer,
                OrderStatus::Pending,
                None,
                Some(PaymentStatus::Paid)
            ),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_empty_change_is_rejected() {
        assert!(matches!(
            authorize_status_change(OrderActor::Admin, OrderStatus::Pending, None, None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_field() {
        let parsed: Option<OrderStatus> = parse_field(Some(" shipped "), "status").unwrap();
        assert_eq!(parsed, Some(OrderStatus::Shipped));
        assert!(parse_field::<OrderStatus>(Some("lost"), "status").is_err());
        assert_eq!(parse_field::<PaymentStatus>(None, "payment status").unwrap(), None);
    }
}
