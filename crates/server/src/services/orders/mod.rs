//! Order workflow.
//!
//! Turns a submitted cart into a priced, persisted order, answers order
//! queries, and moves orders through their lifecycle. Prices always come
//! from the catalog at order time; anything the client says about price is
//! ignored.

mod error;

pub use error::{InvalidOrderReason, OrderError};

use std::collections::HashMap;

use chrono::Utc;
use tracing::instrument;

use ecommerce_store_core::{
    OrderNumber, OrderNumberGenerator, OrderStatus, Price, ProductId, Quantity, QuantityError,
    UserId,
};

use crate::db::{OrderStore, ProductCatalog, RepositoryError};
use crate::models::{CartLine, NewOrder, NewOrderItem, Order, Product};

/// Order workflow over a product catalog and an order store.
pub struct OrderService<'a> {
    catalog: &'a dyn ProductCatalog,
    orders: &'a dyn OrderStore,
    numbers: &'a OrderNumberGenerator,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        catalog: &'a dyn ProductCatalog,
        orders: &'a dyn OrderStore,
        numbers: &'a OrderNumberGenerator,
    ) -> Self {
        Self {
            catalog,
            orders,
            numbers,
        }
    }

    /// Create an order for `user_id` from the submitted cart.
    ///
    /// Every line is validated and priced before anything is written, and
    /// the order is stored in a single transaction. Items keep the cart
    /// order; repeated product ids become separate items.
    ///
    /// # Errors
    ///
    /// - `OrderError::InvalidOrder` if the cart is empty, names a product
    ///   that is missing or inactive, or has a bad quantity.
    /// - `OrderError::Conflict` if the generated order number is taken.
    /// - `OrderError::Storage` if the catalog or the store fails.
    #[instrument(skip(self, cart_items, shipping_address), fields(items = cart_items.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        cart_items: &[CartLine],
        shipping_address: &str,
    ) -> Result<Order, OrderError> {
        if cart_items.is_empty() {
            tracing::warn!(%user_id, "attempt to create order with empty cart");
            return Err(InvalidOrderReason::EmptyCart.into());
        }

        let products = self.load_products(cart_items).await?;

        let mut items = Vec::with_capacity(cart_items.len());
        for line in cart_items {
            let product = products
                .get(&line.product_id)
                .ok_or(InvalidOrderReason::ProductUnavailable)?;
            items.push(price_line(product, line)?);
        }

        let total_amount = Price::try_sum(items.iter().map(|item| item.subtotal))
            .map_err(|_| InvalidOrderReason::AmountTooLarge)?;

        let new_order = NewOrder {
            user_id,
            order_number: self.numbers.next(),
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            shipping_address: shipping_address.to_owned(),
            total_amount,
            items,
        };

        let order = self.orders.save(new_order).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => OrderError::Conflict(msg),
            other => OrderError::Storage(other),
        })?;

        tracing::info!(
            %user_id,
            order_number = %order.order_number,
            total_amount = %order.total_amount,
            "order created"
        );
        Ok(order)
    }

    /// Fetch every distinct product in the cart with one catalog call.
    async fn load_products(
        &self,
        cart_items: &[CartLine],
    ) -> Result<HashMap<ProductId, Product>, OrderError> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(cart_items.len());
        for line in cart_items {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }

        let products: HashMap<ProductId, Product> = self
            .catalog
            .find_products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        if ids.iter().any(|id| !products.contains_key(id)) {
            tracing::warn!(
                requested = ids.len(),
                found = products.len(),
                "cart references unavailable products"
            );
            return Err(InvalidOrderReason::ProductUnavailable.into());
        }
        Ok(products)
    }

    /// Orders placed by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn get_user_orders(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        let orders = self.orders.find_by_user_id(user_id).await?;
        tracing::debug!(count = orders.len(), "loaded user orders");
        Ok(orders)
    }

    /// Look up an order by number. A missing order is `Ok(None)`.
    ///
    /// No ownership check happens here.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Storage` if the store fails.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn get_order_by_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, OrderError> {
        Ok(self.orders.find_by_order_number(order_number).await?)
    }

    /// Move an order to `new_status` if the lifecycle allows it.
    ///
    /// The write only succeeds if the status is still the one that was
    /// checked, so two racing updates cannot both apply.
    ///
    /// # Errors
    ///
    /// - `OrderError::NotFound` if no order has this number.
    /// - `OrderError::InvalidTransition` if the move is not allowed.
    /// - `OrderError::Conflict` if the status changed concurrently.
    /// - `OrderError::Storage` if the store fails.
    #[instrument(skip(self), fields(order_number = %order_number, to = %new_status))]
    pub async fn update_order_status(
        &self,
        order_number: &OrderNumber,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let current = self
            .orders
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_number.clone()))?;

        if !current.status.can_transition_to(new_status) {
            tracing::warn!(from = %current.status, "rejected status change");
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to: new_status,
            });
        }

        let updated = self
            .orders
            .update_status(order_number, current.status, new_status)
            .await?
            .ok_or_else(|| {
                OrderError::Conflict(format!(
                    "Order {order_number} was modified concurrently, please retry"
                ))
            })?;

        tracing::info!(from = %current.status, "order status updated");
        Ok(updated)
    }

    /// Cancel an order. Allowed while it is pending or processing.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_order_status`].
    pub async fn cancel_order(&self, order_number: &OrderNumber) -> Result<Order, OrderError> {
        self.update_order_status(order_number, OrderStatus::Cancelled)
            .await
    }
}

/// Build a line item from the catalog product and the submitted quantity.
fn price_line(product: &Product, line: &CartLine) -> Result<NewOrderItem, InvalidOrderReason> {
    let quantity = Quantity::parse_json(&line.quantity).map_err(|e| {
        tracing::warn!(product_id = %product.id, quantity = %line.quantity, "invalid quantity");
        match e {
            QuantityError::Unparsable => InvalidOrderReason::InvalidQuantity {
                product_name: product.name.clone(),
            },
            QuantityError::NotPositive => InvalidOrderReason::NonPositiveQuantity {
                product_name: product.name.clone(),
            },
        }
    })?;

    let subtotal = product
        .price
        .line_total(quantity)
        .map_err(|_| InvalidOrderReason::AmountTooLarge)?;

    Ok(NewOrderItem {
        product_id: product.id,
        product_name: product.name.clone(),
        product_price: product.price,
        product_image_url: product.image_url.clone(),
        quantity,
        subtotal,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::db::memory::{InMemoryOrderStore, InMemoryProductCatalog};
    use crate::models::ProductInput;

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    fn product(id: i32, name: &str, cents: i64, active: bool) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: None,
            price: price(cents),
            image_url: Some(format!("https://img.test/{id}.png")),
            active,
            created_at: now,
            updated_at: now,
        }
    }

    struct Fixture {
        catalog: InMemoryProductCatalog,
        orders: InMemoryOrderStore,
        numbers: OrderNumberGenerator,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                catalog: InMemoryProductCatalog::with_products([
                    product(1, "Widget", 1099, true),
                    product(2, "Gadget", 2050, true),
                    product(3, "Retired", 500, false),
                ]),
                orders: InMemoryOrderStore::new(),
                numbers: OrderNumberGenerator::new(),
            }
        }

        fn service(&self) -> OrderService<'_> {
            OrderService::new(&self.catalog, &self.orders, &self.numbers)
        }
    }

    fn line(id: i32, quantity: serde_json::Value) -> CartLine {
        CartLine::new(ProductId::new(id), quantity)
    }

    fn user() -> UserId {
        UserId::new(7)
    }

    #[tokio::test]
    async fn test_create_order_prices_from_catalog() {
        let fx = Fixture::new();
        let order = fx
            .service()
            .create_order(user(), &[line(1, json!(2)), line(2, json!(1))], "1 Main St")
            .await
            .unwrap();

        assert_eq!(order.total_amount, price(4248));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.shipping_address, "1 Main St");
        assert!(order.order_number.as_str().starts_with("ORD-"));

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product_name, "Widget");
        assert_eq!(order.items[0].subtotal, price(2198));
        assert_eq!(order.items[1].product_name, "Gadget");
        assert_eq!(order.items[1].subtotal, price(2050));
        assert_eq!(
            order.items[0].product_image_url.as_deref(),
            Some("https://img.test/1.png")
        );
    }

    #[tokio::test]
    async fn test_create_order_accepts_string_quantities() {
        let fx = Fixture::new();
        let order = fx
            .service()
            .create_order(user(), &[line(2, json!("3"))], "")
            .await
            .unwrap();
        assert_eq!(order.total_amount, price(6150));
        assert_eq!(order.shipping_address, "");
    }

    #[tokio::test]
    async fn test_duplicate_products_become_separate_items() {
        let fx = Fixture::new();
        let order = fx
            .service()
            .create_order(user(), &[line(1, json!(1)), line(1, json!(2))], "")
            .await
            .unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_amount, price(3297));
    }

    #[tokio::test]
    async fn test_total_is_sum_of_subtotals() {
        let fx = Fixture::new();
        let order = fx
            .service()
            .create_order(
                user(),
                &[line(2, json!(7)), line(1, json!(13)), line(2, json!(1))],
                "",
            )
            .await
            .unwrap();
        let sum = Price::try_sum(order.items.iter().map(|i| i.subtotal)).unwrap();
        assert_eq!(order.total_amount, sum);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let fx = Fixture::new();
        let err = fx.service().create_order(user(), &[], "").await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidOrder(InvalidOrderReason::EmptyCart)
        ));
        assert!(err.to_string().contains("empty cart"));
        assert!(fx.orders.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let fx = Fixture::new();
        let err = fx
            .service()
            .create_order(user(), &[line(1, json!(1)), line(99, json!(1))], "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidOrder(InvalidOrderReason::ProductUnavailable)
        ));
        assert!(fx.orders.is_empty().await);
    }

    #[tokio::test]
    async fn test_inactive_product_is_rejected() {
        let fx = Fixture::new();
        let err = fx
            .service()
            .create_order(user(), &[line(3, json!(1))], "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidOrder(InvalidOrderReason::ProductUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_bad_quantities_are_rejected() {
        let fx = Fixture::new();
        for quantity in [json!(0), json!(-1), json!("-4")] {
            let err = fx
                .service()
                .create_order(user(), &[line(1, quantity.clone())], "")
                .await
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    OrderError::InvalidOrder(InvalidOrderReason::NonPositiveQuantity { .. })
                ),
                "{quantity}"
            );
            assert_eq!(
                err.to_string(),
                "Quantity must be greater than zero for product: Widget"
            );
        }

        for quantity in [json!("abc"), json!(1.5), json!(null)] {
            let err = fx
                .service()
                .create_order(user(), &[line(1, quantity.clone())], "")
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid quantity for product: Widget",
                "{quantity}"
            );
        }
        assert!(fx.orders.is_empty().await);
    }

    #[tokio::test]
    async fn test_late_bad_quantity_writes_nothing() {
        let fx = Fixture::new();
        let result = fx
            .service()
            .create_order(user(), &[line(1, json!(2)), line(2, json!(0))], "")
            .await;
        assert!(result.is_err());
        assert!(fx.orders.is_empty().await);
    }

    #[tokio::test]
    async fn test_oversized_amounts_are_invalid_orders() {
        let fx = Fixture {
            catalog: InMemoryProductCatalog::with_products([
                product(1, "Piano", 100_000_000, true),
                product(2, "Yacht", 60_000_000_000_000, true),
            ]),
            orders: InMemoryOrderStore::new(),
            numbers: OrderNumberGenerator::new(),
        };

        // Line subtotal above the storable maximum.
        let err = fx
            .service()
            .create_order(user(), &[line(1, json!(2_000_000_000))], "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidOrder(InvalidOrderReason::AmountTooLarge)
        ));

        // Each line fits, the total does not.
        let err = fx
            .service()
            .create_order(user(), &[line(2, json!(1)), line(2, json!(1))], "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidOrder(InvalidOrderReason::AmountTooLarge)
        ));
        assert!(fx.orders.is_empty().await);
    }

    #[tokio::test]
    async fn test_order_numbers_are_unique() {
        let fx = Fixture::new();
        let service = fx.service();
        let a = service
            .create_order(user(), &[line(1, json!(1))], "")
            .await
            .unwrap();
        let b = service
            .create_order(user(), &[line(1, json!(1))], "")
            .await
            .unwrap();
        assert_ne!(a.order_number, b.order_number);
    }

    #[tokio::test]
    async fn test_catalog_price_change_does_not_touch_existing_orders() {
        let fx = Fixture::new();
        let service = fx.service();
        let order = service
            .create_order(user(), &[line(1, json!(1))], "")
            .await
            .unwrap();

        let input = ProductInput {
            name: "Widget v2".to_owned(),
            description: None,
            price: price(9999),
            image_url: None,
            active: true,
        };
        fx.catalog.update(ProductId::new(1), &input).await.unwrap();

        let stored = service
            .get_order_by_number(&order.order_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.items[0].product_name, "Widget");
        assert_eq!(stored.items[0].product_price, price(1099));
    }

    #[tokio::test]
    async fn test_get_user_orders() {
        let fx = Fixture::new();
        let service = fx.service();
        assert!(service.get_user_orders(user()).await.unwrap().is_empty());

        let first = service
            .create_order(user(), &[line(1, json!(1))], "")
            .await
            .unwrap();
        let second = service
            .create_order(user(), &[line(2, json!(1))], "")
            .await
            .unwrap();
        service
            .create_order(UserId::new(8), &[line(2, json!(1))], "")
            .await
            .unwrap();

        let orders = service.get_user_orders(user()).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_number, second.order_number);
        assert_eq!(orders[1].order_number, first.order_number);
    }

    #[tokio::test]
    async fn test_get_order_by_number_missing_is_none() {
        let fx = Fixture::new();
        let found = fx
            .service()
            .get_order_by_number(&OrderNumber::new("ORD-0"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let fx = Fixture::new();
        let service = fx.service();
        let order = service
            .create_order(user(), &[line(1, json!(2))], "")
            .await
            .unwrap();
        let number = &order.order_number;

        for next in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let updated = service.update_order_status(number, next).await.unwrap();
            assert_eq!(updated.status, next);
            assert_eq!(updated.items, order.items);
            assert_eq!(updated.total_amount, order.total_amount);
        }

        let err = service
            .update_order_status(number, OrderStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Processing
            }
        ));
        assert_eq!(
            err.to_string(),
            "Cannot change order status from DELIVERED to PROCESSING"
        );
    }

    #[tokio::test]
    async fn test_update_status_unknown_order() {
        let fx = Fixture::new();
        let err = fx
            .service()
            .update_order_status(&OrderNumber::new("ORD-404"), OrderStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cancel_order() {
        let fx = Fixture::new();
        let service = fx.service();
        let order = service
            .create_order(user(), &[line(1, json!(1))], "")
            .await
            .unwrap();

        let cancelled = service.cancel_order(&order.order_number).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let err = service.cancel_order(&order.order_number).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_cannot_cancel_shipped_order() {
        let fx = Fixture::new();
        let service = fx.service();
        let order = service
            .create_order(user(), &[line(1, json!(1))], "")
            .await
            .unwrap();
        let number = &order.order_number;
        service
            .update_order_status(number, OrderStatus::Processing)
            .await
            .unwrap();
        service
            .update_order_status(number, OrderStatus::Shipped)
            .await
            .unwrap();

        assert!(matches!(
            service.cancel_order(number).await,
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled
            })
        ));
    }

    /// Store whose status writes always lose the race.
    struct RacingStore(InMemoryOrderStore);

    #[async_trait]
    impl OrderStore for RacingStore {
        async fn save(&self, order: NewOrder) -> Result<Order, RepositoryError> {
            self.0.save(order).await
        }

        async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
            self.0.find_by_user_id(user_id).await
        }

        async fn find_by_order_number(
            &self,
            order_number: &OrderNumber,
        ) -> Result<Option<Order>, RepositoryError> {
            self.0.find_by_order_number(order_number).await
        }

        async fn update_status(
            &self,
            _order_number: &OrderNumber,
            _expected: OrderStatus,
            _next: OrderStatus,
        ) -> Result<Option<Order>, RepositoryError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_concurrent_status_change_is_a_conflict() {
        let fx = Fixture::new();
        let store = RacingStore(InMemoryOrderStore::new());
        let service = OrderService::new(&fx.catalog, &store, &fx.numbers);
        let order = service
            .create_order(user(), &[line(1, json!(1))], "")
            .await
            .unwrap();

        let err = service
            .update_order_status(&order.order_number, OrderStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Conflict(_)));
    }

    /// Catalog that is always down.
    struct BrokenCatalog;

    #[async_trait]
    impl ProductCatalog for BrokenCatalog {
        async fn find_products_by_ids(
            &self,
            _ids: &[ProductId],
        ) -> Result<Vec<Product>, RepositoryError> {
            Err(RepositoryError::DataCorruption("catalog offline".to_owned()))
        }

        async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: ProductId) -> Result<Option<Product>, RepositoryError> {
            Ok(None)
        }

        async fn create(&self, _input: &ProductInput) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound)
        }

        async fn update(
            &self,
            _id: ProductId,
            _input: &ProductInput,
        ) -> Result<Option<Product>, RepositoryError> {
            Ok(None)
        }

        async fn set_active(
            &self,
            _id: ProductId,
            _active: bool,
        ) -> Result<Option<Product>, RepositoryError> {
            Ok(None)
        }

        async fn delete(&self, _id: ProductId) -> Result<bool, RepositoryError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_catalog_failure_is_a_storage_error() {
        let orders = InMemoryOrderStore::new();
        let numbers = OrderNumberGenerator::new();
        let service = OrderService::new(&BrokenCatalog, &orders, &numbers);

        let err = service
            .create_order(user(), &[line(1, json!(1))], "")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Storage(_)));
        assert!(orders.is_empty().await);
    }
}
