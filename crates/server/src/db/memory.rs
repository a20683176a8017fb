//! In-memory stores.
//!
//! Used by unit and integration tests, and handy for running the HTTP layer
//! without a database. They follow the same contracts as the `PostgreSQL`
//! implementations, including unique usernames and order numbers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use ecommerce_store_core::{
    OrderId, OrderItemId, OrderNumber, OrderStatus, ProductId, UserId, Username,
};

use super::{CartStore, OrderStore, ProductCatalog, RepositoryError, UserStore};
use crate::models::{CartItem, NewOrder, NewUser, Order, OrderItem, Product, ProductInput, User};

/// Catalog held in a map keyed by product id.
#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog pre-filled with `products`, keeping their ids.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: RwLock::new(products.into_iter().map(|p| (p.id, p)).collect()),
        }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| p.active && ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.active).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        let next_id = products.keys().next_back().map_or(1, |id| id.as_i32() + 1);
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(next_id),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            image_url: input.image_url.clone(),
            active: input.active,
            created_at: now,
            updated_at: now,
        };
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).map(|product| {
            product.name.clone_from(&input.name);
            product.description.clone_from(&input.description);
            product.price = input.price;
            product.image_url.clone_from(&input.image_url);
            product.active = input.active;
            product.updated_at = Utc::now();
            product.clone()
        }))
    }

    async fn set_active(
        &self,
        id: ProductId,
        active: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).map(|product| {
            product.active = active;
            product.updated_at = Utc::now();
            product.clone()
        }))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.products.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
struct OrderTables {
    orders: Vec<Order>,
    next_item_id: i32,
}

/// Orders held in insertion order.
#[derive(Default)]
pub struct InMemoryOrderStore {
    tables: RwLock<OrderTables>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(RepositoryError::Conflict(
                "order number already exists".to_owned(),
            ));
        }

        let order_id = OrderId::new(i32::try_from(tables.orders.len()).unwrap_or(i32::MAX) + 1);
        let mut items = Vec::with_capacity(order.items.len());
        for item in order.items {
            tables.next_item_id += 1;
            items.push(OrderItem {
                id: OrderItemId::new(tables.next_item_id),
                product_id: item.product_id,
                product_name: item.product_name,
                product_price: item.product_price,
                product_image_url: item.product_image_url,
                quantity: item.quantity,
                subtotal: item.subtotal,
            });
        }

        let saved = Order {
            id: order_id,
            user_id: order.user_id,
            order_number: order.order_number,
            order_date: order.order_date,
            status: order.status,
            shipping_address: order.shipping_address,
            total_amount: order.total_amount,
            items,
        };
        tables.orders.push(saved.clone());
        Ok(saved)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| &o.order_number == order_number)
            .cloned())
    }

    async fn update_status(
        &self,
        order_number: &OrderNumber,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .orders
            .iter_mut()
            .find(|o| &o.order_number == order_number && o.status == expected)
            .map(|order| {
                order.status = next;
                order.clone()
            }))
    }
}

struct StoredUser {
    user: User,
    password_hash: String,
}

/// User accounts held in a list.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<StoredUser>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable an account. Returns `false` if the user is unknown.
    pub async fn set_enabled(&self, username: &Username, enabled: bool) -> bool {
        let mut users = self.users.write().await;
        users
            .iter_mut()
            .find(|s| &s.user.username == username)
            .map(|s| s.user.enabled = enabled)
            .is_some()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.iter().any(|s| s.user.username == new_user.username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(i32::try_from(users.len()).unwrap_or(i32::MAX) + 1),
            username: new_user.username.clone(),
            roles: new_user.roles.clone(),
            enabled: true,
            created_at: now,
            updated_at: now,
        };
        users.push(StoredUser {
            user: user.clone(),
            password_hash: new_user.password_hash.clone(),
        });
        Ok(user)
    }

    async fn find_with_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|s| &s.user.username == username)
            .map(|s| (s.user.clone(), s.password_hash.clone())))
    }
}

/// Saved carts keyed by user.
#[derive(Default)]
pub struct InMemoryCartStore {
    carts: RwLock<BTreeMap<UserId, Vec<CartItem>>>,
}

impl InMemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(self
            .carts
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_items(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<Vec<CartItem>, RepositoryError> {
        self.carts.write().await.insert(user_id, items.to_vec());
        Ok(items.to_vec())
    }
}
