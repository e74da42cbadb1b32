//! Postgres-backed storage implementation.
//!
//! The fulfillment transaction maps onto one database transaction. The stock
//! decrement is a conditional `UPDATE … WHERE stock >= qty RETURNING …`: the
//! row lock taken by the update serializes concurrent decrements against the
//! same product, and the condition is re-evaluated against the latest
//! committed row, so a committed decrement can never act on a stale stock
//! value or drive stock negative. The schema backs this up with a
//! `CHECK (stock >= 0)` constraint.
//!
//! Error mapping lives in [`crate::error::map_sqlx_error`]: serialization
//! failures, deadlocks, and unique-key races surface as
//! [`StorageError::Conflict`] so callers know a retry is safe.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use orderflow_core::{DeliveryId, OrderId, ProductId};
use orderflow_deliveries::{Delivery, DeliveryStatus};
use orderflow_inventory::InventoryItem;
use orderflow_orders::{Order, OrderStatus};

use crate::error::{DecrementError, StorageError, map_sqlx_error};
use crate::repository::{DeliveryRegister, OrderStore, StockLedger};
use crate::uow::{FulfillmentTx, UnitOfWork};

/// Schema for the three persisted collections plus the idempotency ledger.
///
/// Foreign keys are application-level by design (the orchestrator is the only
/// writer that creates linked rows, and it does so in one transaction).
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_items (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    stock BIGINT NOT NULL CHECK (stock >= 0),
    price BIGINT NOT NULL CHECK (price >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    product_id UUID NOT NULL,
    qty BIGINT NOT NULL CHECK (qty > 0),
    customer_id TEXT NOT NULL,
    address TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS deliveries (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL,
    customer_id TEXT NOT NULL,
    qty BIGINT NOT NULL CHECK (qty > 0),
    address TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS fulfillments (
    request_id UUID PRIMARY KEY,
    order_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// Postgres storage backend.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the given database URL.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl StockLedger for PostgresStorage {
    #[instrument(skip(self), fields(id = %id), err)]
    async fn get(&self, id: ProductId) -> Result<Option<InventoryItem>, StorageError> {
        let row = sqlx::query(
            "SELECT id, name, stock, price, created_at FROM inventory_items WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_item", e))?;

        row.map(|r| decode_item(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<InventoryItem>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, name, stock, price, created_at FROM inventory_items ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(decode_item).collect()
    }

    #[instrument(skip(self, item), fields(id = %item.id), err)]
    async fn insert(&self, item: &InventoryItem) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO inventory_items (id, name, stock, price, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.stock)
        .bind(item.price)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        Ok(())
    }

    #[instrument(skip(self, name), fields(id = %id), err)]
    async fn update_details(
        &self,
        id: ProductId,
        name: &str,
        price: i64,
    ) -> Result<Option<InventoryItem>, StorageError> {
        let row = sqlx::query(
            "UPDATE inventory_items SET name = $2, price = $3 WHERE id = $1 \
             RETURNING id, name, stock, price, created_at",
        )
        .bind(id.as_uuid())
        .bind(name)
        .bind(price)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        row.map(|r| decode_item(&r)).transpose()
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(id = %id, delta), err)]
    async fn adjust(&self, id: ProductId, delta: i64) -> Result<InventoryItem, DecrementError> {
        // Conditional update; the row lock serializes concurrent adjustments.
        let row = sqlx::query(
            "UPDATE inventory_items SET stock = stock + $2 \
             WHERE id = $1 AND stock + $2 >= 0 \
             RETURNING id, name, stock, price, created_at",
        )
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("adjust_stock", e))?;

        match row {
            Some(r) => Ok(decode_item(&r)?),
            None => {
                let available = current_stock(&self.pool, id, "adjust_stock").await?;
                match available {
                    // saturating_neg: `-i64::MIN` would overflow.
                    Some(available) => Err(DecrementError::Insufficient {
                        available,
                        requested: delta.saturating_neg(),
                    }),
                    None => Err(DecrementError::NotFound),
                }
            }
        }
    }
}

#[async_trait]
impl OrderStore for PostgresStorage {
    #[instrument(skip(self), fields(id = %id), err)]
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        let row = sqlx::query(
            "SELECT id, product_id, qty, customer_id, address, status, created_at \
             FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?;

        row.map(|r| decode_order(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, product_id, qty, customer_id, address, status, created_at \
             FROM orders ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        rows.iter().map(decode_order).collect()
    }

    #[instrument(skip(self, order), fields(id = %order.id), err)]
    async fn insert(&self, order: &Order) -> Result<(), StorageError> {
        insert_order(&self.pool, order, "insert_order").await
    }

    #[instrument(skip(self, order), fields(id = %order.id), err)]
    async fn update(&self, order: &Order) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE orders SET product_id = $2, qty = $3, customer_id = $4, \
             address = $5, status = $6 WHERE id = $1",
        )
        .bind(order.id.as_uuid())
        .bind(order.product_id.as_uuid())
        .bind(order.qty)
        .bind(&order.customer_id)
        .bind(&order.address)
        .bind(order.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: OrderId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DeliveryRegister for PostgresStorage {
    #[instrument(skip(self), fields(id = %id), err)]
    async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>, StorageError> {
        let row = sqlx::query(
            "SELECT id, order_id, customer_id, qty, address, status, created_at \
             FROM deliveries WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_delivery", e))?;

        row.map(|r| decode_delivery(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<Delivery>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, order_id, customer_id, qty, address, status, created_at \
             FROM deliveries ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_deliveries", e))?;

        rows.iter().map(decode_delivery).collect()
    }

    #[instrument(skip(self, delivery), fields(id = %delivery.id), err)]
    async fn update(&self, delivery: &Delivery) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE deliveries SET order_id = $2, customer_id = $3, qty = $4, \
             address = $5, status = $6 WHERE id = $1",
        )
        .bind(delivery.id.as_uuid())
        .bind(delivery.order_id.as_uuid())
        .bind(&delivery.customer_id)
        .bind(delivery.qty)
        .bind(&delivery.address)
        .bind(delivery.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_delivery", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: DeliveryId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM deliveries WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_delivery", e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// One open fulfillment transaction on a pooled connection.
struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresStorage {
    async fn begin(&self) -> Result<Box<dyn FulfillmentTx>, StorageError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

#[async_trait]
impl FulfillmentTx for PostgresTx {
    async fn inventory_item(
        &mut self,
        id: ProductId,
    ) -> Result<Option<InventoryItem>, StorageError> {
        let row = sqlx::query(
            "SELECT id, name, stock, price, created_at FROM inventory_items WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("tx_get_item", e))?;

        row.map(|r| decode_item(&r)).transpose()
    }

    async fn decrement_stock(
        &mut self,
        id: ProductId,
        qty: i64,
    ) -> Result<InventoryItem, DecrementError> {
        let row = sqlx::query(
            "UPDATE inventory_items SET stock = stock - $2 \
             WHERE id = $1 AND stock >= $2 \
             RETURNING id, name, stock, price, created_at",
        )
        .bind(id.as_uuid())
        .bind(qty)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;

        match row {
            Some(r) => Ok(decode_item(&r)?),
            None => {
                let available = current_stock(&mut *self.tx, id, "decrement_stock").await?;
                match available {
                    Some(available) => Err(DecrementError::Insufficient {
                        available,
                        requested: qty,
                    }),
                    None => Err(DecrementError::NotFound),
                }
            }
        }
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StorageError> {
        insert_order(&mut *self.tx, order, "tx_insert_order").await
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StorageError> {
        let row = sqlx::query(
            "SELECT id, product_id, qty, customer_id, address, status, created_at \
             FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("tx_get_order", e))?;

        row.map(|r| decode_order(&r)).transpose()
    }

    async fn insert_delivery(&mut self, delivery: &Delivery) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO deliveries (id, order_id, customer_id, qty, address, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(delivery.id.as_uuid())
        .bind(delivery.order_id.as_uuid())
        .bind(&delivery.customer_id)
        .bind(delivery.qty)
        .bind(&delivery.address)
        .bind(delivery.status.as_str())
        .bind(delivery.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("tx_insert_delivery", e))?;
        Ok(())
    }

    async fn find_fulfillment(
        &mut self,
        request_id: Uuid,
    ) -> Result<Option<OrderId>, StorageError> {
        let row = sqlx::query("SELECT order_id FROM fulfillments WHERE request_id = $1")
            .bind(request_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_fulfillment", e))?;

        row.map(|r| {
            let order_id: Uuid = r
                .try_get("order_id")
                .map_err(|e| StorageError::database("find_fulfillment", e.to_string()))?;
            Ok(OrderId::from_uuid(order_id))
        })
        .transpose()
    }

    async fn record_fulfillment(
        &mut self,
        request_id: Uuid,
        order_id: OrderId,
    ) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO fulfillments (request_id, order_id) VALUES ($1, $2)")
            .bind(request_id)
            .bind(order_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("record_fulfillment", e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

async fn insert_order<'e, E>(executor: E, order: &Order, op: &'static str) -> Result<(), StorageError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO orders (id, product_id, qty, customer_id, address, status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(order.id.as_uuid())
    .bind(order.product_id.as_uuid())
    .bind(order.qty)
    .bind(&order.customer_id)
    .bind(&order.address)
    .bind(order.status.as_str())
    .bind(order.created_at)
    .execute(executor)
    .await
    .map_err(|e| map_sqlx_error(op, e))?;
    Ok(())
}

async fn current_stock<'e, E>(
    executor: E,
    id: ProductId,
    op: &'static str,
) -> Result<Option<i64>, StorageError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row = sqlx::query("SELECT stock FROM inventory_items WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(executor)
        .await
        .map_err(|e| map_sqlx_error(op, e))?;

    row.map(|r| {
        r.try_get("stock")
            .map_err(|e| StorageError::database(op, e.to_string()))
    })
    .transpose()
}

// sqlx row types

#[derive(Debug)]
struct InventoryItemRow {
    id: Uuid,
    name: String,
    stock: i64,
    price: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for InventoryItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            stock: row.try_get("stock")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug)]
struct OrderRow {
    id: Uuid,
    product_id: Uuid,
    qty: i64,
    customer_id: String,
    address: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            qty: row.try_get("qty")?,
            customer_id: row.try_get("customer_id")?,
            address: row.try_get("address")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug)]
struct DeliveryRow {
    id: Uuid,
    order_id: Uuid,
    customer_id: String,
    qty: i64,
    address: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for DeliveryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            customer_id: row.try_get("customer_id")?,
            qty: row.try_get("qty")?,
            address: row.try_get("address")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn decode_item(row: &PgRow) -> Result<InventoryItem, StorageError> {
    let row = InventoryItemRow::from_row(row)
        .map_err(|e| StorageError::database("decode_item", e.to_string()))?;
    Ok(InventoryItem {
        id: ProductId::from_uuid(row.id),
        name: row.name,
        stock: row.stock,
        price: row.price,
        created_at: row.created_at,
    })
}

fn decode_order(row: &PgRow) -> Result<Order, StorageError> {
    let row =
        OrderRow::from_row(row).map_err(|e| StorageError::database("decode_order", e.to_string()))?;
    let status: OrderStatus = row
        .status
        .parse()
        .map_err(|e: orderflow_core::DomainError| {
            StorageError::database("decode_order", e.to_string())
        })?;
    Ok(Order {
        id: OrderId::from_uuid(row.id),
        product_id: ProductId::from_uuid(row.product_id),
        qty: row.qty,
        customer_id: row.customer_id,
        address: row.address,
        status,
        created_at: row.created_at,
    })
}

fn decode_delivery(row: &PgRow) -> Result<Delivery, StorageError> {
    let row = DeliveryRow::from_row(row)
        .map_err(|e| StorageError::database("decode_delivery", e.to_string()))?;
    let status: DeliveryStatus = row
        .status
        .parse()
        .map_err(|e: orderflow_core::DomainError| {
            StorageError::database("decode_delivery", e.to_string())
        })?;
    Ok(Delivery {
        id: DeliveryId::from_uuid(row.id),
        order_id: OrderId::from_uuid(row.order_id),
        customer_id: row.customer_id,
        qty: row.qty,
        address: row.address,
        status,
        created_at: row.created_at,
    })
}
