//! Database service for pos-service.

use crate::models::{
    Client, CreateClient, CreateProduct, CreateSupplier, CreateUser, Product, Sale, SaleItem,
    SaleWithItems, Supplier, UpdateClient, UpdateProduct, UpdateSupplier, User,
};
use crate::services::metrics::DB_QUERY_DURATION;
use pos_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "pos-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    /// Create a new user account.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: &CreateUser) -> Result<User, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_user"])
            .start_timer();

        let user_id = Uuid::new_v4();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING user_id, name, email, password_hash, role, created_utc
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Email '{}' is already registered", input.email))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
        })?;

        timer.observe_duration();

        info!(user_id = %user.user_id, "User account created");

        Ok(user)
    }

    /// Find a user by email.
    #[instrument(skip(self, email))]
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_email"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, password_hash, role, created_utc
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }

    /// Find a user by ID.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_id"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, password_hash, role, created_utc
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Product Operations
    // -------------------------------------------------------------------------

    /// Create a new product.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, name = %input.name))]
    pub async fn create_product(&self, input: &CreateProduct) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product"])
            .start_timer();

        let product_id = Uuid::new_v4();
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (product_id, user_id, name, category, price, cost, stock, barcode, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING product_id, user_id, name, category, price, cost, stock, barcode, description, created_utc, updated_utc
            "#,
        )
        .bind(product_id)
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.category)
        .bind(input.price)
        .bind(input.cost)
        .bind(input.stock)
        .bind(&input.barcode)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "A product with this barcode already exists"
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create product: {}", e)),
        })?;

        timer.observe_duration();

        info!(product_id = %product.product_id, "Product created");

        Ok(product)
    }

    /// Get a product by ID.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn get_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, user_id, name, category, price, cost, stock, barcode, description, created_utc, updated_utc
            FROM products
            WHERE user_id = $1 AND product_id = $2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// List products for an owner, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_products(&self, user_id: Uuid) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, user_id, name, category, price, cost, stock, barcode, description, created_utc, updated_utc
            FROM products
            WHERE user_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Update a product. `None` fields are left unchanged.
    #[instrument(skip(self, input), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn update_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($3, name),
                category = COALESCE($4, category),
                price = COALESCE($5, price),
                cost = COALESCE($6, cost),
                stock = COALESCE($7, stock),
                barcode = COALESCE($8, barcode),
                description = COALESCE($9, description),
                updated_utc = NOW()
            WHERE user_id = $1 AND product_id = $2
            RETURNING product_id, user_id, name, category, price, cost, stock, barcode, description, created_utc, updated_utc
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.category)
        .bind(input.price)
        .bind(input.cost)
        .bind(input.stock)
        .bind(&input.barcode)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "A product with this barcode already exists"
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)),
        })?;

        timer.observe_duration();

        Ok(product)
    }

    /// Delete a product.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn delete_product(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_product"])
            .start_timer();

        let result = sqlx::query(
            r#"
            DELETE FROM products
            WHERE user_id = $1 AND product_id = $2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Client Operations
    // -------------------------------------------------------------------------

    /// Create a new client.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn create_client(&self, input: &CreateClient) -> Result<Client, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_client"])
            .start_timer();

        let client_id = Uuid::new_v4();
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (client_id, user_id, name, email, phone, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING client_id, user_id, name, email, phone, notes, created_utc
            "#,
        )
        .bind(client_id)
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create client: {}", e)))?;

        timer.observe_duration();

        info!(client_id = %client.client_id, "Client created");

        Ok(client)
    }

    /// List clients for an owner, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_clients(&self, user_id: Uuid) -> Result<Vec<Client>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_clients"])
            .start_timer();

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT client_id, user_id, name, email, phone, notes, created_utc
            FROM clients
            WHERE user_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list clients: {}", e)))?;

        timer.observe_duration();

        Ok(clients)
    }

    /// Update a client. `None` fields are left unchanged.
    #[instrument(skip(self, input), fields(user_id = %user_id, client_id = %client_id))]
    pub async fn update_client(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        input: &UpdateClient,
    ) -> Result<Option<Client>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_client"])
            .start_timer();

        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                notes = COALESCE($6, notes)
            WHERE user_id = $1 AND client_id = $2
            RETURNING client_id, user_id, name, email, phone, notes, created_utc
            "#,
        )
        .bind(user_id)
        .bind(client_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update client: {}", e)))?;

        timer.observe_duration();

        Ok(client)
    }

    /// Delete a client.
    #[instrument(skip(self), fields(user_id = %user_id, client_id = %client_id))]
    pub async fn delete_client(&self, user_id: Uuid, client_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_client"])
            .start_timer();

        let result = sqlx::query(
            r#"
            DELETE FROM clients
            WHERE user_id = $1 AND client_id = $2
            "#,
        )
        .bind(user_id)
        .bind(client_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete client: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Supplier Operations
    // -------------------------------------------------------------------------

    /// Create a new supplier.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn create_supplier(&self, input: &CreateSupplier) -> Result<Supplier, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_supplier"])
            .start_timer();

        let supplier_id = Uuid::new_v4();
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (supplier_id, user_id, name, contact_name, phone, email, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING supplier_id, user_id, name, contact_name, phone, email, notes, created_utc
            "#,
        )
        .bind(supplier_id)
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.contact_name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create supplier: {}", e))
        })?;

        timer.observe_duration();

        info!(supplier_id = %supplier.supplier_id, "Supplier created");

        Ok(supplier)
    }

    /// List suppliers for an owner, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_suppliers(&self, user_id: Uuid) -> Result<Vec<Supplier>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_suppliers"])
            .start_timer();

        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT supplier_id, user_id, name, contact_name, phone, email, notes, created_utc
            FROM suppliers
            WHERE user_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list suppliers: {}", e)))?;

        timer.observe_duration();

        Ok(suppliers)
    }

    /// Update a supplier. `None` fields are left unchanged.
    #[instrument(skip(self, input), fields(user_id = %user_id, supplier_id = %supplier_id))]
    pub async fn update_supplier(
        &self,
        user_id: Uuid,
        supplier_id: Uuid,
        input: &UpdateSupplier,
    ) -> Result<Option<Supplier>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_supplier"])
            .start_timer();

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = COALESCE($3, name),
                contact_name = COALESCE($4, contact_name),
                phone = COALESCE($5, phone),
                email = COALESCE($6, email),
                notes = COALESCE($7, notes)
            WHERE user_id = $1 AND supplier_id = $2
            RETURNING supplier_id, user_id, name, contact_name, phone, email, notes, created_utc
            "#,
        )
        .bind(user_id)
        .bind(supplier_id)
        .bind(&input.name)
        .bind(&input.contact_name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update supplier: {}", e))
        })?;

        timer.observe_duration();

        Ok(supplier)
    }

    /// Delete a supplier.
    #[instrument(skip(self), fields(user_id = %user_id, supplier_id = %supplier_id))]
    pub async fn delete_supplier(
        &self,
        user_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_supplier"])
            .start_timer();

        let result = sqlx::query(
            r#"
            DELETE FROM suppliers
            WHERE user_id = $1 AND supplier_id = $2
            "#,
        )
        .bind(user_id)
        .bind(supplier_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete supplier: {}", e))
        })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Sale Read Operations
    // -------------------------------------------------------------------------

    /// List sales for an owner, newest first, with line items resolved.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_sales(&self, user_id: Uuid) -> Result<Vec<SaleWithItems>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_sales"])
            .start_timer();

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sale_id, user_id, sold_utc, payment_method, total, status, reverted_utc
            FROM sales
            WHERE user_id = $1
            ORDER BY sold_utc DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list sales: {}", e)))?;

        let sales = self.attach_items(sales).await?;

        timer.observe_duration();

        Ok(sales)
    }

    /// Get a sale by ID with line items resolved.
    #[instrument(skip(self), fields(user_id = %user_id, sale_id = %sale_id))]
    pub async fn get_sale(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Option<SaleWithItems>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_sale"])
            .start_timer();

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sale_id, user_id, sold_utc, payment_method, total, status, reverted_utc
            FROM sales
            WHERE user_id = $1 AND sale_id = $2
            "#,
        )
        .bind(user_id)
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get sale: {}", e)))?;

        let result = match sale {
            Some(sale) => self.attach_items(vec![sale]).await?.pop(),
            None => None,
        };

        timer.observe_duration();

        Ok(result)
    }

    /// Resolve line items for a batch of sales.
    pub(crate) async fn attach_items(
        &self,
        sales: Vec<Sale>,
    ) -> Result<Vec<SaleWithItems>, AppError> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }

        let sale_ids: Vec<Uuid> = sales.iter().map(|s| s.sale_id).collect();
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT sale_item_id, sale_id, product_id, display_name, quantity, unit_price, sort_order
            FROM sale_items
            WHERE sale_id = ANY($1)
            ORDER BY sale_id, sort_order
            "#,
        )
        .bind(&sale_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load sale items: {}", e)))?;

        let mut by_sale: HashMap<Uuid, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id).or_default().push(item);
        }

        Ok(sales
            .into_iter()
            .map(|sale| {
                let items = by_sale.remove(&sale.sale_id).unwrap_or_default();
                SaleWithItems { sale, items }
            })
            .collect())
    }
}
