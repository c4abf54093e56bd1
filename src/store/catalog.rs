//! Catalog reads and the admin CRUD path for products and packages.

use std::collections::HashMap;

use sqlx::QueryBuilder;
use uuid::Uuid;

use super::{page_limits, Store};
use crate::domain::aggregates::product::{
    CreatePackageRequest, CreateProductRequest, Package, PackageItemDetail, PackageWithItems,
    Product, ProductFilters, UpdatePackageRequest, UpdateProductRequest,
};
use crate::domain::value_objects::DEFAULT_CURRENCY;
use crate::error::{Error, Result};

fn push_product_filters(qb: &mut QueryBuilder<'_, sqlx::Postgres>, filters: &ProductFilters) {
    if let Some(t) = filters.product_type {
        qb.push(" AND product_type = ").push_bind(t);
    }
    if let Some(min) = filters.min_price {
        qb.push(" AND base_price >= ").push_bind(min);
    }
    if let Some(max) = filters.max_price {
        qb.push(" AND base_price <= ").push_bind(max);
    }
    if let Some(provider) = &filters.provider {
        qb.push(" AND provider = ").push_bind(provider.clone());
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    // Unavailable products are hidden unless explicitly requested.
    qb.push(" AND available = ").push_bind(filters.available.unwrap_or(true));
}

impl Store {
    pub async fn list_products(&self, filters: &ProductFilters) -> Result<(Vec<Product>, i64, u32)> {
        let (page, limit, offset) = page_limits(filters.page, filters.per_page);

        let mut qb = QueryBuilder::new("SELECT * FROM products WHERE deleted_at IS NULL");
        push_product_filters(&mut qb, filters);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let products = qb.build_query_as::<Product>().fetch_all(&self.db).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL");
        push_product_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        Ok((products, total, page))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound(format!("product {id} not found")))
    }

    pub async fn create_product(&self, req: &CreateProductRequest) -> Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, description, product_type, base_price, currency, provider, specific_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.product_type)
        .bind(req.base_price)
        .bind(req.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
        .bind(&req.provider)
        .bind(req.specific_data.clone().unwrap_or_else(|| serde_json::json!({})))
        .fetch_one(&self.db)
        .await?;
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, req: &UpdateProductRequest) -> Result<Product> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                product_type = COALESCE($4, product_type), \
                base_price = COALESCE($5, base_price), \
                currency = COALESCE($6, currency), \
                provider = COALESCE($7, provider), \
                available = COALESCE($8, available), \
                specific_data = COALESCE($9, specific_data), \
                updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.product_type)
        .bind(req.base_price)
        .bind(&req.currency)
        .bind(&req.provider)
        .bind(req.available)
        .bind(&req.specific_data)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("product {id} not found")))
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW(), available = FALSE \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("product {id} not found")));
        }
        Ok(())
    }

    pub async fn list_packages(&self) -> Result<Vec<PackageWithItems>> {
        let packages = sqlx::query_as::<_, Package>(
            "SELECT * FROM packages WHERE deleted_at IS NULL AND available = TRUE \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;
        self.attach_package_items(packages).await
    }

    pub async fn get_package(&self, id: Uuid) -> Result<PackageWithItems> {
        let package = sqlx::query_as::<_, Package>(
            "SELECT * FROM packages WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("package {id} not found")))?;
        let mut hydrated = self.attach_package_items(vec![package]).await?;
        Ok(hydrated.remove(0))
    }

    async fn attach_package_items(&self, packages: Vec<Package>) -> Result<Vec<PackageWithItems>> {
        let ids: Vec<Uuid> = packages.iter().map(|p| p.id).collect();
        let items = sqlx::query_as::<_, PackageItemDetail>(
            "SELECT pi.id, pi.package_id, pi.product_id, pi.quantity, \
                    p.name AS product_name, p.product_type, p.base_price, p.currency \
             FROM package_items pi \
             JOIN products p ON p.id = pi.product_id \
             WHERE pi.package_id = ANY($1) \
             ORDER BY pi.created_at",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_package: HashMap<Uuid, Vec<PackageItemDetail>> = HashMap::new();
        for item in items {
            by_package.entry(item.package_id).or_default().push(item);
        }
        Ok(packages
            .into_iter()
            .map(|package| {
                let items = by_package.remove(&package.id).unwrap_or_default();
                PackageWithItems { package, items }
            })
            .collect())
    }

    pub async fn create_package(&self, req: &CreatePackageRequest) -> Result<PackageWithItems> {
        let product_ids: Vec<Uuid> = req.items.iter().map(|i| i.product_id).collect();
        let known: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products \
             WHERE id = ANY($1) AND deleted_at IS NULL AND available = TRUE",
        )
        .bind(&product_ids)
        .fetch_one(&self.db)
        .await?;
        if known != product_ids.len() as i64 {
            return Err(Error::Validation("some referenced products are not available".into()));
        }

        let mut tx = self.db.begin().await?;
        let package = sqlx::query_as::<_, Package>(
            "INSERT INTO packages (id, name, description, total_price, currency, is_custom) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.total_price)
        .bind(req.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
        .bind(req.is_custom.unwrap_or(false))
        .fetch_one(&mut *tx)
        .await?;

        for item in &req.items {
            sqlx::query(
                "INSERT INTO package_items (id, package_id, product_id, quantity) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::now_v7())
            .bind(package.id)
            .bind(item.product_id)
            .bind(item.quantity.unwrap_or(1))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.get_package(package.id).await
    }

    pub async fn update_package(&self, id: Uuid, req: &UpdatePackageRequest) -> Result<PackageWithItems> {
        let updated = sqlx::query(
            "UPDATE packages SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                total_price = COALESCE($4, total_price), \
                currency = COALESCE($5, currency), \
                available = COALESCE($6, available), \
                updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.total_price)
        .bind(&req.currency)
        .bind(req.available)
        .execute(&self.db)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::NotFound(format!("package {id} not found")));
        }
        self.get_package(id).await
    }

    pub async fn delete_package(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE packages SET deleted_at = NOW(), available = FALSE \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("package {id} not found")));
        }
        Ok(())
    }

    pub async fn add_package_item(
        &self,
        package_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<PackageWithItems> {
        // Both ends must still exist before the link row goes in.
        self.get_package(package_id).await?;
        let product = self.get_product(product_id).await?;
        if !product.available {
            return Err(Error::NotFound(format!("product {product_id} is not available")));
        }
        sqlx::query(
            "INSERT INTO package_items (id, package_id, product_id, quantity) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(package_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.db)
        .await?;
        self.get_package(package_id).await
    }

    pub async fn remove_package_item(&self, package_id: Uuid, product_id: Uuid) -> Result<PackageWithItems> {
        let result = sqlx::query(
            "DELETE FROM package_items WHERE package_id = $1 AND product_id = $2",
        )
        .bind(package_id)
        .bind(product_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("the product is not part of this package".into()));
        }
        self.get_package(package_id).await
    }
}
