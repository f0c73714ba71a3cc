use crate::{
    entities::{product, Product},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Catalog listing page size.
pub const PRODUCTS_PAGE_SIZE: u64 = 10;

/// Stock filter values accepted by the catalog listing.
pub const AVAILABILITY_IN_STOCK: &str = "in-stock";
pub const AVAILABILITY_OUT_OF_STOCK: &str = "out-of-stock";

/// Product catalog: admin CRUD plus the public filtered listing.
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub images: Value,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub images: Option<Value>,
}

/// Catalog listing filters. All fields combine with AND; the keyword
/// matches name or description, case-insensitively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub ratings_gte: Option<f64>,
    pub availability: Option<String>,
    pub page: Option<u64>,
}

pub struct ProductPage {
    pub products: Vec<product::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        created_by: Uuid,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let item = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            category: Set(input.category),
            stock: Set(input.stock),
            images: Set(input.images),
            ratings: Set(0.0),
            created_by: Set(created_by),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let item = item.insert(&*self.db).await?;
        info!("Created product {}", item.id);
        Ok(item)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let item = self.get_product(product_id).await?;

        let mut active: product::ActiveModel = item.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(images) = input.images {
            active.images = Set(images);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await?)
    }

    /// Delete a product. Reviews go with it via a cascading foreign key;
    /// order line items keep their product id as purchase history. Hosted
    /// images are cleaned up externally.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let item = self.get_product(product_id).await?;
        item.delete(&*self.db).await?;
        info!("Deleted product {}", product_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found.".to_string()))
    }

    /// Whole catalog, newest first. The natural-language filter sends this
    /// to the model as candidate products.
    #[instrument(skip(self))]
    pub async fn all_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(Product::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Filtered catalog listing, newest first, ten per page. The total
    /// counts every match, not just the returned page.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self, filter: ProductFilter) -> Result<ProductPage, ServiceError> {
        let page = filter.page.unwrap_or(1).max(1);
        let condition = Self::build_condition(&filter)?;

        let base = Product::find().filter(condition);
        let total = base.clone().count(&*self.db).await?;

        let products = base
            .order_by_desc(product::Column::CreatedAt)
            .limit(PRODUCTS_PAGE_SIZE)
            .offset((page - 1) * PRODUCTS_PAGE_SIZE)
            .all(&*self.db)
            .await?;

        Ok(ProductPage {
            products,
            total,
            page,
            per_page: PRODUCTS_PAGE_SIZE,
        })
    }

    fn build_condition(filter: &ProductFilter) -> Result<Condition, ServiceError> {
        let mut condition = Condition::all();

        if let Some(ref search) = filter.search {
            let keyword = search.trim();
            if !keyword.is_empty() {
                // Lowercase both sides; a plain LIKE folds case on SQLite
                // but not on Postgres.
                let pattern = format!("%{}%", keyword.to_lowercase());
                condition = condition.add(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                                .like(pattern.clone()),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col(product::Column::Description)))
                                .like(pattern),
                        ),
                );
            }
        }

        if let Some(ref category) = filter.category {
            if !category.is_empty() {
                condition = condition.add(product::Column::Category.eq(category.as_str()));
            }
        }

        if let Some(price_gte) = filter.price_gte {
            condition = condition.add(product::Column::Price.gte(price_gte));
        }

        if let Some(price_lte) = filter.price_lte {
            condition = condition.add(product::Column::Price.lte(price_lte));
        }

        if let Some(ratings_gte) = filter.ratings_gte {
            condition = condition.add(product::Column::Ratings.gte(ratings_gte));
        }

        if let Some(ref availability) = filter.availability {
            match availability.as_str() {
                AVAILABILITY_IN_STOCK => {
                    condition = condition.add(product::Column::Stock.gt(0));
                }
                AVAILABILITY_OUT_OF_STOCK => {
                    condition = condition.add(product::Column::Stock.eq(0));
                }
                "" => {}
                other => {
                    return Err(ServiceError::ValidationError(format!(
                        "Unknown availability filter: {}",
                        other
                    )));
                }
            }
        }

        Ok(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn search_lowercases_both_sides_of_the_match() {
        let filter = ProductFilter {
            search: Some("Desk".to_string()),
            ..Default::default()
        };
        let condition = ProductCatalogService::build_condition(&filter).unwrap();

        let sql = Product::find()
            .filter(condition)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("LOWER"), "{sql}");
        assert!(sql.contains("%desk%"), "{sql}");
    }

    #[test]
    fn rejects_unknown_availability() {
        let filter = ProductFilter {
            availability: Some("backorder".to_string()),
            ..Default::default()
        };
        let result = ProductCatalogService::build_condition(&filter);
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn blank_filters_build_empty_condition() {
        let filter = ProductFilter {
            search: Some("   ".to_string()),
            category: Some(String::new()),
            availability: Some(String::new()),
            ..Default::default()
        };
        let condition = ProductCatalogService::build_condition(&filter).unwrap();
        assert!(condition.is_empty());
    }
}
