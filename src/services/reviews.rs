use crate::{
    entities::{order, order_item, product, review, user, OrderItem, Product, Review},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Reviews with purchase verification. A shopper may review a product only
/// after buying it in a paid order, and holds at most one review per
/// product; posting again replaces the earlier one. Every change recomputes
/// the product's stored average rating.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone)]
pub struct SubmitReviewInput {
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

/// A review joined with its author, for product detail pages.
pub struct ReviewWithAuthor {
    pub review: review::Model,
    pub author: Option<user::Model>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether this user has a paid order containing the product.
    #[instrument(skip(self))]
    pub async fn has_paid_purchase(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let purchase = OrderItem::find()
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order_item::Column::ProductId.eq(product_id))
            .filter(order::Column::BuyerId.eq(user_id))
            .filter(order::Column::PaymentStatus.eq(order::PAYMENT_PAID))
            .one(&*self.db)
            .await?;

        Ok(purchase.is_some())
    }

    /// Create or replace the caller's review of a product.
    #[instrument(skip(self, input))]
    pub async fn submit_review(
        &self,
        user_id: Uuid,
        input: SubmitReviewInput,
    ) -> Result<review::Model, ServiceError> {
        let item = Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found.".to_string()))?;

        if !self.has_paid_purchase(user_id, input.product_id).await? {
            return Err(ServiceError::Forbidden(
                "You can only review products you have purchased.".to_string(),
            ));
        }

        let existing = Review::find()
            .filter(review::Column::ProductId.eq(input.product_id))
            .filter(review::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;

        let saved = match existing {
            Some(current) => {
                let mut active: review::ActiveModel = current.into();
                active.rating = Set(input.rating);
                active.comment = Set(input.comment);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&*self.db).await?
            }
            None => {
                let active = review::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(input.product_id),
                    user_id: Set(user_id),
                    rating: Set(input.rating),
                    comment: Set(input.comment),
                    created_at: Set(Utc::now()),
                    updated_at: Set(None),
                };
                active.insert(&*self.db).await?
            }
        };

        self.recompute_product_rating(item).await?;
        info!("Saved review {} by user {}", saved.id, user_id);
        Ok(saved)
    }

    /// Delete the caller's review of a product.
    #[instrument(skip(self))]
    pub async fn delete_review(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), ServiceError> {
        let item = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found.".to_string()))?;

        let existing = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Review not found.".to_string()))?;

        existing.delete(&*self.db).await?;
        self.recompute_product_rating(item).await?;
        info!("Deleted review for product {} by user {}", product_id, user_id);
        Ok(())
    }

    /// All reviews of a product with their authors, newest first.
    #[instrument(skip(self))]
    pub async fn list_reviews(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, ServiceError> {
        let rows = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::CreatedAt)
            .find_also_related(crate::entities::User)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(review, author)| ReviewWithAuthor { review, author })
            .collect())
    }

    /// Recompute and store the product's average rating from its current
    /// reviews. Products with no reviews get 0.
    async fn recompute_product_rating(
        &self,
        item: product::Model,
    ) -> Result<product::Model, ServiceError> {
        let ratings: Vec<i32> = Review::find()
            .filter(review::Column::ProductId.eq(item.id))
            .select_only()
            .column(review::Column::Rating)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let average = average_rating(&ratings);

        let mut active: product::ActiveModel = item.into();
        active.ratings = Set(average);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }
}

/// Mean of the given ratings rounded to two decimals, 0 when empty.
fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i32 = ratings.iter().sum();
    let mean = f64::from(sum) / ratings.len() as f64;
    (mean * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_no_ratings_is_zero() {
        assert_eq!(average_rating(&[]), 0.0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        // 4, 5, 5 -> 4.666... -> 4.67
        assert_eq!(average_rating(&[4, 5, 5]), 4.67);
        assert_eq!(average_rating(&[1, 2]), 1.5);
        assert_eq!(average_rating(&[3]), 3.0);
    }
}
