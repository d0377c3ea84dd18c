//! Request/response DTOs and the JSON/query extractors that validate them.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::Validate;

use stockroom_auth::{NewUser, Role, User, UserChanges};
use stockroom_core::{
    CategoryId, DomainError, PageRequest, Paged, ProductId, ShelfId, WarehouseId,
};
use stockroom_inventory::{Product, ProductFilter, StockChange};
use stockroom_sales::SaleLine;

use crate::app::errors::ApiError;

// -------------------------
// Extractors
// -------------------------

/// JSON body; malformed payloads become `400 invalid_request`.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| DomainError::invalid(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// JSON body that must also pass its `validator` rules.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|e| DomainError::invalid(e.to_string()))?;
        Ok(Self(value))
    }
}

/// Query string; bad values become `400 invalid_request`.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| DomainError::invalid(rejection.body_text()))?;
        Ok(Self(value))
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    pub role: Role,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            username: req.username,
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role: req.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        UserChanges {
            username: req.username,
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role: req.role,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStockRequest {
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SaleItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleRequest {
    #[validate(length(min = 1, message = "sale must contain at least one item"))]
    pub items: Vec<SaleItemRequest>,
}

impl CreateSaleRequest {
    pub fn into_lines(self) -> Vec<SaleLine> {
        self.items
            .into_iter()
            .map(|i| SaleLine {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSaleStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page_request(&self) -> Result<PageRequest, DomainError> {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub shelf_id: Option<ShelfId>,
    pub warehouse_id: Option<WarehouseId>,
}

impl ProductListQuery {
    pub fn page_request(&self) -> Result<PageRequest, DomainError> {
        PageRequest::new(self.page, self.limit)
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            category_id: self.category_id,
            shelf_id: self.shelf_id,
            warehouse_id: self.warehouse_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub group_by: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductReportQuery {
    pub category_id: Option<CategoryId>,
    pub shelf_id: Option<ShelfId>,
    pub warehouse_id: Option<WarehouseId>,
}

impl From<ProductReportQuery> for ProductFilter {
    fn from(q: ProductReportQuery) -> Self {
        ProductFilter {
            category_id: q.category_id,
            shelf_id: q.shelf_id,
            warehouse_id: q.warehouse_id,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub is_low_stock: bool,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            is_low_stock: product.is_low_stock(),
            product,
        }
    }
}

pub fn product_page(page: Paged<Product>) -> Paged<ProductResponse> {
    page.map(ProductResponse::from)
}

#[derive(Debug, Serialize)]
pub struct StockUpdateResponse {
    pub product_id: ProductId,
    pub old_quantity: i32,
    pub new_quantity: i32,
    pub change: i32,
}

impl From<StockChange> for StockUpdateResponse {
    fn from(c: StockChange) -> Self {
        Self {
            product_id: c.product_id,
            old_quantity: c.old_stock,
            new_quantity: c.new_stock,
            change: c.change(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn create_user_request_rules() {
        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "username": "jo",
            "email": "not-an-email",
            "password": "123",
            "full_name": "Jo",
            "role": "staff"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("full_name"));
    }

    #[test]
    fn empty_sale_is_rejected_before_the_workflow() {
        let req: CreateSaleRequest = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn product_response_flags_low_stock() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            category_id: CategoryId::new(),
            shelf_id: ShelfId::new(),
            name: "Widget".into(),
            description: String::new(),
            unit_price: Decimal::new(500, 2),
            cost_price: Decimal::new(250, 2),
            stock_quantity: 5,
            min_stock_level: 5,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let json = serde_json::to_value(ProductResponse::from(product)).unwrap();
        assert_eq!(json["is_low_stock"], true);
        assert_eq!(json["name"], "Widget");
        assert_eq!(json["unit_price"], "5.00");
    }
}
