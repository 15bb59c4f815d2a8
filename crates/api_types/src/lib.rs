use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// VAT rates accepted by the shop, as whole percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VatRate {
    Reduced,
    #[default]
    Standard,
}

impl VatRate {
    pub fn percent(self) -> u8 {
        match self {
            Self::Reduced => 7,
            Self::Standard => 19,
        }
    }
}

impl TryFrom<u8> for VatRate {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            7 => Ok(Self::Reduced),
            19 => Ok(Self::Standard),
            other => Err(format!("unsupported VAT rate {other}%")),
        }
    }
}

impl From<VatRate> for u8 {
    fn from(value: VatRate) -> Self {
        value.percent()
    }
}

pub mod catalog {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryCreate {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductCreate {
        pub name: String,
        pub category_id: Option<Uuid>,
        pub vat_rate: Option<VatRate>,
        /// Cost used for pricing until the first delivery is booked.
        pub initial_unit_cost_minor: Option<i64>,
    }

    /// Partial update; absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProductUpdate {
        pub name: Option<String>,
        pub category_id: Option<Uuid>,
        /// Remove the category; wins over `category_id`.
        #[serde(default)]
        pub clear_category: bool,
        pub vat_rate: Option<VatRate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductView {
        pub id: Uuid,
        pub name: String,
        pub category_id: Option<Uuid>,
        pub vat_rate: VatRate,
        pub is_composite: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductListResponse {
        pub products: Vec<ProductView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaterialCreate {
        pub name: String,
        pub unit_price_minor: i64,
        pub vat_rate: Option<VatRate>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MaterialUpdate {
        pub name: Option<String>,
        pub unit_price_minor: Option<i64>,
        pub vat_rate: Option<VatRate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaterialView {
        pub id: Uuid,
        pub name: String,
        pub unit_price_minor: i64,
        pub vat_rate: VatRate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaterialListResponse {
        pub materials: Vec<MaterialView>,
    }
}

pub mod template {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum IngredientKind {
        Product,
        Material,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TemplateItemView {
        pub kind: IngredientKind,
        pub id: Uuid,
        pub quantity: i64,
    }

    /// Request body for creating a template or replacing one.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TemplateSave {
        pub name: String,
        pub description: Option<String>,
        pub base_price_minor: i64,
        pub items: Vec<TemplateItemView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TemplateView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub base_price_minor: i64,
        pub items: Vec<TemplateItemView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TemplateListResponse {
        pub templates: Vec<TemplateView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CostLineView {
        pub kind: IngredientKind,
        pub id: Uuid,
        pub name: String,
        pub quantity: i64,
        pub unit_cost_minor: i64,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TemplateCostingView {
        pub lines: Vec<CostLineView>,
        pub products_cost_minor: i64,
        pub materials_cost_minor: i64,
        pub subtotal_minor: i64,
        pub labor_minor: i64,
        pub suggested_price_minor: i64,
        pub base_price_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct QuickQuoteRequest {
        pub items: Vec<TemplateItemView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct QuickQuoteResponse {
        pub cost_minor: i64,
        pub suggested_price_minor: i64,
    }
}

pub mod inventory {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct InventoryQuery {
        /// Only entries at or below this quantity.
        pub low_stock: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockView {
        pub product_id: Uuid,
        pub name: String,
        pub is_composite: bool,
        pub quantity: i64,
        pub unit_purchase_price_minor: i64,
        pub last_updated: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InventoryResponse {
        pub items: Vec<StockView>,
    }
}

pub mod operation {
    use super::*;
    use crate::template::TemplateItemView;
    use crate::transaction::TransactionView;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMethod {
        #[default]
        Cash,
        Card,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WriteOffReason {
        Waste,
        Personal,
        Gift,
        Discount,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        /// Either `product_id` or `product_name` must be set.
        pub product_id: Option<Uuid>,
        /// Matched case-insensitively; a new product is created otherwise.
        pub product_name: Option<String>,
        pub category_id: Option<Uuid>,
        pub vat_rate: Option<VatRate>,
        pub quantity: i64,
        pub unit_price_minor: i64,
        pub note: Option<String>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
        /// RFC3339 timestamp; server time when absent.
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SaleNew {
        /// Absent for a free sale, which then needs a category.
        pub product_id: Option<Uuid>,
        /// Defaults to `true` when a product is given.
        pub inventory_linked: Option<bool>,
        pub quantity: i64,
        pub unit_price_minor: i64,
        pub category: Option<String>,
        pub payment_method: Option<PaymentMethod>,
        pub note: Option<String>,
        pub idempotency_key: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    /// Exactly one of `product_id`, `template_id` or `ingredients` must be set.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BouquetSaleNew {
        /// A produced bouquet taken from stock.
        pub product_id: Option<Uuid>,
        pub template_id: Option<Uuid>,
        /// Free ingredient list, named by `label`.
        pub ingredients: Option<Vec<TemplateItemView>>,
        pub label: Option<String>,
        pub quantity: i64,
        pub sale_price_minor: i64,
        pub payment_method: Option<PaymentMethod>,
        pub note: Option<String>,
        pub idempotency_key: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductionNew {
        pub template_id: Uuid,
        pub multiplier: i64,
        pub note: Option<String>,
        pub idempotency_key: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WriteOffNew {
        pub product_id: Uuid,
        pub quantity: i64,
        pub reason: WriteOffReason,
        pub note: Option<String>,
        pub idempotency_key: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StornoNew {
        /// Reason, stored after the reference to the sale.
        pub note: Option<String>,
        pub idempotency_key: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OperationReceipt {
        pub batch_id: Uuid,
        /// `true` when the idempotency key matched an earlier request.
        pub replayed: bool,
        pub transactions: Vec<TransactionView>,
    }
}

pub mod transaction {
    use super::*;
    use crate::operation::PaymentMethod;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Purchase,
        Sale,
        SaleBouquet,
        Usage,
        Production,
        Waste,
        Personal,
        Gift,
        Discount,
        Storno,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
        /// Inclusive lower bound.
        pub from: Option<DateTime<FixedOffset>>,
        /// Exclusive upper bound.
        pub to: Option<DateTime<FixedOffset>>,
        /// Comma separated kinds, e.g. `sale,storno`.
        pub kinds: Option<String>,
        pub product_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub batch_id: Uuid,
        pub kind: TransactionKind,
        /// RFC3339 timestamp in UTC.
        pub occurred_at: DateTime<FixedOffset>,
        pub product_id: Option<Uuid>,
        pub template_id: Option<Uuid>,
        pub quantity: i64,
        /// Negative on a storno.
        pub unit_price_minor: i64,
        pub total_price_minor: i64,
        pub vat_rate: Option<VatRate>,
        pub vat_amount_minor: i64,
        pub category: Option<String>,
        pub payment_method: Option<PaymentMethod>,
        pub reverses_transaction_id: Option<Uuid>,
        pub note: Option<String>,
        pub created_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}

pub mod report {
    use super::*;
    use crate::operation::PaymentMethod;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Granularity {
        #[default]
        Day,
        Month,
        Year,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReportQuery {
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub granularity: Option<Granularity>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PeriodView {
        /// `2026-10-18`, `2026-10` or `2026`.
        pub period: String,
        pub gross_minor: i64,
        pub net_minor: i64,
        pub vat_minor: i64,
        pub transaction_count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub payment_method: PaymentMethod,
        pub gross_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub category: String,
        pub gross_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VatView {
        /// `None` on the grand total line.
        pub rate: Option<VatRate>,
        pub gross_minor: i64,
        pub net_minor: i64,
        pub vat_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SalesReportResponse {
        pub granularity: Granularity,
        pub periods: Vec<PeriodView>,
        pub by_payment_method: Vec<PaymentView>,
        pub by_category: Vec<CategoryView>,
        pub vat: Vec<VatView>,
        pub vat_total: VatView,
        pub sale_count: u64,
        pub storno_count: u64,
    }
}
