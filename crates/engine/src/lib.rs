//! Ledger engine of a flower shop.
//!
//! Every stock or revenue event (purchase, sale, bouquet production, write-off,
//! storno) is an immutable [`Transaction`] row, written together with the
//! inventory changes it causes inside one database transaction. Reports are
//! folds over those rows.

pub use bouquet_templates::{BouquetTemplate, Ingredient, TemplateItem};
pub use categories::{BOUQUET_CATEGORY, Category, FALLBACK_CATEGORY};
pub use commands::{
    CompositeSaleCmd, CompositeSource, MaterialUpdate, NewMaterial, NewProduct, NewTemplate,
    ProduceCmd, ProductRef, ProductUpdate, PurchaseCmd, SaleCmd, StornoCmd, TxMeta, WriteOffCmd,
};
pub use error::{EngineError, EntityKind};
pub use inventory::{InventoryEntry, StockItem};
pub use materials::Material;
pub use money::Money;
pub use ops::{
    DEFAULT_LABOR_SURCHARGE_PERCENT, DEFAULT_TIMEZONE, Engine, EngineBuilder, OperationReceipt,
    ReportFilter, ShopSettings, TransactionListFilter,
};
pub use pricing::{CostLine, QuickBouquetQuote, TemplateCosting};
pub use products::Product;
pub use reporting::{
    CategoryRevenue, Granularity, PaymentRevenue, PeriodRevenue, SalesReport,
    SalesReportBuilder, VatBucket, VatSummary,
};
pub use transactions::{Movement, PaymentMethod, Transaction, TransactionKind, WriteOffReason};
pub use vat::{VatRate, VatSplit};

mod bouquet_template_items;
mod bouquet_templates;
mod categories;
mod commands;
mod error;
mod inventory;
mod materials;
mod money;
mod ops;
mod pricing;
mod products;
mod reporting;
mod transactions;
mod util;
mod vat;

type ResultEngine<T> = Result<T, EngineError>;
