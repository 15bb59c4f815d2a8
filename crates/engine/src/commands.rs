//! Command structs for engine operations.
//!
//! Every ledger write takes one of these: the operation-specific fields plus a
//! [`TxMeta`] and the operator (`user_id`) recorded as `created_by`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Ingredient, PaymentMethod, TemplateItem, VatRate, WriteOffReason};

/// Common metadata for ledger writes.
#[derive(Clone, Debug)]
pub struct TxMeta {
    pub note: Option<String>,
    pub idempotency_key: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TxMeta {
    #[must_use]
    pub fn new(occurred_at: DateTime<Utc>) -> Self {
        Self {
            note: None,
            idempotency_key: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

macro_rules! meta_builders {
    ($cmd:ty) => {
        impl $cmd {
            #[must_use]
            pub fn meta(mut self, meta: TxMeta) -> Self {
                self.meta = meta;
                self
            }

            #[must_use]
            pub fn note(mut self, note: impl Into<String>) -> Self {
                self.meta.note = Some(note.into());
                self
            }

            #[must_use]
            pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
                self.meta.idempotency_key = Some(key.into());
                self
            }
        }
    };
}

/// What a purchase restocks: a known product, or one resolved by name and
/// created on first delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductRef {
    Existing(Uuid),
    Named {
        name: String,
        category_id: Option<Uuid>,
        vat_rate: Option<VatRate>,
    },
}

impl ProductRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            category_id: None,
            vat_rate: None,
        }
    }
}

/// Restock goods from a supplier.
#[derive(Clone, Debug)]
pub struct PurchaseCmd {
    pub product: ProductRef,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub meta: TxMeta,
    pub user_id: String,
}

impl PurchaseCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        product: ProductRef,
        quantity: i64,
        unit_price_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product,
            quantity,
            unit_price_minor,
            meta: TxMeta::new(occurred_at),
            user_id: user_id.into(),
        }
    }
}

meta_builders!(PurchaseCmd);

/// Sell a product from stock, or record a free sale with no product at all.
#[derive(Clone, Debug)]
pub struct SaleCmd {
    pub product_id: Option<Uuid>,
    pub inventory_linked: bool,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub category: Option<String>,
    pub payment_method: PaymentMethod,
    pub meta: TxMeta,
    pub user_id: String,
}

impl SaleCmd {
    /// A free sale; call [`SaleCmd::product`] to sell from stock.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        quantity: i64,
        unit_price_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id: None,
            inventory_linked: false,
            quantity,
            unit_price_minor,
            category: None,
            payment_method: PaymentMethod::default(),
            meta: TxMeta::new(occurred_at),
            user_id: user_id.into(),
        }
    }

    /// Sell `product_id` and take it out of stock.
    #[must_use]
    pub fn product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self.inventory_linked = true;
        self
    }

    /// Keep the product reference but leave stock untouched.
    #[must_use]
    pub fn unlinked(mut self) -> Self {
        self.inventory_linked = false;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }
}

meta_builders!(SaleCmd);

/// Where the bouquet in a composite sale comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompositeSource {
    /// An already produced composite product taken from stock.
    Stocked { product_id: Uuid },
    /// Assembled on the spot from a saved recipe.
    FromTemplate { template_id: Uuid },
    /// Assembled on the spot from a free ingredient list.
    AdHoc {
        label: String,
        ingredients: Vec<TemplateItem>,
    },
}

/// Sell a bouquet.
#[derive(Clone, Debug)]
pub struct CompositeSaleCmd {
    pub source: CompositeSource,
    pub quantity: i64,
    pub sale_price_minor: i64,
    pub payment_method: PaymentMethod,
    pub meta: TxMeta,
    pub user_id: String,
}

impl CompositeSaleCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        source: CompositeSource,
        quantity: i64,
        sale_price_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            quantity,
            sale_price_minor,
            payment_method: PaymentMethod::default(),
            meta: TxMeta::new(occurred_at),
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }
}

meta_builders!(CompositeSaleCmd);

/// Build `multiplier` bouquets from a template into stock.
#[derive(Clone, Debug)]
pub struct ProduceCmd {
    pub template_id: Uuid,
    pub multiplier: i64,
    pub meta: TxMeta,
    pub user_id: String,
}

impl ProduceCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        template_id: Uuid,
        multiplier: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            template_id,
            multiplier,
            meta: TxMeta::new(occurred_at),
            user_id: user_id.into(),
        }
    }
}

meta_builders!(ProduceCmd);

/// Take goods out of stock without revenue.
#[derive(Clone, Debug)]
pub struct WriteOffCmd {
    pub product_id: Uuid,
    pub quantity: i64,
    pub reason: WriteOffReason,
    pub meta: TxMeta,
    pub user_id: String,
}

impl WriteOffCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        product_id: Uuid,
        quantity: i64,
        reason: WriteOffReason,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            quantity,
            reason,
            meta: TxMeta::new(occurred_at),
            user_id: user_id.into(),
        }
    }
}

meta_builders!(WriteOffCmd);

/// Reverse a sale.
#[derive(Clone, Debug)]
pub struct StornoCmd {
    pub transaction_id: Uuid,
    pub meta: TxMeta,
    pub user_id: String,
}

impl StornoCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        transaction_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id,
            meta: TxMeta::new(occurred_at),
            user_id: user_id.into(),
        }
    }
}

meta_builders!(StornoCmd);

/// Register a product in the catalog.
#[derive(Clone, Debug)]
pub struct NewProduct {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub vat_rate: VatRate,
    pub initial_unit_cost_minor: Option<i64>,
}

impl NewProduct {
    #[must_use]
    pub fn new(name: impl Into<String>, vat_rate: VatRate) -> Self {
        Self {
            name: name.into(),
            category_id: None,
            vat_rate,
            initial_unit_cost_minor: None,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn initial_unit_cost_minor(mut self, cost_minor: i64) -> Self {
        self.initial_unit_cost_minor = Some(cost_minor);
        self
    }
}

/// Partial product update; `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the category.
    pub category_id: Option<Option<Uuid>>,
    pub vat_rate: Option<VatRate>,
}

/// Register a non-stocked material (ribbon, wrapping, foam).
#[derive(Clone, Debug)]
pub struct NewMaterial {
    pub name: String,
    pub unit_price_minor: i64,
    pub vat_rate: VatRate,
}

impl NewMaterial {
    #[must_use]
    pub fn new(name: impl Into<String>, unit_price_minor: i64, vat_rate: VatRate) -> Self {
        Self {
            name: name.into(),
            unit_price_minor,
            vat_rate,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MaterialUpdate {
    pub name: Option<String>,
    pub unit_price_minor: Option<i64>,
    pub vat_rate: Option<VatRate>,
}

/// Create or fully replace a bouquet template.
#[derive(Clone, Debug)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub base_price_minor: i64,
    pub items: Vec<TemplateItem>,
}

impl NewTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>, base_price_minor: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            base_price_minor,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn product(mut self, product_id: Uuid, quantity: i64) -> Self {
        self.items
            .push(TemplateItem::new(Ingredient::Product(product_id), quantity));
        self
    }

    #[must_use]
    pub fn material(mut self, material_id: Uuid, quantity: i64) -> Self {
        self.items
            .push(TemplateItem::new(Ingredient::Material(material_id), quantity));
        self
    }
}
