//! Ledger rows.
//!
//! Every stock or revenue event is an immutable [`Transaction`]. What a row
//! means is carried by its [`Movement`]: each variant holds exactly the fields
//! that kind of event has, and quantity, totals and VAT are derived from it.
//! Corrections are new rows (a storno), never edits.

use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EntityKind, ResultEngine, VatRate,
    util::{line_total, parse_uuid, require_non_negative, require_positive},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

impl TransactionKind {
    pub const ALL: [TransactionKind; 10] = [
        Self::Purchase,
        Self::Sale,
        Self::SaleBouquet,
        Self::Usage,
        Self::Production,
        Self::Waste,
        Self::Personal,
        Self::Gift,
        Self::Discount,
        Self::Storno,
    ];

    /// Kinds that count towards revenue reports.
    pub const REVENUE: [TransactionKind; 3] = [Self::Sale, Self::SaleBouquet, Self::Storno];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::SaleBouquet => "sale_bouquet",
            Self::Usage => "usage",
            Self::Production => "production",
            Self::Waste => "waste",
            Self::Personal => "personal",
            Self::Gift => "gift",
            Self::Discount => "discount",
            Self::Storno => "storno",
        }
    }

    pub fn is_revenue(self) -> bool {
        Self::REVENUE.contains(&self)
    }

    /// Only sales can be reversed with a storno.
    pub fn is_reversible(self) -> bool {
        matches!(self, Self::Sale | Self::SaleBouquet)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                EngineError::validation("kind", format!("invalid transaction kind: {value}"))
            })
    }
}

/// Why goods left stock without revenue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOffReason {
    Waste,
    Personal,
    Gift,
    Discount,
}

impl WriteOffReason {
    pub fn kind(self) -> TransactionKind {
        match self {
            Self::Waste => TransactionKind::Waste,
            Self::Personal => TransactionKind::Personal,
            Self::Gift => TransactionKind::Gift,
            Self::Discount => TransactionKind::Discount,
        }
    }

    fn from_kind(kind: TransactionKind) -> Option<Self> {
        match kind {
            TransactionKind::Waste => Some(Self::Waste),
            TransactionKind::Personal => Some(Self::Personal),
            TransactionKind::Gift => Some(Self::Gift),
            TransactionKind::Discount => Some(Self::Discount),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.kind().as_str()
    }
}

impl TryFrom<&str> for WriteOffReason {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        TransactionKind::try_from(value)
            .ok()
            .and_then(Self::from_kind)
            .ok_or_else(|| {
                EngineError::validation("reason", format!("invalid write-off reason: {value}"))
            })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            other => Err(EngineError::validation(
                "payment_method",
                format!("invalid payment method: {other}"),
            )),
        }
    }
}

/// What a ledger row records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Movement {
    /// Goods bought from a supplier; stock goes up.
    Purchase {
        product_id: Uuid,
        quantity: i64,
        unit_price_minor: i64,
    },
    /// Product or free sale. Stock goes down only when `inventory_linked`.
    Sale {
        product_id: Option<Uuid>,
        inventory_linked: bool,
        quantity: i64,
        unit_price_minor: i64,
        vat_rate: VatRate,
        category: Option<String>,
        payment_method: PaymentMethod,
    },
    /// Bouquet assembled and sold in one go; its ingredients are separate
    /// usage rows in the same batch.
    SaleBouquet {
        template_id: Option<Uuid>,
        quantity: i64,
        unit_price_minor: i64,
        vat_rate: VatRate,
        category: Option<String>,
        payment_method: PaymentMethod,
    },
    /// Ingredient consumed by production or a bouquet sale. Carries no value.
    Usage {
        product_id: Uuid,
        template_id: Option<Uuid>,
        quantity: i64,
    },
    /// Bouquets produced into stock, valued at the template base price.
    Production {
        product_id: Uuid,
        template_id: Uuid,
        quantity: i64,
        unit_price_minor: i64,
    },
    /// Goods leaving stock without revenue, valued at the last purchase cost.
    WriteOff {
        reason: WriteOffReason,
        product_id: Uuid,
        quantity: i64,
        unit_cost_minor: i64,
    },
    /// Reversal of a sale. `unit_price_minor` is the original (positive)
    /// price; the derived totals are negative.
    Storno {
        reverses: Uuid,
        product_id: Option<Uuid>,
        template_id: Option<Uuid>,
        restocked: bool,
        quantity: i64,
        unit_price_minor: i64,
        vat_rate: VatRate,
        category: Option<String>,
        payment_method: PaymentMethod,
    },
}

impl Movement {
    pub(crate) fn purchase(
        product_id: Uuid,
        quantity: i64,
        unit_price_minor: i64,
    ) -> ResultEngine<Self> {
        require_positive(quantity, "quantity")?;
        require_positive(unit_price_minor, "unit_price")?;
        line_total(quantity, unit_price_minor)?;
        Ok(Self::Purchase {
            product_id,
            quantity,
            unit_price_minor,
        })
    }

    pub(crate) fn sale(
        product_id: Option<Uuid>,
        inventory_linked: bool,
        quantity: i64,
        unit_price_minor: i64,
        vat_rate: VatRate,
        category: Option<String>,
        payment_method: PaymentMethod,
    ) -> ResultEngine<Self> {
        require_positive(quantity, "quantity")?;
        require_positive(unit_price_minor, "unit_price")?;
        line_total(quantity, unit_price_minor)?;
        if inventory_linked && product_id.is_none() {
            return Err(EngineError::validation(
                "product_id",
                "an inventory linked sale needs a product",
            ));
        }
        if product_id.is_none() && category.is_none() {
            return Err(EngineError::validation(
                "category",
                "a free sale needs a category",
            ));
        }
        Ok(Self::Sale {
            product_id,
            inventory_linked,
            quantity,
            unit_price_minor,
            vat_rate,
            category,
            payment_method,
        })
    }

    pub(crate) fn sale_bouquet(
        template_id: Option<Uuid>,
        quantity: i64,
        unit_price_minor: i64,
        vat_rate: VatRate,
        category: Option<String>,
        payment_method: PaymentMethod,
    ) -> ResultEngine<Self> {
        require_positive(quantity, "quantity")?;
        require_positive(unit_price_minor, "sale_price")?;
        line_total(quantity, unit_price_minor)?;
        Ok(Self::SaleBouquet {
            template_id,
            quantity,
            unit_price_minor,
            vat_rate,
            category,
            payment_method,
        })
    }

    pub(crate) fn usage(
        product_id: Uuid,
        template_id: Option<Uuid>,
        quantity: i64,
    ) -> ResultEngine<Self> {
        require_positive(quantity, "quantity")?;
        Ok(Self::Usage {
            product_id,
            template_id,
            quantity,
        })
    }

    pub(crate) fn production(
        product_id: Uuid,
        template_id: Uuid,
        quantity: i64,
        unit_price_minor: i64,
    ) -> ResultEngine<Self> {
        require_positive(quantity, "multiplier")?;
        require_non_negative(unit_price_minor, "base_price")?;
        line_total(quantity, unit_price_minor)?;
        Ok(Self::Production {
            product_id,
            template_id,
            quantity,
            unit_price_minor,
        })
    }

    pub(crate) fn write_off(
        reason: WriteOffReason,
        product_id: Uuid,
        quantity: i64,
        unit_cost_minor: i64,
    ) -> ResultEngine<Self> {
        require_positive(quantity, "quantity")?;
        require_non_negative(unit_cost_minor, "unit_cost")?;
        line_total(quantity, unit_cost_minor)?;
        Ok(Self::WriteOff {
            reason,
            product_id,
            quantity,
            unit_cost_minor,
        })
    }

    /// The storno of `original`. Fails unless `original` is a sale.
    pub(crate) fn storno_of(original: &Transaction) -> ResultEngine<Self> {
        let not_reversible = || {
            EngineError::validation(
                "transaction_id",
                format!(
                    "only sales can be cancelled, {} is a {}",
                    original.id,
                    original.kind()
                ),
            )
        };
        match &original.movement {
            Self::Sale {
                product_id,
                inventory_linked,
                quantity,
                unit_price_minor,
                vat_rate,
                category,
                payment_method,
            } => Ok(Self::Storno {
                reverses: original.id,
                product_id: *product_id,
                template_id: None,
                restocked: *inventory_linked,
                quantity: *quantity,
                unit_price_minor: *unit_price_minor,
                vat_rate: *vat_rate,
                category: category.clone(),
                payment_method: *payment_method,
            }),
            Self::SaleBouquet {
                template_id,
                quantity,
                unit_price_minor,
                vat_rate,
                category,
                payment_method,
            } => Ok(Self::Storno {
                reverses: original.id,
                product_id: None,
                template_id: *template_id,
                restocked: false,
                quantity: *quantity,
                unit_price_minor: *unit_price_minor,
                vat_rate: *vat_rate,
                category: category.clone(),
                payment_method: *payment_method,
            }),
            _ => Err(not_reversible()),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Purchase { .. } => TransactionKind::Purchase,
            Self::Sale { .. } => TransactionKind::Sale,
            Self::SaleBouquet { .. } => TransactionKind::SaleBouquet,
            Self::Usage { .. } => TransactionKind::Usage,
            Self::Production { .. } => TransactionKind::Production,
            Self::WriteOff { reason, .. } => reason.kind(),
            Self::Storno { .. } => TransactionKind::Storno,
        }
    }

    pub fn product_id(&self) -> Option<Uuid> {
        match self {
            Self::Purchase { product_id, .. }
            | Self::Usage { product_id, .. }
            | Self::Production { product_id, .. }
            | Self::WriteOff { product_id, .. } => Some(*product_id),
            Self::Sale { product_id, .. } | Self::Storno { product_id, .. } => *product_id,
            Self::SaleBouquet { .. } => None,
        }
    }

    pub fn template_id(&self) -> Option<Uuid> {
        match self {
            Self::Production { template_id, .. } => Some(*template_id),
            Self::SaleBouquet { template_id, .. }
            | Self::Usage { template_id, .. }
            | Self::Storno { template_id, .. } => *template_id,
            _ => None,
        }
    }

    pub fn quantity(&self) -> i64 {
        match self {
            Self::Purchase { quantity, .. }
            | Self::Sale { quantity, .. }
            | Self::SaleBouquet { quantity, .. }
            | Self::Usage { quantity, .. }
            | Self::Production { quantity, .. }
            | Self::WriteOff { quantity, .. }
            | Self::Storno { quantity, .. } => *quantity,
        }
    }

    /// Signed unit price as stored: negative for a storno, zero for usage.
    pub fn unit_price_minor(&self) -> i64 {
        match self {
            Self::Purchase {
                unit_price_minor, ..
            }
            | Self::Sale {
                unit_price_minor, ..
            }
            | Self::SaleBouquet {
                unit_price_minor, ..
            }
            | Self::Production {
                unit_price_minor, ..
            } => *unit_price_minor,
            Self::WriteOff {
                unit_cost_minor, ..
            } => *unit_cost_minor,
            Self::Usage { .. } => 0,
            Self::Storno {
                unit_price_minor, ..
            } => -*unit_price_minor,
        }
    }

    /// `quantity * unit_price`, negative for a storno.
    pub fn total_price_minor(&self) -> i64 {
        self.quantity() * self.unit_price_minor()
    }

    pub fn vat_rate(&self) -> Option<VatRate> {
        match self {
            Self::Sale { vat_rate, .. }
            | Self::SaleBouquet { vat_rate, .. }
            | Self::Storno { vat_rate, .. } => Some(*vat_rate),
            _ => None,
        }
    }

    /// VAT contained in the total; zero for rows that carry no VAT.
    pub fn vat_amount_minor(&self) -> i64 {
        self.vat_rate()
            .map_or(0, |rate| rate.vat_of(self.total_price_minor()))
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Sale { category, .. }
            | Self::SaleBouquet { category, .. }
            | Self::Storno { category, .. } => category.as_deref(),
            _ => None,
        }
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        match self {
            Self::Sale { payment_method, .. }
            | Self::SaleBouquet { payment_method, .. }
            | Self::Storno { payment_method, .. } => Some(*payment_method),
            _ => None,
        }
    }

    /// Whether the row moved stock (sales sold from inventory, and their
    /// stornos).
    pub fn inventory_linked(&self) -> bool {
        match self {
            Self::Sale {
                inventory_linked, ..
            } => *inventory_linked,
            Self::Storno { restocked, .. } => *restocked,
            Self::SaleBouquet { .. } => false,
            _ => true,
        }
    }

    pub fn reverses(&self) -> Option<Uuid> {
        match self {
            Self::Storno { reverses, .. } => Some(*reverses),
            _ => None,
        }
    }

    /// The inventory change this row stands for, if any.
    pub fn stock_delta(&self) -> Option<(Uuid, i64)> {
        match self {
            Self::Purchase {
                product_id,
                quantity,
                ..
            }
            | Self::Production {
                product_id,
                quantity,
                ..
            } => Some((*product_id, *quantity)),
            Self::Usage {
                product_id,
                quantity,
                ..
            }
            | Self::WriteOff {
                product_id,
                quantity,
                ..
            } => Some((*product_id, -*quantity)),
            Self::Sale {
                product_id: Some(product_id),
                inventory_linked: true,
                quantity,
                ..
            } => Some((*product_id, -*quantity)),
            Self::Storno {
                product_id: Some(product_id),
                restocked: true,
                quantity,
                ..
            } => Some((*product_id, *quantity)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// Id of the headline row of the operation that wrote this row.
    pub batch_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub created_by: String,
    pub note: Option<String>,
    pub idempotency_key: Option<String>,
    pub movement: Movement,
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        self.movement.kind()
    }

    pub fn quantity(&self) -> i64 {
        self.movement.quantity()
    }

    pub fn total_price_minor(&self) -> i64 {
        self.movement.total_price_minor()
    }

    pub fn vat_amount_minor(&self) -> i64 {
        self.movement.vat_amount_minor()
    }

    /// The row that carries the operation's amounts and idempotency key.
    pub fn is_headline(&self) -> bool {
        self.id == self.batch_id
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub batch_id: String,
    pub batch_line: i32,
    pub kind: String,
    pub product_id: Option<String>,
    pub template_id: Option<String>,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub total_price_minor: i64,
    pub vat_rate: Option<i32>,
    pub vat_amount_minor: i64,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub inventory_linked: bool,
    #[sea_orm(unique)]
    pub reverses_transaction_id: Option<String>,
    pub note: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub created_by: String,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(tx: &Transaction, batch_line: i32) -> ActiveModel {
    let movement = &tx.movement;
    ActiveModel {
        id: ActiveValue::Set(tx.id.to_string()),
        batch_id: ActiveValue::Set(tx.batch_id.to_string()),
        batch_line: ActiveValue::Set(batch_line),
        kind: ActiveValue::Set(movement.kind().as_str().to_string()),
        product_id: ActiveValue::Set(movement.product_id().map(|id| id.to_string())),
        template_id: ActiveValue::Set(movement.template_id().map(|id| id.to_string())),
        quantity: ActiveValue::Set(movement.quantity()),
        unit_price_minor: ActiveValue::Set(movement.unit_price_minor()),
        total_price_minor: ActiveValue::Set(movement.total_price_minor()),
        vat_rate: ActiveValue::Set(movement.vat_rate().map(VatRate::stored)),
        vat_amount_minor: ActiveValue::Set(movement.vat_amount_minor()),
        category: ActiveValue::Set(movement.category().map(ToString::to_string)),
        payment_method: ActiveValue::Set(
            movement.payment_method().map(|m| m.as_str().to_string()),
        ),
        inventory_linked: ActiveValue::Set(movement.inventory_linked()),
        reverses_transaction_id: ActiveValue::Set(movement.reverses().map(|id| id.to_string())),
        note: ActiveValue::Set(tx.note.clone()),
        occurred_at: ActiveValue::Set(tx.occurred_at),
        created_by: ActiveValue::Set(tx.created_by.clone()),
        idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = parse_uuid(&model.id, EntityKind::Transaction)?;
        let kind = TransactionKind::try_from(model.kind.as_str())?;
        let missing =
            |field: &'static str| EngineError::validation(field, format!("missing on {kind} {id}"));

        let product_id = model
            .product_id
            .as_deref()
            .map(|value| parse_uuid(value, EntityKind::Product))
            .transpose()?;
        let template_id = model
            .template_id
            .as_deref()
            .map(|value| parse_uuid(value, EntityKind::Template))
            .transpose()?;
        let vat_rate = model.vat_rate.map(VatRate::from_stored).transpose()?;
        let payment_method = model
            .payment_method
            .as_deref()
            .map(PaymentMethod::try_from)
            .transpose()?
            .unwrap_or_default();
        let quantity = model.quantity;
        let unit_price_minor = model.unit_price_minor;

        let movement = match kind {
            TransactionKind::Purchase => Movement::Purchase {
                product_id: product_id.ok_or_else(|| missing("product_id"))?,
                quantity,
                unit_price_minor,
            },
            TransactionKind::Sale => Movement::Sale {
                product_id,
                inventory_linked: model.inventory_linked,
                quantity,
                unit_price_minor,
                vat_rate: vat_rate.ok_or_else(|| missing("vat_rate"))?,
                category: model.category,
                payment_method,
            },
            TransactionKind::SaleBouquet => Movement::SaleBouquet {
                template_id,
                quantity,
                unit_price_minor,
                vat_rate: vat_rate.ok_or_else(|| missing("vat_rate"))?,
                category: model.category,
                payment_method,
            },
            TransactionKind::Usage => Movement::Usage {
                product_id: product_id.ok_or_else(|| missing("product_id"))?,
                template_id,
                quantity,
            },
            TransactionKind::Production => Movement::Production {
                product_id: product_id.ok_or_else(|| missing("product_id"))?,
                template_id: template_id.ok_or_else(|| missing("template_id"))?,
                quantity,
                unit_price_minor,
            },
            TransactionKind::Waste
            | TransactionKind::Personal
            | TransactionKind::Gift
            | TransactionKind::Discount => Movement::WriteOff {
                reason: WriteOffReason::from_kind(kind).ok_or_else(|| missing("reason"))?,
                product_id: product_id.ok_or_else(|| missing("product_id"))?,
                quantity,
                unit_cost_minor: unit_price_minor,
            },
            TransactionKind::Storno => Movement::Storno {
                reverses: model
                    .reverses_transaction_id
                    .as_deref()
                    .map(|value| parse_uuid(value, EntityKind::Transaction))
                    .transpose()?
                    .ok_or_else(|| missing("reverses_transaction_id"))?,
                product_id,
                template_id,
                restocked: model.inventory_linked,
                quantity,
                unit_price_minor: -unit_price_minor,
                vat_rate: vat_rate.ok_or_else(|| missing("vat_rate"))?,
                category: model.category,
                payment_method,
            },
        };

        if quantity.checked_mul(movement.unit_price_minor()) != Some(model.total_price_minor) {
            return Err(EngineError::validation(
                "total_price",
                format!("stored total of {id} does not match quantity * unit price"),
            ));
        }

        Ok(Self {
            id,
            batch_id: parse_uuid(&model.batch_id, EntityKind::Transaction)?,
            occurred_at: model.occurred_at,
            created_by: model.created_by,
            note: model.note,
            idempotency_key: model.idempotency_key,
            movement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(quantity: i64, unit_price_minor: i64) -> Transaction {
        let id = Uuid::new_v4();
        Transaction {
            id,
            batch_id: id,
            occurred_at: Utc::now(),
            created_by: "anna".to_string(),
            note: None,
            idempotency_key: None,
            movement: Movement::sale(
                Some(Uuid::new_v4()),
                true,
                quantity,
                unit_price_minor,
                VatRate::Standard,
                None,
                PaymentMethod::Card,
            )
            .unwrap(),
        }
    }

    #[test]
    fn sale_totals_and_vat() {
        let tx = sale(3, 250);
        assert_eq!(tx.total_price_minor(), 750);
        assert_eq!(tx.vat_amount_minor(), 120);
        assert_eq!(tx.movement.stock_delta().map(|(_, d)| d), Some(-3));
    }

    #[test]
    fn storno_negates_sale() {
        let original = sale(3, 250);
        let storno = Movement::storno_of(&original).unwrap();
        assert_eq!(storno.kind(), TransactionKind::Storno);
        assert_eq!(storno.reverses(), Some(original.id));
        assert_eq!(storno.total_price_minor(), -750);
        assert_eq!(storno.vat_amount_minor(), -120);
        assert_eq!(storno.stock_delta().map(|(_, d)| d), Some(3));
        assert_eq!(storno.payment_method(), Some(PaymentMethod::Card));
    }

    #[test]
    fn storno_of_non_sale_is_rejected() {
        let id = Uuid::new_v4();
        let purchase = Transaction {
            id,
            batch_id: id,
            occurred_at: Utc::now(),
            created_by: "anna".to_string(),
            note: None,
            idempotency_key: None,
            movement: Movement::purchase(Uuid::new_v4(), 10, 120).unwrap(),
        };
        assert!(matches!(
            Movement::storno_of(&purchase),
            Err(EngineError::Validation {
                field: "transaction_id",
                ..
            })
        ));
    }

    #[test]
    fn constructors_reject_non_positive_values() {
        let product = Uuid::new_v4();
        assert!(Movement::purchase(product, 0, 120).is_err());
        assert!(Movement::purchase(product, 5, 0).is_err());
        assert!(Movement::usage(product, None, -1).is_err());
        assert!(Movement::write_off(WriteOffReason::Waste, product, 0, 10).is_err());
        assert!(
            Movement::sale(None, false, 1, 100, VatRate::Standard, None, PaymentMethod::Cash)
                .is_err()
        );
        assert!(
            Movement::sale(None, true, 1, 100, VatRate::Standard, Some("deko".into()), PaymentMethod::Cash)
                .is_err()
        );
    }

    #[test]
    fn row_round_trip_keeps_storno_sign() {
        let original = sale(2, 499);
        let storno_id = Uuid::new_v4();
        let storno = Transaction {
            id: storno_id,
            batch_id: storno_id,
            occurred_at: Utc::now(),
            created_by: "anna".to_string(),
            note: Some(format!("storno of {}", original.id)),
            idempotency_key: None,
            movement: Movement::storno_of(&original).unwrap(),
        };

        let active = active_model(&storno, 0);
        let model = Model {
            id: active.id.unwrap(),
            batch_id: active.batch_id.unwrap(),
            batch_line: active.batch_line.unwrap(),
            kind: active.kind.unwrap(),
            product_id: active.product_id.unwrap(),
            template_id: active.template_id.unwrap(),
            quantity: active.quantity.unwrap(),
            unit_price_minor: active.unit_price_minor.unwrap(),
            total_price_minor: active.total_price_minor.unwrap(),
            vat_rate: active.vat_rate.unwrap(),
            vat_amount_minor: active.vat_amount_minor.unwrap(),
            category: active.category.unwrap(),
            payment_method: active.payment_method.unwrap(),
            inventory_linked: active.inventory_linked.unwrap(),
            reverses_transaction_id: active.reverses_transaction_id.unwrap(),
            note: active.note.unwrap(),
            occurred_at: active.occurred_at.unwrap(),
            created_by: active.created_by.unwrap(),
            idempotency_key: active.idempotency_key.unwrap(),
        };
        assert_eq!(model.unit_price_minor, -499);
        assert_eq!(model.total_price_minor, -998);

        let decoded = Transaction::try_from(model).unwrap();
        assert_eq!(decoded, storno);
    }

    #[test]
    fn kinds_parse_from_their_names() {
        for kind in TransactionKind::ALL {
            assert_eq!(TransactionKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(TransactionKind::try_from("refund").is_err());
        assert_eq!(WriteOffReason::try_from("gift").unwrap(), WriteOffReason::Gift);
        assert!(WriteOffReason::try_from("sale").is_err());
    }
}
