//! The module contains the errors the engine can throw.
//!
//! Business outcomes the caller is expected to show to the florist:
//!
//! - [`InsufficientStock`] a stock decrement would drive a quantity negative.
//! - [`AlreadyCancelled`] a sale already has a storno.
//!
//! Caller mistakes, always raised before anything is written:
//!
//! - [`Validation`] non-positive quantities/prices, missing references.
//! - [`NotFound`] unknown product, material, template or transaction.
//!
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`AlreadyCancelled`]: EngineError::AlreadyCancelled
//!  [`Validation`]: EngineError::Validation
//!  [`NotFound`]: EngineError::NotFound
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// The kind of record a [`EngineError::NotFound`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Product,
    Material,
    Template,
    InventoryEntry,
    Transaction,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Product => "product",
            Self::Material => "material",
            Self::Template => "template",
            Self::InventoryEntry => "inventory entry",
            Self::Transaction => "transaction",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i64,
        available: i64,
    },
    #[error("{kind} \"{id}\" not found!")]
    NotFound { kind: EntityKind, id: String },
    #[error("Transaction {transaction_id} already cancelled")]
    AlreadyCancelled { transaction_id: Uuid },
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::InsufficientStock {
                    product_id: a,
                    requested: ar,
                    available: aa,
                },
                Self::InsufficientStock {
                    product_id: b,
                    requested: br,
                    available: ba,
                },
            ) => a == b && ar == br && aa == ba,
            (Self::NotFound { kind: a, id: ai }, Self::NotFound { kind: b, id: bi }) => {
                a == b && ai == bi
            }
            (
                Self::AlreadyCancelled { transaction_id: a },
                Self::AlreadyCancelled { transaction_id: b },
            ) => a == b,
            (
                Self::Validation {
                    field: a,
                    reason: ar,
                },
                Self::Validation {
                    field: b,
                    reason: br,
                },
            ) => a == b && ar == br,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
