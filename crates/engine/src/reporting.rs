//! Revenue and VAT reports folded from ledger rows.
//!
//! Only sales, bouquet sales and stornos count. A storno is booked on its own
//! date with negative amounts, so a sale cancelled the same day nets out and
//! one cancelled later lowers the later period. Periods follow the shop's
//! local calendar, not UTC.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, FALLBACK_CATEGORY, PaymentMethod, Transaction, TransactionKind, VatRate, VatSplit,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Day,
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Period label of `at` on the wall clock of `timezone`: `2026-10-18`,
    /// `2026-10` or `2026`.
    pub fn period_of(self, at: DateTime<Utc>, timezone: Tz) -> String {
        let format = match self {
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        };
        at.with_timezone(&timezone).format(format).to_string()
    }
}

impl TryFrom<&str> for Granularity {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(EngineError::validation(
                "granularity",
                format!("expected day, month or year, got {other}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRevenue {
    pub period: String,
    pub gross_minor: i64,
    pub net_minor: i64,
    pub vat_minor: i64,
    pub transaction_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRevenue {
    pub payment_method: PaymentMethod,
    pub gross_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub gross_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatBucket {
    pub rate: VatRate,
    pub split: VatSplit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatSummary {
    /// One bucket per rate, reduced first.
    pub buckets: Vec<VatBucket>,
    pub total: VatSplit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub granularity: Granularity,
    pub periods: Vec<PeriodRevenue>,
    pub by_payment_method: Vec<PaymentRevenue>,
    /// Highest revenue first.
    pub by_category: Vec<CategoryRevenue>,
    pub vat: VatSummary,
    pub sale_count: u64,
    pub storno_count: u64,
}

impl SalesReport {
    pub fn from_transactions<'a>(
        granularity: Granularity,
        timezone: Tz,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Self {
        let mut builder = SalesReportBuilder::new(granularity, timezone);
        for tx in transactions {
            builder.push(tx);
        }
        builder.finish()
    }

    pub fn gross_minor(&self) -> i64 {
        self.vat.total.gross_minor
    }
}

#[derive(Default)]
struct Totals {
    gross_minor: i64,
    vat_minor: i64,
    count: u64,
}

impl Totals {
    fn add(&mut self, gross_minor: i64, vat_minor: i64) {
        self.gross_minor += gross_minor;
        self.vat_minor += vat_minor;
        self.count += 1;
    }

    fn split(&self) -> VatSplit {
        VatSplit {
            gross_minor: self.gross_minor,
            net_minor: self.gross_minor - self.vat_minor,
            vat_minor: self.vat_minor,
        }
    }
}

/// Incremental report fold, for feeding rows page by page.
pub struct SalesReportBuilder {
    granularity: Granularity,
    timezone: Tz,
    periods: BTreeMap<String, Totals>,
    payments: BTreeMap<PaymentMethod, i64>,
    categories: BTreeMap<String, i64>,
    rates: BTreeMap<VatRate, Totals>,
    sale_count: u64,
    storno_count: u64,
}

impl SalesReportBuilder {
    pub fn new(granularity: Granularity, timezone: Tz) -> Self {
        Self {
            granularity,
            timezone,
            periods: BTreeMap::new(),
            payments: BTreeMap::new(),
            categories: BTreeMap::new(),
            rates: BTreeMap::new(),
            sale_count: 0,
            storno_count: 0,
        }
    }

    /// Add one row; rows that are not revenue are ignored.
    pub fn push(&mut self, tx: &Transaction) {
        let kind = tx.kind();
        let Some(rate) = tx.movement.vat_rate().filter(|_| kind.is_revenue()) else {
            return;
        };
        let gross = tx.total_price_minor();
        let vat = tx.vat_amount_minor();

        self.periods
            .entry(self.granularity.period_of(tx.occurred_at, self.timezone))
            .or_default()
            .add(gross, vat);
        *self
            .payments
            .entry(tx.movement.payment_method().unwrap_or_default())
            .or_default() += gross;
        *self
            .categories
            .entry(
                tx.movement
                    .category()
                    .unwrap_or(FALLBACK_CATEGORY)
                    .to_string(),
            )
            .or_default() += gross;
        self.rates.entry(rate).or_default().add(gross, vat);

        if kind == TransactionKind::Storno {
            self.storno_count += 1;
        } else {
            self.sale_count += 1;
        }
    }

    pub fn finish(self) -> SalesReport {
        let periods = self
            .periods
            .into_iter()
            .map(|(period, totals)| {
                let split = totals.split();
                PeriodRevenue {
                    period,
                    gross_minor: split.gross_minor,
                    net_minor: split.net_minor,
                    vat_minor: split.vat_minor,
                    transaction_count: totals.count,
                }
            })
            .collect();

        let by_payment_method = self
            .payments
            .into_iter()
            .map(|(payment_method, gross_minor)| PaymentRevenue {
                payment_method,
                gross_minor,
            })
            .collect();

        let mut by_category: Vec<CategoryRevenue> = self
            .categories
            .into_iter()
            .map(|(category, gross_minor)| CategoryRevenue {
                category,
                gross_minor,
            })
            .collect();
        by_category.sort_by(|a, b| {
            b.gross_minor
                .cmp(&a.gross_minor)
                .then_with(|| a.category.cmp(&b.category))
        });

        let buckets: Vec<VatBucket> = VatRate::ALL
            .into_iter()
            .map(|rate| VatBucket {
                rate,
                split: self.rates.get(&rate).map(Totals::split).unwrap_or_default(),
            })
            .collect();
        let total = buckets.iter().fold(VatSplit::default(), |acc, bucket| VatSplit {
            gross_minor: acc.gross_minor + bucket.split.gross_minor,
            net_minor: acc.net_minor + bucket.split.net_minor,
            vat_minor: acc.vat_minor + bucket.split.vat_minor,
        });

        SalesReport {
            granularity: self.granularity,
            periods,
            by_payment_method,
            by_category,
            vat: VatSummary { buckets, total },
            sale_count: self.sale_count,
            storno_count: self.storno_count,
        }
    }
}
