use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;

use crate::{ResultEngine, VatRate};

mod bouquets;
mod catalog;
mod inventory;
mod ledger;
mod purchases;
mod reports;
mod sales;
mod storno;
mod templates;
mod write_offs;

pub use ledger::{OperationReceipt, TransactionListFilter};
pub use reports::ReportFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Labor surcharge added on top of ingredient cost when pricing a template.
pub const DEFAULT_LABOR_SURCHARGE_PERCENT: u32 = 10;

/// Calendar the shop reports in.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Berlin;

/// Shop-wide knobs the engine applies to every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShopSettings {
    /// Rate for free sales and bouquet sales.
    pub default_vat_rate: VatRate,
    pub labor_surcharge_percent: u32,
    /// Report days, months and years start at midnight in this zone.
    pub timezone: Tz,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            default_vat_rate: VatRate::Standard,
            labor_surcharge_percent: DEFAULT_LABOR_SURCHARGE_PERCENT,
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl ShopSettings {
    /// The instant `date` begins on the shop's wall clock.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        midnight
            .and_local_timezone(self.timezone)
            .earliest()
            .map_or_else(|| midnight.and_utc(), |at| at.with_timezone(&Utc))
    }
}

/// The ledger engine.
///
/// Every write goes through a single DB transaction: stock checks, stock
/// updates and the ledger rows of one operation commit together or not at
/// all.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    settings: ShopSettings,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn settings(&self) -> ShopSettings {
        self.settings
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    settings: ShopSettings,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn default_vat_rate(mut self, rate: VatRate) -> EngineBuilder {
        self.settings.default_vat_rate = rate;
        self
    }

    pub fn labor_surcharge_percent(mut self, percent: u32) -> EngineBuilder {
        self.settings.labor_surcharge_percent = percent;
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> EngineBuilder {
        self.settings.timezone = timezone;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            settings: self.settings,
        })
    }
}
