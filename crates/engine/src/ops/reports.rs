use chrono::{DateTime, Utc};

use crate::{Granularity, ResultEngine, SalesReport, SalesReportBuilder, TransactionKind};

use super::{Engine, TransactionListFilter};

const REPORT_PAGE_SIZE: u64 = 500;

/// Date range and bucket size of a sales report. `from` is inclusive, `to`
/// exclusive. Use [`ShopSettings::start_of_day`] to cut the range at local
/// midnight.
///
/// [`ShopSettings::start_of_day`]: crate::ShopSettings::start_of_day
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub granularity: Granularity,
}

impl Engine {
    /// Revenue per period, payment method and category plus the VAT summary.
    ///
    /// Rows are read page by page, so large ranges never sit in memory at
    /// once.
    pub async fn sales_report(&self, filter: ReportFilter) -> ResultEngine<SalesReport> {
        let list_filter = TransactionListFilter {
            from: filter.from,
            to: filter.to,
            kinds: Some(TransactionKind::REVENUE.to_vec()),
            product_id: None,
        };

        let mut builder = SalesReportBuilder::new(filter.granularity, self.settings.timezone);
        let mut cursor: Option<String> = None;
        loop {
            let (page, next) = self
                .list_transactions_page(REPORT_PAGE_SIZE, cursor.as_deref(), &list_filter)
                .await?;
            for tx in &page {
                builder.push(tx);
            }
            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(builder.finish())
    }
}
