use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    EngineError, Engine, Granularity, NewProduct, PaymentMethod, ProductRef, PurchaseCmd,
    ReportFilter, SaleCmd, StornoCmd, TransactionKind, TransactionListFilter, VatRate,
    WriteOffCmd, WriteOffReason,
};
use migration::MigratorTrait;
use uuid::Uuid;

const OPERATOR: &str = "anna";

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, url, path)
}

fn day(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap()
}

/// Registers `name` and stocks `quantity` units bought at `unit_cost`.
async fn stocked_product(engine: &Engine, name: &str, quantity: i64, unit_cost: i64) -> Uuid {
    let product = engine
        .create_product(NewProduct::new(name, VatRate::Standard))
        .await
        .unwrap();
    engine
        .record_purchase(PurchaseCmd::new(
            OPERATOR,
            ProductRef::Existing(product.id),
            quantity,
            unit_cost,
            day(1, 8),
        ))
        .await
        .unwrap();
    product.id
}

#[tokio::test]
async fn purchase_sale_and_storno_keep_stock_and_ledger_in_step() {
    let (engine, _db) = engine_with_db().await;
    let rose = stocked_product(&engine, "Rose rot", 50, 120).await;

    let entry = engine.inventory_entry(rose).await.unwrap();
    assert_eq!(entry.quantity, 50);
    assert_eq!(entry.unit_purchase_price_minor, 120);

    let sale = engine
        .record_sale(SaleCmd::new(OPERATOR, 3, 250, day(2, 10)).product(rose))
        .await
        .unwrap();
    let sale_row = sale.headline().unwrap().clone();
    assert_eq!(sale_row.kind(), TransactionKind::Sale);
    assert_eq!(sale_row.total_price_minor(), 750);
    assert_eq!(sale_row.vat_amount_minor(), 120);
    assert_eq!(sale_row.movement.vat_rate(), Some(VatRate::Standard));
    assert_eq!(sale_row.movement.payment_method(), Some(PaymentMethod::Cash));
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), 47);

    let storno = engine
        .storno(StornoCmd::new(OPERATOR, sale_row.id, day(2, 11)))
        .await
        .unwrap();
    let storno_row = storno.headline().unwrap();
    assert_eq!(storno_row.kind(), TransactionKind::Storno);
    assert_eq!(storno_row.total_price_minor(), -750);
    assert_eq!(storno_row.vat_amount_minor(), -120);
    assert_eq!(storno_row.movement.reverses(), Some(sale_row.id));
    assert_eq!(
        storno_row.note.as_deref(),
        Some(format!("storno of {}", sale_row.id).as_str())
    );
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), 50);

    let stored = engine.storno_for(sale_row.id).await.unwrap().unwrap();
    assert_eq!(stored.id, storno_row.id);

    let err = engine
        .storno(StornoCmd::new(OPERATOR, sale_row.id, day(2, 12)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::AlreadyCancelled { transaction_id } if transaction_id == sale_row.id
    ));
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), 50);
}

#[tokio::test]
async fn sale_beyond_stock_fails_and_changes_nothing() {
    let (engine, _db) = engine_with_db().await;
    let tulip = stocked_product(&engine, "Tulpe", 2, 80).await;

    let err = engine
        .record_sale(SaleCmd::new(OPERATOR, 3, 150, day(2, 10)).product(tulip))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientStock {
            product_id: tulip,
            requested: 3,
            available: 2,
        }
    );
    assert_eq!(engine.stock_quantity(tulip).await.unwrap(), 2);

    let sales = engine
        .list_transactions(
            10,
            &TransactionListFilter {
                kinds: Some(vec![TransactionKind::Sale]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(sales.is_empty());
}

#[tokio::test]
async fn last_item_can_only_be_sold_once() {
    let (engine, _db) = engine_with_db().await;
    let orchid = stocked_product(&engine, "Orchidee", 1, 900).await;

    engine
        .record_sale(SaleCmd::new(OPERATOR, 1, 1990, day(2, 10)).product(orchid))
        .await
        .unwrap();
    let err = engine
        .record_sale(SaleCmd::new("ben", 1, 1990, day(2, 10)).product(orchid))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientStock { available: 0, .. }
    ));
    assert_eq!(engine.stock_quantity(orchid).await.unwrap(), 0);
}

#[tokio::test]
async fn unlinked_sale_leaves_stock_and_its_storno_does_not_restock() {
    let (engine, _db) = engine_with_db().await;
    let lily = stocked_product(&engine, "Lilie", 10, 150).await;

    let sale = engine
        .record_sale(
            SaleCmd::new(OPERATOR, 2, 400, day(3, 9))
                .product(lily)
                .unlinked(),
        )
        .await
        .unwrap();
    assert_eq!(engine.stock_quantity(lily).await.unwrap(), 10);
    let sale_id = sale.headline().unwrap().id;

    engine
        .storno(StornoCmd::new(OPERATOR, sale_id, day(3, 10)))
        .await
        .unwrap();
    assert_eq!(engine.stock_quantity(lily).await.unwrap(), 10);
}

#[tokio::test]
async fn free_sale_needs_a_category_and_uses_the_default_rate() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .record_sale(SaleCmd::new(OPERATOR, 1, 500, day(4, 9)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation {
            field: "category",
            ..
        }
    ));

    let receipt = engine
        .record_sale(
            SaleCmd::new(OPERATOR, 1, 500, day(4, 9))
                .category("Deko")
                .payment_method(PaymentMethod::Card),
        )
        .await
        .unwrap();
    let row = receipt.headline().unwrap();
    assert_eq!(row.movement.product_id(), None);
    assert_eq!(row.movement.category(), Some("Deko"));
    assert_eq!(row.movement.vat_rate(), Some(VatRate::Standard));
    assert_eq!(row.vat_amount_minor(), 80);
}

#[tokio::test]
async fn storno_of_a_purchase_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let product = engine
        .create_product(NewProduct::new("Gerbera", VatRate::Reduced))
        .await
        .unwrap();
    let purchase = engine
        .record_purchase(PurchaseCmd::new(
            OPERATOR,
            ProductRef::Existing(product.id),
            5,
            70,
            day(5, 8),
        ))
        .await
        .unwrap();

    let err = engine
        .storno(StornoCmd::new(OPERATOR, purchase.batch_id, day(5, 9)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation {
            field: "transaction_id",
            ..
        }
    ));
    assert_eq!(engine.stock_quantity(product.id).await.unwrap(), 5);

    let err = engine
        .storno(StornoCmd::new(OPERATOR, Uuid::new_v4(), day(5, 9)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn purchase_by_name_matches_existing_products_case_insensitively() {
    let (engine, _db) = engine_with_db().await;

    let first = engine
        .record_purchase(PurchaseCmd::new(
            OPERATOR,
            ProductRef::named("Eukalyptus"),
            10,
            60,
            day(6, 8),
        ))
        .await
        .unwrap();
    let product_id = first.headline().unwrap().movement.product_id().unwrap();

    let second = engine
        .record_purchase(PurchaseCmd::new(
            OPERATOR,
            ProductRef::named("  EUKALYPTUS "),
            5,
            65,
            day(6, 9),
        ))
        .await
        .unwrap();
    assert_eq!(
        second.headline().unwrap().movement.product_id(),
        Some(product_id)
    );

    let entry = engine.inventory_entry(product_id).await.unwrap();
    assert_eq!(entry.quantity, 15);
    assert_eq!(entry.unit_purchase_price_minor, 65);
    assert_eq!(engine.products().await.unwrap().len(), 1);
    assert_eq!(
        engine.product(product_id).await.unwrap().vat_rate,
        VatRate::Standard
    );
}

#[tokio::test]
async fn write_off_is_valued_at_the_latest_purchase_cost() {
    let (engine, _db) = engine_with_db().await;
    let rose = stocked_product(&engine, "Rose weiß", 20, 110).await;
    engine
        .record_purchase(PurchaseCmd::new(
            OPERATOR,
            ProductRef::Existing(rose),
            10,
            130,
            day(7, 8),
        ))
        .await
        .unwrap();

    let receipt = engine
        .record_write_off(
            WriteOffCmd::new(OPERATOR, rose, 4, WriteOffReason::Waste, day(7, 18))
                .note("welk"),
        )
        .await
        .unwrap();
    let row = receipt.headline().unwrap();
    assert_eq!(row.kind(), TransactionKind::Waste);
    assert_eq!(row.movement.unit_price_minor(), 130);
    assert_eq!(row.total_price_minor(), 520);
    assert_eq!(row.note.as_deref(), Some("welk"));
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), 26);

    let err = engine
        .record_write_off(WriteOffCmd::new(
            OPERATOR,
            rose,
            27,
            WriteOffReason::Gift,
            day(7, 19),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientStock {
            requested: 27,
            available: 26,
            ..
        }
    ));
}

#[tokio::test]
async fn write_off_of_a_never_stocked_product_fails() {
    let (engine, _db) = engine_with_db().await;
    let product = engine
        .create_product(NewProduct::new("Protea", VatRate::Reduced))
        .await
        .unwrap();

    let err = engine
        .record_write_off(WriteOffCmd::new(
            OPERATOR,
            product.id,
            1,
            WriteOffReason::Personal,
            day(8, 9),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientStock { available: 0, .. }
    ));
}

#[tokio::test]
async fn repeated_idempotency_key_replays_the_first_sale() {
    let (engine, _db) = engine_with_db().await;
    let rose = stocked_product(&engine, "Rose gelb", 10, 100).await;

    let cmd = SaleCmd::new(OPERATOR, 2, 300, day(9, 10))
        .product(rose)
        .idempotency_key("till-1-0042");
    let first = engine.record_sale(cmd.clone()).await.unwrap();
    assert!(!first.replayed);

    let second = engine.record_sale(cmd).await.unwrap();
    assert!(second.replayed);
    assert_eq!(second.batch_id, first.batch_id);
    assert_eq!(second.transactions.len(), 1);
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), 8);

    // Keys are scoped per operator.
    let other = engine
        .record_sale(
            SaleCmd::new("ben", 2, 300, day(9, 10))
                .product(rose)
                .idempotency_key("till-1-0042"),
        )
        .await
        .unwrap();
    assert!(!other.replayed);
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), 6);
}

#[tokio::test]
async fn zero_and_negative_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let rose = stocked_product(&engine, "Rose pink", 5, 100).await;

    for (quantity, price) in [(0, 100), (-1, 100), (1, 0), (1, -5)] {
        let err = engine
            .record_sale(SaleCmd::new(OPERATOR, quantity, price, day(10, 9)).product(rose))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }), "{err}");
    }
    let err = engine
        .record_purchase(PurchaseCmd::new(
            OPERATOR,
            ProductRef::Existing(rose),
            0,
            100,
            day(10, 9),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), 5);
}

#[tokio::test]
async fn stock_equals_the_sum_of_recorded_movements() {
    let (engine, _db) = engine_with_db().await;
    let rose = stocked_product(&engine, "Rose lachs", 30, 100).await;

    let sale = engine
        .record_sale(SaleCmd::new(OPERATOR, 4, 250, day(11, 9)).product(rose))
        .await
        .unwrap();
    engine
        .record_sale(SaleCmd::new(OPERATOR, 6, 250, day(11, 10)).product(rose))
        .await
        .unwrap();
    engine
        .record_write_off(WriteOffCmd::new(
            OPERATOR,
            rose,
            3,
            WriteOffReason::Discount,
            day(11, 11),
        ))
        .await
        .unwrap();
    engine
        .storno(StornoCmd::new(
            OPERATOR,
            sale.headline().unwrap().id,
            day(11, 12),
        ))
        .await
        .unwrap();

    let rows = engine
        .list_transactions(
            100,
            &TransactionListFilter {
                product_id: Some(rose),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let replayed: i64 = rows
        .iter()
        .filter_map(|tx| tx.movement.stock_delta())
        .map(|(_, delta)| delta)
        .sum();
    assert_eq!(replayed, 30 - 4 - 6 - 3 + 4);
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), replayed);
}

#[tokio::test]
async fn list_transactions_pages_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let rose = stocked_product(&engine, "Rose blau", 100, 100).await;
    for hour in 9..14 {
        engine
            .record_sale(SaleCmd::new(OPERATOR, 1, 200, day(12, hour)).product(rose))
            .await
            .unwrap();
    }
    let filter = TransactionListFilter {
        kinds: Some(vec![TransactionKind::Sale]),
        ..Default::default()
    };

    let (first, cursor) = engine
        .list_transactions_page(2, None, &filter)
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].occurred_at, day(12, 13));
    assert_eq!(first[1].occurred_at, day(12, 12));
    let cursor = cursor.unwrap();

    let (second, cursor) = engine
        .list_transactions_page(2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].occurred_at, day(12, 11));

    let (third, cursor) = engine
        .list_transactions_page(2, cursor.as_deref(), &filter)
        .await
        .unwrap();
    assert_eq!(third.len(), 1);
    assert!(cursor.is_none());

    let err = engine
        .list_transactions_page(2, Some("not-a-cursor"), &filter)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));

    let err = engine
        .list_transactions(
            2,
            &TransactionListFilter {
                from: Some(day(12, 12)),
                to: Some(day(12, 9)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
}

#[tokio::test]
async fn sales_report_nets_stornos_per_day() {
    let (engine, _db) = engine_with_db().await;
    let rose = stocked_product(&engine, "Rose orange", 50, 120).await;

    let cancelled = engine
        .record_sale(SaleCmd::new(OPERATOR, 3, 250, day(13, 10)).product(rose))
        .await
        .unwrap();
    engine
        .record_sale(
            SaleCmd::new(OPERATOR, 2, 250, day(13, 11))
                .product(rose)
                .payment_method(PaymentMethod::Card),
        )
        .await
        .unwrap();
    engine
        .record_sale(SaleCmd::new(OPERATOR, 1, 1070, day(14, 9)).category("Gutschein"))
        .await
        .unwrap();
    engine
        .storno(StornoCmd::new(
            OPERATOR,
            cancelled.headline().unwrap().id,
            day(13, 15),
        ))
        .await
        .unwrap();

    let report = engine
        .sales_report(ReportFilter {
            from: Some(day(13, 0)),
            to: Some(day(13, 0) + Duration::days(2)),
            granularity: Granularity::Day,
        })
        .await
        .unwrap();

    assert_eq!(report.sale_count, 3);
    assert_eq!(report.storno_count, 1);
    assert_eq!(report.gross_minor(), 500 + 1070);

    let periods: Vec<_> = report
        .periods
        .iter()
        .map(|p| (p.period.as_str(), p.gross_minor))
        .collect();
    assert_eq!(periods, vec![("2026-10-13", 500), ("2026-10-14", 1070)]);

    let card = report
        .by_payment_method
        .iter()
        .find(|p| p.payment_method == PaymentMethod::Card)
        .unwrap();
    assert_eq!(card.gross_minor, 500);
    assert_eq!(report.vat.total.gross_minor, 1570);
    assert_eq!(
        report.vat.total.net_minor + report.vat.total.vat_minor,
        report.vat.total.gross_minor
    );
}

#[tokio::test]
async fn sales_report_uses_the_shop_calendar() {
    let (engine, _db) = engine_with_db().await;
    let settings = engine.settings();
    assert_eq!(settings.timezone, chrono_tz::Europe::Berlin);

    // 00:30 on 18 Oct in Berlin, still 17 Oct in UTC.
    let just_after_midnight = DateTime::parse_from_rfc3339("2026-10-18T00:30:00+02:00")
        .unwrap()
        .with_timezone(&Utc);
    engine
        .record_sale(SaleCmd::new(OPERATOR, 1, 1000, just_after_midnight).category("Deko"))
        .await
        .unwrap();

    let oct_17 = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    let oct_18 = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let oct_19 = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    assert_eq!(
        settings.start_of_day(oct_18),
        Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap()
    );

    let report = engine
        .sales_report(ReportFilter {
            from: Some(settings.start_of_day(oct_18)),
            to: Some(settings.start_of_day(oct_19)),
            granularity: Granularity::Day,
        })
        .await
        .unwrap();
    assert_eq!(report.periods.len(), 1);
    assert_eq!(report.periods[0].period, "2026-10-18");
    assert_eq!(report.periods[0].gross_minor, 1000);

    let previous_day = engine
        .sales_report(ReportFilter {
            from: Some(settings.start_of_day(oct_17)),
            to: Some(settings.start_of_day(oct_18)),
            granularity: Granularity::Day,
        })
        .await
        .unwrap();
    assert!(previous_day.periods.is_empty());
    assert_eq!(previous_day.gross_minor(), 0);
}

#[tokio::test]
async fn concurrent_stornos_of_one_sale_cancel_it_once() {
    let (engine, db, _url, path) = engine_with_file_db().await;
    let peony = stocked_product(&engine, "Pfingstrose", 10, 200).await;
    let sale = engine
        .record_sale(SaleCmd::new(OPERATOR, 4, 450, day(16, 10)).product(peony))
        .await
        .unwrap();
    let sale_id = sale.headline().unwrap().id;
    assert_eq!(engine.stock_quantity(peony).await.unwrap(), 6);

    let (first, second) = tokio::join!(
        engine.storno(StornoCmd::new(OPERATOR, sale_id, day(16, 11))),
        engine.storno(StornoCmd::new("ben", sale_id, day(16, 11))),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let err = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(
        err,
        EngineError::AlreadyCancelled {
            transaction_id: sale_id
        }
    );

    assert_eq!(engine.stock_quantity(peony).await.unwrap(), 10);
    let stornos = engine
        .list_transactions(
            10,
            &TransactionListFilter {
                kinds: Some(vec![TransactionKind::Storno]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(stornos.len(), 1);
    assert_eq!(stornos[0].movement.reverses(), Some(sale_id));

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn ledger_survives_reconnect() {
    let (engine, db, url, path) = engine_with_file_db().await;
    let rose = stocked_product(&engine, "Rose creme", 12, 95).await;
    let sale = engine
        .record_sale(SaleCmd::new(OPERATOR, 2, 240, day(15, 10)).product(rose))
        .await
        .unwrap();
    drop(engine);
    drop(db);

    let db = Database::connect(&url).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    assert_eq!(engine.stock_quantity(rose).await.unwrap(), 10);
    let reloaded = engine.receipt(sale.batch_id).await.unwrap();
    assert_eq!(reloaded.transactions.len(), 1);
    assert_eq!(reloaded.headline().unwrap().total_price_minor(), 480);

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}
