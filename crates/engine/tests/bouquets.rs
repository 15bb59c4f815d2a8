use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    BOUQUET_CATEGORY, CompositeSaleCmd, CompositeSource, EngineError, Engine, EntityKind,
    Ingredient, NewMaterial, NewProduct, NewTemplate, PaymentMethod, ProduceCmd, ProductRef,
    PurchaseCmd, StornoCmd, TemplateItem, TransactionKind, VatRate,
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

fn at(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, h, 0, 0).unwrap()
}

struct Shop {
    rose: Uuid,
    fern: Uuid,
    ribbon: Uuid,
    template: Uuid,
}

/// Roses at 1,20 €, fern at 0,50 €, ribbon at 0,80 € and an autumn bouquet
/// of 5 roses, 2 fern and 1 ribbon.
async fn shop(engine: &Engine, roses: i64, fern: i64) -> Shop {
    let mut ids = Vec::new();
    for (name, quantity, cost) in [("Rose rot", roses, 120), ("Farn", fern, 50)] {
        let receipt = engine
            .record_purchase(PurchaseCmd::new(
                OPERATOR,
                ProductRef::named(name),
                quantity,
                cost,
                at(7),
            ))
            .await
            .unwrap();
        ids.push(receipt.headline().unwrap().movement.product_id().unwrap());
    }
    let ribbon = engine
        .create_material(NewMaterial::new("Schleife", 80, VatRate::Standard))
        .await
        .unwrap();
    let template = engine
        .create_template(
            NewTemplate::new("Herbststrauß", 2990)
                .description("Rosen mit Farn")
                .product(ids[0], 5)
                .product(ids[1], 2)
                .material(ribbon.id, 1),
        )
        .await
        .unwrap();
    Shop {
        rose: ids[0],
        fern: ids[1],
        ribbon: ribbon.id,
        template: template.id,
    }
}

#[tokio::test]
async fn template_costing_prices_ingredients_and_labor() {
    let (engine, _db) = engine_with_db().await;
    let shop = shop(&engine, 20, 10).await;

    let costing = engine.template_costing(shop.template).await.unwrap();
    assert_eq!(costing.lines.len(), 3);
    assert_eq!(costing.products_cost_minor, 5 * 120 + 2 * 50);
    assert_eq!(costing.materials_cost_minor, 80);
    assert_eq!(costing.subtotal_minor, 780);
    assert_eq!(costing.labor_minor, 78);
    assert_eq!(costing.suggested_price_minor, 858);
    assert_eq!(costing.base_price_minor, 2990);

    let quote = engine
        .quick_bouquet_quote(&[
            TemplateItem::new(Ingredient::Product(shop.rose), 5),
            TemplateItem::new(Ingredient::Product(shop.fern), 2),
            TemplateItem::new(Ingredient::Material(shop.ribbon), 1),
        ])
        .await
        .unwrap();
    assert_eq!(quote.cost_minor, 780);
    assert_eq!(quote.suggested_price_minor, 2000);
}

#[tokio::test]
async fn template_names_are_unique_and_items_must_exist() {
    let (engine, _db) = engine_with_db().await;
    let shop = shop(&engine, 20, 10).await;

    let err = engine
        .create_template(NewTemplate::new("herbststrauß", 1000).product(shop.rose, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .create_template(NewTemplate::new("Leer", 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { field: "items", .. }));

    let err = engine
        .create_template(NewTemplate::new("Geist", 1000).product(Uuid::new_v4(), 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound {
            kind: EntityKind::Product,
            ..
        }
    ));
    assert_eq!(engine.templates().await.unwrap().len(), 1);
}

#[tokio::test]
async fn template_names_compare_umlauts_case_insensitively() {
    let (engine, _db) = engine_with_db().await;
    let shop = shop(&engine, 20, 10).await;

    let first = engine
        .create_template(NewTemplate::new("Ärger", 1000).product(shop.rose, 1))
        .await
        .unwrap();
    let err = engine
        .create_template(NewTemplate::new("ärger", 5000).product(shop.rose, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .update_template(
            shop.template,
            NewTemplate::new("ÄRGER", 2990).product(shop.rose, 5),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(engine.template(shop.template).await.unwrap().name, "Herbststrauß");

    // Each template keeps a composite product of its own.
    let a = engine
        .produce_bouquet(ProduceCmd::new(OPERATOR, first.id, 2, at(9)))
        .await
        .unwrap();
    let b = engine
        .produce_bouquet(ProduceCmd::new(OPERATOR, shop.template, 1, at(10)))
        .await
        .unwrap();
    let a_id = a.headline().unwrap().movement.product_id().unwrap();
    let b_id = b.headline().unwrap().movement.product_id().unwrap();
    assert_ne!(a_id, b_id);
    assert_eq!(engine.stock_quantity(a_id).await.unwrap(), 2);
    assert_eq!(engine.stock_quantity(b_id).await.unwrap(), 1);
}

#[tokio::test]
async fn template_update_replaces_items_and_delete_frees_materials() {
    let (engine, _db) = engine_with_db().await;
    let shop = shop(&engine, 20, 10).await;

    let err = engine.delete_material(shop.ribbon).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation {
            field: "material_id",
            ..
        }
    ));

    let updated = engine
        .update_template(
            shop.template,
            NewTemplate::new("Herbststrauß groß", 3990)
                .product(shop.rose, 7)
                .product(shop.rose, 2)
                .material(shop.ribbon, 1),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Herbststrauß groß");
    assert_eq!(
        updated.items,
        vec![
            TemplateItem::new(Ingredient::Product(shop.rose), 9),
            TemplateItem::new(Ingredient::Material(shop.ribbon), 1),
        ]
    );
    let reloaded = engine.template(shop.template).await.unwrap();
    assert_eq!(reloaded.items, updated.items);
    assert_eq!(reloaded.description, None);

    engine.delete_template(shop.template).await.unwrap();
    let err = engine.template(shop.template).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound {
            kind: EntityKind::Template,
            ..
        }
    ));
    engine.delete_material(shop.ribbon).await.unwrap();
    assert!(engine.materials().await.unwrap().is_empty());
}

#[tokio::test]
async fn production_without_enough_stock_changes_nothing() {
    let (engine, _db) = engine_with_db().await;
    let shop = shop(&engine, 12, 10).await;

    let err = engine
        .produce_bouquet(ProduceCmd::new(OPERATOR, shop.template, 3, at(9)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientStock {
            product_id: shop.rose,
            requested: 15,
            available: 12,
        }
    );
    assert_eq!(engine.stock_quantity(shop.rose).await.unwrap(), 12);
    assert_eq!(engine.stock_quantity(shop.fern).await.unwrap(), 10);
    assert!(engine.products().await.unwrap().iter().all(|p| !p.is_composite));
}

#[tokio::test]
async fn production_moves_ingredients_into_a_composite_product() {
    let (engine, _db) = engine_with_db().await;
    let bouquets = engine.create_category(BOUQUET_CATEGORY).await.unwrap();
    let shop = shop(&engine, 12, 10).await;

    let receipt = engine
        .produce_bouquet(ProduceCmd::new(OPERATOR, shop.template, 2, at(9)))
        .await
        .unwrap();
    assert_eq!(receipt.transactions.len(), 3);

    let usage: Vec<_> = receipt.of_kind(TransactionKind::Usage).collect();
    assert_eq!(usage.len(), 2);
    assert!(usage.iter().all(|tx| tx.note.as_deref()
        == Some("used for production: Herbststrauß (x2)")));
    assert!(usage.iter().all(|tx| tx.movement.template_id() == Some(shop.template)));
    assert_eq!(engine.stock_quantity(shop.rose).await.unwrap(), 2);
    assert_eq!(engine.stock_quantity(shop.fern).await.unwrap(), 6);

    let production = receipt.headline().unwrap();
    assert_eq!(production.kind(), TransactionKind::Production);
    assert_eq!(production.quantity(), 2);
    assert_eq!(production.total_price_minor(), 5980);

    let composite_id = production.movement.product_id().unwrap();
    let composite = engine.product(composite_id).await.unwrap();
    assert!(composite.is_composite);
    assert_eq!(composite.name, "Herbststrauß");
    assert_eq!(composite.category_id, Some(bouquets.id));
    assert_eq!(engine.stock_quantity(composite_id).await.unwrap(), 2);

    let sold = engine
        .sell_composite(
            CompositeSaleCmd::new(
                OPERATOR,
                CompositeSource::Stocked {
                    product_id: composite_id,
                },
                1,
                3490,
                at(11),
            )
            .payment_method(PaymentMethod::Card),
        )
        .await
        .unwrap();
    let sale = sold.headline().unwrap();
    assert_eq!(sale.kind(), TransactionKind::Sale);
    assert_eq!(sale.movement.category(), Some(BOUQUET_CATEGORY));
    assert_eq!(engine.stock_quantity(composite_id).await.unwrap(), 1);

    // Cancelling a stocked bouquet sale puts the bouquet back.
    engine
        .storno(StornoCmd::new(OPERATOR, sale.id, at(12)))
        .await
        .unwrap();
    assert_eq!(engine.stock_quantity(composite_id).await.unwrap(), 2);
}

#[tokio::test]
async fn bouquet_sale_from_template_uses_ingredients_without_a_composite() {
    let (engine, _db) = engine_with_db().await;
    let shop = shop(&engine, 20, 10).await;

    let receipt = engine
        .sell_composite(CompositeSaleCmd::new(
            OPERATOR,
            CompositeSource::FromTemplate {
                template_id: shop.template,
            },
            2,
            2990,
            at(10),
        ))
        .await
        .unwrap();
    assert_eq!(receipt.of_kind(TransactionKind::Usage).count(), 2);
    assert_eq!(engine.stock_quantity(shop.rose).await.unwrap(), 10);
    assert_eq!(engine.stock_quantity(shop.fern).await.unwrap(), 6);

    let sale = receipt.headline().unwrap();
    assert_eq!(sale.kind(), TransactionKind::SaleBouquet);
    assert_eq!(sale.total_price_minor(), 5980);
    assert_eq!(sale.vat_amount_minor(), 955);
    assert_eq!(sale.movement.category(), Some(BOUQUET_CATEGORY));
    assert_eq!(sale.movement.template_id(), Some(shop.template));
    assert_eq!(sale.note.as_deref(), Some("Herbststrauß"));
    assert!(engine.products().await.unwrap().iter().all(|p| !p.is_composite));

    // The flowers were used; cancelling the sale does not restock them.
    engine
        .storno(StornoCmd::new(OPERATOR, sale.id, at(11)))
        .await
        .unwrap();
    assert_eq!(engine.stock_quantity(shop.rose).await.unwrap(), 10);
}

#[tokio::test]
async fn ad_hoc_bouquet_sale_checks_every_ingredient_first() {
    let (engine, _db) = engine_with_db().await;
    let shop = shop(&engine, 4, 10).await;

    let ingredients = vec![
        TemplateItem::new(Ingredient::Product(shop.fern), 3),
        TemplateItem::new(Ingredient::Product(shop.rose), 5),
        TemplateItem::new(Ingredient::Material(shop.ribbon), 1),
    ];
    let err = engine
        .sell_composite(CompositeSaleCmd::new(
            OPERATOR,
            CompositeSource::AdHoc {
                label: "Kundenwunsch".to_string(),
                ingredients: ingredients.clone(),
            },
            1,
            1500,
            at(10),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientStock {
            requested: 5,
            available: 4,
            ..
        }
    ));
    assert_eq!(engine.stock_quantity(shop.fern).await.unwrap(), 10);

    let receipt = engine
        .sell_composite(CompositeSaleCmd::new(
            OPERATOR,
            CompositeSource::AdHoc {
                label: "Kundenwunsch".to_string(),
                ingredients: ingredients[..1].to_vec(),
            },
            2,
            900,
            at(11),
        ))
        .await
        .unwrap();
    let usage = receipt.of_kind(TransactionKind::Usage).next().unwrap();
    assert_eq!(usage.quantity(), 6);
    assert_eq!(
        usage.note.as_deref(),
        Some("used for bouquet sale: Kundenwunsch (x2)")
    );
    let sale = receipt.headline().unwrap();
    assert_eq!(sale.movement.template_id(), None);
    assert_eq!(sale.total_price_minor(), 1800);
    assert_eq!(engine.stock_quantity(shop.fern).await.unwrap(), 4);
}

#[tokio::test]
async fn stocked_sale_of_a_plain_product_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let product = engine
        .create_product(NewProduct::new("Vase", VatRate::Standard))
        .await
        .unwrap();

    let err = engine
        .sell_composite(CompositeSaleCmd::new(
            OPERATOR,
            CompositeSource::Stocked {
                product_id: product.id,
            },
            1,
            1200,
            at(10),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation {
            field: "product_id",
            ..
        }
    ));
}
