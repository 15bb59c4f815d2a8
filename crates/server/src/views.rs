//! Conversions between engine types and the JSON views in `api_types`.

use api_types::{
    VatRate as ApiVatRate,
    catalog::{CategoryView, MaterialView, ProductView},
    inventory::StockView,
    operation::{OperationReceipt, PaymentMethod as ApiPayment, WriteOffReason as ApiReason},
    report::{
        CategoryView as ReportCategoryView, Granularity as ApiGranularity, PaymentView,
        PeriodView, SalesReportResponse, VatView,
    },
    template::{
        CostLineView, IngredientKind, TemplateCostingView, TemplateItemView, TemplateView,
    },
    transaction::{TransactionKind as ApiKind, TransactionView},
};
use chrono::{DateTime, Utc};
use engine::{
    Category, CostLine, Granularity, Ingredient, Material, PaymentMethod, Product, SalesReport,
    StockItem, TemplateCosting, TemplateItem, Transaction, TransactionKind, VatRate, VatSplit,
    WriteOffReason,
};

pub fn vat_rate(rate: VatRate) -> ApiVatRate {
    match rate {
        VatRate::Reduced => ApiVatRate::Reduced,
        VatRate::Standard => ApiVatRate::Standard,
    }
}

pub fn engine_vat_rate(rate: ApiVatRate) -> VatRate {
    match rate {
        ApiVatRate::Reduced => VatRate::Reduced,
        ApiVatRate::Standard => VatRate::Standard,
    }
}

pub fn payment_method(method: PaymentMethod) -> ApiPayment {
    match method {
        PaymentMethod::Cash => ApiPayment::Cash,
        PaymentMethod::Card => ApiPayment::Card,
    }
}

pub fn engine_payment_method(method: ApiPayment) -> PaymentMethod {
    match method {
        ApiPayment::Cash => PaymentMethod::Cash,
        ApiPayment::Card => PaymentMethod::Card,
    }
}

pub fn engine_write_off_reason(reason: ApiReason) -> WriteOffReason {
    match reason {
        ApiReason::Waste => WriteOffReason::Waste,
        ApiReason::Personal => WriteOffReason::Personal,
        ApiReason::Gift => WriteOffReason::Gift,
        ApiReason::Discount => WriteOffReason::Discount,
    }
}

pub fn engine_granularity(granularity: ApiGranularity) -> Granularity {
    match granularity {
        ApiGranularity::Day => Granularity::Day,
        ApiGranularity::Month => Granularity::Month,
        ApiGranularity::Year => Granularity::Year,
    }
}

fn granularity(granularity: Granularity) -> ApiGranularity {
    match granularity {
        Granularity::Day => ApiGranularity::Day,
        Granularity::Month => ApiGranularity::Month,
        Granularity::Year => ApiGranularity::Year,
    }
}

fn kind(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Purchase => ApiKind::Purchase,
        TransactionKind::Sale => ApiKind::Sale,
        TransactionKind::SaleBouquet => ApiKind::SaleBouquet,
        TransactionKind::Usage => ApiKind::Usage,
        TransactionKind::Production => ApiKind::Production,
        TransactionKind::Waste => ApiKind::Waste,
        TransactionKind::Personal => ApiKind::Personal,
        TransactionKind::Gift => ApiKind::Gift,
        TransactionKind::Discount => ApiKind::Discount,
        TransactionKind::Storno => ApiKind::Storno,
    }
}

pub fn utc_offset(at: DateTime<Utc>) -> chrono::DateTime<chrono::FixedOffset> {
    at.fixed_offset()
}

pub fn transaction(tx: &Transaction) -> TransactionView {
    let movement = &tx.movement;
    TransactionView {
        id: tx.id,
        batch_id: tx.batch_id,
        kind: kind(tx.kind()),
        occurred_at: utc_offset(tx.occurred_at),
        product_id: movement.product_id(),
        template_id: movement.template_id(),
        quantity: movement.quantity(),
        unit_price_minor: movement.unit_price_minor(),
        total_price_minor: movement.total_price_minor(),
        vat_rate: movement.vat_rate().map(vat_rate),
        vat_amount_minor: movement.vat_amount_minor(),
        category: movement.category().map(ToString::to_string),
        payment_method: movement.payment_method().map(payment_method),
        reverses_transaction_id: movement.reverses(),
        note: tx.note.clone(),
        created_by: tx.created_by.clone(),
    }
}

pub fn receipt(receipt: &engine::OperationReceipt) -> OperationReceipt {
    OperationReceipt {
        batch_id: receipt.batch_id,
        replayed: receipt.replayed,
        transactions: receipt.transactions.iter().map(transaction).collect(),
    }
}

pub fn category(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
    }
}

pub fn product(product: Product) -> ProductView {
    ProductView {
        id: product.id,
        name: product.name,
        category_id: product.category_id,
        vat_rate: vat_rate(product.vat_rate),
        is_composite: product.is_composite,
    }
}

pub fn material(material: Material) -> MaterialView {
    MaterialView {
        id: material.id,
        name: material.name,
        unit_price_minor: material.unit_price_minor,
        vat_rate: vat_rate(material.vat_rate),
    }
}

pub fn stock(item: StockItem) -> StockView {
    StockView {
        product_id: item.product.id,
        name: item.product.name,
        is_composite: item.product.is_composite,
        quantity: item.entry.quantity,
        unit_purchase_price_minor: item.entry.unit_purchase_price_minor,
        last_updated: utc_offset(item.entry.last_updated),
    }
}

fn ingredient(ingredient: Ingredient) -> (IngredientKind, uuid::Uuid) {
    match ingredient {
        Ingredient::Product(id) => (IngredientKind::Product, id),
        Ingredient::Material(id) => (IngredientKind::Material, id),
    }
}

pub fn template_item(item: &TemplateItem) -> TemplateItemView {
    let (kind, id) = ingredient(item.ingredient);
    TemplateItemView {
        kind,
        id,
        quantity: item.quantity,
    }
}

pub fn engine_template_item(item: &TemplateItemView) -> TemplateItem {
    let ingredient = match item.kind {
        IngredientKind::Product => Ingredient::Product(item.id),
        IngredientKind::Material => Ingredient::Material(item.id),
    };
    TemplateItem::new(ingredient, item.quantity)
}

pub fn template(template: engine::BouquetTemplate) -> TemplateView {
    TemplateView {
        id: template.id,
        items: template.items.iter().map(template_item).collect(),
        name: template.name,
        description: template.description,
        base_price_minor: template.base_price_minor,
    }
}

fn cost_line(line: CostLine) -> CostLineView {
    let (kind, id) = ingredient(line.ingredient);
    CostLineView {
        kind,
        id,
        name: line.name,
        quantity: line.quantity,
        unit_cost_minor: line.unit_cost_minor,
        total_minor: line.total_minor,
    }
}

pub fn costing(costing: TemplateCosting) -> TemplateCostingView {
    TemplateCostingView {
        lines: costing.lines.into_iter().map(cost_line).collect(),
        products_cost_minor: costing.products_cost_minor,
        materials_cost_minor: costing.materials_cost_minor,
        subtotal_minor: costing.subtotal_minor,
        labor_minor: costing.labor_minor,
        suggested_price_minor: costing.suggested_price_minor,
        base_price_minor: costing.base_price_minor,
    }
}

fn vat_view(rate: Option<VatRate>, split: VatSplit) -> VatView {
    VatView {
        rate: rate.map(vat_rate),
        gross_minor: split.gross_minor,
        net_minor: split.net_minor,
        vat_minor: split.vat_minor,
    }
}

pub fn sales_report(report: SalesReport) -> SalesReportResponse {
    SalesReportResponse {
        granularity: granularity(report.granularity),
        periods: report
            .periods
            .into_iter()
            .map(|p| PeriodView {
                period: p.period,
                gross_minor: p.gross_minor,
                net_minor: p.net_minor,
                vat_minor: p.vat_minor,
                transaction_count: p.transaction_count,
            })
            .collect(),
        by_payment_method: report
            .by_payment_method
            .into_iter()
            .map(|p| PaymentView {
                payment_method: payment_method(p.payment_method),
                gross_minor: p.gross_minor,
            })
            .collect(),
        by_category: report
            .by_category
            .into_iter()
            .map(|c| ReportCategoryView {
                category: c.category,
                gross_minor: c.gross_minor,
            })
            .collect(),
        vat: report
            .vat
            .buckets
            .into_iter()
            .map(|bucket| vat_view(Some(bucket.rate), bucket.split))
            .collect(),
        vat_total: vat_view(None, report.vat.total),
        sale_count: report.sale_count,
        storno_count: report.storno_count,
    }
}
