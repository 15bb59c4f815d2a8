//! Bouquet costing: ingredient cost, labor surcharge and price hints.

use serde::{Deserialize, Serialize};

use crate::{Ingredient, Money};

/// Markup applied to the ingredient cost of a quick bouquet, in tenths.
const QUICK_BOUQUET_MARKUP_TENTHS: i64 = 25;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLine {
    pub ingredient: Ingredient,
    pub name: String,
    pub quantity: i64,
    pub unit_cost_minor: i64,
    pub total_minor: i64,
}

/// Cost breakdown of a template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCosting {
    pub lines: Vec<CostLine>,
    pub products_cost_minor: i64,
    pub materials_cost_minor: i64,
    pub subtotal_minor: i64,
    pub labor_minor: i64,
    /// Subtotal plus labor.
    pub suggested_price_minor: i64,
    /// The price stored on the template, for comparison.
    pub base_price_minor: i64,
}

impl TemplateCosting {
    pub fn new(lines: Vec<CostLine>, labor_percent: u32, base_price_minor: i64) -> Self {
        let cost_of = |material: bool| {
            lines
                .iter()
                .filter(|line| matches!(line.ingredient, Ingredient::Material(_)) == material)
                .map(|line| line.total_minor)
                .sum::<i64>()
        };
        let products_cost_minor = cost_of(false);
        let materials_cost_minor = cost_of(true);
        let subtotal_minor = products_cost_minor + materials_cost_minor;
        let labor_minor = labor_surcharge(subtotal_minor, labor_percent);
        Self {
            lines,
            products_cost_minor,
            materials_cost_minor,
            subtotal_minor,
            labor_minor,
            suggested_price_minor: subtotal_minor + labor_minor,
            base_price_minor,
        }
    }
}

/// Price suggestion for a bouquet assembled at the counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickBouquetQuote {
    pub cost_minor: i64,
    pub suggested_price_minor: i64,
}

impl QuickBouquetQuote {
    pub fn from_cost(cost_minor: i64) -> Self {
        Self {
            cost_minor,
            suggested_price_minor: quick_price_hint(cost_minor).cents(),
        }
    }
}

/// `percent` of `subtotal_minor`, rounded half up to cents.
pub fn labor_surcharge(subtotal_minor: i64, percent: u32) -> i64 {
    let scaled = subtotal_minor * i64::from(percent);
    (scaled + 50).div_euclid(100)
}

/// Ingredient cost times 2.5, rounded up to whole euros.
pub fn quick_price_hint(cost_minor: i64) -> Money {
    let scaled = cost_minor * QUICK_BOUQUET_MARKUP_TENTHS;
    let cents = (scaled + 9).div_euclid(10);
    Money::new(cents).ceil_to_euro()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn line(ingredient: Ingredient, quantity: i64, unit_cost_minor: i64) -> CostLine {
        CostLine {
            ingredient,
            name: "x".to_string(),
            quantity,
            unit_cost_minor,
            total_minor: quantity * unit_cost_minor,
        }
    }

    #[test]
    fn costing_adds_ten_percent_labor() {
        let costing = TemplateCosting::new(
            vec![
                line(Ingredient::Product(Uuid::new_v4()), 5, 120),
                line(Ingredient::Material(Uuid::new_v4()), 1, 150),
            ],
            10,
            1500,
        );
        assert_eq!(costing.products_cost_minor, 600);
        assert_eq!(costing.materials_cost_minor, 150);
        assert_eq!(costing.subtotal_minor, 750);
        assert_eq!(costing.labor_minor, 75);
        assert_eq!(costing.suggested_price_minor, 825);
    }

    #[test]
    fn labor_rounds_half_up() {
        assert_eq!(labor_surcharge(5, 10), 1);
        assert_eq!(labor_surcharge(4, 10), 0);
        assert_eq!(labor_surcharge(0, 10), 0);
    }

    #[test]
    fn quick_hint_rounds_up_to_euro() {
        // 4,80 € * 2.5 = 12,00 €
        assert_eq!(quick_price_hint(480), Money::new(1200));
        // 4,81 € * 2.5 = 12,025 € -> 13 €
        assert_eq!(quick_price_hint(481), Money::new(1300));
        assert_eq!(quick_price_hint(0), Money::ZERO);
    }
}
