//! Fixed vocabularies: product categories, units and movement reasons

use serde::Serialize;

use crate::models::MovementType;

/// A stored value with its display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub value: &'static str,
    pub label: &'static str,
}

const fn entry(value: &'static str, label: &'static str) -> CatalogEntry {
    CatalogEntry { value, label }
}

pub const PRODUCT_CATEGORIES: &[CatalogEntry] = &[
    entry("bebidas-destiladas", "Bebidas Destiladas"),
    entry("bebidas-fermentadas", "Bebidas Fermentadas"),
    entry("vinhos", "Vinhos"),
    entry("refrigerantes", "Refrigerantes"),
    entry("sucos", "Sucos"),
    entry("agua", "Água"),
    entry("energeticos", "Energéticos"),
    entry("mixers", "Mixers e Tônicas"),
    entry("ingredientes", "Ingredientes"),
    entry("frutas", "Frutas"),
    entry("descartaveis", "Descartáveis"),
    entry("outros", "Outros"),
];

pub const PRODUCT_UNITS: &[CatalogEntry] = &[
    entry("un", "Unidade"),
    entry("garrafa", "Garrafa"),
    entry("lata", "Lata"),
    entry("litro", "Litro"),
    entry("ml", "Mililitro"),
    entry("kg", "Quilograma"),
    entry("g", "Grama"),
    entry("caixa", "Caixa"),
    entry("pacote", "Pacote"),
    entry("dose", "Dose"),
];

const ENTRY_REASONS: &[CatalogEntry] = &[
    entry("compra", "Compra"),
    entry("doacao", "Doação"),
    entry("transferencia", "Transferência"),
    entry("ajuste", "Ajuste de Inventário"),
];

const EXIT_REASONS: &[CatalogEntry] = &[
    entry("venda", "Venda"),
    entry("uso-interno", "Uso Interno"),
    entry("preparo-drink", "Preparo de Drink"),
    entry("transferencia", "Transferência"),
];

const LOSS_REASONS: &[CatalogEntry] = &[
    entry("vencimento", "Vencimento"),
    entry("quebra", "Quebra"),
    entry("roubo", "Roubo"),
    entry("desperdicio", "Desperdício"),
];

const ADJUSTMENT_REASONS: &[CatalogEntry] = &[
    entry("inventario", "Ajuste de Inventário"),
    entry("correcao", "Correção de Erro"),
];

/// Reason recorded by the stock count flow
pub const STOCK_COUNT_REASON: &str = "inventario";

pub fn movement_reasons(movement_type: MovementType) -> &'static [CatalogEntry] {
    match movement_type {
        MovementType::Entrada => ENTRY_REASONS,
        MovementType::Saida => EXIT_REASONS,
        MovementType::Perda => LOSS_REASONS,
        MovementType::Ajuste => ADJUSTMENT_REASONS,
    }
}

pub fn is_valid_reason(movement_type: MovementType, reason: &str) -> bool {
    movement_reasons(movement_type).iter().any(|r| r.value == reason)
}

pub fn is_valid_category(category: &str) -> bool {
    PRODUCT_CATEGORIES.iter().any(|c| c.value == category)
}

pub fn is_valid_unit(unit: &str) -> bool {
    PRODUCT_UNITS.iter().any(|u| u.value == unit)
}

/// Label for a stored value, falling back to the value itself
pub fn label_of(entries: &[CatalogEntry], value: &str) -> String {
    entries
        .iter()
        .find(|e| e.value == value)
        .map(|e| e.label.to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Reasons of one movement type, as exposed by the catalog endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ReasonGroup {
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub reasons: &'static [CatalogEntry],
}

/// Everything the product and movement forms need
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub categories: &'static [CatalogEntry],
    pub units: &'static [CatalogEntry],
    pub reasons: Vec<ReasonGroup>,
}

pub fn catalog() -> Catalog {
    Catalog {
        categories: PRODUCT_CATEGORIES,
        units: PRODUCT_UNITS,
        reasons: MovementType::ALL
            .iter()
            .map(|t| ReasonGroup {
                movement_type: *t,
                reasons: movement_reasons(*t),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_are_scoped_by_type() {
        assert!(is_valid_reason(MovementType::Perda, "quebra"));
        assert!(!is_valid_reason(MovementType::Saida, "quebra"));
        assert!(is_valid_reason(MovementType::Ajuste, STOCK_COUNT_REASON));
    }

    #[test]
    fn test_labels() {
        assert_eq!(label_of(PRODUCT_UNITS, "garrafa"), "Garrafa");
        assert_eq!(label_of(PRODUCT_UNITS, "barril"), "barril");
    }

    #[test]
    fn test_catalog_lists_every_type() {
        assert_eq!(catalog().reasons.len(), MovementType::ALL.len());
    }
}
