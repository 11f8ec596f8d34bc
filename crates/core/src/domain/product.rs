use serde::{Deserialize, Serialize};

/// Product reference used by a line item that does not map to a catalog entry.
pub const CUSTOM_PRODUCT_REF: &str = "custom";
pub const CUSTOM_PRODUCT_LABEL: &str = "Custom/Other";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub active: bool,
}

impl Product {
    pub fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry { id: self.id.0.clone(), display_name: self.name.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: String,
}

/// One option of the line-item product selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub value: String,
    pub label: String,
}

/// Selector options: catalog entries in the order given, then the custom sentinel.
pub fn product_options(entries: &[CatalogEntry]) -> Vec<ProductOption> {
    entries
        .iter()
        .filter(|entry| entry.id != CUSTOM_PRODUCT_REF)
        .map(|entry| ProductOption { value: entry.id.clone(), label: entry.display_name.clone() })
        .chain(std::iter::once(ProductOption {
            value: CUSTOM_PRODUCT_REF.to_string(),
            label: CUSTOM_PRODUCT_LABEL.to_string(),
        }))
        .collect()
}

/// Label shown for a line item's product reference on the review step.
pub fn product_label(product_ref: &str, entries: &[CatalogEntry]) -> String {
    if product_ref == CUSTOM_PRODUCT_REF {
        return CUSTOM_PRODUCT_LABEL.to_string();
    }

    entries
        .iter()
        .find(|entry| entry.id == product_ref)
        .map(|entry| entry.display_name.clone())
        .unwrap_or_else(|| "Not selected".to_string())
}

#[cfg(test)]
mod tests {
    use super::{product_label, product_options, CatalogEntry, CUSTOM_PRODUCT_REF};

    fn entries() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry { id: "prod-cnc".to_string(), display_name: "CNC Machining".to_string() },
            CatalogEntry {
                id: "prod-sheet".to_string(),
                display_name: "Sheet Metal Fabrication".to_string(),
            },
        ]
    }

    #[test]
    fn options_always_end_with_custom_sentinel() {
        let options = product_options(&entries());
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].value, "prod-cnc");
        assert_eq!(options[2].value, CUSTOM_PRODUCT_REF);
        assert_eq!(options[2].label, "Custom/Other");
    }

    #[test]
    fn empty_catalog_offers_only_custom() {
        let options = product_options(&[]);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, CUSTOM_PRODUCT_REF);
    }

    #[test]
    fn labels_resolve_catalog_custom_and_unknown_refs() {
        let entries = entries();
        assert_eq!(product_label("prod-sheet", &entries), "Sheet Metal Fabrication");
        assert_eq!(product_label(CUSTOM_PRODUCT_REF, &entries), "Custom/Other");
        assert_eq!(product_label("", &entries), "Not selected");
        assert_eq!(product_label("prod-retired", &entries), "Not selected");
    }
}
