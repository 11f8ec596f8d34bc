use serde::Serialize;

use crate::domain::product::{product_label, CatalogEntry};
use crate::domain::quote_request::QuoteDraft;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewLine {
    pub position: usize,
    pub product: String,
    pub quantity: String,
    pub specifications: String,
}

impl ReviewLine {
    pub fn summary(&self) -> String {
        format!(
            "Product {}: {} - Qty: {} - {}",
            self.position, self.product, self.quantity, self.specifications
        )
    }
}

/// Read-only rendering of the draft for the final step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub customer_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub project_name: String,
    pub timeline: String,
    pub budget: String,
    pub lines: Vec<ReviewLine>,
    pub requirements: String,
    pub certifications: Vec<String>,
    pub delivery_address: String,
    pub special_instructions: String,
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

impl ReviewSummary {
    pub fn from_draft(draft: &QuoteDraft, catalog: &[CatalogEntry]) -> Self {
        Self {
            customer_name: draft.customer_name.clone(),
            company: draft.company.clone(),
            email: draft.email.clone(),
            phone: or_placeholder(&draft.phone, "Not provided"),
            project_name: draft.project_name.clone(),
            timeline: draft
                .timeline
                .map(|timeline| timeline.label().to_string())
                .unwrap_or_else(|| "Not selected".to_string()),
            budget: draft
                .budget
                .map(|budget| budget.label().to_string())
                .unwrap_or_else(|| "Not specified".to_string()),
            lines: draft
                .line_items
                .iter()
                .enumerate()
                .map(|(index, item)| ReviewLine {
                    position: index + 1,
                    product: product_label(&item.product_ref, catalog),
                    quantity: item.quantity.clone(),
                    specifications: item.specifications.clone(),
                })
                .collect(),
            requirements: draft.requirements.clone(),
            certifications: draft
                .certifications
                .iter()
                .map(|certification| certification.name().to_string())
                .collect(),
            delivery_address: or_placeholder(&draft.delivery_address, "Not provided"),
            special_instructions: or_placeholder(&draft.special_instructions, "None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReviewSummary;
    use crate::domain::product::CatalogEntry;
    use crate::domain::quote_request::{
        BudgetRange, Certification, LineItem, QuoteDraft, Timeline,
    };

    #[test]
    fn review_uses_labels_and_placeholders() {
        let catalog = vec![CatalogEntry {
            id: "prod-cnc".to_string(),
            display_name: "CNC Machining".to_string(),
        }];
        let draft = QuoteDraft {
            customer_name: "Ana Ortiz".to_string(),
            timeline: Some(Timeline::Asap),
            budget: None,
            line_items: vec![
                LineItem {
                    product_ref: "prod-cnc".to_string(),
                    quantity: "40".to_string(),
                    specifications: "Ti-6Al-4V".to_string(),
                },
                LineItem {
                    product_ref: "custom".to_string(),
                    quantity: "2 prototypes".to_string(),
                    specifications: String::new(),
                },
            ],
            ..QuoteDraft::default()
        }
        .with_certification_toggled(Certification::Iso14001)
        .with_certification_toggled(Certification::As9100d);

        let review = ReviewSummary::from_draft(&draft, &catalog);
        assert_eq!(review.phone, "Not provided");
        assert_eq!(review.timeline, "ASAP (Rush order)");
        assert_eq!(review.budget, "Not specified");
        assert_eq!(review.lines[0].summary(), "Product 1: CNC Machining - Qty: 40 - Ti-6Al-4V");
        assert_eq!(review.lines[1].product, "Custom/Other");
        assert_eq!(review.certifications, vec!["AS9100D", "ISO 14001"]);

        let with_budget = QuoteDraft { budget: Some(BudgetRange::Discuss), ..draft };
        assert_eq!(ReviewSummary::from_draft(&with_budget, &catalog).budget, "Prefer to discuss");
    }
}
