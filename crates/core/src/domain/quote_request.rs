use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeline {
    #[serde(rename = "asap")]
    Asap,
    #[serde(rename = "1-2weeks")]
    OneToTwoWeeks,
    #[serde(rename = "3-4weeks")]
    ThreeToFourWeeks,
    #[serde(rename = "1-2months")]
    OneToTwoMonths,
    #[serde(rename = "3+months")]
    ThreePlusMonths,
    #[serde(rename = "flexible")]
    Flexible,
}

impl Timeline {
    pub const ALL: [Timeline; 6] = [
        Timeline::Asap,
        Timeline::OneToTwoWeeks,
        Timeline::ThreeToFourWeeks,
        Timeline::OneToTwoMonths,
        Timeline::ThreePlusMonths,
        Timeline::Flexible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asap => "asap",
            Self::OneToTwoWeeks => "1-2weeks",
            Self::ThreeToFourWeeks => "3-4weeks",
            Self::OneToTwoMonths => "1-2months",
            Self::ThreePlusMonths => "3+months",
            Self::Flexible => "flexible",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Asap => "ASAP (Rush order)",
            Self::OneToTwoWeeks => "1-2 weeks",
            Self::ThreeToFourWeeks => "3-4 weeks",
            Self::OneToTwoMonths => "1-2 months",
            Self::ThreePlusMonths => "3+ months",
            Self::Flexible => "Flexible timing",
        }
    }
}

impl FromStr for Timeline {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|timeline| timeline.as_str() == value.trim()).ok_or_else(|| {
            DomainError::InvalidChoice { field: "timeline".to_string(), value: value.to_string() }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetRange {
    #[serde(rename = "under-5k")]
    Under5k,
    #[serde(rename = "5k-25k")]
    From5kTo25k,
    #[serde(rename = "25k-100k")]
    From25kTo100k,
    #[serde(rename = "100k-500k")]
    From100kTo500k,
    #[serde(rename = "over-500k")]
    Over500k,
    #[serde(rename = "discuss")]
    Discuss,
}

impl BudgetRange {
    pub const ALL: [BudgetRange; 6] = [
        BudgetRange::Under5k,
        BudgetRange::From5kTo25k,
        BudgetRange::From25kTo100k,
        BudgetRange::From100kTo500k,
        BudgetRange::Over500k,
        BudgetRange::Discuss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under5k => "under-5k",
            Self::From5kTo25k => "5k-25k",
            Self::From25kTo100k => "25k-100k",
            Self::From100kTo500k => "100k-500k",
            Self::Over500k => "over-500k",
            Self::Discuss => "discuss",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Under5k => "Under $5,000",
            Self::From5kTo25k => "$5,000 - $25,000",
            Self::From25kTo100k => "$25,000 - $100,000",
            Self::From100kTo500k => "$100,000 - $500,000",
            Self::Over500k => "Over $500,000",
            Self::Discuss => "Prefer to discuss",
        }
    }
}

impl FromStr for BudgetRange {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|budget| budget.as_str() == value.trim()).ok_or_else(|| {
            DomainError::InvalidChoice { field: "budget".to_string(), value: value.to_string() }
        })
    }
}

/// Quality standards a requester can ask for. Declaration order is the
/// display order, so `BTreeSet<Certification>` iterates in catalog order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Certification {
    #[serde(rename = "ISO 9001:2015")]
    Iso9001,
    #[serde(rename = "AS9100D")]
    As9100d,
    #[serde(rename = "IATF 16949")]
    Iatf16949,
    #[serde(rename = "ISO 14001")]
    Iso14001,
    #[serde(rename = "NADCAP")]
    Nadcap,
    #[serde(rename = "First Article Inspection (FAI)")]
    FirstArticleInspection,
    #[serde(rename = "Material Certifications")]
    MaterialCertifications,
    #[serde(rename = "Dimensional Reports")]
    DimensionalReports,
}

impl Certification {
    pub const CATALOG: [Certification; 8] = [
        Certification::Iso9001,
        Certification::As9100d,
        Certification::Iatf16949,
        Certification::Iso14001,
        Certification::Nadcap,
        Certification::FirstArticleInspection,
        Certification::MaterialCertifications,
        Certification::DimensionalReports,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Iso9001 => "ISO 9001:2015",
            Self::As9100d => "AS9100D",
            Self::Iatf16949 => "IATF 16949",
            Self::Iso14001 => "ISO 14001",
            Self::Nadcap => "NADCAP",
            Self::FirstArticleInspection => "First Article Inspection (FAI)",
            Self::MaterialCertifications => "Material Certifications",
            Self::DimensionalReports => "Dimensional Reports",
        }
    }
}

impl FromStr for Certification {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::CATALOG
            .into_iter()
            .find(|certification| certification.name() == value.trim())
            .ok_or_else(|| DomainError::UnknownCertification(value.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_ref: String,
    pub quantity: String,
    pub specifications: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineItemField {
    ProductRef,
    Quantity,
    Specifications,
}

impl FromStr for LineItemField {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "productRef" | "productId" => Ok(Self::ProductRef),
            "quantity" => Ok(Self::Quantity),
            "specifications" => Ok(Self::Specifications),
            other => Err(DomainError::UnknownField(other.to_string())),
        }
    }
}

/// Scalar fields of the draft addressable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    CustomerName,
    Company,
    Email,
    Phone,
    ProjectName,
    Timeline,
    Budget,
    Requirements,
    DeliveryAddress,
    SpecialInstructions,
}

impl DraftField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerName => "customerName",
            Self::Company => "company",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::ProjectName => "projectName",
            Self::Timeline => "timeline",
            Self::Budget => "budget",
            Self::Requirements => "requirements",
            Self::DeliveryAddress => "deliveryAddress",
            Self::SpecialInstructions => "specialInstructions",
        }
    }
}

impl FromStr for DraftField {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "customerName" => Ok(Self::CustomerName),
            "company" => Ok(Self::Company),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "projectName" => Ok(Self::ProjectName),
            "timeline" => Ok(Self::Timeline),
            "budget" => Ok(Self::Budget),
            "requirements" => Ok(Self::Requirements),
            "deliveryAddress" => Ok(Self::DeliveryAddress),
            "specialInstructions" => Ok(Self::SpecialInstructions),
            other => Err(DomainError::UnknownField(other.to_string())),
        }
    }
}

/// In-progress quote request. Always holds at least one line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDraft {
    pub customer_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub project_name: String,
    pub timeline: Option<Timeline>,
    pub budget: Option<BudgetRange>,
    pub line_items: Vec<LineItem>,
    pub requirements: String,
    pub certifications: BTreeSet<Certification>,
    pub delivery_address: String,
    pub special_instructions: String,
}

impl Default for QuoteDraft {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            company: String::new(),
            email: String::new(),
            phone: String::new(),
            project_name: String::new(),
            timeline: None,
            budget: None,
            line_items: vec![LineItem::default()],
            requirements: String::new(),
            certifications: BTreeSet::new(),
            delivery_address: String::new(),
            special_instructions: String::new(),
        }
    }
}

impl QuoteDraft {
    /// Returns a copy with `field` replaced. Empty choice values clear the selection.
    pub fn with_field(&self, field: DraftField, value: &str) -> Result<Self, DomainError> {
        let mut next = self.clone();
        match field {
            DraftField::CustomerName => next.customer_name = value.to_string(),
            DraftField::Company => next.company = value.to_string(),
            DraftField::Email => next.email = value.to_string(),
            DraftField::Phone => next.phone = value.to_string(),
            DraftField::ProjectName => next.project_name = value.to_string(),
            DraftField::Timeline => {
                next.timeline = if value.trim().is_empty() { None } else { Some(value.parse()?) };
            }
            DraftField::Budget => {
                next.budget = if value.trim().is_empty() { None } else { Some(value.parse()?) };
            }
            DraftField::Requirements => next.requirements = value.to_string(),
            DraftField::DeliveryAddress => next.delivery_address = value.to_string(),
            DraftField::SpecialInstructions => next.special_instructions = value.to_string(),
        }
        Ok(next)
    }

    pub fn with_line_item_added(&self) -> Self {
        let mut next = self.clone();
        next.line_items.push(LineItem::default());
        next
    }

    /// Removing the last remaining item, or an index past the end, is a no-op.
    pub fn with_line_item_removed(&self, index: usize) -> Self {
        if self.line_items.len() <= 1 || index >= self.line_items.len() {
            return self.clone();
        }

        let mut next = self.clone();
        next.line_items = self
            .line_items
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, item)| item.clone())
            .collect();
        next
    }

    pub fn with_line_item_updated(
        &self,
        index: usize,
        field: LineItemField,
        value: &str,
    ) -> Result<Self, DomainError> {
        if index >= self.line_items.len() {
            return Err(DomainError::LineItemOutOfRange { index, len: self.line_items.len() });
        }

        let mut line_items = self.line_items.clone();
        let item = &mut line_items[index];
        match field {
            LineItemField::ProductRef => item.product_ref = value.to_string(),
            LineItemField::Quantity => item.quantity = value.to_string(),
            LineItemField::Specifications => item.specifications = value.to_string(),
        }

        Ok(Self { line_items, ..self.clone() })
    }

    pub fn with_certification_toggled(&self, certification: Certification) -> Self {
        let mut next = self.clone();
        if !next.certifications.remove(&certification) {
            next.certifications.insert(certification);
        }
        next
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteRequestId(pub String);

impl QuoteRequestId {
    pub fn generate() -> Self {
        Self(format!("QR-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteRequestStatus {
    Pending,
}

impl QuoteRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
        }
    }
}

/// A quote request as persisted by a submission sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedQuoteRequest {
    pub id: QuoteRequestId,
    pub status: QuoteRequestStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub draft: QuoteDraft,
}

impl SubmittedQuoteRequest {
    pub fn pending(draft: QuoteDraft) -> Self {
        Self {
            id: QuoteRequestId::generate(),
            status: QuoteRequestStatus::Pending,
            submitted_at: Utc::now(),
            draft,
        }
    }
}
