use serde::{Deserialize, Serialize};

use crate::map::Coordinate;

/// Category of utility fault being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultType {
    #[serde(rename = "Meter Problem")]
    MeterProblem,
    #[serde(rename = "Transformer Fault")]
    TransformerFault,
    #[serde(rename = "Pipeline Fault")]
    PipelineFault,
    #[serde(rename = "Power Outage")]
    PowerOutage,
    Other,
}

impl FaultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultType::MeterProblem => "Meter Problem",
            FaultType::TransformerFault => "Transformer Fault",
            FaultType::PipelineFault => "Pipeline Fault",
            FaultType::PowerOutage => "Power Outage",
            FaultType::Other => "Other",
        }
    }

    /// Exact match on the display name; anything else is rejected.
    pub fn from_str(s: &str) -> Option<Self> {
        FaultType::all().iter().copied().find(|t| t.as_str() == s)
    }

    /// All fault types in display order.
    pub fn all() -> &'static [FaultType] {
        &[
            FaultType::MeterProblem,
            FaultType::TransformerFault,
            FaultType::PipelineFault,
            FaultType::PowerOutage,
            FaultType::Other,
        ]
    }
}

/// The fields of the report form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Description,
    FaultType,
    Region,
    Ward,
    Location,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Description => "Description",
            Field::FaultType => "Fault type",
            Field::Region => "Region",
            Field::Ward => "Ward",
            Field::Location => "Location",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    fn required(field: Field) -> Self {
        Self {
            field,
            message: format!("{} is required", field.label()),
        }
    }
}

/// Mutable state of one report being composed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub description: String,
    pub fault_type: Option<FaultType>,
    pub region: String,
    pub ward: String,
    /// Set from a single map click, so latitude and longitude travel together.
    pub location: Option<Coordinate>,
}

impl FormState {
    pub fn is_empty(&self) -> bool {
        *self == FormState::default()
    }

    /// Required-field check. `require_location` additionally demands a map click.
    pub fn validate(&self, require_location: bool) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.description.trim().is_empty() {
            errors.push(FieldError::required(Field::Description));
        }
        if self.fault_type.is_none() {
            errors.push(FieldError::required(Field::FaultType));
        }
        if self.region.is_empty() {
            errors.push(FieldError::required(Field::Region));
        }
        if self.ward.is_empty() {
            errors.push(FieldError::required(Field::Ward));
        }
        if require_location && self.location.is_none() {
            errors.push(FieldError {
                field: Field::Location,
                message: "Click the map to mark the fault location".to_string(),
            });
        }
        errors
    }

    /// Build the request body. Callers validate first; a missing fault type
    /// only happens for unvalidated state and falls back to `Other`.
    pub fn to_report(&self) -> FaultReport {
        FaultReport {
            description: self.description.clone(),
            region: self.region.clone(),
            ward: self.ward.clone(),
            fault_type: self.fault_type.unwrap_or(FaultType::Other),
            location: ReportLocation {
                lng: self.location.map(|c| c.lng),
                lat: self.location.map(|c| c.lat),
            },
        }
    }
}

/// JSON body of `POST /api/fault-reports/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultReport {
    pub description: String,
    pub region: String,
    pub ward: String,
    #[serde(rename = "faultType")]
    pub fault_type: FaultType,
    pub location: ReportLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportLocation {
    pub lng: Option<f64>,
    pub lat: Option<f64>,
}
