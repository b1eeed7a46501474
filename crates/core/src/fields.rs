// Declared field catalog.
//
// Whether a field is summed or averaged across a sector is declared here,
// per field, rather than guessed from its label.

use serde::Serialize;

use crate::columns::ColumnNames;

/// How a field combines across several records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Count-like: summed, reported as an integer.
    Sum,
    /// Percentage-like: averaged over numeric values, two decimals.
    Mean,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn sum(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FieldKind::Sum }
    }

    pub fn mean(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FieldKind::Mean }
    }
}

pub const RISK_CATEGORIES: [&str; 14] = [
    "Sustantivo",
    "Administrativo",
    "Financiero",
    "Presupuestal",
    "Servicios",
    "Seguridad",
    "Obra_Pública",
    "Recursos_Humanos",
    "Imagen",
    "TICs",
    "Salud",
    "Otro",
    "Corrupción",
    "Legal",
];

pub const QUADRANTS: [&str; 4] = ["I", "II", "III", "IV"];

pub const STRATEGIES: [&str; 5] = ["Evitar", "Reducir", "Asumir", "Transferir", "Compartir"];

pub const QUARTERS: [u8; 4] = [1, 2, 3, 4];

/// Per-quarter status counters carried by both plan tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarterStatus {
    NoProgress,
    InProcess,
    Concluded,
    Compliance,
}

impl QuarterStatus {
    pub const ALL: [QuarterStatus; 4] = [
        QuarterStatus::NoProgress,
        QuarterStatus::InProcess,
        QuarterStatus::Concluded,
        QuarterStatus::Compliance,
    ];

    /// Label suffix used by the workbook (`1Sin_Avances`, `4Cumplimiento`, ...).
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::NoProgress => "Sin_Avances",
            Self::InProcess => "En_Proceso",
            Self::Concluded => "Concluidas",
            Self::Compliance => "Cumplimiento",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoProgress => "No progress",
            Self::InProcess => "In process",
            Self::Concluded => "Concluded",
            Self::Compliance => "Compliance %",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Compliance => FieldKind::Mean,
            _ => FieldKind::Sum,
        }
    }
}

pub fn quarter_field(quarter: u8, status: QuarterStatus) -> String {
    format!("{quarter}{}", status.suffix())
}

fn quarterly_fields() -> impl Iterator<Item = FieldSpec> {
    QUARTERS.into_iter().flat_map(|q| {
        QuarterStatus::ALL.into_iter().map(move |s| FieldSpec {
            name: quarter_field(q, s),
            kind: s.kind(),
        })
    })
}

/// Fields aggregated from the risk/control-action plan.
pub fn plan_fields(columns: &ColumnNames) -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::sum(&columns.control_total),
        FieldSpec::sum(&columns.risk_total),
    ];
    fields.extend(RISK_CATEGORIES.iter().map(|c| FieldSpec::sum(*c)));
    fields.extend(QUADRANTS.iter().map(|c| FieldSpec::sum(*c)));
    fields.extend(STRATEGIES.iter().map(|c| FieldSpec::sum(*c)));
    fields.extend(quarterly_fields());
    fields
}

/// Fields aggregated from the internal-control-improvement plan.
pub fn improvement_plan_fields(columns: &ColumnNames) -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::sum(&columns.improvement_total),
        FieldSpec::sum(&columns.improvement_updated_total),
    ];
    fields.extend(quarterly_fields());
    fields
}

/// Progress percentages carried by both detail logs.
pub fn detail_progress_fields(columns: &ColumnNames) -> Vec<FieldSpec> {
    vec![
        FieldSpec::mean(&columns.entity_progress),
        FieldSpec::mean(&columns.oversight_progress),
    ]
}
