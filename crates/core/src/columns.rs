use serde::{Deserialize, Serialize};

/// Column labels as they appear in the upstream workbook.
///
/// Defaults match the published sheets; configuration can override any of
/// them individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    // Identity (every table)
    pub organization: String,
    pub sector: String,
    pub year: String,
    pub acronym: String,

    // Plan
    pub control_total: String,
    pub risk_total: String,

    // Control-action detail
    pub control_key: String,
    pub risk_id: String,
    pub risk_description: String,
    pub description: String,
    pub entity_progress: String,
    pub oversight_progress: String,

    // Improvement plan
    pub improvement_total: String,
    pub improvement_updated_total: String,

    // Improvement-action detail
    pub improvement_key: String,
    pub quarter: String,
    pub located: String,
    pub sufficiency: String,

    // Name crosswalk
    pub reference_name: String,
    pub reference_sector: String,
    pub name_matches: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            organization: "Institución".into(),
            sector: "Sector".into(),
            year: "Año".into(),
            acronym: "Siglas".into(),
            control_total: "AC_Total".into(),
            risk_total: "Riesgos_Totales".into(),
            control_key: "AC".into(),
            risk_id: "Riesgo".into(),
            risk_description: "Descripción_del_Riesgo".into(),
            description: "Descripcion".into(),
            entity_progress: "Avance_Institución".into(),
            oversight_progress: "Avance_OIC".into(),
            improvement_total: "AM_Total".into(),
            improvement_updated_total: "AM_Total_Actualizado".into(),
            improvement_key: "AM".into(),
            quarter: "Trimestre".into(),
            located: "Localizada".into(),
            sufficiency: "Suficiencia".into(),
            reference_name: "Nombre_Referencia".into(),
            reference_sector: "Sector_Referencia".into(),
            name_matches: "Coincide".into(),
        }
    }
}
