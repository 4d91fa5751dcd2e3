//! Ready-made schemas for the three manageable entity types:
//! institutions, psychologists, and patients.
//!
//! These are the configurations the admin screens mount one of per page.
//! Choice options that depend on live data (which institution a patient
//! belongs to, which psychologist they are assigned to) are passed in by
//! the caller, typically from a cached list fetch.

use std::sync::Arc;

use serde_json::Value;

use crate::config::{
    ChoiceOption, ColumnSpec, EntityConfig, EntitySchema, FieldSpec, FieldType, FilterSpec,
    FilterType, ValidationRules,
};
use crate::gateway::{collections, RemoteDataGateway};
use crate::record::Record;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const PHONE_PATTERN: &str = r"^\+?[\d\s-]{8,15}$";

/// Display value for a joined relation: `row.<relation>.nombre`.
fn related_name(row: &Record, relation: &str) -> String {
    row.get(relation)
        .and_then(Value::as_object)
        .and_then(|o| o.get("nombre"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn institution_schema() -> EntitySchema {
    EntitySchema {
        name: "Institución".to_string(),
        plural: "Instituciones".to_string(),
        collection: collections::INSTITUTIONS.to_string(),
        columns: vec![
            ColumnSpec::new("nombre", "Nombre"),
            ColumnSpec::new("tipo", "Tipo"),
            ColumnSpec::new("email", "Email").with_empty_value("—"),
            ColumnSpec::new("telefono", "Teléfono").not_sortable().with_empty_value("—"),
        ],
        fields: vec![
            FieldSpec::section("Datos generales"),
            FieldSpec::new("nombre", FieldType::Text, "Nombre")
                .with_width("full")
                .with_validation(ValidationRules::required().with_length(Some(3), Some(120))),
            FieldSpec::new("tipo", FieldType::Select, "Tipo")
                .with_options(vec![
                    ChoiceOption::new("universidad", "Universidad"),
                    ChoiceOption::new("colegio", "Colegio"),
                    ChoiceOption::new("clinica", "Clínica"),
                    ChoiceOption::new("empresa", "Empresa"),
                ])
                .with_validation(ValidationRules::required()),
            FieldSpec::section("Contacto"),
            FieldSpec::new("email", FieldType::Email, "Email")
                .with_validation(ValidationRules::default().with_pattern(EMAIL_PATTERN)),
            FieldSpec::new("telefono", FieldType::Tel, "Teléfono")
                .with_validation(ValidationRules::default().with_pattern(PHONE_PATTERN)),
            FieldSpec::new("direccion", FieldType::Textarea, "Dirección").with_width("full"),
        ],
        filters: vec![FilterSpec::new("tipo", FilterType::Select).with_options(vec![
            ChoiceOption::new("Universidad", "Universidad"),
            ChoiceOption::new("Colegio", "Colegio"),
            ChoiceOption::new("Clínica", "Clínica"),
            ChoiceOption::new("Empresa", "Empresa"),
        ])],
    }
}

pub fn psychologist_schema(institutions: Vec<ChoiceOption>) -> EntitySchema {
    EntitySchema {
        name: "Psicólogo".to_string(),
        plural: "Psicólogos".to_string(),
        collection: collections::PSYCHOLOGISTS.to_string(),
        columns: vec![
            ColumnSpec::new("nombre", "Nombre"),
            ColumnSpec::new("email", "Email"),
            ColumnSpec::new("institution", "Institución")
                .with_render(|row| related_name(row, "institution"))
                .with_empty_value("Sin asignar")
                .not_sortable(),
            ColumnSpec::new("registro", "N° Registro").with_empty_value("—"),
        ],
        fields: vec![
            FieldSpec::new("nombre", FieldType::Text, "Nombre completo")
                .with_width("full")
                .with_validation(ValidationRules::required().with_length(Some(3), Some(120))),
            FieldSpec::new("email", FieldType::Email, "Email").with_validation(
                ValidationRules::required().with_pattern(EMAIL_PATTERN),
            ),
            FieldSpec::new("telefono", FieldType::Tel, "Teléfono")
                .with_validation(ValidationRules::default().with_pattern(PHONE_PATTERN)),
            FieldSpec::new("registro", FieldType::Text, "N° de registro profesional")
                .with_info("Registro en la superintendencia de salud"),
            FieldSpec::new("institution_id", FieldType::Select, "Institución")
                .with_options(institutions),
        ],
        filters: vec![FilterSpec::new("institution_id", FilterType::Select)],
    }
}

pub fn patient_schema(
    institutions: Vec<ChoiceOption>,
    psychologists: Vec<ChoiceOption>,
) -> EntitySchema {
    EntitySchema {
        name: "Paciente".to_string(),
        plural: "Pacientes".to_string(),
        collection: collections::PATIENTS.to_string(),
        columns: vec![
            ColumnSpec::new("nombre", "Nombre"),
            ColumnSpec::new("edad", "Edad"),
            ColumnSpec::new("institution", "Institución")
                .with_render(|row| related_name(row, "institution"))
                .with_empty_value("Sin asignar")
                .not_sortable(),
            ColumnSpec::new("psychologist", "Psicólogo asignado")
                .with_render(|row| related_name(row, "psychologist"))
                .with_empty_value("Sin asignar")
                .not_sortable(),
        ],
        fields: vec![
            FieldSpec::section("Datos del paciente"),
            FieldSpec::new("nombre", FieldType::Text, "Nombre completo")
                .with_width("full")
                .with_validation(ValidationRules::required().with_length(Some(3), Some(120))),
            FieldSpec::new("fecha_nacimiento", FieldType::Date, "Fecha de nacimiento")
                .with_validation(ValidationRules::required()),
            FieldSpec::new("edad", FieldType::Number, "Edad")
                .with_validation(ValidationRules::default().with_range(Some(3.0), Some(110.0))),
            FieldSpec::new("email", FieldType::Email, "Email")
                .with_validation(ValidationRules::default().with_pattern(EMAIL_PATTERN)),
            FieldSpec::divider(),
            FieldSpec::section("Asignación"),
            FieldSpec::new("institution_id", FieldType::Select, "Institución")
                .with_options(institutions)
                .with_validation(ValidationRules::required()),
            FieldSpec::new("psychologist_id", FieldType::Select, "Psicólogo")
                .with_options(psychologists),
            FieldSpec::new("consentimiento", FieldType::Checkbox, "Consentimiento informado")
                .with_validation(ValidationRules::required()),
        ],
        filters: vec![
            FilterSpec::new("institution_id", FilterType::Select),
            FilterSpec::new("psychologist_id", FilterType::Select),
            FilterSpec::new("edad", FilterType::Range),
        ],
    }
}

pub fn institution_config(gateway: Arc<dyn RemoteDataGateway>) -> EntityConfig {
    EntityConfig::new(institution_schema(), gateway)
}

pub fn psychologist_config(
    gateway: Arc<dyn RemoteDataGateway>,
    institutions: Vec<ChoiceOption>,
) -> EntityConfig {
    EntityConfig::new(psychologist_schema(institutions), gateway)
}

pub fn patient_config(
    gateway: Arc<dyn RemoteDataGateway>,
    institutions: Vec<ChoiceOption>,
    psychologists: Vec<ChoiceOption>,
) -> EntityConfig {
    EntityConfig::new(patient_schema(institutions, psychologists), gateway)
}
