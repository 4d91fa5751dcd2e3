//! Declarative per-entity configuration.
//!
//! One [`EntityConfig`] per manageable entity type drives the whole
//! scaffold: which columns the table shows, which fields the editor
//! renders, which filters apply, and which gateway collection the CRUD
//! operations hit. The serde-visible part ([`EntitySchema`]) can be loaded
//! from YAML; closures (cell renderers, custom validation, custom search
//! predicates) are attached programmatically.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filters::FilterValue;
use crate::gateway::RemoteDataGateway;
use crate::record::Record;

/// Input kinds the form engine understands.
///
/// `Section` and `Divider` are layout-only pseudo-fields: they are skipped
/// by validation and excluded from submitted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Email,
    Tel,
    Number,
    Date,
    Textarea,
    Select,
    Radio,
    Checkbox,
    CheckboxGroup,
    Section,
    Divider,
}

impl FieldType {
    /// Layout-only pseudo-fields carry no value.
    pub fn is_layout(self) -> bool {
        matches!(self, Self::Section | Self::Divider)
    }

    pub fn is_choice(self) -> bool {
        matches!(self, Self::Select | Self::Radio | Self::CheckboxGroup)
    }
}

/// One selectable option for choice-type fields and select filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Custom validation hook: returns an error message on failure.
pub type CustomRule = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Validation rule set for one field.
///
/// Rules evaluate in declaration order (required, pattern, min_length,
/// max_length, min, max, custom); the form engine stops at the first
/// failure per field.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default)]
    pub required: bool,
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(skip)]
    pub custom: Option<CustomRule>,
}

impl ValidationRules {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_custom(
        mut self,
        rule: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.custom = Some(Arc::new(rule));
        self
    }
}

impl std::fmt::Debug for ValidationRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRules")
            .field("required", &self.required)
            .field("pattern", &self.pattern)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Cell renderer: row in, display string out.
pub type RenderFn = Arc<dyn Fn(&Record) -> String + Send + Sync>;

fn default_true() -> bool {
    true
}

/// One table column.
#[derive(Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field: String,
    pub header: String,
    #[serde(default = "default_true")]
    pub sortable: bool,
    pub empty_value: Option<String>,
    #[serde(skip)]
    pub render: Option<RenderFn>,
}

impl ColumnSpec {
    pub fn new(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header: header.into(),
            sortable: true,
            empty_value: None,
            render: None,
        }
    }

    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn with_empty_value(mut self, value: impl Into<String>) -> Self {
        self.empty_value = Some(value.into());
        self
    }

    pub fn with_render(mut self, render: impl Fn(&Record) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Display value of this column for one row.
    pub fn display(&self, row: &Record) -> String {
        let rendered = match &self.render {
            Some(render) => render(row),
            None => row.display_value(&self.field),
        };
        if rendered.is_empty() {
            self.empty_value.clone().unwrap_or_default()
        } else {
            rendered
        }
    }
}

impl std::fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("field", &self.field)
            .field("header", &self.header)
            .field("sortable", &self.sortable)
            .field("empty_value", &self.empty_value)
            .field("render", &self.render.is_some())
            .finish()
    }
}

/// One editor field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    /// Layout hint for the host UI (e.g. "half", "full").
    pub width: Option<String>,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    pub validation: Option<ValidationRules>,
    #[serde(default)]
    pub disabled: bool,
    pub info: Option<String>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            width: None,
            options: Vec::new(),
            validation: None,
            disabled: false,
            info: None,
        }
    }

    pub fn section(label: impl Into<String>) -> Self {
        Self::new(format!("section_{}", uuid::Uuid::new_v4()), FieldType::Section, label)
    }

    pub fn divider() -> Self {
        Self::new(format!("divider_{}", uuid::Uuid::new_v4()), FieldType::Divider, "")
    }

    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn with_options(mut self, options: Vec<ChoiceOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_validation(mut self, validation: ValidationRules) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Select,
    Text,
    Range,
    Date,
}

/// One list filter control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

impl FilterSpec {
    pub fn new(id: impl Into<String>, filter_type: FilterType) -> Self {
        Self {
            id: id.into(),
            filter_type,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<ChoiceOption>) -> Self {
        self.options = options;
        self
    }
}

/// The serde-visible, declarative part of an entity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Singular display label ("Institución").
    pub name: String,
    /// Plural display label ("Instituciones").
    pub plural: String,
    /// Gateway collection this entity lives in.
    pub collection: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

impl EntitySchema {
    /// Load a schema from a YAML file.
    ///
    /// # Errors
    /// Returns a message if the file is unreadable, the YAML is invalid, or
    /// the schema declares no columns.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read schema file {}: {}", path.display(), e))?;
        Self::from_yaml(&contents)
    }

    /// Parse a schema from a YAML string.
    pub fn from_yaml(contents: &str) -> Result<Self, String> {
        let schema: Self = serde_yaml::from_str(contents)
            .map_err(|e| format!("Failed to parse schema YAML: {}", e))?;
        if schema.collection.is_empty() {
            return Err("Schema missing 'collection'".to_string());
        }
        if schema.columns.is_empty() {
            return Err(format!("Schema '{}' declares no columns", schema.name));
        }
        Ok(schema)
    }

    pub fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }
}

/// Extractor turning a row into editor values for edit mode.
pub type FormValuesFn = Arc<dyn Fn(&Record) -> HashMap<String, Value> + Send + Sync>;

/// Predicate replacing the default search/filter behavior entirely.
pub type SearchPredicate =
    Arc<dyn Fn(&Record, &str, &HashMap<String, FilterValue>) -> bool + Send + Sync>;

/// Complete configuration for one entity type: declarative schema plus the
/// gateway the CRUD operations route through.
///
/// Immutable after construction; build one per entity type at page mount.
#[derive(Clone)]
pub struct EntityConfig {
    pub schema: EntitySchema,
    gateway: Arc<dyn RemoteDataGateway>,
    initial_values: HashMap<String, Value>,
    form_values: Option<FormValuesFn>,
    search_predicate: Option<SearchPredicate>,
}

impl EntityConfig {
    pub fn new(schema: EntitySchema, gateway: Arc<dyn RemoteDataGateway>) -> Self {
        Self {
            schema,
            gateway,
            initial_values: HashMap::new(),
            form_values: None,
            search_predicate: None,
        }
    }

    /// Defaults for creation mode.
    pub fn with_initial_values(mut self, values: HashMap<String, Value>) -> Self {
        self.initial_values = values;
        self
    }

    /// Custom row-to-editor-values extractor for edit mode.
    pub fn with_form_values(
        mut self,
        extract: impl Fn(&Record) -> HashMap<String, Value> + Send + Sync + 'static,
    ) -> Self {
        self.form_values = Some(Arc::new(extract));
        self
    }

    /// Replace the default search/filter predicate.
    pub fn with_search_predicate(
        mut self,
        predicate: impl Fn(&Record, &str, &HashMap<String, FilterValue>) -> bool
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.search_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn gateway(&self) -> &Arc<dyn RemoteDataGateway> {
        &self.gateway
    }

    pub fn collection(&self) -> &str {
        &self.schema.collection
    }

    pub fn search_predicate(&self) -> Option<&SearchPredicate> {
        self.search_predicate.as_ref()
    }

    /// Editor defaults for creation mode.
    pub fn initial_form_values(&self) -> HashMap<String, Value> {
        self.initial_values.clone()
    }

    /// Editor values for edit mode.
    ///
    /// Default behavior copies each declared (non-layout) field from the
    /// row by id; a custom extractor overrides this entirely.
    pub fn form_values(&self, row: &Record) -> HashMap<String, Value> {
        if let Some(extract) = &self.form_values {
            return extract(row);
        }
        self.schema
            .fields
            .iter()
            .filter(|f| !f.field_type.is_layout())
            .filter_map(|f| row.get(&f.id).map(|v| (f.id.clone(), v.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use serde_json::json;

    const SCHEMA_YAML: &str = r#"
name: Institución
plural: Instituciones
collection: institutions
columns:
  - field: nombre
    header: Nombre
  - field: tipo
    header: Tipo
    sortable: false
    empty_value: "—"
fields:
  - id: nombre
    type: text
    label: Nombre
    validation:
      required: true
      max_length: 120
  - id: tipo
    type: select
    label: Tipo
    options:
      - value: universidad
        label: Universidad
      - value: clinica
        label: Clínica
filters:
  - id: tipo
    type: select
    options:
      - value: universidad
        label: Universidad
"#;

    #[test]
    fn test_schema_from_yaml() {
        let schema = EntitySchema::from_yaml(SCHEMA_YAML).unwrap();
        assert_eq!(schema.collection, "institutions");
        assert_eq!(schema.columns.len(), 2);
        assert!(schema.columns[0].sortable);
        assert!(!schema.columns[1].sortable);
        assert_eq!(schema.columns[1].empty_value.as_deref(), Some("—"));
        assert_eq!(schema.fields[0].validation.as_ref().unwrap().max_length, Some(120));
        assert_eq!(schema.fields[1].options.len(), 2);
        assert_eq!(schema.filters[0].filter_type, FilterType::Select);
    }

    #[test]
    fn test_schema_rejects_missing_columns() {
        let err = EntitySchema::from_yaml("name: X\nplural: Xs\ncollection: xs\n").unwrap_err();
        assert!(err.contains("no columns"));
    }

    #[test]
    fn test_column_display_with_render_and_empty_value() {
        let col = ColumnSpec::new("tipo", "Tipo").with_empty_value("—");
        let row = Record::new().with_field("tipo", json!("Universidad"));
        assert_eq!(col.display(&row), "Universidad");
        assert_eq!(col.display(&Record::new()), "—");

        let col = ColumnSpec::new("nombre", "Nombre")
            .with_render(|row| row.display_value("nombre").to_uppercase());
        assert_eq!(col.display(&row.clone().with_field("nombre", json!("uni"))), "UNI");
    }

    #[test]
    fn test_default_form_values_skip_layout_fields() {
        let schema = EntitySchema::from_yaml(SCHEMA_YAML).unwrap();
        let mut schema = schema;
        schema.fields.push(FieldSpec::section("Contacto"));

        let config = EntityConfig::new(schema, Arc::new(MemoryGateway::new()));
        let row = Record::new()
            .with_field("id", json!(1))
            .with_field("nombre", json!("Uni A"))
            .with_field("tipo", json!("universidad"));

        let values = config.form_values(&row);
        assert_eq!(values.len(), 2);
        assert_eq!(values["nombre"], json!("Uni A"));
    }

    #[test]
    fn test_custom_form_values_override() {
        let schema = EntitySchema::from_yaml(SCHEMA_YAML).unwrap();
        let config = EntityConfig::new(schema, Arc::new(MemoryGateway::new()))
            .with_form_values(|_| HashMap::from([("nombre".to_string(), json!("fixed"))]));

        let values = config.form_values(&Record::new());
        assert_eq!(values["nombre"], json!("fixed"));
    }
}
