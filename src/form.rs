//! Declarative form engine: values, touched tracking, and validation.
//!
//! Validation runs per field on every change and again in full on submit.
//! Rule order per field is fixed (required, pattern, min_length,
//! max_length, min, max, custom) and the first failing rule wins — a field
//! never carries more than one error at a time. Validation failures stay
//! local to the form; they are never surfaced as remote errors or log
//! noise.

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::config::{FieldSpec, ValidationRules};

/// Field-level errors that blocked a submit.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    /// Field id -> message, in field declaration order.
    pub errors: IndexMap<String, String>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} campo(s) con errores de validación", self.errors.len())
    }
}

impl std::error::Error for ValidationFailure {}

/// Live state of one editor form.
pub struct FormState {
    fields: Vec<FieldSpec>,
    values: HashMap<String, Value>,
    touched: HashSet<String>,
    errors: IndexMap<String, String>,
}

impl FormState {
    pub fn new(fields: Vec<FieldSpec>, initial_values: HashMap<String, Value>) -> Self {
        Self {
            fields,
            values: initial_values,
            touched: HashSet::new(),
            errors: IndexMap::new(),
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn value(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    pub fn is_touched(&self, id: &str) -> bool {
        self.touched.contains(id)
    }

    pub fn error(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }

    pub fn errors(&self) -> &IndexMap<String, String> {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Set a field value, mark it touched, and re-validate that field.
    pub fn set_value(&mut self, id: impl Into<String>, value: Value) {
        let id = id.into();
        self.values.insert(id.clone(), value);
        self.touched.insert(id.clone());
        self.validate_field(&id);
    }

    /// Validate every field, mark all fields touched (so errors become
    /// visible even for untouched ones), and either return the submitted
    /// value map or block with the collected errors.
    ///
    /// Layout pseudo-fields (`section`/`divider`) are excluded from both
    /// validation and the returned values.
    pub fn submit(&mut self) -> Result<HashMap<String, Value>, ValidationFailure> {
        self.errors.clear();
        for field in self.fields.clone() {
            self.touched.insert(field.id.clone());
            self.validate_field(&field.id);
        }

        if !self.errors.is_empty() {
            return Err(ValidationFailure {
                errors: self.errors.clone(),
            });
        }

        let submitted = self
            .fields
            .iter()
            .filter(|f| !f.field_type.is_layout())
            .filter_map(|f| {
                self.values
                    .get(&f.id)
                    .map(|v| (f.id.clone(), v.clone()))
            })
            .collect();
        Ok(submitted)
    }

    fn validate_field(&mut self, id: &str) {
        let Some(field) = self.fields.iter().find(|f| f.id == id).cloned() else {
            return;
        };
        // Layout pseudo-fields and disabled fields carry no validation.
        if field.field_type.is_layout() || field.disabled {
            self.errors.shift_remove(id);
            return;
        }

        let value = self.values.get(id);
        match field
            .validation
            .as_ref()
            .and_then(|rules| evaluate_rules(rules, value))
        {
            Some(message) => {
                self.errors.insert(id.to_string(), message);
            }
            None => {
                self.errors.shift_remove(id);
            }
        }
    }
}

/// Evaluate a rule set against a value; first failing rule wins.
fn evaluate_rules(rules: &ValidationRules, value: Option<&Value>) -> Option<String> {
    if rules.required && is_empty_value(value) {
        return Some("Este campo es obligatorio".to_string());
    }
    // Remaining rules only constrain present values.
    let value = match value {
        Some(v) if !is_empty_value(Some(v)) => v,
        _ => return None,
    };

    if let Some(pattern) = &rules.pattern {
        // An invalid pattern is treated as no constraint, same policy as
        // unparseable numeric filter bounds.
        if let (Some(text), Ok(re)) = (value.as_str(), Regex::new(pattern)) {
            if !re.is_match(text) {
                return Some("Formato inválido".to_string());
            }
        }
    }

    if let Some(text) = value.as_str() {
        let len = text.chars().count();
        if let Some(min) = rules.min_length {
            if len < min {
                return Some(format!("Mínimo {} caracteres", min));
            }
        }
        if let Some(max) = rules.max_length {
            if len > max {
                return Some(format!("Máximo {} caracteres", max));
            }
        }
    }

    if let Some(n) = numeric(value) {
        if let Some(min) = rules.min {
            if n < min {
                return Some(format!("El valor mínimo es {}", min));
            }
        }
        if let Some(max) = rules.max {
            if n > max {
                return Some(format!("El valor máximo es {}", max));
            }
        }
    }

    if let Some(custom) = &rules.custom {
        if let Some(message) = custom(value) {
            return Some(message);
        }
    }

    None
}

/// Missing, null, blank strings, empty arrays, and unchecked checkboxes
/// all count as "empty" for the required rule.
fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Bool(b)) => !b,
        _ => false,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
