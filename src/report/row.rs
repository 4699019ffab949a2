use serde_json::{Map, Value};

/// One denormalized report row as returned by the backend, plus a
/// synthesized key that stays unique even when the backend repeats a
/// document number within a page.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub uid: String,
    fields: Map<String, Value>,
}

impl ReportRow {
    pub fn new(family_key: &str, index: usize, fields: Map<String, Value>) -> Self {
        let docno = fields
            .get("docno")
            .and_then(Value::as_str)
            .unwrap_or_default();
        ReportRow {
            uid: format!("{family_key}-{docno}-{index}"),
            fields,
        }
    }

    /// Walk a dotted path; numeric segments index into arrays
    /// (`details.0.taxbase`).
    pub fn value(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Numeric field with the backend's loose typing: numbers come through
    /// as-is, numeric strings are parsed, everything else counts as zero.
    pub fn number(&self, path: &str) -> f64 {
        match self.value(path) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().replace(',', "").parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn text(&self, path: &str) -> String {
        match self.value(path) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }
}
