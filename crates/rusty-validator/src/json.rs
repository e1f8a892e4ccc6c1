// File: src/json.rs
// Purpose: Reflection for serde_json documents and rule-map validation

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};
use tracing::trace;

use crate::errors::ValidationErrors;
use crate::reflect::{Mapping, Reflect};
use crate::validator::Validator;
use crate::value::Value;

static NULL: Json = Json::Null;

impl Reflect for Json {
    fn reflect(&self) -> Value<'_> {
        match self {
            Json::Null => Value::Indirect(None),
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    n.as_f64().map_or(Value::Opaque, Value::Float)
                }
            }
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::Slice(items),
            Json::Object(map) => Value::Map(map),
        }
    }
}

impl Mapping for Map<String, Json> {
    fn len(&self) -> usize {
        Map::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)))
    }
}

impl Reflect for Map<String, Json> {
    fn reflect(&self) -> Value<'_> {
        Value::Map(self)
    }
}

impl Validator {
    /// Validates a JSON object against a parallel object of rule strings
    ///
    /// A rule value that is itself an object applies to the nested object (or
    /// to every object of a nested array). Failures are keyed by dotted path,
    /// e.g. `address.city` or `items[1].sku`; the map is empty on success.
    pub fn validate_map(&self, data: &Map<String, Json>, rules: &Map<String, Json>) -> BTreeMap<String, ValidationErrors> {
        trace!(rules = rules.len(), "validating map");
        let mut failures = BTreeMap::new();
        self.validate_map_into(data, rules, "", &mut failures);
        failures
    }

    fn validate_map_into(
        &self,
        data: &Map<String, Json>,
        rules: &Map<String, Json>,
        prefix: &str,
        failures: &mut BTreeMap<String, ValidationErrors>,
    ) {
        for (key, rule) in rules {
            let path = format!("{prefix}{key}");
            let value = data.get(key).unwrap_or(&NULL);

            match (rule, value) {
                (Json::Object(nested), Json::Object(inner)) => {
                    self.validate_map_into(inner, nested, &format!("{path}."), failures);
                }
                (Json::Object(nested), Json::Array(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{path}[{i}]");
                        match item {
                            Json::Object(inner) => {
                                self.validate_map_into(inner, nested, &format!("{item_path}."), failures)
                            }
                            _ => self.validate_map_into(&Map::new(), nested, &format!("{item_path}."), failures),
                        }
                    }
                }
                (Json::Object(nested), _) => {
                    self.validate_map_into(&Map::new(), nested, &format!("{path}."), failures);
                }
                (Json::String(tag), _) => {
                    if let Err(errors) = self.var_with_value(value, data, tag) {
                        failures.insert(path, errors);
                    }
                }
                _ => {}
            }
        }
    }
}
