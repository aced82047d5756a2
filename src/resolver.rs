use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

/// Supplies values for tag paths and text for named templates.
///
/// `depth` is the nesting level of the render asking, for resolvers that
/// want their own bound on self-reference.
pub trait Resolver {
    fn resolve(&self, path: &[String], depth: usize) -> Option<Value>;

    /// Template body for an include tag (`{+name}`), usually a snippet.
    fn include(&self, _name: &str, _depth: usize) -> Option<Value> {
        None
    }
}

/// An in-memory resolver over a value tree and a set of named templates.
///
/// Map segments are looked up by key, list segments by index.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    data: BTreeMap<String, Value>,
    templates: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object; non-object JSON yields an empty resolver.
    pub fn from_json(json: serde_json::Value) -> Self {
        let data = match Value::from_json(json) {
            Some(Value::Map(map)) => map,
            _ => BTreeMap::new(),
        };
        Self {
            data,
            templates: HashMap::new(),
        }
    }

    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_template(mut self, name: &str, body: &str) -> Self {
        self.templates.insert(name.to_string(), body.to_string());
        self
    }

    /// Set a value. Dots in `key` create nested maps.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let mut segments: Vec<&str> = key.split('.').collect();
        let Some(last) = segments.pop() else {
            return;
        };
        let mut map = &mut self.data;
        for segment in segments {
            let entry = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Map(BTreeMap::new()));
            if !matches!(entry, Value::Map(_)) {
                *entry = Value::Map(BTreeMap::new());
            }
            let Value::Map(inner) = entry else {
                return;
            };
            map = inner;
        }
        map.insert(last.to_string(), value.into());
    }
}

impl Resolver for MapResolver {
    fn resolve(&self, path: &[String], _depth: usize) -> Option<Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.data.get(first.as_str())?;
        for segment in rest {
            current = match current {
                Value::Map(map) => map.get(segment.as_str())?,
                Value::List(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }

    fn include(&self, name: &str, _depth: usize) -> Option<Value> {
        self.templates
            .get(name)
            .map(|body| Value::Snippet(body.clone()))
    }
}
