//! Serialized form of input models (JSON or YAML).
//!
//! ```json
//! {
//!   "location": "library.json",
//!   "objects": [
//!     { "id": "lib", "class": "Library", "features": { "name": "City" } },
//!     { "id": "b1", "class": "Book", "container": "lib",
//!       "features": { "title": "Dune", "author": { "ref": "a1" } } }
//!   ]
//! }
//! ```
//!
//! Object references are written `{"ref": "<id>"}` and may point into another
//! document loaded into the same [`ModelSet`].

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{ModelError, ModelSet, ObjectId, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct ModelDocument {
    pub location: String,
    #[serde(default)]
    pub objects: Vec<ObjectDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDocument {
    pub id: String,
    pub class: String,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub features: BTreeMap<String, serde_json::Value>,
}

impl ModelDocument {
    pub fn from_json_str(location: &str, json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::Parse {
            location: location.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_yaml_str(location: &str, yaml: &str) -> Result<Self, ModelError> {
        serde_yaml::from_str(yaml).map_err(|e| ModelError::Parse {
            location: location.to_string(),
            reason: e.to_string(),
        })
    }
}

impl ModelSet {
    /// Build a model set from serialized documents.
    pub fn from_documents(documents: Vec<ModelDocument>) -> Result<Self, ModelError> {
        let mut models = ModelSet::new();
        let mut pending_features = Vec::new();

        for document in documents {
            let resource = models.add_resource(document.location.clone());
            let mut remaining = document.objects;

            // Containers may be listed after their contents; add in dependency order.
            while !remaining.is_empty() {
                let before = remaining.len();
                let mut deferred = Vec::new();
                for object in remaining {
                    let resolved = match object.container.as_deref() {
                        None => Some(None),
                        Some(key) => models
                            .keys
                            .get(&(resource, key.to_string()))
                            .map(|id| Some(*id)),
                    };
                    let Some(container) = resolved else {
                        deferred.push(object);
                        continue;
                    };
                    let id = models.add_object(resource, &object.id, &object.class, container)?;
                    pending_features.push((resource, id, object.id, object.features));
                }
                if deferred.len() == before {
                    let object = &deferred[0];
                    return Err(ModelError::UnknownReference {
                        location: document.location,
                        key: object.id.clone(),
                        target: object.container.clone().unwrap_or_default(),
                    });
                }
                remaining = deferred;
            }
        }

        for (resource, id, key, features) in pending_features {
            for (feature, raw) in features {
                let value = models.convert(resource, &key, &feature, raw)?;
                models.set_feature(id, feature, value);
            }
        }

        tracing::debug!(
            resources = models.resources.len(),
            objects = models.objects.len(),
            "Loaded input models"
        );
        Ok(models)
    }

    fn convert(
        &self,
        resource: usize,
        key: &str,
        feature: &str,
        raw: serde_json::Value,
    ) -> Result<Value, ModelError> {
        use serde_json::Value as Json;

        let value = match raw {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => {
                    let real = n.as_f64().ok_or_else(|| ModelError::InvalidFeatureValue {
                        key: key.to_string(),
                        feature: feature.to_string(),
                        reason: format!("number {n} is out of range"),
                    })?;
                    Value::Real(real)
                }
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => {
                let items = items
                    .into_iter()
                    .map(|item| self.convert(resource, key, feature, item))
                    .collect::<Result<_, _>>()?;
                Value::Collection(items)
            }
            Json::Object(map) => {
                let invalid = || ModelError::InvalidFeatureValue {
                    key: key.to_string(),
                    feature: feature.to_string(),
                    reason: "objects must have the form {\"ref\": \"<id>\"}".to_string(),
                };
                let target = map.get("ref").and_then(Json::as_str).ok_or_else(invalid)?;
                let unknown = || ModelError::UnknownReference {
                    location: self.resources[resource].location.clone(),
                    key: key.to_string(),
                    target: target.to_string(),
                };
                Value::Object(self.resolve(resource, target).ok_or_else(unknown)?)
            }
        };
        Ok(value)
    }

    /// Resolve a key in `resource` first, then in any resource.
    fn resolve(&self, resource: usize, key: &str) -> Option<ObjectId> {
        self.keys
            .get(&(resource, key.to_string()))
            .copied()
            .or_else(|| self.find(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"{
        "location": "library.json",
        "objects": [
            { "id": "b1", "class": "Book", "container": "lib",
              "features": {
                "title": "Dune", "pages": 412, "rating": 4.5, "author": { "ref": "a1" }
              } },
            { "id": "lib", "class": "Library",
              "features": { "name": "City", "tags": ["a", "b"] } },
            { "id": "a1", "class": "Author", "container": "lib",
              "features": { "name": "Herbert" } }
        ]
    }"#;

    #[test]
    fn test_load_resolves_containers_and_references() {
        let doc = ModelDocument::from_json_str("library.json", LIBRARY).unwrap();
        let models = ModelSet::from_documents(vec![doc]).unwrap();

        let lib = models.find("lib").unwrap();
        let book = models.find("b1").unwrap();
        let author = models.find("a1").unwrap();

        assert_eq!(models.root_container(book), lib);
        let expected = Value::Object(author);
        assert_eq!(models.feature(book, "author"), Some(&expected));
        assert_eq!(models.feature(book, "pages"), Some(&Value::Integer(412)));
        assert_eq!(models.feature(book, "rating"), Some(&Value::Real(4.5)));
        assert_eq!(
            models.feature(lib, "tags"),
            Some(&Value::Collection(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(models.roots(), vec![lib]);
    }

    #[test]
    fn test_load_rejects_dangling_reference() {
        let json = r#"{ "location": "m.json", "objects": [
            { "id": "x", "class": "X", "features": { "other": { "ref": "nope" } } } ] }"#;
        let doc = ModelDocument::from_json_str("m.json", json).unwrap();
        let err = ModelSet::from_documents(vec![doc]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownReference { .. }));
    }

    #[test]
    fn test_load_rejects_missing_container() {
        let json = r#"{ "location": "m.json", "objects": [
            { "id": "x", "class": "X", "container": "ghost" } ] }"#;
        let doc = ModelDocument::from_json_str("m.json", json).unwrap();
        let err = ModelSet::from_documents(vec![doc]).unwrap_err();
        match err {
            ModelError::UnknownReference { target, .. } => assert_eq!(target, "ghost"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_yaml_document() {
        let yaml = "\
location: m.yaml
objects:
  - id: x
    class: X
    features:
      flag: true
";
        let doc = ModelDocument::from_yaml_str("m.yaml", yaml).unwrap();
        let models = ModelSet::from_documents(vec![doc]).unwrap();
        let x = models.find("x").unwrap();
        assert_eq!(models.feature(x, "flag"), Some(&Value::Bool(true)));
    }
}
