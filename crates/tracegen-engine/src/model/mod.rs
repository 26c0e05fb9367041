//! Input model objects consumed (never mutated) by evaluation.
//!
//! A [`ModelSet`] is an arena of objects grouped into model resources. Objects are
//! addressed by [`ObjectId`]; their stable identity for traceability is the object
//! URI `<resource location>#<key>`.

mod document;
mod value;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub use document::{ModelDocument, ObjectDocument};
pub use value::Value;

/// Index of an object in its [`ModelSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub usize);

/// A model source file.
#[derive(Debug, Clone)]
pub struct ModelResource {
    pub location: String,
    pub roots: Vec<ObjectId>,
}

/// One input model object.
#[derive(Debug, Clone)]
pub struct ModelObject {
    /// Stable key, unique within the owning resource.
    pub key: String,
    /// Class (type) name.
    pub class: String,
    /// Index of the owning model resource.
    pub resource: usize,
    pub container: Option<ObjectId>,
    /// Sorted so that iteration order is deterministic.
    pub features: BTreeMap<String, Value>,
    pub children: Vec<ObjectId>,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("duplicate object key '{key}' in '{location}'")]
    DuplicateKey { location: String, key: String },

    #[error("object '{key}' in '{location}' references unknown object '{target}'")]
    UnknownReference {
        location: String,
        key: String,
        target: String,
    },

    #[error("invalid value for feature '{feature}' of '{key}': {reason}")]
    InvalidFeatureValue {
        key: String,
        feature: String,
        reason: String,
    },

    #[error("model parse error in '{location}': {reason}")]
    Parse { location: String, reason: String },
}

/// Read-only collection of input model objects.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    resources: Vec<ModelResource>,
    objects: Vec<ModelObject>,
    keys: HashMap<(usize, String), ObjectId>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model resource and return its index.
    pub fn add_resource(&mut self, location: impl Into<String>) -> usize {
        self.resources.push(ModelResource {
            location: location.into(),
            roots: Vec::new(),
        });
        self.resources.len() - 1
    }

    /// Add an object to `resource`, optionally contained by `container`.
    pub fn add_object(
        &mut self,
        resource: usize,
        key: impl Into<String>,
        class: impl Into<String>,
        container: Option<ObjectId>,
    ) -> Result<ObjectId, ModelError> {
        let key = key.into();
        let location = self
            .resources
            .get(resource)
            .map(|r| r.location.clone())
            .unwrap_or_default();
        if self.keys.contains_key(&(resource, key.clone())) {
            return Err(ModelError::DuplicateKey { location, key });
        }

        let id = ObjectId(self.objects.len());
        self.objects.push(ModelObject {
            key: key.clone(),
            class: class.into(),
            resource,
            container,
            features: BTreeMap::new(),
            children: Vec::new(),
        });
        self.keys.insert((resource, key), id);

        match container.and_then(|c| self.objects.get_mut(c.0)) {
            Some(parent) => parent.children.push(id),
            None => {
                if let Some(res) = self.resources.get_mut(resource) {
                    res.roots.push(id);
                }
            }
        }
        Ok(id)
    }

    pub fn set_feature(&mut self, object: ObjectId, feature: impl Into<String>, value: Value) {
        if let Some(o) = self.objects.get_mut(object.0) {
            o.features.insert(feature.into(), value);
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&ModelObject> {
        self.objects.get(id.0)
    }

    pub fn resources(&self) -> &[ModelResource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Find an object by key, searching resources in registration order.
    pub fn find(&self, key: &str) -> Option<ObjectId> {
        (0..self.resources.len()).find_map(|r| self.keys.get(&(r, key.to_string())).copied())
    }

    /// Value of `feature` on `object`, or `None` if the object does not carry it.
    pub fn feature(&self, object: ObjectId, feature: &str) -> Option<&Value> {
        self.get(object).and_then(|o| o.features.get(feature))
    }

    /// Location of the model resource owning `object`.
    pub fn location_of(&self, object: ObjectId) -> &str {
        self.get(object)
            .and_then(|o| self.resources.get(o.resource))
            .map(|r| r.location.as_str())
            .unwrap_or_default()
    }

    /// `<resource location>#<key>` for `object`.
    pub fn uri_of(&self, object: ObjectId) -> String {
        match self.get(object) {
            Some(o) => format!("{}#{}", self.location_of(object), o.key),
            None => format!("#{}", object.0),
        }
    }

    pub fn root_container(&self, object: ObjectId) -> ObjectId {
        let mut current = object;
        while let Some(parent) = self.get(current).and_then(|o| o.container) {
            current = parent;
        }
        current
    }

    /// All transitive contents of `object`, depth first in containment order.
    pub fn all_contents(&self, object: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack: Vec<ObjectId> = self
            .get(object)
            .map(|o| o.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(o) = self.get(next) {
                stack.extend(o.children.iter().rev().copied());
            }
        }
        out
    }

    /// Root objects of every resource, in registration order.
    pub fn roots(&self) -> Vec<ObjectId> {
        self.resources
            .iter()
            .flat_map(|r| r.roots.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> (ModelSet, ObjectId, ObjectId, ObjectId) {
        let mut models = ModelSet::new();
        let res = models.add_resource("library.json");
        let lib = models.add_object(res, "lib", "Library", None).unwrap();
        let shelf = models.add_object(res, "s1", "Shelf", Some(lib)).unwrap();
        let book = models.add_object(res, "b1", "Book", Some(shelf)).unwrap();
        models.set_feature(book, "title", Value::from("Dune"));
        (models, lib, shelf, book)
    }

    #[test]
    fn test_root_container_and_contents() {
        let (models, lib, shelf, book) = library();
        assert_eq!(models.root_container(book), lib);
        assert_eq!(models.root_container(lib), lib);
        assert_eq!(models.all_contents(lib), vec![shelf, book]);
        assert_eq!(models.roots(), vec![lib]);
    }

    #[test]
    fn test_uri_and_feature_lookup() {
        let (models, _, _, book) = library();
        assert_eq!(models.uri_of(book), "library.json#b1");
        assert_eq!(models.feature(book, "title"), Some(&Value::from("Dune")));
        assert_eq!(models.feature(book, "isbn"), None);
        assert_eq!(models.find("b1"), Some(book));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let (mut models, _, _, _) = library();
        let err = models.add_object(0, "b1", "Book", None).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateKey { .. }));
    }
}
