//! Entities of the traceability model and the write-side API used during generation.
//!
//! All entities live in arenas owned by [`TraceabilityModel`] and refer to each other
//! through typed ids. Registration is get-or-create keyed by identity, so the same
//! module element or input element recorded twice resolves to a single entity.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`Resource`] in its model.
    ResourceId
);
arena_id!(
    /// Index of a [`ModuleElementRecord`] in its model.
    ModuleElementId
);
arena_id!(
    /// Index of an [`InputElement`] in its model.
    InputElementId
);
arena_id!(
    /// Index of a [`GeneratedText`] span in its model.
    SpanId
);

/// Role of a resource in a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// An output artifact.
    Generated,
    /// A template/query module source.
    Module,
    /// An input model source.
    Model,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Module => write!(f, "module"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// A file-like resource, uniquely identified by its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub location: String,
    pub kind: ResourceKind,
    /// Spans owned by this resource, in generation order (generated files only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<SpanId>,
    /// Character length covered so far; the final length once `complete`.
    #[serde(default)]
    pub length: usize,
    /// Set once generation of the resource has finished.
    #[serde(default)]
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Template,
    Query,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => write!(f, "template"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// A compiled template or query that produced generated text.
///
/// Overloads of the same name are distinct records, told apart by their
/// declared parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleElementRecord {
    pub id: ModuleElementId,
    /// The module file declaring the element.
    pub module_file: ResourceId,
    pub name: String,
    /// Declared parameter types, in order.
    #[serde(default)]
    pub parameters: Vec<String>,
    pub kind: ElementKind,
}

impl ModuleElementRecord {
    /// `name(T1, T2)`.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.parameters.join(", "))
    }

    fn key(&self) -> ElementKey {
        (self.module_file, self.name.clone(), self.parameters.clone())
    }
}

/// A source model object, together with the feature that was read from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputElement {
    pub id: InputElementId,
    /// The model file the object belongs to.
    pub model_file: ResourceId,
    /// `<model location>#<object key>`.
    pub object_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Reverse index: every span this input contributed to, in recording order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<SpanId>,
}

/// An immutable provenance fact: `[start, end)` of `resource` was produced by
/// `module_element` from `input_elements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub id: SpanId,
    pub resource: ResourceId,
    pub start: usize,
    pub end: usize,
    pub module_element: ModuleElementId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_elements: Vec<InputElementId>,
}

impl GeneratedText {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Root of the traceability model for one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceabilityModel {
    pub(crate) resources: Vec<Resource>,
    pub(crate) module_elements: Vec<ModuleElementRecord>,
    pub(crate) input_elements: Vec<InputElement>,
    pub(crate) spans: Vec<GeneratedText>,

    #[serde(skip)]
    pub(crate) resource_index: HashMap<(ResourceKind, String), ResourceId>,
    #[serde(skip)]
    pub(crate) module_element_index: HashMap<ElementKey, ModuleElementId>,
    #[serde(skip)]
    pub(crate) input_index: HashMap<(String, Option<String>), InputElementId>,
}

/// Module file, element name and declared parameter types.
type ElementKey = (ResourceId, String, Vec<String>);

impl TraceabilityModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the resource of `kind` at `location`.
    ///
    /// A generated file may share its location with a module or model file; each
    /// role gets its own resource.
    pub fn resource(&mut self, location: &str, kind: ResourceKind) -> ResourceId {
        let key = (kind, location.to_string());
        if let Some(id) = self.resource_index.get(&key) {
            return *id;
        }
        let id = ResourceId(self.resources.len());
        self.resources.push(Resource {
            id,
            location: location.to_string(),
            kind,
            spans: Vec::new(),
            length: 0,
            complete: false,
        });
        self.resource_index.insert(key, id);
        id
    }

    /// Get or create the record of a module element declared in `module_file`.
    ///
    /// `parameters` are the declared parameter types; overloads sharing a name
    /// get separate records.
    pub fn module_element(
        &mut self,
        module_file: &str,
        name: &str,
        parameters: &[&str],
        kind: ElementKind,
    ) -> ModuleElementId {
        let file = self.resource(module_file, ResourceKind::Module);
        let parameters: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
        let key = (file, name.to_string(), parameters);
        if let Some(id) = self.module_element_index.get(&key) {
            return *id;
        }
        let id = ModuleElementId(self.module_elements.len());
        self.module_elements.push(ModuleElementRecord {
            id,
            module_file: file,
            name: name.to_string(),
            parameters: key.2.clone(),
            kind,
        });
        self.module_element_index.insert(key, id);
        id
    }

    /// Get or create the input element for `object_uri` read through `feature`.
    pub fn input_element(
        &mut self,
        model_file: &str,
        object_uri: &str,
        feature: Option<&str>,
    ) -> InputElementId {
        let key = (object_uri.to_string(), feature.map(str::to_string));
        if let Some(id) = self.input_index.get(&key) {
            return *id;
        }
        let file = self.resource(model_file, ResourceKind::Model);
        let id = InputElementId(self.input_elements.len());
        self.input_elements.push(InputElement {
            id,
            model_file: file,
            object_uri: key.0.clone(),
            feature: key.1.clone(),
            spans: Vec::new(),
        });
        self.input_index.insert(key, id);
        id
    }

    /// Record that `range` of `resource` was produced by `element` from `inputs`.
    ///
    /// Spans of a resource must be appended in order and must not overlap. The
    /// reverse index of every input is updated in place.
    pub fn record_span(
        &mut self,
        resource: ResourceId,
        range: Range<usize>,
        element: ModuleElementId,
        inputs: &[InputElementId],
    ) -> Result<SpanId, TraceError> {
        if element.0 >= self.module_elements.len() {
            return Err(TraceError::UnknownModuleElement(element));
        }
        if let Some(missing) = inputs.iter().find(|i| i.0 >= self.input_elements.len()) {
            return Err(TraceError::UnknownInputElement(*missing));
        }
        let next_id = SpanId(self.spans.len());
        let res = self
            .resources
            .get_mut(resource.0)
            .ok_or(TraceError::UnknownResource(resource))?;

        if res.kind != ResourceKind::Generated {
            return Err(TraceError::NotGenerated {
                location: res.location.clone(),
                kind: res.kind,
            });
        }
        if res.complete {
            return Err(TraceError::ResourceComplete {
                location: res.location.clone(),
            });
        }
        if range.start > range.end {
            return Err(TraceError::InvalidRange {
                location: res.location.clone(),
                start: range.start,
                end: range.end,
            });
        }
        if range.start < res.length {
            return Err(TraceError::OutOfOrder {
                location: res.location.clone(),
                start: range.start,
                end: range.end,
                previous_end: res.length,
            });
        }

        res.spans.push(next_id);
        res.length = range.end;

        let mut input_elements = Vec::with_capacity(inputs.len());
        for input in inputs {
            if input_elements.contains(input) {
                continue;
            }
            input_elements.push(*input);
            self.input_elements[input.0].spans.push(next_id);
        }

        self.spans.push(GeneratedText {
            id: next_id,
            resource,
            start: range.start,
            end: range.end,
            module_element: element,
            input_elements,
        });
        Ok(next_id)
    }

    /// Mark a generated resource as finished with its final character length.
    pub fn complete_resource(
        &mut self,
        resource: ResourceId,
        final_length: usize,
    ) -> Result<(), TraceError> {
        let res = self
            .resources
            .get_mut(resource.0)
            .ok_or(TraceError::UnknownResource(resource))?;
        if final_length < res.length {
            return Err(TraceError::InvalidRange {
                location: res.location.clone(),
                start: res.length,
                end: final_length,
            });
        }
        res.length = final_length;
        res.complete = true;
        Ok(())
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn module_elements(&self) -> &[ModuleElementRecord] {
        &self.module_elements
    }

    pub fn input_elements(&self) -> &[InputElement] {
        &self.input_elements
    }

    pub fn spans(&self) -> &[GeneratedText] {
        &self.spans
    }

    pub fn get_resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.0)
    }

    pub fn get_module_element(&self, id: ModuleElementId) -> Option<&ModuleElementRecord> {
        self.module_elements.get(id.0)
    }

    pub fn get_input_element(&self, id: InputElementId) -> Option<&InputElement> {
        self.input_elements.get(id.0)
    }

    pub fn get_span(&self, id: SpanId) -> Option<&GeneratedText> {
        self.spans.get(id.0)
    }

    /// Serialize the model (without lookup indexes) to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a persisted model, check that its ids are consistent and rebuild its
    /// lookup indexes.
    pub fn from_json_str(json: &str) -> Result<Self, TraceError> {
        let mut model: Self = serde_json::from_str(json)?;
        model.validate()?;
        model.rebuild_indexes()?;
        Ok(model)
    }

    /// Every id must point at an existing entity and every entity must sit at the
    /// index named by its own id. Spans must be well formed and ordered per resource.
    fn validate(&self) -> Result<(), TraceError> {
        check_positions("resource", self.resources.iter().map(|r| r.id.0))?;
        check_positions("element", self.module_elements.iter().map(|e| e.id.0))?;
        check_positions("input", self.input_elements.iter().map(|i| i.id.0))?;
        check_positions("span", self.spans.iter().map(|s| s.id.0))?;

        for element in &self.module_elements {
            self.resource_at(element.module_file)?;
        }
        for input in &self.input_elements {
            self.resource_at(input.model_file)?;
            for span in &input.spans {
                self.span_at_id(*span)?;
            }
        }
        for span in &self.spans {
            let resource = self.resource_at(span.resource)?;
            if span.start > span.end {
                return Err(TraceError::InvalidRange {
                    location: resource.location.clone(),
                    start: span.start,
                    end: span.end,
                });
            }
            if span.module_element.0 >= self.module_elements.len() {
                return Err(TraceError::UnknownModuleElement(span.module_element));
            }
            if let Some(missing) = span
                .input_elements
                .iter()
                .find(|i| i.0 >= self.input_elements.len())
            {
                return Err(TraceError::UnknownInputElement(*missing));
            }
        }
        for resource in &self.resources {
            let mut previous_end = 0;
            for id in &resource.spans {
                let span = self.span_at_id(*id)?;
                if span.resource != resource.id {
                    return Err(TraceError::SpanOwnership {
                        span: *id,
                        listed_by: resource.id,
                        owner: span.resource,
                    });
                }
                if span.start < previous_end {
                    return Err(TraceError::OutOfOrder {
                        location: resource.location.clone(),
                        start: span.start,
                        end: span.end,
                        previous_end,
                    });
                }
                previous_end = span.end;
            }
        }
        Ok(())
    }

    fn resource_at(&self, id: ResourceId) -> Result<&Resource, TraceError> {
        self.resources
            .get(id.0)
            .ok_or(TraceError::UnknownResource(id))
    }

    fn span_at_id(&self, id: SpanId) -> Result<&GeneratedText, TraceError> {
        self.spans.get(id.0).ok_or(TraceError::UnknownSpan(id))
    }

    fn rebuild_indexes(&mut self) -> Result<(), TraceError> {
        self.resource_index.clear();
        for resource in &self.resources {
            let key = (resource.kind, resource.location.clone());
            if self.resource_index.insert(key, resource.id).is_some() {
                return Err(TraceError::DuplicateResource {
                    location: resource.location.clone(),
                    kind: resource.kind,
                });
            }
        }
        self.module_element_index = self
            .module_elements
            .iter()
            .map(|e| (e.key(), e.id))
            .collect();
        self.input_index = self
            .input_elements
            .iter()
            .map(|i| ((i.object_uri.clone(), i.feature.clone()), i.id))
            .collect();
        tracing::debug!(
            resources = self.resources.len(),
            spans = self.spans.len(),
            "Rebuilt traceability indexes"
        );
        Ok(())
    }
}

fn check_positions(
    entity: &'static str,
    ids: impl Iterator<Item = usize>,
) -> Result<(), TraceError> {
    for (index, id) in ids.enumerate() {
        if index != id {
            return Err(TraceError::MisplacedEntity { entity, index, id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (
        TraceabilityModel,
        ResourceId,
        ModuleElementId,
        InputElementId,
    ) {
        let mut model = TraceabilityModel::new();
        let out = model.resource("out/Library.java", ResourceKind::Generated);
        let element = model.module_element("gen/java.mtl", "genClass", &[], ElementKind::Template);
        let input = model.input_element("library.json", "library.json#lib", Some("name"));
        (model, out, element, input)
    }

    #[test]
    fn test_registration_is_get_or_create() {
        let (mut model, out, element, input) = fixture();
        assert_eq!(
            model.resource("out/Library.java", ResourceKind::Generated),
            out
        );
        assert_eq!(
            model.module_element("gen/java.mtl", "genClass", &[], ElementKind::Template),
            element
        );
        assert_eq!(
            model.input_element("library.json", "library.json#lib", Some("name")),
            input
        );
        // Same object, different feature is a distinct input element
        let other = model.input_element("library.json", "library.json#lib", None);
        assert_ne!(other, input);
        // generated + module + model files
        assert_eq!(model.resources().len(), 3);
    }

    #[test]
    fn test_overloads_are_distinct_elements() {
        let mut model = TraceabilityModel::new();
        let one = model.module_element("m.mtl", "t", &["Book"], ElementKind::Template);
        let two = model.module_element("m.mtl", "t", &["Book", "String"], ElementKind::Template);
        assert_ne!(one, two);
        assert_eq!(
            model.module_element("m.mtl", "t", &["Book"], ElementKind::Template),
            one
        );

        let record = model.get_module_element(two).unwrap();
        assert_eq!(record.parameters, vec!["Book", "String"]);
        assert_eq!(record.signature(), "t(Book, String)");
    }

    #[test]
    fn test_same_location_in_different_roles() {
        let (mut model, _, element, _) = fixture();
        // A generated file written over the module's own location
        let out = model.resource("gen/java.mtl", ResourceKind::Generated);
        let module = model.get_module_element(element).unwrap().module_file;
        assert_ne!(out, module);

        model.record_span(out, 0..3, element, &[]).unwrap();
        assert_eq!(model.resource_for("gen/java.mtl").unwrap().id, out);
    }

    #[test]
    fn test_record_span_updates_reverse_index() {
        let (mut model, out, element, input) = fixture();
        let first = model.record_span(out, 0..6, element, &[input]).unwrap();
        let second = model
            .record_span(out, 6..10, element, &[input, input])
            .unwrap();

        assert_eq!(
            model.get_input_element(input).unwrap().spans,
            vec![first, second]
        );
        assert_eq!(model.get_span(second).unwrap().input_elements, vec![input]);
        assert_eq!(model.get_resource(out).unwrap().length, 10);
    }

    #[test]
    fn test_record_span_rejects_out_of_order() {
        let (mut model, out, element, _) = fixture();
        model.record_span(out, 0..6, element, &[]).unwrap();
        let err = model.record_span(out, 3..8, element, &[]).unwrap_err();
        assert!(matches!(err, TraceError::OutOfOrder { start: 3, .. }));
    }

    #[test]
    fn test_record_span_rejects_non_generated_resource() {
        let (mut model, _, element, _) = fixture();
        let module = model.resource("gen/java.mtl", ResourceKind::Module);
        let err = model.record_span(module, 0..1, element, &[]).unwrap_err();
        assert!(matches!(err, TraceError::NotGenerated { .. }));
    }

    #[test]
    fn test_complete_resource_closes_it() {
        let (mut model, out, element, _) = fixture();
        model.record_span(out, 0..4, element, &[]).unwrap();
        model.complete_resource(out, 4).unwrap();
        assert!(model.get_resource(out).unwrap().complete);
        let err = model.record_span(out, 4..5, element, &[]).unwrap_err();
        assert!(matches!(err, TraceError::ResourceComplete { .. }));
    }

    #[test]
    fn test_json_round_trip_rebuilds_indexes() {
        let (mut model, out, element, input) = fixture();
        model.record_span(out, 0..3, element, &[input]).unwrap();

        let json = model.to_json_string().unwrap();
        let mut restored = TraceabilityModel::from_json_str(&json).unwrap();

        assert_eq!(restored.spans(), model.spans());
        assert_eq!(
            restored.input_element("library.json", "library.json#lib", Some("name")),
            input
        );
        assert_eq!(
            restored.resource("out/Library.java", ResourceKind::Generated),
            out
        );
    }

    fn corrupted(
        edit: impl FnOnce(&mut serde_json::Value),
    ) -> Result<TraceabilityModel, TraceError> {
        let (mut model, out, element, input) = fixture();
        model.record_span(out, 0..3, element, &[input]).unwrap();
        let text = model.to_json_string().unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
        edit(&mut json);
        TraceabilityModel::from_json_str(&json.to_string())
    }

    #[test]
    fn test_load_rejects_dangling_span_reference() {
        let err = corrupted(|json| {
            json["resources"][0]["spans"] = serde_json::json!([5]);
            json["input_elements"][0]["spans"] = serde_json::json!([]);
            json["spans"] = serde_json::json!([]);
        })
        .unwrap_err();
        assert!(matches!(err, TraceError::UnknownSpan(SpanId(5))));
    }

    #[test]
    fn test_load_rejects_inverted_range() {
        let err = corrupted(|json| {
            json["spans"][0]["start"] = serde_json::json!(7);
        })
        .unwrap_err();
        assert!(matches!(err, TraceError::InvalidRange { start: 7, .. }));
    }

    #[test]
    fn test_load_rejects_unknown_element_and_misplaced_ids() {
        let err = corrupted(|json| {
            json["spans"][0]["module_element"] = serde_json::json!(9);
        })
        .unwrap_err();
        match err {
            TraceError::UnknownModuleElement(id) => assert_eq!(id, ModuleElementId(9)),
            other => panic!("unexpected error: {other}"),
        }

        let err = corrupted(|json| {
            json["input_elements"][0]["id"] = serde_json::json!(3);
        })
        .unwrap_err();
        assert!(matches!(err, TraceError::MisplacedEntity { index: 0, .. }));
    }
}
