//! Read-side queries over a populated [`TraceabilityModel`].
//!
//! These are the lookups a trace browser needs: "what produced this character?"
//! and "where did this model element end up?".

use crate::model::{
    GeneratedText, InputElement, InputElementId, ModuleElementRecord, Resource, ResourceId,
    ResourceKind, TraceabilityModel,
};

/// Everything known about the origin of one position in a generated resource.
#[derive(Debug, Clone)]
pub struct Provenance<'a> {
    pub span: &'a GeneratedText,
    pub module_element: &'a ModuleElementRecord,
    pub inputs: Vec<&'a InputElement>,
}

impl TraceabilityModel {
    /// Look up a generated resource by its location.
    pub fn resource_for(&self, location: &str) -> Option<&Resource> {
        self.resource_of_kind(location, ResourceKind::Generated)
    }

    /// Look up a resource of any role by its location.
    pub fn resource_of_kind(&self, location: &str, kind: ResourceKind) -> Option<&Resource> {
        self.resource_index
            .get(&(kind, location.to_string()))
            .and_then(|id| self.resources.get(id.0))
    }

    /// Spans of `resource` in generation order.
    pub fn spans_for(&self, resource: ResourceId) -> impl Iterator<Item = &GeneratedText> + '_ {
        self.resources
            .get(resource.0)
            .map(|r| r.spans.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.spans.get(id.0))
    }

    /// Find the span covering `offset` in the generated resource at `location`.
    pub fn span_at(&self, location: &str, offset: usize) -> Option<&GeneratedText> {
        let resource = self.resource_for(location)?;
        // Spans are recorded in non-decreasing, non-overlapping order.
        let idx = resource
            .spans
            .partition_point(|id| self.spans.get(id.0).is_some_and(|s| s.end <= offset));
        let span = self.spans.get(resource.spans.get(idx)?.0)?;
        span.contains(offset).then_some(span)
    }

    /// The module element and input elements that produced `offset` in `location`.
    pub fn elements_producing(&self, location: &str, offset: usize) -> Option<Provenance<'_>> {
        let span = self.span_at(location, offset)?;
        let module_element = self.module_elements.get(span.module_element.0)?;
        let inputs = span
            .input_elements
            .iter()
            .filter_map(|id| self.input_elements.get(id.0))
            .collect();
        Some(Provenance {
            span,
            module_element,
            inputs,
        })
    }

    /// Find an input element by object URI and feature.
    pub fn find_input(&self, object_uri: &str, feature: Option<&str>) -> Option<&InputElement> {
        self.input_index
            .get(&(object_uri.to_string(), feature.map(str::to_string)))
            .and_then(|id| self.input_elements.get(id.0))
    }

    /// All spans an input element contributed to, in recording order.
    pub fn spans_for_input(&self, input: InputElementId) -> Vec<&GeneratedText> {
        self.input_elements
            .get(input.0)
            .map(|i| {
                i.spans
                    .iter()
                    .filter_map(|id| self.spans.get(id.0))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All spans any feature of `object_uri` contributed to, sorted by span id.
    pub fn spans_for_object(&self, object_uri: &str) -> Vec<&GeneratedText> {
        let mut ids: Vec<_> = self
            .input_elements
            .iter()
            .filter(|i| i.object_uri == object_uri)
            .flat_map(|i| i.spans.iter().copied())
            .collect();
        ids.sort();
        ids.dedup();
        ids.iter().filter_map(|id| self.spans.get(id.0)).collect()
    }

    /// Slice the text of `span` out of the resource's final content.
    pub fn text_of<'c>(&self, span: &GeneratedText, content: &'c str) -> Option<&'c str> {
        let start = char_to_byte(content, span.start)?;
        let end = char_to_byte(content, span.end)?;
        content.get(start..end)
    }
}

fn char_to_byte(content: &str, char_offset: usize) -> Option<usize> {
    if char_offset == content.chars().count() {
        return Some(content.len());
    }
    content.char_indices().nth(char_offset).map(|(b, _)| b)
}
