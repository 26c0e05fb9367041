//! Protected region markers.
//!
//! A region looks like
//!
//! ```text
//! // Start of user code imports
//! import custom.Thing;
//! // End of user code
//! ```
//!
//! The id is the rest of the start-marker line, trimmed. The body is every line
//! between the start line and the next line containing the end marker.

use serde::{Deserialize, Serialize};

use crate::config::RegionMarkers;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedRegion {
    pub id: String,
    pub body: String,
}

/// Extract the protected regions of `content`, in document order.
///
/// Regions with an empty id and regions left open at end of input are skipped.
/// When an id repeats, the first occurrence wins.
pub fn scan_regions(content: &str, markers: &RegionMarkers) -> Vec<ProtectedRegion> {
    let mut regions: Vec<ProtectedRegion> = Vec::new();
    let mut current: Option<ProtectedRegion> = None;

    for line in content.split_inclusive('\n') {
        if current.is_some() {
            if line.contains(&markers.end) {
                if let Some(region) = current.take() {
                    if regions.iter().any(|r| r.id == region.id) {
                        tracing::warn!(
                            id = %region.id,
                            "Duplicate protected region, keeping the first"
                        );
                    } else {
                        regions.push(region);
                    }
                }
            } else if let Some(region) = current.as_mut() {
                region.body.push_str(line);
            }
            continue;
        }

        if let Some(pos) = line.find(&markers.start) {
            let id = line[pos + markers.start.len()..].trim();
            if id.is_empty() {
                tracing::warn!(line = %line.trim_end(), "Protected region without id, ignoring");
                continue;
            }
            current = Some(ProtectedRegion {
                id: id.to_string(),
                body: String::new(),
            });
        }
    }

    if let Some(region) = current {
        tracing::warn!(id = %region.id, "Unterminated protected region, ignoring");
    }

    regions
}

/// Marker line opening region `id`.
pub fn start_line(prefix: &str, markers: &RegionMarkers, id: &str) -> String {
    format!("{prefix}{} {id}\n", markers.start)
}

/// Marker line closing a region.
pub fn end_line(prefix: &str, markers: &RegionMarkers) -> String {
    format!("{prefix}{}\n", markers.end)
}

/// Render regions in marker form, for the lost-regions file.
pub(crate) fn render_regions(regions: &[ProtectedRegion], markers: &RegionMarkers) -> String {
    let mut out = String::new();
    for region in regions {
        out.push_str(&start_line("", markers, &region.id));
        out.push_str(&region.body);
        if !region.body.is_empty() && !region.body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&end_line("", markers));
    }
    out
}
