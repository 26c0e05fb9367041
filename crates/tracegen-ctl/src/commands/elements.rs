//! `elements`: list the templates and queries of a compiled module.

use std::path::Path;

use tracegen_engine::ModuleElement;

use crate::{loader, output};

pub(crate) fn handle_elements_command(path: &Path) -> anyhow::Result<()> {
    let module = loader::load_module(path)?;

    output::header(format!("{} ({})", module.name, module.location));
    if module.elements.is_empty() {
        output::dim("  (no elements)");
        return Ok(());
    }

    for element in &module.elements {
        let parameters = element
            .parameters()
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_name))
            .collect::<Vec<_>>()
            .join(", ");
        let signature = match element {
            ModuleElement::Template(t) if t.main => format!("{}({parameters}) [main]", t.name),
            ModuleElement::Template(t) => format!("{}({parameters})", t.name),
            ModuleElement::Query(q) => format!("{}({parameters}): {}", q.name, q.return_type),
        };
        let (visibility, kind) = (element.visibility(), element.kind());
        output::item(format!("{visibility} {kind} {signature}"));
    }
    Ok(())
}
