//! Markdown reference pages rendered from the registered schemas.

use crate::core::provider::ArchestraProvider;
use crate::domain::schema::{Attribute, AttributeMode, Schema};
use crate::utils::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const PROVIDER_NAME: &str = "terraform-provider-archestra";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Provider,
    Resource,
    DataSource,
}

impl PageKind {
    fn label(self) -> &'static str {
        match self {
            PageKind::Provider => "Provider",
            PageKind::Resource => "Resource",
            PageKind::DataSource => "Data Source",
        }
    }
}

/// Writes `index.md`, `resources/<name>.md` and `data-sources/<name>.md`
/// under `out_dir` and returns the written paths.
pub fn generate(provider: &ArchestraProvider, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = vec![(
        out_dir.join("index.md"),
        render_page(provider.type_name(), PageKind::Provider, &provider.schema()),
    )];
    for resource in provider.resources() {
        let name = resource.type_name();
        pages.push((
            out_dir.join("resources").join(format!("{}.md", short_name(&name))),
            render_page(&name, PageKind::Resource, &resource.schema()),
        ));
    }
    for data_source in provider.data_sources() {
        let name = data_source.type_name();
        pages.push((
            out_dir.join("data-sources").join(format!("{}.md", short_name(&name))),
            render_page(&name, PageKind::DataSource, &data_source.schema()),
        ));
    }

    let mut written = Vec::with_capacity(pages.len());
    for (path, content) in pages {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }
    tracing::info!("Generated {} documentation pages in {}", written.len(), out_dir.display());
    Ok(written)
}

fn short_name(type_name: &str) -> &str {
    type_name
        .strip_prefix(crate::core::lifecycle::TYPE_PREFIX)
        .unwrap_or(type_name)
}

pub fn render_page(name: &str, kind: PageKind, schema: &Schema) -> String {
    let title = match kind {
        PageKind::Provider => format!("{} Provider", name),
        _ => format!("{} {} - {}", name, kind.label(), PROVIDER_NAME),
    };

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("page_title: \"{}\"\n", title));
    out.push_str("subcategory: \"\"\n");
    out.push_str("description: |-\n");
    out.push_str(&format!("  {}\n", schema.description));
    out.push_str("---\n\n");
    out.push_str(&format!("# {} ({})\n\n", name, kind.label()));
    out.push_str(&format!("{}\n\n", schema.description));
    out.push_str("## Schema\n");

    let mut nested = Vec::new();
    render_attributes(&mut out, &schema.attributes, "", &mut nested);

    // Breadth-first so nested blocks appear after the block that links them.
    let mut i = 0;
    while i < nested.len() {
        let (path, attributes): (String, &BTreeMap<String, Attribute>) = nested[i].clone();
        out.push_str(&format!("\n<a id=\"{}\"></a>\n", anchor(&path)));
        out.push_str(&format!("### Nested Schema for `{}`\n", path));
        render_attributes(&mut out, attributes, &path, &mut nested);
        i += 1;
    }
    out
}

fn anchor(path: &str) -> String {
    format!("nestedatt--{}", path.replace('.', "--"))
}

fn render_attributes<'a>(
    out: &mut String,
    attributes: &'a BTreeMap<String, Attribute>,
    prefix: &str,
    nested: &mut Vec<(String, &'a BTreeMap<String, Attribute>)>,
) {
    let sections: [(&str, fn(AttributeMode) -> bool); 3] = [
        ("Required", |m| m == AttributeMode::Required),
        ("Optional", |m| {
            matches!(m, AttributeMode::Optional | AttributeMode::OptionalComputed)
        }),
        ("Read-Only", |m| m == AttributeMode::Computed),
    ];

    for (title, wanted) in sections {
        let members: Vec<(&String, &Attribute)> =
            attributes.iter().filter(|(_, a)| wanted(a.mode)).collect();
        if members.is_empty() {
            continue;
        }

        out.push_str(&format!("\n### {}\n\n", title));
        for (name, attribute) in members {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            out.push_str(&render_attribute(name, &path, attribute));
            out.push('\n');
            if let Some(children) = attribute.attr_type.nested_attributes() {
                nested.push((path, children));
            }
        }
    }
}

fn render_attribute(name: &str, path: &str, attribute: &Attribute) -> String {
    let mut type_label = attribute.attr_type.type_label();
    if attribute.sensitive {
        type_label.push_str(", Sensitive");
    }

    let mut line = format!("- `{}` ({})", name, type_label);
    if !attribute.description.is_empty() {
        line.push(' ');
        line.push_str(&attribute.description);
        if !attribute.description.ends_with('.') {
            line.push('.');
        }
    }
    if let Some(allowed) = &attribute.allowed_values {
        let quoted: Vec<String> = allowed.iter().map(|v| format!("`{}`", v)).collect();
        line.push_str(&format!(" Allowed values: {}.", quoted.join(", ")));
    }
    if let Some(default) = &attribute.default {
        let rendered = match default {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        line.push_str(&format!(" Defaults to `{}`.", rendered));
    }
    if attribute.requires_replace {
        line.push_str(" Changing this forces a new resource.");
    }
    if attribute.attr_type.nested_attributes().is_some() {
        line.push_str(&format!(
            " (see [below for nested schema](#{}))",
            anchor(path)
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::nested;

    #[test]
    fn test_page_groups_attributes_by_mode() {
        let schema = Schema::new("Manages widgets.")
            .attribute("id", Attribute::computed_string().with_description("Identifier"))
            .attribute(
                "kind",
                Attribute::required_string()
                    .with_description("Widget kind")
                    .one_of(&["a", "b"]),
            )
            .attribute(
                "token",
                Attribute::optional_string().with_description("Secret").sensitive(),
            );

        let page = render_page("archestra_widget", PageKind::Resource, &schema);
        assert!(page.contains("# archestra_widget (Resource)"));
        assert!(page.contains("### Required\n\n- `kind` (String) Widget kind. Allowed values: `a`, `b`."));
        assert!(page.contains("- `token` (String, Sensitive) Secret."));
        assert!(page.contains("### Read-Only\n\n- `id` (String) Identifier."));
    }

    #[test]
    fn test_nested_blocks_get_their_own_section() {
        let schema = Schema::new("Nested.").attribute(
            "outer",
            Attribute::single_nested(
                AttributeMode::Optional,
                nested([(
                    "inner",
                    Attribute::single_nested(
                        AttributeMode::Optional,
                        nested([("leaf", Attribute::required_string())]),
                    ),
                )]),
            ),
        );

        let page = render_page("archestra_nested", PageKind::Resource, &schema);
        assert!(page.contains("(see [below for nested schema](#nestedatt--outer))"));
        assert!(page.contains("<a id=\"nestedatt--outer--inner\"></a>\n### Nested Schema for `outer.inner`"));
        assert!(page.contains("- `leaf` (String)"));
    }
}
