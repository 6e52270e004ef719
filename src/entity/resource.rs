//! Resource rows from configuration, plan and state.
//!
//! The three formats describe resources differently:
//!
//! - configuration: one `resource "type" "name"` block per resource
//! - plan: a flat `planned_values.root_module.resources` list, with child
//!   modules nested under `child_modules`
//! - state: `resources[]`, each holding one or more `instances[]`
//!
//! All three produce the same [`Resource`] row. A state resource produces one
//! row per instance.

use super::{blocks, required_str, Emitter, FileContext};
use crate::document::{Document, Value};
use crate::error::Result;
use crate::extract::{extract, extract_declared, RESOURCE, STATE_INSTANCE, STATE_RESOURCE};
use crate::locator::{BlockKind, BlockRef};
use crate::types::{Entity, Resource};

const MANAGED: &str = "managed";
const DATA: &str = "data";

pub(super) fn list_config(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    for block in blocks(ctx.document, BlockKind::Resource) {
        let (resource_type, name) = (block.label(0), block.label(1));
        let address = format!("{resource_type}.{name}");

        let built = extract(&block.sanitized(), RESOURCE, &format!("resource '{address}'")).map(|meta| {
            let span = ctx.locate(&BlockRef::new(BlockKind::Resource, [resource_type, name]).near_line(block.start_line()));
            Entity::Resource(Resource {
                path: ctx.path.to_path_buf(),
                address,
                mode: MANAGED.to_string(),
                resource_type: resource_type.to_string(),
                name: name.to_string(),
                index: None,
                count: meta.count,
                count_src: meta.count_src,
                for_each: meta.for_each,
                depends_on: meta.depends_on,
                provider: meta.provider,
                lifecycle: meta.lifecycle,
                attributes_std: Some(meta.arguments.clone()),
                arguments: Some(meta.arguments),
                attributes: None,
                span,
            })
        });
        emitter.emit(built)?;
    }
    Ok(())
}

pub(super) fn list_plan(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    let Some(root) = ctx.document.mapping("planned_values").and_then(|p| p.mapping("root_module")) else {
        tracing::debug!(path = %ctx.path.display(), "Plan has no planned root module");
        return Ok(());
    };
    list_plan_module(ctx, root, emitter)
}

fn list_plan_module(ctx: &FileContext<'_>, module: &Document, emitter: &mut Emitter<'_>) -> Result<()> {
    for entry in module.get("resources").and_then(Value::as_sequence).unwrap_or_default() {
        let Some(entry) = entry.as_mapping() else {
            continue;
        };
        emitter.emit(from_plan(ctx, entry))?;
    }

    for child in module.get("child_modules").and_then(Value::as_sequence).unwrap_or_default() {
        if let Some(child) = child.as_mapping() {
            list_plan_module(ctx, child, emitter)?;
        }
    }
    Ok(())
}

fn from_plan(ctx: &FileContext<'_>, entry: &Document) -> Result<Entity> {
    let entity = entry.string("address").map_or_else(|| "plan resource".to_string(), |a| format!("resource '{a}'"));
    let resource_type = required_str(entry, "type", &entity)?;
    let name = required_str(entry, "name", &entity)?;
    let address = entry
        .string("address")
        .map_or_else(|| format!("{resource_type}.{name}"), str::to_string);

    let arguments = match entry.get("values") {
        None | Some(Value::Null) => Document::new(),
        Some(Value::Mapping(values)) => values.clone().sanitized(),
        Some(other) => {
            return Err(crate::err!(TypeMismatch {
                entity: entity,
                argument: "values".to_string(),
                expected: "map".to_string(),
                found: other.type_name().to_string(),
            }))
        }
    };

    let span = ctx.locate(&BlockRef::new(BlockKind::Resource, [resource_type, name]).with_address(&address));
    Ok(Entity::Resource(Resource {
        path: ctx.path.to_path_buf(),
        mode: entry.string("mode").unwrap_or(MANAGED).to_string(),
        resource_type: resource_type.to_string(),
        name: name.to_string(),
        index: entry.get("index").cloned(),
        count: None,
        count_src: None,
        for_each: None,
        depends_on: Vec::new(),
        provider: entry.string("provider_name").map(str::to_string),
        lifecycle: None,
        attributes_std: Some(arguments.clone()),
        arguments: Some(arguments),
        attributes: None,
        address,
        span,
    }))
}

pub(super) fn list_state(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    for resource in ctx.document.get("resources").and_then(Value::as_sequence).unwrap_or_default() {
        let Some(resource) = resource.as_mapping() else {
            continue;
        };
        let header = match StateResource::read(resource) {
            Ok(header) => header,
            Err(e) => {
                emitter.emit(Err(e))?;
                continue;
            }
        };

        let kind = if header.mode == DATA { BlockKind::Data } else { BlockKind::Resource };
        let span = ctx.locate(&BlockRef::new(kind, [header.resource_type, header.name]).in_module(header.module));
        let instances = resource.get("instances").and_then(Value::as_sequence).unwrap_or_default();
        tracing::trace!(path = %ctx.path.display(), resource = %header.base_address(), instances = instances.len(), "State resource");

        for instance in instances.iter().filter_map(Value::as_mapping) {
            let built = header.instance(instance).map(|mut row| {
                row.path = ctx.path.to_path_buf();
                row.span = span.clone();
                Entity::Resource(row)
            });
            emitter.emit(built)?;
        }
    }
    Ok(())
}

/// Fields shared by every instance of a state resource.
struct StateResource<'d> {
    module: Option<&'d str>,
    mode: &'d str,
    resource_type: &'d str,
    name: &'d str,
    provider: Option<String>,
}

impl<'d> StateResource<'d> {
    fn read(resource: &'d Document) -> Result<Self> {
        let resource_type = required_str(resource, "type", "state resource")?;
        let name = required_str(resource, "name", &format!("state resource '{resource_type}'"))?;
        let mode = resource.string("mode").unwrap_or(MANAGED);
        let module = resource.string("module");

        let mut header = Self { module, mode, resource_type, name, provider: None };
        let meta = extract_declared(resource, STATE_RESOURCE, &format!("resource '{}'", header.base_address()))?;
        header.provider = meta.provider;
        Ok(header)
    }

    fn base_address(&self) -> String {
        state_address(self.module, self.mode, self.resource_type, self.name, None)
    }

    fn instance(&self, instance: &Document) -> Result<Resource> {
        let index = instance.get("index_key").filter(|v| !matches!(v, Value::Null));
        let address = state_address(self.module, self.mode, self.resource_type, self.name, index);
        let meta = extract_declared(instance, STATE_INSTANCE, &format!("resource '{address}'"))?;

        let attributes = match instance.get("attributes") {
            None | Some(Value::Null) => Document::new(),
            Some(Value::Mapping(attributes)) => attributes.clone().sanitized(),
            Some(other) => {
                return Err(crate::err!(TypeMismatch {
                    entity: format!("resource '{address}'"),
                    argument: "attributes".to_string(),
                    expected: "map".to_string(),
                    found: other.type_name().to_string(),
                }))
            }
        };

        Ok(Resource {
            path: std::path::PathBuf::new(),
            address,
            mode: self.mode.to_string(),
            resource_type: self.resource_type.to_string(),
            name: self.name.to_string(),
            index: index.cloned(),
            count: None,
            count_src: None,
            for_each: None,
            depends_on: meta.depends_on,
            provider: self.provider.clone(),
            lifecycle: None,
            arguments: None,
            attributes_std: Some(attributes.clone()),
            attributes: Some(attributes),
            span: crate::locator::SourceSpan::not_found(),
        })
    }
}

/// Address of a state resource instance.
///
/// `module.vpc.` prefixes resources inside modules, `data.` prefixes data
/// resources, and the instance key is appended as `[0]` or `["key"]`.
///
/// ```rust
/// use tfinspect::document::Value;
/// use tfinspect::entity::state_address;
///
/// let key = Value::from("blue");
/// assert_eq!(
///     state_address(Some("module.app"), "managed", "aws_instance", "web", Some(&key)),
///     r#"module.app.aws_instance.web["blue"]"#
/// );
/// ```
#[must_use]
pub fn state_address(module: Option<&str>, mode: &str, resource_type: &str, name: &str, index: Option<&Value>) -> String {
    let mut address = String::new();
    if let Some(module) = module.filter(|m| !m.is_empty()) {
        address.push_str(module);
        address.push('.');
    }
    if mode == DATA {
        address.push_str("data.");
    }
    address.push_str(resource_type);
    address.push('.');
    address.push_str(name);

    match index {
        Some(Value::Number(n)) => address.push_str(&format!("[{n}]")),
        Some(Value::String(key)) => address.push_str(&format!("[{}]", serde_json::Value::from(key.as_str()))),
        _ => {}
    }
    address
}
