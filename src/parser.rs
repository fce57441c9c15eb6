use crate::error::LoadError;
use crate::ir::Topology;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Parse a topology document (YAML, or JSON as a YAML subset).
///
/// Only the structural fields needed to lay the diagram out are required:
/// `sites`, each site's `id` and `devices`, each device's `id` and `type`.
/// Device types outside the known set are kept as-is; link targets are not
/// checked here.
pub fn load_topology(input: &str) -> LoadResult<Topology> {
    let value: Value = serde_yaml::from_str(input).map_err(|err| {
        let location = err.location();
        LoadError::Parse {
            message: err.to_string(),
            line: location.as_ref().map(|loc| loc.line()),
            column: location.as_ref().map(|loc| loc.column()),
        }
    })?;

    check_structure(&value)?;

    let topology: Topology = serde_yaml::from_value(value)
        .map_err(|err| LoadError::schema("<document>", err.to_string()))?;

    let mut seen = HashSet::new();
    for (idx, site) in topology.sites.iter().enumerate() {
        if !seen.insert(site.id.as_str()) {
            return Err(LoadError::schema(
                format!("sites[{idx}].id"),
                format!("duplicate site id `{}`", site.id),
            ));
        }
    }

    tracing::info!(
        sites = topology.sites.len(),
        devices = topology.device_count(),
        "loaded topology `{}`",
        topology.name
    );
    Ok(topology)
}

fn check_structure(root: &Value) -> LoadResult<()> {
    let root = root
        .as_mapping()
        .ok_or_else(|| LoadError::schema("<document>", "expected a mapping at the top level"))?;
    let sites = require_sequence(root, "sites", "sites")?;

    for (site_idx, site) in sites.iter().enumerate() {
        let site_path = format!("sites[{site_idx}]");
        let site = site
            .as_mapping()
            .ok_or_else(|| LoadError::schema(&site_path, "expected a mapping"))?;
        require_scalar(site, "id", &format!("{site_path}.id"))?;
        let devices = require_sequence(site, "devices", &format!("{site_path}.devices"))?;

        for (device_idx, device) in devices.iter().enumerate() {
            let device_path = format!("{site_path}.devices[{device_idx}]");
            let device = device
                .as_mapping()
                .ok_or_else(|| LoadError::schema(&device_path, "expected a mapping"))?;
            require_scalar(device, "id", &format!("{device_path}.id"))?;
            require_scalar(device, "type", &format!("{device_path}.type"))?;
        }
    }
    Ok(())
}

fn require_sequence<'a>(map: &'a Mapping, key: &str, path: &str) -> LoadResult<&'a Vec<Value>> {
    match map.get(key) {
        Some(Value::Sequence(items)) => Ok(items),
        Some(Value::Null) | None => Err(LoadError::schema(path, "missing required field")),
        Some(_) => Err(LoadError::schema(path, "expected a list")),
    }
}

fn require_scalar(map: &Mapping, key: &str, path: &str) -> LoadResult<()> {
    match map.get(key) {
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(LoadError::schema(path, "must not be empty"))
        }
        Some(Value::String(_) | Value::Number(_) | Value::Bool(_)) => Ok(()),
        Some(Value::Null) | None => Err(LoadError::schema(path, "missing required field")),
        Some(_) => Err(LoadError::schema(path, "expected a scalar value")),
    }
}
