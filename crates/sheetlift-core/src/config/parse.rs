use std::path::Path;

use yaml_rust2::yaml::Hash;
use yaml_rust2::Yaml;

use crate::config::yaml_decode::{
    hash_get, load_yaml, validate_known_keys, yaml_array, yaml_hash, yaml_string, yaml_u64,
};
use crate::config::{
    EntityConfig, LayoutConfig, ReportConfig, RootConfig, SinkConfig, SourceConfig, StoreConfig,
};
use crate::io::{ColumnRef, SheetSelector};
use crate::{ConfigError, SheetliftResult};

pub(crate) fn parse_config(path: &Path) -> SheetliftResult<RootConfig> {
    let docs = load_yaml(path)?;
    if docs.is_empty() {
        return Err(Box::new(ConfigError("YAML is empty".to_string())));
    }
    if docs.len() > 1 {
        return Err(Box::new(ConfigError(
            "YAML contains multiple documents; expected one".to_string(),
        )));
    }
    parse_root(&docs[0])
}

fn parse_root(doc: &Yaml) -> SheetliftResult<RootConfig> {
    let root = yaml_hash(doc, "root")?;
    validate_known_keys(root, "root", &["version", "report", "store", "entities"])?;
    let version = get_string(root, "version", "root")?;

    let report = match hash_get(root, "report") {
        Some(value) => Some(parse_report_config(value)?),
        None => None,
    };
    let store = match hash_get(root, "store") {
        Some(value) => Some(parse_store_config(value)?),
        None => None,
    };

    let entities_yaml = get_array(root, "entities", "root")?;
    let mut entities = Vec::with_capacity(entities_yaml.len());
    for (index, entity_yaml) in entities_yaml.iter().enumerate() {
        let name_hint = entity_name_hint(entity_yaml);
        let entity = parse_entity(entity_yaml).map_err(|err| {
            Box::new(ConfigError(format_entity_error(
                index,
                name_hint,
                err.as_ref(),
            )))
        })?;
        entities.push(entity);
    }

    Ok(RootConfig {
        version,
        report,
        store,
        entities,
    })
}

fn parse_report_config(value: &Yaml) -> SheetliftResult<ReportConfig> {
    let hash = yaml_hash(value, "report")?;
    validate_known_keys(hash, "report", &["path"])?;
    Ok(ReportConfig {
        path: get_string(hash, "path", "report")?,
    })
}

fn parse_store_config(value: &Yaml) -> SheetliftResult<StoreConfig> {
    let hash = yaml_hash(value, "store")?;
    validate_known_keys(hash, "store", &["url", "url_env", "key_env", "timeout_secs"])?;
    Ok(StoreConfig {
        url: opt_string(hash, "url", "store")?,
        url_env: opt_string(hash, "url_env", "store")?,
        key_env: opt_string(hash, "key_env", "store")?,
        timeout_secs: opt_u64(hash, "timeout_secs", "store")?,
    })
}

fn parse_entity(value: &Yaml) -> SheetliftResult<EntityConfig> {
    let hash = yaml_hash(value, "entity")?;
    validate_known_keys(
        hash,
        "entity",
        &["name", "kind", "table", "source", "layout", "sink"],
    )?;

    let layout = match hash_get(hash, "layout") {
        Some(value) => Some(parse_layout(value)?),
        None => None,
    };

    Ok(EntityConfig {
        name: get_string(hash, "name", "entity")?,
        kind: get_string(hash, "kind", "entity")?,
        table: opt_string(hash, "table", "entity")?,
        source: parse_source(get_value(hash, "source", "entity")?)?,
        layout,
        sink: parse_sink(get_value(hash, "sink", "entity")?)?,
    })
}

fn entity_name_hint(value: &Yaml) -> Option<String> {
    let hash = value.as_hash()?;
    let name = hash_get(hash, "name")?;
    match name {
        Yaml::String(value) => Some(value.clone()),
        _ => None,
    }
}

fn format_entity_error(index: usize, name: Option<String>, err: &dyn std::error::Error) -> String {
    match name {
        Some(name) => format!("entities[{index}] (entity.name={name}): {err}"),
        None => format!("entities[{index}]: {err}"),
    }
}

fn parse_source(value: &Yaml) -> SheetliftResult<SourceConfig> {
    let hash = yaml_hash(value, "source")?;
    validate_known_keys(hash, "source", &["path", "sheet"])?;
    let sheet = match hash_get(hash, "sheet") {
        None | Some(Yaml::Null) => None,
        Some(value) => Some(parse_sheet(value)?),
    };
    Ok(SourceConfig {
        path: get_string(hash, "path", "source")?,
        sheet,
    })
}

/// `sheet: "NAME"` is shorthand for `sheet: { name: "NAME" }`.
fn parse_sheet(value: &Yaml) -> SheetliftResult<SheetSelector> {
    if let Yaml::String(name) = value {
        return Ok(SheetSelector::Exact(name.clone()));
    }
    let hash = yaml_hash(value, "source.sheet")?;
    validate_known_keys(hash, "source.sheet", &["name", "contains"])?;
    let name = opt_string(hash, "name", "source.sheet")?;
    let contains = opt_string(hash, "contains", "source.sheet")?;
    match (name, contains) {
        (Some(name), None) => Ok(SheetSelector::Exact(name)),
        (None, Some(fragment)) => Ok(SheetSelector::Contains(fragment)),
        _ => Err(Box::new(ConfigError(
            "source.sheet requires exactly one of name or contains".to_string(),
        ))),
    }
}

fn parse_layout(value: &Yaml) -> SheetliftResult<LayoutConfig> {
    let hash = yaml_hash(value, "layout")?;
    validate_known_keys(
        hash,
        "layout",
        &[
            "name",
            "value",
            "tax_id",
            "plate",
            "id",
            "cities",
            "state",
            "region",
            "status",
            "skip_rows",
        ],
    )?;
    let keys = hash
        .keys()
        .filter_map(|key| key.as_str().map(str::to_string))
        .collect();

    let cities = match hash_get(hash, "cities") {
        None | Some(Yaml::Null) => None,
        Some(value) => {
            let list = yaml_array(value, "layout.cities")?;
            let mut columns = Vec::with_capacity(list.len());
            for (index, item) in list.iter().enumerate() {
                columns.push(parse_column_ref(item, &format!("layout.cities[{index}]"))?);
            }
            Some(columns)
        }
    };

    Ok(LayoutConfig {
        keys,
        name: opt_column(hash, "name")?,
        value: opt_column(hash, "value")?,
        tax_id: opt_column(hash, "tax_id")?,
        plate: opt_column(hash, "plate")?,
        id: opt_column(hash, "id")?,
        cities,
        state: opt_string(hash, "state", "layout")?,
        region: opt_string(hash, "region", "layout")?,
        status: opt_string(hash, "status", "layout")?,
        skip_rows: opt_u64(hash, "skip_rows", "layout")?.map(|value| value as usize),
    })
}

fn opt_column(hash: &Hash, key: &str) -> SheetliftResult<Option<ColumnRef>> {
    match hash_get(hash, key) {
        None | Some(Yaml::Null) => Ok(None),
        Some(value) => Ok(Some(parse_column_ref(value, &format!("layout.{key}"))?)),
    }
}

/// Strings address a column by header text, integers by absolute position.
fn parse_column_ref(value: &Yaml, ctx: &str) -> SheetliftResult<ColumnRef> {
    match value {
        Yaml::String(name) if !name.trim().is_empty() => Ok(ColumnRef::Name(name.clone())),
        Yaml::Integer(position) if *position >= 0 => Ok(ColumnRef::Position(*position as usize)),
        _ => Err(Box::new(ConfigError(format!(
            "expected header name or column position at {ctx}"
        )))),
    }
}

fn parse_sink(value: &Yaml) -> SheetliftResult<SinkConfig> {
    let hash = yaml_hash(value, "sink")?;
    validate_known_keys(hash, "sink", &["kind", "path"])?;
    Ok(SinkConfig {
        kind: get_string(hash, "kind", "sink")?,
        path: opt_string(hash, "path", "sink")?,
    })
}

fn get_value<'a>(hash: &'a Hash, key: &str, ctx: &str) -> SheetliftResult<&'a Yaml> {
    hash_get(hash, key).ok_or_else(|| {
        Box::new(ConfigError(format!("missing required field {ctx}.{key}")))
            as Box<dyn std::error::Error + Send + Sync>
    })
}

fn get_string(hash: &Hash, key: &str, ctx: &str) -> SheetliftResult<String> {
    let value = get_value(hash, key, ctx)?;
    yaml_string(value, &format!("{ctx}.{key}"))
}

fn get_array<'a>(hash: &'a Hash, key: &str, ctx: &str) -> SheetliftResult<&'a Vec<Yaml>> {
    let value = get_value(hash, key, ctx)?;
    yaml_array(value, &format!("{ctx}.{key}"))
}

fn opt_string(hash: &Hash, key: &str, ctx: &str) -> SheetliftResult<Option<String>> {
    match hash_get(hash, key) {
        None | Some(Yaml::Null) | Some(Yaml::BadValue) => Ok(None),
        Some(value) => Ok(Some(yaml_string(value, &format!("{ctx}.{key}"))?)),
    }
}

fn opt_u64(hash: &Hash, key: &str, ctx: &str) -> SheetliftResult<Option<u64>> {
    match hash_get(hash, key) {
        None | Some(Yaml::Null) | Some(Yaml::BadValue) => Ok(None),
        Some(value) => Ok(Some(yaml_u64(value, &format!("{ctx}.{key}"))?)),
    }
}
