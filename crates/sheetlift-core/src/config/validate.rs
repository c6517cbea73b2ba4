use std::collections::HashSet;

use crate::config::{EntityConfig, LayoutConfig, RootConfig};
use crate::io::SheetSelector;
use crate::model::EntityKind;
use crate::sink::SinkKind;
use crate::{ConfigError, SheetliftResult};

const ALLOWED_KINDS: &[&str] = &["city_surcharge", "driver", "route"];

pub(crate) fn validate_config(config: &RootConfig) -> SheetliftResult<()> {
    if config.entities.is_empty() {
        return Err(Box::new(ConfigError(
            "entities list is empty (at least one entity is required)".to_string(),
        )));
    }

    if let Some(store) = &config.store {
        if store.timeout_secs == Some(0) {
            return Err(Box::new(ConfigError(
                "store.timeout_secs must be greater than 0".to_string(),
            )));
        }
    }

    let mut names = HashSet::new();
    for entity in &config.entities {
        validate_entity(config, entity)?;
        if !names.insert(entity.name.as_str()) {
            return Err(Box::new(ConfigError(format!(
                "entity.name={} is duplicated in config",
                entity.name
            ))));
        }
    }

    Ok(())
}

fn validate_entity(config: &RootConfig, entity: &EntityConfig) -> SheetliftResult<()> {
    if entity.name.trim().is_empty() {
        return Err(Box::new(ConfigError(
            "entity.name must not be empty".to_string(),
        )));
    }
    let Some(kind) = EntityKind::parse(&entity.kind) else {
        return Err(Box::new(ConfigError(format!(
            "entity.name={} kind={} is unsupported (allowed: {})",
            entity.name,
            entity.kind,
            ALLOWED_KINDS.join(", ")
        ))));
    };
    if let Some(table) = &entity.table {
        if !is_identifier(table) {
            return Err(Box::new(ConfigError(format!(
                "entity.name={} table={} is not a valid table name",
                entity.name, table
            ))));
        }
    }
    validate_source(entity)?;
    if let Some(layout) = &entity.layout {
        validate_layout(entity, kind, layout)?;
    }
    validate_sink(config, entity)?;
    Ok(())
}

fn validate_source(entity: &EntityConfig) -> SheetliftResult<()> {
    if entity.source.path.trim().is_empty() {
        return Err(Box::new(ConfigError(format!(
            "entity.name={} source.path must not be empty",
            entity.name
        ))));
    }
    let selector = match &entity.source.sheet {
        Some(SheetSelector::Exact(value)) | Some(SheetSelector::Contains(value)) => value,
        None => return Ok(()),
    };
    if selector.trim().is_empty() {
        return Err(Box::new(ConfigError(format!(
            "entity.name={} source.sheet must not be empty",
            entity.name
        ))));
    }
    Ok(())
}

fn validate_layout(
    entity: &EntityConfig,
    kind: EntityKind,
    layout: &LayoutConfig,
) -> SheetliftResult<()> {
    let allowed = LayoutConfig::allowed_keys(kind);
    for key in &layout.keys {
        if !allowed.contains(&key.as_str()) {
            return Err(Box::new(ConfigError(format!(
                "entity.name={} layout.{} does not apply to kind={} (allowed: {})",
                entity.name,
                key,
                kind,
                allowed.join(", ")
            ))));
        }
    }
    if matches!(&layout.cities, Some(cities) if cities.is_empty()) {
        return Err(Box::new(ConfigError(format!(
            "entity.name={} layout.cities must list at least one column",
            entity.name
        ))));
    }
    Ok(())
}

fn validate_sink(config: &RootConfig, entity: &EntityConfig) -> SheetliftResult<()> {
    let Some(kind) = SinkKind::parse(&entity.sink.kind) else {
        return Err(Box::new(ConfigError(format!(
            "entity.name={} sink.kind={} is unsupported (allowed: {})",
            entity.name,
            entity.sink.kind,
            SinkKind::ALLOWED.join(", ")
        ))));
    };
    match kind {
        SinkKind::BatchFile => {
            let has_path = entity
                .sink
                .path
                .as_deref()
                .is_some_and(|path| !path.trim().is_empty());
            if !has_path {
                return Err(Box::new(ConfigError(format!(
                    "entity.name={} sink.path is required when sink.kind=batch_file",
                    entity.name
                ))));
            }
        }
        SinkKind::Direct => {
            if config.store.is_none() {
                return Err(Box::new(ConfigError(format!(
                    "entity.name={} sink.kind=direct requires a root store section",
                    entity.name
                ))));
            }
            if entity.sink.path.is_some() {
                return Err(Box::new(ConfigError(format!(
                    "entity.name={} sink.path is only used when sink.kind=batch_file",
                    entity.name
                ))));
            }
        }
    }
    Ok(())
}

fn is_identifier(value: &str) -> bool {
    let mut parts = value.split('.');
    parts.all(|part| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}
