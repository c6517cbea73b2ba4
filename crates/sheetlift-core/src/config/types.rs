use crate::io::{ColumnRef, SheetSelector};
use crate::model::EntityKind;
use crate::normalize::EntityLayout;
use crate::sink::SinkKind;
use crate::{ConfigError, SheetliftResult};

#[derive(Debug)]
pub struct RootConfig {
    pub version: String,
    pub report: Option<ReportConfig>,
    pub store: Option<StoreConfig>,
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug)]
pub struct ReportConfig {
    pub path: String,
}

/// Connection settings for `sink.kind: direct`. The API key is never stored in
/// the file; `key_env` names the variable holding it.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub url_env: Option<String>,
    pub key_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug)]
pub struct EntityConfig {
    pub name: String,
    pub kind: String,
    pub table: Option<String>,
    pub source: SourceConfig,
    pub layout: Option<LayoutConfig>,
    pub sink: SinkConfig,
}

impl EntityConfig {
    pub fn entity_kind(&self) -> SheetliftResult<EntityKind> {
        EntityKind::parse(&self.kind).ok_or_else(|| {
            Box::new(ConfigError(format!(
                "entity.name={} kind={} is unsupported",
                self.name, self.kind
            ))) as Box<dyn std::error::Error + Send + Sync>
        })
    }

    pub fn table_name(&self) -> SheetliftResult<String> {
        match &self.table {
            Some(table) => Ok(table.clone()),
            None => Ok(self.entity_kind()?.default_table().to_string()),
        }
    }

    pub fn sheet_selector(&self) -> SheetliftResult<SheetSelector> {
        match &self.source.sheet {
            Some(selector) => Ok(selector.clone()),
            None => Ok(default_sheet(self.entity_kind()?)),
        }
    }

    pub fn sink_kind(&self) -> SheetliftResult<SinkKind> {
        SinkKind::parse(&self.sink.kind).ok_or_else(|| {
            Box::new(ConfigError(format!(
                "entity.name={} sink.kind={} is unsupported",
                self.name, self.sink.kind
            ))) as Box<dyn std::error::Error + Send + Sync>
        })
    }

    /// Default layout for the kind with the configured overrides applied.
    pub fn entity_layout(&self) -> SheetliftResult<EntityLayout> {
        let layout = EntityLayout::default_for(self.entity_kind()?);
        Ok(match &self.layout {
            Some(overrides) => overrides.apply(layout),
            None => layout,
        })
    }
}

/// Sheet names used by the legacy workbooks.
pub fn default_sheet(kind: EntityKind) -> SheetSelector {
    match kind {
        EntityKind::CitySurcharge => SheetSelector::Exact("ACRÉSCIMOS".to_string()),
        EntityKind::Driver => SheetSelector::Exact("CADASTRO".to_string()),
        EntityKind::Route => SheetSelector::Exact("CIDADES DA ROTA".to_string()),
    }
}

#[derive(Debug)]
pub struct SourceConfig {
    pub path: String,
    pub sheet: Option<SheetSelector>,
}

#[derive(Debug, Default)]
pub struct LayoutConfig {
    /// Keys present in the file, in order; used to reject keys that do not
    /// belong to the entity kind.
    pub keys: Vec<String>,
    pub name: Option<ColumnRef>,
    pub value: Option<ColumnRef>,
    pub tax_id: Option<ColumnRef>,
    pub plate: Option<ColumnRef>,
    pub id: Option<ColumnRef>,
    pub cities: Option<Vec<ColumnRef>>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub status: Option<String>,
    pub skip_rows: Option<usize>,
}

impl LayoutConfig {
    pub fn allowed_keys(kind: EntityKind) -> &'static [&'static str] {
        match kind {
            EntityKind::CitySurcharge => &["name", "value", "state", "region", "skip_rows"],
            EntityKind::Driver => &["name", "tax_id", "plate", "skip_rows"],
            EntityKind::Route => &["id", "value", "cities", "status", "skip_rows"],
        }
    }

    pub fn apply(&self, layout: EntityLayout) -> EntityLayout {
        match layout {
            EntityLayout::City(mut city) => {
                override_with(&mut city.name, &self.name);
                override_with(&mut city.value, &self.value);
                override_with(&mut city.state, &self.state);
                override_with(&mut city.region, &self.region);
                override_with(&mut city.skip_rows, &self.skip_rows);
                EntityLayout::City(city)
            }
            EntityLayout::Driver(mut driver) => {
                override_with(&mut driver.name, &self.name);
                override_with(&mut driver.tax_id, &self.tax_id);
                override_with(&mut driver.plate, &self.plate);
                override_with(&mut driver.skip_rows, &self.skip_rows);
                EntityLayout::Driver(driver)
            }
            EntityLayout::Route(mut route) => {
                override_with(&mut route.id, &self.id);
                override_with(&mut route.value, &self.value);
                override_with(&mut route.cities, &self.cities);
                override_with(&mut route.status, &self.status);
                override_with(&mut route.skip_rows, &self.skip_rows);
                EntityLayout::Route(route)
            }
        }
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

#[derive(Debug)]
pub struct SinkConfig {
    pub kind: String,
    pub path: Option<String>,
}
