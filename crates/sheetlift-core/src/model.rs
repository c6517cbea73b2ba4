use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    CitySurcharge,
    Driver,
    Route,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::CitySurcharge, EntityKind::Driver, EntityKind::Route];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::CitySurcharge => "city_surcharge",
            EntityKind::Driver => "driver",
            EntityKind::Route => "route",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "city_surcharge" | "city" | "cities" => Some(EntityKind::CitySurcharge),
            "driver" | "drivers" => Some(EntityKind::Driver),
            "route" | "routes" => Some(EntityKind::Route),
            _ => None,
        }
    }

    pub fn default_table(self) -> &'static str {
        match self {
            EntityKind::CitySurcharge => "cities",
            EntityKind::Driver => "drivers",
            EntityKind::Route => "routes",
        }
    }

    pub fn key_column(self) -> &'static str {
        match self {
            EntityKind::CitySurcharge | EntityKind::Driver => "name",
            EntityKind::Route => "id",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySurcharge {
    pub name: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub value: f64,
    #[serde(rename = "type")]
    pub surcharge_type: String,
    pub state: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Driver {
    pub name: String,
    pub tax_id: Option<String>,
    pub plate: Option<String>,
    pub status: String,
    pub monthly_routes: u64,
    #[serde(serialize_with = "serialize_decimal")]
    pub revenue: f64,
    #[serde(serialize_with = "serialize_decimal")]
    pub rate_per_km: f64,
    #[serde(serialize_with = "serialize_decimal")]
    pub rate_per_stop: f64,
}

impl Driver {
    pub fn new(name: String, tax_id: Option<String>, plate: Option<String>) -> Self {
        Self {
            name,
            tax_id,
            plate,
            status: "active".to_string(),
            monthly_routes: 0,
            revenue: 0.0,
            rate_per_km: 0.0,
            rate_per_stop: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCity {
    pub name: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub id: String,
    pub origin: String,
    pub destination: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub value: f64,
    pub cities: Vec<RouteCity>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    City(CitySurcharge),
    Driver(Driver),
    Route(Route),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::City(_) => EntityKind::CitySurcharge,
            Entity::Driver(_) => EntityKind::Driver,
            Entity::Route(_) => EntityKind::Route,
        }
    }

    pub fn natural_key(&self) -> &str {
        match self {
            Entity::City(city) => &city.name,
            Entity::Driver(driver) => &driver.name,
            Entity::Route(route) => &route.id,
        }
    }
}

/// Locale-free decimal text: `.` as decimal point, no grouping, no exponent,
/// and whole numbers without a fractional part.
pub fn format_decimal(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

fn serialize_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
