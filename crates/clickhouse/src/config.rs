//! ClickHouse configuration.

use serde::{Deserialize, Serialize};

/// ClickHouse client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL
    pub url: String,
    /// Database name
    #[serde(default = "default_database")]
    pub database: String,
    /// Username (optional)
    pub username: Option<String>,
    /// Password (optional)
    pub password: Option<String>,
    /// Query timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub tables: TableNames,
}

/// Table names, all within `database`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNames {
    /// Resolved coordinates, keyed by area
    #[serde(default = "default_geocode_table")]
    pub geocode: String,
    /// Resolved daily weather, keyed by (area, date)
    #[serde(default = "default_weather_table")]
    pub weather: String,
    /// Upstream customer dimension (must have an `area` column)
    #[serde(default = "default_customers_table")]
    pub customers: String,
    /// Upstream orders (must have an `order_date` column)
    #[serde(default = "default_orders_table")]
    pub orders: String,
}

fn default_database() -> String {
    "enrichment".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_geocode_table() -> String {
    "area_geocode".to_string()
}

fn default_weather_table() -> String {
    "weather_daily".to_string()
}

fn default_customers_table() -> String {
    "customers".to_string()
}

fn default_orders_table() -> String {
    "orders".to_string()
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            geocode: default_geocode_table(),
            weather: default_weather_table(),
            customers: default_customers_table(),
            orders: default_orders_table(),
        }
    }
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            database: default_database(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            tables: TableNames::default(),
        }
    }
}

impl ClickHouseConfig {
    /// `database.table`
    pub fn qualified(&self, table: &str) -> String {
        format!("{}.{}", self.database, table)
    }
}
