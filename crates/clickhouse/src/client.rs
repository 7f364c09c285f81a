//! ClickHouse client wrapper.

use crate::config::ClickHouseConfig;
use clickhouse::Client;
use enrich_core::Result;
use tracing::info;

/// ClickHouse client wrapper. Cheap to clone; clones share the HTTP pool.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Creates a new ClickHouse client.
    ///
    /// The database is not selected on the connection so that schema setup
    /// can create it; every statement uses qualified table names instead.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        let mut client = Client::default()
            .with_url(&config.url)
            .with_option("max_execution_time", config.timeout_secs.to_string());

        if let Some(ref user) = config.username {
            client = client.with_user(user);
        }

        if let Some(ref pass) = config.password {
            client = client.with_password(pass);
        }

        info!(
            url = %config.url,
            database = %config.database,
            "Created ClickHouse client"
        );

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Returns the inner clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    pub fn geocode_table(&self) -> String {
        self.config.qualified(&self.config.tables.geocode)
    }

    pub fn weather_table(&self) -> String {
        self.config.qualified(&self.config.tables.weather)
    }

    pub fn customers_table(&self) -> String {
        self.config.qualified(&self.config.tables.customers)
    }

    pub fn orders_table(&self) -> String {
        self.config.qualified(&self.config.tables.orders)
    }
}
