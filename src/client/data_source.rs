use std::sync::Arc;

use crate::db::Database;

use super::connection::Connection;
use super::error::SqlError;
use super::properties::ConnectionProperties;

/// Where connections go.
#[derive(Clone)]
pub enum Target {
    /// An in-process database; each connection opens its own session.
    Local(Arc<Database>),
    /// A server address such as `127.0.0.1:9100`.
    Remote(String),
}

/// Factory of connections sharing one target and one set of properties.
#[derive(Clone)]
pub struct DataSource {
    target: Target,
    properties: ConnectionProperties,
}

impl DataSource {
    pub fn local(database: Arc<Database>) -> Self {
        Self {
            target: Target::Local(database),
            properties: ConnectionProperties::default(),
        }
    }

    pub fn remote(addr: impl Into<String>) -> Self {
        Self {
            target: Target::Remote(addr.into()),
            properties: ConnectionProperties::default(),
        }
    }

    pub fn with_properties(mut self, properties: ConnectionProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn properties(&self) -> &ConnectionProperties {
        &self.properties
    }

    /// Opens a connection with the data source's properties.
    pub async fn get_connection(&self) -> Result<Connection, SqlError> {
        Connection::connect(&self.target, self.properties.clone()).await
    }
}
