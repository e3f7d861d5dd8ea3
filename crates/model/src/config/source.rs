use chrono_tz::Tz;
use std::{fmt, time::Duration};

/// Connection settings of the database a connector polls.
#[derive(Clone)]
pub struct SourceConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub schema: String,
    pub user: String,
    pub password: String,
    pub connection_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub timezone: Tz,
    pub enabled: bool,
}

impl SourceConfig {
    pub fn new(name: &str, host: &str, port: u16, schema: &str) -> Self {
        SourceConfig {
            name: name.to_string(),
            host: host.to_string(),
            port,
            schema: schema.to_string(),
            user: String::new(),
            password: String::new(),
            connection_timeout: None,
            read_timeout: None,
            timezone: Tz::UTC,
            enabled: true,
        }
    }
}

// Hand-written so the password never ends up in logs.
impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connection_timeout", &self.connection_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("timezone", &self.timezone)
            .field("enabled", &self.enabled)
            .finish()
    }
}
