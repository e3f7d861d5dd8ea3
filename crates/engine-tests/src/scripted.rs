use async_trait::async_trait;
use connectors::{
    connector::Connector,
    sql::base::{
        adapter::SqlAdapter,
        error::{ConnectorError, DbError},
        statement::PreparedQuery,
    },
};
use model::{config::source::SourceConfig, core::value::Value, records::row::RowData};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::Mutex;

/// A statement as the database received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone)]
enum Response {
    Rows(Vec<RowData>),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    contains: String,
    param: Option<Value>,
    response: Response,
}

/// Canned answers keyed by a SQL fragment and optionally the first bound
/// parameter. Statements nothing matches return no rows.
#[derive(Debug, Clone, Default)]
pub struct Script {
    rules: Vec<Rule>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(mut self, contains: &str, rows: Vec<RowData>) -> Self {
        self.rules.push(Rule {
            contains: contains.to_string(),
            param: None,
            response: Response::Rows(rows),
        });
        self
    }

    pub fn rows_for(mut self, contains: &str, param: Value, rows: Vec<RowData>) -> Self {
        self.rules.push(Rule {
            contains: contains.to_string(),
            param: Some(param),
            response: Response::Rows(rows),
        });
        self
    }

    pub fn fail(mut self, contains: &str, message: &str) -> Self {
        self.rules.push(Rule {
            contains: contains.to_string(),
            param: None,
            response: Response::Fail(message.to_string()),
        });
        self
    }

    fn answer(&self, sql: &str, params: &[Value]) -> Response {
        self.rules
            .iter()
            .find(|rule| {
                sql.contains(&rule.contains)
                    && rule.param.as_ref().is_none_or(|p| params.first() == Some(p))
            })
            .map(|rule| rule.response.clone())
            .unwrap_or(Response::Rows(Vec::new()))
    }
}

/// Shared view of everything the scripted database saw.
#[derive(Debug, Default)]
pub struct Journal {
    executed: Mutex<Vec<Executed>>,
    connects: AtomicUsize,
    closed: AtomicBool,
}

impl Journal {
    pub async fn executed(&self) -> Vec<Executed> {
        self.executed.lock().await.clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct ScriptedAdapter {
    script: Script,
    journal: Arc<Journal>,
}

#[async_trait]
impl SqlAdapter for ScriptedAdapter {
    async fn query(&self, query: &PreparedQuery) -> Result<Vec<RowData>, DbError> {
        if self.journal.closed() {
            return Err(DbError::Closed);
        }

        // unbound slots fail here, as they would in a driver
        let params = query.params()?;
        self.journal.executed.lock().await.push(Executed {
            sql: query.sql().to_string(),
            params: params.clone(),
        });

        match self.script.answer(query.sql(), &params) {
            Response::Rows(rows) => Ok(rows),
            Response::Fail(message) => Err(DbError::Unknown(message)),
        }
    }

    async fn close(&self) -> Result<(), DbError> {
        self.journal.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`ScriptedAdapter`]s, or refuses to connect.
pub struct ScriptedConnector {
    script: Script,
    journal: Arc<Journal>,
    unreachable: bool,
}

impl ScriptedConnector {
    pub fn new(script: Script) -> Self {
        ScriptedConnector {
            script,
            journal: Arc::new(Journal::default()),
            unreachable: false,
        }
    }

    pub fn unreachable() -> Self {
        ScriptedConnector {
            unreachable: true,
            ..Self::new(Script::new())
        }
    }

    pub fn journal(&self) -> Arc<Journal> {
        self.journal.clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _source: &SourceConfig) -> Result<Box<dyn SqlAdapter>, ConnectorError> {
        self.journal.connects.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(ConnectorError::Timeout(Duration::from_secs(5)));
        }

        Ok(Box::new(ScriptedAdapter {
            script: self.script.clone(),
            journal: self.journal.clone(),
        }))
    }
}
