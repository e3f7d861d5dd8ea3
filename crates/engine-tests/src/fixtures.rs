use crate::scripted::ScriptedConnector;
use chrono::{NaiveDate, NaiveDateTime};
use engine_config::store::memory::MemoryStore;
use engine_core::{engine::PollingEngine, importer::MemoryImporter};
use model::{core::value::Value, records::row::RowData};
use serde_json::{Value as Json, json};
use std::sync::Arc;

pub const SOURCE_ID: u64 = 1;

/// A source node with the given children and `Timezone`.
pub fn source(timezone: &str, enabled: bool, children: Vec<Json>) -> Json {
    json!({
        "root": {
            "id": SOURCE_ID,
            "name": "plant-db",
            "class": "SQL Server",
            "attributes": {
                "Host": "db.plant.local",
                "Port": 3306,
                "Schema": "metering",
                "User": "reader",
                "Password": "secret",
                "Timezone": timezone,
                "Enable": enabled
            },
            "children": children
        }
    })
}

/// Column-mapped channel over a `readings` style table.
pub fn table_channel(id: u64, name: &str, table: &str, last_readout: Option<&str>, points: Vec<Json>) -> Json {
    let mut attributes = json!({
        "Table": table,
        "Column Timestamp": "ts",
        "Column Value": "val"
    });
    if let Some(sample) = last_readout {
        attributes["Last Readout"] = json!(sample);
    }
    json!({ "id": id, "name": name, "class": "SQL Channel", "attributes": attributes, "children": points })
}

pub fn templated_channel(id: u64, name: &str, query: &str, children: Vec<Json>) -> Json {
    json!({
        "id": id,
        "name": name,
        "class": "SQL Channel",
        "attributes": { "Query": query },
        "children": children
    })
}

pub fn data_point(id: u64, name: &str, target: i64) -> Json {
    json!({
        "id": id,
        "name": name,
        "class": "SQL Data Point",
        "attributes": { "Target": target }
    })
}

pub fn variable(id: u64, name: &str, position: usize, condition: &str) -> Json {
    json!({
        "id": id,
        "name": name,
        "class": "SQL Variable",
        "attributes": { "Position": position, "Variable Type": "string", "Condition": condition }
    })
}

/// Sets one more attribute on a node document.
pub fn with_attr(mut node: Json, name: &str, value: Json) -> Json {
    node["attributes"][name] = value;
    node
}

/// Wraps nodes in a directory of `class`.
pub fn directory(id: u64, class: &str, children: Vec<Json>) -> Json {
    json!({ "id": id, "name": format!("dir{id}"), "class": class, "children": children })
}

pub fn store(doc: Json) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_json(&doc.to_string()).expect("valid tree document"))
}

pub fn engine(
    store: &Arc<MemoryStore>,
    connector: ScriptedConnector,
) -> (PollingEngine, Arc<MemoryImporter>) {
    let importer = Arc::new(MemoryImporter::new());
    let engine = PollingEngine::new(
        store.clone(),
        store.root(),
        Arc::new(connector),
        importer.clone(),
    );
    (engine, importer)
}

pub fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, mi, s))
        .expect("valid date-time")
}

/// A `ts`/`val` row as the database hands it back.
pub fn reading(ts: NaiveDateTime, val: f64) -> RowData {
    RowData::from_pairs([("ts", Value::Timestamp(ts)), ("val", Value::Double(val))])
}
