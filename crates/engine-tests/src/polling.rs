#[cfg(test)]
mod tests {
    use crate::{
        fixtures::{
            at, data_point, directory, engine, reading, source, store, table_channel,
            templated_channel, variable, with_attr,
        },
        scripted::{Script, ScriptedConnector},
    };
    use chrono::{TimeZone, Utc};
    use engine_config::store::{ConfigStore, memory::MemoryStore};
    use engine_core::{error::RunError, report::ChannelOutcome};
    use model::{
        config::NodeId,
        core::{value::Value, watermark::Watermark},
        records::row::{FieldValue, RowData},
    };
    use serde_json::json;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    async fn last_readout(store: &MemoryStore, channel: u64) -> Option<String> {
        store
            .attribute(NodeId(channel), "Last Readout")
            .await
            .expect("channel exists")
    }

    // Scenario: a column-mapped channel with a watermark of 2023-01-01 and
    // two newer rows.
    // Expected Outcome:
    // - One record per row is imported in a single batch.
    // - The watermark moves to the newest row and is written back.
    #[traced_test]
    #[tokio::test]
    async fn imports_new_rows_and_advances_watermark() {
        let store = store(source(
            "UTC",
            true,
            vec![table_channel(
                10,
                "readings",
                "readings",
                Some("2023-01-01 00:00:00"),
                vec![data_point(11, "meter", 42)],
            )],
        ));
        let script = Script::new().rows(
            "from readings",
            vec![
                reading(at(2023, 1, 2, 0, 0, 0), 1.5),
                reading(at(2023, 1, 3, 0, 0, 0), 2.5),
            ],
        );
        let connector = ScriptedConnector::new(script);
        let journal = connector.journal();
        let (engine, importer) = engine(&store, connector);

        let report = engine.run().await.expect("run succeeds");

        let executed = journal.executed().await;
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0].sql,
            "select ts, val from readings where ts > '2023-01-01 00:00:00';"
        );

        let batches = importer.batches().await;
        assert_eq!(batches.len(), 1);
        let records = &batches[0];
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.target_id() == 42));
        assert!(records.iter().all(|r| r.target_attribute() == "Value"));
        assert_eq!(records[0].value(), &Value::Double(1.5));
        assert_eq!(
            records[1].timestamp(),
            Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap()
        );

        let channel = report.channel("readings").expect("channel reported");
        assert_eq!(
            channel.outcome,
            ChannelOutcome::Completed {
                imported: 2,
                skipped: 0,
                previous: Watermark::new(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
                current: Watermark::new(Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap()),
            }
        );
        assert_eq!(
            last_readout(&store, 10).await.as_deref(),
            Some("2023-01-03 00:00:00")
        );
        assert!(journal.closed());
    }

    // Scenario: the first channel's query fails, the second one has rows.
    // Expected Outcome: the run still succeeds and the second channel is
    // imported; the failed channel keeps its watermark.
    #[traced_test]
    #[tokio::test]
    async fn failing_channel_does_not_stop_the_run() {
        let store = store(source(
            "UTC",
            true,
            vec![
                table_channel(10, "broken", "missing_table", None, vec![data_point(11, "a", 1)]),
                table_channel(20, "readings", "readings", None, vec![data_point(21, "b", 2)]),
            ],
        ));
        let script = Script::new()
            .fail("from missing_table", "Table 'metering.missing_table' doesn't exist")
            .rows("from readings", vec![reading(at(2023, 5, 1, 12, 0, 0), 7.0)]);
        let (engine, importer) = engine(&store, ScriptedConnector::new(script));

        let report = engine.run().await.expect("run succeeds");

        assert_eq!(report.channels.len(), 2);
        assert_eq!(report.failed(), 1);
        assert!(report.channel("broken").is_some_and(|c| c.is_failed()));
        assert_eq!(report.channel("readings").map(|c| c.imported()), Some(1));

        assert_eq!(importer.records().await.len(), 1);
        assert_eq!(last_readout(&store, 10).await, None);
        assert_eq!(
            last_readout(&store, 20).await.as_deref(),
            Some("2023-05-01 12:00:00")
        );
    }

    // Scenario: a data point on a templated channel names no columns.
    // Expected Outcome: only that channel fails, nothing is executed for it.
    #[traced_test]
    #[tokio::test]
    async fn unresolved_data_point_fails_only_its_channel() {
        let store = store(source(
            "UTC",
            true,
            vec![
                templated_channel(10, "custom", "select * from readings", vec![data_point(11, "bare", 1)]),
                table_channel(20, "readings", "readings", None, vec![data_point(21, "b", 2)]),
            ],
        ));
        let connector = ScriptedConnector::new(Script::new());
        let journal = connector.journal();
        let (engine, _importer) = engine(&store, connector);

        let report = engine.run().await.expect("run succeeds");

        assert!(report.channel("custom").is_some_and(|c| c.is_failed()));
        assert!(report.channel("readings").is_some_and(|c| !c.is_failed()));
        let executed = journal.executed().await;
        assert_eq!(executed.len(), 1);
        assert!(executed[0].sql.contains("from readings where"));
    }

    #[tokio::test]
    async fn disabled_source_is_not_polled() {
        let store = store(source(
            "UTC",
            false,
            vec![table_channel(10, "readings", "readings", None, vec![data_point(11, "a", 1)])],
        ));
        let connector = ScriptedConnector::new(Script::new());
        let journal = connector.journal();
        let (engine, importer) = engine(&store, connector);

        let report = engine.run().await.expect("run succeeds");

        assert!(report.disabled);
        assert!(report.channels.is_empty());
        assert_eq!(journal.connects(), 0);
        assert!(importer.batches().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_database_fails_the_run() {
        let store = store(source(
            "UTC",
            true,
            vec![table_channel(10, "readings", "readings", None, vec![data_point(11, "a", 1)])],
        ));
        let (engine, importer) = engine(&store, ScriptedConnector::unreachable());

        let result = engine.run().await;

        assert!(matches!(result, Err(RunError::Connection(_))));
        assert!(importer.batches().await.is_empty());
        assert_eq!(last_readout(&store, 10).await, None);
    }

    #[tokio::test]
    async fn source_without_host_fails_the_run() {
        let mut doc = source("UTC", true, Vec::new());
        doc["root"]["attributes"]["Host"] = json!(null);
        let store = store(doc);
        let connector = ScriptedConnector::new(Script::new());
        let journal = connector.journal();
        let (engine, _importer) = engine(&store, connector);

        assert!(matches!(
            engine.run().await,
            Err(RunError::Configuration(_))
        ));
        assert_eq!(journal.connects(), 0);
    }

    // Scenario: templated channel whose only variable is the last readout,
    // on a channel that never imported anything.
    // Expected Outcome: the epoch is bound as text in the source timezone.
    #[tokio::test]
    async fn templated_channel_binds_epoch_in_source_timezone() {
        for (zone, expected) in [
            ("UTC", "1970-01-01 00:00:00"),
            ("Europe/Berlin", "1970-01-01 01:00:00"),
        ] {
            let point = with_attr(
                with_attr(
                    with_attr(data_point(11, "meter", 42), "Timestamp Column", json!("ts")),
                    "Value Column",
                    json!("val"),
                ),
                "Timestamp Type",
                json!("timestamp"),
            );
            let store = store(source(
                zone,
                true,
                vec![templated_channel(
                    10,
                    "custom",
                    "select ts, val from readings where ts > ?",
                    vec![point, variable(12, "since", 1, "lastreadout")],
                )],
            ));
            let connector = ScriptedConnector::new(Script::new());
            let journal = connector.journal();
            let (engine, _importer) = engine(&store, connector);

            let report = engine.run().await.expect("run succeeds");
            assert_eq!(report.failed(), 0);

            let executed = journal.executed().await;
            assert_eq!(executed.len(), 1);
            assert_eq!(executed[0].sql, "select ts, val from readings where ts > ?;");
            assert_eq!(executed[0].params, vec![Value::String(expected.into())]);
        }
    }

    // Scenario: the query has two slots but only one variable.
    // Expected Outcome: the channel fails at execution, nothing is imported.
    #[tokio::test]
    async fn unbound_slot_fails_the_channel() {
        let point = with_attr(
            with_attr(data_point(11, "meter", 42), "Timestamp Column", json!("ts")),
            "Value Column",
            json!("val"),
        );
        let point = with_attr(point, "Timestamp Type", json!("timestamp"));
        let store = store(source(
            "UTC",
            true,
            vec![templated_channel(
                10,
                "custom",
                "select ts, val from readings where ts > ? and site = ?",
                vec![point, variable(12, "since", 1, "lastreadout")],
            )],
        ));
        let script = Script::new().rows("from readings", vec![reading(at(2023, 1, 2, 0, 0, 0), 1.0)]);
        let (engine, importer) = engine(&store, ScriptedConnector::new(script));

        let report = engine.run().await.expect("run succeeds");

        assert!(report.channel("custom").is_some_and(|c| c.is_failed()));
        assert!(importer.batches().await.is_empty());
        assert_eq!(last_readout(&store, 10).await, None);
    }

    // Scenario: a channel with an id column and two data points.
    // Expected Outcome: the query runs once per data point with its id
    // bound; each point only gets the rows of its own id.
    #[traced_test]
    #[tokio::test]
    async fn id_column_runs_once_per_data_point() {
        let channel = with_attr(
            table_channel(
                10,
                "sensors",
                "sensor_log",
                None,
                vec![
                    with_attr(data_point(11, "north", 100), "ID", json!("N-1")),
                    with_attr(data_point(12, "south", 200), "ID", json!("S-1")),
                ],
            ),
            "Column ID",
            json!("sensor"),
        );
        let store = store(source("UTC", true, vec![channel]));

        let row = |sensor: &str, ts, val| {
            let mut row = reading(ts, val);
            row.field_values.insert(
                0,
                FieldValue {
                    name: "sensor".into(),
                    value: Value::String(sensor.into()),
                },
            );
            row
        };
        let script = Script::new()
            .rows_for(
                "from sensor_log",
                Value::String("N-1".into()),
                vec![row("N-1", at(2023, 1, 2, 0, 0, 0), 1.0)],
            )
            .rows_for(
                "from sensor_log",
                Value::String("S-1".into()),
                vec![
                    row("S-1", at(2023, 1, 2, 0, 0, 0), 2.0),
                    row("S-1", at(2023, 1, 4, 0, 0, 0), 3.0),
                ],
            );
        let connector = ScriptedConnector::new(script);
        let journal = connector.journal();
        let (engine, importer) = engine(&store, connector);

        let report = engine.run().await.expect("run succeeds");

        let executed = journal.executed().await;
        assert_eq!(executed.len(), 2);
        assert!(executed.iter().all(|e| e.sql
            == "select sensor, ts, val from sensor_log where ts > '1970-01-01 00:00:00' and sensor = ?;"));
        let ids: Vec<_> = executed.iter().map(|e| e.params.clone()).collect();
        assert!(ids.contains(&vec![Value::String("N-1".into())]));
        assert!(ids.contains(&vec![Value::String("S-1".into())]));

        let records = importer.records().await;
        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().filter(|r| r.target_id() == 100).count(), 1);
        assert_eq!(records.iter().filter(|r| r.target_id() == 200).count(), 2);
        // one import per channel
        assert_eq!(importer.batches().await.len(), 1);

        assert_eq!(report.imported(), 3);
        assert_eq!(
            last_readout(&store, 10).await.as_deref(),
            Some("2023-01-04 00:00:00")
        );
    }

    #[tokio::test]
    async fn id_column_requires_data_point_ids() {
        let channel = with_attr(
            table_channel(10, "sensors", "sensor_log", None, vec![data_point(11, "anonymous", 1)]),
            "Column ID",
            json!("sensor"),
        );
        let store = store(source("UTC", true, vec![channel]));
        let connector = ScriptedConnector::new(Script::new());
        let journal = connector.journal();
        let (engine, _importer) = engine(&store, connector);

        let report = engine.run().await.expect("run succeeds");

        assert!(report.channel("sensors").is_some_and(|c| c.is_failed()));
        assert!(journal.executed().await.is_empty());
    }

    // Scenario: two data points share one result set, one row has no value.
    // Expected Outcome: never more records than rows times data points;
    // the bad row is skipped for every point.
    #[traced_test]
    #[tokio::test]
    async fn bad_rows_are_skipped_per_data_point() {
        let store = store(source(
            "UTC",
            true,
            vec![table_channel(
                10,
                "readings",
                "readings",
                None,
                vec![data_point(11, "a", 1), data_point(12, "b", 2)],
            )],
        ));
        let broken = RowData::from_pairs([
            ("ts", Value::Timestamp(at(2023, 1, 9, 0, 0, 0))),
            ("val", Value::Null),
        ]);
        let script = Script::new().rows(
            "from readings",
            vec![
                reading(at(2023, 1, 2, 0, 0, 0), 1.0),
                broken,
                reading(at(2023, 1, 3, 0, 0, 0), 2.0),
            ],
        );
        let (engine, importer) = engine(&store, ScriptedConnector::new(script));

        let report = engine.run().await.expect("run succeeds");

        let records = importer.records().await;
        assert!(records.len() <= 3 * 2);
        assert_eq!(records.len(), 4);
        match &report.channel("readings").expect("reported").outcome {
            ChannelOutcome::Completed { imported, skipped, .. } => {
                assert_eq!(*imported, 4);
                assert_eq!(*skipped, 2);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        // the skipped row is newer but does not move the watermark
        assert_eq!(
            last_readout(&store, 10).await.as_deref(),
            Some("2023-01-03 00:00:00")
        );
    }

    #[tokio::test]
    async fn no_rows_keeps_watermark_and_skips_import() {
        let store = store(source(
            "UTC",
            true,
            vec![table_channel(
                10,
                "readings",
                "readings",
                Some("2023-01-01 00:00:00"),
                vec![data_point(11, "a", 1)],
            )],
        ));
        let (engine, importer) = engine(&store, ScriptedConnector::new(Script::new()));

        let report = engine.run().await.expect("run succeeds");

        assert_eq!(report.failed(), 0);
        assert_eq!(report.imported(), 0);
        assert!(importer.batches().await.is_empty());
        assert_eq!(
            last_readout(&store, 10).await.as_deref(),
            Some("2023-01-01 00:00:00")
        );
    }

    // Scenario: channels and data points sit below nested directories.
    // Expected Outcome: all of them are discovered and polled.
    #[tokio::test]
    async fn discovers_channels_in_nested_directories() {
        let store = store(source(
            "UTC",
            true,
            vec![directory(
                2,
                "SQL Channel Directory",
                vec![
                    table_channel(10, "outer", "outer_log", None, vec![data_point(11, "a", 1)]),
                    directory(
                        3,
                        "SQL Channel Directory",
                        vec![table_channel(
                            20,
                            "inner",
                            "inner_log",
                            None,
                            vec![directory(
                                4,
                                "SQL Data Point Directory",
                                vec![data_point(21, "b", 2)],
                            )],
                        )],
                    ),
                ],
            )],
        ));
        let script = Script::new()
            .rows("from outer_log", vec![reading(at(2023, 1, 2, 0, 0, 0), 1.0)])
            .rows("from inner_log", vec![reading(at(2023, 1, 2, 0, 0, 0), 2.0)]);
        let (engine, importer) = engine(&store, ScriptedConnector::new(script));

        let report = engine.run().await.expect("run succeeds");

        assert_eq!(report.channels.len(), 2);
        assert_eq!(report.failed(), 0);
        let mut targets: Vec<_> = importer
            .records()
            .await
            .iter()
            .map(|r| r.target_id())
            .collect();
        targets.sort();
        assert_eq!(targets, vec![1, 2]);
    }

    // Scenario: two runs over the same tree, saved to disk in between.
    // Expected Outcome: the second run starts from the persisted watermark.
    #[tokio::test]
    async fn second_run_resumes_from_saved_tree() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("tree.json");

        let first = store(source(
            "Europe/Berlin",
            true,
            vec![table_channel(10, "readings", "readings", None, vec![data_point(11, "a", 1)])],
        ));
        let script = Script::new().rows("from readings", vec![reading(at(2023, 1, 3, 0, 0, 0), 1.0)]);
        let (engine_one, _importer) = engine(&first, ScriptedConnector::new(script));
        engine_one.run().await.expect("first run");
        first.save(&path).await.expect("tree saved");

        let second = std::sync::Arc::new(MemoryStore::load(&path).await.expect("tree loaded"));
        assert_eq!(
            last_readout(&second, 10).await.as_deref(),
            Some("2023-01-03 00:00:00")
        );

        let connector = ScriptedConnector::new(Script::new());
        let journal = connector.journal();
        let (engine_two, importer) = engine(&second, connector);
        engine_two.run().await.expect("second run");

        let executed = journal.executed().await;
        assert_eq!(executed.len(), 1);
        assert!(executed[0].sql.contains("ts > '2023-01-03 00:00:00'"));
        assert!(importer.batches().await.is_empty());
    }
}
