use crate::{
    context::{ChannelPlan, ChannelStage, PlannedChannel, RunContext, RunStage},
    error::{BindError, ChannelError, RunError},
    importer::Importer,
    parse::result::{ParsedRows, ResultParser},
    query::{binder::VariableBinder, builder::QueryBuilder},
    report::{ChannelOutcome, ChannelReport, RunReport},
    watermark::WatermarkTracker,
};
use chrono_tz::Tz;
use connectors::{
    connector::Connector,
    sql::base::{error::DbError, statement::PreparedQuery},
};
use engine_config::{
    loader::ConfigLoader,
    schema::{NodeKind, Schema},
    store::ConfigStore,
    walker::TreeWalker,
};
use model::{
    config::{NodeId, data_point::Target},
    core::{value::Value, watermark::Watermark},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Polls every channel below a source node once.
pub struct PollingEngine {
    store: Arc<dyn ConfigStore>,
    root: NodeId,
    schema: Schema,
    connector: Arc<dyn Connector>,
    importer: Arc<dyn Importer>,
}

/// Counts of a successfully processed channel.
struct ChannelSummary {
    imported: usize,
    skipped: usize,
    current: Watermark,
}

impl PollingEngine {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        root: NodeId,
        connector: Arc<dyn Connector>,
        importer: Arc<dyn Importer>,
    ) -> Self {
        PollingEngine {
            store,
            root,
            schema: Schema::default(),
            connector,
            importer,
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Runs once. Only configuration of the source itself, channel discovery
    /// and the connection can fail the run; channel failures are reported.
    pub async fn run(&self) -> Result<RunReport, RunError> {
        let loader = ConfigLoader::new(self.store.clone(), self.schema.clone());

        let source = loader.load_source(self.root).await?;
        let mut ctx = RunContext::new(source);
        ctx.enter(RunStage::Loading);

        if !ctx.source.enabled {
            info!(source = %ctx.source.name, "Source is disabled, nothing to poll");
            ctx.enter(RunStage::Idle);
            return Ok(RunReport::disabled(&ctx.source.name));
        }

        self.load_channels(&loader, &mut ctx).await?;
        info!(source = %ctx.source.name, channels = ctx.channels.len(), "Loaded channels");

        ctx.enter(RunStage::Connecting);
        ctx.adapter = Some(self.connector.connect(&ctx.source).await?);

        let mut report = RunReport::new(&ctx.source.name);
        let channels = std::mem::take(&mut ctx.channels);

        for planned in channels {
            let outcome = match planned.plan {
                Ok(plan) => {
                    let previous = plan.channel.watermark;
                    match self.poll_channel(&mut ctx, &plan).await {
                        Ok(summary) => ChannelOutcome::Completed {
                            imported: summary.imported,
                            skipped: summary.skipped,
                            previous,
                            current: summary.current,
                        },
                        Err(err) => {
                            error!(channel = %planned.name, stage = %ctx.stage(), %err, "Channel failed");
                            ctx.buffer.clear();
                            ChannelOutcome::Failed {
                                error: err.to_string(),
                            }
                        }
                    }
                }
                Err(err) => {
                    error!(channel = %planned.name, %err, "Channel could not be loaded");
                    ChannelOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };

            report.channels.push(ChannelReport {
                node: planned.node,
                channel: planned.name,
                outcome,
            });
        }

        ctx.enter(RunStage::Closing);
        if let Some(adapter) = ctx.adapter.take()
            && let Err(err) = adapter.close().await
        {
            warn!(%err, "Failed to close connection");
        }
        ctx.enter(RunStage::Idle);

        info!(
            source = %report.source,
            imported = report.imported(),
            failed = report.failed(),
            "Run finished"
        );
        Ok(report)
    }

    async fn load_channels(
        &self,
        loader: &ConfigLoader,
        ctx: &mut RunContext,
    ) -> Result<(), RunError> {
        let walker = TreeWalker::new(self.store.as_ref(), &self.schema.classes);
        let nodes = walker.discover(self.root, NodeKind::Channel).await?;

        for node in nodes {
            let name = self
                .store
                .node_name(node)
                .await
                .unwrap_or_else(|_| node.to_string());
            let plan = self.plan_channel(loader, &walker, node, ctx.source.timezone).await;
            ctx.channels.push(PlannedChannel { node, name, plan });
        }

        Ok(())
    }

    async fn plan_channel(
        &self,
        loader: &ConfigLoader,
        walker: &TreeWalker<'_>,
        node: NodeId,
        tz: Tz,
    ) -> Result<ChannelPlan, ChannelError> {
        let channel = loader.load_channel(node, tz).await?;

        let mut targets = Vec::new();
        for point in walker.discover(node, NodeKind::DataPoint).await? {
            let config = loader.load_data_point(point).await?;
            targets.push(config.resolve(&channel)?);
        }

        let mut variables = Vec::new();
        for variable in walker.discover(node, NodeKind::Variable).await? {
            variables.push(loader.load_variable(variable).await?);
        }

        Ok(ChannelPlan {
            channel,
            targets,
            variables,
        })
    }

    async fn poll_channel(
        &self,
        ctx: &mut RunContext,
        plan: &ChannelPlan,
    ) -> Result<ChannelSummary, ChannelError> {
        let channel = &plan.channel;
        let tz = ctx.source.timezone;
        info!(channel = %channel.name, watermark = %channel.watermark.to_sample(tz), "Polling channel");

        ctx.enter(RunStage::Channel(ChannelStage::Building));
        let built = QueryBuilder::new(tz).build(channel);
        let mut statement = built.statement;

        ctx.enter(RunStage::Channel(ChannelStage::Binding));
        if channel.is_templated() {
            VariableBinder::new(tz).bind(&mut statement, &plan.variables, &channel.watermark)?;
        } else if !plan.variables.is_empty() {
            warn!(
                channel = %channel.name,
                count = plan.variables.len(),
                "Variables are ignored on column-mapped channels"
            );
        }

        let parser = ResultParser::new(tz);
        let mut skipped = 0;

        if built.id_filtered {
            for target in &plan.targets {
                let id = target
                    .source_id
                    .clone()
                    .ok_or_else(|| BindError::MissingSourceId {
                        data_point: target.name.clone(),
                    })?;
                let mut per_point = statement.clone();
                per_point.bind(1, Value::String(id)).map_err(BindError::from)?;

                let parsed = self
                    .execute(ctx, &per_point, std::slice::from_ref(target), &parser)
                    .await?;
                skipped += parsed.skipped;
                ctx.buffer.extend(parsed.records);
            }
        } else {
            let parsed = self.execute(ctx, &statement, &plan.targets, &parser).await?;
            skipped += parsed.skipped;
            ctx.buffer.extend(parsed.records);
        }

        ctx.enter(RunStage::Channel(ChannelStage::Importing));
        let records = std::mem::take(&mut ctx.buffer);
        if records.is_empty() {
            info!(channel = %channel.name, skipped, "No new records");
        } else {
            self.importer.import(&records).await?;
            info!(channel = %channel.name, imported = records.len(), skipped, "Imported records");
        }

        ctx.enter(RunStage::Channel(ChannelStage::Watermarking));
        let current = self.tracker(tz).commit(channel, &records).await;

        Ok(ChannelSummary {
            imported: records.len(),
            skipped,
            current,
        })
    }

    async fn execute(
        &self,
        ctx: &mut RunContext,
        statement: &PreparedQuery,
        targets: &[Target],
        parser: &ResultParser,
    ) -> Result<ParsedRows, ChannelError> {
        ctx.enter(RunStage::Channel(ChannelStage::Executing));
        let adapter = ctx.adapter.as_ref().ok_or(DbError::Closed)?;
        let rows = adapter.query(statement).await?;

        ctx.enter(RunStage::Channel(ChannelStage::Parsing));
        Ok(parser.parse(&rows, targets))
    }

    fn tracker(&self, tz: Tz) -> WatermarkTracker {
        WatermarkTracker::new(self.store.clone(), self.schema.channel.last_readout.clone(), tz)
    }
}
