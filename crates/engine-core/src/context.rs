use crate::error::ChannelError;
use connectors::sql::base::adapter::SqlAdapter;
use model::{
    config::{
        NodeId, channel::ChannelConfig, data_point::Target, source::SourceConfig,
        variable::VariableConfig,
    },
    records::record::Record,
};
use std::fmt;
use tracing::debug;

/// Phase of a polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Loading,
    Connecting,
    Channel(ChannelStage),
    Closing,
}

/// Phase of a single channel within [`RunStage::Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStage {
    Building,
    Binding,
    Executing,
    Parsing,
    Importing,
    Watermarking,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::Channel(stage) => write!(f, "channel/{stage:?}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Everything needed to poll one channel.
#[derive(Debug, Clone)]
pub struct ChannelPlan {
    pub channel: ChannelConfig,
    pub targets: Vec<Target>,
    pub variables: Vec<VariableConfig>,
}

/// A discovered channel and whether it could be planned.
#[derive(Debug)]
pub struct PlannedChannel {
    pub node: NodeId,
    pub name: String,
    pub plan: Result<ChannelPlan, ChannelError>,
}

/// State of one run, threaded through every stage.
pub struct RunContext {
    pub source: SourceConfig,
    pub adapter: Option<Box<dyn SqlAdapter>>,
    pub channels: Vec<PlannedChannel>,
    /// Records of the channel being processed, dropped once imported.
    pub buffer: Vec<Record>,
    stage: RunStage,
}

impl RunContext {
    pub fn new(source: SourceConfig) -> Self {
        RunContext {
            source,
            adapter: None,
            channels: Vec::new(),
            buffer: Vec::new(),
            stage: RunStage::Idle,
        }
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub fn enter(&mut self, stage: RunStage) {
        debug!(source = %self.source.name, from = %self.stage, to = %stage, "Run stage");
        self.stage = stage;
    }
}
