use model::{config::NodeId, core::watermark::Watermark};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Completed {
        imported: usize,
        skipped: usize,
        previous: Watermark,
        current: Watermark,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelReport {
    pub node: NodeId,
    pub channel: String,
    pub outcome: ChannelOutcome,
}

impl ChannelReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ChannelOutcome::Failed { .. })
    }

    pub fn imported(&self) -> usize {
        match self.outcome {
            ChannelOutcome::Completed { imported, .. } => imported,
            ChannelOutcome::Failed { .. } => 0,
        }
    }
}

/// Result of one polling run, one entry per discovered channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub source: String,
    /// The source is switched off and nothing was polled.
    pub disabled: bool,
    pub channels: Vec<ChannelReport>,
}

impl RunReport {
    pub fn new(source: &str) -> Self {
        RunReport {
            source: source.to_string(),
            ..Default::default()
        }
    }

    pub fn disabled(source: &str) -> Self {
        RunReport {
            disabled: true,
            ..Self::new(source)
        }
    }

    pub fn imported(&self) -> usize {
        self.channels.iter().map(ChannelReport::imported).sum()
    }

    pub fn failed(&self) -> usize {
        self.channels.iter().filter(|c| c.is_failed()).count()
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.channel == name)
    }
}
