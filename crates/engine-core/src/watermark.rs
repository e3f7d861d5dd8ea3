use chrono_tz::Tz;
use engine_config::store::ConfigStore;
use model::{config::channel::ChannelConfig, core::watermark::Watermark, records::record::Record};
use std::sync::Arc;
use tracing::{error, info};

/// Moves a channel's watermark after its records were imported and writes
/// it back to the configuration tree.
#[derive(Clone)]
pub struct WatermarkTracker {
    store: Arc<dyn ConfigStore>,
    attribute: String,
    tz: Tz,
}

impl WatermarkTracker {
    pub fn new(store: Arc<dyn ConfigStore>, attribute: impl Into<String>, tz: Tz) -> Self {
        WatermarkTracker {
            store,
            attribute: attribute.into(),
            tz,
        }
    }

    /// Newest record timestamp, if it is past `current`.
    pub fn next(current: &Watermark, records: &[Record]) -> Option<Watermark> {
        current.advance(records.iter().map(Record::timestamp))
    }

    /// Persists the advanced watermark. Returns the watermark the channel
    /// holds afterwards; a failed write keeps the old one.
    pub async fn commit(&self, channel: &ChannelConfig, records: &[Record]) -> Watermark {
        let Some(next) = Self::next(&channel.watermark, records) else {
            return channel.watermark;
        };

        let sample = next.to_sample(self.tz);
        match self
            .store
            .set_attribute(channel.node, &self.attribute, &sample)
            .await
        {
            Ok(()) => {
                info!(channel = %channel.name, from = %channel.watermark.to_sample(self.tz), to = %sample, "Watermark advanced");
                next
            }
            Err(err) => {
                error!(channel = %channel.name, %err, "Failed to persist watermark");
                channel.watermark
            }
        }
    }
}
