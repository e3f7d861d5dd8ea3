use engine_config::{
    error::ConfigError,
    loader::ConfigLoader,
    schema::{NodeKind, Schema},
    store::ConfigStore,
    walker::TreeWalker,
};
use model::config::{NodeId, channel::ChannelQuery, variable::Condition};
use serde::Serialize;
use std::sync::Arc;

/// One discovered channel as the `channels` command shows it.
#[derive(Debug, Serialize)]
pub struct ChannelListing {
    pub node: NodeId,
    pub name: String,
    /// `table <name>` or `query`.
    pub shape: String,
    pub last_readout: String,
    pub data_points: Vec<String>,
    pub variables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lists every channel below `root`. A channel that fails to load is listed
/// with its error instead of aborting the listing.
pub async fn list_channels(
    store: Arc<dyn ConfigStore>,
    root: NodeId,
    schema: Schema,
) -> Result<Vec<ChannelListing>, ConfigError> {
    let loader = ConfigLoader::new(store.clone(), schema.clone());
    let source = loader.load_source(root).await?;
    let walker = TreeWalker::new(store.as_ref(), &schema.classes);

    let mut listings = Vec::new();
    for node in walker.discover(root, NodeKind::Channel).await? {
        let listing = match describe(&loader, &walker, node, source.timezone).await {
            Ok(listing) => listing,
            Err(err) => ChannelListing {
                node,
                name: store.node_name(node).await?,
                shape: String::new(),
                last_readout: String::new(),
                data_points: Vec::new(),
                variables: Vec::new(),
                error: Some(err.to_string()),
            },
        };
        listings.push(listing);
    }

    Ok(listings)
}

async fn describe(
    loader: &ConfigLoader,
    walker: &TreeWalker<'_>,
    node: NodeId,
    tz: chrono_tz::Tz,
) -> Result<ChannelListing, ConfigError> {
    let channel = loader.load_channel(node, tz).await?;
    let shape = match &channel.query {
        ChannelQuery::Table(table) => format!("table {}", table.table),
        ChannelQuery::Template(_) => "query".to_string(),
    };

    let mut data_points = Vec::new();
    for point in walker.discover(node, NodeKind::DataPoint).await? {
        let point = loader.load_data_point(point).await?;
        data_points.push(match &point.source_id {
            Some(id) => format!("{} -> {}.{} (id {id})", point.name, point.target_id, point.target_attribute),
            None => format!("{} -> {}.{}", point.name, point.target_id, point.target_attribute),
        });
    }

    let mut variables = Vec::new();
    for variable in walker.discover(node, NodeKind::Variable).await? {
        let variable = loader.load_variable(variable).await?;
        let condition = match &variable.condition {
            Condition::LastReadout => "last readout".to_string(),
            Condition::Literal(text) => format!("'{text}'"),
        };
        variables.push(format!(
            "?{} {} = {condition}",
            variable.position, variable.value_type
        ));
    }

    Ok(ChannelListing {
        node,
        name: channel.name,
        shape,
        last_readout: channel.watermark.to_sample(tz),
        data_points,
        variables,
        error: None,
    })
}

pub fn print_listing(listings: &[ChannelListing]) {
    for channel in listings {
        match &channel.error {
            Some(error) => println!("{} {}: invalid ({error})", channel.node, channel.name),
            None => println!(
                "{} {}: {} since {}",
                channel.node, channel.name, channel.shape, channel.last_readout
            ),
        }
        for point in &channel.data_points {
            println!("    point    {point}");
        }
        for variable in &channel.variables {
            println!("    variable {variable}");
        }
    }
}
