use crate::{
    error::ConfigError,
    schema::{ClassNames, NodeKind},
    store::ConfigStore,
};
use model::config::NodeId;
use std::collections::HashSet;
use tracing::debug;

/// Finds leaf nodes of a kind below a root, descending through any depth of
/// directory nodes of the same kind.
pub struct TreeWalker<'a> {
    store: &'a dyn ConfigStore,
    classes: &'a ClassNames,
}

impl<'a> TreeWalker<'a> {
    pub fn new(store: &'a dyn ConfigStore, classes: &'a ClassNames) -> Self {
        TreeWalker { store, classes }
    }

    /// Leaves are returned depth first. The order among siblings follows
    /// the store and is not guaranteed stable.
    pub async fn discover(&self, root: NodeId, kind: NodeKind) -> Result<Vec<NodeId>, ConfigError> {
        let directory_class = kind.directory_class(self.classes);
        let leaf_class = kind.leaf_class(self.classes);

        let mut found = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }

            found.extend(self.store.children(node, leaf_class).await?);

            let mut directories = self.store.children(node, directory_class).await?;
            // reversed so the first directory is expanded first
            directories.reverse();
            stack.extend(directories);
        }

        debug!(%root, ?kind, count = found.len(), "Discovered nodes");
        Ok(found)
    }
}
