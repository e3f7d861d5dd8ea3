use crate::{
    error::ConfigError,
    schema::Schema,
    store::{ConfigStore, StoreError},
};
use async_trait::async_trait;
use model::config::NodeId;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::Path,
    sync::RwLock,
};
use tracing::debug;

/// Serialized form of a configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub schema: Schema,
    /// Defined classes; defaults to the schema's class names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    pub root: NodeDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDocument>,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    class: String,
    attributes: BTreeMap<String, String>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<NodeId, Node>,
    classes: HashSet<String>,
    next_id: u64,
}

/// In-memory [`ConfigStore`], loadable from and savable to a JSON
/// [`TreeDocument`].
#[derive(Debug)]
pub struct MemoryStore {
    tree: RwLock<Tree>,
    root: NodeId,
    schema: Schema,
}

impl MemoryStore {
    /// Creates a store holding only a root node. All schema classes are
    /// defined.
    pub fn new(root_name: &str, root_class: &str) -> Self {
        let schema = Schema::default();
        let classes = schema.classes.all();
        Self::with_classes(root_name, root_class, schema, classes)
    }

    /// Creates a store with an explicit set of defined classes.
    pub fn with_classes<I, S>(root_name: &str, root_class: &str, schema: Schema, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = NodeId(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                name: root_name.to_string(),
                class: root_class.to_string(),
                attributes: BTreeMap::new(),
                children: Vec::new(),
            },
        );

        MemoryStore {
            tree: RwLock::new(Tree {
                nodes,
                classes: classes.into_iter().map(Into::into).collect(),
                next_id: 2,
            }),
            root,
            schema,
        }
    }

    pub fn from_document(doc: TreeDocument) -> Result<Self, ConfigError> {
        let classes = doc
            .classes
            .clone()
            .unwrap_or_else(|| doc.schema.classes.all());

        let mut tree = Tree {
            nodes: HashMap::new(),
            classes: classes.into_iter().collect(),
            next_id: 1,
        };

        // explicit ids first so generated ones never collide
        let mut explicit = HashSet::new();
        collect_ids(&doc.root, &mut explicit)?;
        tree.next_id = explicit.iter().max().map_or(1, |max| max + 1);

        let root = insert_document(&mut tree, &doc.root)?;

        Ok(MemoryStore {
            tree: RwLock::new(tree),
            root,
            schema: doc.schema,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let doc: TreeDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&self.to_document()?)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn to_document(&self) -> Result<TreeDocument, ConfigError> {
        let tree = self.read()?;
        let mut classes: Vec<String> = tree.classes.iter().cloned().collect();
        classes.sort();

        Ok(TreeDocument {
            schema: self.schema.clone(),
            classes: Some(classes),
            root: export_node(&tree, self.root)?,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Appends a node under `parent`. Nodes may carry any class; only
    /// lookups by class are checked against the defined classes.
    pub fn add_node<I, K, V>(
        &self,
        parent: NodeId,
        name: &str,
        class: &str,
        attributes: I,
    ) -> Result<NodeId, StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut tree = self.write()?;
        if !tree.nodes.contains_key(&parent) {
            return Err(StoreError::UnknownNode(parent));
        }

        let id = NodeId(tree.next_id);
        tree.next_id += 1;
        tree.nodes.insert(
            id,
            Node {
                name: name.to_string(),
                class: class.to_string(),
                attributes: attributes
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
                children: Vec::new(),
            },
        );
        if let Some(parent_node) = tree.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }

        Ok(id)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tree>, StoreError> {
        self.tree
            .read()
            .map_err(|_| StoreError::Backend("configuration tree lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tree>, StoreError> {
        self.tree
            .write()
            .map_err(|_| StoreError::Backend("configuration tree lock poisoned".into()))
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn node_name(&self, node: NodeId) -> Result<String, StoreError> {
        let tree = self.read()?;
        tree.nodes
            .get(&node)
            .map(|n| n.name.clone())
            .ok_or(StoreError::UnknownNode(node))
    }

    async fn children(&self, node: NodeId, class: &str) -> Result<Vec<NodeId>, StoreError> {
        let tree = self.read()?;
        if !tree.classes.contains(class) {
            return Err(StoreError::UnknownClass(class.to_string()));
        }

        let parent = tree.nodes.get(&node).ok_or(StoreError::UnknownNode(node))?;
        Ok(parent
            .children
            .iter()
            .filter(|child| tree.nodes.get(child).is_some_and(|c| c.class == class))
            .copied()
            .collect())
    }

    async fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, StoreError> {
        let tree = self.read()?;
        let node = tree.nodes.get(&node).ok_or(StoreError::UnknownNode(node))?;
        Ok(node.attributes.get(name).cloned())
    }

    async fn set_attribute(
        &self,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut tree = self.write()?;
        let entry = tree
            .nodes
            .get_mut(&node)
            .ok_or(StoreError::UnknownNode(node))?;
        debug!(%node, attribute = name, value, "Setting attribute");
        entry.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

fn collect_ids(doc: &NodeDocument, seen: &mut HashSet<u64>) -> Result<(), ConfigError> {
    if let Some(id) = doc.id {
        if !seen.insert(id) {
            return Err(ConfigError::Store(StoreError::Backend(format!(
                "duplicate node id {id}"
            ))));
        }
    }
    doc.children
        .iter()
        .try_for_each(|child| collect_ids(child, seen))
}

fn insert_document(tree: &mut Tree, doc: &NodeDocument) -> Result<NodeId, ConfigError> {
    let id = match doc.id {
        Some(id) => NodeId(id),
        None => {
            let id = NodeId(tree.next_id);
            tree.next_id += 1;
            id
        }
    };

    let attributes = doc
        .attributes
        .iter()
        .filter_map(|(name, value)| attribute_text(value).map(|text| (name.clone(), text)))
        .collect();

    let children = doc
        .children
        .iter()
        .map(|child| insert_document(tree, child))
        .collect::<Result<Vec<_>, _>>()?;

    tree.nodes.insert(
        id,
        Node {
            name: doc.name.clone(),
            class: doc.class.clone(),
            attributes,
            children,
        },
    );

    Ok(id)
}

fn attribute_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn export_node(tree: &Tree, id: NodeId) -> Result<NodeDocument, StoreError> {
    let node = tree.nodes.get(&id).ok_or(StoreError::UnknownNode(id))?;
    Ok(NodeDocument {
        id: Some(id.0),
        name: node.name.clone(),
        class: node.class.clone(),
        attributes: node
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
        children: node
            .children
            .iter()
            .map(|child| export_node(tree, *child))
            .collect::<Result<Vec<_>, _>>()?,
    })
}
