//! Catalog tree model.
//!
//! A catalog is a **forest**: an ordered list of top-level [`CatalogNode`]s
//! with no implicit root. Nodes carry a [`Category`] label that the repair
//! agent annotates and the classifier later reads to build per-module views.
//!
//! Auxiliary fields produced upstream (identifiers, template links, ...) are
//! kept verbatim in [`CatalogNode::extra`] and never interpreted here.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// An ordered sequence of top-level catalog nodes.
pub type Forest = Vec<CatalogNode>;

/// Classification label attached to a catalog node.
///
/// Deserialization is lenient: an absent, `null`, non-string or unrecognised
/// value reads as [`Category::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Business,
    Technical,
    Pricing,
    Mixed,
    #[default]
    Unknown,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Business,
        Category::Technical,
        Category::Pricing,
        Category::Mixed,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Technical => "technical",
            Category::Pricing => "pricing",
            Category::Mixed => "mixed",
            Category::Unknown => "unknown",
        }
    }

    /// Strict parse: `None` for anything outside the five known labels.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(Category::parse)
            .unwrap_or_default())
    }
}

/// The three catalog modules a tender response is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Business,
    Technical,
    Pricing,
}

impl ModuleType {
    /// Canonical order: business, technical, pricing.
    pub const ALL: [ModuleType; 3] = [
        ModuleType::Business,
        ModuleType::Technical,
        ModuleType::Pricing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Business => "business",
            ModuleType::Technical => "technical",
            ModuleType::Pricing => "pricing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }

    /// Key of this module's entry in a template library.
    pub fn template_key(&self) -> String {
        format!("{}_template", self.as_str())
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ModuleType> for Category {
    fn from(module: ModuleType) -> Self {
        match module {
            ModuleType::Business => Category::Business,
            ModuleType::Technical => Category::Technical,
            ModuleType::Pricing => Category::Pricing,
        }
    }
}

/// A single entry of a catalog outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogNode {
    /// Display label, e.g. "投标函".
    pub name: String,

    #[serde(default)]
    pub category: Category,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,

    /// Always serialized, `[]` when empty. `null` reads as empty.
    #[serde(default, deserialize_with = "children_or_empty")]
    pub children: Vec<CatalogNode>,

    /// Pass-through fields (ids, template links, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn children_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<CatalogNode>, D::Error> {
    Ok(Option::<Vec<CatalogNode>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CatalogNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: Category::Unknown,
            content_description: None,
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.content_description = Some(description.into());
        self
    }

    pub fn with_children(mut self, children: Vec<CatalogNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Set `category` on this node and every descendant, overwriting.
    pub fn annotate(&mut self, category: Category) {
        self.category = category;
        for child in &mut self.children {
            child.annotate(category);
        }
    }
}

/// A path segment could not be matched while walking a [`NodePath`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no node named '{segment}' on path '{path}'")]
pub struct PathError {
    pub path: String,
    pub segment: String,
}

/// Slash-delimited node address such as `root/商务标/投标函`.
///
/// A leading `root` segment is dropped and empty segments are ignored. Each
/// remaining segment is matched against child names exactly; when siblings
/// share a name the **first** one wins. Duplicate names are not
/// disambiguated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    raw: String,
    segments: Vec<String>,
}

impl NodePath {
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.first().is_some_and(|s| s == "root") {
            segments.remove(0);
        }
        Self {
            raw: path.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when the path addresses the whole forest (`root` or empty).
    pub fn is_forest(&self) -> bool {
        self.segments.is_empty()
    }

    fn unresolved(&self, segment: &str) -> PathError {
        PathError {
            path: self.raw.clone(),
            segment: segment.to_string(),
        }
    }

    pub fn resolve<'a>(&self, forest: &'a [CatalogNode]) -> Result<&'a CatalogNode, PathError> {
        let (first, rest) = self
            .segments
            .split_first()
            .ok_or_else(|| self.unresolved(""))?;
        let mut current = forest
            .iter()
            .find(|n| &n.name == first)
            .ok_or_else(|| self.unresolved(first))?;
        for segment in rest {
            current = current
                .children
                .iter()
                .find(|n| &n.name == segment)
                .ok_or_else(|| self.unresolved(segment))?;
        }
        Ok(current)
    }

    pub fn resolve_mut<'a>(
        &self,
        forest: &'a mut [CatalogNode],
    ) -> Result<&'a mut CatalogNode, PathError> {
        let (first, rest) = self
            .segments
            .split_first()
            .ok_or_else(|| self.unresolved(""))?;
        let mut current = forest
            .iter_mut()
            .find(|n| &n.name == first)
            .ok_or_else(|| self.unresolved(first))?;
        for segment in rest {
            current = current
                .children
                .iter_mut()
                .find(|n| &n.name == segment)
                .ok_or_else(|| self.unresolved(segment))?;
        }
        Ok(current)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Copy-on-write annotation.
///
/// Returns a new forest in which the node at `path` and all its descendants
/// carry `category`, together with the name of the annotated node (`root` for
/// a forest-level path). `forest` itself is never modified, so a failed lookup
/// leaves the caller's value intact.
pub fn annotate_path(
    forest: &[CatalogNode],
    path: &NodePath,
    category: Category,
) -> Result<(Forest, String), PathError> {
    let mut updated = forest.to_vec();
    if path.is_forest() {
        for node in &mut updated {
            node.annotate(category);
        }
        return Ok((updated, "root".to_string()));
    }
    let target = path.resolve_mut(&mut updated)?;
    target.annotate(category);
    let name = target.name.clone();
    Ok((updated, name))
}

/// Total number of nodes at every depth.
pub fn count_nodes(forest: &[CatalogNode]) -> usize {
    forest.iter().map(|n| 1 + count_nodes(&n.children)).sum()
}

/// Node count per depth level, index 0 being the top level.
pub fn nodes_per_level(forest: &[CatalogNode]) -> Vec<usize> {
    let mut levels = Vec::new();
    let mut frontier: Vec<&CatalogNode> = forest.iter().collect();
    while !frontier.is_empty() {
        levels.push(frontier.len());
        frontier = frontier.iter().flat_map(|n| n.children.iter()).collect();
    }
    levels
}

/// Index paths of every leaf, in pre-order.
pub fn leaf_paths(forest: &[CatalogNode]) -> Vec<Vec<usize>> {
    fn walk(nodes: &[CatalogNode], prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        for (i, node) in nodes.iter().enumerate() {
            prefix.push(i);
            if node.is_leaf() {
                out.push(prefix.clone());
            } else {
                walk(&node.children, prefix, out);
            }
            prefix.pop();
        }
    }
    let mut out = Vec::new();
    walk(forest, &mut Vec::new(), &mut out);
    out
}

/// Follow an index path produced by [`leaf_paths`].
pub fn node_at_mut<'a>(forest: &'a mut [CatalogNode], path: &[usize]) -> Option<&'a mut CatalogNode> {
    let (first, rest) = path.split_first()?;
    let mut current = forest.get_mut(*first)?;
    for index in rest {
        current = current.children.get_mut(*index)?;
    }
    Some(current)
}
