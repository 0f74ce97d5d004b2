//! Static node-graph model for a campaign board.
//!
//! The board is an ordered sequence of stops; every stop either poses a quiz
//! question or presents reading material. The graph is built once from
//! campaign data and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Inline reading material carried by a material node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MaterialContent {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
}

/// Node payload. Exactly one variant per node; quiz questions are resolved
/// at traversal time while material content travels inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum NodeKind {
    Quiz {
        #[serde(default)]
        question_ref: Option<String>,
    },
    Material { content: MaterialContent },
}

impl NodeKind {
    #[must_use]
    pub const fn is_quiz(&self) -> bool {
        matches!(self, Self::Quiz { .. })
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quiz { .. } => "quiz",
            Self::Material { .. } => "material",
        }
    }
}

/// One stop on the campaign board. Position is display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub label: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Read-only ordered view over the campaign nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NodeGraph(Vec<MapNode>);

impl NodeGraph {
    #[must_use]
    pub const fn new(nodes: Vec<MapNode>) -> Self {
        Self(nodes)
    }

    #[must_use]
    pub fn node_at(&self, index: usize) -> Option<&MapNode> {
        self.0.get(index)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the last node on the board. Classmate bots park here.
    #[must_use]
    pub const fn final_index(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MapNode> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a NodeGraph {
    type Item = &'a MapNode;
    type IntoIter = std::slice::Iter<'a, MapNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
