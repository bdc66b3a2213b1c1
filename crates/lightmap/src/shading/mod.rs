//! Material shading graphs
//!
//! A shading graph is a small DAG of tagged nodes (`Source`, `Mix`, `Output`)
//! with links feeding named input sockets. Every graph has exactly one output
//! node. The atlas sampling node is tracked through an explicit binding rather
//! than by searching for image nodes.

mod snapshot;
mod toggle;

use serde::{Deserialize, Serialize};

use crate::types::{ImageId, NodeId};

pub use snapshot::ShadingGraphSnapshot;
pub use toggle::{ViewError, ViewMode, ViewOutcome, ViewState};

/// What a source node emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// Constant color
    Color { value: [f32; 4] },
    /// Image sampled through a UV channel (the render-active channel when `None`)
    Image {
        image: ImageId,
        uv_channel: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    pub label: String,
    pub kind: SourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixBlend {
    Mix,
    Multiply,
    Add,
}

/// Blends `color_a` and `color_b`. Linked inputs override the stored defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixNode {
    pub label: String,
    pub blend: MixBlend,
    pub factor: f32,
    pub color_a: [f32; 4],
    pub color_b: [f32; 4],
}

/// Surface output. Unlinked inputs use the stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputNode {
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metallic: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ShadingNode {
    Source(SourceNode),
    Mix(MixNode),
    Output(OutputNode),
}

impl ShadingNode {
    pub fn accepts(&self, socket: InputSocket) -> bool {
        match self {
            ShadingNode::Source(_) => false,
            ShadingNode::Mix(_) => matches!(
                socket,
                InputSocket::ColorA | InputSocket::ColorB | InputSocket::Factor
            ),
            ShadingNode::Output(_) => matches!(
                socket,
                InputSocket::BaseColor | InputSocket::Roughness | InputSocket::Metallic
            ),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ShadingNode::Source(source) => &source.label,
            ShadingNode::Mix(mix) => &mix.label,
            ShadingNode::Output(_) => "Output",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSocket {
    BaseColor,
    Roughness,
    Metallic,
    ColorA,
    ColorB,
    Factor,
}

/// A directed edge from a node's output into another node's input socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub socket: InputSocket,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("Node {node} has no input socket {socket:?}")]
    InvalidSocket { node: NodeId, socket: InputSocket },

    #[error("Linking {from} into {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },

    #[error("Output nodes have no outgoing socket")]
    OutputAsSource(NodeId),

    #[error("The output node cannot be removed")]
    RemoveOutput,
}

/// Node arena plus links. Removed nodes leave an empty slot so node ids stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadingGraph {
    nodes: Vec<Option<ShadingNode>>,
    links: Vec<Link>,
    output: NodeId,
    /// Reserved binding to the atlas sampling node
    lightmap_node: Option<NodeId>,
}

impl ShadingGraph {
    /// Graph with a single output node and a constant base color.
    pub fn new(base_color: [f32; 4]) -> Self {
        Self {
            nodes: vec![Some(ShadingNode::Output(OutputNode {
                base_color,
                roughness: 0.5,
                metallic: 0.0,
            }))],
            links: Vec::new(),
            output: NodeId(0),
            lightmap_node: None,
        }
    }

    pub fn output(&self) -> NodeId {
        self.output
    }

    pub fn output_node(&self) -> Option<&OutputNode> {
        match self.node(self.output) {
            Some(ShadingNode::Output(output)) => Some(output),
            _ => None,
        }
    }

    pub fn add_node(&mut self, node: ShadingNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&ShadingNode> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ShadingNode> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Live nodes with their ids.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ShadingNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| node.as_ref().map(|node| (NodeId(index as u32), node)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Remove a node and every link touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<ShadingNode, GraphError> {
        if id == self.output {
            return Err(GraphError::RemoveOutput);
        }
        let node = self
            .nodes
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(GraphError::UnknownNode(id))?;
        self.links.retain(|link| link.from != id && link.to != id);
        if self.lightmap_node == Some(id) {
            self.lightmap_node = None;
        }
        Ok(node)
    }

    /// The node feeding `socket` of `node`, if linked.
    pub fn input(&self, node: NodeId, socket: InputSocket) -> Option<NodeId> {
        self.links
            .iter()
            .find(|link| link.to == node && link.socket == socket)
            .map(|link| link.from)
    }

    /// Link `from` into `socket` of `to`, replacing any existing link into that socket.
    pub fn connect(&mut self, from: NodeId, to: NodeId, socket: InputSocket) -> Result<(), GraphError> {
        let source = self.node(from).ok_or(GraphError::UnknownNode(from))?;
        if matches!(source, ShadingNode::Output(_)) {
            return Err(GraphError::OutputAsSource(from));
        }
        let target = self.node(to).ok_or(GraphError::UnknownNode(to))?;
        if !target.accepts(socket) {
            return Err(GraphError::InvalidSocket { node: to, socket });
        }
        if from == to || self.depends_on(from, to) {
            return Err(GraphError::Cycle { from, to });
        }

        self.links.retain(|link| !(link.to == to && link.socket == socket));
        self.links.push(Link { from, to, socket });
        Ok(())
    }

    /// Remove the link into `socket` of `node`, returning its source.
    pub fn disconnect(&mut self, node: NodeId, socket: InputSocket) -> Option<NodeId> {
        let index = self
            .links
            .iter()
            .position(|link| link.to == node && link.socket == socket)?;
        Some(self.links.remove(index).from)
    }

    /// True if `node` reads (directly or transitively) from `upstream`.
    fn depends_on(&self, node: NodeId, upstream: NodeId) -> bool {
        let mut stack = vec![node];
        let mut visited = Vec::new();
        while let Some(current) = stack.pop() {
            if current == upstream {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            stack.extend(
                self.links
                    .iter()
                    .filter(|link| link.to == current)
                    .map(|link| link.from),
            );
        }
        false
    }

    pub fn find_by_label(&self, label: &str) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.label() == label)
            .map(|(id, _)| id)
    }

    /// The bound atlas sampling node, if the binding points at a live image source.
    pub fn lightmap_node(&self) -> Option<NodeId> {
        self.lightmap_node.filter(|id| self.lightmap_image_of(*id).is_some())
    }

    /// The image read by the bound atlas sampling node.
    pub fn lightmap_image(&self) -> Option<ImageId> {
        self.lightmap_node.and_then(|id| self.lightmap_image_of(id))
    }

    fn lightmap_image_of(&self, id: NodeId) -> Option<ImageId> {
        match self.node(id) {
            Some(ShadingNode::Source(SourceNode {
                kind: SourceKind::Image { image, .. },
                ..
            })) => Some(*image),
            _ => None,
        }
    }

    /// Raw binding, including one that points at a removed or foreign node.
    pub(crate) fn lightmap_binding(&self) -> Option<NodeId> {
        self.lightmap_node
    }

    pub(crate) fn bind_lightmap(&mut self, node: NodeId) {
        self.lightmap_node = Some(node);
    }

    pub(crate) fn unbind_lightmap(&mut self) -> Option<NodeId> {
        self.lightmap_node.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(value: f32) -> ShadingNode {
        ShadingNode::Source(SourceNode {
            label: "Color".into(),
            kind: SourceKind::Color { value: [value; 4] },
        })
    }

    fn multiply() -> ShadingNode {
        ShadingNode::Mix(MixNode {
            label: "Mix".into(),
            blend: MixBlend::Multiply,
            factor: 1.0,
            color_a: [1.0; 4],
            color_b: [1.0; 4],
        })
    }

    #[test]
    fn test_connect_replaces_existing_input() {
        let mut graph = ShadingGraph::new([1.0; 4]);
        let a = graph.add_node(color(0.2));
        let b = graph.add_node(color(0.4));
        graph.connect(a, graph.output(), InputSocket::BaseColor).unwrap();
        graph.connect(b, graph.output(), InputSocket::BaseColor).unwrap();
        assert_eq!(graph.links().len(), 1);
        assert_eq!(graph.input(graph.output(), InputSocket::BaseColor), Some(b));
    }

    #[test]
    fn test_connect_rejects_invalid_socket() {
        let mut graph = ShadingGraph::new([1.0; 4]);
        let a = graph.add_node(color(0.2));
        let b = graph.add_node(color(0.4));
        assert_eq!(
            graph.connect(a, b, InputSocket::ColorA),
            Err(GraphError::InvalidSocket {
                node: b,
                socket: InputSocket::ColorA
            })
        );
        assert_eq!(
            graph.connect(graph.output(), b, InputSocket::ColorA),
            Err(GraphError::OutputAsSource(graph.output()))
        );
    }

    #[test]
    fn test_connect_rejects_cycle() {
        let mut graph = ShadingGraph::new([1.0; 4]);
        let m1 = graph.add_node(multiply());
        let m2 = graph.add_node(multiply());
        graph.connect(m1, m2, InputSocket::ColorA).unwrap();
        assert_eq!(
            graph.connect(m2, m1, InputSocket::ColorB),
            Err(GraphError::Cycle { from: m2, to: m1 })
        );
        assert!(graph.connect(m1, m1, InputSocket::ColorB).is_err());
    }

    #[test]
    fn test_remove_node_drops_links_and_binding() {
        let mut graph = ShadingGraph::new([1.0; 4]);
        let lightmap = graph.add_node(ShadingNode::Source(SourceNode {
            label: "Lightmap".into(),
            kind: SourceKind::Image {
                image: ImageId(3),
                uv_channel: Some("lightmap".into()),
            },
        }));
        let mix = graph.add_node(multiply());
        graph.bind_lightmap(lightmap);
        graph.connect(lightmap, mix, InputSocket::ColorB).unwrap();
        assert_eq!(graph.lightmap_image(), Some(ImageId(3)));

        graph.remove_node(lightmap).unwrap();

        assert!(graph.links().is_empty());
        assert_eq!(graph.lightmap_node(), None);
        assert_eq!(graph.node_count(), 2);
        // ids stay stable after removal
        assert!(graph.node(mix).is_some());
        assert_eq!(graph.remove_node(graph.output()), Err(GraphError::RemoveOutput));
    }

    #[test]
    fn test_binding_to_non_image_node_is_ignored() {
        let mut graph = ShadingGraph::new([1.0; 4]);
        let plain = graph.add_node(color(0.5));
        graph.bind_lightmap(plain);
        assert_eq!(graph.lightmap_node(), None);
        assert_eq!(graph.lightmap_binding(), Some(plain));
    }
}
