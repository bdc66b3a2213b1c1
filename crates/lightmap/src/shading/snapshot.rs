//! Copies of shading graphs for exact restoration.

use serde::{Deserialize, Serialize};

use super::ShadingGraph;
use crate::types::MaterialId;

/// A material's complete graph (nodes, links, stored input values and the
/// lightmap binding) captured by value, so every stored input survives
/// unchanged, non-finite values included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadingGraphSnapshot {
    pub material: MaterialId,
    graph: ShadingGraph,
}

impl ShadingGraphSnapshot {
    pub fn capture(material: MaterialId, graph: &ShadingGraph) -> Self {
        Self {
            material,
            graph: graph.clone(),
        }
    }

    /// The captured graph.
    pub fn graph(&self) -> &ShadingGraph {
        &self.graph
    }

    /// Consume the snapshot, returning the captured graph.
    pub fn restore(self) -> ShadingGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::{InputSocket, ShadingNode, SourceKind, SourceNode};

    #[test]
    fn test_snapshot_restores_identical_graph() {
        let mut graph = ShadingGraph::new([0.8, 0.6, 0.4, 1.0]);
        let texture = graph.add_node(ShadingNode::Source(SourceNode {
            label: "Albedo".into(),
            kind: SourceKind::Color {
                value: [0.25, 0.5, 0.75, 1.0],
            },
        }));
        graph
            .connect(texture, graph.output(), InputSocket::BaseColor)
            .unwrap();
        let original = graph.clone();

        let snapshot = ShadingGraphSnapshot::capture(MaterialId(1), &graph);
        graph.remove_node(texture).unwrap();

        assert_eq!(snapshot.graph().links().len(), 1);
        assert_eq!(snapshot.restore(), original);
    }

    #[test]
    fn test_non_finite_inputs_survive() {
        let mut graph = ShadingGraph::new([f32::INFINITY, 1.0, 1.0, 1.0]);
        let output = graph.output();
        if let Some(ShadingNode::Output(node)) = graph.node_mut(output) {
            node.roughness = f32::NAN;
        }

        let restored = ShadingGraphSnapshot::capture(MaterialId(1), &graph).restore();

        let node = restored.output_node().unwrap();
        assert_eq!(node.base_color[0], f32::INFINITY);
        assert!(node.roughness.is_nan());
    }
}
