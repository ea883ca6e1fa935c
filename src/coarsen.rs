use crate::{maximum_matching, Graph, GraphEdge, GraphVertex};

/// Identity of a coarse vertex in terms of the next finer level.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Node {
    /// A finer vertex carried over unchanged.
    Atomic(u32),
    /// Two matched finer vertices contracted into one.
    Merged(u32, u32),
}

impl Node {
    /// The finer-level vertices this node was built from.
    pub fn fine_vertices(self) -> impl Iterator<Item = u32> {
        let (a, b) = match self {
            Node::Atomic(a) => (a, None),
            Node::Merged(a, b) => (a, Some(b)),
        };
        std::iter::once(a).chain(b)
    }
}

/// How parallel edges created by a contraction are combined.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum EdgeWeightPolicy {
    /// Parallel edges collapse into a single edge of weight 1.
    #[default]
    Collapse,
    /// Parallel edges collapse into one edge carrying the sum of their weights.
    Accumulate,
}

impl Graph {
    /// Contracts every edge of a heaviest maximum cardinality matching. Returns the coarser graph
    /// and the origin of each of its vertices, or `None` if there is no edge to contract.
    pub fn coarsen(&self, policy: EdgeWeightPolicy) -> Option<(Graph, Vec<Node>)> {
        if self.edge_count() == 0 {
            return None;
        }

        let mate = maximum_matching(self);
        let mut origin = Vec::with_capacity(self.vertices.len());
        let mut coarse_of = vec![0u32; self.vertices.len()];

        for vx in 0..self.vertices.len() as u32 {
            match mate[vx as usize] {
                // Already assigned together with its lower mate.
                Some(m) if m < vx => {}
                Some(m) => {
                    coarse_of[vx as usize] = origin.len() as u32;
                    coarse_of[m as usize] = origin.len() as u32;
                    origin.push(Node::Merged(vx, m));
                }
                None => {
                    coarse_of[vx as usize] = origin.len() as u32;
                    origin.push(Node::Atomic(vx));
                }
            }
        }

        let mut coarse = Graph {
            vertices: vec![GraphVertex::default(); origin.len()],
        };
        for (vx, v) in self.vertices.iter().enumerate() {
            for e in v.edges.iter() {
                if (vx as u32) > e.dst {
                    continue;
                }
                let (ca, cb) = (coarse_of[vx], coarse_of[e.dst as usize]);
                // The edge inside a merged pair disappears.
                if ca == cb {
                    continue;
                }
                let weight = match policy {
                    EdgeWeightPolicy::Collapse => 1,
                    EdgeWeightPolicy::Accumulate => e.weight,
                };
                coarse.connect(ca, cb, weight, policy);
            }
        }

        Some((coarse, origin))
    }

    fn connect(&mut self, a: u32, b: u32, weight: u32, policy: EdgeWeightPolicy) {
        let existing = self.vertices[a as usize].edges.iter().position(|e| e.dst == b);
        match (existing, policy) {
            (None, _) => {
                self.vertices[a as usize].edges.push(GraphEdge { dst: b, weight });
                self.vertices[b as usize].edges.push(GraphEdge { dst: a, weight });
            }
            (Some(_), EdgeWeightPolicy::Collapse) => {}
            (Some(i), EdgeWeightPolicy::Accumulate) => {
                self.vertices[a as usize].edges[i].weight += weight;
                if let Some(back) = self.vertices[b as usize].edges.iter_mut().find(|e| e.dst == a) {
                    back.weight += weight;
                }
            }
        }
    }
}

/// Sequence of progressively coarser graphs. Level 0 is the input graph.
#[derive(Clone, Debug)]
pub struct Hierarchy {
    levels: Vec<Graph>,
    /// `origins[i]` describes the vertices of level `i + 1` in terms of level `i`.
    origins: Vec<Vec<Node>>,
}

impl Hierarchy {
    /// Coarsens `graph` until it has at most `min_size` vertices or no edges are left.
    pub fn build(graph: Graph, min_size: usize, policy: EdgeWeightPolicy) -> Self {
        let mut levels = vec![graph];
        let mut origins = Vec::new();

        loop {
            let current = &levels[levels.len() - 1];
            if current.len() <= min_size {
                break;
            }
            let Some((coarse, origin)) = current.coarsen(policy) else {
                log::trace!("level {}: no edges left to contract", levels.len() - 1);
                break;
            };
            log::trace!(
                "level {}: {} vertices, {} edges",
                levels.len(),
                coarse.len(),
                coarse.edge_count()
            );
            levels.push(coarse);
            origins.push(origin);
        }

        Self { levels, origins }
    }

    /// Number of levels, including the input graph.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[Graph] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> &Graph {
        &self.levels[level]
    }

    pub fn coarsest(&self) -> &Graph {
        &self.levels[self.levels.len() - 1]
    }

    /// Origins of the vertices of `level` (at least 1) in terms of `level - 1`.
    pub fn origin(&self, level: usize) -> &[Node] {
        &self.origins[level - 1]
    }

    /// Resolves a vertex of any level to the input graph vertices it stands for.
    pub fn expand(&self, level: usize, vx: u32) -> Vec<u32> {
        let mut current = vec![vx];
        for l in (1..=level).rev() {
            current = current
                .into_iter()
                .flat_map(|v| self.origins[l - 1][v as usize].fine_vertices())
                .collect();
        }
        current.sort_unstable();
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(n: u32) -> Graph {
        let edges = (0..n).map(|i| (i, (i + 1) % n)).collect::<Vec<_>>();
        Graph::from_edges(n as usize, &edges).unwrap()
    }

    #[test]
    fn test_coarsen_path() {
        let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();

        let (coarse, origin) = graph.coarsen(EdgeWeightPolicy::Collapse).unwrap();

        assert_eq!(origin, vec![Node::Merged(0, 1), Node::Merged(2, 3)]);
        assert_eq!(coarse.len(), 2);
        assert_eq!(coarse.edge_weight(0, 1), Some(1));
        assert_eq!(coarse.edge_weight(0, 0), None);
        assert_eq!(coarse.edge_weight(1, 1), None);
    }

    #[test]
    fn test_unmatched_vertices_are_carried_over() {
        let star = Graph::from_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]).unwrap();

        let (coarse, origin) = star.coarsen(EdgeWeightPolicy::Collapse).unwrap();

        // Only one leaf can join the centre.
        assert_eq!(origin.len(), 4);
        assert!(matches!(origin[0], Node::Merged(0, leaf) if leaf > 0));
        assert!(origin[1..].iter().all(|node| matches!(node, Node::Atomic(_))));
        assert_eq!(coarse.edge_count(), 3);
        for leaf in 1..4 {
            assert_eq!(coarse.edge_weight(0, leaf), Some(1));
        }
    }

    #[test]
    fn test_parallel_edges_collapse_or_accumulate() {
        let square = cycle(4);

        let (collapsed, _) = square.coarsen(EdgeWeightPolicy::Collapse).unwrap();
        let (accumulated, origin) = square.coarsen(EdgeWeightPolicy::Accumulate).unwrap();

        assert_eq!(origin.len(), 2);
        assert!(origin.iter().all(|node| matches!(node, Node::Merged(..))));
        assert_eq!(collapsed.edge_count(), 1);
        assert_eq!(collapsed.edge_weight(0, 1), Some(1));
        assert_eq!(accumulated.edge_weight(0, 1), Some(2));
        assert_eq!(accumulated.edge_weight(1, 0), Some(2));
    }

    #[test]
    fn test_coarsen_edgeless_graph() {
        assert!(Graph::with_vertices(5).coarsen(EdgeWeightPolicy::Collapse).is_none());
    }

    #[test]
    fn test_hierarchy_halves_cycle() {
        let hierarchy = Hierarchy::build(cycle(40), 10, EdgeWeightPolicy::Collapse);

        let sizes = hierarchy.levels().iter().map(Graph::len).collect::<Vec<_>>();
        assert_eq!(sizes, vec![40, 20, 10]);
        assert_eq!(hierarchy.coarsest().edge_count(), 10);
        assert_eq!(hierarchy.origin(1).len(), 20);
    }

    #[test]
    fn test_hierarchy_stops_without_edges() {
        let hierarchy = Hierarchy::build(Graph::with_vertices(20), 10, EdgeWeightPolicy::Collapse);
        assert_eq!(hierarchy.depth(), 1);

        // Two disjoint edges contract once, then nothing is left to match.
        let pairs = Graph::from_edges(4, &[(0, 1), (2, 3)]).unwrap();
        let hierarchy = Hierarchy::build(pairs, 1, EdgeWeightPolicy::Collapse);
        assert_eq!(hierarchy.depth(), 2);
        assert_eq!(hierarchy.coarsest().len(), 2);
    }

    #[test]
    fn test_expand_covers_input_exactly_once() {
        let hierarchy = Hierarchy::build(cycle(37), 3, EdgeWeightPolicy::Collapse);
        assert!(hierarchy.depth() > 2);

        for level in 0..hierarchy.depth() {
            let mut covered = (0..hierarchy.level(level).len() as u32)
                .flat_map(|vx| hierarchy.expand(level, vx))
                .collect::<Vec<_>>();
            covered.sort_unstable();
            assert_eq!(covered, (0..37).collect::<Vec<_>>(), "level {level}");
        }
        for vx in 0..hierarchy.level(2).len() as u32 {
            assert!(hierarchy.expand(2, vx).len() <= 4);
        }
    }

    #[test]
    fn test_heavy_edges_are_contracted() {
        // Both perfect matchings of the square are possible; the heavy one must win.
        let mut square = Graph::with_vertices(4);
        square.add_edge(0, 1, 10).unwrap();
        square.add_edge(1, 2, 9).unwrap();
        square.add_edge(2, 3, 1).unwrap();
        square.add_edge(3, 0, 9).unwrap();

        let (coarse, origin) = square.coarsen(EdgeWeightPolicy::Accumulate).unwrap();

        assert_eq!(origin, vec![Node::Merged(0, 3), Node::Merged(1, 2)]);
        assert_eq!(coarse.edge_weight(0, 1), Some(11));
    }
}
