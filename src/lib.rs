// Multilevel Kernighan-Lin graph bisection:
// coarsen by maximum matching, bisect every level, then refine from coarsest to finest.

use anyhow::{bail, ensure, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

mod bisection;
mod coarsen;
mod matching;
mod multilevel;
mod partition_util;
mod refine;

pub use bisection::{BisectionConfig, KlTrace};
pub use coarsen::{EdgeWeightPolicy, Hierarchy, Node};
pub use matching::maximum_matching;
pub use multilevel::{MultilevelConfig, MultilevelOutcome};
pub use partition_util::{InitialPartitioningMethod, Partition, Side};
pub use refine::{project, refine, RefinementSeed};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GraphEdge {
    pub dst: u32,
    pub weight: u32,
}

#[derive(Clone, Debug, Default)]
pub struct GraphVertex {
    pub edges: Vec<GraphEdge>,
    /// Display metadata only, never read by the partitioning code.
    pub label: Option<String>,
}

/// Undirected graph stored as per-vertex adjacency lists. Every edge is present in the
/// lists of both endpoints.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub vertices: Vec<GraphVertex>,
}

impl Graph {
    pub fn with_vertices(n: usize) -> Self {
        Self {
            vertices: vec![GraphVertex::default(); n],
        }
    }

    /// Builds an unweighted graph with `n` vertices from a list of vertex pairs.
    pub fn from_edges(n: usize, edges: &[(u32, u32)]) -> Result<Self> {
        let mut graph = Self::with_vertices(n);
        for &(a, b) in edges {
            graph.add_edge(a, b, 1)?;
        }
        Ok(graph)
    }

    /// Adds an undirected edge. Self-loops are ignored and a repeated edge keeps the
    /// weight it was first added with.
    pub fn add_edge(&mut self, a: u32, b: u32, weight: u32) -> Result<()> {
        let len = self.vertices.len();
        ensure!((a as usize) < len, "edge endpoint {a} out of range (graph has {len} vertices)");
        ensure!((b as usize) < len, "edge endpoint {b} out of range (graph has {len} vertices)");
        ensure!(weight > 0, "edge {a}-{b} has zero weight");

        if a == b || self.edge_weight(a, b).is_some() {
            return Ok(());
        }
        self.vertices[a as usize].edges.push(GraphEdge { dst: b, weight });
        self.vertices[b as usize].edges.push(GraphEdge { dst: a, weight });
        Ok(())
    }

    pub fn set_label(&mut self, vx: u32, label: impl Into<String>) -> Result<()> {
        let len = self.vertices.len();
        ensure!((vx as usize) < len, "vertex {vx} out of range (graph has {len} vertices)");
        self.vertices[vx as usize].label = Some(label.into());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.vertices.iter().map(|v| v.edges.len()).sum::<usize>() / 2
    }

    pub fn neighbours(&self, vx: u32) -> &[GraphEdge] {
        &self.vertices[vx as usize].edges
    }

    pub fn degree(&self, vx: u32) -> usize {
        self.vertices[vx as usize].edges.len()
    }

    pub fn edge_weight(&self, a: u32, b: u32) -> Option<u32> {
        self.vertices[a as usize]
            .edges
            .iter()
            .find(|e| e.dst == b)
            .map(|e| e.weight)
    }

    /// Returns the total weight of the edges whose endpoints lie on different sides.
    pub fn edge_cut(&self, partition: &Partition) -> u64 {
        debug_assert_eq!(self.len(), partition.len());

        let mut edge_cut = 0u64;
        for (vx, v) in self.vertices.iter().enumerate() {
            let side = partition.side(vx as u32);
            for e in v.edges.iter() {
                if partition.side(e.dst) != side {
                    edge_cut += e.weight as u64;
                }
            }
        }
        edge_cut / 2
    }

    pub fn deserialize_metis<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("could not open {}", path.display()))?;
        Self::read_metis(BufReader::new(file))
    }

    /// Reads a graph in the METIS adjacency format. A format field of `1` (or `001`)
    /// means every neighbour is followed by the weight of the edge to it.
    pub fn read_metis<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader
            .lines()
            .enumerate()
            .filter(|(_, l)| match l {
                Ok(l) => !(l.starts_with('%') || l.starts_with('#')),
                Err(_) => true,
            });

        // Parse the header line
        let (_, header) = lines.next().context("could not get header line")?;
        let header = header?;
        let header_parts = header.split_ascii_whitespace().collect::<Vec<_>>();
        let vertex_count = header_parts
            .first()
            .context("empty header line")?
            .parse::<usize>()
            .context("could not parse vertex count")?;
        let edge_count = header_parts
            .get(1)
            .context("header is missing the edge count")?
            .parse::<usize>()
            .context("could not parse edge count")?;
        let weighted = match header_parts.get(2).copied() {
            None | Some("0") | Some("000") => false,
            Some("1") | Some("001") => true,
            Some(fmt) => bail!("unsupported format field {fmt:?}"),
        };

        let mut graph = Graph::with_vertices(vertex_count);

        let mut src = 0u32;
        for (line_no, line) in lines {
            let line = line?;
            ensure!(
                (src as usize) < vertex_count,
                "line {}: more adjacency lines than the {vertex_count} declared vertices",
                line_no + 1
            );
            let parts = line.split_ascii_whitespace().collect::<Vec<_>>();
            let step = if weighted { 2 } else { 1 };
            ensure!(
                parts.len() % step == 0,
                "line {}: neighbour without an edge weight",
                line_no + 1
            );
            for chunk in parts.chunks(step) {
                let dst = chunk[0]
                    .parse::<u32>()
                    .with_context(|| format!("line {}: bad neighbour {:?}", line_no + 1, chunk[0]))?;
                ensure!(dst > 0, "line {}: neighbour ids are 1-based", line_no + 1);
                let weight = match chunk.get(1) {
                    Some(w) => w
                        .parse::<u32>()
                        .with_context(|| format!("line {}: bad edge weight {w:?}", line_no + 1))?,
                    None => 1,
                };
                graph
                    .add_edge(src, dst - 1, weight)
                    .with_context(|| format!("line {}", line_no + 1))?;
            }
            src += 1;
        }

        if graph.edge_count() != edge_count {
            log::debug!(
                "header declares {edge_count} edges, adjacency lists hold {}",
                graph.edge_count()
            );
        }
        Ok(graph)
    }
}

pub(crate) fn divide_round_up(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_add_edge_ignores_loops_and_duplicates() {
        let mut graph = Graph::with_vertices(3);
        graph.add_edge(0, 1, 1).unwrap();
        graph.add_edge(1, 0, 7).unwrap();
        graph.add_edge(2, 2, 1).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight(0, 1), Some(1));
        assert_eq!(graph.edge_weight(1, 0), Some(1));
        assert_eq!(graph.degree(2), 0);
    }

    #[test]
    fn test_labels_do_not_affect_structure() {
        let mut graph = Graph::from_edges(2, &[(0, 1)]).unwrap();
        graph.set_label(1, "LUT4").unwrap();

        assert_eq!(graph.vertices[1].label.as_deref(), Some("LUT4"));
        assert_eq!(graph.vertices[0].label, None);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_set_label_rejects_unknown_vertex() {
        let mut graph = Graph::with_vertices(2);

        assert!(graph.set_label(2, "FF").is_err());
        assert!(graph.vertices.iter().all(|v| v.label.is_none()));
    }

    #[test]
    fn test_add_edge_rejects_unknown_vertex() {
        let mut graph = Graph::with_vertices(2);
        assert!(graph.add_edge(0, 2, 1).is_err());
        assert!(graph.add_edge(0, 1, 0).is_err());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_edge_cut_of_cycle() {
        let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let split = Partition::from_parts(4, &[0, 1], &[2, 3]).unwrap();
        let alternating = Partition::from_parts(4, &[0, 2], &[1, 3]).unwrap();

        assert_eq!(graph.edge_cut(&split), 2);
        assert_eq!(graph.edge_cut(&alternating), 4);
    }

    #[test]
    fn test_read_metis() {
        let input = "% triangle plus a pendant\n4 4\n2 3\n1 3\n1 2 4\n3\n";
        let graph = Graph::read_metis(Cursor::new(input)).unwrap();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.edge_weight(2, 3), Some(1));
    }

    #[test]
    fn test_read_weighted_metis() {
        let input = "3 2 001\n2 5\n1 5 3 2\n2 2\n";
        let graph = Graph::read_metis(Cursor::new(input)).unwrap();

        assert_eq!(graph.edge_weight(0, 1), Some(5));
        assert_eq!(graph.edge_weight(1, 2), Some(2));
    }

    #[test]
    fn test_read_metis_rejects_bad_input() {
        assert!(Graph::read_metis(Cursor::new("")).is_err());
        assert!(Graph::read_metis(Cursor::new("2 1\n3\n\n")).is_err());
        assert!(Graph::read_metis(Cursor::new("2 1\nx\n1\n")).is_err());
        assert!(Graph::read_metis(Cursor::new("2 1 011\n2\n1\n")).is_err());
    }

    #[test]
    fn test_divide_round_up() {
        assert_eq!(divide_round_up(0, 2), 0);
        assert_eq!(divide_round_up(5, 2), 3);
        assert_eq!(divide_round_up(6, 2), 3);
    }
}
