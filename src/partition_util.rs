use crate::{divide_round_up, Graph};
use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Side {
    A,
    B,
}

/// A two-way partition of the vertices `0..len` of a graph. Every vertex sits on
/// exactly one side, so the two parts are always disjoint and cover the graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Partition {
    sides: Vec<Side>,
}

impl Partition {
    pub fn new(sides: Vec<Side>) -> Self {
        Self { sides }
    }

    /// Builds a partition from two explicit vertex sets.
    pub fn from_parts(len: usize, a: &[u32], b: &[u32]) -> Result<Self> {
        let mut sides = vec![None; len];
        for (part, side) in [(a, Side::A), (b, Side::B)] {
            for &vx in part {
                ensure!((vx as usize) < len, "vertex {vx} out of range (graph has {len} vertices)");
                ensure!(sides[vx as usize].is_none(), "vertex {vx} is listed twice");
                sides[vx as usize] = Some(side);
            }
        }
        let sides = sides
            .into_iter()
            .enumerate()
            .map(|(vx, side)| side.ok_or_else(|| anyhow::anyhow!("vertex {vx} is not assigned")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sides })
    }

    pub fn len(&self) -> usize {
        self.sides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    pub fn side(&self, vx: u32) -> Side {
        self.sides[vx as usize]
    }

    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    /// Returns the members of one side in ascending order.
    pub fn part(&self, side: Side) -> Vec<u32> {
        (0..self.sides.len() as u32)
            .filter(|&vx| self.sides[vx as usize] == side)
            .collect()
    }

    /// Returns (|A|, |B|).
    pub fn sizes(&self) -> (usize, usize) {
        let a = self.sides.iter().filter(|&&s| s == Side::A).count();
        (a, self.sides.len() - a)
    }

    /// Exchanges the sides of two vertices.
    pub fn swap(&mut self, va: u32, vb: u32) {
        self.sides.swap(va as usize, vb as usize);
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum InitialPartitioningMethod {
    /// Vertices are shuffled and split into two halves.
    #[default]
    Random,
    /// Vertices are initialized to sides based on the parity of their index.
    Modulo,
    /// Side A is grown from the lowest unassigned vertex using breadth first search.
    Bfs,
}

impl Graph {
    /// Produces a starting split with ceil(n/2) vertices on side A and floor(n/2) on side B.
    pub fn partition_initial(&self, method: InitialPartitioningMethod, rng: &mut StdRng) -> Partition {
        let n = self.vertices.len();
        let target_size = divide_round_up(n as u32, 2) as usize;

        match method {
            InitialPartitioningMethod::Random => {
                let mut order = (0..n as u32).collect::<Vec<_>>();
                order.shuffle(rng);
                let mut sides = vec![Side::B; n];
                for &vx in &order[..target_size] {
                    sides[vx as usize] = Side::A;
                }
                Partition::new(sides)
            }
            InitialPartitioningMethod::Modulo => Partition::new(
                (0..n)
                    .map(|i| if i % 2 == 0 { Side::A } else { Side::B })
                    .collect(),
            ),
            InitialPartitioningMethod::Bfs => {
                let mut visited = vec![false; n];
                let mut sides = vec![Side::B; n];
                let mut queue = VecDeque::new();
                let mut partition_size = 0;

                while partition_size < target_size {
                    let Some(start) = visited.iter().position(|&v| !v) else {
                        break;
                    };
                    queue.clear();
                    queue.push_back(start as u32);
                    visited[start] = true;

                    while let Some(vx) = queue.pop_front() {
                        sides[vx as usize] = Side::A;
                        partition_size += 1;
                        if partition_size >= target_size {
                            break;
                        }

                        for e in self.vertices[vx as usize].edges.iter() {
                            if !visited[e.dst as usize] {
                                visited[e.dst as usize] = true;
                                queue.push_back(e.dst);
                            }
                        }
                    }
                }
                Partition::new(sides)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn path(n: u32) -> Graph {
        let edges = (1..n).map(|i| (i - 1, i)).collect::<Vec<_>>();
        Graph::from_edges(n as usize, &edges).unwrap()
    }

    #[test]
    fn test_from_parts_validates() {
        assert!(Partition::from_parts(3, &[0], &[1, 2]).is_ok());
        assert!(Partition::from_parts(3, &[0, 1], &[1, 2]).is_err());
        assert!(Partition::from_parts(3, &[0], &[2]).is_err());
        assert!(Partition::from_parts(3, &[0, 3], &[1, 2]).is_err());
    }

    #[test]
    fn test_swap_keeps_sizes() {
        let mut partition = Partition::from_parts(4, &[0, 1], &[2, 3]).unwrap();
        partition.swap(1, 2);

        assert_eq!(partition.part(Side::A), vec![0, 2]);
        assert_eq!(partition.part(Side::B), vec![1, 3]);
        assert_eq!(partition.sizes(), (2, 2));
    }

    #[test]
    fn test_initial_methods_split_in_halves() {
        let graph = path(7);
        let mut rng = StdRng::seed_from_u64(5);
        for method in [
            InitialPartitioningMethod::Random,
            InitialPartitioningMethod::Modulo,
            InitialPartitioningMethod::Bfs,
        ] {
            let partition = graph.partition_initial(method, &mut rng);
            assert_eq!(partition.len(), 7);
            assert_eq!(partition.sizes(), (4, 3), "{method:?}");
        }
    }

    #[test]
    fn test_bfs_grows_contiguous_side() {
        let graph = path(6);
        let mut rng = StdRng::seed_from_u64(5);
        let partition = graph.partition_initial(InitialPartitioningMethod::Bfs, &mut rng);

        assert_eq!(partition.part(Side::A), vec![0, 1, 2]);
        assert_eq!(graph.edge_cut(&partition), 1);
    }

    #[test]
    fn test_bfs_crosses_components() {
        let graph = Graph::from_edges(5, &[(0, 1), (3, 4)]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let partition = graph.partition_initial(InitialPartitioningMethod::Bfs, &mut rng);

        assert_eq!(partition.part(Side::A), vec![0, 1, 2]);
    }

    #[test]
    fn test_initial_partition_of_tiny_graphs() {
        let mut rng = StdRng::seed_from_u64(5);
        let empty = Graph::with_vertices(0).partition_initial(InitialPartitioningMethod::Random, &mut rng);
        let single = Graph::with_vertices(1).partition_initial(InitialPartitioningMethod::Random, &mut rng);

        assert!(empty.is_empty());
        assert_eq!(single.sizes(), (1, 0));
    }
}
