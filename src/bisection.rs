use crate::{Graph, InitialPartitioningMethod, Partition, Side};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct BisectionConfig {
    /// The seed for the random number generator.
    pub rng_seed: u64,
    /// What initial partitioning method to use.
    pub initial_partitioning: InitialPartitioningMethod,
    /// The maximum number of Kernighan-Lin passes.
    pub max_passes: u32,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            rng_seed: 1234,
            initial_partitioning: InitialPartitioningMethod::Random,
            max_passes: 10,
        }
    }
}

/// What a Kernighan-Lin run did to a partition.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KlTrace {
    /// Number of passes that were started.
    pub passes: u32,
    /// The gain of every accepted swap, in order. Each entry is positive and equals the
    /// decrease of the edge cut caused by that swap.
    pub gains: Vec<i64>,
}

impl KlTrace {
    pub fn swaps(&self) -> usize {
        self.gains.len()
    }

    pub fn total_gain(&self) -> i64 {
        self.gains.iter().sum()
    }
}

impl Graph {
    /// Splits the graph into two parts while minimizing the edge cut cost.
    pub fn partition_bisection(&self, config: &BisectionConfig) -> Partition {
        let mut rng = StdRng::seed_from_u64(config.rng_seed);
        self.bisect(config, &mut rng)
    }

    /// Like [`Graph::partition_bisection`], drawing the initial split from `rng`.
    pub fn bisect(&self, config: &BisectionConfig, rng: &mut StdRng) -> Partition {
        let mut partition = self.partition_initial(config.initial_partitioning, rng);
        if self.vertices.len() < 2 {
            return partition;
        }
        log::trace!("initial edge cut: {}", self.edge_cut(&partition));

        self.kernighan_lin(&mut partition, config.max_passes);
        partition
    }

    /// Improves `partition` in place by swapping vertex pairs across the boundary.
    ///
    /// A pass repeatedly swaps the unlocked pair with the highest gain and locks both
    /// vertices, until no unlocked pair has a positive gain. Passes are repeated until one
    /// makes no swap or `max_passes` is reached.
    pub fn kernighan_lin(&self, partition: &mut Partition, max_passes: u32) -> KlTrace {
        debug_assert_eq!(self.len(), partition.len());

        let mut trace = KlTrace::default();
        let mut scratch = KlScratch::new(self.vertices.len());

        for pass in 0..max_passes {
            trace.passes += 1;
            let swaps_before = trace.gains.len();
            self.kl_pass(partition, &mut scratch, &mut trace.gains);

            let swaps = trace.gains.len() - swaps_before;
            log::trace!(
                "pass: {pass}, swaps: {swaps}, edge cut: {}",
                self.edge_cut(partition)
            );
            if swaps == 0 {
                break;
            }
        }
        trace
    }

    fn kl_pass(&self, partition: &mut Partition, scratch: &mut KlScratch, gains: &mut Vec<i64>) {
        scratch.locked.fill(false);

        loop {
            let Some((gain, va, vb)) = self.best_swap(partition, scratch) else {
                break;
            };
            if gain <= 0 {
                break;
            }
            partition.swap(va, vb);
            scratch.locked[va as usize] = true;
            scratch.locked[vb as usize] = true;
            gains.push(gain);
        }
    }

    /// Finds the unlocked pair (a in A, b in B) with the highest swap gain. Gains are
    /// recomputed from the current partition on every call.
    fn best_swap(&self, partition: &Partition, scratch: &mut KlScratch) -> Option<(i64, u32, u32)> {
        let KlScratch {
            locked,
            node_gain,
            connection,
        } = scratch;

        let mut candidates_a = Vec::new();
        let mut candidates_b = Vec::new();
        for vx in 0..self.vertices.len() as u32 {
            if locked[vx as usize] {
                continue;
            }
            node_gain[vx as usize] = self.node_gain(partition, vx);
            match partition.side(vx) {
                Side::A => candidates_a.push(vx),
                Side::B => candidates_b.push(vx),
            }
        }

        let mut best: Option<(i64, u32, u32)> = None;
        for &va in candidates_a.iter() {
            for e in self.vertices[va as usize].edges.iter() {
                connection[e.dst as usize] = e.weight as i64;
            }

            for &vb in candidates_b.iter() {
                // The edge between a and b stays cut after the swap, yet both node gains count it.
                let gain = node_gain[va as usize] + node_gain[vb as usize] - 2 * connection[vb as usize];
                if best.map_or(true, |(best_gain, _, _)| gain > best_gain) {
                    best = Some((gain, va, vb));
                }
            }

            for e in self.vertices[va as usize].edges.iter() {
                connection[e.dst as usize] = 0;
            }
        }
        best
    }

    /// Weight towards the other side minus weight towards the own side.
    fn node_gain(&self, partition: &Partition, vx: u32) -> i64 {
        let side = partition.side(vx);
        self.neighbours(vx)
            .iter()
            .map(|e| {
                if partition.side(e.dst) == side {
                    -(e.weight as i64)
                } else {
                    e.weight as i64
                }
            })
            .sum()
    }
}

struct KlScratch {
    locked: Vec<bool>,
    node_gain: Vec<i64>,
    /// Edge weight from the current `a` candidate to every vertex, zero when unconnected.
    connection: Vec<i64>,
}

impl KlScratch {
    fn new(n: usize) -> Self {
        Self {
            locked: vec![false; n],
            node_gain: vec![0; n],
            connection: vec![0; n],
        }
    }
}
