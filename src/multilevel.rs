use crate::{
    refine, BisectionConfig, EdgeWeightPolicy, Graph, Hierarchy, InitialPartitioningMethod,
    Partition, RefinementSeed,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct MultilevelConfig {
    /// The seed for the random number generator.
    pub rng_seed: u64,
    /// What initial partitioning method to use on every level.
    pub initial_partitioning: InitialPartitioningMethod,
    /// The maximum number of Kernighan-Lin passes per bisection.
    pub max_passes: u32,
    /// Coarsening stops once a level has at most this many vertices.
    pub min_coarse_size: usize,
    /// What refinement of a finer level starts from.
    pub refinement_seed: RefinementSeed,
    /// How edges made parallel by a contraction are combined.
    pub edge_weights: EdgeWeightPolicy,
}

impl Default for MultilevelConfig {
    fn default() -> Self {
        Self {
            rng_seed: 1234,
            initial_partitioning: InitialPartitioningMethod::Random,
            max_passes: 10,
            min_coarse_size: 10,
            refinement_seed: RefinementSeed::Projected,
            edge_weights: EdgeWeightPolicy::Collapse,
        }
    }
}

impl MultilevelConfig {
    pub(crate) fn bisection(&self) -> BisectionConfig {
        BisectionConfig {
            rng_seed: self.rng_seed,
            initial_partitioning: self.initial_partitioning,
            max_passes: self.max_passes,
        }
    }
}

/// Result of a multilevel run.
#[derive(Clone, Debug)]
pub struct MultilevelOutcome {
    pub hierarchy: Hierarchy,
    /// One partition per hierarchy level after refinement. Index 0 is the input graph.
    pub levels: Vec<Partition>,
}

impl MultilevelOutcome {
    /// The final bisection of the input graph.
    pub fn partition(&self) -> &Partition {
        &self.levels[0]
    }

    pub fn into_partition(mut self) -> Partition {
        self.levels.swap_remove(0)
    }

    pub fn edge_cut(&self) -> u64 {
        self.hierarchy.level(0).edge_cut(self.partition())
    }
}

impl Graph {
    /// Splits the graph into two parts with the multilevel scheme: coarsen, bisect every
    /// level, then refine from the coarsest level down to this graph.
    pub fn partition_multilevel(&self, config: &MultilevelConfig) -> MultilevelOutcome {
        let mut rng = StdRng::seed_from_u64(config.rng_seed);

        let hierarchy = Hierarchy::build(self.clone(), config.min_coarse_size, config.edge_weights);
        log::debug!(
            "hierarchy: {:?}",
            hierarchy.levels().iter().map(Graph::len).collect::<Vec<_>>()
        );

        let bisection = config.bisection();
        let levels = hierarchy
            .levels()
            .iter()
            .map(|level| level.bisect(&bisection, &mut rng))
            .collect::<Vec<_>>();

        let levels = refine(&hierarchy, levels, config, &mut rng);
        let outcome = MultilevelOutcome { hierarchy, levels };
        log::debug!(
            "final sizes: {:?}, edge cut: {}",
            outcome.partition().sizes(),
            outcome.edge_cut()
        );
        outcome
    }
}
