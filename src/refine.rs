use crate::{Hierarchy, MultilevelConfig, Node, Partition};
use rand::rngs::StdRng;

/// Where the refinement of a finer level starts from.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum RefinementSeed {
    /// Kernighan-Lin improves the partition projected from the coarser level.
    #[default]
    Projected,
    /// The projection is discarded and the finer level is bisected from a new initial split.
    Fresh,
}

/// Projects a partition of a coarse level onto the next finer level: both halves of a
/// merged vertex land on the side of the merged vertex.
///
/// # Panics
///
/// If `origin` does not assign every vertex in `0..fine_len` exactly once. A hierarchy
/// built by [`Hierarchy::build`] never does that.
pub fn project(coarse: &Partition, origin: &[Node], fine_len: usize) -> Partition {
    assert_eq!(
        coarse.len(),
        origin.len(),
        "coarse partition does not match the coarse level"
    );

    let mut sides = vec![None; fine_len];
    for (cx, node) in origin.iter().enumerate() {
        let side = coarse.side(cx as u32);
        for vx in node.fine_vertices() {
            assert!(
                (vx as usize) < fine_len,
                "{node:?} names vertex {vx} outside the finer level"
            );
            assert!(
                sides[vx as usize].replace(side).is_none(),
                "vertex {vx} belongs to more than one coarse vertex"
            );
        }
    }

    Partition::new(
        sides
            .into_iter()
            .enumerate()
            .map(|(vx, side)| {
                side.unwrap_or_else(|| panic!("vertex {vx} is not covered by the coarser level"))
            })
            .collect(),
    )
}

/// Walks the hierarchy from the coarsest level to the input graph. At every step the
/// partition of the coarser level is projected and re-optimized on the finer one, and
/// replaces the partition stored for that level. Returns the updated per-level record;
/// index 0 holds the final partition.
pub fn refine(
    hierarchy: &Hierarchy,
    mut levels: Vec<Partition>,
    config: &MultilevelConfig,
    rng: &mut StdRng,
) -> Vec<Partition> {
    assert_eq!(
        levels.len(),
        hierarchy.depth(),
        "expected one partition per hierarchy level"
    );

    for level in (1..hierarchy.depth()).rev() {
        let fine = hierarchy.level(level - 1);
        let mut seed = project(&levels[level], hierarchy.origin(level), fine.len());
        log::trace!(
            "level {}: projected sizes {:?}, edge cut {}",
            level - 1,
            seed.sizes(),
            fine.edge_cut(&seed)
        );

        let refined = match config.refinement_seed {
            RefinementSeed::Projected => {
                fine.kernighan_lin(&mut seed, config.max_passes);
                seed
            }
            RefinementSeed::Fresh => fine.bisect(&config.bisection(), rng),
        };
        log::trace!("level {}: refined edge cut {}", level - 1, fine.edge_cut(&refined));
        levels[level - 1] = refined;
    }
    levels
}
