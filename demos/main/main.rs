use multilevel_bisection::{Graph, MultilevelConfig, Side};
use std::env;
use std::time;

/// Two rings of `ring` vertices with chords, joined by a few bridges.
fn demo_graph(ring: u32) -> Graph {
    let mut edges = Vec::new();
    for base in [0, ring] {
        for i in 0..ring {
            edges.push((base + i, base + (i + 1) % ring));
            edges.push((base + i, base + (i + 3) % ring));
        }
    }
    for i in 0..3 {
        edges.push((i * 7, ring + i * 5));
    }
    Graph::from_edges(2 * ring as usize, &edges).expect("demo graph is well formed")
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let graph = match env::args().nth(1) {
        Some(path) => Graph::deserialize_metis(path)?,
        None => demo_graph(60),
    };
    println!("vertices: {}, edges: {}", graph.len(), graph.edge_count());

    let t1 = time::Instant::now();
    let outcome = graph.partition_multilevel(&MultilevelConfig::default());
    println!("time: {}ms", t1.elapsed().as_millis());

    for (level, partition) in outcome.levels.iter().enumerate() {
        println!(
            "level {level}: {} vertices, edge cut {}",
            partition.len(),
            outcome.hierarchy.level(level).edge_cut(partition)
        );
    }
    let partition = outcome.partition();
    println!(
        "sides: {} / {}, edge cut: {}",
        partition.part(Side::A).len(),
        partition.part(Side::B).len(),
        outcome.edge_cut()
    );
    Ok(())
}
