use serde::Deserialize;

use ringcrab::{GraphManager, PerceptionConfig};

#[derive(Deserialize)]
struct RingSystem {
    name: String,
    atoms: usize,
    bonds: Vec<[usize; 2]>,
    ring_sizes: Vec<usize>,
    ring_bonds: usize,
}

fn systems() -> Vec<RingSystem> {
    serde_json::from_str(include_str!("approval_data/ring_systems.json")).unwrap()
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// The recorded bond order, its reverse and a few strided interleavings.
fn orders(bonds: &[[usize; 2]]) -> Vec<Vec<[usize; 2]>> {
    let n = bonds.len();
    let mut orders = vec![bonds.to_vec(), bonds.iter().rev().copied().collect()];
    for stride in (2..n).filter(|&s| gcd(s, n) == 1).take(3) {
        orders.push((0..n).map(|i| bonds[(i * stride) % n]).collect());
    }
    orders
}

fn build(atoms: usize, bonds: &[[usize; 2]], config: PerceptionConfig) -> GraphManager<(), ()> {
    let mut graph = GraphManager::with_config(config);
    let atoms: Vec<_> = (0..atoms).map(|_| graph.add_node(())).collect();
    for &[a, b] in bonds {
        graph.add_edge(atoms[a], atoms[b], ()).unwrap();
    }
    graph
}

fn sizes(graph: &GraphManager<(), ()>) -> Vec<usize> {
    let mut sizes: Vec<usize> = graph.rings().map(|(_, cycle)| cycle.len()).collect();
    sizes.sort_unstable();
    sizes
}

fn check(config: PerceptionConfig, label: &str) {
    let mut failures = Vec::new();
    for system in systems() {
        for (k, bonds) in orders(&system.bonds).iter().enumerate() {
            let mut graph = build(system.atoms, bonds, config);
            let got = sizes(&graph);
            if got != system.ring_sizes {
                failures.push(format!(
                    "[{label}] {} order {k}: expected {:?}, got {:?}",
                    system.name, system.ring_sizes, got
                ));
            }

            graph.update_cycles();
            let rebuilt = sizes(&graph);
            if rebuilt != system.ring_sizes {
                failures.push(format!(
                    "[{label}/update] {} order {k}: expected {:?}, got {:?}",
                    system.name, system.ring_sizes, rebuilt
                ));
            }
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn approval_ring_sizes_incremental() {
    check(PerceptionConfig::default(), "incremental");
}

#[test]
fn approval_ring_sizes_full_rebuild() {
    check(
        PerceptionConfig {
            incremental: false,
            ..PerceptionConfig::default()
        },
        "full",
    );
}

#[test]
fn approval_ring_bonds() {
    for system in systems() {
        let graph = build(system.atoms, &system.bonds, PerceptionConfig::default());
        let ring_bonds = graph
            .edges()
            .filter(|&e| graph.is_cyclic(e).unwrap())
            .count();
        assert_eq!(ring_bonds, system.ring_bonds, "{}", system.name);
    }
}
