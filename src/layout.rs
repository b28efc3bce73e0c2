//! Seeded force-directed layout (Fruchterman-Reingold).
//!
//! Initial positions come from a `StdRng` seeded with the configured seed,
//! so the same graph and seed always give the same drawing. Positions are
//! centred on the origin and scaled to fit `[-1, 1]`.

use petgraph::graph::NodeIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::AttackGraph;

const ITERATIONS: usize = 50;
const CONVERGENCE_THRESHOLD: f64 = 1e-4;
const MIN_DISTANCE: f64 = 0.01;

/// Node positions, indexed like the nodes of the laid-out graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: Vec<[f64; 2]>,
}

impl Layout {
    pub fn position(&self, idx: NodeIndex) -> Option<[f64; 2]> {
        self.positions.get(idx.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f64; 2]] {
        &self.positions
    }
}

/// Spring layout of `graph` with the given seed.
pub fn spring_layout(graph: &AttackGraph, seed: u64) -> Layout {
    let n = graph.node_count();
    match n {
        0 => return Layout { positions: Vec::new() },
        1 => return Layout { positions: vec![[0.0, 0.0]] },
        _ => {}
    }

    let mut adjacency = vec![vec![0.0f64; n]; n];
    for edge in graph.graph.edge_indices() {
        if let Some((a, b)) = graph.graph.edge_endpoints(edge) {
            if a != b {
                adjacency[a.index()][b.index()] = 1.0;
                adjacency[b.index()][a.index()] = 1.0;
            }
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos: Vec<[f64; 2]> = (0..n).map(|_| [rng.gen::<f64>(), rng.gen::<f64>()]).collect();

    // Optimal distance between nodes
    let k = (1.0 / n as f64).sqrt();
    let mut temperature = 0.1 * extent(&pos);
    let cooling = temperature / (ITERATIONS as f64 + 1.0);

    for iteration in 0..ITERATIONS {
        let mut displacement = vec![[0.0f64; 2]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i][0] - pos[j][0];
                let dy = pos[i][1] - pos[j][1];
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                // Repulsion between every pair, attraction along edges
                let force = k * k / (distance * distance) - adjacency[i][j] * distance / k;
                displacement[i][0] += dx * force;
                displacement[i][1] += dy * force;
            }
        }

        let mut moved = 0.0;
        for (p, d) in pos.iter_mut().zip(&displacement) {
            let length = (d[0] * d[0] + d[1] * d[1]).sqrt().max(MIN_DISTANCE);
            let step = [d[0] * temperature / length, d[1] * temperature / length];
            p[0] += step[0];
            p[1] += step[1];
            moved += (step[0] * step[0] + step[1] * step[1]).sqrt();
        }
        temperature -= cooling;

        if moved / (n as f64) < CONVERGENCE_THRESHOLD {
            log::debug!("Layout converged after {} iterations", iteration + 1);
            break;
        }
    }

    Layout {
        positions: rescale(pos),
    }
}

fn extent(pos: &[[f64; 2]]) -> f64 {
    let span = |axis: usize| {
        let (min, max) = pos.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[axis]), hi.max(p[axis]))
        });
        max - min
    };
    span(0).max(span(1))
}

/// Centre on the origin and scale the largest coordinate to 1.
fn rescale(mut pos: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    let n = pos.len() as f64;
    let mean = pos.iter().fold([0.0, 0.0], |acc, p| [acc[0] + p[0] / n, acc[1] + p[1] / n]);
    let mut lim: f64 = 0.0;
    for p in pos.iter_mut() {
        p[0] -= mean[0];
        p[1] -= mean[1];
        lim = lim.max(p[0].abs()).max(p[1].abs());
    }
    if lim > 0.0 {
        for p in pos.iter_mut() {
            p[0] /= lim;
            p[1] /= lim;
        }
    }
    pos
}
