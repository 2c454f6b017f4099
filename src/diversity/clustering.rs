//! Seeded mini-batch k-means.

use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use rand::seq::SliceRandom;
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::vectorizer::squared_distance;

/// Total squared centroid movement below which a run stops early.
const CONVERGENCE_TOL: f64 = 1e-8;

/// Mini-batch k-means settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiniBatchKMeans {
    n_clusters: usize,
    batch_size: usize,
    max_iter: usize,
    n_init: usize,
    seed: u64,
}

impl Default for MiniBatchKMeans {
    fn default() -> Self {
        Self {
            n_clusters: 15,
            batch_size: 1000,
            max_iter: 100,
            n_init: 3,
            seed: 42,
        }
    }
}

/// Outcome of clustering.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    /// Number of clusters actually used, at most the number of rows.
    pub k: usize,
    /// Cluster id per row.
    pub labels: Vec<usize>,
    pub centroids: Array2<f64>,
    /// Sum of squared distances of rows to their centroid.
    pub inertia: f64,
}

impl ClusterAssignment {
    /// Rows per cluster, indexed by cluster id.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Row indices of every cluster, ascending.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.k];
        for (row, &label) in self.labels.iter().enumerate() {
            members[label].push(row);
        }
        members
    }
}

impl MiniBatchKMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Clusters the rows of `data`.
    ///
    /// Runs `n_init` independent initializations and keeps the one with the
    /// lowest inertia. The same data and seed always give the same labels.
    pub fn fit(&self, data: ArrayView2<f64>) -> ClusterAssignment {
        let n = data.nrows();
        let k = self.n_clusters.min(n);
        if k == 0 {
            return ClusterAssignment {
                k: 0,
                labels: Vec::new(),
                centroids: Array2::zeros((0, data.ncols())),
                inertia: 0.0,
            };
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut best: Option<(Array2<f64>, f64)> = None;

        for run in 0..self.n_init.max(1) {
            let mut centroids = self.select_initial_centroids(data, k, &mut rng);
            let iterations = self.refine(data, &mut centroids, &mut rng);
            let inertia = inertia(data, centroids.view());
            debug!(run, iterations, inertia, "Mini-batch k-means run finished");

            if best.as_ref().map(|(_, b)| inertia < *b).unwrap_or(true) {
                best = Some((centroids, inertia));
            }
        }

        let (centroids, inertia) = match best {
            Some(best) => best,
            None => (Array2::zeros((k, data.ncols())), 0.0),
        };
        let labels = (0..n)
            .map(|i| nearest(data.row(i), centroids.view()).0)
            .collect();

        ClusterAssignment {
            k,
            labels,
            centroids,
            inertia,
        }
    }

    /// Random first centroid, then repeatedly the row farthest from every
    /// centroid chosen so far.
    fn select_initial_centroids(
        &self,
        data: ArrayView2<f64>,
        k: usize,
        rng: &mut ChaCha8Rng,
    ) -> Array2<f64> {
        let n = data.nrows();
        let mut centroids = Array2::zeros((k, data.ncols()));
        if n == 0 {
            return centroids;
        }

        let mut chosen: Vec<usize> = Vec::with_capacity(k);
        let mut is_chosen = vec![false; n];
        let mut min_distances = vec![f64::MAX; n];

        let first = rng.random_range(0..n);
        chosen.push(first);
        is_chosen[first] = true;

        while chosen.len() < k {
            let last = chosen[chosen.len() - 1];
            for (j, d) in min_distances.iter_mut().enumerate() {
                *d = d.min(squared_distance(data.row(j), data.row(last)));
            }

            let mut best_idx = None;
            let mut best_dist = f64::NEG_INFINITY;
            for (j, &d) in min_distances.iter().enumerate() {
                if !is_chosen[j] && d > best_dist {
                    best_dist = d;
                    best_idx = Some(j);
                }
            }
            match best_idx {
                Some(idx) => {
                    chosen.push(idx);
                    is_chosen[idx] = true;
                }
                None => break,
            }
        }

        for (c, &row) in chosen.iter().enumerate() {
            centroids.row_mut(c).assign(&data.row(row));
        }
        centroids
    }

    /// Mini-batch updates with a per-centroid learning rate of 1 / count.
    fn refine(&self, data: ArrayView2<f64>, centroids: &mut Array2<f64>, rng: &mut ChaCha8Rng) -> usize {
        let n = data.nrows();
        let mut counts = vec![0usize; centroids.nrows()];
        let mut order: Vec<usize> = (0..n).collect();
        let batch = self.batch_size.min(n);

        for iteration in 0..self.max_iter {
            order.shuffle(rng);
            let before = centroids.clone();

            for &i in &order[..batch] {
                let x = data.row(i);
                let (c, _) = nearest(x, centroids.view());
                counts[c] += 1;
                let lr = 1.0 / counts[c] as f64;
                Zip::from(centroids.row_mut(c))
                    .and(&x)
                    .for_each(|m, &v| *m += lr * (v - *m));
            }

            let shift: f64 = Zip::from(&before)
                .and(&*centroids)
                .fold(0.0, |acc, &a, &b| acc + (a - b).powi(2));
            if shift < CONVERGENCE_TOL {
                return iteration + 1;
            }
        }
        self.max_iter
    }
}

/// Closest centroid and its squared distance; ties go to the lower id.
pub fn nearest(row: ArrayView1<f64>, centroids: ArrayView2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let d = squared_distance(row, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn inertia(data: ArrayView2<f64>, centroids: ArrayView2<f64>) -> f64 {
    data.rows()
        .into_iter()
        .map(|row| nearest(row, centroids).1)
        .sum()
}
