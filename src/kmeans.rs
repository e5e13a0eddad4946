use rand::{distributions::WeightedIndex, prelude::Distribution, rngs::StdRng, SeedableRng};

type Point = [f64; 3];

/// A cluster of colors: its centroid in RGB space and the number of pixels assigned to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    pub centroid: Point,
    pub population: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Kmeans {
    pub clusters: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Number of independently seeded runs. The run with the lowest within-cluster squared distance wins.
    pub runs: usize,
    pub seed: u64,
}

struct Run {
    centroids: Vec<Point>,
    assignments: Vec<usize>,
    score: f64,
}

impl Kmeans {
    /// Cluster a histogram of distinct colors, each weighted by its pixel count.
    ///
    /// Centroids are seeded with k-means++ drawn from a generator seeded with `seed`, so the same histogram and
    /// seed always give the same clusters. The returned clusters are in centroid index order. Fewer than
    /// `clusters` centroids are returned when the histogram doesn't hold enough distinct colors.
    pub fn run(&self, colors: &[((u8, u8, u8), u32)]) -> Vec<Cluster> {
        let points: Vec<(Point, f64)> = colors
            .iter()
            .map(|&((r, g, b), count)| ([r as f64, g as f64, b as f64], count as f64))
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<Run> = None;

        for _ in 0..self.runs.max(1) {
            let run = self.single_run(&points, &mut rng);

            // strict comparison keeps the earliest run on ties
            if best.as_ref().map_or(true, |best| run.score < best.score) {
                best = Some(run);
            }
        }

        let best = match best {
            Some(best) if !best.centroids.is_empty() => best,
            _ => return Vec::new(),
        };

        let mut populations = vec![0u32; best.centroids.len()];
        for (&cluster, &(_, weight)) in best.assignments.iter().zip(&points) {
            populations[cluster] += weight as u32;
        }

        best.centroids
            .into_iter()
            .zip(populations)
            .map(|(centroid, population)| Cluster { centroid, population })
            .collect()
    }

    fn single_run(&self, points: &[(Point, f64)], rng: &mut StdRng) -> Run {
        let mut centroids = self.initial_centroids(points, rng);
        let mut assignments = vec![0; points.len()];

        if centroids.is_empty() {
            return Run {
                centroids,
                assignments,
                score: f64::INFINITY,
            };
        }

        for iteration in 0..self.max_iterations {
            assign(points, &centroids, &mut assignments);

            let shift = update_centroids(points, &assignments, &mut centroids);
            if shift <= self.tolerance {
                log::trace!("k-means converged after {} iterations", iteration + 1);
                break;
            }
        }

        assign(points, &centroids, &mut assignments);

        let score: f64 = assignments
            .iter()
            .zip(points)
            .map(|(&cluster, &(point, weight))| weight * squared_distance(point, centroids[cluster]))
            .sum();

        Run {
            centroids,
            assignments,
            score,
        }
    }

    fn initial_centroids(&self, points: &[(Point, f64)], rng: &mut StdRng) -> Vec<Point> {
        let mut centroids: Vec<Point> = Vec::with_capacity(self.clusters);

        // the first centroid is drawn by pixel count, every following one by pixel count times the squared distance
        // to the closest centroid picked so far
        let mut weights: Vec<f64> = points.iter().map(|&(_, weight)| weight).collect();

        while centroids.len() < self.clusters {
            if weights.iter().sum::<f64>() <= 0.0 {
                break;
            }

            let index = match WeightedIndex::new(&weights) {
                Ok(distribution) => distribution.sample(rng),
                Err(_) => break,
            };

            let centroid = points[index].0;
            centroids.push(centroid);

            for (weight, &(point, count)) in weights.iter_mut().zip(points) {
                let candidate = count * squared_distance(point, centroid);

                if centroids.len() == 1 || candidate < *weight {
                    *weight = candidate;
                }
            }
        }

        centroids
    }
}

fn assign(points: &[(Point, f64)], centroids: &[Point], assignments: &mut [usize]) {
    for (assignment, &(point, _)) in assignments.iter_mut().zip(points) {
        *assignment = nearest(point, centroids);
    }
}

fn nearest(point: Point, centroids: &[Point]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;

    for (index, &centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(point, centroid);

        // strict comparison keeps the lowest index on ties
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }

    best
}

/// Move every centroid to the weighted mean of its members and return the largest distance moved. A centroid
/// without members stays where it is.
fn update_centroids(points: &[(Point, f64)], assignments: &[usize], centroids: &mut [Point]) -> f64 {
    let mut sums = vec![([0.0; 3], 0.0); centroids.len()];

    for (&cluster, &(point, weight)) in assignments.iter().zip(points) {
        let (sum, total) = &mut sums[cluster];
        for (s, p) in sum.iter_mut().zip(point) {
            *s += p * weight;
        }
        *total += weight;
    }

    let mut max_shift: f64 = 0.0;
    for (centroid, (sum, total)) in centroids.iter_mut().zip(sums) {
        if total <= 0.0 {
            continue;
        }

        let updated = [sum[0] / total, sum[1] / total, sum[2] / total];
        max_shift = max_shift.max(squared_distance(*centroid, updated).sqrt());
        *centroid = updated;
    }

    max_shift
}

fn squared_distance(a: Point, b: Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kmeans(clusters: usize, seed: u64) -> Kmeans {
        Kmeans {
            clusters,
            max_iterations: 100,
            tolerance: 1e-4,
            runs: 4,
            seed,
        }
    }

    #[test]
    fn separates_well_separated_masses() {
        let colors = [
            ((250, 0, 0), 40),
            ((255, 5, 0), 60),
            ((0, 0, 250), 4),
            ((0, 10, 255), 6),
        ];

        for seed in 0..20 {
            let mut clusters = kmeans(2, seed).run(&colors);
            clusters.sort_by(|a, b| b.population.cmp(&a.population));

            assert_eq!(clusters.len(), 2);
            assert_eq!(clusters[0].population, 100);
            assert_eq!(clusters[1].population, 10);
            assert!((clusters[0].centroid[0] - 253.0).abs() < 1e-9);
            assert!((clusters[0].centroid[1] - 3.0).abs() < 1e-9);
            assert!((clusters[1].centroid[1] - 6.0).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_gives_same_clusters() {
        let colors: Vec<((u8, u8, u8), u32)> = (0..64u32)
            .map(|i| (((i * 4) as u8, (255 - i * 3) as u8, (i * 7 % 256) as u8), i % 5 + 1))
            .collect();

        assert_eq!(kmeans(5, 7).run(&colors), kmeans(5, 7).run(&colors));
    }

    #[test]
    fn too_few_distinct_colors_gives_fewer_clusters() {
        let colors = [((10, 10, 10), 5), ((200, 200, 200), 3)];
        let clusters = kmeans(5, 1).run(&colors);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters.iter().map(|c| c.population).sum::<u32>(), 8);
    }

    #[test]
    fn empty_histogram_gives_no_clusters() {
        assert!(kmeans(3, 0).run(&[]).is_empty());
    }

    #[test]
    fn populations_cover_every_pixel() {
        let colors: Vec<((u8, u8, u8), u32)> = (0..30u32).map(|i| (((i * 8) as u8, 0, 0), i + 1)).collect();
        let clusters = kmeans(4, 3).run(&colors);

        assert_eq!(clusters.len(), 4);
        assert_eq!(clusters.iter().map(|c| c.population).sum::<u32>(), (1..=30).sum::<u32>());
    }
}
