//! Seeded k-means over arrest locations.
//!
//! Centroids are initialized with k-means++ from an RNG seeded by
//! [`KMeansParams::seed`], then refined with Lloyd iterations until no
//! centroid moves further than [`KMeansParams::tolerance`] or the iteration
//! cap is hit. Distances are Euclidean in degree space.
//!
//! Identical points and a fixed seed always produce identical centroids.

use std::collections::BTreeSet;

use nypd_arrests_analytics_models::{ClusterCentroids, KMeansParams, MAX_CLUSTERS, MIN_CLUSTERS};
use nypd_arrests_arrest_models::GeoPoint;
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

use crate::AnalyticsError;

/// Partitions `points` into `params.k` clusters and returns their centroids.
///
/// Every centroid is a mean of input points (or an input point itself), so
/// it lies inside the bounding box of `points`.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] if `k` is outside
/// `MIN_CLUSTERS..=MAX_CLUSTERS` or the tolerance is negative, and
/// [`AnalyticsError::Clustering`] if `points` is empty, holds a non-finite
/// coordinate, or has fewer distinct locations than `k`.
pub fn cluster(
    points: &[GeoPoint],
    params: &KMeansParams,
) -> Result<ClusterCentroids, AnalyticsError> {
    validate(params)?;

    if points.is_empty() {
        return Err(AnalyticsError::Clustering {
            message: "cannot cluster an empty point set".to_string(),
        });
    }

    if let Some(p) = points
        .iter()
        .find(|p| !p.latitude.is_finite() || !p.longitude.is_finite())
    {
        return Err(AnalyticsError::Clustering {
            message: format!("non-finite coordinate ({}, {})", p.latitude, p.longitude),
        });
    }

    let distinct = distinct_points(points);
    if distinct.len() < params.k {
        return Err(AnalyticsError::Clustering {
            message: format!(
                "requested {} clusters but only {} distinct points are available",
                params.k,
                distinct.len()
            ),
        });
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut centroids = init_plus_plus(&distinct, params.k, &mut rng);
    let mut assignments = vec![0_usize; points.len()];
    let mut iterations = 0;

    while iterations < params.max_iterations {
        iterations += 1;
        assign(points, &centroids, &mut assignments);
        let (updated, relocated) = update(points, &assignments, &centroids);
        let shift = max_shift(&centroids, &updated);
        centroids = updated;

        if relocated == 0 && shift <= params.tolerance {
            break;
        }
        if relocated > 0 {
            log::debug!("Relocated {relocated} empty cluster(s) at iteration {iterations}");
        }
    }

    let inertia = assign(points, &centroids, &mut assignments);
    let mut cluster_sizes = vec![0_u64; centroids.len()];
    for &a in &assignments {
        cluster_sizes[a] += 1;
    }

    log::debug!(
        "k-means: {} points, k={}, seed={}, {iterations} iteration(s), inertia={inertia:.6}",
        points.len(),
        params.k,
        params.seed
    );

    Ok(ClusterCentroids {
        centroids,
        cluster_sizes,
        inertia,
        iterations,
        seed: params.seed,
    })
}

fn validate(params: &KMeansParams) -> Result<(), AnalyticsError> {
    if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&params.k) {
        return Err(AnalyticsError::InvalidParameter {
            name: "k",
            message: format!(
                "cluster count {} is outside {MIN_CLUSTERS}..={MAX_CLUSTERS}",
                params.k
            ),
        });
    }
    if params.tolerance.is_nan() || params.tolerance < 0.0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "tolerance",
            message: format!("tolerance {} must be non-negative", params.tolerance),
        });
    }
    Ok(())
}

/// Bit pattern of a coordinate with `-0.0` folded into `0.0`.
fn coord_key(p: &GeoPoint) -> (u64, u64) {
    ((p.latitude + 0.0).to_bits(), (p.longitude + 0.0).to_bits())
}

/// Distinct locations in a deterministic order.
fn distinct_points(points: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut seen = BTreeSet::new();
    let mut distinct: Vec<(u64, u64)> = Vec::new();
    for p in points {
        let key = coord_key(p);
        if seen.insert(key) {
            distinct.push(key);
        }
    }
    distinct.sort_unstable();
    distinct
        .into_iter()
        .map(|(lat, lng)| GeoPoint::new(f64::from_bits(lat), f64::from_bits(lng)))
        .collect()
}

/// k-means++ seeding over distinct locations.
fn init_plus_plus(distinct: &[GeoPoint], k: usize, rng: &mut StdRng) -> Vec<GeoPoint> {
    let first_idx = rng.gen_range(0..distinct.len());
    let first = distinct[first_idx];
    let mut chosen = vec![false; distinct.len()];
    chosen[first_idx] = true;
    let mut centroids = Vec::with_capacity(k);
    centroids.push(first);
    let mut nearest_sq: Vec<f64> = distinct.iter().map(|p| p.distance_sq(&first)).collect();

    while centroids.len() < k {
        let total: f64 = nearest_sq.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.r#gen::<f64>() * total;
            let mut acc = 0.0;
            nearest_sq
                .iter()
                .enumerate()
                .filter(|(i, d)| !chosen[*i] && **d > 0.0)
                .find(|(_, d)| {
                    acc += **d;
                    acc > target
                })
                .map(|(i, _)| i)
                .or_else(|| (0..distinct.len()).rev().find(|&i| !chosen[i]))
        } else {
            (0..distinct.len()).find(|&i| !chosen[i])
        };

        let Some(idx) = pick else {
            break;
        };

        chosen[idx] = true;
        let next = distinct[idx];
        centroids.push(next);
        for (d, p) in nearest_sq.iter_mut().zip(distinct) {
            *d = d.min(p.distance_sq(&next));
        }
    }

    centroids
}

/// Assigns each point to its nearest centroid (lowest index on ties) and
/// returns the total squared distance.
fn assign(points: &[GeoPoint], centroids: &[GeoPoint], assignments: &mut [usize]) -> f64 {
    let mut inertia = 0.0;
    for (point, slot) in points.iter().zip(assignments.iter_mut()) {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (i, c) in centroids.iter().enumerate() {
            let d = point.distance_sq(c);
            if d < best_d {
                best = i;
                best_d = d;
            }
        }
        *slot = best;
        inertia += best_d;
    }
    inertia
}

/// Moves every centroid to the mean of its points.
///
/// A centroid left without points is moved onto the point farthest from
/// its own centroid. Returns the new centroids and how many were relocated.
#[allow(clippy::cast_precision_loss)]
fn update(
    points: &[GeoPoint],
    assignments: &[usize],
    centroids: &[GeoPoint],
) -> (Vec<GeoPoint>, usize) {
    let k = centroids.len();
    let mut sums = vec![(0.0_f64, 0.0_f64); k];
    let mut counts = vec![0_u64; k];

    for (p, &a) in points.iter().zip(assignments) {
        sums[a].0 += p.latitude;
        sums[a].1 += p.longitude;
        counts[a] += 1;
    }

    let mut updated: Vec<GeoPoint> = (0..k)
        .map(|i| {
            if counts[i] == 0 {
                centroids[i]
            } else {
                let n = counts[i] as f64;
                GeoPoint::new(sums[i].0 / n, sums[i].1 / n)
            }
        })
        .collect();

    let empty: Vec<usize> = (0..k).filter(|&i| counts[i] == 0).collect();
    if empty.is_empty() {
        return (updated, 0);
    }

    let mut candidates: Vec<(usize, f64)> = points
        .iter()
        .zip(assignments)
        .enumerate()
        .map(|(i, (p, &a))| (i, p.distance_sq(&centroids[a])))
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut used: BTreeSet<(u64, u64)> = updated.iter().map(coord_key).collect();
    let mut relocated = 0;
    let mut candidates = candidates.into_iter();
    for slot in empty {
        let Some(point) = candidates
            .by_ref()
            .map(|(i, _)| points[i])
            .find(|p| !used.contains(&coord_key(p)))
        else {
            break;
        };
        used.insert(coord_key(&point));
        updated[slot] = point;
        relocated += 1;
    }

    (updated, relocated)
}

fn max_shift(before: &[GeoPoint], after: &[GeoPoint]) -> f64 {
    before
        .iter()
        .zip(after)
        .map(|(a, b)| a.distance_sq(b).sqrt())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(center: (f64, f64), n: usize) -> Vec<GeoPoint> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let offset = (i as f64) * 0.001;
                GeoPoint::new(center.0 + offset, center.1 - offset)
            })
            .collect()
    }

    fn three_blobs() -> Vec<GeoPoint> {
        let mut points = blob((40.60, -74.10), 20);
        points.extend(blob((40.75, -73.95), 20));
        points.extend(blob((40.85, -73.85), 20));
        points
    }

    fn bounds(points: &[GeoPoint]) -> (f64, f64, f64, f64) {
        points.iter().fold(
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
            |(lo_lat, hi_lat, lo_lng, hi_lng), p| {
                (
                    lo_lat.min(p.latitude),
                    hi_lat.max(p.latitude),
                    lo_lng.min(p.longitude),
                    hi_lng.max(p.longitude),
                )
            },
        )
    }

    #[test]
    fn returns_exactly_k_centroids_within_bounds() {
        let points = three_blobs();
        let (lo_lat, hi_lat, lo_lng, hi_lng) = bounds(&points);
        for k in 1..=6 {
            let result = cluster(&points, &KMeansParams::new(k)).unwrap();
            assert_eq!(result.centroids.len(), k);
            assert_eq!(result.cluster_sizes.iter().sum::<u64>(), 60);
            for c in &result.centroids {
                assert!((lo_lat..=hi_lat).contains(&c.latitude), "{c:?}");
                assert!((lo_lng..=hi_lng).contains(&c.longitude), "{c:?}");
            }
        }
    }

    #[test]
    fn separates_well_spaced_blobs() {
        let result = cluster(&three_blobs(), &KMeansParams::new(3)).unwrap();
        let mut lats: Vec<f64> = result.centroids.iter().map(|c| c.latitude).collect();
        lats.sort_by(f64::total_cmp);
        assert!((lats[0] - 40.6095).abs() < 1e-6, "{lats:?}");
        assert!((lats[1] - 40.7595).abs() < 1e-6, "{lats:?}");
        assert!((lats[2] - 40.8595).abs() < 1e-6, "{lats:?}");
        assert!(result.cluster_sizes.iter().all(|&s| s == 20));
    }

    #[test]
    fn same_seed_reproduces_centroids() {
        let points = three_blobs();
        let params = KMeansParams::new(5).with_seed(1234);
        assert_eq!(
            cluster(&points, &params).unwrap(),
            cluster(&points, &params).unwrap()
        );
    }

    #[test]
    fn single_cluster_is_the_mean() {
        let points = vec![
            GeoPoint::new(40.0, -74.0),
            GeoPoint::new(41.0, -73.0),
            GeoPoint::new(40.5, -73.5),
        ];
        let result = cluster(&points, &KMeansParams::new(1)).unwrap();
        assert!((result.centroids[0].latitude - 40.5).abs() < 1e-9);
        assert!((result.centroids[0].longitude + 73.5).abs() < 1e-9);
    }

    #[test]
    fn k_equal_to_distinct_points_uses_every_point() {
        let points = vec![
            GeoPoint::new(40.0, -74.0),
            GeoPoint::new(40.0, -74.0),
            GeoPoint::new(41.0, -73.0),
        ];
        let result = cluster(&points, &KMeansParams::new(2)).unwrap();
        assert!(result.cluster_sizes.iter().all(|&s| s > 0));
        assert!(result.inertia.abs() < 1e-12);
    }

    #[test]
    fn too_few_distinct_points_is_a_clustering_error() {
        let points = vec![GeoPoint::new(40.0, -74.0); 10];
        let err = cluster(&points, &KMeansParams::new(2)).unwrap_err();
        assert!(matches!(err, AnalyticsError::Clustering { .. }));
    }

    #[test]
    fn empty_points_is_a_clustering_error() {
        let err = cluster(&[], &KMeansParams::new(1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::Clustering { .. }));
    }

    #[test]
    fn cluster_count_is_bounded() {
        let points = three_blobs();
        for k in [0, MAX_CLUSTERS + 1] {
            let err = cluster(&points, &KMeansParams::new(k)).unwrap_err();
            assert!(matches!(
                err,
                AnalyticsError::InvalidParameter { name: "k", .. }
            ));
        }
    }

    #[test]
    fn negative_zero_counts_as_zero() {
        let points = vec![GeoPoint::new(0.0, 1.0), GeoPoint::new(-0.0, 1.0)];
        assert!(cluster(&points, &KMeansParams::new(2)).is_err());
    }
}
