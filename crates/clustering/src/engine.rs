use foundation::math::{GeoPoint, mean_point, within_km};

use crate::config::WallConfig;
use crate::entity::{Cluster, ClusterKey, DisplayEntity};
use crate::point::PointRecord;
use crate::visuals::{Palette, cluster_color};

/// Partitions `points` into singles and clusters.
///
/// `points` must be the original records, never a previous pass's output.
///
/// 1. `merge_distance_km <= 0` (or NaN): one single per point, input order.
/// 2. `altitude >= full_collapse_altitude`: one cluster holding every point
///    with finite coordinates; the rest follow as singles in input order.
/// 3. Otherwise a single pass of seed-based grouping. Each unvisited point
///    seeds a group and claims every later unvisited point within
///    `merge_distance_km` of the *seed*. Membership is not transitive, so two
///    members of one group may be up to twice the threshold apart.
///
/// O(n²) in the worst case; there is no spatial index.
pub fn cluster_points(
    points: &[PointRecord],
    merge_distance_km: f64,
    altitude: f64,
    config: &WallConfig,
    palette: &Palette,
) -> Vec<DisplayEntity> {
    if merge_distance_km.is_nan() || merge_distance_km <= 0.0 {
        return singles(points);
    }

    let positions: Vec<GeoPoint> = points.iter().map(PointRecord::position).collect();

    if altitude >= config.full_collapse_altitude {
        // Records without a usable position stay out of the collapse cluster.
        let (finite, broken): (Vec<usize>, Vec<usize>) =
            (0..points.len()).partition(|&i| positions[i].is_finite());
        if finite.len() >= 2 {
            let mut out = vec![DisplayEntity::Cluster(make_cluster(
                points, finite, config, palette,
            ))];
            out.extend(broken.into_iter().map(|i| single(points, i)));
            return out;
        }
    }

    let mut visited = vec![false; points.len()];
    let mut out = Vec::new();

    for seed in 0..points.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let mut group = vec![seed];
        for candidate in (seed + 1)..points.len() {
            if !visited[candidate]
                && within_km(positions[seed], positions[candidate], merge_distance_km)
            {
                visited[candidate] = true;
                group.push(candidate);
            }
        }

        if group.len() == 1 {
            out.push(single(points, seed));
        } else {
            out.push(DisplayEntity::Cluster(make_cluster(
                points, group, config, palette,
            )));
        }
    }

    out
}

fn singles(points: &[PointRecord]) -> Vec<DisplayEntity> {
    (0..points.len()).map(|i| single(points, i)).collect()
}

fn single(points: &[PointRecord], index: usize) -> DisplayEntity {
    DisplayEntity::Single {
        index,
        record: points[index].clone(),
    }
}

fn make_cluster(
    points: &[PointRecord],
    member_indices: Vec<usize>,
    config: &WallConfig,
    palette: &Palette,
) -> Cluster {
    let positions: Vec<GeoPoint> = member_indices.iter().map(|&i| points[i].position()).collect();
    // `member_indices` is never empty here.
    let centroid = mean_point(&positions).unwrap_or(GeoPoint::new(f64::NAN, f64::NAN));
    let count = member_indices.len();
    Cluster {
        centroid,
        member_texts: member_indices.iter().map(|&i| points[i].text.clone()).collect(),
        color: cluster_color(count, config.saturation_count, palette),
        key: ClusterKey::from_centroid(centroid, count, config.enrichment_key_precision),
        member_indices,
    }
}
