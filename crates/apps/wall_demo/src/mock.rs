use clustering::PointRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NEW_YORK: (f64, f64) = (40.7128, -74.006);
const TOKYO: (f64, f64) = (35.6895, 139.6917);
/// Half-width in degrees of each dense hotspot.
const SPREAD: f64 = 0.25;

const PHRASES: [&str; 10] = [
    "A beautiful day!",
    "Saw something amazing.",
    "Unforgettable moment.",
    "Met a new friend.",
    "Tried a new food.",
    "Watched the sunset.",
    "Heard a great story.",
    "Learned something new.",
    "Shared a laugh.",
    "Felt inspired.",
];

/// Deterministic demo data: a fifth of the points around New York, a fifth
/// around Tokyo, the rest scattered between 80°S and 80°N.
pub fn mock_points(count: usize, seed: u64) -> Vec<PointRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let hotspot = count / 5;

    (0..count)
        .map(|i| {
            let (lat, lng) = if i < hotspot {
                jitter(&mut rng, NEW_YORK)
            } else if i < 2 * hotspot {
                jitter(&mut rng, TOKYO)
            } else {
                (rng.gen_range(-80.0..80.0), rng.gen_range(-180.0..180.0))
            };
            let text = format!("Mock memory #{}: {}", i + 1, PHRASES[i % PHRASES.len()]);
            PointRecord::new(lat, lng, text)
        })
        .collect()
}

fn jitter(rng: &mut StdRng, (lat, lng): (f64, f64)) -> (f64, f64) {
    (
        lat + rng.gen_range(-SPREAD..SPREAD),
        lng + rng.gen_range(-SPREAD..SPREAD),
    )
}
