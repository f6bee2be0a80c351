use orb_core::{KeyPoint, Region};
use proptest::prelude::*;
use proptest::strategy::Strategy as _;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::anms::{anms_kdtree, anms_range_tree};
use crate::distribute::distribute;
use crate::grid::{distribute_grid, DEFAULT_GRID_CELL_SIZE};
use crate::naive::sort_by_response;
use crate::quadtree::distribute_quadtree;
use crate::search::tolerance_band;
use crate::ssc::{soft_ssc, ssc, SscFrame};
use crate::types::Strategy;

const REGION: Region = Region {
    min_x: 0,
    max_x: 200,
    min_y: 0,
    max_y: 150,
};

fn keypoints(max_len: usize) -> impl proptest::strategy::Strategy<Value = Vec<KeyPoint>> {
    prop::collection::vec((0.0f32..200.0, 0.0f32..150.0, 1.0f32..255.0), 0..max_len)
        .prop_map(|raw| raw.into_iter().map(|(x, y, r)| KeyPoint::new(x, y, r, 0)).collect())
}

fn sorted_cloud(seed: u64, count: usize, region: Region) -> Vec<KeyPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut kps: Vec<KeyPoint> = (0..count)
        .map(|_| {
            KeyPoint::new(
                rng.random_range(region.min_x as f32..region.max_x as f32),
                rng.random_range(region.min_y as f32..region.max_y as f32),
                rng.random_range(7.0f32..255.0),
                0,
            )
        })
        .collect();
    sort_by_response(&mut kps);
    kps
}

fn any_strategy() -> impl proptest::strategy::Strategy<Value = Strategy> {
    prop::sample::select(Strategy::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn small_inputs_pass_through(kps in keypoints(40), extra in 0usize..10, strategy in any_strategy()) {
        let n = kps.len() + extra;
        prop_assert_eq!(distribute(kps.clone(), REGION, n, strategy, 0.1, 0.0), kps);
    }

    #[test]
    fn zero_target_yields_nothing(kps in keypoints(120), strategy in any_strategy()) {
        prop_assume!(!kps.is_empty());
        prop_assert!(distribute(kps, REGION, 0, strategy, 0.1, 0.0).is_empty());
    }

    #[test]
    fn output_is_a_deterministic_subset(kps in keypoints(300), n in 1usize..60, strategy in any_strategy()) {
        let first = distribute(kps.clone(), REGION, n, strategy, 0.1, 1.0);
        let second = distribute(kps.clone(), REGION, n, strategy, 0.1, 1.0);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() <= kps.len());
        prop_assert!(first.iter().all(|kp| kps.contains(kp)));
    }

    #[test]
    fn naive_keeps_the_strongest(kps in keypoints(200), n in 1usize..50) {
        prop_assume!(kps.len() > n);
        let kept = distribute(kps.clone(), REGION, n, Strategy::Naive, 0.1, 0.0);
        prop_assert_eq!(kept.len(), n);
        let weakest_kept = kept.iter().map(|k| k.response).fold(f32::INFINITY, f32::min);
        prop_assert!(kps.iter().filter(|kp| !kept.contains(kp)).all(|kp| kp.response <= weakest_kept));
    }

    #[test]
    fn searches_land_in_band_or_exhaust_the_bracket(
        width in 40i32..800,
        height in 40i32..600,
        n in 5usize..150,
        density in 2usize..8,
        seed in any::<u64>(),
        soft_threshold in 0.5f32..10.0,
    ) {
        let region = Region::new(8, 8 + width, 8, 8 + height);
        let cloud = sorted_cloud(seed, n * density, region);
        let (low, high) = tolerance_band(n, 0.1);

        let outcomes = [
            ("anms_kd_tree", anms_kdtree(&cloud, region, n, 0.1)),
            ("anms_range_tree", anms_range_tree(&cloud, region, n, 0.1)),
            ("ssc", ssc(&cloud, region, n, 0.1)),
            ("soft_ssc", soft_ssc(&cloud, SscFrame::Bounded(region), n, 0.1, soft_threshold)),
        ];
        for (name, outcome) in outcomes {
            let count = outcome.keypoints.len();
            let in_band = count >= low && count <= high;
            prop_assert_eq!(outcome.converged, in_band, "{}: {} kept, band [{}, {}]", name, count, low, high);
            prop_assert!(outcome.iterations >= 1, "{}: no trial ran", name);
            if !in_band {
                prop_assert!(
                    outcome.search_exhausted(),
                    "{}: stopped at {} kept (band [{}, {}]) with bracket {:?} and width {:?}",
                    name, count, low, high, outcome.final_bracket, outcome.width
                );
            }
        }
    }

    #[test]
    fn grid_never_exceeds_target(kps in keypoints(400), n in 1usize..100) {
        let kept = distribute_grid(kps, REGION, n, DEFAULT_GRID_CELL_SIZE);
        prop_assert!(kept.len() <= n);
    }

    #[test]
    fn quadtree_overshoots_by_at_most_one_split(kps in keypoints(400), n in 1usize..100) {
        let len = kps.len();
        let kept = distribute_quadtree(kps, REGION, n);
        prop_assert!(kept.len() <= n + 3);
        prop_assert!(kept.len() <= len);
    }
}
