use std::cmp::Ordering;

use orb_core::KeyPoint;

/// Descending response order
#[inline]
pub(crate) fn response_desc(a: &KeyPoint, b: &KeyPoint) -> Ordering {
    b.response.total_cmp(&a.response)
}

/// Stable sort by descending response.
pub fn sort_by_response(keypoints: &mut [KeyPoint]) {
    keypoints.sort_by(response_desc);
}

/// Keep the `n` highest-response keypoints, position ignored.
///
/// Selection is a partial partition (no full sort). Ties at the cut are broken
/// in favour of the earlier input position, and the survivors keep their
/// relative input order.
pub fn retain_best(keypoints: &mut Vec<KeyPoint>, n: usize) {
    if keypoints.len() <= n {
        return;
    }
    if n == 0 {
        keypoints.clear();
        return;
    }

    let mut order: Vec<usize> = (0..keypoints.len()).collect();
    order.select_nth_unstable_by(n - 1, |&a, &b| {
        response_desc(&keypoints[a], &keypoints[b]).then(a.cmp(&b))
    });
    let mut keep = order[..n].to_vec();
    keep.sort_unstable();

    *keypoints = keep.into_iter().map(|i| keypoints[i]).collect();
}
