use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};
use serde::Serialize;

use crate::types::{Correspondence, DataFrame, DetectionRegion, Keypoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionMatch {
    pub previous_id: i32,
    pub current_id: i32,
    pub votes: usize,
}

/// Id of the first region containing `kp`.
fn enclosing_region(regions: &[DetectionRegion], kp: &Keypoint) -> Option<i32> {
    regions
        .iter()
        .find(|r| r.bounds.contains(kp.pt))
        .map(|r| r.id)
}

/// Per current region id, how many correspondences link it to each
/// previous region id. Correspondences outside any region on either side
/// do not vote.
pub fn count_region_votes(
    correspondences: &[Correspondence],
    previous: &DataFrame,
    current: &DataFrame,
) -> HashMap<i32, BTreeMap<i32, usize>> {
    let mut votes: HashMap<i32, BTreeMap<i32, usize>> = HashMap::new();
    for m in correspondences {
        let (Some(kp_prev), Some(kp_curr)) = (
            previous.keypoints.get(m.previous_idx),
            current.keypoints.get(m.current_idx),
        ) else {
            continue;
        };
        let curr_id = enclosing_region(&current.regions, kp_curr);
        let prev_id = enclosing_region(&previous.regions, kp_prev);
        if let (Some(curr_id), Some(prev_id)) = (curr_id, prev_id) {
            *votes.entry(curr_id).or_default().entry(prev_id).or_insert(0) += 1;
        }
    }
    votes
}

/// Best previous region for every current region, in current-frame order.
///
/// Highest vote count wins, ties go to the lower previous id. A current
/// region without votes falls back to the lowest previous id with zero
/// votes. No previous regions means no matches.
pub fn match_regions_with_votes(
    correspondences: &[Correspondence],
    previous: &DataFrame,
    current: &DataFrame,
) -> Vec<RegionMatch> {
    let tallies = count_region_votes(correspondences, previous, current);
    let lowest_previous_id = previous.regions.iter().map(|r| r.id).min();

    current
        .regions
        .iter()
        .filter_map(|region| {
            let best = tallies.get(&region.id).and_then(|tally| {
                // BTreeMap iterates ascending ids; only a strictly larger count replaces
                tally.iter().fold(None, |best: Option<(i32, usize)>, (&id, &count)| {
                    match best {
                        Some((_, best_count)) if best_count >= count => best,
                        _ => Some((id, count)),
                    }
                })
            });
            let (previous_id, votes) = best.or(lowest_previous_id.map(|id| (id, 0)))?;
            trace!(
                "current region {} -> previous region {} ({} votes)",
                region.id, previous_id, votes
            );
            Some(RegionMatch {
                previous_id,
                current_id: region.id,
                votes,
            })
        })
        .collect()
}

/// Previous region id -> current region id.
///
/// When two current regions pick the same previous region the one with
/// more votes keeps it; equal votes keep the earlier current region.
pub fn match_regions(
    correspondences: &[Correspondence],
    previous: &DataFrame,
    current: &DataFrame,
) -> BTreeMap<i32, i32> {
    let mut best: BTreeMap<i32, RegionMatch> = BTreeMap::new();
    for m in match_regions_with_votes(correspondences, previous, current) {
        match best.get(&m.previous_id) {
            Some(existing) if existing.votes >= m.votes => {
                debug!(
                    "previous region {} already taken by {}, dropping {}",
                    m.previous_id, existing.current_id, m.current_id
                );
            }
            _ => {
                best.insert(m.previous_id, m);
            }
        }
    }
    best.into_iter()
        .map(|(prev_id, m)| (prev_id, m.current_id))
        .collect()
}
