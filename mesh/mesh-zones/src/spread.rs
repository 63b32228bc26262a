//! Spread-zone propagation over an indexed adjacency graph.
//!
//! The graph is an [`IndexedArray`] whose group `i` lists the neighbors of
//! element `i`. Negative entries mean "no neighbor here" and are skipped.

use mesh_types::{IndexedArray, to_index};
use tracing::debug;

use crate::error::{ZoneError, ZoneResult};

/// Configuration for spread-zone propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpreadConfig {
    /// Maximum number of propagation levels, `None` for no limit.
    pub max_depth: Option<usize>,
}

impl SpreadConfig {
    /// Propagate until the zone stops growing.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self { max_depth: None }
    }

    /// Only the seeds and their direct neighbors.
    #[must_use]
    pub const fn first_ring() -> Self {
        Self { max_depth: Some(1) }
    }

    /// Limit propagation to `depth` levels.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Elements reached by a propagation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpreadZone {
    /// Reached elements, seeds included, ascending.
    pub ids: Vec<usize>,
    /// Number of propagation levels performed.
    pub depth: usize,
}

/// Grow a zone level by level from `seeds` over `graph`.
///
/// Each level adds the not yet reached neighbors of the previous level.
/// Propagation stops when a level is empty or when `config.max_depth`
/// levels were performed. Every performed level is counted in
/// [`SpreadZone::depth`], including a last one that reaches nothing new.
///
/// # Errors
///
/// Returns [`ZoneError::SeedOutOfRange`] for a seed that is not an element
/// of the graph and [`ZoneError::InvalidGraph`] for a neighbor id past the
/// last element.
///
/// # Example
///
/// ```
/// use mesh_types::IndexedArray;
/// use mesh_zones::{SpreadConfig, compute_spread_zone_gradually_from_seed};
///
/// // path 0 - 1 - 2 - 3
/// let graph = IndexedArray::from_groups([&[1][..], &[0, 2], &[1, 3], &[2]]);
///
/// let zone = compute_spread_zone_gradually_from_seed(&[0], &graph, &SpreadConfig::first_ring())
///     .unwrap();
/// assert_eq!(zone.ids, vec![0, 1]);
/// assert_eq!(zone.depth, 1);
///
/// let all = compute_spread_zone_gradually_from_seed(&[3], &graph, &SpreadConfig::unlimited())
///     .unwrap();
/// assert_eq!(all.ids, vec![0, 1, 2, 3]);
/// ```
pub fn compute_spread_zone_gradually_from_seed(
    seeds: &[usize],
    graph: &IndexedArray,
    config: &SpreadConfig,
) -> ZoneResult<SpreadZone> {
    let mut fetched = vec![false; graph.len()];
    let zone = spread(&mut fetched, seeds, graph, config.max_depth)?;
    debug!(
        seeds = seeds.len(),
        reached = zone.ids.len(),
        depth = zone.depth,
        "spread zone computed"
    );
    Ok(zone)
}

/// Split the graph elements into connected components.
///
/// Components are found by unlimited propagation from the lowest element
/// not yet reached, so they come out ordered by their smallest element and
/// each one is ascending.
///
/// # Errors
///
/// Returns [`ZoneError::InvalidGraph`] for a neighbor id past the last
/// element.
///
/// # Example
///
/// ```
/// use mesh_types::IndexedArray;
/// use mesh_zones::partition_by_spread_zone;
///
/// let graph = IndexedArray::from_groups([&[2][..], &[], &[0]]);
/// let parts = partition_by_spread_zone(&graph).unwrap();
/// assert_eq!(parts, vec![vec![0, 2], vec![1]]);
/// ```
pub fn partition_by_spread_zone(graph: &IndexedArray) -> ZoneResult<Vec<Vec<usize>>> {
    let count = graph.len();
    let mut fetched = vec![false; count];
    let mut parts = Vec::new();
    let mut next = 0;
    while let Some(seed) = (next..count).find(|&i| !fetched[i]) {
        parts.push(spread(&mut fetched, &[seed], graph, None)?.ids);
        next = seed + 1;
    }
    debug!(elements = count, components = parts.len(), "partitioned by spread zone");
    Ok(parts)
}

/// Propagation sharing `fetched` with previous calls. The returned ids are
/// the elements reached by this call only.
fn spread(
    fetched: &mut [bool],
    seeds: &[usize],
    graph: &IndexedArray,
    max_depth: Option<usize>,
) -> ZoneResult<SpreadZone> {
    let count = graph.len();
    let mut reached = vec![false; count];
    for (position, &seed) in seeds.iter().enumerate() {
        if seed >= count {
            return Err(ZoneError::SeedOutOfRange {
                position,
                seed,
                count,
            });
        }
        fetched[seed] = true;
        reached[seed] = true;
    }

    let target = max_depth.unwrap_or(usize::MAX);
    let mut depth = 0;
    let mut frontier = seeds.to_vec();
    let mut next = Vec::new();
    while !frontier.is_empty() && depth < target {
        for &element in &frontier {
            for &neighbor in graph.group(element) {
                if neighbor < 0 {
                    continue;
                }
                let n = to_index(neighbor).filter(|&n| n < count).ok_or(ZoneError::InvalidGraph {
                    element,
                    neighbor,
                    count,
                })?;
                if !fetched[n] {
                    fetched[n] = true;
                    reached[n] = true;
                    next.push(n);
                }
            }
        }
        std::mem::swap(&mut frontier, &mut next);
        next.clear();
        depth += 1;
    }

    let ids = reached
        .iter()
        .enumerate()
        .filter_map(|(i, &r)| r.then_some(i))
        .collect();
    Ok(SpreadZone { ids, depth })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 grid of cells sharing edges: 0-1, 0-2, 1-3, 2-3, plus isolated 4.
    fn grid_graph() -> IndexedArray {
        IndexedArray::from_groups([&[1, 2][..], &[0, 3], &[0, 3], &[1, 2], &[]])
    }

    #[test]
    fn test_depth_counts_every_level() {
        let g = grid_graph();
        let zone = compute_spread_zone_gradually_from_seed(&[0], &g, &SpreadConfig::default())
            .unwrap();
        assert_eq!(zone.ids, vec![0, 1, 2, 3]);
        // level 1 reaches 1 and 2, level 2 reaches 3, level 3 finds nothing
        assert_eq!(zone.depth, 3);

        let isolated =
            compute_spread_zone_gradually_from_seed(&[4], &g, &SpreadConfig::default()).unwrap();
        assert_eq!(isolated.ids, vec![4]);
        assert_eq!(isolated.depth, 1);
    }

    #[test]
    fn test_depth_limit() {
        let g = grid_graph();
        let config = SpreadConfig::default().with_max_depth(0);
        let zone = compute_spread_zone_gradually_from_seed(&[3, 0], &g, &config).unwrap();
        assert_eq!(zone.ids, vec![0, 3]);
        assert_eq!(zone.depth, 0);
    }

    #[test]
    fn test_negative_neighbors_skipped() {
        let g = IndexedArray::from_groups([&[-1, 1][..], &[0, -1]]);
        let zone =
            compute_spread_zone_gradually_from_seed(&[1], &g, &SpreadConfig::unlimited()).unwrap();
        assert_eq!(zone.ids, vec![0, 1]);
    }

    #[test]
    fn test_bad_seed() {
        let err = compute_spread_zone_gradually_from_seed(&[0, 7], &grid_graph(), &SpreadConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            ZoneError::SeedOutOfRange {
                position: 1,
                seed: 7,
                count: 5
            }
        );
    }

    #[test]
    fn test_bad_graph() {
        let g = IndexedArray::from_groups([&[5][..]]);
        assert!(matches!(
            partition_by_spread_zone(&g),
            Err(ZoneError::InvalidGraph { neighbor: 5, .. })
        ));
    }

    #[test]
    fn test_partition() {
        let parts = partition_by_spread_zone(&grid_graph()).unwrap();
        assert_eq!(parts, vec![vec![0, 1, 2, 3], vec![4]]);
        assert!(partition_by_spread_zone(&IndexedArray::new()).unwrap().is_empty());
    }
}
