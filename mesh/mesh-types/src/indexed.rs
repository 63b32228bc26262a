//! Ragged arrays in compressed-row form.
//!
//! An [`IndexedArray`] stores a one-to-many relation as a flat value vector
//! and an offset vector: group `g` occupies `values[offsets[g]..offsets[g + 1]]`.
//! It is used for nodal connectivity, reverse nodal connectivity, descending
//! connectivity and neighbor graphs alike.

use crate::error::{MeshError, MeshResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Flat values plus group offsets.
///
/// Invariant: `offsets[0] == 0`, `offsets` is non-decreasing and
/// `offsets.last() == values.len()`.
///
/// # Example
///
/// ```
/// use mesh_types::IndexedArray;
///
/// let arr = IndexedArray::from_groups([&[0_i64, 1][..], &[], &[2, 3, 4]]);
/// assert_eq!(arr.len(), 3);
/// assert_eq!(arr.group(2), &[2, 3, 4]);
/// assert!(arr.group(1).is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedArray {
    values: Vec<i64>,
    offsets: Vec<usize>,
}

impl Default for IndexedArray {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexedArray {
    /// Create an array with no group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            offsets: vec![0],
        }
    }

    /// Create an empty array with reserved capacity.
    #[must_use]
    pub fn with_capacity(groups: usize, values: usize) -> Self {
        let mut offsets = Vec::with_capacity(groups + 1);
        offsets.push(0);
        Self {
            values: Vec::with_capacity(values),
            offsets,
        }
    }

    /// Build from raw parts, validating the offset invariant.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::SizeMismatch`] if `offsets` is empty, does not
    /// start at 0 or does not end at `values.len()`, and
    /// [`MeshError::InvalidArgument`] if it decreases.
    pub fn from_parts(values: Vec<i64>, offsets: Vec<usize>) -> MeshResult<Self> {
        let Some(&first) = offsets.first() else {
            return Err(MeshError::size_mismatch("indexed array offsets", 1, 0));
        };
        if first != 0 {
            return Err(MeshError::size_mismatch("indexed array first offset", 0, first));
        }
        let last = offsets.last().copied().unwrap_or(0);
        if last != values.len() {
            return Err(MeshError::size_mismatch(
                "indexed array last offset",
                values.len(),
                last,
            ));
        }
        if let Some(g) = offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(MeshError::invalid_argument(format!(
                "indexed array offsets decrease at group {g}"
            )));
        }
        Ok(Self { values, offsets })
    }

    /// Build from an iterator of groups.
    pub fn from_groups<'a, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = &'a [i64]>,
    {
        let mut arr = Self::new();
        for g in groups {
            arr.push_group(g.iter().copied());
        }
        arr
    }

    /// Build from owned groups of `usize` ids.
    pub fn from_id_groups<I, G>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: IntoIterator<Item = usize>,
    {
        let mut arr = Self::new();
        for g in groups {
            arr.push_group(g.into_iter().map(to_id));
        }
        arr
    }

    /// Append a group.
    pub fn push_group(&mut self, group: impl IntoIterator<Item = i64>) {
        self.values.extend(group);
        self.offsets.push(self.values.len());
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Whether there is no group at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of group `g`.
    ///
    /// # Panics
    ///
    /// Panics if `g >= self.len()`.
    #[must_use]
    pub fn group(&self, g: usize) -> &[i64] {
        &self.values[self.offsets[g]..self.offsets[g + 1]]
    }

    /// Mutable values of group `g`.
    ///
    /// # Panics
    ///
    /// Panics if `g >= self.len()`.
    pub fn group_mut(&mut self, g: usize) -> &mut [i64] {
        let (a, b) = (self.offsets[g], self.offsets[g + 1]);
        &mut self.values[a..b]
    }

    /// Length of group `g`.
    #[must_use]
    pub fn group_len(&self, g: usize) -> usize {
        self.offsets[g + 1] - self.offsets[g]
    }

    /// Iterate over the groups in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[i64]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.values[w[0]..w[1]])
    }

    /// Flat values.
    #[must_use]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Mutable flat values. The offsets cannot change through this slice.
    pub fn values_mut(&mut self) -> &mut [i64] {
        &mut self.values
    }

    /// Group offsets, `len() + 1` entries.
    #[must_use]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Split into raw parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<i64>, Vec<usize>) {
        (self.values, self.offsets)
    }

    /// Release spare capacity.
    pub fn shrink_to_fit(&mut self) {
        self.values.shrink_to_fit();
        self.offsets.shrink_to_fit();
    }

    /// Build the reverse relation over targets `0..domain_size`.
    ///
    /// Group `b` of the result lists, in ascending order, every source group
    /// `a` such that `b` appears in group `a`. A source listing `b` twice
    /// appears twice. Negative values are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::OutOfRange`] if a value is `>= domain_size`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::IndexedArray;
    ///
    /// let fwd = IndexedArray::from_groups([&[0_i64, 2][..], &[2], &[1, -1]]);
    /// let rev = fwd.build_reverse(3).unwrap();
    /// assert_eq!(rev.group(0), &[0]);
    /// assert_eq!(rev.group(1), &[2]);
    /// assert_eq!(rev.group(2), &[0, 1]);
    /// ```
    pub fn build_reverse(&self, domain_size: usize) -> MeshResult<Self> {
        let mut offsets = vec![0_usize; domain_size + 1];
        for (g, group) in self.iter().enumerate() {
            for &v in group {
                if v < 0 {
                    continue;
                }
                let t = usize::try_from(v).unwrap_or(usize::MAX);
                if t >= domain_size {
                    return Err(MeshError::out_of_range(
                        format!("reverse of group {g}"),
                        v,
                        domain_size,
                    ));
                }
                offsets[t + 1] += 1;
            }
        }
        for t in 0..domain_size {
            offsets[t + 1] += offsets[t];
        }
        let mut cursor = offsets.clone();
        let mut values = vec![0_i64; offsets[domain_size]];
        for (g, group) in self.iter().enumerate() {
            for &v in group {
                if let Ok(t) = usize::try_from(v) {
                    values[cursor[t]] = to_id(g);
                    cursor[t] += 1;
                }
            }
        }
        Ok(Self { values, offsets })
    }

    /// Keep only the listed groups, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::OutOfRange`] if an id is not a valid group.
    pub fn extract_groups(&self, ids: &[usize]) -> MeshResult<Self> {
        let mut out = Self::with_capacity(ids.len(), 0);
        for &id in ids {
            if id >= self.len() {
                return Err(MeshError::out_of_range("extract groups", to_id(id), self.len()));
            }
            out.push_group(self.group(id).iter().copied());
        }
        Ok(out)
    }

    /// Remove every occurrence of `ids` from all groups, keeping group order.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::IndexedArray;
    ///
    /// let mut a = IndexedArray::from_groups([&[1_i64, 2, 3][..], &[3], &[4]]);
    /// assert!(a.remove_ids_from_groups(&[3]));
    /// assert_eq!(a.group(0), &[1, 2]);
    /// assert!(a.group(1).is_empty());
    /// assert!(!a.remove_ids_from_groups(&[9]));
    /// ```
    pub fn remove_ids_from_groups(&mut self, ids: &[i64]) -> bool {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        let before = self.values.len();
        let mut values = Vec::with_capacity(before);
        let mut offsets = Vec::with_capacity(self.offsets.len());
        offsets.push(0);
        for group in self.iter() {
            values.extend(group.iter().filter(|&&v| sorted.binary_search(&v).is_err()));
            offsets.push(values.len());
        }
        self.values = values;
        self.offsets = offsets;
        self.values.len() != before
    }
}

/// Convert an index into a signed id.
///
/// Indices above `i64::MAX` do not occur for in-memory arrays.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn to_id(i: usize) -> i64 {
    i as i64
}

/// Convert a non-negative id into an index, `None` for negative ids.
#[inline]
#[must_use]
pub fn to_index(id: i64) -> Option<usize> {
    usize::try_from(id).ok()
}

/// Turn groups of equivalent ids into an old-to-new renumbering.
///
/// Old ids are scanned in ascending order. An id belonging to no group gets
/// the next free new id. When the scan reaches the smallest member of a
/// group, every member of the group receives the same new id and the other
/// members are skipped later on. Returns the old-to-new array
/// (`domain_size` entries) and the number of distinct new ids.
///
/// # Errors
///
/// Returns [`MeshError::OutOfRange`] if a group member is negative or
/// `>= domain_size`.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedArray, convert_index_array_to_old_to_new};
///
/// let groups = IndexedArray::from_groups([&[1_i64, 3][..]]);
/// let (o2n, n) = convert_index_array_to_old_to_new(5, &groups).unwrap();
/// assert_eq!(o2n, vec![0, 1, 2, 1, 3]);
/// assert_eq!(n, 4);
/// ```
pub fn convert_index_array_to_old_to_new(
    domain_size: usize,
    groups: &IndexedArray,
) -> MeshResult<(Vec<i64>, usize)> {
    let mut group_of: Vec<Option<usize>> = vec![None; domain_size];
    for (g, group) in groups.iter().enumerate() {
        for &v in group {
            match to_index(v).filter(|&i| i < domain_size) {
                Some(i) => group_of[i] = Some(g),
                None => {
                    return Err(MeshError::out_of_range(
                        format!("equivalence group {g}"),
                        v,
                        domain_size,
                    ));
                }
            }
        }
    }
    let mut o2n = vec![-1_i64; domain_size];
    let mut next = 0_i64;
    for old in 0..domain_size {
        if o2n[old] != -1 {
            continue;
        }
        match group_of[old] {
            Some(g) => {
                for &member in groups.group(g) {
                    if let Some(m) = to_index(member) {
                        o2n[m] = next;
                    }
                }
            }
            None => o2n[old] = next,
        }
        next += 1;
    }
    Ok((o2n, usize::try_from(next).unwrap_or(0)))
}

/// Invert an old-to-new array: for each new id, the first old id mapped to it.
///
/// Negative entries (removed ids) are ignored.
///
/// # Errors
///
/// Returns [`MeshError::OutOfRange`] if an entry is `>= new_count`.
pub fn invert_old_to_new(old_to_new: &[i64], new_count: usize) -> MeshResult<Vec<i64>> {
    let mut n2o = vec![-1_i64; new_count];
    for (old, &new) in old_to_new.iter().enumerate() {
        let Some(n) = to_index(new) else {
            continue;
        };
        if n >= new_count {
            return Err(MeshError::out_of_range("old-to-new inversion", new, new_count));
        }
        if n2o[n] == -1 {
            n2o[n] = to_id(old);
        }
    }
    Ok(n2o)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(groups: &[&[i64]]) -> IndexedArray {
        IndexedArray::from_groups(groups.iter().copied())
    }

    #[test]
    fn test_from_parts_validation() {
        assert!(IndexedArray::from_parts(vec![1, 2], vec![0, 1, 2]).is_ok());
        assert!(IndexedArray::from_parts(vec![1, 2], vec![1, 2]).is_err());
        assert!(IndexedArray::from_parts(vec![1, 2], vec![0, 1]).is_err());
        assert!(IndexedArray::from_parts(vec![1, 2], vec![0, 2, 1, 2]).is_err());
        assert!(IndexedArray::from_parts(vec![], vec![]).is_err());
    }

    #[test]
    fn test_empty() {
        let a = IndexedArray::new();
        assert!(a.is_empty());
        assert_eq!(a.offsets(), &[0]);
        let rev = a.build_reverse(3).unwrap();
        assert_eq!(rev.len(), 3);
        assert!(rev.iter().all(<[i64]>::is_empty));
    }

    #[test]
    fn test_build_reverse_out_of_range() {
        let a = arr(&[&[0, 5]]);
        let err = a.build_reverse(3).unwrap_err();
        assert!(matches!(err, MeshError::OutOfRange { id: 5, bound: 3, .. }));
    }

    #[test]
    fn test_reverse_of_reverse() {
        let a = arr(&[&[1, 2], &[0], &[2, 1, 0], &[]]);
        let rev = a.build_reverse(3).unwrap();
        let back = rev.build_reverse(4).unwrap();
        for g in 0..a.len() {
            let mut x = a.group(g).to_vec();
            let mut y = back.group(g).to_vec();
            x.sort_unstable();
            y.sort_unstable();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_old_to_new_tie_break() {
        let groups = arr(&[&[4, 0], &[2, 3]]);
        let (o2n, n) = convert_index_array_to_old_to_new(6, &groups).unwrap();
        assert_eq!(n, 4);
        assert_eq!(o2n, vec![0, 1, 2, 2, 0, 3]);
    }

    #[test]
    fn test_old_to_new_out_of_range() {
        let groups = arr(&[&[0, 7]]);
        assert!(convert_index_array_to_old_to_new(3, &groups).is_err());
    }

    #[test]
    fn test_invert_old_to_new() {
        let n2o = invert_old_to_new(&[1, 0, -1, 1], 2).unwrap();
        assert_eq!(n2o, vec![1, 0]);
        assert!(invert_old_to_new(&[3], 2).is_err());
    }

    #[test]
    fn test_extract_groups() {
        let a = arr(&[&[1], &[2, 3], &[4]]);
        let e = a.extract_groups(&[2, 0]).unwrap();
        assert_eq!(e.group(0), &[4]);
        assert_eq!(e.group(1), &[1]);
        assert!(a.extract_groups(&[3]).is_err());
    }
}
