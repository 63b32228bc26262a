//! Node set shared by every mesh: coordinates plus geometric transforms.

use hashbrown::HashMap;
use mesh_types::{
    Coords, IndexedArray, MeshError, MeshResult, SharedCoords, convert_index_array_to_old_to_new,
    to_id, to_index,
};
use nalgebra::{Rotation3, Unit, Vector3};
use smallvec::SmallVec;
use tracing::debug;

/// Coordinates of a mesh, possibly shared with other meshes.
///
/// Transforms write through the shared handle, so every mesh holding a
/// clone of the same [`SharedCoords`] sees them. Operations that change the
/// number of nodes install a fresh buffer on this set only.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    coords: Option<SharedCoords>,
}

impl PointSet {
    /// A point set without coordinates.
    #[must_use]
    pub const fn new() -> Self {
        Self { coords: None }
    }

    /// A point set over the given coordinates.
    #[must_use]
    pub fn with_coords(coords: impl Into<SharedCoords>) -> Self {
        Self {
            coords: Some(coords.into()),
        }
    }

    /// Install coordinates, replacing any previous handle.
    pub fn set_coords(&mut self, coords: impl Into<SharedCoords>) {
        self.coords = Some(coords.into());
    }

    /// The coordinate handle.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] if no coordinates were set.
    pub fn coords(&self) -> MeshResult<&SharedCoords> {
        self.coords
            .as_ref()
            .ok_or(MeshError::not_configured("coordinates"))
    }

    /// Whether coordinates were set.
    #[must_use]
    pub const fn has_coords(&self) -> bool {
        self.coords.is_some()
    }

    /// Whether both sets alias the same coordinate buffer.
    #[must_use]
    pub fn shares_coords_with(&self, other: &Self) -> bool {
        match (&self.coords, &other.coords) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Number of nodes.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] if no coordinates were set.
    pub fn number_of_nodes(&self) -> MeshResult<usize> {
        Ok(self.coords()?.read().number_of_nodes())
    }

    /// Number of components per node.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] if no coordinates were set.
    pub fn space_dimension(&self) -> MeshResult<usize> {
        Ok(self.coords()?.read().dim())
    }

    /// Group nodes lying within `precision` of each other.
    ///
    /// Nodes are scanned in ascending order; each not yet grouped node forms
    /// a group with every other ungrouped node at distance `<= precision`.
    /// Only groups of at least two nodes are reported, members ascending.
    /// With `limit_node_id`, a group whose members are all below the limit is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates and
    /// [`MeshError::InvalidArgument`] for a negative precision.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Coords;
    /// use mesh_unstructured::PointSet;
    ///
    /// let coords = Coords::new(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1e-9, 1.0, 1e-9], 2).unwrap();
    /// let ps = PointSet::with_coords(coords);
    /// let groups = ps.find_coincident_nodes(1e-6, None).unwrap();
    /// assert_eq!(groups.len(), 2);
    /// assert_eq!(groups.group(0), &[0, 2]);
    /// assert_eq!(groups.group(1), &[1, 3]);
    ///
    /// let limited = ps.find_coincident_nodes(1e-6, Some(3)).unwrap();
    /// assert_eq!(limited.len(), 1);
    /// ```
    pub fn find_coincident_nodes(
        &self,
        precision: f64,
        limit_node_id: Option<usize>,
    ) -> MeshResult<IndexedArray> {
        if precision < 0.0 || precision.is_nan() {
            return Err(MeshError::invalid_argument(format!(
                "coincidence precision must be non-negative, got {precision}"
            )));
        }
        let coords = self.coords()?.read();
        let n = coords.number_of_nodes();
        let hashed = coords.dim().min(3);
        let cell_size = if precision > 0.0 { 2.0 * precision } else { 1.0 };

        let mut spatial_hash: HashMap<[i64; 3], SmallVec<[usize; 4]>> = HashMap::new();
        for (idx, p) in coords.iter().enumerate() {
            spatial_hash
                .entry(pos_to_cell(p, cell_size))
                .or_default()
                .push(idx);
        }

        let offsets = neighborhood(hashed);
        let mut grouped = vec![false; n];
        let mut groups = IndexedArray::new();
        let mut members = Vec::new();
        for idx in 0..n {
            if grouped[idx] {
                continue;
            }
            let p = coords.node(idx);
            let cell = pos_to_cell(p, cell_size);
            members.clear();
            members.push(idx);
            for off in &offsets {
                let key = [cell[0] + off[0], cell[1] + off[1], cell[2] + off[2]];
                let Some(candidates) = spatial_hash.get(&key) else {
                    continue;
                };
                for &other in candidates {
                    if other <= idx || grouped[other] {
                        continue;
                    }
                    if distance(p, coords.node(other)) <= precision {
                        members.push(other);
                    }
                }
            }
            if members.len() < 2 {
                continue;
            }
            members.sort_unstable();
            for &m in &members {
                grouped[m] = true;
            }
            let keep = limit_node_id.is_none_or(|limit| members.iter().any(|&m| m >= limit));
            if keep {
                groups.push_group(members.iter().map(|&m| to_id(m)));
            }
        }
        debug!(nodes = n, groups = groups.len(), precision, "coincident nodes found");
        Ok(groups)
    }

    /// Old-to-new renumbering collapsing every group onto one new id.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates and
    /// [`MeshError::OutOfRange`] for a group member that is not a node.
    pub fn build_permutation_removing_duplicates(
        &self,
        groups: &IndexedArray,
    ) -> MeshResult<(Vec<i64>, usize)> {
        convert_index_array_to_old_to_new(self.number_of_nodes()?, groups)
    }

    /// Bounding box as `[min0, max0, min1, max1, ...]`.
    ///
    /// An empty node set yields `[f64::MAX, -f64::MAX, ...]`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates.
    pub fn bounding_box(&self) -> MeshResult<Vec<f64>> {
        let coords = self.coords()?.read();
        let dim = coords.dim();
        let mut bbox: Vec<f64> = (0..2 * dim)
            .map(|i| if i % 2 == 0 { f64::MAX } else { -f64::MAX })
            .collect();
        for p in coords.iter() {
            for (k, &v) in p.iter().enumerate() {
                bbox[2 * k] = bbox[2 * k].min(v);
                bbox[2 * k + 1] = bbox[2 * k + 1].max(v);
            }
        }
        Ok(bbox)
    }

    /// Ids of the nodes within `eps` of `point`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates and
    /// [`MeshError::DimensionMismatch`] if `point` does not have one component
    /// per space dimension.
    pub fn nodes_near_point(&self, point: &[f64], eps: f64) -> MeshResult<Vec<usize>> {
        let coords = self.coords()?.read();
        check_components("point", coords.dim(), point.len())?;
        Ok(coords
            .iter()
            .enumerate()
            .filter_map(|(i, p)| (distance(p, point) <= eps).then_some(i))
            .collect())
    }

    /// Whether two flat `[min, max]` boxes overlap once the first one is
    /// widened by `eps` times its largest extent.
    #[must_use]
    pub fn intersects_bounding_box(bb1: &[f64], bb2: &[f64], dim: usize, eps: f64) -> bool {
        let delta_max = (0..dim)
            .map(|i| bb1[2 * i + 1] - bb1[2 * i])
            .fold(0.0_f64, f64::max);
        (0..dim).all(|i| {
            let lo = bb1[2 * i] - delta_max * eps;
            let hi = bb1[2 * i + 1] + delta_max * eps;
            lo < bb2[2 * i + 1] && bb2[2 * i] < hi
        })
    }

    /// Translate every node by `vector`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates and
    /// [`MeshError::DimensionMismatch`] for a vector of the wrong size.
    pub fn translate(&mut self, vector: &[f64]) -> MeshResult<()> {
        let mut coords = self.coords()?.write();
        check_components("translation vector", coords.dim(), vector.len())?;
        let dim = coords.dim();
        for p in coords.as_mut_slice().chunks_exact_mut(dim) {
            for (c, v) in p.iter_mut().zip(vector) {
                *c += v;
            }
        }
        Ok(())
    }

    /// Homothety of ratio `factor` around `center`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates and
    /// [`MeshError::DimensionMismatch`] for a center of the wrong size.
    pub fn scale(&mut self, center: &[f64], factor: f64) -> MeshResult<()> {
        let mut coords = self.coords()?.write();
        check_components("scaling center", coords.dim(), center.len())?;
        let dim = coords.dim();
        for p in coords.as_mut_slice().chunks_exact_mut(dim) {
            for (c, o) in p.iter_mut().zip(center) {
                *c = o + factor * (*c - o);
            }
        }
        Ok(())
    }

    /// Rotate by `angle` radians around `center`.
    ///
    /// In 2D the axis is ignored. In 3D it is required.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DimensionMismatch`] for a space dimension other
    /// than 2 or 3 and [`MeshError::InvalidArgument`] for a missing or zero
    /// axis in 3D.
    pub fn rotate(&mut self, center: &[f64], axis: Option<&[f64]>, angle: f64) -> MeshResult<()> {
        match self.space_dimension()? {
            2 => self.rotate_2d(center, angle),
            3 => {
                let axis = axis.ok_or_else(|| {
                    MeshError::invalid_argument("a 3D rotation needs an axis vector")
                })?;
                self.rotate_3d(center, axis, angle)
            }
            other => Err(MeshError::dimension_mismatch(
                "rotation space dimension",
                3,
                to_id(other),
            )),
        }
    }

    /// Counterclockwise rotation around `center` in a 2D space.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DimensionMismatch`] unless the space is 2D.
    pub fn rotate_2d(&mut self, center: &[f64], angle: f64) -> MeshResult<()> {
        let mut coords = self.coords()?.write();
        if coords.dim() != 2 {
            return Err(MeshError::dimension_mismatch(
                "2D rotation",
                2,
                to_id(coords.dim()),
            ));
        }
        check_components("rotation center", 2, center.len())?;
        let (sin, cos) = angle.sin_cos();
        for p in coords.as_mut_slice().chunks_exact_mut(2) {
            let x = p[0] - center[0];
            let y = p[1] - center[1];
            p[0] = center[0] + cos * x - sin * y;
            p[1] = center[1] + sin * x + cos * y;
        }
        Ok(())
    }

    /// Rotation of `angle` radians around the line through `center` along
    /// `axis`, in a 3D space.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DimensionMismatch`] unless the space is 3D and
    /// [`MeshError::InvalidArgument`] if `axis` is (nearly) zero.
    pub fn rotate_3d(&mut self, center: &[f64], axis: &[f64], angle: f64) -> MeshResult<()> {
        let mut coords = self.coords()?.write();
        if coords.dim() != 3 {
            return Err(MeshError::dimension_mismatch(
                "3D rotation",
                3,
                to_id(coords.dim()),
            ));
        }
        check_components("rotation center", 3, center.len())?;
        check_components("rotation axis", 3, axis.len())?;
        let axis = Vector3::new(axis[0], axis[1], axis[2]);
        if axis.norm() < f64::EPSILON {
            return Err(MeshError::invalid_argument(
                "rotation axis has a zero magnitude",
            ));
        }
        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle);
        let origin = Vector3::new(center[0], center[1], center[2]);
        for p in coords.as_mut_slice().chunks_exact_mut(3) {
            let v = rotation * (Vector3::new(p[0], p[1], p[2]) - origin) + origin;
            p.copy_from_slice(v.as_slice());
        }
        Ok(())
    }

    /// Truncate or pad every node to `new_dim` components.
    ///
    /// Padding uses `fill`. A new buffer is installed on this set, unless the
    /// dimension is already right.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates and
    /// [`MeshError::InvalidArgument`] for `new_dim == 0`.
    pub fn change_space_dimension(&mut self, new_dim: usize, fill: f64) -> MeshResult<()> {
        let (old_dim, data) = {
            let coords = self.coords()?.read();
            if coords.dim() == new_dim {
                return Ok(());
            }
            let mut data = Vec::with_capacity(coords.number_of_nodes() * new_dim);
            for p in coords.iter() {
                data.extend((0..new_dim).map(|k| p.get(k).copied().unwrap_or(fill)));
            }
            (coords.dim(), data)
        };
        debug!(old_dim, new_dim, "space dimension changed");
        self.set_coords(Coords::new(data, new_dim)?);
        Ok(())
    }

    /// Center each component around 0 and scale it to a unit extent.
    ///
    /// Components whose extent does not exceed `eps` are only centered.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates.
    pub fn recenter_for_max_precision(&mut self, eps: f64) -> MeshResult<()> {
        let bbox = self.bounding_box()?;
        let mut coords = self.coords()?.write();
        if coords.number_of_nodes() == 0 {
            return Ok(());
        }
        let dim = coords.dim();
        for p in coords.as_mut_slice().chunks_exact_mut(dim) {
            for (k, c) in p.iter_mut().enumerate() {
                let (lo, hi) = (bbox[2 * k], bbox[2 * k + 1]);
                let delta = hi - lo;
                let offset = (lo + hi) / 2.0;
                if delta > eps {
                    *c = (*c - offset) / delta;
                } else {
                    *c -= offset;
                }
            }
        }
        Ok(())
    }

    /// Install a new buffer where old node `i` moves to `old_to_new[i]`.
    ///
    /// Negative entries drop the node. When several old nodes share a new id
    /// the first one provides the coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::SizeMismatch`] if `old_to_new` does not have one
    /// entry per node and [`MeshError::OutOfRange`] for a target
    /// `>= new_count`.
    pub fn renumber_coords(&mut self, old_to_new: &[i64], new_count: usize) -> MeshResult<()> {
        self.renumber_coords_with(old_to_new, new_count, false)
    }

    /// Like [`PointSet::renumber_coords`], each new node being the average of
    /// the old nodes mapped to it.
    ///
    /// # Errors
    ///
    /// Same as [`PointSet::renumber_coords`].
    pub fn renumber_coords_center(
        &mut self,
        old_to_new: &[i64],
        new_count: usize,
    ) -> MeshResult<()> {
        self.renumber_coords_with(old_to_new, new_count, true)
    }

    fn renumber_coords_with(
        &mut self,
        old_to_new: &[i64],
        new_count: usize,
        average: bool,
    ) -> MeshResult<()> {
        let (dim, data) = {
            let coords = self.coords()?.read();
            let n = coords.number_of_nodes();
            if old_to_new.len() != n {
                return Err(MeshError::size_mismatch(
                    "node renumbering array",
                    n,
                    old_to_new.len(),
                ));
            }
            let dim = coords.dim();
            let mut data = vec![0.0; new_count * dim];
            let mut hits = vec![0_u32; new_count];
            for (old, &new) in old_to_new.iter().enumerate() {
                let Some(t) = to_index(new) else {
                    continue;
                };
                if t >= new_count {
                    return Err(MeshError::out_of_range(
                        format!("new id of node {old}"),
                        new,
                        new_count,
                    ));
                }
                let dst = &mut data[t * dim..(t + 1) * dim];
                if average {
                    for (d, s) in dst.iter_mut().zip(coords.node(old)) {
                        *d += s;
                    }
                } else if hits[t] == 0 {
                    dst.copy_from_slice(coords.node(old));
                }
                hits[t] += 1;
            }
            if average {
                for (p, &h) in data.chunks_exact_mut(dim).zip(&hits) {
                    if h > 1 {
                        let w = f64::from(h);
                        p.iter_mut().for_each(|c| *c /= w);
                    }
                }
            }
            (dim, data)
        };
        self.set_coords(Coords::new(data, dim)?);
        Ok(())
    }
}

fn check_components(context: &str, dim: usize, len: usize) -> MeshResult<()> {
    if len == dim {
        Ok(())
    } else {
        Err(MeshError::dimension_mismatch(context, to_id(dim), to_id(len)))
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Convert a position to its spatial hash cell. Components past the third
/// are ignored, missing ones are 0.
#[allow(clippy::cast_possible_truncation)]
fn pos_to_cell(pos: &[f64], cell_size: f64) -> [i64; 3] {
    let mut cell = [0_i64; 3];
    for (c, v) in cell.iter_mut().zip(pos) {
        *c = (v / cell_size).floor() as i64;
    }
    cell
}

/// Offsets of the `3^dim` cells around a cell.
fn neighborhood(dim: usize) -> Vec<[i64; 3]> {
    let range = |k: usize| if k < dim { -1..=1 } else { 0..=0 };
    let mut out = Vec::with_capacity(27);
    for dx in range(0) {
        for dy in range(1) {
            for dz in range(2) {
                out.push([dx, dy, dz]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> PointSet {
        PointSet::with_coords(
            Coords::new(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0], 2).unwrap(),
        )
    }

    #[test]
    fn test_not_configured() {
        let ps = PointSet::new();
        assert!(matches!(
            ps.number_of_nodes(),
            Err(MeshError::NotConfigured { .. })
        ));
        assert!(ps.bounding_box().is_err());
    }

    #[test]
    fn test_bounding_box() {
        let ps = unit_square();
        assert_eq!(ps.bounding_box().unwrap(), vec![0.0, 1.0, 0.0, 1.0]);

        let empty = PointSet::with_coords(Coords::new(vec![], 2).unwrap());
        assert_eq!(
            empty.bounding_box().unwrap(),
            vec![f64::MAX, -f64::MAX, f64::MAX, -f64::MAX]
        );
    }

    #[test]
    fn test_transforms_are_shared() {
        let mut ps = unit_square();
        let alias = PointSet::with_coords(ps.coords().unwrap().clone());
        ps.translate(&[1.0, 2.0]).unwrap();
        assert_eq!(alias.coords().unwrap().read().node(0), &[1.0, 2.0]);
        assert!(ps.shares_coords_with(&alias));

        ps.scale(&[1.0, 2.0], 2.0).unwrap();
        assert_eq!(alias.coords().unwrap().read().node(2), &[3.0, 4.0]);
        assert!(ps.translate(&[1.0]).is_err());
    }

    #[test]
    fn test_rotations() {
        let mut ps = unit_square();
        ps.rotate(&[0.0, 0.0], None, std::f64::consts::FRAC_PI_2)
            .unwrap();
        let c = ps.coords().unwrap().read().clone();
        assert_relative_eq!(c.node(1)[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.node(1)[1], 1.0, epsilon = 1e-12);

        let mut ps3 = PointSet::with_coords(Coords::new(vec![1.0, 0.0, 0.0], 3).unwrap());
        assert!(matches!(
            ps3.rotate_3d(&[0.0; 3], &[0.0; 3], 1.0),
            Err(MeshError::InvalidArgument(_))
        ));
        ps3.rotate_3d(&[0.0; 3], &[0.0, 0.0, 2.0], std::f64::consts::PI)
            .unwrap();
        let c = ps3.coords().unwrap().read().clone();
        assert_relative_eq!(c.node(0)[0], -1.0, epsilon = 1e-12);
        assert!(unit_square().rotate_3d(&[0.0; 3], &[0.0, 0.0, 1.0], 1.0).is_err());
    }

    #[test]
    fn test_change_space_dimension() {
        let mut ps = unit_square();
        let before = ps.coords().unwrap().clone();
        ps.change_space_dimension(3, 7.0).unwrap();
        assert_eq!(ps.coords().unwrap().read().node(2), &[1.0, 1.0, 7.0]);
        assert!(!before.ptr_eq(ps.coords().unwrap()));

        let handle = ps.coords().unwrap().clone();
        ps.change_space_dimension(3, 0.0).unwrap();
        assert!(handle.ptr_eq(ps.coords().unwrap()));

        ps.change_space_dimension(1, 0.0).unwrap();
        assert_eq!(ps.coords().unwrap().read().as_slice(), &[0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_recenter() {
        let mut ps = PointSet::with_coords(Coords::new(vec![2.0, 5.0, 6.0, 5.0], 2).unwrap());
        ps.recenter_for_max_precision(1e-12).unwrap();
        assert_eq!(ps.coords().unwrap().read().as_slice(), &[-0.5, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_coincident_with_zero_precision() {
        let ps = PointSet::with_coords(
            Coords::new(vec![0.5, 0.5, 0.5, 0.25, 0.5, 0.5, 0.5, 0.5, 0.5], 3).unwrap(),
        );
        let groups = ps.find_coincident_nodes(0.0, None).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.group(0), &[0, 2]);
        let (o2n, n) = ps.build_permutation_removing_duplicates(&groups).unwrap();
        assert_eq!(o2n, vec![0, 1, 0]);
        assert_eq!(n, 2);
        assert!(ps.find_coincident_nodes(-1.0, None).is_err());
    }

    #[test]
    fn test_renumber_coords() {
        let mut ps = unit_square();
        ps.renumber_coords_center(&[0, 0, 1, -1], 2).unwrap();
        let c = ps.coords().unwrap().read().clone();
        assert_eq!(c.as_slice(), &[0.5, 0.0, 1.0, 1.0]);

        let mut ps = unit_square();
        ps.renumber_coords(&[1, 0, 0, 1], 2).unwrap();
        assert_eq!(
            ps.coords().unwrap().read().as_slice(),
            &[1.0, 0.0, 0.0, 0.0]
        );
        assert!(ps.renumber_coords(&[0, 5], 2).is_err());
    }

    #[test]
    fn test_near_point_and_box_overlap() {
        let ps = unit_square();
        assert_eq!(ps.nodes_near_point(&[1.0, 1.0 + 1e-9], 1e-6).unwrap(), vec![2]);
        assert!(PointSet::intersects_bounding_box(
            &[0.0, 1.0, 0.0, 1.0],
            &[1.05, 2.0, 0.0, 1.0],
            2,
            0.1
        ));
        assert!(!PointSet::intersects_bounding_box(
            &[0.0, 1.0, 0.0, 1.0],
            &[1.05, 2.0, 0.0, 1.0],
            2,
            0.01
        ));
    }
}
