//! Geometric cell types and their reference models.
//!
//! Each [`GeometricType`] carries read-only metadata (topological dimension,
//! node count, quadratic/extruded flags) and the templates of its sons, the
//! sub-entities one dimension below. 3D types also describe their edges,
//! two dimensions below. The integer codes returned by
//! [`GeometricType::code`] are the stable values used in nodal connectivity
//! arrays.
//!
//! Dynamic types (`POLYL`, `POLYGON`, `QPOLYG`, `POLYHED`) have no fixed node
//! count: their sons are derived from the connectivity itself. A polyhedron
//! lists its faces one after the other separated by [`FACE_SEPARATOR`].

use std::fmt;

use crate::error::{MeshError, MeshResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value separating two faces inside a polyhedron connectivity.
pub const FACE_SEPARATOR: i64 = -1;

/// Geometric type of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeometricType {
    /// Single node.
    Point1,
    /// Linear segment.
    Seg2,
    /// Quadratic segment (two ends then the mid node).
    Seg3,
    /// Cubic segment.
    Seg4,
    /// Polyline, any number of nodes.
    Polyline,
    /// Linear triangle.
    Tri3,
    /// Quadratic triangle.
    Tri6,
    /// Quadratic triangle with a center node.
    Tri7,
    /// Linear quadrangle.
    Quad4,
    /// Quadratic quadrangle.
    Quad8,
    /// Quadratic quadrangle with a center node.
    Quad9,
    /// Linear polygon.
    Polygon,
    /// Quadratic polygon: corners first, then one mid node per edge.
    QPolygon,
    /// Linear tetrahedron.
    Tetra4,
    /// Quadratic tetrahedron.
    Tetra10,
    /// Linear pyramid.
    Pyra5,
    /// Quadratic pyramid.
    Pyra13,
    /// Linear pentahedron (prism).
    Penta6,
    /// Quadratic pentahedron.
    Penta15,
    /// Quadratic pentahedron with quadrangle face centers.
    Penta18,
    /// Linear hexahedron.
    Hexa8,
    /// Quadratic hexahedron.
    Hexa20,
    /// Quadratic hexahedron with face and volume centers.
    Hexa27,
    /// Hexagonal prism.
    HexGp12,
    /// Polyhedron described face by face.
    Polyhedron,
}

/// Sub-entity template of a static cell type: a type plus local node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SonTemplate {
    /// Geometric type of the sub-entity.
    pub ty: GeometricType,
    /// Local indices into the owner's node list.
    pub nodes: &'static [usize],
}

const fn son(ty: GeometricType, nodes: &'static [usize]) -> SonTemplate {
    SonTemplate { ty, nodes }
}

use GeometricType::{
    HexGp12, Hexa8, Hexa20, Hexa27, Penta6, Penta15, Penta18, Point1, Polygon, Polyhedron,
    Polyline, Pyra5, Pyra13, QPolygon, Quad4, Quad8, Quad9, Seg2, Seg3, Seg4, Tetra4, Tetra10,
    Tri3, Tri6, Tri7,
};

const SEG_SONS: &[SonTemplate] = &[son(Point1, &[0]), son(Point1, &[1])];

const TRI3_SONS: &[SonTemplate] = &[son(Seg2, &[0, 1]), son(Seg2, &[1, 2]), son(Seg2, &[2, 0])];

const TRI6_SONS: &[SonTemplate] = &[
    son(Seg3, &[0, 1, 3]),
    son(Seg3, &[1, 2, 4]),
    son(Seg3, &[2, 0, 5]),
];

const QUAD4_SONS: &[SonTemplate] = &[
    son(Seg2, &[0, 1]),
    son(Seg2, &[1, 2]),
    son(Seg2, &[2, 3]),
    son(Seg2, &[3, 0]),
];

const QUAD8_SONS: &[SonTemplate] = &[
    son(Seg3, &[0, 1, 4]),
    son(Seg3, &[1, 2, 5]),
    son(Seg3, &[2, 3, 6]),
    son(Seg3, &[3, 0, 7]),
];

const TETRA4_SONS: &[SonTemplate] = &[
    son(Tri3, &[0, 1, 2]),
    son(Tri3, &[0, 3, 1]),
    son(Tri3, &[1, 3, 2]),
    son(Tri3, &[2, 3, 0]),
];

const TETRA10_SONS: &[SonTemplate] = &[
    son(Tri6, &[0, 1, 2, 4, 5, 6]),
    son(Tri6, &[0, 3, 1, 7, 8, 4]),
    son(Tri6, &[1, 3, 2, 8, 9, 5]),
    son(Tri6, &[2, 3, 0, 9, 7, 6]),
];

const PYRA5_SONS: &[SonTemplate] = &[
    son(Quad4, &[0, 1, 2, 3]),
    son(Tri3, &[0, 4, 1]),
    son(Tri3, &[1, 4, 2]),
    son(Tri3, &[2, 4, 3]),
    son(Tri3, &[3, 4, 0]),
];

const PYRA13_SONS: &[SonTemplate] = &[
    son(Quad8, &[0, 1, 2, 3, 5, 6, 7, 8]),
    son(Tri6, &[0, 4, 1, 9, 10, 5]),
    son(Tri6, &[1, 4, 2, 10, 11, 6]),
    son(Tri6, &[2, 4, 3, 11, 12, 7]),
    son(Tri6, &[3, 4, 0, 12, 9, 8]),
];

const PENTA6_SONS: &[SonTemplate] = &[
    son(Tri3, &[0, 1, 2]),
    son(Tri3, &[3, 5, 4]),
    son(Quad4, &[0, 3, 4, 1]),
    son(Quad4, &[1, 4, 5, 2]),
    son(Quad4, &[2, 5, 3, 0]),
];

const PENTA15_SONS: &[SonTemplate] = &[
    son(Tri6, &[0, 1, 2, 6, 7, 8]),
    son(Tri6, &[3, 5, 4, 11, 10, 9]),
    son(Quad8, &[0, 3, 4, 1, 12, 9, 13, 6]),
    son(Quad8, &[1, 4, 5, 2, 13, 10, 14, 7]),
    son(Quad8, &[2, 5, 3, 0, 14, 11, 12, 8]),
];

const PENTA18_SONS: &[SonTemplate] = &[
    son(Tri6, &[0, 1, 2, 6, 7, 8]),
    son(Tri6, &[3, 5, 4, 11, 10, 9]),
    son(Quad9, &[0, 3, 4, 1, 12, 9, 13, 6, 15]),
    son(Quad9, &[1, 4, 5, 2, 13, 10, 14, 7, 16]),
    son(Quad9, &[2, 5, 3, 0, 14, 11, 12, 8, 17]),
];

const HEXA8_SONS: &[SonTemplate] = &[
    son(Quad4, &[0, 1, 2, 3]),
    son(Quad4, &[4, 7, 6, 5]),
    son(Quad4, &[0, 4, 5, 1]),
    son(Quad4, &[1, 5, 6, 2]),
    son(Quad4, &[2, 6, 7, 3]),
    son(Quad4, &[3, 7, 4, 0]),
];

const HEXA20_SONS: &[SonTemplate] = &[
    son(Quad8, &[0, 1, 2, 3, 8, 9, 10, 11]),
    son(Quad8, &[4, 7, 6, 5, 15, 14, 13, 12]),
    son(Quad8, &[0, 4, 5, 1, 16, 12, 17, 8]),
    son(Quad8, &[1, 5, 6, 2, 17, 13, 18, 9]),
    son(Quad8, &[2, 6, 7, 3, 18, 14, 19, 10]),
    son(Quad8, &[3, 7, 4, 0, 19, 15, 16, 11]),
];

const HEXA27_SONS: &[SonTemplate] = &[
    son(Quad9, &[0, 1, 2, 3, 8, 9, 10, 11, 20]),
    son(Quad9, &[4, 7, 6, 5, 15, 14, 13, 12, 25]),
    son(Quad9, &[0, 4, 5, 1, 16, 12, 17, 8, 21]),
    son(Quad9, &[1, 5, 6, 2, 17, 13, 18, 9, 22]),
    son(Quad9, &[2, 6, 7, 3, 18, 14, 19, 10, 23]),
    son(Quad9, &[3, 7, 4, 0, 19, 15, 16, 11, 24]),
];

const HEXGP12_SONS: &[SonTemplate] = &[
    son(Polygon, &[0, 1, 2, 3, 4, 5]),
    son(Polygon, &[6, 11, 10, 9, 8, 7]),
    son(Quad4, &[0, 6, 7, 1]),
    son(Quad4, &[1, 7, 8, 2]),
    son(Quad4, &[2, 8, 9, 3]),
    son(Quad4, &[3, 9, 10, 4]),
    son(Quad4, &[4, 10, 11, 5]),
    son(Quad4, &[5, 11, 6, 0]),
];

const TETRA4_EDGES: &[SonTemplate] = &[
    son(Seg2, &[0, 1]),
    son(Seg2, &[1, 2]),
    son(Seg2, &[2, 0]),
    son(Seg2, &[0, 3]),
    son(Seg2, &[1, 3]),
    son(Seg2, &[2, 3]),
];

const TETRA10_EDGES: &[SonTemplate] = &[
    son(Seg3, &[0, 1, 4]),
    son(Seg3, &[1, 2, 5]),
    son(Seg3, &[2, 0, 6]),
    son(Seg3, &[0, 3, 7]),
    son(Seg3, &[1, 3, 8]),
    son(Seg3, &[2, 3, 9]),
];

const PYRA5_EDGES: &[SonTemplate] = &[
    son(Seg2, &[0, 1]),
    son(Seg2, &[1, 2]),
    son(Seg2, &[2, 3]),
    son(Seg2, &[3, 0]),
    son(Seg2, &[0, 4]),
    son(Seg2, &[1, 4]),
    son(Seg2, &[2, 4]),
    son(Seg2, &[3, 4]),
];

const PYRA13_EDGES: &[SonTemplate] = &[
    son(Seg3, &[0, 1, 5]),
    son(Seg3, &[1, 2, 6]),
    son(Seg3, &[2, 3, 7]),
    son(Seg3, &[3, 0, 8]),
    son(Seg3, &[0, 4, 9]),
    son(Seg3, &[1, 4, 10]),
    son(Seg3, &[2, 4, 11]),
    son(Seg3, &[3, 4, 12]),
];

const PENTA6_EDGES: &[SonTemplate] = &[
    son(Seg2, &[0, 1]),
    son(Seg2, &[1, 2]),
    son(Seg2, &[2, 0]),
    son(Seg2, &[3, 4]),
    son(Seg2, &[4, 5]),
    son(Seg2, &[5, 3]),
    son(Seg2, &[0, 3]),
    son(Seg2, &[1, 4]),
    son(Seg2, &[2, 5]),
];

const PENTA15_EDGES: &[SonTemplate] = &[
    son(Seg3, &[0, 1, 6]),
    son(Seg3, &[1, 2, 7]),
    son(Seg3, &[2, 0, 8]),
    son(Seg3, &[3, 4, 9]),
    son(Seg3, &[4, 5, 10]),
    son(Seg3, &[5, 3, 11]),
    son(Seg3, &[0, 3, 12]),
    son(Seg3, &[1, 4, 13]),
    son(Seg3, &[2, 5, 14]),
];

const HEXA8_EDGES: &[SonTemplate] = &[
    son(Seg2, &[0, 1]),
    son(Seg2, &[1, 2]),
    son(Seg2, &[2, 3]),
    son(Seg2, &[3, 0]),
    son(Seg2, &[4, 5]),
    son(Seg2, &[5, 6]),
    son(Seg2, &[6, 7]),
    son(Seg2, &[7, 4]),
    son(Seg2, &[0, 4]),
    son(Seg2, &[1, 5]),
    son(Seg2, &[2, 6]),
    son(Seg2, &[3, 7]),
];

const HEXA20_EDGES: &[SonTemplate] = &[
    son(Seg3, &[0, 1, 8]),
    son(Seg3, &[1, 2, 9]),
    son(Seg3, &[2, 3, 10]),
    son(Seg3, &[3, 0, 11]),
    son(Seg3, &[4, 5, 12]),
    son(Seg3, &[5, 6, 13]),
    son(Seg3, &[6, 7, 14]),
    son(Seg3, &[7, 4, 15]),
    son(Seg3, &[0, 4, 16]),
    son(Seg3, &[1, 5, 17]),
    son(Seg3, &[2, 6, 18]),
    son(Seg3, &[3, 7, 19]),
];

const HEXGP12_EDGES: &[SonTemplate] = &[
    son(Seg2, &[0, 1]),
    son(Seg2, &[1, 2]),
    son(Seg2, &[2, 3]),
    son(Seg2, &[3, 4]),
    son(Seg2, &[4, 5]),
    son(Seg2, &[5, 0]),
    son(Seg2, &[6, 7]),
    son(Seg2, &[7, 8]),
    son(Seg2, &[8, 9]),
    son(Seg2, &[9, 10]),
    son(Seg2, &[10, 11]),
    son(Seg2, &[11, 6]),
    son(Seg2, &[0, 6]),
    son(Seg2, &[1, 7]),
    son(Seg2, &[2, 8]),
    son(Seg2, &[3, 9]),
    son(Seg2, &[4, 10]),
    son(Seg2, &[5, 11]),
];

impl GeometricType {
    /// Every geometric type, in code order of declaration.
    pub const ALL: [Self; 25] = [
        Point1, Seg2, Seg3, Seg4, Polyline, Tri3, Tri6, Tri7, Quad4, Quad8, Quad9, Polygon,
        QPolygon, Tetra4, Tetra10, Pyra5, Pyra13, Penta6, Penta15, Penta18, Hexa8, Hexa20,
        Hexa27, HexGp12, Polyhedron,
    ];

    /// Stable integer code stored as the first value of a cell connectivity.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Point1 => 0,
            Seg2 => 1,
            Seg3 => 2,
            Tri3 => 3,
            Quad4 => 4,
            Polygon => 5,
            Tri6 => 6,
            Tri7 => 7,
            Quad8 => 8,
            Quad9 => 9,
            Seg4 => 10,
            Tetra4 => 14,
            Pyra5 => 15,
            Penta6 => 16,
            Hexa8 => 18,
            Tetra10 => 20,
            HexGp12 => 22,
            Pyra13 => 23,
            Penta15 => 25,
            Hexa27 => 27,
            Penta18 => 28,
            Hexa20 => 30,
            Polyhedron => 31,
            QPolygon => 32,
            Polyline => 33,
        }
    }

    /// Decode a type code read from a connectivity array.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownCellType`] if `code` is not a known type.
    pub fn from_code(code: i64) -> MeshResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or(MeshError::UnknownCellType(code))
    }

    /// Short upper-case name, as written in MED files (`"HEXA8"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Point1 => "POINT1",
            Seg2 => "SEG2",
            Seg3 => "SEG3",
            Seg4 => "SEG4",
            Polyline => "POLYL",
            Tri3 => "TRI3",
            Tri6 => "TRI6",
            Tri7 => "TRI7",
            Quad4 => "QUAD4",
            Quad8 => "QUAD8",
            Quad9 => "QUAD9",
            Polygon => "POLYGON",
            QPolygon => "QPOLYG",
            Tetra4 => "TETRA4",
            Tetra10 => "TETRA10",
            Pyra5 => "PYRA5",
            Pyra13 => "PYRA13",
            Penta6 => "PENTA6",
            Penta15 => "PENTA15",
            Penta18 => "PENTA18",
            Hexa8 => "HEXA8",
            Hexa20 => "HEXA20",
            Hexa27 => "HEXA27",
            HexGp12 => "HEXGP12",
            Polyhedron => "POLYHED",
        }
    }

    /// Topological dimension.
    #[must_use]
    pub const fn dimension(self) -> usize {
        match self {
            Point1 => 0,
            Seg2 | Seg3 | Seg4 | Polyline => 1,
            Tri3 | Tri6 | Tri7 | Quad4 | Quad8 | Quad9 | Polygon | QPolygon => 2,
            Tetra4 | Tetra10 | Pyra5 | Pyra13 | Penta6 | Penta15 | Penta18 | Hexa8 | Hexa20
            | Hexa27 | HexGp12 | Polyhedron => 3,
        }
    }

    /// Fixed node count, `None` for dynamic types.
    #[must_use]
    pub const fn node_count(self) -> Option<usize> {
        match self {
            Point1 => Some(1),
            Seg2 => Some(2),
            Seg3 | Tri3 => Some(3),
            Seg4 | Quad4 | Tetra4 => Some(4),
            Pyra5 => Some(5),
            Tri6 | Penta6 => Some(6),
            Tri7 => Some(7),
            Quad8 | Hexa8 => Some(8),
            Quad9 => Some(9),
            Tetra10 => Some(10),
            HexGp12 => Some(12),
            Pyra13 => Some(13),
            Penta15 => Some(15),
            Penta18 => Some(18),
            Hexa20 => Some(20),
            Hexa27 => Some(27),
            Polyline | Polygon | QPolygon | Polyhedron => None,
        }
    }

    /// Whether the node count depends on the cell.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        self.node_count().is_none()
    }

    /// Whether the type carries mid-edge (or higher order) nodes.
    #[must_use]
    pub const fn is_quadratic(self) -> bool {
        matches!(
            self,
            Seg3 | Seg4
                | Tri6
                | Tri7
                | Quad8
                | Quad9
                | QPolygon
                | Tetra10
                | Pyra13
                | Penta15
                | Penta18
                | Hexa20
                | Hexa27
        )
    }

    /// Whether the type is a prism-like extrusion of a base face.
    #[must_use]
    pub const fn is_extruded(self) -> bool {
        matches!(self, Penta6 | Hexa8 | HexGp12)
    }

    /// Whether the type is a simplex of its dimension.
    #[must_use]
    pub const fn is_simplex(self) -> bool {
        matches!(self, Point1 | Seg2 | Seg3 | Tri3 | Tri6 | Tri7 | Tetra4 | Tetra10)
    }

    /// Number of nodes in the base face of an extruded type.
    #[must_use]
    pub const fn extruded_base_size(self) -> Option<usize> {
        match self {
            Penta6 => Some(3),
            Hexa8 => Some(4),
            HexGp12 => Some(6),
            _ => None,
        }
    }

    /// The linear type sharing the corner layout of this one.
    #[must_use]
    pub const fn linear_type(self) -> Self {
        match self {
            Seg3 | Seg4 => Seg2,
            Tri6 | Tri7 => Tri3,
            Quad8 | Quad9 => Quad4,
            QPolygon => Polygon,
            Tetra10 => Tetra4,
            Pyra13 => Pyra5,
            Penta15 | Penta18 => Penta6,
            Hexa20 | Hexa27 => Hexa8,
            other => other,
        }
    }

    /// Quadratic counterpart of a linear type.
    ///
    /// `rich` selects the variant carrying face (and volume) centers.
    /// Returns `None` when no such counterpart exists.
    #[must_use]
    pub const fn quadratic_type(self, rich: bool) -> Option<Self> {
        match (self, rich) {
            (Seg2, _) => Some(Seg3),
            (Tri3, false) => Some(Tri6),
            (Tri3, true) => Some(Tri7),
            (Quad4, false) => Some(Quad8),
            (Quad4, true) => Some(Quad9),
            (Polygon, false) => Some(QPolygon),
            (Tetra4, false) => Some(Tetra10),
            (Pyra5, false) => Some(Pyra13),
            (Penta6, false) => Some(Penta15),
            (Penta6, true) => Some(Penta18),
            (Hexa8, false) => Some(Hexa20),
            (Hexa8, true) => Some(Hexa27),
            _ => None,
        }
    }

    /// The dynamic type able to hold any cell of this dimension and order.
    #[must_use]
    pub const fn poly_type(self) -> Option<Self> {
        match self.dimension() {
            1 => Some(Polyline),
            2 => {
                if self.is_quadratic() {
                    Some(QPolygon)
                } else {
                    Some(Polygon)
                }
            }
            3 => Some(Polyhedron),
            _ => None,
        }
    }

    /// Number of corner (linear) nodes in a connectivity of `len` nodes.
    #[must_use]
    pub fn corner_count(self, len: usize) -> usize {
        match self {
            QPolygon => len / 2,
            Polyline | Polygon | Polyhedron => len,
            other => other.linear_type().node_count().unwrap_or(len),
        }
    }

    /// Son templates of a static type. Empty for dynamic types.
    #[must_use]
    pub const fn son_templates(self) -> &'static [SonTemplate] {
        match self {
            Seg2 | Seg3 | Seg4 => SEG_SONS,
            Tri3 => TRI3_SONS,
            Tri6 | Tri7 => TRI6_SONS,
            Quad4 => QUAD4_SONS,
            Quad8 | Quad9 => QUAD8_SONS,
            Tetra4 => TETRA4_SONS,
            Tetra10 => TETRA10_SONS,
            Pyra5 => PYRA5_SONS,
            Pyra13 => PYRA13_SONS,
            Penta6 => PENTA6_SONS,
            Penta15 => PENTA15_SONS,
            Penta18 => PENTA18_SONS,
            Hexa8 => HEXA8_SONS,
            Hexa20 => HEXA20_SONS,
            Hexa27 => HEXA27_SONS,
            HexGp12 => HEXGP12_SONS,
            Point1 | Polyline | Polygon | QPolygon | Polyhedron => &[],
        }
    }

    /// Edge templates of a static 3D type. Empty otherwise.
    #[must_use]
    pub const fn edge_templates(self) -> &'static [SonTemplate] {
        match self {
            Tetra4 => TETRA4_EDGES,
            Tetra10 => TETRA10_EDGES,
            Pyra5 => PYRA5_EDGES,
            Pyra13 => PYRA13_EDGES,
            Penta6 => PENTA6_EDGES,
            Penta15 | Penta18 => PENTA15_EDGES,
            Hexa8 => HEXA8_EDGES,
            Hexa20 | Hexa27 => HEXA20_EDGES,
            HexGp12 => HEXGP12_EDGES,
            _ => &[],
        }
    }

    /// Type of a polygonal face with `n` nodes, as produced by polyhedron sons.
    #[must_use]
    pub const fn face_type_for(n: usize) -> Self {
        match n {
            3 => Tri3,
            4 => Quad4,
            _ => Polygon,
        }
    }

    /// Number of sons of a cell with the given nodes (type tag excluded).
    #[must_use]
    pub fn number_of_sons(self, nodes: &[i64]) -> usize {
        match self {
            Polyline | Polygon => nodes.len(),
            QPolygon => nodes.len() / 2,
            Polyhedron => polyhedron_faces(nodes).count(),
            _ => self.son_templates().len(),
        }
    }

    /// Call `f` with the type and nodes of every son, in model order.
    pub fn for_each_son(self, nodes: &[i64], mut f: impl FnMut(Self, &[i64])) {
        match self {
            Polyline => {
                for n in nodes {
                    f(Point1, std::slice::from_ref(n));
                }
            }
            Polygon => {
                let k = nodes.len();
                for i in 0..k {
                    f(Seg2, &[nodes[i], nodes[(i + 1) % k]]);
                }
            }
            QPolygon => {
                let k = nodes.len() / 2;
                for i in 0..k {
                    f(Seg3, &[nodes[i], nodes[(i + 1) % k], nodes[k + i]]);
                }
            }
            Polyhedron => {
                for face in polyhedron_faces(nodes) {
                    f(Self::face_type_for(face.len()), face);
                }
            }
            _ => {
                let mut buf = Vec::with_capacity(9);
                for tpl in self.son_templates() {
                    buf.clear();
                    buf.extend(tpl.nodes.iter().map(|&i| nodes[i]));
                    f(tpl.ty, &buf);
                }
            }
        }
    }

    /// Call `f` with every edge of a 3D cell.
    ///
    /// Polyhedron edges are collected face by face; an edge already seen in
    /// either direction is reported only once, with its first direction.
    pub fn for_each_edge(self, nodes: &[i64], mut f: impl FnMut(Self, &[i64])) {
        if self == Polyhedron {
            let mut seen: Vec<(i64, i64)> = Vec::new();
            for face in polyhedron_faces(nodes) {
                let k = face.len();
                for i in 0..k {
                    let (a, b) = (face[i], face[(i + 1) % k]);
                    let key = (a.min(b), a.max(b));
                    if !seen.contains(&key) {
                        seen.push(key);
                        f(Seg2, &[a, b]);
                    }
                }
            }
            return;
        }
        let mut buf = Vec::with_capacity(3);
        for tpl in self.edge_templates() {
            buf.clear();
            buf.extend(tpl.nodes.iter().map(|&i| nodes[i]));
            f(tpl.ty, &buf);
        }
    }
}

impl fmt::Display for GeometricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Iterate over the non-empty faces of a polyhedron connectivity.
pub fn polyhedron_faces(nodes: &[i64]) -> impl Iterator<Item = &[i64]> {
    nodes
        .split(|&n| n == FACE_SEPARATOR)
        .filter(|face| !face.is_empty())
}

/// Reverse the orientation of a 1D cell in place.
///
/// The two end nodes are swapped; mid nodes stay put.
pub fn reverse_1d(nodes: &mut [i64]) {
    if nodes.len() >= 2 {
        nodes.swap(0, 1);
    }
}

/// Reverse the orientation of a 2D cell in place, keeping the first node.
///
/// For quadratic cells the corners are reversed around the first one and the
/// mid-edge nodes are reversed so that each stays between its two corners.
/// A center node (`TRI7`, `QUAD9`) is left untouched.
pub fn reverse_2d(ty: GeometricType, nodes: &mut [i64]) {
    let corners = ty.corner_count(nodes.len());
    if corners < 2 {
        return;
    }
    nodes[1..corners].reverse();
    if ty.is_quadratic() {
        let mids_end = (2 * corners).min(nodes.len());
        nodes[corners..mids_end].reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for ty in GeometricType::ALL {
            assert_eq!(GeometricType::from_code(ty.code()).ok(), Some(ty));
        }
        assert!(GeometricType::from_code(99).is_err());
    }

    #[test]
    fn test_static_son_templates_in_range() {
        for ty in GeometricType::ALL {
            let Some(n) = ty.node_count() else {
                continue;
            };
            for tpl in ty.son_templates() {
                assert!(tpl.nodes.iter().all(|&i| i < n), "{ty} son out of range");
                assert_eq!(tpl.ty.dimension() + 1, ty.dimension());
            }
            for tpl in ty.edge_templates() {
                assert!(tpl.nodes.iter().all(|&i| i < n), "{ty} edge out of range");
                assert_eq!(tpl.ty.dimension() + 2, ty.dimension());
            }
        }
    }

    #[test]
    fn test_son_node_counts_match_son_types() {
        for ty in GeometricType::ALL {
            for tpl in ty.son_templates().iter().chain(ty.edge_templates()) {
                if let Some(n) = tpl.ty.node_count() {
                    assert_eq!(tpl.nodes.len(), n, "{ty} -> {}", tpl.ty);
                }
            }
        }
    }

    #[test]
    fn test_hexa8_faces_cover_each_edge_twice() {
        let mut count = std::collections::HashMap::new();
        for tpl in HEXA8_SONS {
            let k = tpl.nodes.len();
            for i in 0..k {
                let (a, b) = (tpl.nodes[i], tpl.nodes[(i + 1) % k]);
                *count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        assert_eq!(count.len(), 12);
        assert!(count.values().all(|&c| c == 2));
    }

    #[test]
    fn test_polygon_sons() {
        let mut sons = Vec::new();
        GeometricType::Polygon.for_each_son(&[4, 5, 6, 7, 8], |t, n| sons.push((t, n.to_vec())));
        assert_eq!(sons.len(), 5);
        assert_eq!(sons[4], (Seg2, vec![8, 4]));
    }

    #[test]
    fn test_qpolygon_sons() {
        let mut sons = Vec::new();
        GeometricType::QPolygon.for_each_son(&[0, 1, 2, 10, 11, 12], |t, n| sons.push((t, n.to_vec())));
        assert_eq!(sons, vec![(Seg3, vec![0, 1, 10]), (Seg3, vec![1, 2, 11]), (Seg3, vec![2, 0, 12])]);
    }

    #[test]
    fn test_polyhedron_sons_and_edges() {
        // Tetrahedron written as a polyhedron.
        let conn = [0, 1, 2, -1, 0, 3, 1, -1, 1, 3, 2, -1, 2, 3, 0];
        assert_eq!(Polyhedron.number_of_sons(&conn), 4);
        let mut faces = Vec::new();
        Polyhedron.for_each_son(&conn, |t, n| faces.push((t, n.len())));
        assert!(faces.iter().all(|&(t, n)| t == Tri3 && n == 3));
        let mut edges = 0;
        Polyhedron.for_each_edge(&conn, |_, _| edges += 1);
        assert_eq!(edges, 6);
    }

    #[test]
    fn test_reverse_2d_quadratic() {
        let mut n = [0, 1, 2, 3, 10, 11, 12, 13];
        reverse_2d(Quad8, &mut n);
        assert_eq!(n, [0, 3, 2, 1, 13, 12, 11, 10]);
        let mut t = [0, 1, 2];
        reverse_2d(Tri3, &mut t);
        assert_eq!(t, [0, 2, 1]);
    }

    #[test]
    fn test_type_mappings() {
        assert_eq!(Hexa27.linear_type(), Hexa8);
        assert_eq!(Quad4.quadratic_type(true), Some(Quad9));
        assert_eq!(Tetra4.quadratic_type(true), None);
        assert_eq!(Tri6.poly_type(), Some(QPolygon));
        assert_eq!(Hexa8.poly_type(), Some(Polyhedron));
        assert_eq!(QPolygon.corner_count(10), 5);
        assert_eq!(Hexa20.corner_count(20), 8);
    }
}
