/// Floats per point row: `x y r g b`.
pub const POINT_COMPONENTS: usize = 5;

/// Indices per index row (one triangle).
pub const TRIANGLE_CORNERS: usize = 3;

/// Geometry as read from a `[points]` / `[indices]` file.
///
/// `points` is the flat interleaved sequence `x0 y0 r0 g0 b0 x1 y1 ...` and
/// `indices` the flat triangle list, both in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub points: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Geometry {
    /// Number of points (vertices).
    pub fn point_count(&self) -> usize {
        self.points.len() / POINT_COMPONENTS
    }

    /// Number of complete triangles described by `indices`.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / TRIANGLE_CORNERS
    }

    /// Returns `true` when the geometry carries an index list.
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates points as `([x, y], [r, g, b])`.
    pub fn iter_points(&self) -> impl Iterator<Item = ([f32; 2], [f32; 3])> + '_ {
        self.points
            .chunks_exact(POINT_COMPONENTS)
            .map(|p| ([p[0], p[1]], [p[2], p[3], p[4]]))
    }
}
