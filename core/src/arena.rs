//! Fixed diamond arena geometry.
//!
//! The arena is a 28×28 bounding square with the corners cut away. Rows below
//! [`HALF_ARENA`] belong to the own half; the rest belong to the opponent.
//! Dense per-cell storage is addressed through [`index`], which maps every
//! in-arena cell to `y * ARENA_SIZE + x`.

use crate::CellCoord;

/// Number of cells along each side of the arena's bounding square.
pub const ARENA_SIZE: u32 = 28;

/// Half of [`ARENA_SIZE`]. Rows below this value form the own half.
pub const HALF_ARENA: u32 = 14;

/// Number of dense slots addressed by [`index`], including cut-away corners.
pub const CELL_SLOTS: usize = (ARENA_SIZE * ARENA_SIZE) as usize;

/// Diagonal edges of the arena diamond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Lower-left edge of the own half.
    BottomLeft,
    /// Lower-right edge of the own half.
    BottomRight,
    /// Upper-left edge of the opponent half.
    TopLeft,
    /// Upper-right edge of the opponent half.
    TopRight,
}

impl Edge {
    /// Edges bordering the own half.
    pub const OWN: [Edge; 2] = [Edge::BottomLeft, Edge::BottomRight];

    /// Edges bordering the opponent half.
    pub const OPPONENT: [Edge; 2] = [Edge::TopLeft, Edge::TopRight];

    /// Cells lying on the edge, ordered from the arena's centre line outward.
    pub fn cells(self) -> impl Iterator<Item = CellCoord> {
        (0..HALF_ARENA).map(move |n| match self {
            Edge::BottomLeft => CellCoord::new(HALF_ARENA - 1 - n, n),
            Edge::BottomRight => CellCoord::new(HALF_ARENA + n, n),
            Edge::TopLeft => CellCoord::new(HALF_ARENA - 1 - n, ARENA_SIZE - 1 - n),
            Edge::TopRight => CellCoord::new(HALF_ARENA + n, ARENA_SIZE - 1 - n),
        })
    }

    /// Reports whether the cell lies on this edge.
    #[must_use]
    pub fn contains(self, cell: CellCoord) -> bool {
        let (x, y) = (cell.x(), cell.y());
        match self {
            Edge::BottomLeft => y < HALF_ARENA && x + y == HALF_ARENA - 1,
            Edge::BottomRight => y < HALF_ARENA && x == y + HALF_ARENA,
            Edge::TopLeft => (HALF_ARENA..ARENA_SIZE).contains(&y) && y == x + HALF_ARENA,
            Edge::TopRight => {
                (HALF_ARENA..ARENA_SIZE).contains(&y) && x + y == ARENA_SIZE + HALF_ARENA - 1
            }
        }
    }

    /// Edge diagonally across the arena.
    #[must_use]
    pub const fn opposite(self) -> Edge {
        match self {
            Edge::BottomLeft => Edge::TopRight,
            Edge::BottomRight => Edge::TopLeft,
            Edge::TopLeft => Edge::BottomRight,
            Edge::TopRight => Edge::BottomLeft,
        }
    }
}

/// Region tag attached to every in-arena cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    /// Own half, on one of the own edges.
    OwnEdge,
    /// Own half, away from the edges.
    OwnInterior,
    /// Opponent half, on one of the opponent edges.
    OpponentEdge,
    /// Opponent half, away from the edges.
    OpponentInterior,
}

impl Region {
    /// Reports whether the region belongs to the own half.
    #[must_use]
    pub const fn is_own_half(self) -> bool {
        matches!(self, Region::OwnEdge | Region::OwnInterior)
    }
}

/// Reports whether the cell lies inside the arena diamond.
#[must_use]
pub fn contains(cell: CellCoord) -> bool {
    let (x, y) = (cell.x(), cell.y());
    if y >= ARENA_SIZE {
        return false;
    }
    let row_size = if y < HALF_ARENA { y + 1 } else { ARENA_SIZE - y };
    let start = HALF_ARENA - row_size;
    let end = start + 2 * row_size - 1;
    (start..=end).contains(&x)
}

/// Dense storage slot of an in-arena cell.
#[must_use]
pub fn index(cell: CellCoord) -> Option<usize> {
    if !contains(cell) {
        return None;
    }
    let row = usize::try_from(cell.y()).ok()?;
    let column = usize::try_from(cell.x()).ok()?;
    Some(row * ARENA_SIZE as usize + column)
}

/// Inverse of [`index`]. Slots in the cut-away corners yield `None`.
#[must_use]
pub fn cell_at(slot: usize) -> Option<CellCoord> {
    let size = ARENA_SIZE as usize;
    let x = u32::try_from(slot % size).ok()?;
    let y = u32::try_from(slot / size).ok()?;
    let cell = CellCoord::new(x, y);
    contains(cell).then_some(cell)
}

/// Every in-arena cell in row-major order.
pub fn cells() -> impl Iterator<Item = CellCoord> {
    (0..ARENA_SIZE)
        .flat_map(|y| (0..ARENA_SIZE).map(move |x| CellCoord::new(x, y)))
        .filter(|cell| contains(*cell))
}

/// Classifies an in-arena cell.
#[must_use]
pub fn region(cell: CellCoord) -> Option<Region> {
    if !contains(cell) {
        return None;
    }
    let on_edge = edge_of(cell).is_some();
    let region = match (cell.y() < HALF_ARENA, on_edge) {
        (true, true) => Region::OwnEdge,
        (true, false) => Region::OwnInterior,
        (false, true) => Region::OpponentEdge,
        (false, false) => Region::OpponentInterior,
    };
    Some(region)
}

/// Edge the cell lies on, if any.
#[must_use]
pub fn edge_of(cell: CellCoord) -> Option<Edge> {
    [Edge::BottomLeft, Edge::BottomRight, Edge::TopLeft, Edge::TopRight]
        .into_iter()
        .find(|edge| edge.contains(cell))
}

/// Edge a mobile unit launched from `start` travels toward.
#[must_use]
pub fn target_edge(start: CellCoord) -> Edge {
    let left = start.x() < HALF_ARENA;
    let bottom = start.y() < HALF_ARENA;
    match (left, bottom) {
        (true, true) => Edge::TopRight,
        (false, true) => Edge::TopLeft,
        (true, false) => Edge::BottomRight,
        (false, false) => Edge::BottomLeft,
    }
}

/// Euclidean distance between two cells.
#[must_use]
pub fn distance(a: CellCoord, b: CellCoord) -> f32 {
    let dx = a.x() as f32 - b.x() as f32;
    let dy = a.y() as f32 - b.y() as f32;
    (dx * dx + dy * dy).sqrt()
}

/// 4-connected neighbours of `cell` inside a `width` × `height` rectangle.
///
/// The arena diamond is not applied here; callers working on the arena
/// filter with [`contains`].
pub fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.y().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.x(), row));
        count += 1;
    }

    if let Some(column) = cell.x().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.y()));
            count += 1;
        }
    }

    if let Some(row) = cell.y().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.x(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.x().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.y()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
