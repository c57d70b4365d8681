//! Reverse breadth-first distance field used to route mobile units to an edge.

use std::collections::VecDeque;

use lane_defence_core::{arena, CellCoord};

/// Dense distance grid seeded from the cells of a target edge.
///
/// The field covers the arena's bounding square and stores the reverse
/// breadth-first search results used to walk a launched unit toward its
/// target edge. Distances default to `u16::MAX` for unreachable cells so
/// callers can distinguish blocked cells from traversable ones.
#[derive(Clone, Debug, Default)]
pub(crate) struct NavigationField {
    width: u32,
    height: u32,
    distances: Vec<u16>,
}

impl NavigationField {
    /// Rebuilds the distances using a reverse breadth-first search.
    pub(crate) fn rebuild_with<F>(
        &mut self,
        width: u32,
        height: u32,
        exits: impl IntoIterator<Item = CellCoord>,
        mut is_blocked: F,
    ) where
        F: FnMut(CellCoord) -> bool,
    {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;

        if cell_count == 0 {
            self.distances.clear();
            return;
        }

        if self.distances.len() != cell_count {
            self.distances = vec![u16::MAX; cell_count];
        } else {
            self.distances.fill(u16::MAX);
        }

        let mut queue = VecDeque::new();

        for exit in exits {
            if exit.x() >= width || exit.y() >= height || is_blocked(exit) {
                continue;
            }

            if let Some(index) = index(width_usize, exit) {
                if self.distances[index] == 0 {
                    continue;
                }

                self.distances[index] = 0;
                queue.push_back(exit);
            }
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = index(width_usize, cell) else {
                continue;
            };
            let current_distance = self.distances[current_index];

            if current_distance >= u16::MAX.saturating_sub(1) {
                continue;
            }

            let next_distance = current_distance + 1;

            for neighbor in arena::neighbors(cell, width, height) {
                if is_blocked(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = index(width_usize, neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Distance captured for the provided cell, if it lies within the field.
    #[must_use]
    pub(crate) fn distance(&self, cell: CellCoord) -> Option<u16> {
        if cell.x() >= self.width || cell.y() >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        index(width, cell).and_then(|offset| self.distances.get(offset).copied())
    }

    /// Walks downhill from `start` until a zero-distance cell is reached.
    ///
    /// Returns an empty path when `start` cannot reach any exit. Among equally
    /// short steps the first neighbour in [`arena::neighbors`] order wins.
    #[must_use]
    pub(crate) fn descend(&self, start: CellCoord) -> Vec<CellCoord> {
        let Some(mut remaining) = self.distance(start).filter(|d| *d != u16::MAX) else {
            return Vec::new();
        };

        let mut path = Vec::with_capacity(usize::from(remaining) + 1);
        let mut current = start;
        path.push(current);

        while remaining > 0 {
            let next = arena::neighbors(current, self.width, self.height)
                .find(|neighbor| self.distance(*neighbor) == Some(remaining - 1));
            let Some(next) = next else {
                return Vec::new();
            };
            path.push(next);
            current = next;
            remaining -= 1;
        }

        path
    }
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.x()).ok()?;
    let row = usize::try_from(cell.y()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_with_sets_exit_cells_to_zero() {
        let mut field = NavigationField::default();
        let exits = [CellCoord::new(1, 2)];

        field.rebuild_with(3, 4, exits, |_| false);

        assert_eq!(field.distance(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(CellCoord::new(0, 0)), Some(3));
    }

    #[test]
    fn rebuild_with_respects_walls() {
        let mut field = NavigationField::default();
        let exits = [CellCoord::new(1, 2)];
        let wall = CellCoord::new(1, 1);

        field.rebuild_with(3, 4, exits, |cell| cell == wall);

        assert_eq!(field.distance(wall), Some(u16::MAX));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(CellCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn descend_follows_decreasing_distances() {
        let mut field = NavigationField::default();
        field.rebuild_with(3, 3, [CellCoord::new(2, 2)], |_| false);

        let path = field.descend(CellCoord::new(0, 0));

        assert_eq!(path.first(), Some(&CellCoord::new(0, 0)));
        assert_eq!(path.last(), Some(&CellCoord::new(2, 2)));
        assert_eq!(path.len(), 5);
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn descend_is_empty_when_sealed_off() {
        let mut field = NavigationField::default();
        let exits = [CellCoord::new(2, 0)];

        field.rebuild_with(3, 1, exits, |cell| cell == CellCoord::new(1, 0));

        assert!(field.descend(CellCoord::new(0, 0)).is_empty());
        assert_eq!(field.descend(CellCoord::new(2, 0)), vec![CellCoord::new(2, 0)]);
    }
}
