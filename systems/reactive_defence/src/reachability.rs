//! Breadth-first lane reachability over a rectangular grid.

use std::collections::VecDeque;

use lane_defence_core::{arena, CellCoord};

/// Reports whether any of `targets` can be reached from `start` through
/// unblocked 4-connected cells of a `width` × `height` rectangle.
///
/// Cells are marked visited when they are enqueued, so each cell enters the
/// queue at most once, and the search returns as soon as a target is
/// dequeued. A blocked start or a blocked target is never reachable.
pub fn lane_is_open<F>(
    width: u32,
    height: u32,
    start: CellCoord,
    targets: &[CellCoord],
    mut is_blocked: F,
) -> bool
where
    F: FnMut(CellCoord) -> bool,
{
    let Some(start_slot) = slot(width, height, start) else {
        return false;
    };
    if targets.is_empty() || is_blocked(start) {
        return false;
    }

    let cell_count = usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .unwrap_or(0);
    let mut visited = vec![false; cell_count];
    let mut is_target = vec![false; cell_count];
    for target in targets {
        if let Some(index) = slot(width, height, *target) {
            is_target[index] = true;
        }
    }

    let mut queue = VecDeque::new();
    visited[start_slot] = true;
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        if slot(width, height, cell).is_some_and(|index| is_target[index]) {
            return true;
        }

        for neighbor in arena::neighbors(cell, width, height) {
            let Some(index) = slot(width, height, neighbor) else {
                continue;
            };
            if visited[index] || is_blocked(neighbor) {
                continue;
            }
            visited[index] = true;
            queue.push_back(neighbor);
        }
    }

    false
}

fn slot(width: u32, height: u32, cell: CellCoord) -> Option<usize> {
    if cell.x() >= width || cell.y() >= height {
        return None;
    }
    let row = usize::try_from(cell.y()).ok()?;
    let column = usize::try_from(cell.x()).ok()?;
    row.checked_mul(usize::try_from(width).ok()?)?
        .checked_add(column)
}
