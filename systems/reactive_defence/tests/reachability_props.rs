//! Property tests comparing the lane search with a brute-force closure.

use std::collections::HashSet;

use lane_defence_core::CellCoord;
use lane_defence_system_reactive_defence::lane_is_open;
use proptest::prelude::*;

/// Grows the reachable set by repeated neighbour sweeps until nothing changes.
fn closure(width: u32, height: u32, start: CellCoord, blocked: &HashSet<CellCoord>) -> HashSet<CellCoord> {
    let mut reached = HashSet::new();
    if blocked.contains(&start) {
        return reached;
    }
    let _ = reached.insert(start);

    loop {
        let mut grew = false;
        for y in 0..height {
            for x in 0..width {
                let cell = CellCoord::new(x, y);
                if reached.contains(&cell) || blocked.contains(&cell) {
                    continue;
                }
                let adjacent = reached
                    .iter()
                    .any(|other| other.manhattan_distance(cell) == 1);
                if adjacent {
                    let _ = reached.insert(cell);
                    grew = true;
                }
            }
        }
        if !grew {
            return reached;
        }
    }
}

fn fixture() -> impl Strategy<Value = (u32, u32, Vec<bool>, (u32, u32), (u32, u32))> {
    (1u32..=10, 1u32..=10).prop_flat_map(|(width, height)| {
        let cells = (width * height) as usize;
        (
            Just(width),
            Just(height),
            proptest::collection::vec(proptest::bool::weighted(0.3), cells),
            (0..width, 0..height),
            (0..width, 0..height),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn bfs_agrees_with_closure((width, height, walls, start, target) in fixture()) {
        let blocked: HashSet<CellCoord> = walls
            .iter()
            .enumerate()
            .filter(|(_, wall)| **wall)
            .map(|(index, _)| {
                let index = index as u32;
                CellCoord::new(index % width, index / width)
            })
            .collect();
        let start = CellCoord::new(start.0, start.1);
        let target = CellCoord::new(target.0, target.1);

        let expected = closure(width, height, start, &blocked).contains(&target);
        let actual = lane_is_open(width, height, start, &[target], |cell| blocked.contains(&cell));

        prop_assert_eq!(actual, expected);
    }
}
