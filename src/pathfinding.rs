use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::grid::Grid;
use crate::types::{Cell, Direction};

/// A* over non-wall cells with unit step cost. Returns the full path
/// `start..=goal`, or `None` when either end is blocked or unreachable.
///
/// Equal `f` scores pop in insertion order, and closed nodes are never
/// reopened, so the chosen path is stable for a given grid.
pub fn find_path(grid: &Grid, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
    if !grid.is_open(start) || !grid.is_open(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let cols = grid.cols();
    let size = grid.rows() * cols;
    let index = |cell: Cell| cell.row as usize * cols + cell.col as usize;

    let mut g_score = vec![i32::MAX; size];
    let mut parent: Vec<Option<Cell>> = vec![None; size];
    let mut closed = vec![false; size];
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;

    g_score[index(start)] = 0;
    open.push((Reverse(start.manhattan(goal)), Reverse(seq), start));

    while let Some((_, _, current)) = open.pop() {
        let current_idx = index(current);
        if closed[current_idx] {
            continue;
        }
        if current == goal {
            return Some(reconstruct(&parent, index, goal));
        }
        closed[current_idx] = true;

        let next_g = g_score[current_idx] + 1;
        for dir in Direction::ALL {
            let next = current.offset(dir);
            if !grid.is_open(next) {
                continue;
            }
            let next_idx = index(next);
            if closed[next_idx] || next_g >= g_score[next_idx] {
                continue;
            }
            g_score[next_idx] = next_g;
            parent[next_idx] = Some(current);
            seq += 1;
            open.push((Reverse(next_g + next.manhattan(goal)), Reverse(seq), next));
        }
    }

    None
}

fn reconstruct(parent: &[Option<Cell>], index: impl Fn(Cell) -> usize, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while let Some(prev) = parent[index(cursor)] {
        path.push(prev);
        cursor = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::world::generate_world;

    fn bfs_distance(grid: &Grid, start: Cell, goal: Cell) -> Option<usize> {
        let mut dist = vec![usize::MAX; grid.rows() * grid.cols()];
        let index = |cell: Cell| cell.row as usize * grid.cols() + cell.col as usize;
        let mut queue = VecDeque::new();
        dist[index(start)] = 0;
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            if cell == goal {
                return Some(dist[index(cell)]);
            }
            for dir in Direction::ALL {
                let next = cell.offset(dir);
                if grid.is_open(next) && dist[index(next)] == usize::MAX {
                    dist[index(next)] = dist[index(cell)] + 1;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn assert_valid_path(grid: &Grid, path: &[Cell], start: Cell, goal: Cell) {
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
            assert!(grid.is_open(pair[1]));
        }
    }

    #[test]
    fn paths_match_bfs_length_on_generated_levels() {
        for seed in 0..60u32 {
            let world = generate_world(10, 12, seed).expect("world should generate");
            let cells = &world.floor_cells;
            let start = cells[seed as usize % cells.len()];
            let goal = cells[(seed as usize * 7 + 3) % cells.len()];
            let path = find_path(&world.grid, start, goal).expect("maze is connected");
            assert_valid_path(&world.grid, &path, start, goal);
            assert_eq!(
                Some(path.len() - 1),
                bfs_distance(&world.grid, start, goal),
                "seed={seed}"
            );
        }
    }

    #[test]
    fn manhattan_never_overestimates() {
        for seed in 0..200u32 {
            let world = generate_world(6, 6, seed).expect("world should generate");
            let goal = world.exit;
            for cell in world.floor_cells.iter().step_by(5) {
                let actual = bfs_distance(&world.grid, *cell, goal).expect("maze is connected");
                assert!(cell.manhattan(goal) as usize <= actual, "seed={seed}");
            }
        }
    }

    #[test]
    fn open_room_path_is_shortest() {
        let grid = Grid::parse(&[
            "#######",
            "#.....#",
            "#.###.#",
            "#.....#",
            "#######",
        ])
        .expect("grid should parse");
        let path = find_path(&grid, Cell::new(1, 1), Cell::new(3, 5)).expect("path exists");
        assert_eq!(path.len(), 7);
        assert_valid_path(&grid, &path, Cell::new(1, 1), Cell::new(3, 5));
    }

    #[test]
    fn blocked_or_unreachable_goals_yield_none() {
        let grid = Grid::parse(&["#####", "#.#.#", "#####"]).expect("grid should parse");
        assert_eq!(find_path(&grid, Cell::new(1, 1), Cell::new(1, 3)), None);
        assert_eq!(find_path(&grid, Cell::new(1, 1), Cell::new(0, 0)), None);
        assert_eq!(find_path(&grid, Cell::new(1, 1), Cell::new(7, 7)), None);
        assert_eq!(find_path(&grid, Cell::new(-1, 1), Cell::new(1, 1)), None);
    }

    #[test]
    fn start_equal_to_goal_is_single_cell() {
        let grid = Grid::parse(&["###", "#.#", "###"]).expect("grid should parse");
        assert_eq!(
            find_path(&grid, Cell::new(1, 1), Cell::new(1, 1)),
            Some(vec![Cell::new(1, 1)])
        );
    }

    #[test]
    fn items_and_exit_are_searchable() {
        let grid = Grid::parse(&["#####", "#.c^E", "#####"]).expect("grid should parse");
        let path = find_path(&grid, Cell::new(1, 1), Cell::new(1, 4)).expect("path exists");
        assert_eq!(path.len(), 4);
    }
}
