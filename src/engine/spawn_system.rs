use super::*;

use crate::constants::ENEMY_SPAWN_MIN_DISTANCE;

pub(super) fn pick_hero_spawn(world: &GeneratedWorld, rng: &mut Rng) -> Result<Cell, MazeError> {
    if world.floor_cells.is_empty() {
        return Err(MazeError::GenerationFailure {
            what: "hero spawn",
            attempts: 0,
        });
    }
    Ok(world.floor_cells[rng.pick_index(world.floor_cells.len())])
}

/// Enemy spawn cells on floor, one per enemy, distinct where the floor allows.
/// Cells at least `ENEMY_SPAWN_MIN_DISTANCE` from the hero are preferred.
pub(super) fn pick_enemy_spawns(
    world: &GeneratedWorld,
    hero_cell: Cell,
    count: usize,
    rng: &mut Rng,
) -> Vec<Cell> {
    let mut spawns: Vec<Cell> = Vec::with_capacity(count);
    for _ in 0..count {
        let far: Vec<Cell> = world
            .floor_cells
            .iter()
            .copied()
            .filter(|cell| {
                cell.manhattan(hero_cell) >= ENEMY_SPAWN_MIN_DISTANCE && !spawns.contains(cell)
            })
            .collect();
        let candidates = if far.is_empty() {
            world
                .floor_cells
                .iter()
                .copied()
                .filter(|cell| *cell != hero_cell)
                .collect()
        } else {
            far
        };
        if candidates.is_empty() {
            break;
        }
        spawns.push(candidates[rng.pick_index(candidates.len())]);
    }
    spawns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn corridor_world() -> GeneratedWorld {
        let grid = Grid::parse(&["#########E#", "#.........#", "###########"])
            .expect("grid should parse");
        GeneratedWorld::from_grid(grid).expect("world should build")
    }

    #[test]
    fn enemies_prefer_distant_distinct_cells() {
        let world = corridor_world();
        let mut rng = Rng::new(4);
        let hero = Cell::new(1, 1);
        let spawns = pick_enemy_spawns(&world, hero, 3, &mut rng);
        assert_eq!(spawns.len(), 3);
        for spawn in &spawns {
            assert!(spawn.manhattan(hero) >= ENEMY_SPAWN_MIN_DISTANCE);
        }
        let mut unique = spawns.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn cramped_levels_fall_back_to_any_other_floor() {
        let world = corridor_world();
        let mut rng = Rng::new(4);
        let hero = Cell::new(1, 5);
        let spawns = pick_enemy_spawns(&world, hero, 2, &mut rng);
        assert_eq!(spawns.len(), 2);
        assert!(spawns.iter().all(|cell| *cell != hero));
    }

    #[test]
    fn hero_spawns_on_floor() {
        let world = corridor_world();
        for seed in 0..50u32 {
            let mut rng = Rng::new(seed);
            let cell = pick_hero_spawn(&world, &mut rng).expect("corridor has floor");
            assert!(world.floor_cells.contains(&cell));
        }
    }
}
