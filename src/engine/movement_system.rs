use super::*;

use crate::constants::{CORNER_INSET, HERO_SPEED, MAX_SUBSTEP_SECS};

impl Simulation {
    /// Moves the hero in sub-steps, resolving each axis on its own so the hero
    /// slides along walls instead of sticking to them.
    pub(super) fn move_hero(&mut self, intents: MoveIntents, dt: f64) {
        let vx = intents.axis_x() * HERO_SPEED;
        let vy = intents.axis_y() * HERO_SPEED;
        if vx == 0.0 && vy == 0.0 {
            return;
        }

        let mut remaining = dt;
        while remaining > 0.0 {
            let step = remaining.min(MAX_SUBSTEP_SECS);
            remaining -= step;

            let next_x = self.hero.x + vx * step;
            if self.hero_box_fits(next_x, self.hero.y) {
                self.hero.x = next_x;
            }
            let next_y = self.hero.y + vy * step;
            if self.hero_box_fits(self.hero.x, next_y) {
                self.hero.y = next_y;
            }
        }
    }

    fn hero_box_fits(&self, x: f64, y: f64) -> bool {
        let near = CORNER_INSET;
        let far = HERO_SIZE - CORNER_INSET;
        [(near, near), (far, near), (near, far), (far, far)]
            .iter()
            .all(|(dx, dy)| {
                let corner = Cell::containing(Position {
                    x: x + dx,
                    y: y + dy,
                });
                self.world.grid.is_open(corner)
            })
    }
}
