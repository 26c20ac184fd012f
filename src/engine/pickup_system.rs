use super::*;

use crate::constants::{
    COIN_SCORE, HERO_RADIUS, INVULNERABILITY_SECS, ITEM_RADIUS, KEY_SCORE, SPIKE_DAMAGE,
    TREASURE_SCORE,
};
use crate::types::CollectibleKind;

use super::utils::circles_overlap;

impl Simulation {
    pub(super) fn collect_items(&mut self, events: &mut Vec<RuntimeEvent>) -> Vec<CollectedItem> {
        let hero_center = self.hero.center();
        let mut collected = Vec::new();

        for item in self.world.collectibles.iter_mut() {
            if item.collected
                || !circles_overlap(hero_center, HERO_RADIUS, item.cell.center(), ITEM_RADIUS)
            {
                continue;
            }
            item.collected = true;

            let score = match item.kind {
                CollectibleKind::Coin => {
                    self.stats.coins += 1;
                    COIN_SCORE
                }
                CollectibleKind::Key => {
                    self.hero.has_key = true;
                    KEY_SCORE
                }
                CollectibleKind::Treasure => {
                    self.stats.treasures += 1;
                    TREASURE_SCORE
                }
            };
            self.score += score;

            collected.push(CollectedItem {
                kind: item.kind,
                row: item.cell.row,
                col: item.cell.col,
            });
            events.push(RuntimeEvent::ItemCollected {
                kind: item.kind,
                row: item.cell.row,
                col: item.cell.col,
                score,
            });
        }

        collected
    }

    /// Spike contact deals damage at most once per invulnerability window;
    /// each hit opens a fresh window right away.
    pub(super) fn apply_hazards(&mut self, events: &mut Vec<RuntimeEvent>) -> bool {
        let hero_center = self.hero.center();
        let mut damage = 0;

        for hazard in &self.world.hazards {
            if !circles_overlap(hero_center, HERO_RADIUS, hazard.cell.center(), ITEM_RADIUS) {
                continue;
            }
            if self.elapsed_secs >= self.hero.invulnerable_until {
                damage += SPIKE_DAMAGE;
                self.hero.invulnerable_until = self.elapsed_secs + INVULNERABILITY_SECS;
            }
        }

        if damage == 0 {
            return false;
        }
        self.hero.health = (self.hero.health - damage).max(0);
        self.stats.damage_taken += damage;
        events.push(RuntimeEvent::HeroDamaged {
            amount: damage,
            health: self.hero.health,
        });
        true
    }
}
