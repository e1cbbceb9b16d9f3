//! Player vs. scroller collision
//!
//! All tests are pixel-exact: a bounding-box reject followed by an AND over
//! the intersecting rows of the two masks. Dead entities never collide.

use super::entity::{Footprinted, Mortal};

/// Kill every live coin the player touches and return how many were taken.
///
/// Every overlapping coin counts, so several can be collected in one frame.
pub fn check_coin_collisions<P, C>(player: &P, coins: &mut [C]) -> u32
where
    P: Footprinted,
    C: Footprinted + Mortal,
{
    let footprint = player.footprint();
    let player_rect = footprint.rect();
    let mut count = 0;
    for coin in coins.iter_mut().filter(|c| c.is_alive()) {
        let hit = {
            let other = coin.footprint();
            other.rect().intersects(&player_rect) && footprint.overlaps(&other)
        };
        if hit {
            coin.kill();
            count += 1;
        }
    }
    count
}

/// True if the player touches any live obstacle. Obstacles are never removed.
pub fn check_obstacle_collision<P, O>(player: &P, obstacles: &[O]) -> bool
where
    P: Footprinted,
    O: Footprinted + Mortal,
{
    let footprint = player.footprint();
    obstacles
        .iter()
        .filter(|o| o.is_alive())
        .any(|o| footprint.overlaps(&o.footprint()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Footprint;
    use crate::sim::mask::Mask;
    use crate::sim::scroller::{Scroller, ScrollerKind};
    use glam::Vec2;

    struct Probe {
        pos: Vec2,
        mask: Mask,
    }

    impl Footprinted for Probe {
        fn footprint(&self) -> Footprint<'_> {
            Footprint::new(self.pos, &self.mask)
        }
    }

    fn coin(id: u32, x: f32, y: f32) -> Scroller {
        Scroller::new(id, ScrollerKind::Coin, Vec2::new(x, y), 0.0, Mask::filled(10, 10))
    }

    #[test]
    fn test_collects_all_overlapping_coins() {
        let player = Probe {
            pos: Vec2::new(100.0, 100.0),
            mask: Mask::filled(40, 20),
        };
        let mut coins = vec![
            coin(1, 95.0, 95.0),
            coin(2, 130.0, 110.0),
            coin(3, 300.0, 100.0),
        ];
        assert_eq!(check_coin_collisions(&player, &mut coins), 2);
        assert!(!coins[0].is_alive());
        assert!(!coins[1].is_alive());
        assert!(coins[2].is_alive());

        // Already-taken coins are not counted twice
        assert_eq!(check_coin_collisions(&player, &mut coins), 0);
    }

    #[test]
    fn test_box_overlap_without_pixel_overlap_misses() {
        // Hollow frame: only the border is solid
        let player = Probe {
            pos: Vec2::ZERO,
            mask: Mask::from_fn(50, 50, |x, y| x == 0 || y == 0 || x == 49 || y == 49),
        };
        let mut coins = vec![coin(1, 20.0, 20.0)];
        assert_eq!(check_coin_collisions(&player, &mut coins), 0);
        assert!(coins[0].is_alive());
    }

    #[test]
    fn test_obstacle_hit_does_not_remove() {
        let player = Probe {
            pos: Vec2::new(0.0, 0.0),
            mask: Mask::filled(20, 20),
        };
        let obstacles = vec![Scroller::new(
            7,
            ScrollerKind::Obstacle {
                anchor: crate::sim::scroller::Anchor::Floor,
            },
            Vec2::new(10.0, 10.0),
            0.0,
            Mask::filled(30, 30),
        )];
        assert!(check_obstacle_collision(&player, &obstacles));
        assert!(obstacles[0].is_alive());
    }

    #[test]
    fn test_dead_obstacle_is_harmless() {
        let player = Probe {
            pos: Vec2::ZERO,
            mask: Mask::filled(20, 20),
        };
        let mut obstacle = coin(1, 0.0, 0.0);
        obstacle.kill();
        assert!(!check_obstacle_collision(&player, &[obstacle]));
    }
}
