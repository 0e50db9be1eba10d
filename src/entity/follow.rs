//! Follow-slot reservations around a player
//!
//! Every follower asks the player for an (angle, distance) offset so that a
//! crowd of escorts spreads out instead of stacking on the same point.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::core::types::EntityId;

const SLOTS_PER_RING: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct FollowSlots {
    holders: Vec<Option<EntityId>>,
}

impl FollowSlots {
    /// Reserve (or re-read) the follow offset for `follower`
    ///
    /// Returns `(angle, distance)`.
    pub fn request(&mut self, follower: EntityId, base_distance: f32, ring_spacing: f32) -> (f32, f32) {
        let slot = match self.holders.iter().position(|h| *h == Some(follower)) {
            Some(slot) => slot,
            None => match self.holders.iter().position(Option::is_none) {
                Some(free) => {
                    self.holders[free] = Some(follower);
                    free
                }
                None => {
                    self.holders.push(Some(follower));
                    self.holders.len() - 1
                }
            },
        };

        let ring = slot / SLOTS_PER_RING;
        let offset = slot % SLOTS_PER_RING;
        let angle = FRAC_PI_2 + offset as f32 * FRAC_PI_4;
        let distance = base_distance + ring as f32 * ring_spacing;
        (angle, distance)
    }

    /// Release the slot held by `follower`, if any
    pub fn relinquish(&mut self, follower: EntityId) -> bool {
        match self.holders.iter_mut().find(|h| **h == Some(follower)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn holds(&self, follower: EntityId) -> bool {
        self.holders.contains(&Some(follower))
    }

    pub fn reserved(&self) -> usize {
        self.holders.iter().filter(|h| h.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_followers_get_distinct_angles() {
        let mut slots = FollowSlots::default();
        let (a1, d1) = slots.request(EntityId::new(1, 0), 1.5, 1.0);
        let (a2, d2) = slots.request(EntityId::new(2, 0), 1.5, 1.0);
        assert!((a1 - a2).abs() > 0.1);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_repeat_request_is_stable() {
        let mut slots = FollowSlots::default();
        let first = slots.request(EntityId::new(1, 0), 1.5, 1.0);
        let again = slots.request(EntityId::new(1, 0), 1.5, 1.0);
        assert_eq!(first, again);
        assert_eq!(slots.reserved(), 1);
    }

    #[test]
    fn test_ninth_follower_moves_to_outer_ring() {
        let mut slots = FollowSlots::default();
        for i in 0..8 {
            slots.request(EntityId::new(i, 0), 1.5, 1.0);
        }
        let (_, distance) = slots.request(EntityId::new(99, 0), 1.5, 1.0);
        assert!((distance - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_released_slot_is_reused() {
        let mut slots = FollowSlots::default();
        let first = slots.request(EntityId::new(1, 0), 1.5, 1.0);
        slots.request(EntityId::new(2, 0), 1.5, 1.0);
        assert!(slots.relinquish(EntityId::new(1, 0)));
        assert!(!slots.relinquish(EntityId::new(1, 0)));

        let reused = slots.request(EntityId::new(3, 0), 1.5, 1.0);
        assert_eq!(first, reused);
    }
}
