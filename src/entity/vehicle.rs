//! Vehicle seats and their passengers

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

/// Seat properties that decide whether a passenger can be engaged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatFlags {
    pub not_selectable: bool,
    pub hide_passenger: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleSeat {
    pub flags: SeatFlags,
    pub passenger: Option<EntityId>,
}

#[derive(Debug, Clone, Default)]
pub struct Vehicle {
    pub seats: Vec<VehicleSeat>,
}

impl Vehicle {
    pub fn with_seats(flags: &[SeatFlags]) -> Self {
        Self {
            seats: flags
                .iter()
                .map(|&flags| VehicleSeat { flags, passenger: None })
                .collect(),
        }
    }

    /// Put a passenger into a seat; returns false for an unknown or taken seat
    pub fn board(&mut self, seat: usize, passenger: EntityId) -> bool {
        match self.seats.get_mut(seat) {
            Some(slot) if slot.passenger.is_none() => {
                slot.passenger = Some(passenger);
                true
            }
            _ => false,
        }
    }

    pub fn unboard(&mut self, passenger: EntityId) {
        for seat in &mut self.seats {
            if seat.passenger == Some(passenger) {
                seat.passenger = None;
            }
        }
    }

    /// Passengers sitting in seats an attacker may engage
    pub fn engageable_passengers(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.seats
            .iter()
            .filter(|seat| !seat.flags.not_selectable && !seat.flags.hide_passenger)
            .filter_map(|seat| seat.passenger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_and_unselectable_seats_are_skipped() {
        let mut vehicle = Vehicle::with_seats(&[
            SeatFlags::default(),
            SeatFlags { hide_passenger: true, ..Default::default() },
            SeatFlags { not_selectable: true, ..Default::default() },
        ]);
        vehicle.board(0, EntityId::new(1, 0));
        vehicle.board(1, EntityId::new(2, 0));
        vehicle.board(2, EntityId::new(3, 0));

        let engageable: Vec<_> = vehicle.engageable_passengers().collect();
        assert_eq!(engageable, vec![EntityId::new(1, 0)]);
    }

    #[test]
    fn test_cannot_board_taken_seat() {
        let mut vehicle = Vehicle::with_seats(&[SeatFlags::default()]);
        assert!(vehicle.board(0, EntityId::new(1, 0)));
        assert!(!vehicle.board(0, EntityId::new(2, 0)));
        assert!(!vehicle.board(5, EntityId::new(2, 0)));

        vehicle.unboard(EntityId::new(1, 0));
        assert!(vehicle.board(0, EntityId::new(2, 0)));
    }
}
