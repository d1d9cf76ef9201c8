// libs/appointment-cell/src/services/conflict.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, BookedInterval, TimeInterval};

/// Overlap checks between a requested interval and a provider's existing bookings.
/// Only scheduled and confirmed bookings block a slot.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictDetectionService;

impl ConflictDetectionService {
    pub fn new() -> Self {
        Self
    }

    pub fn find_conflicts<'a>(
        &self,
        candidate: &TimeInterval,
        booked: &'a [BookedInterval],
    ) -> Vec<&'a BookedInterval> {
        booked
            .iter()
            .filter(|b| b.is_active() && b.interval.overlaps(candidate))
            .collect()
    }

    pub fn has_conflict(&self, candidate: &TimeInterval, booked: &[BookedInterval]) -> bool {
        booked
            .iter()
            .any(|b| b.is_active() && b.interval.overlaps(candidate))
    }

    /// Fails with `SlotConflict` naming the earliest clashing booking.
    pub fn ensure_slot_free(
        &self,
        candidate: &TimeInterval,
        booked: &[BookedInterval],
    ) -> Result<(), AppointmentError> {
        debug!("Checking {} against {} existing bookings", candidate, booked.len());

        let earliest = self
            .find_conflicts(candidate, booked)
            .into_iter()
            .map(|b| b.interval)
            .min();

        match earliest {
            Some(existing) => {
                warn!("Requested interval {} conflicts with {}", candidate, existing);
                Err(AppointmentError::SlotConflict { existing })
            }
            None => Ok(()),
        }
    }
}
