// libs/appointment-cell/src/services/slots.rs
use chrono::{Duration, NaiveTime};

use crate::models::{AppointmentError, BookedInterval, Slot, TimeInterval};
use crate::services::conflict::ConflictDetectionService;

/// Splits a working day into fixed-length slots and labels each one against
/// the provider's existing bookings.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlotPlanner {
    conflicts: ConflictDetectionService,
}

impl SlotPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every candidate slot of the day in chronological order, labelled available
    /// or not. A trailing partial slot is dropped; an empty or inverted window
    /// yields no slots.
    pub fn plan_day(
        &self,
        work_day_start: NaiveTime,
        work_day_end: NaiveTime,
        slot_duration: Duration,
        booked: &[BookedInterval],
    ) -> Result<Vec<Slot>, AppointmentError> {
        let candidates = Self::partition(work_day_start, work_day_end, slot_duration)?;

        Ok(candidates
            .into_iter()
            .map(|interval| Slot {
                interval,
                is_available: !self.conflicts.has_conflict(&interval, booked),
            })
            .collect())
    }

    pub fn compute_available_slots(
        &self,
        work_day_start: NaiveTime,
        work_day_end: NaiveTime,
        slot_duration: Duration,
        booked: &[BookedInterval],
    ) -> Result<Vec<Slot>, AppointmentError> {
        let mut slots = self.plan_day(work_day_start, work_day_end, slot_duration, booked)?;
        slots.retain(|slot| slot.is_available);
        Ok(slots)
    }

    fn partition(
        start: NaiveTime,
        end: NaiveTime,
        slot_duration: Duration,
    ) -> Result<Vec<TimeInterval>, AppointmentError> {
        if slot_duration <= Duration::zero() {
            return Err(AppointmentError::ValidationError(
                "Slot duration must be positive".to_string(),
            ));
        }

        let mut candidates = Vec::new();
        let mut cursor = start;

        while cursor < end {
            // NaiveTime arithmetic wraps at midnight; a wrap means the slot ran past the day.
            let (slot_end, wrapped) = cursor.overflowing_add_signed(slot_duration);
            if wrapped != 0 || slot_end > end {
                break;
            }
            candidates.push(TimeInterval::new(cursor, slot_end)?);
            cursor = slot_end;
        }

        Ok(candidates)
    }
}
