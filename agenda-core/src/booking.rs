use std::sync::Arc;

use agenda_domain::{
    CalendarDay, CreateReservationRequest, Reservation, ReservationId, ReservationStatus,
};
use agenda_store::RecordStore;
use tracing::{debug, field, info, instrument, warn, Span};

use crate::{slots, BookingError, BookingResult};

/// The only writer of reservation state.
///
/// Holds no copy of the records between calls: every operation reads the
/// store afresh, and every mutation runs inside one store transaction so the
/// conflict check and the write see the same set.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<RecordStore>,
}

impl BookingService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> BookingResult<Vec<Reservation>> {
        Ok(self.store.load_all().await?)
    }

    /// All reservations on `date`, whatever their status.
    pub async fn list_by_date(&self, date: &CalendarDay) -> BookingResult<Vec<Reservation>> {
        let records = self.store.load_all().await?;
        Ok(records.into_iter().filter(|r| r.date == *date).collect())
    }

    /// Slot labels taken by confirmed reservations on `date`.
    pub async fn occupied_slots(&self, date: &CalendarDay) -> BookingResult<Vec<String>> {
        let records = self.store.load_all().await?;
        Ok(slots::active_slots_for_date(&records, date))
    }

    pub async fn get(&self, id: &str) -> BookingResult<Reservation> {
        let id = parse_id(id)?;
        self.store
            .load_all()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| BookingError::NotFound(id.to_string()))
    }

    /// Admit a new reservation if its slot is free.
    ///
    /// Validation happens before the store is touched. The conflict check and
    /// the append run under one exclusive transaction, so of two concurrent
    /// requests for the same slot exactly one is admitted.
    #[instrument(skip_all, fields(date = field::Empty, time_slot = field::Empty))]
    pub async fn create(&self, request: &CreateReservationRequest) -> BookingResult<Reservation> {
        // 1. Validate
        let new = request.validate()?;
        let span = Span::current();
        span.record("date", field::display(&new.date));
        span.record("time_slot", new.time_slot.as_str());

        // 2. Lock and read the current set
        let mut tx = self.store.begin().await?;

        // 3. Check against what was read under the lock
        if let Some(holder) = slots::find_conflict(tx.records(), &new.date, &new.time_slot) {
            warn!(holder = %holder.id, "Slot already booked");
            return Err(BookingError::Conflict {
                date: new.date,
                time_slot: new.time_slot,
            });
        }

        // 4. Append and persist
        let reservation = Reservation::new(new);
        tx.records_mut().push(reservation.clone());
        tx.commit().await?;

        info!(id = %reservation.id, "Reservation confirmed");
        Ok(reservation)
    }

    /// Set the status of reservation `id`.
    ///
    /// Re-applying the current status succeeds without a write. A cancelled
    /// reservation cannot be confirmed again.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> BookingResult<Reservation> {
        let id = parse_id(id)?;
        let mut tx = self.store.begin().await?;

        let updated = {
            let record = tx
                .records_mut()
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| BookingError::NotFound(id.to_string()))?;

            if record.status == status {
                debug!("Status unchanged");
                return Ok(record.clone());
            }
            if record.status == ReservationStatus::Cancelled {
                return Err(BookingError::InvalidTransition { id: id.to_string() });
            }

            record.set_status(status);
            record.clone()
        };

        tx.commit().await?;
        info!(status = %updated.status, "Reservation status updated");
        Ok(updated)
    }

    /// Cancel reservation `id`. Cancelling twice is not an error.
    pub async fn cancel(&self, id: &str) -> BookingResult<Reservation> {
        self.update_status(id, ReservationStatus::Cancelled).await
    }
}

/// An id that is not even well-formed cannot name a stored reservation.
fn parse_id(id: &str) -> BookingResult<ReservationId> {
    id.parse()
        .map_err(|_| BookingError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_domain::ValidationError;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    async fn service() -> (TempDir, BookingService) {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("agendamentos.json")).await.unwrap();
        (dir, BookingService::new(Arc::new(store)))
    }

    fn request(date: &str, slot: &str) -> CreateReservationRequest {
        serde_json::from_value(json!({
            "customerName": "Ana",
            "phone": "555-0100",
            "email": "ana@example.com",
            "serviceType": "haircut",
            "date": date,
            "timeSlot": slot,
            "amount": 50.0
        }))
        .unwrap()
    }

    fn june_first() -> CalendarDay {
        CalendarDay::from_ymd(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_book_cancel_rebook() {
        let (_dir, service) = service().await;

        let first = service.create(&request("2024-06-01", "10:00")).await.unwrap();
        assert_eq!(first.status, ReservationStatus::Confirmed);

        let second = service.create(&request("2024-06-01", "10:00")).await;
        assert!(matches!(second, Err(BookingError::Conflict { .. })));
        assert_eq!(service.occupied_slots(&june_first()).await.unwrap(), vec!["10:00"]);

        service.cancel(&first.id.to_string()).await.unwrap();
        assert!(service.occupied_slots(&june_first()).await.unwrap().is_empty());

        let third = service.create(&request("2024-06-01", "10:00")).await.unwrap();
        assert_ne!(third.id, first.id);
        assert_eq!(service.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_conflict_across_date_forms() {
        let (_dir, service) = service().await;

        service.create(&request("2024-06-01", "10:00")).await.unwrap();
        let clash = service.create(&request("2024-06-01T15:30:00Z", "10:00")).await;
        assert!(matches!(clash, Err(BookingError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_missing_field_persists_nothing() {
        let (_dir, service) = service().await;

        let mut req = request("2024-06-01", "10:00");
        req.email = None;
        let result = service.create(&req).await;
        assert!(matches!(
            result,
            Err(BookingError::Validation(ValidationError::MissingField("email")))
        ));
        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_date_includes_cancelled() {
        let (_dir, service) = service().await;

        let a = service.create(&request("2024-06-01", "10:00")).await.unwrap();
        service.create(&request("2024-06-01", "11:00")).await.unwrap();
        service.create(&request("2024-06-02", "10:00")).await.unwrap();
        service.cancel(&a.id.to_string()).await.unwrap();

        let on_first = service.list_by_date(&june_first()).await.unwrap();
        assert_eq!(on_first.len(), 2);
        assert!(on_first.iter().any(|r| r.status == ReservationStatus::Cancelled));
        assert_eq!(service.occupied_slots(&june_first()).await.unwrap(), vec!["11:00"]);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (_dir, service) = service().await;
        let created = service.create(&request("2024-06-01", "10:00")).await.unwrap();
        let id = created.id.to_string();

        service.cancel(&id).await.unwrap();
        let again = service.cancel(&id).await.unwrap();
        assert_eq!(again.status, ReservationStatus::Cancelled);
        assert_eq!(service.get(&id).await.unwrap().status, ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_is_terminal() {
        let (_dir, service) = service().await;
        let created = service.create(&request("2024-06-01", "10:00")).await.unwrap();
        let id = created.id.to_string();

        service.cancel(&id).await.unwrap();
        let result = service.update_status(&id, ReservationStatus::Confirmed).await;
        assert!(matches!(result, Err(BookingError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let (_dir, service) = service().await;

        let result = service
            .update_status("unknown-id", ReservationStatus::Cancelled)
            .await;
        assert!(matches!(result, Err(BookingError::NotFound(_))));

        let absent = ReservationId::new().to_string();
        assert!(matches!(service.cancel(&absent).await, Err(BookingError::NotFound(_))));
        assert!(matches!(service.get(&absent).await, Err(BookingError::NotFound(_))));
    }
}
