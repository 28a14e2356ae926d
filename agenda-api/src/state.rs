use agenda_core::BookingService;

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
}
