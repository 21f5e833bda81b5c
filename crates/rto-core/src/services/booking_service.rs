// ============================================================================
// RTO Core - Booking Service
// File: crates/rto-core/src/services/booking_service.rs
// ============================================================================
//! Desk booking: floor availability, capacity-checked reservation, cancellation

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::dispatch;
use crate::domain::{
    Booking, BookingDetails, Building, DitGroup, FloorAvailability, NewBooking, OnBehalfOf, User,
};
use crate::error::{DomainError, FieldError};
use crate::notifications::{Notification, NotificationTemplate, Notifier};
use crate::repositories::{BookingRepository, BuildingRepository, DitGroupRepository};

const PAST_DATE_MESSAGE: &str = "Bookings cannot be in the past.";

/// A complete booking as collected by the booking wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub on_behalf_of: OnBehalfOf,
    pub booking_date: NaiveDate,
    pub building_id: i64,
    pub floor_id: i64,
    pub dit_group_id: i64,
    pub business_unit: String,
}

pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    buildings: Arc<dyn BuildingRepository>,
    groups: Arc<dyn DitGroupRepository>,
    notifier: Arc<dyn Notifier>,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        buildings: Arc<dyn BuildingRepository>,
        groups: Arc<dyn DitGroupRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            bookings,
            buildings,
            groups,
            notifier,
        }
    }

    pub async fn buildings(&self) -> Result<Vec<Building>, DomainError> {
        self.buildings.list_buildings().await
    }

    pub async fn dit_groups(&self) -> Result<Vec<DitGroup>, DomainError> {
        self.groups.list().await
    }

    pub async fn dit_group(&self, id: i64) -> Result<DitGroup, DomainError> {
        self.groups
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("DIT group {}", id)))
    }

    /// Checks the details step: date not in the past, building and group exist.
    pub async fn validate_details(
        &self,
        booking_date: NaiveDate,
        building_id: i64,
        dit_group_id: i64,
        today: NaiveDate,
    ) -> Result<(), DomainError> {
        let mut errors = Vec::new();

        if booking_date < today {
            errors.push(FieldError::new("booking_date", PAST_DATE_MESSAGE));
        }
        if self.buildings.find_building(building_id).await?.is_none() {
            errors.push(FieldError::new("building", "Select a valid building"));
        }
        if self.groups.find_by_id(dit_group_id).await?.is_none() {
            errors.push(FieldError::new("dit_group", "Select a valid DIT group"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    pub async fn validate_business_unit(
        &self,
        dit_group_id: i64,
        business_unit: &str,
    ) -> Result<(), DomainError> {
        let group = self.dit_group(dit_group_id).await?;
        if group.has_business_unit(business_unit) {
            Ok(())
        } else {
            Err(DomainError::validation(
                "business_unit",
                "Select a valid business unit",
            ))
        }
    }

    pub async fn available_floors(
        &self,
        building_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<FloorAvailability>, DomainError> {
        if self.buildings.find_building(building_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Building {}", building_id)));
        }
        self.buildings.floor_availability(building_id, date).await
    }

    /// Validates the request, reserves a desk under the floor lock and sends
    /// the confirmation email.
    pub async fn create_booking(
        &self,
        user: &User,
        request: &BookingRequest,
        today: NaiveDate,
    ) -> Result<BookingDetails, DomainError> {
        info!(
            "Booking attempt by user {} for {} (building {}, floor {})",
            user.id, request.booking_date, request.building_id, request.floor_id
        );

        let mut errors = Vec::new();

        if request.booking_date < today {
            errors.push(FieldError::new("booking_date", PAST_DATE_MESSAGE));
        }

        let building = self.buildings.find_building(request.building_id).await?;
        if building.is_none() {
            errors.push(FieldError::new("building", "Select a valid building"));
        }

        let floor = self
            .buildings
            .find_floor(request.floor_id)
            .await?
            .filter(|f| f.building_id == request.building_id);
        if floor.is_none() {
            errors.push(FieldError::new("floor", "Select a valid floor"));
        }

        let group = self.groups.find_by_id(request.dit_group_id).await?;
        match &group {
            None => errors.push(FieldError::new("dit_group", "Select a valid DIT group")),
            Some(g) if !g.has_business_unit(&request.business_unit) => errors.push(
                FieldError::new("business_unit", "Select a valid business unit"),
            ),
            Some(_) => {}
        }

        let on_behalf_of = OnBehalfOf::new(
            request.on_behalf_of.name.as_deref(),
            request.on_behalf_of.dit_email.as_deref(),
        );
        errors.extend(on_behalf_of.field_errors());

        let (building, floor, group) = match (building, floor, group) {
            (Some(b), Some(f), Some(g)) if errors.is_empty() => (b, f, g),
            _ => {
                warn!("Booking rejected for user {}: {} error(s)", user.id, errors.len());
                return Err(DomainError::Validation(errors));
            }
        };

        let new_booking = NewBooking {
            user_id: user.id,
            on_behalf_of,
            booking_date: request.booking_date,
            building_id: building.id,
            floor_id: floor.id,
            group: group.name.clone(),
            business_unit: request.business_unit.clone(),
        };

        let booking = match self.bookings.reserve(&new_booking).await {
            Ok(booking) => booking,
            Err(DomainError::FloorFullyBooked) => {
                warn!(
                    "Floor {} fully booked on {}",
                    floor.name, request.booking_date
                );
                return Err(DomainError::FloorFullyBooked);
            }
            Err(e) => return Err(e),
        };

        info!("Booking {} created for user {}", booking.id, user.id);

        let details = BookingDetails {
            booking,
            building_name: building.name,
            floor_name: floor.name,
        };

        let notification = booking_notification(
            user,
            &details,
            NotificationTemplate::BookingConfirmation,
        )
        .with("group", group.name)
        .with("business_unit", request.business_unit.clone());
        dispatch(self.notifier.as_ref(), notification).await;

        Ok(details)
    }

    /// Only the booking's own user may cancel, and only once.
    pub async fn cancel_booking(
        &self,
        user: &User,
        booking_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Booking, DomainError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Booking {}", booking_id)))?;

        if booking.user_id != user.id {
            warn!(
                "User {} attempted to cancel booking {} of user {}",
                user.id, booking_id, booking.user_id
            );
            return Err(DomainError::PermissionDenied(
                "Only the user who made a booking can cancel it".to_string(),
            ));
        }
        if !booking.is_active {
            return Err(DomainError::InvalidTransition(
                "Booking is already cancelled".to_string(),
            ));
        }

        let cancelled = self.bookings.cancel(booking_id, now).await?;
        info!("Booking {} cancelled by user {}", booking_id, user.id);

        let building_name = self
            .buildings
            .find_building(cancelled.building_id)
            .await?
            .map(|b| b.name)
            .unwrap_or_default();
        let floor_name = self
            .buildings
            .find_floor(cancelled.floor_id)
            .await?
            .map(|f| f.name)
            .unwrap_or_default();
        let details = BookingDetails {
            booking: cancelled.clone(),
            building_name,
            floor_name,
        };
        dispatch(
            self.notifier.as_ref(),
            booking_notification(user, &details, NotificationTemplate::BookingCancellation),
        )
        .await;

        Ok(cancelled)
    }

    pub async fn upcoming_bookings(
        &self,
        user: &User,
        today: NaiveDate,
    ) -> Result<Vec<BookingDetails>, DomainError> {
        self.bookings.list_upcoming_for_user(user.id, today).await
    }
}

fn booking_notification(
    user: &User,
    details: &BookingDetails,
    template: NotificationTemplate,
) -> Notification {
    Notification::new(user.contact_email(), template)
        .with("name", user.full_name())
        .with("on_behalf_of", details.booking.on_behalf_of())
        .with(
            "booking_date",
            details.booking.booking_date.format("%A %-d %B %Y").to_string(),
        )
        .with("building", details.building_name.clone())
        .with("floor", details.floor_name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::MockNotifier;
    use crate::testing::{InMemoryStore, RecordingNotifier};
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, 4).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        notifier: Arc<RecordingNotifier>,
        service: BookingService,
        user: User,
        building_id: i64,
        floor_id: i64,
        group_id: i64,
    }

    fn fixture(desks: i32) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let user = store.add_user("jane@trade.gov.uk", "Jane", "Doe");
        let building_id = store.add_building("1 Victoria Street");
        let floor_id = store.add_floor(building_id, "3rd floor", desks);
        let group_id = store.add_dit_group("Trade", "Exports\nImports");
        let service = BookingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            notifier.clone(),
        );
        Fixture {
            store,
            notifier,
            service,
            user,
            building_id,
            floor_id,
            group_id,
        }
    }

    fn request(f: &Fixture) -> BookingRequest {
        BookingRequest {
            on_behalf_of: OnBehalfOf::default(),
            booking_date: today(),
            building_id: f.building_id,
            floor_id: f.floor_id,
            dit_group_id: f.group_id,
            business_unit: "Exports".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_booking_reserves_and_notifies() {
        let f = fixture(2);
        let details = f
            .service
            .create_booking(&f.user, &request(&f), today())
            .await
            .unwrap();

        assert!(details.booking.is_active);
        assert_eq!(details.booking.group.as_deref(), Some("Trade"));
        assert_eq!(details.floor_name, "3rd floor");

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].template, NotificationTemplate::BookingConfirmation);
        assert_eq!(sent[0].email_address, "jane@trade.gov.uk");
        assert_eq!(sent[0].personalisation["on_behalf_of"], "Yourself");
        assert_eq!(sent[0].personalisation["booking_date"], "Monday 4 March 2030");
    }

    #[tokio::test]
    async fn test_full_floor_rejects_booking() {
        let f = fixture(1);
        f.service
            .create_booking(&f.user, &request(&f), today())
            .await
            .unwrap();

        let err = f
            .service
            .create_booking(&f.user, &request(&f), today())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::FloorFullyBooked));
        assert_eq!(err.to_string(), "The floor is completely booked");
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_booking_frees_the_desk() {
        let f = fixture(1);
        let first = f
            .service
            .create_booking(&f.user, &request(&f), today())
            .await
            .unwrap();
        f.service
            .cancel_booking(&f.user, first.booking.id, Utc::now())
            .await
            .unwrap();

        let second = f
            .service
            .create_booking(&f.user, &request(&f), today())
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_never_exceed_capacity() {
        let f = fixture(3);
        let service = Arc::new(f.service);
        let mut handles = Vec::new();
        for i in 0..20 {
            let service = service.clone();
            let user = f.user.clone();
            let req = BookingRequest {
                on_behalf_of: OnBehalfOf::new(Some(&format!("Guest {}", i)), None),
                booking_date: today(),
                building_id: f.building_id,
                floor_id: f.floor_id,
                dit_group_id: f.group_id,
                business_unit: "Imports".to_string(),
            };
            handles.push(tokio::spawn(async move {
                service.create_booking(&user, &req, today()).await
            }));
        }

        let mut ok = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(DomainError::FloorFullyBooked) => full += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(ok, 3);
        assert_eq!(full, 17);
        assert_eq!(f.store.active_bookings(f.floor_id, today()), 3);
    }

    #[tokio::test]
    async fn test_validation_errors_are_collected() {
        let f = fixture(1);
        let other_building = f.store.add_building("Other");
        let mut req = request(&f);
        req.booking_date = today() - Duration::days(1);
        req.building_id = other_building;
        req.business_unit = "Nope".to_string();
        req.on_behalf_of = OnBehalfOf::new(None, Some("bad-email"));

        let err = f
            .service
            .create_booking(&f.user, &req, today())
            .await
            .unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field.as_deref()).collect();
        assert_eq!(
            fields,
            vec!["booking_date", "floor", "business_unit", "on_behalf_of_dit_email"]
        );
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_on_behalf_of_name_never_reaches_the_store() {
        let f = fixture(1);
        let mut req = request(&f);
        req.on_behalf_of = OnBehalfOf::new(Some(&"x".repeat(200)), None);

        let err = f
            .service
            .create_booking(&f.user, &req, today())
            .await
            .unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors[0].field.as_deref(), Some("on_behalf_of_name"));
        assert_eq!(f.store.active_bookings(f.floor_id, today()), 0);
    }

    #[tokio::test]
    async fn test_only_owner_can_cancel_and_only_once() {
        let f = fixture(2);
        let other = f.store.add_user("john@trade.gov.uk", "John", "Smith");
        let details = f
            .service
            .create_booking(&f.user, &request(&f), today())
            .await
            .unwrap();
        let id = details.booking.id;

        assert!(matches!(
            f.service.cancel_booking(&other, id, Utc::now()).await,
            Err(DomainError::PermissionDenied(_))
        ));

        let cancelled = f.service.cancel_booking(&f.user, id, Utc::now()).await.unwrap();
        assert!(!cancelled.is_active);
        assert!(cancelled.canceled_timestamp.is_some());

        assert!(matches!(
            f.service.cancel_booking(&f.user, id, Utc::now()).await,
            Err(DomainError::InvalidTransition(_))
        ));
        assert!(matches!(
            f.service.cancel_booking(&f.user, 999, Utc::now()).await,
            Err(DomainError::NotFound(_))
        ));

        let templates: Vec<_> = f.notifier.sent().iter().map(|n| n.template).collect();
        assert_eq!(
            templates,
            vec![
                NotificationTemplate::BookingConfirmation,
                NotificationTemplate::BookingCancellation
            ]
        );
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_booking() {
        let store = Arc::new(InMemoryStore::new());
        let user = store.add_user("jane@trade.gov.uk", "Jane", "Doe");
        let building_id = store.add_building("Old Admiralty Building");
        let floor_id = store.add_floor(building_id, "Ground", 1);
        let group_id = store.add_dit_group("Trade", "Exports");

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .returning(|_| Err(DomainError::NotificationError("provider down".to_string())));

        let service = BookingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(notifier),
        );
        let req = BookingRequest {
            on_behalf_of: OnBehalfOf::default(),
            booking_date: today(),
            building_id,
            floor_id,
            dit_group_id: group_id,
            business_unit: "Exports".to_string(),
        };

        assert!(service.create_booking(&user, &req, today()).await.is_ok());
        assert_eq!(store.active_bookings(floor_id, today()), 1);
    }

    #[tokio::test]
    async fn test_upcoming_bookings_skip_past_and_cancelled() {
        let f = fixture(5);
        let tomorrow = today() + Duration::days(1);
        let mut later = request(&f);
        later.booking_date = tomorrow;
        let kept = f
            .service
            .create_booking(&f.user, &later, today())
            .await
            .unwrap();
        let dropped = f
            .service
            .create_booking(&f.user, &request(&f), today())
            .await
            .unwrap();
        f.service
            .cancel_booking(&f.user, dropped.booking.id, Utc::now())
            .await
            .unwrap();

        let upcoming = f.service.upcoming_bookings(&f.user, today()).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].booking.id, kept.booking.id);

        let none = f
            .service
            .upcoming_bookings(&f.user, tomorrow + Duration::days(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_available_floors_counts_active_bookings() {
        let f = fixture(4);
        f.service
            .create_booking(&f.user, &request(&f), today())
            .await
            .unwrap();

        let floors = f
            .service
            .available_floors(f.building_id, today())
            .await
            .unwrap();
        assert_eq!(floors.len(), 1);
        assert_eq!(floors[0].booked, 1);
        assert_eq!(floors[0].available(), 3);

        assert!(matches!(
            f.service.available_floors(42, today()).await,
            Err(DomainError::NotFound(_))
        ));
    }
}
