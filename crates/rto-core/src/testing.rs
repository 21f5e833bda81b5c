//! In-memory repositories and a recording notifier.
//!
//! One mutex guards the whole store, so `reserve` checks capacity and inserts
//! under the same lock just like the row lock in PostgreSQL.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    Booking, BookingDetails, BookingRecord, Building, DitGroup, Floor, FloorAvailability,
    NewBooking, NewPra, Pra, PraParties, PraRecord, SsoProfile, User,
};
use crate::error::DomainError;
use crate::notifications::{Notification, Notifier};
use crate::repositories::{
    BookingRepository, BuildingRepository, DitGroupRepository, FeedCursor, HealthRepository,
    PraRepository, SessionData, SessionRepository, UserRepository,
};

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<User>,
    buildings: Vec<Building>,
    floors: Vec<Floor>,
    groups: Vec<DitGroup>,
    bookings: Vec<Booking>,
    pras: Vec<Pra>,
    sessions: HashMap<String, (SessionData, DateTime<Utc>)>,
    unhealthy: bool,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Result<User, DomainError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)))
    }

    fn booking_details(&self, booking: &Booking) -> BookingDetails {
        let building_name = self
            .buildings
            .iter()
            .find(|b| b.id == booking.building_id)
            .map(|b| b.name.clone())
            .unwrap_or_default();
        let floor_name = self
            .floors
            .iter()
            .find(|f| f.id == booking.floor_id)
            .map(|f| f.name.clone())
            .unwrap_or_default();
        BookingDetails {
            booking: booking.clone(),
            building_name,
            floor_name,
        }
    }

    fn pra_record(&self, pra: &Pra) -> Result<PraRecord, DomainError> {
        Ok(PraRecord {
            pra: pra.clone(),
            parties: PraParties {
                staff_member: self.user(pra.staff_member_id)?,
                line_manager: self.user(pra.line_manager_id)?,
                scs: self.user(pra.scs_id)?,
            },
        })
    }

    fn active_count(&self, floor_id: i64, date: NaiveDate) -> i64 {
        self.bookings
            .iter()
            .filter(|b| b.is_active && b.floor_id == floor_id && b.booking_date == date)
            .count() as i64
    }

    fn push_booking(&mut self, new: &NewBooking, at: DateTime<Utc>) -> Booking {
        let booking = Booking {
            id: self.next_id(),
            is_active: true,
            user_id: new.user_id,
            on_behalf_of_name: new.on_behalf_of.name.clone(),
            on_behalf_of_dit_email: new.on_behalf_of.dit_email.clone(),
            booking_date: new.booking_date,
            building_id: new.building_id,
            floor_id: new.floor_id,
            directorate: None,
            group: Some(new.group.clone()),
            business_unit: Some(new.business_unit.clone()),
            booked_timestamp: at,
            canceled_timestamp: None,
        };
        self.bookings.push(booking.clone());
        booking
    }

    fn push_pra(&mut self, new: &NewPra, at: DateTime<Utc>) -> Pra {
        let pra = Pra {
            id: self.next_id(),
            staff_member_id: new.staff_member_id,
            line_manager_id: new.line_manager_id,
            scs_id: new.scs_id,
            group: new.group.clone(),
            business_unit: new.business_unit.clone(),
            authorized_reason: new.authorized_reason.clone(),
            risk_category: new.risk_category,
            mitigation_outcome: new.mitigation_outcome,
            mitigation_measures: new.mitigation_measures.clone(),
            created_timestamp: at,
            approved_staff_member: None,
            approved_scs: None,
            migrated: false,
        };
        self.pras.push(pra.clone());
        pra
    }
}

fn after_cursor(timestamp: DateTime<Utc>, id: i64, after: Option<FeedCursor>) -> bool {
    match after {
        Some(c) => (timestamp, id) > (c.timestamp, c.id),
        None => true,
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, email: &str, first_name: &str, last_name: &str) -> User {
        let mut state = self.state();
        let user = User {
            id: state.next_id(),
            email: email.to_string(),
            contact_email: String::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_active: true,
            is_staff: false,
            date_joined: Utc::now(),
            last_login: None,
        };
        state.users.push(user.clone());
        user
    }

    pub fn add_building(&self, name: &str) -> i64 {
        let mut state = self.state();
        let id = state.next_id();
        state.buildings.push(Building {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_floor(&self, building_id: i64, name: &str, nr_of_desks: i32) -> i64 {
        let mut state = self.state();
        let id = state.next_id();
        state.floors.push(Floor {
            id,
            building_id,
            name: name.to_string(),
            nr_of_desks,
        });
        id
    }

    pub fn add_dit_group(&self, name: &str, business_units: &str) -> i64 {
        let mut state = self.state();
        let id = state.next_id();
        state.groups.push(DitGroup {
            id,
            name: name.to_string(),
            business_units: business_units.to_string(),
        });
        id
    }

    /// Inserts a booking with a chosen timestamp, bypassing the capacity check.
    pub fn insert_booking(&self, booking: &NewBooking, booked_at: DateTime<Utc>) -> Booking {
        self.state().push_booking(booking, booked_at)
    }

    pub fn insert_pra(&self, pra: &NewPra, created_at: DateTime<Utc>) -> Pra {
        self.state().push_pra(pra, created_at)
    }

    pub fn active_bookings(&self, floor_id: i64, date: NaiveDate) -> i64 {
        self.state().active_count(floor_id, date)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state().unhealthy = !healthy;
    }

    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self.state().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.matches_email(email))
            .cloned())
    }

    async fn get_or_create(
        &self,
        profile: &SsoProfile,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        let mut state = self.state();
        if let Some(user) = state
            .users
            .iter_mut()
            .find(|u| u.email.eq_ignore_ascii_case(&profile.email))
        {
            if user.contact_email != profile.contact_email {
                user.contact_email = profile.contact_email.clone();
            }
            user.last_login = Some(now);
            return Ok(user.clone());
        }

        let user = User {
            id: state.next_id(),
            email: profile.email.clone(),
            contact_email: profile.contact_email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            is_active: true,
            is_staff: false,
            date_joined: now,
            last_login: Some(now),
        };
        state.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl BuildingRepository for InMemoryStore {
    async fn list_buildings(&self) -> Result<Vec<Building>, DomainError> {
        let mut buildings = self.state().buildings.clone();
        buildings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buildings)
    }

    async fn find_building(&self, id: i64) -> Result<Option<Building>, DomainError> {
        Ok(self.state().buildings.iter().find(|b| b.id == id).cloned())
    }

    async fn find_floor(&self, id: i64) -> Result<Option<Floor>, DomainError> {
        Ok(self.state().floors.iter().find(|f| f.id == id).cloned())
    }

    async fn floor_availability(
        &self,
        building_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<FloorAvailability>, DomainError> {
        let state = self.state();
        let mut floors: Vec<FloorAvailability> = state
            .floors
            .iter()
            .filter(|f| f.building_id == building_id)
            .map(|f| FloorAvailability {
                floor: f.clone(),
                booked: state.active_count(f.id, date),
            })
            .collect();
        floors.sort_by(|a, b| a.floor.name.cmp(&b.floor.name));
        Ok(floors)
    }
}

#[async_trait]
impl DitGroupRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<DitGroup>, DomainError> {
        let mut groups = self.state().groups.clone();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<DitGroup>, DomainError> {
        Ok(self.state().groups.iter().find(|g| g.id == id).cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn reserve(&self, booking: &NewBooking) -> Result<Booking, DomainError> {
        let mut state = self.state();
        let capacity = state
            .floors
            .iter()
            .find(|f| f.id == booking.floor_id)
            .map(|f| i64::from(f.nr_of_desks))
            .ok_or_else(|| DomainError::NotFound(format!("Floor {}", booking.floor_id)))?;

        if state.active_count(booking.floor_id, booking.booking_date) >= capacity {
            return Err(DomainError::FloorFullyBooked);
        }
        Ok(state.push_booking(booking, Utc::now()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>, DomainError> {
        Ok(self.state().bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn cancel(&self, id: i64, at: DateTime<Utc>) -> Result<Booking, DomainError> {
        let mut state = self.state();
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("Booking {}", id)))?;
        if !booking.is_active {
            return Err(DomainError::InvalidTransition(
                "Booking is already cancelled".to_string(),
            ));
        }
        booking.is_active = false;
        booking.canceled_timestamp = Some(at);
        Ok(booking.clone())
    }

    async fn list_upcoming_for_user(
        &self,
        user_id: i64,
        from: NaiveDate,
    ) -> Result<Vec<BookingDetails>, DomainError> {
        let state = self.state();
        let mut bookings: Vec<BookingDetails> = state
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.is_active && b.booking_date >= from)
            .map(|b| state.booking_details(b))
            .collect();
        bookings.sort_by_key(|d| (d.booking.booking_date, d.booking.id));
        Ok(bookings)
    }

    async fn feed_page(
        &self,
        after: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<BookingRecord>, DomainError> {
        let state = self.state();
        let mut bookings: Vec<&Booking> = state
            .bookings
            .iter()
            .filter(|b| after_cursor(b.booked_timestamp, b.id, after))
            .collect();
        bookings.sort_by_key(|b| (b.booked_timestamp, b.id));
        bookings
            .into_iter()
            .take(limit as usize)
            .map(|b| {
                Ok(BookingRecord {
                    details: state.booking_details(b),
                    user: state.user(b.user_id)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl PraRepository for InMemoryStore {
    async fn create(&self, pra: &NewPra) -> Result<Pra, DomainError> {
        Ok(self.state().push_pra(pra, Utc::now()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PraRecord>, DomainError> {
        let state = self.state();
        state
            .pras
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.pra_record(p))
            .transpose()
    }

    async fn record_staff_member_decision(
        &self,
        id: i64,
        approved: bool,
    ) -> Result<Pra, DomainError> {
        let mut state = self.state();
        let pra = state
            .pras
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("PRA {}", id)))?;
        if pra.approved_staff_member.is_some() {
            return Err(DomainError::InvalidTransition(
                "PRA does not need staff member approval".to_string(),
            ));
        }
        pra.approved_staff_member = Some(approved);
        Ok(pra.clone())
    }

    async fn record_scs_decision(&self, id: i64, approved: bool) -> Result<Pra, DomainError> {
        let mut state = self.state();
        let pra = state
            .pras
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("PRA {}", id)))?;
        if pra.approved_staff_member != Some(true) || pra.approved_scs.is_some() {
            return Err(DomainError::InvalidTransition(
                "PRA does not need SCS approval".to_string(),
            ));
        }
        pra.approved_scs = Some(approved);
        Ok(pra.clone())
    }

    async fn feed_page(
        &self,
        after: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<PraRecord>, DomainError> {
        let state = self.state();
        let mut pras: Vec<&Pra> = state
            .pras
            .iter()
            .filter(|p| after_cursor(p.created_timestamp, p.id, after))
            .collect();
        pras.sort_by_key(|p| (p.created_timestamp, p.id));
        pras.into_iter()
            .take(limit as usize)
            .map(|p| state.pra_record(p))
            .collect()
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn load(&self, key: &str, now: DateTime<Utc>) -> Result<Option<SessionData>, DomainError> {
        Ok(self
            .state()
            .sessions
            .get(key)
            .filter(|(_, expire_date)| *expire_date > now)
            .map(|(data, _)| data.clone()))
    }

    async fn save(
        &self,
        key: &str,
        data: &SessionData,
        expire_date: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.state()
            .sessions
            .insert(key.to_string(), (data.clone(), expire_date));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.state().sessions.remove(key);
        Ok(())
    }
}

#[async_trait]
impl HealthRepository for InMemoryStore {
    async fn ping(&self) -> Result<(), DomainError> {
        if self.state().unhealthy {
            Err(DomainError::DatabaseError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Keeps every notification it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}
