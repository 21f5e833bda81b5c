//! Activity stream export of bookings and PRAs
//!
//! Items are published in (timestamp, id) order. The cursor in the `next`
//! link is `<unix seconds>.<fraction>_<id>` of the last item on the page.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::domain::{BookingRecord, PraRecord};
use crate::error::DomainError;
use crate::repositories::{BookingRepository, FeedCursor, PraRepository};

const PUBLISHED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const BOOKING_PREFIX: &str = "dit:ReturnToOffice:Booking";
const PRA_PREFIX: &str = "dit:ReturnToOffice:PRA";

/// One page of activity items and the cursor after its last item.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPage {
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}

impl ActivityPage {
    /// Wraps the page as an ActivityStreams `Collection`. `next` is only
    /// present when the page has items.
    pub fn into_collection(self, base_url: &str) -> Value {
        let mut collection = json!({
            "@context": [
                "https://www.w3.org/ns/activitystreams",
                {"dit": "https://www.trade.gov.uk/ns/activitystreams/v1"}
            ],
            "type": "Collection",
            "orderedItems": self.items,
        });
        if let (Some(cursor), Some(object)) = (self.next_cursor, collection.as_object_mut()) {
            object.insert(
                "next".to_string(),
                Value::String(format!("{}?cursor={}", base_url, cursor)),
            );
        }
        collection
    }
}

pub fn format_cursor(cursor: &FeedCursor) -> String {
    let seconds = cursor.timestamp.timestamp();
    let micros = cursor.timestamp.timestamp_subsec_micros();
    let fraction = if micros == 0 {
        "0".to_string()
    } else {
        format!("{:06}", micros).trim_end_matches('0').to_string()
    };
    format!("{}.{}_{}", seconds, fraction, cursor.id)
}

pub fn parse_cursor(raw: &str) -> Result<FeedCursor, DomainError> {
    let invalid = || DomainError::validation("cursor", "Invalid cursor");

    let (timestamp, id) = raw.rsplit_once('_').ok_or_else(invalid)?;
    let id: i64 = id.parse().map_err(|_| invalid())?;
    let (seconds, fraction) = timestamp.split_once('.').unwrap_or((timestamp, "0"));
    let seconds: i64 = seconds.parse().map_err(|_| invalid())?;

    if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let digits: String = fraction.chars().chain("000000".chars()).take(6).collect();
    let micros: u32 = digits.parse().map_err(|_| invalid())?;

    let timestamp = DateTime::<Utc>::from_timestamp(seconds, micros * 1_000).ok_or_else(invalid)?;
    Ok(FeedCursor { timestamp, id })
}

fn published(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(PUBLISHED_FORMAT).to_string()
}

fn item(prefix: &str, id: i64, timestamp: &DateTime<Utc>, fields: Vec<(&str, Value)>) -> Value {
    let mut object = Map::new();
    object.insert("id".to_string(), json!(format!("{}:{}", prefix, id)));
    object.insert("type".to_string(), json!(prefix));
    for (key, value) in fields {
        object.insert(format!("{}:{}", prefix, key), value);
    }
    json!({
        "id": format!("{}:{}:Update", prefix, id),
        "published": published(timestamp),
        "object": object,
    })
}

pub fn booking_item(record: &BookingRecord) -> Value {
    let booking = &record.details.booking;
    let user = &record.user;
    item(
        BOOKING_PREFIX,
        booking.id,
        &booking.booked_timestamp,
        vec![
            ("bookingId", json!(booking.id)),
            ("userId", json!(user.id)),
            ("userEmail", json!(user.email)),
            (
                "userFullName",
                json!(format!("{} {}", user.first_name, user.last_name)),
            ),
            ("onBehalfOfName", json!(booking.on_behalf_of_name)),
            ("onBehalfOfEmail", json!(booking.on_behalf_of_dit_email)),
            (
                "bookingDate",
                json!(booking.booking_date.format("%Y-%m-%d").to_string()),
            ),
            ("building", json!(record.details.building_name)),
            ("floor", json!(record.details.floor_name)),
            ("directorate", json!(booking.directorate)),
            ("group", json!(booking.group)),
            ("businessUnit", json!(booking.business_unit)),
            ("created", json!(published(&booking.booked_timestamp))),
            (
                "cancelled",
                json!(booking.canceled_timestamp.as_ref().map(published)),
            ),
        ],
    )
}

pub fn pra_item(record: &PraRecord) -> Value {
    let pra = &record.pra;
    let parties = &record.parties;
    item(
        PRA_PREFIX,
        pra.id,
        &pra.created_timestamp,
        vec![
            ("praId", json!(pra.id)),
            ("staffMemberId", json!(parties.staff_member.id)),
            ("staffMemberEmail", json!(parties.staff_member.email)),
            ("staffMemberFullName", json!(parties.staff_member.full_name())),
            ("lineManagerId", json!(parties.line_manager.id)),
            ("lineManagerEmail", json!(parties.line_manager.email)),
            ("lineManagerFullName", json!(parties.line_manager.full_name())),
            ("scsId", json!(parties.scs.id)),
            ("scsEmail", json!(parties.scs.email)),
            ("scsFullName", json!(parties.scs.full_name())),
            ("authorizedReason", json!(pra.authorized_reason)),
            ("group", json!(pra.group)),
            ("businessUnit", json!(pra.business_unit)),
            ("riskCategory", json!(pra.risk_category.description())),
            (
                "mitigationOutcome",
                json!(pra
                    .mitigation_outcome
                    .map(|o| o.description())
                    .unwrap_or_default()),
            ),
            ("mitigationMeasures", json!(pra.mitigation_measures)),
            ("created", json!(published(&pra.created_timestamp))),
            ("approvedStaffMember", json!(pra.approved_staff_member)),
            ("approvedSCS", json!(pra.approved_scs)),
            ("migrated", json!(pra.migrated)),
        ],
    )
}

pub struct ActivityStreamService {
    bookings: Arc<dyn BookingRepository>,
    pras: Arc<dyn PraRepository>,
    page_size: u32,
}

impl ActivityStreamService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        pras: Arc<dyn PraRepository>,
        page_size: u32,
    ) -> Self {
        Self {
            bookings,
            pras,
            page_size: page_size.max(1),
        }
    }

    pub async fn bookings_page(&self, cursor: Option<&str>) -> Result<ActivityPage, DomainError> {
        let after = cursor.map(parse_cursor).transpose()?;
        let records = self.bookings.feed_page(after, self.page_size).await?;

        let next_cursor = records.last().map(|r| {
            format_cursor(&FeedCursor {
                timestamp: r.details.booking.booked_timestamp,
                id: r.details.booking.id,
            })
        });
        Ok(ActivityPage {
            items: records.iter().map(booking_item).collect(),
            next_cursor,
        })
    }

    pub async fn pras_page(&self, cursor: Option<&str>) -> Result<ActivityPage, DomainError> {
        let after = cursor.map(parse_cursor).transpose()?;
        let records = self.pras.feed_page(after, self.page_size).await?;

        let next_cursor = records.last().map(|r| {
            format_cursor(&FeedCursor {
                timestamp: r.pra.created_timestamp,
                id: r.pra.id,
            })
        });
        Ok(ActivityPage {
            items: records.iter().map(pra_item).collect(),
            next_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewBooking, NewPra, OnBehalfOf, RiskCategory};
    use crate::testing::InMemoryStore;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_cursor_format_matches_float_seconds() {
        let cursor = FeedCursor {
            timestamp: Utc.with_ymd_and_hms(2020, 8, 30, 0, 0, 0).unwrap(),
            id: 7,
        };
        assert_eq!(format_cursor(&cursor), "1598745600.0_7");
        assert_eq!(parse_cursor("1598745600.0_7").unwrap(), cursor);

        let precise = FeedCursor {
            timestamp: DateTime::<Utc>::from_timestamp(1598745600, 123_400_000).unwrap(),
            id: 8,
        };
        assert_eq!(format_cursor(&precise), "1598745600.1234_8");
        assert_eq!(parse_cursor(&format_cursor(&precise)).unwrap(), precise);
    }

    #[test]
    fn test_invalid_cursor() {
        for raw in ["", "abc", "12.5", "12.x_1", "12._1", "12.5_x"] {
            assert!(parse_cursor(raw).is_err(), "{}", raw);
        }
        assert!(parse_cursor("1598745600_3").is_ok());
    }

    fn seed_bookings(store: &InMemoryStore) -> (i64, i64) {
        let user = store.add_user("jane@trade.gov.uk", "Jane", "Doe");
        let building = store.add_building("Old Admiralty Building");
        let floor = store.add_floor(building, "Ground", 10);
        let mut ids = Vec::new();
        for (day, booked_on) in [(1, 30), (2, 31)] {
            let booking = store.insert_booking(
                &NewBooking {
                    user_id: user.id,
                    on_behalf_of: OnBehalfOf::default(),
                    booking_date: NaiveDate::from_ymd_opt(2020, 9, day).unwrap(),
                    building_id: building,
                    floor_id: floor,
                    group: "Trade".to_string(),
                    business_unit: "Exports".to_string(),
                },
                Utc.with_ymd_and_hms(2020, 8, booked_on, 0, 0, 0).unwrap(),
            );
            ids.push(booking.id);
        }
        (ids[0], ids[1])
    }

    #[tokio::test]
    async fn test_booking_pages_follow_cursor() {
        let store = Arc::new(InMemoryStore::new());
        let (first, second) = seed_bookings(&store);
        let service = ActivityStreamService::new(store.clone(), store.clone(), 1);

        let page1 = service.bookings_page(None).await.unwrap();
        assert_eq!(page1.items.len(), 1);
        assert_eq!(
            page1.items[0]["id"],
            format!("dit:ReturnToOffice:Booking:{}:Update", first)
        );
        assert_eq!(page1.items[0]["published"], "2020-08-30T00:00:00Z");
        let object = &page1.items[0]["object"];
        assert_eq!(object["type"], "dit:ReturnToOffice:Booking");
        assert_eq!(object["dit:ReturnToOffice:Booking:bookingDate"], "2020-09-01");
        assert_eq!(object["dit:ReturnToOffice:Booking:userFullName"], "Jane Doe");
        assert_eq!(object["dit:ReturnToOffice:Booking:onBehalfOfName"], Value::Null);
        assert_eq!(object["dit:ReturnToOffice:Booking:cancelled"], Value::Null);
        assert_eq!(
            page1.next_cursor.as_deref(),
            Some(format!("1598745600.0_{}", first).as_str())
        );

        let page2 = service
            .bookings_page(page1.next_cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(page2.items.len(), 1);
        assert_eq!(
            page2.items[0]["object"]["dit:ReturnToOffice:Booking:bookingId"],
            second
        );

        let page3 = service
            .bookings_page(page2.next_cursor.as_deref())
            .await
            .unwrap();
        assert!(page3.items.is_empty());
        assert!(page3.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_pra_items_use_descriptions() {
        let store = Arc::new(InMemoryStore::new());
        let staff = store.add_user("staff@trade.gov.uk", "Sam", "Staff");
        let manager = store.add_user("manager@trade.gov.uk", "Mo", "Manager");
        let scs = store.add_user("scs@trade.gov.uk", "Sue", "Senior");
        let pra = store.insert_pra(
            &NewPra {
                staff_member_id: staff.id,
                line_manager_id: manager.id,
                scs_id: scs.id,
                group: "Trade".to_string(),
                business_unit: "Exports".to_string(),
                authorized_reason: "Visitor".to_string(),
                risk_category: RiskCategory::PreferNotToSay,
                mitigation_outcome: None,
                mitigation_measures: String::new(),
            },
            Utc.with_ymd_and_hms(2020, 9, 1, 12, 30, 0).unwrap(),
        );
        let service = ActivityStreamService::new(store.clone(), store.clone(), 50);

        let page = service.pras_page(None).await.unwrap();
        let object = &page.items[0]["object"];
        assert_eq!(page.items[0]["published"], "2020-09-01T12:30:00Z");
        assert_eq!(object["dit:ReturnToOffice:PRA:praId"], pra.id);
        assert_eq!(
            object["dit:ReturnToOffice:PRA:riskCategory"],
            "The staff member would prefer not to say"
        );
        assert_eq!(object["dit:ReturnToOffice:PRA:mitigationOutcome"], "");
        assert_eq!(object["dit:ReturnToOffice:PRA:scsFullName"], "Sue Senior");
        assert_eq!(object["dit:ReturnToOffice:PRA:approvedSCS"], Value::Null);
        assert_eq!(object["dit:ReturnToOffice:PRA:migrated"], false);
    }

    #[test]
    fn test_collection_envelope() {
        let empty = ActivityPage {
            items: vec![],
            next_cursor: None,
        }
        .into_collection("http://testserver/activity-stream/bookings");
        assert_eq!(empty["type"], "Collection");
        assert_eq!(
            empty["@context"][1]["dit"],
            "https://www.trade.gov.uk/ns/activitystreams/v1"
        );
        assert!(empty.get("next").is_none());

        let page = ActivityPage {
            items: vec![json!({"id": "x"})],
            next_cursor: Some("1.0_1".to_string()),
        }
        .into_collection("http://testserver/activity-stream/bookings");
        assert_eq!(
            page["next"],
            "http://testserver/activity-stream/bookings?cursor=1.0_1"
        );
    }
}
