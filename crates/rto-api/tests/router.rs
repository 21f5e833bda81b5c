//! Router tests against the in-memory store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, HOST, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use rto_api::{build_router, AppState, HttpSettings};
use rto_core::domain::{NewPra, RiskCategory};
use rto_core::notifications::NotificationTemplate;
use rto_core::services::{ActivityStreamService, BookingService, PraPolicy, PraService};
use rto_core::testing::{InMemoryStore, RecordingNotifier};
use rto_security::hawk::client_header;
use rto_security::{HawkAuthenticator, HawkCredentials, HawkRequest, SsoTokenVerifier};
use serde_json::Value;
use tower::ServiceExt;

const SSO_SECRET: &str = "test-sso-secret";
const BASE_URL: &str = "https://rto.example.com";

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
    notifier: Arc<RecordingNotifier>,
    sso: SsoTokenVerifier,
}

fn hawk_credentials() -> HawkCredentials {
    HawkCredentials {
        id: "feed-id".to_string(),
        key: "feed-secret".to_string(),
    }
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let bookings = BookingService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        notifier.clone(),
    );
    let pras = PraService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        notifier.clone(),
        PraPolicy {
            allow_staff_member_to_be_scs: false,
            validity_months: 6,
            base_url: BASE_URL.to_string(),
        },
    );
    let activity_stream = ActivityStreamService::new(store.clone(), store.clone(), 2);

    let state = AppState {
        bookings: Arc::new(bookings),
        pras: Arc::new(pras),
        activity_stream: Arc::new(activity_stream),
        users: store.clone(),
        sessions: store.clone(),
        health: store.clone(),
        sso: Arc::new(SsoTokenVerifier::new(SSO_SECRET.to_string())),
        hawk: Arc::new(HawkAuthenticator::new(hawk_credentials(), 60)),
        settings: Arc::new(HttpSettings {
            base_url: BASE_URL.to_string(),
            sso_cookie_name: "rto_sso_token".to_string(),
            session_cookie_name: "rto_session".to_string(),
            session_ttl_hours: 12,
            secure_cookie: false,
        }),
    };

    TestApp {
        router: build_router(state),
        store,
        notifier,
        sso: SsoTokenVerifier::new(SSO_SECRET.to_string()),
    }
}

impl TestApp {
    fn token(&self, email: &str) -> String {
        self.sso.issue(email, "Test", "User", email, 3600).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, token: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", token));
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, token: &str, cookie: Option<&str>, form: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_cookie(response: &Response<Body>) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    header.split(';').next().unwrap().to_string()
}

fn tomorrow() -> String {
    (Utc::now().date_naive() + Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let response = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_pingdom_reports_database_failure() {
    let app = test_app();
    app.store.set_healthy(false);

    let response = app
        .send(
            Request::builder()
                .uri("/pingdom/ping.xml")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("<status>FALSE</status>"));
    assert!(body.contains("<!--"));
}

#[tokio::test]
async fn test_protected_routes_require_sso_token() {
    let app = test_app();

    let response = app
        .send(Request::builder().uri("/bookings").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/bookings", "not-a-token", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sso_cookie_is_accepted_and_user_created() {
    let app = test_app();
    let token = app.token("new.person@example.com");

    let response = app
        .send(
            Request::builder()
                .uri("/bookings")
                .header(COOKIE, format!("rto_sso_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["bookings"], serde_json::json!([]));
}

#[tokio::test]
async fn test_booking_wizard_end_to_end() {
    let app = test_app();
    let building = app.store.add_building("Old Admiralty Building");
    let floor = app.store.add_floor(building, "Floor 2", 1);
    let group = app.store.add_dit_group("Trade", "Exports\nImports");
    let token = app.token("booker@example.com");

    let response = app
        .post("/booking/create/who-for", &token, None, "for_myself=true")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert_eq!(json_body(response).await["data"]["next"], "/booking/create/details");

    let form = format!(
        "booking_date={}&building={}&dit_group={}",
        tomorrow(),
        building,
        group
    );
    let response = app
        .post("/booking/create/details", &token, Some(&cookie), &form)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get("/booking/create/business-unit", &token, Some(&cookie))
        .await;
    let body = json_body(response).await;
    assert_eq!(
        body["data"]["business_units"],
        serde_json::json!(["Exports", "Imports"])
    );

    let response = app
        .post(
            "/booking/create/business-unit",
            &token,
            Some(&cookie),
            "business_unit=Imports",
        )
        .await;
    assert_eq!(json_body(response).await["data"]["next"], "/booking/create/finalize");

    let response = app
        .get("/booking/create/finalize", &token, Some(&cookie))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["floors"][0]["available"], 1);

    let response = app
        .post(
            "/booking/create/finalize",
            &token,
            Some(&cookie),
            &format!("floor={}", floor),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["next"], "/bookings");
    assert_eq!(body["data"]["booking"]["on_behalf_of"], "Yourself");
    assert_eq!(body["data"]["booking"]["business_unit"], "Imports");

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template, NotificationTemplate::BookingConfirmation);

    let response = app.get("/bookings", &token, None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["bookings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_finalize_on_full_floor_conflicts() {
    let app = test_app();
    let building = app.store.add_building("1 Victoria Street");
    let floor = app.store.add_floor(building, "Ground", 0);
    let group = app.store.add_dit_group("Trade", "Exports");
    let token = app.token("booker@example.com");

    let response = app
        .post("/booking/create/who-for", &token, None, "for_myself=true")
        .await;
    let cookie = session_cookie(&response);
    let form = format!(
        "booking_date={}&building={}&dit_group={}",
        tomorrow(),
        building,
        group
    );
    app.post("/booking/create/details", &token, Some(&cookie), &form)
        .await;
    app.post(
        "/booking/create/business-unit",
        &token,
        Some(&cookie),
        "business_unit=Exports",
    )
    .await;

    let response = app
        .post(
            "/booking/create/finalize",
            &token,
            Some(&cookie),
            &format!("floor={}", floor),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "The floor is completely booked");
}

#[tokio::test]
async fn test_skipping_a_wizard_step_is_bad_request() {
    let app = test_app();
    let token = app.token("booker@example.com");

    let response = app.get("/booking/create/finalize", &token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/pra/create/mitigation", &token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_past_booking_date_is_rejected() {
    let app = test_app();
    let building = app.store.add_building("Old Admiralty Building");
    let group = app.store.add_dit_group("Trade", "Exports");
    let token = app.token("booker@example.com");

    let response = app
        .post("/booking/create/who-for", &token, None, "for_myself=true")
        .await;
    let cookie = session_cookie(&response);

    let form = format!(
        "booking_date=2020-01-01&building={}&dit_group={}",
        building, group
    );
    let response = app
        .post("/booking/create/details", &token, Some(&cookie), &form)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["fields"][0]["field"], "booking_date");
}

#[tokio::test]
async fn test_overlong_on_behalf_of_name_is_a_field_error() {
    let app = test_app();
    let token = app.token("booker@example.com");

    let form = format!("for_myself=false&on_behalf_of_name={}", "x".repeat(200));
    let response = app
        .post("/booking/create/who-for", &token, None, &form)
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["fields"][0]["field"], "on_behalf_of_name");
}

/// Walks the PRA wizard up to and including the risk category answer and
/// returns the session cookie.
async fn pra_wizard_to_risk_category(app: &TestApp, token: &str, risk_category: &str) -> String {
    app.store.add_user("staff@example.com", "Staff", "Member");
    app.store.add_user("scs@example.com", "Senior", "Servant");
    let group = app.store.add_dit_group("Trade", "Exports");

    let response = app
        .post(
            "/pra/create/initial",
            token,
            None,
            &format!(
                "staff_member_email=staff%40example.com&scs_email=scs%40example.com&dit_group={}",
                group
            ),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    for (path, form) in [
        ("/pra/create/business-unit", "business_unit=Exports".to_string()),
        ("/pra/create/reason", "authorized_reason=Visitor".to_string()),
        (
            "/pra/create/risk-category",
            format!("risk_category={}", risk_category),
        ),
    ] {
        let response = app.post(path, token, Some(&cookie), &form).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
    }
    cookie
}

#[tokio::test]
async fn test_pra_do_not_approve_mitigation_is_finalised_without_approval() {
    let app = test_app();
    let token = app.token("manager@example.com");
    let cookie = pra_wizard_to_risk_category(&app, &token, "moderate_risk").await;

    let response = app.get("/pra/create/mitigation", &token, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["choices"].as_array().unwrap().len(), 3);

    let response = app
        .post(
            "/pra/create/mitigation",
            &token,
            Some(&cookie),
            "mitigation_outcome=do_not_approve",
        )
        .await;
    assert_eq!(
        json_body(response).await["data"]["next"],
        "/pra/create/mitigation-do-not-approve"
    );

    let response = app
        .get("/pra/create/mitigation-do-not-approve", &token, Some(&cookie))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["mitigation_outcome"], "do_not_approve");

    let response = app
        .post(
            "/pra/create/mitigation-do-not-approve",
            &token,
            Some(&cookie),
            "mitigation_measures=",
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post(
            "/pra/create/mitigation-do-not-approve",
            &token,
            Some(&cookie),
            "mitigation_measures=Remote+working+explored",
        )
        .await;
    assert_eq!(json_body(response).await["data"]["next"], "/pra/thanks");

    let response = app.get("/pra/thanks", &token, Some(&cookie)).await;
    let pra_id = json_body(response).await["data"]["pra_id"].as_i64().unwrap();

    let response = app.get(&format!("/pra/{}", pra_id), &token, None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "rejected_without_approval");
    assert_eq!(body["data"]["is_final"], true);
    assert_eq!(body["data"]["mitigation_outcome"], "do_not_approve");
    assert_eq!(body["data"]["mitigation_measures"], "Remote working explored");

    let staff_token = app.token("staff@example.com");
    let response = app
        .post(
            &format!("/pra/{}/staff-member/approve", pra_id),
            &staff_token,
            None,
            "",
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let scs_token = app.token("scs@example.com");
    let response = app
        .post(&format!("/pra/{}/scs/approve", pra_id), &scs_token, None, "")
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template, NotificationTemplate::PraRejectedWithoutApproval);
    assert_eq!(sent[0].email_address, "staff@example.com");
}

#[tokio::test]
async fn test_pra_mitigation_required_asks_the_staff_member() {
    let app = test_app();
    let token = app.token("manager@example.com");
    let cookie = pra_wizard_to_risk_category(&app, &token, "elevated_risk").await;

    let response = app
        .post(
            "/pra/create/mitigation",
            &token,
            Some(&cookie),
            "mitigation_outcome=approve_mitigation_required",
        )
        .await;
    assert_eq!(
        json_body(response).await["data"]["next"],
        "/pra/create/mitigation-approve"
    );

    let response = app
        .post(
            "/pra/create/mitigation-approve",
            &token,
            Some(&cookie),
            "mitigation_measures=Desk+by+the+window",
        )
        .await;
    assert_eq!(json_body(response).await["data"]["next"], "/pra/thanks");

    let response = app.get("/pra/thanks", &token, Some(&cookie)).await;
    let pra_id = json_body(response).await["data"]["pra_id"].as_i64().unwrap();

    let response = app.get(&format!("/pra/{}", pra_id), &token, None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "awaiting_staff_member");
    assert_eq!(body["data"]["is_final"], false);

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].template,
        NotificationTemplate::PraStaffMemberApprovalRequest
    );
}

#[tokio::test]
async fn test_pra_prefer_not_to_say_is_finalised_without_approval() {
    let app = test_app();
    app.store.add_user("staff@example.com", "Staff", "Member");
    app.store.add_user("scs@example.com", "Senior", "Servant");
    let group = app.store.add_dit_group("Trade", "Exports");
    let token = app.token("manager@example.com");

    let response = app
        .post(
            "/pra/create/initial",
            &token,
            None,
            &format!(
                "staff_member_email=staff%40example.com&scs_email=scs%40example.com&dit_group={}",
                group
            ),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    for (path, form) in [
        ("/pra/create/business-unit", "business_unit=Exports"),
        ("/pra/create/reason", "authorized_reason=Visitor"),
        ("/pra/create/risk-category", "risk_category=prefer_not_to_say"),
    ] {
        let response = app.post(path, &token, Some(&cookie), form).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
    }

    let response = app
        .post("/pra/create/prefer-not-to-say", &token, Some(&cookie), "")
        .await;
    assert_eq!(json_body(response).await["data"]["next"], "/pra/thanks");

    let response = app.get("/pra/thanks", &token, Some(&cookie)).await;
    let body = json_body(response).await;
    let pra_id = body["data"]["pra_id"].as_i64().unwrap();
    assert_eq!(
        body["data"]["link"],
        format!("{}/pra/{}", BASE_URL, pra_id)
    );

    let response = app.get(&format!("/pra/{}", pra_id), &token, None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "rejected_without_approval");
    assert_eq!(body["data"]["can_staff_member_decide"], false);

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template, NotificationTemplate::PraRejectedWithoutApproval);
}

#[tokio::test]
async fn test_pra_unknown_staff_member_is_validation_error() {
    let app = test_app();
    app.store.add_user("scs@example.com", "Senior", "Servant");
    let group = app.store.add_dit_group("Trade", "Exports");
    let token = app.token("manager@example.com");

    let response = app
        .post(
            "/pra/create/initial",
            &token,
            None,
            &format!(
                "staff_member_email=nobody%40example.com&scs_email=scs%40example.com&dit_group={}",
                group
            ),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_pra_decisions_follow_the_approval_chain() {
    let app = test_app();
    let staff = app.store.add_user("staff@example.com", "Staff", "Member");
    let manager = app.store.add_user("manager@example.com", "Line", "Manager");
    let scs = app.store.add_user("scs@example.com", "Senior", "Servant");
    let pra = app.store.insert_pra(
        &NewPra {
            staff_member_id: staff.id,
            line_manager_id: manager.id,
            scs_id: scs.id,
            group: "Trade".to_string(),
            business_unit: "Exports".to_string(),
            authorized_reason: "Visitor".to_string(),
            risk_category: RiskCategory::NoCategory,
            mitigation_outcome: None,
            mitigation_measures: String::new(),
        },
        Utc::now(),
    );
    let staff_token = app.token("staff@example.com");
    let scs_token = app.token("scs@example.com");

    let response = app
        .post(&format!("/pra/{}/scs/approve", pra.id), &scs_token, None, "")
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .post(
            &format!("/pra/{}/staff-member/approve", pra.id),
            &scs_token,
            None,
            "",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post(
            &format!("/pra/{}/staff-member/approve", pra.id),
            &staff_token,
            None,
            "",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["status"], "awaiting_scs");

    let response = app
        .post(&format!("/pra/{}/scs/approve", pra.id), &scs_token, None, "")
        .await;
    assert_eq!(json_body(response).await["data"]["status"], "approved");

    let response = app
        .post(&format!("/pra/{}/scs/maybe", pra.id), &scs_token, None, "")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pra_is_hidden_from_uninvolved_users() {
    let app = test_app();
    let staff = app.store.add_user("staff@example.com", "Staff", "Member");
    let manager = app.store.add_user("manager@example.com", "Line", "Manager");
    let scs = app.store.add_user("scs@example.com", "Senior", "Servant");
    let pra = app.store.insert_pra(
        &NewPra {
            staff_member_id: staff.id,
            line_manager_id: manager.id,
            scs_id: scs.id,
            group: "Trade".to_string(),
            business_unit: "Exports".to_string(),
            authorized_reason: "Visitor".to_string(),
            risk_category: RiskCategory::HighRisk,
            mitigation_outcome: None,
            mitigation_measures: String::new(),
        },
        Utc::now(),
    );

    let token = app.token("someone.else@example.com");
    let response = app.get(&format!("/pra/{}", pra.id), &token, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

fn feed_request(path: &str, authorization: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(path)
        .header(HOST, "localhost:8080");
    if let Some(authorization) = authorization {
        builder = builder.header(AUTHORIZATION, authorization);
    }
    builder.body(Body::empty()).unwrap()
}

fn signed(path: &str, nonce: &str) -> String {
    let request = HawkRequest {
        method: "GET",
        resource: path,
        host: "localhost",
        port: 8080,
        content_type: "",
        body: &[],
    };
    client_header(&hawk_credentials(), &request, Utc::now().timestamp(), nonce).unwrap()
}

#[tokio::test]
async fn test_activity_stream_requires_hawk() {
    let app = test_app();

    let response = app
        .send(feed_request("/activity-stream/bookings", None))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let wrong = HawkCredentials {
        id: "feed-id".to_string(),
        key: "wrong-secret".to_string(),
    };
    let request = HawkRequest {
        method: "GET",
        resource: "/activity-stream/bookings",
        host: "localhost",
        port: 8080,
        content_type: "",
        body: &[],
    };
    let header = client_header(&wrong, &request, Utc::now().timestamp(), "n-1").unwrap();
    let response = app
        .send(feed_request("/activity-stream/bookings", Some(header)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_activity_stream_pages_pras() {
    let app = test_app();
    let staff = app.store.add_user("staff@example.com", "Staff", "Member");
    let manager = app.store.add_user("manager@example.com", "Line", "Manager");
    let scs = app.store.add_user("scs@example.com", "Senior", "Servant");
    let start = Utc.with_ymd_and_hms(2020, 9, 1, 9, 0, 0).unwrap();
    for offset in 0..3 {
        app.store.insert_pra(
            &NewPra {
                staff_member_id: staff.id,
                line_manager_id: manager.id,
                scs_id: scs.id,
                group: "Trade".to_string(),
                business_unit: "Exports".to_string(),
                authorized_reason: "Visitor".to_string(),
                risk_category: RiskCategory::NoCategory,
                mitigation_outcome: None,
                mitigation_measures: String::new(),
            },
            start + Duration::minutes(offset),
        );
    }

    let path = "/activity-stream/pras";
    let response = app
        .send(feed_request(path, Some(signed(path, "page-1"))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("server-authorization"));

    let body = json_body(response).await;
    assert_eq!(body["type"], "Collection");
    assert_eq!(body["orderedItems"].as_array().unwrap().len(), 2);
    let next = body["next"].as_str().unwrap();
    assert!(next.starts_with(&format!("{}{}?cursor=", BASE_URL, path)));

    let page_two = &next[BASE_URL.len()..];
    let response = app
        .send(feed_request(page_two, Some(signed(page_two, "page-2"))))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["orderedItems"].as_array().unwrap().len(), 1);

    let next = body["next"].as_str().unwrap();
    let page_three = &next[BASE_URL.len()..];
    let response = app
        .send(feed_request(page_three, Some(signed(page_three, "page-3"))))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["orderedItems"], serde_json::json!([]));
    assert!(body.get("next").is_none());
}

#[tokio::test]
async fn test_activity_stream_rejects_replayed_nonce() {
    let app = test_app();
    let path = "/activity-stream/bookings";
    let header = signed(path, "same-nonce");

    let response = app
        .send(feed_request(path, Some(header.clone())))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(feed_request(path, Some(header))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
