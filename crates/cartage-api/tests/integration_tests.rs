//! End-to-end tests against the assembled router: bearer auth, the full
//! mission lifecycle over HTTP, and the error envelope.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use cartage_api::app;
use cartage_api::state::AppState;
use cartage_engine::{Actor, TokenDirectory};
use cartage_store::{Role, UserRecord};

const SHIPPER_TOKEN: &str = "tok-shipper";
const CARRIER_A_TOKEN: &str = "tok-carrier-a";
const CARRIER_B_TOKEN: &str = "tok-carrier-b";

struct TestApp {
    router: Router,
    carrier_a: cartage_core::UserId,
}

fn test_app() -> TestApp {
    let mut tokens = TokenDirectory::new();
    let mut register = |token: &str, name: &str, role: Role| {
        let record = UserRecord::new(name, role);
        let actor = Actor {
            id: record.id,
            role,
        };
        tokens.register(token, actor);
        (record, actor.id)
    };

    let (shipper, _) = register(SHIPPER_TOKEN, "Atelier Buro", Role::Shipper);
    let (carrier_a, carrier_a_id) = register(CARRIER_A_TOKEN, "Fret Express", Role::Carrier);
    let (carrier_b, _) = register(CARRIER_B_TOKEN, "Sud Logistique", Role::Carrier);

    let state = AppState::in_memory(Arc::new(tokens));
    state.users.insert(shipper);
    state.users.insert(carrier_a);
    state.users.insert(carrier_b);

    TestApp {
        router: app(state),
        carrier_a: carrier_a_id,
    }
}

fn draft_body() -> Value {
    let stop = |city: &str| {
        json!({
            "address": format!("12 Rue du Port, {city}"),
            "city": city,
            "postal_code": "13000",
            "contact_name": "Mme Caron",
            "contact_phone": "+33 6 11 22 33 44",
            "date": null,
            "time_slot": "08:00-10:00",
            "instructions": null
        })
    };
    json!({
        "shipment_class": "STANDARD",
        "pickup": stop("Marseille"),
        "delivery": stop("Toulouse"),
        "goods_type": "palettes",
        "weight_kg": 350.0,
        "fragile": false,
        "distance_km": 100.0
    })
}

async fn send(
    router: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

/// Create + confirm a mission, returning its id.
async fn searching_mission(router: &Router) -> String {
    let (status, body) = send(
        router,
        "POST",
        "/v1/missions",
        Some(SHIPPER_TOKEN),
        Some(draft_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        router,
        "POST",
        &format!("/v1/missions/{id}/confirm"),
        Some(SHIPPER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "confirm failed: {body}");
    id
}

#[tokio::test]
async fn health_probes_are_unauthenticated() {
    let t = test_app();
    let (status, _) = send(&t.router, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&t.router, "GET", "/health/readiness", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_or_unknown_token_is_401() {
    let t = test_app();
    let (status, body) = send(&t.router, "GET", "/v1/missions/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error_kind"], "UNAUTHORIZED");

    let (status, _) = send(&t.router, "GET", "/v1/missions/mine", Some("tok-nobody"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_mission_prices_the_shipment() {
    let t = test_app();
    let (status, body) = send(
        &t.router,
        "POST",
        "/v1/missions",
        Some(SHIPPER_TOKEN),
        Some(draft_body()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], json!(true));
    let pricing = &body["data"]["pricing"];
    assert_eq!(pricing["base_price"], json!(70.0));
    assert_eq!(pricing["commission_amount"], json!(7.0));
    assert_eq!(pricing["vat_amount"], json!(15.4));
    assert_eq!(pricing["final_price"], json!(92.4));
    assert_eq!(body["data"]["status"], "CREATED");
    assert_eq!(body["data"]["carrier_id"], Value::Null);
}

#[tokio::test]
async fn invalid_draft_is_422() {
    let t = test_app();
    let mut bad = draft_body();
    bad["weight_kg"] = json!(-5.0);
    let (status, body) = send(
        &t.router,
        "POST",
        "/v1/missions",
        Some(SHIPPER_TOKEN),
        Some(bad),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_kind"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn full_lifecycle_over_http() {
    let t = test_app();
    let id = searching_mission(&t.router).await;

    // Both carriers bid.
    for token in [CARRIER_A_TOKEN, CARRIER_B_TOKEN] {
        let (status, body) = send(
            &t.router,
            "POST",
            &format!("/v1/missions/{id}/acceptances"),
            Some(token),
            Some(json!({"message": "dispo"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "bid failed: {body}");
    }

    // Owner lists bids, oldest first.
    let (status, body) = send(
        &t.router,
        "GET",
        &format!("/v1/missions/{id}/acceptances"),
        Some(SHIPPER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Shipper selects carrier A.
    let (status, body) = send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/select-carrier"),
        Some(SHIPPER_TOKEN),
        Some(json!({"carrier_id": t.carrier_a.to_string()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "select failed: {body}");
    assert_eq!(body["data"]["status"], "ACCEPTED");
    assert_eq!(body["data"]["carrier_id"], t.carrier_a.to_string());

    // Carrier A drives the delivery chain.
    for (event, expected) in [
        ("CONFIRM_PICKUP", "PICKUP_CONFIRMED"),
        ("START_TRANSIT", "IN_TRANSIT"),
        ("MARK_DELIVERED", "DELIVERED"),
    ] {
        let (status, body) = send(
            &t.router,
            "POST",
            &format!("/v1/missions/{id}/status"),
            Some(CARRIER_A_TOKEN),
            Some(json!({"event": event})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{event} failed: {body}");
        assert_eq!(body["data"]["status"], expected);
    }

    // Shipper completes.
    let (status, body) = send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/status"),
        Some(SHIPPER_TOKEN),
        Some(json!({"event": "COMPLETE"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");
}

#[tokio::test]
async fn losing_bidder_cannot_be_selected_afterwards() {
    let t = test_app();
    let id = searching_mission(&t.router).await;

    for token in [CARRIER_A_TOKEN, CARRIER_B_TOKEN] {
        send(
            &t.router,
            "POST",
            &format!("/v1/missions/{id}/acceptances"),
            Some(token),
            Some(json!({})),
        )
        .await;
    }
    send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/select-carrier"),
        Some(SHIPPER_TOKEN),
        Some(json!({"carrier_id": t.carrier_a.to_string()})),
    )
    .await;

    // Selecting again (any carrier) is a state conflict.
    let (status, body) = send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/select-carrier"),
        Some(SHIPPER_TOKEN),
        Some(json!({"carrier_id": t.carrier_a.to_string()})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "got: {body}");
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn duplicate_bid_is_409() {
    let t = test_app();
    let id = searching_mission(&t.router).await;

    let path = format!("/v1/missions/{id}/acceptances");
    send(&t.router, "POST", &path, Some(CARRIER_A_TOKEN), Some(json!({}))).await;
    let (status, body) = send(&t.router, "POST", &path, Some(CARRIER_A_TOKEN), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_kind"], "DUPLICATE_ACCEPTANCE");
}

#[tokio::test]
async fn price_can_rise_but_never_fall() {
    let t = test_app();
    let (_, body) = send(
        &t.router,
        "POST",
        "/v1/missions",
        Some(SHIPPER_TOKEN),
        Some(draft_body()),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let path = format!("/v1/missions/{id}/price");

    let (status, body) = send(
        &t.router,
        "PUT",
        &path,
        Some(SHIPPER_TOKEN),
        Some(json!({"new_price": 120.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pricing"]["final_price"], json!(120.0));

    let (status, body) = send(
        &t.router,
        "PUT",
        &path,
        Some(SHIPPER_TOKEN),
        Some(json!({"new_price": 92.4})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_kind"], "INVALID_PRICE_DIRECTION");

    // Non-owner gets 403 before any price logic runs.
    let (status, _) = send(
        &t.router,
        "PUT",
        &path,
        Some(CARRIER_A_TOKEN),
        Some(json!({"new_price": 500.0})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_mission_is_404() {
    let t = test_app();
    let (status, body) = send(
        &t.router,
        "GET",
        &format!("/v1/missions/{}", uuid::Uuid::new_v4()),
        Some(SHIPPER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_kind"], "NOT_FOUND");
}

#[tokio::test]
async fn dashboard_reflects_bids_and_requires_shipper_role() {
    let t = test_app();
    let id = searching_mission(&t.router).await;
    send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/acceptances"),
        Some(CARRIER_A_TOKEN),
        Some(json!({})),
    )
    .await;

    let (status, body) = send(
        &t.router,
        "GET",
        "/v1/dashboard/shipper",
        Some(SHIPPER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let offers = body["data"]["new_offers"].as_array().unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["carrier"]["name"], "Fret Express");
    assert!(body["data"]["in_progress"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &t.router,
        "GET",
        "/v1/dashboard/shipper",
        Some(CARRIER_A_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn available_missions_visible_to_carriers() {
    let t = test_app();
    let _id = searching_mission(&t.router).await;

    let (status, body) = send(
        &t.router,
        "GET",
        "/v1/missions/available",
        Some(CARRIER_A_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["shipper"]["name"], "Atelier Buro");
}

#[tokio::test]
async fn direct_accept_binds_and_blocks_later_bids() {
    let t = test_app();
    let id = searching_mission(&t.router).await;

    let (status, body) = send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/accept"),
        Some(CARRIER_A_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "accept failed: {body}");
    assert_eq!(body["data"]["status"], "ACCEPTED");

    let (status, body) = send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/acceptances"),
        Some(CARRIER_B_TOKEN),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_kind"], "ALREADY_ASSIGNED");
}

#[tokio::test]
async fn cancel_is_a_side_exit_for_either_party() {
    let t = test_app();
    let id = searching_mission(&t.router).await;

    // A stranger to the mission cannot cancel it.
    let (status, _) = send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/cancel"),
        Some(CARRIER_A_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/cancel"),
        Some(SHIPPER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CANCELLED");

    // Terminal: nothing further applies.
    let (status, body) = send(
        &t.router,
        "POST",
        &format!("/v1/missions/{id}/dispute"),
        Some(SHIPPER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_kind"], "INVALID_TRANSITION");
}
