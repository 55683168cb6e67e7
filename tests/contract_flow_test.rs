mod common;

use axum::http::StatusCode;
use common::{app, dec, id, send};
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

fn contract_body(professional: Uuid, escrow: bool) -> JsonValue {
    json!({
        "professional_id": professional,
        "title": "SS27 lookbook styling",
        "contract_type": "project-based",
        "scope": {
            "description": "Style forty looks across two shoot days",
            "deliverables": ["Look sheets", "On-set styling"]
        },
        "total_amount": 900,
        "currency": "EUR",
        "payment_structure": "milestone",
        "escrow_enabled": escrow
    })
}

fn assert_ledger_balances(contract: &JsonValue) {
    assert_eq!(
        dec(&contract["total_paid"]) + dec(&contract["remaining_amount"]),
        dec(&contract["financial"]["total_amount"])
    );
}

#[tokio::test]
async fn escrow_backed_milestones_through_completion() {
    let app = app();
    let client = Uuid::new_v4();
    let stylist = Uuid::new_v4();

    let (status, contract) = send(&app, "POST", "/contracts", Some(client), Some(contract_body(stylist, true))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(contract["status"], "draft");
    assert_eq!(contract["fully_signed"], false);
    let base = format!("/contracts/{}", id(&contract["id"]));

    let (_, pending) = send(&app, "POST", &format!("{}/sign", base), Some(client), None).await;
    assert_eq!(pending["status"], "pending-signature");
    let (status, _) = send(&app, "POST", &format!("{}/sign", base), Some(client), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, active) = send(&app, "POST", &format!("{}/sign", base), Some(stylist), None).await;
    assert_eq!(active["status"], "active");
    assert_eq!(active["fully_signed"], true);

    let milestones = format!("{}/milestones", base);
    let (status, _) = send(
        &app,
        "POST",
        &milestones,
        Some(stylist),
        Some(json!({ "title": "Fittings", "amount": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        &milestones,
        Some(client),
        Some(json!({ "title": "Fittings", "amount": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, with_both) = send(
        &app,
        "POST",
        &milestones,
        Some(client),
        Some(json!({ "title": "Shoot days", "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        "POST",
        &milestones,
        Some(client),
        Some(json!({ "title": "Overtime", "amount": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let fittings = id(&with_both["financial"]["milestones"][0]["id"]);
    let shoot = id(&with_both["financial"]["milestones"][1]["id"]);
    let fittings_uri = format!("{}/milestones/{}", base, fittings);
    let shoot_uri = format!("{}/milestones/{}", base, shoot);

    send(&app, "PATCH", &fittings_uri, Some(stylist), Some(json!({ "status": "due" }))).await;
    let (status, _) = send(&app, "PATCH", &fittings_uri, Some(client), Some(json!({ "status": "paid" }))).await;
    assert_eq!(status, StatusCode::CONFLICT, "unfunded escrow cannot pay out");

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/escrow/fund", base),
        Some(client),
        Some(json!({ "amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, funded) = send(
        &app,
        "POST",
        &format!("{}/escrow/fund", base),
        Some(client),
        Some(json!({ "amount": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&funded["escrow"]["total_held"]), Decimal::from(400));

    let (status, paid) = send(&app, "PATCH", &fittings_uri, Some(client), Some(json!({ "status": "paid" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&paid["total_paid"]), Decimal::from(400));
    assert_eq!(dec(&paid["remaining_amount"]), Decimal::from(500));
    assert_eq!(dec(&paid["escrow"]["total_held"]), Decimal::ZERO);
    assert_eq!(paid["escrow"]["releases"].as_array().unwrap().len(), 1);
    assert_ledger_balances(&paid);

    send(&app, "PATCH", &shoot_uri, Some(stylist), Some(json!({ "status": "due" }))).await;
    let (status, _) = send(&app, "PATCH", &shoot_uri, Some(stylist), Some(json!({ "status": "disputed" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, disputed) = send(
        &app,
        "PATCH",
        &shoot_uri,
        Some(stylist),
        Some(json!({ "status": "disputed", "reason": "Second day was cut short" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(disputed["financial"]["milestones"][1]["status"], "disputed");
    let dispute_uri = format!(
        "{}/disputes/{}",
        base,
        id(&disputed["escrow"]["disputes"][0]["id"])
    );

    let (status, _) = send(
        &app,
        "PATCH",
        &dispute_uri,
        Some(client),
        Some(json!({ "status": "resolved" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    send(&app, "PATCH", &dispute_uri, Some(client), Some(json!({ "status": "under-review" }))).await;
    let (status, resolved) = send(
        &app,
        "PATCH",
        &dispute_uri,
        Some(client),
        Some(json!({ "status": "resolved", "resolution": "Full day rate agreed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["financial"]["milestones"][1]["status"], "due");
    assert_eq!(resolved["escrow"]["disputes"][0]["resolution"], "Full day rate agreed");

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/status", base),
        Some(client),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "unpaid milestones block completion");

    send(
        &app,
        "POST",
        &format!("{}/escrow/fund", base),
        Some(client),
        Some(json!({ "amount": 500 })),
    )
    .await;
    let (_, settled) = send(&app, "PATCH", &shoot_uri, Some(client), Some(json!({ "status": "paid" }))).await;
    assert_eq!(dec(&settled["total_paid"]), Decimal::from(900));
    assert_eq!(dec(&settled["remaining_amount"]), Decimal::ZERO);
    assert_ledger_balances(&settled);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/status", base),
        Some(stylist),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, completed) = send(
        &app,
        "POST",
        &format!("{}/status", base),
        Some(client),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");

    let (status, _) = send(
        &app,
        "POST",
        &milestones,
        Some(client),
        Some(json!({ "title": "Late extra", "amount": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn parties_talk_and_list_their_contracts() {
    let app = app();
    let client = Uuid::new_v4();
    let stylist = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let (_, contract) = send(&app, "POST", "/contracts", Some(client), Some(contract_body(stylist, false))).await;
    let base = format!("/contracts/{}", id(&contract["id"]));

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/communications", base),
        Some(stranger),
        Some(json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, messaged) = send(
        &app,
        "POST",
        &format!("{}/communications", base),
        Some(stylist),
        Some(json!({ "message": "Sending moodboard tonight" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(messaged["communications"][0]["author"], stylist.to_string());

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/escrow/fund", base),
        Some(client),
        Some(json!({ "amount": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "escrow disabled");

    let (_, listed) = send(&app, "GET", "/contracts", Some(stylist), None).await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);
    let (_, none) = send(&app, "GET", "/contracts", Some(stranger), None).await;
    assert!(none["items"].as_array().unwrap().is_empty());

    let (status, cancelled) = send(
        &app,
        "POST",
        &format!("{}/status", base),
        Some(stylist),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
}

#[tokio::test]
async fn self_contracts_are_rejected() {
    let app = app();
    let user = Uuid::new_v4();
    let (status, _) = send(&app, "POST", "/contracts", Some(user), Some(contract_body(user, false))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contracts_only_reference_the_clients_own_jobs() {
    let app = app();
    let client = Uuid::new_v4();
    let stylist = Uuid::new_v4();

    let mut dangling = contract_body(stylist, false);
    dangling["job_id"] = json!(Uuid::new_v4());
    let (status, _) = send(&app, "POST", "/contracts", Some(client), Some(dangling)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, job) = send(
        &app,
        "POST",
        "/jobs/create",
        Some(client),
        Some(json!({
            "title": "Lookbook stylist",
            "description": "Two shoot days",
            "category": "styling",
            "job_type": "freelance",
            "work_format": "on-site",
            "compensation": { "type": "project" },
            "publish": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut linked = contract_body(stylist, false);
    linked["job_id"] = job["id"].clone();
    let (status, _) = send(&app, "POST", "/contracts", Some(stylist), Some(linked.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, contract) = send(&app, "POST", "/contracts", Some(client), Some(linked)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(contract["job"], job["id"]);
}
