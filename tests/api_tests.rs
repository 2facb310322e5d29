mod common;

use axum::http::{Method, StatusCode};
use common::{create_company, get, post, send, test_app};
use serde_json::json;

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Service is healthy");
}

#[tokio::test]
async fn test_company_lifecycle() {
    let app = test_app().await;

    let (status, body) = post(
        &app,
        "/api/companies",
        json!({
            "name": "Lattice Vault",
            "description": "Passwordless authentication for banks",
            "headquarters": "Boston, MA",
            "founded_year": 2021
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].is_string());
    assert_eq!(body["data"]["category"], "identity");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/companies/{}", id),
        Some(json!({ "employee_count": 35, "category": "data-security" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["employee_count"], 35);
    assert_eq!(body["data"]["category"], "data-security");
    assert_eq!(body["data"]["headquarters"], "Boston, MA");

    let (status, body) = get(&app, &format!("/api/companies/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["company"]["name"], "Lattice Vault");
    assert!(body["data"]["funding_rounds"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/companies/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, &format!("/api/companies/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("company"));
}

#[tokio::test]
async fn test_company_validation_and_conflicts() {
    let app = test_app().await;

    let (status, _) = post(&app, "/api/companies", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/api/companies", json!({ "name": "Old Co", "founded_year": 1492 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    create_company(&app, "Echo Shield", None).await;
    let (status, body) = post(&app, "/api/companies", json!({ "name": "Echo Shield" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::DELETE, "/api/companies/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_company_filters() {
    let app = test_app().await;
    create_company(&app, "Acme Identity", Some("identity")).await;
    create_company(&app, "Beacon Cloud", Some("cloud-security")).await;
    create_company(&app, "Cobalt Cloud", Some("cloud-security")).await;

    let (_, body) = get(&app, "/api/companies?category=cloud-security").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = get(&app, "/api/companies?search=Acme").await;
    let names: Vec<&str> = body["data"].as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Acme Identity"]);

    let (_, body) = get(&app, "/api/companies?limit=1&offset=1").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_funding_entry_and_summary() {
    let app = test_app().await;
    let id = create_company(&app, "Harbor Sec", Some("network-security")).await;

    let (status, body) = post(
        &app,
        "/api/funding",
        json!({
            "company_id": id,
            "stage": "Series A",
            "amount_text": "raised $12.5M",
            "announced_on": "2024-03-01",
            "investors": ["Northbeam Capital", " Atlas Growth "]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["stage"], "series-a");
    assert_eq!(body["data"]["amount_usd"], 12_500_000);
    assert_eq!(body["data"]["early_stage"], true);
    assert_eq!(body["data"]["source"], "manual");
    assert_eq!(body["data"]["investors"], json!(["Northbeam Capital", "Atlas Growth"]));

    let (status, _) = post(
        &app,
        "/api/funding",
        json!({ "company_name": "Ghost Labs", "stage": "seed", "amount_usd": 3_500_000, "announced_on": "2023-05-10" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post(&app, "/api/funding", json!({ "company_id": id, "stage": "series_b" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = get(&app, &format!("/api/companies/{}", id)).await;
    assert_eq!(body["data"]["company"]["total_funding_usd"], 12_500_000);

    let (status, body) = get(&app, "/api/funding/summary").await;
    assert_eq!(status, StatusCode::OK);
    let overall = &body["data"]["overall"];
    assert_eq!(overall["count"], 3);
    assert_eq!(overall["disclosed"], 2);
    assert_eq!(overall["total"], 16_000_000);
    assert_eq!(overall["average"], 8_000_000.0);
    assert_eq!(overall["median"], 8_000_000.0);
    assert_eq!(body["data"]["by_year"]["2024"]["total"], 12_500_000);
    assert_eq!(body["data"]["top_companies"][0]["company_name"], "Harbor Sec");

    let (_, body) = get(&app, "/api/funding?stage=Seed").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = get(&app, "/api/funding?year=2024").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_funding_validation() {
    let app = test_app().await;
    let id = create_company(&app, "Vector Nine", None).await;

    let (status, _) = post(&app, "/api/funding", json!({ "stage": "seed" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/api/funding", json!({ "company_id": id, "stage": "seed", "amount_text": "a lot" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(&app, "/api/funding", json!({ "company_id": id, "stage": "seed", "amount_usd": -5 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(&app, "/api/funding", json!({ "company_id": id, "stage": "seed", "announced_on": "03/01/2024" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(&app, "/api/funding", json!({ "company_id": 4242, "stage": "seed" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_rounds_are_rejected() {
    let app = test_app().await;
    let id = create_company(&app, "Bigsum Analytics", None).await;

    let (status, body) = post(
        &app,
        "/api/funding",
        json!({ "company_id": id, "stage": "growth", "amount_usd": 5_000_000_000_000_000_000i64 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    let (status, _) = post(
        &app,
        "/api/funding",
        json!({ "company_id": id, "stage": "growth", "amount_text": "$5,000,000,000,000" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = get(&app, &format!("/api/funding?company_id={}", id)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let (status, body) = get(&app, "/api/funding/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["overall"]["count"], 0);
}

#[tokio::test]
async fn test_rejected_round_does_not_leave_a_new_company_behind() {
    let app = test_app().await;
    let id = create_company(&app, "Anchor Labs", None).await;
    let url = "https://news.example/anchor-labs-series-a";

    let (status, _) = post(&app, "/api/funding", json!({ "company_id": id, "stage": "series-a", "source_url": url })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(
        &app,
        "/api/funding",
        json!({ "company_name": "Phantom Co", "stage": "seed", "amount_usd": 1_000_000, "source_url": url }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    let (status, body) = get(&app, "/api/companies?search=Phantom").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty(), "{}", body);
    let (_, body) = get(&app, "/api/funding").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleting_a_company_removes_its_records() {
    let app = test_app().await;
    let doomed = create_company(&app, "Sunset Secure", Some("endpoint")).await;
    let bystander = create_company(&app, "Evergreen Shield", Some("endpoint")).await;

    for company in [doomed, bystander] {
        let (status, _) = post(&app, "/api/funding", json!({ "company_id": company, "stage": "seed", "amount_usd": 2_000_000 })).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = post(&app, "/api/portfolio", json!({ "investor_name": "Atlas Growth", "company_id": company })).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = post(&app, "/api/team-members", json!({ "company_id": doomed, "name": "Lee Park", "title": "CEO" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post(&app, "/api/acquisitions", json!({ "acquirer_name": "MegaCorp", "target_company_id": doomed })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/companies/{}", doomed), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, &format!("/api/funding?company_id={}", doomed)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let (_, body) = get(&app, "/api/acquisitions").await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let (_, body) = get(&app, "/api/portfolio").await;
    let links = body["data"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["company_id"], bystander);
    let (status, _) = get(&app, &format!("/api/companies/{}/team", doomed)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&app, &format!("/api/funding?company_id={}", bystander)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_team_acquisitions_and_portfolio() {
    let app = test_app().await;
    let target = create_company(&app, "Nimbus Guard", Some("cloud-security")).await;

    let (status, _) = post(
        &app,
        "/api/team-members",
        json!({ "company_id": target, "name": "Ada Brook", "title": "CEO" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = get(&app, &format!("/api/companies/{}/team", target)).await;
    assert_eq!(body["data"][0]["name"], "Ada Brook");

    let (status, _) = post(
        &app,
        "/api/acquisitions",
        json!({ "acquirer_name": "MegaCorp", "target_company_id": target, "amount_usd": 250_000_000, "announced_on": "2024-08-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post(&app, "/api/acquisitions", json!({ "acquirer_name": "MegaCorp", "target_company_id": 777 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = get(&app, "/api/acquisitions").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let link = json!({ "investor_name": "Atlas Growth", "company_id": target });
    let (status, _) = post(&app, "/api/portfolio", link.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post(&app, "/api/portfolio", link).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, body) = get(&app, "/api/portfolio?investor=Atlas%20Growth").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = get(&app, &format!("/api/companies/{}", target)).await;
    assert_eq!(body["data"]["acquisitions"][0]["acquirer_name"], "MegaCorp");
    assert_eq!(body["data"]["investors"], json!(["Atlas Growth"]));
}

#[tokio::test]
async fn test_dashboard_refreshes_after_writes() {
    let app = test_app().await;

    let (status, body) = get(&app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["company_count"], 0);
    assert!(body["data"]["average_round"].is_null());

    let id = create_company(&app, "Pulse Endpoint", Some("endpoint")).await;
    post(&app, "/api/funding", json!({ "company_id": id, "stage": "seed", "amount_usd": 2_000_000 })).await;
    post(&app, "/api/funding", json!({ "company_id": id, "stage": "series-a", "amount_usd": 6_000_000 })).await;

    let (_, body) = get(&app, "/api/dashboard").await;
    assert_eq!(body["data"]["company_count"], 1);
    assert_eq!(body["data"]["total_raised"], 8_000_000);
    assert_eq!(body["data"]["average_round"], 4_000_000.0);
    assert_eq!(body["data"]["top_categories"][0]["category"], "endpoint");
}

#[tokio::test]
async fn test_data_sources() {
    let app = test_app().await;

    let (status, body) = get(&app, "/api/data-sources").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 7);

    let (status, body) = post(&app, "/api/data-sources", json!({ "action": "test", "source": "crunchbase" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["preview"]["records"].as_array().unwrap().len() > 0);
    assert!(body["data"]["persisted"].is_null());

    let (status, body) = post(&app, "/api/data-sources", json!({ "action": "sync", "source": "crunchbase" })).await;
    assert_eq!(status, StatusCode::OK);
    let inserted = body["data"]["persisted"]["rounds_inserted"].as_u64().unwrap();
    assert_eq!(inserted, body["data"]["record_count"].as_u64().unwrap());

    // Same feed again: every round is already stored
    let (_, body) = post(&app, "/api/data-sources", json!({ "action": "sync", "source": "crunchbase" })).await;
    assert_eq!(body["data"]["persisted"]["rounds_inserted"], 0);

    let (status, _) = post(&app, "/api/data-sources", json!({ "action": "delete", "source": "crunchbase" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post(&app, "/api/data-sources", json!({ "action": "test", "source": "nope" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ingestion_endpoints() {
    let app = test_app().await;

    let (status, body) = get(&app, "/api/data-ingestion/conferences").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let (_, body) = get(&app, "/api/data-ingestion/market-intel?source=pitchbook").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["source_id"], "pitchbook");
    assert_eq!(body["data"][0]["simulated"], true);

    // A conference id is not a market-intel source
    let (status, _) = get(&app, "/api/data-ingestion/market-intel?source=def-con").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::POST, "/api/data-ingestion/black-hat", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["persisted"]["companies_created"].as_u64().unwrap() > 0);

    let (status, _) = send(&app, Method::POST, "/api/data-ingestion/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ai_agents_without_credentials() {
    let app = test_app().await;

    let (_, body) = get(&app, "/api/ai-agents").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let (status, body) = post(
        &app,
        "/api/ai-agents",
        json!({ "agent": "threat-intel", "prompt": "What is trending in ransomware?" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["agent"], "threat-intel");
    assert_eq!(body["data"]["answer"]["simulated"], true);

    let (status, _) = post(&app, "/api/ai-agents", json!({ "agent": "oracle", "prompt": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post(&app, "/api/ai-agents", json!({ "agent": "market-analyst", "prompt": " " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analysis_types() {
    let app = test_app().await;
    let id = create_company(&app, "Orbit IAM", Some("identity")).await;
    post(&app, "/api/funding", json!({ "company_id": id, "stage": "seed", "amount_usd": 1_000_000 })).await;

    let (status, body) = post(&app, "/api/analysis", json!({ "type": "funding-trends" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "funding-trends");
    assert_eq!(body["data"]["data"]["overall"]["total"], 1_000_000);

    let (status, body) = post(&app, "/api/analysis", json!({ "type": "company-profile", "company_id": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"]["company"]["name"], "Orbit IAM");

    let (status, body) = post(&app, "/api/analysis", json!({ "type": "competitive-landscape", "category": "identity" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"]["companies"].as_array().unwrap().len(), 1);

    let (status, _) = post(&app, "/api/analysis", json!({ "type": "competitive-landscape" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post(&app, "/api/analysis", json!({ "type": "company-profile", "company_id": 31337 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = post(&app, "/api/analysis", json!({ "type": "astrology" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_data_protection_flow() {
    let app = test_app().await;

    let (status, body) = post(
        &app,
        "/api/data-protection",
        json!({ "action": "encrypt", "actor": "analyst-1", "field": "term_sheet", "value": "pre-money 40M" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ciphertext = body["data"]["ciphertext"].as_str().unwrap().to_string();
    assert_ne!(ciphertext, "pre-money 40M");

    let (status, body) = post(
        &app,
        "/api/data-protection",
        json!({ "action": "decrypt", "actor": "analyst-1", "value": ciphertext }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plaintext"], "pre-money 40M");

    let (status, _) = post(&app, "/api/data-protection", json!({ "action": "decrypt", "value": "bm90IGEgcmVhbCBlbnZlbG9wZQ==" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = post(&app, "/api/data-protection", json!({ "action": "classify", "fields": ["name", "email"] })).await;
    assert_eq!(body["data"]["classification"]["name"], "public");

    let (_, body) = post(
        &app,
        "/api/data-protection",
        json!({ "action": "protect", "role": "viewer", "record": { "name": "Keystone", "email": "ceo@keystone.io" } }),
    )
    .await;
    assert_eq!(body["data"]["record"]["name"], "Keystone");
    assert_eq!(body["data"]["record"]["email"], "c****@keystone.io");

    let (status, _) = post(&app, "/api/data-protection", json!({ "action": "shred" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/api/data-protection/audit?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["action"], "access");
}
