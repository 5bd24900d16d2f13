//! Mock source and destination tenants shared by the migration tests

#![allow(dead_code)]

use resource_cloner::config::EnvConfig;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const SOURCE_TENANT: &str = "old-co";
pub const DESTINATION_TENANT: &str = "new-co";

pub fn config(source: &MockServer, destination: &MockServer, workdir: &Path) -> EnvConfig {
    let vars: HashMap<String, String> = [
        ("SRC_API_TOKEN", "src-api".to_string()),
        ("SRC_TENANT", SOURCE_TENANT.to_string()),
        ("SRC_BASE_PATH", source.uri()),
        ("SRC_QUESTIONNAIRE_ID", "RISK".to_string()),
        ("SRC_QUESTIONNAIRE_VERSION", "4".to_string()),
        ("DEST_API_TOKEN", "dest-api".to_string()),
        ("DEST_TENANT", DESTINATION_TENANT.to_string()),
        ("DEST_BASE_PATH", destination.uri()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    EnvConfig::from_vars(&workdir.join(".env"), &vars)
        .expect("complete test configuration")
        .with_output_dir(workdir.join("output"))
}

pub fn tenant_path(tenant: &str, resource: &str) -> String {
    format!("/api/v2/{}/{}", tenant, resource)
}

pub fn source_questionnaire() -> Value {
    json!({
        "data": {
            "id": "RISK+4",
            "type": "questionnaires",
            "attributes": {
                "key": "RISK",
                "name": "Risk review",
                "version": 4,
                "info": { "owner": "governance" },
                "metadata": {},
                "sections": [
                    {
                        "id": "s-old-1",
                        "title": "Scope",
                        "description": "What is covered",
                        "questions": [
                            { "id": "q-old-1", "question": "Is it deployed?", "evidence_type": "select", "select_options": ["yes", "no"], "required": true },
                            { "id": "q-old-2", "question": "Who owns it?", "evidence_type": "text", "required": false }
                        ]
                    }
                ]
            }
        }
    })
}

pub fn copied_questionnaire() -> Value {
    json!({
        "data": {
            "id": "RISK_COPY+1",
            "type": "questionnaires",
            "attributes": {
                "key": "RISK_COPY",
                "name": "Copy of Risk review",
                "version": 1,
                "sections": [
                    {
                        "id": "s-new-1",
                        "title": "Scope",
                        "questions": [
                            { "id": "q-new-1", "question": "Is it deployed?" },
                            { "id": "q-new-2", "question": "Who owns it?" }
                        ]
                    }
                ]
            }
        }
    })
}

async fn mount_auth(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": token })))
        .mount(server)
        .await;
}

async fn mount_get(server: &MockServer, url_path: String, body: Value) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Source tenant with one questionnaire, one custom field, a trigger on the
/// questionnaire, a trigger elsewhere and one action for each
pub async fn mount_source(server: &MockServer) {
    mount_auth(server, "src-jwt").await;

    mount_get(
        server,
        tenant_path(SOURCE_TENANT, "custom_fields"),
        json!({
            "data": [{
                "id": "cf-1",
                "type": "custom_fields",
                "attributes": {
                    "element_type": "input", "metadata": {}, "multiple": false, "name": "Owner",
                    "options": {}, "target": "use_case", "type": "string", "inserted_at": "2024-01-01T00:00:00Z"
                }
            }]
        }),
    )
    .await;

    mount_get(
        server,
        tenant_path(SOURCE_TENANT, "questionnaire_bases"),
        json!({ "data": [{ "id": "RISK" }, { "id": "OTHER" }] }),
    )
    .await;

    mount_get(server, tenant_path(SOURCE_TENANT, "questionnaires/RISK+4"), source_questionnaire()).await;

    mount_get(
        server,
        tenant_path(SOURCE_TENANT, "triggers"),
        json!({
            "data": [
                {
                    "id": "t-old",
                    "attributes": {
                        "type": "answer_equals",
                        "description": "Owner answered",
                        "data": { "questionnaire_id": "RISK+4", "question_id": "q-old-2", "section_id": "s-old-1", "options": {} }
                    }
                },
                {
                    "id": "t-foreign",
                    "attributes": {
                        "type": "answer_equals",
                        "description": "Another questionnaire",
                        "data": { "questionnaire_id": "OTHER+1", "question_id": "q-elsewhere", "section_id": "s-elsewhere" }
                    }
                }
            ]
        }),
    )
    .await;

    mount_get(
        server,
        tenant_path(SOURCE_TENANT, "trigger_actions"),
        json!({
            "data": [
                {
                    "id": "a-1",
                    "attributes": {
                        "type": "show_alert",
                        "description": "Flag ownership",
                        "show_visual_alert": true,
                        "trigger_ids": ["t-old"],
                        "data": { "question_id": "q-old-1", "section_id": "s-old-1" }
                    }
                },
                {
                    "id": "a-2",
                    "attributes": { "type": "show_alert", "trigger_ids": ["t-foreign"], "data": {} }
                }
            ]
        }),
    )
    .await;
}

/// Destination tenant answering every create with `create_status`; the
/// version endpoint always succeeds
pub async fn mount_destination(server: &MockServer, create_status: u16) {
    mount_auth(server, "dest-jwt").await;

    let created = |id: &str| {
        if create_status == 201 {
            ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": id } }))
        } else {
            ResponseTemplate::new(create_status).set_body_json(json!({ "errors": [{ "detail": "has already been taken" }] }))
        }
    };

    for (resource, id) in [
        ("custom_fields", "cf-new"),
        ("questionnaire_bases", "RISK_COPY"),
        ("triggers", "t-new"),
        ("trigger_actions", "a-new"),
    ] {
        Mock::given(method("POST"))
            .and(path(tenant_path(DESTINATION_TENANT, resource)))
            .respond_with(created(id))
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path(tenant_path(DESTINATION_TENANT, "questionnaire_bases/RISK_COPY/versions")))
        .respond_with(ResponseTemplate::new(201).set_body_json(copied_questionnaire()))
        .mount(server)
        .await;
}

pub async fn requests(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

/// Bodies of the POST requests made to one destination collection
pub async fn posted(server: &MockServer, resource: &str) -> Vec<Value> {
    let wanted = tenant_path(DESTINATION_TENANT, resource);
    requests(server)
        .await
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == wanted)
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
        .collect()
}
