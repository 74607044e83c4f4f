#![allow(clippy::unwrap_used)]
// Integration tests for the resource handlers: triggers, IDS rules,
// precapture filters, roles, federation and server control.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sentrywire_api::{Client, Download, Error, ErrorKind, Permission, RuleSetState};

const TOKEN: &str = "tok-1";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let client = Client::from_base_url(reqwest::Client::new(), &format!("{}/v2", server.uri()))
        .unwrap()
        .with_token(SecretString::from(TOKEN.to_owned()));
    (server, client)
}

fn message(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "message": text }))
}

// ── Active triggers ─────────────────────────────────────────────────

#[tokio::test]
async fn test_create_trigger() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/activetriggers"))
        .and(body_json(json!({
            "rest_token": TOKEN,
            "trigger_name": "http_alt",
            "search_filter": "dst port 8080",
            "seconds_before": 60,
            "seconds_after": 30
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"currTriggerCount": 2, "maxTriggerCount:": 100})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let count = client
        .active_triggers()
        .create("http_alt", "dst port 8080", 60, 30)
        .await
        .unwrap();
    assert_eq!((count.current, count.max), (2, 100));
}

#[tokio::test]
async fn test_list_single_trigger_is_normalized_to_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/activetriggers"))
        .and(query_param("trigger_name", "admin_http_alt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trigger_name": "admin_http_alt",
            "search_filter": "dst port 8080",
            "seconds_before": "60",
            "seconds_after": "30",
            "createdtime": "2021-07-20T16:54:49.95Z"
        })))
        .mount(&server)
        .await;

    let triggers = client
        .active_triggers()
        .list(Some("admin_http_alt"))
        .await
        .unwrap();
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].seconds_before, Some(60));
}

#[tokio::test]
async fn test_trigger_round_trip() {
    let (server, client) = setup().await;
    let triggers = client.active_triggers();

    Mock::given(method("POST"))
        .and(path("/v2/activetriggers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"currTriggerCount": 1, "maxTriggerCount:": 100})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/activetriggers"))
        .and(query_param("trigger_name", "admin_rt"))
        .respond_with(message("deleted active trigger admin_rt"))
        .mount(&server)
        .await;

    triggers.create("rt", "port 66", 60, 60).await.unwrap();

    let listed = Mock::given(method("GET"))
        .and(path("/v2/activetriggers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"trigger_name": "admin_rt", "search_filter": "port 66",
             "seconds_before": "60", "seconds_after": "60"}
        ])))
        .mount_as_scoped(&server)
        .await;
    let names: Vec<String> = triggers
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.trigger_name)
        .collect();
    assert_eq!(names, vec!["admin_rt".to_owned()]);
    drop(listed);

    let reply = triggers.delete("admin_rt").await.unwrap();
    assert_eq!(reply.message, "deleted active trigger admin_rt");

    Mock::given(method("GET"))
        .and(path("/v2/activetriggers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    assert!(triggers.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_trigger_with_bad_token() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/v2/activetriggers"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad token"})))
        .mount(&server)
        .await;

    let err = client.active_triggers().delete("x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAuthentication);
}

// ── IDS rules ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_rule_set_is_multipart() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("valid_rule_set.rules");
    std::fs::write(&file, "alert tcp any any -> any 80 (msg:\"x\"; sid:1;)\n").unwrap();

    Mock::given(method("POST"))
        .and(path("/v2/idsruleset"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"uploaded": "valid_rule_set.rules"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uploaded = client.ids_rules().upload(&file).await.unwrap();
    assert_eq!(uploaded.uploaded, "valid_rule_set.rules");

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="rest_token""#));
    assert!(body.contains(TOKEN));
    assert!(body.contains(r#"name="fileUploadName"; filename="valid_rule_set.rules""#));
    assert!(body.contains("alert tcp any any"));
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let (server, client) = setup().await;

    let err = client
        .ids_rules()
        .upload(std::path::Path::new("/nonexistent/x.rules"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_toggle_rule_sets() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/idsruleset"))
        .and(query_param("type", "deactivated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "UserRules1.rules", "count": 3, "error": "false"},
            {"name": "Now.rules", "count": 5, "error": "true"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/idsruleset"))
        .and(query_param("rulesetname", "Now.rules"))
        .and(query_param("action", "activate"))
        .respond_with(message("activated Now.rules"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/idsruleset"))
        .and(query_param("action", "deactivate"))
        .respond_with(message("deactivated Now.rules"))
        .expect(1)
        .mount(&server)
        .await;

    let sets = client
        .ids_rules()
        .list(RuleSetState::Deactivated)
        .await
        .unwrap();
    assert_eq!(sets.len(), 2);
    assert!(sets[1].error);

    let reply = client.ids_rules().activate("Now.rules").await.unwrap();
    assert_eq!(reply.message, "activated Now.rules");
    client.ids_rules().deactivate("Now.rules").await.unwrap();
}

#[tokio::test]
async fn test_download_rule_set_writes_file() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("downloaded.rules");

    Mock::given(method("GET"))
        .and(path("/v2/idsrulesetcontent"))
        .and(query_param("rulesetname", "valid_rule_set.rules"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(b"alert udp any any -> any 53".to_vec()),
        )
        .mount(&server)
        .await;

    let download = client
        .ids_rules()
        .download("valid_rule_set.rules", &dest)
        .await
        .unwrap();

    assert_eq!(
        download,
        Download::Saved {
            path: dest.clone(),
            bytes: 27
        }
    );
    assert!(std::fs::read(&dest).unwrap().starts_with(b"alert"));
}

#[tokio::test]
async fn test_download_json_answer_writes_nothing() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("never.rules");

    Mock::given(method("GET"))
        .and(path("/v2/idsrulesetcontent"))
        .respond_with(message("ruleset not available"))
        .mount(&server)
        .await;

    let download = client.ids_rules().download("x.rules", &dest).await.unwrap();

    assert_eq!(
        download,
        Download::Message(json!({"message": "ruleset not available"}))
    );
    assert!(!dest.exists());
}

// ── Precapture filters ──────────────────────────────────────────────

#[tokio::test]
async fn test_precapture_filter_cycle() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/precapturefilters"))
        .and(body_partial_json(json!({"search_filter": "port 66"})))
        .respond_with(message(" pre-capture filter set "))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/precapturefilters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"filtername": "f1", "searchfilter": "port 66", "createdtime": "2022-02-16 17:31:00"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/precapturefilters"))
        .and(query_param("rest_token", TOKEN))
        .respond_with(message("pre-capture filter reset"))
        .expect(1)
        .mount(&server)
        .await;

    let filters = client.precapture_filters();
    filters.set("port 66").await.unwrap();
    let listed = filters.list().await.unwrap();
    assert_eq!(listed[0].searchfilter, "port 66");
    let reply = filters.reset().await.unwrap();
    assert_eq!(reply.message, "pre-capture filter reset");
}

#[tokio::test]
async fn test_empty_precapture_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/precapturefilters"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client.precapture_filters().list().await.unwrap().is_empty());
}

// ── Roles ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_role_sends_permission_list() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/authorization"))
        .and(body_json(json!({
            "rest_token": TOKEN,
            "rolename": "auditor",
            "permissions": "Auditing,Search"
        })))
        .respond_with(message("added role auditor"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client
        .roles()
        .create("auditor", &[Permission::Auditing, Permission::Search])
        .await
        .unwrap();
    assert_eq!(reply.message, "added role auditor");
}

#[tokio::test]
async fn test_list_and_delete_roles() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"rolename": "Admin", "Groups": true, "Licensing": true, "Authentication": true,
             "Authorization": true, "Auditing": true, "Search": true, "Policy": true},
            {"rolename": "Guest", "Groups": false, "Search": false}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/authorization"))
        .and(query_param("rolename", "Guest"))
        .respond_with(message("deleted role Guest"))
        .expect(1)
        .mount(&server)
        .await;

    let roles = client.roles().list().await.unwrap();
    assert!(roles[0].policy);
    assert!(!roles[1].search);
    client.roles().delete("Guest").await.unwrap();
}

// ── Federation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_group_round_trip() {
    let (server, client) = setup().await;
    let groups = client.groups();

    Mock::given(method("POST"))
        .and(path("/v2/fmgroup"))
        .and(body_partial_json(json!({"group_name": "Concord"})))
        .respond_with(message("added group Concord"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/fmgroup"))
        .and(query_param("group_name", "Concord"))
        .respond_with(message("deleted group  Concord"))
        .mount(&server)
        .await;

    groups.create("Concord").await.unwrap();

    let listed = Mock::given(method("GET"))
        .and(path("/v2/fmgroup"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"GroupName": "Boston"}, {"GroupName": "Concord"}])),
        )
        .mount_as_scoped(&server)
        .await;
    assert!(groups.list().await.unwrap().iter().any(|g| g.name == "Concord"));
    drop(listed);

    groups.delete("Concord").await.unwrap();

    Mock::given(method("GET"))
        .and(path("/v2/fmgroup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"GroupName": "Boston"}])))
        .mount(&server)
        .await;
    assert!(!groups.list().await.unwrap().iter().any(|g| g.name == "Concord"));
}

#[tokio::test]
async fn test_add_and_delete_node() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/fmnode"))
        .and(body_partial_json(
            json!({"nodeaddr": "10.91.170.161", "group_name": "Boston"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"nodename": "nc198"}])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/fmnode"))
        .and(query_param("nodeaddr", "10.91.170.161"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"DeleteNode": "10.91.170.161"})),
        )
        .mount(&server)
        .await;

    let added = client.nodes().add("10.91.170.161", "Boston").await.unwrap();
    assert_eq!(added.nodename, "nc198");
    let deleted = client.nodes().delete("10.91.170.161").await.unwrap();
    assert_eq!(deleted.address, "10.91.170.161");
}

// ── Server ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_decodes_string_encoded_documents() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/fmping"))
        .and(query_param("rest_token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ServerInfo": "{\"NodeName\":\"sw138\",\"Status\":\"Running\"}",
            "FMNodes": "[{\"nodename\":\"sw138\",\"groupname\":\"g138\"}]",
            "Groups": [{"groupname": "g138", "groupcount": 1}],
            "SWVersion": "7.3.0.309\n",
            "ApiVersion": "1.4"
        })))
        .mount(&server)
        .await;

    let status = client.server().status().await.unwrap();
    assert_eq!(status.info("NodeName"), Some("sw138"));
    assert_eq!(status.nodes[0]["groupname"], "g138");
    assert_eq!(status.groups[0]["groupcount"], 1);
    assert_eq!(status.api_version.as_deref(), Some("1.4"));
}

#[tokio::test]
async fn test_capture_start_and_stop() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/v2/fmcapture"))
        .and(query_param("action", "pause"))
        .respond_with(message("pause request submitted"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/fmcapture"))
        .and(query_param("action", "resume"))
        .respond_with(message("resume request submitted"))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(
        client.capture().stop().await.unwrap().message,
        "pause request submitted"
    );
    assert_eq!(
        client.capture().start().await.unwrap().message,
        "resume request submitted"
    );
}
