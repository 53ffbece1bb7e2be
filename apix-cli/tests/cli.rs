use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

const USERS: &str = r#"
version: 1.0.0
baseUrl: /api/
types:
  - name: User
    members:
      name: {type: string, required: true}
apis:
  - url: /user
    method: post
    params:
      body:
        name: {type: string, required: true, minLength: 2}
    forwards:
      - name: save
        service: users
        grpc:
          method: Save
          paramMapper:
            name: name
      - name: audit
        service: users
        deps: [save]
        grpc:
          method: Audit
          paramMapper:
            who: save.service
        onfail: continue
    returns:
      "200": {data: User}
  - url: /ping
    returns:
      "204": {type: nocontent}
"#;

fn apix() -> Command {
    Command::cargo_bin("apix").unwrap()
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn validate_accepts_valid_document() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "users.yaml", USERS);

    let assert = apix().args(["validate", doc.to_str().unwrap()]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("ok: valid api document"), "{stdout}");
}

#[test]
fn validate_reports_violations_with_exit_2() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "bad.yaml", &USERS.replace("url: /ping", "url: ping"));

    let assert = apix()
        .args(["validate", "--format", "json", doc.to_str().unwrap()])
        .assert()
        .code(2);
    let out = stdout_json(assert.get_output());
    assert_eq!(out["valid"], false);
    assert!(!out["errors"].as_array().unwrap().is_empty());
}

#[test]
fn unparsable_document_is_a_validation_failure() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "broken.yaml", "apis: [unclosed");
    apix().args(["validate", doc.to_str().unwrap()]).assert().code(2);
}

#[test]
fn missing_document_is_a_runtime_error() {
    apix().args(["validate", "/definitely/not/here.yaml"]).assert().code(4);
}

#[test]
fn plan_json_lists_endpoints_and_graph() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "users.yaml", USERS);

    let assert = apix()
        .args(["plan", "--format", "json", doc.to_str().unwrap()])
        .assert()
        .success();
    let out = stdout_json(assert.get_output());
    assert_eq!(out["validation"]["is_valid"], true);
    assert_eq!(out["plan"]["summary"]["endpoint_count"], 2);
    assert_eq!(
        out["plan"]["endpoints"][0]["graph"]["topo_order"],
        serde_json::json!(["save", "audit"])
    );
}

#[test]
fn plan_dot_renders_each_endpoint() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "users.yaml", USERS);

    let assert = apix()
        .args(["plan", "--format", "dot", doc.to_str().unwrap()])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("digraph"));
    assert!(stdout.contains("\"save\" -> \"audit\""));
    assert!(stdout.contains("POST /api/user"));
}

#[test]
fn endpoints_lists_compiled_routes() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "users.yaml", USERS);

    let assert = apix()
        .args(["endpoints", "--format", "json", doc.to_str().unwrap()])
        .assert()
        .success();
    let out = stdout_json(assert.get_output());
    assert_eq!(out[0]["method"], "POST");
    assert_eq!(out[0]["url"], "/api/user");
    assert_eq!(out[0]["forwards"], serde_json::json!(["save", "audit"]));
    assert_eq!(out[1]["url"], "/api/ping");
}

#[test]
fn invoke_without_forwards_needs_no_backend() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "users.yaml", USERS);

    let assert = apix()
        .args(["invoke", doc.to_str().unwrap(), "--url", "/api/ping"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("status: 204"), "{stdout}");
}

#[test]
fn invoke_unknown_route_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "users.yaml", USERS);

    apix()
        .args(["invoke", doc.to_str().unwrap(), "--url", "/api/nothing"])
        .assert()
        .code(3);
}

#[test]
fn invoke_reports_missing_backend_as_runtime_error() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "users.yaml", USERS);
    let params = write(tmp.path(), "params.json", r#"{"body": {"name": "wang"}}"#);
    let proxies = tmp.path().join("proxies");
    fs::create_dir(&proxies).unwrap();

    apix()
        .args(["invoke", doc.to_str().unwrap(), "--method", "post", "--url", "/api/user"])
        .args(["--params", params.to_str().unwrap()])
        .args(["--proxy-dir", proxies.to_str().unwrap()])
        .args(["--register-timeout-ms", "200"])
        .assert()
        .code(4);
}

#[cfg(unix)]
#[test]
fn invoke_runs_chain_through_launched_backend() {
    let tmp = TempDir::new().unwrap();
    let doc = write(tmp.path(), "users.yaml", USERS);
    let proxies = tmp.path().join("proxies");
    fs::create_dir(&proxies).unwrap();
    fs::copy(env!("CARGO_BIN_EXE_apix-echo-proxy"), proxies.join("echo-proxy")).unwrap();

    let params = write(tmp.path(), "params.json", r#"{"body": {"name": "wang"}}"#);
    let assert = apix()
        .env("APIX_ECHO_SERVICES", "users")
        .args(["invoke", doc.to_str().unwrap(), "--method", "post", "--url", "/api/user"])
        .args(["--params", params.to_str().unwrap()])
        .args(["--proxy-dir", proxies.to_str().unwrap()])
        .args(["--format", "json"])
        .assert()
        .success();
    let out = stdout_json(assert.get_output());
    assert_eq!(out["status"], 200);
    assert_eq!(
        out["body"],
        serde_json::json!({"service": "users", "method": "Audit", "params": {"who": "users"}})
    );

    // a binding failure never reaches the backend
    let params = write(tmp.path(), "short.json", r#"{"body": {"name": "w"}}"#);
    apix()
        .env("APIX_ECHO_SERVICES", "users")
        .args(["invoke", doc.to_str().unwrap(), "--method", "post", "--url", "/api/user"])
        .args(["--params", params.to_str().unwrap()])
        .args(["--proxy-dir", proxies.to_str().unwrap()])
        .assert()
        .code(3);
}

#[test]
fn call_reaches_a_single_backend() {
    let assert = apix()
        .env("APIX_ECHO_SERVICES", "echo,mirror")
        .args(["call", "--proxy", env!("CARGO_BIN_EXE_apix-echo-proxy")])
        .args(["--service", "mirror", "--method", "Hi", "--params", r#"{"a": 1}"#])
        .args(["--format", "json"])
        .assert()
        .success();
    let out = stdout_json(assert.get_output());
    assert_eq!(
        out["reply"],
        serde_json::json!({"service": "mirror", "method": "Hi", "params": {"a": 1}})
    );
}

#[test]
fn call_rejects_invalid_params() {
    apix()
        .args(["call", "--proxy", env!("CARGO_BIN_EXE_apix-echo-proxy")])
        .args(["--service", "echo", "--params", "{not json"])
        .assert()
        .code(4);
}
