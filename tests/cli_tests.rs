//! Integration tests for the secret-generator CLI
//!
//! These tests run the built binary end-to-end over stdin/stdout.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::process::{Command, Output, Stdio};

/// Get the path to the secret-generator binary
fn binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test executable name
    path.pop(); // Remove deps directory

    path.push("secret-generator");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    path
}

/// Run the binary with args, feeding `stdin`
fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    run_with_stdin_and_env(args, stdin, &[])
}

fn run_with_stdin_and_env(args: &[&str], stdin: &str, env: &[(&str, &str)]) -> Output {
    let mut child = Command::new(binary())
        .args(args)
        .envs(env.iter().copied())
        .env_remove("RUST_LOG")
        .env_remove("SECRET_GENERATOR_RESOLVER")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute secret-generator");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();

    child.wait_with_output().unwrap()
}

fn run(args: &[&str]) -> Output {
    Command::new(binary())
        .args(args)
        .output()
        .expect("Failed to execute secret-generator")
}

const RESOURCE_LIST: &str = r#"
apiVersion: config.kubernetes.io/v1
kind: ResourceList
items:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: settings
    data:
      mode: fast
functionConfig:
  apiVersion: example.com/v1
  kind: SecretGenerator
  metadata:
    name: generator
  spec:
    name: x
    sources:
      - key: a
        source: "1"
      - key: a
        source: "2"
"#;

#[test]
fn test_version() {
    let output = run(&["--version"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("secret-generator"));
}

#[test]
fn test_help() {
    let output = run(&["--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("gen"));
    assert!(stdout.contains("--resolver"));
}

#[test]
fn test_identity_appends_secret() {
    let output = run_with_stdin(&["--resolver", "identity"], RESOURCE_LIST);

    assert!(output.status.success());

    let list: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    let items = list["items"].as_sequence().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["metadata"]["name"].as_str(), Some("settings"));

    let secret = &items[1];
    assert_eq!(secret["kind"].as_str(), Some("Secret"));
    assert_eq!(secret["metadata"]["name"].as_str(), Some("x"));
    assert_eq!(
        secret["metadata"]["annotations"]["kustomize.config.k8s.io/needs-hash"].as_str(),
        Some("true")
    );
    assert_eq!(secret["stringData"].as_mapping().unwrap().len(), 1);
    assert_eq!(secret["stringData"]["a"].as_str(), Some("2"));
}

#[test]
fn test_output_is_deterministic() {
    let first = run_with_stdin(&["--resolver", "identity"], RESOURCE_LIST);
    let second = run_with_stdin(&["--resolver", "identity"], RESOURCE_LIST);

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_json_output_format() {
    let output = run_with_stdin(
        &["--resolver", "identity", "--output-format", "json"],
        RESOURCE_LIST,
    );

    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kind"], "ResourceList");
    assert_eq!(json["items"][1]["stringData"]["a"], "2");
}

#[test]
fn test_empty_name_fails_with_no_output() {
    let input = RESOURCE_LIST.replace("    name: x\n", "    name: \"\"\n");
    let output = run_with_stdin(&["--resolver", "identity"], &input);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("spec.name"));
}

#[test]
fn test_store_failure_names_locator() {
    let input = r#"
kind: ResourceList
items: []
functionConfig:
  spec:
    name: db-creds
    sources:
      - key: password
        source: projects/p/secrets/db/versions/1
"#;
    // Nothing listens on port 9, so the store call fails fast
    let output = run_with_stdin_and_env(
        &["--endpoint", "http://127.0.0.1:9", "--timeout", "2"],
        input,
        &[("GOOGLE_OAUTH_ACCESS_TOKEN", "test-token")],
    );

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("projects/p/secrets/db/versions/1"));
}

/// Answer a single Secret Manager request, returning the request head
fn serve_secret_once(body: &'static str) -> (String, std::thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&head).to_lowercase()
    });

    (url, handle)
}

#[test]
fn test_secret_manager_value_is_appended() {
    // "s3cr3t" in base64
    let (endpoint, server) = serve_secret_once(r#"{"payload":{"data":"czNjcjN0"}}"#);
    let input = r#"
kind: ResourceList
items: []
functionConfig:
  spec:
    name: db-creds
    sources:
      - key: password
        source: projects/p/secrets/db/versions/1
"#;

    let output = run_with_stdin_and_env(
        &["--endpoint", &endpoint, "--timeout", "5"],
        input,
        &[("GOOGLE_OAUTH_ACCESS_TOKEN", "test-token")],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let list: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    let secret = &list["items"][0];
    assert_eq!(secret["metadata"]["name"].as_str(), Some("db-creds"));
    assert_eq!(secret["stringData"]["password"].as_str(), Some("s3cr3t"));

    let request = server.join().unwrap();
    assert!(request.starts_with("get /v1/projects/p/secrets/db/versions/1:access"));
    assert!(request.contains("authorization: bearer test-token"));
}

#[test]
fn test_invalid_input_fails() {
    let output = run_with_stdin(&["--resolver", "identity"], "kind: ConfigMap\n");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_gen_writes_dockerfile() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&["gen", dir.path().to_str().unwrap()]);

    assert!(output.status.success());

    let dockerfile = std::fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
    assert!(dockerfile.contains("ENTRYPOINT [\"function\"]"));
}
