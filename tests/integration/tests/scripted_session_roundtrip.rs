use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use compass_api::{ApiClient, ApiConfig, DecisionEngineApi, EvaluateRequest};
use compass_cli::{parse_command_file, parse_repl_input, split_command_args, ReplInput};
use compass_core::{current_unix_timestamp_ms, write_text_atomic};
use httpmock::prelude::*;
use serde_json::{json, Value};

static WORKSPACE_COUNTER: AtomicU64 = AtomicU64::new(1);

struct IsolatedWorkspace {
    root: PathBuf,
}

impl IsolatedWorkspace {
    fn new(label: &str) -> Self {
        let count = WORKSPACE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "compass-integration-{label}-{}-{}-{count}",
            std::process::id(),
            current_unix_timestamp_ms()
        ));
        fs::create_dir_all(&root).expect("must create isolated workspace root");
        Self { root }
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for IsolatedWorkspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

/// Minimal driver: command lines adjust the document context, queries hit the API.
fn replay_script(client: &ApiClient, token: &str, script: &Path) -> Vec<Value> {
    let mut source_files = Vec::new();
    let mut responses = Vec::new();
    for entry in parse_command_file(script).expect("script should parse") {
        match parse_repl_input(&entry.command) {
            ReplInput::Command(command) if command.name == "set_docs" => {
                source_files = split_command_args(command.args).expect("args should split");
            }
            ReplInput::Command(command) if command.name == "clear_docs" => source_files.clear(),
            ReplInput::Command(command) => panic!("unexpected command {}", command.name),
            ReplInput::Query(query) => {
                let response = client
                    .evaluate(
                        token,
                        &EvaluateRequest {
                            query_text: query.to_string(),
                            source_files: source_files.clone(),
                        },
                    )
                    .expect("evaluate should succeed");
                responses.push(response);
            }
            ReplInput::Empty => {}
        }
    }
    responses
}

#[test]
fn integration_scripted_lines_scope_queries_to_document_context() {
    let workspace = IsolatedWorkspace::new("context-scope");
    let script = workspace.root().join("session.txt");
    write_text_atomic(
        &script,
        "# scoped then unscoped\nset_docs policy.pdf \"claims handbook.pdf\"\nis physiotherapy covered?\nclear_docs\nis dental covered?\n",
    )
    .expect("write script");

    let server = MockServer::start();
    let scoped = server.mock(|when, then| {
        when.method(POST).path("/evaluate").json_body(json!({
            "query_text": "is physiotherapy covered?",
            "source_files": ["policy.pdf", "claims handbook.pdf"]
        }));
        then.status(200).json_body(json!({"decision": "covered"}));
    });
    let unscoped = server.mock(|when, then| {
        when.method(POST).path("/evaluate").json_body(json!({
            "query_text": "is dental covered?",
            "source_files": []
        }));
        then.status(200).json_body(json!({"decision": "excluded"}));
    });

    let client = ApiClient::new(ApiConfig {
        api_base: server.base_url(),
        request_timeout_ms: 5_000,
    })
    .expect("client");
    let responses = replay_script(&client, "token-123", &script);

    scoped.assert();
    unscoped.assert();
    assert_eq!(
        responses,
        vec![json!({"decision": "covered"}), json!({"decision": "excluded"})]
    );
}
