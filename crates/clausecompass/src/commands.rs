use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use compass_api::{DecisionEngineApi, EvaluateRequest, RegisterRequest};
use compass_cli::{
    parse_repl_input, render_command_help, render_help_overview, split_command_args,
    unknown_help_topic_message, ReplInput, COMMAND_NAMES, COMMAND_SPECS,
};

use crate::credential_prompt::CredentialPrompter;
use crate::runtime_output::{render_json_panel, render_list, RESPONSE_PANEL_TITLE};
use crate::session_state::{SessionMode, SessionState, StageOutcome};
use crate::session_store::{clear_persisted_session, save_persisted_session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandAction {
    Continue,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandOutcome {
    pub(crate) action: CommandAction,
    pub(crate) output: String,
}

impl CommandOutcome {
    fn message(output: impl Into<String>) -> Self {
        Self {
            action: CommandAction::Continue,
            output: output.into(),
        }
    }

    fn exit() -> Self {
        Self {
            action: CommandAction::Exit,
            output: String::new(),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct CommandExecutionContext<'a> {
    pub(crate) api: &'a dyn DecisionEngineApi,
    pub(crate) session_file: Option<&'a Path>,
}

/// Dispatches one REPL line against the session.
pub(crate) fn execute_repl_line(
    line: &str,
    state: &mut SessionState,
    prompter: &mut dyn CredentialPrompter,
    context: CommandExecutionContext<'_>,
) -> Result<CommandOutcome> {
    let command = match parse_repl_input(line) {
        ReplInput::Empty => return Ok(CommandOutcome::message(String::new())),
        ReplInput::Query(query) => return handle_query(query, state, context),
        ReplInput::Command(command) => command,
    };
    tracing::debug!(command = command.name, "dispatching command");

    match command.name {
        "help" => handle_help(command.args),
        "mode" => handle_mode(command.args, state),
        "register" => handle_register(prompter, context),
        "login" => handle_login(command.args, state, prompter, context),
        "logout" => handle_logout(state, context),
        "status" => Ok(CommandOutcome::message(render_status(state, context))),
        "list_docs" => handle_list_docs(state, context),
        "set_docs" => handle_set_docs(command.args, state),
        "add_doc" => handle_add_doc(command.args, state),
        "show_docs" => Ok(CommandOutcome::message(render_active_context(state))),
        "clear_docs" => {
            state.clear_active_context();
            Ok(CommandOutcome::message(
                "current document context has been cleared.",
            ))
        }
        "exit" => Ok(CommandOutcome::exit()),
        other => bail!("unsupported command: {other}"),
    }
}

fn handle_help(args: &str) -> Result<CommandOutcome> {
    if args.is_empty() {
        return Ok(CommandOutcome::message(render_help_overview(COMMAND_SPECS)));
    }
    match render_command_help(args, COMMAND_SPECS) {
        Some(help) => Ok(CommandOutcome::message(help)),
        None => Err(anyhow!(unknown_help_topic_message(args, COMMAND_NAMES))),
    }
}

fn handle_mode(args: &str, state: &mut SessionState) -> Result<CommandOutcome> {
    let mode = args.parse::<SessionMode>()?;
    state.switch_mode(mode);
    tracing::info!(mode = mode.as_str(), "mode switched");
    Ok(CommandOutcome::message(format!("mode switched to: {mode}")))
}

fn require_answer(answer: Option<String>, field: &str) -> Result<String> {
    let answer = answer.ok_or_else(|| anyhow!("{field} prompt cancelled"))?;
    if answer.trim().is_empty() {
        bail!("{field} cannot be empty");
    }
    Ok(answer)
}

/// Secrets are sent exactly as typed; only a cancelled prompt is rejected.
fn require_secret(answer: Option<String>, field: &str) -> Result<String> {
    answer.ok_or_else(|| anyhow!("{field} prompt cancelled"))
}

fn handle_register(
    prompter: &mut dyn CredentialPrompter,
    context: CommandExecutionContext<'_>,
) -> Result<CommandOutcome> {
    let userid = require_answer(prompter.prompt_line("enter new user id: ")?, "user id")?;
    let emailid = require_answer(prompter.prompt_line("enter your email: ")?, "email")?;
    let password = require_secret(prompter.prompt_secret("enter password: ")?, "password")?;

    context
        .api
        .register(&RegisterRequest {
            userid,
            emailid,
            password,
        })
        .context("registration failed")?;
    Ok(CommandOutcome::message(
        "registration successful. please login.",
    ))
}

fn handle_login(
    args: &str,
    state: &mut SessionState,
    prompter: &mut dyn CredentialPrompter,
    context: CommandExecutionContext<'_>,
) -> Result<CommandOutcome> {
    let email = if args.is_empty() {
        require_answer(prompter.prompt_line("email: ")?, "email")?
    } else {
        args.to_string()
    };
    let password = require_secret(prompter.prompt_secret("password: ")?, "password")?;

    let response = context
        .api
        .login(&email, &password)
        .context("login failed")?;
    state.login(response.access_token, email);
    tracing::info!("login succeeded");

    let mut output = "login successful.".to_string();
    if let (Some(path), Some(token), Some(email)) = (
        context.session_file,
        state.token.as_deref(),
        state.user_email.as_deref(),
    ) {
        if let Err(error) = save_persisted_session(path, token, email) {
            output.push_str(&format!("\nwarning: session not saved: {error:#}"));
        }
    }
    Ok(CommandOutcome::message(output))
}

fn handle_logout(
    state: &mut SessionState,
    context: CommandExecutionContext<'_>,
) -> Result<CommandOutcome> {
    state.logout();
    let mut output = "you have been logged out.".to_string();
    if let Some(path) = context.session_file {
        if let Err(error) = clear_persisted_session(path) {
            output.push_str(&format!("\nwarning: saved session not removed: {error:#}"));
        }
    }
    Ok(CommandOutcome::message(output))
}

fn require_mode(state: &SessionState, mode: SessionMode) -> Result<()> {
    if state.mode != mode {
        bail!("this command is only available in '{mode}' mode");
    }
    Ok(())
}

fn require_token(state: &SessionState, action: &str) -> Result<String> {
    state
        .token
        .clone()
        .ok_or_else(|| anyhow!("you must be logged in to {action}"))
}

fn handle_list_docs(
    state: &SessionState,
    context: CommandExecutionContext<'_>,
) -> Result<CommandOutcome> {
    require_mode(state, SessionMode::Persistent)?;
    let token = require_token(state, "list documents")?;
    let mut documents = context
        .api
        .list_documents(&token)
        .context("error fetching documents")?;
    if documents.is_empty() {
        return Ok(CommandOutcome::message(
            "no documents found in persistent knowledge base.",
        ));
    }
    documents.sort();
    Ok(CommandOutcome::message(render_list(
        "available documents in persistent knowledge base",
        &documents,
    )))
}

fn handle_set_docs(args: &str, state: &mut SessionState) -> Result<CommandOutcome> {
    require_mode(state, SessionMode::Persistent)?;
    if args.is_empty() || args == "*" {
        state.persistent_docs.clear();
        return Ok(CommandOutcome::message(
            "persistent document context cleared.",
        ));
    }
    state.persistent_docs = split_command_args(args)?;
    Ok(CommandOutcome::message(format!(
        "persistent document context set to: [{}]",
        state.persistent_docs.join(", ")
    )))
}

fn handle_add_doc(args: &str, state: &mut SessionState) -> Result<CommandOutcome> {
    require_mode(state, SessionMode::Temporary)?;
    let paths = split_command_args(args)?;
    if paths.is_empty() {
        bail!("usage: add_doc /path/to/file.pdf ...");
    }

    let mut lines = Vec::new();
    let mut missing = Vec::new();
    for raw in paths {
        let path = PathBuf::from(&raw);
        if !path.is_file() {
            missing.push(raw);
            continue;
        }
        let absolute = std::path::absolute(&path)
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        match state.stage_document(absolute) {
            StageOutcome::Staged(path) => lines.push(format!("staged: {}", path.display())),
            StageOutcome::AlreadyStaged(path) => {
                lines.push(format!("skipped (already staged): {}", path.display()))
            }
        }
    }

    if !missing.is_empty() {
        lines.push(format!("file not found: {}", missing.join(", ")));
        bail!(lines.join("\n"));
    }
    Ok(CommandOutcome::message(lines.join("\n")))
}

fn render_active_context(state: &SessionState) -> String {
    let documents = state.active_context();
    if documents.is_empty() {
        return "no documents are currently set for this mode.".to_string();
    }
    let title = match state.mode {
        SessionMode::Persistent => "document context set for persistent query",
        SessionMode::Temporary => "local documents staged for temporary query",
    };
    render_list(title, &documents)
}

fn render_status(state: &SessionState, context: CommandExecutionContext<'_>) -> String {
    let user = match state.user_email.as_deref() {
        Some(email) => format!("{email} (authenticated)"),
        None => "logged out".to_string(),
    };
    let session_file = context
        .session_file
        .map_or_else(|| "none".to_string(), |path| path.display().to_string());
    [
        format!("api: {}", context.api.api_base()),
        format!("mode: {}", state.mode),
        format!("user: {user}"),
        format!("persistent docs: {}", state.persistent_docs.len()),
        format!("staged docs: {}", state.staged_docs.len()),
        format!("session file: {session_file}"),
    ]
    .join("\n")
}

fn handle_query(
    query: &str,
    state: &SessionState,
    context: CommandExecutionContext<'_>,
) -> Result<CommandOutcome> {
    let token = require_token(state, "run a query")?;
    let response = match state.mode {
        SessionMode::Persistent => {
            eprintln!("querying persistent knowledge base...");
            context
                .api
                .evaluate(
                    &token,
                    &EvaluateRequest {
                        query_text: query.to_string(),
                        source_files: state.persistent_docs.clone(),
                    },
                )
                .context("query failed")?
        }
        SessionMode::Temporary => {
            if state.staged_docs.is_empty() {
                bail!("no documents staged. use 'add_doc' first");
            }
            eprintln!(
                "uploading {} document(s) and processing...",
                state.staged_docs.len()
            );
            let paths = state
                .staged_docs
                .iter()
                .map(PathBuf::as_path)
                .collect::<Vec<_>>();
            context
                .api
                .evaluate_with_documents(&token, query, &paths)
                .context("query failed")?
        }
    };
    Ok(CommandOutcome::message(render_json_panel(
        RESPONSE_PANEL_TITLE,
        &response,
    )))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};

    use anyhow::Result;
    use compass_api::{
        ApiError, DecisionEngineApi, EvaluateRequest, LoginResponse, RegisterRequest,
    };
    use serde_json::{json, Value};

    use super::{execute_repl_line, CommandAction, CommandExecutionContext};
    use crate::credential_prompt::CredentialPrompter;
    use crate::session_state::{SessionMode, SessionState};
    use crate::session_store::load_persisted_session;

    #[derive(Debug, Clone, PartialEq)]
    enum RecordedCall {
        Register(RegisterRequest),
        Login { email: String, password: String },
        ListDocuments { token: String },
        Evaluate { token: String, request: EvaluateRequest },
        EvaluateWithDocuments {
            token: String,
            query: String,
            paths: Vec<PathBuf>,
        },
    }

    #[derive(Default)]
    struct RecordingApi {
        calls: RefCell<Vec<RecordedCall>>,
        documents: Vec<String>,
        reject_login: bool,
    }

    impl RecordingApi {
        fn calls(&self) -> Vec<RecordedCall> {
            self.calls.borrow().clone()
        }
    }

    impl DecisionEngineApi for RecordingApi {
        fn api_base(&self) -> &str {
            "http://localhost:8000"
        }

        fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
            self.calls
                .borrow_mut()
                .push(RecordedCall::Register(request.clone()));
            Ok(())
        }

        fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
            self.calls.borrow_mut().push(RecordedCall::Login {
                email: email.to_string(),
                password: password.to_string(),
            });
            if self.reject_login {
                return Err(ApiError::HttpStatus {
                    status: 401,
                    detail: "Invalid credentials".to_string(),
                });
            }
            Ok(LoginResponse {
                access_token: "token-123".to_string(),
                token_type: Some("bearer".to_string()),
            })
        }

        fn list_documents(&self, token: &str) -> Result<Vec<String>, ApiError> {
            self.calls.borrow_mut().push(RecordedCall::ListDocuments {
                token: token.to_string(),
            });
            Ok(self.documents.clone())
        }

        fn evaluate(&self, token: &str, request: &EvaluateRequest) -> Result<Value, ApiError> {
            self.calls.borrow_mut().push(RecordedCall::Evaluate {
                token: token.to_string(),
                request: request.clone(),
            });
            Ok(json!({"decision": "approved"}))
        }

        fn evaluate_with_documents(
            &self,
            token: &str,
            query: &str,
            paths: &[&Path],
        ) -> Result<Value, ApiError> {
            self.calls
                .borrow_mut()
                .push(RecordedCall::EvaluateWithDocuments {
                    token: token.to_string(),
                    query: query.to_string(),
                    paths: paths.iter().map(|path| path.to_path_buf()).collect(),
                });
            Ok(json!({"decision": "rejected"}))
        }
    }

    struct ScriptedPrompter {
        answers: VecDeque<Option<String>>,
        labels: Vec<String>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|answer| Some((*answer).to_string()))
                    .collect(),
                labels: Vec::new(),
            }
        }

        fn next(&mut self, label: &str) -> Result<Option<String>> {
            self.labels.push(label.to_string());
            Ok(self.answers.pop_front().flatten())
        }
    }

    impl CredentialPrompter for ScriptedPrompter {
        fn prompt_line(&mut self, label: &str) -> Result<Option<String>> {
            self.next(label)
        }

        fn prompt_secret(&mut self, label: &str) -> Result<Option<String>> {
            self.next(label)
        }
    }

    fn context<'a>(
        api: &'a RecordingApi,
        session_file: Option<&'a Path>,
    ) -> CommandExecutionContext<'a> {
        CommandExecutionContext { api, session_file }
    }

    fn run(
        line: &str,
        state: &mut SessionState,
        prompter: &mut ScriptedPrompter,
        api: &RecordingApi,
    ) -> Result<String> {
        execute_repl_line(line, state, prompter, context(api, None)).map(|outcome| outcome.output)
    }

    fn logged_in_state(mode: SessionMode) -> SessionState {
        let mut state = SessionState::new(mode);
        state.login("token-123".to_string(), "analyst@example.com".to_string());
        state
    }

    #[test]
    fn functional_login_prompts_for_credentials_and_stores_token() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&["analyst@example.com", "hunter2"]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let output = run("login", &mut state, &mut prompter, &api).expect("login");

        assert_eq!(output, "login successful.");
        assert_eq!(state.token.as_deref(), Some("token-123"));
        assert_eq!(state.user_email.as_deref(), Some("analyst@example.com"));
        assert_eq!(prompter.labels, vec!["email: ", "password: "]);
        assert_eq!(
            api.calls(),
            vec![RecordedCall::Login {
                email: "analyst@example.com".to_string(),
                password: "hunter2".to_string(),
            }]
        );
    }

    #[test]
    fn functional_login_with_inline_email_persists_session_file() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let session_path = tempdir.path().join("session.json");
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&["hunter2"]);
        let mut state = SessionState::new(SessionMode::Persistent);

        execute_repl_line(
            "login analyst@example.com",
            &mut state,
            &mut prompter,
            context(&api, Some(session_path.as_path())),
        )
        .expect("login");

        let saved = load_persisted_session(&session_path)
            .expect("load")
            .expect("saved");
        assert_eq!(saved.token, "token-123");
        assert_eq!(saved.user_email, "analyst@example.com");

        execute_repl_line(
            "logout",
            &mut state,
            &mut prompter,
            context(&api, Some(session_path.as_path())),
        )
        .expect("logout");
        assert!(!session_path.exists());
        assert!(!state.is_authenticated());
    }

    #[test]
    fn regression_rejected_login_leaves_session_logged_out() {
        let api = RecordingApi {
            reject_login: true,
            ..RecordingApi::default()
        };
        let mut prompter = ScriptedPrompter::new(&["analyst@example.com", "wrong"]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let error = run("login", &mut state, &mut prompter, &api).expect_err("rejected");

        assert_eq!(format!("{error:#}"), "login failed: 401 - Invalid credentials");
        assert!(!state.is_authenticated());
    }

    #[test]
    fn regression_cancelled_password_prompt_aborts_login_without_request() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&["analyst@example.com"]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let error = run("login", &mut state, &mut prompter, &api).expect_err("cancelled");

        assert!(error.to_string().contains("password prompt cancelled"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn functional_register_sends_prompted_fields_without_logging_in() {
        let api = RecordingApi::default();
        let mut prompter =
            ScriptedPrompter::new(&["analyst", "analyst@example.com", "hunter2"]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let output = run("register", &mut state, &mut prompter, &api).expect("register");

        assert_eq!(output, "registration successful. please login.");
        assert!(!state.is_authenticated());
        assert_eq!(
            api.calls(),
            vec![RecordedCall::Register(RegisterRequest {
                userid: "analyst".to_string(),
                emailid: "analyst@example.com".to_string(),
                password: "hunter2".to_string(),
            })]
        );
    }

    #[test]
    fn regression_login_sends_whitespace_password_verbatim() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&["  "]);
        let mut state = SessionState::new(SessionMode::Persistent);

        run("login analyst@example.com", &mut state, &mut prompter, &api).expect("login");

        assert_eq!(
            api.calls(),
            vec![RecordedCall::Login {
                email: "analyst@example.com".to_string(),
                password: "  ".to_string(),
            }]
        );
    }

    #[test]
    fn regression_register_rejects_blank_user_id() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&["   "]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let error = run("register", &mut state, &mut prompter, &api).expect_err("blank");
        assert!(error.to_string().contains("user id cannot be empty"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn functional_mode_switch_clears_contexts_and_rejects_unknown_mode() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = logged_in_state(SessionMode::Persistent);
        state.persistent_docs = vec!["policy.pdf".to_string()];

        let output = run("mode TEMPORARY", &mut state, &mut prompter, &api).expect("switch");
        assert_eq!(output, "mode switched to: temporary");
        assert_eq!(state.mode, SessionMode::Temporary);
        assert!(state.persistent_docs.is_empty());

        let error = run("mode offline", &mut state, &mut prompter, &api).expect_err("invalid");
        assert!(error.to_string().contains("invalid mode"));
        assert_eq!(state.mode, SessionMode::Temporary);
    }

    #[test]
    fn functional_set_docs_splits_quoted_names_and_star_clears() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let output = run(
            "set_docs policy.pdf \"claims handbook.pdf\"",
            &mut state,
            &mut prompter,
            &api,
        )
        .expect("set");
        assert_eq!(
            output,
            "persistent document context set to: [policy.pdf, claims handbook.pdf]"
        );
        assert_eq!(state.persistent_docs.len(), 2);

        run("set_docs *", &mut state, &mut prompter, &api).expect("clear");
        assert!(state.persistent_docs.is_empty());
    }

    #[test]
    fn regression_mode_restricted_commands_fail_in_wrong_mode() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut persistent = logged_in_state(SessionMode::Persistent);
        let mut temporary = logged_in_state(SessionMode::Temporary);

        let error = run("add_doc a.pdf", &mut persistent, &mut prompter, &api).expect_err("mode");
        assert!(error.to_string().contains("only available in 'temporary' mode"));

        let error = run("set_docs a.pdf", &mut temporary, &mut prompter, &api).expect_err("mode");
        assert!(error.to_string().contains("only available in 'persistent' mode"));

        let error = run("list_docs", &mut temporary, &mut prompter, &api).expect_err("mode");
        assert!(error.to_string().contains("only available in 'persistent' mode"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn functional_list_docs_prints_sorted_names() {
        let api = RecordingApi {
            documents: vec!["zeta.pdf".to_string(), "alpha.pdf".to_string()],
            ..RecordingApi::default()
        };
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = logged_in_state(SessionMode::Persistent);

        let output = run("list_docs", &mut state, &mut prompter, &api).expect("list");
        assert_eq!(
            output,
            "available documents in persistent knowledge base:\n  - alpha.pdf\n  - zeta.pdf"
        );
        assert_eq!(
            api.calls(),
            vec![RecordedCall::ListDocuments {
                token: "token-123".to_string()
            }]
        );
    }

    #[test]
    fn regression_list_docs_requires_login() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let error = run("list_docs", &mut state, &mut prompter, &api).expect_err("login");
        assert!(error.to_string().contains("you must be logged in"));
    }

    #[test]
    fn functional_add_doc_stages_absolute_paths_and_skips_duplicates() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let contract = tempdir.path().join("contract.txt");
        std::fs::write(&contract, "clause").expect("write");
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = SessionState::new(SessionMode::Temporary);
        let line = format!("add_doc '{}'", contract.display());

        let output = run(&line, &mut state, &mut prompter, &api).expect("stage");
        assert!(output.starts_with("staged: "));
        let output = run(&line, &mut state, &mut prompter, &api).expect("restage");
        assert!(output.starts_with("skipped (already staged): "));
        assert_eq!(state.staged_docs.len(), 1);
        assert!(state.staged_docs[0].is_absolute());
    }

    #[test]
    fn regression_add_doc_reports_missing_files_after_staging_valid_ones() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let contract = tempdir.path().join("contract.txt");
        std::fs::write(&contract, "clause").expect("write");
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = SessionState::new(SessionMode::Temporary);
        let line = format!("add_doc {} missing.pdf", contract.display());

        let error = run(&line, &mut state, &mut prompter, &api).expect_err("missing");
        let message = error.to_string();
        assert!(message.contains("staged: "));
        assert!(message.contains("file not found: missing.pdf"));
        assert_eq!(state.staged_docs.len(), 1);

        let error = run("add_doc", &mut state, &mut prompter, &api).expect_err("usage");
        assert!(error.to_string().contains("usage: add_doc"));
    }

    #[test]
    fn functional_persistent_query_sends_document_context() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = logged_in_state(SessionMode::Persistent);
        state.persistent_docs = vec!["policy.pdf".to_string()];

        let output = run("is cataract surgery covered?", &mut state, &mut prompter, &api)
            .expect("query");

        assert!(output.contains("AI decision engine response"));
        assert!(output.contains("\"decision\": \"approved\""));
        assert_eq!(
            api.calls(),
            vec![RecordedCall::Evaluate {
                token: "token-123".to_string(),
                request: EvaluateRequest {
                    query_text: "is cataract surgery covered?".to_string(),
                    source_files: vec!["policy.pdf".to_string()],
                },
            }]
        );
    }

    #[test]
    fn functional_temporary_query_uploads_staged_documents() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = logged_in_state(SessionMode::Temporary);
        state.staged_docs = vec![PathBuf::from("/tmp/contract.pdf")];

        let output = run("is the annex binding?", &mut state, &mut prompter, &api)
            .expect("query");

        assert!(output.contains("\"decision\": \"rejected\""));
        assert_eq!(
            api.calls(),
            vec![RecordedCall::EvaluateWithDocuments {
                token: "token-123".to_string(),
                query: "is the annex binding?".to_string(),
                paths: vec![PathBuf::from("/tmp/contract.pdf")],
            }]
        );
    }

    #[test]
    fn regression_queries_require_login_and_staged_documents() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut anonymous = SessionState::new(SessionMode::Persistent);
        let error = run("anything covered?", &mut anonymous, &mut prompter, &api)
            .expect_err("login required");
        assert!(error.to_string().contains("you must be logged in to run a query"));

        let mut temporary = logged_in_state(SessionMode::Temporary);
        let error = run("anything covered?", &mut temporary, &mut prompter, &api)
            .expect_err("staging required");
        assert!(error.to_string().contains("no documents staged"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn functional_show_and_clear_docs_follow_active_mode() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let output = run("show_docs", &mut state, &mut prompter, &api).expect("show");
        assert_eq!(output, "no documents are currently set for this mode.");

        state.persistent_docs = vec!["policy.pdf".to_string()];
        let output = run("show_docs", &mut state, &mut prompter, &api).expect("show");
        assert_eq!(
            output,
            "document context set for persistent query:\n  - policy.pdf"
        );

        run("clear_docs", &mut state, &mut prompter, &api).expect("clear");
        assert!(state.persistent_docs.is_empty());
    }

    #[test]
    fn functional_help_and_exit_commands() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = SessionState::new(SessionMode::Persistent);

        let output = run("help", &mut state, &mut prompter, &api).expect("help");
        assert!(output.contains("core commands:"));
        let output = run("help add_doc", &mut state, &mut prompter, &api).expect("topic");
        assert!(output.contains("command: add_doc"));
        let error = run("help add_dco", &mut state, &mut prompter, &api).expect_err("unknown");
        assert!(error.to_string().contains("did you mean add_doc?"));

        let outcome = execute_repl_line("QUIT", &mut state, &mut prompter, context(&api, None))
            .expect("quit");
        assert_eq!(outcome.action, CommandAction::Exit);
    }

    #[test]
    fn unit_status_reports_session_summary() {
        let api = RecordingApi::default();
        let mut prompter = ScriptedPrompter::new(&[]);
        let mut state = logged_in_state(SessionMode::Persistent);

        let output = run("status", &mut state, &mut prompter, &api).expect("status");
        assert!(output.contains("api: http://localhost:8000"));
        assert!(output.contains("user: analyst@example.com (authenticated)"));
        assert!(output.contains("session file: none"));
    }
}
