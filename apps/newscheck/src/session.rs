//! Line-oriented interactive session.
//!
//! Each input line becomes a trigger on one shared controller. Triggers do not
//! wait for each other, so a later line supersedes an earlier one that is
//! still in flight; the output always follows the controller's current state.

use std::{io::Write, path::PathBuf};

use anyhow::Context;
use client_core::{VerificationApi, ViewController, ViewRequest, ViewSnapshot};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::warn;

use crate::{
    requests::{document_request, text_request},
    ui::render::Renderer,
};

pub const HELP: &str =
    "Type a headline to check it. Commands: :all, :file <path>, :theme, :help, :quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    LoadAll,
    CheckText(String),
    CheckFile(PathBuf),
    ToggleTheme,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_line(line: &str) -> SessionCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return SessionCommand::Empty;
    }
    let Some(command) = trimmed.strip_prefix(':') else {
        return SessionCommand::CheckText(trimmed.to_string());
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));
    match name {
        "all" => SessionCommand::LoadAll,
        "file" if !rest.is_empty() => SessionCommand::CheckFile(PathBuf::from(rest)),
        "theme" => SessionCommand::ToggleTheme,
        "help" => SessionCommand::Help,
        "quit" | "q" => SessionCommand::Quit,
        _ => SessionCommand::Unknown(trimmed.to_string()),
    }
}

pub fn render_snapshot(renderer: &Renderer, snapshot: &ViewSnapshot) -> Option<String> {
    let body = renderer.render(&snapshot.state);
    if body.is_empty() {
        return None;
    }
    Some(format!("[request {}] {body}", snapshot.request_id))
}

pub async fn run<A: VerificationApi + 'static>(
    controller: ViewController<A>,
    renderer: Renderer,
) -> anyhow::Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    run_with(controller, renderer, input, &mut std::io::stdout()).await
}

/// Drives the session from `input`, writing rendered state to `out`.
///
/// End of input stops reading but not rendering: the session stays until no
/// request is loading and no document is still being read, so piped input
/// sees its results. `:quit` leaves at once.
pub async fn run_with<A, R, W>(
    controller: ViewController<A>,
    mut renderer: Renderer,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    A: VerificationApi + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut updates = controller.subscribe();
    let mut lines = input.lines();
    let (loaded_tx, mut loaded_rx) = mpsc::unbounded_channel::<anyhow::Result<ViewRequest>>();
    let mut input_open = true;
    let mut pending_loads = 0usize;

    writeln!(out, "{HELP}")?;
    controller.spawn(ViewRequest::LoadAll);

    loop {
        if !input_open && pending_loads == 0 && !controller.state().is_loading() {
            if updates.has_changed().unwrap_or(false) {
                let snapshot = updates.borrow_and_update().clone();
                write_snapshot(out, &renderer, &snapshot)?;
            }
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                write_snapshot(out, &renderer, &snapshot)?;
            }
            Some(loaded) = loaded_rx.recv(), if pending_loads > 0 => {
                pending_loads -= 1;
                match loaded {
                    Ok(request) => {
                        controller.spawn(request);
                    }
                    Err(err) => {
                        warn!(error = %err, "document not submitted");
                        writeln!(out, "{err:#}")?;
                    }
                }
            }
            line = lines.next_line(), if input_open => {
                let command = match line.context("failed to read session input")? {
                    Some(line) => parse_line(&line),
                    None => {
                        input_open = false;
                        SessionCommand::Empty
                    }
                };
                match command {
                    SessionCommand::LoadAll => {
                        controller.spawn(ViewRequest::LoadAll);
                    }
                    SessionCommand::CheckText(text) => match text_request(&text) {
                        Ok(request) => {
                            controller.spawn(request);
                        }
                        Err(err) => writeln!(out, "{err}")?,
                    },
                    SessionCommand::CheckFile(path) => {
                        pending_loads += 1;
                        let loaded_tx = loaded_tx.clone();
                        tokio::spawn(async move {
                            let _ = loaded_tx.send(document_request(&path).await);
                        });
                    }
                    SessionCommand::ToggleTheme => writeln!(out, "{}", renderer.toggle_theme())?,
                    SessionCommand::Help => writeln!(out, "{HELP}")?,
                    SessionCommand::Quit => break,
                    SessionCommand::Empty => {}
                    SessionCommand::Unknown(input) => {
                        writeln!(out, "unknown command '{input}'. {HELP}")?
                    }
                }
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn write_snapshot<W: Write>(
    out: &mut W,
    renderer: &Renderer,
    snapshot: &ViewSnapshot,
) -> anyhow::Result<()> {
    if let Some(output) = render_snapshot(renderer, snapshot) {
        writeln!(out, "{output}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        io::Cursor,
        sync::{Arc, Mutex},
        time::{Duration, SystemTime, UNIX_EPOCH},
    };

    use async_trait::async_trait;
    use client_core::RequestState;
    use serde_json::json;
    use shared::{
        domain::{DocumentQuery, NewsArticle},
        error::VerificationError,
        protocol::CheckOutcome,
    };
    use tokio::sync::oneshot;

    use super::*;
    use crate::ui::theme::{Theme, ThemeState};

    type CheckGate = oneshot::Receiver<Result<CheckOutcome, VerificationError>>;

    /// Lists one article at once; text checks wait for the gate when one is
    /// installed, documents answer with their file name.
    #[derive(Default)]
    struct GatedApi {
        check_gate: Mutex<Option<CheckGate>>,
    }

    impl GatedApi {
        fn gated() -> (Self, oneshot::Sender<Result<CheckOutcome, VerificationError>>) {
            let (tx, rx) = oneshot::channel();
            let api = Self {
                check_gate: Mutex::new(Some(rx)),
            };
            (api, tx)
        }
    }

    #[async_trait]
    impl VerificationApi for GatedApi {
        async fn fetch_all(&self) -> Result<Vec<NewsArticle>, VerificationError> {
            tokio::task::yield_now().await;
            Ok(vec![NewsArticle {
                id: "1".to_string(),
                title: "Headline".to_string(),
                description: "Body".to_string(),
                image_url: None,
            }])
        }

        async fn check_text(&self, query: &str) -> Result<CheckOutcome, VerificationError> {
            let gate = self.check_gate.lock().expect("lock").take();
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(VerificationError::transport(None, "gate dropped"))),
                None => {
                    tokio::task::yield_now().await;
                    Ok(CheckOutcome(json!({ "query": query })))
                }
            }
        }

        async fn check_document(
            &self,
            document: DocumentQuery,
        ) -> Result<CheckOutcome, VerificationError> {
            tokio::task::yield_now().await;
            Ok(CheckOutcome(json!({ "file": document.file_name })))
        }
    }

    /// Never answers a text check.
    struct StalledApi;

    #[async_trait]
    impl VerificationApi for StalledApi {
        async fn fetch_all(&self) -> Result<Vec<NewsArticle>, VerificationError> {
            Ok(Vec::new())
        }

        async fn check_text(&self, _query: &str) -> Result<CheckOutcome, VerificationError> {
            std::future::pending().await
        }

        async fn check_document(
            &self,
            _document: DocumentQuery,
        ) -> Result<CheckOutcome, VerificationError> {
            std::future::pending().await
        }
    }

    fn plain_renderer() -> Renderer {
        Renderer::new(ThemeState::new(Theme::Light), false)
    }

    async fn session_output<A: VerificationApi + 'static>(
        controller: ViewController<A>,
        input: &str,
    ) -> String {
        let mut out = Vec::new();
        tokio::time::timeout(
            Duration::from_secs(5),
            run_with(
                controller,
                plain_renderer(),
                Cursor::new(input.as_bytes().to_vec()),
                &mut out,
            ),
        )
        .await
        .expect("session finished")
        .expect("session ok");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn plain_lines_are_text_checks() {
        assert_eq!(
            parse_line("  Moon made of cheese  "),
            SessionCommand::CheckText("Moon made of cheese".to_string())
        );
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line(":all"), SessionCommand::LoadAll);
        assert_eq!(
            parse_line(":file ./docs/claim 1.pdf"),
            SessionCommand::CheckFile(PathBuf::from("./docs/claim 1.pdf"))
        );
        assert_eq!(parse_line(":theme"), SessionCommand::ToggleTheme);
        assert_eq!(parse_line(":q"), SessionCommand::Quit);
        assert_eq!(parse_line("   "), SessionCommand::Empty);
        assert_eq!(
            parse_line(":file"),
            SessionCommand::Unknown(":file".to_string())
        );
    }

    #[test]
    fn snapshots_are_tagged_with_their_request() {
        let renderer = Renderer::new(ThemeState::new(Theme::Light), false);
        let loading = ViewSnapshot {
            request_id: 3,
            state: RequestState::Loading,
        };
        assert_eq!(
            render_snapshot(&renderer, &loading).as_deref(),
            Some("[request 3] Loading...")
        );
        assert_eq!(render_snapshot(&renderer, &ViewSnapshot::default()), None);
    }

    #[tokio::test]
    async fn piped_input_waits_for_in_flight_check() {
        let (api, release) = GatedApi::gated();
        let controller = ViewController::new(Arc::new(api));

        let releaser = tokio::spawn(async move {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            let _ = release.send(Ok(CheckOutcome(json!({ "verdict": "fake" }))));
        });

        let output = session_output(controller.clone(), "moon landing faked\n").await;
        releaser.await.expect("releaser");

        assert!(output.contains("[request 2] Loading..."), "{output}");
        assert!(
            output.contains("[request 2] verification result"),
            "{output}"
        );
        assert!(output.contains("\"verdict\": \"fake\""), "{output}");
        assert_eq!(
            controller.state(),
            RequestState::Succeeded(shared::protocol::VerificationResult::CheckOutcome(
                CheckOutcome(json!({ "verdict": "fake" }))
            ))
        );
    }

    #[tokio::test]
    async fn empty_input_still_renders_initial_list() {
        let controller = ViewController::new(Arc::new(GatedApi::default()));
        let output = session_output(controller, "").await;
        assert!(output.contains("[request 1] [1] Headline"), "{output}");
    }

    #[tokio::test]
    async fn quit_leaves_without_waiting() {
        let controller = ViewController::new(Arc::new(StalledApi));
        let output = session_output(controller.clone(), "stuck\n:quit\n").await;
        assert!(controller.state().is_loading());
        assert!(!output.contains("verification result"), "{output}");
    }

    #[tokio::test]
    async fn file_lines_are_loaded_then_checked() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = env::temp_dir().join(format!("newscheck_session_test_{suffix}"));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("claim.pdf");
        fs::write(&path, b"%PDF-1.4").expect("write");

        let controller = ViewController::new(Arc::new(GatedApi::default()));
        let output = session_output(
            controller,
            &format!(":file {}\n:file /nonexistent/missing.pdf\n", path.display()),
        )
        .await;

        assert!(output.contains("\"file\": \"claim.pdf\""), "{output}");
        assert!(
            output.contains("failed to read '/nonexistent/missing.pdf'"),
            "{output}"
        );

        fs::remove_dir_all(dir).expect("cleanup");
    }
}
