//! Session lifecycle
//!
//! Every call to [`SessionController::start`] supersedes whatever came
//! before it: the previous session's cancellation token fires, its
//! temporary document is released, and the snapshot resets to
//! `Validating`. A superseded session may still be running, but every write
//! it attempts is checked against its own token under the same lock that
//! `start` takes, so it can never overwrite a newer session's state.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ViewerConfig;
use crate::document::{DocumentDecoder, PdfDecoder, ResourceLedger, TempDocument};
use crate::error::{Error, Result};

use super::classify;
use super::progress::*;
use super::transport::HttpTransport;
use super::{enumerate_pages, ErrorKind, PageRef, SessionState, VerificationCode, ViewerSnapshot};

/// Called with every published snapshot, under the session lock
pub type StateObserver = Arc<dyn Fn(&ViewerSnapshot) + Send + Sync>;

/// Drives verification sessions and publishes their state
pub struct SessionController {
    endpoint: String,
    config: Arc<ViewerConfig>,
    transport: HttpTransport,
    decoder: Arc<dyn DocumentDecoder>,
    ledger: ResourceLedger,
    shared: Arc<Shared>,
}

struct Shared {
    active: Mutex<ActiveSession>,
    snapshot: watch::Sender<ViewerSnapshot>,
    observer: Mutex<Option<StateObserver>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ActiveSession> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Update the snapshot and notify the observer; callers hold the session lock
    fn publish(&self, update: impl FnOnce(&mut ViewerSnapshot)) {
        self.snapshot.send_modify(update);
        let observer = self
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(observer) = observer {
            let snapshot = self.snapshot.borrow().clone();
            observer(&snapshot);
        }
    }
}

/// Bookkeeping for the newest session
struct ActiveSession {
    id: u64,
    token: CancellationToken,
    resource: Option<TempDocument>,
    code: Option<String>,
}

impl ActiveSession {
    /// Abort the running session and release what it owns
    fn supersede(&mut self) {
        self.token.cancel();
        if let Some(resource) = self.resource.take() {
            debug!(session = self.id, "Releasing document of superseded session");
            drop(resource);
        }
    }
}

/// Returned by [`SessionController::start`]
#[derive(Debug)]
pub struct SessionHandle {
    id: u64,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait until the session's task has finished, whether it published or not
    pub async fn finished(self) {
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!(session = self.id, "Session task panicked");
                }
            }
        }
    }
}

impl SessionController {
    /// Controller using the PDF decoder
    pub fn new(config: ViewerConfig) -> Result<Self> {
        Self::with_decoder(config, Arc::new(PdfDecoder))
    }

    pub fn with_decoder(config: ViewerConfig, decoder: Arc<dyn DocumentDecoder>) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        let (snapshot, _) = watch::channel(ViewerSnapshot::validating());

        Ok(Self {
            endpoint: config.endpoint(),
            config: Arc::new(config),
            transport,
            decoder,
            ledger: ResourceLedger::new(),
            shared: Arc::new(Shared {
                active: Mutex::new(ActiveSession {
                    id: 0,
                    token: CancellationToken::new(),
                    resource: None,
                    code: None,
                }),
                snapshot,
                observer: Mutex::new(None),
            }),
        })
    }

    /// Start a new session for `code`, superseding any previous one.
    ///
    /// A blank or missing code ends immediately in `Invalid` without any
    /// network traffic. Must be called from within a tokio runtime.
    pub fn start(&self, code: Option<&str>) -> SessionHandle {
        let mut active = self.shared.lock();
        active.supersede();
        active.id += 1;
        active.token = CancellationToken::new();
        active.code = code.map(str::to_string);
        let id = active.id;

        self.shared.publish(|snap| *snap = ViewerSnapshot::validating());

        let code = match VerificationCode::parse(code) {
            Ok(code) => code,
            Err(err) => {
                info!(session = id, "Rejected blank verification code");
                let (message, detail) = classify::describe(&err);
                self.shared.publish(|snap| {
                    *snap = ViewerSnapshot {
                        state: SessionState::Invalid { message, detail },
                        progress: 0,
                    }
                });
                return SessionHandle { id, task: None };
            }
        };

        let scope = SessionScope {
            shared: Arc::clone(&self.shared),
            token: active.token.clone(),
            id,
        };
        drop(active);

        let worker = SessionWorker {
            endpoint: self.endpoint.clone(),
            config: Arc::clone(&self.config),
            transport: self.transport.clone(),
            decoder: Arc::clone(&self.decoder),
            ledger: self.ledger.clone(),
        };

        let task = tokio::spawn(async move { worker.run(scope, code).await });
        SessionHandle { id, task: Some(task) }
    }

    /// Run the last code again from the start
    pub fn retry(&self) -> SessionHandle {
        let code = self.code();
        self.start(code.as_deref())
    }

    /// Abort the current session and release its resources; state is left as is
    pub fn teardown(&self) {
        let mut active = self.shared.lock();
        active.supersede();
        debug!(session = active.id, "Session controller torn down");
    }

    /// Current state
    pub fn snapshot(&self) -> ViewerSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Receive every published state change
    pub fn subscribe(&self) -> watch::Receiver<ViewerSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Install the observer notified on every state change
    pub fn set_observer(&self, observer: StateObserver) {
        let _active = self.shared.lock();
        *self.shared.observer.lock().unwrap_or_else(PoisonError::into_inner) = Some(observer);
    }

    /// Last code passed to [`start`](Self::start)
    pub fn code(&self) -> Option<String> {
        self.shared.lock().code.clone()
    }

    /// Tracks temporary documents created by this controller's sessions
    /// Token of the newest session; fires when it is superseded or torn down
    pub fn cancellation(&self) -> CancellationToken {
        self.shared.lock().token.clone()
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// A running session's only way to publish.
///
/// Each write takes the shared lock and is dropped if the token has fired.
struct SessionScope {
    shared: Arc<Shared>,
    token: CancellationToken,
    id: u64,
}

impl SessionScope {
    fn progress(&self, value: u8) {
        let _active = self.shared.lock();
        if self.token.is_cancelled() {
            return;
        }
        self.shared.publish(|snap| {
            let progress = snap.progress.max(value);
            snap.progress = progress;
            if let SessionState::Validating { progress: p } = &mut snap.state {
                *p = progress;
            }
        });
    }

    /// Hand the temporary document to the active session; it is released
    /// right away if this session has already been superseded.
    fn adopt(&self, resource: TempDocument) -> Result<PathBuf> {
        let mut active = self.shared.lock();
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let path = resource.path().to_path_buf();
        active.resource = Some(resource);
        Ok(path)
    }

    fn finish(&self, state: SessionState) {
        let _active = self.shared.lock();
        if self.token.is_cancelled() {
            debug!(session = self.id, "Dropping result of superseded session");
            return;
        }
        self.shared.publish(|snap| snap.state = state);
    }
}

/// Everything a session task needs, cloned out of the controller
struct SessionWorker {
    endpoint: String,
    config: Arc<ViewerConfig>,
    transport: HttpTransport,
    decoder: Arc<dyn DocumentDecoder>,
    ledger: ResourceLedger,
}

impl SessionWorker {
    async fn run(self, scope: SessionScope, code: VerificationCode) {
        let session = scope.id;
        info!(session, endpoint = %self.endpoint, "Starting verification session");

        match self.verify(&scope, &code).await {
            Ok(pages) => {
                info!(session, pages = pages.len(), "Certificate verified");
                scope.finish(SessionState::Valid { pages });
            }
            Err(err) if err.is_cancelled() => {
                debug!(session, "Session cancelled");
            }
            Err(err) => {
                let (message, detail) = classify::describe(&err);
                warn!(
                    session,
                    error = %err,
                    kind = detail.as_ref().map(|d| d.kind.as_str()).unwrap_or("none"),
                    "Verification failed"
                );
                scope.finish(SessionState::Invalid { message, detail });
            }
        }
    }

    async fn verify(&self, scope: &SessionScope, code: &VerificationCode) -> Result<Vec<PageRef>> {
        let timeout = self.config.timeout;

        // Watchdog covers the request and the body download
        let body = tokio::select! {
            biased;
            _ = scope.token.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(timeout) => {
                return Err(Error::Network {
                    kind: ErrorKind::Timeout,
                    message: format!("no complete response within {} ms", timeout.as_millis()),
                });
            }
            body = self.download(scope, code) => body?,
        };

        let resource = TempDocument::create(&body, &self.ledger)?;
        let path = scope.adopt(resource)?;
        scope.progress(RESOURCE_CREATED);

        let decoder = Arc::clone(&self.decoder);
        let decode = tokio::task::spawn_blocking(move || decoder.decode(&path));
        let document = tokio::select! {
            biased;
            _ = scope.token.cancelled() => return Err(Error::Cancelled),
            joined = decode => joined
                .map_err(|e| Error::General(format!("Decoder task failed: {}", e)))??,
        };
        scope.progress(DOCUMENT_DECODED);

        if document.page_count() == 0 {
            return Err(Error::NoPages);
        }

        let pages = enumerate_pages(&document);
        scope.progress(PAGES_ENUMERATED);
        Ok(pages)
    }

    async fn download(&self, scope: &SessionScope, code: &VerificationCode) -> Result<Vec<u8>> {
        let media_type = self.config.media_type.to_ascii_lowercase();
        scope.progress(REQUEST_BUILT);

        scope.progress(REQUEST_SENT);
        let head = self
            .transport
            .post_form(&self.endpoint, &self.config.code_field, code.as_str(), &media_type)
            .await?;
        scope.progress(HEADERS_RECEIVED);

        if !head.is_success() {
            let status = head.status;
            let message = head.text().await;
            return Err(Error::Server { status, message });
        }

        let is_document = head
            .content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains(&media_type))
            .unwrap_or(false);
        if !is_document {
            return Err(Error::WrongContentType(head.content_type.clone()));
        }

        let body = head.bytes().await?;
        scope.progress(BODY_DOWNLOADED);

        if body.is_empty() {
            return Err(Error::EmptyBody);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages;

    fn controller() -> SessionController {
        let config = ViewerConfig {
            // Nothing listens here; these tests never reach the network
            api_base: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        SessionController::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_blank_code_is_invalid_immediately() {
        let controller = controller();
        for code in [None, Some(""), Some("   ")] {
            let handle = controller.start(code);
            let snapshot = controller.snapshot();
            assert_eq!(snapshot.error_message(), Some(messages::INVALID_CODE));
            assert!(snapshot.error_detail().is_none());
            assert_eq!(snapshot.progress, 0);
            handle.finished().await;
        }
        assert_eq!(controller.ledger().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_session_ids_increase() {
        let controller = controller();
        let first = controller.start(None);
        let second = controller.start(Some(""));
        assert!(second.id() > first.id());
    }

    #[tokio::test]
    async fn test_start_resets_snapshot() {
        let controller = controller();
        controller.start(None).finished().await;
        assert!(controller.snapshot().state.is_terminal());

        let handle = controller.start(Some("abc"));
        assert!(matches!(
            controller.snapshot().state,
            SessionState::Validating { .. }
        ));
        controller.teardown();
        handle.finished().await;
    }

    #[tokio::test]
    async fn test_teardown_silences_running_session() {
        let controller = controller();
        let handle = controller.start(Some("abc"));
        controller.teardown();
        handle.finished().await;

        // Cancelled sessions never publish a terminal state
        assert!(!controller.snapshot().state.is_terminal());
        assert_eq!(controller.ledger().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_observer_sees_published_states() {
        let controller = controller();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.set_observer(Arc::new(move |snap: &ViewerSnapshot| {
            sink.lock().unwrap().push(snap.state.is_terminal());
        }));

        controller.start(None).finished().await;
        // Reset to validating, then the terminal invalid state
        assert_eq!(*seen.lock().unwrap(), vec![false, true]);
    }

    #[tokio::test]
    async fn test_retry_reuses_last_code() {
        let controller = controller();
        controller.start(Some("  ")).finished().await;
        controller.retry().finished().await;
        assert_eq!(controller.snapshot().error_message(), Some(messages::INVALID_CODE));
    }
}
