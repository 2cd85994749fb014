//! Tool ingestion pipeline
//!
//! Owns the tool registry and the state of the three ingestion pathways.
//! Pathways never share state with each other, so a slow or failing git
//! import has no effect on a paste submitted at the same time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use log::{debug, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::backend::{AddToolReply, BackendGateway};
use crate::domain::{ToolDescriptor, ToolOrigin};
use crate::error::{Result, SessionError};
use crate::registry::ToolRegistry;

use super::pathway::{InFlight, PathwayKind, PathwaySnapshot, PathwayState, lock};
use super::provenance::{Provenance, ProvenanceLedger};
use super::source_view::{SourceViewer, ToolSource};

/// Registry plus the ticket of the listing it was last built from
#[derive(Debug, Default)]
struct RegistryState {
    registry: ToolRegistry,
    applied_ticket: u64,
}

pub struct ToolIngestionPipeline {
    gateway: Arc<dyn BackendGateway>,
    registry: RwLock<RegistryState>,
    refresh_tickets: AtomicU64,
    ledger: Mutex<ProvenanceLedger>,
    paste: StdMutex<PathwayState>,
    prompt: StdMutex<PathwayState>,
    git: StdMutex<PathwayState>,
    /// Last source produced by the prompt pathway and not yet submitted
    generated_draft: Mutex<Option<String>>,
    viewer: Mutex<SourceViewer>,
}

impl ToolIngestionPipeline {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            gateway,
            registry: RwLock::new(RegistryState::default()),
            refresh_tickets: AtomicU64::new(0),
            ledger: Mutex::new(ProvenanceLedger::new()),
            paste: StdMutex::new(PathwayState::new(PathwayKind::Paste)),
            prompt: StdMutex::new(PathwayState::new(PathwayKind::Prompt)),
            git: StdMutex::new(PathwayState::new(PathwayKind::GitImport)),
            generated_draft: Mutex::new(None),
            viewer: Mutex::new(SourceViewer::default()),
        }
    }

    // Registry

    /// Rebuild the registry from the backend's listing.
    ///
    /// Returns `false` when a refresh issued later has already been applied;
    /// the older listing is then discarded.
    pub async fn refresh_registry(&self) -> Result<bool> {
        let ticket = self.refresh_tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let listings = self.gateway.list_tools().await?;
        let descriptors = self.ledger.lock().await.resolve_all(listings);

        let mut state = self.registry.write().await;
        if ticket < state.applied_ticket {
            debug!("Discarding tool listing #{}; #{} already applied", ticket, state.applied_ticket);
            return Ok(false);
        }

        state.registry.replace_all(descriptors);
        state.applied_ticket = ticket;
        info!("Registry refreshed: {} tools", state.registry.len());
        Ok(true)
    }

    /// Copy of the current registry
    pub async fn registry(&self) -> ToolRegistry {
        self.registry.read().await.registry.clone()
    }

    pub async fn lookup(&self, name: &str) -> Option<ToolDescriptor> {
        self.registry.read().await.registry.lookup(name).cloned()
    }

    // Paste pathway

    /// Register a tool from pasted source.
    ///
    /// The source becomes the paste buffer; it is cleared on success and kept
    /// on failure so it can be corrected and resubmitted.
    pub async fn submit_paste(&self, source: &str) -> Result<AddToolReply> {
        let kind = PathwayKind::Paste;
        let request = Self::start(&self.paste, kind, source)?;

        match self.gateway.add_tool(source).await {
            Ok(reply) => {
                let origin = self.take_origin_for(source).await;
                self.ledger.lock().await.record(&reply.name, Provenance::new(origin));
                info!("Added {:?} tool '{}'", origin, reply.name);
                self.refresh_after_ingest(kind).await;

                request.succeed(|state| state.input.clear());
                Ok(reply)
            }
            Err(err) => Err(Self::fail(request, kind, err)),
        }
    }

    /// Replace the paste buffer with text typed by the user
    pub async fn set_paste_input(&self, text: impl Into<String>) {
        lock(&self.paste).input = text.into();
    }

    pub async fn paste_state(&self) -> PathwaySnapshot {
        lock(&self.paste).snapshot()
    }

    // Prompt pathway

    /// Generate tool source from a description.
    ///
    /// The generated text only lands in the paste buffer; nothing is
    /// registered until it is submitted through the paste pathway.
    pub async fn submit_prompt(&self, description: &str) -> Result<String> {
        let kind = PathwayKind::Prompt;
        let request = Self::start(&self.prompt, kind, description)?;

        match self.gateway.generate_tool(description).await {
            Ok(code) => {
                debug!("Generated {} bytes of tool source", code.len());
                *self.generated_draft.lock().await = Some(code.clone());
                lock(&self.paste).input = code.clone();
                request.succeed(|_| {});
                Ok(code)
            }
            Err(err) => Err(Self::fail(request, kind, err)),
        }
    }

    pub async fn set_prompt_input(&self, text: impl Into<String>) {
        lock(&self.prompt).input = text.into();
    }

    pub async fn prompt_state(&self) -> PathwaySnapshot {
        lock(&self.prompt).snapshot()
    }

    // Git-import pathway

    /// Register a tool from a repository file URL
    pub async fn submit_git_import(&self, url: &str) -> Result<AddToolReply> {
        let kind = PathwayKind::GitImport;
        let request = Self::start(&self.git, kind, url)?;

        match self.gateway.import_from_git(url).await {
            Ok(reply) => {
                self.ledger.lock().await.record(&reply.name, Provenance::git(url));
                info!("Imported tool '{}' from {}", reply.name, url);
                self.refresh_after_ingest(kind).await;

                request.succeed(|state| state.input.clear());
                Ok(reply)
            }
            Err(err) => Err(Self::fail(request, kind, err)),
        }
    }

    pub async fn set_git_url(&self, url: impl Into<String>) {
        lock(&self.git).input = url.into();
    }

    pub async fn git_state(&self) -> PathwaySnapshot {
        lock(&self.git).snapshot()
    }

    /// Snapshot of any pathway
    pub async fn pathway(&self, kind: PathwayKind) -> PathwaySnapshot {
        match kind {
            PathwayKind::Paste => self.paste_state().await,
            PathwayKind::Prompt => self.prompt_state().await,
            PathwayKind::GitImport => self.git_state().await,
        }
    }

    // Source view

    /// Show a tool's source, or hide it if it is the one already shown.
    ///
    /// Returns `None` when the selection was cleared; no request is made then.
    pub async fn toggle_tool_source(&self, name: &str) -> Result<Option<ToolSource>> {
        if self.viewer.lock().await.deselect_if_selected(name) {
            debug!("Closed source view for '{}'", name);
            return Ok(None);
        }
        self.view_tool_source(name).await.map(Some)
    }

    /// Fetch and show a tool's source regardless of the current selection
    pub async fn view_tool_source(&self, name: &str) -> Result<ToolSource> {
        let code = self.gateway.tool_source(name).await.map_err(|err| {
            warn!("Failed to fetch source of '{}': {}", name, err);
            err
        })?;

        let source = ToolSource {
            name: name.to_string(),
            code,
        };
        self.viewer.lock().await.select(source.clone());
        Ok(source)
    }

    pub async fn selected_source(&self) -> Option<ToolSource> {
        self.viewer.lock().await.selected().cloned()
    }

    pub async fn clear_selection(&self) {
        self.viewer.lock().await.clear();
    }

    // Internals

    /// Store the input, reject it if blank, otherwise start a request.
    ///
    /// The returned guard must be held until the backend call returns.
    fn start<'a>(pathway: &'a StdMutex<PathwayState>, kind: PathwayKind, input: &str) -> Result<InFlight<'a>> {
        {
            let mut state = lock(pathway);
            state.input = input.to_string();

            if input.trim().is_empty() {
                let err = SessionError::validation(kind.empty_input_message());
                state.reject(err.user_message(kind.fallback_message()));
                return Err(err);
            }
        }

        Ok(InFlight::begin(pathway))
    }

    fn fail(request: InFlight<'_>, kind: PathwayKind, err: SessionError) -> SessionError {
        warn!("{} pathway failed: {}", kind, err);
        request.fail(err.user_message(kind.fallback_message()));
        err
    }

    /// `Generated` when the submitted source is the untouched prompt output
    async fn take_origin_for(&self, source: &str) -> ToolOrigin {
        let mut draft = self.generated_draft.lock().await;
        if draft.as_deref() == Some(source) {
            *draft = None;
            ToolOrigin::Generated
        } else {
            ToolOrigin::Custom
        }
    }

    /// The ingestion itself already succeeded; a failed listing only leaves
    /// the registry stale until the next refresh
    async fn refresh_after_ingest(&self, kind: PathwayKind) {
        if let Err(err) = self.refresh_registry().await {
            warn!("Registry refresh after {} ingestion failed: {}", kind, err);
        }
    }
}

impl std::fmt::Debug for ToolIngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolIngestionPipeline").finish_non_exhaustive()
    }
}
