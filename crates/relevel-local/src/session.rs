//! Rewrite session: the two-state machine behind `rewrite` and `reset`.
//!
//! One session per document. Both operations take `&mut self`, so overlapping
//! calls on a session are rejected at compile time rather than queued. All
//! errors are folded into uniform outcomes here; nothing propagates as a
//! fault to the external trigger.

use crate::{mapper, normalize, select, snapshot::SnapshotStore};
use relevel_core::{
    CefrLevel, DocumentHost, Error, NodeHandle, ResetOutcome, Result, RewriteBackend,
    RewriteOutcome,
};

type MutationHook = Box<dyn Fn(&[NodeHandle]) + Send + Sync>;

pub struct Session<H, B> {
    host: H,
    backend: B,
    snapshots: SnapshotStore,
    rewritten: bool,
    on_mutated: Option<MutationHook>,
}

impl<H: DocumentHost, B: RewriteBackend> Session<H, B> {
    pub fn new(host: H, backend: B) -> Self {
        Self {
            host,
            backend,
            snapshots: SnapshotStore::new(),
            rewritten: false,
            on_mutated: None,
        }
    }

    /// Cosmetic post-mutation hook (e.g. a visual transition), invoked with
    /// the mutated handles after a successful rewrite. Correctness never
    /// depends on it.
    pub fn with_mutation_hook(
        mut self,
        hook: impl Fn(&[NodeHandle]) + Send + Sync + 'static,
    ) -> Self {
        self.on_mutated = Some(Box::new(hook));
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_rewritten(&self) -> bool {
        self.rewritten
    }

    /// Rewrite the document's main content at `level`.
    ///
    /// The mapper only runs after a successful remote call, so any failure
    /// leaves the document untouched. The snapshot store may already be
    /// populated after a failed first attempt; that is harmless, it is simply
    /// ready for a later successful one.
    pub async fn rewrite(&mut self, level: CefrLevel, api_key: &str) -> RewriteOutcome {
        match self.try_rewrite(level, api_key).await {
            Ok((original_chars, rewritten_chars)) => {
                self.rewritten = true;
                tracing::debug!(original_chars, rewritten_chars, "rewrite applied");
                RewriteOutcome::ok(original_chars, rewritten_chars)
            }
            Err(err) => {
                tracing::debug!(error = %err, "rewrite failed");
                RewriteOutcome::failed(&err)
            }
        }
    }

    async fn try_rewrite(&mut self, level: CefrLevel, api_key: &str) -> Result<(usize, usize)> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingCredential);
        }

        // Only snapshot original content. While rewritten, the snapshots on
        // hand are the revert path and must not be overwritten.
        if !self.rewritten {
            self.snapshots.capture(&self.host);
        }

        let raw = select::main_content_text(&self.host);
        let payload = normalize::normalize(&raw);
        if payload.text.is_empty() {
            return Err(Error::NoContentFound);
        }

        let rewritten = self.backend.rewrite(&payload.text, level, api_key).await?;

        let mutated = mapper::apply(&mut self.host, &self.snapshots, &rewritten);
        if let Some(hook) = &self.on_mutated {
            hook(&mutated);
        }

        Ok((
            payload.text.chars().count(),
            rewritten.chars().count(),
        ))
    }

    /// Restore every snapshotted node's original markup. A no-op success when
    /// the document is not currently rewritten.
    pub fn reset(&mut self) -> ResetOutcome {
        if self.rewritten {
            self.snapshots.restore(&mut self.host);
            self.rewritten = false;
            tracing::debug!("session reset to original content");
        }
        ResetOutcome::ok()
    }
}
