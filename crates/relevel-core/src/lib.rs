use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no readable content found on this page")]
    NoContentFound,
    #[error("missing API key")]
    MissingCredential,
    #[error("invalid API key: {0}")]
    Unauthorized(String),
    #[error("rate limited by the rewrite service; try again later")]
    RateLimited,
    #[error("rewrite service failed: {0}")]
    Remote(String),
    #[error("rewrite service returned no text")]
    EmptyResult,
}

pub type Result<T> = std::result::Result<T, Error>;

/// CEFR proficiency tier used to parameterize rewriting style.
///
/// `A1` is the weakest tier, `C2` the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl std::fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CefrLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            other => Err(Error::InvalidInput(format!(
                "unknown CEFR level {other:?} (expected one of A1, A2, B1, B2, C1, C2)"
            ))),
        }
    }
}

/// Opaque, stable identity for a document node.
///
/// Handles are assigned by the document model at parse time and stay valid for
/// the lifetime of the document, independent of any native tree reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// A single structural lookup against a document.
///
/// Deliberately not a CSS selector engine: the content-selection policy only
/// needs tag, `role` attribute, id, and class lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeQuery {
    Tag(&'static str),
    Role(&'static str),
    Id(&'static str),
    Class(&'static str),
}

/// Mutable document tree, as seen by the rewrite pipeline.
///
/// Implementations own the tree; the pipeline only holds `NodeHandle`s, so it
/// carries no hidden dependency on a specific tree API.
pub trait DocumentHost {
    /// Document-order handles of the text-bearing block nodes that are
    /// candidates for snapshotting and rewriting.
    fn text_blocks(&self) -> Vec<NodeHandle>;

    /// Concatenated text of all descendants, or `None` for a stale handle.
    fn flattened_text(&self, handle: NodeHandle) -> Option<String>;

    /// Serialized markup of the node's children, or `None` for a stale handle.
    fn inner_markup(&self, handle: NodeHandle) -> Option<String>;

    /// Replace the node's children with a single text node.
    fn set_text(&mut self, handle: NodeHandle, text: &str);

    /// Replace the node's children with the parsed form of `markup`.
    fn set_inner_markup(&mut self, handle: NodeHandle, markup: &str);

    /// First node matching `query`, in document order.
    fn query_first(&self, query: &NodeQuery) -> Option<NodeHandle>;

    /// Flattened text of the document body (whole document if there is none).
    fn body_text(&self) -> String;
}

/// Remote text-rewriting service, reduced to the single call the pipeline
/// depends on. The credential is caller-supplied per call and never stored.
#[async_trait::async_trait]
pub trait RewriteBackend: Send + Sync {
    async fn rewrite(&self, text: &str, level: CefrLevel, api_key: &str) -> Result<String>;
}

/// Uniform result reported for a `rewrite` operation.
///
/// Errors never cross this boundary as faults; they are folded into
/// `{success: false, error}` so the external trigger always gets a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RewriteOutcome {
    pub fn ok(original_chars: usize, rewritten_chars: usize) -> Self {
        Self {
            success: true,
            original_chars: Some(original_chars),
            rewritten_chars: Some(rewritten_chars),
            error: None,
        }
    }

    pub fn failed(err: &Error) -> Self {
        Self {
            success: false,
            original_chars: None,
            rewritten_chars: None,
            error: Some(err.to_string()),
        }
    }
}

/// Uniform result reported for a `reset` operation. Reset cannot fail: on an
/// un-rewritten session it is a no-op success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetOutcome {
    pub success: bool,
}

impl ResetOutcome {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
