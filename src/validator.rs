//! Asynchronous vanity identifier validation.
//!
//! Every edit of the identifier field calls [`VanityValidator::begin`], which
//! updates the published state synchronously. Each `begin` and `reset` opens a
//! new generation; a lookup result is only applied if no newer generation has
//! been opened since its ticket was issued, so the displayed status always
//! reflects the most recently typed value regardless of the order in which
//! lookups complete.

use crate::error::{Result, SettingsError};
use crate::resolver::{ResolvedRoom, RoomResolver};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Outcome of validating the current candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// No edit has been validated since the last seed.
    #[default]
    Unchecked,
    /// A lookup is in flight.
    Pending,
    Valid,
    Invalid,
}

impl ValidationStatus {
    /// Whether the identifier field permits saving.
    #[must_use]
    pub fn allows_save(self) -> bool {
        matches!(self, Self::Unchecked | Self::Valid)
    }
}

/// Status of the identifier field, keyed by the candidate it describes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationState {
    pub candidate: String,
    pub status: ValidationStatus,
}

/// An issued lookup, carrying the input it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    candidate: String,
    current_assigned: String,
    generation: u64,
}

impl LookupTicket {
    #[must_use]
    pub fn candidate(&self) -> &str {
        &self.candidate
    }
}

/// Decide a lookup outcome. A candidate only collides when it is bound to a
/// room other than the one being edited.
#[must_use]
pub fn judge(record: Option<&ResolvedRoom>, current_assigned: &str) -> ValidationStatus {
    match record.and_then(|r| r.vanity.as_deref()) {
        Some(bound) if !bound.is_empty() && bound != current_assigned => ValidationStatus::Invalid,
        _ => ValidationStatus::Valid,
    }
}

/// Validates candidates against a [`RoomResolver`] and publishes the latest
/// [`ValidationState`].
pub struct VanityValidator {
    resolver: Arc<dyn RoomResolver>,
    state: watch::Sender<ValidationState>,
    // Only written while the watch value is locked.
    generation: AtomicU64,
}

impl std::fmt::Debug for VanityValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VanityValidator")
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl VanityValidator {
    #[must_use]
    pub fn new(resolver: Arc<dyn RoomResolver>) -> Self {
        let (state, _rx) = watch::channel(ValidationState::default());
        Self {
            resolver,
            state,
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> ValidationState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ValidationState> {
        self.state.subscribe()
    }

    /// Replace the published state and open a new generation. Returns the
    /// generation the new state belongs to.
    fn publish(&self, next: ValidationState) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = next;
        });
        generation
    }

    /// Forget any previous outcome; `candidate` becomes the unchecked value.
    /// Lookups still in flight are dropped, even for the same candidate.
    pub fn reset(&self, candidate: &str) {
        self.publish(ValidationState {
            candidate: candidate.to_owned(),
            status: ValidationStatus::Unchecked,
        });
    }

    /// Record a new candidate. An empty candidate is valid immediately and
    /// needs no lookup; anything else goes `Pending` and yields a ticket.
    pub fn begin(&self, candidate: &str, current_assigned: &str) -> Option<LookupTicket> {
        if candidate.is_empty() {
            self.publish(ValidationState {
                candidate: String::new(),
                status: ValidationStatus::Valid,
            });
            return None;
        }

        let generation = self.publish(ValidationState {
            candidate: candidate.to_owned(),
            status: ValidationStatus::Pending,
        });
        Some(LookupTicket {
            candidate: candidate.to_owned(),
            current_assigned: current_assigned.to_owned(),
            generation,
        })
    }

    /// Run the lookup for `ticket`. Lookup failures are reported as
    /// [`ValidationStatus::Invalid`].
    pub async fn lookup(&self, ticket: &LookupTicket) -> ValidationStatus {
        match self.resolver.resolve(&ticket.candidate).await {
            Ok(record) => judge(record.as_ref(), &ticket.current_assigned),
            Err(e) => {
                tracing::warn!(
                    candidate = %ticket.candidate,
                    error = %e,
                    "vanity lookup failed; treating as unavailable"
                );
                ValidationStatus::Invalid
            }
        }
    }

    /// Apply a lookup outcome. Returns `false` and leaves the state untouched
    /// when the candidate has since been edited or the validator re-seeded.
    pub fn apply(&self, ticket: &LookupTicket, status: ValidationStatus) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != ticket.generation
                || state.candidate != ticket.candidate
            {
                return false;
            }
            state.status = status;
            true
        });
        if !applied {
            tracing::debug!(candidate = %ticket.candidate, "discarding stale vanity lookup");
        }
        applied
    }

    /// Validate `candidate` and wait for the outcome.
    pub async fn validate(&self, candidate: &str, current_assigned: &str) -> ValidationState {
        if let Some(ticket) = self.begin(candidate, current_assigned) {
            let status = self.lookup(&ticket).await;
            self.apply(&ticket, status);
        }
        self.state()
    }

    /// Validate `candidate` in the background. The state is already updated
    /// when this returns; the lookup result lands later via [`Self::subscribe`].
    /// An empty candidate is settled inline and yields no handle.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Runtime`] without touching the state if a
    /// lookup is needed and no tokio runtime is available.
    pub fn spawn_validate(
        self: &Arc<Self>,
        candidate: &str,
        current_assigned: &str,
    ) -> Result<Option<JoinHandle<()>>> {
        if candidate.is_empty() {
            self.begin(candidate, current_assigned);
            return Ok(None);
        }
        let runtime = Handle::try_current().map_err(|e| {
            SettingsError::Runtime(format!("cannot start vanity lookup: {e}"))
        })?;
        let Some(ticket) = self.begin(candidate, current_assigned) else {
            return Ok(None);
        };
        let validator = Arc::clone(self);
        Ok(Some(runtime.spawn(async move {
            let status = validator.lookup(&ticket).await;
            validator.apply(&ticket, status);
        })))
    }
}
