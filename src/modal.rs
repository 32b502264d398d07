//! View modal state machine.
//!
//! Two states: closed, or open holding exactly one record by value. Holding
//! by value means gallery mutation can never corrupt an open modal, and a
//! capture still running after dismissal operates on its own snapshot.

use crate::rendering::template::CardScene;
use crate::share::{derive_share_link, identity_for, ShareLink};
use crate::{compose_card, CardConfig, GreetingRecord, Result};

enum ModalState {
    Closed,
    Open(GreetingRecord),
}

/// Finite-state controller for full-size card inspection.
///
/// While open it composes the canonical template at scale 1 for the held
/// record; the resulting scene is the capture target for exports and the
/// identity source for share derivation. Dismissing tears that binding down.
pub struct ViewModal {
    state: ModalState,
}

impl ViewModal {
    pub fn new() -> Self {
        Self { state: ModalState::Closed }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open(_))
    }

    pub fn current(&self) -> Option<&GreetingRecord> {
        match &self.state {
            ModalState::Open(record) => Some(record),
            ModalState::Closed => None,
        }
    }

    /// Open the modal on a record, or replace the held record atomically
    /// when already open; there is no transient closed state in between.
    pub fn select(&mut self, record: GreetingRecord) {
        self.state = ModalState::Open(record);
    }

    /// Close the modal. A no-op when already closed; never touches any
    /// gallery state.
    pub fn dismiss(&mut self) {
        self.state = ModalState::Closed;
    }

    /// Compose the full-size scene for the held record, `None` when closed.
    pub fn scene(&self, config: &CardConfig) -> Result<Option<CardScene>> {
        match &self.state {
            ModalState::Open(record) => Ok(Some(compose_card(record, config, 1.0)?)),
            ModalState::Closed => Ok(None),
        }
    }

    /// Derive the share link for the held record, `None` when closed.
    pub fn share_link(&self, config: &CardConfig, embed_mark: bool) -> Result<Option<ShareLink>> {
        match &self.state {
            ModalState::Open(record) => {
                Ok(Some(derive_share_link(config, identity_for(record), embed_mark)?))
            }
            ModalState::Closed => Ok(None),
        }
    }
}

impl Default for ViewModal {
    fn default() -> Self {
        Self::new()
    }
}
