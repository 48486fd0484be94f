use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alephium_multisig_client::{ExplorerApi, NodeClientError, Result, api::TxStatus};
use async_trait::async_trait;

/// An in-memory explorer that reports a transaction once it has been polled enough times.
#[derive(Debug, Clone)]
pub struct MockExplorer {
    inner: Arc<Mutex<ExplorerState>>,
}

#[derive(Debug)]
struct ExplorerState {
    indexed_after: Option<u32>,
    failing: bool,
    polls: HashMap<String, u32>,
}

impl MockExplorer {
    /// Reports every transaction as indexed on the `polls`-th lookup.
    pub fn indexed_after(polls: u32) -> Self {
        Self::with(Some(polls), false)
    }

    /// Never reports any transaction.
    pub fn never_indexed() -> Self {
        Self::with(None, false)
    }

    /// Fails every lookup with a server error.
    pub fn failing() -> Self {
        Self::with(None, true)
    }

    fn with(indexed_after: Option<u32>, failing: bool) -> Self {
        let state = ExplorerState { indexed_after, failing, polls: HashMap::new() };
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    /// Returns how many times `tx_id` has been looked up.
    pub fn polls(&self, tx_id: &str) -> u32 {
        self.state().polls.get(tx_id).copied().unwrap_or_default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ExplorerState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ExplorerApi for MockExplorer {
    async fn transaction_status(&self, tx_id: &str) -> Result<TxStatus> {
        let mut state = self.state();
        let polls = state.polls.entry(tx_id.to_owned()).or_default();
        *polls += 1;
        let polls = *polls;

        if state.failing {
            return Err(NodeClientError::Status {
                operation: format!("explorer lookup of tx {tx_id}").into(),
                status: 503,
                detail: "unavailable".into(),
            });
        }

        match state.indexed_after {
            Some(after) if polls >= after => Ok(TxStatus::Indexed),
            _ => Ok(TxStatus::NotFound),
        }
    }
}
