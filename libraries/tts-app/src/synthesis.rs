//! Synthesis flow: request, load, record
//!
//! One request at a time. While a request is in flight `isLoading` is set in
//! the shared store and further requests are refused.

use crate::error::{AppError, Result};
use crate::history::{HistoryItem, HistoryRepository};
use crate::state::{flag, SynthesisParams};
use crate::validation::validate_params;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};
use tts_playback::store::keys;
use tts_playback::{PlaybackController, SourceRef, Store};

/// Message shown after a successful synthesis
pub const SUCCESS_MESSAGE: &str = "Speech synthesized";

/// Speech synthesis service
#[async_trait(?Send)]
pub trait Synthesizer {
    /// Synthesize `params`, returning a playable URL for the audio
    async fn synthesize(&self, params: &SynthesisParams) -> Result<String>;
}

/// User-facing notifications (toasts)
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

/// Runs synthesis requests and feeds the results to the player
pub struct SynthesisFlow {
    synthesizer: Box<dyn Synthesizer>,
    notifier: Box<dyn Notifier>,
    history: Rc<dyn HistoryRepository>,
    controller: Rc<RefCell<PlaybackController>>,
    store: Store<Value>,
}

impl SynthesisFlow {
    /// Create a flow sharing the controller's store
    pub fn new(
        synthesizer: Box<dyn Synthesizer>,
        notifier: Box<dyn Notifier>,
        history: Rc<dyn HistoryRepository>,
        controller: Rc<RefCell<PlaybackController>>,
    ) -> Self {
        let store = controller.borrow().store().clone();
        Self {
            synthesizer,
            notifier,
            history,
            controller,
            store,
        }
    }

    pub fn is_loading(&self) -> bool {
        flag(&self.store, keys::IS_LOADING)
    }

    /// Validate, synthesize, load into the player and record in history
    ///
    /// Every outcome except [`AppError::Busy`] is reported to the notifier.
    pub async fn synthesize(&self, params: SynthesisParams) -> Result<SourceRef> {
        if self.is_loading() {
            debug!("Synthesis already in progress, ignoring request");
            return Err(AppError::Busy);
        }

        if let Err(err) = validate_params(&params) {
            self.notifier.error(&err.to_string());
            return Err(err);
        }

        self.store.set(keys::IS_LOADING, json!(true));
        let result = self.run(params).await;
        self.store.set(keys::IS_LOADING, json!(false));

        match &result {
            Ok(source) => {
                info!(%source, "Synthesis complete");
                self.notifier.success(SUCCESS_MESSAGE);
            }
            Err(err) => {
                warn!(error = %err, "Synthesis failed");
                self.notifier.error(&err.to_string());
            }
        }
        result
    }

    /// Publish the repository's entries under the `history` key
    pub fn sync_history(&self) -> Result<()> {
        let items = self.history.list()?;
        self.store.set(keys::HISTORY, serde_json::to_value(items)?);
        Ok(())
    }

    async fn run(&self, params: SynthesisParams) -> Result<SourceRef> {
        let url = self.synthesizer.synthesize(&params).await?;
        let source = SourceRef::new(url.clone());

        self.controller
            .try_borrow_mut()
            .map_err(|_| AppError::Synthesis("player is busy".to_string()))?
            .load(source.clone());

        self.history.add(HistoryItem::new(params, url, Utc::now()))?;
        self.sync_history()?;
        Ok(source)
    }
}
