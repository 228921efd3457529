//! Swap Controller
//!
//! Single owner of the swap form and its current [`Quote`]. Every form event
//! bumps a revision and yields the [`QuoteRequest`] to price; results are
//! applied only while their revision is still current.

use thiserror::Error;
use vex_core::{AssetId, SwapConfig, TxError, TxId};

use crate::amount::FieldValue;
use crate::deadline::{resolve_deadline, DeadlineError};
use crate::provider::{DeadlineSource, PendingTxTracker, ReserveProvider, TxSigner};
use crate::quote::compute_quote;
use crate::state::{AmmError, EditDirection, Quote, QuoteRequest, QuoteStatus};
use crate::tx_builder::build_swap_clauses;
use crate::validate::{validate_form, validate_submission, FormValidation, SubmitContext, ValidationError};

/// What the user has entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapForm {
    pub input_asset: Option<AssetId>,
    pub output_asset: Option<AssetId>,
    pub direction: EditDirection,
    /// Value of the authoritative field
    pub amount: FieldValue,
}

impl Default for SwapForm {
    fn default() -> Self {
        Self {
            input_asset: Some(AssetId::native()),
            output_asset: None,
            direction: EditDirection::Input,
            amount: FieldValue::Empty,
        }
    }
}

/// Outcome of offering a computed quote to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteUpdate {
    /// Current, but nothing visible changed
    Unchanged,
    Updated,
    /// Computed for a superseded revision and discarded
    Stale,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Deadline(#[from] DeadlineError),

    #[error(transparent)]
    Build(#[from] AmmError),

    #[error("Signing failed: {0}")]
    Signing(#[from] TxError),
}

/// Collaborators used by [`SwapController::submit`]
pub struct SubmitServices<'a> {
    pub provider: &'a dyn ReserveProvider,
    pub deadlines: &'a dyn DeadlineSource,
    pub signer: &'a dyn TxSigner,
    pub tracker: &'a dyn PendingTxTracker,
}

#[derive(Debug, Clone)]
pub struct SwapController {
    config: SwapConfig,
    form: SwapForm,
    revision: u64,
    quote: Quote,
}

impl SwapController {
    pub fn new(config: SwapConfig) -> Self {
        Self {
            config,
            form: SwapForm::default(),
            revision: 0,
            quote: Quote::initial(),
        }
    }

    pub fn config(&self) -> &SwapConfig {
        &self.config
    }

    pub fn form(&self) -> &SwapForm {
        &self.form
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Snapshot of the form at the current revision
    pub fn request(&self) -> QuoteRequest {
        QuoteRequest {
            revision: self.revision,
            input_asset: self.form.input_asset.clone(),
            output_asset: self.form.output_asset.clone(),
            direction: self.form.direction,
            amount: self.form.amount.clone(),
        }
    }

    /// Bump the revision and return the request to price. Requests with
    /// nothing to price are settled here without a fetch.
    fn advance(&mut self) -> QuoteRequest {
        self.revision += 1;
        let request = self.request();
        if request.kind().is_none() || request.amount.is_blank() {
            self.quote = Quote::unpriced(&request, QuoteStatus::Empty);
        }
        request
    }

    /// The user typed into the amount-sent field
    pub fn edit_input(&mut self, text: &str) -> Result<QuoteRequest, AmmError> {
        self.edit(EditDirection::Input, text)
    }

    /// The user typed into the amount-received field
    pub fn edit_output(&mut self, text: &str) -> Result<QuoteRequest, AmmError> {
        self.edit(EditDirection::Output, text)
    }

    fn edit(&mut self, direction: EditDirection, text: &str) -> Result<QuoteRequest, AmmError> {
        let amount = FieldValue::parse(text)?;
        self.form.direction = direction;
        self.form.amount = amount;
        Ok(self.advance())
    }

    pub fn select_input_asset(&mut self, asset: AssetId) -> QuoteRequest {
        self.form.input_asset = Some(asset);
        self.advance()
    }

    pub fn select_output_asset(&mut self, asset: AssetId) -> QuoteRequest {
        self.form.output_asset = Some(asset);
        self.advance()
    }

    /// Swap the assets and both amounts. The authoritative amount keeps its
    /// value and becomes the other field.
    pub fn flip(&mut self) -> QuoteRequest {
        let form = &mut self.form;
        std::mem::swap(&mut form.input_asset, &mut form.output_asset);
        form.direction = form.direction.flipped();

        let previous = &self.quote;
        self.quote = Quote {
            revision: previous.revision,
            input_asset: previous.output_asset.clone(),
            output_asset: previous.input_asset.clone(),
            direction: previous.direction.flipped(),
            input_amount: previous.output_amount.clone(),
            output_amount: previous.input_amount.clone(),
            exchange_rate: previous.inverted_rate(),
            intermediate_amount: None,
            display_fee_bps: previous.display_fee_bps,
            input_decimals: previous.output_decimals,
            output_decimals: previous.input_decimals,
            status: previous.status,
        };
        self.advance()
    }

    /// Reserves may have moved; reprice the unchanged form
    pub fn refresh(&mut self) -> QuoteRequest {
        self.advance()
    }

    /// Offer a computed quote. Only a quote for the current revision is kept.
    pub fn apply(&mut self, quote: Quote) -> QuoteUpdate {
        if quote.revision != self.revision {
            tracing::debug!(
                "Discarding stale quote (revision {}, current {})",
                quote.revision,
                self.revision
            );
            return QuoteUpdate::Stale;
        }
        if !quote.differs_from(&self.quote) {
            return QuoteUpdate::Unchanged;
        }
        self.quote = quote;
        QuoteUpdate::Updated
    }

    /// Price the current form and apply the result
    pub async fn recalculate<P>(&mut self, provider: &P) -> QuoteUpdate
    where
        P: ReserveProvider + ?Sized,
    {
        let request = self.request();
        let quote = compute_quote(provider, &request, &self.config).await;
        self.apply(quote)
    }

    /// Clear the amounts after a submission; asset selection stays
    pub fn reset(&mut self) {
        self.form.amount = FieldValue::Empty;
        self.form.direction = EditDirection::Input;
        self.advance();
    }

    /// Inline validation of what is on screen
    pub fn validation(&self, ctx: &SubmitContext) -> FormValidation {
        validate_form(&self.quote, ctx, &self.config.slippage)
    }

    /// Validate, resolve a deadline, build and sign the swap.
    ///
    /// On success the transaction is handed to the tracker and the amounts
    /// are reset. On any failure the form is left as it was.
    pub async fn submit(
        &mut self,
        ctx: &SubmitContext,
        services: SubmitServices<'_>,
    ) -> Result<TxId, SubmitError> {
        validate_submission(&self.quote, self.revision, ctx, &self.config.slippage)?;

        let deadline = resolve_deadline(
            services.deadlines,
            self.config.deadline_timeout_secs,
            &self.config.retry,
        )
        .await?;

        let built = build_swap_clauses(&self.quote, &self.config, services.provider, deadline)?;
        let [first, second] = built.summary.lines();
        tracing::info!("Submitting swap: {} {}", first, second);
        if let Ok(json) = built.request.to_json() {
            tracing::debug!("Signing request: {}", json);
        }

        let tx_id = match services.signer.sign(built.request).await {
            Ok(tx_id) => tx_id,
            Err(e) => {
                tracing::error!(code = e.error_code(), "Swap signing failed: {}", e);
                return Err(SubmitError::Signing(e));
            }
        };

        tracing::info!("Swap submitted: {}", tx_id);
        services.tracker.add_pending(tx_id.clone());
        self.reset();
        Ok(tx_id)
    }
}

impl Default for SwapController {
    fn default() -> Self {
        Self::new(SwapConfig::default())
    }
}
