//! Debounced, cancellable coupon validation.
//!
//! Each call to [`CouponValidator::input`] represents the coupon field
//! changing. The validator waits for the input to settle, then asks the
//! backend about the newest code. A newer input cancels the older one,
//! whether it is still settling or already waiting on the network, and
//! every outcome carries a generation number so a late answer for a
//! superseded code is dropped instead of reaching the cart.
//!
//! The validator never touches the cart itself. The owner of the
//! [`CartStore`] awaits [`CouponValidator::next_outcome`] and applies the
//! result on its own turn, which keeps cart mutations single-threaded.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use emporium_core::cart::{CartStorage, CartStore};
use emporium_core::coupon::{AppliedCoupon, CouponError, CouponOutcome, normalize_code};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default settle time before a coupon code is validated.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Something that can price a coupon code.
pub trait CouponService: Send + Sync + 'static {
    /// Validate a normalized (trimmed, upper-case) code.
    fn validate(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<AppliedCoupon, CouponError>> + Send;
}

#[derive(Debug)]
struct Tagged {
    generation: u64,
    outcome: CouponOutcome,
}

/// Debounces coupon edits and keeps only the newest outcome.
pub struct CouponValidator<C> {
    service: Arc<C>,
    debounce: Duration,
    generation: u64,
    in_flight: Option<CancellationToken>,
    tx: mpsc::UnboundedSender<Tagged>,
    rx: mpsc::UnboundedReceiver<Tagged>,
}

impl<C: CouponService> CouponValidator<C> {
    /// Create a validator over `service` with the given settle time.
    #[must_use]
    pub fn new(service: Arc<C>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            debounce,
            generation: 0,
            in_flight: None,
            tx,
            rx,
        }
    }

    /// Record a new value of the coupon field.
    ///
    /// Cancels whatever the previous value was doing. A blank value resolves
    /// to [`CouponOutcome::Cleared`] after the settle time without a network
    /// call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&mut self, raw: &str) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());

        let code = normalize_code(raw);
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let debounce = self.debounce;

        debug!(generation, code = code.as_deref().unwrap_or(""), "Coupon input");

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(generation, "Coupon input superseded while settling");
                    return;
                }
                () = tokio::time::sleep(debounce) => {}
            }

            let outcome = match code {
                None => CouponOutcome::Cleared,
                Some(code) => {
                    tokio::select! {
                        biased;
                        () = token.cancelled() => {
                            debug!(generation, %code, "Coupon request cancelled");
                            return;
                        }
                        result = service.validate(&code) => CouponOutcome::from(result),
                    }
                }
            };

            // The receiver lives as long as the validator.
            let _ = tx.send(Tagged {
                generation,
                outcome,
            });
        });
    }

    /// Cancel the pending input, if any. Its outcome will never be delivered.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Whether an input is waiting for its outcome.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Wait for the outcome of the newest input.
    ///
    /// Outcomes of superseded inputs are discarded. Returns `None` at once if
    /// nothing is pending.
    pub async fn next_outcome(&mut self) -> Option<CouponOutcome> {
        self.in_flight.as_ref()?;

        while let Some(tagged) = self.rx.recv().await {
            if tagged.generation == self.generation {
                self.in_flight = None;
                return Some(tagged.outcome);
            }
            debug!(
                stale = tagged.generation,
                current = self.generation,
                "Discarding superseded coupon outcome"
            );
        }
        None
    }

    /// Wait for the newest outcome and apply it to `store`.
    pub async fn settle<S: CartStorage + Send>(
        &mut self,
        store: &mut CartStore<S>,
    ) -> Option<CouponOutcome> {
        let outcome = self.next_outcome().await?;
        match &outcome {
            CouponOutcome::Applied(coupon) => {
                info!(code = %coupon.code, discount = %coupon.discount_amount, "Coupon applied");
            }
            CouponOutcome::Rejected(e) => info!(reason = %e, "Coupon rejected"),
            CouponOutcome::Cleared => debug!("Coupon cleared"),
        }
        store.apply_coupon(&outcome);
        Some(outcome)
    }
}

impl<C> Drop for CouponValidator<C> {
    fn drop(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}
