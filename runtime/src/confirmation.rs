//! Confirmation pipeline and its background dispatcher.
//!
//! A `paid` booking is confirmed by obtaining a meeting link from the
//! expert's preferred provider, moving the booking to `confirmed` with that
//! link, and emailing both participants. Provider failures are retried with
//! backoff; if they persist the booking stays `paid`, the failure is logged
//! at `error` level, and the periodic sweep tries again later.

use crate::context::ServiceContext;
use crate::metrics::ConfirmationMetrics;
use crate::retry::{RetryPolicy, retry_with_backoff};
use farmlink_core::environment::{EmailMessage, MeetingRequest};
use farmlink_core::{
    Booking, BookingAction, BookingEffect, BookingId, BookingLifecycle, BookingStatus, DomainError,
    Expert, ProviderError,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Result of one pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Booking confirmed. `notified` is false if any email could not be sent.
    Confirmed {
        /// Meeting link stored on the booking
        link: String,
        /// Whether both participants were emailed
        notified: bool,
    },
    /// Booking was not `paid` (already confirmed, or not yet paid).
    Skipped(BookingStatus),
}

/// Turns a `paid` booking into a `confirmed` one.
#[derive(Clone, Debug)]
pub struct ConfirmationPipeline {
    ctx: Arc<ServiceContext>,
    retry: RetryPolicy,
    lifecycle: BookingLifecycle,
}

impl ConfirmationPipeline {
    /// Create the pipeline with the retry policy used for provider calls.
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>, retry: RetryPolicy) -> Self {
        Self {
            ctx,
            retry,
            lifecycle: BookingLifecycle::new(),
        }
    }

    /// Confirm one booking.
    ///
    /// # Errors
    ///
    /// - [`DomainError::NotFound`]: booking or expert missing
    /// - [`DomainError::Provider`]: no provider for the expert's preference,
    ///   or meeting creation failed after retries (booking stays `paid`)
    /// - [`DomainError::Store`]: persistence failed
    #[tracing::instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn confirm(&self, booking_id: BookingId) -> Result<ConfirmationOutcome, DomainError> {
        let result = self.run(booking_id).await;
        match &result {
            Ok(ConfirmationOutcome::Confirmed { notified, .. }) => {
                ConfirmationMetrics::record("confirmed");
                if !notified {
                    ConfirmationMetrics::record("notify_failed");
                }
            }
            Ok(ConfirmationOutcome::Skipped(status)) => {
                ConfirmationMetrics::record("skipped");
                debug!(status = %status, "Booking not awaiting confirmation");
            }
            Err(err) => {
                ConfirmationMetrics::record("failed");
                error!(error = %err, "Booking confirmation failed; booking remains paid");
            }
        }
        result
    }

    async fn run(&self, booking_id: BookingId) -> Result<ConfirmationOutcome, DomainError> {
        let store = &self.ctx.store;
        let mut booking = store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
        if booking.status != BookingStatus::Paid {
            return Ok(ConfirmationOutcome::Skipped(booking.status));
        }

        let expert = store
            .get_expert(booking.expert_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Expert", booking.expert_id))?;

        let link = self.create_meeting(&booking, &expert).await?;

        let effects = self
            .lifecycle
            .apply(&mut booking, BookingAction::MeetingScheduled { link: link.clone() })?;

        if !store.update_booking(&booking, BookingStatus::Paid).await? {
            warn!("Booking changed while a meeting was being created; leaving it as is");
            let current = store
                .find_booking(booking_id)
                .await?
                .map_or(BookingStatus::Paid, |b| b.status);
            return Ok(ConfirmationOutcome::Skipped(current));
        }
        info!(meeting_link = %link, "Booking confirmed");

        let mut notified = true;
        for effect in effects {
            if let BookingEffect::NotifyParticipants(_) = effect {
                notified &= self.notify_participants(&booking, &expert).await;
            }
        }

        Ok(ConfirmationOutcome::Confirmed { link, notified })
    }

    async fn create_meeting(&self, booking: &Booking, expert: &Expert) -> Result<String, DomainError> {
        let provider = self.ctx.meetings.get(expert.meeting_provider).ok_or_else(|| {
            ProviderError::NotConfigured(format!("{} meeting provider", expert.meeting_provider))
        })?;

        let request = MeetingRequest {
            booking_id: booking.id,
            topic: format!("FarmLink consultation: {} with {}", booking.farmer_name, expert.name),
            start_utc: booking.slot_start_utc,
            end_utc: booking.slot_end_utc,
            expert_email: expert.email.clone(),
            farmer_email: booking.farmer_email.clone(),
        };

        let link = retry_with_backoff(&self.retry, "create_meeting", || {
            provider.create_meeting(request.clone())
        })
        .await?;

        if link.trim().is_empty() {
            return Err(ProviderError::InvalidResponse {
                provider: expert.meeting_provider.to_string(),
                message: "empty meeting link".to_string(),
            }
            .into());
        }
        Ok(link)
    }

    /// Email both participants. Returns false if any message failed after retries.
    async fn notify_participants(&self, booking: &Booking, expert: &Expert) -> bool {
        let link = booking.meeting_link.as_deref().unwrap_or_default();
        let when = booking.slot_start_utc.format("%Y-%m-%d %H:%M UTC");
        let messages = [
            EmailMessage {
                to: booking.farmer_email.clone(),
                subject: "Consultation confirmed".to_string(),
                body: format!(
                    "Hello {},\n\nYour consultation with {} is confirmed for {when}.\nJoin link: {link}\n",
                    booking.farmer_name, expert.name
                ),
            },
            EmailMessage {
                to: expert.email.clone(),
                subject: "New consultation booked".to_string(),
                body: format!(
                    "Hello {},\n\nYou have a new consultation with {} at {when}.\nJoin link: {link}\n",
                    expert.name, booking.farmer_name
                ),
            },
        ];

        let mut delivered = true;
        for message in messages {
            let to = message.to.clone();
            let sent = retry_with_backoff(&self.retry, "send_email", || {
                self.ctx.notifier.send(message.clone())
            })
            .await;
            if let Err(err) = sent {
                delivered = false;
                error!(recipient = %to, error = %err, "Confirmation email not delivered");
            }
        }
        delivered
    }
}

/// Cheap handle used to queue bookings for confirmation.
///
/// [`ConfirmationHandle::dispatch`] never blocks, so the webhook response is
/// not delayed by slow providers.
#[derive(Clone, Debug)]
pub struct ConfirmationHandle {
    tx: mpsc::UnboundedSender<BookingId>,
}

impl ConfirmationHandle {
    /// Handle whose queue is read by the caller instead of a dispatcher.
    #[must_use]
    pub fn detached() -> (Self, mpsc::UnboundedReceiver<BookingId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue `booking_id`. If the dispatcher has stopped, the periodic sweep
    /// picks the booking up after restart.
    pub fn dispatch(&self, booking_id: BookingId) {
        if self.tx.send(booking_id).is_err() {
            warn!(booking_id = %booking_id, "Confirmation dispatcher stopped; booking left for sweep");
        }
    }
}

/// Background task running the pipeline for queued and stranded bookings.
///
/// Each booking runs in its own task; a booking already in flight is not
/// started twice. Every `sweep_interval` the store is scanned for bookings
/// still `paid` so failed or lost confirmations are retried.
#[derive(Debug)]
pub struct ConfirmationDispatcher {
    handle: ConfirmationHandle,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ConfirmationDispatcher {
    /// Spawn the dispatcher on the current Tokio runtime.
    #[must_use]
    pub fn spawn(pipeline: ConfirmationPipeline, sweep_interval: Duration) -> Self {
        let (handle, rx) = ConfirmationHandle::detached();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_dispatcher(Arc::new(pipeline), rx, shutdown_rx, sweep_interval));
        Self {
            handle,
            shutdown,
            task,
        }
    }

    /// Handle for queueing bookings.
    #[must_use]
    pub fn handle(&self) -> ConfirmationHandle {
        self.handle.clone()
    }

    /// Stop accepting work and wait for in-flight confirmations to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            error!(error = %err, "Confirmation dispatcher task failed");
        }
    }
}

async fn run_dispatcher(
    pipeline: Arc<ConfirmationPipeline>,
    mut rx: mpsc::UnboundedReceiver<BookingId>,
    mut shutdown: watch::Receiver<bool>,
    sweep_interval: Duration,
) {
    let mut in_flight = InFlight::default();
    let mut tasks: JoinSet<BookingId> = JoinSet::new();
    let mut sweep = tokio::time::interval(sweep_interval);
    sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(sweep_secs = sweep_interval.as_secs(), "Confirmation dispatcher started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            received = rx.recv() => match received {
                Some(booking_id) => start(&pipeline, &mut tasks, &mut in_flight, booking_id),
                None => break,
            },
            _ = sweep.tick() => {
                match pipeline.ctx.store.list_bookings_with_status(BookingStatus::Paid).await {
                    Ok(stranded) => {
                        if !stranded.is_empty() {
                            info!(count = stranded.len(), "Sweeping paid bookings");
                        }
                        for booking in stranded {
                            start(&pipeline, &mut tasks, &mut in_flight, booking.id);
                        }
                    }
                    Err(err) => warn!(error = %err, "Sweep for paid bookings failed"),
                }
            }
            Some(finished) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                match finished {
                    Ok((task_id, _)) => {
                        in_flight.finish(task_id);
                    }
                    Err(err) => {
                        let booking_id = in_flight.finish(err.id());
                        error!(booking_id = ?booking_id, error = %err, "Confirmation task panicked");
                    }
                }
            }
        }
    }

    info!(in_flight = in_flight.bookings.len(), "Confirmation dispatcher draining");
    while tasks.join_next().await.is_some() {}
}

/// Bookings with a running confirmation, keyed both ways so a task that
/// panics still releases its booking.
#[derive(Default)]
struct InFlight {
    bookings: HashSet<BookingId>,
    tasks: HashMap<task::Id, BookingId>,
}

impl InFlight {
    fn finish(&mut self, task_id: task::Id) -> Option<BookingId> {
        let booking_id = self.tasks.remove(&task_id)?;
        self.bookings.remove(&booking_id);
        Some(booking_id)
    }
}

fn start(
    pipeline: &Arc<ConfirmationPipeline>,
    tasks: &mut JoinSet<BookingId>,
    in_flight: &mut InFlight,
    booking_id: BookingId,
) {
    if !in_flight.bookings.insert(booking_id) {
        debug!(booking_id = %booking_id, "Confirmation already in flight");
        return;
    }
    let pipeline = Arc::clone(pipeline);
    let handle = tasks.spawn(async move {
        // Errors are logged and counted inside `confirm`.
        let _ = pipeline.confirm(booking_id).await;
        booking_id
    });
    in_flight.tasks.insert(handle.id(), booking_id);
}
