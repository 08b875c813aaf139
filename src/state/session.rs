/// Tagging session: the state machine behind the operator's screen.
///
/// ```text
///            load (>=1)                submit (valid)
///   Idle ───────────────▶ Reviewing ─────────────────▶ Submitting
///    ▲  load (0)            ▲  ▲  ▲                      │  │  │
///    └──────┘               │  │  └── error / transport ─┘  │  │
///                           │  └───── success, advance ─────┘  │
///                           │                                  │ duplicate
///                           │   cancel / resolved / failed     ▼
///                           └──────────────────────── AwaitingResolution
///   Reviewing ── success on last record ──▶ Exhausted ── navigate ──▶ Reviewing
/// ```
///
/// Every operator action returns the effects it needs; every backend
/// completion goes through [`TaggingSession::handle`]. At most one mutating
/// exchange (rename, delete, resolve) is ever outstanding, and a completion
/// is applied only if its ticket matches the exchange still awaited.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{ImageAsset, RenameOutcome};
use crate::error::ApiError;

use super::data::{file_extension, DisplayMode, ImageRecord, RecordId};
use super::effect::{Completion, Effect, Ticket};
use super::ledger::LedgerClient;
use super::progress::Progress;
use super::queue::ReviewQueue;
use super::resolution::{Decision, DuplicateChallenge, Outcome, PendingChallenge, Settlement};
use super::vin;

/// Generic text for transport failures while tagging or resolving
pub const SAVE_FAILED: &str = "Failed to save file";
/// Generic text for transport failures while deleting
pub const DELETE_FAILED: &str = "Failed to delete image";
/// Rename prefix the backend applies to tagged files
pub const DEFAULT_PREFIX: &str = "VIN-B1024-";
/// Pause after a successful save so the message stays readable
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Zero advances immediately
    pub advance_delay: Duration,
    /// Only used to word the success message
    pub rename_prefix: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            advance_delay: DEFAULT_ADVANCE_DELAY,
            rename_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// One-line message under the VIN input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Status bar text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Loading,
    Ready,
    Saving,
    Deleting,
    DuplicateDetected,
    AllProcessed,
    NoImages,
    Error,
    LoadFailed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Loading => "Loading data...",
            Status::Ready => "Ready",
            Status::Saving => "Saving...",
            Status::Deleting => "Deleting...",
            Status::DuplicateDetected => "Duplicate VIN detected",
            Status::AllProcessed => "All images processed",
            Status::NoImages => "No images found",
            Status::Error => "Error",
            Status::LoadFailed => "Error loading data",
        };
        f.write_str(text)
    }
}

/// The mutating request behind `Phase::Submitting`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    Rename { filename: String, vin: String },
    Delete { filename: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// No queue loaded, or the queue is empty
    Idle,
    /// Cursor valid, waiting for operator input
    Reviewing,
    /// Rename or delete in flight; input disabled
    Submitting { ticket: Ticket, exchange: Exchange },
    /// Duplicate challenge open (or its resolve request in flight)
    AwaitingResolution(PendingChallenge),
    /// Final record tagged
    Exhausted,
}

#[derive(Debug)]
pub struct TaggingSession {
    settings: SessionSettings,
    queue: ReviewQueue,
    ledger: LedgerClient,
    phase: Phase,
    display_mode: DisplayMode,
    input: String,
    notice: Option<Notice>,
    status: Status,
    processed_dir: Option<String>,
    /// Asset the main image pane should be showing
    displayed: Option<ImageAsset>,
    next_seq: u64,
    loading: bool,
}

impl TaggingSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            queue: ReviewQueue::new(),
            ledger: LedgerClient::new(),
            phase: Phase::Idle,
            display_mode: DisplayMode::default(),
            input: String::new(),
            notice: None,
            status: Status::Loading,
            processed_dir: None,
            displayed: None,
            next_seq: 0,
            loading: false,
        }
    }

    // ========== Accessors ==========

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn queue(&self) -> &ReviewQueue {
        &self.queue
    }

    pub fn ledger(&self) -> &LedgerClient {
        &self.ledger
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.queue.current()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn processed_dir(&self) -> Option<&str> {
        self.processed_dir.as_deref()
    }

    pub fn displayed(&self) -> Option<&ImageAsset> {
        self.displayed.as_ref()
    }

    pub fn challenge(&self) -> Option<&PendingChallenge> {
        match &self.phase {
            Phase::AwaitingResolution(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress::derive(&self.queue, self.ledger.snapshot())
    }

    pub fn is_processed(&self, record: &ImageRecord) -> bool {
        self.ledger.is_processed(&record.filename)
    }

    /// Queue indices in presentation order (unprocessed first)
    pub fn display_order(&self) -> Vec<usize> {
        self.queue.display_order(|r| self.ledger.is_processed(&r.filename))
    }

    /// A mutating exchange is outstanding or a challenge is open
    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            Phase::Submitting { .. } | Phase::AwaitingResolution(_)
        )
    }

    /// A queue listing is in flight; it will replace every record
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Input controls are live (submit, delete, typing)
    pub fn accepts_input(&self) -> bool {
        !self.loading && self.phase == Phase::Reviewing
    }

    fn can_navigate(&self) -> bool {
        !self.loading && matches!(self.phase, Phase::Reviewing | Phase::Exhausted)
    }

    /// Whether a fetched image is still wanted by the current state
    pub fn wants_image(&self, asset: &ImageAsset) -> bool {
        if self.displayed.as_ref() == Some(asset) {
            return true;
        }
        self.challenge()
            .map(|p| &p.existing_asset == asset || &p.new_asset == asset)
            .unwrap_or(false)
    }

    // ========== Operator actions ==========

    /// Initial load: queue, backend config and ledger
    pub fn start(&mut self) -> Vec<Effect> {
        self.reload()
    }

    pub fn reload(&mut self) -> Vec<Effect> {
        if self.loading || self.is_busy() {
            return Vec::new();
        }
        self.loading = true;
        self.status = Status::Loading;
        vec![Effect::LoadQueue, Effect::FetchConfig, self.refresh_ledger()]
    }

    pub fn select(&mut self, index: usize) -> Vec<Effect> {
        if !self.can_navigate() || self.queue.select(index).is_none() {
            return Vec::new();
        }
        self.enter_record()
    }

    pub fn advance(&mut self) -> Vec<Effect> {
        if !self.can_navigate() || !self.queue.advance() {
            return Vec::new();
        }
        self.enter_record()
    }

    pub fn retreat(&mut self) -> Vec<Effect> {
        if !self.can_navigate() || !self.queue.retreat() {
            return Vec::new();
        }
        self.enter_record()
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) -> Vec<Effect> {
        if !self.can_navigate() || mode == self.display_mode {
            return Vec::new();
        }
        debug!("Display mode: {}", mode.as_param());
        self.display_mode = mode;
        self.show_current()
    }

    /// Operator typing; the field is kept uppercase
    pub fn set_input(&mut self, text: &str) {
        if self.accepts_input() {
            self.input = text.to_ascii_uppercase();
        }
    }

    /// Tag the current record with the VIN in the input field
    pub fn submit(&mut self) -> Vec<Effect> {
        if !self.accepts_input() {
            debug!("Ignoring submit while {:?}", self.phase_name());
            return Vec::new();
        }
        let Some(record) = self.queue.current().cloned() else {
            return Vec::new();
        };

        let vin = match vin::validate_vin(&self.input) {
            Ok(vin) => vin,
            Err(err) => {
                self.notice = Some(Notice::Error(err.to_string()));
                return Vec::new();
            }
        };

        self.input = vin.clone();
        let ticket = self.next_ticket(record.id);
        self.phase = Phase::Submitting {
            ticket,
            exchange: Exchange::Rename {
                filename: record.filename.clone(),
                vin: vin.clone(),
            },
        };
        self.status = Status::Saving;
        info!("Tagging {} as {}", record.filename, vin);

        vec![Effect::Rename {
            ticket,
            filename: record.filename,
            vin,
        }]
    }

    /// Delete the current record. Confirmation is the caller's job.
    pub fn delete_current(&mut self) -> Vec<Effect> {
        if !self.accepts_input() {
            debug!("Ignoring delete while {:?}", self.phase_name());
            return Vec::new();
        }
        let Some(record) = self.queue.current().cloned() else {
            return Vec::new();
        };

        let ticket = self.next_ticket(record.id);
        self.phase = Phase::Submitting {
            ticket,
            exchange: Exchange::Delete {
                filename: record.filename.clone(),
            },
        };
        self.status = Status::Deleting;
        info!("Deleting {}", record.filename);

        vec![Effect::Delete {
            ticket,
            filename: record.filename,
        }]
    }

    /// Operator's answer to the open duplicate challenge
    pub fn resolve(&mut self, outcome: Outcome) -> Vec<Effect> {
        if !matches!(self.phase, Phase::AwaitingResolution(_)) {
            return Vec::new();
        }
        let seq = self.next_seq + 1;

        let decision = match &mut self.phase {
            Phase::AwaitingResolution(pending) => pending.decide(outcome, seq),
            _ => Decision::Ignored,
        };

        match decision {
            Decision::Cancelled => {
                info!("Duplicate challenge cancelled");
                self.phase = Phase::Reviewing;
                self.status = Status::Ready;
                self.notice = Some(Notice::Error(
                    "Rename cancelled - please try a different VIN".to_string(),
                ));
                Vec::new()
            }
            Decision::Submit { ticket, request } => {
                self.next_seq = seq;
                self.status = Status::Saving;
                info!(
                    "Resolving {} vs {} with {}",
                    request.existing_file,
                    request.new_file,
                    request.choice.as_str()
                );
                vec![Effect::Resolve { ticket, request }]
            }
            Decision::Ignored => Vec::new(),
        }
    }

    // ========== Completions ==========

    pub fn handle(&mut self, completion: Completion) -> Vec<Effect> {
        match completion {
            Completion::QueueLoaded(result) => self.on_queue_loaded(result),
            Completion::ConfigLoaded(Ok(config)) => {
                self.processed_dir = Some(config.processed_dir);
                Vec::new()
            }
            Completion::ConfigLoaded(Err(err)) => {
                warn!("Failed to load backend config: {}", err);
                Vec::new()
            }
            Completion::LedgerRefreshed { generation, result } => {
                self.ledger.apply(generation, result);
                Vec::new()
            }
            Completion::Renamed { ticket, result } => self.on_renamed(ticket, result),
            Completion::Deleted { ticket, result } => self.on_deleted(ticket, result),
            Completion::Resolved { ticket, result } => self.on_resolved(ticket, result),
            // Image bytes are cached by the view layer, gated by `wants_image`
            Completion::ImageLoaded { .. } => Vec::new(),
            Completion::AdvanceDue { record } => self.on_advance_due(record),
        }
    }

    fn on_queue_loaded(&mut self, result: Result<crate::api::ImageListing, ApiError>) -> Vec<Effect> {
        self.loading = false;

        let listing = match result {
            Ok(listing) => listing,
            Err(err) => {
                warn!("Failed to load images: {}", err);
                self.status = Status::LoadFailed;
                self.notice = Some(Notice::Error(err.operator_message("Error loading images")));
                return Vec::new();
            }
        };

        info!(
            "Loaded {} images ({} processed)",
            listing.images.len(),
            listing.processed_count
        );
        self.queue.load(listing.images, listing.processed_count);

        if self.queue.is_empty() {
            self.enter_empty();
            return Vec::new();
        }

        self.status = Status::Ready;
        self.enter_record()
    }

    fn on_renamed(&mut self, ticket: Ticket, result: Result<RenameOutcome, ApiError>) -> Vec<Effect> {
        let (filename, vin) = match &self.phase {
            Phase::Submitting {
                ticket: expected,
                exchange: Exchange::Rename { filename, vin },
            } if *expected == ticket => (filename.clone(), vin.clone()),
            _ => {
                debug!("Dropping stale rename response for {:?}", ticket);
                return Vec::new();
            }
        };

        match result {
            Ok(RenameOutcome::Renamed(receipt)) => {
                self.queue.mark_processed();
                self.phase = Phase::Reviewing;
                self.status = Status::Ready;
                self.notice = Some(Notice::Success(format!(
                    "Saved as {}{}{}",
                    self.settings.rename_prefix,
                    vin,
                    file_extension(&filename)
                )));
                info!("Tagged {} as {}", filename, vin);

                let mut effects = vec![self.refresh_ledger()];

                if let (true, Some(new_name)) = (receipt.raw_file_renamed, receipt.raw_file_new_name) {
                    if let Some(index) = self.queue.position(ticket.record) {
                        debug!("Raw file renamed: {} -> {}", filename, new_name);
                        self.queue.replace_at(index, new_name);
                        effects.extend(self.show_current());
                    }
                }

                effects.extend(self.schedule_advance(ticket.record));
                effects
            }
            Ok(RenameOutcome::Duplicate { existing_file }) => {
                info!("Duplicate VIN {}: {} already tagged", vin, existing_file);
                let pending = PendingChallenge::open(
                    DuplicateChallenge {
                        existing_file,
                        new_file: filename,
                        candidate_vin: vin,
                    },
                    ticket.record,
                    self.display_mode,
                );
                let effects = vec![
                    Effect::FetchImage(pending.existing_asset.clone()),
                    Effect::FetchImage(pending.new_asset.clone()),
                ];
                self.phase = Phase::AwaitingResolution(pending);
                self.status = Status::DuplicateDetected;
                effects
            }
            Err(err) => {
                warn!("Rename of {} failed: {}", filename, err);
                self.phase = Phase::Reviewing;
                self.status = Status::Error;
                self.notice = Some(Notice::Error(err.operator_message(SAVE_FAILED)));
                Vec::new()
            }
        }
    }

    fn on_deleted(&mut self, ticket: Ticket, result: Result<Option<String>, ApiError>) -> Vec<Effect> {
        let filename = match &self.phase {
            Phase::Submitting {
                ticket: expected,
                exchange: Exchange::Delete { filename },
            } if *expected == ticket => filename.clone(),
            _ => {
                debug!("Dropping stale delete response for {:?}", ticket);
                return Vec::new();
            }
        };

        if let Err(err) = result {
            warn!("Delete of {} failed: {}", filename, err);
            self.phase = Phase::Reviewing;
            self.status = Status::Error;
            self.notice = Some(Notice::Error(err.operator_message(DELETE_FAILED)));
            return Vec::new();
        }

        info!("Deleted {}", filename);
        if let Some(index) = self.queue.position(ticket.record) {
            self.queue.remove_at(index);
        }

        let mut effects = vec![self.refresh_ledger()];
        if self.queue.is_empty() {
            self.enter_empty();
        } else {
            self.status = Status::Ready;
            effects.extend(self.enter_record());
        }
        self.notice = Some(Notice::Success("Image deleted".to_string()));
        effects
    }

    fn on_resolved(&mut self, ticket: Ticket, result: Result<Option<String>, ApiError>) -> Vec<Effect> {
        let settlement = match &self.phase {
            Phase::AwaitingResolution(pending) => pending.settle(ticket, result),
            _ => None,
        };
        let Some(settlement) = settlement else {
            debug!("Dropping stale resolve response for {:?}", ticket);
            return Vec::new();
        };

        // The challenge is discarded either way
        self.phase = Phase::Reviewing;

        match settlement {
            Settlement::Resolved { record, choice } => {
                info!("Duplicate resolved with {}", choice.as_str());
                self.status = Status::Ready;
                self.notice = Some(Notice::Success(format!(
                    "Saved with choice: {}",
                    choice.as_str()
                )));
                let mut effects = vec![self.refresh_ledger()];
                effects.extend(self.schedule_advance(record));
                effects
            }
            Settlement::Failed { message } => {
                warn!("Duplicate resolution failed: {}", message);
                self.status = Status::Error;
                self.notice = Some(Notice::Error(message));
                Vec::new()
            }
        }
    }

    fn on_advance_due(&mut self, record: RecordId) -> Vec<Effect> {
        let still_here = self.phase == Phase::Reviewing
            && self.queue.current().map(|r| r.id) == Some(record);
        if !still_here {
            debug!("Skipping auto-advance, operator moved on");
            return Vec::new();
        }
        self.advance()
    }

    // ========== Internals ==========

    fn next_ticket(&mut self, record: RecordId) -> Ticket {
        self.next_seq += 1;
        Ticket {
            record,
            seq: self.next_seq,
        }
    }

    fn refresh_ledger(&mut self) -> Effect {
        Effect::RefreshLedger {
            generation: self.ledger.begin_refresh(),
        }
    }

    /// After a successful save: move on, or finish if this was the last record
    fn schedule_advance(&mut self, record: RecordId) -> Vec<Effect> {
        let Some(index) = self.queue.position(record) else {
            return Vec::new();
        };

        if index + 1 >= self.queue.len() {
            info!("All images processed");
            self.phase = Phase::Exhausted;
            self.status = Status::AllProcessed;
            return Vec::new();
        }

        if self.settings.advance_delay.is_zero() {
            return self.on_advance_due(record);
        }

        vec![Effect::AdvanceAfter {
            record,
            delay: self.settings.advance_delay,
        }]
    }

    /// Cursor landed on a record: reset input to its candidate VIN
    fn enter_record(&mut self) -> Vec<Effect> {
        self.phase = Phase::Reviewing;
        self.notice = None;
        self.input = self
            .queue
            .current()
            .and_then(ImageRecord::candidate_vin)
            .unwrap_or_default();
        if self.status == Status::AllProcessed {
            self.status = Status::Ready;
        }
        self.show_current()
    }

    fn enter_empty(&mut self) {
        self.phase = Phase::Idle;
        self.status = Status::NoImages;
        self.input.clear();
        self.displayed = None;
    }

    fn show_current(&mut self) -> Vec<Effect> {
        match self.queue.current() {
            Some(record) => {
                let asset = ImageAsset::raw(record.filename.clone(), self.display_mode);
                self.displayed = Some(asset.clone());
                vec![Effect::FetchImage(asset)]
            }
            None => {
                self.displayed = None;
                Vec::new()
            }
        }
    }

    fn phase_name(&self) -> &'static str {
        match self.phase {
            Phase::Idle => "Idle",
            Phase::Reviewing => "Reviewing",
            Phase::Submitting { .. } => "Submitting",
            Phase::AwaitingResolution(_) => "AwaitingResolution",
            Phase::Exhausted => "Exhausted",
        }
    }
}
