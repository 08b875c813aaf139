/// Duplicate VIN resolution protocol
///
/// When the backend reports that another file already carries the VIN the
/// operator just typed, the session suspends on a `PendingChallenge`. The
/// operator picks exactly one `Outcome`; `cancel` closes the challenge with
/// no backend call, the two keep choices send a single resolve request.
/// Once a choice is submitted further choices are ignored, so a burst of
/// key presses can never produce a second request.

use crate::api::{ImageAsset, Resolution, ResolveRequest};
use crate::error::ApiError;

use super::data::{DisplayMode, RecordId};
use super::effect::Ticket;
use super::session::SAVE_FAILED;

/// The two files competing for one VIN, captured from the rename request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateChallenge {
    /// Already tagged with the VIN (lives in the processed directory)
    pub existing_file: String,
    /// The file the operator was tagging
    pub new_file: String,
    pub candidate_vin: String,
}

impl DuplicateChallenge {
    pub fn request(&self, choice: Resolution) -> ResolveRequest {
        ResolveRequest {
            existing_file: self.existing_file.clone(),
            new_file: self.new_file.clone(),
            vin: self.candidate_vin.clone(),
            choice,
        }
    }
}

/// Operator decision on an open challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    KeepExisting,
    KeepNew,
    Cancel,
}

impl Outcome {
    pub fn resolution(self) -> Option<Resolution> {
        match self {
            Outcome::KeepExisting => Some(Resolution::KeepExisting),
            Outcome::KeepNew => Some(Resolution::KeepNew),
            Outcome::Cancel => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChallengeStatus {
    /// Waiting for the operator
    Open,
    /// Resolve request in flight
    Submitted { ticket: Ticket, choice: Resolution },
}

/// What the session should do with an operator decision
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Cancelled,
    Submit { ticket: Ticket, request: ResolveRequest },
    /// A choice was already submitted
    Ignored,
}

/// How the session resumes after the resolve request completes
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Resolved { record: RecordId, choice: Resolution },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingChallenge {
    pub challenge: DuplicateChallenge,
    /// Queue record the rename was issued for
    pub record: RecordId,
    pub status: ChallengeStatus,
    pub existing_asset: ImageAsset,
    pub new_asset: ImageAsset,
}

impl PendingChallenge {
    pub fn open(challenge: DuplicateChallenge, record: RecordId, mode: DisplayMode) -> Self {
        let existing_asset = ImageAsset::processed(challenge.existing_file.clone());
        let new_asset = ImageAsset::raw(challenge.new_file.clone(), mode);
        Self {
            challenge,
            record,
            status: ChallengeStatus::Open,
            existing_asset,
            new_asset,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ChallengeStatus::Open
    }

    /// Apply the operator's decision. `seq` numbers the resolve exchange.
    pub fn decide(&mut self, outcome: Outcome, seq: u64) -> Decision {
        if !self.is_open() {
            return Decision::Ignored;
        }

        match outcome.resolution() {
            None => Decision::Cancelled,
            Some(choice) => {
                let ticket = Ticket {
                    record: self.record,
                    seq,
                };
                self.status = ChallengeStatus::Submitted { ticket, choice };
                Decision::Submit {
                    ticket,
                    request: self.challenge.request(choice),
                }
            }
        }
    }

    /// Interpret the resolve response. `None` if `ticket` is not the
    /// request this challenge is waiting on.
    pub fn settle(
        &self,
        ticket: Ticket,
        result: Result<Option<String>, ApiError>,
    ) -> Option<Settlement> {
        let choice = match &self.status {
            ChallengeStatus::Submitted { ticket: expected, choice } if *expected == ticket => *choice,
            _ => return None,
        };

        Some(match result {
            Ok(_) => Settlement::Resolved {
                record: self.record,
                choice,
            },
            Err(err) => Settlement::Failed {
                message: err.operator_message(SAVE_FAILED),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingChallenge {
        PendingChallenge::open(
            DuplicateChallenge {
                existing_file: "car1.jpg".to_string(),
                new_file: "car2.jpg".to_string(),
                candidate_vin: "AB12C3".to_string(),
            },
            RecordId(2),
            DisplayMode::Original,
        )
    }

    #[test]
    fn test_cancel_sends_nothing() {
        let mut p = pending();
        assert_eq!(p.decide(Outcome::Cancel, 1), Decision::Cancelled);
    }

    #[test]
    fn test_keep_new_submits_once() {
        let mut p = pending();
        let decision = p.decide(Outcome::KeepNew, 7);
        let Decision::Submit { ticket, request } = decision else {
            panic!("expected a submit decision, got {:?}", decision);
        };
        assert_eq!(ticket, Ticket { record: RecordId(2), seq: 7 });
        assert_eq!(request.choice, Resolution::KeepNew);
        assert_eq!(request.existing_file, "car1.jpg");
        assert_eq!(request.new_file, "car2.jpg");
        assert_eq!(request.vin, "AB12C3");

        // Second choice while in flight is ignored
        assert_eq!(p.decide(Outcome::KeepExisting, 8), Decision::Ignored);
        assert_eq!(p.decide(Outcome::Cancel, 9), Decision::Ignored);
    }

    #[test]
    fn test_settle_checks_ticket() {
        let mut p = pending();
        assert_eq!(p.settle(Ticket { record: RecordId(2), seq: 3 }, Ok(None)), None);

        p.decide(Outcome::KeepExisting, 3);
        assert_eq!(p.settle(Ticket { record: RecordId(2), seq: 4 }, Ok(None)), None);
        assert_eq!(
            p.settle(Ticket { record: RecordId(2), seq: 3 }, Ok(None)),
            Some(Settlement::Resolved {
                record: RecordId(2),
                choice: Resolution::KeepExisting
            })
        );
    }

    #[test]
    fn test_settle_failure_messages() {
        let mut p = pending();
        p.decide(Outcome::KeepNew, 1);
        let ticket = Ticket { record: RecordId(2), seq: 1 };

        assert_eq!(
            p.settle(ticket, Err(ApiError::Backend { message: "Invalid choice".to_string() })),
            Some(Settlement::Failed { message: "Invalid choice".to_string() })
        );
        assert_eq!(
            p.settle(ticket, Err(ApiError::Transport("reset".to_string()))),
            Some(Settlement::Failed { message: SAVE_FAILED.to_string() })
        );
    }

    #[test]
    fn test_assets_point_at_both_directories() {
        let p = pending();
        assert_eq!(p.existing_asset.source, crate::api::AssetSource::Processed);
        assert_eq!(p.new_asset.filename, "car2.jpg");
    }
}
