use std::time::{Duration, Instant};

use crate::age::{classify, needs_guardian_verification, parse_age};
use crate::error::VerificationError;
use crate::models::{AgeCategory, AgeRecord};

pub const GUARDIAN_ADVISORY: &str = "For your safety, we recommend having a guardian or trusted adult help you access these services. You can still continue, but please be cautious.";

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub advisory_dwell: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            advisory_dwell: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianChoice {
    Yes,
    No,
}

impl GuardianChoice {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "y" | "yes" => Some(Self::Yes),
            "n" | "no" => Some(Self::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    CollectingAge,
    CollectingGuardianStatus,
    Advising,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    GuardianRequired { age: u8, category: AgeCategory },
    /// The advisory is on screen; call [`AgeVerificationFlow::poll`] at or
    /// after `ready_at` to receive the record.
    Advising {
        message: &'static str,
        ready_at: Instant,
    },
    Verified(AgeRecord),
}

#[derive(Debug, Clone)]
enum FlowState {
    CollectingAge,
    CollectingGuardianStatus {
        age: u8,
        category: AgeCategory,
        selection: Option<GuardianChoice>,
    },
    Advising {
        record: AgeRecord,
        ready_at: Instant,
    },
    Verified(AgeRecord),
}

#[derive(Debug, Clone)]
pub struct AgeVerificationFlow {
    config: VerificationConfig,
    state: FlowState,
}

impl Default for AgeVerificationFlow {
    fn default() -> Self {
        Self::new(VerificationConfig::default())
    }
}

impl AgeVerificationFlow {
    pub fn new(config: VerificationConfig) -> Self {
        Self {
            config,
            state: FlowState::CollectingAge,
        }
    }

    pub fn stage(&self) -> FlowStage {
        match self.state {
            FlowState::CollectingAge => FlowStage::CollectingAge,
            FlowState::CollectingGuardianStatus { .. } => FlowStage::CollectingGuardianStatus,
            FlowState::Advising { .. } => FlowStage::Advising,
            FlowState::Verified(_) => FlowStage::Verified,
        }
    }

    pub fn record(&self) -> Option<&AgeRecord> {
        match &self.state {
            FlowState::Verified(record) => Some(record),
            _ => None,
        }
    }

    pub fn advisory(&self) -> Option<&'static str> {
        match self.state {
            FlowState::Advising { .. } => Some(GUARDIAN_ADVISORY),
            _ => None,
        }
    }

    pub fn pending_until(&self) -> Option<Instant> {
        match self.state {
            FlowState::Advising { ready_at, .. } => Some(ready_at),
            _ => None,
        }
    }

    pub fn guardian_selection(&self) -> Option<GuardianChoice> {
        match self.state {
            FlowState::CollectingGuardianStatus { selection, .. } => selection,
            _ => None,
        }
    }

    pub fn submit_age(&mut self, input: &str) -> Result<Step, VerificationError> {
        match self.state {
            FlowState::CollectingAge => {}
            FlowState::Verified(_) => return Err(VerificationError::AlreadyVerified),
            _ => return Err(VerificationError::WrongStep { expected: "an age" }),
        }

        let age = parse_age(input)?;
        let category = classify(age);

        if needs_guardian_verification(age) {
            self.state = FlowState::CollectingGuardianStatus {
                age,
                category,
                selection: None,
            };
            return Ok(Step::GuardianRequired { age, category });
        }

        let record = AgeRecord::new(age, category, None);
        self.state = FlowState::Verified(record.clone());
        Ok(Step::Verified(record))
    }

    pub fn select_guardian(&mut self, choice: GuardianChoice) -> Result<(), VerificationError> {
        match &mut self.state {
            FlowState::CollectingGuardianStatus { selection, .. } => {
                *selection = Some(choice);
                Ok(())
            }
            FlowState::Verified(_) => Err(VerificationError::AlreadyVerified),
            _ => Err(VerificationError::WrongStep {
                expected: "a guardian status",
            }),
        }
    }

    pub fn confirm_guardian(&mut self, now: Instant) -> Result<Step, VerificationError> {
        let (age, category, selection) = match self.state {
            FlowState::CollectingGuardianStatus {
                age,
                category,
                selection,
            } => (age, category, selection),
            FlowState::Verified(_) => return Err(VerificationError::AlreadyVerified),
            _ => {
                return Err(VerificationError::WrongStep {
                    expected: "a guardian status",
                })
            }
        };

        let choice = selection.ok_or(VerificationError::GuardianChoiceMissing)?;
        let record = AgeRecord::new(age, category, Some(choice == GuardianChoice::Yes));

        if choice == GuardianChoice::Yes || self.config.advisory_dwell.is_zero() {
            self.state = FlowState::Verified(record.clone());
            return Ok(Step::Verified(record));
        }

        let ready_at = now + self.config.advisory_dwell;
        self.state = FlowState::Advising { record, ready_at };
        Ok(Step::Advising {
            message: GUARDIAN_ADVISORY,
            ready_at,
        })
    }

    /// Completes a pending advisory once its dwell time has passed.
    pub fn poll(&mut self, now: Instant) -> Option<AgeRecord> {
        let FlowState::Advising { record, ready_at } = &self.state else {
            return None;
        };
        if now < *ready_at {
            return None;
        }

        let record = record.clone();
        self.state = FlowState::Verified(record.clone());
        Some(record)
    }

    /// Returns from the guardian step to age entry. A pending advisory is
    /// dropped and never completes.
    pub fn go_back(&mut self) -> Result<(), VerificationError> {
        match self.state {
            FlowState::CollectingGuardianStatus { .. } | FlowState::Advising { .. } => {
                self.state = FlowState::CollectingAge;
                Ok(())
            }
            FlowState::Verified(_) => Err(VerificationError::AlreadyVerified),
            FlowState::CollectingAge => Err(VerificationError::WrongStep {
                expected: "a guardian status",
            }),
        }
    }

    pub fn reset(&mut self) {
        self.state = FlowState::CollectingAge;
    }
}
