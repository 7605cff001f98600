use std::sync::Arc;
use std::time::Instant;

use careconnect_core::{
    AgeRecord, AgeVerificationFlow, Coordinate, DeviceLocator, FlowStage, GuardianChoice,
    LocationError, LocationResolver, Step, VerificationConfig, VerificationError,
};
use careconnect_observability::FlowMetrics;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Intake {
    flow: AgeVerificationFlow,
    age: Option<AgeRecord>,
    location: Option<Coordinate>,
    metrics: Arc<FlowMetrics>,
}

impl Intake {
    pub fn new(config: VerificationConfig, metrics: Arc<FlowMetrics>) -> Self {
        Self {
            flow: AgeVerificationFlow::new(config),
            age: None,
            location: None,
            metrics,
        }
    }

    pub fn stage(&self) -> FlowStage {
        self.flow.stage()
    }

    pub fn age(&self) -> Option<&AgeRecord> {
        self.age.as_ref()
    }

    pub fn location(&self) -> Option<&Coordinate> {
        self.location.as_ref()
    }

    pub fn advisory(&self) -> Option<&'static str> {
        self.flow.advisory()
    }

    pub fn is_complete(&self) -> bool {
        self.age.is_some() && self.location.is_some()
    }

    pub fn submit_age(&mut self, input: &str) -> Result<Step, VerificationError> {
        let step = self.flow.submit_age(input).inspect_err(|error| {
            warn!(%error, "age input rejected");
        })?;
        self.observe(&step);
        Ok(step)
    }

    pub fn select_guardian(&mut self, choice: GuardianChoice) -> Result<(), VerificationError> {
        self.flow.select_guardian(choice)
    }

    pub fn confirm_guardian(&mut self, now: Instant) -> Result<Step, VerificationError> {
        let step = self.flow.confirm_guardian(now)?;
        self.observe(&step);
        Ok(step)
    }

    pub fn poll(&mut self, now: Instant) -> Option<AgeRecord> {
        let record = self.flow.poll(now)?;
        self.accept(record.clone());
        Some(record)
    }

    pub async fn await_advisory(&mut self) -> Option<AgeRecord> {
        let ready_at = self.flow.pending_until()?;
        tokio::time::sleep_until(tokio::time::Instant::from_std(ready_at)).await;
        self.poll(Instant::now().max(ready_at))
    }

    pub fn go_back(&mut self) -> Result<(), VerificationError> {
        self.flow.go_back()
    }

    pub(crate) fn set_location(&mut self, location: Coordinate) {
        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            city = location.display_name(),
            "location set"
        );
        self.location = Some(location);
    }

    pub(crate) fn reset_age(&mut self) {
        self.flow.reset();
        self.age = None;
    }

    pub(crate) fn reset_location(&mut self) {
        self.location = None;
    }

    fn observe(&mut self, step: &Step) {
        match step {
            Step::Verified(record) => self.accept(record.clone()),
            Step::Advising { .. } => {
                self.metrics.inc_guardian_advisory();
                warn!("minor continuing without a guardian; advisory shown");
            }
            Step::GuardianRequired { age, category } => {
                info!(age, category = %category, "guardian confirmation required");
            }
        }
    }

    fn accept(&mut self, record: AgeRecord) {
        self.metrics.inc_verification();
        info!(
            age = record.age(),
            category = %record.age_category(),
            has_guardian = ?record.has_guardian(),
            "age verified"
        );
        self.age = Some(record);
    }
}

pub async fn resolve_device_location<D: DeviceLocator>(
    resolver: &LocationResolver<D>,
) -> Result<Coordinate, LocationError> {
    resolver.resolve_from_device().await.inspect_err(|error| {
        warn!(%error, "device location unavailable; manual entry required");
    })
}

pub fn resolve_manual_location<D: DeviceLocator>(
    resolver: &LocationResolver<D>,
    city: &str,
) -> Result<Coordinate, LocationError> {
    resolver.resolve_manual(city).inspect_err(|error| {
        warn!(%error, query = city.trim(), "manual location lookup missed");
    })
}
