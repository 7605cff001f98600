use std::sync::Arc;

use careconnect_core::{Coordinate, ServiceCategory, ServiceRecord, VerificationConfig};
use careconnect_observability::FlowMetrics;
use careconnect_storage::ServiceCatalog;
use tracing::{info, instrument};

use crate::error::SessionError;
use crate::intake::Intake;

pub const FALLBACK_RESULT_COUNT: usize = 2;

pub struct ServiceDiscoveryGate<C> {
    intake: Intake,
    catalog: Arc<C>,
    category: Option<ServiceCategory>,
    results: Vec<ServiceRecord>,
    has_searched: bool,
    metrics: Arc<FlowMetrics>,
}

impl<C: ServiceCatalog> ServiceDiscoveryGate<C> {
    pub fn new(catalog: Arc<C>, config: VerificationConfig, metrics: Arc<FlowMetrics>) -> Self {
        Self {
            intake: Intake::new(config, metrics.clone()),
            catalog,
            category: None,
            results: Vec::new(),
            has_searched: false,
            metrics,
        }
    }

    pub fn intake(&self) -> &Intake {
        &self.intake
    }

    pub fn intake_mut(&mut self) -> &mut Intake {
        &mut self.intake
    }

    pub fn category(&self) -> Option<ServiceCategory> {
        self.category
    }

    pub fn results(&self) -> &[ServiceRecord] {
        &self.results
    }

    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    pub fn can_select_category(&self) -> bool {
        self.intake.is_complete()
    }

    pub fn can_search(&self) -> bool {
        self.can_select_category() && self.category.is_some()
    }

    pub fn set_location(&mut self, location: Coordinate) {
        self.intake.set_location(location);
    }

    pub fn select_category(&mut self, category: ServiceCategory) -> Result<(), SessionError> {
        if !self.can_select_category() {
            return Err(SessionError::CategoryLocked);
        }
        self.category = Some(category);
        Ok(())
    }

    #[instrument(skip(self), fields(category = ?self.category))]
    pub async fn search(&mut self) -> Result<&[ServiceRecord], SessionError> {
        let Some(category) = self.category.filter(|_| self.can_search()) else {
            return Err(SessionError::SearchNotReady);
        };

        let mut results = self.catalog.services_in_category(category).await?;
        let fell_back = results.is_empty();
        if fell_back {
            results = self.catalog.first_services(FALLBACK_RESULT_COUNT).await?;
        }

        self.metrics.inc_search(fell_back);
        info!(
            category = category.as_code(),
            results = results.len(),
            fell_back,
            "services searched"
        );

        self.results = results;
        self.has_searched = true;
        Ok(&self.results)
    }

    pub fn reset_age(&mut self) {
        self.intake.reset_age();
        self.intake.reset_location();
        self.clear_results();
    }

    pub fn reset_location(&mut self) {
        self.intake.reset_location();
        self.clear_results();
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.has_searched = false;
    }
}
