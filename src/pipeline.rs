//! One end-to-end run: health gate, per-security metric derivation, a single
//! commit of all staged securities, then industry aggregation over the
//! committed store.

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::analysis::{calculate_metrics, classify};
use crate::api::FundamentalsProvider;
use crate::database_sqlx::DatabaseManagerSqlx;
use crate::models::{SecurityMetrics, StatementKind};

/// Log a progress line every this many symbols
const PROGRESS_INTERVAL: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    HealthChecked,
    SymbolsFetched,
    PerSecurityLoop,
    SecuritiesCommitted,
    IndustriesAggregated,
    Done,
    Aborted,
}

impl PipelineState {
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, HealthChecked)
                | (Idle, Aborted)
                | (HealthChecked, Aborted)
                | (HealthChecked, SymbolsFetched)
                | (SymbolsFetched, PerSecurityLoop)
                | (PerSecurityLoop, SecuritiesCommitted)
                | (SecuritiesCommitted, IndustriesAggregated)
                | (IndustriesAggregated, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }
}

/// What happened to a single symbol inside the security loop
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityOutcome {
    Computed(SecurityMetrics),
    MissingProfile,
    OutOfScope,
    MissingData,
}

/// Summary of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub final_state: PipelineState,
    pub symbols_total: usize,
    pub missing_profile: usize,
    pub out_of_scope: usize,
    pub missing_data: usize,
    pub securities_committed: usize,
    pub industries_aggregated: usize,
}

impl PipelineReport {
    fn new() -> Self {
        Self {
            final_state: PipelineState::Idle,
            symbols_total: 0,
            missing_profile: 0,
            out_of_scope: 0,
            missing_data: 0,
            securities_committed: 0,
            industries_aggregated: 0,
        }
    }
}

/// Drives one run against a provider and a store
pub struct MetricsPipeline<P> {
    provider: P,
    database: DatabaseManagerSqlx,
    target_industries: Vec<String>,
    state: PipelineState,
}

impl<P: FundamentalsProvider> MetricsPipeline<P> {
    pub fn new(provider: P, database: DatabaseManagerSqlx, target_industries: Vec<String>) -> Self {
        Self {
            provider,
            database,
            target_industries,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn transition(&mut self, next: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            bail!("invalid pipeline transition {:?} -> {:?}", self.state, next);
        }
        debug!("Pipeline state {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Execute the run. Provider failures never fail the run; store errors do.
    pub async fn run(&mut self) -> Result<PipelineReport> {
        let mut report = PipelineReport::new();

        if !self.provider.check_health().await {
            error!("❌ Health check failed, aborting run");
            self.transition(PipelineState::Aborted)?;
            report.final_state = self.state;
            return Ok(report);
        }
        self.transition(PipelineState::HealthChecked)?;

        info!("Fetching symbols...");
        let symbols = self.provider.get_symbols().await;
        report.symbols_total = symbols.len();
        self.transition(PipelineState::SymbolsFetched)?;
        info!("Found {} symbols. Starting processing...", symbols.len());

        self.transition(PipelineState::PerSecurityLoop)?;
        let mut staged = Vec::new();
        for (i, symbol) in symbols.iter().enumerate() {
            if i % PROGRESS_INTERVAL == 0 {
                info!("📊 Processing {}/{}", i, symbols.len());
            }

            match self.process_security(symbol).await {
                SecurityOutcome::Computed(metrics) => staged.push(metrics),
                SecurityOutcome::MissingProfile => report.missing_profile += 1,
                SecurityOutcome::OutOfScope => report.out_of_scope += 1,
                SecurityOutcome::MissingData => report.missing_data += 1,
            }
        }

        report.securities_committed = self.database.commit_security_statistics(&staged).await?;
        self.transition(PipelineState::SecuritiesCommitted)?;

        let aggregates = self
            .database
            .refresh_industry_aggregations(&self.target_industries)
            .await?;
        report.industries_aggregated = aggregates.len();
        self.transition(PipelineState::IndustriesAggregated)?;

        for aggregate in &aggregates {
            info!(
                industry = %aggregate.industry,
                securities = aggregate.security_count,
                avg_pe_ratio = ?aggregate.avg_pe_ratio,
                avg_revenue_growth = ?aggregate.avg_revenue_growth,
                sum_revenue = aggregate.sum_revenue,
                "Industry aggregate updated"
            );
        }

        self.transition(PipelineState::Done)?;
        report.final_state = self.state;
        info!("✅ Pipeline done: {} securities committed", report.securities_committed);
        Ok(report)
    }

    /// Profile, industry filter, statements and price for one symbol.
    ///
    /// Returns computed metrics only when a usable price and income data exist.
    pub async fn process_security(&self, symbol: &str) -> SecurityOutcome {
        let Some(profile) = self.provider.get_company_profile(symbol).await else {
            debug!("{}: no profile", symbol);
            return SecurityOutcome::MissingProfile;
        };

        let industry = match profile.industry.as_deref() {
            Some(industry) if self.target_industries.iter().any(|t| t == industry) => industry.to_string(),
            _ => return SecurityOutcome::OutOfScope,
        };

        let income = self.provider.get_financials(symbol, StatementKind::Income).await;
        let balance = self.provider.get_financials(symbol, StatementKind::Balance).await;
        let price = usable_price(self.provider.get_eod_price(symbol).await).or(usable_price(profile.price));

        let (Some(price), Some(income)) = (price, income.filter(|rows| !rows.is_empty())) else {
            debug!("{}: missing price or income statements, skipping", symbol);
            return SecurityOutcome::MissingData;
        };

        let income = classify(Some(income));
        let balance = classify(balance);
        SecurityOutcome::Computed(calculate_metrics(symbol, &industry, price, &income, &balance))
    }
}

/// A price of zero is as good as no price
fn usable_price(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p != 0.0)
}
