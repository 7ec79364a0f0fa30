//! # Pipeline
//!
//! One run: operator input in, three rows out.
//!
//! ## Stages
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Pipeline Run                                    │
//! │                                                                         │
//! │  1. AwaitingInput      ◄──┐ rejected? report + ask again               │
//! │       │ SalesRecord ──────┘ (until valid, cancelled or max_attempts)   │
//! │       ▼                                                                 │
//! │  2. PersistingSales    append → sales                                  │
//! │       ▼                                                                 │
//! │  3. ComputingSurplus   latest stock row − sales                        │
//! │       ▼                                                                 │
//! │  4. PersistingSurplus  append → surplus                                │
//! │       ▼                                                                 │
//! │  5. ReadingHistory     last W values of every sales column             │
//! │       ▼                                                                 │
//! │  6. ComputingForecast  round(mean × (1 + uplift))                      │
//! │       ▼                                                                 │
//! │  7. PersistingForecast append → stock                                  │
//! │                                                                         │
//! │  Any failure after stage 1 ends the run. Earlier appends stay.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Capabilities
//! The pipeline never touches a terminal or a database directly:
//! - [`TableStore`] - where rows live
//! - [`InputSource`] - where operator lines come from
//! - [`PipelineEvents`] - where progress and rejections are reported

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, CoreError, ValidationError};
use crate::forecast::{self, Uplift};
use crate::store::{parse_column, parse_row, Table, TableStore};
use crate::surplus;
use crate::types::{ForecastRecord, SalesHistoryWindow, SalesRecord, StockRecord, SurplusRecord};
use crate::validation::validate_line;
use crate::{DEFAULT_ITEMS, DEFAULT_UPLIFT_BPS, DEFAULT_WINDOW};

// =============================================================================
// Configuration
// =============================================================================

/// Settings fixed for the lifetime of a pipeline.
///
/// ## Example Config (TOML)
/// ```toml
/// items = ["bacon", "chicken", "egg", "ham", "tuna", "turkey"]
/// window = 5
/// uplift_bps = 1000
/// max_attempts = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Item type names, in column order. K = `items.len()`.
    pub items: Vec<String>,

    /// Trailing sales periods averaged by the forecast (W).
    pub window: usize,

    /// Forecast uplift in basis points (1000 = 10%).
    pub uplift_bps: u32,

    /// Input attempts before giving up. `None` = ask until valid or cancelled.
    pub max_attempts: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            items: DEFAULT_ITEMS.iter().map(|s| s.to_string()).collect(),
            window: DEFAULT_WINDOW,
            uplift_bps: DEFAULT_UPLIFT_BPS,
            max_attempts: None,
        }
    }
}

impl PipelineConfig {
    /// Number of item types (K).
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn uplift(&self) -> Uplift {
        Uplift::from_bps(self.uplift_bps)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items.is_empty() {
            return Err(ConfigError::Required {
                field: "items".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            let name = item.trim();
            if name.is_empty() {
                return Err(ConfigError::invalid("items", "item names must not be blank"));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ConfigError::invalid(
                    "items",
                    format!("duplicate item '{}'", name),
                ));
            }
        }

        if self.window == 0 {
            return Err(ConfigError::invalid("window", "must be at least 1"));
        }

        if self.uplift_bps > Uplift::MAX_BPS {
            return Err(ConfigError::invalid(
                "uplift_bps",
                format!("must be between 0 and {}", Uplift::MAX_BPS),
            ));
        }

        if self.max_attempts == Some(0) {
            return Err(ConfigError::invalid("max_attempts", "must be at least 1"));
        }

        Ok(())
    }

    /// Instructions shown before each input attempt.
    pub fn prompt(&self) -> String {
        let example: Vec<String> = (1..=self.item_count())
            .map(|i| (i * 10).to_string())
            .collect();
        format!(
            "Please enter sales data from the last market.\n\
             Data should be {} numbers, separated by commas ({}).\n\
             Example: {}\n",
            self.item_count(),
            self.items.join(", "),
            example.join(",")
        )
    }
}

// =============================================================================
// Stage
// =============================================================================

/// The step of a run, used to say where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingInput,
    PersistingSales,
    ComputingSurplus,
    PersistingSurplus,
    ReadingHistory,
    ComputingForecast,
    PersistingForecast,
}

impl Stage {
    /// The table a persisting stage writes to.
    pub fn target_table(&self) -> Option<Table> {
        match self {
            Stage::PersistingSales => Some(Table::Sales),
            Stage::PersistingSurplus => Some(Table::Surplus),
            Stage::PersistingForecast => Some(Table::Stock),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::AwaitingInput => "awaiting input",
            Stage::PersistingSales => "persisting sales",
            Stage::ComputingSurplus => "computing surplus",
            Stage::PersistingSurplus => "persisting surplus",
            Stage::ReadingHistory => "reading sales history",
            Stage::ComputingForecast => "computing forecast",
            Stage::PersistingForecast => "persisting forecast",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Pipeline Error
// =============================================================================

/// Why a run ended without persisting a forecast.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage after input failed. Earlier stages stay committed.
    #[error("Run failed while {stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: CoreError,
    },

    /// The operator cancelled (end of input or interrupt).
    #[error("Input cancelled by operator")]
    Cancelled,

    /// `max_attempts` invalid lines in a row.
    #[error("No valid input after {attempts} attempts")]
    AttemptsExhausted { attempts: u32 },

    /// The input source itself failed.
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),

    /// Configuration rejected.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// The stage that failed, when there is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::Cancelled
            | PipelineError::AttemptsExhausted { .. }
            | PipelineError::Input(_) => Some(Stage::AwaitingInput),
            PipelineError::Config(_) => None,
        }
    }
}

/// Maps an error into a [`PipelineError::Stage`] for `stage`.
fn at<E: Into<CoreError>>(stage: Stage) -> impl FnOnce(E) -> PipelineError {
    move |err| PipelineError::Stage {
        stage,
        source: err.into(),
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Where operator lines come from.
#[async_trait]
pub trait InputSource: Send {
    /// Shows `prompt` and waits for one line.
    ///
    /// `Ok(None)` means the operator cancelled.
    async fn next_line(&mut self, prompt: &str) -> std::io::Result<Option<String>>;
}

/// Receives advisory progress notifications.
///
/// All methods default to doing nothing.
pub trait PipelineEvents: Send + Sync {
    /// An input line was rejected; the operator will be asked again.
    fn input_rejected(&self, _attempt: u32, _error: &ValidationError) {}

    fn input_accepted(&self, _sales: &SalesRecord) {}

    fn stage_started(&self, _stage: Stage) {}

    fn stage_completed(&self, _stage: Stage) {}

    fn surplus_computed(&self, _surplus: &SurplusRecord) {}

    fn forecast_computed(&self, _forecast: &ForecastRecord) {}
}

/// No-op event sink.
pub struct NoOpEvents;

impl PipelineEvents for NoOpEvents {}

// =============================================================================
// Run Summary
// =============================================================================

/// Everything one successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub sales: SalesRecord,
    pub surplus: SurplusRecord,
    pub forecast: ForecastRecord,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Sequences validation, surplus and forecast against a [`TableStore`].
///
/// ## Usage
/// ```rust,ignore
/// let pipeline = Pipeline::new(store, PipelineConfig::default())?
///     .with_events(Arc::new(ConsoleEvents));
/// let summary = pipeline.run(&mut stdin_source).await?;
/// ```
pub struct Pipeline {
    store: Arc<dyn TableStore>,
    config: PipelineConfig,
    events: Arc<dyn PipelineEvents>,

    /// Held for a whole run so two runs never interleave stages.
    run_lock: Mutex<()>,
}

impl Pipeline {
    /// Creates a pipeline after validating `config`.
    pub fn new(store: Arc<dyn TableStore>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Pipeline {
            store,
            config,
            events: Arc::new(NoOpEvents),
            run_lock: Mutex::new(()),
        })
    }

    /// Sets the event sink.
    pub fn with_events(mut self, events: Arc<dyn PipelineEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Executes one full run.
    ///
    /// ## Returns
    /// * `Ok(RunSummary)` - all three rows were appended
    /// * `Err(PipelineError)` - see the variant for where it stopped
    pub async fn run<I>(&self, input: &mut I) -> Result<RunSummary, PipelineError>
    where
        I: InputSource + ?Sized,
    {
        let _guard = self.run_lock.lock().await;
        info!(
            items = self.config.item_count(),
            window = self.config.window,
            "Starting pipeline run"
        );

        let sales = self.await_input(input).await?;

        self.append(Stage::PersistingSales, Table::Sales, sales.values()).await?;

        self.events.stage_started(Stage::ComputingSurplus);
        let stock = self
            .latest_stock()
            .await
            .map_err(at(Stage::ComputingSurplus))?;
        let surplus = surplus::compute(&stock, &sales).map_err(at(Stage::ComputingSurplus))?;
        debug!(%surplus, "Surplus computed");
        self.events.surplus_computed(&surplus);
        self.events.stage_completed(Stage::ComputingSurplus);

        self.append(Stage::PersistingSurplus, Table::Surplus, surplus.values()).await?;

        self.events.stage_started(Stage::ReadingHistory);
        let history = self
            .sales_history()
            .await
            .map_err(at(Stage::ReadingHistory))?;
        self.events.stage_completed(Stage::ReadingHistory);

        self.events.stage_started(Stage::ComputingForecast);
        let forecast = forecast::forecast(&history, self.config.uplift())
            .map_err(at(Stage::ComputingForecast))?;
        debug!(%forecast, "Forecast computed");
        self.events.forecast_computed(&forecast);
        self.events.stage_completed(Stage::ComputingForecast);

        self.append(Stage::PersistingForecast, Table::Stock, forecast.values()).await?;

        info!(%sales, %surplus, %forecast, "Pipeline run complete");
        Ok(RunSummary {
            sales,
            surplus,
            forecast,
        })
    }

    /// Asks for input until it validates, the operator cancels, or
    /// `max_attempts` runs out.
    async fn await_input<I>(&self, input: &mut I) -> Result<SalesRecord, PipelineError>
    where
        I: InputSource + ?Sized,
    {
        self.events.stage_started(Stage::AwaitingInput);
        let prompt = self.config.prompt();
        let expected = self.config.item_count();
        let mut attempts: u32 = 0;

        loop {
            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    warn!(attempts, "Giving up on input");
                    return Err(PipelineError::AttemptsExhausted { attempts });
                }
            }
            attempts += 1;

            let line = match input.next_line(&prompt).await? {
                Some(line) => line,
                None => {
                    info!(attempts, "Input cancelled");
                    return Err(PipelineError::Cancelled);
                }
            };

            match validate_line(&line, expected) {
                Ok(sales) => {
                    debug!(%sales, attempts, "Input accepted");
                    self.events.input_accepted(&sales);
                    self.events.stage_completed(Stage::AwaitingInput);
                    return Ok(sales);
                }
                Err(err) => {
                    debug!(error = %err, attempts, "Input rejected");
                    self.events.input_rejected(attempts, &err);
                }
            }
        }
    }

    async fn append(
        &self,
        stage: Stage,
        table: Table,
        values: &[i64],
    ) -> Result<(), PipelineError> {
        self.events.stage_started(stage);
        debug!(%table, ?values, "Appending row");
        self.store
            .append_row(table, values)
            .await
            .map_err(at(stage))?;
        self.events.stage_completed(stage);
        Ok(())
    }

    /// Reads the most recent stock row.
    ///
    /// ## Errors
    /// [`CoreError::MissingStock`] when the stock table is empty.
    pub async fn latest_stock(&self) -> Result<StockRecord, CoreError> {
        let rows = self.store.get_all_rows(Table::Stock).await?;
        let last = rows.last().ok_or(CoreError::MissingStock)?;
        Ok(StockRecord::new(parse_row(Table::Stock, last)?))
    }

    /// Reads the trailing W values of every sales column.
    ///
    /// Short columns are kept short; nothing is padded.
    pub async fn sales_history(&self) -> Result<SalesHistoryWindow, CoreError> {
        let mut columns = Vec::with_capacity(self.config.item_count());
        for index in 1..=self.config.item_count() {
            let cells = self.store.get_column(Table::Sales, index).await?;
            columns.push(parse_column(Table::Sales, index, &cells)?);
        }
        Ok(SalesHistoryWindow::trailing(columns, self.config.window))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
