//! Batch import orchestrator.
//!
//! This module provides the [`ApiImporter`] coordinator that drives a batch
//! of API descriptions through fetch and build with:
//! - Strictly sequential, input-order processing on one worker
//! - Per-item failure isolation and an aggregated error report
//! - Cooperative cancellation via `tokio_util`'s `CancellationToken`,
//!   checked at item boundaries
//! - Guaranteed completion signaling on the progress sink via RAII

use std::fmt;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::import::builder::{self, BuildError};
use crate::model::ApiDescription;
use crate::traits::{ApiReader, FetchError, ProgressSink, ServiceContainer};

/// Trailer appended once to a non-empty error report, pointing the user at
/// a durable feedback channel.
pub const ERROR_REPORT_TAIL: &str =
    "You can search for known problems or report new ones at \
     https://github.com/aws-tools/gateway-importer/issues.";

// ============================================================================
// Importer Errors
// ============================================================================

/// Invalid invocation, detected before any item is processed.
#[derive(Error, Debug)]
pub enum StartError {
    /// The reader has no region configured; endpoints cannot be derived
    #[error("the reader has no region configured; service endpoints cannot be derived")]
    MissingRegion,
}

/// Failure of a single batch item.
///
/// Always recovered locally: logged, folded into the report, never
/// propagated out of a run.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

// ============================================================================
// Import Report
// ============================================================================

/// One failed API in a batch.
#[derive(Debug, Clone)]
pub struct ImportFailure {
    pub api_name: String,
    pub message: String,
}

impl fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.api_name, self.message)
    }
}

/// Outcome of one import run.
///
/// `services` preserves the input order of the successfully processed
/// descriptions; `failures` preserves processing order. Both are plain
/// values owned by the caller once the run has reached a terminal state.
#[derive(Debug)]
pub struct ImportReport<S> {
    pub services: Vec<S>,
    pub failures: Vec<ImportFailure>,
    /// Whether the run was stopped by a cancellation signal
    pub cancelled: bool,
}

impl<S> ImportReport<S> {
    /// Whether every item was processed and none failed.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }

    /// Renders the aggregated, user-visible error report.
    ///
    /// One `"{api}: {message}"` line per failure, followed by
    /// [`ERROR_REPORT_TAIL`]. Returns `None` for a failure-free run and for
    /// a cancelled run: cancellation is not a failure, so nothing is
    /// surfaced even if some items had already failed before the cancel
    /// point.
    pub fn error_summary(&self) -> Option<String> {
        if self.cancelled || self.failures.is_empty() {
            return None;
        }

        let mut report = String::new();
        for failure in &self.failures {
            report.push_str(&failure.to_string());
            report.push('\n');
        }
        report.push_str(ERROR_REPORT_TAIL);
        Some(report)
    }
}

// ============================================================================
// Progress Scope
// ============================================================================

/// Scoped completion signal for a progress sink.
///
/// Guarantees `completed(..)` fires exactly once on every exit path: either
/// explicitly via [`finish`](Self::finish), or with `success = false` from
/// `Drop` if the run unwinds without finishing.
struct ProgressScope<'a, P: ProgressSink> {
    sink: &'a P,
    finished: bool,
}

impl<'a, P: ProgressSink> ProgressScope<'a, P> {
    fn new(sink: &'a P) -> Self {
        Self {
            sink,
            finished: false,
        }
    }

    fn finish(mut self, success: bool) {
        self.finished = true;
        self.sink.completed(success);
    }
}

impl<P: ProgressSink> Drop for ProgressScope<'_, P> {
    fn drop(&mut self) {
        if !self.finished {
            self.sink.completed(false);
        }
    }
}

// ============================================================================
// Importer
// ============================================================================

/// Imports a batch of described APIs into a target container.
///
/// The importer processes descriptions strictly sequentially: the container
/// is mutated by a single writer for the whole run, and an item either fully
/// fetches and builds or fails as a unit. A run moves
/// `Idle -> Running -> {Completed, Cancelled}`; [`run`](Self::run) consumes
/// the importer, so a terminal instance cannot be reused.
///
/// # Example
///
/// ```ignore
/// use gateway_importer::{ApiImporter, InMemoryContainer, NullProgress};
/// use tokio_util::sync::CancellationToken;
///
/// let importer = ApiImporter::new(reader, NullProgress);
/// let mut container = InMemoryContainer::new();
/// let cancel = CancellationToken::new();
///
/// let report = importer.run(&descriptions, &mut container, &cancel).await?;
/// if let Some(message) = report.error_summary() {
///     eprintln!("{message}");
/// }
/// ```
pub struct ApiImporter<R, P> {
    reader: R,
    progress: P,
}

impl<R, P> ApiImporter<R, P>
where
    R: ApiReader,
    P: ProgressSink,
{
    pub fn new(reader: R, progress: P) -> Self {
        Self { reader, progress }
    }

    /// Runs the import to a terminal state.
    ///
    /// Items are processed in input order; a fetch or build failure is
    /// recorded in the report and processing continues with the next
    /// description. The cancellation token is polled at every item boundary:
    /// once cancelled, completed items remain in the report and the rest of
    /// the batch is dropped silently.
    ///
    /// # Errors
    ///
    /// Returns [`StartError`] only for an invalid invocation, before any
    /// item is processed. Per-item failures never surface here.
    #[instrument(skip_all, fields(total = descriptions.len()))]
    pub async fn run<C>(
        self,
        descriptions: &[ApiDescription],
        container: &mut C,
        cancel: &CancellationToken,
    ) -> Result<ImportReport<C::Service>, StartError>
    where
        C: ServiceContainer,
    {
        if self.reader.region().trim().is_empty() {
            return Err(StartError::MissingRegion);
        }

        let total = descriptions.len();
        info!(total, "starting API import");

        let scope = ProgressScope::new(&self.progress);
        let mut services = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut cancelled = false;

        for (index, description) in descriptions.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(done = index, total, "import cancelled");
                cancelled = true;
                break;
            }

            match self.import_one(description, container).await {
                Ok(service) => services.push(service),
                Err(err) => {
                    error!(api = %description.name, error = %err, "API import failed");
                    failures.push(ImportFailure {
                        api_name: description.name.clone(),
                        message: err.to_string(),
                    });
                }
            }

            self.progress.progress(index + 1, total);
        }

        let success = !cancelled && failures.is_empty();
        scope.finish(success);

        info!(
            imported = services.len(),
            failed = failures.len(),
            cancelled,
            "import finished"
        );

        Ok(ImportReport {
            services,
            failures,
            cancelled,
        })
    }

    /// Fetches and builds one described API as an atomic unit.
    async fn import_one<C>(
        &self,
        description: &ApiDescription,
        container: &mut C,
    ) -> Result<C::Service, ItemError>
    where
        C: ServiceContainer,
    {
        let api = self.reader.fetch(description).await?;
        let plan = builder::plan_service(&api, self.reader.region());
        Ok(builder::commit(&plan, container)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::memory::InMemoryContainer;
    use crate::model::{Api, HttpMethod, HttpResource};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    fn init_tracing() {
        use tracing_subscriber::EnvFilter;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    // Reader returning a small fixed tree per description; ids listed in
    // `fail` produce a fetch error, and fetching `cancel_on` cancels the
    // associated token mid-item.
    struct ScriptedReader {
        region: String,
        fail: HashSet<String>,
        cancel_on: Option<(String, CancellationToken)>,
    }

    impl ScriptedReader {
        fn new(region: &str) -> Self {
            Self {
                region: region.to_string(),
                fail: HashSet::new(),
                cancel_on: None,
            }
        }

        fn failing_on(mut self, id: &str) -> Self {
            self.fail.insert(id.to_string());
            self
        }

        fn cancelling_on(mut self, id: &str, token: CancellationToken) -> Self {
            self.cancel_on = Some((id.to_string(), token));
            self
        }
    }

    #[async_trait]
    impl ApiReader for ScriptedReader {
        fn region(&self) -> &str {
            &self.region
        }

        async fn fetch(&self, description: &ApiDescription) -> Result<Api, FetchError> {
            if let Some((id, token)) = &self.cancel_on {
                if *id == description.id {
                    token.cancel();
                }
            }

            if self.fail.contains(&description.id) {
                return Err(FetchError::UnavailableHost(format!(
                    "aws.{}",
                    description.id
                )));
            }

            Ok(Api {
                id: description.id.clone(),
                name: description.name.clone(),
                description: String::new(),
                base_url: "/v1".to_string(),
                stage: None,
                root_resource: HttpResource {
                    name: "/".to_string(),
                    path: "/".to_string(),
                    methods: Vec::new(),
                    resources: vec![HttpResource {
                        name: "pets".to_string(),
                        path: "pets".to_string(),
                        methods: vec![HttpMethod {
                            name: "GET".to_string(),
                            http_method: "GET".to_string(),
                            parameters: Vec::new(),
                        }],
                        resources: Vec::new(),
                    }],
                },
            })
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        steps: Mutex<Vec<(usize, usize)>>,
        completed: Mutex<Option<bool>>,
    }

    impl ProgressSink for RecordingProgress {
        fn progress(&self, current: usize, total: usize) {
            self.steps.lock().unwrap().push((current, total));
        }

        fn completed(&self, success: bool) {
            *self.completed.lock().unwrap() = Some(success);
        }
    }

    fn descriptions(names: &[&str]) -> Vec<ApiDescription> {
        names
            .iter()
            .map(|name| ApiDescription {
                id: name.to_lowercase(),
                name: name.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_all_successes_preserve_input_order() {
        let importer = ApiImporter::new(ScriptedReader::new("eu-west-1"), crate::NullProgress);
        let mut container = InMemoryContainer::new();
        let cancel = CancellationToken::new();

        let report = importer
            .run(&descriptions(&["Alpha", "Beta", "Gamma"]), &mut container, &cancel)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.services.len(), 3);
        assert!(report.error_summary().is_none());

        let names: Vec<_> = container
            .services()
            .iter()
            .map(|service| service.name.clone())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn test_failing_item_is_isolated() {
        init_tracing();

        let reader = ScriptedReader::new("eu-west-1").failing_on("beta");
        let importer = ApiImporter::new(reader, crate::NullProgress);
        let mut container = InMemoryContainer::new();
        let cancel = CancellationToken::new();

        let report = importer
            .run(&descriptions(&["Alpha", "Beta", "Gamma"]), &mut container, &cancel)
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.services.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].api_name, "Beta");

        let names: Vec<_> = container
            .services()
            .iter()
            .map(|service| service.name.clone())
            .collect();
        assert_eq!(names, vec!["Alpha", "Gamma"]);
    }

    #[tokio::test]
    async fn test_error_summary_format() {
        let reader = ScriptedReader::new("eu-west-1").failing_on("beta");
        let importer = ApiImporter::new(reader, crate::NullProgress);
        let mut container = InMemoryContainer::new();
        let cancel = CancellationToken::new();

        let report = importer
            .run(&descriptions(&["Alpha", "Beta"]), &mut container, &cancel)
            .await
            .unwrap();

        let summary = report.error_summary().unwrap();
        let mut lines = summary.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Beta: the \"aws.beta\" host is unavailable or invalid"
        );
        assert_eq!(lines.next().unwrap(), ERROR_REPORT_TAIL);
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn test_build_failure_is_reported_like_fetch_failure() {
        // A service named "Alpha" already exists, so the build (not the
        // fetch) of the first item is rejected.
        let importer = ApiImporter::new(ScriptedReader::new("eu-west-1"), crate::NullProgress);
        let mut container = InMemoryContainer::new();
        container.create_service("Alpha", "", "/").unwrap();
        let cancel = CancellationToken::new();

        let report = importer
            .run(&descriptions(&["Alpha", "Beta"]), &mut container, &cancel)
            .await
            .unwrap();

        assert_eq!(report.services.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].api_name, "Alpha");
        assert!(report.failures[0].message.contains("already exists"));
    }

    #[tokio::test]
    async fn test_cancellation_stops_at_item_boundary() {
        let cancel = CancellationToken::new();
        let reader =
            ScriptedReader::new("eu-west-1").cancelling_on("beta", cancel.clone());
        let importer = ApiImporter::new(reader, crate::NullProgress);
        let mut container = InMemoryContainer::new();

        let report = importer
            .run(&descriptions(&["Alpha", "Beta", "Gamma"]), &mut container, &cancel)
            .await
            .unwrap();

        // The item whose fetch raised the signal still completes; Gamma is
        // dropped silently.
        assert!(report.cancelled);
        assert_eq!(report.services.len(), 2);
        assert_eq!(container.services().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_surfaces_no_error_report() {
        let cancel = CancellationToken::new();
        let reader = ScriptedReader::new("eu-west-1")
            .failing_on("alpha")
            .cancelling_on("beta", cancel.clone());
        let importer = ApiImporter::new(reader, crate::NullProgress);
        let mut container = InMemoryContainer::new();

        let report = importer
            .run(&descriptions(&["Alpha", "Beta", "Gamma"]), &mut container, &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.failures.len(), 1);
        assert!(report.error_summary().is_none());
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_processes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let progress = Arc::new(RecordingProgress::default());
        let importer =
            ApiImporter::new(ScriptedReader::new("eu-west-1"), Arc::clone(&progress));
        let mut container = InMemoryContainer::new();

        let report = importer
            .run(&descriptions(&["Alpha"]), &mut container, &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.services.is_empty());
        assert!(container.services().is_empty());

        // The progress resource is still released on the cancelled path.
        assert!(progress.steps.lock().unwrap().is_empty());
        assert_eq!(*progress.completed.lock().unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_progress_reported_after_each_item() {
        let progress = Arc::new(RecordingProgress::default());
        let reader = ScriptedReader::new("eu-west-1").failing_on("beta");
        let importer = ApiImporter::new(reader, Arc::clone(&progress));
        let mut container = InMemoryContainer::new();
        let cancel = CancellationToken::new();

        importer
            .run(&descriptions(&["Alpha", "Beta", "Gamma"]), &mut container, &cancel)
            .await
            .unwrap();

        // Failed items report progress too.
        assert_eq!(*progress.steps.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(*progress.completed.lock().unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_clean_run_completes_successfully() {
        let progress = Arc::new(RecordingProgress::default());
        let importer =
            ApiImporter::new(ScriptedReader::new("eu-west-1"), Arc::clone(&progress));
        let mut container = InMemoryContainer::new();
        let cancel = CancellationToken::new();

        let report = importer
            .run(&descriptions(&["Alpha", "Beta"]), &mut container, &cancel)
            .await
            .unwrap();

        assert!(report.is_success());
        assert!(report.error_summary().is_none());
        assert_eq!(*progress.completed.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_quiet_success() {
        let importer = ApiImporter::new(ScriptedReader::new("eu-west-1"), crate::NullProgress);
        let mut container = InMemoryContainer::new();
        let cancel = CancellationToken::new();

        let report = importer.run(&[], &mut container, &cancel).await.unwrap();

        assert!(report.is_success());
        assert!(report.services.is_empty());
        assert!(report.error_summary().is_none());
    }

    #[tokio::test]
    async fn test_missing_region_fails_before_processing() {
        let importer = ApiImporter::new(ScriptedReader::new("  "), crate::NullProgress);
        let mut container = InMemoryContainer::new();
        let cancel = CancellationToken::new();

        let err = importer
            .run(&descriptions(&["Alpha"]), &mut container, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, StartError::MissingRegion));
        assert!(container.services().is_empty());
    }

    #[tokio::test]
    async fn test_pets_scenario() {
        let importer = ApiImporter::new(ScriptedReader::new("eu-west-1"), crate::NullProgress);
        let mut container = InMemoryContainer::new();
        let cancel = CancellationToken::new();

        let input = vec![ApiDescription {
            id: "api1".to_string(),
            name: "Pets".to_string(),
        }];
        let report = importer.run(&input, &mut container, &cancel).await.unwrap();

        assert_eq!(report.services.len(), 1);

        let service = &container.services()[0];
        assert_eq!(service.name, "Pets");
        assert_eq!(
            service.endpoints,
            vec!["https://api1.execute-api.eu-west-1.amazonaws.com".to_string()]
        );

        assert_eq!(service.base_path, "/v1");

        let root = &service.resources[0];
        assert_eq!(root.name, "root");
        assert_eq!(root.children.len(), 1);

        let pets = &root.children[0];
        assert_eq!(pets.name, "pets");
        assert_eq!(pets.methods.len(), 1);
        assert_eq!(pets.methods[0].verb, "GET");
        assert_eq!(pets.methods[0].requests.len(), 1);
    }
}
