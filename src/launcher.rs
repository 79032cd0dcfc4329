//! Launcher: ties normalisation, strategy, command building and the runner
//! together, and walks fallback candidates until one of them opens.

use crate::apps;
use crate::browser::{BrowserDetector, SystemBrowserDetector};
use crate::error::{AggregateError, OpenError, Result};
use crate::options::{self, AppName, Attempts, LaunchRequest, OpenOptions};
use crate::plan::{self, PlatformPlan};
use crate::platform::wsl::{self, PathConverter, Wslpath};
use crate::platform::{Environment, Strategy};
use crate::runner::{self, LaunchedProcess};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens targets on one host environment.
///
/// Cheap to build; [`Launcher::new`] probes the running host.
#[derive(Clone)]
pub struct Launcher {
    env: Environment,
    strategy: Strategy,
    opener: PathBuf,
    detector: Arc<dyn BrowserDetector>,
    converter: Arc<dyn PathConverter>,
}

impl Launcher {
    pub fn new() -> Self {
        Self::with_environment(Environment::detect())
    }

    /// Launcher for an explicit environment.
    pub fn with_environment(env: Environment) -> Self {
        let strategy = Strategy::select(&env);
        let opener = plan::posix_opener(&env, None);
        let detector = Arc::new(SystemBrowserDetector::new(&env));
        debug!("[Launcher] Using {} strategy", strategy.name());
        Self {
            env,
            strategy,
            opener,
            detector,
            converter: Arc::new(Wslpath),
        }
    }

    /// Use `opener` instead of `xdg-open` when no app is named on POSIX.
    pub fn with_opener(mut self, opener: Option<&Path>) -> Self {
        self.opener = plan::posix_opener(&self.env, opener);
        self
    }

    pub fn with_browser_detector(mut self, detector: Arc<dyn BrowserDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_path_converter(mut self, converter: Arc<dyn PathConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Plan for one request, without spawning anything.
    pub fn plan(&self, request: &LaunchRequest) -> PlatformPlan {
        plan::build(&self.strategy, request, &self.opener)
    }

    /// Open `target` (URL, file or executable).
    ///
    /// `Ok(None)` only when `options.app` is an empty list: nothing is tried.
    /// When every app of a list (or every name of [`AppName::Candidates`])
    /// fails, the error is [`OpenError::Aggregate`], even for a single entry.
    pub async fn open(
        &self,
        target: &str,
        options: &OpenOptions,
    ) -> Result<Option<LaunchedProcess>> {
        let attempts = options::normalize_open(target, options)?;
        self.launch_all(attempts).await
    }

    /// Open an app by name, without a target.
    pub async fn open_app(
        &self,
        name: impl Into<AppName>,
        options: &OpenOptions,
    ) -> Result<Option<LaunchedProcess>> {
        let attempts = options::normalize_open_app(name.into(), options)?;
        self.launch_all(attempts).await
    }

    async fn launch_all(&self, attempts: Attempts) -> Result<Option<LaunchedProcess>> {
        if attempts.requests.is_empty() {
            debug!("[Launcher] Empty app list, nothing to open");
        }
        first_success(attempts.requests, attempts.fallback, |request| {
            self.launch(request)
        })
        .await
    }

    async fn launch(&self, request: LaunchRequest) -> Result<LaunchedProcess> {
        let attempts = self.expand_default_browser(request).await?;
        first_success(attempts.requests, attempts.fallback, |request| {
            self.launch_resolved(request)
        })
        .await?
        .ok_or_else(|| OpenError::invalid("default browser resolved to no app"))
    }

    /// Replace a default-browser marker with the detected default browser.
    async fn expand_default_browser(&self, request: LaunchRequest) -> Result<Attempts> {
        let Some(private) = request.default_browser else {
            return Ok(Attempts {
                requests: vec![request],
                fallback: false,
            });
        };

        let detector = Arc::clone(&self.detector);
        let browser = tokio::task::spawn_blocking(move || detector.detect())
            .await
            .map_err(std::io::Error::other)??;
        let (name, extra) = apps::resolve_default_browser(&browser, private, &self.env)?;
        info!("[Launcher] Default browser {} -> {:?}", browser.name, name);

        let requests = name
            .names()
            .into_iter()
            .map(|app| {
                let mut arguments = request.arguments.clone();
                arguments.extend(extra.iter().cloned());
                LaunchRequest {
                    app: Some(app.to_string()),
                    default_browser: None,
                    arguments,
                    ..request.clone()
                }
            })
            .collect();
        Ok(Attempts {
            requests,
            fallback: matches!(name, AppName::Candidates(_)),
        })
    }

    async fn launch_resolved(&self, mut request: LaunchRequest) -> Result<LaunchedProcess> {
        if let Strategy::Windows { wsl: true, .. } = self.strategy {
            if let Some(app) = &request.app {
                if wsl::is_mounted_windows_path(app, &self.env.wsl_mount_point) {
                    let converter = Arc::clone(&self.converter);
                    let path = PathBuf::from(app);
                    let converted =
                        tokio::task::spawn_blocking(move || converter.to_windows_path(&path))
                            .await
                            .map_err(std::io::Error::other)??;
                    request.app = Some(converted);
                }
            }
        }

        let plan = self.plan(&request);
        debug!("[Launcher] {} {:?}", plan.program(), plan.args);
        runner::run(&plan).await
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Try `candidates` in order and stop at the first success.
///
/// No candidates: `Ok(None)`. With `fallback`, failures always come back as an
/// [`AggregateError`] holding every error in order. Without it, a lone failure
/// is returned as is.
pub async fn first_success<I, T, F, Fut>(
    candidates: I,
    fallback: bool,
    mut attempt: F,
) -> Result<Option<T>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut errors = Vec::new();
    for candidate in candidates {
        match attempt(candidate).await {
            Ok(value) => return Ok(Some(value)),
            Err(err) => {
                warn!("[Launcher] Candidate {} failed: {}", errors.len() + 1, err);
                errors.push(err);
            }
        }
    }

    match errors.len() {
        0 => Ok(None),
        1 if !fallback => Err(errors.remove(0)),
        _ => Err(AggregateError::new(errors).into()),
    }
}
