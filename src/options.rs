//! Open options and their normalisation.
//!
//! Caller input (`target` + [`OpenOptions`]) is turned into an ordered list of
//! [`LaunchRequest`]s, one per app candidate. Array-valued app names and app
//! lists are flattened depth-first, left to right.

use crate::apps::{self, AppKey};
use crate::error::{OpenError, Result};
use serde::{Deserialize, Serialize};

/// Name of an app: one binary, or several candidate binaries for the same app
/// (distro variants, per-arch install paths).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppName {
    One(String),
    Candidates(Vec<String>),
    /// The system default browser, detected at launch time. Only the
    /// `browser`/`browserPrivate` registry keys produce it, so a binary that
    /// happens to be called `browser` is still launched as-is.
    DefaultBrowser { private: bool },
}

impl AppName {
    /// Candidate names in order. Empty for [`AppName::DefaultBrowser`].
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Candidates(names) => names.iter().map(String::as_str).collect(),
            Self::DefaultBrowser { .. } => Vec::new(),
        }
    }
}

impl From<&str> for AppName {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for AppName {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for AppName {
    fn from(names: Vec<String>) -> Self {
        Self::Candidates(names)
    }
}

impl From<&[&str]> for AppName {
    fn from(names: &[&str]) -> Self {
        Self::Candidates(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Which application to use, and with what extra arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSpec {
    pub name: AppName,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl AppSpec {
    pub fn new(name: impl Into<AppName>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// `["google chrome", "--incognito"]` shorthand: the first element is the
    /// app, the rest are its arguments.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Result<Self> {
        let (name, rest) = argv
            .split_first()
            .ok_or_else(|| OpenError::invalid("app argv must contain at least the app name"))?;
        Ok(Self::new(name.as_ref()).with_arguments(rest.iter().map(|s| s.as_ref().to_string())))
    }

    /// Spec for a registry app (`chrome`, `firefox`, ...) on the current platform.
    pub fn from_registry(key: AppKey) -> Result<Self> {
        Ok(Self::new(apps::resolve(key)?))
    }

    /// Registry keys resolve through the registry; anything else is taken as
    /// a binary name.
    pub fn lookup(app: &str) -> Result<Self> {
        match app.parse::<AppKey>() {
            Ok(key) => Self::from_registry(key),
            Err(_) => Ok(Self::new(app)),
        }
    }
}

/// A single app or an ordered list of apps to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSelection {
    Single(AppSpec),
    List(Vec<AppSpec>),
}

impl From<AppSpec> for AppSelection {
    fn from(spec: AppSpec) -> Self {
        Self::Single(spec)
    }
}

impl From<Vec<AppSpec>> for AppSelection {
    fn from(specs: Vec<AppSpec>) -> Self {
        Self::List(specs)
    }
}

/// Options accepted by [`crate::open`] and [`crate::open_app`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Wait for the opened app to exit
    pub wait: bool,
    /// macOS only: do not bring the app to the foreground
    pub background: bool,
    /// Open a new instance even if one is already running
    pub new_instance: bool,
    /// With `wait`, treat a nonzero exit code as success
    pub allow_nonzero_exit_code: bool,
    /// App(s) to open the target with
    pub app: Option<AppSelection>,
    /// Encode the target as a URL before dispatch
    pub url: bool,
    /// Arguments for `open_app` (the app name comes from the call itself)
    pub app_arguments: Vec<String>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn new_instance(mut self, new_instance: bool) -> Self {
        self.new_instance = new_instance;
        self
    }

    pub fn allow_nonzero_exit_code(mut self, allow: bool) -> Self {
        self.allow_nonzero_exit_code = allow;
        self
    }

    pub fn app(mut self, app: impl Into<AppSelection>) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn url(mut self, url: bool) -> Self {
        self.url = url;
        self
    }

    pub fn app_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.app_arguments = arguments.into_iter().map(Into::into).collect();
        self
    }
}

/// One fully-normalised launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// `None` for `open_app` calls
    pub target: Option<String>,
    /// `None` means "the system opener decides"
    pub app: Option<String>,
    /// `Some(private)`: replace the app with the detected default browser
    pub default_browser: Option<bool>,
    pub arguments: Vec<String>,
    pub wait: bool,
    pub background: bool,
    pub new_instance: bool,
    pub allow_nonzero_exit_code: bool,
}

/// Normalised launch attempts, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempts {
    pub requests: Vec<LaunchRequest>,
    /// The caller gave an app list or candidate names. A failed fallback
    /// sequence always ends in an aggregate error, whatever its length.
    pub fallback: bool,
}

/// Normalise an `open(target, options)` call.
///
/// An explicitly empty app list yields no requests at all, which callers
/// treat as a no-op.
pub fn normalize_open(target: &str, options: &OpenOptions) -> Result<Attempts> {
    if target.is_empty() {
        return Err(OpenError::invalid("expected a non-empty `target`"));
    }
    check_arg("target", target)?;

    let target = if options.url {
        encode_url(target)?
    } else {
        target.to_string()
    };

    expand(Some(target), options.app.as_ref(), options)
}

/// Normalise an `open_app(name, options)` call. `options.app` is ignored.
pub fn normalize_open_app(name: AppName, options: &OpenOptions) -> Result<Attempts> {
    if name.names().iter().any(|n| n.is_empty()) {
        return Err(OpenError::invalid("expected a non-empty app `name`"));
    }
    let spec = AppSpec {
        name,
        arguments: options.app_arguments.clone(),
    };
    expand(None, Some(&AppSelection::Single(spec)), options)
}

fn expand(
    target: Option<String>,
    app: Option<&AppSelection>,
    options: &OpenOptions,
) -> Result<Attempts> {
    let request = |app: Option<&str>, default_browser: Option<bool>, arguments: &[String]| {
        LaunchRequest {
            target: target.clone(),
            app: app.map(str::to_string),
            default_browser,
            arguments: arguments.to_vec(),
            wait: options.wait,
            background: options.background,
            new_instance: options.new_instance,
            allow_nonzero_exit_code: options.allow_nonzero_exit_code,
        }
    };

    let (specs, mut fallback): (Vec<&AppSpec>, bool) = match app {
        None => {
            return Ok(Attempts {
                requests: vec![request(None, None, &[])],
                fallback: false,
            })
        }
        Some(AppSelection::Single(spec)) => (vec![spec], false),
        Some(AppSelection::List(specs)) => (specs.iter().collect(), true),
    };

    let mut requests = Vec::new();
    for spec in specs {
        for arg in &spec.arguments {
            check_arg("app argument", arg)?;
        }
        if let AppName::DefaultBrowser { private } = spec.name {
            requests.push(request(None, Some(private), &spec.arguments));
            continue;
        }
        fallback |= matches!(spec.name, AppName::Candidates(_));
        for name in spec.name.names() {
            if name.is_empty() {
                return Err(OpenError::invalid("app name must not be empty"));
            }
            check_arg("app name", name)?;
            requests.push(request(Some(name), None, &spec.arguments));
        }
    }
    Ok(Attempts { requests, fallback })
}

fn check_arg(what: &str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(OpenError::invalid(format!(
            "{} contains a NUL byte: {:?}",
            what, value
        )));
    }
    Ok(())
}

fn encode_url(target: &str) -> Result<String> {
    url::Url::parse(target)
        .map(|url| url.to_string())
        .map_err(|e| OpenError::invalid(format!("`{}` is not a valid URL: {}", target, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_target_is_rejected() {
        let err = normalize_open("", &OpenOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
    }

    #[test]
    fn test_defaults_give_single_opener_request() {
        let attempts = normalize_open("https://example.com", &OpenOptions::default()).unwrap();
        assert!(!attempts.fallback);
        let requests = attempts.requests;
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.target.as_deref(), Some("https://example.com"));
        assert!(req.app.is_none());
        assert!(!req.wait && !req.background && !req.new_instance);
        assert!(!req.allow_nonzero_exit_code);
    }

    #[test]
    fn test_candidate_names_flatten_depth_first() {
        let options = OpenOptions::new().app(vec![
            AppSpec::new(AppName::from(&["a1", "a2"][..])).with_arguments(["--x"]),
            AppSpec::new("b"),
        ]);
        let requests = normalize_open("file.txt", &options).unwrap().requests;
        let apps: Vec<_> = requests.iter().map(|r| r.app.as_deref().unwrap()).collect();
        assert_eq!(apps, ["a1", "a2", "b"]);
        assert_eq!(requests[1].arguments, ["--x"]);
        assert!(requests[2].arguments.is_empty());
    }

    #[test]
    fn test_empty_app_list_yields_no_requests() {
        let options = OpenOptions::new().app(Vec::<AppSpec>::new());
        assert!(normalize_open("x", &options).unwrap().requests.is_empty());
    }

    #[test]
    fn test_app_lists_and_candidate_names_are_fallbacks() {
        let single = OpenOptions::new().app(AppSpec::new("a"));
        assert!(!normalize_open("x", &single).unwrap().fallback);

        let one_element_list = OpenOptions::new().app(vec![AppSpec::new("a")]);
        let attempts = normalize_open("x", &one_element_list).unwrap();
        assert_eq!(attempts.requests.len(), 1);
        assert!(attempts.fallback);

        let one_candidate = OpenOptions::new().app(AppSpec::new(vec!["a".to_string()]));
        assert!(normalize_open("x", &one_candidate).unwrap().fallback);
    }

    #[test]
    fn test_default_browser_is_a_typed_marker() {
        let marker =
            OpenOptions::new().app(AppSpec::new(AppName::DefaultBrowser { private: true }));
        let request = normalize_open("x", &marker).unwrap().requests.remove(0);
        assert_eq!(request.default_browser, Some(true));
        assert!(request.app.is_none());

        // A binary that is merely named like the key stays a binary
        let named = OpenOptions::new().app(AppSpec::new("browser"));
        let request = normalize_open("x", &named).unwrap().requests.remove(0);
        assert_eq!(request.default_browser, None);
        assert_eq!(request.app.as_deref(), Some("browser"));
    }

    #[test]
    fn test_lookup_resolves_registry_keys_only() {
        assert_eq!(
            AppSpec::lookup("browserPrivate").unwrap().name,
            AppName::DefaultBrowser { private: true }
        );
        assert_eq!(
            AppSpec::lookup("my-viewer").unwrap().name,
            AppName::One("my-viewer".to_string())
        );
    }

    #[test]
    fn test_nul_in_app_argument_is_rejected() {
        let options = OpenOptions::new().app(AppSpec::new("foo").with_arguments(["a\0b"]));
        let err = normalize_open("x", &options).unwrap_err();
        assert!(matches!(err, OpenError::InvalidArgument(_)));
    }

    #[test]
    fn test_url_option_percent_encodes() {
        let options = OpenOptions::new().url(true);
        let requests = normalize_open("https://example.com/a b?q=ü", &options)
            .unwrap()
            .requests;
        assert_eq!(
            requests[0].target.as_deref(),
            Some("https://example.com/a%20b?q=%C3%BC")
        );

        let err = normalize_open("not a url", &options).unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
    }

    #[test]
    fn test_from_argv_splits_name_and_arguments() {
        let spec = AppSpec::from_argv(&["google chrome", "--incognito"]).unwrap();
        assert_eq!(spec.name, AppName::One("google chrome".to_string()));
        assert_eq!(spec.arguments, ["--incognito"]);
        assert!(AppSpec::from_argv::<&str>(&[]).is_err());
    }

    #[test]
    fn test_open_app_has_no_target_and_uses_app_arguments() {
        let options = OpenOptions::new()
            .app_arguments(["--incognito"])
            .app(AppSpec::new("ignored"));
        let requests = normalize_open_app("brave".into(), &options).unwrap().requests;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].target.is_none());
        assert_eq!(requests[0].app.as_deref(), Some("brave"));
        assert_eq!(requests[0].arguments, ["--incognito"]);

        assert!(normalize_open_app("".into(), &options).is_err());
    }
}
