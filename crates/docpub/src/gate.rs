use docpub_environment::CiContext;

/// Which toolchain channel a policy accepts.
///
/// Matching is substring-based against the raw version string, exactly as
/// the CI reports it (`1.42.0-nightly`, `nightly`, `rustc 1.42.0 (…)`).
/// Callers configuring [`ChannelRule::Channel`] must pick a name that is an
/// unambiguous substring of the channel encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRule {
    /// Accept only stable toolchains: the version string contains neither
    /// `beta` nor `nightly`.
    Stable,
    /// Accept version strings containing the given channel name.
    Channel(String),
}

impl ChannelRule {
    pub fn matches(&self, version: &str) -> bool {
        match self {
            ChannelRule::Stable => !version.contains("beta") && !version.contains("nightly"),
            ChannelRule::Channel(name) => version.contains(name.as_str()),
        }
    }
}

/// The configurable gate: which builds are allowed to publish docs.
///
/// One structure covers every historical policy (stable-only on the default
/// branch, nightly-only, etc.) — the filters are always conjunctive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    pub channel: ChannelRule,
    /// The only branch whose builds publish.
    pub branch: String,
    /// Pull-request builds never publish unless this is set.
    pub allow_pull_requests: bool,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::stable("master")
    }
}

impl GatePolicy {
    /// Stable-only publishing from the given branch.
    pub fn stable(branch: impl Into<String>) -> Self {
        Self {
            channel: ChannelRule::Stable,
            branch: branch.into(),
            allow_pull_requests: false,
        }
    }

    /// Publish from the given branch when the version string contains
    /// `channel`.
    pub fn channel(channel: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            channel: ChannelRule::Channel(channel.into()),
            branch: branch.into(),
            allow_pull_requests: false,
        }
    }
}

/// Outcome of the gate. The reason is operator-facing only; nothing else
/// branches on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Publish,
    Skip { reason: String },
}

impl Decision {
    pub fn is_publish(&self) -> bool {
        matches!(self, Decision::Publish)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Publish => None,
            Decision::Skip { reason } => Some(reason),
        }
    }
}

/// Decide whether this build publishes documentation.
///
/// Pure function of the policy and the resolved context: filters are
/// evaluated channel → branch → pull-request, and the first failure
/// produces a `Skip` naming that filter.
pub fn evaluate(policy: &GatePolicy, ctx: &CiContext) -> Decision {
    if !policy.channel.matches(&ctx.toolchain_version) {
        let reason = match &policy.channel {
            ChannelRule::Stable => {
                format!("toolchain `{}` is not a stable release", ctx.toolchain_version)
            }
            ChannelRule::Channel(name) => format!(
                "toolchain `{}` does not match the `{name}` channel",
                ctx.toolchain_version
            ),
        };
        return Decision::Skip { reason };
    }

    if ctx.branch != policy.branch {
        return Decision::Skip {
            reason: format!(
                "branch `{}` is not the publish branch `{}`",
                ctx.branch, policy.branch
            ),
        };
    }

    if ctx.is_pull_request && !policy.allow_pull_requests {
        return Decision::Skip {
            reason: "build runs against a pull request".to_string(),
        };
    }

    Decision::Publish
}
