//! Semantic diff engine implementation.

use super::changes::{
    BooleanChangeComputer, LevelChangeComputer, RuleChangeComputer, RuleFamily, SymbolChangeComputer,
    UserChangeComputer,
};
use super::traits::ChangeComputer;
use super::{
    BooleanDiff, ChangeSet, ComponentDiff, DiffContext, DiffKind, DiffResult, DiffSelection, DiffWarning,
    LevelDiff, MembershipDelta, RuleDiff, TypeMap, UserDiff,
};
use crate::config::{DiffConfig, TypeRemapEntry, Validatable};
use crate::error::{FatalInputKind, PolicyDiffError, Result};
use crate::model::{PolicyQuery, SymbolKind};
use rayon::prelude::*;

/// Semantic diff engine for comparing two policies.
///
/// ```
/// use poldiff::DiffEngine;
/// use poldiff::model::Policy;
///
/// let original = Policy::builder().typ("a_t", &[]).build()?;
/// let modified = Policy::builder().typ("a_t", &[]).typ("b_t", &[]).build()?;
///
/// let result = DiffEngine::new().diff(&original, &modified)?;
/// let types = result.types.as_ref().expect("types are selected by default");
/// assert_eq!(types.added().count(), 1);
/// # Ok::<(), poldiff::PolicyDiffError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    /// Create a new diff engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a diff engine from a loaded configuration
    pub const fn from_config(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Restrict the run to the given kinds
    #[must_use]
    pub fn with_selection<I: IntoIterator<Item = DiffKind>>(mut self, kinds: I) -> Self {
        self.config.selection = kinds.into_iter().collect();
        self
    }

    /// Declare types that correspond across the two policies
    #[must_use]
    pub fn with_type_remap(mut self, entry: TypeRemapEntry) -> Self {
        self.config.type_remaps.push(entry);
        self
    }

    /// Enable or disable alias-based type matching
    #[must_use]
    pub const fn with_type_inference(mut self, enabled: bool) -> Self {
        self.config.infer_type_map = enabled;
        self
    }

    /// Enable or disable rules derived from attribute membership changes
    #[must_use]
    pub const fn with_derived_rules(mut self, enabled: bool) -> Self {
        self.config.derive_type_change_rules = enabled;
        self
    }

    /// Enable or disable parallel computation
    #[must_use]
    pub const fn with_parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    /// The configuration this engine runs with
    #[must_use]
    pub const fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compare two policies and return the diff result.
    ///
    /// Any fatal condition aborts the whole run; no partial result is
    /// returned. Recoverable problems end up in [`DiffResult::warnings`].
    pub fn diff(&self, original: &dyn PolicyQuery, modified: &dyn PolicyQuery) -> Result<DiffResult> {
        if let Some(error) = self.config.validate().into_iter().next() {
            return Err(PolicyDiffError::fatal(
                "validating configuration",
                FatalInputKind::InvalidTypeRemap {
                    reason: error.to_string(),
                },
            ));
        }

        let selection = self.config.selection();
        let mut result = DiffResult::new();
        if selection.is_empty() {
            tracing::debug!("empty selection, nothing to compare");
            result.calculate_summary();
            return Ok(result);
        }

        let mls = original.is_mls() || modified.is_mls();
        if !mls {
            check_mls_selection(selection)?;
        }

        let remaps: Vec<&TypeRemapEntry> = self.config.enabled_remaps().collect();
        let type_map = TypeMap::build(original, modified, &remaps, self.config.infer_type_map)?;
        let membership = MembershipDelta::build(original, modified, &type_map);
        let ctx = DiffContext {
            original,
            modified,
            type_map: &type_map,
            membership: &membership,
            derive_type_change_rules: self.config.derive_type_change_rules,
        };

        let jobs = plan(selection, mls);
        tracing::debug!(jobs = jobs.len(), parallel = self.config.parallel, "starting policy diff");

        let outputs: Vec<(JobOutput, Vec<DiffWarning>)> = if self.config.parallel {
            jobs.par_iter().map(|job| job.run(&ctx)).collect::<Result<_>>()?
        } else {
            jobs.iter().map(|job| job.run(&ctx)).collect::<Result<_>>()?
        };

        let mut warnings = Vec::new();
        for (output, job_warnings) in outputs {
            output.store(&mut result);
            warnings.extend(job_warnings);
        }
        warnings.sort();
        warnings.dedup();
        result.warnings = warnings;
        result.calculate_summary();

        tracing::info!(
            changes = result.summary.total_changes,
            warnings = result.summary.warnings,
            "policy diff complete"
        );
        Ok(result)
    }
}

/// Reject explicit requests for MLS-only kinds when neither policy is MLS.
fn check_mls_selection(selection: DiffSelection) -> Result<()> {
    match DiffKind::INDIVIDUAL
        .into_iter()
        .find(|kind| kind.requires_mls() && selection.names_explicitly(*kind))
    {
        Some(kind) => Err(PolicyDiffError::fatal(
            "checking selection",
            FatalInputKind::MlsKindOnNonMlsPolicies {
                kind: kind.name().to_string(),
            },
        )),
        None => Ok(()),
    }
}

/// One independent unit of work.
#[derive(Debug, Clone, Copy)]
enum Job {
    Symbols(SymbolKind),
    Booleans,
    Levels,
    Users,
    Rules(RuleFamily),
}

enum JobOutput {
    Symbols(SymbolKind, ChangeSet<ComponentDiff>),
    Booleans(ChangeSet<BooleanDiff>),
    Levels(ChangeSet<LevelDiff>),
    Users(ChangeSet<UserDiff>),
    Rules(RuleFamily, ChangeSet<RuleDiff>),
}

/// Expand a selection into jobs, skipping MLS-only kinds without MLS data.
fn plan(selection: DiffSelection, mls: bool) -> Vec<Job> {
    let mut jobs = Vec::new();
    if selection.contains(DiffKind::Components) {
        jobs.extend(
            [
                SymbolKind::Type,
                SymbolKind::Attribute,
                SymbolKind::Role,
                SymbolKind::Class,
                SymbolKind::Common,
            ]
            .map(Job::Symbols),
        );
        jobs.push(Job::Booleans);
    }
    if mls && selection.contains(DiffKind::MlsCategories) {
        jobs.push(Job::Symbols(SymbolKind::Category));
    }
    if mls && selection.contains(DiffKind::MlsLevels) {
        jobs.push(Job::Levels);
    }
    if selection.contains(DiffKind::MlsUsers) {
        jobs.push(Job::Users);
    }
    for family in RuleFamily::ALL {
        let kind = family.selection_kind();
        if selection.contains(kind) && (mls || !kind.requires_mls()) {
            jobs.push(Job::Rules(family));
        }
    }
    jobs
}

impl Job {
    fn run(self, ctx: &DiffContext<'_>) -> Result<(JobOutput, Vec<DiffWarning>)> {
        let mut warnings = Vec::new();
        let output = match self {
            Self::Symbols(kind) => JobOutput::Symbols(kind, SymbolChangeComputer::new(kind).compute(ctx, &mut warnings)?),
            Self::Booleans => JobOutput::Booleans(BooleanChangeComputer::new().compute(ctx, &mut warnings)?),
            Self::Levels => JobOutput::Levels(LevelChangeComputer::new().compute(ctx, &mut warnings)?),
            Self::Users => JobOutput::Users(UserChangeComputer::new().compute(ctx, &mut warnings)?),
            Self::Rules(family) => {
                JobOutput::Rules(family, RuleChangeComputer::new(family).compute(ctx, &mut warnings)?)
            }
        };
        Ok((output, warnings))
    }
}

impl JobOutput {
    fn store(self, result: &mut DiffResult) {
        match self {
            Self::Symbols(kind, set) => {
                let slot = match kind {
                    SymbolKind::Type => &mut result.types,
                    SymbolKind::Attribute => &mut result.attributes,
                    SymbolKind::Role => &mut result.roles,
                    SymbolKind::Class => &mut result.classes,
                    SymbolKind::Common => &mut result.commons,
                    SymbolKind::Category => &mut result.categories,
                    SymbolKind::User | SymbolKind::Boolean | SymbolKind::Sensitivity => return,
                };
                *slot = Some(set);
            }
            Self::Booleans(set) => result.booleans = Some(set),
            Self::Levels(set) => result.levels = Some(set),
            Self::Users(set) => result.users = Some(set),
            Self::Rules(family, set) => {
                let slot = match family {
                    RuleFamily::AccessVector => &mut result.av_rules,
                    RuleFamily::TypeEnforcement => &mut result.te_rules,
                    RuleFamily::RoleAllow => &mut result.role_allows,
                    RuleFamily::RoleTransition => &mut result.role_transitions,
                    RuleFamily::RangeTransition => &mut result.range_transitions,
                };
                *slot = Some(set);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Policy;

    #[test]
    fn test_empty_diff() {
        let engine = DiffEngine::new();
        let policy = Policy::builder().typ("a_t", &[]).build().unwrap();
        let result = engine.diff(&policy, &policy).expect("diff should succeed");
        assert!(!result.has_changes());
        assert!(result.types.is_some());
        assert!(result.levels.is_none());
    }

    #[test]
    fn test_plan_skips_mls_kinds_without_mls() {
        let jobs = plan(DiffSelection::ALL, false);
        assert!(!jobs.iter().any(|j| matches!(j, Job::Levels)));
        assert!(!jobs.iter().any(|j| matches!(j, Job::Rules(RuleFamily::RangeTransition))));
        assert!(jobs.iter().any(|j| matches!(j, Job::Users)));

        let jobs = plan(DiffSelection::ALL, true);
        assert!(jobs.iter().any(|j| matches!(j, Job::Levels)));
    }

    #[test]
    fn test_explicit_mls_kind_is_fatal() {
        let policy = Policy::builder().build().unwrap();
        let err = DiffEngine::new()
            .with_selection([DiffKind::MlsLevels])
            .diff(&policy, &policy)
            .unwrap_err();
        assert!(err.is_fatal_input());
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let a = Policy::builder()
            .typ("a_t", &[])
            .class("file", &["read"])
            .allow("a_t", "a_t", "file", &["read"])
            .build()
            .unwrap();
        let b = Policy::builder().typ("a_t", &[]).typ("b_t", &[]).class("file", &["read"]).build().unwrap();

        let parallel = DiffEngine::new().diff(&a, &b).unwrap();
        let sequential = DiffEngine::new().with_parallel(false).diff(&a, &b).unwrap();
        assert_eq!(parallel, sequential);
    }
}
