//! Integration tests for poldiff.

use poldiff::config::{ConfigPreset, load_config_file};
use poldiff::{
    DiffConfig, DiffEngine, DiffForm, DiffKind, FatalInputKind, PolicyDiffError, PolicySide, TypeRemapEntry,
    WarningKind, parse_policy,
};
use std::path::Path;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture(name: &str) -> poldiff::Policy {
    parse_policy(&Path::new(FIXTURES_DIR).join(name)).expect("fixture should parse")
}

mod parser_tests {
    use super::*;
    use poldiff::model::SymbolKind;
    use poldiff::parsers::ParseError;
    use poldiff::PolicyQuery;

    #[test]
    fn test_parse_json_fixture() {
        let policy = fixture("base-policy.json");
        assert_eq!(policy.name(), Some("zoo-base"));
        assert!(!policy.is_mls());
        assert_eq!(policy.symbols(SymbolKind::Type).len(), 5);
    }

    #[test]
    fn test_parse_yaml_fixture() {
        let policy = fixture("updated-policy.yaml");
        assert_eq!(policy.name(), Some("zoo-updated"));
        assert_eq!(
            policy.primary_name(SymbolKind::Type, "httpd_t").as_deref(),
            Some("apache_t")
        );
    }

    #[test]
    fn test_parse_mls_fixture() {
        let policy = fixture("mls-base.json");
        assert!(policy.is_mls());
        assert_eq!(policy.symbols(SymbolKind::Category).len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let result = parse_policy(&Path::new(FIXTURES_DIR).join("no-such-policy.json"));
        assert!(matches!(result, Err(ParseError::IoError(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = poldiff::parse_policy_str("{ \"types\": [ { \"name\": 3 } ] }");
        assert!(result.is_err());
    }
}

mod engine_tests {
    use super::*;

    fn zoo_diff() -> poldiff::DiffResult {
        let original = fixture("base-policy.json");
        let modified = fixture("updated-policy.yaml");
        DiffEngine::new()
            .diff(&original, &modified)
            .expect("diff should succeed")
    }

    #[test]
    fn test_self_diff_is_empty() {
        let policy = fixture("base-policy.json");
        let result = DiffEngine::new().diff(&policy, &policy).unwrap();
        assert!(!result.has_changes());
        assert!(result.warnings.is_empty());
        assert_eq!(result.summary.total_changes, 0);
    }

    #[test]
    fn test_renamed_type_is_not_reported() {
        let result = zoo_diff();
        let types = result.types.as_ref().unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["hippo_t", "log_t"]);

        let hippo = &types.items()[0];
        assert_eq!(hippo.form, DiffForm::Modified);
        assert_eq!(hippo.added, vec!["mammal"]);
        assert_eq!(types.items()[1].form, DiffForm::Added);
    }

    #[test]
    fn test_attribute_membership_change() {
        let result = zoo_diff();
        let attributes = result.attributes.as_ref().unwrap();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.items()[0].name, "mammal");
        assert_eq!(attributes.items()[0].added, vec!["hippo_t"]);
    }

    #[test]
    fn test_components() {
        let result = zoo_diff();

        let users = result.users.as_ref().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users.items()[0].name, "joe");
        assert_eq!(users.items()[0].added_roles, vec!["system_r"]);
        assert!(users.items()[0].default_level_diff.is_none());

        let commons = result.commons.as_ref().unwrap();
        assert_eq!(commons.items()[0].added, vec!["append"]);

        let classes = result.classes.as_ref().unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes.items()[0].name, "file");

        let booleans = result.booleans.as_ref().unwrap();
        assert_eq!(booleans.len(), 1);
        assert_eq!(booleans.items()[0].original_default, Some(false));
        assert_eq!(booleans.items()[0].modified_default, Some(true));

        assert!(result.roles.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_access_rules() {
        let result = zoo_diff();
        let rules = result.av_rules.as_ref().unwrap();
        let forms: Vec<(String, DiffForm)> = rules.iter().map(|r| (r.key.to_string(), r.form)).collect();
        assert_eq!(
            forms,
            vec![
                ("allow apache_t etc_t:file".to_string(), DiffForm::Modified),
                ("allow apache_t log_t:file".to_string(), DiffForm::Added),
                ("dontaudit apache_t user_t:process".to_string(), DiffForm::Removed),
                ("allow user_t hippo_t:file".to_string(), DiffForm::AddedByTypeChange),
            ]
        );

        let modified = &rules.items()[0];
        assert_eq!(modified.added_perms(), ["write"]);
        assert_eq!(modified.unmodified_perms(), ["getattr", "read"]);

        let derived = &rules.items()[3];
        let explainer = derived.explained_by.as_ref().unwrap();
        assert_eq!(explainer.target.as_deref(), Some("mammal"));
    }

    #[test]
    fn test_type_enforcement_default_change() {
        let result = zoo_diff();
        let rules = result.te_rules.as_ref().unwrap();
        assert_eq!(rules.len(), 1);
        let rule = &rules.items()[0];
        assert_eq!(rule.form, DiffForm::Modified);
        assert_eq!(rule.original_default(), Some("etc_t"));
        assert_eq!(rule.modified_default(), Some("log_t"));
    }

    #[test]
    fn test_role_rules_follow_type_map() {
        let result = zoo_diff();
        assert!(result.role_allows.as_ref().unwrap().is_empty());
        assert!(result.role_transitions.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_unresolved_symbol_warning() {
        let result = zoo_diff();
        assert_eq!(result.warnings.len(), 1);
        let warning = &result.warnings[0];
        assert_eq!(warning.kind, WarningKind::UnresolvedSymbol);
        assert_eq!(warning.side, PolicySide::Modified);
        assert_eq!(warning.detail, "ghost_t");
        assert_eq!(result.summary.warnings, 1);
    }

    #[test]
    fn test_mls_kinds_absent_without_mls() {
        let result = zoo_diff();
        assert!(result.levels.is_none());
        assert!(result.categories.is_none());
        assert!(result.range_transitions.is_none());
    }

    #[test]
    fn test_selection_limits_kinds() {
        let original = fixture("base-policy.json");
        let modified = fixture("updated-policy.yaml");
        let result = DiffEngine::new()
            .with_selection([DiffKind::TypeEnforcementRules])
            .diff(&original, &modified)
            .unwrap();
        assert!(result.types.is_none());
        assert!(result.av_rules.is_none());
        assert_eq!(result.te_rules.as_ref().map(|s| s.len()), Some(1));
        // the ghost rule is an access rule
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_selection() {
        let original = fixture("base-policy.json");
        let modified = fixture("updated-policy.yaml");
        let result = DiffEngine::new()
            .with_selection(Vec::<DiffKind>::new())
            .diff(&original, &modified)
            .unwrap();
        assert!(!result.has_changes());
        assert!(result.types.is_none());
        assert!(result.summary.per_kind.is_empty());
    }

    #[test]
    fn test_explicit_mls_kind_is_fatal() {
        let original = fixture("base-policy.json");
        let modified = fixture("updated-policy.yaml");
        let err = DiffEngine::new()
            .with_selection([DiffKind::Components, DiffKind::RangeTransitionRules])
            .diff(&original, &modified)
            .unwrap_err();
        match err {
            PolicyDiffError::FatalInput {
                source: FatalInputKind::MlsKindOnNonMlsPolicies { kind },
                ..
            } => assert_eq!(kind, "range-transition-rules"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_remap_type_is_fatal() {
        let original = fixture("base-policy.json");
        let modified = fixture("updated-policy.yaml");
        let err = DiffEngine::new()
            .with_type_remap(TypeRemapEntry::new("nosuch_t", "log_t"))
            .diff(&original, &modified)
            .unwrap_err();
        assert!(err.is_fatal_input());
    }

    #[test]
    fn test_deterministic_output() {
        let original = fixture("base-policy.json");
        let modified = fixture("updated-policy.yaml");
        let first = DiffEngine::new().diff(&original, &modified).unwrap();
        let second = DiffEngine::new().with_parallel(false).diff(&original, &modified).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_summary_counts() {
        let result = zoo_diff();
        let av = result.summary.per_kind[&poldiff::diff::ResultKind::AvRules];
        assert_eq!(av.added, 1);
        assert_eq!(av.removed, 1);
        assert_eq!(av.modified, 1);
        assert_eq!(av.added_by_type_change, 1);
        assert_eq!(av.total(), 4);
    }
}

mod config_tests {
    use super::*;
    use poldiff::Validatable;
    use std::io::Write;

    #[test]
    fn test_load_fixture_config() {
        let config = load_config_file(&Path::new(FIXTURES_DIR).join("zoo-config.yaml")).unwrap();
        assert_eq!(config.selection, vec![DiffKind::AccessRules, DiffKind::Components]);
        assert!(!config.derive_type_change_rules);
        assert!(!config.parallel);
        assert_eq!(config.enabled_remaps().count(), 0);
    }

    #[test]
    fn test_config_drives_engine() {
        let config = load_config_file(&Path::new(FIXTURES_DIR).join("zoo-config.yaml")).unwrap();
        let original = fixture("base-policy.json");
        let modified = fixture("updated-policy.yaml");
        let result = DiffEngine::from_config(config).diff(&original, &modified).unwrap();

        assert!(result.te_rules.is_none());
        let rules = result.av_rules.as_ref().unwrap();
        assert!(rules.iter().all(|r| r.form != DiffForm::AddedByTypeChange));
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_json_config_from_tempfile() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "selection": ["mls-users"], "type_remaps": [{{ "original": ["httpd_t"], "modified": ["apache_t"] }}] }}"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.selection, vec![DiffKind::MlsUsers]);
        assert_eq!(config.type_remaps.len(), 1);
        assert!(config.type_remaps[0].enabled);
        assert!(config.infer_type_map);
    }

    #[test]
    fn test_invalid_remap_rejected_by_engine() {
        let config = DiffConfig::builder()
            .type_remap(TypeRemapEntry::many(["a_t", "b_t"], ["c_t", "d_t"]))
            .build();
        assert!(!config.validate().is_empty());

        let policy = fixture("base-policy.json");
        let err = DiffEngine::from_config(config).diff(&policy, &policy).unwrap_err();
        assert!(matches!(
            err,
            PolicyDiffError::FatalInput {
                source: FatalInputKind::InvalidTypeRemap { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_presets_validate() {
        for preset in ConfigPreset::all() {
            let config = DiffConfig::from_preset(*preset);
            assert!(config.validate().is_empty(), "preset {} invalid", preset.name());
        }
    }
}
