//! Property-based tests for the diff engine.

use poldiff::model::{Policy, PolicyBuilder};
use poldiff::{DiffEngine, DiffForm, DiffKind, DiffResult, RuleKey};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

const TYPES: [&str; 5] = ["t0", "t1", "t2", "t3", "t4"];
const ATTRIBUTES: [&str; 2] = ["a0", "a1"];
const PERMS: [&str; 4] = ["read", "write", "getattr", "open"];

/// (source, target, permission bitmask); indices past `TYPES` pick attributes.
type RuleShape = (usize, usize, u8);

#[derive(Debug, Clone)]
struct PolicyShape {
    /// Attribute membership per type
    membership: Vec<[bool; 2]>,
    rules: Vec<RuleShape>,
}

impl PolicyShape {
    fn is_member(&self, ty: usize, symbol: usize) -> bool {
        ty < TYPES.len() && symbol >= TYPES.len() && self.membership[ty][symbol - TYPES.len()]
    }

    /// Whether a rule side naming `rule_side` applies to a key side naming `key_side`.
    fn covers(&self, rule_side: usize, key_side: usize) -> bool {
        rule_side == key_side || self.is_member(key_side, rule_side)
    }

    /// Permissions written for exactly this key.
    fn authored(&self, source: usize, target: usize) -> u8 {
        self.rules
            .iter()
            .filter(|(s, t, _)| *s == source && *t == target)
            .fold(0, |mask, (_, _, m)| mask | m)
    }

    /// Permissions granted to a key through every rule that covers it.
    fn effective(&self, source: usize, target: usize) -> u8 {
        self.rules
            .iter()
            .filter(|(s, t, _)| self.covers(*s, source) && self.covers(*t, target))
            .fold(0, |mask, (_, _, m)| mask | m)
    }
}

fn symbol(index: usize) -> &'static str {
    if index < TYPES.len() {
        TYPES[index]
    } else {
        ATTRIBUTES[index - TYPES.len()]
    }
}

fn symbol_index(name: &str) -> usize {
    TYPES
        .iter()
        .chain(ATTRIBUTES.iter())
        .position(|s| *s == name)
        .expect("known symbol")
}

fn perms(mask: u8) -> Vec<&'static str> {
    PERMS
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, p)| *p)
        .collect()
}

fn perm_set(mask: u8) -> BTreeSet<String> {
    perms(mask).into_iter().map(str::to_string).collect()
}

fn builder(shape: &PolicyShape) -> PolicyBuilder {
    let mut builder = Policy::builder().class("file", &PERMS);
    for attr in ATTRIBUTES {
        builder = builder.attribute(attr);
    }
    for (ty, member_of) in TYPES.iter().zip(&shape.membership) {
        let attrs: Vec<&str> = ATTRIBUTES
            .iter()
            .zip(member_of)
            .filter(|(_, is_member)| **is_member)
            .map(|(a, _)| *a)
            .collect();
        builder = builder.typ(ty, &attrs);
    }
    builder
}

fn build(shape: &PolicyShape, rules: &[RuleShape]) -> Policy {
    rules
        .iter()
        .fold(builder(shape), |b, (s, t, mask)| {
            b.allow(symbol(*s), symbol(*t), "file", &perms(*mask))
        })
        .build()
        .expect("generated policy is valid")
}

fn policy(shape: &PolicyShape) -> Policy {
    build(shape, &shape.rules)
}

fn policy_shape() -> impl Strategy<Value = PolicyShape> {
    let symbols = TYPES.len() + ATTRIBUTES.len();
    (
        prop::collection::vec(prop::array::uniform2(any::<bool>()), TYPES.len()),
        prop::collection::vec((0..symbols, 0..symbols, 1u8..16), 0..12),
    )
        .prop_map(|(membership, rules)| PolicyShape { membership, rules })
}

/// Per type: present in the original, present in the modified, and the
/// attributes it belongs to on each side.
type TypeShape = (bool, bool, [bool; 2], [bool; 2]);

fn type_shapes() -> impl Strategy<Value = Vec<TypeShape>> {
    prop::collection::vec(
        (
            any::<bool>(),
            any::<bool>(),
            prop::array::uniform2(any::<bool>()),
            prop::array::uniform2(any::<bool>()),
        ),
        TYPES.len(),
    )
}

fn typed_policy(shapes: &[TypeShape], modified: bool) -> Policy {
    let mut builder = Policy::builder();
    for attr in ATTRIBUTES {
        builder = builder.attribute(attr);
    }
    for (ty, (in_original, in_modified, original_attrs, modified_attrs)) in TYPES.iter().zip(shapes) {
        let (present, member_of) = if modified {
            (*in_modified, modified_attrs)
        } else {
            (*in_original, original_attrs)
        };
        if !present {
            continue;
        }
        let attrs: Vec<&str> = ATTRIBUTES
            .iter()
            .zip(member_of)
            .filter(|(_, is_member)| **is_member)
            .map(|(a, _)| *a)
            .collect();
        builder = builder.typ(ty, &attrs);
    }
    builder.build().expect("generated policy is valid")
}

fn diff(a: &Policy, b: &Policy) -> DiffResult {
    DiffEngine::new().diff(a, b).expect("diff should succeed")
}

fn sides(key: &RuleKey) -> (usize, usize) {
    let target = key.target.as_deref().expect("access rules have targets");
    (symbol_index(&key.source), symbol_index(target))
}

/// Whether `key` side is reached from `rule` side through a member that
/// joined (`gained`) or left the attribute.
fn changed_member(a: &PolicyShape, b: &PolicyShape, rule_side: usize, key_side: usize, gained: bool) -> bool {
    let (before, after) = (a.is_member(key_side, rule_side), b.is_member(key_side, rule_side));
    if gained { after && !before } else { before && !after }
}

/// Whether an unchanged rule expands into `key` through one changed member.
fn one_step_expansion(a: &PolicyShape, b: &PolicyShape, source: usize, target: usize) -> bool {
    let symbols = TYPES.len() + ATTRIBUTES.len();
    (0..symbols).any(|other| {
        let unchanged = |s: usize, t: usize| {
            let mask = a.authored(s, t);
            mask != 0 && mask == b.authored(s, t)
        };
        let changed = |attr: usize, ty: usize| {
            changed_member(a, b, attr, ty, true) || changed_member(a, b, attr, ty, false)
        };
        (other != source && unchanged(other, target) && changed(other, source))
            || (other != target && unchanged(source, other) && changed(other, target))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn self_diff_is_empty(shape in policy_shape()) {
        let p = policy(&shape);
        let result = diff(&p, &p);
        prop_assert!(!result.has_changes());
        prop_assert!(result.warnings.is_empty());
    }

    #[test]
    fn rule_keys_are_unique_and_sorted(a in policy_shape(), b in policy_shape()) {
        let result = diff(&policy(&a), &policy(&b));
        let rules = result.av_rules.as_ref().expect("access rules selected");

        let mut seen = HashSet::new();
        for rule in rules {
            prop_assert!(rule.form.is_change());
            prop_assert!(seen.insert(rule.key.clone()), "duplicate key {}", rule.key);
        }
        let keys: Vec<_> = rules.iter().map(|r| &r.key).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn permission_deltas_are_disjoint(a in policy_shape(), b in policy_shape()) {
        let result = diff(&policy(&a), &policy(&b));
        for rule in result.av_rules.as_ref().expect("access rules selected") {
            let added: HashSet<&String> = rule.added_perms().iter().collect();
            let removed: HashSet<&String> = rule.removed_perms().iter().collect();
            let kept: HashSet<&String> = rule.unmodified_perms().iter().collect();
            prop_assert!(added.is_disjoint(&removed));
            prop_assert!(added.is_disjoint(&kept));
            prop_assert!(removed.is_disjoint(&kept));

            match rule.form {
                DiffForm::Modified | DiffForm::AddedByTypeChange | DiffForm::RemovedByTypeChange => {
                    prop_assert!(!added.is_empty() || !removed.is_empty());
                }
                DiffForm::Added => prop_assert!(removed.is_empty() && kept.is_empty()),
                DiffForm::Removed => prop_assert!(added.is_empty() && kept.is_empty()),
                DiffForm::Unchanged => prop_assert!(false, "unchanged rule reported"),
            }
        }
    }

    #[test]
    fn type_change_forms_name_an_unchanged_covering_rule(a in policy_shape(), b in policy_shape()) {
        let result = diff(&policy(&a), &policy(&b));
        for rule in result.av_rules.as_ref().expect("access rules selected") {
            if !rule.form.is_by_type_change() {
                prop_assert!(rule.explained_by.is_none());
                continue;
            }
            let explainer = rule.explained_by.as_ref().expect("by-type-change rules are explained");
            let (source, target) = sides(&rule.key);
            let (rule_source, rule_target) = sides(explainer);

            let mask = a.authored(rule_source, rule_target);
            prop_assert!(mask != 0, "{} is not authored", explainer);
            prop_assert_eq!(mask, b.authored(rule_source, rule_target));

            let gained = rule.form == DiffForm::AddedByTypeChange;
            let relevant = if gained { &b } else { &a };
            prop_assert!(relevant.covers(rule_source, source) && relevant.covers(rule_target, target));
            prop_assert!(
                changed_member(&a, &b, rule_source, source, gained)
                    || changed_member(&a, &b, rule_target, target, gained),
                "{} does not reach {} through a changed member",
                explainer,
                rule.key
            );
        }
    }

    #[test]
    fn derived_rules_match_effective_access(a in policy_shape(), b in policy_shape()) {
        let result = diff(&policy(&a), &policy(&b));
        let rules = result.av_rules.as_ref().expect("access rules selected");
        let symbols = TYPES.len() + ATTRIBUTES.len();

        for source in 0..symbols {
            for target in 0..symbols {
                if a.authored(source, target) != 0 || b.authored(source, target) != 0 {
                    continue;
                }
                let (before, after) = (a.effective(source, target), b.effective(source, target));
                let reported = rules
                    .iter()
                    .find(|r| sides(&r.key) == (source, target));
                let expected = before != after && one_step_expansion(&a, &b, source, target);

                match reported {
                    Some(rule) => {
                        prop_assert!(expected, "{} reported without an access change", rule.key);
                        prop_assert!(rule.form.is_by_type_change());
                        let kept: BTreeSet<String> = rule.unmodified_perms().iter().cloned().collect();
                        let mut was = kept.clone();
                        was.extend(rule.removed_perms().iter().cloned());
                        let mut now = kept;
                        now.extend(rule.added_perms().iter().cloned());
                        prop_assert_eq!(was, perm_set(before));
                        prop_assert_eq!(now, perm_set(after));
                    }
                    None => prop_assert!(
                        !expected,
                        "{} -> {} changed from {:?} to {:?} but was not reported",
                        symbol(source),
                        symbol(target),
                        perms(before),
                        perms(after)
                    ),
                }
            }
        }
    }

    #[test]
    fn rule_order_does_not_matter(a in policy_shape(), b in policy_shape()) {
        let original = policy(&a);
        let mut reversed = b.rules.clone();
        reversed.reverse();

        let forward = diff(&original, &build(&b, &b.rules));
        let backward = diff(&original, &build(&b, &reversed));
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn swapping_sides_mirrors_deltas(a in policy_shape(), b in policy_shape()) {
        let (pa, pb) = (policy(&a), policy(&b));
        let forward = diff(&pa, &pb);
        let backward = diff(&pb, &pa);
        let forward = forward.av_rules.as_ref().expect("access rules selected");
        let backward = backward.av_rules.as_ref().expect("access rules selected");

        prop_assert_eq!(forward.len(), backward.len());
        for (there, back) in forward.iter().zip(backward.iter()) {
            prop_assert_eq!(&there.key, &back.key);
            prop_assert_eq!(there.added_perms(), back.removed_perms());
            prop_assert_eq!(there.removed_perms(), back.added_perms());
            prop_assert_eq!(there.unmodified_perms(), back.unmodified_perms());

            let mirrored = match there.form {
                DiffForm::Added => back.form == DiffForm::Removed,
                DiffForm::Removed => back.form == DiffForm::Added,
                DiffForm::Modified => back.form == DiffForm::Modified,
                DiffForm::AddedByTypeChange | DiffForm::RemovedByTypeChange => back.form.is_by_type_change(),
                DiffForm::Unchanged => false,
            };
            prop_assert!(mirrored, "{} is {} one way and {} the other", there.key, there.form, back.form);
        }
    }

    #[test]
    fn selection_does_not_change_rule_results(a in policy_shape(), b in policy_shape()) {
        let (pa, pb) = (policy(&a), policy(&b));
        let all = diff(&pa, &pb);
        let only_rules = DiffEngine::new()
            .with_selection([DiffKind::AccessRules])
            .diff(&pa, &pb)
            .expect("diff should succeed");
        prop_assert_eq!(all.av_rules, only_rules.av_rules);
    }

    #[test]
    fn type_diff_partitions_the_name_union(shapes in type_shapes()) {
        let result = diff(&typed_policy(&shapes, false), &typed_policy(&shapes, true));
        let types = result.types.as_ref().expect("types selected");

        let mut seen = HashSet::new();
        for item in types {
            prop_assert!(seen.insert(item.name.clone()), "{} reported twice", item.name);
        }

        for (ty, (in_original, in_modified, original_attrs, modified_attrs)) in TYPES.iter().zip(&shapes) {
            let form = types.iter().find(|t| t.name == *ty).map(|t| t.form);
            let expected = match (*in_original, *in_modified) {
                (false, false) => None,
                (true, false) => Some(DiffForm::Removed),
                (false, true) => Some(DiffForm::Added),
                (true, true) if original_attrs != modified_attrs => Some(DiffForm::Modified),
                (true, true) => None,
            };
            prop_assert_eq!(form, expected, "type {}", ty);
        }
    }
}
