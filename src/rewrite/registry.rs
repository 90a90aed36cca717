//! Assertion registry: invocation name to kind rule.
//!
//! Built once from the kind table. Every row's invocation name is resolved
//! up front, so a row that breaks the naming convention is a configuration
//! error reported before any call site is looked at.

use std::collections::{BTreeMap, HashSet};

use crate::ast::CallExpr;
use crate::config::RetrofitConfig;
use crate::errors::{configuration_error, ErrorKind, RetrofitError};

use super::family::{KindRule, STANDARD_RULES};

/// A kind rule together with the invocation name it answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionRule {
    pub name: String,
    pub rule: KindRule,
}

#[derive(Debug, Clone, Default)]
pub struct AssertionRegistry {
    rules: BTreeMap<String, Vec<AssertionRule>>,
}

impl AssertionRegistry {
    /// The full legacy vocabulary.
    pub fn standard() -> Result<Self, RetrofitError> {
        Self::from_rules(STANDARD_RULES)
    }

    /// The standard vocabulary minus the names the configuration disables.
    /// Disabling a name the registry does not know is an error.
    pub fn with_config(config: &RetrofitConfig) -> Result<Self, RetrofitError> {
        let mut registry = Self::standard()?;
        let mut unknown = Vec::new();
        for name in &config.disabled {
            if registry.rules.remove(name).is_none() {
                unknown.push(name.clone());
            }
        }
        if !unknown.is_empty() {
            return Err(configuration_error(
                ErrorKind::InvalidConfiguration {
                    message: format!("cannot disable unknown assertion(s): {}", unknown.join(", ")),
                },
                "disabled",
            ));
        }
        Ok(registry)
    }

    pub fn from_rules(rules: &[KindRule]) -> Result<Self, RetrofitError> {
        let mut registry = Self::default();
        for rule in rules {
            let name = rule.invocation_name().ok_or_else(|| {
                configuration_error(
                    ErrorKind::UnableToInferAssertionName {
                        identifier: rule.identifier.to_string(),
                    },
                    rule.identifier,
                )
            })?;
            registry
                .rules
                .entry(name.clone())
                .or_default()
                .push(AssertionRule { name, rule: *rule });
        }
        Ok(registry)
    }

    /// Picks the rule for `call`. When several rows share the invocation
    /// name, a row whose discriminating label appears among the arguments
    /// wins; otherwise the row without one applies.
    pub fn resolve(&self, call: &CallExpr) -> Option<&AssertionRule> {
        let candidates = self.rules.get(call.invocation_name()?)?;
        let labels: HashSet<&str> = call
            .arguments
            .iter()
            .filter_map(|arg| arg.label.as_deref())
            .collect();

        candidates
            .iter()
            .find(|candidate| {
                candidate
                    .rule
                    .discriminating_label
                    .is_some_and(|label| labels.contains(label))
            })
            .or_else(|| {
                candidates
                    .iter()
                    .find(|candidate| candidate.rule.discriminating_label.is_none())
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Invocation names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Every rule, grouped by invocation name.
    pub fn rules(&self) -> impl Iterator<Item = &AssertionRule> {
        self.rules.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Argument, Expr};
    use crate::errors::ErrorCategory;
    use crate::rewrite::family::{AssertionKind, Invocation};

    #[test]
    fn test_standard_registry_covers_the_vocabulary() {
        let registry = AssertionRegistry::standard().expect("standard table is well formed");
        assert_eq!(registry.len(), 19);
        assert!(registry.contains("XCTFail"));
        assert!(registry.contains("XCTUnwrap"));
        assert!(!registry.contains("XCTAssertEqualWithTolerance"));
    }

    #[test]
    fn test_accuracy_label_selects_tolerance_rule() {
        let registry = AssertionRegistry::standard().expect("registry");
        let plain = CallExpr::macro_call(
            "XCTAssertEqual",
            vec![Argument::unlabeled(Expr::ident("a")), Argument::unlabeled(Expr::ident("b"))],
        );
        let tolerant = CallExpr::macro_call(
            "XCTAssertEqual",
            vec![
                Argument::unlabeled(Expr::ident("a")),
                Argument::unlabeled(Expr::ident("b")),
                Argument::labeled("accuracy", Expr::verbatim("0.1")),
            ],
        );
        assert_eq!(registry.resolve(&plain).map(|r| r.rule.kind), Some(AssertionKind::Equal));
        assert_eq!(
            registry.resolve(&tolerant).map(|r| r.rule.kind),
            Some(AssertionKind::EqualWithAccuracy)
        );
    }

    #[test]
    fn test_misconfigured_row_is_a_configuration_error() {
        let rows = [KindRule {
            kind: AssertionKind::Assert,
            identifier: "AssertSomething",
            invocation: Invocation::Inferred,
            defensive_parentheses: true,
            discriminating_label: None,
        }];
        let err = AssertionRegistry::from_rules(&rows).unwrap_err();
        assert_eq!(err.kind.category(), ErrorCategory::Configuration);
        assert_eq!(
            err.diagnostic_info.error_code,
            "retrofit::config::unable_to_infer_assertion_name"
        );
    }

    #[test]
    fn test_disabled_names_are_removed_and_unknown_names_rejected() {
        let config = RetrofitConfig {
            disabled: vec!["XCTUnwrap".into()],
            ..RetrofitConfig::default()
        };
        let registry = AssertionRegistry::with_config(&config).expect("registry");
        assert!(!registry.contains("XCTUnwrap"));

        let config = RetrofitConfig {
            disabled: vec!["XCTAssertMaybe".into()],
            ..RetrofitConfig::default()
        };
        assert!(AssertionRegistry::with_config(&config).is_err());
    }

    #[test]
    fn test_unknown_and_function_calls_do_not_resolve() {
        let registry = AssertionRegistry::standard().expect("registry");
        assert!(registry.resolve(&CallExpr::macro_call("available", vec![])).is_none());
        assert!(registry
            .resolve(&CallExpr::function(Expr::ident("XCTFail"), vec![]))
            .is_none());
    }
}
