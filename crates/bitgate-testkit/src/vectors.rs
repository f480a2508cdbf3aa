//! Named scenario vectors with known decisions.
//!
//! Each vector is a complete snapshot plus the decision any conforming
//! evaluator must produce for one key. The set can be exported as JSON for
//! checking other implementations against the same cases.

use bitgate::Engine;
use bitgate_core::catalog::{ARTICLE_DELETE, ARTICLE_READ, ARTICLE_UPDATE, MEMBER_BAN};
use bitgate_core::RoleId;
use bitgate_policy::{DecisionLevel, DefaultTier, EffectiveDecision, EvaluationSnapshot};
use serde::Serialize;

use crate::fixtures::{TestFixture, ARTICLE_SCOPE, ROOT_SCOPE, TEST_USER};

/// Clock used by every vector, Unix milliseconds.
pub const VECTOR_NOW: i64 = 1_736_870_400_000;

/// A scenario with its expected outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub key: &'static str,
    pub snapshot: EvaluationSnapshot,
    pub expected: EffectiveDecision,
}

/// Get all scenario vectors.
pub fn all_vectors(fixture: &TestFixture) -> Vec<ScenarioVector> {
    let writer = fixture.role(20, "writer", 1, &[ARTICLE_UPDATE]);
    let reviewer = fixture.role(21, "reviewer", 2, &[]);
    let everyone = fixture.default_role(DefaultTier::Everyone);
    let member = fixture.default_role(DefaultTier::Member);
    let moderator = fixture.default_role(DefaultTier::Moderator);

    let base = fixture.snapshot(VECTOR_NOW);

    vec![
        ScenarioVector {
            name: "role deny beats role allow",
            key: ARTICLE_UPDATE,
            snapshot: base
                .clone()
                .with_roles(vec![writer.clone(), reviewer.clone()])
                .with_root_overrides(vec![fixture.role_override(
                    ROOT_SCOPE,
                    reviewer.id,
                    &[],
                    &[ARTICLE_UPDATE],
                )]),
            expected: EffectiveDecision::denied_by(DecisionLevel::Role),
        },
        ScenarioVector {
            name: "scope deny short-circuits user allow",
            key: ARTICLE_UPDATE,
            snapshot: base
                .clone()
                .with_roles(vec![writer.clone()])
                .with_root_overrides(vec![fixture.user_override(
                    ROOT_SCOPE,
                    TEST_USER,
                    &[ARTICLE_UPDATE],
                    &[],
                )])
                .with_target(
                    ARTICLE_SCOPE,
                    vec![fixture.role_override(ARTICLE_SCOPE, writer.id, &[], &[ARTICLE_UPDATE])],
                ),
            expected: EffectiveDecision::denied_by(DecisionLevel::Scope),
        },
        ScenarioVector {
            name: "everyone only falls through to default",
            key: ARTICLE_UPDATE,
            snapshot: base.clone().with_roles(vec![everyone.clone()]),
            expected: EffectiveDecision::default_deny(),
        },
        ScenarioVector {
            name: "member reads through role tier",
            key: ARTICLE_READ,
            snapshot: base.clone().with_roles(vec![everyone, member.clone()]),
            expected: EffectiveDecision::allowed_by(DecisionLevel::Role),
        },
        ScenarioVector {
            name: "user allow fills gap left by roles",
            key: MEMBER_BAN,
            snapshot: base.clone().with_roles(vec![moderator.clone()]).with_root_overrides(vec![
                fixture.user_override(ROOT_SCOPE, TEST_USER, &[MEMBER_BAN], &[]),
            ]),
            expected: EffectiveDecision::allowed_by(DecisionLevel::User),
        },
        ScenarioVector {
            name: "expired scope deny is ignored",
            key: ARTICLE_UPDATE,
            snapshot: base.clone().with_roles(vec![moderator.clone()]).with_target(
                ARTICLE_SCOPE,
                vec![fixture
                    .role_override(ARTICLE_SCOPE, moderator.id, &[], &[ARTICLE_UPDATE])
                    .expiring_at(VECTOR_NOW)],
            ),
            expected: EffectiveDecision::allowed_by(DecisionLevel::Role),
        },
        ScenarioVector {
            name: "unexpired scope allow beats missing role grant",
            key: ARTICLE_DELETE,
            snapshot: base.clone().with_roles(vec![member.clone()]).with_target(
                ARTICLE_SCOPE,
                vec![fixture
                    .user_override(ARTICLE_SCOPE, TEST_USER, &[ARTICLE_DELETE], &[])
                    .expiring_at(VECTOR_NOW + 1)],
            ),
            expected: EffectiveDecision::allowed_by(DecisionLevel::Scope),
        },
        ScenarioVector {
            name: "override for unheld role is ignored",
            key: ARTICLE_READ,
            snapshot: base.with_roles(vec![member]).with_target(
                ARTICLE_SCOPE,
                vec![fixture.role_override(ARTICLE_SCOPE, RoleId(999), &[], &[ARTICLE_READ])],
            ),
            expected: EffectiveDecision::allowed_by(DecisionLevel::Role),
        },
    ]
}

/// Evaluate every vector with `engine`.
///
/// Returns `(name, matches, actual)` for each vector.
pub fn verify_all_vectors(
    engine: &Engine,
    fixture: &TestFixture,
) -> Vec<(String, bool, EffectiveDecision)> {
    all_vectors(fixture)
        .into_iter()
        .map(|v| {
            let actual = engine
                .evaluate(&v.snapshot, v.key)
                .unwrap_or_else(|e| panic!("vector '{}' failed to evaluate: {e}", v.name));
            (v.name.to_string(), actual == v.expected, actual)
        })
        .collect()
}

/// All vectors as pretty-printed JSON.
pub fn vectors_json(fixture: &TestFixture) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors(fixture))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        let fixture = TestFixture::new();
        for (name, matches, actual) in verify_all_vectors(&fixture.engine, &fixture) {
            assert!(matches, "vector '{name}' decided {actual:?}");
        }
    }

    #[test]
    fn test_vector_names_are_unique() {
        let fixture = TestFixture::new();
        let vectors = all_vectors(&fixture);
        let mut names: Vec<&str> = vectors.iter().map(|v| v.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }

    #[test]
    fn test_vectors_export_as_json() {
        let fixture = TestFixture::new();
        let json = vectors_json(&fixture).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let first = &parsed[0];
        assert_eq!(first["key"], ARTICLE_UPDATE);
        assert_eq!(first["expected"]["deciding_level"], "role");
        assert_eq!(first["expected"]["allowed"], false);
        // Bitfields serialize as decimal strings.
        assert_eq!(first["snapshot"]["roles"][0]["base_permissions"], "32");
    }
}
