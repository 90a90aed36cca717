//! The fixed table of legacy assertion kinds.
//!
//! Each row carries everything that varies per kind: the internal identifier
//! the invocation name is inferred from (or an explicit override), the
//! defensive-parenthesization policy, and an optional discriminating label
//! that separates two kinds sharing one invocation name.

use serde::Serialize;

// ============================================================================
// KINDS AND FAMILIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssertionKind {
    Fail,
    Assert,
    AssertTrue,
    AssertFalse,
    AssertNil,
    AssertNotNil,
    Unwrap,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    EqualWithAccuracy,
    NotEqualWithAccuracy,
    ThrowsError,
    NoThrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssertionFamily {
    Unconditional,
    Unary,
    Binary,
    BinaryWithTolerance,
    ThrowingExpectation,
    NonThrowingExpectation,
}

impl AssertionFamily {
    /// Positional operands consumed before any context argument.
    pub const fn mandatory_argument_count(self) -> usize {
        match self {
            AssertionFamily::Unconditional => 0,
            AssertionFamily::Unary
            | AssertionFamily::ThrowingExpectation
            | AssertionFamily::NonThrowingExpectation => 1,
            AssertionFamily::Binary => 2,
            AssertionFamily::BinaryWithTolerance => 3,
        }
    }
}

impl AssertionKind {
    pub const fn family(self) -> AssertionFamily {
        use AssertionKind::*;
        match self {
            Fail => AssertionFamily::Unconditional,
            Assert | AssertTrue | AssertFalse | AssertNil | AssertNotNil | Unwrap => {
                AssertionFamily::Unary
            }
            Equal | NotEqual | Identical | NotIdentical | LessThan | LessThanOrEqual
            | GreaterThan | GreaterThanOrEqual => AssertionFamily::Binary,
            EqualWithAccuracy | NotEqualWithAccuracy => AssertionFamily::BinaryWithTolerance,
            ThrowsError => AssertionFamily::ThrowingExpectation,
            NoThrow => AssertionFamily::NonThrowingExpectation,
        }
    }

    pub const fn mandatory_argument_count(self) -> usize {
        self.family().mandatory_argument_count()
    }

    /// Name of the target macro for kinds that rewrite to a single
    /// expectation call.
    pub const fn target_macro(self) -> &'static str {
        match self {
            AssertionKind::Unwrap => "require",
            _ => "expect",
        }
    }

    /// Human-readable shape of the rewritten call, for listings.
    pub const fn target_form(self) -> &'static str {
        use AssertionKind::*;
        match self {
            Fail => "Issue.record(message?, sourceLocation: ...?)",
            Assert | AssertTrue => "#expect(Bool((x)), ...)",
            AssertFalse => "#expect(Bool(!(x)), ...)",
            AssertNil => "#expect((x) == nil, ...)",
            AssertNotNil => "#expect((x) != nil, ...)",
            Unwrap => "#require(x, ...)",
            Equal => "#expect((a) == (b), ...)",
            NotEqual => "#expect((a) != (b), ...)",
            Identical => "#expect((a) === (b), ...)",
            NotIdentical => "#expect((a) !== (b), ...)",
            LessThan => "#expect((a) < (b), ...)",
            LessThanOrEqual => "#expect((a) <= (b), ...)",
            GreaterThan => "#expect((a) > (b), ...)",
            GreaterThanOrEqual => "#expect((a) >= (b), ...)",
            EqualWithAccuracy => "#expect(abs((a) - (b)) <= (t), ...)",
            NotEqualWithAccuracy => "#expect(abs((a) - (b)) > (t), ...)",
            ThrowsError => "#expect(throws: (any Error).self, ...) { x }",
            NoThrow => "try { do { return try x } catch { Issue.record(...); throw error } }()",
        }
    }
}

// ============================================================================
// KIND TABLE
// ============================================================================

/// How a kind's invocation name is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Derived from the identifier by `infer_invocation_name`.
    Inferred,
    Explicit(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRule {
    pub kind: AssertionKind,
    pub identifier: &'static str,
    pub invocation: Invocation,
    pub defensive_parentheses: bool,
    /// A label whose presence selects this row over another row with the
    /// same invocation name.
    pub discriminating_label: Option<&'static str>,
}

impl KindRule {
    const fn inferred(kind: AssertionKind, identifier: &'static str, defensive: bool) -> Self {
        Self {
            kind,
            identifier,
            invocation: Invocation::Inferred,
            defensive_parentheses: defensive,
            discriminating_label: None,
        }
    }

    const fn tolerance(kind: AssertionKind, identifier: &'static str, name: &'static str) -> Self {
        Self {
            kind,
            identifier,
            invocation: Invocation::Explicit(name),
            defensive_parentheses: true,
            discriminating_label: Some("accuracy"),
        }
    }

    /// The dialect-facing name this row matches, or `None` if the identifier
    /// does not follow the naming convention.
    pub fn invocation_name(&self) -> Option<String> {
        match self.invocation {
            Invocation::Explicit(name) => Some(name.to_string()),
            Invocation::Inferred => infer_invocation_name(self.identifier),
        }
    }
}

pub const STANDARD_RULES: &[KindRule] = &[
    KindRule::inferred(AssertionKind::Fail, "XCTFailMacro", false),
    KindRule::inferred(AssertionKind::Assert, "XCTAssertMacro", true),
    KindRule::inferred(AssertionKind::AssertTrue, "XCTAssertTrueMacro", true),
    KindRule::inferred(AssertionKind::AssertFalse, "XCTAssertFalseMacro", true),
    KindRule::inferred(AssertionKind::AssertNil, "XCTAssertNilMacro", true),
    KindRule::inferred(AssertionKind::AssertNotNil, "XCTAssertNotNilMacro", true),
    KindRule::inferred(AssertionKind::Unwrap, "XCTUnwrapMacro", false),
    KindRule::inferred(AssertionKind::Equal, "XCTAssertEqualMacro", true),
    KindRule::inferred(AssertionKind::NotEqual, "XCTAssertNotEqualMacro", true),
    KindRule::inferred(AssertionKind::Identical, "XCTAssertIdenticalMacro", true),
    KindRule::inferred(AssertionKind::NotIdentical, "XCTAssertNotIdenticalMacro", true),
    KindRule::inferred(AssertionKind::LessThan, "XCTAssertLessThanMacro", true),
    KindRule::inferred(AssertionKind::LessThanOrEqual, "XCTAssertLessThanOrEqualMacro", true),
    KindRule::inferred(AssertionKind::GreaterThan, "XCTAssertGreaterThanMacro", true),
    KindRule::inferred(AssertionKind::GreaterThanOrEqual, "XCTAssertGreaterThanOrEqualMacro", true),
    KindRule::tolerance(AssertionKind::EqualWithAccuracy, "XCTAssertEqualWithToleranceMacro", "XCTAssertEqual"),
    KindRule::tolerance(
        AssertionKind::NotEqualWithAccuracy,
        "XCTAssertNotEqualWithToleranceMacro",
        "XCTAssertNotEqual",
    ),
    KindRule::inferred(AssertionKind::ThrowsError, "XCTAssertThrowsErrorMacro", false),
    KindRule::inferred(AssertionKind::NoThrow, "XCTAssertNoThrowMacro", false),
];

const NAME_PREFIX: &str = "XCT";
const NAME_SUFFIX: &str = "Macro";

/// `XCTAssertEqualMacro` -> `XCTAssertEqual`. The prefix marks the legacy
/// vocabulary and stays; the suffix is dropped.
pub fn infer_invocation_name(identifier: &str) -> Option<String> {
    let stem = identifier
        .strip_prefix(NAME_PREFIX)?
        .strip_suffix(NAME_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{NAME_PREFIX}{stem}"))
}
