//! # Concept Terms
//!
//! Description-logic concept expressions and their normal form.
//!
//! Users build concepts with the full constructor set. Before reasoning every
//! concept is normalized into a smaller internal language:
//!
//! | User form | Normal form |
//! |---|---|
//! | `C ⊔ D` | `¬(¬C ⊓ ¬D)` |
//! | `∃r.C` | `¬∀r.¬C` |
//! | `≤n r.C` | `¬≥(n+1) r.C` |
//! | `≥1 r.C` | `∃r.C` |
//! | `{a, b}` | `{a} ⊔ {b}` |
//!
//! Conjunctions are flattened, sorted and de-duplicated, double negations
//! are removed and `⊤`/`⊥` are folded. `normalize` is idempotent.

use crate::types::{Name, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// CONCEPT
// =============================================================================

/// A concept expression.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    /// `⊤`, the universal concept.
    Top,
    /// `⊥`, the empty concept.
    Bottom,
    /// A named class.
    Atom(Name),
    /// `¬C`
    Not(Arc<Concept>),
    /// `C1 ⊓ … ⊓ Cn`
    And(Arc<[Concept]>),
    /// `C1 ⊔ … ⊔ Cn`. Eliminated by normalization.
    Or(Arc<[Concept]>),
    /// `∃r.C`. Eliminated by normalization.
    Exists(Role, Arc<Concept>),
    /// `∀r.C`
    All(Role, Arc<Concept>),
    /// `≥n r.C`
    Min(Role, u32, Arc<Concept>),
    /// `≤n r.C`. Eliminated by normalization.
    Max(Role, u32, Arc<Concept>),
    /// The nominal `{a}`.
    Value(Name),
    /// The enumeration `{a1, …, an}`. Eliminated by normalization.
    OneOf(Arc<[Name]>),
    /// A named datatype, used as the filler of data-role restrictions.
    Datatype(Name),
}

/// Label partition a normalized concept belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// Atoms, negated atoms, datatypes, conjunctions, `⊤` and `⊥`.
    Atomic,
    /// `¬(C1 ⊓ … ⊓ Cn)`
    Disjunction,
    /// `¬∀r.C`
    Existential,
    /// `∀r.C`
    Universal,
    /// `≥n r.C`
    MinCard,
    /// `¬≥n r.C`
    MaxCard,
    /// `{a}`
    Nominal,
}

impl Shape {
    /// Number of partitions.
    pub const COUNT: usize = 7;

    /// Every partition, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Atomic,
        Self::Disjunction,
        Self::Existential,
        Self::Universal,
        Self::MinCard,
        Self::MaxCard,
        Self::Nominal,
    ];

    /// Position of the partition in per-node arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

impl Concept {
    /// A named class.
    #[must_use]
    pub fn atom(name: impl Into<Name>) -> Self {
        Self::Atom(name.into())
    }

    /// `¬c`
    #[must_use]
    pub fn not(c: Self) -> Self {
        Self::Not(Arc::new(c))
    }

    /// `c1 ⊓ … ⊓ cn`
    #[must_use]
    pub fn and(conjuncts: impl IntoIterator<Item = Self>) -> Self {
        Self::And(conjuncts.into_iter().collect())
    }

    /// `c1 ⊔ … ⊔ cn`
    #[must_use]
    pub fn or(disjuncts: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(disjuncts.into_iter().collect())
    }

    /// `∃r.c`
    #[must_use]
    pub fn exists(role: impl Into<Role>, c: Self) -> Self {
        Self::Exists(role.into(), Arc::new(c))
    }

    /// `∀r.c`
    #[must_use]
    pub fn all(role: impl Into<Role>, c: Self) -> Self {
        Self::All(role.into(), Arc::new(c))
    }

    /// `≥n r.c`
    #[must_use]
    pub fn min(role: impl Into<Role>, n: u32, c: Self) -> Self {
        Self::Min(role.into(), n, Arc::new(c))
    }

    /// `≤n r.c`
    #[must_use]
    pub fn max(role: impl Into<Role>, n: u32, c: Self) -> Self {
        Self::Max(role.into(), n, Arc::new(c))
    }

    /// `=n r.c`, written as `≥n r.c ⊓ ≤n r.c`.
    #[must_use]
    pub fn exactly(role: impl Into<Role>, n: u32, c: Self) -> Self {
        let role = role.into();
        Self::and([Self::min(role.clone(), n, c.clone()), Self::max(role, n, c)])
    }

    /// The nominal `{a}`.
    #[must_use]
    pub fn value(name: impl Into<Name>) -> Self {
        Self::Value(name.into())
    }

    /// The enumeration `{a1, …, an}`.
    #[must_use]
    pub fn one_of(names: impl IntoIterator<Item = Name>) -> Self {
        Self::OneOf(names.into_iter().collect())
    }

    /// A named datatype.
    #[must_use]
    pub fn datatype(name: impl Into<Name>) -> Self {
        Self::Datatype(name.into())
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

impl Concept {
    /// Rewrite into the internal normal form.
    #[must_use]
    pub fn normalize(&self) -> Self {
        match self {
            Self::Top | Self::Bottom | Self::Atom(_) | Self::Value(_) | Self::Datatype(_) => {
                self.clone()
            }
            Self::Not(inner) => inner.normalize().negate(),
            Self::And(conjuncts) => Self::conjunction(conjuncts.iter().map(Self::normalize)),
            Self::Or(disjuncts) => {
                Self::conjunction(disjuncts.iter().map(|d| d.normalize().negate())).negate()
            }
            Self::Exists(role, filler) => Self::existential(role, filler.normalize()),
            Self::All(role, filler) => Self::universal(role, filler.normalize()),
            Self::Min(role, n, filler) => Self::at_least(role, *n, filler.normalize()),
            Self::Max(role, n, filler) => match n.checked_add(1) {
                Some(above) => Self::at_least(role, above, filler.normalize()).negate(),
                None => Self::Top,
            },
            Self::OneOf(names) => match names.len() {
                0 => Self::Bottom,
                1 => Self::Value(names[0].clone()),
                _ => Self::conjunction(names.iter().map(|n| Self::Value(n.clone()).negate()))
                    .negate(),
            },
        }
    }

    /// Negation of a normalized concept, itself normalized.
    #[must_use]
    pub fn negate(&self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Not(inner) => inner.as_ref().clone(),
            other => Self::Not(Arc::new(other.clone())),
        }
    }

    /// Build a normalized conjunction from normalized parts.
    fn conjunction(parts: impl Iterator<Item = Self>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Self::Bottom => return Self::Bottom,
                Self::Top => {}
                Self::And(inner) => flat.extend(inner.iter().cloned()),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();

        if flat.iter().any(|c| flat.binary_search(&c.negate()).is_ok()) {
            return Self::Bottom;
        }

        match flat.len() {
            0 => Self::Top,
            1 => flat.swap_remove(0),
            _ => Self::And(flat.into()),
        }
    }

    fn universal(role: &Role, filler: Self) -> Self {
        if filler == Self::Top {
            Self::Top
        } else {
            Self::All(role.clone(), Arc::new(filler))
        }
    }

    fn existential(role: &Role, filler: Self) -> Self {
        Self::universal(role, filler.negate()).negate()
    }

    fn at_least(role: &Role, n: u32, filler: Self) -> Self {
        match n {
            0 => Self::Top,
            _ if filler == Self::Bottom => Self::Bottom,
            1 => Self::existential(role, filler),
            _ => Self::Min(role.clone(), n, Arc::new(filler)),
        }
    }
}

// =============================================================================
// SHAPE ACCESSORS (normalized concepts only)
// =============================================================================

impl Concept {
    /// The label partition of this concept.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Not(inner) => match inner.as_ref() {
                Self::And(_) | Self::Or(_) => Shape::Disjunction,
                Self::All(..) => Shape::Existential,
                Self::Min(..) => Shape::MaxCard,
                _ => Shape::Atomic,
            },
            Self::All(..) => Shape::Universal,
            Self::Min(..) => Shape::MinCard,
            Self::Value(_) => Shape::Nominal,
            _ => Shape::Atomic,
        }
    }

    /// A named class or its negation.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        match self {
            Self::Atom(_) => true,
            Self::Not(inner) => matches!(inner.as_ref(), Self::Atom(_)),
            _ => false,
        }
    }

    /// The disjuncts of `¬(C1 ⊓ … ⊓ Cn)`, i.e. `¬C1 … ¬Cn`.
    #[must_use]
    pub fn disjuncts(&self) -> Option<Vec<Self>> {
        match self {
            Self::Not(inner) => match inner.as_ref() {
                Self::And(conjuncts) => Some(conjuncts.iter().map(Self::negate).collect()),
                _ => None,
            },
            _ => None,
        }
    }

    /// The role and filler of `¬∀r.¬C`, read as `∃r.C`.
    #[must_use]
    pub fn as_exists(&self) -> Option<(&Role, Self)> {
        match self {
            Self::Not(inner) => match inner.as_ref() {
                Self::All(role, filler) => Some((role, filler.negate())),
                _ => None,
            },
            _ => None,
        }
    }

    /// The role and filler of `∀r.C`.
    #[must_use]
    pub fn as_all(&self) -> Option<(&Role, &Self)> {
        match self {
            Self::All(role, filler) => Some((role, filler)),
            _ => None,
        }
    }

    /// The parts of `≥n r.C`.
    #[must_use]
    pub fn as_min(&self) -> Option<(&Role, u32, &Self)> {
        match self {
            Self::Min(role, n, filler) => Some((role, *n, filler)),
            _ => None,
        }
    }

    /// The parts of `¬≥(n+1) r.C`, read as `≤n r.C`.
    #[must_use]
    pub fn as_max(&self) -> Option<(&Role, u32, &Self)> {
        match self {
            Self::Not(inner) => match inner.as_ref() {
                Self::Min(role, n, filler) => Some((role, n.saturating_sub(1), filler)),
                _ => None,
            },
            _ => None,
        }
    }

    /// The conjuncts of a conjunction; any other concept is its own conjunct.
    #[must_use]
    pub fn conjuncts(&self) -> Vec<Self> {
        match self {
            Self::And(parts) => parts.to_vec(),
            other => vec![other.clone()],
        }
    }

    /// Replace every role occurrence.
    #[must_use]
    pub fn map_roles(&self, f: &impl Fn(&Role) -> Role) -> Self {
        match self {
            Self::Top | Self::Bottom | Self::Atom(_) | Self::Value(_) | Self::Datatype(_) => {
                self.clone()
            }
            Self::OneOf(_) => self.clone(),
            Self::Not(inner) => Self::Not(Arc::new(inner.map_roles(f))),
            Self::And(parts) => Self::And(parts.iter().map(|c| c.map_roles(f)).collect()),
            Self::Or(parts) => Self::Or(parts.iter().map(|c| c.map_roles(f)).collect()),
            Self::Exists(role, filler) => Self::Exists(f(role), Arc::new(filler.map_roles(f))),
            Self::All(role, filler) => Self::All(f(role), Arc::new(filler.map_roles(f))),
            Self::Min(role, n, filler) => Self::Min(f(role), *n, Arc::new(filler.map_roles(f))),
            Self::Max(role, n, filler) => Self::Max(f(role), *n, Arc::new(filler.map_roles(f))),
        }
    }

    /// Visit this concept and every sub-concept, outermost first.
    pub fn visit(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        match self {
            Self::Not(inner) => inner.visit(f),
            Self::And(parts) | Self::Or(parts) => parts.iter().for_each(|c| c.visit(f)),
            Self::Exists(_, filler)
            | Self::All(_, filler)
            | Self::Min(_, _, filler)
            | Self::Max(_, _, filler) => filler.visit(f),
            Self::Top
            | Self::Bottom
            | Self::Atom(_)
            | Self::Value(_)
            | Self::OneOf(_)
            | Self::Datatype(_) => {}
        }
    }
}

// =============================================================================
// DISPLAY
// =============================================================================

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Concept], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{part}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("⊤"),
            Self::Bottom => f.write_str("⊥"),
            Self::Atom(name) => write!(f, "{name}"),
            Self::Not(inner) => match inner.as_ref() {
                Self::And(parts) => {
                    let negated: Vec<_> = parts.iter().map(Self::negate).collect();
                    write_joined(f, &negated, " ⊔ ")
                }
                Self::All(role, filler) => write!(f, "∃{role}.{}", filler.negate()),
                Self::Min(role, n, filler) => {
                    write!(f, "≤{} {role}.{filler}", n.saturating_sub(1))
                }
                other => write!(f, "¬{other}"),
            },
            Self::And(parts) => write_joined(f, parts, " ⊓ "),
            Self::Or(parts) => write_joined(f, parts, " ⊔ "),
            Self::Exists(role, filler) => write!(f, "∃{role}.{filler}"),
            Self::All(role, filler) => write!(f, "∀{role}.{filler}"),
            Self::Min(role, n, filler) => write!(f, "≥{n} {role}.{filler}"),
            Self::Max(role, n, filler) => write!(f, "≤{n} {role}.{filler}"),
            Self::Value(name) => write!(f, "{{{name}}}"),
            Self::OneOf(names) => {
                f.write_str("{")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}")?;
                }
                f.write_str("}")
            }
            Self::Datatype(name) => write!(f, "{name}"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Concept {
        Concept::atom("A")
    }

    fn b() -> Concept {
        Concept::atom("B")
    }

    #[test]
    fn double_negation_is_removed() {
        let c = Concept::not(Concept::not(a()));
        assert_eq!(c.normalize(), a());
    }

    #[test]
    fn union_becomes_negated_conjunction() {
        let c = Concept::or([a(), b()]).normalize();
        assert_eq!(c.shape(), Shape::Disjunction);
        assert_eq!(c.disjuncts(), Some(vec![a(), b()]));
    }

    #[test]
    fn unbounded_at_most_is_top() {
        assert_eq!(Concept::max("r", u32::MAX, a()).normalize(), Concept::Top);
        assert_eq!(Concept::max("r", u32::MAX, Concept::Top).normalize(), Concept::Top);
        let bounded = Concept::max("r", u32::MAX - 1, a()).normalize();
        assert_eq!(bounded.shape(), Shape::MaxCard);
    }

    #[test]
    fn conjunction_is_flattened_sorted_and_deduplicated() {
        let c = Concept::and([b(), Concept::and([a(), b()]), Concept::Top]).normalize();
        assert_eq!(c, Concept::And(vec![a(), b()].into()));
    }

    #[test]
    fn complementary_conjunction_folds_to_bottom() {
        let c = Concept::and([a(), Concept::not(a())]).normalize();
        assert_eq!(c, Concept::Bottom);
    }

    #[test]
    fn exists_is_negated_universal() {
        let c = Concept::exists("r", a()).normalize();
        assert_eq!(c.shape(), Shape::Existential);
        let (role, filler) = c.as_exists().expect("existential");
        assert_eq!(role.as_str(), "r");
        assert_eq!(filler, a());
    }

    #[test]
    fn max_becomes_negated_min() {
        let c = Concept::max("r", 1, Concept::Top).normalize();
        assert_eq!(c.shape(), Shape::MaxCard);
        let (role, n, filler) = c.as_max().expect("max");
        assert_eq!((role.as_str(), n, filler), ("r", 1, &Concept::Top));
    }

    #[test]
    fn small_cardinalities_fold() {
        assert_eq!(Concept::min("r", 0, a()).normalize(), Concept::Top);
        assert_eq!(
            Concept::min("r", 1, a()).normalize(),
            Concept::exists("r", a()).normalize()
        );
        assert_eq!(
            Concept::max("r", 0, a()).normalize(),
            Concept::all("r", Concept::not(a())).normalize()
        );
        assert_eq!(Concept::exists("r", Concept::Bottom).normalize(), Concept::Bottom);
        assert_eq!(Concept::all("r", Concept::Top).normalize(), Concept::Top);
    }

    #[test]
    fn normalize_is_idempotent_on_nested_terms() {
        let c = Concept::and([
            Concept::or([a(), Concept::exists("r", b())]),
            Concept::max("s", 2, Concept::not(Concept::not(b()))),
            Concept::one_of([Name::new("x"), Name::new("y")]),
        ]);
        let once = c.normalize();
        assert_eq!(once.normalize(), once);
    }

    #[test]
    fn shapes_follow_constructor() {
        assert_eq!(a().shape(), Shape::Atomic);
        assert_eq!(Concept::value("x").shape(), Shape::Nominal);
        assert_eq!(Concept::all("r", a()).normalize().shape(), Shape::Universal);
        assert_eq!(Concept::min("r", 2, a()).normalize().shape(), Shape::MinCard);
    }

    #[test]
    fn display_reads_back_user_syntax() {
        let c = Concept::and([a(), Concept::exists("r", b())]).normalize();
        assert_eq!(c.to_string(), "(A ⊓ ∃r.B)");
        let d = Concept::or([a(), b()]).normalize();
        assert_eq!(d.to_string(), "(A ⊔ B)");
    }
}
