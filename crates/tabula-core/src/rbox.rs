//! # Role Box
//!
//! The role registry consulted by the completion rules: sub-role closure,
//! inverses, functionality, transitivity, data roles, domains and ranges.
//!
//! Declarations are collected with the `declare_*`/`add_*` methods and then
//! compiled by `prepare`, which computes the reflexive-transitive super-role
//! closure and propagates every property across inverse pairs.
//!
//! Object roles without a declared inverse get the synthetic inverse
//! `inv(r)`. If `s` is declared inverse of `r`, the name `inv(r)` is
//! canonicalized to `s`.

use crate::axiom::Axiom;
use crate::concept::Concept;
use crate::depset::DependencySet;
use crate::types::Role;
use std::collections::{BTreeMap, BTreeSet};

/// Declared properties of one role.
#[derive(Debug, Clone, Default)]
struct RoleDecl {
    super_roles: BTreeSet<Role>,
    inverse: Option<Role>,
    functional: bool,
    inverse_functional: bool,
    transitive: bool,
    datatype: bool,
    domain: Vec<(Concept, Axiom)>,
    range: Vec<(Concept, Axiom)>,
}

/// Compiled properties of one role.
#[derive(Debug, Clone, Default)]
struct RoleInfo {
    supers: BTreeSet<Role>,
    subs: BTreeSet<Role>,
    inverse: Option<Role>,
    functional: Option<Axiom>,
    transitive: bool,
    datatype: bool,
    domains: Vec<(Concept, Axiom)>,
    ranges: Vec<(Concept, Axiom)>,
}

/// The role registry.
#[derive(Debug, Clone, Default)]
pub struct RoleBox {
    declared: BTreeMap<Role, RoleDecl>,
    aliases: BTreeMap<Role, Role>,
    roles: BTreeMap<Role, RoleInfo>,
}

// =============================================================================
// DECLARATIONS
// =============================================================================

impl RoleBox {
    /// Create an empty role box.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn decl(&mut self, role: &Role) -> &mut RoleDecl {
        let role = self.canonical(role);
        self.declared.entry(role).or_default()
    }

    /// Make `role` known without any property.
    pub fn declare(&mut self, role: &Role) {
        self.decl(role);
    }

    /// `sub ⊑ sup`
    pub fn add_sub_role(&mut self, sub: &Role, sup: &Role) {
        self.decl(sup);
        self.decl(sub).super_roles.insert(sup.clone());
    }

    /// Declare `inverse` as the inverse of `role`.
    ///
    /// Inverse pairs should be declared before other properties so that
    /// properties stated on `inv(role)` land on `inverse`.
    pub fn add_inverse(&mut self, role: &Role, inverse: &Role) {
        self.aliases
            .insert(role.syntactic_inverse(), inverse.clone());
        self.aliases
            .insert(inverse.syntactic_inverse(), role.clone());
        self.decl(role).inverse = Some(inverse.clone());
        self.decl(inverse).inverse = Some(role.clone());
    }

    /// `⊤ ⊑ ≤1 role`
    pub fn set_functional(&mut self, role: &Role) {
        self.decl(role).functional = true;
    }

    /// `⊤ ⊑ ≤1 role⁻`
    pub fn set_inverse_functional(&mut self, role: &Role) {
        self.decl(role).inverse_functional = true;
    }

    /// `role ∘ role ⊑ role`
    pub fn set_transitive(&mut self, role: &Role) {
        self.decl(role).transitive = true;
    }

    /// Mark `role` as a data role. Data roles have no inverse.
    pub fn set_datatype_role(&mut self, role: &Role) {
        self.decl(role).datatype = true;
    }

    /// Add a domain class.
    pub fn add_domain(&mut self, role: &Role, class: Concept, axiom: Axiom) {
        self.decl(role).domain.push((class, axiom));
    }

    /// Add a range class (or datatype, for data roles).
    pub fn add_range(&mut self, role: &Role, class: Concept, axiom: Axiom) {
        self.decl(role).range.push((class, axiom));
    }
}

// =============================================================================
// COMPILATION
// =============================================================================

impl RoleBox {
    /// Compute closures and inverse propagation.
    ///
    /// Must be called after the last declaration and before any query.
    pub fn prepare(&mut self) {
        self.roles.clear();

        // Canonical inverse of every object role.
        let names: Vec<Role> = self.declared.keys().cloned().collect();
        let mut inverse_of: BTreeMap<Role, Role> = BTreeMap::new();
        for role in &names {
            let Some(decl) = self.declared.get(role) else {
                continue;
            };
            if decl.datatype {
                continue;
            }
            let inverse = match &decl.inverse {
                Some(declared) => declared.clone(),
                None => role.syntactic_inverse(),
            };
            inverse_of.insert(inverse.clone(), role.clone());
            inverse_of.insert(role.clone(), inverse);
        }

        let all_roles: BTreeSet<Role> = names.iter().chain(inverse_of.keys()).cloned().collect();

        // Direct super edges, mirrored across inverses.
        let mut direct: BTreeMap<Role, BTreeSet<Role>> = BTreeMap::new();
        for role in &names {
            let Some(decl) = self.declared.get(role) else {
                continue;
            };
            for sup in &decl.super_roles {
                let sup = self.canonical(sup);
                direct.entry(role.clone()).or_default().insert(sup.clone());
                if let (Some(inv_sub), Some(inv_sup)) = (inverse_of.get(role), inverse_of.get(&sup))
                {
                    direct
                        .entry(inv_sub.clone())
                        .or_default()
                        .insert(inv_sup.clone());
                }
            }
        }

        for role in &all_roles {
            let mut supers = BTreeSet::new();
            let mut stack = vec![role.clone()];
            while let Some(next) = stack.pop() {
                if supers.insert(next.clone()) {
                    if let Some(ups) = direct.get(&next) {
                        stack.extend(ups.iter().cloned());
                    }
                }
            }
            let info = self.roles.entry(role.clone()).or_default();
            info.supers = supers;
            info.inverse = inverse_of.get(role).cloned();
        }

        let pairs: Vec<(Role, Role)> = self
            .roles
            .iter()
            .flat_map(|(role, info)| info.supers.iter().map(|s| (s.clone(), role.clone())))
            .collect();
        for (sup, sub) in pairs {
            self.roles.entry(sup).or_default().subs.insert(sub);
        }

        // Local properties, then propagation across inverses.
        for role in &all_roles {
            let own = self.declared.get(role).cloned().unwrap_or_default();
            let inverse_decl = inverse_of
                .get(role)
                .and_then(|inv| self.declared.get(inv))
                .cloned()
                .unwrap_or_default();

            let functional = if own.functional {
                Some(Axiom::FunctionalRole { role: role.clone() })
            } else if inverse_decl.inverse_functional {
                inverse_of
                    .get(role)
                    .map(|inv| Axiom::InverseFunctionalRole { role: inv.clone() })
            } else {
                None
            };

            let info = self.roles.entry(role.clone()).or_default();
            info.functional = functional;
            info.transitive = own.transitive || inverse_decl.transitive;
            info.datatype = own.datatype;
        }

        // Domains and ranges are inherited from super roles; the range of
        // an inverse is a domain and vice versa.
        for role in &all_roles {
            let supers = self
                .roles
                .get(role)
                .map(|info| info.supers.clone())
                .unwrap_or_default();
            let mut domains = Vec::new();
            let mut ranges = Vec::new();
            for sup in &supers {
                if let Some(decl) = self.declared.get(sup) {
                    domains.extend(decl.domain.iter().cloned());
                    ranges.extend(decl.range.iter().cloned());
                }
                if let Some(decl) = inverse_of.get(sup).and_then(|inv| self.declared.get(inv)) {
                    domains.extend(decl.range.iter().cloned());
                    ranges.extend(decl.domain.iter().cloned());
                }
            }
            let info = self.roles.entry(role.clone()).or_default();
            info.domains = domains;
            info.ranges = ranges;
        }
    }
}

// =============================================================================
// QUERIES
// =============================================================================

impl RoleBox {
    /// Map a synthetic inverse name to the declared inverse, if any.
    #[must_use]
    pub fn canonical(&self, role: &Role) -> Role {
        self.aliases.get(role).cloned().unwrap_or_else(|| role.clone())
    }

    /// Whether the role was declared or synthesized.
    #[must_use]
    pub fn is_known(&self, role: &Role) -> bool {
        self.roles.contains_key(role)
    }

    /// The inverse of an object role. Data roles have none.
    #[must_use]
    pub fn inverse(&self, role: &Role) -> Option<Role> {
        match self.roles.get(role) {
            Some(info) => info.inverse.clone(),
            None => Some(role.syntactic_inverse()),
        }
    }

    /// `sub ⊑ sup`, reflexively.
    #[must_use]
    pub fn is_sub_role_of(&self, sub: &Role, sup: &Role) -> bool {
        if sub == sup {
            return true;
        }
        self.roles
            .get(sub)
            .is_some_and(|info| info.supers.contains(sup))
    }

    /// Every super role, including `role` itself.
    #[must_use]
    pub fn super_roles(&self, role: &Role) -> Vec<Role> {
        match self.roles.get(role) {
            Some(info) => info.supers.iter().cloned().collect(),
            None => vec![role.clone()],
        }
    }

    /// Every sub role, including `role` itself.
    #[must_use]
    pub fn sub_roles(&self, role: &Role) -> Vec<Role> {
        match self.roles.get(role) {
            Some(info) if !info.subs.is_empty() => info.subs.iter().cloned().collect(),
            _ => vec![role.clone()],
        }
    }

    /// Transitive roles `s` with `s ⊑ role`.
    #[must_use]
    pub fn transitive_sub_roles(&self, role: &Role) -> Vec<Role> {
        self.sub_roles(role)
            .into_iter()
            .filter(|s| self.is_transitive(s))
            .collect()
    }

    /// Whether the role is functional, directly or via its inverse.
    #[must_use]
    pub fn is_functional(&self, role: &Role) -> bool {
        self.functional_axiom(role).is_some()
    }

    /// The axiom making `role` functional.
    #[must_use]
    pub fn functional_axiom(&self, role: &Role) -> Option<&Axiom> {
        self.roles.get(role).and_then(|info| info.functional.as_ref())
    }

    /// Functional super roles of `role`, including itself.
    #[must_use]
    pub fn functional_supers(&self, role: &Role) -> Vec<Role> {
        self.super_roles(role)
            .into_iter()
            .filter(|s| self.is_functional(s))
            .collect()
    }

    /// Whether the role is transitive.
    #[must_use]
    pub fn is_transitive(&self, role: &Role) -> bool {
        self.roles.get(role).is_some_and(|info| info.transitive)
    }

    /// Whether the role is a data role.
    #[must_use]
    pub fn is_datatype_role(&self, role: &Role) -> bool {
        self.roles.get(role).is_some_and(|info| info.datatype)
    }

    /// Effective domain classes of `role` with their justification.
    pub fn domains(&self, role: &Role) -> impl Iterator<Item = (&Concept, DependencySet)> {
        self.roles
            .get(role)
            .into_iter()
            .flat_map(|info| info.domains.iter())
            .map(|(c, axiom)| (c, DependencySet::from_axiom(axiom.clone())))
    }

    /// Effective range classes of `role` with their justification.
    pub fn ranges(&self, role: &Role) -> impl Iterator<Item = (&Concept, DependencySet)> {
        self.roles
            .get(role)
            .into_iter()
            .flat_map(|info| info.ranges.iter())
            .map(|(c, axiom)| (c, DependencySet::from_axiom(axiom.clone())))
    }

    /// Canonicalize roles in, and normalize, every domain and range class.
    pub(crate) fn normalize_classes(&mut self) {
        let aliases = &self.aliases;
        let canonical = |c: &Concept| {
            c.map_roles(&|r| aliases.get(r).cloned().unwrap_or_else(|| r.clone()))
                .normalize()
        };
        for decl in self.declared.values_mut() {
            for (c, _) in decl.domain.iter_mut().chain(decl.range.iter_mut()) {
                *c = canonical(c);
            }
        }
        for info in self.roles.values_mut() {
            for (c, _) in info.domains.iter_mut().chain(info.ranges.iter_mut()) {
                *c = canonical(c);
            }
        }
    }

    /// Whether any role has a declared or implied inverse in use.
    #[must_use]
    pub fn has_declared_inverses(&self) -> bool {
        self.declared.values().any(|d| d.inverse.is_some() || d.inverse_functional)
    }

    /// Whether any role has a super role.
    #[must_use]
    pub fn has_hierarchy(&self) -> bool {
        self.declared.values().any(|d| !d.super_roles.is_empty())
    }

    /// Whether any role is functional.
    #[must_use]
    pub fn has_functional(&self) -> bool {
        self.roles.values().any(|info| info.functional.is_some())
    }

    /// Whether any role is transitive.
    #[must_use]
    pub fn has_transitive(&self) -> bool {
        self.declared.values().any(|d| d.transitive)
    }

    /// Whether any data role exists.
    #[must_use]
    pub fn has_datatype_roles(&self) -> bool {
        self.declared.values().any(|d| d.datatype)
    }
}

// =============================================================================
// TESTS
// =============================================================================
