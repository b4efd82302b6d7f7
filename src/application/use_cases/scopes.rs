use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Resources exposed through the v1 API.
const SCOPE_RESOURCES: &[&str] = &[
    "properties",
    "buildings",
    "tenants",
    "leases",
    "payments",
    "invoices",
    "reports",
    "webhooks",
    "admin",
];

const SCOPE_ACTIONS: &[&str] = &["read", "write"];

/// The closed catalogue of grantable `resource:action` scopes.
static SCOPE_CATALOGUE: Lazy<HashSet<String>> = Lazy::new(|| {
    let mut catalogue = HashSet::new();
    for resource in SCOPE_RESOURCES {
        for action in SCOPE_ACTIONS {
            catalogue.insert(format!("{resource}:{action}"));
        }
    }
    // Actions outside the read/write grid.
    catalogue.insert("payments:refund".to_string());
    catalogue
});

/// A scope is valid if it is in the catalogue, or is a one-level resource
/// wildcard (`resource:*`). No deeper wildcard levels exist.
pub fn is_valid_scope(scope: &str) -> bool {
    scope.ends_with(":*") || SCOPE_CATALOGUE.contains(scope)
}

/// Split a space-delimited scope string, dropping empties and anything
/// outside the catalogue. Order and duplicates are preserved as given.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace()
        .map(str::trim)
        .filter(|s| !s.is_empty() && is_valid_scope(s))
        .map(str::to_string)
        .collect()
}

/// Granted scopes indexed for lookup: exact grants in one set, wildcard
/// resources in another. Matching never falls back to string suffix
/// comparison on the required scope.
pub struct ScopeSet<'a> {
    exact: HashSet<&'a str>,
    wildcard_resources: HashSet<&'a str>,
}

impl<'a> ScopeSet<'a> {
    pub fn new(granted: &'a [String]) -> Self {
        let mut exact = HashSet::new();
        let mut wildcard_resources = HashSet::new();
        for scope in granted {
            match scope.strip_suffix(":*") {
                Some(resource) => {
                    wildcard_resources.insert(resource);
                }
                None => {
                    exact.insert(scope.as_str());
                }
            }
        }
        Self {
            exact,
            wildcard_resources,
        }
    }

    /// `required` is satisfied by a verbatim grant or by a `resource:*`
    /// grant covering its resource.
    pub fn allows(&self, required: &str) -> bool {
        if self.exact.contains(required) {
            return true;
        }
        match required.split_once(':') {
            Some((resource, _)) => self.wildcard_resources.contains(resource),
            None => false,
        }
    }

    /// The subset of `required` not covered by this grant.
    pub fn missing(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|scope| !self.allows(scope))
            .map(|scope| scope.to_string())
            .collect()
    }
}

/// Convenience for one-off checks.
pub fn has_scope(granted: &[String], required: &str) -> bool {
    ScopeSet::new(granted).allows(required)
}
