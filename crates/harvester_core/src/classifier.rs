use std::collections::HashSet;

use crate::{Resource, ResourceId};

/// Browser-internal, extension and blank-page schemes that are never reclaimed.
pub const DEFAULT_PROTECTED_SCHEMES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "chrome-search://",
    "chrome-untrusted://",
    "about:",
    "edge://",
    "brave://",
    "opera://",
    "vivaldi://",
    "moz-extension://",
    "view-source:",
    "devtools://",
];

/// Ids of the focused resource of every container.
pub type ActiveSet = HashSet<ResourceId>;

/// Decides which resources may be reclaimed.
///
/// Every rule must pass for a resource to be eligible; anything the
/// classifier cannot judge (such as a missing URL) is protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyClassifier {
    protected_prefixes: Vec<String>,
    protect_pinned: bool,
}

impl Default for SafetyClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PROTECTED_SCHEMES.iter().copied())
    }
}

impl SafetyClassifier {
    pub fn new<I, S>(protected_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let protected_prefixes = protected_prefixes
            .into_iter()
            .map(|prefix| prefix.as_ref().trim().to_ascii_lowercase())
            .filter(|prefix| !prefix.is_empty())
            .collect();
        Self {
            protected_prefixes,
            protect_pinned: false,
        }
    }

    /// Also protect pinned resources.
    pub fn protect_pinned(mut self, protect: bool) -> Self {
        self.protect_pinned = protect;
        self
    }

    pub fn protected_prefixes(&self) -> &[String] {
        &self.protected_prefixes
    }

    pub fn is_eligible(&self, resource: &Resource, active: &ActiveSet) -> bool {
        if active.contains(&resource.id) || resource.audible {
            return false;
        }
        if self.protect_pinned && resource.pinned {
            return false;
        }
        match resource.url() {
            Some(url) => !self.is_protected_url(url),
            None => false,
        }
    }

    pub fn is_protected_url(&self, url: &str) -> bool {
        let url = url.trim_start();
        self.protected_prefixes.iter().any(|prefix| {
            url.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
    }

    /// Eligible resources in enumeration order.
    pub fn select_candidates(&self, resources: &[Resource], active: &ActiveSet) -> Vec<Resource> {
        resources
            .iter()
            .filter(|resource| self.is_eligible(resource, active))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_normalized() {
        let classifier = SafetyClassifier::new(["  Chrome://", "", "ABOUT:"]);
        assert_eq!(classifier.protected_prefixes(), &["chrome://", "about:"]);
    }

    #[test]
    fn prefix_longer_than_url_is_not_a_match() {
        let classifier = SafetyClassifier::new(["chrome-extension://"]);
        assert!(!classifier.is_protected_url("chrome"));
    }

    #[test]
    fn multibyte_urls_do_not_panic() {
        let classifier = SafetyClassifier::default();
        assert!(!classifier.is_protected_url("https://例え.jp/"));
        assert!(!classifier.is_protected_url("éé"));
    }
}
