use crate::method::CheckMethod;
use serde::{Deserialize, Serialize};

/// Which methods to try and how to judge the versions a server accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    methods: Vec<CheckMethod>,
    good_versions: Vec<String>,
    bad_versions: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            methods: vec![
                CheckMethod::Negotiate,
                CheckMethod::Tls13,
                CheckMethod::Tls12,
                CheckMethod::Tls11,
                CheckMethod::Tls10,
            ],
            good_versions: vec!["TLSv1.3".into(), "TLSv1.2".into()],
            bad_versions: vec!["TLSv1.1".into(), "TLSv1".into()],
        }
    }
}

impl Policy {
    pub fn methods(&self) -> &[CheckMethod] {
        &self.methods
    }

    pub fn good_versions(&self) -> &[String] {
        &self.good_versions
    }

    pub fn bad_versions(&self) -> &[String] {
        &self.bad_versions
    }

    pub fn set_methods(&mut self, methods: &[CheckMethod]) {
        self.methods = methods.to_vec();
    }

    pub fn set_good_versions<S: AsRef<str>>(&mut self, versions: &[S]) {
        self.good_versions = versions.iter().map(|v| v.as_ref().to_string()).collect();
    }

    pub fn set_bad_versions<S: AsRef<str>>(&mut self, versions: &[S]) {
        self.bad_versions = versions.iter().map(|v| v.as_ref().to_string()).collect();
    }

    pub fn with_methods(mut self, methods: &[CheckMethod]) -> Self {
        self.set_methods(methods);
        self
    }

    pub fn with_good_versions<S: AsRef<str>>(mut self, versions: &[S]) -> Self {
        self.set_good_versions(versions);
        self
    }

    pub fn with_bad_versions<S: AsRef<str>>(mut self, versions: &[S]) -> Self {
        self.set_bad_versions(versions);
        self
    }

    /// Good only when at least one acceptable version is offered and no
    /// unacceptable one is: offering both still leaves a downgrade path.
    pub fn evaluate(&self, supported: &[String]) -> bool {
        let ok = supported.iter().any(|v| self.good_versions.contains(v));
        let ng = supported.iter().any(|v| self.bad_versions.contains(v));
        ok && !ng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn modern_only_is_good() {
        let policy = Policy::default();
        assert!(policy.evaluate(&versions(&["TLSv1.3", "TLSv1.2"])));
        assert!(policy.evaluate(&versions(&["TLSv1.2"])));
    }

    #[test]
    fn legacy_support_fails_even_with_modern() {
        let policy = Policy::default();
        assert!(!policy.evaluate(&versions(&["TLSv1.2", "TLSv1"])));
        assert!(!policy.evaluate(&versions(&["TLSv1.1"])));
    }

    #[test]
    fn empty_or_unknown_is_not_good() {
        let policy = Policy::default();
        assert!(!policy.evaluate(&[]));
        assert!(!policy.evaluate(&versions(&["TLS"])));
    }

    #[test]
    fn setters_replace_lists_wholesale() {
        let mut source = vec!["TLSv1.3".to_string()];
        let mut policy = Policy::default();
        policy.set_good_versions(&source);
        policy.set_bad_versions::<&str>(&[]);
        policy.set_methods(&[CheckMethod::Tls13]);
        source.push("TLSv1".into());

        assert_eq!(policy.good_versions(), ["TLSv1.3".to_string()]);
        assert!(policy.bad_versions().is_empty());
        assert_eq!(policy.methods(), [CheckMethod::Tls13]);
        assert!(!policy.evaluate(&versions(&["TLSv1.2"])));
        assert!(policy.evaluate(&versions(&["TLSv1.3", "TLSv1"])));
    }
}
