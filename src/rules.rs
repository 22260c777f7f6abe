//! Repository rule matching

use regex::Regex;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, RepositoryConfig};

/// A configured repository rule with its name pattern compiled.
#[derive(Debug, Clone)]
pub struct RepositoryRule {
    pub name: String,
    pub pattern: Regex,
    pub secret: String,
    pub commands: Vec<String>,
}

impl RepositoryRule {
    pub fn compile(repo: &RepositoryConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            name: repo.name.clone(),
            pattern: Regex::new(&repo.name)?,
            secret: repo.secret.clone(),
            commands: repo.commands.clone(),
        })
    }

    pub fn matches_name(&self, repo_full_name: &str) -> bool {
        self.pattern.is_match(repo_full_name)
    }

    /// Returns true if the rule has no secret or the incoming one is identical.
    pub fn accepts_secret(&self, incoming_secret: &str) -> bool {
        self.secret.is_empty() || self.secret == incoming_secret
    }
}

/// Immutable snapshot of everything a request handler needs.
/// Replaced as a whole on reload.
#[derive(Debug, Clone)]
pub struct HookConfig {
    pub rules: Vec<RepositoryRule>,
    pub command_timeout: Duration,
}

impl HookConfig {
    /// Compile every rule once. A rule with an invalid pattern is logged and skipped.
    pub fn from_config(config: &Config) -> Self {
        let rules = config
            .repositories
            .iter()
            .filter_map(|repo| match RepositoryRule::compile(repo) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!("Skipping repository rule '{}': invalid pattern: {}", repo.name, e);
                    None
                }
            })
            .collect::<Vec<_>>();

        info!(
            "Loaded {} of {} repository rules",
            rules.len(),
            config.repositories.len()
        );

        Self {
            rules,
            command_timeout: Duration::from_secs(config.command_timeout_secs()),
        }
    }
}

/// Returns every rule whose pattern matches `repo_full_name` and whose secret check
/// passes, in configuration order. Rules are tested independently.
pub fn find_matches<'a>(
    rules: &'a [RepositoryRule],
    repo_full_name: &str,
    incoming_secret: &str,
) -> Vec<&'a RepositoryRule> {
    rules
        .iter()
        .filter(|rule| rule.matches_name(repo_full_name))
        .filter(|rule| {
            let accepted = rule.accepts_secret(incoming_secret);
            if !accepted {
                warn!(
                    "secret mismatch for repository rule '{}' (repository '{}')",
                    rule.name, repo_full_name
                );
            }
            accepted
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, secret: &str, commands: &[&str]) -> RepositoryConfig {
        RepositoryConfig {
            secret: secret.to_string(),
            name: name.to_string(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn rules(repos: Vec<RepositoryConfig>) -> Vec<RepositoryRule> {
        let config = Config {
            logfile: None,
            address: "127.0.0.1".to_string(),
            port: 8080,
            command_timeout: None,
            repositories: repos,
        };
        HookConfig::from_config(&config).rules
    }

    fn names(matched: &[&RepositoryRule]) -> Vec<String> {
        matched.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn empty_secret_accepts_anything() {
        let rules = rules(vec![repo("acme/widgets", "", &["/bin/true"])]);
        for incoming in ["", "whatever", "S3CR3T"] {
            assert_eq!(find_matches(&rules, "acme/widgets", incoming).len(), 1);
        }
    }

    #[test]
    fn secret_must_match_exactly() {
        let rules = rules(vec![repo("acme/widgets", "s3cr3t", &["/bin/true"])]);
        assert_eq!(find_matches(&rules, "acme/widgets", "s3cr3t").len(), 1);
        assert!(find_matches(&rules, "acme/widgets", "wrong").is_empty());
        assert!(find_matches(&rules, "acme/widgets", "S3CR3T").is_empty());
        assert!(find_matches(&rules, "acme/widgets", "").is_empty());
        assert!(find_matches(&rules, "acme/widgets", "s3cr3t ").is_empty());
    }

    #[test]
    fn every_matching_rule_is_returned_in_order() {
        let rules = rules(vec![
            repo("acme/.*", "", &["/opt/a"]),
            repo("other/.*", "", &["/opt/b"]),
            repo("widgets$", "", &["/opt/c"]),
        ]);
        let matched = find_matches(&rules, "acme/widgets", "");
        assert_eq!(names(&matched), vec!["acme/.*", "widgets$"]);
    }

    #[test]
    fn pattern_is_not_anchored() {
        let rules = rules(vec![repo("widgets", "", &[])]);
        assert_eq!(find_matches(&rules, "acme/widgets-legacy", "").len(), 1);
        assert!(find_matches(&rules, "acme/gadgets", "").is_empty());
    }

    #[test]
    fn invalid_pattern_skips_only_that_rule() {
        let rules = rules(vec![
            repo("acme/(unclosed", "", &["/opt/a"]),
            repo("acme/.*", "", &["/opt/b"]),
        ]);
        assert_eq!(rules.len(), 1);
        let matched = find_matches(&rules, "acme/widgets", "");
        assert_eq!(names(&matched), vec!["acme/.*"]);
    }

    #[test]
    fn secret_mismatch_does_not_hide_other_rules() {
        let rules = rules(vec![
            repo("acme/.*", "s3cr3t", &["/opt/a"]),
            repo("acme/.*", "", &["/opt/b"]),
        ]);
        let matched = find_matches(&rules, "acme/widgets", "wrong");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].commands, vec!["/opt/b"]);
    }

    #[test]
    fn no_rules_no_matches() {
        assert!(find_matches(&[], "acme/widgets", "").is_empty());
    }

    #[test]
    fn timeout_comes_from_config() {
        let config = Config {
            logfile: None,
            address: "127.0.0.1".to_string(),
            port: 8080,
            command_timeout: Some(7),
            repositories: vec![],
        };
        assert_eq!(
            HookConfig::from_config(&config).command_timeout,
            Duration::from_secs(7)
        );
    }
}
