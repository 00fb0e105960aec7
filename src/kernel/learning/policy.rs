//! Which property changes enter the undo history.

use std::error::Error;
use std::fmt;

use regex::Regex;

use crate::kernel::services::ports::{HistoryConfig, UndoAction, UndoRule};

#[derive(Debug)]
pub struct PolicyError {
    pub pattern: String,
    pub source: regex::Error,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid undo rule pattern {:?}: {}", self.pattern, self.source)
    }
}

impl Error for PolicyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Ordered rule table; the first rule whose pattern matches
/// `<target>.<property>` decides, otherwise the change is recorded.
#[derive(Debug, Clone, Default)]
pub struct UndoPolicy {
    rules: Vec<(Regex, UndoAction)>,
}

impl UndoPolicy {
    pub fn new(rules: &[UndoRule]) -> Result<Self, PolicyError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.action.clone()))
                    .map_err(|source| PolicyError {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Like [`Self::new`] but drops rules whose pattern does not compile.
    pub fn from_config(config: &HistoryConfig) -> Self {
        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            match Regex::new(&rule.pattern) {
                Ok(re) => rules.push((re, rule.action.clone())),
                Err(error) => {
                    tracing::warn!(pattern = %rule.pattern, %error, "ignoring undo rule");
                }
            }
        }
        Self { rules }
    }

    pub fn decide(&self, target: &str, property: &str) -> UndoAction {
        let path = format!("{}.{}", target, property);
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(&path))
            .map(|(_, action)| action.clone())
            .unwrap_or(UndoAction::Record)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
