use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    backend: fancy_regex::Regex,
}

impl Pattern {
    pub(crate) fn new(source: &str) -> Result<Self, PatternError> {
        let backend = fancy_regex::Regex::new(source).map_err(PatternError::from)?;
        Ok(Self { backend })
    }

    pub(crate) fn is_match(&self, input: &str) -> Result<bool, PatternError> {
        self.backend.is_match(input).map_err(PatternError::from)
    }

    pub(crate) fn captures(&self, input: &str) -> Result<Option<Captures>, PatternError> {
        let captures = self.backend.captures(input).map_err(PatternError::from)?;
        Ok(captures.as_ref().map(Captures::from_backend))
    }
}

/// Owned capture groups, index 0 being the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Captures {
    groups: Vec<Option<String>>,
}

impl Captures {
    fn from_backend(captures: &fancy_regex::Captures<'_>) -> Self {
        let mut groups = Vec::with_capacity(captures.len());
        for idx in 0..captures.len() {
            groups.push(captures.get(idx).map(|m| m.as_str().to_string()));
        }
        Self { groups }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|group| group.as_deref())
    }

    /// Every group as a string, unmatched groups as empty strings.
    pub(crate) fn to_vec(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|group| group.clone().unwrap_or_default())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PatternError {
    message: String,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PatternError {}

impl From<fancy_regex::Error> for PatternError {
    fn from(value: fancy_regex::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

thread_local! {
    static COMPILED: RefCell<HashMap<&'static str, Option<Rc<Pattern>>>> =
        RefCell::new(HashMap::new());
}

/// Compiles `source` once per thread. A pattern that fails to compile is
/// remembered as `None`.
fn compiled(source: &'static str) -> Option<Rc<Pattern>> {
    COMPILED.with(|cache| {
        cache
            .borrow_mut()
            .entry(source)
            .or_insert_with(|| Pattern::new(source).ok().map(Rc::new))
            .clone()
    })
}

/// Whole-input test; a pattern that fails to compile or run never matches.
pub(crate) fn matches(source: &'static str, input: &str) -> bool {
    compiled(source).is_some_and(|pattern| matches!(pattern.is_match(input), Ok(true)))
}

pub(crate) fn captures(source: &'static str, input: &str) -> Option<Captures> {
    compiled(source).and_then(|pattern| pattern.captures(input).ok().flatten())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_keep_group_zero_as_whole_match() -> Result<(), PatternError> {
        let pattern = Pattern::new(r"^(\d+)-(\d+)$")?;
        let captures = pattern.captures("12-34")?.ok_or_else(|| PatternError {
            message: "expected a match".into(),
        })?;
        assert_eq!(captures.get(0), Some("12-34"));
        assert_eq!(captures.get(1), Some("12"));
        assert_eq!(captures.get(2), Some("34"));
        assert_eq!(captures.get(3), None);
        assert_eq!(captures.to_vec(), vec!["12-34", "12", "34"]);
        Ok(())
    }

    #[test]
    fn compiled_patterns_are_shared_per_source() {
        let first = compiled(r"^[0-9]+$");
        let second = compiled(r"^[0-9]+$");
        assert!(matches!((&first, &second), (Some(a), Some(b)) if Rc::ptr_eq(a, b)));
        assert!(matches(r"^[0-9]+$", "42"));
    }

    #[test]
    fn invalid_patterns_never_match() {
        assert!(!matches("(", "("));
        assert!(captures("(", "(").is_none());
        assert!(compiled("(").is_none());
    }
}
