//! Call arguments and formal matching

use crate::error::{StrataError, StrataResult};
use crate::value::{Value, VARIADIC};

/// Arguments of a call, in the order the caller supplied them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    entries: Vec<(Option<String>, Value)>,
}

impl Args {
    /// Create an empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.entries.push((None, value.into()));
        self
    }

    /// Append a named argument
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((Some(name.into()), value.into()));
        self
    }

    /// Append a positional argument in place
    pub fn push(&mut self, value: Value) {
        self.entries.push((None, value));
    }

    /// Append a named argument in place
    pub fn push_named(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((Some(name.into()), value));
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in call order
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_deref(), value))
    }

    /// Positional arguments only
    pub fn positional(&self) -> impl Iterator<Item = &Value> {
        self.entries
            .iter()
            .filter(|(name, _)| name.is_none())
            .map(|(_, value)| value)
    }

    /// Named arguments only
    pub fn named_args(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| name.as_deref().map(|n| (n, value)))
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self {
            entries: values.into_iter().map(|v| (None, v)).collect(),
        }
    }
}

/// Call arguments matched against a list of formals
///
/// Holds the caller's original values; nothing is converted during matching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    formals: Vec<(String, Option<Value>)>,
    dots: Vec<(Option<String>, Value)>,
}

impl BoundArgs {
    /// Match `args` to `params`
    ///
    /// Named arguments bind by exact name first. Remaining positional
    /// arguments fill the unbound formals that precede the variadic marker,
    /// in order. Anything left over goes to the variadic tail, or is an
    /// `InvalidArgument` error when there is none.
    pub fn bind(params: &[String], args: &Args) -> StrataResult<Self> {
        let variadic_at = params.iter().position(|p| p == VARIADIC);
        let mut formals: Vec<(String, Option<Value>)> = params
            .iter()
            .filter(|p| p.as_str() != VARIADIC)
            .map(|p| (p.clone(), None))
            .collect();
        // formals after the variadic marker can only be matched by name
        let positional_limit = variadic_at.unwrap_or(formals.len());

        let mut leftover = Vec::new();
        for (name, value) in args.iter() {
            if let Some(name) = name {
                if let Some(slot) = formals.iter_mut().find(|(formal, _)| formal == name) {
                    if slot.1.is_some() {
                        return Err(StrataError::InvalidArgument(format!(
                            "formal argument `{}` matched by multiple actual arguments",
                            name
                        )));
                    }
                    slot.1 = Some(value.clone());
                    continue;
                }
            }
            leftover.push((name, value));
        }

        let mut dots = Vec::new();
        let mut next = 0;
        for (name, value) in leftover {
            if name.is_none() {
                while next < positional_limit && formals[next].1.is_some() {
                    next += 1;
                }
                if next < positional_limit {
                    formals[next].1 = Some(value.clone());
                    next += 1;
                    continue;
                }
            }
            if variadic_at.is_none() {
                return Err(StrataError::InvalidArgument(match name {
                    Some(name) => format!("unused argument `{} = {}`", name, value.describe()),
                    None => format!("unused argument {}", value.describe()),
                }));
            }
            dots.push((name.map(str::to_string), value.clone()));
        }

        Ok(Self { formals, dots })
    }

    /// Value bound to `name`, looking at formals first and then named variadic arguments
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.formals.iter().find(|(formal, _)| formal == name) {
            Some((_, value)) => value.as_ref(),
            None => self
                .dots
                .iter()
                .find(|(n, _)| n.as_deref() == Some(name))
                .map(|(_, v)| v),
        }
    }

    /// Value bound to `name`, or `MissingArgument`
    pub fn value(&self, name: &str) -> StrataResult<&Value> {
        self.get(name)
            .ok_or_else(|| StrataError::MissingArgument(name.to_string()))
    }

    /// Check if `name` received no value
    pub fn is_missing(&self, name: &str) -> bool {
        self.get(name).is_none()
    }

    /// Formals with their bound values, in declaration order
    pub fn formals(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.formals.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// Arguments collected by the variadic tail
    pub fn dots(&self) -> &[(Option<String>, Value)] {
        &self.dots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_fill_in_order() {
        let bound = BoundArgs::bind(
            &params(&["x", "y"]),
            &Args::new().arg(1.0).arg(2.0),
        )
        .unwrap();
        assert_eq!(bound.get("x"), Some(&Value::double(1.0)));
        assert_eq!(bound.get("y"), Some(&Value::double(2.0)));
    }

    #[test]
    fn test_named_binds_before_positional() {
        let bound = BoundArgs::bind(
            &params(&["x", "y"]),
            &Args::new().arg(1.0).named("x", 9.0),
        )
        .unwrap();
        assert_eq!(bound.get("x"), Some(&Value::double(9.0)));
        assert_eq!(bound.get("y"), Some(&Value::double(1.0)));
    }

    #[test]
    fn test_missing_formal() {
        let bound = BoundArgs::bind(&params(&["x", "y"]), &Args::new().arg(1.0)).unwrap();
        assert!(bound.is_missing("y"));
        assert_eq!(
            bound.value("y"),
            Err(StrataError::MissingArgument("y".to_string()))
        );
    }

    #[test]
    fn test_surplus_goes_to_dots() {
        let bound = BoundArgs::bind(
            &params(&["x", VARIADIC]),
            &Args::new().arg(1.0).arg(2.0).named("na_rm", true),
        )
        .unwrap();
        assert_eq!(bound.dots().len(), 2);
        assert_eq!(bound.get("na_rm"), Some(&Value::logical(true)));
    }

    #[test]
    fn test_formals_after_dots_only_match_by_name() {
        let bound = BoundArgs::bind(
            &params(&["x", VARIADIC, "sep"]),
            &Args::new().arg(1.0).arg(2.0),
        )
        .unwrap();
        assert!(bound.is_missing("sep"));
        assert_eq!(bound.dots().len(), 1);
    }

    #[test]
    fn test_unused_argument_without_dots() {
        let err = BoundArgs::bind(&params(&["x"]), &Args::new().arg(1.0).arg(2.0)).unwrap_err();
        assert!(matches!(err, StrataError::InvalidArgument(_)));

        let err = BoundArgs::bind(&params(&["x"]), &Args::new().named("z", 1.0)).unwrap_err();
        assert!(err.to_string().contains("unused argument `z = <double>`"));
    }

    #[test]
    fn test_duplicate_named_argument() {
        let err = BoundArgs::bind(
            &params(&["x"]),
            &Args::new().named("x", 1.0).named("x", 2.0),
        )
        .unwrap_err();
        assert!(err.to_string().contains("matched by multiple"));
    }
}
