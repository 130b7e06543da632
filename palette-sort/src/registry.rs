//! Method registry.
//!
//! Each algorithm family declares lists of parameter values. The builder
//! explodes every family into the cartesian product of its lists, one
//! concrete method per combination, with ids like `RAMPA:[12,0.05,cl]`.
//! The result is immutable and every id in it is unique.

use std::collections::HashMap;
use std::fmt;

use color_lib::{Color, ColorSpace, Context};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::algorithms;
use crate::error::{RegistryError, SortError};
use crate::runner::SortFn;

/// Relative cost hint. Slow methods are dispatched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Speed {
    Fast,
    Medium,
    Slow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Float(f64),
    Name(&'static str),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Int(x) => write!(f, "{x}"),
            Param::Float(x) => write!(f, "{x}"),
            Param::Name(x) => f.write_str(x),
        }
    }
}

pub fn ints(xs: &[i64]) -> Vec<Param> {
    xs.iter().map(|&x| Param::Int(x)).collect()
}

pub fn floats(xs: &[f64]) -> Vec<Param> {
    xs.iter().map(|&x| Param::Float(x)).collect()
}

pub fn names(xs: &[&'static str]) -> Vec<Param> {
    xs.iter().map(|&x| Param::Name(x)).collect()
}

/// Typed access to one combination of a family's parameters.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    family: &'static str,
    params: &'a [Param],
}

impl<'a> Args<'a> {
    fn bad(&self, index: usize, expected: &'static str) -> RegistryError {
        RegistryError::BadParam {
            family: self.family,
            index,
            expected,
        }
    }

    pub fn name(&self, index: usize) -> Result<&'static str, RegistryError> {
        match self.params.get(index) {
            Some(Param::Name(x)) => Ok(x),
            _ => Err(self.bad(index, "a name")),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64, RegistryError> {
        match self.params.get(index) {
            Some(Param::Int(x)) => Ok(*x),
            _ => Err(self.bad(index, "an integer")),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64, RegistryError> {
        match self.params.get(index) {
            Some(Param::Float(x)) => Ok(*x),
            Some(Param::Int(x)) => Ok(*x as f64),
            _ => Err(self.bad(index, "a number")),
        }
    }

    pub fn space(&self, index: usize) -> Result<ColorSpace, RegistryError> {
        Ok(self.name(index)?.parse()?)
    }
}

pub type ValidFn = fn(&[Color]) -> bool;
pub type BuildFn = fn(String, Args) -> Result<SortFn, RegistryError>;

/// An algorithm together with the parameter grid it is registered over.
pub struct Family {
    pub name: &'static str,
    pub speed: Speed,
    pub params: Vec<Vec<Param>>,
    pub valid: Option<ValidFn>,
    pub build: BuildFn,
}

impl Family {
    pub fn new(name: &'static str, speed: Speed, build: BuildFn) -> Self {
        Self {
            name,
            speed,
            params: Vec::new(),
            valid: None,
            build,
        }
    }

    pub fn param(mut self, values: Vec<Param>) -> Self {
        self.params.push(values);
        self
    }

    pub fn valid(mut self, valid: ValidFn) -> Self {
        self.valid = Some(valid);
        self
    }

    fn explode(&self) -> Result<Vec<SortingMethod>, RegistryError> {
        let combinations: Vec<Vec<Param>> = if self.params.is_empty() {
            vec![Vec::new()]
        } else {
            self.params
                .iter()
                .map(|values| values.iter().cloned())
                .multi_cartesian_product()
                .collect()
        };
        combinations
            .into_iter()
            .map(|params| {
                let id = method_id(self.name, &params);
                let args = Args {
                    family: self.name,
                    params: &params,
                };
                let sort = (self.build)(id.clone(), args)?;
                Ok(SortingMethod {
                    id,
                    family: self.name,
                    speed: self.speed,
                    sort,
                    valid: self.valid,
                })
            })
            .collect()
    }
}

pub fn method_id(name: &str, params: &[Param]) -> String {
    if params.is_empty() {
        name.to_string()
    } else {
        format!("{}:[{}]", name, params.iter().join(","))
    }
}

#[derive(Clone)]
pub struct SortingMethod {
    pub id: String,
    pub family: &'static str,
    pub speed: Speed,
    sort: SortFn,
    valid: Option<ValidFn>,
}

impl fmt::Debug for SortingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortingMethod")
            .field("id", &self.id)
            .field("speed", &self.speed)
            .field("valid", &self.valid.is_some())
            .finish()
    }
}

impl SortingMethod {
    pub fn new(id: impl Into<String>, speed: Speed, sort: SortFn) -> Self {
        Self {
            id: id.into(),
            family: "",
            speed,
            sort,
            valid: None,
        }
    }

    pub fn is_valid(&self, colors: &[Color]) -> bool {
        self.valid.map_or(true, |valid| valid(colors))
    }

    /// Sorts `colors`. A method whose validity check rejects the palette
    /// is not invoked at all.
    pub fn sort(&self, colors: &[Color], ctx: &mut Context) -> Result<Vec<Color>, SortError> {
        if !self.is_valid(colors) {
            return Err(SortError::InvalidInput {
                method: self.id.clone(),
                len: colors.len(),
            });
        }
        (self.sort)(colors, ctx)
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    families: Vec<Family>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family(mut self, family: Family) -> Self {
        self.families.push(family);
        self
    }

    pub fn families(mut self, families: impl IntoIterator<Item = Family>) -> Self {
        self.families.extend(families);
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut methods = Vec::new();
        let mut index = HashMap::new();
        for family in &self.families {
            for method in family.explode()? {
                if index.insert(method.id.clone(), methods.len()).is_some() {
                    return Err(RegistryError::DuplicateId(method.id));
                }
                methods.push(method);
            }
        }
        Ok(Registry { methods, index })
    }
}

pub struct Registry {
    methods: Vec<SortingMethod>,
    index: HashMap<String, usize>,
}

pub static STANDARD: Lazy<Registry> =
    Lazy::new(|| Registry::standard().expect("standard method ids are unique"));

impl Registry {
    /// Every built-in family.
    pub fn standard() -> Result<Registry, RegistryError> {
        RegistryBuilder::new()
            .families(algorithms::families())
            .build()
    }

    pub fn get(&self, id: &str) -> Option<&SortingMethod> {
        self.index.get(id).map(|&i| &self.methods[i])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn methods(&self) -> &[SortingMethod] {
        &self.methods
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Positions of the methods whose id matches `pattern`.
    pub fn matching(&self, pattern: &Regex) -> Vec<usize> {
        self.methods
            .iter()
            .positions(|m| pattern.is_match(&m.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn identity(_id: String, _args: Args) -> Result<SortFn, RegistryError> {
        Ok(Arc::new(|colors: &[Color], _ctx: &mut Context| Ok(colors.to_vec())))
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = Registry::standard().unwrap();
        let ids: HashSet<&str> = registry.methods().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), registry.len());
        assert!(registry.len() > 100);
        assert!(registry.get("RAMPA:[12,0.05,cl]").is_some());
        assert!(registry.get("NONE").is_some());
    }

    #[test]
    fn test_explodes_cartesian_product() {
        let registry = RegistryBuilder::new()
            .family(
                Family::new("T", Speed::Fast, identity)
                    .param(ints(&[1, 2]))
                    .param(names(&["a", "b", "c"])),
            )
            .build()
            .unwrap();
        let ids = registry.methods().iter().map(|m| m.id.clone()).collect_vec();
        assert_eq!(
            ids,
            vec!["T:[1,a]", "T:[1,b]", "T:[1,c]", "T:[2,a]", "T:[2,b]", "T:[2,c]"]
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = RegistryBuilder::new()
            .family(Family::new("T", Speed::Fast, identity).param(floats(&[0.5])))
            .family(Family::new("T", Speed::Fast, identity).param(floats(&[0.5])))
            .build();
        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateId("T:[0.5]".to_string()))
        );
    }

    #[test]
    fn test_invalid_input_is_skipped() {
        let method = RegistryBuilder::new()
            .family(Family::new("T", Speed::Fast, identity).valid(|c| c.len() >= 3))
            .build()
            .unwrap()
            .methods()[0]
            .clone();
        let mut ctx = Context::new();
        let colors = vec!["#000000".to_string()];
        assert!(matches!(
            method.sort(&colors, &mut ctx),
            Err(SortError::InvalidInput { len: 1, .. })
        ));
    }

    #[test]
    fn test_matching() {
        let pattern = Regex::new("^HC:").unwrap();
        assert_eq!(STANDARD.matching(&pattern).len(), 9);
    }
}
