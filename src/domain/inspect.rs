//! Signature description and domain inspection
//!
//! A [`Signature`] is the typed stand-in for a target function's parameter
//! list. Inspection turns each declared parameter into either a finite,
//! ordered [`ParameterSpec`] or a [`ParamDomain::NotEnumerable`] marker.

use crate::domain::value::{DomainValue, Enumerable};
use crate::error::{PrecacheError, PrecacheResult};
use std::collections::HashSet;
use tracing::debug;

/// How a parameter's values are declared
#[derive(Debug, Clone)]
pub enum ParamKind {
    /// Members of an [`Enumerable`] type, in declaration order
    Enumeration {
        type_name: &'static str,
        values: Vec<DomainValue>,
    },
    /// An explicitly listed, closed set of literal alternatives
    Literal { values: Vec<DomainValue> },
    /// A type without a finite domain
    Open { type_name: String },
}

/// One declared parameter of a target function
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub kind: ParamKind,
}

/// Declared parameter list of a target function
#[derive(Debug, Clone)]
pub struct Signature {
    function: String,
    params: Vec<ParamDecl>,
}

impl Signature {
    /// Start a signature for the named function
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter whose domain is every member of `E`
    pub fn enumeration<E: Enumerable>(mut self, name: impl Into<String>) -> Self {
        let values = E::members().iter().map(Enumerable::value).collect();
        self.params.push(ParamDecl {
            name: name.into(),
            kind: ParamKind::Enumeration {
                type_name: std::any::type_name::<E>(),
                values,
            },
        });
        self
    }

    /// Add a parameter restricted to the listed literal values
    pub fn literal<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DomainValue>,
    {
        self.params.push(ParamDecl {
            name: name.into(),
            kind: ParamKind::Literal {
                values: values.into_iter().map(Into::into).collect(),
            },
        });
        self
    }

    /// Add a parameter of an unconstrained type
    ///
    /// Such a signature never resolves; this exists so that registration
    /// reports which parameter makes enumeration impossible.
    pub fn open(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            kind: ParamKind::Open {
                type_name: type_name.into(),
            },
        });
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }
}

/// Finite domain of one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Parameter name, unique within the function
    pub name: String,
    /// Permissible values in enumeration order
    pub values: Vec<DomainValue>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, values: Vec<DomainValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Result of inspecting one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamDomain {
    Finite(ParameterSpec),
    NotEnumerable { type_name: String },
}

/// Inspect every parameter of a signature, in declared order
pub fn inspect(signature: &Signature) -> Vec<(String, ParamDomain)> {
    signature
        .params
        .iter()
        .map(|param| {
            let domain = match &param.kind {
                ParamKind::Enumeration { values, .. } | ParamKind::Literal { values } => {
                    ParamDomain::Finite(ParameterSpec::new(&param.name, values.clone()))
                }
                ParamKind::Open { type_name } => ParamDomain::NotEnumerable {
                    type_name: type_name.clone(),
                },
            };
            (param.name.clone(), domain)
        })
        .collect()
}

/// Check that a function name can be used as a key namespace
pub fn validate_function_name(name: &str) -> PrecacheResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(PrecacheError::InvalidFunctionName(name.to_string()))
    }
}

/// Resolve a signature into its ordered parameter specs
///
/// Every parameter must have a non-empty finite domain without repeated
/// values; a single open parameter makes the whole function unusable.
/// The product of all domain sizes must fit in `usize`.
pub fn resolve(signature: &Signature) -> PrecacheResult<Vec<ParameterSpec>> {
    let function = signature.function();
    validate_function_name(function)?;

    if signature.params.is_empty() {
        return Err(PrecacheError::NoParameters {
            function: function.to_string(),
        });
    }

    let mut seen_names = HashSet::new();
    let mut specs = Vec::with_capacity(signature.params.len());

    for (name, domain) in inspect(signature) {
        if !seen_names.insert(name.clone()) {
            return Err(PrecacheError::DuplicateParameter {
                function: function.to_string(),
                parameter: name,
            });
        }

        let spec = match domain {
            ParamDomain::Finite(spec) => spec,
            ParamDomain::NotEnumerable { type_name } => {
                return Err(PrecacheError::NotEnumerable {
                    function: function.to_string(),
                    parameter: name,
                    type_name,
                });
            }
        };

        if spec.values.is_empty() {
            return Err(PrecacheError::EmptyDomain {
                function: function.to_string(),
                parameter: name,
            });
        }

        let mut seen_values = HashSet::new();
        if let Some(dup) = spec.values.iter().find(|v| !seen_values.insert(*v)) {
            return Err(PrecacheError::DuplicateValue {
                function: function.to_string(),
                parameter: name,
                value: dup.to_string(),
            });
        }

        specs.push(spec);
    }

    if specs
        .iter()
        .try_fold(1usize, |acc, spec| acc.checked_mul(spec.values.len()))
        .is_none()
    {
        return Err(PrecacheError::DomainTooLarge {
            function: function.to_string(),
        });
    }

    debug!(
        "Resolved {} with {} parameter(s): {}",
        function,
        specs.len(),
        specs
            .iter()
            .map(|s| format!("{}[{}]", s.name, s.values.len()))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(specs)
}
