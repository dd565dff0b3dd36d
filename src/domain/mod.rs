//! Finite parameter domains
//!
//! Describes the parameters of a target function and checks that every
//! one of them draws from a closed, ordered value set:
//!
//! | Declaration | Domain |
//! |-------------|--------|
//! | `enumeration::<E>()` | `E::members()` in declaration order |
//! | `literal(values)` | the listed alternatives in order |
//! | `open(type_name)` | none, registration fails |

pub mod inspect;
pub mod value;

pub use inspect::{
    inspect, resolve, validate_function_name, ParamDecl, ParamDomain, ParamKind, ParameterSpec,
    Signature,
};
pub use value::{DomainValue, Enumerable};
