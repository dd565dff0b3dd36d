//! Canonical parameter values and the finite-domain capability
//!
//! Every value a target function can receive is converted into a
//! [`DomainValue`] before it reaches the key codec. Enumeration members
//! and raw primitives supplied by callers go through the same conversion,
//! so both render to the same key text.

use std::fmt;

/// A single value drawn from a parameter's finite domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DomainValue {
    /// Text value (enumeration member value, string literal)
    Str(String),
    /// Integer value
    Int(i64),
    /// Boolean value
    Bool(bool),
}

impl DomainValue {
    /// Canonical JSON form used for cache keys
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Bool(b) => serde_json::Value::Bool(*b),
        }
    }

    /// Convert a JSON scalar back into a domain value
    ///
    /// Returns `None` for floats, nulls, arrays and objects, none of which
    /// can appear in a finite domain.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::Str(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(Self::Int),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }

    /// Parse an operator-typed value: a JSON scalar if it parses as one,
    /// otherwise the raw text as a string
    pub fn parse_lenient(text: &str) -> Self {
        serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|v| Self::from_json(&v))
            .unwrap_or_else(|| Self::Str(text.to_string()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<&str> for DomainValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for DomainValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for DomainValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! int_domain_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for DomainValue {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )+
    };
}

int_domain_value!(i8, i16, i32, i64, u8, u16, u32);

/// A type whose values form an ordered, finite set
///
/// Implemented by enumerations whose members are the complete domain of a
/// parameter. `members` must return the same order on every call; that
/// order is the enumeration order used during precomputation.
pub trait Enumerable: Sized {
    /// All members in declaration order
    fn members() -> Vec<Self>;

    /// The member's canonical value
    fn value(&self) -> DomainValue;

    /// Find the member with the given canonical value
    fn from_value(value: &DomainValue) -> Option<Self> {
        Self::members().into_iter().find(|m| &m.value() == value)
    }
}

impl Enumerable for bool {
    fn members() -> Vec<Self> {
        vec![false, true]
    }

    fn value(&self) -> DomainValue {
        DomainValue::Bool(*self)
    }
}

/// Declare a fieldless enum together with its [`Enumerable`] implementation
///
/// Each variant is bound to the literal used as its canonical value.
/// `Clone`, `Copy`, `PartialEq`, `Eq` and `Hash` are derived; add other
/// derives as attributes.
///
/// ```rust
/// precache::finite_enum! {
///     #[derive(Debug)]
///     pub enum Region {
///         Emea = "EMEA",
///         Apac = "APAC",
///     }
/// }
/// ```
#[macro_export]
macro_rules! finite_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::Enumerable for $name {
            fn members() -> ::std::vec::Vec<Self> {
                ::std::vec![$(Self::$variant),+]
            }

            fn value(&self) -> $crate::DomainValue {
                match self {
                    $(Self::$variant => $crate::DomainValue::from($value)),+
                }
            }
        }
    };
}
