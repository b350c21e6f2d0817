use crate::error::ComplaintError;

/// Closed enumeration persisted as a fixed string label.
///
/// The label doubles as the serde representation so values round-trip
/// unchanged between storage, the API and this crate.
macro_rules! stored_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::InvalidValue;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $( $label => Ok($name::$variant), )+
                    other => Err($crate::models::InvalidValue {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub mod account;
pub mod actor;
pub mod complaint;
pub mod moderation;
pub mod region;

pub use account::*;
pub use actor::*;
pub use complaint::*;
pub use moderation::*;
pub use region::*;

/// A stored or submitted label outside a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct InvalidValue {
    pub kind: &'static str,
    pub value: String,
}

impl From<InvalidValue> for ComplaintError {
    fn from(err: InvalidValue) -> Self {
        ComplaintError::InvalidInput(err.to_string())
    }
}
