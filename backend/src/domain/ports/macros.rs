//! Port error enums and their translation into the domain [`Error`].
//!
//! Every variant declared through [`define_port_error!`] names the
//! [`PortErrorKind`] it surfaces as, so services propagate adapter failures
//! with `map_err(Error::from)` instead of matching each enum by hand.
//!
//! [`Error`]: crate::domain::Error

use crate::domain::Error;

/// How a driven-port failure surfaces to callers of the use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortErrorKind {
    /// The backing system could not be reached; worth retrying later.
    Unavailable,
    /// The backing system answered with an unexpected failure.
    Failed,
    /// A uniqueness rule was violated.
    Duplicate,
    /// A referenced row is absent.
    Missing,
    /// A domain rule refused the change.
    Rejected,
}

impl PortErrorKind {
    pub fn into_error(self, message: String) -> Error {
        match self {
            Self::Unavailable => Error::service_unavailable(message),
            Self::Failed => Error::internal(message),
            Self::Duplicate => Error::conflict(message),
            Self::Missing => Error::not_found(message),
            Self::Rejected => Error::invalid_request(message),
        }
    }
}

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )?
                    as $kind:ident => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            pub fn kind(&self) -> $crate::domain::ports::PortErrorKind {
                match self {
                    $( Self::$variant { .. } => $crate::domain::ports::PortErrorKind::$kind, )*
                }
            }
        }

        impl From<$name> for $crate::domain::Error {
            fn from(error: $name) -> Self {
                error.kind().into_error(error.to_string())
            }
        }
    };
}

pub(crate) use define_port_error;
