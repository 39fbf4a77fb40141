//! Helper macro for generating repository error enums.
//!
//! Each variant gets a snake_case constructor (`Query { message }` becomes
//! `query(message)`) whose `String` fields accept anything `Into<String>`,
//! and an `is_*` predicate so callers can branch on a kind without
//! destructuring fields they do not care about.

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

    (@pred $variant:ident) => {
        ::paste::paste! {
            pub fn [<is_ $variant:snake>](&self) -> bool {
                matches!(self, Self::$variant { .. })
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
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
                define_port_error!(@pred $variant);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        pub enum LedgerError {
            Missing => "entry missing",
            Rejected { reason: String } => "entry rejected: {reason}",
            Overdrawn { reason: String, amount: u32 } => "overdrawn by {amount}: {reason}",
        }
    }

    #[rstest]
    fn unit_variants_get_nullary_constructors() {
        let err = LedgerError::missing();
        assert_eq!(err, LedgerError::Missing);
        assert_eq!(err.to_string(), "entry missing");
    }

    #[rstest]
    fn string_fields_accept_str() {
        let err = LedgerError::rejected("closed account");
        assert_eq!(err.to_string(), "entry rejected: closed account");
    }

    #[rstest]
    fn mixed_fields_keep_their_types() {
        let err = LedgerError::overdrawn("fees", 42_u32);
        assert_eq!(err.to_string(), "overdrawn by 42: fees");
    }

    #[rstest]
    fn predicates_ignore_fields() {
        let err = LedgerError::overdrawn("fees", 1_u32);
        assert!(err.is_overdrawn());
        assert!(!err.is_missing());
        assert!(!err.is_rejected());
        assert!(LedgerError::Missing.is_missing());
    }
}
