//! Port error enums.
//!
//! Every adapter failure this service reports is a category plus a free-form
//! detail from the adapter, so each variant carries one `message` and renders
//! as `<category>: <message>`.

/// Declare a port error enum with a snake-case constructor per variant.
///
/// ```ignore
/// define_port_error! {
///     pub enum CacheStoreError {
///         Backend => "cache backend failure",
///     }
/// }
/// let error = CacheStoreError::backend("timed out");
/// ```
macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $category:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error("{}: {message}", $category)]
                $variant { message: String },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant {
                            message: message.into(),
                        }
                    }
                }
            )*

            /// Adapter detail without the category.
            #[must_use]
            pub fn message(&self) -> &str {
                match self {
                    $( Self::$variant { message } => message, )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;
