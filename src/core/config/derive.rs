//! Macros for implementing [`ConfigValidator`](super::ConfigValidator).
//!
//! Configuration structs declare their per-field rules once and get a
//! `validate` implementation plus `get_defaults` from `Default`.

/// Implements `ConfigValidator` from a list of per-field rules.
///
/// Supported rules: `range(min, max)`, `min(v)`, `max(v)`,
/// `optional_range(min, max)` and `optional_min(v)`.
///
/// ```rust,ignore
/// impl_config_validator!(DetectorConfig {
///     text_threshold: range(0.0, 1.0),
///     canvas_size: min(32),
///     mag_ratio: optional_min(0.0),
/// });
/// ```
#[macro_export]
macro_rules! impl_config_validator {
    ($type_name:ident { $($field:ident: $validator:ident $(($($args:tt)*))?),* $(,)? }) => {
        impl $crate::core::config::ConfigValidator for $type_name {
            fn validate(&self) -> Result<(), $crate::core::config::ConfigError> {
                $(
                    $crate::validate_field!(self, $field, $validator $(($($args)*))?);
                )*
                Ok(())
            }

            fn get_defaults() -> Self
            where
                Self: Sized,
            {
                Self::default()
            }
        }
    };
}

/// Helper macro for field validation.
#[macro_export]
macro_rules! validate_field {
    ($self:expr, $field:ident, range($min:expr, $max:expr)) => {
        if !($min..=$max).contains(&$self.$field) {
            return Err($crate::core::config::ConfigError::InvalidConfig {
                message: format!(
                    "{} must be between {} and {}",
                    stringify!($field),
                    $min,
                    $max
                ),
            });
        }
    };

    ($self:expr, $field:ident, min($min_val:expr)) => {
        if $self.$field < $min_val {
            return Err($crate::core::config::ConfigError::InvalidConfig {
                message: format!("{} must be at least {}", stringify!($field), $min_val),
            });
        }
    };

    ($self:expr, $field:ident, max($max_val:expr)) => {
        if $self.$field > $max_val {
            return Err($crate::core::config::ConfigError::InvalidConfig {
                message: format!("{} must be at most {}", stringify!($field), $max_val),
            });
        }
    };

    ($self:expr, $field:ident, optional_range($min:expr, $max:expr)) => {
        if let Some(value) = $self.$field {
            if !($min..=$max).contains(&value) {
                return Err($crate::core::config::ConfigError::InvalidConfig {
                    message: format!(
                        "{} must be between {} and {}",
                        stringify!($field),
                        $min,
                        $max
                    ),
                });
            }
        }
    };

    ($self:expr, $field:ident, optional_min($min_val:expr)) => {
        if let Some(value) = $self.$field {
            if value < $min_val {
                return Err($crate::core::config::ConfigError::InvalidConfig {
                    message: format!("{} must be at least {}", stringify!($field), $min_val),
                });
            }
        }
    };
}
