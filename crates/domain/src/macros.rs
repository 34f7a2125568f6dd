//! Macro for implementing Display and FromStr for field-like enums
//!
//! Gives an enum a single lowercase string form, used both for logging and
//! for parsing user input such as CLI arguments. Parsing is case-insensitive.
//!
//! # Example
//!
//! ```rust
//! use ticketdesk_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum SyncTrigger {
//!     Manual,
//!     Scheduled,
//! }
//!
//! impl_domain_status_conversions!(SyncTrigger {
//!     Manual => "manual",
//!     Scheduled => "scheduled",
//! });
//!
//! assert_eq!(SyncTrigger::Scheduled.to_string(), "scheduled");
//! ```

/// Implements Display and FromStr traits for field-like enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
