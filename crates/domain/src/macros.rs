//! Macro for implementing Display and FromStr for domain enums
//!
//! Generates both conversions from one table. Parsing is case-insensitive
//! and accepts optional aliases after the canonical name; display always
//! uses the canonical name.
//!
//! # Example
//!
//! ```rust
//! use ciforge_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Runner {
//!     Shared,
//!     Dedicated,
//! }
//!
//! impl_domain_enum_conversions!(Runner {
//!     Shared => "shared" | "saas",
//!     Dedicated => "dedicated",
//! });
//!
//! assert_eq!("SaaS".parse::<Runner>().ok(), Some(Runner::Shared));
//! assert_eq!(Runner::Dedicated.to_string(), "dedicated");
//! ```

/// Implements Display and FromStr for a fieldless enum
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str | $alias...` - Canonical lowercase name followed by
///   any number of accepted aliases
///
/// Unknown input yields [`CiforgeError::InvalidInput`](crate::CiforgeError)
/// naming the enum.
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::CiforgeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str $(| $alias)* => Ok(Self::$variant),)+
                    _ => Err($crate::CiforgeError::InvalidInput(format!(
                        "Invalid {}: {}",
                        stringify!($enum_name),
                        s
                    ))),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    // Test enum for macro validation
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Stage {
        Build,
        Test,
        Deploy,
    }

    impl_domain_enum_conversions!(Stage {
        Build => "build" | "compile",
        Test => "test",
        Deploy => "deploy" | "release" | "ship",
    });

    #[test]
    fn test_display_uses_canonical_name() {
        assert_eq!(Stage::Build.to_string(), "build");
        assert_eq!(Stage::Deploy.to_string(), "deploy");
    }

    #[test]
    fn test_fromstr_mixed_case_and_whitespace() {
        assert_eq!(Stage::from_str("  TeSt ").unwrap(), Stage::Test);
        assert_eq!(Stage::from_str("BUILD").unwrap(), Stage::Build);
    }

    #[test]
    fn test_fromstr_aliases() {
        assert_eq!(Stage::from_str("compile").unwrap(), Stage::Build);
        assert_eq!(Stage::from_str("Ship").unwrap(), Stage::Deploy);
    }

    #[test]
    fn test_fromstr_invalid() {
        let err = Stage::from_str("lint").unwrap_err();
        assert!(err.to_string().contains("Invalid Stage: lint"));
        assert!(Stage::from_str("").is_err());
    }
}
