//! Project classification

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// Ecosystem a repository belongs to, as far as CI is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Node,
    Python,
    Go,
    Java,
    Rust,
    Ruby,
    Php,
    DotNet,
    Docker,
    /// No recognizable ecosystem; a shell-only pipeline
    Generic,
}

impl ProjectType {
    /// Every project type, in declaration order
    pub const ALL: [ProjectType; 10] = [
        ProjectType::Node,
        ProjectType::Python,
        ProjectType::Go,
        ProjectType::Java,
        ProjectType::Rust,
        ProjectType::Ruby,
        ProjectType::Php,
        ProjectType::DotNet,
        ProjectType::Docker,
        ProjectType::Generic,
    ];
}

impl_domain_enum_conversions!(ProjectType {
    Node => "node" | "nodejs" | "javascript" | "js" | "typescript" | "ts",
    Python => "python" | "py",
    Go => "go" | "golang",
    Java => "java" | "maven" | "gradle",
    Rust => "rust" | "cargo",
    Ruby => "ruby" | "rails",
    Php => "php" | "composer",
    DotNet => "dotnet" | ".net" | "csharp" | "c#",
    Docker => "docker" | "container",
    Generic => "generic" | "other" | "unknown",
});

/// How much the analysis result can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl_domain_enum_conversions!(Confidence {
    Low => "low",
    Medium => "medium",
    High => "high",
});
