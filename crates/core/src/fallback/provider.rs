//! Degraded analysis from a static table
//!
//! When the live analysis cannot be obtained, the conventional commands of
//! each ecosystem are still good enough to produce a minimal pipeline. This
//! provider performs no I/O and does a single indexed table lookup, so the
//! failure path stays fast.

use ciforge_domain::constants::DEGRADED_MODE_WARNING;
use ciforge_domain::{Confidence, DegradedAnalysisResult, ProjectType};

/// Canned defaults for one project type
#[derive(Debug)]
struct DegradedProfile {
    project_type: ProjectType,
    framework_name: &'static str,
    docker_image: &'static str,
    build_commands: &'static [&'static str],
    test_commands: &'static [&'static str],
    cache_paths: &'static [&'static str],
    note: Option<&'static str>,
}

/// Indexed by `ProjectType as usize`; order must follow `ProjectType::ALL`.
static PROFILES: [DegradedProfile; 10] = [
    DegradedProfile {
        project_type: ProjectType::Node,
        framework_name: "Node.js",
        docker_image: "node:20-alpine",
        build_commands: &["npm ci", "npm run build --if-present"],
        test_commands: &["npm test"],
        cache_paths: &["node_modules/", ".npm/"],
        note: None,
    },
    DegradedProfile {
        project_type: ProjectType::Python,
        framework_name: "Python",
        docker_image: "python:3.12-slim",
        build_commands: &["pip install -r requirements.txt"],
        test_commands: &["pytest"],
        cache_paths: &[".cache/pip/"],
        note: None,
    },
    DegradedProfile {
        project_type: ProjectType::Go,
        framework_name: "Go",
        docker_image: "golang:1.22",
        build_commands: &["go mod download", "go build ./..."],
        test_commands: &["go test ./..."],
        cache_paths: &[".go/pkg/mod/"],
        note: None,
    },
    DegradedProfile {
        project_type: ProjectType::Java,
        framework_name: "Maven",
        docker_image: "maven:3.9-eclipse-temurin-21",
        build_commands: &["mvn -B package -DskipTests"],
        test_commands: &["mvn -B test"],
        cache_paths: &[".m2/repository/"],
        note: Some("Maven was assumed; switch the commands to Gradle if the project uses it."),
    },
    DegradedProfile {
        project_type: ProjectType::Rust,
        framework_name: "Cargo",
        docker_image: "rust:1.77",
        build_commands: &["cargo build --release --locked"],
        test_commands: &["cargo test --locked"],
        cache_paths: &["target/", ".cargo/registry/"],
        note: None,
    },
    DegradedProfile {
        project_type: ProjectType::Ruby,
        framework_name: "Ruby",
        docker_image: "ruby:3.3",
        build_commands: &["bundle install --path vendor/bundle"],
        test_commands: &["bundle exec rake test"],
        cache_paths: &["vendor/bundle/"],
        note: None,
    },
    DegradedProfile {
        project_type: ProjectType::Php,
        framework_name: "Composer",
        docker_image: "php:8.3-cli",
        build_commands: &["composer install --no-interaction --prefer-dist"],
        test_commands: &["vendor/bin/phpunit"],
        cache_paths: &["vendor/"],
        note: None,
    },
    DegradedProfile {
        project_type: ProjectType::DotNet,
        framework_name: ".NET",
        docker_image: "mcr.microsoft.com/dotnet/sdk:8.0",
        build_commands: &["dotnet restore", "dotnet build --no-restore"],
        test_commands: &["dotnet test --no-build"],
        cache_paths: &[".nuget/packages/"],
        note: None,
    },
    DegradedProfile {
        project_type: ProjectType::Docker,
        framework_name: "Docker",
        docker_image: "docker:24",
        build_commands: &["docker build -t \"$CI_REGISTRY_IMAGE:$CI_COMMIT_SHORT_SHA\" ."],
        test_commands: &[],
        cache_paths: &[],
        note: Some("Container builds have no conventional test command; add one to the test stage."),
    },
    DegradedProfile {
        project_type: ProjectType::Generic,
        framework_name: "Generic",
        docker_image: "alpine:3.19",
        build_commands: &["echo \"Add build commands here\""],
        test_commands: &["echo \"Add test commands here\""],
        cache_paths: &[],
        note: Some("The project type is unknown; build and test steps are placeholders."),
    },
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Pure, table-driven source of degraded analysis results
#[derive(Debug, Clone, Copy, Default)]
pub struct DegradedAnalysisProvider;

impl DegradedAnalysisProvider {
    pub fn new() -> Self {
        Self
    }

    /// Conventional analysis for `project_type`, with `Low` confidence
    pub fn basic_analysis(&self, project_type: ProjectType) -> DegradedAnalysisResult {
        let profile = &PROFILES[project_type as usize];
        debug_assert_eq!(profile.project_type, project_type);

        let mut warnings = vec![DEGRADED_MODE_WARNING.to_string()];
        warnings.extend(profile.note.map(str::to_string));

        DegradedAnalysisResult {
            detected_type: project_type,
            framework_name: profile.framework_name.to_string(),
            build_commands: owned(profile.build_commands),
            test_commands: owned(profile.test_commands),
            confidence: Confidence::Low,
            warnings,
            docker_image: profile.docker_image.to_string(),
            cache_paths: owned(profile.cache_paths),
        }
    }
}
