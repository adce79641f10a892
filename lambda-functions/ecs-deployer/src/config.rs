use bon::Builder;
use std::fmt;

/// Region hosting the ECS cluster and its task definitions.
pub const DEFAULT_WORKLOAD_REGION: &str = "af-south-1";

/// Region hosting the pipeline that invokes this function.
pub const DEFAULT_PIPELINE_REGION: &str = "eu-west-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsRegion(String);

impl AwsRegion {
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn default_workload() -> Self {
        Self(DEFAULT_WORKLOAD_REGION.to_string())
    }

    fn default_pipeline() -> Self {
        Self(DEFAULT_PIPELINE_REGION.to_string())
    }
}

impl From<&str> for AwsRegion {
    fn from(region: &str) -> Self {
        Self::new(region)
    }
}

impl From<String> for AwsRegion {
    fn from(region: String) -> Self {
        Self(region)
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where each collaborating service lives. Every client is built for its own
/// region; nothing switches a shared region between calls.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(on(AwsRegion, into))]
pub struct DeployerConfig {
    #[builder(default = AwsRegion::default_workload())]
    pub workload_region: AwsRegion,

    #[builder(default = AwsRegion::default_pipeline())]
    pub pipeline_region: AwsRegion,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DeployerConfig {
    /// Reads `ECS_REGION` and `PIPELINE_REGION`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            workload_region: non_blank("ECS_REGION")
                .map(AwsRegion::from)
                .unwrap_or_else(AwsRegion::default_workload),
            pipeline_region: non_blank("PIPELINE_REGION")
                .map(AwsRegion::from)
                .unwrap_or_else(AwsRegion::default_pipeline),
        }
    }
}
