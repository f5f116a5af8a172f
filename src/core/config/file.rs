//! Defines the structure mirroring the TOML configuration file format.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) general: GeneralConfig,
    #[serde(default)]
    pub(crate) verify: VerifyConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct GeneralConfig {
    /// Key lookup method the embedder passes to engine construction,
    /// e.g. `DKIM_QUERY_DNS` or `DKIM_QUERY_FILE`.
    pub(crate) query_method: Option<String>,
    /// Companion argument for `query_method` (DNS options or key file path).
    pub(crate) query_info: Option<String>,
    /// Overall per-message verification budget, in seconds.
    pub(crate) timeout: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct VerifyConfig {
    /// Suggested producer chunking granularity, in bytes.
    pub(crate) chunk_size: Option<usize>,
}
