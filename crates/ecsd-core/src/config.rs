use serde::{Deserialize, Serialize};

use crate::CRYPTOSUITE_NAME;

/// Configuration for the selective-disclosure cryptosuite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Cryptosuite name every proof must carry.
    #[serde(default = "default_cryptosuite")]
    pub cryptosuite: String,
    /// Proof purpose written into newly created proofs.
    #[serde(default = "default_proof_purpose")]
    pub proof_purpose: String,
    /// Number of worker chunks for per-statement signing and verification
    /// (0 = available parallelism).
    #[serde(default)]
    pub parallelism: usize,
}

fn default_cryptosuite() -> String {
    CRYPTOSUITE_NAME.into()
}
fn default_proof_purpose() -> String {
    "assertionMethod".into()
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            cryptosuite: default_cryptosuite(),
            proof_purpose: default_proof_purpose(),
            parallelism: 0,
        }
    }
}

impl SuiteConfig {
    /// Resolve `parallelism`, substituting the host's available parallelism for 0.
    pub fn worker_count(&self) -> usize {
        if self.parallelism > 0 {
            return self.parallelism;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
