//! Request reliability client for the prediction API
//!
//! Wraps the remote prediction endpoint with:
//!
//! - Cache-busting metadata on every request (fresh seed, random value,
//!   timestamp, no-cache headers)
//! - Duplicate detection against a bounded history of accepted results
//! - Recovery via server cache clear + forced regeneration when more than
//!   `duplicate_threshold` algorithms repeat a recent result
//! - Session counters (`RandomnessStats`)
//!
//! The network is reached through [`ApiTransport`], so the reliability
//! logic can be driven by a scripted transport in tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lottobox::client::{HttpTransport, ReliabilityClient, ReliabilitySettings};
//!
//! let transport = Arc::new(HttpTransport::from_config(&config.client)?);
//! let client = ReliabilityClient::new(transport, ReliabilitySettings::from(&config.client));
//! let prediction = client.predict(&[1, 7, 13, 25, 31, 42]).await?;
//! ```

pub mod envelope;
pub mod history;
pub mod models;
pub mod reliability;
pub mod saved;
pub mod stats;
pub mod transport;

pub use envelope::CacheBustingEnvelope;
pub use history::PredictionHistory;
pub use models::{
    AlgorithmResult, HealthStatus, NumbersError, PredictionRequest, PredictionResult,
    validate_user_numbers,
};
pub use reliability::{ClientError, Prediction, ReliabilityClient, ReliabilitySettings};
pub use saved::{NumberAnalysis, SavedNumberEntry, SavedNumbers};
pub use stats::RandomnessStats;
pub use transport::{ApiTransport, HttpConfig, HttpTransport, TransportError};
