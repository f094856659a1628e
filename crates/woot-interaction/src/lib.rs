//! Outbound collaborators of the Woot bridge: the REST profile client and
//! SDK config file loading.

pub mod config;
pub mod profile_api_client;

pub use config::{SdkConfig, load_sdk_config, parse_sdk_config};
pub use profile_api_client::{ProfileApiClient, ProfileResponse, parse_profile_body};
