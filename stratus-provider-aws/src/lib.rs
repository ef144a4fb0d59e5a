//! Stratus AWS Provider
//!
//! ProviderClient implementation over the AWS Cloud Control API.
//!
//! ## Module Structure
//!
//! - `resources` - kind registry mapping ResourceKind to CloudFormation types
//! - `provider` - AwsProvider implementation

pub mod provider;
pub mod resources;

pub use provider::AwsProvider;
