//! Encore Backend Client
//!
//! HTTP implementation of the backend collaborator traits
//! ([`RemoteStore`](encore_core::RemoteStore),
//! [`ObjectStorage`](encore_core::ObjectStorage),
//! [`AuthProvider`](encore_core::AuthProvider)) for a hosted
//! backend-as-a-service.
//!
//! # Features
//!
//! - **Auth**: password sign-in, sign-up, sign-out (`/auth/v1`)
//! - **Rows**: liked songs, playlists, memberships, uploaded tracks (`/rest/v1`)
//! - **Storage**: binary upload and public URLs (`/storage/v1`)
//!
//! # Example
//!
//! ```ignore
//! use encore_client::{ClientConfig, EncoreClient};
//! use encore_core::RemoteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EncoreClient::new(ClientConfig::new("https://abc.example.co", "anon-key"))?;
//!
//!     let user = client.sign_in("listener@encore.fm", "secret").await?;
//!     let playlists = client.get_user_playlists(&user.id).await?;
//!     println!("{} playlists", playlists.len());
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod backend;
mod client;
mod error;
mod rest;
mod storage;
mod types;

// Re-export main types
pub use client::EncoreClient;
pub use error::{ClientError, Result};
pub use types::{AuthSession, AuthUser, ClientConfig, UserMetadata};

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use rest::{Order, RestClient, Select};
pub use storage::StorageClient;
