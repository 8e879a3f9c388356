//! Client for the TruTankless cloud service.
//!
//! ```no_run
//! # async fn run() -> trutankless::Result<()> {
//! let mut session = trutankless::Session::login("me@example.com", "password").await?;
//! session.get_devices().await?;
//! session.refresh_device("1061").await?;
//! if let Some(device) = session.device("1061") {
//!     println!("{:?}", device.info());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod device;
pub mod error;
pub mod session;
pub mod types;

pub use config::ApiConfig;
pub use device::Device;
pub use error::{Error, Result};
pub use session::Session;
pub use types::Location;
