use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::auth::{self, AccessToken, TokenRequest};
use crate::config::ApiConfig;
use crate::device::Device;
use crate::error::{check_status, Error, Result};
use crate::types::{id_from_value, Location};

/// Authenticated client context for one TruTankless account
///
/// A session is driven by a single caller: every operation that touches the
/// network or the registries takes `&mut self`. Hosts sharing a session across
/// tasks must wrap it in their own lock.
pub struct Session {
    email: String,
    password: String,
    config: ApiConfig,
    token: Option<AccessToken>,
    user_id: Option<String>,
    customer_id: Option<String>,
    unique_id: String,
    locations: BTreeMap<usize, Location>,
    devices: HashMap<String, Device>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("base_url", &self.config.base_url())
            .field("authenticated", &self.is_authenticated())
            .field("user_id", &self.user_id)
            .field("customer_id", &self.customer_id)
            .field("locations", &self.locations.len())
            .field("devices", &self.devices.len())
            .finish()
    }
}

impl Session {
    /// Create an unauthenticated session against the production service
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_config(email, password, ApiConfig::default())
    }

    pub fn with_config(
        email: impl Into<String>,
        password: impl Into<String>,
        config: ApiConfig,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            config,
            token: None,
            user_id: None,
            customer_id: None,
            unique_id: String::new(),
            locations: BTreeMap::new(),
            devices: HashMap::new(),
        }
    }

    /// Create a session and authenticate it right away
    pub async fn login(email: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::login_with_config(email, password, ApiConfig::default()).await
    }

    pub async fn login_with_config(
        email: impl Into<String>,
        password: impl Into<String>,
        config: ApiConfig,
    ) -> Result<Self> {
        let mut session = Self::with_config(email, password, config);
        session.authenticate().await?;
        Ok(session)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.access_token.as_str())
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.token_type.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Customer id of the first location seen by the last discovery
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// Unique id for host integrations. Always empty for now.
    pub fn uid(&self) -> &str {
        &self.unique_id
    }

    /// Locations from the last discovery, keyed by their position in the response.
    ///
    /// Location and customer identifiers are exposed as strings even when the
    /// service sent numbers; see `Location`.
    pub fn locations(&self) -> &BTreeMap<usize, Location> {
        &self.locations
    }

    pub fn devices(&self) -> &HashMap<String, Device> {
        &self.devices
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    /// Authenticate with the stored credentials and keep the resulting token.
    ///
    /// A failed attempt leaves any previous token untouched.
    pub async fn authenticate(&mut self) -> Result<()> {
        self.acquire_token().await.map(|_| ())
    }

    async fn acquire_token(&mut self) -> Result<AccessToken> {
        debug!("Authenticating user: {}", self.email);

        let request = TokenRequest::new(&self.email, &self.password);
        let response = auth::request_token(&self.config, &request).await?;

        let token = AccessToken::from(&response);
        self.user_id = Some(response.user_id);
        self.token = Some(token.clone());

        debug!("Authentication successful");
        Ok(token)
    }

    /// Headers for an authenticated call, logging in first when no token is held.
    /// Built fresh for every request.
    async fn authorized_headers(&mut self) -> Result<HeaderMap> {
        let token = match &self.token {
            Some(token) => token.clone(),
            None => {
                info!("Access token is not present. Logging in...");
                self.acquire_token().await?
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&token.authorization())?);
        Ok(headers)
    }

    /// Fetch the account's locations, replacing the location registry.
    ///
    /// Locations are processed from last to first, so `customer_id` ends up
    /// holding the customer of the first location in the response.
    pub async fn get_locations(&mut self) -> Result<&BTreeMap<usize, Location>> {
        let headers = self.authorized_headers().await?;
        debug!("Fetching locations");

        let client = self.config.http_client()?;
        let response = client
            .get(self.config.locations_url())
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if let Err(e) = check_status(status) {
            error!("Failed to fetch locations: {}", status);
            return Err(e);
        }

        let response_text = response.text().await?;
        let locations = serde_json::from_str::<Vec<Location>>(&response_text)?;
        debug!("Found {} locations", locations.len());

        self.locations.clear();
        for (index, location) in locations.into_iter().enumerate().rev() {
            self.customer_id = Some(location.customer_id.clone());
            self.locations.insert(index, location);
        }

        Ok(&self.locations)
    }

    /// Discover every device of every location and register it.
    ///
    /// Entries sharing an identifier overwrite each other, last one wins.
    /// A location without a device list fails with `MissingField("devices")`.
    /// Devices registered before a failure stay registered.
    pub async fn get_devices(&mut self) -> Result<()> {
        self.get_locations().await?;

        for (index, location) in &self.locations {
            let payloads = location
                .devices
                .as_ref()
                .ok_or(Error::MissingField("devices"))?;
            for payload in payloads {
                let device = Device::from_payload(payload.clone())?;
                debug!(
                    "Registering device {} from location {}",
                    device.device_id(),
                    index
                );
                self.devices.insert(device.device_id().to_string(), device);
            }
        }

        debug!("{} devices registered", self.devices.len());
        Ok(())
    }

    /// Re-fetch one device and apply the new state to its registered record.
    ///
    /// The record is picked by the `id` in the response body. A response for a
    /// device that is not registered is dropped without error.
    pub async fn refresh_device(&mut self, device_id: &str) -> Result<()> {
        let headers = self.authorized_headers().await?;
        debug!("Refreshing device: {}", device_id);

        let client = self.config.http_client()?;
        let response = client
            .get(self.config.device_url(device_id))
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to fetch device {}: {}", device_id, e);
                Error::from(e)
            })?;

        let status = response.status();
        if let Err(e) = check_status(status) {
            error!("Failed to fetch device {}: {}", device_id, status);
            return Err(e);
        }

        let response_text = response.text().await.map_err(|e| {
            error!("Failed to read device {}: {}", device_id, e);
            Error::from(e)
        })?;
        let payload = serde_json::from_str::<Value>(&response_text)?;

        let registered = match payload.get("id").and_then(id_from_value) {
            Some(id) => self.devices.get_mut(&id),
            None => None,
        };
        match registered {
            Some(device) => {
                device.update_device_info(payload)?;
                debug!("Device {} updated", device.device_id());
            }
            None => debug!(
                "Refreshed data for {} does not match a registered device, discarding",
                device_id
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new("user@example.com", "secret");
        assert_eq!(session.email(), "user@example.com");
        assert_eq!(session.config().base_url(), "https://home.trutankless.com");
        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
        assert!(session.user_id().is_none());
        assert!(session.customer_id().is_none());
        assert_eq!(session.uid(), "");
        assert!(session.locations().is_empty());
        assert!(session.devices().is_empty());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let session = Session::new("user@example.com", "hunter2");
        let debug = format!("{:?}", session);
        assert!(debug.contains("user@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
