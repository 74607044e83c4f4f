// Session authentication (`/fmadmin`).

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::client::{Client, Payload};
use crate::error::Error;

const PATH: &str = "/fmadmin";

impl Client {
    /// Exchange credentials for a session token.
    ///
    /// The token is stored on the client (replacing any previous one) and
    /// returned.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<SecretString, Error> {
        debug!(username, "logging in");
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let value = self.post(PATH, body).await?.into_json()?;

        let token = value
            .get("rest_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Deserialization {
                message: "login response has no rest_token".into(),
                body: value.to_string(),
            })?;

        let token = SecretString::from(token.to_owned());
        self.set_token(Some(token.clone()));
        info!(username, "logged in");
        Ok(token)
    }

    /// Invalidate `token`, or the client's own token when `None`.
    ///
    /// Fails with [`Error::MissingToken`] before any I/O when neither is
    /// available. A successful logout always clears the stored token.
    pub async fn logout(&self, token: Option<&SecretString>) -> Result<Payload, Error> {
        let target = match token {
            Some(t) => t.expose_secret().to_owned(),
            None => self.token_value().ok_or(Error::MissingToken)?,
        };

        let response = self.put(PATH, &[("rest_token", target)]).await?;
        self.set_token(None);
        info!("logged out");
        Ok(response)
    }

    /// Log out if a session is held, consuming the client.
    pub async fn close(self) -> Result<(), Error> {
        if self.is_authenticated() {
            self.logout(None).await?;
        }
        Ok(())
    }
}
