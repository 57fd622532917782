use crate::error::DermisError;
use crate::google_oauth::credentials::GoogleCredential;

use oauth2::{
    Client as OAuth2Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken,
    StandardRevocableToken, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenResponse,
    },
};
use tracing::info;

/// Stateless Google OAuth endpoints.
pub(super) struct GoogleOauthEndpoints;

impl GoogleOauthEndpoints {
    /// Exchange the long-lived refresh token for a fresh access token.
    pub(super) async fn refresh_access_token(
        creds: &GoogleCredential,
        http_client: reqwest::Client,
    ) -> Result<BasicTokenResponse, DermisError> {
        let client = build_oauth2_client(creds)?;
        let token_result = client
            .exchange_refresh_token(&RefreshToken::new(creds.refresh_token.clone()))
            .request_async(&http_client)
            .await?;
        info!(client_id = %creds.client_id, "Google access token refreshed");
        Ok(token_result)
    }
}

/// Build the Google OAuth2 client from credentials.
fn build_oauth2_client(creds: &GoogleCredential) -> Result<GoogleOauth2Client, DermisError> {
    let client = OAuth2Client::new(ClientId::new(creds.client_id.clone()))
        .set_client_secret(ClientSecret::new(creds.client_secret.clone()))
        .set_token_uri(TokenUrl::new(creds.token_uri.clone())?);
    Ok(client)
}

type GoogleOauth2Client = OAuth2Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;
