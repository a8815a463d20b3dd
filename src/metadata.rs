//! OpenID Connect metadata document types.
//!
//! Microsoft providers publish their metadata at a `.well-known` discovery
//! endpoint. This module defines the subset of that document the crate
//! consumes. Seven keys are required; a document missing any of them is
//! rejected as a whole. The optional keys have provider-specific defaults
//! applied by the configuration loader.

use serde::{Deserialize, Serialize};

/// OpenID Connect provider metadata.
///
/// # Example
///
/// ```ignore
/// let doc: OpenIdMetadata = serde_json::from_str(r#"{
///     "issuer": "http://your_domain/adfs/services/trust",
///     "authorization_endpoint": "https://your_domain/adfs/oauth2/authorize/",
///     "token_endpoint": "https://your_domain/adfs/oauth2/token/",
///     "userinfo_endpoint": "https://your_domain/adfs/userinfo",
///     "device_authorization_endpoint": "https://your_domain/adfs/oauth2/devicecode",
///     "end_session_endpoint": "https://your_domain/adfs/oauth2/logout",
///     "jwks_uri": "https://your_domain/adfs/discovery/keys"
/// }"#)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenIdMetadata {
    // ----- Required Fields -----
    /// URL the provider asserts as its issuer identifier for ID tokens.
    pub issuer: String,

    /// URL of the authorization endpoint.
    pub authorization_endpoint: String,

    /// URL of the token endpoint.
    pub token_endpoint: String,

    /// URL of the UserInfo endpoint.
    pub userinfo_endpoint: String,

    /// URL of the device authorization endpoint.
    pub device_authorization_endpoint: String,

    /// URL used to end the session at the provider.
    pub end_session_endpoint: String,

    /// URL of the provider's JSON Web Key Set document.
    pub jwks_uri: String,

    // ----- Optional Fields -----
    /// Issuer identifier carried by access tokens, when it differs from
    /// `issuer` (AD FS publishes this).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_issuer: Option<String>,

    /// JWS signing algorithms supported for ID tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_signing_alg_values_supported: Option<Vec<String>>,

    /// JWS signing algorithms supported for token-endpoint authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_signing_alg_values_supported: Option<Vec<String>>,
}

impl OpenIdMetadata {
    /// Parses a metadata document from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns the underlying deserialization error if the document is not
    /// valid JSON or is missing a required key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_DOC: &str = r#"{
        "issuer": "http://your_domain/adfs/services/trust",
        "authorization_endpoint": "https://your_domain/adfs/oauth2/authorize/",
        "token_endpoint": "https://your_domain/adfs/oauth2/token/",
        "userinfo_endpoint": "https://your_domain/adfs/userinfo",
        "device_authorization_endpoint": "https://your_domain/adfs/oauth2/devicecode",
        "end_session_endpoint": "https://your_domain/adfs/oauth2/logout",
        "jwks_uri": "https://your_domain/adfs/discovery/keys",
        "access_token_issuer": "http://your_domain/adfs/services/trust",
        "id_token_signing_alg_values_supported": ["RS256"],
        "token_endpoint_auth_signing_alg_values_supported": ["RS256", "RS384"]
    }"#;

    #[test]
    fn test_parse_full_document() {
        let doc = OpenIdMetadata::from_slice(FULL_DOC.as_bytes()).unwrap();

        assert_eq!(doc.issuer, "http://your_domain/adfs/services/trust");
        assert_eq!(doc.jwks_uri, "https://your_domain/adfs/discovery/keys");
        assert_eq!(
            doc.access_token_issuer.as_deref(),
            Some("http://your_domain/adfs/services/trust")
        );
        assert_eq!(
            doc.token_endpoint_auth_signing_alg_values_supported,
            Some(vec!["RS256".to_string(), "RS384".to_string()])
        );
    }

    #[test]
    fn test_optional_fields_absent() {
        let mut doc: serde_json::Value = serde_json::from_str(FULL_DOC).unwrap();
        let map = doc.as_object_mut().unwrap();
        map.remove("access_token_issuer");
        map.remove("id_token_signing_alg_values_supported");
        map.remove("token_endpoint_auth_signing_alg_values_supported");

        let doc = OpenIdMetadata::from_slice(doc.to_string().as_bytes()).unwrap();
        assert!(doc.access_token_issuer.is_none());
        assert!(doc.id_token_signing_alg_values_supported.is_none());
        assert!(doc.token_endpoint_auth_signing_alg_values_supported.is_none());
    }

    #[test]
    fn test_missing_required_key_is_rejected() {
        let required = [
            "issuer",
            "authorization_endpoint",
            "token_endpoint",
            "userinfo_endpoint",
            "device_authorization_endpoint",
            "end_session_endpoint",
            "jwks_uri",
        ];

        for key in required {
            let mut doc: serde_json::Value = serde_json::from_str(FULL_DOC).unwrap();
            doc.as_object_mut().unwrap().remove(key);
            assert!(
                OpenIdMetadata::from_slice(doc.to_string().as_bytes()).is_err(),
                "document without {key} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut doc: serde_json::Value = serde_json::from_str(FULL_DOC).unwrap();
        doc.as_object_mut().unwrap().insert(
            "response_types_supported".to_string(),
            serde_json::json!(["code"]),
        );

        assert!(OpenIdMetadata::from_slice(doc.to_string().as_bytes()).is_ok());
    }
}
