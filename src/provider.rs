//! Provider identities and their policy tables.
//!
//! The provider set is closed: AD FS (on-premises federation service) and
//! Azure AD (cloud directory). Each variant carries the identity fields it
//! needs and supplies a fixed policy (metadata URI template, default
//! signing algorithms, issuer post-processing, default access-token
//! audience) to the shared configuration and verification code.

/// Metadata discovery URI template for AD FS.
const ADFS_METADATA_TEMPLATE: &str = "https://{hostname}/adfs/.well-known/openid-configuration";

/// Metadata discovery URI template for Azure AD v2.0.
const AZURE_AD_METADATA_TEMPLATE: &str =
    "https://login.microsoftonline.com/{tenant}/v2.0/.well-known/openid-configuration";

/// Literal placeholder Azure AD uses in issuer values of multi-tenant
/// metadata documents.
const TENANT_ID_PLACEHOLDER: &str = "{tenantid}";

/// Fixed audience of AD FS userinfo access tokens.
const ADFS_USERINFO_AUDIENCE: &str = "urn:microsoft:userinfo";

/// Application id of Microsoft Graph, the default audience of Azure AD
/// access tokens.
const MICROSOFT_GRAPH_AUDIENCE: &str = "00000003-0000-0000-c000-000000000000";

/// Signing algorithms assumed when the metadata document lists none.
const DEFAULT_SIGNING_ALGORITHMS: &[&str] = &["RS256"];

/// Identity of a Microsoft identity provider.
///
/// Immutable once constructed; determines URI templating and default
/// audience/algorithm rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// An on-premises AD FS deployment, addressed by hostname.
    Adfs {
        /// Hostname of the federation service, e.g. `adfs.contoso.com`.
        hostname: String,
    },
    /// An Azure AD tenant.
    AzureAd {
        /// Tenant name or id used in the metadata URI path.
        tenant: String,
        /// Tenant identifier substituted into issuer values.
        tenant_id: String,
    },
}

impl Provider {
    /// An AD FS provider at `hostname`.
    #[must_use]
    pub fn adfs(hostname: impl Into<String>) -> Self {
        Self::Adfs {
            hostname: hostname.into(),
        }
    }

    /// An Azure AD provider for `tenant` with identifier `tenant_id`.
    #[must_use]
    pub fn azure_ad(tenant: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self::AzureAd {
            tenant: tenant.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// The AD FS hostname, if this is an AD FS provider.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        match self {
            Self::Adfs { hostname } => Some(hostname),
            Self::AzureAd { .. } => None,
        }
    }

    /// The Azure AD tenant, if this is an Azure AD provider.
    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        match self {
            Self::Adfs { .. } => None,
            Self::AzureAd { tenant, .. } => Some(tenant),
        }
    }

    /// The Azure AD tenant identifier, if this is an Azure AD provider.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Self::Adfs { .. } => None,
            Self::AzureAd { tenant_id, .. } => Some(tenant_id),
        }
    }

    /// The provider's well-known metadata URI, from the variant's template.
    #[must_use]
    pub fn metadata_uri(&self) -> String {
        match self {
            Self::Adfs { hostname } => ADFS_METADATA_TEMPLATE.replace("{hostname}", hostname),
            Self::AzureAd { tenant, .. } => AZURE_AD_METADATA_TEMPLATE.replace("{tenant}", tenant),
        }
    }

    /// Signing algorithms assumed when the metadata document omits the
    /// corresponding list.
    #[must_use]
    pub fn default_signing_algorithms(&self) -> Vec<String> {
        DEFAULT_SIGNING_ALGORITHMS
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Applies the variant's issuer post-processing.
    ///
    /// Azure AD metadata for multi-tenant endpoints carries a literal
    /// `{tenantid}` placeholder in the issuer value; it is replaced with the
    /// real tenant identifier. AD FS issuers pass through untouched.
    #[must_use]
    pub fn post_process_issuer(&self, issuer: &str) -> String {
        match self {
            Self::Adfs { .. } => issuer.to_string(),
            Self::AzureAd { tenant_id, .. } => issuer.replace(TENANT_ID_PLACEHOLDER, tenant_id),
        }
    }

    /// Default audience of access tokens issued by this provider.
    #[must_use]
    pub fn default_access_token_audience(&self) -> &'static str {
        match self {
            Self::Adfs { .. } => ADFS_USERINFO_AUDIENCE,
            Self::AzureAd { .. } => MICROSOFT_GRAPH_AUDIENCE,
        }
    }

    /// Cache key family, so providers of different kinds never collide in a
    /// shared cache backend.
    pub(crate) fn cache_family(&self) -> &'static str {
        match self {
            Self::Adfs { .. } => "adfs",
            Self::AzureAd { .. } => "azure_ad",
        }
    }
}
