use anyhow::Context as _;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:1337";

pub const ENV_BASE_URL: &str = "STRAPI_URL";
pub const ENV_API_TOKEN: &str = "STRAPI_API_TOKEN";
pub const ENV_PRODUCTION_URL: &str = "PRODUCTION_STRAPI_URL";

#[derive(Clone)]
pub struct StoreConfig {
    pub base_url: Url,
    pub api_token: Option<String>,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl StoreConfig {
    pub fn from_env(cli_base_url: Option<&str>) -> anyhow::Result<Self> {
        Self::resolve(cli_base_url, |key| std::env::var(key).ok())
    }

    pub fn resolve(
        cli_base_url: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let env_base_url = non_empty(env(ENV_BASE_URL));
        let raw = cli_base_url
            .map(str::to_owned)
            .or(env_base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let base_url = parse_base_url(&raw).context("resolve content store base url")?;

        Ok(Self {
            base_url,
            api_token: non_empty(env(ENV_API_TOKEN)),
        })
    }

    pub fn production_from_env(cli_target: Option<&str>) -> anyhow::Result<Self> {
        Self::resolve_production(cli_target, |key| std::env::var(key).ok())
    }

    pub fn resolve_production(
        cli_target: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let raw = cli_target
            .map(str::to_owned)
            .or_else(|| non_empty(env(ENV_PRODUCTION_URL)))
            .with_context(|| {
                format!("{ENV_PRODUCTION_URL} is not set (or pass --target with the production URL)")
            })?;
        let base_url = parse_base_url(&raw).context("resolve production base url")?;

        Self {
            base_url,
            api_token: non_empty(env(ENV_API_TOKEN)),
        }
        .require_token()
    }

    pub fn require_token(self) -> anyhow::Result<Self> {
        if self.api_token.is_none() {
            anyhow::bail!("{ENV_API_TOKEN} is not set");
        }
        Ok(self)
    }
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("parse base url: {raw:?}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("base url must be http/https: {url}");
    }
    if url.host_str().is_none() {
        anyhow::bail!("base url must have a host: {url}");
    }
    Ok(url)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
