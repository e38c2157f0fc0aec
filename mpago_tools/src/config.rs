use balcao_common::Secret;
use log::*;

#[derive(Debug, Clone)]
pub struct MpagoConfig {
    pub base_url: String,
    pub access_token: Secret,
}

impl Default for MpagoConfig {
    fn default() -> Self {
        Self { base_url: "https://api.mercadopago.com".to_string(), access_token: Secret::default() }
    }
}

impl MpagoConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("BPP_MPAGO_BASE_URL").unwrap_or_else(|_| {
            warn!("BPP_MPAGO_BASE_URL not set, using the production gateway URL");
            "https://api.mercadopago.com".to_string()
        });
        let access_token = Secret::new(std::env::var("BPP_MPAGO_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("BPP_MPAGO_ACCESS_TOKEN not set, using (probably useless) default");
            "TEST-00000000000000".to_string()
        }));
        Self { base_url, access_token }
    }
}
