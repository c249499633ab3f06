use reqwest::{Client, ClientBuilder, Error};

/// Keep a stable product token so upstream API gateways can whitelist requests.
pub const APP_USER_AGENT: &str = concat!("FitTrack/", env!("CARGO_PKG_VERSION"));

pub fn apply_default_user_agent(builder: ClientBuilder) -> ClientBuilder {
    builder.user_agent(APP_USER_AGENT)
}

pub fn build_http_client(builder: ClientBuilder) -> Result<Client, Error> {
    apply_default_user_agent(builder).build()
}
