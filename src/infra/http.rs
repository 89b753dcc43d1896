use reqwest::Client;

use super::error::InfraError;

pub fn user_agent() -> &'static str {
    concat!("renderform/", env!("CARGO_PKG_VERSION"))
}

/// Shared client used for both render calls and asset downloads.
pub fn build_client() -> Result<Client, InfraError> {
    let client = Client::builder().user_agent(user_agent()).build()?;
    Ok(client)
}
