use reqwest::Method;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

pub async fn handle(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let reply = client.send(Method::GET, &["health"]).await?;
    if reply.is_success() {
        output_success(&output_format, "Server is healthy", reply.body.get("data").cloned())
    } else {
        output_error(&output_format, &reply.error_message(), reply.error_code())?;
        anyhow::bail!("health check failed with HTTP {}", reply.status)
    }
}
