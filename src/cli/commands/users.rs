use clap::Subcommand;
use reqwest::Method;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Delete a user from authentication and the document store")]
    Delete {
        #[arg(help = "User id")]
        id: String,
    },

    #[command(about = "Delete only the profile document (finishes a partial deletion)")]
    PurgeProfile {
        #[arg(help = "User id")]
        id: String,
    },
}

pub async fn handle(cmd: UserCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    if !client.has_token() {
        anyhow::bail!("a bearer credential is required (--token or PARTS_ADMIN_TOKEN)");
    }

    match cmd {
        UserCommands::Delete { id } => {
            let reply = client.send(Method::DELETE, &["users", &id]).await?;
            if reply.is_success() {
                return output_success(&output_format, &format!("Deleted user {}", id), Some(json!({ "id": id })));
            }

            output_error(&output_format, &reply.error_message(), reply.error_code())?;
            if reply.error_code() == Some("PARTIAL_DELETION") {
                eprintln!(
                    "The authentication record is gone but the profile document remains.\nRun: partsctl users purge-profile {}",
                    id
                );
            }
            anyhow::bail!("user deletion failed with HTTP {}", reply.status)
        }
        UserCommands::PurgeProfile { id } => {
            let reply = client.send(Method::DELETE, &["users", &id, "profile"]).await?;
            if reply.is_success() {
                return output_success(
                    &output_format,
                    &format!("Purged profile document of {}", id),
                    Some(json!({ "id": id })),
                );
            }
            output_error(&output_format, &reply.error_message(), reply.error_code())?;
            anyhow::bail!("profile purge failed with HTTP {}", reply.status)
        }
    }
}
