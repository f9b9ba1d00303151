//! Connect, authenticate, and list a user's SIP registrations.
//!
//! ```sh
//! cargo run -- <host> <admin-user> <password> <target-user>
//! ```

use anyhow::Context;
use ocip::types::commands::{UserGetRegistrationListRequest, UserGetRegistrationListResponse};
use ocip::{AsyncClient, ClientConfig, CommandOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let host = args
        .next()
        .context("usage: tokio-client <host> <user> <password> <target>")?;
    let user = args.next().context("missing <user>")?;
    let password = args.next().context("missing <password>")?;
    let target = args.next().unwrap_or_else(|| user.clone());

    let config = ClientConfig::new(&host);
    let client = AsyncClient::connect(config, &user, &password).await?;
    println!("authenticated, session {}", client.session_id().await);

    let request = UserGetRegistrationListRequest {
        user_id: Some(target.clone()),
    };

    match client.command(&request).await? {
        outcome @ CommandOutcome::Data(_) => {
            let response: UserGetRegistrationListResponse = outcome.into_entity()?;
            match response.registration_table {
                Some(table) if !table.is_empty() => {
                    for record in table.records() {
                        println!("{}", record_line(&record));
                    }
                }
                _ => println!("no registrations for {target}"),
            }
        }
        CommandOutcome::Success => println!("server acknowledged without data"),
    }

    client.disconnect().await;
    Ok(())
}

fn record_line(record: &serde_json::Map<String, serde_json::Value>) -> String {
    record
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("  ")
}
