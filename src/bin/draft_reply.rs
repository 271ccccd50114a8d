use std::io;

use anyhow::Context;

use email_rag_agent::agent::EmailReplyChain;
use email_rag_agent::cli::{read_email, NO_INPUT_MESSAGE, READY_MESSAGE, REPLY_HEADER};
use email_rag_agent::core::config::{load_dotenv, ConfigService};
use email_rag_agent::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv().context("Failed to load .env file")?;
    let settings = ConfigService::from_env()
        .load()
        .context("Failed to load configuration")?;
    logging::init(settings.log_dir.as_deref(), "draft-reply");

    let persona = settings.persona();
    let chain = EmailReplyChain::build(&settings, &persona)
        .await
        .context("Cannot start the email reply agent")?;

    println!("{}\n", READY_MESSAGE);

    let email = read_email(io::stdin().lock()).context("Failed to read email from stdin")?;
    if email.is_empty() {
        println!("{}", NO_INPUT_MESSAGE);
        return Ok(());
    }

    let reply = chain.draft_reply(&email).await.context("Failed to draft reply")?;
    println!("\n{}\n", REPLY_HEADER);
    println!("{}", reply);
    Ok(())
}
