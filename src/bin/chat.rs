//! Terminal chat front-end for the answer service.

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use nexusflow::client::http::DEFAULT_ENDPOINT;
use nexusflow::client::{ChatSession, Role, ServiceClient};
use nexusflow::core::logging;

const TITLE: &str = "Kubernetes Technical Support RAG Platform";

/// Ask the Kubernetes support assistant questions from the terminal
#[derive(Parser, Debug)]
#[command(name = "nexusflow-chat", version, about, long_about = None)]
struct Cli {
    /// Answer service endpoint
    #[arg(short, long, env = "NEXUSFLOW_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Ask a single question and exit
    question: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_cli();

    let client = ServiceClient::new(cli.endpoint);
    tracing::debug!("Using answer service at {}", client.endpoint());
    let mut session = ChatSession::new(client);

    if let Some(question) = cli.question {
        let reply = session.send(&question).await;
        println!("{}", reply.content);
        return Ok(());
    }

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{}\n/history, /clear, /quit\n\n", TITLE).as_bytes())
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let text = line.trim();

        match text {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                stdout.write_all(b"(history cleared)\n\n").await?;
            }
            "/history" => {
                stdout.write_all(session.render().as_bytes()).await?;
            }
            _ => {
                let reply = session.send(text).await;
                let rendered = format!("{}: {}\n\n", Role::Assistant.label(), reply.content);
                stdout.write_all(rendered.as_bytes()).await?;
            }
        }
    }

    Ok(())
}
