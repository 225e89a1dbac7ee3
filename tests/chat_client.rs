mod common;

use std::sync::Arc;

use nexusflow::client::{ChatSession, Role, ServiceClient};
use nexusflow::rag::error::RetrievalError;
use nexusflow::rag::mock::{EchoGenerator, FailingRetriever};

use common::{keyword_pipeline, kubernetes_index, spawn_service, POD_TEXT};

#[tokio::test]
async fn session_records_both_turns() {
    let addr = spawn_service(keyword_pipeline(
        Arc::new(kubernetes_index()),
        Arc::new(EchoGenerator),
        1,
    ))
    .await;
    let client = ServiceClient::new(format!("http://{}/answer_question", addr));
    assert_eq!(client.endpoint(), format!("http://{}/answer_question", addr));

    let reply = client.ask("What is a pod?").await.expect("reply");
    assert_eq!(reply.source_count(), 1);
    assert!(reply.error.is_none());

    let mut session = ChatSession::new(client);
    let content = session.send("What is a pod?").await.content.clone();
    assert!(content.contains(POD_TEXT));

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);

    session.send("And a service?").await;
    assert_eq!(session.messages().len(), 4);
    assert!(session.render().starts_with("You: What is a pod?"));
}

#[tokio::test]
async fn service_side_failure_shows_its_answer() {
    let addr = spawn_service(keyword_pipeline(
        Arc::new(FailingRetriever::new(|| {
            RetrievalError::Unreachable("down".to_string())
        })),
        Arc::new(EchoGenerator),
        1,
    ))
    .await;
    let mut session = ChatSession::new(ServiceClient::new(format!(
        "http://{}/answer_question",
        addr
    )));

    let reply = session.send("What is a pod?").await;

    assert_eq!(reply.role, Role::Assistant);
    assert!(!reply.content.starts_with("Error:"));
    assert!(reply.content.contains("try again"));
}

#[tokio::test]
async fn unreachable_service_becomes_error_turn() {
    // bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut session = ChatSession::new(ServiceClient::new(format!(
        "http://{}/answer_question",
        addr
    )));

    let reply = session.send("What is a pod?").await;

    assert!(reply.content.starts_with("Error:"));
    assert_eq!(session.messages().len(), 2);
}
