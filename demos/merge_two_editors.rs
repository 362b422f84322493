//! Two editors saving against the same whiteboard version.
//!
//! Starts the server on an ephemeral port, then drives it with two clients
//! whose edits are merged by the server.
//!
//! Run with: cargo run --example merge_two_editors

use whiteboard_sync::client::{ClientConfig, WhiteboardClient};
use whiteboard_sync::server::{app, ServerConfig};
use whiteboard_sync::store::InMemoryStore;

fn board(cells: &[&str]) -> String {
    let body: String = cells
        .iter()
        .map(|id| format!(r#"<mxCell id="{}" parent="1" value="{}" vertex="1"/>"#, id, id))
        .collect();
    format!(
        r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/>{}</root></mxGraphModel>"#,
        body
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("whiteboard_sync=info")
        .init();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = app(InMemoryStore::new(), &ServerConfig::default())?;
    tokio::spawn(async move { axum::serve(listener, router).await });

    let config = ClientConfig::for_endpoint(format!("http://{}", addr));
    let alice = WhiteboardClient::with_config(config.clone());
    let bob = WhiteboardClient::with_config(config);

    let start = alice.fetch_document("demo").await?;
    let base = alice
        .update_document("demo", Some(start.version), &board(&["A", "B"]))
        .await?;
    println!("base committed at v{}", base.committed_version);

    // Both load the same version and edit independently.
    let alice_view = alice.fetch_document("demo").await?;
    let bob_view = bob.fetch_document("demo").await?;

    let saved = alice
        .update_document("demo", Some(alice_view.version), &board(&["A", "B", "C"]))
        .await?;
    println!("alice added C, now v{}", saved.committed_version);

    let merged = bob
        .update_document("demo", Some(bob_view.version), &board(&["A", "D", "B"]))
        .await?;
    println!(
        "bob added D from v{}, merged over v{} into v{}",
        bob_view.version, merged.existing_newest_version, merged.committed_version
    );

    let latest = alice.fetch_document("demo").await?;
    println!("\nv{}:\n{}", latest.version, latest.document);
    Ok(())
}
