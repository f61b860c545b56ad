use s3kv::Storage;
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize)]
struct Session {
    user: String,
    expires_at: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Use the real bucket when configured, otherwise an in-process store
    let storage = match s3kv::StorageConfig::from_env() {
        Ok(config) => Storage::new(config)?,
        Err(_) => Storage::in_memory(),
    };

    storage.put("demo/greeting", "Hello, World!").await?;
    storage
        .put_object(
            "demo/session",
            &Session {
                user: "ada".to_string(),
                expires_at: 1_700_000_000,
            },
        )
        .await?;

    let greeting = storage.get("demo/greeting").await?;
    println!("demo/greeting = {}", String::from_utf8_lossy(&greeting));

    let session: Session = storage.get_json("demo/session").await?;
    println!("demo/session = {:?}", session);

    println!("keys under demo/: {:?}", storage.list("demo/").await?);

    storage.delete("demo/greeting").await?;
    println!(
        "demo/greeting exists after delete: {}",
        storage.key_exists("demo/greeting").await?
    );

    match storage.get("demo/greeting").await {
        Err(err) if err.is_not_found() => println!("demo/greeting is gone"),
        other => println!("unexpected: {:?}", other),
    }

    storage.delete("demo/session").await?;
    Ok(())
}
