use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use s3kv::{KvError, Storage, StorageConfig, WaiterConfig};
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "s3kv")]
#[command(about = "Key-value access to an S3-compatible bucket", long_about = None)]
struct Cli {
    /// S3 endpoint URL (MinIO or other S3-compatible services)
    #[arg(long, env = "S3_ENDPOINT")]
    endpoint: Option<String>,

    /// Bucket name
    #[arg(long, env = "S3_BUCKET")]
    bucket: String,

    /// Region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    region: String,

    /// Access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    access_key: String,

    /// Secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Probes before a delete is reported as unconfirmed
    #[arg(long, env = "S3KV_DELETE_MAX_ATTEMPTS", default_value = "20")]
    delete_max_attempts: u32,

    /// Delay before the second delete probe, in milliseconds
    #[arg(long, env = "S3KV_DELETE_DELAY_MS", default_value = "100")]
    delete_delay_ms: u64,

    /// Upper bound on the delay between delete probes, in milliseconds
    #[arg(long, env = "S3KV_DELETE_MAX_DELAY_MS", default_value = "5000")]
    delete_max_delay_ms: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value
    Put {
        /// Key
        key: String,
        /// Read the value from this file
        #[arg(short, long, conflicts_with = "value")]
        file: Option<String>,
        /// Use this literal value
        #[arg(short, long)]
        value: Option<String>,
    },

    /// Fetch a value
    Get {
        /// Key
        key: String,
        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List keys
    List {
        /// Key prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
    },

    /// Delete a key and wait until it is gone
    Delete {
        /// Key
        key: String,
    },

    /// Check whether a key exists
    Exists {
        /// Key
        key: String,
    },
}

impl Cli {
    fn to_storage_config(&self) -> StorageConfig {
        StorageConfig::builder()
            .maybe_endpoint(self.endpoint.clone())
            .bucket(self.bucket.clone())
            .region(self.region.clone())
            .access_key(self.access_key.clone())
            .secret_key(self.secret_key.clone())
            .waiter(WaiterConfig {
                max_attempts: self.delete_max_attempts,
                initial_delay: Duration::from_millis(self.delete_delay_ms),
                max_delay: Duration::from_millis(self.delete_max_delay_ms),
            })
            .build()
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .context("Invalid log level")?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();

        Ok(())
    }
}

async fn run(storage: &Storage, command: Commands) -> Result<()> {
    match command {
        Commands::Put { key, file, value } => {
            let data = match (file, value) {
                (Some(path), _) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path))?,
                (None, Some(value)) => value.into_bytes(),
                (None, None) => anyhow::bail!("either --file or --value is required"),
            };
            storage.put(&key, data).await?;
        }
        Commands::Get { key, output } => {
            let data = storage.get(&key).await?;
            match output {
                Some(path) => tokio::fs::write(&path, &data)
                    .await
                    .with_context(|| format!("Failed to write {}", path))?,
                None => std::io::stdout().write_all(&data)?,
            }
        }
        Commands::List { prefix } => {
            let keys = storage.list(&prefix).await?;
            let mut stdout = std::io::stdout().lock();
            for key in keys {
                writeln!(stdout, "{}", key)?;
            }
        }
        Commands::Delete { key } => storage.delete(&key).await?,
        Commands::Exists { key } => {
            let exists = storage.key_exists(&key).await?;
            println!("{}", exists);
            if !exists {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    let storage =
        Storage::new(cli.to_storage_config()).context("Failed to create storage client")?;

    match run(&storage, cli.command).await {
        Err(err) if matches!(err.downcast_ref::<KvError>(), Some(KvError::NotFound)) => {
            eprintln!("key not found");
            std::process::exit(1);
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: [&str; 9] = [
        "s3kv",
        "--bucket",
        "test-bucket",
        "--access-key",
        "test-key",
        "--secret-key",
        "test-secret",
        "--endpoint",
        "http://localhost:9000",
    ];

    fn parse(extra: &[&str]) -> Cli {
        let args: Vec<&str> = BASE.iter().chain(extra.iter()).copied().collect();
        Cli::parse_from(args)
    }

    #[test]
    fn test_cli_parsing() {
        let cli = parse(&["--region", "eu-west-1", "put", "greeting", "--value", "hello"]);

        assert_eq!(cli.bucket, "test-bucket");
        assert_eq!(cli.region, "eu-west-1");
        match cli.command {
            Commands::Put { key, value, file } => {
                assert_eq!(key, "greeting");
                assert_eq!(value.as_deref(), Some("hello"));
                assert!(file.is_none());
            }
            other => panic!("Expected Put, got {:?}", other),
        }
    }

    #[test]
    fn test_put_rejects_file_and_value() {
        let args: Vec<&str> = BASE
            .iter()
            .chain(["put", "k", "--file", "f", "--value", "v"].iter())
            .copied()
            .collect();
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_storage_config() {
        let cli = parse(&[
            "--delete-max-attempts",
            "3",
            "--delete-delay-ms",
            "10",
            "--delete-max-delay-ms",
            "250",
            "list",
        ]);
        let config = cli.to_storage_config();

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.bucket, "test-bucket");
        assert_eq!(config.waiter.max_attempts, 3);
        assert_eq!(config.waiter.initial_delay, Duration::from_millis(10));
        assert_eq!(config.waiter.max_delay, Duration::from_millis(250));
        assert!(matches!(cli.command, Commands::List { ref prefix } if prefix.is_empty()));
    }

    #[tokio::test]
    async fn test_run_against_memory() {
        let storage = Storage::in_memory();

        run(
            &storage,
            Commands::Put {
                key: "cli/key".to_string(),
                file: None,
                value: Some("v".to_string()),
            },
        )
        .await
        .unwrap();
        assert!(storage.key_exists("cli/key").await.unwrap());

        let delete = Commands::Delete {
            key: "cli/key".to_string(),
        };
        run(&storage, delete).await.unwrap();
        assert!(!storage.key_exists("cli/key").await.unwrap());

        let get = Commands::Get {
            key: "cli/key".to_string(),
            output: None,
        };
        let err = run(&storage, get).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<KvError>(), Some(KvError::NotFound)));
    }
}
