use clap::Parser;
use project_tracker::cli::{Cli, Commands};
use project_tracker::client::ApiClient;
use project_tracker::config::ServerConfig;
use project_tracker::db::create_memory_pool;
use project_tracker::error::{ErrorResponse, TrackerError};
use project_tracker::logging::{log_file_path, ApplicationMode, LoggingConfig};
use project_tracker::schema::build_schema;
use project_tracker::server::GraphqlServer;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut log_config = LoggingConfig::from_args(cli.quiet, cli.verbose > 0, cli.json);

    // Server logs go to a file when TRACKER_LOG_FILE is set
    if matches!(cli.command, Commands::Serve { .. }) && std::env::var("TRACKER_LOG_FILE").is_ok()
    {
        let mut server_config = LoggingConfig::for_mode(ApplicationMode::Server);
        server_config.level = log_config.level;
        server_config.json_format = log_config.json_format;
        server_config.file_output = log_file_path(ApplicationMode::Server);
        log_config = server_config;
    }

    if let Err(e) = project_tracker::logging::init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        let error_response = match e.downcast_ref::<TrackerError>() {
            Some(tracker_error) => tracker_error.to_error_response(),
            None => ErrorResponse {
                error: format!("{:#}", e),
                code: "INTERNAL_ERROR".to_string(),
            },
        };
        match serde_json::to_string_pretty(&error_response) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", error_response.error),
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    match cli.command.clone() {
        Commands::Serve {
            port,
            bind,
            db,
            memory,
            graphiql,
        } => {
            let mut config = ServerConfig::from_env()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            config.in_memory |= memory;
            config.graphiql |= graphiql;

            GraphqlServer::new(config).run().await?;
        },

        Commands::Schema => {
            // The SDL does not depend on stored data; an empty store is enough.
            let pool = create_memory_pool().await?;
            let schema = build_schema(pool.clone());
            println!("{}", schema.sdl());
            pool.close().await;
        },

        Commands::Query {
            document,
            variables,
            endpoint,
        } => {
            let variables = match variables {
                Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                    TrackerError::InvalidInput(format!("--variables is not valid JSON: {}", e))
                })?,
                None => serde_json::Value::Null,
            };

            let client = ApiClient::new(endpoint);
            let data = client.execute(&document, &variables).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        },
    }

    Ok(())
}
