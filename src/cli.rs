use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_ABOUT: &str = r#"
Project-Tracker - Clients, projects and tasks behind a GraphQL endpoint

Entities:
  Client   ← name, email, phone
  Project  ← belongs to a client; status Not Started / In Progress / Completed
  Task     ← belongs to a project; same statuses

Workflow:
  project-tracker serve            ← Start the API on http://127.0.0.1:5000/graphql
  project-tracker schema           ← Print the GraphQL schema (SDL)
  project-tracker query '{ ... }'  ← Send a document to a running server

Environment:
  PORT, TRACKER_BIND, TRACKER_DB_PATH, TRACKER_ENV=development (GraphiQL)
  A .env file in the working directory is loaded first.
"#;

#[derive(Parser, Clone)]
#[command(name = "project-tracker")]
#[command(about = "Track clients, projects and tasks through a GraphQL API")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the GraphQL server
    ///
    /// Flags override the environment. Examples:
    ///   project-tracker serve --port 4000
    ///   project-tracker serve --memory --graphiql
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        bind: Option<String>,

        /// SQLite database file
        #[arg(long, conflicts_with = "memory")]
        db: Option<PathBuf>,

        /// Keep all data in memory (lost on exit)
        #[arg(long)]
        memory: bool,

        /// Serve the GraphiQL IDE on GET /graphql
        #[arg(long)]
        graphiql: bool,
    },

    /// Print the GraphQL schema in SDL form
    Schema,

    /// Send a query or mutation to a running server and print the result
    ///
    /// Examples:
    ///   project-tracker query '{ clients { id name } }'
    ///   project-tracker query 'query($id: ID) { project(id: $id) { name } }' --variables '{"id":"1"}'
    Query {
        /// GraphQL document
        document: String,

        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,

        /// GraphQL endpoint
        #[arg(long, default_value = "http://127.0.0.1:5000/graphql")]
        endpoint: String,
    },
}
