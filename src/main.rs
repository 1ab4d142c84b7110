use clap::{Parser, Subcommand};
use retire::api::{ProjectionArgs, render_projection_table, run_http_server};

#[derive(Parser, Debug)]
#[command(
    name = "retire",
    about = "Retirement asset projection with inflation, growth and special-event years"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the interactive dashboard
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
    /// Print the yearly projection as a table
    Project(ProjectionArgs),
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Serve { port } => {
            if let Err(e) = run_http_server(port).await {
                log::error!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Project(args) => match render_projection_table(&args) {
            Ok(table) => print!("{table}"),
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
    }
}
