use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = workspace_discovery::Cli::parse();
    workspace_discovery::init_tracing(cli.verbose);

    let json = cli.json;
    if let Err(err) = workspace_discovery::run(cli) {
        if json {
            let payload = serde_json::json!({
                "error": {
                    "message": format!("{err:#}"),
                }
            });
            eprintln!("{payload}");
        } else {
            eprintln!("error: {err:#}");
        }
        std::process::exit(1);
    }
    Ok(())
}
