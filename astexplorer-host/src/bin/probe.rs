// astexplorer-host/src/bin/probe.rs
//
// Headless check of a parser module: `astexplorer-probe [FILE]`.
// With FILE, parses it once. Without, parses every stdin line.

use anyhow::{Context, Result};
use astexplorer_core::{ExplorerConfig, ParseInvoker};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let config = ExplorerConfig::load().context("Failed to load configuration")?;
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;

    eprintln!("[probe] loading {} …", config.artifact);
    let invoker = astexplorer_host::load_parser(&config, &cwd).await?;
    eprintln!("[probe] ready (entry point `{}`)", invoker.entry_point());

    if let Some(path) = std::env::args().nth(1) {
        let source = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path))?;
        return print_parse(&invoker, &source, config.indent);
    }

    eprintln!("[probe] one source line per parse. Type 'exit' to quit.");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n[probe] Ctrl+C received, exiting…");
                break;
            }

            line = lines.next_line() => {
                let Some(line) = line.context("stdin read failed")? else {
                    eprintln!("[probe] stdin closed, exiting…");
                    break;
                };

                if line.trim().eq_ignore_ascii_case("exit") {
                    break;
                }

                // A bad line should not end the session.
                if let Err(e) = print_parse(&invoker, &line, config.indent) {
                    eprintln!("[probe] {:#}", e);
                }
            }
        }
    }

    Ok(())
}

fn print_parse(invoker: &ParseInvoker, source: &str, indent: usize) -> Result<()> {
    let result = invoker.parse(source).context("Parse failed")?;
    println!("{}", result.render(indent));
    Ok(())
}
