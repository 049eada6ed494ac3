use anyhow::Context;
use std::io::{self, BufRead, Write};
use tracing::info;
use vaultstore::shell::Shell;
use vaultstore::{Vault, VaultConfig};

// vaultstore [config.json]

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so replies on stdout stay readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => VaultConfig::from_file(&path)?,
        None => VaultConfig::default(),
    };

    let vault = Vault::open(&config).context("failed to open the vault")?;
    let shell = Shell::new(vault);
    info!("VaultStore ready, type 'quit' to leave");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    prompt(&mut stdout, &shell)?;

    for line in stdin.lock().lines() {
        let line = line.context("failed to read from stdin")?;
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Some(reply) = shell.execute_line(&line) {
            writeln!(stdout, "{}", reply)?;
        }
        prompt(&mut stdout, &shell)?;
    }

    Ok(())
}

fn prompt(out: &mut impl Write, shell: &Shell) -> io::Result<()> {
    write!(out, "vault {}> ", shell.vault().location().path())?;
    out.flush()
}
