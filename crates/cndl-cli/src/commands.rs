use anyhow::{bail, Context};
use chrono::{DateTime, SecondsFormat};
use colored::Colorize;
use cndl_sdk::{Layout, RepoConfig, Repository};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let layout = Layout::in_worktree(&cli.dir, &cli.repo_dir);
    match cli.command {
        Command::Init => cmd_init(layout),
        Command::Add(args) => cmd_add(&open(layout)?, args),
        Command::Show(args) => cmd_show(&open(layout)?, args),
        Command::Commit(args) => cmd_commit(&open(layout)?, args),
        Command::Log(args) => cmd_log(&open(layout)?, args),
        Command::Status => cmd_status(&open(layout)?),
        Command::Objects => cmd_objects(&open(layout)?),
        Command::Rm(args) => cmd_rm(&open(layout)?, args),
        Command::Fsck => cmd_fsck(&open(layout)?),
    }
}

fn open(layout: Layout) -> anyhow::Result<Repository> {
    Ok(Repository::open(layout)?)
}

fn cmd_init(layout: Layout) -> anyhow::Result<()> {
    let existed = Repository::is_initialized(&layout);
    let repo = Repository::init(layout, RepoConfig::default())
        .context("failed to initialize repository")?;
    let verb = if existed { "Reinitialized existing" } else { "Initialized empty" };
    println!(
        "{} {} cndl repository in {}",
        "✓".green().bold(),
        verb,
        repo.layout().root().display().to_string().bold()
    );
    println!("  Branch: {}", repo.config().branch.yellow());
    Ok(())
}

fn cmd_add(repo: &Repository, args: AddArgs) -> anyhow::Result<()> {
    for symbol in &args.symbols {
        let id = repo
            .add_symbol(symbol)
            .with_context(|| format!("failed to add {symbol}"))?;
        println!(
            "  {} {:<8} {}",
            "staged:".green(),
            symbol.to_uppercase().bold(),
            id.to_string().yellow()
        );
    }
    Ok(())
}

fn cmd_show(repo: &Repository, args: ShowArgs) -> anyhow::Result<()> {
    let report = repo.show(&args.object)?;
    println!("chunk {}", report.id.to_string().yellow().bold());
    println!(
        "  Encoding: {}  ({} bytes, payload {} bytes)",
        report.encoding.to_string().cyan(),
        report.frame_len,
        report.payload_len
    );
    println!("  Samples:  {}", report.samples.len().to_string().bold());

    if args.all {
        for sample in &report.samples {
            println!("  Timestamp: {}, Value: {:.6}", sample.timestamp, sample.value);
        }
        return Ok(());
    }
    if let (Some(first), Some(last)) = (report.first(), report.last()) {
        println!("  First:    t={} v={:.6}", first.timestamp, first.value);
        println!("  Last:     t={} v={:.6}", last.timestamp, last.value);
    }
    Ok(())
}

fn cmd_commit(repo: &Repository, args: CommitArgs) -> anyhow::Result<()> {
    let id = repo
        .commit(args.message.as_deref())
        .context("commit failed")?;
    let commit = repo.read_commit(&id)?;
    println!(
        "{} [{} {}] {}",
        "✓".green().bold(),
        repo.config().branch.yellow(),
        id.short_hex().yellow().bold(),
        commit.message
    );
    println!("  {} symbols in snapshot", commit.snapshot.len());
    Ok(())
}

fn cmd_log(repo: &Repository, args: LogArgs) -> anyhow::Result<()> {
    let history = repo.log(args.limit)?;
    if history.is_empty() {
        println!("No commits yet on {}.", repo.config().branch.yellow());
        return Ok(());
    }
    for record in history {
        println!("{} {}", "commit".yellow(), record.id.to_string().yellow());
        println!("Date:   {}", format_timestamp(record.commit.timestamp));
        if let Some(parent) = record.commit.parent {
            println!("Parent: {}", parent.short_hex().dimmed());
        }
        println!();
        println!("    {}", record.commit.message);
        println!();
        for (symbol, id) in &record.commit.snapshot {
            println!("    {:<8} {}", symbol.bold(), id.short_hex().dimmed());
        }
        println!();
    }
    Ok(())
}

fn cmd_status(repo: &Repository) -> anyhow::Result<()> {
    println!("On branch {}", repo.config().branch.yellow().bold());
    match repo.head()? {
        Some(head) => println!("Head: {}", head.short_hex().yellow()),
        None => println!("No commits yet"),
    }

    let changes = repo.status()?;
    if changes.is_empty() {
        println!("\nNothing staged.");
        return Ok(());
    }
    println!("\nStaged for next commit:");
    for change in changes {
        match change.previous {
            Some(previous) => println!(
                "  {} {:<8} {} -> {}",
                "modified:".yellow(),
                change.symbol.bold(),
                previous.short_hex().dimmed(),
                change.target.short_hex()
            ),
            None => println!(
                "  {} {:<8} {}",
                "new:     ".green(),
                change.symbol.bold(),
                change.target.short_hex()
            ),
        }
    }
    Ok(())
}

fn cmd_objects(repo: &Repository) -> anyhow::Result<()> {
    for id in repo.objects()? {
        println!("{id}");
    }
    Ok(())
}

fn cmd_rm(repo: &Repository, args: RmArgs) -> anyhow::Result<()> {
    let id = repo.remove(&args.object)?;
    println!("{} Removed {}", "✓".green(), id.to_string().yellow());
    Ok(())
}

fn cmd_fsck(repo: &Repository) -> anyhow::Result<()> {
    let report = repo.fsck()?;
    println!("Checked {} objects", report.checked.to_string().bold());

    for id in &report.corrupt {
        println!("  {} {}", "corrupt:".red().bold(), id);
    }
    for (symbol, id) in &report.dangling_snapshot {
        println!("  {} {} -> {} (in head commit)", "dangling:".red(), symbol.bold(), id.short_hex());
    }
    for (symbol, id) in &report.dangling_staged {
        println!("  {} {} -> {} (staged)", "dangling:".red(), symbol.bold(), id.short_hex());
    }
    if let Some(head) = report.broken_head {
        println!("  {} {} is missing or unreadable", "broken head:".red().bold(), head);
    }

    if !report.is_clean() {
        bail!("repository check failed");
    }
    println!("{} No issues.", "✓".green().bold());
    Ok(())
}

/// Seconds since the epoch as UTC RFC 3339.
fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| secs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn run(tmp: &TempDir, args: &[&str]) -> anyhow::Result<()> {
        let dir = tmp.path().to_str().unwrap();
        let argv = ["cndl", "-C", dir].into_iter().chain(args.iter().copied());
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn timestamps_render_as_rfc3339() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn commands_require_init() {
        let tmp = TempDir::new().unwrap();
        let err = run(&tmp, &["status"]).unwrap_err();
        assert!(err.to_string().contains("not a cndl repository"));
    }

    #[test]
    fn full_session() {
        let tmp = TempDir::new().unwrap();
        run(&tmp, &["init"]).unwrap();
        run(&tmp, &["add", "AAPL", "MSFT"]).unwrap();
        run(&tmp, &["status"]).unwrap();
        run(&tmp, &["commit", "-m", "first"]).unwrap();
        run(&tmp, &["log", "-n", "1"]).unwrap();
        run(&tmp, &["objects"]).unwrap();
        run(&tmp, &["fsck"]).unwrap();

        let repo = Repository::open(Layout::in_worktree(tmp.path(), ".cndl")).unwrap();
        let log = repo.log(None).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].commit.message, "first");

        let aapl = log[0].commit.snapshot["AAPL"].to_hex();
        run(&tmp, &["show", &aapl[..8]]).unwrap();
        run(&tmp, &["rm", &aapl]).unwrap();
        assert!(run(&tmp, &["fsck"]).is_err());
    }

    #[test]
    fn custom_repo_dir() {
        let tmp = TempDir::new().unwrap();
        run(&tmp, &["--repo-dir", ".alt", "init"]).unwrap();
        assert!(tmp.path().join(".alt/objects").is_dir());
        assert!(run(&tmp, &["status"]).is_err());
        run(&tmp, &["--repo-dir", ".alt", "status"]).unwrap();
    }
}
