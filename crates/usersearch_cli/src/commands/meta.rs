//! Shell completions and man pages rendered from the `Cli` definition.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

use crate::Cli;

fn write_completions(shell: clap_complete::Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin, out);
}

fn write_man_page(cmd: clap::Command, title: &str, out: &mut dyn Write) -> std::io::Result<()> {
    Man::new(cmd).title(title).render(out)
}

/// Write `<bin>.1` plus one `<bin>-<subcommand>.1` per visible subcommand.
fn write_man_pages(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let cmd = Cli::command();
    let bin = cmd.get_name().to_string();

    let mut pages = vec![(bin.clone(), cmd.clone())];
    pages.extend(
        cmd.get_subcommands()
            .filter(|sub| !sub.is_hide_set())
            .map(|sub| (format!("{}-{}", bin, sub.get_name()), sub.clone())),
    );

    let mut written = Vec::with_capacity(pages.len());
    for (name, page) in pages {
        let path = dir.join(format!("{name}.1"));
        let mut file = std::fs::File::create(&path)?;
        write_man_page(page, &name, &mut file)?;
        written.push(path);
    }
    Ok(written)
}

pub(crate) fn handle_completions(
    shell: clap_complete::Shell,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();
    write_completions(shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

pub(crate) fn handle_man(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(dir) = output else {
        let mut stdout = std::io::stdout().lock();
        let cmd = Cli::command();
        let bin = cmd.get_name().to_string();
        write_man_page(cmd, &bin, &mut stdout)?;
        stdout.flush()?;
        return Ok(());
    };

    let written = write_man_pages(&dir)?;
    println!("Generated {} man pages in: {}", written.len(), dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn completions(shell: clap_complete::Shell) -> String {
        let mut out = Vec::new();
        write_completions(shell, &mut out);
        String::from_utf8(out).expect("completion output should be UTF-8")
    }

    #[test]
    fn completions_use_the_binary_name() {
        let script = completions(clap_complete::Shell::Bash);
        assert!(script.contains("_usersearch()"));
        assert!(!script.contains("curator"));
    }

    #[test]
    fn completions_list_search_flags() {
        let script = completions(clap_complete::Shell::Zsh);
        assert!(script.contains("--followers"));
        assert!(script.contains("--created"));
        assert!(script.contains("--max-pages"));
    }

    #[test]
    fn main_man_page_names_the_binary_and_its_commands() {
        let mut out = Vec::new();
        write_man_page(Cli::command(), "usersearch", &mut out)
            .expect("man rendering should succeed");
        let page = String::from_utf8(out).expect("man output should be UTF-8");

        assert!(page.to_lowercase().contains(".th usersearch"));
        assert!(page.contains("serve"));
        assert!(page.contains("limits"));
    }

    #[test]
    fn man_pages_are_written_per_subcommand() {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("usersearch-man-{nonce}"));

        let written = write_man_pages(&dir).expect("man page generation should succeed");
        let names: Vec<String> = written
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();

        for expected in [
            "usersearch.1",
            "usersearch-search.1",
            "usersearch-limits.1",
            "usersearch-serve.1",
            "usersearch-completions.1",
            "usersearch-man.1",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }

        let serve = std::fs::read_to_string(dir.join("usersearch-serve.1"))
            .expect("serve page should be readable");
        assert!(serve.contains("bind"));

        std::fs::remove_dir_all(&dir).expect("test output directory should be removable");
    }
}
