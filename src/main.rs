//! cvs - minimal version control command line interface

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cvs::fs::{list_dir, read_file, FileType};
use cvs::ops::{add, commit, fsck, log, reset, status};
use cvs::{
    list_branches, read_any, read_head, write_object, AnyObject, Blob, Head, Object, Repo, Tree,
};

#[derive(Parser)]
#[command(name = "cvs")]
#[command(about = "minimal content-addressed version control")]
#[command(version)]
struct Cli {
    /// run as if started in this directory
    #[arg(short = 'C', long, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a repository in the working directory
    Init,

    /// stage paths for the next commit ("." stages every change)
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// show new, removed, modified and staged paths
    Status,

    /// commit the staged changes
    Commit {
        /// commit message
        #[arg(short, long)]
        message: String,
    },

    /// move HEAD to another commit
    Reset {
        /// commit hash, HEAD or branch name
        rev: String,
    },

    /// show commit history from HEAD
    Log {
        /// maximum number of commits to show
        #[arg(short = 'n', long)]
        max_count: Option<usize>,
    },

    /// list branches
    Branches,

    /// show contents of an object
    CatFile {
        /// object hash
        object: String,
    },

    /// compute the blob hash of a file
    HashObject {
        file: PathBuf,

        /// also store the blob
        #[arg(short, long)]
        write: bool,
    },

    /// compute the tree hash of a directory without storing anything
    HashTree {
        directory: PathBuf,
    },

    /// verify repository integrity
    Fsck,

    /// interactive shell
    Shell,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> cvs::Result<ExitCode> {
    match cli.command {
        Commands::Init => {
            let repo = Repo::init(&cli.dir)?;
            println!("initialized empty repository in {}", repo.path().display());
        }

        Commands::Add { paths } => {
            let repo = Repo::discover(&cli.dir)?;
            // relative arguments are relative to -C, not to the repository root
            let paths: Vec<PathBuf> = paths
                .iter()
                .map(|p| absolute(&cli.dir, p))
                .collect::<cvs::Result<_>>()?;
            for data in add(&repo, &paths)? {
                println!("staged {}", data);
            }
        }

        Commands::Status => {
            let repo = Repo::discover(&cli.dir)?;
            let st = status(&repo)?;

            if st.is_clean() {
                println!("nothing to commit, working tree clean");
            }
            print_section("staged", st.staged.iter().map(|d| d.to_string()));
            print_section("new", st.new.iter().cloned());
            print_section("removed", st.removed.iter().cloned());
            print_section("modified", st.modified.iter().cloned());
        }

        Commands::Commit { message } => {
            let repo = Repo::discover(&cli.dir)?;
            let hash = commit(&repo, &message)?;
            println!("{}", hash);
        }

        Commands::Reset { rev } => {
            let repo = Repo::discover(&cli.dir)?;
            let hash = reset(&repo, &rev)?;
            println!("HEAD is now at {}", hash.short());
        }

        Commands::Log { max_count } => {
            let repo = Repo::discover(&cli.dir)?;
            for entry in log(&repo, max_count)? {
                println!("{}", entry);
            }
        }

        Commands::Branches => {
            let repo = Repo::discover(&cli.dir)?;
            let current = match read_head(&repo)? {
                Head::Branch(name) => Some(name),
                Head::Detached(hash) => {
                    println!("* (detached at {})", hash.short());
                    None
                }
            };
            for branch in list_branches(&repo)? {
                let marker = if current.as_deref() == Some(branch.as_str()) { "*" } else { " " };
                println!("{} {}", marker, branch);
            }
        }

        Commands::CatFile { object } => {
            let repo = Repo::discover(&cli.dir)?;
            let hash = cvs::Hash::from_hex(&object)?;

            match read_any(&repo, &hash)? {
                AnyObject::Blob(blob) => {
                    io::stdout()
                        .write_all(&blob.content)
                        .map_err(|e| cvs::Error::Io { path: "stdout".into(), source: e })?;
                }
                AnyObject::Tree(tree) => {
                    for (data, child) in tree.children() {
                        println!("{} {}", child, data);
                    }
                }
                AnyObject::Commit(commit) => {
                    println!("tree {}", commit.tree);
                    if let Some(parent) = &commit.parent {
                        println!("parent {}", parent);
                    }
                    println!();
                    println!("{}", commit.message);
                }
            }
        }

        Commands::HashObject { file, write } => {
            let blob = Blob::new(read_file(&absolute(&cli.dir, &file)?)?);
            let hash = if write {
                let repo = Repo::discover(&cli.dir)?;
                write_object(&repo, &blob)?
            } else {
                blob.hash()
            };
            println!("{}", hash);
        }

        Commands::HashTree { directory } => {
            let tree = Tree::from_directory(&absolute(&cli.dir, &directory)?)?;
            println!("{}", tree.hash());
        }

        Commands::Fsck => {
            let repo = Repo::discover(&cli.dir)?;
            let report = fsck(&repo)?;

            println!("objects checked: {}", report.objects_checked);

            if !report.corrupt_objects.is_empty() {
                println!("\ncorrupt objects:");
                for obj in &report.corrupt_objects {
                    println!("  {}: {}", obj.hash, obj.message);
                }
            }

            if !report.missing_objects.is_empty() {
                println!("\nmissing objects:");
                for obj in &report.missing_objects {
                    println!("  {} {} (referenced by {})", obj.kind, obj.hash, obj.referenced_by);
                }
            }

            if !report.dangling_objects.is_empty() {
                println!("\ndangling objects: {}", report.dangling_objects.len());
            }

            if report.is_ok() {
                println!("\nrepository is healthy");
            } else {
                println!("\nrepository has issues");
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Shell => shell(&cli.dir)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn print_section(title: &str, lines: impl Iterator<Item = String>) {
    let mut lines = lines.peekable();
    if lines.peek().is_none() {
        return;
    }
    println!("{}:", title);
    for line in lines {
        println!("  {}", line);
    }
}

fn absolute(base: &Path, path: &Path) -> cvs::Result<PathBuf> {
    let base = base
        .canonicalize()
        .map_err(|e| cvs::Error::Io { path: base.to_path_buf(), source: e })?;
    Ok(base.join(path))
}

/// read commands from stdin until `exit` or end of input
///
/// besides the subcommands above the shell keeps its own working directory
/// (`cd`, `ls`, `mkdir`); subcommands run relative to it.
fn shell(start: &Path) -> cvs::Result<()> {
    let stdio_err = |e| cvs::Error::Io { path: "stdin".into(), source: e };
    let mut cwd = start
        .canonicalize()
        .map_err(|e| cvs::Error::Io { path: start.to_path_buf(), source: e })?;
    let stdin = io::stdin();

    loop {
        print!("{}> ", cwd.display());
        io::stdout().flush().map_err(stdio_err)?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).map_err(stdio_err)? == 0 {
            println!();
            return Ok(());
        }

        let words = split_words(&line);
        let Some(command) = words.first() else {
            continue;
        };

        let result = match command.as_str() {
            "exit" | "quit" => return Ok(()),
            "cd" => change_dir(&mut cwd, words.get(1).map(String::as_str)),
            "ls" => print_listing(&cwd, words.get(1).map(String::as_str)),
            "mkdir" => make_dirs(&cwd, &words[1..]),
            _ => {
                let args = ["cvs", "-C"]
                    .into_iter()
                    .map(String::from)
                    .chain([cwd.display().to_string()])
                    .chain(words.iter().cloned());
                match Cli::try_parse_from(args) {
                    Ok(Cli { command: Commands::Shell, .. }) => {
                        eprintln!("already in a shell");
                        Ok(())
                    }
                    Ok(cli) => run(cli).map(|_| ()),
                    Err(e) => {
                        // help and usage errors alike
                        let _ = e.print();
                        Ok(())
                    }
                }
            }
        };

        if let Err(e) = result {
            eprintln!("error: {}", e);
        }
    }
}

fn change_dir(cwd: &mut PathBuf, target: Option<&str>) -> cvs::Result<()> {
    let Some(target) = target else {
        return Ok(());
    };
    let next = cwd.join(target);
    let next = next
        .canonicalize()
        .map_err(|e| cvs::Error::Io { path: next.clone(), source: e })?;
    if !next.is_dir() {
        return Err(cvs::Error::Io {
            path: next,
            source: io::Error::other("not a directory"),
        });
    }
    *cwd = next;
    Ok(())
}

fn print_listing(cwd: &Path, target: Option<&str>) -> cvs::Result<()> {
    let dir = target.map_or_else(|| cwd.to_path_buf(), |t| cwd.join(t));
    for entry in list_dir(&dir)? {
        match entry.file_type {
            FileType::Directory => println!("{}/", entry.name),
            _ => println!("{}", entry.name),
        }
    }
    Ok(())
}

fn make_dirs(cwd: &Path, names: &[String]) -> cvs::Result<()> {
    for name in names {
        let path = cwd.join(name);
        fs::create_dir_all(&path).map_err(|e| cvs::Error::Io { path, source: e })?;
    }
    Ok(())
}

/// split a command line on whitespace; double quotes group words
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("  add a.txt  b\n"), vec!["add", "a.txt", "b"]);
        assert_eq!(
            split_words(r#"commit -m "two words""#),
            vec!["commit", "-m", "two words"]
        );
        assert_eq!(split_words(r#"commit -m """#), vec!["commit", "-m", ""]);
        assert!(split_words("   ").is_empty());
    }

    #[test]
    fn test_cli_parses_shell_line() {
        let cli = Cli::try_parse_from(["cvs", "-C", "/tmp", "log", "-n", "3"]).unwrap();
        assert_eq!(cli.dir, PathBuf::from("/tmp"));
        assert!(matches!(cli.command, Commands::Log { max_count: Some(3) }));
    }
}
