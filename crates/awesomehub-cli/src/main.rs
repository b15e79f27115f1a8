use anyhow::Context;
use awesomehub_core::{
    Config, DiscoveryService, ErrorPayload, RawSearchFilters, SearchFilters, TrendingSort,
    TrendingWindow,
};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "awesomehub")]
#[command(version, about = "Discover and rank awesome GitHub repositories", long_about = None)]
struct Cli {
    /// GitHub token; optional, raises rate limits
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Config file (defaults to <config dir>/awesomehub/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Search for repositories
    Search {
        /// Free text, "awesome" when omitted
        query: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        min_stars: Option<String>,
        #[arg(long)]
        min_forks: Option<String>,
        /// stars, forks or updated
        #[arg(long)]
        sort: Option<String>,
        /// asc or desc
        #[arg(long)]
        order: Option<String>,
        /// day, week, month or year
        #[arg(long)]
        date_range: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// Trending repositories
    Trending {
        /// today, week or month
        #[arg(long, default_value = "week")]
        window: String,
        /// trending-score, stars or recent
        #[arg(long, default_value = "trending-score")]
        sort: String,
    },
    /// Repositories for one category
    Category {
        /// Category identifier, e.g. frontend
        id: String,
    },
    /// Repository counts for every known category
    Categories,
    /// Show repository details
    Show {
        /// Repository name (owner/repo)
        name: String,
    },
    /// List contributors of a repository
    Contributors {
        /// Repository name (owner/repo)
        name: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 30)]
        per_page: u32,
    },
    /// Print a repository README
    Readme {
        /// Repository name (owner/repo)
        name: String,
    },
    /// Repositories sharing a topic with this one
    Related {
        /// Repository name (owner/repo)
        name: String,
    },
    /// Most popular languages among well-starred repositories
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "awesomehub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_env_token(cli.token.clone());

    let service = DiscoveryService::from_config(config).context("Failed to set up GitHub client")?;

    match cli.command {
        Commands::Search {
            query,
            language,
            topic,
            min_stars,
            min_forks,
            sort,
            order,
            date_range,
            page,
            per_page,
        } => {
            let filters: SearchFilters = RawSearchFilters {
                query,
                language,
                topic,
                min_stars,
                min_forks,
                sort,
                order,
                date_range,
            }
            .into();
            tracing::info!("Searching with {:?}", filters);

            let per_page = per_page.unwrap_or(service.config().search.per_page);
            let response = service.search_with_meta(&filters, page, per_page).await;
            print_json(&response)?;
            fail_on(response.error.as_ref())?;
        }
        Commands::Trending { window, sort } => {
            let window: TrendingWindow = window.parse()?;
            let sort: TrendingSort = sort.parse()?;

            let response = service.trending(window, sort).await;
            print_json(&response)?;
            fail_on(response.error.as_ref())?;
        }
        Commands::Category { id } => {
            print_json(&service.category(&id).await)?;
        }
        Commands::Categories => {
            print_json(&service.category_counts().await)?;
        }
        Commands::Show { name } => {
            let (owner, repo) = split_name(&name)?;
            match service.repository(owner, repo).await? {
                Some(repository) => print_json(&repository)?,
                None => anyhow::bail!("Repository {} not found", name),
            }
        }
        Commands::Contributors {
            name,
            page,
            per_page,
        } => {
            let (owner, repo) = split_name(&name)?;
            print_json(&service.contributors(owner, repo, page, per_page).await?)?;
        }
        Commands::Readme { name } => {
            let (owner, repo) = split_name(&name)?;
            match service.readme(owner, repo).await? {
                Some(text) => println!("{}", text),
                None => anyhow::bail!("No README for {}", name),
            }
        }
        Commands::Related { name } => {
            let (owner, repo) = split_name(&name)?;
            print_json(&service.related(owner, repo).await)?;
        }
        Commands::Languages => {
            print_json(&service.popular_languages().await)?;
        }
    }

    Ok(())
}

fn split_name(name: &str) -> anyhow::Result<(&str, &str)> {
    match name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => Ok((owner, repo)),
        _ => anyhow::bail!("Expected owner/repo, got {:?}", name),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Degraded responses still print, but the exit status reports the failure
fn fail_on(error: Option<&ErrorPayload>) -> anyhow::Result<()> {
    match error {
        Some(payload) => {
            if let Some(hint) = &payload.suggestion {
                eprintln!("hint: {}", hint);
            }
            anyhow::bail!("{} (status {})", payload.error, payload.status)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awesomehub_core::SortKey;
    use clap::CommandFactory;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("rust-lang/rust").unwrap(), ("rust-lang", "rust"));
        assert!(split_name("rust-lang").is_err());
        assert!(split_name("/rust").is_err());
    }

    #[test]
    fn test_cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "awesomehub",
            "search",
            "rust",
            "--min-stars",
            "100",
            "--date-range",
            "week",
        ])
        .unwrap();

        match cli.command {
            Commands::Search {
                query, min_stars, ..
            } => {
                assert_eq!(query.as_deref(), Some("rust"));
                assert_eq!(min_stars.as_deref(), Some("100"));
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_sort_help_lists_only_known_keys() {
        let cmd = Cli::command();
        let search = cmd.find_subcommand("search").unwrap();
        let sort = search
            .get_arguments()
            .find(|arg| arg.get_id() == "sort")
            .unwrap();
        let help = sort.get_help().unwrap().to_string();

        let keys: Vec<&str> = help
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|word| !word.is_empty() && *word != "or")
            .collect();
        assert_eq!(keys, vec!["stars", "forks", "updated"]);
        for key in keys {
            assert!(key.parse::<SortKey>().is_ok(), "{} is not a sort key", key);
        }
    }
}
