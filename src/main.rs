use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use log::{debug, info, warn};
use serde_json::Value;

use github_api_walkthrough::{
    ApiConfig, Credentials, FetcherRateLimitWaiter, FetcherResult, GITHUB_GRAPHQL_ENDPOINT,
    GITHUB_REST_ENDPOINT, GitHubApi, GraphQlResponse, HttpClient, HttpGraphQlRequester,
    HttpRestFetcher, PullRequest, PullRequestFilter, RateLimitSnapshot, RestFetcher, StdResult,
};

/// Command line arguments for the GitHub API walkthrough
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Personal access token used to authenticate
    #[arg(long, env = "GITHUB_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// User name, switches to basic authentication when set along with the token
    #[arg(long, env = "GITHUB_USERNAME", global = true)]
    username: Option<String>,

    /// Base URL of the REST API
    #[arg(long, default_value = GITHUB_REST_ENDPOINT, global = true)]
    api_url: String,

    /// URL of the GraphQL endpoint
    #[arg(long, default_value = GITHUB_GRAPHQL_ENDPOINT, global = true)]
    graphql_url: String,

    /// Timeout of a single request, in seconds
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,

    /// Sleep until the rate limit resets whenever a response reports no request left
    #[arg(long, global = true)]
    wait_on_rate_limit: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the license of a repository
    License {
        #[arg(long, default_value = "microsoft")]
        owner: String,
        #[arg(long, default_value = "vscode")]
        repo: String,
    },

    /// Print the biography of a user
    Bio {
        #[arg(long, default_value = "fronchetti")]
        user: String,
    },

    /// Print the titles of the first page of pull requests
    Pulls {
        #[arg(long, default_value = "microsoft")]
        owner: String,
        #[arg(long, default_value = "vscode")]
        repo: String,
        #[arg(long, default_value = "open")]
        state: String,
    },

    /// Walk every page of pull requests, printing the URL of each page
    Pages {
        #[arg(long, default_value = "microsoft")]
        owner: String,
        #[arg(long, default_value = "vscode")]
        repo: String,
        #[arg(long, default_value = "open")]
        state: String,
    },

    /// Walk every page of pull requests, printing every title
    AllPulls {
        #[arg(long, default_value = "microsoft")]
        owner: String,
        #[arg(long, default_value = "vscode")]
        repo: String,
        #[arg(long, default_value = "open")]
        state: String,
        #[arg(long, default_value = "updated")]
        sort: String,
        #[arg(long, default_value_t = 10)]
        per_page: u8,
    },

    /// Query the discussions of a repository through the GraphQL API
    Discussions {
        #[arg(long, default_value = "vercel")]
        owner: String,
        #[arg(long, default_value = "next.js")]
        repo: String,
        #[arg(long, default_value_t = 10)]
        first: u8,
    },
}

#[tokio::main]
async fn main() -> StdResult<()> {
    env_logger::init();
    let args = Args::parse();
    debug!("Command: {:?}", args.command);

    let api = build_api(&args)?;
    run(&api, args.command).await?;
    info!("Done");

    Ok(())
}

fn build_api(args: &Args) -> StdResult<GitHubApi> {
    let credentials = Credentials::from_parts(args.username.clone(), args.token.clone());
    info!("Using {credentials:?} credentials");
    let config = ApiConfig::with_endpoints(&args.api_url, &args.graphql_url, credentials)?
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let client = HttpClient::try_new(&config).with_context(|| "Failed to build the HTTP client")?;

    let http_fetcher: Arc<dyn RestFetcher> = Arc::new(HttpRestFetcher::new(client.clone()));
    let fetcher: Arc<dyn RestFetcher> = if args.wait_on_rate_limit {
        Arc::new(FetcherRateLimitWaiter::new(http_fetcher))
    } else {
        http_fetcher
    };
    let requester = Arc::new(HttpGraphQlRequester::new(client, config.graphql_url.clone()));

    Ok(GitHubApi::new(config, fetcher, requester))
}

async fn run(api: &GitHubApi, command: Command) -> StdResult<()> {
    match command {
        Command::License { owner, repo } => {
            let repository = api.repository(&owner, &repo).await?;
            print_rate_limit(repository.rate_limit());
            match &repository.value().license {
                Some(license) => println!("{}", license.name),
                None => println!("{}", repository.value()),
            }
        }
        Command::Bio { user } => {
            let user = api.user(&user).await?;
            print_rate_limit(user.rate_limit());
            println!("{}", user.value().bio.as_deref().unwrap_or_default());
        }
        Command::Pulls { owner, repo, state } => {
            let filter = PullRequestFilter {
                state: Some(state),
                ..PullRequestFilter::default()
            };
            let page = api.pull_requests(&owner, &repo, &filter).await?;
            print_rate_limit(page.rate_limit());
            for pull_request in page.records_as::<PullRequest>()? {
                println!("{pull_request}");
            }
        }
        Command::Pages { owner, repo, state } => {
            let filter = PullRequestFilter {
                state: Some(state),
                ..PullRequestFilter::default()
            };
            // Pages are fetched lazily, so each URL is printed before its request.
            println!("{}", api.pull_requests_url(&owner, &repo)?);
            let mut pages = api.pull_request_pages(&owner, &repo, &filter)?;
            while let Some(page) = pages.try_next().await? {
                print_rate_limit(page.rate_limit());
                if let Some(next) = page.next() {
                    println!("{next}");
                }
            }
        }
        Command::AllPulls {
            owner,
            repo,
            state,
            sort,
            per_page,
        } => {
            let filter = PullRequestFilter {
                state: Some(state),
                sort: Some(sort),
                per_page: Some(per_page),
            };
            let mut pages = api.pull_request_pages(&owner, &repo, &filter)?;
            while let Some(page) = pages.try_next().await? {
                print_rate_limit(page.rate_limit());
                for pull_request in page.records_as::<PullRequest>()? {
                    println!("{pull_request}");
                }
            }
        }
        Command::Discussions { owner, repo, first } => {
            let value = api.discussions_json(&owner, &repo, first).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            let response = GraphQlResponse::<Value>::from_value(&value)?;
            for error in &response.errors {
                warn!("GraphQL error: {}", error.message);
            }
        }
    }

    Ok(())
}

fn print_rate_limit(rate_limit: FetcherResult<&RateLimitSnapshot>) {
    match rate_limit {
        Ok(rate_limit) => {
            println!("Requests Remaining: {}", rate_limit.remaining);
            println!("Limit will reset at: {}", rate_limit.reset_time());
        }
        Err(e) => debug!("{e}"),
    }
}
