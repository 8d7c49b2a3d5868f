use std::{process, sync::Arc, time::Duration};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use whalefall::{
    application::{
        blog::BlogService,
        chrome::ChromeService,
        error::AppError,
        feed::FeedService,
        page::PageService,
        search::{SearchController, SearchOutcome, SearchState},
    },
    config,
    infra::{
        client::SiteClient,
        error::InfraError,
        http::{self, ApiState, HttpState, RouterState},
        telemetry,
        upstream::HttpBlogBackend,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Search(args) => run_search(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let upstream = Arc::new(HttpBlogBackend::new(&settings.upstream)?);
    if !upstream.is_configured() {
        warn!(
            target = "whalefall::serve",
            "BLOG_BACKEND_URL is not set; proxy routes will answer 500"
        );
    }

    let site = Arc::new(settings.site.clone());
    let blog = BlogService::new(upstream.clone(), settings.blog.recent_limit.get());

    let router_state = RouterState {
        http: HttpState {
            feed: Arc::new(FeedService::new(
                blog.clone(),
                site.clone(),
                settings.blog.page_size.get(),
            )),
            pages: Arc::new(PageService::new(blog.clone(), site.clone())),
            chrome: Arc::new(ChromeService::new(site)),
            upstream,
        },
        api: ApiState { blog },
    };

    serve_http(&settings, router_state).await
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "whalefall::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

/// One line read from stdin in `search` mode.
#[derive(Debug, PartialEq, Eq)]
enum SearchLine {
    Query(String),
    Page(u32),
}

fn parse_search_line(line: &str) -> SearchLine {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix(":page")
        && let Ok(page) = rest.trim().parse::<u32>()
    {
        return SearchLine::Page(page);
    }
    SearchLine::Query(trimmed.to_string())
}

async fn run_search(settings: config::Settings, args: config::SearchArgs) -> Result<(), AppError> {
    let client = SiteClient::new(&args.site)
        .map_err(|err| AppError::validation(format!("--site `{}`: {err}", args.site)))?;
    let controller = SearchController::new(
        Arc::new(client),
        Duration::from_millis(args.debounce_ms),
        settings.blog.page_size.get(),
    );
    let mut updates = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_issued: Option<u64> = None;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.map_err(|err| AppError::from(InfraError::from(err)))? {
                    Some(line) => {
                        let generation = match parse_search_line(&line) {
                            SearchLine::Page(page) => controller.go_to_page(page),
                            SearchLine::Query(text) => controller.submit(text, args.tag.clone()),
                        };
                        last_issued = Some(generation);
                    }
                    None => {
                        stdin_open = false;
                        if is_settled(&controller.state(), last_issued) {
                            break;
                        }
                    }
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                print_search_state(&state);
                if !stdin_open && is_settled(&state, last_issued) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn is_settled(state: &SearchState, last_issued: Option<u64>) -> bool {
    match last_issued {
        None => true,
        Some(generation) => state.generation >= generation && state.outcome != SearchOutcome::Idle,
    }
}

fn print_search_state(state: &SearchState) {
    match state.outcome {
        SearchOutcome::Idle => {}
        SearchOutcome::Failed => println!("search for {:?} failed", state.input.text),
        SearchOutcome::Ready => {
            println!(
                "{} result(s) for {:?} (page {})",
                state.total, state.input.text, state.input.page
            );
            for post in &state.posts {
                let tags = post.tag_list().join(", ");
                if tags.is_empty() {
                    println!("  [{}] {} ({})", post.id, post.title, post.date);
                } else {
                    println!("  [{}] {} ({}) #{}", post.id, post.title, post.date, tags);
                }
            }
        }
    }
}
