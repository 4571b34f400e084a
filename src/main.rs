use std::io::{self, BufRead, Write};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use flipboard::cli::{Cli, Commands};
use flipboard::config::Config;
use flipboard::domain::{Article, Category, FetchRequest, Origin};
use flipboard::errors::{FlipError, FlipResult};
use flipboard::services::{DeepDiveService, FetchService, LibraryService};
use flipboard::sources::{ArticleGenerator, ArticleSource, GeminiGenerator, NewsApiSource};
use flipboard::storage::traits::{LibraryRepository, ResolutionCache};
use flipboard::storage::{InMemoryResolutionCache, SqliteLibraryRepository, SqliteStorage};
use flipboard::utils::truncate_chars;

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> FlipResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)?;
    let library = LibraryService::new(SqliteLibraryRepository::new(storage));

    let fetch_service = FetchService::new(
        NewsApiSource::from_config(&config),
        GeminiGenerator::from_config(&config),
        InMemoryResolutionCache::new(),
    );

    match cli.command {
        Commands::Headlines { category, page } => {
            let request = FetchRequest::headlines(category, page)?;
            cmd_list(&fetch_service, &library, &request)
        }
        Commands::Search { query, page } => {
            let request = FetchRequest::search(Category::default(), &query, page)?;
            cmd_list(&fetch_service, &library, &request)
        }
        Commands::Browse { category } => {
            let deep_dive = DeepDiveService::new(GeminiGenerator::from_config(&config));
            cmd_browse(&fetch_service, &deep_dive, &library, category)
        }
        Commands::Bookmarks => cmd_bookmarks(&library),
        Commands::Likes => cmd_likes(&library),
        Commands::History { limit } => cmd_history(&library, limit),
    }
}

fn cmd_list<S, G, C, R>(
    fetch_service: &FetchService<S, G, C>,
    library: &LibraryService<R>,
    request: &FetchRequest,
) -> FlipResult<()>
where
    S: ArticleSource,
    G: ArticleGenerator,
    C: ResolutionCache,
    R: LibraryRepository,
{
    let articles = resolve(fetch_service, library, request)?;
    print_articles(&articles);
    Ok(())
}

fn cmd_bookmarks<R: LibraryRepository>(library: &LibraryService<R>) -> FlipResult<()> {
    let bookmarks = library.bookmarks()?;

    if bookmarks.is_empty() {
        println!("No bookmarks yet.");
        return Ok(());
    }

    println!("Bookmarks ({}):\n", bookmarks.len());
    print_articles(&bookmarks);
    Ok(())
}

fn cmd_likes<R: LibraryRepository>(library: &LibraryService<R>) -> FlipResult<()> {
    let liked = library.liked()?;

    if liked.is_empty() {
        println!("No liked articles yet.");
        return Ok(());
    }

    println!("Liked ({}):\n", liked.len());
    print_articles(&liked);
    Ok(())
}

fn cmd_history<R: LibraryRepository>(library: &LibraryService<R>, limit: usize) -> FlipResult<()> {
    let history = library.history(limit)?;

    if history.is_empty() {
        println!("Reading history is empty.");
        return Ok(());
    }

    println!("Recently read ({}):\n", history.len());
    print_articles(&history);
    Ok(())
}

fn cmd_browse<S, G, C, D, R>(
    fetch_service: &FetchService<S, G, C>,
    deep_dive: &DeepDiveService<D>,
    library: &LibraryService<R>,
    category: Category,
) -> FlipResult<()>
where
    S: ArticleSource,
    G: ArticleGenerator,
    C: ResolutionCache,
    D: ArticleGenerator,
    R: LibraryRepository,
{
    let mut request = FetchRequest::headlines(category, 1)?;
    let mut articles = resolve(fetch_service, library, &request)?;
    print_articles(&articles);
    print_browse_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\n> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let (command, argument) = match line.trim().split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line.trim(), ""),
        };

        let next_request = match command {
            "" => continue,
            "q" => break,
            "h" | "?" => {
                print_browse_help();
                continue;
            }
            "c" => match argument.parse::<Category>() {
                Ok(category) => Some(FetchRequest::headlines(category, 1)?),
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
            "s" if argument.is_empty() => {
                println!("Usage: s <query>");
                continue;
            }
            "s" => Some(FetchRequest::search(request.category, argument, 1)?),
            "n" => Some(request.with_page(request.page + 1)?),
            "p" if request.page == 1 => {
                println!("Already on the first page.");
                continue;
            }
            "p" => Some(request.with_page(request.page - 1)?),
            "r" => Some(request.clone()),
            "o" | "b" | "l" => {
                let article = match pick(&articles, argument) {
                    Ok(article) => article.clone(),
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                let updated = match command {
                    "o" => open_article(deep_dive, library, &article)?,
                    "b" => {
                        let updated = library.toggle_bookmark(&article)?;
                        if updated.is_bookmarked {
                            println!("Bookmarked: {}", updated.title);
                        } else {
                            println!("Removed bookmark: {}", updated.title);
                        }
                        updated
                    }
                    _ => {
                        let updated = library.toggle_like(&article)?;
                        println!(
                            "{} {} ({} likes)",
                            if updated.is_liked { "Liked:" } else { "Unliked:" },
                            updated.title,
                            updated.likes
                        );
                        updated
                    }
                };
                replace_article(&mut articles, updated);
                None
            }
            other => {
                println!("Unknown command: {} (h for help)", other);
                continue;
            }
        };

        if let Some(next) = next_request {
            request = next;
            articles = resolve(fetch_service, library, &request)?;
            print_articles(&articles);
        }
    }

    Ok(())
}

fn resolve<S, G, C, R>(
    fetch_service: &FetchService<S, G, C>,
    library: &LibraryService<R>,
    request: &FetchRequest,
) -> FlipResult<Vec<Article>>
where
    S: ArticleSource,
    G: ArticleGenerator,
    C: ResolutionCache,
    R: LibraryRepository,
{
    let resolution = fetch_service.resolve(request);

    match &request.query {
        Some(query) => println!("Search \"{}\", page {}", query, request.page),
        None => println!("{} headlines, page {}", request.category, request.page),
    }
    if !resolution.is_fresh() {
        println!("(cached)");
    } else if resolution.origin == Origin::Fallback {
        println!("(news source unavailable, showing generated articles)");
    }
    println!();

    library.annotate(resolution.articles)
}

fn open_article<D, R>(
    deep_dive: &DeepDiveService<D>,
    library: &LibraryService<R>,
    article: &Article,
) -> FlipResult<Article>
where
    D: ArticleGenerator,
    R: LibraryRepository,
{
    library.record_read(article)?;

    println!("{}", article.title);
    println!("{} | {} | {}", article.source, article.author, article.published_at);
    if !article.url.is_empty() {
        println!("{}", article.url);
    }
    println!("\n{}\n", article.content);

    print!("Analyzing... ");
    io::stdout().flush()?;
    let dive = deep_dive.analyze(article);
    println!("\n\n{}", dive.text);

    if !dive.references.is_empty() {
        println!("\nReferences:");
        for reference in &dive.references {
            println!("  - {} ({})", reference.title, reference.uri);
        }
    }

    Ok(article.clone())
}

fn pick<'a>(articles: &'a [Article], argument: &str) -> FlipResult<&'a Article> {
    let index: usize = argument
        .parse()
        .map_err(|_| FlipError::InvalidInput("Invalid number".to_string()))?;

    if index == 0 || index > articles.len() {
        return Err(FlipError::InvalidInput("Number out of range".to_string()));
    }

    Ok(&articles[index - 1])
}

fn replace_article(articles: &mut [Article], updated: Article) {
    if let Some(slot) = articles.iter_mut().find(|a| a.id == updated.id) {
        *slot = updated;
    }
}

fn print_articles(articles: &[Article]) {
    if articles.is_empty() {
        println!("No articles available right now.");
        return;
    }

    for (i, article) in articles.iter().enumerate() {
        let mut marks = String::new();
        if article.is_bookmarked {
            marks.push_str(" [saved]");
        }
        if article.is_liked {
            marks.push_str(" [liked]");
        }

        println!("  {}. {}{}", i + 1, article.title, marks);
        println!(
            "     {} | {} likes | {} comments",
            article.source, article.likes, article.comments
        );
        println!("     {}", truncate_chars(&article.description, 160));
        println!();
    }
}

fn print_browse_help() {
    println!("Commands:");
    println!("  c <category>  switch category");
    println!("  s <query>     search");
    println!("  n / p         next / previous page");
    println!("  o <n>         open article with deep dive");
    println!("  b <n>         toggle bookmark");
    println!("  l <n>         toggle like");
    println!("  r             reload");
    println!("  q             quit");
}
