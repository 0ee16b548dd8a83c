use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use software_market::account::{self, PasswordChange};
use software_market::auth::{AuthError, AuthFlow};
use software_market::catalogue::{self, Catalogue, Criteria, PriceBracket, SortKey};
use software_market::edit::{EditDraft, EditOutcome};
use software_market::feedback::{Notice, NoticeLevel, Route};
use software_market::models::Product;
use software_market::review::{ReviewDraft, ReviewOutcome};
use software_market::session::SessionFile;
use software_market::upload::{Attachment, Collection, SubmitOutcome, UploadWorkflow};
use software_market::validation::{FieldError, ValidationErrors};
use software_market::{session_channel, ApiClient, ClientConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "market")]
#[command(about = "Browse, publish and review software on the marketplace", long_about = None)]
struct Cli {
    #[arg(long, global = true, help = "Path to a TOML config file (default: market.toml)")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Log HTTP traffic and state changes")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create a new account and sign in")]
    Register {
        #[arg(short, long, help = "Display name")]
        name: String,

        #[arg(short, long, help = "Email address")]
        email: String,

        #[arg(short, long, help = "Password (at least 6 characters)")]
        password: String,
    },

    #[command(about = "Sign in to your account")]
    Login {
        #[arg(short, long, help = "Email address")]
        email: String,

        #[arg(short, long, help = "Password")]
        password: String,
    },

    #[command(about = "Sign out")]
    Logout,

    #[command(about = "Show the signed-in user")]
    Whoami,

    #[command(about = "Request a password reset email")]
    ForgotPassword {
        #[arg(short, long, help = "Email address")]
        email: String,
    },

    #[command(about = "Search and filter the catalogue")]
    Browse {
        #[arg(short, long, help = "Text to look for in titles, descriptions and tags")]
        query: Option<String>,

        #[arg(short, long, default_value = catalogue::ALL, help = "Category value, or 'all'")]
        category: String,

        #[arg(short, long, default_value = "all", help = "all, free, under-25, 25-50, 50-100, over-100")]
        price: PriceBracket,

        #[arg(short, long, help = "Only show products with any of these tags (repeatable)")]
        tag: Vec<String>,

        #[arg(short, long, default_value = "featured", help = "featured, popular, newest, price-low, price-high, top-rated")]
        sort: SortKey,
    },

    #[command(about = "Show one product with its reviews")]
    Show {
        #[arg(help = "Product ID")]
        id: String,
    },

    #[command(about = "Publish a new product")]
    Upload {
        #[arg(short, long, help = "pyproject.toml to fill fields from")]
        manifest: Option<PathBuf>,

        #[arg(long, help = "Title (5-100 characters)")]
        title: Option<String>,

        #[arg(long, help = "Description (20-1000 characters)")]
        description: Option<String>,

        #[arg(long, help = "Category value")]
        category: Option<String>,

        #[arg(long, help = "Software version")]
        version: Option<String>,

        #[arg(long, help = "License")]
        license: Option<String>,

        #[arg(long, help = "Compatible platform version")]
        compat: Option<String>,

        #[arg(short, long, help = "Tags (comma-separated)")]
        tags: Option<String>,

        #[arg(short, long, help = "Software file to attach (repeatable)")]
        file: Vec<PathBuf>,

        #[arg(short, long, help = "Screenshot to attach (repeatable, up to 5)")]
        image: Vec<PathBuf>,

        #[arg(short, long, help = "External download URL")]
        url: Option<String>,
    },

    #[command(about = "Edit one of your products")]
    Edit {
        #[arg(help = "Product ID")]
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        version: Option<String>,

        #[arg(long)]
        license: Option<String>,

        #[arg(long)]
        compat: Option<String>,

        #[arg(short, long, help = "External download URL (empty string clears it)")]
        url: Option<String>,
    },

    #[command(about = "Delete one of your products")]
    Delete {
        #[arg(help = "Product ID")]
        id: String,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "Review a product")]
    Review {
        #[arg(help = "Product ID")]
        id: String,

        #[arg(short, long, help = "Rating from 1 to 5")]
        rating: u8,

        #[arg(short, long, help = "Your comment")]
        comment: String,
    },

    #[command(about = "List reviews for a product")]
    Reviews {
        #[arg(help = "Product ID")]
        id: String,
    },

    #[command(about = "List your own products")]
    MyProducts,

    #[command(about = "Change your password")]
    ChangePassword {
        #[arg(long, help = "Current password")]
        current: String,

        #[arg(long, help = "New password")]
        new: String,

        #[arg(long, help = "Repeat the new password")]
        confirm: String,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::resolve(cli.config.as_deref())?;
    let store = SessionFile::new(&config.session_file);
    let (writer, reader) = session_channel();
    let api = ApiClient::new(config, reader)?;
    let auth = AuthFlow::new(api, writer).with_store(store);
    auth.restore();

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => register(&auth, &name, &email, &password).await,
        Commands::Login { email, password } => login(&auth, &email, &password).await,
        Commands::Logout => {
            match auth.logout() {
                Some(user) => println!("👋 Goodbye, {}!", user.name),
                None => println!("ℹ️  You were not logged in"),
            }
            Ok(())
        }
        Commands::Whoami => whoami(&auth),
        Commands::ForgotPassword { email } => {
            if report_auth(auth.forgot_password(&email).await)?.is_some() {
                println!("📧 If an account exists for {}, a reset link is on its way", email);
            }
            Ok(())
        }
        Commands::Browse {
            query,
            category,
            price,
            tag,
            sort,
        } => {
            let criteria = Criteria {
                query: query.unwrap_or_default(),
                category,
                price,
                tags: tag.into_iter().collect(),
                sort,
            };
            browse(auth.api(), criteria).await
        }
        Commands::Show { id } => show(auth.api(), &id).await,
        Commands::Upload {
            manifest,
            title,
            description,
            category,
            version,
            license,
            compat,
            tags,
            file,
            image,
            url,
        } => {
            if !auth.session().is_authenticated() {
                print_sign_in(&Route::sign_in_from(&Route::Upload));
                return Ok(());
            }
            let mut workflow = UploadWorkflow::new();
            if let Some(path) = manifest {
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read manifest {}", path.display()))?;
                print_notice(&workflow.load_manifest(&content));
            }

            let draft = workflow.draft_mut();
            let fields = &mut draft.fields;
            overwrite(&mut fields.title, title);
            overwrite(&mut fields.description, description);
            overwrite(&mut fields.category, category);
            overwrite(&mut fields.version, version);
            overwrite(&mut fields.license, license);
            overwrite(&mut fields.compatibility_version, compat);
            overwrite(&mut draft.external_url, url);
            for tag in tags.iter().flat_map(|t| t.split(',')) {
                if let Err(e) = draft.add_tag(tag) {
                    println!("⚠️  {}", e.message);
                }
            }

            upload(auth.api(), workflow, file, image).await
        }
        Commands::Edit {
            id,
            title,
            description,
            category,
            version,
            license,
            compat,
            url,
        } => {
            let mut draft = EditDraft::load(auth.api(), &id)
                .await
                .map_err(|notice| anyhow::anyhow!("{}", notice))?;
            let fields = &mut draft.fields;
            overwrite(&mut fields.title, title);
            overwrite(&mut fields.description, description);
            overwrite(&mut fields.category, category);
            overwrite(&mut fields.version, version);
            overwrite(&mut fields.license, license);
            overwrite(&mut fields.compatibility_version, compat);
            overwrite(&mut draft.external_url, url);

            report_edit(draft.save(auth.api()).await);
            Ok(())
        }
        Commands::Delete { id, yes } => delete(auth.api(), &id, yes).await,
        Commands::Review {
            id,
            rating,
            comment,
        } => {
            let mut draft = ReviewDraft::new(rating, comment);
            match draft.submit(auth.api(), &id).await {
                ReviewOutcome::Posted { notice, .. } => print_notice(&notice),
                ReviewOutcome::SignInRequired(route) => print_sign_in(&route),
                ReviewOutcome::Invalid(errors) => print_validation(&errors),
                ReviewOutcome::Failed(notice) => print_notice(&notice),
            }
            Ok(())
        }
        Commands::Reviews { id } => {
            let reviews = auth.api().list_reviews(&id).await?;
            if reviews.is_empty() {
                println!("📭 No reviews yet.");
                return Ok(());
            }
            println!("\n💬 Reviews ({})\n", reviews.len());
            for review in reviews {
                println!("   {} {} - {}", stars(review.rating), review.user_name, review.comment);
            }
            println!();
            Ok(())
        }
        Commands::MyProducts => {
            let overview = match account::overview(auth.api()).await {
                Ok(overview) => overview,
                Err(e) if e.needs_sign_in() => {
                    print_sign_in(&Route::sign_in_from(&Route::Catalogue));
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            println!("👤 {} <{}>", overview.user.name, overview.user.email);
            print_products(&overview.products.iter().collect::<Vec<_>>());
            Ok(())
        }
        Commands::ChangePassword {
            current,
            new,
            confirm,
        } => {
            let change = PasswordChange::new(current, new, confirm);
            match account::change_password(auth.api(), &change).await {
                Ok(notice) => print_notice(&notice),
                Err(errors) => print_validation(&errors),
            }
            Ok(())
        }
    }
}

fn overwrite(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Print field errors and hand back `None`; pass other failures up.
fn report_auth<T>(result: Result<T, AuthError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AuthError::Invalid(errors)) => {
            print_validation(&errors);
            Ok(None)
        }
        Err(AuthError::Client(e)) => Err(e.into()),
    }
}

async fn register(auth: &AuthFlow, name: &str, email: &str, password: &str) -> Result<()> {
    if let Some(user) = report_auth(auth.register(name, email, password).await)? {
        println!("✅ Account created! Welcome, {}!", user.name);
    }
    Ok(())
}

async fn login(auth: &AuthFlow, email: &str, password: &str) -> Result<()> {
    if let Some(user) = report_auth(auth.login(email, password).await)? {
        println!("✅ Logged in as {}", user.name);
    }
    Ok(())
}

fn whoami(auth: &AuthFlow) -> Result<()> {
    match auth.session().user() {
        Some(user) => {
            println!("👤 {}", user.name);
            println!("   Email: {}", user.email);
            println!("   Role: {:?}", user.role);
        }
        None => println!("ℹ️  Not logged in. Use 'market login' first."),
    }
    Ok(())
}

async fn browse(api: &ApiClient, criteria: Criteria) -> Result<()> {
    let mut catalogue = Catalogue::new(api.list_products().await?);
    catalogue.set_criteria(criteria);
    let visible = catalogue.visible();

    if visible.is_empty() {
        println!("📭 No products match your filters.");
        return Ok(());
    }
    println!("\n📦 Products ({})\n", visible.len());
    print_products(&visible);
    Ok(())
}

fn print_products(products: &[&Product]) {
    if products.is_empty() {
        println!("📭 No products yet.");
        return;
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("ID"),
        Cell::new("Title"),
        Cell::new("Category"),
        Cell::new("Price"),
        Cell::new("Rating"),
        Cell::new("Downloads"),
        Cell::new("Added"),
    ]));

    for product in products {
        let category = catalogue::category_label(&product.category).unwrap_or(product.category.as_str());
        let added = product
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(Row::new(vec![
            Cell::new(&product.id),
            Cell::new(&product.title),
            Cell::new(category),
            Cell::new(&price_label(product.price)),
            Cell::new(&format!("{:.1}", product.rating)),
            Cell::new(&format!("{}", product.download_count)),
            Cell::new(&added),
        ]));
    }

    table.printstd();
    println!();
}

fn price_label(price: f64) -> String {
    if price == 0.0 {
        "Free".to_string()
    } else {
        format!("${:.2}", price)
    }
}

fn stars(rating: f64) -> String {
    let full = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

async fn show(api: &ApiClient, id: &str) -> Result<()> {
    let detail = api.get_product(id).await?;
    let product = &detail.product;

    println!("\n📦 {} (v{})", product.title, product.version);
    println!("   {}", product.description);
    println!(
        "   Category: {}",
        catalogue::category_label(&product.category).unwrap_or(product.category.as_str())
    );
    println!("   License: {}", product.license);
    println!("   Compatible with: {}", product.compatibility_version);
    println!("   Seller: {}", product.seller.name);
    println!("   Price: {}", price_label(product.price));
    println!(
        "   Rating: {} ({} reviews)",
        stars(product.rating),
        product.review_count
    );
    if !product.tags.is_empty() {
        println!("   Tags: {}", product.tags.join(", "));
    }
    if let Some(location) = product.download_location() {
        println!("   Download: {}", location);
    }
    for image in product.image_urls() {
        println!("   🖼️  {}", image);
    }
    if !detail.versions.is_empty() {
        let versions: Vec<&str> = detail.versions.iter().map(|v| v.version.as_str()).collect();
        println!("   Other versions: {}", versions.join(", "));
    }

    if !detail.reviews.is_empty() {
        println!("\n💬 Reviews ({})", detail.reviews.len());
        for review in &detail.reviews {
            println!("   {} {} - {}", stars(review.rating), review.user_name, review.comment);
        }
    }
    println!();
    Ok(())
}

async fn upload(
    api: &ApiClient,
    mut workflow: UploadWorkflow,
    files: Vec<PathBuf>,
    images: Vec<PathBuf>,
) -> Result<()> {
    if let Err(errors) = workflow.next_step() {
        print_validation(&errors);
        return Ok(());
    }

    attach(&mut workflow, Collection::Files, &files)?;
    attach(&mut workflow, Collection::Images, &images)?;

    let draft = workflow.draft();
    println!("📤 Uploading '{}'", draft.fields.title);
    println!("   Files: {}", draft.attachments(Collection::Files).len());
    println!("   Images: {}", draft.attachments(Collection::Images).len());
    if !draft.authors.is_empty() {
        println!("   Authors: {}", draft.authors.join(", "));
    }

    match workflow.submit(api).await {
        SubmitOutcome::Created { product, notice, .. } => {
            print_notice(&notice);
            println!("   ID: {}", product.id);
        }
        SubmitOutcome::SignInRequired(route) => print_sign_in(&route),
        SubmitOutcome::Invalid(errors) => print_validation(&errors),
        SubmitOutcome::NotReady => println!("⚠️  Fill in the basic information first"),
        SubmitOutcome::Failed(notice) => print_notice(&notice),
    }
    Ok(())
}

fn attach(workflow: &mut UploadWorkflow, collection: Collection, paths: &[PathBuf]) -> Result<()> {
    let batch = paths
        .iter()
        .map(Attachment::from_path)
        .collect::<Result<Vec<_>, _>>()?;
    let rejected: Vec<FieldError> = workflow.add_attachments(collection, batch);
    for e in rejected {
        println!("⚠️  {}", e.message);
    }
    Ok(())
}

fn report_edit(outcome: EditOutcome) {
    match outcome {
        EditOutcome::Saved { notice, .. } | EditOutcome::Deleted { notice, .. } => {
            print_notice(&notice)
        }
        EditOutcome::SignInRequired(route) => print_sign_in(&route),
        EditOutcome::Invalid(errors) => print_validation(&errors),
        EditOutcome::Failed(notice) => print_notice(&notice),
    }
}

async fn delete(api: &ApiClient, id: &str, yes: bool) -> Result<()> {
    let draft = EditDraft::load(api, id)
        .await
        .map_err(|notice| anyhow::anyhow!("{}", notice))?;

    if !yes {
        println!("❓ Delete '{}'? This cannot be undone. (yes/no): ", draft.fields.title);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        let confirmed = input.trim().to_lowercase();
        if confirmed != "yes" && confirmed != "y" {
            println!("❌ Delete cancelled");
            return Ok(());
        }
    }

    report_edit(draft.delete(api).await);
    Ok(())
}

fn print_notice(notice: &Notice) {
    let icon = match notice.level {
        NoticeLevel::Success => "✅",
        NoticeLevel::Info => "ℹ️ ",
        NoticeLevel::Error => "❌",
    };
    println!("{} {}", icon, notice.title);
    println!("   {}", notice.message);
}

fn print_validation(errors: &ValidationErrors) {
    println!("⚠️  Please fix the following:");
    for e in errors {
        println!("   {}: {}", e.field, e.message);
    }
}

fn print_sign_in(route: &Route) {
    if let Route::SignIn { return_to } = route {
        tracing::debug!(%return_to, "sign-in required");
    }
    println!("🔒 You must be logged in to do that. Run 'market login' first.");
}
