use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use dotenvy::dotenv;
use uuid::Uuid;

use rejuvenators_auth::{Claims, create_access_token, encode_claims};
use rejuvenators_cli::seeder::{self, SeedConfig};
use rejuvenators_config::JwtConfig;
use rejuvenators_core::{Capability, PermissionMatrix, Role, build_catalog};

#[derive(Parser)]
#[command(name = "rejuvenators-cli")]
#[command(about = "Rejuvenators CLI - Administrative tools for the admin console API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the role/capability grid
    Permissions,
    /// Print the navigation catalog a role would see, as JSON
    Catalog {
        /// Role name (super_admin, admin, therapist, customer). Omit for a role-less identity
        #[arg(short = 'r', long)]
        role: Option<String>,
    },
    /// Mint a development access token signed with JWT_SECRET
    Token {
        /// Role claim. Unrecognised values are signed as-is
        #[arg(short = 'r', long)]
        role: Option<String>,

        /// Therapist profile linked to the identity
        #[arg(short = 't', long)]
        therapist_id: Option<Uuid>,

        /// Email claim (prompted if not provided)
        #[arg(short = 'e', long)]
        email: Option<String>,
    },
    /// Seed the database with services, customers, therapists and bookings
    Seed {
        #[arg(long, default_value = "50")]
        customers: usize,

        #[arg(long, default_value = "8")]
        therapists: usize,

        #[arg(short = 'b', long, default_value = "150")]
        bookings: usize,
    },
    /// Delete all console data
    ClearSeed {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Permissions => handle_permissions(),
        Commands::Catalog { role } => handle_catalog(role),
        Commands::Token {
            role,
            therapist_id,
            email,
        } => handle_token(role, therapist_id, email),
        Commands::Seed {
            customers,
            therapists,
            bookings,
        } => handle_seed(customers, therapists, bookings).await,
        Commands::ClearSeed { yes } => handle_clear_seed(yes).await,
    }
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ {}: {}", context, err);
    std::process::exit(1);
}

fn parse_role(role: Option<&str>) -> Option<Role> {
    role.map(|raw| raw.parse().unwrap_or_else(|e| fail("Unknown role", e)))
}

async fn connect() -> sqlx::PgPool {
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|e| fail("DATABASE_URL must be set", e));

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .unwrap_or_else(|e| fail("Failed to connect to database", e))
}

fn handle_permissions() {
    let matrix = PermissionMatrix::standard();
    let width = Capability::ALL
        .iter()
        .map(|c| c.name().len())
        .max()
        .unwrap_or(0);

    print!("{:width$}", "", width = width);
    for role in Role::ALL {
        print!("  {:>11}", role.as_str());
    }
    println!();

    for capability in Capability::ALL {
        print!("{:width$}", capability.name(), width = width);
        for role in Role::ALL {
            let mark = if matrix.can_access(Some(role), *capability) {
                "✓"
            } else {
                "·"
            };
            print!("  {:>11}", mark);
        }
        println!();
    }
}

fn handle_catalog(role: Option<String>) {
    let role = parse_role(role.as_deref());
    let catalog = build_catalog(PermissionMatrix::standard(), role);
    match serde_json::to_string_pretty(&catalog) {
        Ok(json) => println!("{}", json),
        Err(e) => fail("Failed to render catalog", e),
    }
}

fn handle_token(role: Option<String>, therapist_id: Option<Uuid>, email: Option<String>) {
    let jwt_config = JwtConfig::from_env();
    let email = email.unwrap_or_else(|| {
        Input::new()
            .with_prompt("Email address")
            .default("dev@rejuvenators.test".to_string())
            .interact_text()
            .unwrap_or_else(|e| fail("Failed to read email", e))
    });
    let user_id = Uuid::new_v4();

    let token = match role.as_deref().map(str::parse::<Role>) {
        Some(Err(_)) => {
            // Sign the raw claim so role-less handling can be exercised.
            let now = chrono::Utc::now().timestamp() as usize;
            let claims = Claims {
                sub: user_id.to_string(),
                email: email.clone(),
                role: role.clone(),
                therapist_id,
                exp: now + jwt_config.access_token_expiry as usize,
                iat: now,
            };
            encode_claims(&claims, &jwt_config)
        }
        parsed => create_access_token(
            user_id,
            &email,
            parsed.and_then(Result::ok),
            therapist_id,
            &jwt_config,
        ),
    };

    match token {
        Ok(token) => println!("{}", token),
        Err(e) => fail("Failed to create token", e.error),
    }
}

async fn handle_seed(customers: usize, therapists: usize, bookings: usize) {
    let pool = connect().await;
    let config = SeedConfig::default()
        .with_customers(customers)
        .with_therapists(therapists)
        .with_bookings(bookings);

    if let Err(e) = seeder::seed_all(&pool, config).await {
        fail("Error seeding database", e);
    }
}

async fn handle_clear_seed(yes: bool) {
    let confirmed = yes
        || Confirm::new()
            .with_prompt("Delete ALL bookings, therapists, customers and services?")
            .default(false)
            .interact()
            .unwrap_or_else(|e| fail("Failed to read confirmation", e));
    if !confirmed {
        println!("Nothing deleted");
        return;
    }

    let pool = connect().await;
    if let Err(e) = seeder::clear_all(&pool).await {
        fail("Error clearing seeded data", e);
    }
}
