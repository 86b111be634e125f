use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use leaflink::advice::CareAdvisor;
use leaflink::config::Config;
use leaflink::garden::GardenController;
use leaflink::notify::NoticeKind;
use leaflink::notify_email::EmailNotifier;
use leaflink::plant::{self, Plant, PlantDraft};
use leaflink::schedule::{self, Filter};
use leaflink::session::SessionGate;
use leaflink::{logging, store};
use std::io::Write;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterChoice {
    All,
    Thirsty,
    Healthy,
}

impl From<FilterChoice> for Filter {
    fn from(choice: FilterChoice) -> Self {
        match choice {
            FilterChoice::All => Filter::All,
            FilterChoice::Thirsty => Filter::Thirsty,
            FilterChoice::Healthy => Filter::Healthy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "leaflink")]
#[command(version = env!("LEAFLINK_VERSION"))]
#[command(about = "LeafLink: track your houseplants and their watering schedules")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show your garden and each plant's watering status
    List {
        /// Show all plants, only thirsty ones, or only healthy ones
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterChoice,
    },

    /// Add a plant to your garden
    Add {
        /// Nickname (defaults to the species)
        name: Option<String>,

        /// Species or type, e.g. "Fiddle Leaf Fig"
        #[arg(short, long)]
        species: String,

        /// Days between waterings
        #[arg(short, long)]
        every: Option<i64>,

        /// Light requirements, e.g. "Bright indirect light"
        #[arg(long)]
        light: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Image URL (a stock photo is picked when omitted)
        #[arg(long)]
        image: Option<String>,

        /// Pre-fill frequency/light/notes from the care advisory service
        #[arg(long)]
        suggest: bool,
    },

    /// Mark a plant watered (by id, id prefix, or name)
    Water {
        plant: String,
    },

    /// Edit a plant's details
    Edit {
        plant: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        species: Option<String>,

        /// Days between waterings
        #[arg(short, long)]
        every: Option<i64>,

        #[arg(long)]
        light: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        image: Option<String>,
    },

    /// Remove a plant from your garden
    Remove {
        plant: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Look up care advice for a species
    Care {
        species: String,
    },

    /// Sign in to your cloud garden
    Login {
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        email: String,

        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the current identity
    Whoami,

    /// Show configuration (or write a default config file)
    Config {
        /// Create ~/.leaflink/config.toml with documented defaults
        #[arg(long)]
        init: bool,
    },

    /// Interactive garden shell
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    logging::cleanup_old_logs();
    logging::info("leaflink starting");

    let args = Args::parse();
    let config = Config::load();
    let gate = SessionGate::new(&config);

    match args.command.unwrap_or(Command::List {
        filter: FilterChoice::All,
    }) {
        Command::List { filter } => {
            let garden = open_garden(&config, &gate).await?;
            print_garden(&garden, filter.into());
        }
        Command::Add {
            name,
            species,
            every,
            light,
            notes,
            image,
            suggest,
        } => {
            let mut garden = open_garden(&config, &gate).await?;
            let draft = build_draft(&config, name, species, every, light, notes, image, suggest)
                .await;
            garden.add(draft).await;
            report(&garden);
        }
        Command::Water { plant } => {
            let mut garden = open_garden(&config, &gate).await?;
            let id = resolve_plant_id(garden.plants(), &plant)?;
            let name = plant_name(garden.plants(), &id);
            garden.water(&id, Utc::now()).await;
            if garden.current_notice().is_none() {
                println!("Watered {}.", name);
            }
            report(&garden);
        }
        Command::Edit {
            plant,
            name,
            species,
            every,
            light,
            notes,
            image,
        } => {
            let mut garden = open_garden(&config, &gate).await?;
            let id = resolve_plant_id(garden.plants(), &plant)?;
            let mut updated = garden
                .plants()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .context("plant disappeared")?;

            if let Some(name) = name {
                updated.name = name;
            }
            if let Some(species) = species {
                updated.species = species;
            }
            if let Some(every) = every {
                if every < 1 {
                    anyhow::bail!("Watering frequency must be at least 1 day");
                }
                updated.water_frequency_days = every;
            }
            if let Some(light) = light {
                updated.light_needs = Some(light);
            }
            if let Some(notes) = notes {
                updated.notes = Some(notes);
            }
            if let Some(image) = image {
                updated.image_url = Some(image);
            }

            let shown = updated.display_name().to_string();
            garden.update_plant(updated).await;
            if garden.current_notice().is_none() {
                println!("Updated {}.", shown);
            }
            report(&garden);
        }
        Command::Remove { plant, yes } => {
            let mut garden = open_garden(&config, &gate).await?;
            let id = resolve_plant_id(garden.plants(), &plant)?;
            let name = plant_name(garden.plants(), &id);
            if !yes && !confirm(&format!("Are you sure you want to remove {}?", name))? {
                println!("Cancelled.");
                return Ok(());
            }
            garden.remove(&id).await;
            report(&garden);
        }
        Command::Care { species } => {
            let advisor = CareAdvisor::new(config.advisory.clone());
            match advisor.get_advice(&species).await {
                Some(advice) => {
                    println!("Care advice for {}:", species);
                    if let Some(scientific) = &advice.scientific_name {
                        println!("  Scientific name: {}", scientific);
                    }
                    println!("  Water every {} days", advice.watering_frequency_days);
                    println!("  Light: {}", advice.light_needs);
                    println!("  Tip: {}", advice.care_tip);
                }
                None if advisor.is_configured() => {
                    println!("No care advice available for \"{}\" right now.", species);
                }
                None => {
                    println!(
                        "Care advice is disabled. Set GEMINI_API_KEY (or [advisory] api_key) to enable it."
                    );
                }
            }
        }
        Command::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_line("Password: ")?,
            };
            let identity = gate
                .sign_in(&email, &password)
                .await
                .context("Sign-in failed")?;
            println!("Signed in as {}.", identity);
        }
        Command::Signup { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_line("Password: ")?,
            };
            match gate
                .sign_up(&email, &password)
                .await
                .context("Sign-up failed")?
            {
                Some(identity) => println!("Account created; signed in as {}.", identity),
                None => println!(
                    "Account created. Confirm your email, then run `leaflink login {}`.",
                    email
                ),
            }
        }
        Command::Logout => {
            gate.sign_out().await?;
            println!("Signed out.");
        }
        Command::Whoami => match gate.current_identity().await {
            Some(identity) if gate.is_configured() => println!("{}", identity),
            Some(identity) => println!("{} (demo mode)", identity),
            None => println!("Not signed in. Run `leaflink login <email>`."),
        },
        Command::Config { init } => {
            if init {
                let path = Config::write_default()?;
                println!("Wrote {}", path.display());
            } else {
                println!("{}", config.display_string());
            }
        }
        Command::Repl => {
            run_repl(&config, &gate).await?;
        }
    }

    Ok(())
}

/// Build the controller for the configured backend and load the garden,
/// requiring a session when one is needed. Prints the demo banner in
/// local mode.
async fn open_garden(config: &Config, gate: &SessionGate) -> Result<GardenController> {
    let identity = gate.current_identity().await;
    if gate.is_configured() && identity.is_none() {
        anyhow::bail!("Sign in required. Run `leaflink login <email>`.");
    }
    if !gate.is_configured() {
        eprintln!("Demo mode: Supabase is not configured, plants are saved locally.");
    }

    let token = gate.access_token().await;
    let store = store::open(config, token)?;
    logging::info(&format!("Using {} plant store", store.name()));

    let mut garden = GardenController::new(store, EmailNotifier::new(config.email.clone()));
    garden.load(list_identity(gate, identity.as_deref())).await;
    Ok(garden)
}

/// The partition key passed to `load`: signed-in users see their own
/// plants; demo mode lists the local file unpartitioned.
fn list_identity<'a>(gate: &SessionGate, identity: Option<&'a str>) -> Option<&'a str> {
    if gate.is_configured() { identity } else { None }
}

#[allow(clippy::too_many_arguments)]
async fn build_draft(
    config: &Config,
    name: Option<String>,
    species: String,
    every: Option<i64>,
    light: Option<String>,
    notes: Option<String>,
    image: Option<String>,
    suggest: bool,
) -> PlantDraft {
    let mut every = every;
    let mut light = light;
    let mut notes = notes;

    if suggest {
        let advisor = CareAdvisor::new(config.advisory.clone());
        if let Some(advice) = advisor.get_advice(&species).await {
            println!(
                "Care advisory: water every {} days · {}",
                advice.watering_frequency_days, advice.light_needs
            );
            every = every.or(Some(advice.watering_frequency_days));
            light = light.or(Some(advice.light_needs));
            notes = notes.or(Some(advice.care_tip));
        }
    }

    let name = match name {
        Some(n) if !n.is_empty() => n,
        _ => species.clone(),
    };

    PlantDraft {
        name,
        species,
        water_frequency_days: every.unwrap_or(7),
        last_watered_date: Utc::now(),
        image_url: Some(image.unwrap_or_else(plant::random_placeholder_image)),
        light_needs: light,
        notes,
        user_id: None,
    }
}

fn print_garden(garden: &GardenController, filter: Filter) {
    let now = Utc::now();

    if garden.is_loading() {
        println!("Loading your garden...");
        return;
    }
    if garden.plants().is_empty() {
        println!("Your garden is empty. Add your first plant with `leaflink add`.");
        return;
    }

    let filtered = garden.filtered(filter, now);
    if filtered.is_empty() {
        println!("No plants match this filter.");
    }
    for plant in &filtered {
        let status = schedule::evaluate(plant, now);
        println!(
            "{} ({}) — {}",
            plant.display_name(),
            plant.species,
            status.label()
        );
        println!(
            "    id {} · every {} days · last watered {} · next {}",
            short_id(&plant.id),
            plant.water_frequency_days,
            plant.last_watered_date.format("%Y-%m-%d"),
            status.due_date.format("%Y-%m-%d")
        );
        if let Some(light) = &plant.light_needs {
            println!("    light: {}", light);
        }
    }

    let stats = garden.stats(now);
    println!("\n{} plants · {} need water", stats.total, stats.thirsty);
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Match a user-supplied query against the garden: exact id, unambiguous id
/// prefix, or case-insensitive name/species match.
fn resolve_plant_id(plants: &[Plant], query: &str) -> Result<String> {
    if let Some(plant) = plants.iter().find(|p| p.id == query) {
        return Ok(plant.id.clone());
    }

    if query.len() >= 4 {
        let matches: Vec<&Plant> = plants.iter().filter(|p| p.id.starts_with(query)).collect();
        match matches.len() {
            1 => return Ok(matches[0].id.clone()),
            n if n > 1 => anyhow::bail!("Id prefix '{}' matches {} plants", query, n),
            _ => {}
        }
    }

    let matches: Vec<&Plant> = plants
        .iter()
        .filter(|p| p.display_name().eq_ignore_ascii_case(query))
        .collect();
    match matches.len() {
        1 => Ok(matches[0].id.clone()),
        0 => anyhow::bail!("No plant matches '{}'", query),
        n => anyhow::bail!(
            "'{}' matches {} plants; use an id from `leaflink list`",
            query,
            n
        ),
    }
}

fn plant_name(plants: &[Plant], id: &str) -> String {
    plants
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Print the controller's current notice, exiting non-zero on errors so
/// scripts can tell a rejected mutation from a quiet success.
fn report(garden: &GardenController) {
    if let Some(notice) = garden.current_notice() {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message),
            NoticeKind::Error => {
                eprintln!("{}", notice.message);
                std::process::exit(1);
            }
        }
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ---------------------------------------------------------------------------
// Interactive shell
// ---------------------------------------------------------------------------

async fn run_repl(config: &Config, gate: &SessionGate) -> Result<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let mut changes = gate.subscribe();
    let mut garden = open_garden(config, gate).await?;

    println!("LeafLink garden shell. Commands: list [all|thirsty|healthy], add <species>,");
    println!("water <plant>, remove <plant>, stats, login <email> <password>, logout, quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("leaflink> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or("");
        let rest: Vec<&str> = parts.collect();

        match verb {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("list [all|thirsty|healthy] · add <species> · water <plant>");
                println!("remove <plant> · stats · login <email> <password> · logout · quit");
            }
            "list" => {
                let filter = match rest.first().copied() {
                    Some("thirsty") => Filter::Thirsty,
                    Some("healthy") => Filter::Healthy,
                    _ => Filter::All,
                };
                print_garden(&garden, filter);
            }
            "stats" => {
                let stats = garden.stats(Utc::now());
                println!("{} plants · {} need water", stats.total, stats.thirsty);
            }
            "add" => {
                if rest.is_empty() {
                    println!("Usage: add <species>");
                    continue;
                }
                let species = rest.join(" ");
                let draft = build_draft(config, None, species, None, None, None, None, false)
                    .await;
                garden.add(draft).await;
                print_notice(&garden);
            }
            "water" => {
                if rest.is_empty() {
                    println!("Usage: water <plant>");
                    continue;
                }
                let query = rest.join(" ");
                match resolve_plant_id(garden.plants(), &query) {
                    Ok(id) => {
                        let name = plant_name(garden.plants(), &id);
                        garden.water(&id, Utc::now()).await;
                        if garden.current_notice().is_none() {
                            println!("Watered {}.", name);
                        }
                        print_notice(&garden);
                    }
                    Err(e) => println!("{}", e),
                }
            }
            "remove" => {
                if rest.is_empty() {
                    println!("Usage: remove <plant>");
                    continue;
                }
                let query = rest.join(" ");
                match resolve_plant_id(garden.plants(), &query) {
                    Ok(id) => {
                        let name = plant_name(garden.plants(), &id);
                        if confirm(&format!("Are you sure you want to remove {}?", name))? {
                            garden.remove(&id).await;
                            print_notice(&garden);
                        } else {
                            println!("Cancelled.");
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            "login" => {
                let (Some(email), Some(password)) = (rest.first(), rest.get(1)) else {
                    println!("Usage: login <email> <password>");
                    continue;
                };
                match gate.sign_in(email, password).await {
                    Ok(who) => println!("Signed in as {}.", who),
                    Err(e) => println!("Sign-in failed: {}", e),
                }
            }
            "logout" => {
                if let Err(e) = gate.sign_out().await {
                    println!("Sign-out failed: {}", e);
                } else {
                    println!("Signed out.");
                }
            }
            other => println!("Unknown command '{}'. Try `help`.", other),
        }

        // A sign-in/out above (or in another task) changes the owner; pick
        // up the latest identity and reload the garden against it.
        let mut latest = None;
        while let Ok(change) = changes.try_recv() {
            latest = Some(change);
        }
        if let Some(identity) = latest {
            let token = gate.access_token().await;
            let store = store::open(config, token)?;
            garden = GardenController::new(store, EmailNotifier::new(config.email.clone()));
            garden.load(list_identity(gate, identity.as_deref())).await;
            match &identity {
                Some(who) => println!("Garden loaded for {}.", who),
                None => println!("Garden cleared."),
            }
        }
    }

    Ok(())
}

fn print_notice(garden: &GardenController) {
    if let Some(notice) = garden.current_notice() {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message),
            NoticeKind::Error => println!("{}", notice.message),
        }
    }
}
